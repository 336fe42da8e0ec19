use anyhow::{Context, Result};
use polars::prelude::*;

use crate::{
    reconcile::{CanonicalField, Reconciliation},
    source::{AttrValue, Record},
};

/// A source row after renaming, defaulting and population coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRow {
    pub state_name: String,
    pub district: String,
    pub subdistrict: String,
    pub village_name: String,
    pub census_id: String,
    pub population: u64,
}

/// Canonical rows plus every population cell that had to be coerced.
#[derive(Debug, Clone, Default)]
pub struct Coercion {
    pub rows: Vec<CanonicalRow>,
    /// (row index, raw text) of non-numeric or negative population values.
    pub malformed: Vec<(usize, String)>,
}

/// Build the canonical attribute table for `records` and read it back as rows.
///
/// Unmapped text fields become empty strings (the state name falls back to
/// `default_state`); population is cast to float, with unparseable, negative
/// or missing values replaced by 0 and truncated to an integer.
pub fn canonical_rows<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    reconciliation: &Reconciliation,
    default_state: &str,
) -> Result<Coercion> {
    let renamed: Vec<Vec<(String, AttrValue)>> = records.into_iter()
        .map(|record| reconciliation.apply(record))
        .collect();

    /// Get the canonical value of `column` in a renamed row.
    fn cell<'a>(row: &'a [(String, AttrValue)], column: &str) -> Option<&'a AttrValue> {
        row.iter().find(|(name, _)| name == column).map(|(_, value)| value)
    }

    let mut columns: Vec<Column> = CanonicalField::ALL.iter()
        .filter(|field| **field != CanonicalField::Population)
        .map(|field| {
            let default = if *field == CanonicalField::StateName { default_state } else { "" };
            let values: Vec<String> = renamed.iter()
                .map(|row| cell(row, field.column())
                    .and_then(AttrValue::to_text)
                    .unwrap_or_else(|| default.to_string()))
                .collect();
            Column::new(field.column().into(), values)
        })
        .collect();

    let population = CanonicalField::Population.column();
    let raw: Vec<Option<String>> = renamed.iter()
        .map(|row| cell(row, population).and_then(AttrValue::to_text))
        .collect();
    columns.push(
        Column::new(population.into(), raw.clone())
            .cast(&DataType::Float64)
            .context("Failed to cast population column")?
    );

    let df = DataFrame::new(columns).context("Failed to build canonical attribute table")?;

    /// Get a canonical text column of the table.
    fn text(df: &DataFrame, field: CanonicalField) -> Result<&StringChunked> {
        Ok(df.column(field.column())?.str()?)
    }

    let (states, districts, subdistricts, names, census_ids) = (
        text(&df, CanonicalField::StateName)?,
        text(&df, CanonicalField::District)?,
        text(&df, CanonicalField::Subdistrict)?,
        text(&df, CanonicalField::VillageName)?,
        text(&df, CanonicalField::CensusId)?,
    );
    let populations = df.column(population)?.f64()?;

    let mut coercion = Coercion::default();
    for i in 0..df.height() {
        let parsed = populations.get(i).filter(|p| p.is_finite());
        let value = match (parsed, &raw[i]) {
            (Some(p), _) if p >= 0.0 => p.trunc() as u64,
            (_, Some(text)) if !text.is_empty() => {
                coercion.malformed.push((i, text.clone()));
                0
            }
            _ => 0,
        };

        let get = |ca: &StringChunked| ca.get(i).unwrap_or_default().to_string();
        coercion.rows.push(CanonicalRow {
            state_name: get(states),
            district: get(districts),
            subdistrict: get(subdistricts),
            village_name: get(names),
            census_id: get(census_ids),
            population: value,
        });
    }

    Ok(coercion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::{reconcile, AliasTable};

    fn record(pairs: &[(&str, AttrValue)]) -> Record {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn columns_of(record: &Record) -> Vec<String> {
        record.iter().map(|(k, _)| k.clone()).collect()
    }

    #[test]
    fn coerces_population_values() {
        let records = vec![
            record(&[("village", "A".into()), ("population", 1200.0.into())]),
            record(&[("village", "B".into()), ("population", "  850 ".into())]),
            record(&[("village", "C".into()), ("population", "n/a".into())]),
            record(&[("village", "D".into()), ("population", (-5.0).into())]),
            record(&[("village", "E".into()), ("population", AttrValue::Null)]),
            record(&[("village", "F".into()), ("population", 99.9.into())]),
        ];
        let reconciliation = reconcile(&columns_of(&records[0]), &AliasTable::default());
        let coercion = canonical_rows(&records, &reconciliation, "Karnataka").unwrap();

        let pops: Vec<u64> = coercion.rows.iter().map(|r| r.population).collect();
        assert_eq!(pops, vec![1200, 850, 0, 0, 0, 99]);
        assert_eq!(coercion.malformed, vec![(2, "n/a".to_string()), (3, "-5".to_string())]);
    }

    #[test]
    fn unmapped_fields_take_defaults() {
        let records = vec![record(&[("VILLAGE_NAME", "Hosur".into()), ("dist_name", "Kolar".into())])];
        let reconciliation = reconcile(&columns_of(&records[0]), &AliasTable::default());
        let coercion = canonical_rows(&records, &reconciliation, "Karnataka").unwrap();

        assert_eq!(coercion.rows, vec![CanonicalRow {
            state_name: "Karnataka".into(),
            district: "Kolar".into(),
            subdistrict: String::new(),
            village_name: "Hosur".into(),
            census_id: String::new(),
            population: 0,
        }]);
        assert!(coercion.malformed.is_empty());
    }

    #[test]
    fn numeric_census_ids_render_without_fraction() {
        let records = vec![record(&[("pc11_tv_id", 612345.0.into()), ("tot_p", 10.0.into())])];
        let reconciliation = reconcile(&columns_of(&records[0]), &AliasTable::default());
        let coercion = canonical_rows(&records, &reconciliation, "Karnataka").unwrap();
        assert_eq!(coercion.rows[0].census_id, "612345");
        assert_eq!(coercion.rows[0].population, 10);
    }

    #[test]
    fn empty_input_yields_no_rows() {
        let coercion = canonical_rows(&Vec::<Record>::new(), &Reconciliation::default(), "Karnataka").unwrap();
        assert!(coercion.rows.is_empty());
    }
}
