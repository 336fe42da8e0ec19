//! Mapping of arbitrary attribute schemas onto the canonical village schema.

mod frame;

use regex::Regex;
use tracing::debug;

use crate::source::{AttrValue, Record};

pub use frame::{canonical_rows, CanonicalRow, Coercion};

/// Columns known to carry broken or redundant values in some exports.
const PROBLEM_COLUMNS: [&str; 4] = ["_mean_p_mi", "_core_p_mi", "_target_we", "_target_gr"];

/// Canonical attribute columns every feature ends up with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalField {
    StateName,
    District,
    Subdistrict,
    VillageName,
    CensusId,
    Population,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 6] = [
        CanonicalField::StateName,
        CanonicalField::District,
        CanonicalField::Subdistrict,
        CanonicalField::VillageName,
        CanonicalField::CensusId,
        CanonicalField::Population,
    ];

    /// Canonical column name (census export spelling).
    pub fn column(&self) -> &'static str {
        match self {
            CanonicalField::StateName   => "state_name",
            CanonicalField::District    => "district_n",
            CanonicalField::Subdistrict => "subdistric",
            CanonicalField::VillageName => "village_na",
            CanonicalField::CensusId    => "pc11_tv_id",
            CanonicalField::Population  => "tot_p",
        }
    }

    /// Accepted source spellings, in priority order.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            CanonicalField::StateName   => &["state_name", "state", "state_nam"],
            CanonicalField::District    => &["district_n", "district", "dist_nam", "dist_name"],
            CanonicalField::Subdistrict => &["subdistric", "subdistrict", "sub_dist", "subdist"],
            CanonicalField::VillageName => &["village_na", "village", "village_n", "village_name"],
            CanonicalField::CensusId    => &["pc11_tv_id", "census_id", "village_id", "id"],
            CanonicalField::Population  => &["tot_p", "population", "pop", "total_pop", "tot_pop", "total_p"],
        }
    }
}

/// One canonical target with its aliases and an optional keyword fallback.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub canonical: String,
    pub aliases: Vec<String>,
    /// Matched against lower-cased column names when no alias is present.
    pub keywords: Option<Regex>,
}

impl FieldRule {
    pub fn new(canonical: &str, aliases: &[&str]) -> Self {
        Self {
            canonical: canonical.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            keywords: None,
        }
    }

    pub fn with_keywords(mut self, keywords: Regex) -> Self {
        self.keywords = Some(keywords);
        self
    }
}

/// Ordered rules describing the target schema.
#[derive(Debug, Clone)]
pub struct AliasTable {
    rules: Vec<FieldRule>,
}

impl AliasTable {
    pub fn new(rules: Vec<FieldRule>) -> Self { Self { rules } }

    pub fn rules(&self) -> &[FieldRule] { &self.rules }
}

impl Default for AliasTable {
    /// The six canonical village fields; population falls back to any column
    /// mentioning `pop`, `tot` or `people`.
    fn default() -> Self {
        let rules = CanonicalField::ALL.iter()
            .map(|field| {
                let rule = FieldRule::new(field.column(), field.aliases());
                match (field, Regex::new("pop|tot|people")) {
                    (CanonicalField::Population, Ok(keywords)) => rule.with_keywords(keywords),
                    _ => rule,
                }
            })
            .collect();
        Self { rules }
    }
}

/// How each canonical field was resolved against a source schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// (canonical, source column) pairs in rule order.
    pub mapping: Vec<(String, String)>,
    /// Canonical fields with no source column; callers supply defaults.
    pub unmapped: Vec<String>,
    /// Source columns dropped because they collide with a mapped column or
    /// are known-problematic.
    pub dropped: Vec<String>,
    /// Canonical fields resolved by keyword rather than alias.
    pub by_keyword: Vec<String>,
}

impl Reconciliation {
    /// Source column chosen for `canonical`, if any.
    pub fn source_for(&self, canonical: &str) -> Option<&str> {
        self.mapping.iter()
            .find(|(c, _)| c == canonical)
            .map(|(_, s)| s.as_str())
    }

    /// Rename a record into canonical keys. Unmapped fields are absent; for a
    /// source column that appears more than once, the first value wins.
    pub fn apply(&self, record: &Record) -> Vec<(String, AttrValue)> {
        self.mapping.iter()
            .filter_map(|(canonical, source)| {
                record.iter()
                    .find(|(name, _)| name == source)
                    .map(|(_, value)| (canonical.clone(), value.clone()))
            })
            .collect()
    }
}

fn is_problem_column(column: &str, has_shrid2: bool) -> bool {
    PROBLEM_COLUMNS.contains(&column) || (has_shrid2 && column == "shrid2_11")
}

/// First unclaimed column satisfying `pred`.
fn find_free(columns: &[String], claimed: &[bool], pred: impl Fn(&str) -> bool) -> Option<usize> {
    (0..columns.len()).find(|&i| !claimed[i] && pred(&columns[i]))
}

/// Resolve every rule in `table` against the source `columns`.
///
/// Per rule: exact alias match first, then case-insensitive, then the keyword
/// fallback. A source column is claimed by at most one rule, and other source
/// columns matching the same rule are reported as dropped. Never fails.
pub fn reconcile(columns: &[String], table: &AliasTable) -> Reconciliation {
    let mut result = Reconciliation::default();
    let mut claimed = vec![false; columns.len()];

    // `shrid2_11` duplicates `shrid2`; the others hold broken values.
    let has_shrid2 = columns.iter().any(|c| c == "shrid2");
    for (i, column) in columns.iter().enumerate() {
        if is_problem_column(column, has_shrid2) {
            claimed[i] = true;
            result.dropped.push(column.clone());
        }
    }

    for rule in table.rules() {
        let exact = rule.aliases.iter()
            .find_map(|alias| find_free(columns, &claimed, |c| c == alias.as_str()));
        let folded = || rule.aliases.iter()
            .find_map(|alias| find_free(columns, &claimed, |c| c.eq_ignore_ascii_case(alias)));

        let chosen = match exact.or_else(folded) {
            Some(i) => Some(i),
            None => {
                let i = rule.keywords.as_ref()
                    .and_then(|re| find_free(columns, &claimed, |c| re.is_match(&c.to_lowercase())));
                if i.is_some() { result.by_keyword.push(rule.canonical.clone()) }
                i
            }
        };

        let Some(i) = chosen else {
            result.unmapped.push(rule.canonical.clone());
            continue;
        };
        claimed[i] = true;
        result.mapping.push((rule.canonical.clone(), columns[i].clone()));

        // Any other alias hit would collide under the same canonical name.
        for j in 0..columns.len() {
            if !claimed[j] && rule.aliases.iter().any(|a| a.eq_ignore_ascii_case(&columns[j])) {
                claimed[j] = true;
                result.dropped.push(columns[j].clone());
            }
        }
    }

    debug!(mapping = ?result.mapping, unmapped = ?result.unmapped, dropped = ?result.dropped, "reconciled columns");
    result
}
