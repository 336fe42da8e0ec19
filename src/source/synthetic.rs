use anyhow::Result;
use rand::Rng;

use crate::{
    dataset::{DataSource, FeatureId, FeatureKind},
    geom::{state_outline_geometry, village_footprint, VillageStyle},
    reconcile::CanonicalField,
    source::{AttrValue, BoundarySource, Record, SourceRow},
};

/// Part of the state with its own sampling window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    NorthWest,
    NorthEast,
    East,
    Central,
    South,
    West,
}

impl Region {
    /// Latitude range (degrees) villages are drawn from.
    pub fn lat_range(&self) -> (f64, f64) {
        match self {
            Region::NorthWest => (16.5, 18.5),
            Region::NorthEast => (17.0, 20.5),
            Region::East      => (15.0, 16.5),
            Region::Central   => (14.5, 16.0),
            Region::South     => (12.5, 14.0),
            Region::West      => (13.0, 15.0),
        }
    }

    /// Longitude range (degrees) villages are drawn from.
    pub fn lon_range(&self) -> (f64, f64) {
        match self {
            Region::NorthWest => (74.0, 75.5),
            Region::NorthEast => (75.5, 77.5),
            Region::East      => (76.5, 78.0),
            Region::Central   => (75.0, 76.5),
            Region::South     => (76.0, 77.5),
            Region::West      => (74.0, 75.0),
        }
    }
}

/// Blueprint for a generated village.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VillageTemplate {
    pub name: &'static str,
    pub district: &'static str,
    pub subdistrict: &'static str,
    pub style: VillageStyle,
    /// Half-open population range before the category adjustment.
    pub population: (u64, u64),
    pub region: Region,
}

macro_rules! template {
    ($name:literal, $district:literal, $subdistrict:literal, $style:ident, $lo:literal..$hi:literal, $region:ident) => {
        VillageTemplate {
            name: $name,
            district: $district,
            subdistrict: $subdistrict,
            style: VillageStyle::$style,
            population: ($lo, $hi),
            region: Region::$region,
        }
    };
}

pub const VILLAGE_TEMPLATES: [VillageTemplate; 20] = [
    template!("Bangalore Rural",      "Bangalore",        "Bangalore South",   Spread,   8000..20000, South),
    template!("Mysore Central",       "Mysore",           "Mysore North",      Compact,  5000..15000, South),
    template!("Mangalore Coastal",    "Dakshina Kannada", "Mangalore",         Linear,   3000..12000, West),
    template!("Hubli Industrial",     "Dharwad",          "Hubli",             Spread,  10000..25000, NorthWest),
    template!("Belgaum Northern",     "Belgaum",          "Belgaum North",     Compact,  4000..12000, NorthWest),
    template!("Gulbarga Eastern",     "Gulbarga",         "Gulbarga East",     Standard, 3000..10000, NorthEast),
    template!("Bellary Mining",       "Bellary",          "Bellary Central",   Spread,   6000..18000, East),
    template!("Raichur Agricultural", "Raichur",          "Raichur Rural",     Standard, 2000..8000,  East),
    template!("Bidar Historical",     "Bidar",            "Bidar Central",     Compact,  3000..9000,  NorthEast),
    template!("Koppal Traditional",   "Koppal",           "Koppal Rural",      Standard, 2000..7000,  Central),
    template!("Gadag Cultural",       "Gadag",            "Gadag Central",     Compact,  4000..11000, NorthWest),
    template!("Dharwad Educational",  "Dharwad",          "Dharwad Central",   Spread,   8000..20000, NorthWest),
    template!("Haveri Agricultural",  "Haveri",           "Haveri Rural",      Standard, 2000..8000,  Central),
    template!("Davangere Industrial", "Davangere",        "Davangere Central", Spread,   7000..18000, Central),
    template!("Shimoga Forest",       "Shimoga",          "Shimoga Rural",     Linear,   3000..10000, Central),
    template!("Udupi Coastal",        "Udupi",            "Udupi Central",     Linear,   4000..12000, West),
    template!("Chikmagalur Coffee",   "Chikmagalur",      "Chikmagalur Rural", Standard, 2000..8000,  Central),
    template!("Tumkur Industrial",    "Tumkur",           "Tumkur Central",    Spread,   6000..16000, South),
    template!("Kolar Gold",           "Kolar",            "Kolar Central",     Compact,  3000..9000,  South),
    template!("Mandya Sugar",         "Mandya",           "Mandya Central",    Standard, 4000..12000, South),
];

impl VillageTemplate {
    /// Draw a population: uniform in the template range, then scaled up for
    /// industrial names and down for agricultural ones.
    pub fn sample_population<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        let (lo, hi) = self.population;
        let base = rng.random_range(lo..hi) as f64;
        let factor = if self.name.contains("Industrial") {
            rng.random_range(1.2..1.5)
        } else if self.name.contains("Agricultural") {
            rng.random_range(0.8..0.9)
        } else {
            1.0
        };
        (base * factor) as u64
    }
}

/// Procedurally generated stand-in villages, optionally led by the state outline.
///
/// Rows use the canonical column names, so reconciliation maps them as-is.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    columns: Vec<String>,
    rows: Vec<SourceRow>,
}

impl SyntheticSource {
    /// Generate `count` villages. Village `i` uses template `i % 20`, is named
    /// `"{template} {i+1}"` and gets census id `CENSUS_{i+1:04}`.
    pub fn generate<R: Rng + ?Sized>(count: usize, include_state_boundary: bool, state_name: &str, rng: &mut R) -> Self {
        let columns: Vec<String> = CanonicalField::ALL.iter().map(|f| f.column().to_string()).collect();

        let record = |name: &str, district: &str, subdistrict: &str, census_id: &str, population: u64| -> Record {
            CanonicalField::ALL.iter()
                .map(|field| {
                    let value = match field {
                        CanonicalField::StateName => AttrValue::from(state_name),
                        CanonicalField::District => AttrValue::from(district),
                        CanonicalField::Subdistrict => AttrValue::from(subdistrict),
                        CanonicalField::VillageName => AttrValue::from(name),
                        CanonicalField::CensusId => AttrValue::from(census_id),
                        CanonicalField::Population => AttrValue::Number(population as f64),
                    };
                    (field.column().to_string(), value)
                })
                .collect()
        };

        let mut rows = Vec::with_capacity(count + 1);
        if include_state_boundary {
            rows.push(SourceRow {
                id: FeatureId::from("state_boundary"),
                kind: FeatureKind::StateBoundary,
                record: record(&format!("{state_name} State"), "", "", "", 0),
                geometry: state_outline_geometry(),
            });
        }

        for i in 0..count {
            let template = &VILLAGE_TEMPLATES[i % VILLAGE_TEMPLATES.len()];
            let (lat_lo, lat_hi) = template.region.lat_range();
            let (lon_lo, lon_hi) = template.region.lon_range();
            let lat = rng.random_range(lat_lo..lat_hi);
            let lon = rng.random_range(lon_lo..lon_hi);

            let geometry = village_footprint(lat, lon, template.style, rng);
            let population = template.sample_population(rng);
            let name = format!("{} {}", template.name, i + 1);
            let census_id = format!("CENSUS_{:04}", i + 1);

            rows.push(SourceRow {
                id: FeatureId::Num(i as u64 + 1),
                kind: FeatureKind::Village,
                record: record(&name, template.district, template.subdistrict, &census_id, population),
                geometry,
            });
        }

        Self { columns, rows }
    }
}

impl BoundarySource for SyntheticSource {
    fn origin(&self) -> DataSource { DataSource::Synthetic }

    fn column_names(&self) -> &[String] { &self.columns }

    fn rows(&self) -> &[SourceRow] { &self.rows }

    fn rows_mut(&mut self) -> &mut [SourceRow] { &mut self.rows }

    /// Generated in lon/lat already.
    fn reproject(&mut self) -> Result<()> { Ok(()) }
}
