use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, Feature, FeatureId};

/// Default cap on villages returned by a query.
pub const DEFAULT_QUERY_LIMIT: usize = 100;

/// Filter for village listings. Empty fields match everything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VillageQuery {
    /// District name, compared case-insensitively.
    pub district: Option<String>,
    /// Subdistrict name, compared case-insensitively.
    pub subdistrict: Option<String>,
    /// Case-insensitive substring of the village name.
    pub search: Option<String>,
    pub limit: usize,
}

impl Default for VillageQuery {
    fn default() -> Self {
        Self { district: None, subdistrict: None, search: None, limit: DEFAULT_QUERY_LIMIT }
    }
}

/// Attribute-only view of a village, without geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VillageSummary {
    pub id: FeatureId,
    pub village_name: String,
    pub district: String,
    pub subdistrict: String,
    pub population: u64,
    pub census_id: String,
}

impl From<&Feature> for VillageSummary {
    fn from(f: &Feature) -> Self {
        Self {
            id: f.id.clone(),
            village_name: f.name.clone(),
            district: f.district.clone(),
            subdistrict: f.subdistrict.clone(),
            population: f.population,
            census_id: f.census_id.clone(),
        }
    }
}

/// Result of a village query: `total` matches, of which `returned` are listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub villages: Vec<VillageSummary>,
    pub total: usize,
    pub returned: usize,
}

impl VillageQuery {
    fn matches(&self, feature: &Feature) -> bool {
        let eq = |want: &Option<String>, have: &str| {
            want.as_deref().map_or(true, |w| w.eq_ignore_ascii_case(have))
        };
        eq(&self.district, &feature.district)
            && eq(&self.subdistrict, &feature.subdistrict)
            && self.search.as_deref().map_or(true, |needle| {
                feature.name.to_lowercase().contains(&needle.to_lowercase())
            })
    }
}

impl Dataset {
    /// List villages matching `query`, capped at `query.limit`.
    pub fn query(&self, query: &VillageQuery) -> QueryResult {
        let matching: Vec<&Feature> = self.villages().filter(|f| query.matches(f)).collect();
        let villages: Vec<VillageSummary> = matching.iter()
            .take(query.limit)
            .map(|&f| f.into())
            .collect();

        QueryResult { total: matching.len(), returned: villages.len(), villages }
    }

    /// All villages in `district`, compared case-insensitively.
    pub fn villages_in_district(&self, district: &str) -> Vec<&Feature> {
        self.villages()
            .filter(|f| f.district.eq_ignore_ascii_case(district))
            .collect()
    }
}
