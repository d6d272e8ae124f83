use std::collections::BTreeMap;

use serde::Serialize;
use solarscout_analysis::{DroppedFeature, RebuildReport};
use solarscout_core::models::{ExclusionCategory, SiteCandidate};
use tabled::Tabled;

/// Output for inspect command
#[derive(Debug, Serialize)]
pub struct InspectOutput {
    pub source: String,
    pub canonical_srid: u32,
    pub report: RebuildReport,
}

/// Output for analyze command
#[derive(Debug, Serialize)]
pub struct AnalyzeOutput {
    pub source: String,
    pub buffer_distance_m: f64,
    pub exclude_nature: bool,
    pub min_area_ha: f64,
    pub max_grid_distance_m: f64,
    pub candidate_parcels: usize,
    pub sites: Vec<SiteRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
}

/// One ranked site
#[derive(Debug, Serialize, Tabled)]
pub struct SiteRow {
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[tabled(rename = "Parcel")]
    pub parcel_id: u64,
    #[tabled(rename = "Land use")]
    pub landuse: String,
    #[tabled(rename = "Area (ha)", display_with = "two_decimals")]
    pub original_area_ha: f64,
    #[tabled(rename = "Suitable (ha)", display_with = "two_decimals")]
    pub suitable_area_ha: f64,
    #[tabled(rename = "Grid (m)", display_with = "no_decimals")]
    pub grid_distance_m: f64,
    #[tabled(rename = "Score", display_with = "one_decimal")]
    pub score: f64,
}

impl SiteRow {
    pub fn ranked(sites: &[SiteCandidate]) -> Vec<Self> {
        sites
            .iter()
            .enumerate()
            .map(|(i, site)| Self {
                rank: i + 1,
                parcel_id: site.parcel_id,
                landuse: site.land_use_category.clone(),
                original_area_ha: site.original_area_ha,
                suitable_area_ha: site.suitable_area_ha,
                grid_distance_m: site.grid_distance_m,
                score: site.score,
            })
            .collect()
    }
}

/// Raw features per exclusion category
#[derive(Debug, Tabled)]
pub struct CategoryRow {
    #[tabled(rename = "Category")]
    pub category: String,
    #[tabled(rename = "Features")]
    pub features: usize,
}

impl CategoryRow {
    pub fn from_counts(counts: &BTreeMap<ExclusionCategory, usize>) -> Vec<Self> {
        counts
            .iter()
            .map(|(category, features)| Self {
                category: category.to_string(),
                features: *features,
            })
            .collect()
    }
}

#[derive(Debug, Tabled)]
pub struct DroppedRow {
    #[tabled(rename = "Feature")]
    pub source_id: String,
    #[tabled(rename = "Stage")]
    pub stage: String,
    #[tabled(rename = "Reason")]
    pub reason: String,
}

impl From<&DroppedFeature> for DroppedRow {
    fn from(dropped: &DroppedFeature) -> Self {
        Self {
            source_id: dropped.source_id.clone(),
            stage: dropped.stage.clone(),
            reason: dropped.reason.clone(),
        }
    }
}

fn two_decimals(value: &f64) -> String {
    format!("{value:.2}")
}

fn one_decimal(value: &f64) -> String {
    format!("{value:.1}")
}

fn no_decimals(value: &f64) -> String {
    format!("{value:.0}")
}
