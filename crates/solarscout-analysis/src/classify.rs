//! Tag-based classification of raw features.
//!
//! Exclusion categories are decided by an ordered rule table: the first
//! matching rule wins.

use solarscout_core::models::{ExclusionCategory, RawFeature};

/// Land uses that make a feature a candidate parcel
pub const CANDIDATE_LAND_USES: [&str; 3] = ["farmland", "farm", "meadow"];

/// Power tags that make a feature grid infrastructure
pub const GRID_POWER_TYPES: [&str; 2] = ["line", "cable"];

/// One row of the exclusion precedence table
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    pub category: ExclusionCategory,
    pub description: &'static str,
    matches: fn(&RawFeature) -> bool,
}

impl ClassificationRule {
    pub fn matches(&self, feature: &RawFeature) -> bool {
        (self.matches)(feature)
    }
}

/// Exclusion rules in precedence order
pub static EXCLUSION_RULES: &[ClassificationRule] = &[
    ClassificationRule {
        category: ExclusionCategory::Residential,
        description: "landuse=residential",
        matches: is_residential,
    },
    ClassificationRule {
        category: ExclusionCategory::Woodland,
        description: "landuse=forest or natural=wood",
        matches: is_woodland,
    },
    ClassificationRule {
        category: ExclusionCategory::Cemetery,
        description: "landuse=cemetery",
        matches: is_cemetery,
    },
    ClassificationRule {
        category: ExclusionCategory::Water,
        description: "natural=water",
        matches: is_water,
    },
    ClassificationRule {
        category: ExclusionCategory::Park,
        description: "leisure=park",
        matches: is_park,
    },
    ClassificationRule {
        category: ExclusionCategory::NatureReserve,
        description: "boundary=protected_area or leisure=nature_reserve",
        matches: is_nature_reserve,
    },
];

fn is_residential(feature: &RawFeature) -> bool {
    feature.has_tag("landuse", "residential")
}

fn is_woodland(feature: &RawFeature) -> bool {
    feature.has_tag("landuse", "forest") || feature.has_tag("natural", "wood")
}

fn is_cemetery(feature: &RawFeature) -> bool {
    feature.has_tag("landuse", "cemetery")
}

fn is_water(feature: &RawFeature) -> bool {
    feature.has_tag("natural", "water")
}

fn is_park(feature: &RawFeature) -> bool {
    feature.has_tag("leisure", "park")
}

fn is_nature_reserve(feature: &RawFeature) -> bool {
    feature.has_tag("boundary", "protected_area") || feature.has_tag("leisure", "nature_reserve")
}

/// Exclusion category of a feature, if any rule matches
pub fn classify_exclusion(feature: &RawFeature) -> Option<ExclusionCategory> {
    EXCLUSION_RULES.iter().find(|rule| rule.matches(feature)).map(|rule| rule.category)
}

/// Land-use category of a candidate parcel feature
pub fn candidate_land_use(feature: &RawFeature) -> Option<&str> {
    feature.tag("landuse").filter(|land_use| CANDIDATE_LAND_USES.contains(land_use))
}

/// Power type of a grid feature
pub fn grid_power_type(feature: &RawFeature) -> Option<&str> {
    feature.tag("power").filter(|power| GRID_POWER_TYPES.contains(power))
}
