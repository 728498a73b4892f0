use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{AsRefStr, Display, EnumIter, EnumString};

// ============================================================================
// Sectors
// ============================================================================

/// Downstream consumer competing for released water.
///
/// Declaration order is the canonical output order (CSV columns, JSON keys).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Sector {
    Drinking,
    Environment,
    Industry,
    Agriculture,
}

impl Sector {
    pub const ALL: [Sector; 4] = [
        Sector::Drinking,
        Sector::Environment,
        Sector::Industry,
        Sector::Agriculture,
    ];

    /// Sectors that share the remainder once the environmental floor is forced.
    pub const NON_ENVIRONMENT: [Sector; 3] =
        [Sector::Drinking, Sector::Industry, Sector::Agriculture];

    /// Average daily demand assumed when a sector has no recorded history.
    pub fn fallback_demand(self) -> f64 {
        match self {
            Sector::Drinking => 55.0,
            Sector::Environment => 28.0,
            Sector::Industry => 32.0,
            Sector::Agriculture => 80.0,
        }
    }
}

/// One value per sector, iterated in canonical sector order.
pub type SectorValues = BTreeMap<Sector, f64>;

/// Build a map holding the same value for every sector.
pub fn sector_values(value: f64) -> SectorValues {
    Sector::ALL.iter().map(|s| (*s, value)).collect()
}

// ============================================================================
// Scenarios
// ============================================================================

/// Climate scenario selecting the inflow and demand multipliers of a run.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Scenario {
    Wet,
    #[default]
    Normal,
    Dry,
}

impl Scenario {
    pub fn inflow_multiplier(self) -> f64 {
        match self {
            Scenario::Wet => 1.2,
            Scenario::Normal => 1.0,
            Scenario::Dry => 0.75,
        }
    }

    pub fn demand_multiplier(self) -> f64 {
        match self {
            Scenario::Wet => 0.95,
            Scenario::Normal => 1.0,
            Scenario::Dry => 1.1,
        }
    }
}

// ============================================================================
// Observed metrics
// ============================================================================

/// Reservoir time-series metric names as stored by the history collaborator.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Metric {
    Inflow,
    Outflow,
    Storage,
}

/// Round to the three decimals used for every emitted figure.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_sector_names_round_trip_through_strum() {
        for sector in Sector::ALL {
            assert_eq!(Sector::from_str(sector.as_ref()).unwrap(), sector);
        }
        assert_eq!(Sector::Environment.to_string(), "environment");
        assert!(Sector::from_str("fisheries").is_err());
    }

    #[test]
    fn test_sector_order_is_canonical() {
        let keys: Vec<_> = sector_values(0.0).into_keys().collect();
        assert_eq!(keys, Sector::ALL.to_vec());
    }

    #[test]
    fn test_scenario_multipliers() {
        assert_eq!(Scenario::default(), Scenario::Normal);
        assert_eq!(Scenario::Wet.inflow_multiplier(), 1.2);
        assert_eq!(Scenario::Dry.inflow_multiplier(), 0.75);
        assert_eq!(Scenario::Dry.demand_multiplier(), 1.1);
        assert_eq!(Scenario::from_str("wet").unwrap(), Scenario::Wet);
    }

    #[test]
    fn test_sector_map_serializes_with_lowercase_keys() {
        let json = serde_json::to_string(&sector_values(1.5)).unwrap();
        assert_eq!(
            json,
            r#"{"drinking":1.5,"environment":1.5,"industry":1.5,"agriculture":1.5}"#
        );
    }

    #[test]
    fn test_round3() {
        assert_eq!(round3(1.23456), 1.235);
        assert_eq!(round3(-0.0004), -0.0);
        assert_eq!(round3(260.0), 260.0);
    }
}
