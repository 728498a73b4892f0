//! Historical baselines
//!
//! Reduces the observed inflow, storage and per-sector demand history to the
//! scalar baselines the release planner starts from. Missing history never
//! fails a run: every metric has a documented fallback.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Metric, Sector, SectorValues};

/// Mean daily inflow assumed when no inflow history exists.
pub const FALLBACK_INFLOW: f64 = 120.0;
/// Storage assumed when no storage reading exists.
pub const FALLBACK_STORAGE: f64 = 700.0;

/// Read-only access to reservoir time series.
#[async_trait]
pub trait TimeSeriesSource: Send + Sync {
    /// Arithmetic mean of all observations, `None` when there are none.
    async fn average(&self, metric: Metric) -> Result<Option<f64>>;
    /// Most recent observation by timestamp, `None` when there are none.
    async fn latest(&self, metric: Metric) -> Result<Option<f64>>;
}

/// Read-only access to per-sector demand history.
#[async_trait]
pub trait SectorDemandSource: Send + Sync {
    async fn average_demand(&self, sector: Sector) -> Result<Option<f64>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baselines {
    pub inflow_base: f64,
    pub demand_base: SectorValues,
    pub storage0: f64,
}

impl Default for Baselines {
    fn default() -> Self {
        Self {
            inflow_base: FALLBACK_INFLOW,
            demand_base: Sector::ALL
                .iter()
                .map(|s| (*s, s.fallback_demand()))
                .collect(),
            storage0: FALLBACK_STORAGE,
        }
    }
}

fn or_fallback(value: Option<f64>, fallback: f64, what: &str) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => {
            debug!(metric = what, fallback, "no usable history, using fallback");
            fallback
        }
    }
}

/// Query both collaborators and reduce them to baselines.
pub async fn collect_baselines(
    series: &dyn TimeSeriesSource,
    demand: &dyn SectorDemandSource,
) -> Result<Baselines> {
    let inflow_base = or_fallback(
        series.average(Metric::Inflow).await?,
        FALLBACK_INFLOW,
        Metric::Inflow.as_ref(),
    );
    let storage0 = or_fallback(
        series.latest(Metric::Storage).await?,
        FALLBACK_STORAGE,
        Metric::Storage.as_ref(),
    );

    let mut demand_base = SectorValues::new();
    for sector in Sector::ALL {
        let value = or_fallback(
            demand.average_demand(sector).await?,
            sector.fallback_demand(),
            sector.as_ref(),
        );
        demand_base.insert(sector, value);
    }

    Ok(Baselines {
        inflow_base,
        demand_base,
        storage0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyHistory;

    #[async_trait]
    impl TimeSeriesSource for EmptyHistory {
        async fn average(&self, _metric: Metric) -> Result<Option<f64>> {
            Ok(None)
        }
        async fn latest(&self, _metric: Metric) -> Result<Option<f64>> {
            Ok(None)
        }
    }

    #[async_trait]
    impl SectorDemandSource for EmptyHistory {
        async fn average_demand(&self, _sector: Sector) -> Result<Option<f64>> {
            Ok(None)
        }
    }

    struct PartialHistory;

    #[async_trait]
    impl TimeSeriesSource for PartialHistory {
        async fn average(&self, metric: Metric) -> Result<Option<f64>> {
            Ok(match metric {
                Metric::Inflow => Some(150.0),
                _ => None,
            })
        }
        async fn latest(&self, _metric: Metric) -> Result<Option<f64>> {
            Ok(Some(f64::NAN))
        }
    }

    #[async_trait]
    impl SectorDemandSource for PartialHistory {
        async fn average_demand(&self, sector: Sector) -> Result<Option<f64>> {
            Ok((sector == Sector::Industry).then_some(40.0))
        }
    }

    #[tokio::test]
    async fn test_empty_history_uses_fallbacks() {
        let baselines = collect_baselines(&EmptyHistory, &EmptyHistory).await.unwrap();
        assert_eq!(baselines, Baselines::default());
        assert_eq!(baselines.inflow_base, 120.0);
        assert_eq!(baselines.storage0, 700.0);
        assert_eq!(baselines.demand_base[&Sector::Agriculture], 80.0);
    }

    #[tokio::test]
    async fn test_partial_history_mixes_observed_and_fallback() {
        let baselines = collect_baselines(&PartialHistory, &PartialHistory)
            .await
            .unwrap();
        assert_eq!(baselines.inflow_base, 150.0);
        assert_eq!(baselines.storage0, FALLBACK_STORAGE);
        assert_eq!(baselines.demand_base[&Sector::Industry], 40.0);
        assert_eq!(baselines.demand_base[&Sector::Drinking], 55.0);
        assert_eq!(baselines.demand_base[&Sector::Environment], 28.0);
    }
}
