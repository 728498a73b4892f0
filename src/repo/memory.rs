//! In-process store for history and runs, used by default and in tests.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::RunRepository;
use crate::domain::{DailyRecord, Metric, OptimizationRun, Sector};
use crate::forecast::{SectorDemandSource, TimeSeriesSource};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub ts: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Clone)]
struct StoredRun {
    run: OptimizationRun,
    records: Vec<DailyRecord>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    series: RwLock<HashMap<Metric, Vec<Observation>>>,
    demands: RwLock<HashMap<Sector, Vec<Observation>>>,
    runs: RwLock<HashMap<Uuid, StoredRun>>,
}

fn mean(observations: &[Observation]) -> Option<f64> {
    if observations.is_empty() {
        return None;
    }
    Some(observations.iter().map(|o| o.value).sum::<f64>() / observations.len() as f64)
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, metric: Metric, ts: DateTime<Utc>, value: f64) {
        self.series
            .write()
            .entry(metric)
            .or_default()
            .push(Observation { ts, value });
    }

    pub fn record_demand(&self, sector: Sector, ts: DateTime<Utc>, value: f64) {
        self.demands
            .write()
            .entry(sector)
            .or_default()
            .push(Observation { ts, value });
    }

    pub fn observation_count(&self, metric: Metric) -> usize {
        self.series.read().get(&metric).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.series.read().values().all(Vec::is_empty)
            && self.demands.read().values().all(Vec::is_empty)
    }
}

#[async_trait]
impl TimeSeriesSource for InMemoryStore {
    async fn average(&self, metric: Metric) -> Result<Option<f64>> {
        Ok(self.series.read().get(&metric).and_then(|obs| mean(obs)))
    }

    async fn latest(&self, metric: Metric) -> Result<Option<f64>> {
        Ok(self
            .series
            .read()
            .get(&metric)
            .and_then(|obs| obs.iter().max_by_key(|o| o.ts))
            .map(|o| o.value))
    }
}

#[async_trait]
impl SectorDemandSource for InMemoryStore {
    async fn average_demand(&self, sector: Sector) -> Result<Option<f64>> {
        Ok(self.demands.read().get(&sector).and_then(|obs| mean(obs)))
    }
}

#[async_trait]
impl RunRepository for InMemoryStore {
    async fn save(&self, run: &OptimizationRun, records: &[DailyRecord]) -> Result<()> {
        let mut records = records.to_vec();
        records.sort_by_key(|r| r.ts);
        self.runs.write().insert(
            run.id,
            StoredRun {
                run: run.clone(),
                records,
            },
        );
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<OptimizationRun>> {
        Ok(self.runs.read().get(&id).map(|s| s.run.clone()))
    }

    async fn list(&self, limit: usize) -> Result<Vec<OptimizationRun>> {
        let mut runs: Vec<OptimizationRun> =
            self.runs.read().values().map(|s| s.run.clone()).collect();
        runs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        runs.truncate(limit);
        Ok(runs)
    }

    async fn records(&self, run_id: Uuid) -> Result<Vec<DailyRecord>> {
        Ok(self
            .runs
            .read()
            .get(&run_id)
            .map(|s| s.records.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t(day: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::days(day)
    }

    #[tokio::test]
    async fn test_empty_store_reports_no_data() {
        let store = InMemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.average(Metric::Inflow).await.unwrap(), None);
        assert_eq!(store.latest(Metric::Storage).await.unwrap(), None);
        assert_eq!(store.average_demand(Sector::Industry).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_average_and_latest() {
        let store = InMemoryStore::new();
        store.record(Metric::Inflow, t(0), 100.0);
        store.record(Metric::Inflow, t(1), 140.0);
        store.record(Metric::Storage, t(5), 810.0);
        store.record(Metric::Storage, t(2), 650.0);
        store.record_demand(Sector::Drinking, t(0), 50.0);
        store.record_demand(Sector::Drinking, t(1), 60.0);

        assert_eq!(store.average(Metric::Inflow).await.unwrap(), Some(120.0));
        assert_eq!(store.latest(Metric::Storage).await.unwrap(), Some(810.0));
        assert_eq!(store.average_demand(Sector::Drinking).await.unwrap(), Some(55.0));
        assert_eq!(store.average_demand(Sector::Agriculture).await.unwrap(), None);
        assert_eq!(store.observation_count(Metric::Inflow), 2);
    }
}
