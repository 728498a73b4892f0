use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::config::{Config, StoreBackend};
use crate::domain::{DailyRecord, OptimizationRun};
use crate::forecast::{SectorDemandSource, TimeSeriesSource};

pub mod memory;
pub mod seed;

#[cfg(feature = "db")]
pub mod pg;

pub use memory::InMemoryStore;

/// Storage of completed runs and their daily records.
#[async_trait]
pub trait RunRepository: Send + Sync {
    /// Persist a run together with all its records, or nothing at all.
    async fn save(&self, run: &OptimizationRun, records: &[DailyRecord]) -> Result<()>;
    async fn find(&self, id: Uuid) -> Result<Option<OptimizationRun>>;
    /// Most recently created first.
    async fn list(&self, limit: usize) -> Result<Vec<OptimizationRun>>;
    /// Records of a run ordered by timestamp ascending.
    async fn records(&self, run_id: Uuid) -> Result<Vec<DailyRecord>>;
}

pub struct Repositories {
    pub history: Arc<dyn TimeSeriesSource>,
    pub demand: Arc<dyn SectorDemandSource>,
    pub runs: Arc<dyn RunRepository>,
}

impl Repositories {
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: TimeSeriesSource + SectorDemandSource + RunRepository + 'static,
    {
        Self {
            history: store.clone(),
            demand: store.clone(),
            runs: store,
        }
    }

    pub async fn new(cfg: &Config) -> Result<Self> {
        match cfg.store.backend {
            StoreBackend::Memory => {
                let store = Arc::new(InMemoryStore::default());
                if cfg.store.demo_auto_seed {
                    let days = seed::seed_history(
                        &store,
                        chrono::Utc::now(),
                        cfg.store.seed_days,
                        cfg.store.seed,
                    );
                    info!(days, "seeded in-memory history");
                }
                Ok(Self::from_store(store))
            }
            #[cfg(feature = "db")]
            StoreBackend::Postgres => {
                let url = cfg
                    .store
                    .url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("store.url is required for the postgres backend"))?;
                let store = Arc::new(pg::PgStore::connect(url).await?);
                Ok(Self::from_store(store))
            }
            #[cfg(not(feature = "db"))]
            StoreBackend::Postgres => {
                anyhow::bail!("postgres backend requires building with the `db` feature")
            }
        }
    }
}
