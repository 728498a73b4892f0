use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::Config;
use crate::domain::{DailyRecord, OptimizationRun, RunConfig, RunParams, RunStatus};
use crate::export::ReportLayout;
use crate::forecast::{collect_baselines, SectorDemandSource, TimeSeriesSource};
use crate::optimizer::{plan_release, PlanError, PlanOutcome, PlannerOptions};
use crate::repo::{Repositories, RunRepository};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Config,
    pub planner: Arc<ReleasePlanner>,
    pub repos: Arc<Repositories>,
}

impl AppState {
    pub async fn new(cfg: Config) -> Result<Self> {
        let repos = Arc::new(Repositories::new(&cfg).await?);
        Ok(Self::with_repositories(cfg, repos))
    }

    pub fn with_repositories(cfg: Config, repos: Arc<Repositories>) -> Self {
        let planner = Arc::new(ReleasePlanner::new(
            repos.history.clone(),
            repos.demand.clone(),
            repos.runs.clone(),
            cfg.planner.options(),
        ));
        Self {
            cfg,
            planner,
            repos,
        }
    }

    pub fn report_layout(&self) -> ReportLayout {
        self.cfg.planner.report_layout()
    }
}

/// Collects baselines, runs the planning engine and stores the result.
pub struct ReleasePlanner {
    history: Arc<dyn TimeSeriesSource>,
    demand: Arc<dyn SectorDemandSource>,
    runs: Arc<dyn RunRepository>,
    options: PlannerOptions,
}

impl ReleasePlanner {
    pub fn new(
        history: Arc<dyn TimeSeriesSource>,
        demand: Arc<dyn SectorDemandSource>,
        runs: Arc<dyn RunRepository>,
        options: PlannerOptions,
    ) -> Self {
        Self {
            history,
            demand,
            runs,
            options,
        }
    }

    pub fn options(&self) -> &PlannerOptions {
        &self.options
    }

    /// Plan without persisting, with an explicit `now`.
    pub async fn run_at(&self, config: &RunConfig, now: DateTime<Utc>) -> Result<PlanOutcome, PlanError> {
        let baselines = collect_baselines(self.history.as_ref(), self.demand.as_ref()).await?;
        plan_release(config, &baselines, now, &self.options)
    }

    pub async fn run(&self, config: &RunConfig) -> Result<PlanOutcome, PlanError> {
        self.run_at(config, Utc::now()).await
    }

    /// Plan and persist a named run. Nothing is stored if planning is rejected.
    #[instrument(skip(self, config), fields(horizon_days = config.horizon_days, scenario = %config.scenario))]
    pub async fn submit(
        &self,
        name: &str,
        config: &RunConfig,
    ) -> Result<(OptimizationRun, Vec<DailyRecord>), PlanError> {
        let created_at = Utc::now();
        let outcome = self.run_at(config, created_at).await?;

        let run = OptimizationRun {
            id: Uuid::new_v4(),
            name: name.to_string(),
            params: RunParams {
                horizon_days: config.horizon_days,
                scenario: config.scenario,
                weights: outcome.weights,
                constraints: config.constraints.clone(),
            },
            status: RunStatus::Completed,
            summary: outcome.summary,
            created_at,
            completed_at: Utc::now(),
        };

        self.runs.save(&run, &outcome.records).await?;
        info!(run_id = %run.id, records = outcome.records.len(), "run stored");
        Ok((run, outcome.records))
    }
}
