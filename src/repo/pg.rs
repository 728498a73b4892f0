#![cfg(feature = "db")]

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use tracing::info;
use uuid::Uuid;

use super::RunRepository;
use crate::domain::{DailyRecord, Metric, OptimizationRun, RunParams, RunStatus, RunSummary, Sector, SectorValues};
use crate::forecast::{SectorDemandSource, TimeSeriesSource};

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS timeseries_points (
    id BIGSERIAL PRIMARY KEY,
    metric TEXT NOT NULL,
    ts TIMESTAMPTZ NOT NULL,
    value DOUBLE PRECISION NOT NULL
);
CREATE INDEX IF NOT EXISTS timeseries_points_metric_ts ON timeseries_points (metric, ts);

CREATE TABLE IF NOT EXISTS sector_demands (
    id BIGSERIAL PRIMARY KEY,
    sector TEXT NOT NULL,
    ts TIMESTAMPTZ NOT NULL,
    value DOUBLE PRECISION NOT NULL
);

CREATE TABLE IF NOT EXISTS optimization_runs (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    params JSONB NOT NULL,
    status TEXT NOT NULL,
    summary JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    completed_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS release_plans (
    run_id UUID NOT NULL REFERENCES optimization_runs (id) ON DELETE CASCADE,
    day_index INTEGER NOT NULL,
    ts TIMESTAMPTZ NOT NULL,
    release_value DOUBLE PRECISION NOT NULL,
    sector_allocations JSONB NOT NULL,
    storage_projection DOUBLE PRECISION NOT NULL,
    risk_index DOUBLE PRECISION NOT NULL,
    PRIMARY KEY (run_id, day_index)
);
"#;

#[derive(Debug, sqlx::FromRow)]
struct RunRow {
    id: Uuid,
    name: String,
    params: Json<RunParams>,
    summary: Json<RunSummary>,
    created_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

impl From<RunRow> for OptimizationRun {
    fn from(row: RunRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            params: row.params.0,
            status: RunStatus::Completed,
            summary: row.summary.0,
            created_at: row.created_at,
            completed_at: row.completed_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PlanRow {
    day_index: i32,
    ts: DateTime<Utc>,
    release_value: f64,
    sector_allocations: Json<SectorValues>,
    storage_projection: f64,
    risk_index: f64,
}

impl From<PlanRow> for DailyRecord {
    fn from(row: PlanRow) -> Self {
        Self {
            day_index: u32::try_from(row.day_index).unwrap_or_default(),
            ts: row.ts,
            release_value: row.release_value,
            sector_allocations: row.sector_allocations.0,
            storage_projection: row.storage_projection,
            risk_index: row.risk_index,
        }
    }
}

pub struct PgStore {
    pub pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .context("connecting to postgres")?;
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        info!("postgres store ready");
        Ok(Self { pool })
    }
}

#[async_trait]
impl TimeSeriesSource for PgStore {
    async fn average(&self, metric: Metric) -> Result<Option<f64>> {
        let avg: Option<f64> =
            sqlx::query_scalar("SELECT AVG(value) FROM timeseries_points WHERE metric = $1")
                .bind(metric.as_ref())
                .fetch_one(&self.pool)
                .await?;
        Ok(avg)
    }

    async fn latest(&self, metric: Metric) -> Result<Option<f64>> {
        let value: Option<f64> = sqlx::query_scalar(
            "SELECT value FROM timeseries_points WHERE metric = $1 ORDER BY ts DESC LIMIT 1",
        )
        .bind(metric.as_ref())
        .fetch_optional(&self.pool)
        .await?;
        Ok(value)
    }
}

#[async_trait]
impl SectorDemandSource for PgStore {
    async fn average_demand(&self, sector: Sector) -> Result<Option<f64>> {
        let avg: Option<f64> =
            sqlx::query_scalar("SELECT AVG(value) FROM sector_demands WHERE sector = $1")
                .bind(sector.as_ref())
                .fetch_one(&self.pool)
                .await?;
        Ok(avg)
    }
}

#[async_trait]
impl RunRepository for PgStore {
    async fn save(&self, run: &OptimizationRun, records: &[DailyRecord]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO optimization_runs (id, name, params, status, summary, created_at, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(run.id)
        .bind(&run.name)
        .bind(Json(&run.params))
        .bind("completed")
        .bind(Json(&run.summary))
        .bind(run.created_at)
        .bind(run.completed_at)
        .execute(&mut *tx)
        .await?;

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO release_plans (run_id, day_index, ts, release_value, sector_allocations, storage_projection, risk_index)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(run.id)
            .bind(i32::try_from(record.day_index)?)
            .bind(record.ts)
            .bind(record.release_value)
            .bind(Json(&record.sector_allocations))
            .bind(record.storage_projection)
            .bind(record.risk_index)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<OptimizationRun>> {
        let row: Option<RunRow> = sqlx::query_as(
            "SELECT id, name, params, summary, created_at, completed_at FROM optimization_runs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn list(&self, limit: usize) -> Result<Vec<OptimizationRun>> {
        let rows: Vec<RunRow> = sqlx::query_as(
            "SELECT id, name, params, summary, created_at, completed_at FROM optimization_runs ORDER BY created_at DESC LIMIT $1",
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn records(&self, run_id: Uuid) -> Result<Vec<DailyRecord>> {
        let rows: Vec<PlanRow> = sqlx::query_as(
            r#"
            SELECT day_index, ts, release_value, sector_allocations, storage_projection, risk_index
            FROM release_plans
            WHERE run_id = $1
            ORDER BY ts ASC
            "#,
        )
        .bind(run_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
