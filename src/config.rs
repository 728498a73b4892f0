use anyhow::Result;
use figment::{providers::{Env, Format, Serialized, Toml}, Figment};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::export::ReportLayout;
use crate::optimizer::{CorrectionMode, PlannerOptions, DEFAULT_MAX_HORIZON_DAYS};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub planner: PlannerConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub enable_cors: bool,
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            enable_cors: false,
            cors_origin: "http://localhost:3000".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub max_horizon_days: u32,
    pub correction: CorrectionMode,
    pub report_rows_per_page: usize,
    pub report_max_rows: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        let layout = ReportLayout::default();
        Self {
            max_horizon_days: DEFAULT_MAX_HORIZON_DAYS,
            correction: CorrectionMode::default(),
            report_rows_per_page: layout.rows_per_page,
            report_max_rows: layout.max_rows,
        }
    }
}

impl PlannerConfig {
    pub fn options(&self) -> PlannerOptions {
        PlannerOptions {
            max_horizon_days: self.max_horizon_days,
            correction: self.correction,
        }
    }

    pub fn report_layout(&self) -> ReportLayout {
        ReportLayout {
            rows_per_page: self.report_rows_per_page,
            max_rows: self.report_max_rows,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub url: Option<String>,
    /// Fill an empty in-memory store with synthetic history at startup.
    pub demo_auto_seed: bool,
    pub seed: u64,
    pub seed_days: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            url: None,
            demo_auto_seed: true,
            seed: 1402,
            seed_days: 5 * 365,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("RRP__").split("__"));
        Ok(figment.extract()?)
    }
}
