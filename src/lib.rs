pub mod api;
pub mod config;
pub mod db;
pub mod engine;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod pricing;
pub mod services;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::notifier::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: AppConfig,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
    pub notifier: Option<Arc<Notifier>>,
}
