pub mod health;
pub mod metrics;
pub mod orders;
pub mod riders;
pub mod settings;
pub mod shipping;
pub mod transactions;
