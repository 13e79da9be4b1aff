//! 业务逻辑层（Service）

mod cache_service;
mod energy_service;

pub use cache_service::{cache_keys, kpi_key, CacheService};
pub use energy_service::{EnergyService, PgEnergyService};
