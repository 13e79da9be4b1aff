//! 缓存服务

use crate::db::RedisPool;
use crate::errors::AppError;
use crate::protocol::EnergySource;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

/// 缓存键前缀
pub mod cache_keys {
    pub const KPI_SNAPSHOT: &str = "verbena:kpi";
}

/// KPI 快照缓存键
pub fn kpi_key(device_id: &str, source: EnergySource) -> String {
    format!("{}:{}:{}", cache_keys::KPI_SNAPSHOT, device_id, source)
}

/// 缓存服务
pub struct CacheService {
    redis_pool: Arc<RedisPool>,
}

impl CacheService {
    pub fn new(redis_pool: Arc<RedisPool>) -> Self {
        Self { redis_pool }
    }

    /// 获取缓存
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        self.redis_pool.get(key).await
    }

    /// 设置缓存（带过期时间）
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: u64,
    ) -> Result<(), AppError> {
        self.redis_pool.set_ex(key, value, ttl_seconds).await
    }
}
