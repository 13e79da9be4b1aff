//! Redis 连接管理（KPI 快照缓存）

use crate::config::Settings;
use crate::errors::AppError;
use redis::aio::ConnectionManager;
use redis::Client;
use secrecy::ExposeSecret;

/// Redis 连接池包装
///
/// 仅由 `CacheService` 用来按（设备, 能源）缓存 KPI 快照；
/// `redis.enabled = false` 时不会创建。
#[derive(Clone)]
pub struct RedisPool {
    manager: ConnectionManager,
}

impl RedisPool {
    /// 创建新的 Redis 连接
    pub async fn new() -> Result<Self, AppError> {
        let redis_url = Settings::redis_url()?;

        let client = Client::open(redis_url.expose_secret().as_str())
            .map_err(|e| AppError::ConfigError(format!("Redis URL 无效: {}", e)))?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            tracing::error!("Redis 连接失败: {}", e);
            AppError::RedisError(e)
        })?;

        tracing::info!("Redis 连接已建立");

        Ok(Self { manager })
    }

    /// 健康检查
    pub async fn health_check(&self) -> Result<(), AppError> {
        let mut conn = self.manager.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(AppError::RedisError)
    }

    /// 设置缓存（带过期时间）
    pub async fn set_ex<T: serde::Serialize>(
        &self,
        key: &str,
        value: &T,
        expiry_seconds: u64,
    ) -> Result<(), AppError> {
        let mut conn = self.manager.clone();
        let serialized = serde_json::to_string(value)
            .map_err(|e| AppError::InternalError(format!("序列化失败: {}", e)))?;

        redis::cmd("SETEX")
            .arg(key)
            .arg(expiry_seconds)
            .arg(serialized)
            .query_async(&mut conn)
            .await
            .map_err(AppError::RedisError)
    }

    /// 获取缓存
    pub async fn get<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, AppError> {
        let mut conn = self.manager.clone();
        let result: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(AppError::RedisError)?;

        match result {
            Some(data) => {
                let value = serde_json::from_str(&data)
                    .map_err(|e| AppError::InternalError(format!("反序列化失败: {}", e)))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}
