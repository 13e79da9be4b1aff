//! 健康检查 API 处理器

use crate::db::{PostgresPool, RedisPool};
use crate::models::{HealthCheckResponse, ServiceStatus};
use actix_web::{web, HttpResponse};
use std::sync::Arc;
use std::time::Instant;

/// 应用启动时间
static START_TIME: once_cell::sync::Lazy<Instant> = once_cell::sync::Lazy::new(Instant::now);

/// Redis 为可选依赖，未启用时不注册
pub type OptionalRedis = Option<Arc<RedisPool>>;

/// 简单健康检查（含依赖状态）
pub async fn health(
    pg_pool: web::Data<Arc<PostgresPool>>,
    redis_pool: web::Data<OptionalRedis>,
) -> HttpResponse {
    let db_start = Instant::now();
    let db_status = match pg_pool.health_check().await {
        Ok(_) => ServiceStatus::healthy(db_start.elapsed().as_millis() as u64),
        Err(_) => ServiceStatus::unhealthy(),
    };

    let redis_status = match redis_pool.get_ref() {
        Some(redis) => {
            let redis_start = Instant::now();
            match redis.health_check().await {
                Ok(_) => ServiceStatus::healthy(redis_start.elapsed().as_millis() as u64),
                Err(_) => ServiceStatus::unhealthy(),
            }
        }
        None => ServiceStatus::disabled(),
    };

    let response = HealthCheckResponse {
        status: if db_status.is_ok() && redis_status.is_ok() {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
        redis: redis_status,
        uptime_seconds: START_TIME.elapsed().as_secs(),
    };

    HttpResponse::Ok().json(response)
}

/// 就绪检查（用于 Kubernetes）
pub async fn ready(pg_pool: web::Data<Arc<PostgresPool>>) -> HttpResponse {
    // 缓存不可用时仍可直接查库，只要求数据库可用
    if pg_pool.health_check().await.is_ok() {
        HttpResponse::Ok().json(serde_json::json!({
            "ready": true
        }))
    } else {
        HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "ready": false,
            "database": false
        }))
    }
}

/// 存活检查（用于 Kubernetes）
pub async fn live() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "alive": true
    }))
}
