//! Verbena - 新能源遥测统计服务

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::io;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use verbena::{
    config::{LoggingSettings, Settings},
    db::{PostgresPool, RedisPool},
    errors::AppError,
    handlers::OptionalRedis,
    middleware::RequestLogger,
    repositories::FrameRepository,
    routes,
    services::{CacheService, EnergyService},
};

#[actix_web::main]
async fn main() -> io::Result<()> {
    // 加载环境变量
    dotenvy::dotenv().ok();

    let settings = Settings::load().map_err(|e| io::Error::other(format!("配置加载失败: {}", e)))?;

    // 初始化日志
    init_tracing(&settings.logging);
    info!("Verbena 服务启动中...");

    // 连接数据库
    let pg_pool = Arc::new(PostgresPool::new(&settings).await.map_err(startup_error)?);
    info!("数据库连接成功");

    // 连接 Redis（可选）
    let redis_pool: OptionalRedis = if settings.redis.enabled {
        let pool = Arc::new(RedisPool::new().await.map_err(startup_error)?);
        info!("Redis 连接成功，KPI 缓存 {} 秒", settings.cache.kpi_ttl_seconds);
        Some(pool)
    } else {
        info!("Redis 未启用，KPI 不缓存");
        None
    };

    let frame_repo = Arc::new(FrameRepository::new((*pg_pool).clone()));
    let mut energy_service = EnergyService::new(frame_repo);
    if let Some(redis) = &redis_pool {
        energy_service = energy_service.with_cache(
            Arc::new(CacheService::new(redis.clone())),
            settings.cache.kpi_ttl_seconds,
        );
    }
    let energy_service = Arc::new(energy_service);

    let server_addr = settings.server_addr();
    let workers = settings.worker_count();

    info!("服务启动在 http://{}", server_addr);
    info!("工作线程数: {}", workers);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec!["Content-Type", "X-Request-ID"])
            .expose_headers(vec!["X-Request-ID"])
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(RequestLogger::new())
            .wrap(middleware::Compress::default())
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                AppError::ValidationError(err.to_string()).into()
            }))
            .app_data(web::JsonConfig::default().limit(16 * 1024).error_handler(|err, _req| {
                AppError::ValidationError(err.to_string()).into()
            }))
            .app_data(web::Data::new(pg_pool.clone()))
            .app_data(web::Data::new(redis_pool.clone()))
            .app_data(web::Data::new(energy_service.clone()))
            .configure(routes::configure)
    })
    .workers(workers)
    .bind(&server_addr)?
    .run()
    .await
}

fn startup_error(err: AppError) -> io::Error {
    tracing::error!(error = ?err, "启动失败");
    io::Error::other(err.to_string())
}

/// 初始化日志系统
fn init_tracing(logging: &LoggingSettings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("{},verbena=debug", logging.level))
    });

    let registry = tracing_subscriber::registry().with(env_filter);
    if logging.is_json() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}
