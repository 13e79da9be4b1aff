//! 路由配置模块

use crate::handlers;
use actix_web::web;

/// 配置所有路由
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // 健康检查路由
        .service(
            web::scope("/health")
                .route("", web::get().to(handlers::health))
                .route("/ready", web::get().to(handlers::ready))
                .route("/live", web::get().to(handlers::live)),
        )
        // API v1 路由
        .service(
            web::scope("/api/v1")
                .service(
                    web::scope("/energy/{device_id}")
                        .route("/series", web::get().to(handlers::get_series))
                        .route("/kpi", web::get().to(handlers::get_kpi))
                        .route("/hourly", web::get().to(handlers::get_hourly)),
                )
                .service(
                    web::scope("/frames")
                        .route("/decode", web::post().to(handlers::decode_frame)),
                ),
        );
}
