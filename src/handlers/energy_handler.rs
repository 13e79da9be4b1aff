//! 发电量统计与帧诊断 API 处理器

use crate::errors::AppError;
use crate::middleware::RequestId;
use crate::models::{
    ApiResponse, DecodeFrameRequest, DecodeFrameResponse, HourlyQueryParams, KpiQueryParams,
    SeriesQueryParams,
};
use crate::protocol::{decode_with, DecodeOptions};
use crate::services::PgEnergyService;
use crate::utils::validate_device_id;
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

fn request_id(req: &HttpRequest) -> Option<String> {
    req.extensions().get::<RequestId>().map(|r| r.0.clone())
}

/// 日/月/年时间序列
pub async fn get_series(
    req: HttpRequest,
    energy_service: web::Data<Arc<PgEnergyService>>,
    path: web::Path<String>,
    query: web::Query<SeriesQueryParams>,
) -> Result<HttpResponse, AppError> {
    let device_id = path.into_inner();
    validate_device_id(&device_id)?;
    query
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let response = energy_service.series(&device_id, &query).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(response).with_request_id(request_id(&req))))
}

/// KPI 快照
pub async fn get_kpi(
    req: HttpRequest,
    energy_service: web::Data<Arc<PgEnergyService>>,
    path: web::Path<String>,
    query: web::Query<KpiQueryParams>,
) -> Result<HttpResponse, AppError> {
    let device_id = path.into_inner();
    validate_device_id(&device_id)?;

    let response = energy_service
        .kpi(&device_id, query.source, Utc::now())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(response).with_request_id(request_id(&req))))
}

/// 本地某日 24 小时电量
pub async fn get_hourly(
    req: HttpRequest,
    energy_service: web::Data<Arc<PgEnergyService>>,
    path: web::Path<String>,
    query: web::Query<HourlyQueryParams>,
) -> Result<HttpResponse, AppError> {
    let device_id = path.into_inner();
    validate_device_id(&device_id)?;
    query
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let response = energy_service.hourly(&device_id, &query).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(response).with_request_id(request_id(&req))))
}

/// 诊断解析单帧
///
/// 解析失败也返回 200，失败原因放在响应体中。
pub async fn decode_frame(
    req: HttpRequest,
    body: web::Json<DecodeFrameRequest>,
) -> Result<HttpResponse, AppError> {
    body.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let options = DecodeOptions {
        accept_degraded: body.accept_degraded,
    };
    let response = DecodeFrameResponse::from(decode_with(&body.frame, options));

    Ok(HttpResponse::Ok().json(ApiResponse::success(response).with_request_id(request_id(&req))))
}
