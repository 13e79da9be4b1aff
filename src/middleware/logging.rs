//! 请求日志中间件

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error, HttpMessage,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use std::rc::Rc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 请求 ID 头
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// 请求 ID（存储在请求扩展中）
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// 日志中间件
///
/// 沿用调用方传入的 `X-Request-ID`，没有则生成，并回写到响应头。
#[derive(Default)]
pub struct RequestLogger;

impl RequestLogger {
    pub fn new() -> Self {
        Self
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequestLoggerMiddleware {
            service: Rc::new(service),
        })
    }
}

pub struct RequestLoggerMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let start = Instant::now();

        let request_id = req
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .filter(|s| !s.is_empty() && s.len() <= 128)
            .map(|s| s.to_string())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let method = req.method().to_string();
        let path = req.path().to_string();
        // 健康检查探针只记 debug
        let is_probe = path.starts_with("/health");

        req.extensions_mut().insert(RequestId(request_id.clone()));

        Box::pin(async move {
            let result = service.call(req).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(mut res) => {
                    let status = res.status().as_u16();
                    if status >= 400 {
                        warn!(request_id = %request_id, %method, %path, status, duration_ms, "请求完成（错误）");
                    } else if is_probe {
                        debug!(request_id = %request_id, %method, %path, status, duration_ms, "请求完成");
                    } else {
                        info!(request_id = %request_id, %method, %path, status, duration_ms, "请求完成");
                    }

                    if let Ok(value) = HeaderValue::from_str(&request_id) {
                        res.headers_mut()
                            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
                    }
                    Ok(res)
                }
                Err(e) => {
                    warn!(request_id = %request_id, %method, %path, error = %e, duration_ms, "请求失败");
                    Err(e)
                }
            }
        })
    }
}
