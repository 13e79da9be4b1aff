//! 遥测帧存储抽象

use crate::errors::AppError;
use crate::models::{FrameQuery, FrameRow};

/// 遥测帧存储
///
/// 实现方需按 [`FrameQuery`] 的预过滤约定返回数据，
/// 上层只做解析和统计，不再重复过滤。
#[async_trait::async_trait]
pub trait TelemetryStore: Send + Sync {
    /// 区间内全部帧，按接收时间升序
    async fn fetch_frames(&self, query: &FrameQuery) -> Result<Vec<FrameRow>, AppError>;

    /// 区间内最新一帧
    async fn latest_frame(&self, query: &FrameQuery) -> Result<Option<FrameRow>, AppError>;

    /// 区间内最早一帧
    async fn first_frame(&self, query: &FrameQuery) -> Result<Option<FrameRow>, AppError>;
}
