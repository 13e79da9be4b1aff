//! 发电量统计模型

use crate::protocol::{DecodeError, DecodedFrame, EnergySource};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// 统计视图
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesView {
    /// 按日分桶
    #[default]
    Daily,
    /// 直接按月分桶
    Monthly,
    /// 先按日分桶再汇总为月
    Yearly,
}

/// 时间序列查询参数
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SeriesQueryParams {
    pub source: EnergySource,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub view: SeriesView,
    #[validate(range(max = 3, message = "slot 应在 0-3 之间"))]
    pub slot: Option<u8>,
}

impl SeriesQueryParams {
    /// 验证时间范围（最长 400 天）
    pub fn validate_time_range(&self) -> Result<(), String> {
        if self.start >= self.end {
            return Err("开始时间必须早于结束时间".to_string());
        }

        let max_days = 400;
        if (self.end - self.start).num_days() > max_days {
            return Err(format!("查询时间范围不能超过 {} 天", max_days));
        }

        Ok(())
    }
}

/// 单个分桶的统计行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRow {
    /// `YYYY-MM-DD` 或 `YYYY-MM`
    pub bucket: String,
    pub kwh: f64,
    pub co2_kg: f64,
    pub trees: u64,
    pub first_at: DateTime<Utc>,
    pub last_at: DateTime<Utc>,
    /// 分桶内检测到计数器回退（该 slot 的电量按 0 计）
    pub counter_reset: bool,
}

/// 合计
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesTotal {
    pub kwh: f64,
    pub co2_kg: f64,
    pub trees: u64,
}

/// 实际查询的 UTC 区间
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeUtc {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// 时间序列响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesResponse {
    pub device_id: String,
    pub source: EnergySource,
    pub view: SeriesView,
    pub range_utc: RangeUtc,
    /// 窗口内没有任何可用帧时为 false（区别于“全部为 0”）
    pub has_data: bool,
    pub rows: Vec<SeriesRow>,
    pub total: SeriesTotal,
}

/// KPI 查询参数
#[derive(Debug, Clone, Deserialize)]
pub struct KpiQueryParams {
    pub source: EnergySource,
}

/// KPI 快照
///
/// 所有字段可为空：为空表示数据不足，而不是 0。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiSnapshot {
    pub now_kw: Option<f64>,
    pub today_kwh: Option<f64>,
    pub total_kwh: Option<f64>,
    pub total_mwh: Option<f64>,
    pub co2_kg: Option<f64>,
    pub co2_ton: Option<f64>,
    pub trees: Option<u64>,
    pub last_month_avg_kw: Option<f64>,
    pub inverter_efficiency_pct: Option<f64>,
    pub latest_at: Option<DateTime<Utc>>,
}

impl KpiSnapshot {
    pub fn has_data(&self) -> bool {
        self.latest_at.is_some()
    }
}

/// KPI 响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiResponse {
    pub device_id: String,
    pub source: EnergySource,
    pub has_data: bool,
    #[serde(flatten)]
    pub snapshot: KpiSnapshot,
}

/// 小时统计查询参数
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct HourlyQueryParams {
    pub source: EnergySource,
    /// 本地日期
    pub date: NaiveDate,
    #[validate(range(max = 3, message = "slot 应在 0-3 之间"))]
    pub slot: Option<u8>,
}

/// 单小时电量
///
/// 无数据的小时返回 0 而不是空值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyEntry {
    pub hour: u8,
    pub kwh: f64,
    pub counter_reset: bool,
}

/// 小时统计响应（固定 24 项）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyResponse {
    pub device_id: String,
    pub source: EnergySource,
    pub date: NaiveDate,
    pub hours: Vec<HourlyEntry>,
    pub total_kwh: f64,
}

/// 诊断解析请求
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DecodeFrameRequest {
    #[validate(length(min = 1, max = 4096, message = "帧长度应在 1-4096 字符之间"))]
    pub frame: String,
    /// 是否接受降级状态
    #[serde(default)]
    pub accept_degraded: bool,
}

/// 诊断解析结果
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum DecodeFrameResponse {
    Decoded { frame: DecodedFrame },
    Failed { error: DecodeError, message: String },
}

impl From<Result<DecodedFrame, DecodeError>> for DecodeFrameResponse {
    fn from(result: Result<DecodedFrame, DecodeError>) -> Self {
        match result {
            Ok(frame) => DecodeFrameResponse::Decoded { frame },
            Err(error) => DecodeFrameResponse::Failed {
                message: error.to_string(),
                error,
            },
        }
    }
}
