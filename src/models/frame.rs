//! 遥测帧存储模型

use crate::protocol::{
    hex_len_for_bytes, parse_hex_frame, EnergySource, FrameHeader, HEADER_LEN, STATUS_OK,
    TELEMETRY_COMMAND_PREFIX,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 存储中的一条原始帧
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FrameRow {
    pub received_at: DateTime<Utc>,
    /// 空格分隔的十六进制帧
    pub body: String,
}

impl FrameRow {
    pub fn new(received_at: DateTime<Utc>, body: impl Into<String>) -> Self {
        Self {
            received_at,
            body: body.into(),
        }
    }
}

/// 帧查询条件
///
/// 描述调用方向存储层发起查询时应满足的预过滤约定：
/// 设备、能源种类、`[start, end)` 时间区间、命令字前缀、最小长度，
/// 以及可选的正常状态过滤和 slot 过滤。
#[derive(Debug, Clone, PartialEq)]
pub struct FrameQuery {
    pub device_id: String,
    pub source: EnergySource,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub command_prefix: &'static str,
    /// 数据区最小字节数
    pub min_payload_len: usize,
    pub ok_only: bool,
    pub slot: Option<u8>,
}

impl FrameQuery {
    pub fn new(
        device_id: impl Into<String>,
        source: EnergySource,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            source,
            start,
            end,
            command_prefix: TELEMETRY_COMMAND_PREFIX,
            min_payload_len: 0,
            ok_only: true,
            slot: None,
        }
    }

    pub fn with_min_payload_len(mut self, len: usize) -> Self {
        self.min_payload_len = len;
        self
    }

    pub fn with_slot(mut self, slot: Option<u8>) -> Self {
        self.slot = slot;
        self
    }

    /// 十六进制串的最小长度
    pub fn min_hex_len(&self) -> usize {
        hex_len_for_bytes(HEADER_LEN + self.min_payload_len)
    }

    /// 能源代码的两位十六进制表示
    pub fn source_hex(&self) -> String {
        format!("{:02X}", self.source.code())
    }

    /// slot 的两位十六进制表示
    pub fn slot_hex(&self) -> Option<String> {
        self.slot.map(|slot| format!("{:02X}", slot))
    }

    /// 判断一条帧是否满足本查询的预过滤条件（不含设备 ID）
    pub fn matches(&self, row: &FrameRow) -> bool {
        if row.received_at < self.start || row.received_at >= self.end {
            return false;
        }
        if !row.body.starts_with(self.command_prefix) || row.body.len() < self.min_hex_len() {
            return false;
        }
        let header = match parse_hex_frame(&row.body)
            .ok()
            .and_then(|bytes| FrameHeader::parse(&bytes).ok())
        {
            Some(header) => header,
            None => return false,
        };

        header.source_code == self.source.code()
            && (!self.ok_only || header.status == STATUS_OK)
            && self.slot.map_or(true, |slot| header.slot == slot)
    }
}
