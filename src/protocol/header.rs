//! 帧头定义与十六进制帧解析

use super::error::DecodeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 遥测应答命令字
pub const TELEMETRY_COMMAND: u8 = 0x14;

/// 遥测命令字的十六进制前缀（供查询层过滤）
pub const TELEMETRY_COMMAND_PREFIX: &str = "14";

/// 帧头长度（字节）
pub const HEADER_LEN: usize = 5;

/// 状态码：正常
pub const STATUS_OK: u8 = 0x00;

/// 状态码：降级运行（仅诊断视图可选择接受）
pub const STATUS_DEGRADED: u8 = 0x01;

/// 能源种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergySource {
    Solar,
    SolarThermal,
    Geothermal,
    Wind,
    FuelCell,
    Ess,
}

impl EnergySource {
    pub const ALL: [EnergySource; 6] = [
        EnergySource::Solar,
        EnergySource::SolarThermal,
        EnergySource::Geothermal,
        EnergySource::Wind,
        EnergySource::FuelCell,
        EnergySource::Ess,
    ];

    /// 从帧内能源代码解析
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(EnergySource::Solar),
            0x02 => Some(EnergySource::SolarThermal),
            0x03 => Some(EnergySource::Geothermal),
            0x04 => Some(EnergySource::Wind),
            0x06 => Some(EnergySource::FuelCell),
            0x07 => Some(EnergySource::Ess),
            _ => None,
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            EnergySource::Solar => 0x01,
            EnergySource::SolarThermal => 0x02,
            EnergySource::Geothermal => 0x03,
            EnergySource::Wind => 0x04,
            EnergySource::FuelCell => 0x06,
            EnergySource::Ess => 0x07,
        }
    }

    /// 是否支持多路（multi）寻址，目前只有太阳能有多个子阵列
    pub const fn is_multi_slot(self) -> bool {
        matches!(self, EnergySource::Solar)
    }

    /// 该能源实际使用的 slot 列表
    pub fn slots(self) -> &'static [u8] {
        if self.is_multi_slot() {
            &[0, 1, 2, 3]
        } else {
            &[0]
        }
    }

    /// 热能类能源（按热量计算 CO₂ 减排）
    pub const fn is_thermal(self) -> bool {
        matches!(self, EnergySource::SolarThermal | EnergySource::Geothermal)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            EnergySource::Solar => "solar",
            EnergySource::SolarThermal => "solar_thermal",
            EnergySource::Geothermal => "geothermal",
            EnergySource::Wind => "wind",
            EnergySource::FuelCell => "fuel_cell",
            EnergySource::Ess => "ess",
        }
    }
}

impl fmt::Display for EnergySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 帧头（前 5 字节）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameHeader {
    pub command: u8,
    pub source_code: u8,
    pub variant_code: u8,
    pub slot: u8,
    pub status: u8,
}

impl FrameHeader {
    /// 从完整帧字节中读取帧头
    pub fn parse(bytes: &[u8]) -> Result<Self, DecodeError> {
        match bytes {
            [command, source_code, variant_code, slot, status, ..] => Ok(Self {
                command: *command,
                source_code: *source_code,
                variant_code: *variant_code,
                slot: *slot,
                status: *status,
            }),
            _ => Err(DecodeError::ShortFrame { len: bytes.len() }),
        }
    }

    pub fn energy_source(&self) -> Option<EnergySource> {
        EnergySource::from_code(self.source_code)
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

/// 解析空白分隔的十六进制字节串，如 `"14 01 01 00 00 ..."`
pub fn parse_hex_frame(raw: &str) -> Result<Vec<u8>, DecodeError> {
    raw.split_whitespace()
        .enumerate()
        .map(|(index, token)| {
            if token.len() > 2 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(DecodeError::MalformedHex { index });
            }
            u8::from_str_radix(token, 16).map_err(|_| DecodeError::MalformedHex { index })
        })
        .collect()
}

/// 帧总字节数对应的十六进制串长度（含分隔空格）
pub const fn hex_len_for_bytes(bytes: usize) -> usize {
    if bytes == 0 {
        0
    } else {
        bytes * 3 - 1
    }
}
