//! 帧解析入口

use super::error::DecodeError;
use super::header::{
    parse_hex_frame, EnergySource, FrameHeader, HEADER_LEN, STATUS_DEGRADED, STATUS_OK,
    TELEMETRY_COMMAND,
};
use super::layout::{EnergyUnit, FieldKind, Variant};
use super::metrics::{kcal_x100_to_kwh, kcal_x100_to_wh, DecodedMetrics};
use super::reader::{ByteReader, Width};
use serde::Serialize;

/// 解析选项
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    /// 是否把降级状态（0x01）视为可用（诊断视图使用）
    pub accept_degraded: bool,
}

/// 解析成功的帧
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecodedFrame {
    Metrics {
        header: FrameHeader,
        variant: Variant,
        metrics: DecodedMetrics,
    },
    /// 能源/设备类型组合无法识别，仅返回帧头信息
    UnknownVariant { header: FrameHeader },
}

impl DecodedFrame {
    pub fn header(&self) -> &FrameHeader {
        match self {
            DecodedFrame::Metrics { header, .. } | DecodedFrame::UnknownVariant { header } => {
                header
            }
        }
    }

    pub fn variant(&self) -> Option<Variant> {
        match self {
            DecodedFrame::Metrics { variant, .. } => Some(*variant),
            DecodedFrame::UnknownVariant { .. } => None,
        }
    }

    pub fn metrics(&self) -> Option<&DecodedMetrics> {
        match self {
            DecodedFrame::Metrics { metrics, .. } => Some(metrics),
            DecodedFrame::UnknownVariant { .. } => None,
        }
    }

    pub fn energy_source(&self) -> Option<EnergySource> {
        self.header().energy_source()
    }

    pub fn cumulative_energy_wh(&self) -> Option<u64> {
        self.metrics().map(|m| m.cumulative_energy_wh)
    }

    pub fn instant_power_w(&self) -> Option<f64> {
        match self {
            DecodedFrame::Metrics {
                variant, metrics, ..
            } => variant.instant_power_w(metrics),
            DecodedFrame::UnknownVariant { .. } => None,
        }
    }

    pub fn conversion_power_w(&self) -> Option<(f64, f64)> {
        match self {
            DecodedFrame::Metrics {
                variant, metrics, ..
            } => variant.conversion_power_w(metrics),
            DecodedFrame::UnknownVariant { .. } => None,
        }
    }
}

/// 解析一条十六进制帧（仅接受正常状态）
pub fn decode(hex_frame: &str) -> Result<DecodedFrame, DecodeError> {
    decode_with(hex_frame, DecodeOptions::default())
}

/// 按选项解析一条十六进制帧
pub fn decode_with(hex_frame: &str, options: DecodeOptions) -> Result<DecodedFrame, DecodeError> {
    let bytes = parse_hex_frame(hex_frame)?;
    decode_bytes(&bytes, options)
}

/// 解析已转换为字节的帧
pub fn decode_bytes(bytes: &[u8], options: DecodeOptions) -> Result<DecodedFrame, DecodeError> {
    let header = FrameHeader::parse(bytes)?;

    if header.command != TELEMETRY_COMMAND {
        return Err(DecodeError::UnsupportedCommand {
            command: header.command,
        });
    }

    let status_accepted = header.status == STATUS_OK
        || (options.accept_degraded && header.status == STATUS_DEGRADED);
    if !status_accepted {
        return Err(DecodeError::DeviceError {
            status: header.status,
        });
    }

    let variant = match header
        .energy_source()
        .and_then(|source| Variant::from_codes(source, header.variant_code))
    {
        Some(variant) => variant,
        None => return Ok(DecodedFrame::UnknownVariant { header }),
    };

    let payload = &bytes[HEADER_LEN..];
    let metrics = decode_payload(variant, payload)?;

    Ok(DecodedFrame::Metrics {
        header,
        variant,
        metrics,
    })
}

/// 按变体偏移表提取数据区
pub fn decode_payload(variant: Variant, payload: &[u8]) -> Result<DecodedMetrics, DecodeError> {
    let layout = variant.layout();
    let reader = ByteReader::new(payload);
    let short = || DecodeError::ShortPayload {
        variant: layout.name,
        expected: layout.min_len(),
        actual: payload.len(),
    };

    if reader.len() < layout.min_len() {
        return Err(short());
    }

    let mut metrics = DecodedMetrics::default();
    for spec in layout.fields {
        let value = match spec.kind {
            FieldKind::U16 => reader.u16_at(spec.offset).map(f64::from),
            FieldKind::Tenths16 => reader.u16_at(spec.offset).map(|v| f64::from(v) / 10.0),
            FieldKind::U32 => reader.u32_at(spec.offset).map(f64::from),
            FieldKind::Temp => reader.temp_at(spec.offset),
            FieldKind::KcalX100 => reader
                .u32_at(spec.offset)
                .map(|v| kcal_x100_to_kwh(u64::from(v))),
        }
        .ok_or_else(short)?;
        metrics.set(spec.field, value);
    }

    // 数据足够长时优先读取 64 位累计量，否则退回 32 位
    let width = if reader.fits(layout.energy_offset, Width::U64) {
        Width::U64
    } else {
        Width::U32
    };
    let raw_energy = reader.read(layout.energy_offset, width).ok_or_else(short)?;

    metrics.cumulative_energy_wh = match layout.energy_unit {
        EnergyUnit::Wh => raw_energy,
        EnergyUnit::KcalX100 => {
            metrics.used_kwh = Some(kcal_x100_to_kwh(raw_energy));
            kcal_x100_to_wh(raw_energy)
        }
    };

    metrics.fault_bits = reader.u16_at(layout.fault_offset).ok_or_else(short)?;
    metrics.faults = fault_labels(metrics.fault_bits, variant.fault_names());
    metrics.is_operating = variant.is_operating(&metrics);

    Ok(metrics)
}

/// 将故障位图转换为可读列表，未定义的位显示为 `bit<N>`
pub fn fault_labels(bits: u16, names: &[&str]) -> Vec<String> {
    (0..16usize)
        .filter(|bit| bits & (1 << bit) != 0)
        .map(|bit| match names.get(bit) {
            Some(name) => (*name).to_string(),
            None => format!("bit{}", bit),
        })
        .collect()
}
