//! 遥测帧协议解析
//!
//! 帧格式：空格分隔的两位十六进制字节，
//! 第 0 字节命令字、第 1 字节能源代码、第 2 字节设备类型、
//! 第 3 字节 slot、第 4 字节状态码，其后为各设备类型的数据区。

mod decoder;
mod error;
mod header;
mod layout;
mod metrics;
mod reader;

pub use decoder::{decode, decode_bytes, decode_payload, decode_with, fault_labels, DecodeOptions, DecodedFrame};
pub use error::DecodeError;
pub use header::{
    hex_len_for_bytes, parse_hex_frame, EnergySource, FrameHeader, HEADER_LEN, STATUS_DEGRADED,
    STATUS_OK, TELEMETRY_COMMAND, TELEMETRY_COMMAND_PREFIX,
};
pub use layout::{rules, EnergyUnit, FieldKind, FieldSpec, Layout, Variant};
pub use metrics::{kcal_x100_to_kwh, kcal_x100_to_wh, DecodedMetrics, Field, KCAL_PER_KWH};
pub use reader::{ByteReader, Width};
