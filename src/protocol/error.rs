//! 帧解析错误

use serde::Serialize;

/// 单帧解析失败原因
///
/// 所有错误均为局部错误：统计层遇到后跳过该行继续处理。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecodeError {
    #[error("帧长度不足: {len} 字节")]
    ShortFrame { len: usize },

    #[error("第 {index} 个十六进制字节无效")]
    MalformedHex { index: usize },

    #[error("不支持的命令字: 0x{command:02X}")]
    UnsupportedCommand { command: u8 },

    #[error("设备上报异常状态: 0x{status:02X}")]
    DeviceError { status: u8 },

    #[error("{variant} 数据长度不足: 需要 {expected} 字节, 实际 {actual} 字节")]
    ShortPayload {
        variant: &'static str,
        expected: usize,
        actual: usize,
    },
}
