//! 测试辅助工具
#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};

/// 本地时间（UTC+9）转 UTC
pub fn kst(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).unwrap() - Duration::hours(9)
}

/// 数据区构造器（大端）
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    bytes: Vec<u8>,
}

impl PayloadBuilder {
    pub fn zeroed(len: usize) -> Self {
        Self {
            bytes: vec![0; len],
        }
    }

    pub fn u16(mut self, offset: usize, value: u16) -> Self {
        self.bytes[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
        self
    }

    pub fn u32(mut self, offset: usize, value: u32) -> Self {
        self.bytes[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
        self
    }

    pub fn u64(mut self, offset: usize, value: u64) -> Self {
        self.bytes[offset..offset + 8].copy_from_slice(&value.to_be_bytes());
        self
    }

    /// 温度：十分之一度，负数置符号位
    pub fn temp(self, offset: usize, tenths: i16) -> Self {
        let magnitude = tenths.unsigned_abs() & 0x0FFF;
        let raw = if tenths < 0 { 0x1000 | magnitude } else { magnitude };
        self.u16(offset, raw)
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// 字节序列转为空格分隔的十六进制帧
pub fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// 组装完整帧
pub fn frame_hex(source: u8, variant: u8, slot: u8, status: u8, payload: &[u8]) -> String {
    let mut bytes = vec![0x14, source, variant, slot, status];
    bytes.extend_from_slice(payload);
    to_hex(&bytes)
}

/// 太阳能单相帧（64 位累计量）
pub fn solar_frame(slot: u8, pv_w: u16, out_w: u16, energy_wh: u64) -> String {
    let payload = PayloadBuilder::zeroed(26)
        .u16(0, 380)
        .u16(4, pv_w)
        .u16(6, 220)
        .u16(10, out_w)
        .u16(12, 10)
        .u16(14, 600)
        .u64(18, energy_wh)
        .build();
    frame_hex(0x01, 0x01, slot, 0x00, &payload)
}

/// 风力帧
pub fn wind_frame(post_w: u16, energy_wh: u64) -> String {
    let payload = PayloadBuilder::zeroed(26)
        .u16(4, post_w + 100)
        .u16(10, post_w)
        .u64(18, energy_wh)
        .build();
    frame_hex(0x04, 0x01, 0x00, 0x00, &payload)
}

/// 太阳热自然循环帧，累计使用热量为 kcal×100
pub fn thermal_natural_frame(usage_flow_x10: u16, used_kcal_x100: u64) -> String {
    let payload = PayloadBuilder::zeroed(18)
        .temp(0, 550)
        .temp(2, 150)
        .temp(4, 450)
        .u16(6, usage_flow_x10)
        .u64(10, used_kcal_x100)
        .build();
    frame_hex(0x02, 0x02, 0x00, 0x00, &payload)
}

/// 地热热泵帧
pub fn geo_heat_pump_frame(heat_w: u32, energy_wh: u64) -> String {
    let payload = PayloadBuilder::zeroed(28)
        .u16(0, 380)
        .u16(4, 1500)
        .u32(6, heat_w)
        .u64(20, energy_wh)
        .build();
    frame_hex(0x03, 0x01, 0x00, 0x00, &payload)
}

/// 断言结果是成功的
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(val) => val,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// 断言结果是错误的
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(val) => panic!("Expected Err, got Ok: {:?}", val),
            Err(e) => e,
        }
    };
}
