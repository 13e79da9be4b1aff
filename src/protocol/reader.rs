//! 大端字节读取工具

/// 字段宽度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    U16,
    U32,
    U64,
}

impl Width {
    pub const fn bytes(self) -> usize {
        match self {
            Width::U16 => 2,
            Width::U32 => 4,
            Width::U64 => 8,
        }
    }
}

/// 带边界检查的大端读取器
///
/// 所有读取均返回 `Option`，越界时为 `None`，不会 panic。
#[derive(Debug, Clone, Copy)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// 判断 `offset` 起始的 `width` 字段是否完整落在缓冲区内
    pub fn fits(&self, offset: usize, width: Width) -> bool {
        offset
            .checked_add(width.bytes())
            .is_some_and(|end| end <= self.bytes.len())
    }

    /// 按宽度读取无符号整数（统一零扩展为 u64）
    pub fn read(&self, offset: usize, width: Width) -> Option<u64> {
        let end = offset.checked_add(width.bytes())?;
        let slice = self.bytes.get(offset..end)?;
        Some(slice.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
    }

    pub fn u8_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(offset).copied()
    }

    pub fn u16_at(&self, offset: usize) -> Option<u16> {
        self.read(offset, Width::U16).map(|v| v as u16)
    }

    pub fn u32_at(&self, offset: usize) -> Option<u32> {
        self.read(offset, Width::U32).map(|v| v as u32)
    }

    pub fn u64_at(&self, offset: usize) -> Option<u64> {
        self.read(offset, Width::U64)
    }

    /// 读取 2 字节温度
    ///
    /// 首字节高 4 位为符号位（0 为正），其余 12 位为 0.1℃ 单位的绝对值。
    pub fn temp_at(&self, offset: usize) -> Option<f64> {
        let raw = self.u16_at(offset)?;
        let magnitude = f64::from(raw & 0x0FFF) / 10.0;
        if raw >> 12 == 0 {
            Some(magnitude)
        } else {
            Some(-magnitude)
        }
    }
}
