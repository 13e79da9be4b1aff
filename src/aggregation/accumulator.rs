//! 分桶累计量跟踪
//!
//! 对按时间升序排列的帧逐条解析，为每个（分桶, slot）记录
//! 首/末累计量及其时间，并在每个 slot 内按最小间隔抽样。

use crate::models::FrameRow;
use crate::protocol::{decode, EnergySource};
use crate::utils::{day_key, local_hour, month_key};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

/// 日历分桶单位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketUnit {
    Day,
    Month,
}

/// 单个（分桶, slot）的首末计数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketCounters {
    pub first_wh: u64,
    pub first_at: DateTime<Utc>,
    pub last_wh: u64,
    pub last_at: DateTime<Utc>,
}

impl BucketCounters {
    fn start(wh: u64, at: DateTime<Utc>) -> Self {
        Self {
            first_wh: wh,
            first_at: at,
            last_wh: wh,
            last_at: at,
        }
    }

    fn observe(&mut self, wh: u64, at: DateTime<Utc>) {
        self.last_wh = wh;
        self.last_at = at;
    }

    pub fn delta(&self) -> BucketDelta {
        if self.last_wh >= self.first_wh {
            BucketDelta::Delta(self.last_wh - self.first_wh)
        } else {
            BucketDelta::CounterReset {
                first_wh: self.first_wh,
                last_wh: self.last_wh,
            }
        }
    }
}

/// 分桶内的电量增量
///
/// 计数器回退时不猜测回绕值，单独标记为 `CounterReset`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketDelta {
    Delta(u64),
    CounterReset { first_wh: u64, last_wh: u64 },
}

impl BucketDelta {
    /// 计入统计的 Wh，回退按 0 计
    pub fn wh(self) -> u64 {
        match self {
            BucketDelta::Delta(wh) => wh,
            BucketDelta::CounterReset { .. } => 0,
        }
    }

    pub fn is_reset(self) -> bool {
        matches!(self, BucketDelta::CounterReset { .. })
    }
}

/// 扫描统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub seen: usize,
    pub accepted: usize,
    pub sampled_out: usize,
    pub decode_failed: usize,
    pub no_energy: usize,
    pub source_mismatch: usize,
}

/// 已解析、已归属 slot 的一条读数
#[derive(Debug, Clone, Copy)]
struct SlotReading {
    slot: u8,
    wh: u64,
    at: DateTime<Utc>,
}

/// 通用累计器，分桶键由 `key_fn` 决定
#[derive(Debug)]
pub struct CounterAccumulator<K: Ord> {
    source: EnergySource,
    pinned_slot: Option<u8>,
    spacing: Duration,
    key_fn: fn(DateTime<Utc>) -> K,
    buckets: BTreeMap<(K, u8), BucketCounters>,
    stats: ScanStats,
}

impl<K: Ord> CounterAccumulator<K> {
    pub fn new(
        source: EnergySource,
        pinned_slot: Option<u8>,
        spacing: Duration,
        key_fn: fn(DateTime<Utc>) -> K,
    ) -> Self {
        Self {
            source,
            pinned_slot,
            spacing,
            key_fn,
            buckets: BTreeMap::new(),
            stats: ScanStats::default(),
        }
    }

    /// 处理一个查询窗口内的全部帧（必须按时间升序）
    ///
    /// 抽样按 slot 独立进行：每个 slot 的首行和末行总是记录，
    /// 中间行若距同一 slot 上一条已记录行不足最小间隔则跳过。
    pub fn ingest(&mut self, rows: &[FrameRow]) {
        let readings: Vec<SlotReading> = rows.iter().filter_map(|row| self.read(row)).collect();

        let mut last_of_slot: BTreeMap<u8, usize> = BTreeMap::new();
        for (index, reading) in readings.iter().enumerate() {
            last_of_slot.insert(reading.slot, index);
        }

        let mut anchors: BTreeMap<u8, DateTime<Utc>> = BTreeMap::new();
        for (index, reading) in readings.iter().enumerate() {
            let is_last = last_of_slot.get(&reading.slot) == Some(&index);
            if let Some(anchor_at) = anchors.get(&reading.slot) {
                if !is_last && reading.at - *anchor_at < self.spacing {
                    self.stats.sampled_out += 1;
                    continue;
                }
            }

            anchors.insert(reading.slot, reading.at);
            self.record(reading);
        }
    }

    /// 解析单行，返回可计入的读数
    fn read(&mut self, row: &FrameRow) -> Option<SlotReading> {
        self.stats.seen += 1;

        let frame = match decode(&row.body) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::trace!(at = %row.received_at, error = %e, "跳过无法解析的帧");
                self.stats.decode_failed += 1;
                return None;
            }
        };

        let energy_wh = match frame.cumulative_energy_wh() {
            Some(wh) => wh,
            None => {
                self.stats.no_energy += 1;
                return None;
            }
        };

        if frame.energy_source() != Some(self.source) {
            self.stats.source_mismatch += 1;
            return None;
        }

        Some(SlotReading {
            slot: self.resolve_slot(frame.header().slot),
            wh: energy_wh,
            at: row.received_at,
        })
    }

    fn record(&mut self, reading: &SlotReading) {
        let key = (self.key_fn)(reading.at);
        self.buckets
            .entry((key, reading.slot))
            .and_modify(|counters| counters.observe(reading.wh, reading.at))
            .or_insert_with(|| BucketCounters::start(reading.wh, reading.at));
        self.stats.accepted += 1;
    }

    fn resolve_slot(&self, frame_slot: u8) -> u8 {
        if !self.source.is_multi_slot() {
            return 0;
        }
        self.pinned_slot.unwrap_or(frame_slot)
    }

    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn into_buckets(self) -> BTreeMap<(K, u8), BucketCounters> {
        self.buckets
    }
}

/// 日/月分桶累计器
pub type BucketAccumulator = CounterAccumulator<String>;

impl BucketAccumulator {
    pub fn calendar(
        source: EnergySource,
        unit: BucketUnit,
        pinned_slot: Option<u8>,
        spacing: Duration,
    ) -> Self {
        let key_fn: fn(DateTime<Utc>) -> String = match unit {
            BucketUnit::Day => day_key,
            BucketUnit::Month => month_key,
        };
        Self::new(source, pinned_slot, spacing, key_fn)
    }
}

/// 小时分桶累计器（本地小时 0-23）
pub type HourAccumulator = CounterAccumulator<u32>;

impl HourAccumulator {
    pub fn hourly(source: EnergySource, pinned_slot: Option<u8>, spacing: Duration) -> Self {
        Self::new(source, pinned_slot, spacing, local_hour)
    }
}
