//! 单日 24 小时电量

use super::accumulator::HourAccumulator;
use super::policy::{round2, SourcePolicy};
use crate::models::{FrameRow, HourlyEntry};
use crate::protocol::EnergySource;
use crate::utils::local_day_bounds_utc;
use chrono::NaiveDate;

/// 小时电量计算
pub struct HourlyComputer {
    source: EnergySource,
    pinned_slot: Option<u8>,
}

impl HourlyComputer {
    pub fn new(source: EnergySource, pinned_slot: Option<u8>) -> Self {
        Self {
            source,
            pinned_slot,
        }
    }

    /// 计算本地日期 `date` 的 24 个小时分桶
    ///
    /// `rows` 须按时间升序；不属于该日的行会被忽略。
    /// 无数据的小时输出 0，结果总是 24 项。
    pub fn compute(&self, date: NaiveDate, rows: &[FrameRow]) -> Vec<HourlyEntry> {
        let (start, end) = local_day_bounds_utc(date);
        let from = rows.partition_point(|row| row.received_at < start);
        let to = rows.partition_point(|row| row.received_at < end);
        let day_rows = &rows[from..to.max(from)];

        let policy = SourcePolicy::for_source(self.source);
        let mut accumulator =
            HourAccumulator::hourly(self.source, self.pinned_slot, policy.hourly_spacing());
        accumulator.ingest(day_rows);

        let stats = accumulator.stats();
        tracing::debug!(
            source = %self.source,
            %date,
            seen = stats.seen,
            accepted = stats.accepted,
            sampled_out = stats.sampled_out,
            decode_failed = stats.decode_failed,
            "小时统计扫描完成"
        );

        let mut wh = [0u64; 24];
        let mut reset = [false; 24];
        for ((hour, _slot), counters) in accumulator.into_buckets() {
            let index = hour as usize;
            if index >= 24 {
                continue;
            }
            let delta = counters.delta();
            wh[index] += delta.wh();
            reset[index] |= delta.is_reset();
        }

        (0..24u8)
            .map(|hour| HourlyEntry {
                hour,
                kwh: round2(wh[hour as usize] as f64 / 1000.0),
                counter_reset: reset[hour as usize],
            })
            .collect()
    }

    /// 24 小时合计
    pub fn total_kwh(entries: &[HourlyEntry]) -> f64 {
        round2(entries.iter().map(|entry| entry.kwh).sum())
    }
}
