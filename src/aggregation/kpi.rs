//! KPI 快照计算
//!
//! 每个 slot 只取少量边界帧（最新帧、本地零点后首帧、上月/本月首帧），
//! 不扫描全量历史。

use super::policy::{co2_kg, min_payload_len, round2, round3, trees, SourcePolicy};
use crate::errors::AppError;
use crate::models::{FrameQuery, FrameRow, KpiSnapshot};
use crate::protocol::{decode, DecodedFrame, EnergySource};
use crate::repositories::TelemetryStore;
use crate::utils::{local_midnight_utc, local_month_start_utc, previous_local_month_start_utc};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;

/// 逆变效率的合理区间（%）
const EFFICIENCY_RANGE: std::ops::RangeInclusive<f64> = 0.0..=120.0;

/// 某时刻的累计量读数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterReading {
    pub at: DateTime<Utc>,
    pub wh: u64,
}

/// 单个 slot 的边界读数
#[derive(Debug, Clone, Default)]
pub struct SlotReadings {
    pub latest: Option<(DateTime<Utc>, DecodedFrame)>,
    pub midnight: Option<CounterReading>,
    pub previous_month: Option<CounterReading>,
    pub current_month: Option<CounterReading>,
}

impl SlotReadings {
    fn latest_wh(&self) -> Option<u64> {
        self.latest
            .as_ref()
            .and_then(|(_, frame)| frame.cumulative_energy_wh())
    }
}

/// KPI 计算器
pub struct KpiComputer<'a, S: TelemetryStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: TelemetryStore + ?Sized> KpiComputer<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// 计算设备在 `now` 时刻的 KPI 快照
    pub async fn compute(
        &self,
        device_id: &str,
        source: EnergySource,
        now: DateTime<Utc>,
    ) -> Result<KpiSnapshot, AppError> {
        let readings = try_join_all(
            source
                .slots()
                .iter()
                .map(|&slot| self.read_slot(device_id, source, slot, now)),
        )
        .await?;

        Ok(summarize(source, &readings))
    }

    async fn read_slot(
        &self,
        device_id: &str,
        source: EnergySource,
        slot: u8,
        now: DateTime<Utc>,
    ) -> Result<SlotReadings, AppError> {
        let policy = SourcePolicy::for_source(source);
        let slot_filter = source.is_multi_slot().then_some(slot);
        let query = |start: DateTime<Utc>, end: DateTime<Utc>| {
            FrameQuery::new(device_id, source, start, end)
                .with_min_payload_len(min_payload_len(source))
                .with_slot(slot_filter)
        };

        let midnight = local_midnight_utc(now);
        let current_month = local_month_start_utc(now);
        let previous_month = previous_local_month_start_utc(now);

        let latest_query = query(now - policy.recent_window(), now);
        let midnight_query = query(midnight, now);
        let previous_query = query(previous_month, current_month);
        let current_query = query(current_month, now);

        let (latest, midnight, previous, current) = futures::try_join!(
            self.store.latest_frame(&latest_query),
            self.store.first_frame(&midnight_query),
            self.store.first_frame(&previous_query),
            self.store.first_frame(&current_query),
        )?;

        Ok(SlotReadings {
            latest: latest.and_then(|row| decode_row(&row).map(|frame| (row.received_at, frame))),
            midnight: midnight.as_ref().and_then(reading),
            previous_month: previous.as_ref().and_then(reading),
            current_month: current.as_ref().and_then(reading),
        })
    }
}

fn decode_row(row: &FrameRow) -> Option<DecodedFrame> {
    match decode(&row.body) {
        Ok(frame) => Some(frame),
        Err(e) => {
            tracing::trace!(at = %row.received_at, error = %e, "边界帧无法解析");
            None
        }
    }
}

fn reading(row: &FrameRow) -> Option<CounterReading> {
    let wh = decode_row(row)?.cumulative_energy_wh()?;
    Some(CounterReading {
        at: row.received_at,
        wh,
    })
}

/// 由各 slot 的边界读数汇总 KPI
///
/// 没有任何 slot 有最新帧时返回全空快照（无数据，区别于全 0）。
pub fn summarize(source: EnergySource, readings: &[SlotReadings]) -> KpiSnapshot {
    let latest: Vec<&(DateTime<Utc>, DecodedFrame)> =
        readings.iter().filter_map(|r| r.latest.as_ref()).collect();
    if latest.is_empty() {
        return KpiSnapshot::default();
    }

    let latest_at = latest.iter().map(|(at, _)| *at).max();

    let powers: Vec<f64> = latest
        .iter()
        .filter_map(|(_, frame)| frame.instant_power_w())
        .collect();
    let now_kw = (!powers.is_empty()).then(|| round3(powers.iter().sum::<f64>() / 1000.0));

    let total_wh: Option<u64> = readings
        .iter()
        .filter_map(SlotReadings::latest_wh)
        .fold(None, |acc, wh| Some(acc.unwrap_or(0) + wh));
    let total_kwh = total_wh.map(|wh| wh as f64 / 1000.0);
    let co2 = total_kwh.map(|kwh| co2_kg(source, kwh));

    KpiSnapshot {
        now_kw,
        today_kwh: today_kwh(readings),
        total_kwh: total_kwh.map(round2),
        total_mwh: total_kwh.map(|kwh| round3(kwh / 1000.0)),
        co2_kg: co2.map(round2),
        co2_ton: co2.map(|kg| round3(kg / 1000.0)),
        trees: co2.map(trees),
        last_month_avg_kw: last_month_avg_kw(readings),
        inverter_efficiency_pct: efficiency_pct(&latest),
        latest_at,
    }
}

fn today_kwh(readings: &[SlotReadings]) -> Option<f64> {
    let deltas: Vec<u64> = readings
        .iter()
        .filter_map(|r| Some(r.latest_wh()?.saturating_sub(r.midnight?.wh)))
        .collect();
    if deltas.is_empty() {
        return None;
    }
    Some(round2(deltas.iter().sum::<u64>() as f64 / 1000.0))
}

fn last_month_avg_kw(readings: &[SlotReadings]) -> Option<f64> {
    let pairs: Vec<(CounterReading, CounterReading)> = readings
        .iter()
        .filter_map(|r| Some((r.previous_month?, r.current_month?)))
        .collect();

    let start = pairs.iter().map(|(prev, _)| prev.at).min()?;
    let end = pairs.iter().map(|(_, cur)| cur.at).max()?;
    let hours = (end - start).num_seconds() as f64 / 3600.0;
    if hours <= 0.0 {
        return None;
    }

    let delta_wh: u64 = pairs
        .iter()
        .map(|(prev, cur)| cur.wh.saturating_sub(prev.wh))
        .sum();
    Some(round3(delta_wh as f64 / 1000.0 / hours))
}

fn efficiency_pct(latest: &[&(DateTime<Utc>, DecodedFrame)]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = latest
        .iter()
        .filter_map(|(_, frame)| frame.conversion_power_w())
        .collect();
    conversion_efficiency(&pairs)
}

/// 各 slot 的（输入, 输出）功率先分别求和再求比值
fn conversion_efficiency(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.is_empty() {
        return None;
    }

    let input: f64 = pairs.iter().map(|(input, _)| input).sum();
    let output: f64 = pairs.iter().map(|(_, output)| output).sum();
    if input <= 0.0 || output <= 0.0 {
        return None;
    }

    let pct = output / input * 100.0;
    EFFICIENCY_RANGE.contains(&pct).then(|| round2(pct))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_no_latest_means_no_data() {
        let readings = vec![SlotReadings {
            midnight: Some(CounterReading { at: at(1, 0), wh: 10 }),
            ..Default::default()
        }];
        let snapshot = summarize(EnergySource::Solar, &readings);
        assert_eq!(snapshot, KpiSnapshot::default());
        assert!(!snapshot.has_data());
    }

    #[test]
    fn test_last_month_average() {
        let readings = vec![SlotReadings {
            previous_month: Some(CounterReading { at: at(1, 0), wh: 0 }),
            current_month: Some(CounterReading { at: at(2, 0), wh: 24_000 }),
            ..Default::default()
        }];
        assert_eq!(last_month_avg_kw(&readings), Some(1.0));
    }

    #[test]
    fn test_efficiency_ratio() {
        assert_eq!(conversion_efficiency(&[(1500.0, 1400.0)]), Some(93.33));
    }

    #[test]
    fn test_efficiency_sums_slots_before_ratio() {
        // 单独看 slot 0 为 50%，slot 1 为 100%；合计 800 / 1000
        let pairs = [(200.0, 100.0), (800.0, 700.0)];
        assert_eq!(conversion_efficiency(&pairs), Some(80.0));
    }

    #[test]
    fn test_efficiency_null_when_a_side_is_zero() {
        assert_eq!(conversion_efficiency(&[(0.0, 500.0)]), None);
        assert_eq!(conversion_efficiency(&[(500.0, 0.0)]), None);
        assert_eq!(conversion_efficiency(&[]), None);
    }

    #[test]
    fn test_efficiency_null_above_range() {
        // 输出超过输入 1.2 倍视为异常读数
        assert_eq!(conversion_efficiency(&[(1000.0, 1201.0)]), None);
        assert_eq!(conversion_efficiency(&[(1000.0, 1100.0)]), Some(110.0));
    }

    #[test]
    fn test_last_month_average_needs_both_ends() {
        let readings = vec![SlotReadings {
            previous_month: Some(CounterReading { at: at(1, 0), wh: 0 }),
            ..Default::default()
        }];
        assert_eq!(last_month_avg_kw(&readings), None);
    }
}
