//! 分桶结果汇总为电量/CO₂/植树统计行

use super::accumulator::BucketCounters;
use super::policy::{co2_kg, round2, trees};
use crate::models::{SeriesRow, SeriesTotal};
use crate::protocol::EnergySource;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// 汇总结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesSummary {
    pub rows: Vec<SeriesRow>,
    pub total: SeriesTotal,
}

/// 单个分桶跨 slot 合并时的中间状态
struct RowBuilder {
    wh: u64,
    first_at: DateTime<Utc>,
    last_at: DateTime<Utc>,
    counter_reset: bool,
}

/// 时间序列汇总
pub struct SeriesAggregator;

impl SeriesAggregator {
    /// 将（分桶, slot）计数合并为按分桶升序排列的统计行
    pub fn aggregate(
        source: EnergySource,
        buckets: &BTreeMap<(String, u8), BucketCounters>,
    ) -> SeriesSummary {
        let mut merged: BTreeMap<&str, RowBuilder> = BTreeMap::new();

        for ((bucket, _slot), counters) in buckets {
            let delta = counters.delta();
            merged
                .entry(bucket.as_str())
                .and_modify(|row| {
                    row.wh += delta.wh();
                    row.first_at = row.first_at.min(counters.first_at);
                    row.last_at = row.last_at.max(counters.last_at);
                    row.counter_reset |= delta.is_reset();
                })
                .or_insert(RowBuilder {
                    wh: delta.wh(),
                    first_at: counters.first_at,
                    last_at: counters.last_at,
                    counter_reset: delta.is_reset(),
                });
        }

        // BTreeMap 已按分桶键升序
        let rows: Vec<SeriesRow> = merged
            .into_iter()
            .map(|(bucket, row)| {
                let kwh = row.wh as f64 / 1000.0;
                let co2 = co2_kg(source, kwh);
                SeriesRow {
                    bucket: bucket.to_string(),
                    kwh: round2(kwh),
                    co2_kg: round2(co2),
                    trees: trees(co2),
                    first_at: row.first_at,
                    last_at: row.last_at,
                    counter_reset: row.counter_reset,
                }
            })
            .collect();

        let total = Self::totals(&rows);
        SeriesSummary { rows, total }
    }

    /// 将日统计行按月份汇总（年视图）
    pub fn roll_up_months(rows: &[SeriesRow]) -> Vec<SeriesRow> {
        let mut months: BTreeMap<String, SeriesRow> = BTreeMap::new();

        for row in rows {
            let month: String = row.bucket.chars().take(7).collect();
            months
                .entry(month.clone())
                .and_modify(|acc| {
                    acc.kwh += row.kwh;
                    acc.co2_kg += row.co2_kg;
                    acc.trees += row.trees;
                    acc.first_at = acc.first_at.min(row.first_at);
                    acc.last_at = acc.last_at.max(row.last_at);
                    acc.counter_reset |= row.counter_reset;
                })
                .or_insert_with(|| SeriesRow {
                    bucket: month,
                    ..row.clone()
                });
        }

        months
            .into_values()
            .map(|mut row| {
                row.kwh = round2(row.kwh);
                row.co2_kg = round2(row.co2_kg);
                row
            })
            .collect()
    }

    /// 合计：各行先保留 2 位小数再求和
    pub fn totals(rows: &[SeriesRow]) -> SeriesTotal {
        let kwh: f64 = rows.iter().map(|row| round2(row.kwh)).sum();
        let co2: f64 = rows.iter().map(|row| round2(row.co2_kg)).sum();
        SeriesTotal {
            kwh: round2(kwh),
            co2_kg: round2(co2),
            trees: rows.iter().map(|row| row.trees).sum(),
        }
    }
}
