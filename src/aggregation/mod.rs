//! 发电量统计
//!
//! 对按时间升序的原始帧做分桶累计、时间序列汇总、KPI 与小时统计。
//! 全部为针对单次请求新建的数据结构，不共享可变状态。

mod accumulator;
mod hourly;
mod kpi;
mod policy;
mod series;

pub use accumulator::{
    BucketAccumulator, BucketCounters, BucketDelta, BucketUnit, CounterAccumulator,
    HourAccumulator, ScanStats,
};
pub use hourly::HourlyComputer;
pub use kpi::{summarize as summarize_kpi, CounterReading, KpiComputer, SlotReadings};
pub use policy::{
    co2_kg, emission_factor, min_payload_len, round2, round3, trees, SourcePolicy,
    ELECTRIC_EMISSION_FACTOR, KG_CO2_PER_TREE, THERMAL_EMISSION_FACTOR,
};
pub use series::{SeriesAggregator, SeriesSummary};
