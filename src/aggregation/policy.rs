//! 各能源种类的统计策略与换算系数

use crate::protocol::{EnergySource, Variant};
use chrono::Duration;

/// 电力类 CO₂ 排放系数（kg/kWh）
pub const ELECTRIC_EMISSION_FACTOR: f64 = 0.4781;

/// 热能类 CO₂ 排放系数（kg/kWh）
pub const THERMAL_EMISSION_FACTOR: f64 = 0.2016;

/// 一棵树每年吸收的 CO₂（kg）
pub const KG_CO2_PER_TREE: f64 = 6.6;

/// 统计策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePolicy {
    /// 日/月统计的抽样最小间隔（秒）
    pub series_spacing_secs: i64,
    /// 小时统计的抽样最小间隔（秒）
    pub hourly_spacing_secs: i64,
    /// 最近窗口天数（KPI 回溯范围）
    pub recent_window_days: i64,
    /// 时间序列查询是否限制在最近窗口内
    pub clamps_series_range: bool,
}

impl SourcePolicy {
    pub const fn for_source(source: EnergySource) -> Self {
        match source {
            EnergySource::Solar => SourcePolicy {
                series_spacing_secs: 60,
                hourly_spacing_secs: 10,
                recent_window_days: 3,
                clamps_series_range: false,
            },
            EnergySource::SolarThermal | EnergySource::Geothermal => SourcePolicy {
                series_spacing_secs: 600,
                hourly_spacing_secs: 60,
                recent_window_days: 7,
                clamps_series_range: true,
            },
            EnergySource::Wind | EnergySource::FuelCell => SourcePolicy {
                series_spacing_secs: 600,
                hourly_spacing_secs: 60,
                recent_window_days: 14,
                clamps_series_range: false,
            },
            EnergySource::Ess => SourcePolicy {
                series_spacing_secs: 600,
                hourly_spacing_secs: 60,
                recent_window_days: 7,
                clamps_series_range: false,
            },
        }
    }

    pub fn series_spacing(&self) -> Duration {
        Duration::seconds(self.series_spacing_secs)
    }

    pub fn hourly_spacing(&self) -> Duration {
        Duration::seconds(self.hourly_spacing_secs)
    }

    pub fn recent_window(&self) -> Duration {
        Duration::days(self.recent_window_days)
    }
}

/// 该能源所有设备类型中最短的数据区长度（查询层预过滤用）
pub fn min_payload_len(source: EnergySource) -> usize {
    variants_of(source)
        .iter()
        .map(|variant| variant.layout().min_len())
        .min()
        .unwrap_or(0)
}

fn variants_of(source: EnergySource) -> &'static [Variant] {
    match source {
        EnergySource::Solar => &[Variant::SolarSinglePhase, Variant::SolarThreePhase],
        EnergySource::SolarThermal => &[Variant::ThermalForced, Variant::ThermalNatural],
        EnergySource::Geothermal => &[Variant::GeoHeatPump, Variant::GeoLoadSide],
        EnergySource::Wind => &[Variant::Wind],
        EnergySource::FuelCell => &[Variant::FuelCell],
        EnergySource::Ess => &[Variant::Ess],
    }
}

/// 排放系数
pub fn emission_factor(source: EnergySource) -> f64 {
    if source.is_thermal() {
        THERMAL_EMISSION_FACTOR
    } else {
        ELECTRIC_EMISSION_FACTOR
    }
}

/// CO₂ 减排量（kg）
pub fn co2_kg(source: EnergySource, kwh: f64) -> f64 {
    kwh * emission_factor(source)
}

/// 等效植树数（向下取整）
pub fn trees(co2_kg: f64) -> u64 {
    if co2_kg <= 0.0 {
        0
    } else {
        (co2_kg / KG_CO2_PER_TREE).floor() as u64
    }
}

/// 保留 2 位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 保留 3 位小数
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
