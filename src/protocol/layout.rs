//! 各设备类型的字段偏移表
//!
//! 每个变体以数据形式携带自己的偏移表，统一由解析器按
//! “偏移 + 宽度” 读取，避免为每种设备重复编写提取代码。

use super::header::EnergySource;
use super::metrics::{DecodedMetrics, Field};
use serde::Serialize;

/// 字段编码方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// u16 原值
    U16,
    /// u16 原值 / 10
    Tenths16,
    /// u32 原值
    U32,
    /// 2 字节符号位温度
    Temp,
    /// u32 kcal×100，换算为 kWh
    KcalX100,
}

/// 单个字段的位置
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: Field,
    pub offset: usize,
    pub kind: FieldKind,
}

const fn f(field: Field, offset: usize, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        field,
        offset,
        kind,
    }
}

/// 累计量计数器单位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergyUnit {
    Wh,
    /// kcal×100，需换算为 Wh
    KcalX100,
}

/// 变体布局
#[derive(Debug)]
pub struct Layout {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
    pub fault_offset: usize,
    pub energy_offset: usize,
    pub energy_unit: EnergyUnit,
}

impl Layout {
    /// 最小数据长度：累计量以 32 位形式完整出现
    pub const fn min_len(&self) -> usize {
        self.energy_offset + 4
    }

    /// 完整数据长度：累计量以 64 位形式出现
    pub const fn full_len(&self) -> usize {
        self.energy_offset + 8
    }
}

use FieldKind::{KcalX100, Temp, Tenths16, U16, U32};

static SOLAR_SINGLE_PHASE: Layout = Layout {
    name: "solar_single_phase",
    fields: &[
        f(Field::InputVoltage, 0, U16),
        f(Field::InputCurrent, 2, Tenths16),
        f(Field::InputPower, 4, U16),
        f(Field::OutputVoltage, 6, U16),
        f(Field::OutputCurrent, 8, Tenths16),
        f(Field::OutputPower, 10, U16),
        f(Field::PowerFactor, 12, Tenths16),
        f(Field::Frequency, 14, Tenths16),
    ],
    fault_offset: 16,
    energy_offset: 18,
    energy_unit: EnergyUnit::Wh,
};

static SOLAR_THREE_PHASE: Layout = Layout {
    name: "solar_three_phase",
    fields: &[
        f(Field::InputVoltage, 0, U16),
        f(Field::InputCurrent, 2, Tenths16),
        f(Field::InputPower, 4, U16),
        f(Field::VoltageRs, 6, U16),
        f(Field::VoltageSt, 8, U16),
        f(Field::VoltageTr, 10, U16),
        f(Field::CurrentR, 12, Tenths16),
        f(Field::CurrentS, 14, Tenths16),
        f(Field::CurrentT, 16, Tenths16),
        f(Field::OutputPower, 18, U16),
        f(Field::PowerFactor, 20, Tenths16),
        f(Field::Frequency, 22, Tenths16),
    ],
    fault_offset: 24,
    energy_offset: 26,
    energy_unit: EnergyUnit::Wh,
};

static THERMAL_FORCED: Layout = Layout {
    name: "solar_thermal_forced",
    fields: &[
        f(Field::CollectorInletTemp, 0, Temp),
        f(Field::CollectorOutletTemp, 2, Temp),
        f(Field::TankTopTemp, 4, Temp),
        f(Field::TankBottomTemp, 6, Temp),
        f(Field::FeedTemp, 8, Temp),
        f(Field::HotTemp, 10, Temp),
        f(Field::CollectorFlow, 12, Tenths16),
        f(Field::UsageFlow, 14, Tenths16),
        f(Field::ProducedHeat, 16, KcalX100),
    ],
    fault_offset: 20,
    energy_offset: 22,
    energy_unit: EnergyUnit::KcalX100,
};

static THERMAL_NATURAL: Layout = Layout {
    name: "solar_thermal_natural",
    fields: &[
        f(Field::TankTemp, 0, Temp),
        f(Field::FeedTemp, 2, Temp),
        f(Field::HotTemp, 4, Temp),
        f(Field::UsageFlow, 6, Tenths16),
    ],
    fault_offset: 8,
    energy_offset: 10,
    energy_unit: EnergyUnit::KcalX100,
};

static GEO_HEAT_PUMP: Layout = Layout {
    name: "geothermal_heat_pump",
    fields: &[
        f(Field::SystemVoltage, 0, U16),
        f(Field::SystemCurrent, 2, Tenths16),
        f(Field::ConsumedPower, 4, U16),
        f(Field::HeatPower, 6, U32),
        f(Field::SourceInletTemp, 10, Temp),
        f(Field::SourceOutletTemp, 12, Temp),
        f(Field::LoadInletTemp, 14, Temp),
        f(Field::LoadOutletTemp, 16, Temp),
    ],
    fault_offset: 18,
    energy_offset: 20,
    energy_unit: EnergyUnit::Wh,
};

static GEO_LOAD_SIDE: Layout = Layout {
    name: "geothermal_load_side",
    fields: &[
        f(Field::LoadInletTemp, 0, Temp),
        f(Field::LoadOutletTemp, 2, Temp),
        f(Field::LoadFlow, 4, Tenths16),
        f(Field::HeatPower, 6, U32),
    ],
    fault_offset: 10,
    energy_offset: 12,
    energy_unit: EnergyUnit::Wh,
};

static WIND: Layout = Layout {
    name: "wind",
    fields: &[
        f(Field::InputVoltage, 0, U16),
        f(Field::InputCurrent, 2, Tenths16),
        f(Field::InputPower, 4, U16),
        f(Field::OutputVoltage, 6, U16),
        f(Field::OutputCurrent, 8, Tenths16),
        f(Field::OutputPower, 10, U16),
        f(Field::PowerFactor, 12, Tenths16),
        f(Field::Frequency, 14, Tenths16),
    ],
    fault_offset: 16,
    energy_offset: 18,
    energy_unit: EnergyUnit::Wh,
};

static FUEL_CELL: Layout = Layout {
    name: "fuel_cell",
    fields: &[
        f(Field::InputVoltage, 0, U16),
        f(Field::InputCurrent, 2, Tenths16),
        f(Field::InputPower, 4, U16),
        f(Field::OutputVoltage, 6, U16),
        f(Field::OutputCurrent, 8, Tenths16),
        f(Field::OutputPower, 10, U16),
        f(Field::PowerFactor, 12, Tenths16),
        f(Field::Frequency, 14, Tenths16),
        f(Field::HeatSupplyTemp, 16, Temp),
        f(Field::HeatReturnTemp, 18, Temp),
    ],
    fault_offset: 20,
    energy_offset: 22,
    energy_unit: EnergyUnit::Wh,
};

static ESS: Layout = Layout {
    name: "ess",
    fields: &[
        f(Field::BatteryVoltage, 0, U16),
        f(Field::BatteryCurrent, 2, Tenths16),
        f(Field::ChargePower, 4, U16),
        f(Field::DischargePower, 6, U16),
        f(Field::StateOfCharge, 8, Tenths16),
        f(Field::OutputVoltage, 10, U16),
        f(Field::OutputCurrent, 12, Tenths16),
        f(Field::OutputPower, 14, U16),
        f(Field::Frequency, 16, Tenths16),
    ],
    fault_offset: 18,
    energy_offset: 20,
    energy_unit: EnergyUnit::Wh,
};

// 故障位名称表（位序号即下标）

static INVERTER_FAULTS: &[&str] = &[
    "输入过电压",
    "输入欠电压",
    "输入过电流",
    "逆变器 IGBT 故障",
    "逆变器过热",
    "电网过电压",
    "电网欠电压",
    "电网过电流",
    "电网过频",
    "电网欠频",
    "孤岛运行",
    "接地故障",
];

static THERMAL_FAULTS: &[&str] = &[
    "集热器过热",
    "储热水箱过热",
    "循环泵故障",
    "温度传感器故障",
    "防冻保护",
    "流量计故障",
];

static GEOTHERMAL_FAULTS: &[&str] = &[
    "压缩机故障",
    "高压异常",
    "低压异常",
    "热源侧流量异常",
    "负荷侧流量异常",
    "温度传感器故障",
];

static ESS_FAULTS: &[&str] = &[
    "电池过电压",
    "电池欠电压",
    "充电过电流",
    "放电过电流",
    "电池过热",
    "PCS 故障",
    "BMS 通信故障",
];

/// 设备类型变体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    SolarSinglePhase,
    SolarThreePhase,
    ThermalForced,
    ThermalNatural,
    GeoHeatPump,
    GeoLoadSide,
    Wind,
    FuelCell,
    Ess,
}

impl Variant {
    /// 按（能源代码, 设备类型代码）选择变体
    pub fn from_codes(source: EnergySource, code: u8) -> Option<Self> {
        match (source, code) {
            (EnergySource::Solar, 0x01) => Some(Variant::SolarSinglePhase),
            (EnergySource::Solar, 0x02) => Some(Variant::SolarThreePhase),
            (EnergySource::SolarThermal, 0x01) => Some(Variant::ThermalForced),
            (EnergySource::SolarThermal, 0x02) => Some(Variant::ThermalNatural),
            (EnergySource::Geothermal, 0x01) => Some(Variant::GeoHeatPump),
            (EnergySource::Geothermal, 0x02) => Some(Variant::GeoLoadSide),
            (EnergySource::Wind, 0x01) => Some(Variant::Wind),
            (EnergySource::FuelCell, 0x01) => Some(Variant::FuelCell),
            (EnergySource::Ess, 0x01) => Some(Variant::Ess),
            _ => None,
        }
    }

    pub fn source(self) -> EnergySource {
        match self {
            Variant::SolarSinglePhase | Variant::SolarThreePhase => EnergySource::Solar,
            Variant::ThermalForced | Variant::ThermalNatural => EnergySource::SolarThermal,
            Variant::GeoHeatPump | Variant::GeoLoadSide => EnergySource::Geothermal,
            Variant::Wind => EnergySource::Wind,
            Variant::FuelCell => EnergySource::FuelCell,
            Variant::Ess => EnergySource::Ess,
        }
    }

    pub fn layout(self) -> &'static Layout {
        match self {
            Variant::SolarSinglePhase => &SOLAR_SINGLE_PHASE,
            Variant::SolarThreePhase => &SOLAR_THREE_PHASE,
            Variant::ThermalForced => &THERMAL_FORCED,
            Variant::ThermalNatural => &THERMAL_NATURAL,
            Variant::GeoHeatPump => &GEO_HEAT_PUMP,
            Variant::GeoLoadSide => &GEO_LOAD_SIDE,
            Variant::Wind => &WIND,
            Variant::FuelCell => &FUEL_CELL,
            Variant::Ess => &ESS,
        }
    }

    pub fn name(self) -> &'static str {
        self.layout().name
    }

    pub fn fault_names(self) -> &'static [&'static str] {
        match self.source() {
            EnergySource::Solar | EnergySource::Wind | EnergySource::FuelCell => INVERTER_FAULTS,
            EnergySource::SolarThermal => THERMAL_FAULTS,
            EnergySource::Geothermal => GEOTHERMAL_FAULTS,
            EnergySource::Ess => ESS_FAULTS,
        }
    }

    /// 运行判定规则（各设备类型不同，属于业务规则）
    pub fn is_operating(self, metrics: &DecodedMetrics) -> bool {
        match self {
            Variant::SolarSinglePhase
            | Variant::SolarThreePhase
            | Variant::Wind
            | Variant::FuelCell => rules::inverter_exporting(metrics),
            Variant::ThermalForced => rules::collector_pump_running(metrics),
            Variant::ThermalNatural => rules::natural_draw_active(metrics),
            Variant::GeoHeatPump => rules::compressor_running(metrics),
            Variant::GeoLoadSide => rules::load_loop_delivering(metrics),
            Variant::Ess => rules::ess_active(metrics),
        }
    }

    /// 瞬时功率（W），用于 now_kw
    pub fn instant_power_w(self, metrics: &DecodedMetrics) -> Option<f64> {
        match self {
            Variant::SolarSinglePhase
            | Variant::SolarThreePhase
            | Variant::Wind
            | Variant::FuelCell
            | Variant::Ess => metrics.output_power_w,
            Variant::GeoHeatPump | Variant::GeoLoadSide => metrics.heat_power_w,
            Variant::ThermalForced | Variant::ThermalNatural => None,
        }
    }

    /// 变换前后的功率（输入, 输出），用于效率估算
    pub fn conversion_power_w(self, metrics: &DecodedMetrics) -> Option<(f64, f64)> {
        match self {
            Variant::SolarSinglePhase
            | Variant::SolarThreePhase
            | Variant::Wind
            | Variant::FuelCell => Some((metrics.input_power_w?, metrics.output_power_w?)),
            _ => None,
        }
    }
}

/// 运行判定规则
pub mod rules {
    use super::DecodedMetrics;

    fn positive(value: Option<f64>) -> bool {
        value.is_some_and(|v| v > 0.0)
    }

    /// 逆变器类：有输出功率且无故障
    pub fn inverter_exporting(m: &DecodedMetrics) -> bool {
        positive(m.output_power_w) && !m.has_fault()
    }

    /// 强制循环太阳热：集热循环泵有流量且无故障
    pub fn collector_pump_running(m: &DecodedMetrics) -> bool {
        positive(m.collector_flow_lpm) && !m.has_fault()
    }

    /// 自然循环太阳热：有用水流量、出水温度高于给水温度且无故障
    pub fn natural_draw_active(m: &DecodedMetrics) -> bool {
        let heated = match (m.hot_temp, m.feed_temp) {
            (Some(hot), Some(feed)) => hot > feed,
            _ => false,
        };
        positive(m.usage_flow_lpm) && heated && !m.has_fault()
    }

    /// 地热热泵：压缩机耗电且无故障
    pub fn compressor_running(m: &DecodedMetrics) -> bool {
        positive(m.consumed_power_w) && !m.has_fault()
    }

    /// 地热负荷侧：有循环流量并输出热量，故障位不影响判定
    pub fn load_loop_delivering(m: &DecodedMetrics) -> bool {
        positive(m.load_flow_lpm) && positive(m.heat_power_w)
    }

    /// 储能：充电或放电中且无故障
    pub fn ess_active(m: &DecodedMetrics) -> bool {
        (positive(m.charge_power_w) || positive(m.discharge_power_w)) && !m.has_fault()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Variant; 9] = [
        Variant::SolarSinglePhase,
        Variant::SolarThreePhase,
        Variant::ThermalForced,
        Variant::ThermalNatural,
        Variant::GeoHeatPump,
        Variant::GeoLoadSide,
        Variant::Wind,
        Variant::FuelCell,
        Variant::Ess,
    ];

    #[test]
    fn test_fields_fit_before_fault_word() {
        for variant in ALL {
            let layout = variant.layout();
            for spec in layout.fields {
                let width = match spec.kind {
                    FieldKind::U32 | FieldKind::KcalX100 => 4,
                    _ => 2,
                };
                assert!(
                    spec.offset + width <= layout.fault_offset,
                    "{} 字段 {:?} 与故障字重叠",
                    layout.name,
                    spec.field
                );
            }
            assert_eq!(layout.fault_offset + 2, layout.energy_offset, "{}", layout.name);
        }
    }

    #[test]
    fn test_variant_source_consistency() {
        for variant in ALL {
            let code = match variant {
                Variant::SolarThreePhase | Variant::ThermalNatural | Variant::GeoLoadSide => 0x02,
                _ => 0x01,
            };
            assert_eq!(Variant::from_codes(variant.source(), code), Some(variant));
        }
        assert_eq!(Variant::from_codes(EnergySource::Wind, 0x02), None);
    }

    #[test]
    fn test_operating_rules_differ_per_variant() {
        let mut m = DecodedMetrics {
            load_flow_lpm: Some(12.0),
            heat_power_w: Some(3000.0),
            fault_bits: 0b1,
            ..Default::default()
        };
        // 负荷侧不受故障位影响
        assert!(Variant::GeoLoadSide.is_operating(&m));
        // 热泵需要压缩机耗电
        assert!(!Variant::GeoHeatPump.is_operating(&m));

        m.consumed_power_w = Some(900.0);
        assert!(!Variant::GeoHeatPump.is_operating(&m));
        m.fault_bits = 0;
        assert!(Variant::GeoHeatPump.is_operating(&m));
    }

    #[test]
    fn test_natural_circulation_requires_heating() {
        let mut m = DecodedMetrics {
            usage_flow_lpm: Some(3.0),
            hot_temp: Some(40.0),
            feed_temp: Some(45.0),
            ..Default::default()
        };
        assert!(!Variant::ThermalNatural.is_operating(&m));
        m.hot_temp = Some(55.0);
        assert!(Variant::ThermalNatural.is_operating(&m));
    }
}
