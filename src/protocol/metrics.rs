//! 解析后的测量值

use serde::Serialize;

/// 1 kWh 对应的千卡数
pub const KCAL_PER_KWH: f64 = 860.42065;

/// 可由偏移表提取的测量字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    // 输入侧（光伏 / 风机变换前 / 燃料电池直流）
    InputVoltage,
    InputCurrent,
    InputPower,
    // 输出侧（电网 / 风机变换后 / 交流）
    OutputVoltage,
    OutputCurrent,
    OutputPower,
    // 三相
    VoltageRs,
    VoltageSt,
    VoltageTr,
    CurrentR,
    CurrentS,
    CurrentT,
    PowerFactor,
    Frequency,
    // 储能
    BatteryVoltage,
    BatteryCurrent,
    ChargePower,
    DischargePower,
    StateOfCharge,
    // 热泵
    SystemVoltage,
    SystemCurrent,
    ConsumedPower,
    HeatPower,
    // 温度
    CollectorInletTemp,
    CollectorOutletTemp,
    TankTopTemp,
    TankBottomTemp,
    TankTemp,
    FeedTemp,
    HotTemp,
    SourceInletTemp,
    SourceOutletTemp,
    LoadInletTemp,
    LoadOutletTemp,
    HeatSupplyTemp,
    HeatReturnTemp,
    // 流量
    CollectorFlow,
    UsageFlow,
    LoadFlow,
    // 太阳热累计生产热量（kcal×100）
    ProducedHeat,
}

/// 单帧解析出的测量值
///
/// 字段按能源种类有选择地出现；`cumulative_energy_wh` 在解析成功时总是存在，
/// 且始终以整数保存，避免超过 2^53 后的精度丢失。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecodedMetrics {
    pub cumulative_energy_wh: u64,
    pub is_operating: bool,
    pub fault_bits: u16,
    pub faults: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_voltage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_current: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_power_w: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_voltage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_current: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_power_w: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voltage_rs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voltage_st: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voltage_tr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_r: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_s: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_t: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_factor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_hz: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_voltage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_current: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charge_power_w: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discharge_power_w: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_of_charge: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_voltage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_current: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumed_power_w: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heat_power_w: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub collector_inlet_temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collector_outlet_temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tank_top_temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tank_bottom_temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tank_temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed_temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hot_temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_inlet_temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_outlet_temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_inlet_temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_outlet_temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heat_supply_temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heat_return_temp: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub collector_flow_lpm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_flow_lpm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_flow_lpm: Option<f64>,

    /// 太阳热：累计生产热量（kWh）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub produced_kwh: Option<f64>,
    /// 太阳热：累计使用热量（kWh）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_kwh: Option<f64>,
}

impl DecodedMetrics {
    /// 写入一个测量字段
    pub fn set(&mut self, field: Field, value: f64) {
        let slot = match field {
            Field::InputVoltage => &mut self.input_voltage,
            Field::InputCurrent => &mut self.input_current,
            Field::InputPower => &mut self.input_power_w,
            Field::OutputVoltage => &mut self.output_voltage,
            Field::OutputCurrent => &mut self.output_current,
            Field::OutputPower => &mut self.output_power_w,
            Field::VoltageRs => &mut self.voltage_rs,
            Field::VoltageSt => &mut self.voltage_st,
            Field::VoltageTr => &mut self.voltage_tr,
            Field::CurrentR => &mut self.current_r,
            Field::CurrentS => &mut self.current_s,
            Field::CurrentT => &mut self.current_t,
            Field::PowerFactor => &mut self.power_factor,
            Field::Frequency => &mut self.frequency_hz,
            Field::BatteryVoltage => &mut self.battery_voltage,
            Field::BatteryCurrent => &mut self.battery_current,
            Field::ChargePower => &mut self.charge_power_w,
            Field::DischargePower => &mut self.discharge_power_w,
            Field::StateOfCharge => &mut self.state_of_charge,
            Field::SystemVoltage => &mut self.system_voltage,
            Field::SystemCurrent => &mut self.system_current,
            Field::ConsumedPower => &mut self.consumed_power_w,
            Field::HeatPower => &mut self.heat_power_w,
            Field::CollectorInletTemp => &mut self.collector_inlet_temp,
            Field::CollectorOutletTemp => &mut self.collector_outlet_temp,
            Field::TankTopTemp => &mut self.tank_top_temp,
            Field::TankBottomTemp => &mut self.tank_bottom_temp,
            Field::TankTemp => &mut self.tank_temp,
            Field::FeedTemp => &mut self.feed_temp,
            Field::HotTemp => &mut self.hot_temp,
            Field::SourceInletTemp => &mut self.source_inlet_temp,
            Field::SourceOutletTemp => &mut self.source_outlet_temp,
            Field::LoadInletTemp => &mut self.load_inlet_temp,
            Field::LoadOutletTemp => &mut self.load_outlet_temp,
            Field::HeatSupplyTemp => &mut self.heat_supply_temp,
            Field::HeatReturnTemp => &mut self.heat_return_temp,
            Field::CollectorFlow => &mut self.collector_flow_lpm,
            Field::UsageFlow => &mut self.usage_flow_lpm,
            Field::LoadFlow => &mut self.load_flow_lpm,
            Field::ProducedHeat => &mut self.produced_kwh,
        };
        *slot = Some(value);
    }

    pub fn has_fault(&self) -> bool {
        self.fault_bits != 0
    }
}

/// kcal×100 计数换算为 Wh（整数运算，四舍五入）
///
/// Wh = kcal / 860.42065 × 1000 = x × 1_000_000 / 86_042_065
pub fn kcal_x100_to_wh(kcal_x100: u64) -> u64 {
    const DIVISOR: u128 = 86_042_065;
    let scaled = u128::from(kcal_x100) * 1_000_000 + DIVISOR / 2;
    // 输入最大 2^64，结果不会超过 u64
    (scaled / DIVISOR) as u64
}

/// kcal×100 计数换算为 kWh（仅用于展示）
pub fn kcal_x100_to_kwh(kcal_x100: u64) -> f64 {
    kcal_x100 as f64 / 100.0 / KCAL_PER_KWH
}
