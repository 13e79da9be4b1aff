//! Verbena - 新能源遥测统计服务
//!
//! 解析现场设备上报的十六进制遥测帧，并据此统计：
//! - 日/月/年发电（产热）量时间序列
//! - 实时 KPI 快照（功率、今日电量、累计量、减排量、效率）
//! - 单日 24 小时电量

pub mod aggregation;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod protocol;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod utils;

pub use errors::AppError;
