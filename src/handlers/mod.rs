//! HTTP 处理器模块

mod energy_handler;
mod health_handler;

pub use energy_handler::*;
pub use health_handler::*;
