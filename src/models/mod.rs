//! 数据模型模块

mod common;
mod energy;
mod frame;

pub use common::*;
pub use energy::*;
pub use frame::*;
