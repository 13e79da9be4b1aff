//! 数据访问层（Repository）

mod frame_repo;
mod telemetry_store;

pub use frame_repo::FrameRepository;
pub use telemetry_store::TelemetryStore;
