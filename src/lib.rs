//! 采集 Jetson `tegrastats` 的 GPU 使用率与内存, 中断时绘制时间序列图

pub mod config;
pub mod error;
pub mod logger;
pub mod monitor;
pub mod render;
pub mod sampler;
pub mod shutdown;
pub mod stat;
pub mod store;
pub mod tegrastats;
pub mod timing;

pub use config::MonitorConfig;
pub use error::{Error, Result};
pub use render::SnapshotRenderer;
pub use sampler::Sampler;
pub use store::{SampleStore, TimestampPolicy};
