//! 音频格式模块
//!
//! 包含：
//! - Format: 已校验的格式投影、10ms quantum 与样本解码
//! - Stats: 拉取统计

pub mod format;
pub mod stats;

pub use format::{AudioFormat, QUANTUM_MS};
pub use stats::{StatsReport, StreamStats};
