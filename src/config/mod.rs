//! 运行参数, 默认值与原始脚本一致

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::render::DEFAULT_PLOT_FILE;
use crate::store::TimestampPolicy;
use crate::tegrastats::DEFAULT_COMMAND;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub command: String,   // 指标命令
    pub args: Vec<String>, // 命令参数
    pub output: PathBuf,   // 输出图片
    #[serde(with = "millis")]
    pub interval: Duration, // 每轮采样之间的间隔
    #[serde(with = "millis")]
    pub cpu_window: Duration, // CPU 使用率的采样窗口
    pub timestamp_policy: TimestampPolicy,
    pub max_samples: Option<usize>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            command: String::from(DEFAULT_COMMAND),
            args: Vec::new(),
            output: PathBuf::from(DEFAULT_PLOT_FILE),
            interval: Duration::from_secs(1),
            cpu_window: Duration::from_secs(1),
            timestamp_policy: TimestampPolicy::default(),
            max_samples: None,
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_fixed_values() {
        let config = MonitorConfig::default();
        assert_eq!(config.command, "tegrastats");
        assert!(config.args.is_empty());
        assert_eq!(config.output, PathBuf::from("gpu_stats_plot.svg"));
        assert_eq!(config.interval, Duration::from_secs(1));
        assert_eq!(config.cpu_window, Duration::from_secs(1));
        assert_eq!(config.timestamp_policy, TimestampPolicy::PerLine);
        assert_eq!(config.max_samples, None);
    }

    #[test]
    fn serializes_durations_as_millis() {
        let json = serde_json::to_value(MonitorConfig::default()).unwrap();
        assert_eq!(json["interval"], 1000);
        assert_eq!(json["timestamp_policy"], "per-line");

        let back: MonitorConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, MonitorConfig::default());
    }
}
