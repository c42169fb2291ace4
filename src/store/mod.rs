//! 采样数据存储: GPU 使用率、GPU 内存与对应的时间标签

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use chrono::Local;
use serde::{Deserialize, Serialize};

/// 时间标签格式 `时:分:秒`
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S";

/// 何时追加时间标签
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimestampPolicy {
    /// 同一行同时解析出使用率与内存时才追加, 三个序列保持对齐
    #[default]
    PerLine,
    /// 每行之后, 只要两个序列都非空就追加 (序列可能错位)
    Cumulative,
}

impl FromStr for TimestampPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per-line" => Ok(TimestampPolicy::PerLine),
            "cumulative" => Ok(TimestampPolicy::Cumulative),
            other => Err(format!("unknown timestamp policy `{}` (expected per-line or cumulative)", other)),
        }
    }
}

impl fmt::Display for TimestampPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampPolicy::PerLine => write!(f, "per-line"),
            TimestampPolicy::Cumulative => write!(f, "cumulative"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SampleStore {
    utilization: VecDeque<u32>, // GPU 使用率 (%)
    memory: VecDeque<u64>,      // 已使用内存 (MB)
    timestamps: VecDeque<String>,
    policy: TimestampPolicy,
    capacity: Option<usize>, // None 表示不限制
}

impl SampleStore {
    pub fn new(policy: TimestampPolicy, capacity: Option<usize>) -> Self {
        Self {
            policy,
            capacity: capacity.filter(|cap| *cap > 0),
            ..Self::default()
        }
    }

    pub fn push_utilization(&mut self, value: u32) {
        self.utilization.push_back(value);
        Self::trim(&mut self.utilization, self.capacity);
    }

    pub fn push_memory(&mut self, value: u64) {
        self.memory.push_back(value);
        Self::trim(&mut self.memory, self.capacity);
    }

    pub fn push_timestamp(&mut self, label: String) {
        self.timestamps.push_back(label);
        Self::trim(&mut self.timestamps, self.capacity);
    }

    /// 一行处理完毕后, 按策略决定是否追加当前时间
    ///
    /// `complete` 表示该行同时追加了使用率和内存
    pub fn finish_line(&mut self, complete: bool) -> bool {
        let append = match self.policy {
            TimestampPolicy::PerLine => complete,
            TimestampPolicy::Cumulative => !self.utilization.is_empty() && !self.memory.is_empty(),
        };

        if append {
            self.push_timestamp(Local::now().format(TIMESTAMP_FORMAT).to_string());
        }
        append
    }

    pub fn utilization(&self) -> &VecDeque<u32> {
        &self.utilization
    }

    pub fn memory(&self) -> &VecDeque<u64> {
        &self.memory
    }

    pub fn timestamps(&self) -> &VecDeque<String> {
        &self.timestamps
    }

    /// 两个数值序列是否都有数据 (可以绘图)
    pub fn has_gpu_data(&self) -> bool {
        !self.utilization.is_empty() && !self.memory.is_empty()
    }

    fn trim<T>(values: &mut VecDeque<T>, capacity: Option<usize>) {
        if let Some(cap) = capacity {
            while values.len() > cap {
                values.pop_front();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn per_line_policy_only_stamps_complete_lines() {
        let mut store = SampleStore::new(TimestampPolicy::PerLine, None);
        store.push_utilization(15);
        assert!(!store.finish_line(false));
        store.push_memory(2000);
        assert!(!store.finish_line(false));
        assert!(store.timestamps().is_empty());

        store.push_utilization(20);
        store.push_memory(2100);
        assert!(store.finish_line(true));
        assert_eq!(store.timestamps().len(), 1);
    }

    #[test]
    fn cumulative_policy_stamps_once_both_are_non_empty() {
        let mut store = SampleStore::new(TimestampPolicy::Cumulative, None);
        store.push_utilization(15);
        assert!(!store.finish_line(false));
        store.push_memory(2000);
        assert!(store.finish_line(false));
        assert!(store.finish_line(false));
        assert_eq!(store.timestamps().len(), 2);
        assert_eq!(store.utilization().len(), 1);
    }

    #[test]
    fn timestamp_label_is_hours_minutes_seconds() {
        let mut store = SampleStore::new(TimestampPolicy::PerLine, None);
        store.finish_line(true);
        let label = &store.timestamps()[0];
        assert_eq!(label.len(), 8);
        assert_eq!(label.matches(':').count(), 2);
    }

    #[test]
    fn capacity_drops_oldest_samples() {
        let mut store = SampleStore::new(TimestampPolicy::PerLine, Some(2));
        for value in [1, 2, 3] {
            store.push_utilization(value);
            store.push_memory(value as u64 * 100);
        }
        assert_eq!(store.utilization().iter().copied().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(store.memory().iter().copied().collect::<Vec<_>>(), vec![200, 300]);
    }

    #[test]
    fn zero_capacity_means_unbounded() {
        let mut store = SampleStore::new(TimestampPolicy::PerLine, Some(0));
        for value in 0..10 {
            store.push_utilization(value);
        }
        assert_eq!(store.utilization().len(), 10);
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!("per-line".parse::<TimestampPolicy>(), Ok(TimestampPolicy::PerLine));
        assert_eq!("cumulative".parse::<TimestampPolicy>(), Ok(TimestampPolicy::Cumulative));
        assert!("sometimes".parse::<TimestampPolicy>().is_err());
        assert_eq!(TimestampPolicy::Cumulative.to_string(), "cumulative");
    }
}
