//! 采样循环: 每轮读取 CPU / 内存负载, 再消费 `tegrastats` 的输出

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::MonitorConfig;
use crate::stat::{Stat, SystemLoad};
use crate::store::SampleStore;
use crate::tegrastats::{MetricsSource, StreamEnd};

/// 每轮采样的日志内容
#[derive(Debug, Clone, Serialize)]
struct TickReport<'a> {
    tick: u64,
    load: Option<SystemLoad>,
    #[serde(rename = "gpuSamples")]
    gpu_samples: usize,
    #[serde(rename = "memorySamples")]
    memory_samples: usize,
    stream: &'a str,
}

pub struct Sampler {
    config: MonitorConfig,
    source: MetricsSource,
    store: SampleStore,
}

impl Sampler {
    pub fn new(config: MonitorConfig) -> Self {
        let source = MetricsSource::new(config.command.clone(), config.args.clone());
        let store = SampleStore::new(config.timestamp_policy, config.max_samples);
        Self { config, source, store }
    }

    pub fn into_store(self) -> SampleStore {
        self.store
    }

    /// 一直采样, 直到 `token` 被取消
    pub async fn run(&mut self, token: &CancellationToken) {
        let mut tick = 0u64;

        while !token.is_cancelled() {
            tick += 1;

            let load = tokio::select! {
                _ = token.cancelled() => break,
                load = Stat::sample_load(self.config.cpu_window) => load,
            };
            let load = match load {
                Ok(load) => Some(load),
                Err(err) => {
                    warn!("Failed to read system load: {}", err);
                    None
                }
            };

            let stream = match self.source.stream(&mut self.store, token).await {
                Ok(StreamEnd::Cancelled) => "cancelled",
                Ok(StreamEnd::Closed) => "closed",
                Err(err) => {
                    error!("Error fetching GPU stats from {}: {}", self.source.command(), err);
                    "unavailable"
                }
            };

            if let Some(load) = &load {
                info!("CPU Usage: {}%", load.cpu_usage);
                info!("Memory Usage: {}%", load.memory_usage);
            }

            let report = TickReport {
                tick,
                load,
                gpu_samples: self.store.utilization().len(),
                memory_samples: self.store.memory().len(),
                stream,
            };
            debug!("tick: {}", serde_json::to_string(&report).unwrap_or_default());

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }

        info!(
            "Data collection stopped: {} GPU samples, {} memory samples, {} timestamps",
            self.store.utilization().len(),
            self.store.memory().len(),
            self.store.timestamps().len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(command: &str, args: &[&str]) -> MonitorConfig {
        MonitorConfig {
            command: command.to_string(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
            interval: Duration::from_millis(10),
            cpu_window: Duration::from_millis(10),
            ..MonitorConfig::default()
        }
    }

    fn cancel_after(token: &CancellationToken, millis: u64) {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(millis)).await;
            token.cancel();
        });
    }

    #[tokio::test]
    async fn collects_until_cancelled() {
        let mut sampler = Sampler::new(config(
            "sh",
            &["-c", "echo '0000 RAM 2000/8000MB GR3D_FREQ 15% cpu@40C'"],
        ));
        let token = CancellationToken::new();
        cancel_after(&token, 500);

        sampler.run(&token).await;

        let store = sampler.into_store();
        assert!(!store.utilization().is_empty());
        assert!(store.utilization().iter().all(|value| *value == 15));
        assert!(store.memory().iter().all(|value| *value == 2000));
        assert_eq!(store.utilization().len(), store.timestamps().len());
    }

    #[tokio::test]
    async fn cancellation_interrupts_a_long_running_stream() {
        let mut sampler = Sampler::new(config(
            "sh",
            &["-c", "echo '0000 GR3D_FREQ 5% RAM 10/20MB'; exec sleep 30"],
        ));
        let token = CancellationToken::new();
        cancel_after(&token, 500);

        tokio::time::timeout(Duration::from_secs(10), sampler.run(&token))
            .await
            .expect("sampler should stop once cancelled");
        assert_eq!(sampler.into_store().utilization().len(), 1);
    }

    #[tokio::test]
    async fn missing_command_keeps_store_empty() {
        let mut sampler = Sampler::new(config("gpu-stats-no-such-command", &[]));
        let token = CancellationToken::new();
        cancel_after(&token, 200);

        sampler.run(&token).await;
        assert!(!sampler.into_store().has_gpu_data());
    }

    #[tokio::test]
    async fn already_cancelled_token_runs_no_tick() {
        let mut sampler = Sampler::new(config("gpu-stats-no-such-command", &[]));
        let token = CancellationToken::new();
        token.cancel();

        sampler.run(&token).await;
        assert!(sampler.into_store().utilization().is_empty());
    }
}
