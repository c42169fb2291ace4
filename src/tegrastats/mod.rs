//! 读取 `tegrastats` 的输出流, 解析 GPU 使用率(`GR3D_FREQ`)与内存(`RAM`)
//!
//! 每行格式大致为:
//! `<时间> RAM 4472/7620MB (lfb 6x4MB) ... GR3D_FREQ 0% cpu@48.12C ...`

use std::process::Stdio;
use std::str::FromStr;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result};
use crate::store::SampleStore;

pub const DEFAULT_COMMAND: &str = "tegrastats";

pub const UTILIZATION_MARKER: &str = "GR3D_FREQ";
pub const MEMORY_MARKER: &str = "RAM";

/// 一行中某个字段的解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    Absent,
    Value(T),
    Invalid(String),
}

impl<T> Field<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Value(value) => Some(value),
            _ => None,
        }
    }
}

/// 一行 `tegrastats` 输出的解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineReading {
    pub utilization: Field<u32>,
    pub memory: Field<u64>,
}

/// 流结束的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    Cancelled,
    Closed,
}

/// 去掉行首的时间 (第一个空格之前的内容)
pub fn strip_timestamp(line: &str) -> &str {
    match line.split_once(' ') {
        Some((_, rest)) => rest,
        None => line,
    }
}

/// 取 `marker` 之后、`delimiter` 之前的内容并解析为整数
fn extract<T: FromStr>(data: &str, marker: &str, delimiter: char) -> Field<T> {
    let Some(after) = data.split(marker).nth(1) else {
        return Field::Absent;
    };

    let raw = after.split(delimiter).next().unwrap_or("").trim();
    match raw.parse::<T>() {
        Ok(value) => Field::Value(value),
        Err(_) => Field::Invalid(raw.to_string()),
    }
}

pub fn parse_line(line: &str) -> LineReading {
    let data = strip_timestamp(line.trim_end());
    trace!("Parsed line (after timestamp removal): {}", data);

    LineReading {
        utilization: extract(data, UTILIZATION_MARKER, '%'),
        memory: extract(data, MEMORY_MARKER, '/'),
    }
}

/// 解析一行并写入 store, 解析失败只记录日志
pub fn ingest_line(store: &mut SampleStore, line: &str) -> LineReading {
    debug!("Raw tegrastats output: {}", line.trim());
    let reading = parse_line(line);

    match &reading.utilization {
        Field::Value(value) => {
            store.push_utilization(*value);
            debug!("Extracted GPU utilization: {}%", value);
        }
        Field::Invalid(raw) => warn!("Error parsing GPU utilization from {:?}", raw),
        Field::Absent => {}
    }

    match &reading.memory {
        Field::Value(value) => {
            store.push_memory(*value);
            debug!("Extracted GPU memory used: {}MB", value);
        }
        Field::Invalid(raw) => warn!("Error parsing GPU memory from {:?}", raw),
        Field::Absent => {}
    }

    let complete = reading.utilization.value().is_some() && reading.memory.value().is_some();
    store.finish_line(complete);
    reading
}

/// 逐行消费输出, 直到流结束或被取消
pub async fn consume<R>(reader: R, store: &mut SampleStore, token: &CancellationToken) -> StreamEnd
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => return StreamEnd::Cancelled,
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    ingest_line(store, &line);
                }
                Ok(None) => return StreamEnd::Closed,
                Err(err) => {
                    error!("Error reading GPU stats from tegrastats: {}", err);
                    return StreamEnd::Closed;
                }
            }
        }
    }
}

/// 外部指标进程
#[derive(Debug, Clone)]
pub struct MetricsSource {
    command: String,
    args: Vec<String>,
}

impl MetricsSource {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self { command: command.into(), args }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// 启动进程并消费其输出, 取消时结束子进程
    pub async fn stream(&self, store: &mut SampleStore, token: &CancellationToken) -> Result<StreamEnd> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| Error::Spawn {
                command: self.command.clone(),
                source,
            })?;

        let Some(stdout) = child.stdout.take() else {
            return Err(Error::Error(format!("`{}` has no stdout", self.command)));
        };

        let end = consume(BufReader::new(stdout), store, token).await;
        if end == StreamEnd::Cancelled {
            if let Err(err) = child.start_kill() {
                debug!("{} already exited: {}", self.command, err);
            }
        }

        let status = child.wait().await?;
        debug!("{} exited with {}", self.command, status);
        Ok(end)
    }
}
