//! 统计一次调用的耗时 (wall-clock)

use std::ffi::OsStr;
use std::process::{Command, ExitStatus};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

pub const DEFAULT_LABEL: &str = "with CPU alone";

/// 执行 `f` 并返回结果与耗时
pub fn measure<T, F: FnOnce() -> T>(f: F) -> (T, Duration) {
    let start = Instant::now();
    let value = f();
    (value, start.elapsed())
}

/// 运行外部程序 (继承标准输入输出) 并计时
pub fn measure_command<S: AsRef<OsStr>>(program: &str, args: &[S]) -> Result<(ExitStatus, Duration)> {
    let (status, elapsed) = measure(|| Command::new(program).args(args).status());
    let status = status.map_err(|source| Error::Spawn {
        command: program.to_string(),
        source,
    })?;
    Ok((status, elapsed))
}

pub fn format_execution_time(label: &str, elapsed: Duration) -> String {
    format!("execution time ({}): {} seconds", label, elapsed.as_secs_f64())
}
