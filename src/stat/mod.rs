//! 读取 linux 下的 `/proc/stat` 与 `/proc/meminfo`, 来获取 cpu、内存 使用率

use std::time::Duration;

use procfs::{CpuTime, Current, CurrentSI, KernelStats, Meminfo};
use serde::Serialize;

use crate::error::{Error, Result};

/// 系统负载
#[derive(Default, Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SystemLoad {
    #[serde(rename = "cpuUsage")]
    pub cpu_usage: f64, // CPU 使用率 (%)
    #[serde(rename = "memoryUsage")]
    pub memory_usage: f64, // 内存使用率 (%)
}

/// MARK: 计算 CPU 使用率
/**!
只看行首为 `cpu ` 的汇总行, 各列含义:
    * user: 处于用户态的运行时间, 不包含 nice 值为负的进程
    * nice: nice 值为负的进程所占用的 CPU 时间
    * system: 处于核心态的运行时间
    * idle: 除 IO 等待时间以外的其它等待时间
    * iowait: IO 等待时间
    * irq / softirq: 硬中断 / 软中断时间
    * steal: 虚拟环境中花费在其他操作系统的时间
    * guest / guest_nice: 虚拟 cpu 花费的时间

计算方式:
    CPU 使用率 = ((total_2 - total_1) - (idle_2 - idle_1)) / (total_2 - total_1) * 100%
 */
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpuUsageInfo {
    user: u64,
    nice: u64,
    system: u64,
    idle: u64,
    io_wait: u64,
    irq: u64,
    soft_irq: u64,
    steal_stolen: u64,
    guest: u64,
    guest_nice: u64,
}

impl From<&CpuTime> for CpuUsageInfo {
    fn from(time: &CpuTime) -> Self {
        Self {
            user: time.user,
            nice: time.nice,
            system: time.system,
            idle: time.idle,
            io_wait: time.iowait.unwrap_or(0),
            irq: time.irq.unwrap_or(0),
            soft_irq: time.softirq.unwrap_or(0),
            steal_stolen: time.steal.unwrap_or(0),
            guest: time.guest.unwrap_or(0),
            guest_nice: time.guest_nice.unwrap_or(0),
        }
    }
}

impl CpuUsageInfo {
    pub(crate) fn get_total_time(&self) -> u64 {
        self.user
            + self.nice
            + self.system
            + self.idle
            + self.io_wait
            + self.irq
            + self.soft_irq
            + self.steal_stolen
            + self.guest
            + self.guest_nice
    }
}

pub struct Stat;

impl Stat {
    /// 读取 `/proc/stat`
    pub(crate) fn read_proc_stat() -> Result<CpuUsageInfo> {
        let stats = KernelStats::current()?;
        Ok(CpuUsageInfo::from(&stats.total))
    }

    /// 计算两次采样之间的 CPU 使用率, 保留两位小数
    pub(crate) fn calculate_cpu_usage(current: &CpuUsageInfo, prev: &CpuUsageInfo) -> f64 {
        let total_time = current.get_total_time().saturating_sub(prev.get_total_time());
        let left_time = current.idle.saturating_sub(prev.idle);
        let usage_time = total_time.saturating_sub(left_time);

        if usage_time == 0 || total_time == 0 {
            return 0.0;
        }

        let cpu_usage = usage_time as f64 / total_time as f64 * 100.0;
        return round2(cpu_usage);
    }

    /// 获取内存使用率: (总内存 - 可用内存) / 总内存
    pub fn get_memory_usage() -> Result<f64> {
        let mem_info = Meminfo::current()?;
        let available = mem_info
            .mem_available
            .unwrap_or(mem_info.mem_free + mem_info.buffers + mem_info.cached);
        Self::calculate_memory_usage(mem_info.mem_total, available)
    }

    pub(crate) fn calculate_memory_usage(total: u64, available: u64) -> Result<f64> {
        if total == 0 {
            return Err(Error::Error(String::from("MemTotal is zero")));
        }

        let used = total.saturating_sub(available);
        Ok(round2(used as f64 / total as f64 * 100.0))
    }

    /// 在 `window` 时间内采样两次 `/proc/stat`, 得到 CPU 使用率, 同时读取内存使用率
    pub async fn sample_load(window: Duration) -> Result<SystemLoad> {
        let prev = Self::read_proc_stat()?;
        tokio::time::sleep(window).await;
        let current = Self::read_proc_stat()?;

        Ok(SystemLoad {
            cpu_usage: Self::calculate_cpu_usage(&current, &prev),
            memory_usage: Self::get_memory_usage()?,
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
