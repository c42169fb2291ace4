//! 通过 sysinfo 来获取主机信息

use serde::Serialize;
use sysinfo::{CpuExt, System, SystemExt};

/// 主机信息
#[derive(Debug, Clone, Default, Serialize)]
pub struct Os {
    pub os_type: String,                 // 名称(平台类型)
    pub kernel_version: String,          // 内核版本
    pub os_version: String,              // 操作系统版本
    pub host_name: String,               // 主机名称
    pub cpu_brand: String,               // CPU 型号
    pub cpu_num: usize,                  // CPU 逻辑核数
    pub physics_core_num: Option<usize>, // 物理核心数
    pub total_memory: u64,               // 总内存 (bytes)
    pub total_swap: u64,                 // 总交换分区 (bytes)
}

pub struct Monitor {
    sys: System,
}

impl Monitor {
    pub fn new() -> Self {
        Self { sys: System::new_all() }
    }

    /// 获取主机信息
    pub fn get_system_info(&self) -> Os {
        let cpu_brand = self
            .sys
            .cpus()
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .unwrap_or_default();

        return Os {
            os_type: self.sys.name().unwrap_or_default(),
            kernel_version: self.sys.kernel_version().unwrap_or_default(),
            os_version: self.sys.os_version().unwrap_or_default(),
            host_name: self.sys.host_name().unwrap_or_default(),
            cpu_brand,
            cpu_num: self.sys.cpus().len(),
            physics_core_num: self.sys.physical_core_count(),
            total_memory: self.sys.total_memory(),
            total_swap: self.sys.total_swap(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_cpus_and_memory() {
        let os = Monitor::new().get_system_info();
        assert!(os.cpu_num > 0);
        assert!(os.total_memory > 0);
        let json = serde_json::to_value(&os).unwrap();
        assert!(json.get("kernel_version").is_some());
    }
}
