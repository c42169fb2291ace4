//! 监听中断信号, 只负责取消采样, 绘图由主任务完成

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// 第二次中断时的退出码 (128 + SIGINT)
pub const FORCE_EXIT_CODE: i32 = 130;

/// 等待 SIGINT (Ctrl-C) 或 SIGTERM
#[cfg(unix)]
pub async fn wait_for_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => Ok("SIGTERM"),
        _ = sigint.recv() => Ok("SIGINT"),
    }
}

#[cfg(not(unix))]
pub async fn wait_for_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("Ctrl-C")
}

/// 收到第一个信号后取消 `token`; 收尾期间再次收到信号则直接退出
pub fn spawn_signal_listener(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(name) => info!("Signal {} received, stopping data collection...", name),
            Err(err) => {
                error!("Failed to listen for signals: {}", err);
                return;
            }
        }
        token.cancel();

        if let Ok(name) = wait_for_signal().await {
            warn!("Signal {} received again, exiting without plotting", name);
            std::process::exit(FORCE_EXIT_CODE);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn interrupt_cancels_token() {
        let token = CancellationToken::new();
        let handle = spawn_signal_listener(token.clone());

        // 让监听任务先注册信号处理
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        let status = std::process::Command::new("kill")
            .args(["-INT", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        tokio::time::timeout(std::time::Duration::from_secs(5), token.cancelled())
            .await
            .expect("token should be cancelled by SIGINT");
        handle.abort();
    }
}
