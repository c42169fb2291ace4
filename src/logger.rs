//! 日志初始化 (tracing), 输出到 stderr, 支持 `RUST_LOG`

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

pub fn setup_logging(verbosity: u8) {
    let filter = EnvFilter::from_default_env().add_directive(level_for(verbosity).into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(level_for(0), Level::INFO);
        assert_eq!(level_for(1), Level::DEBUG);
        assert_eq!(level_for(5), Level::TRACE);
    }

    #[test]
    fn setup_twice_does_not_panic() {
        setup_logging(0);
        setup_logging(2);
    }
}
