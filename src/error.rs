//! 错误定义

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read /proc: {0}")]
    Proc(#[from] procfs::ProcError),

    #[error("failed to render plot: {0}")]
    Render(String),

    #[error("{0}")]
    Error(String),
}
