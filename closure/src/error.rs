use solid_common::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("scan {got} arrived out of order, expected scan {expected}")]
    OutOfOrder { expected: usize, got: usize },
}
