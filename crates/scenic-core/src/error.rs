//! Crate-level error type.

use crate::app::builder::BuildError;
use crate::ports::PersistenceError;
use crate::store::StoreError;
use crate::typed::RegistryError;

#[derive(Debug, thiserror::Error)]
pub enum ScenicError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Build(#[from] BuildError),
}

pub type Result<T> = std::result::Result<T, ScenicError>;
