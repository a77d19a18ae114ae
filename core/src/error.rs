use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Board size must be at least 1")]
    InvalidBoardSize,
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Configuration cannot change while a game is in progress")]
    SessionActive,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = core::result::Result<T, GameError>;

/// Failure reported by an [`AssetProvider`](crate::AssetProvider).
///
/// These never abort a game, the session degrades to fallback payloads instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),
    #[error("Asset {name} could not be loaded: {reason}")]
    AssetUnavailable { name: String, reason: String },
}
