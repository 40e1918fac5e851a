//! Error types for VaultNexus

use std::fmt;

use crate::registry::AssetId;

/// Every rejection the marketplace state machine can produce, plus the
/// infrastructure failures of the surrounding service. Marketplace
/// rejections carry a stable numeric wire code (see [`MarketError::code`]);
/// infrastructure errors do not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    Unauthorized,
    AssetNotFound(AssetId),
    InactiveAsset(AssetId),
    AlreadyPurchased(AssetId),
    InvalidPrice,
    ExcessiveRoyalty(u64),
    InvalidRating(u64),
    NotPurchased(AssetId),
    DuplicateFeedback(AssetId),
    InvalidField(String),
    SettlementFailed(String),
    DatabaseError(String),
    ConfigError(String),
    IoError(String),
}

impl MarketError {
    /// Stable error code surfaced to callers, matching the on-chain
    /// contract's tagged rejections. Code 103 is deliberately unassigned.
    pub fn code(&self) -> Option<u32> {
        match self {
            MarketError::Unauthorized => Some(100),
            MarketError::AssetNotFound(_) => Some(101),
            MarketError::InactiveAsset(_) => Some(102),
            MarketError::AlreadyPurchased(_) => Some(104),
            MarketError::InvalidPrice => Some(105),
            MarketError::ExcessiveRoyalty(_) => Some(106),
            MarketError::InvalidRating(_) => Some(107),
            MarketError::NotPurchased(_) => Some(108),
            MarketError::DuplicateFeedback(_) => Some(109),
            MarketError::InvalidField(_)
            | MarketError::SettlementFailed(_)
            | MarketError::DatabaseError(_)
            | MarketError::ConfigError(_)
            | MarketError::IoError(_) => None,
        }
    }
}

impl fmt::Display for MarketError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MarketError::Unauthorized => write!(f, "Caller is not authorized"),
            MarketError::AssetNotFound(id) => write!(f, "Asset {} not found", id),
            MarketError::InactiveAsset(id) => write!(f, "Asset {} is not active", id),
            MarketError::AlreadyPurchased(id) => {
                write!(f, "Asset {} already purchased by caller", id)
            }
            MarketError::InvalidPrice => write!(f, "Price must be greater than zero"),
            MarketError::ExcessiveRoyalty(rate) => {
                write!(f, "Royalty rate {} exceeds the allowed maximum", rate)
            }
            MarketError::InvalidRating(rating) => {
                write!(f, "Rating {} is outside the allowed range", rating)
            }
            MarketError::NotPurchased(id) => {
                write!(f, "Caller has not purchased asset {}", id)
            }
            MarketError::DuplicateFeedback(id) => {
                write!(f, "Feedback for asset {} already submitted", id)
            }
            MarketError::InvalidField(msg) => write!(f, "Invalid field: {}", msg),
            MarketError::SettlementFailed(msg) => write!(f, "Settlement failed: {}", msg),
            MarketError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            MarketError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            MarketError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for MarketError {}

impl From<std::io::Error> for MarketError {
    fn from(err: std::io::Error) -> Self {
        MarketError::IoError(err.to_string())
    }
}

impl From<rusqlite::Error> for MarketError {
    fn from(err: rusqlite::Error) -> Self {
        MarketError::DatabaseError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, MarketError>;
