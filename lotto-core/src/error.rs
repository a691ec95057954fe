use crate::types::{Amount, BetId};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LotteryError>;

#[derive(Error, Debug)]
pub enum LotteryError {
    #[error("Invalid number selection: {0}")]
    InvalidSelection(String),

    #[error("Stake {stake} is below the minimum stake of {minimum}")]
    BelowMinimumStake { stake: Amount, minimum: Amount },

    #[error("Withdrawal {amount} is below the minimum withdrawal of {minimum}")]
    BelowMinimumWithdrawal { amount: Amount, minimum: Amount },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Insufficient funds: need {need}, have {available}")]
    InsufficientFunds { need: Amount, available: Amount },

    #[error("No draw is currently open for bets")]
    WindowNotOpen,

    #[error("A draw is already in progress")]
    DrawAlreadyOpen,

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Invalid account number: {0}")]
    InvalidAccountNumber(String),

    #[error("Email already registered: {0}")]
    EmailAlreadyRegistered(String),

    #[error("Invalid account number or password")]
    InvalidCredentials,

    #[error("Bet {0} has already been settled")]
    AlreadySettled(BetId),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse grouping used by callers to decide how to render a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    InsufficientFunds,
    StateGuard,
    Authentication,
    Infrastructure,
}

impl LotteryError {
    pub fn invalid_selection(msg: impl Into<String>) -> Self {
        Self::InvalidSelection(msg.into())
    }

    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::InvalidAmount(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidSelection(_)
            | Self::BelowMinimumStake { .. }
            | Self::BelowMinimumWithdrawal { .. }
            | Self::InvalidAmount(_)
            | Self::Validation(_)
            | Self::InvalidAccountNumber(_)
            | Self::EmailAlreadyRegistered(_) => ErrorCategory::Validation,
            Self::InsufficientFunds { .. } => ErrorCategory::InsufficientFunds,
            Self::WindowNotOpen | Self::DrawAlreadyOpen | Self::AlreadySettled(_) => {
                ErrorCategory::StateGuard
            }
            Self::AccountNotFound(_) | Self::InvalidCredentials => ErrorCategory::Authentication,
            Self::Storage(_)
            | Self::Serialization(_)
            | Self::Config(_)
            | Self::Io(_)
            | Self::Internal(_) => ErrorCategory::Infrastructure,
        }
    }

    /// True for failures caused by the caller's request rather than the system.
    pub fn is_rejection(&self) -> bool {
        self.category() != ErrorCategory::Infrastructure
    }
}
