use thiserror::Error;

/// Wallet error code reported when the user declines a signature request (EIP-1193)
pub const USER_REJECTED_CODE: i64 = 4001;

/// Invalid user-entered token amount
///
/// Never surfaced to the user as an error message; an unparseable amount only
/// disables the controls that would consume it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("Amount is empty")]
    Empty,

    #[error("Invalid amount: {0}")]
    Malformed(String),

    #[error("Amount has {found} fraction digits but the token only supports {decimals}")]
    ExcessPrecision { decimals: u8, found: usize },

    #[error("Amount does not fit in 256 bits")]
    Overflow,
}

/// Failure of a read-only chain query
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Chain error: {0}")]
    Chain(String),

    #[error("Read timed out")]
    Timeout,
}

/// Failure of a state-changing transaction, either at submission or confirmation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    #[error("Transaction rejected by the user")]
    UserRejected,

    #[error("Transaction reverted: {0}")]
    Reverted(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Signer error: {0}")]
    Signer(String),
}

impl WriteError {
    /// Map a wallet error code and message onto a write error
    pub fn from_wallet_code(code: i64, message: impl Into<String>) -> Self {
        if code == USER_REJECTED_CODE {
            WriteError::UserRejected
        } else {
            WriteError::Signer(format!("{} (code {})", message.into(), code))
        }
    }

    /// Map an EIP-1193 provider error object such as `{"code": 4001, "message": "..."}`
    ///
    /// Objects without a numeric code are treated as signer failures.
    pub fn from_provider_error(error: &serde_json::Value) -> Self {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown provider error");
        match error.get("code").and_then(|c| c.as_i64()) {
            Some(code) => Self::from_wallet_code(code, message),
            None => WriteError::Signer(message.to_string()),
        }
    }

    /// Whether the failure is a user cancellation rather than an error
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, WriteError::UserRejected)
    }
}

/// Why a farming action could not start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Unavailable {
    #[error("no pool selected")]
    NoPoolSelected,

    #[error("action not chosen for this operation")]
    WrongAction,

    #[error("farm is not approved to move this LP token")]
    ApprovalRequired,

    #[error("farm is already approved")]
    AlreadyApproved,

    #[error("no valid amount entered")]
    InvalidAmount,

    #[error("amount exceeds wallet balance")]
    InsufficientBalance,

    #[error("amount exceeds deposited balance")]
    InsufficientDeposit,

    #[error("deposited balance is unknown")]
    DepositUnknown,

    #[error("another transaction is in flight")]
    InFlight,
}

/// Failure of a farming action
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// Preconditions not met; no transaction was sent
    #[error("Action unavailable: {0}")]
    Unavailable(Unavailable),

    /// The transaction failed for a reason other than user rejection
    #[error(transparent)]
    Transaction(WriteError),
}

impl ActionError {
    /// Whether the failure should be shown to the user as an error message
    ///
    /// Unavailable actions are reflected by disabled controls instead.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, ActionError::Transaction(_))
    }
}

impl From<Unavailable> for ActionError {
    fn from(reason: Unavailable) -> Self {
        ActionError::Unavailable(reason)
    }
}

/// Main SDK error type
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("EVM error: {0}")]
    Evm(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error(transparent)]
    Amount(#[from] AmountError),

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("{0}")]
    Other(String),
}
