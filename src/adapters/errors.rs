//! Exchange adapter error types
//!
//! All venue-related errors are wrapped in the ExchangeError enum.
//! Venue rejections keep their numeric code so callers can switch on
//! `ExchangeError::kind()` instead of searching the message text.

use thiserror::Error;

/// Venue error codes with special handling
pub mod codes {
    /// Order quantity is below the venue's current minimum
    pub const ORDER_SIZE_TOO_SMALL: i64 = 101_400;
    /// Cancel target does not exist (already filled or cancelled)
    pub const ORDER_NOT_FOUND: i64 = 51_400;
    /// Leverage already at the requested value
    pub const LEVERAGE_UNCHANGED: i64 = 110_043;
    /// Margin mode already at the requested value
    pub const MARGIN_MODE_UNCHANGED: i64 = 110_026;
}

/// Exchange-specific error types for adapter operations
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// Connection to exchange failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Credentials missing or rejected
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Network operation timed out
    #[error("Network timeout after {0}ms")]
    NetworkTimeout(u64),

    /// Invalid or unexpected response from exchange
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Symbol is not part of the tracked market universe
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    /// Request rejected by the venue with a business error code
    #[error("Venue error {code}: {msg}")]
    Venue { code: i64, msg: String },

    /// WebSocket protocol error (boxed to reduce enum size)
    #[error("WebSocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),
}

/// Classification of venue rejections the core reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VenueErrorKind {
    OrderSizeTooSmall,
    OrderNotFound,
    LeverageUnchanged,
    MarginModeUnchanged,
    Other,
}

impl ExchangeError {
    /// Venue business code, if this error came from a venue rejection
    pub fn venue_code(&self) -> Option<i64> {
        match self {
            ExchangeError::Venue { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Classify the error by its venue code
    pub fn kind(&self) -> VenueErrorKind {
        match self.venue_code() {
            Some(codes::ORDER_SIZE_TOO_SMALL) => VenueErrorKind::OrderSizeTooSmall,
            Some(codes::ORDER_NOT_FOUND) => VenueErrorKind::OrderNotFound,
            Some(codes::LEVERAGE_UNCHANGED) => VenueErrorKind::LeverageUnchanged,
            Some(codes::MARGIN_MODE_UNCHANGED) => VenueErrorKind::MarginModeUnchanged,
            _ => VenueErrorKind::Other,
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ExchangeError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        ExchangeError::WebSocket(Box::new(e))
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ExchangeError::NetworkTimeout(0)
        } else if e.is_decode() {
            ExchangeError::InvalidResponse(e.to_string())
        } else {
            ExchangeError::ConnectionFailed(e.to_string())
        }
    }
}

/// Result type alias for exchange operations
pub type ExchangeResult<T> = std::result::Result<T, ExchangeError>;
