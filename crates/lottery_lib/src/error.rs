use thiserror::Error;

pub type LotteryResult<T> = Result<T, LotteryError>;

/// Coarse classification used by transports to pick a response class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller must fix the request.
    Client,
    /// Business rule violation, reported but never retried automatically.
    Business,
    /// Storage or transactional failure, safe to retry the whole operation.
    Infrastructure,
}

#[derive(Debug, Error)]
pub enum LotteryError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not configured: {0}")]
    NotConfigured(String),

    #[error("round {round} has already been drawn")]
    AlreadyDrawn { round: i64 },

    #[error("round {round} has no participants with tickets")]
    NoParticipants { round: i64 },

    #[error("prize {position} of round {round} is already claimed")]
    AlreadyClaimed { round: i64, position: u8 },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("could not allocate a unique ticket after {attempts} attempts")]
    TicketAllocation { attempts: usize },

    #[error("draw of round {round} failed: {source}")]
    DrawFailed {
        round: i64,
        #[source]
        source: Box<LotteryError>,
    },
}

impl LotteryError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        LotteryError::InvalidInput(msg.into())
    }

    pub fn draw_failed(round: i64, source: LotteryError) -> Self {
        LotteryError::DrawFailed {
            round,
            source: Box::new(source),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LotteryError::InvalidInput(_) => ErrorKind::Client,
            LotteryError::AlreadyDrawn { .. }
            | LotteryError::NoParticipants { .. }
            | LotteryError::AlreadyClaimed { .. } => ErrorKind::Business,
            LotteryError::NotConfigured(_)
            | LotteryError::Storage(_)
            | LotteryError::TicketAllocation { .. }
            | LotteryError::DrawFailed { .. } => ErrorKind::Infrastructure,
        }
    }

    /// HTTP-equivalent status code for the error.
    pub fn status_code(&self) -> u16 {
        match self {
            LotteryError::InvalidInput(_) => 400,
            LotteryError::AlreadyDrawn { .. } | LotteryError::AlreadyClaimed { .. } => 409,
            LotteryError::NoParticipants { .. } => 422,
            _ => 500,
        }
    }

    /// `NotConfigured` is fatal for the process and is never retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LotteryError::Storage(_)
                | LotteryError::TicketAllocation { .. }
                | LotteryError::DrawFailed { .. }
        )
    }
}
