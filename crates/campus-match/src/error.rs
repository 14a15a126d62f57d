use campus_types::models::QuotaKind;
use thiserror::Error;

/// Outcomes of engine operations that are not a success. Everything but
/// `Storage` is a user-facing, recoverable result.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("You cannot swipe on that profile")]
    InvalidTarget,

    #[error("That profile is no longer available")]
    TargetUnavailable,

    #[error("You have already swiped on this profile")]
    DuplicateSwipe,

    #[error("No {0}s left for today")]
    QuotaExhausted(QuotaKind),

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Student not found")]
    StudentNotFound,

    #[error("This account is suspended")]
    AccountSuspended,

    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("Match not found")]
    MatchNotFound,

    #[error("Storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<campus_db::rusqlite::Error> for MatchError {
    fn from(err: campus_db::rusqlite::Error) -> Self {
        Self::Storage(err.into())
    }
}

impl MatchError {
    /// Stable machine-readable name, used as the `error` field on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidTarget => "InvalidTarget",
            Self::TargetUnavailable => "TargetUnavailable",
            Self::DuplicateSwipe => "DuplicateSwipe",
            Self::QuotaExhausted(_) => "QuotaExhausted",
            Self::NothingToUndo => "NothingToUndo",
            Self::StudentNotFound => "StudentNotFound",
            Self::AccountSuspended => "AccountSuspended",
            Self::EmailTaken => "EmailTaken",
            Self::MatchNotFound => "MatchNotFound",
            Self::Storage(_) => "InternalError",
        }
    }
}

pub type Result<T, E = MatchError> = std::result::Result<T, E>;
