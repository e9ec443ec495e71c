use thiserror::Error;

use crate::slot::SlotType;

pub const ERR_OK: u32 = 0;

#[derive(Debug, Error)]
pub enum AnsError {
    #[error("service not ready")]
    ServiceNotReady,
    #[error("invalid parameter: {0}")]
    InvalidParam(String),
    #[error("invalid bundle: {0:?}")]
    InvalidBundle(String),
    #[error("notifications are not allowed for `{0}`")]
    NotAllowed(String),
    #[error("notification {id} (label {label:?}) does not exist")]
    NotificationNotExists { id: i32, label: String },
    #[error("notification slot {0:?} does not exist")]
    SlotNotExist(SlotType),
    #[error("bundle `{bundle}` already owns {limit} valid reminders")]
    ReminderLimitExceeded { bundle: String, limit: usize },
    #[error("system already holds {limit} reminders")]
    SystemReminderLimitExceeded { limit: usize },
    #[error("reminder has no next trigger time")]
    NoNextTrigger,
    #[error("reminder store failure: {0}")]
    Store(#[from] std::io::Error),
    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AnsError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParam(message.into())
    }

    /// Numeric code surfaced through the callback convention. Success is [`ERR_OK`].
    pub fn code(&self) -> u32 {
        match self {
            AnsError::ServiceNotReady => 1,
            AnsError::InvalidParam(_) => 3,
            AnsError::InvalidBundle(_) => 6,
            AnsError::NotAllowed(_) => 7,
            AnsError::NotificationNotExists { .. } => 14,
            AnsError::SlotNotExist(_) => 20,
            AnsError::ReminderLimitExceeded { .. } => 30,
            AnsError::SystemReminderLimitExceeded { .. } => 31,
            AnsError::NoNextTrigger => 32,
            AnsError::Store(_) => 40,
            AnsError::Serialization(_) => 41,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable_and_non_zero() {
        let errors = [
            AnsError::ServiceNotReady,
            AnsError::invalid("x"),
            AnsError::NoNextTrigger,
            AnsError::SlotNotExist(SlotType::OtherTypes),
        ];
        for err in &errors {
            assert_ne!(err.code(), ERR_OK, "{err} must not look like success");
        }
        assert_eq!(AnsError::invalid("slot").code(), 3);
    }
}
