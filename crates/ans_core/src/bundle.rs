use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AnsError, Result};

/// Identifies the application a slot, notification or reminder belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BundleOption {
    pub bundle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<i32>,
}

impl BundleOption {
    pub fn new(bundle: impl Into<String>) -> Self {
        Self {
            bundle: bundle.into(),
            uid: None,
        }
    }

    pub fn with_uid(mut self, uid: i32) -> Self {
        self.uid = Some(uid);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.bundle.trim().is_empty() {
            return Err(AnsError::InvalidBundle(self.bundle.clone()));
        }
        Ok(())
    }
}

impl fmt::Display for BundleOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.uid {
            Some(uid) => write!(f, "{}#{}", self.bundle, uid),
            None => f.write_str(&self.bundle),
        }
    }
}
