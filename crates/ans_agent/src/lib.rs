pub mod agent;
pub mod callback;
pub mod config;
pub mod permission;

pub use crate::agent::{Clock, ReminderAgent, ReminderAgentBuilder, SystemClock, TriggerLoop};
pub use crate::callback::CallbackError;
pub use crate::config::AgentConfig;
pub use crate::permission::PermissionRelay;
