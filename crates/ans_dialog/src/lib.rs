pub mod bridge;
pub mod dialog;
pub mod locale;
pub mod params;

pub use crate::bridge::NativeBridge;
pub use crate::dialog::{DialogEvent, DialogLabels, DialogState, LabelSource, PermissionDialog};
pub use crate::locale::LocaleTable;
pub use crate::params::RouteParams;
