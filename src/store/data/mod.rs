mod event;
mod log;
mod notification;
mod run;
mod workflow;

pub use event::Event;
pub use log::Log;
pub use notification::{Notification, NotificationKind, Severity};
pub use run::{Run, RunState};
pub use workflow::Workflow;
