use std::fmt;

#[derive(Debug, Clone)]
pub enum NodeEvent {
    Running(i64),
    Succeeded(i64),
    Error(ErrorReason),
}

impl NodeEvent {
    pub fn str(&self) -> &str {
        match self {
            NodeEvent::Running(_) => "Running",
            NodeEvent::Succeeded(_) => "Succeeded",
            NodeEvent::Error(_) => "Error",
        }
    }
}

#[derive(Debug, Clone)]
pub enum ErrorReason {
    Timeout,
    Failed(String),
}

impl fmt::Display for ErrorReason {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ErrorReason::Timeout => write!(f, "Timeout"),
            ErrorReason::Failed(msg) => write!(f, "{}", msg),
        }
    }
}
