mod countdown;
mod plan;
mod progress;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::{SelectionError, SessionError};
pub use countdown::{CountdownTask, TimerEvent};
pub use plan::{SectionSpan, SelectionPolicy, SessionBuilder, SessionPlan};
pub use progress::{ExamProgress, SectionInfo};
pub use service::{ExamSession, Navigation, SessionState};
pub use workflow::{ExamService, TimedExam};
