#![forbid(unsafe_code)]

pub mod blob;
pub mod error;
pub mod sessions;

pub use qudratak_core::Clock;
pub use sessions as session;

pub use error::{BlobError, SelectionError, SessionError};

pub use sessions::{
    CountdownTask, ExamProgress, ExamService, ExamSession, Navigation, SectionInfo,
    SelectionPolicy, SessionBuilder, SessionPlan, SessionState, TimedExam, TimerEvent,
};
