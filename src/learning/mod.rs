//! Course rules that do not touch the database: unlocking, progress and risk.

pub mod progress;
pub mod risk;
pub mod unlock;

pub use progress::ProgressSummary;
pub use risk::{RiskAssessment, RiskInput, RiskPolicy, RiskReason};
pub use unlock::{LessonSlot, ModuleSlot, UnlockMap};
