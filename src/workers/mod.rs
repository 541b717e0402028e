mod reminders;
pub use reminders::{ReminderWorker, SweepReport};
