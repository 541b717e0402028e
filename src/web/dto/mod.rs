pub mod account;
pub mod cohorts;
pub mod lessons;
pub mod outline;
pub mod progress;
pub mod submissions;
pub mod uploads;
