// --- File: crates/calgraph_graph/src/lib.rs ---
// Declare modules within this crate
pub mod auth;
#[cfg(test)]
mod auth_test;
pub mod logic;
#[cfg(test)]
mod logic_proptest;
pub mod operations;
pub mod service;

pub use auth::DeviceCodeCredential;
pub use logic::{conflicts, is_free, Interval, ScheduleError};
pub use operations::{CalendarClient, CalendarSettings};
pub use service::{GraphCalendarService, GraphServiceError};
