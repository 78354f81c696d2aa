// --- File: crates/calgraph_common/src/services.rs ---
//! Service abstractions for the remote calendar.
//!
//! The calendar operations are written against [`CalendarService`] so they can
//! run against the real Graph client or an in-memory implementation in tests.

use chrono::{DateTime, FixedOffset};
use std::future::Future;
use std::pin::Pin;

use crate::models::{
    EventPatch, EventSummary, MeetingTimeRequest, MeetingTimeSuggestionsResult, NewEvent,
    ScheduleInformation, ScheduleRequest, UserProfile,
};

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// A trait for calendar service operations.
///
/// Every call acts on behalf of the signed-in user (`/me`).
pub trait CalendarService: Send + Sync {
    /// Error type returned by calendar service operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// The bearer token used for requests, acquiring one if necessary.
    fn access_token(&self) -> BoxFuture<'_, String, Self::Error>;

    /// Profile of the signed-in user.
    fn get_user(&self) -> BoxFuture<'_, UserProfile, Self::Error>;

    /// Free/busy lookup for the requested principals.
    fn get_schedule(
        &self,
        request: ScheduleRequest,
    ) -> BoxFuture<'_, Vec<ScheduleInformation>, Self::Error>;

    /// Create an event in the user's default calendar.
    fn create_event(&self, event: NewEvent) -> BoxFuture<'_, EventSummary, Self::Error>;

    /// Patch an existing event and return its new state.
    fn update_event(
        &self,
        event_id: &str,
        patch: EventPatch,
    ) -> BoxFuture<'_, EventSummary, Self::Error>;

    /// Events (including expanded recurrences) overlapping the given range.
    fn calendar_view(
        &self,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> BoxFuture<'_, Vec<EventSummary>, Self::Error>;

    /// Ask the service to propose meeting slots.
    fn find_meeting_times(
        &self,
        request: MeetingTimeRequest,
    ) -> BoxFuture<'_, MeetingTimeSuggestionsResult, Self::Error>;
}
