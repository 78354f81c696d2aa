// --- File: crates/calgraph_graph/src/operations.rs ---
//! Calendar operations offered by the console.
//!
//! Every operation goes through a [`CalendarService`], so the same code runs
//! against Graph and against the in-memory mock.

use calgraph_common::models::{
    Attendee, DateTimeTimeZone, EventPatch, EventSummary, MeetingTimeRequest,
    MeetingTimeSuggestionsResult, NewEvent, ScheduleRequest, TimeConstraint, TimeSlot,
    UserProfile,
};
use calgraph_common::services::CalendarService;
use calgraph_config::{BoundaryPolicy, GraphConfig};
use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, info};

use crate::logic::{
    busy_intervals, is_free, iso8601_duration, preview_window, select_schedule,
    validate_candidate, Interval, ScheduleError,
};

/// Settings the operations need from the `[graph]` configuration section.
#[derive(Debug, Clone)]
pub struct CalendarSettings {
    /// Windows zone name used for every wall-clock value sent to Graph.
    pub time_zone: String,
    pub availability_interval: u32,
    pub boundary_policy: BoundaryPolicy,
    /// Zone for the preview window; the system zone when unset.
    pub local_time_zone: Option<Tz>,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        let defaults = GraphConfig::default();
        Self {
            time_zone: defaults.time_zone,
            availability_interval: defaults.availability_interval,
            boundary_policy: defaults.boundary_policy,
            local_time_zone: None,
        }
    }
}

impl CalendarSettings {
    pub fn from_config(config: &GraphConfig) -> Result<Self, ScheduleError> {
        let local_time_zone = config
            .local_time_zone
            .as_deref()
            .map(|name| {
                name.parse::<Tz>()
                    .map_err(|_| ScheduleError::InvalidTimeZone(name.to_string()))
            })
            .transpose()?;
        Ok(Self {
            time_zone: config.time_zone.clone(),
            availability_interval: config.availability_interval,
            boundary_policy: config.boundary_policy,
            local_time_zone,
        })
    }

    fn wall_clock(&self, value: NaiveDateTime) -> DateTimeTimeZone {
        DateTimeTimeZone::new(value, &self.time_zone)
    }
}

/// The signed-in user's calendar.
pub struct CalendarClient<S: CalendarService> {
    service: S,
    settings: CalendarSettings,
}

impl<S: CalendarService> CalendarClient<S> {
    pub fn new(service: S, settings: CalendarSettings) -> Self {
        Self { service, settings }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn settings(&self) -> &CalendarSettings {
        &self.settings
    }

    /// Bearer token for the signed-in user, signing in on first use.
    pub async fn get_user_token(&self) -> Result<String, ScheduleError> {
        self.service
            .access_token()
            .await
            .map_err(ScheduleError::service)
    }

    pub async fn get_user(&self) -> Result<UserProfile, ScheduleError> {
        self.service.get_user().await.map_err(ScheduleError::service)
    }

    /// Whether `email` has nothing booked between `start` and `end`.
    ///
    /// Times are wall-clock values in the configured schedule zone. An invalid
    /// interval is rejected before anything is sent.
    pub async fn is_available(
        &self,
        email: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<bool, ScheduleError> {
        let candidate = Interval::new(start, end);
        validate_candidate(&candidate)?;

        let request = ScheduleRequest {
            schedules: vec![email.to_string()],
            start_time: self.settings.wall_clock(start),
            end_time: self.settings.wall_clock(end),
            availability_view_interval: self.settings.availability_interval,
        };
        let infos = self
            .service
            .get_schedule(request)
            .await
            .map_err(ScheduleError::service)?;
        let info = select_schedule(&infos, email)?;
        let busy = busy_intervals(info)?;
        debug!("{} busy entries for {} in {}", busy.len(), email, candidate);
        is_free(&candidate, &busy, self.settings.boundary_policy)
    }

    /// Books a meeting with `email` if the slot is free.
    ///
    /// Returns the new event's id, or `None` when the slot is taken.
    pub async fn create_event(
        &self,
        email: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        title: &str,
    ) -> Result<Option<String>, ScheduleError> {
        if !self.is_available(email, start, end).await? {
            info!("Not creating '{}': {} is busy", title, email);
            return Ok(None);
        }

        let event = NewEvent {
            subject: title.to_string(),
            start: self.settings.wall_clock(start),
            end: self.settings.wall_clock(end),
            allow_new_time_proposals: true,
            attendees: vec![Attendee::required(email)],
        };
        let created = self
            .service
            .create_event(event)
            .await
            .map_err(ScheduleError::service)?;
        Ok(Some(created.id))
    }

    /// Moves an event to a new slot if `email` is free then.
    ///
    /// Returns whether the event now sits at the requested times.
    pub async fn update_event(
        &self,
        email: &str,
        new_start: NaiveDateTime,
        new_end: NaiveDateTime,
        title: &str,
        event_id: &str,
    ) -> Result<bool, ScheduleError> {
        if !self.is_available(email, new_start, new_end).await? {
            info!("Not moving event {}: {} is busy", event_id, email);
            return Ok(false);
        }

        let patch = EventPatch {
            subject: Some(title.to_string()),
            start: Some(self.settings.wall_clock(new_start)),
            end: Some(self.settings.wall_clock(new_end)),
        };
        let updated = self
            .service
            .update_event(event_id, patch)
            .await
            .map_err(ScheduleError::service)?;
        let moved = Interval::from_wire(&updated.start, &updated.end)?;
        Ok(moved == Interval::new(new_start, new_end))
    }

    /// Events from now until the end of today, or of the week.
    pub async fn preview_schedule(&self, week_view: bool) -> Result<Vec<EventSummary>, ScheduleError> {
        let (start, end) = match self.settings.local_time_zone {
            Some(tz) => preview_window(&Utc::now().with_timezone(&tz), week_view)?,
            None => preview_window(&Local::now(), week_view)?,
        };
        self.preview_schedule_at(start, end).await
    }

    pub async fn preview_schedule_at(
        &self,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<Vec<EventSummary>, ScheduleError> {
        debug!("calendar view {} - {}", start, end);
        self.service
            .calendar_view(start, end)
            .await
            .map_err(ScheduleError::service)
    }

    /// Asks the service for `minutes`-long slots with `email` inside the window.
    pub async fn suggest_meeting_times(
        &self,
        email: &str,
        window_start: NaiveDateTime,
        window_end: NaiveDateTime,
        minutes: i64,
    ) -> Result<MeetingTimeSuggestionsResult, ScheduleError> {
        let meeting_duration = iso8601_duration(minutes)?;
        validate_candidate(&Interval::new(window_start, window_end))?;

        let request = MeetingTimeRequest {
            attendees: vec![Attendee::required(email)],
            time_constraint: TimeConstraint {
                time_slots: vec![TimeSlot {
                    start: self.settings.wall_clock(window_start),
                    end: self.settings.wall_clock(window_end),
                }],
            },
            meeting_duration,
        };
        self.service
            .find_meeting_times(request)
            .await
            .map_err(ScheduleError::service)
    }
}
