// --- File: crates/calgraph_common/src/models.rs ---

// Wire models exchanged with the calendar service. Field names follow the
// service's camelCase JSON; optional fields are skipped when absent so that
// PATCH bodies only carry what changed.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Format used for wall-clock date-times sent to the service.
pub const WALL_CLOCK_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A wall-clock date-time paired with the name of the zone it is expressed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateTimeTimeZone {
    pub date_time: String,
    pub time_zone: String,
}

impl DateTimeTimeZone {
    pub fn new(date_time: NaiveDateTime, time_zone: &str) -> Self {
        Self {
            date_time: date_time.format(WALL_CLOCK_FORMAT).to_string(),
            time_zone: time_zone.to_string(),
        }
    }

    /// Parses the wall-clock part, ignoring fractional seconds.
    ///
    /// The service returns values such as `2025-05-15T10:00:00.0000000`.
    pub fn naive(&self) -> Result<NaiveDateTime, chrono::ParseError> {
        let whole_seconds = self
            .date_time
            .split('.')
            .next()
            .unwrap_or(self.date_time.as_str());
        NaiveDateTime::parse_from_str(whole_seconds, WALL_CLOCK_FORMAT)
    }
}

/// The signed-in user, restricted to the fields the console needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub display_name: Option<String>,
    pub mail: Option<String>,
    pub user_principal_name: Option<String>,
}

impl UserProfile {
    /// Work/school accounts carry `mail`, personal accounts only the UPN.
    pub fn email(&self) -> Option<&str> {
        self.mail
            .as_deref()
            .filter(|m| !m.is_empty())
            .or(self.user_principal_name.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress {
    /// Absent for rooms and some external organizers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttendeeType {
    Required,
    Optional,
    Resource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub email_address: EmailAddress,
    #[serde(rename = "type")]
    pub attendee_type: AttendeeType,
}

impl Attendee {
    pub fn required(address: &str) -> Self {
        Self {
            email_address: EmailAddress {
                address: Some(address.to_string()),
                name: None,
            },
            attendee_type: AttendeeType::Required,
        }
    }
}

/// Free/busy query for one or more principals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub schedules: Vec<String>,
    pub start_time: DateTimeTimeZone,
    pub end_time: DateTimeTimeZone,
    /// Granularity of the availability view, in minutes.
    pub availability_view_interval: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeBusyError {
    pub message: Option<String>,
    pub response_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleItem {
    pub status: Option<String>,
    pub subject: Option<String>,
    pub start: DateTimeTimeZone,
    pub end: DateTimeTimeZone,
}

/// Free/busy answer for one principal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInformation {
    pub schedule_id: String,
    #[serde(default)]
    pub schedule_items: Vec<ScheduleItem>,
    pub availability_view: Option<String>,
    pub error: Option<FreeBusyError>,
}

/// Body of an event creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub subject: String,
    pub start: DateTimeTimeZone,
    pub end: DateTimeTimeZone,
    pub allow_new_time_proposals: bool,
    pub attendees: Vec<Attendee>,
}

/// Body of an event update; only the present fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTimeTimeZone>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTimeTimeZone>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub email_address: EmailAddress,
}

/// An event as returned by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub id: String,
    pub subject: Option<String>,
    pub start: DateTimeTimeZone,
    pub end: DateTimeTimeZone,
    pub location: Option<Location>,
    pub organizer: Option<Recipient>,
    #[serde(default)]
    pub is_all_day: bool,
    pub web_link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: DateTimeTimeZone,
    pub end: DateTimeTimeZone,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeConstraint {
    pub time_slots: Vec<TimeSlot>,
}

/// Meeting-time suggestion query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingTimeRequest {
    pub attendees: Vec<Attendee>,
    pub time_constraint: TimeConstraint,
    /// ISO-8601 duration, e.g. `PT3600S`.
    pub meeting_duration: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendeeAvailability {
    pub attendee: Attendee,
    pub availability: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingTimeSuggestion {
    pub confidence: Option<f64>,
    pub organizer_availability: Option<String>,
    pub suggestion_reason: Option<String>,
    pub meeting_time_slot: TimeSlot,
    #[serde(default)]
    pub attendee_availability: Vec<AttendeeAvailability>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingTimeSuggestionsResult {
    pub empty_suggestions_reason: Option<String>,
    #[serde(default)]
    pub meeting_time_suggestions: Vec<MeetingTimeSuggestion>,
}
