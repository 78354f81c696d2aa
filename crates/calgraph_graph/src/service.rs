// --- File: crates/calgraph_graph/src/service.rs ---
//! Microsoft Graph implementation of the calendar service.
//!
//! All calls act on `/me`. Requests that carry or return wall-clock times send
//! `Prefer: outlook.timezone="<zone>"` so that Graph answers in the same zone
//! the console works in.

use calgraph_common::models::{
    EventPatch, EventSummary, MeetingTimeRequest, MeetingTimeSuggestionsResult, NewEvent,
    ScheduleInformation, ScheduleRequest, UserProfile,
};
use calgraph_common::services::{BoxFuture, CalendarService};
use calgraph_common::{
    auth_error, config_error, create_client, external_service_error, internal_error, CalgraphError,
};
use calgraph_config::AppConfig;
use chrono::{DateTime, FixedOffset};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::auth::{AuthError, DeviceCodeCredential};

pub const GRAPH_SERVICE_NAME: &str = "Microsoft Graph";

const USER_SELECT: &str = "displayName,mail,userPrincipalName";
const EVENT_SELECT: &str = "id,subject,start,end,location,organizer,isAllDay,webLink";
const CALENDAR_VIEW_PAGE_SIZE: &str = "50";

/// Errors that can occur when talking to Microsoft Graph.
#[derive(Error, Debug)]
pub enum GraphServiceError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Failed to encode query: {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Graph API error (status {status}): {code} - {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
    #[error("Failed to parse Graph response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<GraphServiceError> for CalgraphError {
    fn from(err: GraphServiceError) -> Self {
        match err {
            GraphServiceError::Api { code, message, .. } => {
                external_service_error(GRAPH_SERVICE_NAME, code, message)
            }
            GraphServiceError::Auth(e) => auth_error(e),
            GraphServiceError::Request(e) => e.into(),
            GraphServiceError::Parse(e) => e.into(),
            GraphServiceError::Encode(e) => internal_error(e),
            GraphServiceError::InvalidUrl(e) => config_error(e),
        }
    }
}

#[derive(Deserialize)]
struct ODataErrorBody {
    error: ODataErrorDetail,
}

#[derive(Deserialize)]
struct ODataErrorDetail {
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct ODataCollection<T> {
    value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

/// Turns an unsuccessful response body into an `Api` error.
///
/// Bodies that are not OData errors keep the raw text as the message.
pub(crate) fn parse_odata_error(status: u16, body: &[u8]) -> GraphServiceError {
    match serde_json::from_slice::<ODataErrorBody>(body) {
        Ok(parsed) => GraphServiceError::Api {
            status,
            code: parsed.error.code,
            message: parsed.error.message,
        },
        Err(_) => GraphServiceError::Api {
            status,
            code: format!("HTTP{}", status),
            message: String::from_utf8_lossy(body).into_owned(),
        },
    }
}

/// Graph calendar client for the signed-in user.
///
/// Created once at startup and shared by reference for the life of the
/// process; it owns the credential and therefore the token cache.
pub struct GraphCalendarService {
    http: Client,
    base_url: Url,
    time_zone: String,
    credential: DeviceCodeCredential,
}

impl GraphCalendarService {
    pub fn new(
        http: Client,
        base_url: &str,
        time_zone: &str,
        credential: DeviceCodeCredential,
    ) -> Result<Self, GraphServiceError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| GraphServiceError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        Ok(Self {
            http,
            base_url,
            time_zone: time_zone.to_string(),
            credential,
        })
    }

    /// Builds the HTTP client, credential and service from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, GraphServiceError> {
        let http = create_client(config.graph.timeout_secs)?;
        let credential = DeviceCodeCredential::from_config(http.clone(), config);
        info!(
            "Graph client ready (base {}, tenant {}, zone {})",
            config.graph.base_url, config.azure.tenant_id, config.graph.time_zone
        );
        Self::new(http, &config.graph.base_url, &config.graph.time_zone, credential)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, GraphServiceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GraphServiceError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn endpoint_with_query(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<Url, GraphServiceError> {
        let mut url = self.endpoint(segments)?;
        url.set_query(Some(&serde_urlencoded::to_string(query)?));
        Ok(url)
    }

    fn prefer_time_zone(&self) -> String {
        format!("outlook.timezone=\"{}\"", self.time_zone)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, GraphServiceError> {
        let token = self.credential.token().await?;
        let response = request
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(parse_odata_error(status.as_u16(), &body));
        }
        Ok(serde_json::from_slice(&body)?)
    }

    async fn send_json<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        body: &B,
    ) -> Result<T, GraphServiceError> {
        let body = serde_json::to_vec(body)?;
        self.send(
            request
                .header(CONTENT_TYPE, "application/json")
                .header("Prefer", self.prefer_time_zone())
                .body(body),
        )
        .await
    }
}

impl CalendarService for GraphCalendarService {
    type Error = GraphServiceError;

    fn access_token(&self) -> BoxFuture<'_, String, Self::Error> {
        Box::pin(async move { Ok(self.credential.token().await?) })
    }

    fn get_user(&self) -> BoxFuture<'_, UserProfile, Self::Error> {
        Box::pin(async move {
            let url = self.endpoint_with_query(&["me"], &[("$select", USER_SELECT)])?;
            self.send(self.http.get(url)).await
        })
    }

    /// Free/busy lookup via `POST /me/calendar/getSchedule`.
    ///
    /// One `ScheduleInformation` is returned per requested principal, in
    /// request order. Graph reports per-principal failures inside the entry's
    /// `error` field rather than as an HTTP error.
    fn get_schedule(
        &self,
        request: ScheduleRequest,
    ) -> BoxFuture<'_, Vec<ScheduleInformation>, Self::Error> {
        Box::pin(async move {
            let url = self.endpoint(&["me", "calendar", "getSchedule"])?;
            debug!("getSchedule for {:?}", request.schedules);
            let page: ODataCollection<ScheduleInformation> =
                self.send_json(self.http.post(url), &request).await?;
            Ok(page.value)
        })
    }

    fn create_event(&self, event: NewEvent) -> BoxFuture<'_, EventSummary, Self::Error> {
        Box::pin(async move {
            let url = self.endpoint(&["me", "events"])?;
            let created: EventSummary = self.send_json(self.http.post(url), &event).await?;
            info!("Created event {}", created.id);
            Ok(created)
        })
    }

    fn update_event(
        &self,
        event_id: &str,
        patch: EventPatch,
    ) -> BoxFuture<'_, EventSummary, Self::Error> {
        let event_id = event_id.to_string();
        Box::pin(async move {
            let url = self.endpoint(&["me", "events", &event_id])?;
            let updated: EventSummary = self.send_json(self.http.patch(url), &patch).await?;
            info!("Updated event {}", updated.id);
            Ok(updated)
        })
    }

    /// Lists `GET /me/calendarView`, following `@odata.nextLink` until exhausted.
    fn calendar_view(
        &self,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> BoxFuture<'_, Vec<EventSummary>, Self::Error> {
        Box::pin(async move {
            let start = crate::logic::format_with_offset(&start);
            let end = crate::logic::format_with_offset(&end);
            let mut url = self.endpoint_with_query(
                &["me", "calendarView"],
                &[
                    ("startDateTime", start.as_str()),
                    ("endDateTime", end.as_str()),
                    ("$select", EVENT_SELECT),
                    ("$orderby", "start/dateTime"),
                    ("$top", CALENDAR_VIEW_PAGE_SIZE),
                ],
            )?;

            let mut events = Vec::new();
            loop {
                let request = self
                    .http
                    .get(url)
                    .header("Prefer", self.prefer_time_zone());
                let page: ODataCollection<EventSummary> = self.send(request).await?;
                events.extend(page.value);
                match page.next_link {
                    Some(next) => {
                        url = Url::parse(&next)
                            .map_err(|e| GraphServiceError::InvalidUrl(format!("{}: {}", next, e)))?;
                    }
                    None => break,
                }
            }
            debug!("calendarView returned {} events", events.len());
            Ok(events)
        })
    }

    fn find_meeting_times(
        &self,
        request: MeetingTimeRequest,
    ) -> BoxFuture<'_, MeetingTimeSuggestionsResult, Self::Error> {
        Box::pin(async move {
            let url = self.endpoint(&["me", "findMeetingTimes"])?;
            self.send_json(self.http.post(url), &request).await
        })
    }
}

/// In-memory calendar used by tests and demos.
pub mod mock {
    use super::*;
    use calgraph_common::models::{ScheduleItem, TimeSlot};
    use chrono::NaiveDateTime;
    use std::collections::BTreeMap;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    #[derive(Default)]
    struct MockState {
        events: BTreeMap<String, EventSummary>,
        next_id: u64,
        schedule_requests: Vec<ScheduleRequest>,
        meeting_requests: Vec<MeetingTimeRequest>,
        create_calls: usize,
        update_calls: usize,
    }

    /// Mock calendar service for testing.
    ///
    /// Busy times are derived from the events it holds, so creating an event
    /// makes its slot unavailable for later checks.
    pub struct MockCalendarService {
        user: UserProfile,
        schedule_missing: bool,
        state: Mutex<MockState>,
    }

    impl Default for MockCalendarService {
        fn default() -> Self {
            Self::new()
        }
    }

    fn naive(value: &calgraph_common::models::DateTimeTimeZone) -> Option<NaiveDateTime> {
        value.naive().ok()
    }

    impl MockCalendarService {
        /// Create a new mock calendar service.
        pub fn new() -> Self {
            Self {
                user: UserProfile {
                    display_name: Some("Megan Bowen".to_string()),
                    mail: Some("megan@contoso.com".to_string()),
                    user_principal_name: Some("megan@contoso.com".to_string()),
                },
                schedule_missing: false,
                state: Mutex::new(MockState::default()),
            }
        }

        fn state(&self) -> MutexGuard<'_, MockState> {
            self.state.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Make `get_schedule` answer with no schedule information at all.
        pub fn without_schedule(mut self) -> Self {
            self.schedule_missing = true;
            self
        }

        /// Store an event directly, bypassing availability checks.
        pub fn insert_event(&self, subject: &str, start: NaiveDateTime, end: NaiveDateTime) -> String {
            let mut state = self.state();
            state.next_id += 1;
            let id = format!("evt-{}", state.next_id);
            state.events.insert(
                id.clone(),
                EventSummary {
                    id: id.clone(),
                    subject: Some(subject.to_string()),
                    start: calgraph_common::models::DateTimeTimeZone::new(start, "UTC"),
                    end: calgraph_common::models::DateTimeTimeZone::new(end, "UTC"),
                    location: None,
                    organizer: None,
                    is_all_day: false,
                    web_link: None,
                },
            );
            id
        }

        pub fn event(&self, id: &str) -> Option<EventSummary> {
            self.state().events.get(id).cloned()
        }

        pub fn schedule_requests(&self) -> Vec<ScheduleRequest> {
            self.state().schedule_requests.clone()
        }

        pub fn meeting_requests(&self) -> Vec<MeetingTimeRequest> {
            self.state().meeting_requests.clone()
        }

        pub fn create_calls(&self) -> usize {
            self.state().create_calls
        }

        pub fn update_calls(&self) -> usize {
            self.state().update_calls
        }
    }

    impl CalendarService for MockCalendarService {
        type Error = GraphServiceError;

        fn access_token(&self) -> BoxFuture<'_, String, Self::Error> {
            Box::pin(async move { Ok("mock-token".to_string()) })
        }

        fn get_user(&self) -> BoxFuture<'_, UserProfile, Self::Error> {
            Box::pin(async move { Ok(self.user.clone()) })
        }

        fn get_schedule(
            &self,
            request: ScheduleRequest,
        ) -> BoxFuture<'_, Vec<ScheduleInformation>, Self::Error> {
            Box::pin(async move {
                let mut state = self.state();
                state.schedule_requests.push(request.clone());
                if self.schedule_missing {
                    return Ok(Vec::new());
                }

                let window_start = naive(&request.start_time);
                let window_end = naive(&request.end_time);
                let items: Vec<ScheduleItem> = state
                    .events
                    .values()
                    .filter(|event| match (window_start, window_end, naive(&event.start), naive(&event.end)) {
                        (Some(ws), Some(we), Some(es), Some(ee)) => es <= we && ee >= ws,
                        _ => true,
                    })
                    .map(|event| ScheduleItem {
                        status: Some("busy".to_string()),
                        subject: event.subject.clone(),
                        start: event.start.clone(),
                        end: event.end.clone(),
                    })
                    .collect();

                Ok(request
                    .schedules
                    .iter()
                    .map(|schedule| ScheduleInformation {
                        schedule_id: schedule.clone(),
                        schedule_items: items.clone(),
                        availability_view: None,
                        error: None,
                    })
                    .collect())
            })
        }

        fn create_event(&self, event: NewEvent) -> BoxFuture<'_, EventSummary, Self::Error> {
            Box::pin(async move {
                let mut state = self.state();
                state.create_calls += 1;
                state.next_id += 1;
                let id = format!("evt-{}", state.next_id);
                let created = EventSummary {
                    id: id.clone(),
                    subject: Some(event.subject),
                    start: event.start,
                    end: event.end,
                    location: None,
                    organizer: None,
                    is_all_day: false,
                    web_link: None,
                };
                state.events.insert(id, created.clone());
                Ok(created)
            })
        }

        fn update_event(
            &self,
            event_id: &str,
            patch: EventPatch,
        ) -> BoxFuture<'_, EventSummary, Self::Error> {
            let event_id = event_id.to_string();
            Box::pin(async move {
                let mut state = self.state();
                state.update_calls += 1;
                let event = state.events.get_mut(&event_id).ok_or_else(|| GraphServiceError::Api {
                    status: 404,
                    code: "ErrorItemNotFound".to_string(),
                    message: "The specified object was not found in the store.".to_string(),
                })?;
                if let Some(subject) = patch.subject {
                    event.subject = Some(subject);
                }
                if let Some(start) = patch.start {
                    event.start = start;
                }
                if let Some(end) = patch.end {
                    event.end = end;
                }
                Ok(event.clone())
            })
        }

        fn calendar_view(
            &self,
            start: DateTime<FixedOffset>,
            end: DateTime<FixedOffset>,
        ) -> BoxFuture<'_, Vec<EventSummary>, Self::Error> {
            Box::pin(async move {
                let state = self.state();
                let (start, end) = (start.naive_local(), end.naive_local());
                Ok(state
                    .events
                    .values()
                    .filter(|event| match (naive(&event.start), naive(&event.end)) {
                        (Some(es), Some(ee)) => es < end && ee > start,
                        _ => false,
                    })
                    .cloned()
                    .collect())
            })
        }

        fn find_meeting_times(
            &self,
            request: MeetingTimeRequest,
        ) -> BoxFuture<'_, MeetingTimeSuggestionsResult, Self::Error> {
            Box::pin(async move {
                let mut state = self.state();
                state.meeting_requests.push(request.clone());
                let suggestions = request
                    .time_constraint
                    .time_slots
                    .iter()
                    .map(|slot| calgraph_common::models::MeetingTimeSuggestion {
                        confidence: Some(100.0),
                        organizer_availability: Some("free".to_string()),
                        suggestion_reason: Some("Suggested because it is the first open slot.".to_string()),
                        meeting_time_slot: TimeSlot {
                            start: slot.start.clone(),
                            end: slot.end.clone(),
                        },
                        attendee_availability: Vec::new(),
                    })
                    .collect();
                Ok(MeetingTimeSuggestionsResult {
                    empty_suggestions_reason: None,
                    meeting_time_suggestions: suggestions,
                })
            })
        }
    }
}
