// --- File: crates/services/calgraph_console/src/actions.rs ---
//! Menu actions. Inputs are collected by the caller; results are written to
//! `out` so the same code serves stdout and tests.

use std::io::Write;

use calgraph_common::models::{DateTimeTimeZone, EventSummary, MeetingTimeSuggestionsResult};
use calgraph_common::services::CalendarService;
use calgraph_common::CalgraphError;
use calgraph_graph::CalendarClient;
use chrono::{Duration, NaiveDateTime};

use crate::error::ConsoleError;

/// Length of the slots proposed by "Suggest free times".
pub const SUGGESTED_MEETING_MINUTES: i64 = 60;

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Address used as the attendee for the signed-in user's own checks.
pub async fn user_email<S: CalendarService>(
    client: &CalendarClient<S>,
) -> Result<String, ConsoleError> {
    let user = client.get_user().await?;
    user.email().map(str::to_string).ok_or_else(|| {
        ConsoleError::Calendar(CalgraphError::NotFoundError(
            "the signed-in user has neither mail nor userPrincipalName".to_string(),
        ))
    })
}

pub async fn greet_user<S: CalendarService>(
    client: &CalendarClient<S>,
    out: &mut impl Write,
) -> Result<(), ConsoleError> {
    let user = client.get_user().await?;
    writeln!(out, "Hello, {}", user.display_name.as_deref().unwrap_or("there"))?;
    writeln!(out, "Email: {}\n", user.email().unwrap_or("(none)"))?;
    Ok(())
}

pub async fn display_access_token<S: CalendarService>(
    client: &CalendarClient<S>,
    out: &mut impl Write,
) -> Result<(), ConsoleError> {
    let token = client.get_user_token().await?;
    writeln!(out, "User token: {}\n", token)?;
    Ok(())
}

pub async fn check_availability<S: CalendarService>(
    client: &CalendarClient<S>,
    email: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
    out: &mut impl Write,
) -> Result<(), ConsoleError> {
    let free = client.is_available(email, start, end).await?;
    writeln!(out, "Is time available? {}\n", free)?;
    Ok(())
}

/// Books the slot, then tries to push the new event one day ahead.
pub async fn create_and_move_event<S: CalendarService>(
    client: &CalendarClient<S>,
    email: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
    title: &str,
    out: &mut impl Write,
) -> Result<(), ConsoleError> {
    let Some(event_id) = client.create_event(email, start, end, title).await? else {
        writeln!(out, "Failed to create event: the time is not available\n")?;
        return Ok(());
    };
    writeln!(out, "Event id: {}", event_id)?;

    let moved = client
        .update_event(
            email,
            start + Duration::days(1),
            end + Duration::days(1),
            title,
            &event_id,
        )
        .await?;
    writeln!(out, "Event moved 1 day ahead? {}\n", moved)?;
    Ok(())
}

pub async fn preview_week<S: CalendarService>(
    client: &CalendarClient<S>,
    out: &mut impl Write,
) -> Result<(), ConsoleError> {
    let events = client.preview_schedule(true).await?;
    write!(out, "{}", render_events(&events))?;
    Ok(())
}

pub async fn suggest_free_times<S: CalendarService>(
    client: &CalendarClient<S>,
    email: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
    out: &mut impl Write,
) -> Result<(), ConsoleError> {
    let result = client
        .suggest_meeting_times(email, start, end, SUGGESTED_MEETING_MINUTES)
        .await?;
    write!(out, "{}", render_suggestions(&result))?;
    Ok(())
}

/// Prints the failure of one menu action; the loop carries on afterwards.
pub fn report_error(err: &ConsoleError, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "Error:")?;
    match err {
        ConsoleError::Calendar(e) => writeln!(out, "{} {}\n", e.code(), e.message()),
        other => writeln!(out, "{}\n", other),
    }
}

fn display_time(value: &DateTimeTimeZone) -> String {
    match value.naive() {
        Ok(naive) => naive.format(DISPLAY_FORMAT).to_string(),
        Err(_) => value.date_time.clone(),
    }
}

pub(crate) fn render_events(events: &[EventSummary]) -> String {
    if events.is_empty() {
        return "No events for the rest of the week.\n\n".to_string();
    }
    let mut text = String::new();
    for event in events {
        let subject = event.subject.as_deref().unwrap_or("(no subject)");
        text.push_str(&format!(
            "{} - {} ({}) {}",
            display_time(&event.start),
            display_time(&event.end),
            event.start.time_zone,
            subject
        ));
        if let Some(place) = event.location.as_ref().and_then(|l| l.display_name.as_deref()) {
            if !place.is_empty() {
                text.push_str(&format!(" @ {}", place));
            }
        }
        text.push('\n');
    }
    text.push('\n');
    text
}

pub(crate) fn render_suggestions(result: &MeetingTimeSuggestionsResult) -> String {
    if result.meeting_time_suggestions.is_empty() {
        let reason = result
            .empty_suggestions_reason
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or("unknown");
        return format!("No suggestions (reason: {})\n\n", reason);
    }
    let mut text = String::new();
    for suggestion in &result.meeting_time_suggestions {
        let slot = &suggestion.meeting_time_slot;
        text.push_str(&format!(
            "{} - {} ({})",
            display_time(&slot.start),
            display_time(&slot.end),
            slot.start.time_zone
        ));
        if let Some(confidence) = suggestion.confidence {
            text.push_str(&format!(", confidence {:.0}%", confidence));
        }
        if let Some(availability) = &suggestion.organizer_availability {
            text.push_str(&format!(", you are {}", availability));
        }
        text.push('\n');
    }
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use calgraph_graph::service::mock::MockCalendarService;
    use calgraph_graph::CalendarSettings;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn client() -> CalendarClient<MockCalendarService> {
        CalendarClient::new(MockCalendarService::new(), CalendarSettings::default())
    }

    fn output(buffer: Vec<u8>) -> String {
        String::from_utf8(buffer).unwrap()
    }

    #[tokio::test]
    async fn test_greet_user() {
        let mut out = Vec::new();
        greet_user(&client(), &mut out).await.unwrap();
        assert_eq!(output(out), "Hello, Megan Bowen\nEmail: megan@contoso.com\n\n");
    }

    #[tokio::test]
    async fn test_create_and_move_event_reports_both_steps() {
        let client = client();
        let mut out = Vec::new();
        create_and_move_event(&client, "megan@contoso.com", at(15, 10), at(15, 11), "Planning", &mut out)
            .await
            .unwrap();
        assert_eq!(output(out), "Event id: evt-1\nEvent moved 1 day ahead? true\n\n");
        let event = client.service().event("evt-1").unwrap();
        assert_eq!(event.start.date_time, "2025-05-16T10:00:00");
    }

    #[tokio::test]
    async fn test_create_and_move_event_on_busy_slot() {
        let client = client();
        client.service().insert_event("Offsite", at(15, 8), at(15, 18));
        let mut out = Vec::new();
        create_and_move_event(&client, "megan@contoso.com", at(15, 10), at(15, 11), "Planning", &mut out)
            .await
            .unwrap();
        assert!(output(out).starts_with("Failed to create event"));
        assert_eq!(client.service().create_calls(), 0);
    }

    #[tokio::test]
    async fn test_check_availability_output() {
        let mut out = Vec::new();
        check_availability(&client(), "megan@contoso.com", at(15, 10), at(15, 11), &mut out)
            .await
            .unwrap();
        assert_eq!(output(out), "Is time available? true\n\n");
    }

    #[tokio::test]
    async fn test_suggest_free_times_uses_sixty_minutes() {
        let client = client();
        let mut out = Vec::new();
        suggest_free_times(&client, "megan@contoso.com", at(15, 9), at(15, 17), &mut out)
            .await
            .unwrap();
        assert_eq!(client.service().meeting_requests()[0].meeting_duration, "PT3600S");
        assert!(output(out).starts_with("2025-05-15 09:00 - 2025-05-15 17:00 (Pacific Standard Time), confidence 100%"));
    }

    #[tokio::test]
    async fn test_report_error_prints_code_and_message() {
        let client = client();
        let err = client
            .update_event("megan@contoso.com", at(20, 10), at(20, 11), "Ghost", "missing")
            .await
            .unwrap_err();
        let mut out = Vec::new();
        report_error(&ConsoleError::from(err), &mut out).unwrap();
        assert_eq!(
            output(out),
            "Error:\nErrorItemNotFound The specified object was not found in the store.\n\n"
        );
    }

    #[test]
    fn test_render_empty_lists() {
        assert_eq!(render_events(&[]), "No events for the rest of the week.\n\n");
        let empty = MeetingTimeSuggestionsResult {
            empty_suggestions_reason: Some("attendeesUnavailable".to_string()),
            meeting_time_suggestions: Vec::new(),
        };
        assert_eq!(
            render_suggestions(&empty),
            "No suggestions (reason: attendeesUnavailable)\n\n"
        );
    }

    #[test]
    fn test_render_events_drops_fractional_seconds() {
        let event = EventSummary {
            id: "evt-9".to_string(),
            subject: Some("Retro".to_string()),
            start: DateTimeTimeZone {
                date_time: "2025-05-16T14:00:00.0000000".to_string(),
                time_zone: "Pacific Standard Time".to_string(),
            },
            end: DateTimeTimeZone {
                date_time: "2025-05-16T15:00:00.0000000".to_string(),
                time_zone: "Pacific Standard Time".to_string(),
            },
            location: None,
            organizer: None,
            is_all_day: false,
            web_link: None,
        };
        assert_eq!(
            render_events(&[event]),
            "2025-05-16 14:00 - 2025-05-16 15:00 (Pacific Standard Time) Retro\n\n"
        );
    }
}
