use calgraph_common::CalgraphError;
use calgraph_config::{load_config_from, BoundaryPolicy};
use calgraph_graph::service::mock::MockCalendarService;
use calgraph_graph::{CalendarClient, CalendarSettings};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::io::Write;

fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

#[tokio::test]
async fn test_book_move_and_rebook_flow() {
    let client = CalendarClient::new(MockCalendarService::new(), CalendarSettings::default());
    let me = client.get_user().await.unwrap();
    let email = me.email().unwrap().to_string();

    // Book 10:00-11:00, then move it to the next day.
    let id = client
        .create_event(&email, at(2, 10, 0), at(2, 11, 0), "Design review")
        .await
        .unwrap()
        .expect("empty calendar should accept the booking");
    let moved = client
        .update_event(
            &email,
            at(2, 10, 0) + Duration::days(1),
            at(2, 11, 0) + Duration::days(1),
            "Design review",
            &id,
        )
        .await
        .unwrap();
    assert!(moved);

    // The original slot is free again, the new one is taken.
    assert!(client.is_available(&email, at(2, 10, 0), at(2, 11, 0)).await.unwrap());
    assert!(!client.is_available(&email, at(3, 10, 30), at(3, 12, 0)).await.unwrap());

    // Back-to-back with the moved event is refused under the default policy.
    let second = client
        .create_event(&email, at(3, 11, 0), at(3, 12, 0), "Follow-up")
        .await
        .unwrap();
    assert_eq!(second, None);
    assert_eq!(client.service().create_calls(), 1);
}

#[tokio::test]
async fn test_settings_from_config_file_drive_the_policy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.cfg");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        "[azure]\nclientId = 11111111-2222-3333-4444-555555555555\ntenantId = common\ngraphUserScopes = User.Read Calendars.ReadWrite\n\n[graph]\nboundary_policy = half_open\navailability_interval = 15\n"
    )
    .unwrap();

    let config = load_config_from(&[path]).unwrap();
    let settings = CalendarSettings::from_config(&config.graph).unwrap();
    assert_eq!(settings.boundary_policy, BoundaryPolicy::HalfOpen);

    let client = CalendarClient::new(MockCalendarService::new(), settings);
    client.service().insert_event("Standup", at(2, 9, 0), at(2, 10, 0));
    assert!(client
        .is_available("megan@contoso.com", at(2, 10, 0), at(2, 11, 0))
        .await
        .unwrap());
    assert_eq!(client.service().schedule_requests()[0].availability_view_interval, 15);
}

#[tokio::test]
async fn test_errors_convert_for_display() {
    let client = CalendarClient::new(MockCalendarService::new(), CalendarSettings::default());
    let err: CalgraphError = client
        .suggest_meeting_times("megan@contoso.com", at(2, 9, 0), at(2, 17, 0), -30)
        .await
        .unwrap_err()
        .into();
    assert_eq!(err.code(), "ValidationError");
    assert!(err.message().contains("-30"));
}
