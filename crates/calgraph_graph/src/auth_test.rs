#[cfg(test)]
mod tests {
    use crate::auth::{
        expires_after, next_poll_action, AuthError, DeviceCodeCredential, PollAction,
    };
    use std::time::{Duration, Instant};
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credential(server: &MockServer) -> DeviceCodeCredential {
        DeviceCodeCredential::new(
            reqwest::Client::new(),
            &server.uri(),
            "common",
            "client-123",
            vec!["User.Read".to_string(), "Calendars.ReadWrite".to_string()],
        )
        .with_prompt(|_| {})
    }

    async fn mount_device_code(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/common/oauth2/v2.0/devicecode"))
            .and(body_string_contains("client_id=client-123"))
            .and(body_string_contains("scope=User.Read+Calendars.ReadWrite"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "device_code": "dev-123",
                "user_code": "ABCD-EFGH",
                "verification_uri": "https://microsoft.com/devicelogin",
                "expires_in": 900,
                "interval": 0,
                "message": "Go to https://microsoft.com/devicelogin and enter ABCD-EFGH"
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    #[test]
    fn test_next_poll_action() {
        assert_eq!(
            next_poll_action("authorization_pending", 5),
            PollAction::Retry { interval_secs: 5 }
        );
        assert_eq!(
            next_poll_action("slow_down", 5),
            PollAction::Retry { interval_secs: 10 }
        );
        assert_eq!(next_poll_action("authorization_declined", 5), PollAction::Declined);
        assert_eq!(next_poll_action("expired_token", 5), PollAction::Expired);
        assert_eq!(next_poll_action("invalid_grant", 5), PollAction::Fail);
    }

    #[tokio::test]
    async fn test_device_code_flow_polls_until_issued_then_caches() {
        let server = MockServer::start().await;
        mount_device_code(&server).await;

        Mock::given(method("POST"))
            .and(path("/common/oauth2/v2.0/token"))
            .and(body_string_contains("device_code=dev-123"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "authorization_pending",
                "error_description": "waiting for the user"
            })))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/common/oauth2/v2.0/token"))
            .and(body_string_contains("device_code=dev-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token_type": "Bearer",
                "access_token": "at-1",
                "refresh_token": "rt-1",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let credential = credential(&server);
        assert_eq!(credential.token().await.unwrap(), "at-1");
        // Served from the cache; the `expect(1)` guards verify no second sign-in.
        assert_eq!(credential.token().await.unwrap(), "at-1");
    }

    #[test]
    fn test_expires_after_caps_server_lifetime() {
        let now = Instant::now();
        assert_eq!(expires_after(now, 3600), now + Duration::from_secs(3600));
        assert_eq!(expires_after(now, u64::MAX), now + Duration::from_secs(24 * 60 * 60));
    }

    #[tokio::test]
    async fn test_huge_expires_in_is_accepted() {
        let server = MockServer::start().await;
        mount_device_code(&server).await;

        Mock::given(method("POST"))
            .and(path("/common/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token_type": "Bearer",
                "access_token": "at-long",
                "expires_in": u64::MAX
            })))
            .expect(1)
            .mount(&server)
            .await;

        let credential = credential(&server);
        assert_eq!(credential.token().await.unwrap(), "at-long");
        assert_eq!(credential.token().await.unwrap(), "at-long");
    }

    #[tokio::test]
    async fn test_declined_sign_in_is_reported() {
        let server = MockServer::start().await;
        mount_device_code(&server).await;

        Mock::given(method("POST"))
            .and(path("/common/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "authorization_declined"
            })))
            .mount(&server)
            .await;

        let err = credential(&server).token().await.unwrap_err();
        assert!(matches!(err, AuthError::Declined), "got: {err}");
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_with_refresh_token() {
        let server = MockServer::start().await;
        mount_device_code(&server).await;

        // Issued already inside the expiry margin, so the next call must refresh.
        Mock::given(method("POST"))
            .and(path("/common/oauth2/v2.0/token"))
            .and(body_string_contains("device_code=dev-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "at-short",
                "refresh_token": "rt-1",
                "expires_in": 0
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/common/oauth2/v2.0/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=rt-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "at-refreshed",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let credential = credential(&server);
        assert_eq!(credential.token().await.unwrap(), "at-short");
        assert_eq!(credential.token().await.unwrap(), "at-refreshed");
    }

    #[tokio::test]
    async fn test_rejected_device_code_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/common/oauth2/v2.0/devicecode"))
            .respond_with(ResponseTemplate::new(400).set_body_string("AADSTS700016: unknown client"))
            .mount(&server)
            .await;

        let err = credential(&server).token().await.unwrap_err();
        match err {
            AuthError::DeviceCodeRejected { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("AADSTS700016"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
