// Integration tests for `ApiClient` using wiremock.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use skywatch_api::models::ProfileUpdate;
use skywatch_api::{ApiClient, AuthState, Error, Session, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient, Arc<Session>) {
    let server = MockServer::start().await;
    let session = Arc::new(Session::new());
    let client = ApiClient::from_reqwest(
        &format!("{}/api", server.uri()),
        reqwest::Client::new(),
        Arc::clone(&session),
    )
    .unwrap();
    (server, client, session)
}

fn token(raw: &str) -> SecretString {
    SecretString::from(raw.to_owned())
}

// ── Auth ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_stores_token_and_identity() {
    let (server, client, session) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "email": "pilot@skywatch.id", "password": "s3cret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "jwt-abc",
            "email": "pilot@skywatch.id",
            "name": "Pilot",
            "role": "Operator"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/user/profile"))
        .and(header("authorization", "Bearer jwt-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "name": "Pilot",
                "email": "pilot@skywatch.id",
                "phone": "",
                "role": "Operator",
                "department": "Ops",
                "profileImage": null
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let identity = client.login("pilot@skywatch.id", &token("s3cret")).await.unwrap();
    assert_eq!(identity.name.as_deref(), Some("Pilot"));
    assert_eq!(session.state(), AuthState::Authenticated);

    let profile = client.get_profile().await.unwrap();
    assert_eq!(profile.department.as_deref(), Some("Ops"));
    assert!(profile.profile_image.is_none());
}

#[tokio::test]
async fn test_login_bad_credentials_is_not_a_reauth_signal() {
    let (server, client, session) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "Email atau password salah." })),
        )
        .mount(&server)
        .await;

    let err = client.login("x@y.z", &token("nope")).await.unwrap_err();
    match err {
        Error::Authentication { message } => assert_eq!(message, "Email atau password salah."),
        other => panic!("expected Authentication, got {other:?}"),
    }
    assert_eq!(session.state(), AuthState::Anonymous);
}

#[tokio::test]
async fn test_unauthorized_clears_credential_once() {
    let (server, client, session) = setup().await;
    session.establish(token("stale"), skywatch_api::Identity::default());
    let mut rx = session.watch();
    rx.mark_unchanged();

    Mock::given(method("GET"))
        .and(path("/api/telemetry/latest"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Token expired" })))
        .expect(2)
        .mount(&server)
        .await;

    let first = client.latest_telemetry().await.unwrap_err();
    let second = client.latest_telemetry().await.unwrap_err();
    assert!(first.is_unauthorized());
    assert!(second.is_unauthorized());

    assert!(session.bearer().is_none());
    assert!(rx.has_changed().unwrap());
    assert_eq!(*rx.borrow_and_update(), AuthState::ReauthRequired);
    // Signal already spent by the first rejection.
    assert!(!session.invalidate());
}

// ── Telemetry & sensors ─────────────────────────────────────────────

#[tokio::test]
async fn test_latest_telemetry_folds_source() {
    let (server, client, _session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/telemetry/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Data terbaru dari Pixhawk.",
            "source": "pixhawk",
            "data": {
                "battery": 76,
                "altitude": "35.2",
                "heading": 181,
                "attitude": { "roll": 0.1, "pitch": -0.05, "yaw": 3.1 },
                "gps": { "latitude": -6.9, "longitude": 107.6, "fix_type": 3, "satellites_visible": 11 },
                "timestamp": "2025-01-02T10:00:00.123456"
            }
        })))
        .mount(&server)
        .await;

    let record = client.latest_telemetry().await.unwrap().unwrap();
    assert_eq!(record.source.as_deref(), Some("pixhawk"));
    assert_eq!(record.altitude, Some(35.2));
    assert_eq!(record.gps.unwrap().satellites_visible, Some(11));
}

#[tokio::test]
async fn test_telemetry_404_is_not_found() {
    let (server, client, _session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/telemetry/latest"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "Tidak ada data" })))
        .mount(&server)
        .await;

    let err = client.latest_telemetry().await.unwrap_err();
    assert!(err.is_not_found());
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_sensors_null_data() {
    let (server, client, _session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/sensors/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": null })))
        .mount(&server)
        .await;

    assert!(client.latest_sensors().await.unwrap().is_none());
}

// ── Reports ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_reports_decodes_map() {
    let (server, client, _session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/reports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "r1": {
                "timestamp": "2025-01-01T10:00:00Z",
                "severity": "high",
                "confidence": "88",
                "location": { "latitude": -6.2, "longitude": 106.8 },
                "image_url": "https://cdn/1.jpg"
            },
            "r2": { "timestamp": "2025-01-02T10:00:00Z", "severity": "medium" }
        })))
        .mount(&server)
        .await;

    let mut reports = client.list_reports().await.unwrap();
    reports.sort_by(|a, b| a.id.cmp(&b.id));
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].record.confidence, Some(88.0));
    assert_eq!(reports[1].record.severity.as_deref(), Some("medium"));
}

#[tokio::test]
async fn test_list_reports_404() {
    let (server, client, _session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/reports"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Tidak ada laporan ditemukan." })),
        )
        .mount(&server)
        .await;

    let err = client.list_reports().await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Backend error (HTTP 404): Tidak ada laporan ditemukan.");
}

// ── Profile ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_update_profile_sends_only_set_fields() {
    let (server, client, _session) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/user/profile"))
        .and(body_json(json!({ "phone": "0812-000" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Profil berhasil diupdate.",
            "data": { "name": "Pilot", "phone": "0812-000" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let update = ProfileUpdate { phone: Some("0812-000".into()), ..ProfileUpdate::default() };
    let profile = client.update_profile(&update).await.unwrap();
    assert_eq!(profile.phone.as_deref(), Some("0812-000"));
}

// ── Servo ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_move_servo() {
    let (server, client, _session) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/servo/move"))
        .and(body_json(json!({ "channel": 9, "pwm": 1500 })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "OK", "channel": 9, "pwm": 1500 })),
        )
        .mount(&server)
        .await;

    let ack = client.move_servo(9, 1500).await.unwrap();
    assert_eq!(ack.status.as_deref(), Some("OK"));
    assert_eq!(ack.pwm, Some(1500));
}

#[tokio::test]
async fn test_move_servo_out_of_range_never_hits_backend() {
    let (server, client, _session) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/servo/move"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client.move_servo(9, 2500).await.unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));
}

// ── Video ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_latest_frame() {
    let (server, client, _session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/video/latest/fire"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "detected_fire/2025-01-02_10-00-00.jpg",
            "url": "https://storage/fire.jpg",
            "updated": "2025-01-02T10:00:00+00:00",
            "size": 48213
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/video/latest/thermal"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "x" })))
        .mount(&server)
        .await;

    let frame = client.latest_frame("fire").await.unwrap().unwrap();
    assert_eq!(frame.url.as_deref(), Some("https://storage/fire.jpg"));
    assert_eq!(frame.size, Some(48213));

    assert!(client.latest_frame("thermal").await.unwrap().is_none());
}

// ── Timeouts ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_slow_backend_is_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/telemetry/latest"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": { "battery": 80 } }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let transport = TransportConfig {
        timeout: Duration::from_millis(200),
        ..TransportConfig::default()
    };
    let base = url::Url::parse(&format!("{}/api", server.uri())).unwrap();
    let client = ApiClient::new(base, Arc::new(Session::new()), &transport).unwrap();

    let err = client.latest_telemetry().await.unwrap_err();
    assert!(matches!(err, Error::Timeout { timeout_ms: 200 }), "{err:?}");
    assert!(err.is_transient());
}
