use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Form, Json, Router,
};
use qr_attendance::{
    config::ServerConfig,
    flash::{take_flash, CookieJar, Notifier},
    AttendanceApi, AttendanceOutcome, HttpAttendanceClient, RegistrationId,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Received = Arc<Mutex<Vec<String>>>;

async fn mark(
    State(received): State<Received>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let reg_no = form.get("reg_no").cloned().unwrap_or_default();
    received.lock().unwrap().push(reg_no.clone());

    match reg_no.as_str() {
        "A100" => Json(json!({
            "status": "success",
            "message": "Marked present",
            "student": "Asha",
            "reg_no": "A100",
        }))
        .into_response(),
        "DUP1" => Json(json!({"status": "duplicate", "message": "Already marked"})).into_response(),
        "ODD1" => Json(json!({"status": "paused"})).into_response(),
        "BAD1" => (StatusCode::BAD_GATEWAY, "<html>upstream error</html>").into_response(),
        "SLOW" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"status": "success", "message": "too late"})).into_response()
        }
        "FLSH" => (
            [(header::SET_COOKIE, "flash=\"Welcome back\"; Max-Age=5; Path=/")],
            Json(json!({"status": "success", "message": "Marked present"})),
        )
            .into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Student not found"})),
        )
            .into_response(),
    }
}

async fn stub_server() -> (String, Received) {
    let received: Received = Arc::default();
    let app = Router::new()
        .route("/attendance/mark", post(mark))
        .with_state(Arc::clone(&received));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), received)
}

fn client_for(base_url: &str) -> HttpAttendanceClient {
    let config = ServerConfig {
        base_url: base_url.to_string(),
        ..Default::default()
    };
    HttpAttendanceClient::new(&config).unwrap()
}

fn id(s: &str) -> RegistrationId {
    RegistrationId::new(s).unwrap()
}

#[tokio::test]
async fn posts_form_encoded_reg_no() {
    let (url, received) = stub_server().await;
    let client = client_for(&url);

    let outcome = client.submit(&id("A100")).await;

    assert_eq!(outcome, AttendanceOutcome::Success("Marked present".into()));
    assert_eq!(*received.lock().unwrap(), vec!["A100".to_string()]);
}

#[tokio::test]
async fn duplicate_and_unknown_status() {
    let (url, _) = stub_server().await;
    let client = client_for(&url);

    assert_eq!(
        client.submit(&id("DUP1")).await,
        AttendanceOutcome::Duplicate("Already marked".into())
    );
    assert_eq!(
        client.submit(&id("ODD1")).await,
        AttendanceOutcome::Rejected("Scan failed".into())
    );
}

#[tokio::test]
async fn not_found_detail_is_rejection() {
    let (url, _) = stub_server().await;
    let client = client_for(&url);

    assert_eq!(
        client.submit(&id("NOPE")).await,
        AttendanceOutcome::Rejected("Student not found".into())
    );
}

#[tokio::test]
async fn html_error_page_is_network_failure() {
    let (url, received) = stub_server().await;
    let client = client_for(&url);

    assert_eq!(client.submit(&id("BAD1")).await, AttendanceOutcome::NetworkFailure);
    // Exactly one request, never retried.
    assert_eq!(received.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn timeout_is_network_failure() {
    let (url, received) = stub_server().await;
    let config = ServerConfig {
        base_url: url,
        timeout_ms: 200,
        ..Default::default()
    };
    let client = HttpAttendanceClient::new(&config).unwrap();

    assert_eq!(client.submit(&id("SLOW")).await, AttendanceOutcome::NetworkFailure);
    assert_eq!(received.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn flash_cookie_from_server_shown_on_next_launch() {
    let (url, _) = stub_server().await;
    let dir = tempfile::tempdir().unwrap();
    let cookie_file = dir.path().join("cookies");

    let jar = Arc::new(Mutex::new(CookieJar::new()));
    let client = client_for(&url).with_cookie_jar(Arc::clone(&jar));
    client.submit(&id("FLSH")).await;
    jar.lock().unwrap().save(&cookie_file).unwrap();

    struct Shown(Vec<String>);
    impl Notifier for Shown {
        fn alert(&mut self, message: &str) {
            self.0.push(message.to_string());
        }
    }

    let mut next_launch = CookieJar::load(&cookie_file).unwrap();
    let mut shown = Shown(Vec::new());
    assert_eq!(
        take_flash(&mut next_launch, &mut shown),
        Some("Welcome back".into())
    );
    assert_eq!(shown.0, vec!["Welcome back".to_string()]);
}
