//! The HTTP account service against a mock server, alone and driven by a full flow.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use otp_signup::notice::{Severity, StatusNotice};
use otp_signup::platform::{Config, HttpAccountService};
use otp_signup::registration::{Field, FlowStage, Outcome, RegistrationFlow};
use otp_signup::service::{AccountService, OtpRequest, OtpVerification, ServiceError};

fn service_for(server: &MockServer) -> HttpAccountService {
    let config = Config { base_url: format!("{}/", server.uri()), timeout: Duration::from_secs(5) };
    HttpAccountService::new(&config).unwrap()
}

async fn mount_reply(server: &MockServer, route: &str, status: u16, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn request_otp_posts_email_and_reads_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/send-otp"))
        .and(body_json(json!({ "email": "a@b.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Code sent" })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = service_for(&server)
        .request_otp(&OtpRequest { email: "a@b.com".into() })
        .await
        .unwrap();
    assert_eq!(reply.message.as_deref(), Some("Code sent"));
}

#[tokio::test]
async fn empty_success_body_is_a_reply_without_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/verify-otp"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let reply = service_for(&server)
        .verify_otp(&OtpVerification { email: "a@b.com".into(), otp: "4242".into() })
        .await
        .unwrap();
    assert!(reply.message.is_none());
}

#[tokio::test]
async fn error_status_is_rejected_with_server_message() {
    let server = MockServer::start().await;
    mount_reply(&server, "/user/verify-otp", 400, json!({ "message": "OTP expired" })).await;

    let error = service_for(&server)
        .verify_otp(&OtpVerification { email: "a@b.com".into(), otp: "0000".into() })
        .await
        .unwrap_err();
    match error {
        ServiceError::Rejected { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message.as_deref(), Some("OTP expired"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn garbage_success_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/send-otp"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let error = service_for(&server)
        .request_otp(&OtpRequest { email: "a@b.com".into() })
        .await
        .unwrap_err();
    assert!(matches!(error, ServiceError::Decode(_)));
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let config = Config { base_url: "http://127.0.0.1:9".into(), timeout: Duration::from_secs(2) };
    let service = HttpAccountService::new(&config).unwrap();

    let error = service.request_otp(&OtpRequest { email: "a@b.com".into() }).await.unwrap_err();
    assert!(matches!(error, ServiceError::Transport(_)));
}

#[tokio::test]
async fn full_signup_against_mock_service() {
    let server = MockServer::start().await;
    mount_reply(&server, "/user/send-otp", 200, json!({ "message": "Code sent" })).await;
    mount_reply(&server, "/user/verify-otp", 200, json!({})).await;
    Mock::given(method("POST"))
        .and(path("/user/register"))
        .and(body_json(json!({
            "fullname": "Jo",
            "mobile": "123",
            "email": "a@b.com",
            "otp": "4242",
            "password": "p1",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "message": "Welcome aboard" })))
        .expect(1)
        .mount(&server)
        .await;

    let (flow, mut notices) = RegistrationFlow::new(service_for(&server));
    flow.update_field(Field::FullName, "Jo").await;
    flow.update_field(Field::Mobile, "123").await;
    flow.update_field(Field::Email, "a@b.com").await;
    assert_eq!(flow.submit().await, Outcome::Advanced(FlowStage::OtpEntry));

    flow.update_field(Field::Otp, "4242").await;
    assert_eq!(flow.submit().await, Outcome::Advanced(FlowStage::PasswordEntry));

    flow.update_field(Field::Password, "p1").await;
    assert_eq!(flow.submit().await, Outcome::Completed);

    let received: Vec<StatusNotice> = std::iter::from_fn(|| notices.try_next()).collect();
    assert_eq!(received, vec![
        StatusNotice::new(Severity::Success, "Code sent"),
        StatusNotice::new(Severity::Success, "OTP verified!"),
        StatusNotice::new(Severity::Success, "Welcome aboard"),
    ]);
}

#[tokio::test]
async fn rejected_registration_collapses_to_generic_notice() {
    let server = MockServer::start().await;
    mount_reply(&server, "/user/send-otp", 200, json!({})).await;
    mount_reply(&server, "/user/verify-otp", 200, json!({})).await;
    mount_reply(&server, "/user/register", 409, json!({ "message": "email already registered" })).await;

    let (flow, mut notices) = RegistrationFlow::new(service_for(&server));
    for (field, value) in [(Field::FullName, "Jo"), (Field::Mobile, "123"), (Field::Email, "a@b.com"), (Field::Otp, "4242"), (Field::Password, "p1")].iter() {
        flow.update_field(*field, *value).await;
    }
    flow.submit_details().await;
    flow.submit_otp().await;
    while notices.try_next().is_some() {}

    assert_eq!(flow.submit_registration().await, Outcome::Failed);
    assert_eq!(flow.stage().await, FlowStage::PasswordEntry);
    assert_eq!(notices.try_next(), Some(StatusNotice::new(Severity::Error, "Registration failed")));
}
