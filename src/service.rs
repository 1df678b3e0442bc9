//! The remote account service, as seen by the registration flow.
//!
//! Like the inputs of the flow's commands, requests and replies are plain structs.
//! How they travel (HTTP, RPC, an in-memory fake) is the implementor's business.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize)]
/// Ask the service to mail a passcode
pub struct OtpRequest {
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
/// Ask the service whether `otp` is the passcode it sent to `email`
pub struct OtpVerification {
    pub email: String,
    pub otp: String,
}

#[derive(Clone, PartialEq, Serialize)]
/// Create the account. Carries everything collected during the flow.
pub struct Registration {
    /// The service spells it this way
    pub fullname: String,
    pub mobile: String,
    pub email: String,
    pub otp: String,
    pub password: String,
}

impl core::fmt::Debug for Registration {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registration")
            .field("fullname", &self.fullname)
            .field("mobile", &self.mobile)
            .field("email", &self.email)
            .field("otp", &"<redacted>")
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
/// What the service says on success; all three operations reply alike.
pub struct ServiceReply {
    #[serde(default)]
    pub message: Option<String>,
}

impl ServiceReply {
    pub fn with_message(message: impl Into<String>) -> Self {
        Self { message: Some(message.into()) }
    }
}

#[derive(Debug, thiserror::Error)]
/// Anything short of success. The flow treats all variants the same.
pub enum ServiceError {
    #[error("transport error: {0}")]
    /// The request never got a proper answer (connection refused, timeout, ...)
    Transport(String),
    #[error("rejected with status {status}: {}", .message.as_deref().unwrap_or("no message"))]
    /// The service answered, and said no
    Rejected { status: u16, message: Option<String> },
    #[error("could not decode reply: {0}")]
    Decode(String),
}

/// The three operations the registration flow needs from the remote side.
///
/// Implementations must not retry on their own: a failure is reported back to the
/// user, who decides whether to try again.
#[async_trait]
pub trait AccountService: Send + Sync {
    async fn request_otp(&self, request: &OtpRequest) -> Result<ServiceReply, ServiceError>;

    async fn verify_otp(&self, request: &OtpVerification) -> Result<ServiceReply, ServiceError>;

    async fn register(&self, request: &Registration) -> Result<ServiceReply, ServiceError>;
}

#[async_trait]
impl<T: AccountService + ?Sized> AccountService for std::sync::Arc<T> {
    async fn request_otp(&self, request: &OtpRequest) -> Result<ServiceReply, ServiceError> {
        (**self).request_otp(request).await
    }

    async fn verify_otp(&self, request: &OtpVerification) -> Result<ServiceReply, ServiceError> {
        (**self).verify_otp(request).await
    }

    async fn register(&self, request: &Registration) -> Result<ServiceReply, ServiceError> {
        (**self).register(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_serializes_with_service_field_names() {
        let registration = Registration {
            fullname: "Jo".into(),
            mobile: "123".into(),
            email: "a@b.com".into(),
            otp: "4242".into(),
            password: "p1".into(),
        };
        let json = serde_json::to_value(&registration).unwrap();
        assert_eq!(json["fullname"], "Jo");
        assert_eq!(json["password"], "p1");
        assert!(json.get("fullName").is_none());
    }

    #[test]
    fn registration_debug_hides_secrets() {
        let registration = Registration {
            fullname: "Jo".into(),
            mobile: "123".into(),
            email: "a@b.com".into(),
            otp: "4242".into(),
            password: "hunter2".into(),
        };
        let debug = format!("{:?}", registration);
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("4242"));
    }

    #[test]
    fn reply_message_is_optional() {
        let reply: ServiceReply = serde_json::from_str("{}").unwrap();
        assert_eq!(reply, ServiceReply::default());
        let reply: ServiceReply = serde_json::from_str(r#"{"message":"Code sent"}"#).unwrap();
        assert_eq!(reply.message.as_deref(), Some("Code sent"));
    }

    #[test]
    fn rejected_error_mentions_status() {
        let error = ServiceError::Rejected { status: 409, message: Some("already registered".into()) };
        assert_eq!(error.to_string(), "rejected with status 409: already registered");
    }
}
