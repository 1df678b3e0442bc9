//! The registration flow controller.
//!
//! Registration happens in three stages, each gated by a successful call to the account
//! service:
//!
//! ```text
//! Details --request_otp--> OtpEntry --verify_otp--> PasswordEntry --register--> Completed
//! ```
//!
//! A stage that fails stays where it is, and can be submitted again. Nothing ever moves
//! backwards, and no stage can be skipped.
//!
//! What differs between stages (which fields are required, which call is made, what to tell
//! the user) is data, kept in one table of stage specs. The submit logic is written once.

use core::str::FromStr;
use core::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use tokio::sync::Mutex;

use crate::notice::{notice_channel, NoticeSender, NoticeStream, Severity, StatusNotice};
use crate::service::{AccountService, OtpRequest, OtpVerification, Registration, ServiceError, ServiceReply};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
/// The user-editable fields of a [`RegistrationDraft`]
#[allow(missing_docs)]
pub enum Field {
    FullName,
    Mobile,
    Email,
    Otp,
    Password,
}

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("unknown registration field: {0}")]
pub struct UnknownField(pub String);

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "fullName" | "fullname" | "full-name" => Ok(Field::FullName),
            "mobile" => Ok(Field::Mobile),
            "email" => Ok(Field::Email),
            "otp" => Ok(Field::Otp),
            "password" => Ok(Field::Password),
            other => Err(UnknownField(other.into())),
        }
    }
}

#[derive(Clone, Default, Eq, PartialEq)]
/// The values collected so far, not yet committed anywhere
pub struct RegistrationDraft {
    pub full_name: String,
    pub mobile: String,
    pub email: String,
    pub otp: String,
    pub password: String,
}

impl RegistrationDraft {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::FullName => &self.full_name,
            Field::Mobile => &self.mobile,
            Field::Email => &self.email,
            Field::Otp => &self.otp,
            Field::Password => &self.password,
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::FullName => &mut self.full_name,
            Field::Mobile => &mut self.mobile,
            Field::Email => &mut self.email,
            Field::Otp => &mut self.otp,
            Field::Password => &mut self.password,
        };
        *slot = value;
    }

    /// Only emptiness is checked here. Format and strength are the service's call.
    pub fn is_filled(&self, field: Field) -> bool {
        !self.get(field).is_empty()
    }

    fn registration(&self) -> Registration {
        Registration {
            fullname: self.full_name.clone(),
            mobile: self.mobile.clone(),
            email: self.email.clone(),
            otp: self.otp.clone(),
            password: self.password.clone(),
        }
    }
}

impl core::fmt::Debug for RegistrationDraft {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegistrationDraft")
            .field("full_name", &self.full_name)
            .field("mobile", &self.mobile)
            .field("email", &self.email)
            .field("otp", &if self.otp.is_empty() { "" } else { "<redacted>" })
            .field("password", &if self.password.is_empty() { "" } else { "<redacted>" })
            .finish()
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
/// Where the flow currently is. Ordered: stages only ever increase.
pub enum FlowStage {
    Details,
    OtpEntry,
    PasswordEntry,
    /// Terminal. The account exists; the caller should leave the flow.
    Completed,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
/// What a submit did
pub enum Outcome {
    /// The call succeeded and the flow moved on to this stage
    Advanced(FlowStage),
    /// Registration succeeded, the flow is over
    Completed,
    /// A required field was empty; nothing was sent
    Incomplete,
    /// The service call failed; the stage can be submitted again
    Failed,
    /// Another call is still outstanding; nothing was sent
    Busy,
    /// The flow is not in the stage this submit belongs to; nothing was sent
    WrongStage(FlowStage),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum RemoteCall {
    RequestOtp,
    VerifyOtp,
    Register,
}

impl RemoteCall {
    async fn issue<S>(self, service: &S, draft: &RegistrationDraft) -> Result<ServiceReply, ServiceError>
    where
        S: AccountService + ?Sized,
    {
        match self {
            RemoteCall::RequestOtp => {
                let request = OtpRequest { email: draft.email.clone() };
                service.request_otp(&request).await
            }
            RemoteCall::VerifyOtp => {
                let request = OtpVerification { email: draft.email.clone(), otp: draft.otp.clone() };
                service.verify_otp(&request).await
            }
            RemoteCall::Register => service.register(&draft.registration()).await,
        }
    }
}

/// Everything that makes one stage different from another
struct StageSpec {
    stage: FlowStage,
    required: &'static [Field],
    missing: &'static str,
    call: RemoteCall,
    succeeded: &'static str,
    failed: &'static str,
    next: FlowStage,
}

static STAGES: [StageSpec; 3] = [
    StageSpec {
        stage: FlowStage::Details,
        required: &[Field::Email, Field::FullName, Field::Mobile],
        missing: "Fill all fields",
        call: RemoteCall::RequestOtp,
        succeeded: "OTP sent!",
        failed: "Failed to send OTP",
        next: FlowStage::OtpEntry,
    },
    StageSpec {
        stage: FlowStage::OtpEntry,
        required: &[Field::Otp],
        missing: "Enter OTP",
        call: RemoteCall::VerifyOtp,
        succeeded: "OTP verified!",
        failed: "Invalid OTP",
        next: FlowStage::PasswordEntry,
    },
    StageSpec {
        stage: FlowStage::PasswordEntry,
        required: &[Field::Password],
        missing: "Enter password",
        call: RemoteCall::Register,
        succeeded: "Registered!",
        failed: "Registration failed",
        next: FlowStage::Completed,
    },
];

fn spec_for(stage: FlowStage) -> Option<&'static StageSpec> {
    STAGES.iter().find(|spec| spec.stage == stage)
}

/// Holds the busy flag; clears it when dropped, whichever way the call ended.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct FlowState {
    draft: RegistrationDraft,
    stage: FlowStage,
}

/// One registration attempt, from empty draft to created account.
///
/// All operations take `&self`, so a UI can keep submitting while a call is in flight;
/// such submits are turned away with [`Outcome::Busy`] rather than issuing a second call.
pub struct RegistrationFlow<S>
where
    S: AccountService,
{
    service: S,
    state: Mutex<FlowState>,
    busy: AtomicBool,
    notices: NoticeSender,
}

impl<S: AccountService> RegistrationFlow<S> {
    /// Starts a fresh flow in [`FlowStage::Details`], and returns the stream its notices go to.
    pub fn new(service: S) -> (Self, NoticeStream) {
        let (notices, stream) = notice_channel();
        (Self::with_notices(service, notices), stream)
    }

    /// Like [`new`](Self::new), for when several flows should report to one notifier.
    pub fn with_notices(service: S, notices: NoticeSender) -> Self {
        Self {
            service,
            state: Mutex::new(FlowState { draft: RegistrationDraft::default(), stage: FlowStage::Details }),
            busy: AtomicBool::new(false),
            notices,
        }
    }

    /// Overwrites one field of the draft. Allowed in any stage, even while busy.
    pub async fn update_field(&self, field: Field, value: impl Into<String>) {
        let mut state = self.state.lock().await;
        state.draft.set(field, value.into());
    }

    pub async fn stage(&self) -> FlowStage {
        self.state.lock().await.stage
    }

    pub async fn draft(&self) -> RegistrationDraft {
        self.state.lock().await.draft.clone()
    }

    /// True exactly while a service call is outstanding.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub async fn is_complete(&self) -> bool {
        self.stage().await == FlowStage::Completed
    }

    /// Sends the identity details and asks for a passcode to be mailed.
    pub async fn submit_details(&self) -> Outcome {
        self.submit_stage(FlowStage::Details).await
    }

    /// Has the service check the passcode.
    pub async fn submit_otp(&self) -> Outcome {
        self.submit_stage(FlowStage::OtpEntry).await
    }

    /// Creates the account.
    pub async fn submit_registration(&self) -> Outcome {
        self.submit_stage(FlowStage::PasswordEntry).await
    }

    /// Submits whatever stage the flow is currently in.
    pub async fn submit(&self) -> Outcome {
        let stage = self.stage().await;
        self.submit_stage(stage).await
    }

    async fn submit_stage(&self, expected: FlowStage) -> Outcome {
        let (spec, draft, _busy) = {
            let state = self.state.lock().await;
            if self.is_busy() {
                debug!("submit for {:?} while a call is outstanding", expected);
                return Outcome::Busy;
            }
            let spec = match spec_for(state.stage) {
                Some(spec) if state.stage == expected => spec,
                _ => {
                    debug!("submit for {:?} in stage {:?}", expected, state.stage);
                    return Outcome::WrongStage(state.stage);
                }
            };
            if let Some(field) = spec.required.iter().find(|field| !state.draft.is_filled(**field)) {
                debug!("{:?} incomplete, {:?} is empty", expected, field);
                self.notify(Severity::Warning, spec.missing);
                return Outcome::Incomplete;
            }
            let busy = match BusyGuard::acquire(&self.busy) {
                Some(busy) => busy,
                None => return Outcome::Busy,
            };
            (spec, state.draft.clone(), busy)
        };

        debug!("{:?}: issuing {:?} for {:?}", expected, spec.call, draft);
        match spec.call.issue(&self.service, &draft).await {
            Ok(reply) => {
                self.state.lock().await.stage = spec.next;
                info!("registration stage {:?} -> {:?}", expected, spec.next);

                let message = reply
                    .message
                    .filter(|message| !message.is_empty())
                    .unwrap_or_else(|| spec.succeeded.into());
                self.notify(Severity::Success, message);

                match spec.next {
                    FlowStage::Completed => Outcome::Completed,
                    next => Outcome::Advanced(next),
                }
            }
            Err(error) => {
                warn!("{:?} failed: {}", spec.call, error);
                self.notify(Severity::Error, spec.failed);
                Outcome::Failed
            }
        }
    }

    fn notify(&self, severity: Severity, message: impl Into<String>) {
        self.notices.emit(StatusNotice::new(severity, message));
    }
}
