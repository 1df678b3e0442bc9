//! Status notices: the outcome of the most recent action, as an event stream.
//!
//! The controller emits notices and forgets about them. Whoever holds the
//! [`NoticeStream`] decides how (and for how long) to show them.

use log::debug;
use tokio::sync::mpsc;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl core::fmt::Display for Severity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
/// A transient message describing how the last action went
pub struct StatusNotice {
    pub message: String,
    pub severity: Severity,
}

impl StatusNotice {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self { message: message.into(), severity }
    }
}

impl core::fmt::Display for StatusNotice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Sending half, owned by the controller
#[derive(Clone, Debug)]
pub struct NoticeSender {
    inner: mpsc::UnboundedSender<StatusNotice>,
}

impl NoticeSender {
    /// Nobody listening is fine, the notice is simply lost.
    pub fn emit(&self, notice: StatusNotice) {
        if let Err(mpsc::error::SendError(notice)) = self.inner.send(notice) {
            debug!("dropping notice, no consumer: {}", notice);
        }
    }
}

/// Receiving half, handed to the notifier
#[derive(Debug)]
pub struct NoticeStream {
    inner: mpsc::UnboundedReceiver<StatusNotice>,
}

impl NoticeStream {
    /// Waits for the next notice; `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<StatusNotice> {
        self.inner.recv().await
    }

    /// Non-blocking variant, mostly for tests.
    pub fn try_next(&mut self) -> Option<StatusNotice> {
        self.inner.try_recv().ok()
    }
}

pub fn notice_channel() -> (NoticeSender, NoticeStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (NoticeSender { inner: tx }, NoticeStream { inner: rx })
}
