//! What the kiosk shows after each event

use std::fmt;

use attendance::{CheckInResponse, CheckInStatus};

use crate::client::ClientError;
use crate::lifecycle::SessionView;

/// Visual treatment of a message. A repeated check-in is a `Notice`, never
/// an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Notice,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Feedback {
    Message { tone: Tone, text: String },
    /// Offline banner shown or cleared
    Connectivity { online: bool },
    Session(SessionView),
}

impl Feedback {
    pub fn from_reply(reply: &CheckInResponse) -> Self {
        let tone = match reply.status {
            CheckInStatus::Recorded => Tone::Success,
            CheckInStatus::AlreadyRecorded => Tone::Notice,
            CheckInStatus::MemberNotFound
            | CheckInStatus::SessionNotFound
            | CheckInStatus::SessionInactive => Tone::Error,
        };
        let text = match (reply.status, reply.check_in_time) {
            (CheckInStatus::AlreadyRecorded, Some(at)) => {
                format!("{} (since {})", reply.message, at.format("%H:%M"))
            }
            _ => reply.message.clone(),
        };
        Self::Message { tone, text }
    }

    pub fn from_failure(code: &str, err: &ClientError) -> Self {
        let text = match err {
            ClientError::Timeout | ClientError::Network(_) => {
                format!("Could not reach the server for {}. Please scan again.", code)
            }
            ClientError::Server { status: 503, .. } => {
                format!("Attendance is temporarily unavailable. Please scan {} again.", code)
            }
            other => format!("Check-in of {} failed: {}", code, other),
        };
        Self::Message {
            tone: Tone::Error,
            text,
        }
    }

    pub fn dropped(code: &str) -> Self {
        Self::Message {
            tone: Tone::Error,
            text: format!("Offline: check-in of {} was not sent", code),
        }
    }

    pub fn tone(&self) -> Option<Tone> {
        match self {
            Self::Message { tone, .. } => Some(*tone),
            _ => None,
        }
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message { tone, text } => {
                let marker = match tone {
                    Tone::Success => "[ OK ]",
                    Tone::Notice => "[AGAIN]",
                    Tone::Error => "[FAIL]",
                };
                write!(f, "{} {}", marker, text)
            }
            Self::Connectivity { online: false } => {
                write!(f, "=== OFFLINE: check-ins are paused ===")
            }
            Self::Connectivity { online: true } => write!(f, "=== Back online ==="),
            Self::Session(SessionView::Active) => write!(f, "Session is open"),
            Self::Session(SessionView::Ending) => write!(f, "Ending session..."),
            Self::Session(SessionView::Ended) => write!(f, "Session ended"),
        }
    }
}
