use serde::{Deserialize, Serialize};
use std::fmt;

/// Base URL of the geocaching.com message center
const MESSAGE_CENTER_URL: &str = "https://www.geocaching.com/account/messagecenter";

/// Classification of a log entry, decoded from the numeric log type code
/// found in the log icon file name (`/images/logtypes/<code>.png`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<i64>", into = "i64")]
pub enum LogKind {
    Found,
    DidNotFind,
    Other,
}

impl LogKind {
    pub const FOUND_CODE: i64 = 2;
    pub const DID_NOT_FIND_CODE: i64 = 3;

    /// Code reported for kinds the page scripts never produce
    const OTHER_CODE: i64 = 0;

    pub fn from_code(code: i64) -> Self {
        match code {
            Self::FOUND_CODE => LogKind::Found,
            Self::DID_NOT_FIND_CODE => LogKind::DidNotFind,
            _ => LogKind::Other,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            LogKind::Found => Self::FOUND_CODE,
            LogKind::DidNotFind => Self::DID_NOT_FIND_CODE,
            LogKind::Other => Self::OTHER_CODE,
        }
    }
}

// `parseInt` on an unexpected icon name yields NaN, which JSON.stringify
// turns into null.
impl From<Option<i64>> for LogKind {
    fn from(code: Option<i64>) -> Self {
        code.map(LogKind::from_code).unwrap_or(LogKind::Other)
    }
}

impl From<LogKind> for i64 {
    fn from(kind: LogKind) -> Self {
        kind.code()
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogKind::Found => write!(f, "Found it"),
            LogKind::DidNotFind => write!(f, "Did not find"),
            LogKind::Other => write!(f, "Other"),
        }
    }
}

/// One logger's entry on a cache listing, plus the outcome of the
/// challenge check for that logger.
///
/// Field names on the wire match the objects produced by the log table
/// script, so a record decodes straight from the page's JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Public geocaching nickname of the log writer
    #[serde(rename = "name")]
    pub display_name: String,

    /// Profile guid; stable key of the record
    #[serde(rename = "nameId")]
    pub identity_id: String,

    #[serde(rename = "logType")]
    pub log_kind: LogKind,

    #[serde(rename = "logLink")]
    pub log_url: String,

    /// `None` until a challenge check completed for this logger
    #[serde(rename = "fulfilsChallenge", default)]
    pub challenge_result: Option<bool>,
}

impl LogRecord {
    pub fn new(
        display_name: impl Into<String>,
        identity_id: impl Into<String>,
        log_kind: LogKind,
        log_url: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            identity_id: identity_id.into(),
            log_kind,
            log_url: log_url.into(),
            challenge_result: None,
        }
    }

    pub fn is_found(&self) -> bool {
        self.log_kind == LogKind::Found
    }

    /// URL opening a message center conversation with the log writer
    pub fn message_user_url(&self) -> String {
        format!("{}?recipientId={}", MESSAGE_CENTER_URL, self.identity_id)
    }

    /// Single-character status marker: `✓` passed, `✗` failed, `?` unknown
    pub fn status_marker(&self) -> &'static str {
        match self.challenge_result {
            Some(true) => "✓",
            Some(false) => "✗",
            None => "?",
        }
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {}", self.display_name)?;
        writeln!(f, "Id: {}", self.identity_id)?;
        writeln!(f, "Type: {}", self.log_kind)?;
        writeln!(f, "Link: {}", self.log_url)
    }
}
