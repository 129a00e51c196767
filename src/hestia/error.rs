use serde::Serialize;
use thiserror::Error;

/// What went wrong below the HTTP layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Timeout,
    Connect,
    Tls,
    Other,
}

/// Errors from the HestiaCP command API
///
/// `Transport` and `Http` mean the control plane could not be reached or did not
/// answer like the command API; `Remote` means it answered and rejected the command.
#[derive(Debug, Clone, Error)]
pub enum HestiaError {
    #[error("HestiaCP unreachable ({kind:?}): {message}")]
    Transport { kind: TransportKind, message: String },

    #[error("HestiaCP returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("{}", remote_message(.code, .message))]
    Remote { code: Option<i32>, message: String },

    #[error("Unexpected HestiaCP reply: {0}")]
    Unexpected(String),
}

fn remote_message(code: &Option<i32>, message: &str) -> String {
    match code {
        Some(code) => format!("HestiaCP error {} ({}): {}", code, return_code_name(*code), message),
        None => format!("HestiaCP error: {}", message),
    }
}

impl HestiaError {
    pub fn remote(code: i32) -> Self {
        HestiaError::Remote {
            code: Some(code),
            message: describe_return_code(code).to_string(),
        }
    }

    /// Numeric return code when the control plane reported one
    pub fn return_code(&self) -> Option<i32> {
        match self {
            HestiaError::Remote { code, .. } => *code,
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, HestiaError::Transport { .. })
    }

    /// True when the command failed because the target object does not exist
    pub fn is_not_found(&self) -> bool {
        self.return_code() == Some(E_NOTEXIST)
    }
}

impl From<reqwest::Error> for HestiaError {
    fn from(err: reqwest::Error) -> Self {
        let kind = transport_kind(&err);
        HestiaError::Transport {
            kind,
            message: err.to_string(),
        }
    }
}

/// Classify a reqwest failure. reqwest has no TLS predicate, so the source chain is inspected.
pub fn transport_kind(err: &reqwest::Error) -> TransportKind {
    if err.is_timeout() {
        return TransportKind::Timeout;
    }

    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        let text = inner.to_string().to_lowercase();
        if text.contains("certificate") || text.contains("tls") || text.contains("handshake") {
            return TransportKind::Tls;
        }
        source = inner.source();
    }

    if err.is_connect() {
        TransportKind::Connect
    } else {
        TransportKind::Other
    }
}

pub const E_ARGS: i32 = 1;
pub const E_INVALID: i32 = 2;
pub const E_NOTEXIST: i32 = 3;
pub const E_EXISTS: i32 = 4;
pub const E_SUSPENDED: i32 = 5;
pub const E_UNSUSPENDED: i32 = 6;
pub const E_INUSE: i32 = 7;
pub const E_LIMIT: i32 = 8;
pub const E_PASSWORD: i32 = 9;
pub const E_FORBIDEN: i32 = 10;
pub const E_DISABLED: i32 = 11;
pub const E_PARSING: i32 = 12;
pub const E_DISK: i32 = 13;
pub const E_LA: i32 = 14;
pub const E_CONNECT: i32 = 15;
pub const E_FTP: i32 = 16;
pub const E_DB: i32 = 17;
pub const E_RRD: i32 = 18;
pub const E_UPDATE: i32 = 19;
pub const E_RESTART: i32 = 20;

/// Symbolic name of a HestiaCP return code
pub fn return_code_name(code: i32) -> &'static str {
    match code {
        0 => "OK",
        E_ARGS => "E_ARGS",
        E_INVALID => "E_INVALID",
        E_NOTEXIST => "E_NOTEXIST",
        E_EXISTS => "E_EXISTS",
        E_SUSPENDED => "E_SUSPENDED",
        E_UNSUSPENDED => "E_UNSUSPENDED",
        E_INUSE => "E_INUSE",
        E_LIMIT => "E_LIMIT",
        E_PASSWORD => "E_PASSWORD",
        E_FORBIDEN => "E_FORBIDEN",
        E_DISABLED => "E_DISABLED",
        E_PARSING => "E_PARSING",
        E_DISK => "E_DISK",
        E_LA => "E_LA",
        E_CONNECT => "E_CONNECT",
        E_FTP => "E_FTP",
        E_DB => "E_DB",
        E_RRD => "E_RRD",
        E_UPDATE => "E_UPDATE",
        E_RESTART => "E_RESTART",
        _ => "E_UNKNOWN",
    }
}

/// Human-readable explanation of a HestiaCP return code
pub fn describe_return_code(code: i32) -> &'static str {
    match code {
        0 => "command completed",
        E_ARGS => "not enough arguments",
        E_INVALID => "invalid argument format",
        E_NOTEXIST => "object does not exist",
        E_EXISTS => "object already exists",
        E_SUSPENDED => "object is suspended",
        E_UNSUSPENDED => "object is not suspended",
        E_INUSE => "object is in use",
        E_LIMIT => "package limit reached",
        E_PASSWORD => "authentication failed",
        E_FORBIDEN => "action forbidden",
        E_DISABLED => "subsystem disabled",
        E_PARSING => "configuration parsing failed",
        E_DISK => "not enough disk space",
        E_LA => "server load too high",
        E_CONNECT => "connection to backend failed",
        E_FTP => "FTP backend failure",
        E_DB => "database backend failure",
        E_RRD => "RRD backend failure",
        E_UPDATE => "update failed",
        E_RESTART => "service restart failed",
        _ => "unknown error",
    }
}
