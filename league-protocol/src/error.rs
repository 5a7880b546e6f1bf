//! JSON-RPC 2.0 standard error codes plus the domain error envelope carried
//! inside `-32000`'s `data` field.

use serde::{Deserialize, Serialize};

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;
pub const DOMAIN_ERROR: i64 = -32000;

/// Domain-specific error codes carried in [`JsonRpcError::data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainErrorCode {
    /// E001: generic transient failure, retryable.
    #[serde(rename = "E001")]
    Transient,
    /// E009: connection reset, retryable.
    #[serde(rename = "E009")]
    ConnectionReset,
    /// E011: auth_token missing.
    #[serde(rename = "E011")]
    AuthTokenMissing,
    /// E012: auth_token present but invalid.
    #[serde(rename = "E012")]
    AuthTokenInvalid,
    /// E020: registration rejected, capacity reached.
    #[serde(rename = "E020")]
    RegistrationRejected,
    /// E030: invalid game move (e.g. parity outside {even, odd}).
    #[serde(rename = "E030")]
    InvalidMove,
    /// E040: unknown match_id / conversation_id.
    #[serde(rename = "E040")]
    UnknownMatch,
    /// E099: upstream timeout, retryable.
    #[serde(rename = "E099")]
    Timeout,
}

impl DomainErrorCode {
    pub fn retryable(self) -> bool {
        matches!(
            self,
            DomainErrorCode::Transient | DomainErrorCode::ConnectionReset | DomainErrorCode::Timeout
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DomainErrorCode::Transient => "E001",
            DomainErrorCode::ConnectionReset => "E009",
            DomainErrorCode::AuthTokenMissing => "E011",
            DomainErrorCode::AuthTokenInvalid => "E012",
            DomainErrorCode::RegistrationRejected => "E020",
            DomainErrorCode::InvalidMove => "E030",
            DomainErrorCode::UnknownMatch => "E040",
            DomainErrorCode::Timeout => "E099",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainErrorBody {
    pub error_code: String,
    pub error_description: String,
    pub context: Option<serde_json::Value>,
    pub retryable: bool,
}

impl DomainErrorBody {
    pub fn new(code: DomainErrorCode, description: impl Into<String>) -> Self {
        Self {
            error_code: code.as_str().to_string(),
            error_description: description.into(),
            context: None,
            retryable: code.retryable(),
        }
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<DomainErrorBody>,
}

impl JsonRpcError {
    pub fn standard(code: i64, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), data: None }
    }

    pub fn domain(message: impl Into<String>, body: DomainErrorBody) -> Self {
        Self { code: DOMAIN_ERROR, message: message.into(), data: Some(body) }
    }

    pub fn auth_missing() -> Self {
        Self::domain(
            "missing auth_token",
            DomainErrorBody::new(DomainErrorCode::AuthTokenMissing, "request carried no auth_token"),
        )
    }

    pub fn auth_invalid() -> Self {
        Self::domain(
            "invalid auth_token",
            DomainErrorBody::new(DomainErrorCode::AuthTokenInvalid, "auth_token did not match sender's minted token"),
        )
    }
}

/// Process-local error type. Typed so library code can propagate with `?`;
/// converted to a [`JsonRpcError`] only at the HTTP handler boundary.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),
    #[error("unknown method: {0}")]
    UnknownMethod(String),
    #[error("invalid params: {0}")]
    InvalidParams(String),
    #[error("missing auth_token")]
    AuthMissing,
    #[error("invalid auth_token")]
    AuthInvalid,
    #[error("domain error: {0:?}")]
    Domain(DomainErrorBody),
    #[error("internal error: {0}")]
    Internal(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl ProtocolError {
    pub fn into_rpc_error(self) -> JsonRpcError {
        match self {
            ProtocolError::MalformedEnvelope(msg) => JsonRpcError::standard(INVALID_REQUEST, msg),
            ProtocolError::UnknownMethod(method) => {
                JsonRpcError::standard(METHOD_NOT_FOUND, format!("unknown method: {method}"))
            }
            ProtocolError::InvalidParams(msg) => JsonRpcError::standard(INVALID_PARAMS, msg),
            ProtocolError::AuthMissing => JsonRpcError::auth_missing(),
            ProtocolError::AuthInvalid => JsonRpcError::auth_invalid(),
            ProtocolError::Domain(body) => JsonRpcError::domain(body.error_description.clone(), body),
            ProtocolError::Internal(msg) => JsonRpcError::standard(INTERNAL_ERROR, msg),
            ProtocolError::Io(e) => JsonRpcError::standard(INTERNAL_ERROR, e.to_string()),
            ProtocolError::Json(e) => JsonRpcError::standard(PARSE_ERROR, e.to_string()),
            ProtocolError::Http(e) => JsonRpcError::domain(
                e.to_string(),
                DomainErrorBody::new(DomainErrorCode::Transient, e.to_string()),
            ),
        }
    }
}
