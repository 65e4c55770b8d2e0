use http::StatusCode;
use axum_core::response::{Response, IntoResponse};
use serde::{Serialize, Deserialize};
use strum::{AsRefStr as StrumAsRefStr};

use crate::response::{serialize_json, error_json};

#[derive(
    Debug, Clone, PartialEq, Eq,
    StrumAsRefStr,
    Serialize, Deserialize
)]
pub enum ApiErrorKind {
    InternalFailure,
    Timeout,

    NotFound,
    AlreadyExists,
    PreconditionFailed,
    NotPermitted,

    NotFile,
    NotDirectory,
    MaxSize,

    ValidationFailed,
    InvalidData,
    MissingData,

    InvalidUri,
    InvalidHeaderValue,
    InvalidMethod,
    InvalidRequest,
}

impl std::fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self.as_ref(), f)
    }
}

impl From<&ApiErrorKind> for StatusCode {
    fn from(kind: &ApiErrorKind) -> StatusCode {
        match kind {
            ApiErrorKind::InternalFailure => StatusCode::INTERNAL_SERVER_ERROR,
            ApiErrorKind::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiErrorKind::NotFound => StatusCode::NOT_FOUND,
            ApiErrorKind::AlreadyExists => StatusCode::CONFLICT,
            ApiErrorKind::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
            ApiErrorKind::NotPermitted => StatusCode::FORBIDDEN,
            ApiErrorKind::MaxSize => StatusCode::PAYLOAD_TOO_LARGE,
            ApiErrorKind::NotFile |
            ApiErrorKind::NotDirectory |
            ApiErrorKind::ValidationFailed |
            ApiErrorKind::InvalidData |
            ApiErrorKind::MissingData |
            ApiErrorKind::InvalidUri |
            ApiErrorKind::InvalidHeaderValue |
            ApiErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
            ApiErrorKind::InvalidMethod => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Detail {
    Keys(Vec<String>),
}

impl Detail {
    pub fn with_key(key: impl Into<String>) -> Self {
        Detail::Keys(vec![key.into()])
    }
}

impl std::fmt::Display for Detail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Detail::Keys(list) => {
                let mut iter = list.iter();

                if let Some(first) = iter.next() {
                    write!(f, "{}", first)?;

                    while let Some(key) = iter.next() {
                        write!(f, ",{}", key)?;
                    }
                }
            },
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    kind: ApiErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    detail: Option<Detail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    msg: Option<String>,
}

impl ApiError {
    pub fn new() -> Self {
        ApiError {
            kind: ApiErrorKind::InternalFailure,
            detail: None,
            msg: None
        }
    }

    pub fn with_kind<K>(mut self, kind: K) -> Self
    where
        K: Into<ApiErrorKind>
    {
        self.kind = kind.into();
        self
    }

    pub fn with_detail(mut self, detail: Detail) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn with_message<M>(mut self, msg: M) -> Self
    where
        M: Into<String>
    {
        self.msg = Some(msg.into());
        self
    }

    pub fn kind(&self) -> &ApiErrorKind {
        &self.kind
    }

    pub fn detail(&self) -> Option<&Detail> {
        self.detail.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.msg.as_ref().map(|v| v.as_str())
    }
}

impl std::default::Default for ApiError {
    fn default() -> Self {
        ApiError::new()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(detail) = &self.detail {
            write!(f, ": {}", detail)?;
        }

        if let Some(msg) = &self.msg {
            write!(f, ": {}", msg)?;
        }

        Ok(())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from(&self.kind);

        match serialize_json(status, &self) {
            Ok(res) => res,
            Err(err) => {
                tracing::error!("ApiError serialization error {:?}", err);
                error_json()
            }
        }
    }
}

impl From<ApiErrorKind> for ApiError {
    fn from(kind: ApiErrorKind) -> Self {
        ApiError {
            kind,
            detail: None,
            msg: None
        }
    }
}

impl<M> From<(ApiErrorKind, M)> for ApiError
where
    M: Into<String>,
{
    fn from((kind, msg): (ApiErrorKind, M)) -> Self {
        ApiError {
            kind,
            detail: None,
            msg: Some(msg.into())
        }
    }
}

impl From<(ApiErrorKind, Detail)> for ApiError {
    fn from((kind, detail): (ApiErrorKind, Detail)) -> Self {
        ApiError {
            kind,
            detail: Some(detail),
            msg: None
        }
    }
}

impl<M> From<(ApiErrorKind, Detail, M)> for ApiError
where
    M: Into<String>
{
    fn from((kind, detail, msg): (ApiErrorKind, Detail, M)) -> Self {
        ApiError {
            kind,
            detail: Some(detail),
            msg: Some(msg.into())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_mapping() {
        let checks = [
            (ApiErrorKind::NotFound, StatusCode::NOT_FOUND),
            (ApiErrorKind::PreconditionFailed, StatusCode::PRECONDITION_FAILED),
            (ApiErrorKind::AlreadyExists, StatusCode::CONFLICT),
            (ApiErrorKind::InternalFailure, StatusCode::INTERNAL_SERVER_ERROR),
            (ApiErrorKind::NotDirectory, StatusCode::BAD_REQUEST),
        ];

        for (kind, expected) in checks {
            assert_eq!(StatusCode::from(&kind), expected, "kind: {kind}");
        }
    }

    #[test]
    fn serializes_without_empty_fields() {
        let err = ApiError::from(ApiErrorKind::NotFound);
        let json = serde_json::to_string(&err).unwrap();

        assert_eq!(json, r#"{"kind":"NotFound"}"#);

        let err = ApiError::from((
            ApiErrorKind::ValidationFailed,
            Detail::with_key("Name"),
            "invalid name"
        ));
        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["kind"], "ValidationFailed");
        assert_eq!(json["detail"]["Keys"][0], "Name");
        assert_eq!(json["msg"], "invalid name");
    }
}
