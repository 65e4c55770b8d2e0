use std::io::ErrorKind as StdIoErrorKind;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub use wsfs_api::error::{ApiErrorKind, Detail};

use super::BoxDynError;

/// request level error. wraps the client facing error with optional context
/// and source that are only logged
#[derive(Debug)]
pub struct ApiError {
    inner: wsfs_api::ApiError,
    context: Option<String>,
    src: Option<BoxDynError>,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn new() -> Self {
        ApiError {
            inner: Default::default(),
            context: None,
            src: None,
        }
    }

    pub fn api<T>(value: T) -> Self
    where
        T: Into<wsfs_api::ApiError>
    {
        ApiError {
            inner: value.into(),
            context: None,
            src: None
        }
    }

    pub fn kind(mut self, kind: ApiErrorKind) -> Self {
        self.inner = self.inner.with_kind(kind);
        self
    }

    pub fn message<M>(mut self, msg: M) -> Self
    where
        M: Into<String>
    {
        self.inner = self.inner.with_message(msg);
        self
    }

    pub fn context<C>(mut self, ctx: C) -> Self
    where
        C: Into<String>
    {
        self.context = Some(ctx.into());
        self
    }

    pub fn source<S>(mut self, src: S) -> Self
    where
        S: Into<BoxDynError>
    {
        self.src = Some(src.into());
        self
    }

    pub fn get_kind(&self) -> &ApiErrorKind {
        self.inner.kind()
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from(self.inner.kind())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.inner, &self.context, &self.src) {
            (inner, Some(cxt), Some(err)) => if f.alternate() {
                write!(f, "inner: {}\ncxt: {}\nerr: {:#?}", inner, cxt, err)
            } else {
                write!(f, "inner: {}\ncxt: {}\nerr: {:?}", inner, cxt, err)
            },
            (inner, Some(cxt), None) => write!(f, "inner: {}\ncxt: {}", inner, cxt),
            (inner, None, Some(err)) => if f.alternate() {
                write!(f, "inner: {}\nerr: {:#?}", inner, err)
            } else {
                write!(f, "inner: {}\nerr: {:?}", inner, err)
            },
            (inner, None, None) => write!(f, "inner: {}", inner)
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.src.as_ref().map(|v| & **v as _)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status().is_server_error() {
            tracing::error!("unhandled error when processing request: {self:#}");
        } else if self.context.is_some() || self.src.is_some() {
            tracing::debug!("request error: {self}");
        }

        self.inner.into_response()
    }
}

impl From<wsfs_api::ApiError> for ApiError {
    fn from(api_err: wsfs_api::ApiError) -> Self {
        ApiError {
            inner: api_err,
            context: None,
            src: None,
        }
    }
}

impl From<ApiErrorKind> for ApiError {
    fn from(kind: ApiErrorKind) -> Self {
        ApiError::api(kind)
    }
}

impl From<(ApiErrorKind, Detail)> for ApiError {
    fn from(pair: (ApiErrorKind, Detail)) -> Self {
        ApiError::api(pair)
    }
}

impl<M> From<(ApiErrorKind, Detail, M)> for ApiError
where
    M: Into<String>
{
    fn from(triple: (ApiErrorKind, Detail, M)) -> Self {
        ApiError::api(triple)
    }
}

impl From<(ApiErrorKind, &str)> for ApiError {
    fn from((kind, msg): (ApiErrorKind, &str)) -> Self {
        ApiError::api((kind, msg))
    }
}

impl From<(ApiErrorKind, String)> for ApiError {
    fn from((kind, msg): (ApiErrorKind, String)) -> Self {
        ApiError::api((kind, msg))
    }
}

impl From<std::convert::Infallible> for ApiError {
    fn from(_infallible: std::convert::Infallible) -> Self {
        // this should not happen
        ApiError::new()
            .source("Infallible. how did this happen")
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            StdIoErrorKind::NotFound => ApiError::from(ApiErrorKind::NotFound)
                .source(err),
            StdIoErrorKind::AlreadyExists => ApiError::from(ApiErrorKind::AlreadyExists)
                .source(err),
            _ => ApiError::new()
                .source(err)
        }
    }
}

macro_rules! simple_from {
    ($e:path) => {
        impl From<$e> for ApiError {
            fn from(err: $e) -> Self {
                ApiError::new()
                    .source(err)
            }
        }
    };
    ($e:path, $k:expr) => {
        impl From<$e> for ApiError {
            fn from(err: $e) -> Self {
                ApiError::new()
                    .kind($k)
                    .source(err)
            }
        }
    };
}

simple_from!(std::fmt::Error);

simple_from!(axum::Error);
simple_from!(axum::http::Error);
simple_from!(
    axum::http::header::ToStrError,
    ApiErrorKind::InvalidHeaderValue
);
simple_from!(axum::http::header::InvalidHeaderValue);

simple_from!(serde_json::Error);

// ----------------------------------------------------------------------------

pub trait Context<T, E> {
    fn context<C>(self, cxt: C) -> ApiResult<T>
    where
        C: Into<String>;

    fn kind(self, kind: ApiErrorKind) -> ApiResult<T>;

    fn kind_context<C>(self, kind: ApiErrorKind, cxt: C) -> ApiResult<T>
    where
        C: Into<String>;
}

impl<T, E> Context<T, E> for std::result::Result<T, E>
where
    E: Into<BoxDynError>
{
    fn context<C>(self, cxt: C) -> ApiResult<T>
    where
        C: Into<String>
    {
        match self {
            Ok(v) => Ok(v),
            Err(err) => Err(ApiError::new()
                .context(cxt)
                .source(err))
        }
    }

    fn kind(self, kind: ApiErrorKind) -> ApiResult<T> {
        match self {
            Ok(v) => Ok(v),
            Err(err) => Err(ApiError::from(kind)
                .source(err))
        }
    }

    fn kind_context<C>(self, kind: ApiErrorKind, cxt: C) -> ApiResult<T>
    where
        C: Into<String>
    {
        match self {
            Ok(v) => Ok(v),
            Err(err) => Err(ApiError::from(kind)
                .context(cxt)
                .source(err))
        }
    }
}

impl<T> Context<T, ()> for std::option::Option<T> {
    fn context<C>(self, cxt: C) -> ApiResult<T>
    where
        C: Into<String>
    {
        match self {
            Some(v) => Ok(v),
            None => Err(ApiError::new()
                .context(cxt))
        }
    }

    fn kind(self, kind: ApiErrorKind) -> ApiResult<T> {
        match self {
            Some(v) => Ok(v),
            None => Err(ApiError::from(kind))
        }
    }

    fn kind_context<C>(self, kind: ApiErrorKind, cxt: C) -> ApiResult<T>
    where
        C: Into<String>
    {
        match self {
            Some(v) => Ok(v),
            None => Err(ApiError::from(kind)
                .context(cxt))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn io_not_found_maps_to_not_found() {
        let err = ApiError::from(std::io::Error::from(StdIoErrorKind::NotFound));

        assert_eq!(err.get_kind(), &ApiErrorKind::NotFound);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = ApiError::from(std::io::Error::from(StdIoErrorKind::PermissionDenied));

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn option_kind() {
        let missing: Option<u8> = None;
        let err = missing.kind(ApiErrorKind::NotDirectory).unwrap_err();

        assert_eq!(err.get_kind(), &ApiErrorKind::NotDirectory);
    }
}
