use axum::http::{StatusCode, HeaderName, HeaderValue, Error as HttpError};
use axum::http::response::Builder;
use axum::response::{Response, IntoResponse};
use bytes::{BytesMut, BufMut};
use serde::Serialize;

use crate::error::ApiResult;

pub mod mime;
pub mod layer;

pub mod fs;

pub struct Json<T> {
    builder: Builder,
    root: T
}

impl<T> Json<T> {
    pub fn new(root: T) -> Self {
        Self {
            builder: Builder::new(),
            root
        }
    }

    pub fn with_status<S>(mut self, status: S) -> Self
    where
        StatusCode: TryFrom<S>,
        <StatusCode as TryFrom<S>>::Error: Into<HttpError>
    {
        self.builder = self.builder.status(status);
        self
    }

    pub fn with_header<K, V>(mut self, key: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<HttpError>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<HttpError>,
    {
        self.builder = self.builder.header(key, value);
        self
    }
}

impl<T> Json<T>
where
    T: Serialize
{
    fn create_response(self) -> ApiResult<Response> {
        let buf_froze = {
            let mut buf = BytesMut::with_capacity(128).writer();
            serde_json::to_writer(&mut buf, &self.root)?;

            buf.into_inner().freeze()
        };

        Ok(self.builder.header("content-type", "application/json")
            .header("content-length", buf_froze.len())
            .body(axum::body::Body::from(buf_froze))?
            .into_response())
    }
}

impl<T> IntoResponse for Json<T>
where
    T: Serialize
{
    fn into_response(self) -> Response {
        match self.create_response() {
            Ok(res) => res,
            Err(err) => err.into_response(),
        }
    }
}
