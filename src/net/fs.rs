use std::path::Path;

use tokio::fs::File;
use tokio_util::io::ReaderStream;
use axum::http::{StatusCode, header};
use axum::body::Body;
use axum::response::Response;

use crate::net;
use crate::error::ApiResult;

/// streams an already opened file back to the client. the handle is expected
/// to be positioned at the start of the content
pub fn stream_file<P>(path: P, file: File, len: u64, etag: &str) -> ApiResult<Response<Body>>
where
    P: AsRef<Path>,
{
    let mime = net::mime::mime_from_ext(path.as_ref().extension());
    let stream = ReaderStream::new(file);

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime.to_string())
        .header(header::CONTENT_LENGTH, len)
        .header(header::ETAG, etag)
        .body(Body::from_stream(stream))?)
}

/// empty 304 response carrying the current tag
pub fn not_modified(etag: &str) -> ApiResult<Response<Body>> {
    Ok(Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header(header::ETAG, etag)
        .body(Body::empty())?)
}
