use std::io::SeekFrom;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::http::header::{ETAG, IF_MATCH, IF_NONE_MATCH};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use tokio::io::AsyncSeekExt;

use crate::error::{ApiError, ApiResult};
use crate::error::api::{ApiErrorKind, Context};
use crate::fs::{ResourcePath, etag, meta, ops};
use crate::fs::etag::Condition;
use crate::net;
use crate::path;
use crate::routing::query::FileQuery;
use crate::state::ArcShared;

pub mod create;
pub mod upload;

pub async fn retrieve(
    state: &ArcShared,
    resource: ResourcePath,
    parts: &Parts,
) -> ApiResult<Response> {
    let Query(query) = Query::<FileQuery>::try_from_uri(&parts.uri)
        .kind(ApiErrorKind::InvalidUri)?;
    let files = state.files();
    let full = resource.to_fs_path(files.workspace_dir());

    let fs_meta = path::try_metadata(&full)
        .await?
        .kind(ApiErrorKind::NotFound)?;

    if fs_meta.is_dir() {
        let depth = query.depth().min(files.max_depth());
        let rtn = meta::build(files, resource, fs_meta, depth, None).await?;

        return Ok(net::Json::new(rtn).into_response());
    }

    let if_none_match = Condition::from_headers(&parts.headers, IF_NONE_MATCH)?;

    if query.wants_meta() {
        let tag = etag::from_path(&full).await?;

        if let Some(cond) = if_none_match {
            if cond.matches(Some(&tag)) {
                return net::fs::not_modified(&tag);
            }
        }

        let rtn = meta::build(files, resource, fs_meta, 0, Some(tag.clone())).await?;

        return Ok(net::Json::new(rtn)
            .with_header(ETAG, tag)
            .into_response());
    }

    // the tag and the streamed bytes come from the same handle. a concurrent
    // upload renames a new file into place and leaves this one untouched
    let mut file = tokio::fs::File::open(&full).await?;
    let len = file.metadata().await?.len();
    let tag = etag::from_reader(&mut file).await?;

    if let Some(cond) = if_none_match {
        if cond.matches(Some(&tag)) {
            return net::fs::not_modified(&tag);
        }
    }

    file.seek(SeekFrom::Start(0)).await?;

    net::fs::stream_file(&full, file, len, &tag)
}

pub async fn delete(
    state: &ArcShared,
    resource: ResourcePath,
    parts: &Parts,
) -> ApiResult<Response> {
    if resource.is_root() {
        return Err(ApiError::from((
            ApiErrorKind::NotPermitted,
            "the workspace directory cannot be deleted"
        )));
    }

    let files = state.files();
    let full = resource.to_fs_path(files.workspace_dir());

    let fs_meta = path::try_metadata(&full)
        .await?
        .kind(ApiErrorKind::NotFound)?;

    if let Some(cond) = Condition::from_headers(&parts.headers, IF_MATCH)? {
        let current = if fs_meta.is_dir() {
            None
        } else {
            Some(etag::from_path(&full).await?)
        };

        etag::check_if_match(&cond, current.as_deref())?;
    }

    ops::remove(&full, fs_meta.is_dir()).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
