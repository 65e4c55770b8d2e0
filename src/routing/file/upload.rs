use std::path::Path;

use axum::body::Body;
use axum::http::header::{ETAG, IF_MATCH};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::error::{ApiError, ApiResult};
use crate::error::api::{ApiErrorKind, Context};
use crate::fs::{ResourcePath, etag, meta, ops};
use crate::fs::etag::Condition;
use crate::net;
use crate::path;
use crate::state::ArcShared;

/// replaces the contents of an existing file. the body is written to a tmp
/// file in the same directory and renamed over the original once complete
pub async fn upload_file(
    state: &ArcShared,
    resource: ResourcePath,
    parts: &Parts,
    body: Body,
) -> ApiResult<Response> {
    let files = state.files();
    let full = resource.to_fs_path(files.workspace_dir());

    let fs_meta = path::try_metadata(&full)
        .await?
        .kind(ApiErrorKind::NotFound)?;

    if fs_meta.is_dir() {
        return Err(ApiError::from((
            ApiErrorKind::NotFile,
            "cannot write contents to a directory"
        )));
    }

    if fs_meta.permissions().readonly() {
        return Err(ApiError::from((
            ApiErrorKind::NotPermitted,
            "file is read only"
        )));
    }

    if let Some(cond) = Condition::from_headers(&parts.headers, IF_MATCH)? {
        let current = etag::from_path(&full).await?;

        etag::check_if_match(&cond, Some(&current))?;
    }

    let parent_dir = full.parent()
        .context("failed to retrieve parent directory of file")?;
    let tmp = ops::tmp_path(parent_dir);

    tracing::debug!("tmp path: \"{}\"", tmp.display());

    let tmp_file = create_file(&tmp).await?;
    let guard = ops::TmpGuard::new(tmp);

    let result = match write_body(tmp_file, body).await {
        Ok(hash) => finalize(guard.path(), &full, fs_meta.permissions())
            .await
            .map(|_| hash),
        Err(err) => Err(err),
    };

    let hash = match result {
        Ok(hash) => {
            guard.disarm();

            hash
        }
        Err(err) => {
            guard.remove()
                .await
                .context("failed removing tmp file after failed upload")?;

            return Err(err);
        }
    };

    let tag = etag::to_tag(&hash);
    let fs_meta = path::try_metadata(&full)
        .await?
        .kind(ApiErrorKind::NotFound)?;

    let rtn = meta::build(files, resource, fs_meta, 0, Some(tag.clone())).await?;

    Ok(net::Json::new(rtn)
        .with_header(ETAG, tag)
        .into_response())
}

async fn create_file(path: &Path) -> ApiResult<BufWriter<tokio::fs::File>> {
    let file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .context("failed to open file for writing")?;

    Ok(BufWriter::new(file))
}

/// writes the request body while hashing it. the file is synced before
/// returning
async fn write_body(
    mut writer: BufWriter<tokio::fs::File>,
    body: Body,
) -> ApiResult<blake3::Hash> {
    let mut written: u64 = 0;
    let mut hasher = blake3::Hasher::new();

    let mut stream = body.into_data_stream();

    while let Some(result) = stream.next().await {
        let bytes = result?;
        let slice = bytes.as_ref();

        hasher.update(slice);

        writer.write_all(slice).await?;

        written = written.checked_add(slice.len() as u64)
            .kind(ApiErrorKind::MaxSize)?;
    }

    writer.flush().await?;

    let file = writer.into_inner();
    file.sync_all().await?;

    tracing::debug!("wrote {written} bytes");

    Ok(hasher.finalize())
}

async fn finalize(
    tmp: &Path,
    full: &Path,
    permissions: std::fs::Permissions,
) -> ApiResult<()> {
    tokio::fs::set_permissions(tmp, permissions)
        .await
        .context("failed to copy permissions to tmp file")?;

    tokio::fs::rename(tmp, full)
        .await
        .context("failed to move tmp file to full path")?;

    Ok(())
}
