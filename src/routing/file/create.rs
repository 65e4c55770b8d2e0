use axum::body::Body;
use axum::http::{HeaderMap, StatusCode};
use axum::http::header::{ETAG, LOCATION};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use wsfs_api::fs::{CreateItem, Metadata};
use wsfs_lib::{fs as lib_fs, segment};

use crate::error::{ApiError, ApiResult};
use crate::error::api::{ApiErrorKind, Context, Detail};
use crate::fs::{ResourcePath, meta, ops};
use crate::net;
use crate::path;
use crate::state::{ArcShared, Files};

const MAX_ITEM_BYTES: usize = 64 * 1024;

pub const X_CREATE_OPTIONS: &str = "x-create-options";
pub const SLUG: &str = "slug";

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CreateOptions {
    pub copy: bool,
    pub move_: bool,
    pub no_overwrite: bool,
}

impl CreateOptions {
    pub fn parse(value: &str) -> ApiResult<Self> {
        let mut rtn = CreateOptions::default();

        for token in value.split(',') {
            let token = token.trim();

            if token.is_empty() {
                continue;
            }

            if token.eq_ignore_ascii_case("copy") {
                rtn.copy = true;
            } else if token.eq_ignore_ascii_case("move") {
                rtn.move_ = true;
            } else if token.eq_ignore_ascii_case("no-overwrite") {
                rtn.no_overwrite = true;
            } else {
                return Err(ApiError::from((
                    ApiErrorKind::InvalidHeaderValue,
                    Detail::with_key("X-Create-Options"),
                    format!("unknown create option: \"{token}\"")
                )));
            }
        }

        if rtn.copy && rtn.move_ {
            return Err(ApiError::from((
                ApiErrorKind::InvalidRequest,
                "copy and move cannot be requested together"
            )));
        }

        Ok(rtn)
    }

    pub fn from_headers(headers: &HeaderMap) -> ApiResult<Self> {
        let mut rtn = CreateOptions::default();

        for value in headers.get_all(X_CREATE_OPTIONS) {
            let value = value.to_str().kind_context(
                ApiErrorKind::InvalidHeaderValue,
                "x-create-options contains invalid utf8 characters"
            )?;
            let parsed = Self::parse(value)?;

            rtn.copy |= parsed.copy;
            rtn.move_ |= parsed.move_;
            rtn.no_overwrite |= parsed.no_overwrite;
        }

        if rtn.copy && rtn.move_ {
            return Err(ApiError::from((
                ApiErrorKind::InvalidRequest,
                "copy and move cannot be requested together"
            )));
        }

        Ok(rtn)
    }
}

fn get_slug(headers: &HeaderMap) -> ApiResult<Option<String>> {
    let Some(value) = headers.get(SLUG) else {
        return Ok(None);
    };

    let value = value.to_str().kind_context(
        ApiErrorKind::InvalidHeaderValue,
        "slug contains invalid utf8 characters"
    )?;

    let decoded = segment::decode(value.trim()).kind_context(
        ApiErrorKind::InvalidHeaderValue,
        "slug is not valid percent encoded utf8"
    )?;

    if decoded.is_empty() {
        Ok(None)
    } else {
        Ok(Some(decoded))
    }
}

fn check_name(name: String) -> ApiResult<String> {
    if !lib_fs::name_valid(&name) {
        return Err(ApiError::from((
            ApiErrorKind::ValidationFailed,
            Detail::with_key("Name"),
            format!("invalid name: \"{name}\"")
        )));
    }

    Ok(name)
}

async fn read_item(body: Body) -> ApiResult<CreateItem> {
    let bytes = axum::body::to_bytes(body, MAX_ITEM_BYTES)
        .await
        .kind_context(ApiErrorKind::InvalidData, "failed to read request body")?;

    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(CreateItem::default());
    }

    serde_json::from_slice(&bytes)
        .kind_context(ApiErrorKind::InvalidData, "request body is not a valid create item")
}

fn created(meta: Metadata) -> ApiResult<Response> {
    let location = meta.location.clone();
    let etag = meta.etag.clone();
    let mut json = net::Json::new(meta)
        .with_status(StatusCode::CREATED)
        .with_header(LOCATION, location);

    if let Some(tag) = etag {
        json = json.with_header(ETAG, tag);
    }

    Ok(json.into_response())
}

/// creates, copies or moves an entry into the target directory
pub async fn create_item(
    state: &ArcShared,
    resource: ResourcePath,
    parts: &Parts,
    body: Body,
) -> ApiResult<Response> {
    let options = CreateOptions::from_headers(&parts.headers)?;
    let slug = get_slug(&parts.headers)?;
    let files = state.files();

    meta::project_dir(files, &resource, 0).await?;

    let item = read_item(body).await?;

    if options.copy || options.move_ {
        transfer(files, resource, &options, slug, item).await
    } else {
        create_entry(files, resource, &options, slug, item).await
    }
}

async fn create_entry(
    files: &Files,
    resource: ResourcePath,
    options: &CreateOptions,
    slug: Option<String>,
    item: CreateItem,
) -> ApiResult<Response> {
    let Some(name) = slug.or(item.name) else {
        return Err(ApiError::from((
            ApiErrorKind::MissingData,
            Detail::with_key("Name"),
            "a name must be given with the Slug header or the Name field"
        )));
    };

    let target = resource.join(check_name(name)?);
    let full = target.to_fs_path(files.workspace_dir());

    tracing::debug!("create path: \"{}\" directory: {}", full.display(), item.directory);

    match path::try_metadata(&full).await? {
        Some(existing) => {
            if options.no_overwrite {
                return Err(ApiError::from((
                    ApiErrorKind::AlreadyExists,
                    "an entry with the given name already exists"
                )));
            }

            if existing.is_dir() != item.directory {
                return Err(ApiError::from((
                    ApiErrorKind::AlreadyExists,
                    "an entry of a different type already exists with the given name"
                )));
            }

            if !item.directory {
                tokio::fs::OpenOptions::new()
                    .write(true)
                    .truncate(true)
                    .open(&full)
                    .await
                    .context("failed to truncate existing file")?;
            }
        }
        None => if item.directory {
            tokio::fs::create_dir(&full).await?;
        } else {
            tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&full)
                .await?;
        }
    }

    created(meta::project(files, &target, 0).await?)
}

async fn transfer(
    files: &Files,
    resource: ResourcePath,
    options: &CreateOptions,
    slug: Option<String>,
    item: CreateItem,
) -> ApiResult<Response> {
    let Some(location) = item.location else {
        return Err(ApiError::from((
            ApiErrorKind::MissingData,
            Detail::with_key("Location"),
            "copy and move require the Location of the source"
        )));
    };

    let source = ResourcePath::from_location(files.root(), &location)?;

    if source.is_root() {
        return Err(ApiError::from((
            ApiErrorKind::NotPermitted,
            "the workspace directory cannot be copied or moved"
        )));
    }

    let src_full = source.to_fs_path(files.workspace_dir());
    let src_meta = path::try_metadata(&src_full)
        .await?
        .kind_context(ApiErrorKind::NotFound, "source location was not found")?;

    let name = match slug.or(item.name) {
        Some(given) => given,
        None => source.name().to_owned(),
    };
    let target = resource.join(check_name(name)?);

    if target == source {
        if options.move_ {
            return created(meta::project(files, &target, 0).await?);
        }

        return Err(ApiError::from((
            ApiErrorKind::InvalidRequest,
            "cannot copy an entry onto itself"
        )));
    }

    if src_meta.is_dir() && target.starts_with(&source) {
        return Err(ApiError::from((
            ApiErrorKind::InvalidRequest,
            "cannot place a directory inside of itself"
        )));
    }

    let dst_full = target.to_fs_path(files.workspace_dir());

    if path::try_metadata(&dst_full).await?.is_some() {
        if options.no_overwrite {
            return Err(ApiError::from((
                ApiErrorKind::AlreadyExists,
                "an entry with the given name already exists"
            )));
        }

        // the destination could be an ancestor of the source
        if source.starts_with(&target) {
            return Err(ApiError::from((
                ApiErrorKind::InvalidRequest,
                "cannot replace a directory containing the source"
            )));
        }
    }

    // io errors from here on are internal failures, not missing locations
    if options.move_ {
        ops::replace(&src_full, &dst_full)
            .await
            .context("failed to move entry to destination")?;
    } else {
        ops::copy(&src_full, &dst_full)
            .await
            .context("failed to copy entry to destination")?;
    }

    created(meta::project(files, &target, 0).await?)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn create_options() {
        let opts = CreateOptions::parse("Copy, no-overwrite").unwrap();

        assert!(opts.copy);
        assert!(!opts.move_);
        assert!(opts.no_overwrite);

        assert_eq!(CreateOptions::parse("").unwrap(), CreateOptions::default());

        let err = CreateOptions::parse("copy,move").unwrap_err();

        assert_eq!(err.get_kind(), &ApiErrorKind::InvalidRequest);

        let err = CreateOptions::parse("shred").unwrap_err();

        assert_eq!(err.get_kind(), &ApiErrorKind::InvalidHeaderValue);
    }

    #[test]
    fn repeated_option_headers() {
        let mut headers = HeaderMap::new();
        headers.append(X_CREATE_OPTIONS, "copy".parse().unwrap());
        headers.append(X_CREATE_OPTIONS, "move".parse().unwrap());

        let err = CreateOptions::from_headers(&headers).unwrap_err();

        assert_eq!(err.get_kind(), &ApiErrorKind::InvalidRequest);
    }

    #[test]
    fn slug_decoding() {
        let mut headers = HeaderMap::new();

        assert_eq!(get_slug(&headers).unwrap(), None);

        headers.insert(SLUG, "new%20file.txt".parse().unwrap());

        assert_eq!(get_slug(&headers).unwrap().as_deref(), Some("new file.txt"));
    }
}
