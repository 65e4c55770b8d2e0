use std::fs::Metadata as FsMetadata;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use wsfs_api::fs::{Attributes, Metadata};
use wsfs_lib::fs::is_tmp_name;

use crate::error::{ApiError, ApiResult};
use crate::error::api::{ApiErrorKind, Context};
use crate::path;
use crate::state::Files;

use super::{ResourcePath, etag, location};

/// projects the metadata of a resource. `depth` is clamped to the configured
/// max depth
pub async fn project(files: &Files, resource: &ResourcePath, depth: u32) -> ApiResult<Metadata> {
    let full = resource.to_fs_path(files.workspace_dir());
    let fs_meta = path::try_metadata(&full)
        .await?
        .kind(ApiErrorKind::NotFound)?;

    build(files, resource.clone(), fs_meta, depth.min(files.max_depth()), None).await
}

fn attributes(fs_meta: &FsMetadata) -> Attributes {
    #[cfg(unix)]
    let executable = {
        use std::os::unix::fs::PermissionsExt;

        fs_meta.is_file() && fs_meta.permissions().mode() & 0o111 != 0
    };

    #[cfg(not(unix))]
    let executable = false;

    Attributes {
        read_only: fs_meta.permissions().readonly(),
        executable,
    }
}

fn timestamp(fs_meta: &FsMetadata) -> ApiResult<i64> {
    let modified = fs_meta.modified()
        .context("failed to retrieve modified time of entry")?;

    Ok(DateTime::<Utc>::from(modified).timestamp_millis())
}

/// builds the projection from already retrieved file system metadata. a
/// known `etag` skips hashing the file again
pub fn build<'a>(
    files: &'a Files,
    resource: ResourcePath,
    fs_meta: FsMetadata,
    depth: u32,
    etag: Option<String>,
) -> BoxFuture<'a, ApiResult<Metadata>> {
    async move {
        let root = files.root();
        let full = resource.to_fs_path(files.workspace_dir());
        let is_dir = fs_meta.is_dir();

        let mut rtn = Metadata {
            name: resource.name().to_owned(),
            directory: is_dir,
            location: location::location(root, &resource, is_dir),
            etag: None,
            length: None,
            attributes: attributes(&fs_meta),
            local_time_stamp: timestamp(&fs_meta)?,
            parents: location::parents(root, &resource),
            children_location: None,
            children: None,
        };

        if !is_dir {
            rtn.etag = Some(match etag {
                Some(given) => given,
                None => etag::from_path(&full).await?,
            });
            rtn.length = Some(fs_meta.len());

            return Ok(rtn);
        }

        rtn.children_location = Some(location::children_location(root, &resource));

        if depth == 0 {
            return Ok(rtn);
        }

        let mut children = Vec::new();
        let mut read_dir = tokio::fs::read_dir(&full).await?;

        while let Some(entry) = read_dir.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                tracing::debug!("skipping non utf8 entry in \"{}\"", full.display());
                continue;
            };

            if is_tmp_name(&name) {
                continue;
            }

            // follows symlinks. entries removed since the listing are skipped
            let Some(child_meta) = path::try_metadata(entry.path()).await? else {
                continue;
            };

            match build(files, resource.join(name), child_meta, depth - 1, None).await {
                Ok(child) => children.push(child),
                Err(err) if err.get_kind() == &ApiErrorKind::NotFound => {}
                Err(err) => return Err(err),
            }
        }

        children.sort_by(|a, b| a.name.cmp(&b.name));

        rtn.children = Some(children);

        Ok(rtn)
    }.boxed()
}

/// projection of a directory that must exist
pub async fn project_dir(files: &Files, resource: &ResourcePath, depth: u32) -> ApiResult<Metadata> {
    let meta = project(files, resource, depth).await?;

    if !meta.is_dir() {
        return Err(ApiError::from(ApiErrorKind::NotDirectory));
    }

    Ok(meta)
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::state::Shared;

    fn shared(dir: &std::path::Path, max_depth: u32) -> Shared {
        let mut builder = Shared::builder();
        builder.with_workspace_dir(dir)
            .with_max_depth(max_depth);

        builder.build().unwrap()
    }

    #[tokio::test]
    async fn listing_is_sorted_and_hides_tmp() {
        let tmp = tempfile::tempdir().unwrap();
        let project = tmp.path().join("project");

        std::fs::create_dir(&project).unwrap();
        std::fs::write(project.join("b.txt"), "b").unwrap();
        std::fs::write(project.join("a.txt"), "a").unwrap();
        std::fs::write(project.join(".upload.tmp.wsfs"), "partial").unwrap();
        std::fs::create_dir(project.join("c")).unwrap();
        std::fs::write(project.join("c").join("deep.txt"), "deep").unwrap();

        let state = shared(tmp.path(), 1);
        let resource = ResourcePath::root().join("project");
        let meta = super::project(state.files(), &resource, 5).await.unwrap();
        let children = meta.children.unwrap();
        let names: Vec<&str> = children.iter().map(|v| v.name.as_str()).collect();

        assert_eq!(names, ["a.txt", "b.txt", "c"]);
        assert_eq!(children[0].length, Some(1));
        assert_eq!(children[0].etag.as_deref(), Some(blake3::hash(b"a").to_hex().as_str()));

        // clamped to max depth of 1
        assert!(children[2].children.is_none());
        assert_eq!(children[2].children_location.as_deref(), Some("/file/project/c?depth=1"));
    }

    #[tokio::test]
    async fn file_projection() {
        let tmp = tempfile::tempdir().unwrap();

        std::fs::create_dir(tmp.path().join("project")).unwrap();
        std::fs::write(tmp.path().join("project").join("fizz.txt"), "hello world").unwrap();

        let state = shared(tmp.path(), 1);
        let resource = ResourcePath::root().join("project").join("fizz.txt");
        let meta = project(state.files(), &resource, 1).await.unwrap();

        assert!(!meta.directory);
        assert_eq!(meta.location, "/file/project/fizz.txt");
        assert_eq!(meta.length, Some(11));
        assert!(meta.children.is_none());
        assert!(meta.children_location.is_none());
        assert_eq!(meta.parents.len(), 1);
        assert!(meta.local_time_stamp > 0);

        let err = project_dir(state.files(), &resource, 0).await.unwrap_err();

        assert_eq!(err.get_kind(), &ApiErrorKind::NotDirectory);
    }
}
