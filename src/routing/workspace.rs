use wsfs_api::workspace::{Project, Workspace};

use crate::error::ApiResult;
use crate::fs::{ResourcePath, location, meta};
use crate::net;
use crate::state::{ArcShared, Files};

pub fn is_workspace_path(files: &Files, path: &str) -> bool {
    let root = files.workspace_root();

    match path.strip_prefix(root) {
        Some(rest) => rest.is_empty() || rest == "/",
        None => false,
    }
}

/// lists the top level directories of the workspace as projects
pub async fn retrieve(state: &ArcShared) -> ApiResult<net::Json<Workspace>> {
    let files = state.files();
    let root = ResourcePath::root();
    let fs_meta = tokio::fs::metadata(files.workspace_dir()).await?;

    // always one level regardless of max_depth
    let listing = meta::build(files, root.clone(), fs_meta, 1, None).await?;

    let children: Vec<_> = listing.children
        .unwrap_or_default()
        .into_iter()
        .filter(|child| child.is_dir())
        .collect();

    let projects = children.iter()
        .map(|child| Project {
            name: child.name.clone(),
            location: child.location.clone(),
        })
        .collect();

    let name = files.workspace_dir()
        .file_name()
        .map(|v| v.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(net::Json::new(Workspace {
        name,
        location: files.workspace_root().to_owned(),
        children_location: location::children_location(files.root(), &root),
        children,
        projects,
    }))
}
