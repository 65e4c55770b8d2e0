use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config;
use crate::error::{self, Context};

#[derive(Debug)]
pub struct Shared {
    files: Files,
    timeout: Duration,
}

pub type ArcShared = Arc<Shared>;

impl Shared {
    pub fn builder() -> SharedBuilder {
        SharedBuilder {
            root: String::from("/file"),
            workspace_root: String::from("/workspace"),
            workspace_dir: None,
            max_depth: 1,
            timeout: Duration::from_secs(90),
        }
    }

    pub fn from_config(config: &config::Config) -> error::Result<Shared> {
        tracing::debug!("creating Shared state");

        let mut builder = Shared::builder();
        builder.with_root(config.settings.file.root.clone())
            .with_workspace_root(config.settings.file.workspace_root.clone())
            .with_workspace_dir(&config.settings.file.workspace_dir)
            .with_max_depth(config.settings.file.max_depth)
            .with_timeout(Duration::from_secs(config.settings.timeout));

        builder.build()
    }

    pub fn files(&self) -> &Files {
        &self.files
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[derive(Debug)]
pub struct SharedBuilder {
    root: String,
    workspace_root: String,
    workspace_dir: Option<PathBuf>,
    max_depth: u32,
    timeout: Duration,
}

impl SharedBuilder {
    pub fn with_root<R>(&mut self, root: R) -> &mut Self
    where
        R: Into<String>
    {
        self.root = root.into();
        self
    }

    pub fn with_workspace_root<R>(&mut self, workspace_root: R) -> &mut Self
    where
        R: Into<String>
    {
        self.workspace_root = workspace_root.into();
        self
    }

    pub fn with_workspace_dir<P>(&mut self, path: P) -> &mut Self
    where
        P: AsRef<Path>
    {
        self.workspace_dir = Some(path.as_ref().to_owned());
        self
    }

    pub fn with_max_depth(&mut self, max_depth: u32) -> &mut Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> error::Result<Shared> {
        let root = config::normalize_url_path(&self.root)
            .context(format!("invalid file root: \"{}\"", self.root))?;
        let workspace_root = config::normalize_url_path(&self.workspace_root)
            .context(format!("invalid workspace root: \"{}\"", self.workspace_root))?;

        let given = self.workspace_dir
            .context("no workspace directory was specified")?;

        // entries are located relative to this path so symlinks in the given
        // path have to be resolved up front
        let workspace_dir = std::fs::canonicalize(&given)
            .context(format!("failed to resolve workspace directory: \"{}\"", given.display()))?;

        if !workspace_dir.is_dir() {
            return Err(error::Error::new().message(format!(
                "workspace directory is not a directory: \"{}\"", workspace_dir.display()
            )));
        }

        tracing::debug!("workspace directory: \"{}\"", workspace_dir.display());

        Ok(Shared {
            files: Files {
                root,
                workspace_root,
                workspace_dir,
                max_depth: self.max_depth,
            },
            timeout: self.timeout,
        })
    }
}

#[derive(Debug)]
pub struct Files {
    root: String,
    workspace_root: String,
    workspace_dir: PathBuf,
    max_depth: u32,
}

impl Files {
    /// url prefix of every file resource
    pub fn root(&self) -> &str {
        &self.root
    }

    /// url exposing the workspace listing
    pub fn workspace_root(&self) -> &str {
        &self.workspace_root
    }

    /// on disk directory backing the namespace
    pub fn workspace_dir(&self) -> &Path {
        &self.workspace_dir
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }
}
