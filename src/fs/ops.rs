use std::path::{Path, PathBuf};

use futures::future::{BoxFuture, FutureExt};
use wsfs_lib::fs::{TMP_SUFFIX, is_tmp_name};

/// unique hidden path in `dir` for staging new file contents
pub fn tmp_path(dir: &Path) -> PathBuf {
    dir.join(format!(".{}{}", nanoid::nanoid!(), TMP_SUFFIX))
}

fn parent_of(path: &Path) -> std::io::Result<&Path> {
    path.parent().ok_or_else(|| std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        "path has no parent directory"
    ))
}

/// removes a staged tmp entry when dropped unless disarmed. covers futures
/// that are dropped part way through from a timeout or a client disconnect
#[derive(Debug)]
pub struct TmpGuard {
    path: PathBuf,
    armed: bool,
}

impl TmpGuard {
    pub fn new(path: PathBuf) -> Self {
        TmpGuard { path, armed: true }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// the tmp entry was moved into place and must be kept
    pub fn disarm(mut self) {
        self.armed = false;
    }

    /// removes the tmp entry without blocking the runtime
    pub async fn remove(mut self) -> std::io::Result<()> {
        self.armed = false;

        match tokio::fs::symlink_metadata(&self.path).await {
            Ok(meta) => remove(&self.path, meta.is_dir()).await,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}

impl Drop for TmpGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let result = match std::fs::symlink_metadata(&self.path) {
            Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(&self.path),
            Ok(_) => std::fs::remove_file(&self.path),
            Err(_) => return,
        };

        match result {
            Ok(()) => tracing::debug!("dropped tmp entry \"{}\"", self.path.display()),
            Err(err) => tracing::warn!("failed to drop tmp entry \"{}\": {err}", self.path.display()),
        }
    }
}

/// puts an entry that was moved aside back in its original place when
/// dropped unless disarmed
#[derive(Debug)]
struct AsideGuard<'a> {
    aside: PathBuf,
    original: &'a Path,
    armed: bool,
}

impl AsideGuard<'_> {
    fn into_tmp(mut self) -> TmpGuard {
        self.armed = false;

        TmpGuard::new(std::mem::take(&mut self.aside))
    }
}

impl Drop for AsideGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        if let Err(err) = std::fs::rename(&self.aside, self.original) {
            tracing::error!(
                "failed to restore \"{}\" from \"{}\": {err}",
                self.original.display(),
                self.aside.display()
            );
        }
    }
}

pub async fn remove(path: &Path, is_dir: bool) -> std::io::Result<()> {
    tracing::debug!("removing \"{}\"", path.display());

    if is_dir {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    }
}

/// copies `src` to a hidden tmp entry next to `dst` and then swaps it into
/// place with [`replace`]. a failed copy leaves `dst` untouched
pub async fn copy(src: &Path, dst: &Path) -> std::io::Result<()> {
    let staged = TmpGuard::new(tmp_path(parent_of(dst)?));

    tracing::debug!("copy \"{}\" -> \"{}\"", src.display(), staged.path().display());

    if let Err(err) = copy_recursive(src, staged.path()).await {
        if let Err(rm_err) = staged.remove().await {
            tracing::warn!("failed to remove staged copy: {rm_err}");
        }

        return Err(err);
    }

    replace(staged.path(), dst).await?;
    staged.disarm();

    Ok(())
}

/// recursively copies `src` to `dst`. `dst` must not exist. in-flight tmp
/// files are skipped and symlinks are recreated instead of followed
pub fn copy_recursive<'a>(src: &'a Path, dst: &'a Path) -> BoxFuture<'a, std::io::Result<()>> {
    async move {
        let meta = tokio::fs::symlink_metadata(src).await?;
        let file_type = meta.file_type();

        if file_type.is_symlink() {
            return copy_link(src, dst).await;
        }

        if !file_type.is_dir() {
            tokio::fs::copy(src, dst).await?;

            return Ok(());
        }

        tracing::debug!("copy dir \"{}\" -> \"{}\"", src.display(), dst.display());

        tokio::fs::create_dir(dst).await?;

        let mut read_dir = tokio::fs::read_dir(src).await?;

        while let Some(entry) = read_dir.next_entry().await? {
            let name = entry.file_name();

            if name.to_str().map(is_tmp_name).unwrap_or(false) {
                continue;
            }

            let from = entry.path();
            let to = dst.join(&name);

            copy_recursive(&from, &to).await?;
        }

        Ok(())
    }.boxed()
}

#[cfg(unix)]
async fn copy_link(src: &Path, dst: &Path) -> std::io::Result<()> {
    let target = tokio::fs::read_link(src).await?;

    tracing::debug!("link \"{}\" -> \"{}\"", dst.display(), target.display());

    tokio::fs::symlink(target, dst).await
}

#[cfg(not(unix))]
async fn copy_link(src: &Path, _dst: &Path) -> std::io::Result<()> {
    tracing::debug!("skipping symlink \"{}\"", src.display());

    Ok(())
}

/// moves `src` onto `dst`. an existing `dst` is moved aside first and only
/// removed once `src` is in place, otherwise it is restored
pub async fn replace(src: &Path, dst: &Path) -> std::io::Result<()> {
    let existing = match tokio::fs::symlink_metadata(dst).await {
        Ok(meta) => meta,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return rename(src, dst).await;
        }
        Err(err) => return Err(err),
    };

    let aside = tmp_path(parent_of(dst)?);

    tracing::debug!("moving aside \"{}\" -> \"{}\"", dst.display(), aside.display());

    tokio::fs::rename(dst, &aside).await?;

    let guard = AsideGuard {
        aside,
        original: dst,
        armed: true,
    };

    rename(src, dst).await?;

    let old = guard.into_tmp();

    if let Err(err) = remove(old.path(), existing.is_dir()).await {
        tracing::warn!("failed to remove replaced entry \"{}\": {err}", old.path().display());
    }

    Ok(())
}

pub async fn rename(src: &Path, dst: &Path) -> std::io::Result<()> {
    tracing::debug!("move \"{}\" -> \"{}\"", src.display(), dst.display());

    tokio::fs::rename(src, dst).await
}

#[cfg(test)]
mod test {
    use super::*;

    fn tmp_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap()
            .filter_map(|v| v.ok())
            .filter(|v| is_tmp_name(&v.file_name().to_string_lossy()))
            .count()
    }

    #[tokio::test]
    async fn copies_tree_without_tmp_files() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");

        std::fs::create_dir_all(src.join("inner")).unwrap();
        std::fs::write(src.join("a.txt"), "a").unwrap();
        std::fs::write(src.join("inner").join("b.txt"), "b").unwrap();
        std::fs::write(src.join(".x.tmp.wsfs"), "partial").unwrap();

        copy_recursive(&src, &dst).await.unwrap();

        assert_eq!(std::fs::read_to_string(dst.join("a.txt")).unwrap(), "a");
        assert_eq!(std::fs::read_to_string(dst.join("inner").join("b.txt")).unwrap(), "b");
        assert!(!dst.join(".x.tmp.wsfs").exists());
        assert_eq!(tmp_count(&dst), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn copies_symlink_loops_as_links() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");

        std::fs::create_dir_all(src.join("inner")).unwrap();
        std::fs::write(src.join("inner").join("a.txt"), "a").unwrap();
        std::os::unix::fs::symlink("..", src.join("inner").join("loop")).unwrap();

        copy_recursive(&src, &dst).await.unwrap();

        let link = dst.join("inner").join("loop");
        let meta = std::fs::symlink_metadata(&link).unwrap();

        assert!(meta.file_type().is_symlink());
        assert_eq!(std::fs::read_link(&link).unwrap(), Path::new(".."));
        assert_eq!(std::fs::read_to_string(dst.join("inner").join("a.txt")).unwrap(), "a");
    }

    #[tokio::test]
    async fn copy_replaces_existing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");

        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("new.txt"), "new").unwrap();
        std::fs::create_dir_all(&dst).unwrap();
        std::fs::write(dst.join("old.txt"), "old").unwrap();

        copy(&src, &dst).await.unwrap();

        assert_eq!(std::fs::read_to_string(dst.join("new.txt")).unwrap(), "new");
        assert!(!dst.join("old.txt").exists());
        assert!(src.join("new.txt").exists());
        assert_eq!(tmp_count(tmp.path()), 0);
    }

    #[tokio::test]
    async fn failed_copy_keeps_destination() {
        let tmp = tempfile::tempdir().unwrap();
        let dst = tmp.path().join("dst");

        std::fs::create_dir_all(&dst).unwrap();
        std::fs::write(dst.join("old.txt"), "old").unwrap();

        let err = copy(&tmp.path().join("missing"), &dst).await.unwrap_err();

        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
        assert_eq!(std::fs::read_to_string(dst.join("old.txt")).unwrap(), "old");
        assert_eq!(tmp_count(tmp.path()), 0);
    }

    #[tokio::test]
    async fn replace_swaps_file_for_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src.txt");
        let dst = tmp.path().join("dst");

        std::fs::write(&src, "file").unwrap();
        std::fs::create_dir_all(dst.join("inner")).unwrap();

        replace(&src, &dst).await.unwrap();

        assert_eq!(std::fs::read_to_string(&dst).unwrap(), "file");
        assert!(!src.exists());
        assert_eq!(tmp_count(tmp.path()), 0);
    }

    #[test]
    fn dropped_guard_removes_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp_path(tmp.path());
        let dir = tmp_path(tmp.path());

        std::fs::write(&file, "partial").unwrap();
        std::fs::create_dir_all(dir.join("inner")).unwrap();

        drop(TmpGuard::new(file.clone()));
        drop(TmpGuard::new(dir.clone()));

        assert!(!file.exists());
        assert!(!dir.exists());

        let kept = tmp_path(tmp.path());
        std::fs::write(&kept, "done").unwrap();

        TmpGuard::new(kept.clone()).disarm();

        assert!(kept.exists());
    }

    #[test]
    fn tmp_paths_are_hidden() {
        let path = tmp_path(Path::new("/srv/workspace"));
        let name = path.file_name().unwrap().to_str().unwrap();

        assert!(name.starts_with('.'));
        assert!(is_tmp_name(name));
        assert_ne!(path, tmp_path(Path::new("/srv/workspace")));
    }
}
