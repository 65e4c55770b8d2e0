use std::path::{PathBuf, Path, Component};
use std::fs::Metadata;
use std::io::ErrorKind;

pub fn metadata<P>(path: P) -> Result<Option<Metadata>, std::io::Error>
where
    P: AsRef<Path>
{
    match path.as_ref().metadata() {
        Ok(m) => Ok(Some(m)),
        Err(err) => match err.kind() {
            ErrorKind::NotFound => Ok(None),
            _ => Err(err)
        }
    }
}

/// async version of [`metadata`] for use inside request handlers
pub async fn try_metadata<P>(path: P) -> Result<Option<Metadata>, std::io::Error>
where
    P: AsRef<Path>
{
    match tokio::fs::metadata(path).await {
        Ok(m) => Ok(Some(m)),
        Err(err) => match err.kind() {
            ErrorKind::NotFound => Ok(None),
            _ => Err(err)
        }
    }
}

pub fn normalize<P>(path: P) -> PathBuf
where
    P: AsRef<Path>
{
    let components = path.as_ref().components();
    let mut rtn = PathBuf::new();

    for comp in components {
        match comp {
            Component::Prefix(prefix) => {
                rtn.push(prefix.as_os_str());
            }
            Component::ParentDir => {
                rtn.pop();
            }
            Component::Normal(c) => {
                rtn.push(c);
            }
            Component::RootDir => {
                rtn.push(comp.as_os_str());
            }
            Component::CurDir => {}
        }
    }

    rtn
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn normalize_parent_and_current() {
        let result = normalize("/srv/wsfs/./config/../workspace");

        assert_eq!(result, PathBuf::from("/srv/wsfs/workspace"));
    }

    #[test]
    fn missing_metadata_is_none() {
        let tmp = tempfile::tempdir().unwrap();

        assert!(metadata(tmp.path().join("missing")).unwrap().is_none());
        assert!(metadata(tmp.path()).unwrap().is_some());
    }
}
