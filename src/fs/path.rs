use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use wsfs_lib::{fs as lib_fs, segment};

use crate::error::{ApiError, ApiResult};
use crate::error::api::{ApiErrorKind, Context};

/// decoded list of segments addressing a resource relative to the workspace
/// directory. an empty list is the workspace directory itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePath {
    segments: Vec<String>,
}

impl ResourcePath {
    pub fn root() -> Self {
        ResourcePath {
            segments: Vec::new()
        }
    }

    /// strips `prefix` from a request uri path and validates the remaining
    /// segments
    pub fn from_uri_path(prefix: &str, path: &str) -> ApiResult<Self> {
        let Some(rest) = path.strip_prefix(prefix) else {
            return Err(ApiError::from(ApiErrorKind::NotFound));
        };

        if !rest.is_empty() && !rest.starts_with('/') {
            return Err(ApiError::from(ApiErrorKind::NotFound));
        }

        let mut segments = Vec::new();

        for part in rest.split('/') {
            if part.is_empty() {
                continue;
            }

            let decoded = segment::decode(part).kind_context(
                ApiErrorKind::InvalidUri,
                "path segment is not valid utf8"
            )?;

            if !lib_fs::segment_valid(&decoded) || lib_fs::is_tmp_name(&decoded) {
                return Err(ApiError::from((
                    ApiErrorKind::InvalidUri,
                    format!("invalid path segment: \"{part}\"")
                )));
            }

            segments.push(decoded);
        }

        Ok(ResourcePath { segments })
    }

    /// parses a `Location` value given in a request body. accepts absolute
    /// urls and absolute paths
    pub fn from_location(prefix: &str, location: &str) -> ApiResult<Self> {
        let trimmed = location.trim();

        if trimmed.starts_with('/') {
            let path = match trimmed.find(|ch| ch == '?' || ch == '#') {
                Some(index) => &trimmed[..index],
                None => trimmed,
            };

            Self::from_uri_path(prefix, path)
        } else {
            let url = url::Url::parse(trimmed).kind_context(
                ApiErrorKind::InvalidData,
                format!("location is not a valid url or path: \"{trimmed}\"")
            )?;

            Self::from_uri_path(prefix, url.path())
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// final segment. the workspace directory has an empty name
    pub fn name(&self) -> &str {
        self.segments.last()
            .map(|v| v.as_str())
            .unwrap_or("")
    }

    pub fn parent(&self) -> Option<ResourcePath> {
        if self.segments.is_empty() {
            None
        } else {
            Some(ResourcePath {
                segments: self.segments[..self.segments.len() - 1].to_vec()
            })
        }
    }

    pub fn join<N>(&self, name: N) -> ResourcePath
    where
        N: Into<String>
    {
        let mut segments = self.segments.clone();
        segments.push(name.into());

        ResourcePath { segments }
    }

    /// true if `self` is `other` or somewhere below it
    pub fn starts_with(&self, other: &ResourcePath) -> bool {
        self.segments.starts_with(&other.segments)
    }

    pub fn to_fs_path<P>(&self, base: P) -> PathBuf
    where
        P: AsRef<Path>
    {
        let mut rtn = base.as_ref().to_owned();

        for seg in &self.segments {
            rtn.push(seg);
        }

        rtn
    }
}

impl Display for ResourcePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}", segment::encode_all(&self.segments))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_prefixed_paths() {
        let path = ResourcePath::from_uri_path("/file", "/file/project/my%20folder/").unwrap();

        assert_eq!(path.segments(), ["project", "my folder"]);
        assert_eq!(path.name(), "my folder");

        let root = ResourcePath::from_uri_path("/file", "/file").unwrap();

        assert!(root.is_root());
        assert_eq!(root.name(), "");
        assert!(ResourcePath::from_uri_path("/file", "/file/").unwrap().is_root());
    }

    #[test]
    fn rejects_outside_prefix() {
        let err = ResourcePath::from_uri_path("/file", "/files/project").unwrap_err();

        assert_eq!(err.get_kind(), &ApiErrorKind::NotFound);

        let err = ResourcePath::from_uri_path("/file", "/other").unwrap_err();

        assert_eq!(err.get_kind(), &ApiErrorKind::NotFound);
    }

    #[test]
    fn rejects_invalid_segments() {
        let invalid = [
            "/file/project/..",
            "/file/./project",
            "/file/project/%2E%2E",
            "/file/project/a%2Fb",
            "/file/project/a%5Cb",
            "/file/project/null%00char",
            "/file/project/.abc.tmp.wsfs",
        ];

        for test in invalid {
            let err = ResourcePath::from_uri_path("/file", test).unwrap_err();

            assert_eq!(err.get_kind(), &ApiErrorKind::InvalidUri, "path: {test}");
        }
    }

    #[test]
    fn parses_locations() {
        let from_path = ResourcePath::from_location("/file", "/file/project/fizz.txt").unwrap();
        let from_url = ResourcePath::from_location(
            "/file",
            "http://localhost:8080/file/project/fizz.txt"
        ).unwrap();
        let with_query = ResourcePath::from_location("/file", "/file/project?depth=1").unwrap();

        assert_eq!(from_path, from_url);
        assert_eq!(with_query.segments(), ["project"]);
        assert!(ResourcePath::from_location("/file", "not a location").is_err());
    }

    #[test]
    fn relations() {
        let dir = ResourcePath::root().join("project").join("my folder");
        let file = dir.join("buzz.txt");

        assert!(file.starts_with(&dir));
        assert!(!dir.starts_with(&file));
        assert_eq!(file.parent(), Some(dir.clone()));
        assert_eq!(ResourcePath::root().parent(), None);
        assert_eq!(file.to_string(), "/project/my%20folder/buzz.txt");
        assert_eq!(
            file.to_fs_path("/srv/workspace"),
            PathBuf::from("/srv/workspace/project/my folder/buzz.txt")
        );
    }
}
