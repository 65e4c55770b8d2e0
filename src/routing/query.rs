use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct FileQuery {
    /// comma separated list of requested parts
    pub parts: Option<String>,

    #[serde(default)]
    pub depth: Option<u32>,
}

impl FileQuery {
    pub fn wants_meta(&self) -> bool {
        self.parts.as_deref()
            .map(|list| list.split(',').any(|v| v.trim().eq_ignore_ascii_case("meta")))
            .unwrap_or(false)
    }

    pub fn depth(&self) -> u32 {
        self.depth.unwrap_or(0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use axum::extract::Query;
    use axum::http::Uri;

    #[test]
    fn parses_parts_and_depth() {
        let uri: Uri = "/file/project?parts=body,meta&depth=2".parse().unwrap();
        let Query(query) = Query::<FileQuery>::try_from_uri(&uri).unwrap();

        assert!(query.wants_meta());
        assert_eq!(query.depth(), 2);

        let uri: Uri = "/file/project".parse().unwrap();
        let Query(query) = Query::<FileQuery>::try_from_uri(&uri).unwrap();

        assert!(!query.wants_meta());
        assert_eq!(query.depth(), 0);
    }
}
