use std::path::Path;

use axum::http::{HeaderMap, HeaderName};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{ApiError, ApiResult};
use crate::error::api::{ApiErrorKind, Context};

const READ_BUF_SIZE: usize = 64 * 1024;

pub fn to_tag(hash: &blake3::Hash) -> String {
    hash.to_hex().to_string()
}

/// hashes everything left in the reader
pub async fn from_reader<R>(reader: &mut R) -> std::io::Result<String>
where
    R: AsyncRead + Unpin
{
    let mut hasher = blake3::Hasher::new();
    let mut buf = vec![0u8; READ_BUF_SIZE];

    loop {
        let read = reader.read(&mut buf).await?;

        if read == 0 {
            break;
        }

        hasher.update(&buf[..read]);
    }

    Ok(to_tag(&hasher.finalize()))
}

pub async fn from_path<P>(path: P) -> std::io::Result<String>
where
    P: AsRef<Path>
{
    let mut file = tokio::fs::File::open(path).await?;

    from_reader(&mut file).await
}

/// parsed value of an `If-Match` or `If-None-Match` header
#[derive(Debug, PartialEq, Eq)]
pub enum Condition {
    Any,
    Tags(Vec<String>),
}

impl Condition {
    pub fn parse(value: &str) -> Condition {
        let mut tags = Vec::new();

        for part in value.split(',') {
            let trimmed = part.trim();

            if trimmed == "*" {
                return Condition::Any;
            }

            let tag = trimmed.strip_prefix("W/")
                .unwrap_or(trimmed)
                .trim_matches('"');

            if !tag.is_empty() {
                tags.push(tag.to_owned());
            }
        }

        Condition::Tags(tags)
    }

    /// retrieves and parses the given header. every value of a repeated header
    /// is joined into one list
    pub fn from_headers(headers: &HeaderMap, name: HeaderName) -> ApiResult<Option<Condition>> {
        let mut joined: Option<String> = None;

        for value in headers.get_all(&name) {
            let value = value.to_str().kind_context(
                ApiErrorKind::InvalidHeaderValue,
                format!("{name} contains invalid utf8 characters")
            )?;

            match joined.as_mut() {
                Some(list) => {
                    list.push(',');
                    list.push_str(value);
                }
                None => {
                    joined = Some(value.to_owned());
                }
            }
        }

        Ok(joined.map(|v| Condition::parse(&v)))
    }

    /// `current` is the tag of an existing resource. directories have none so
    /// they only match `*`
    pub fn matches(&self, current: Option<&str>) -> bool {
        match self {
            Condition::Any => true,
            Condition::Tags(list) => match current {
                Some(tag) => list.iter().any(|v| v == tag),
                None => false,
            }
        }
    }
}

/// fails with `PreconditionFailed` when the condition does not match
pub fn check_if_match(condition: &Condition, current: Option<&str>) -> ApiResult<()> {
    if condition.matches(current) {
        Ok(())
    } else {
        Err(ApiError::from((
            ApiErrorKind::PreconditionFailed,
            "If-Match does not match the current ETag"
        )))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use axum::http::header::{IF_MATCH, IF_NONE_MATCH};

    #[test]
    fn parse_conditions() {
        assert_eq!(Condition::parse("*"), Condition::Any);
        assert_eq!(Condition::parse(" abc, *"), Condition::Any);
        assert_eq!(
            Condition::parse("\"abc\", W/\"def\" ,ghi"),
            Condition::Tags(vec!["abc".into(), "def".into(), "ghi".into()])
        );
        assert_eq!(Condition::parse(""), Condition::Tags(Vec::new()));
    }

    #[test]
    fn condition_matching() {
        let cond = Condition::parse("\"abc\"");

        assert!(cond.matches(Some("abc")));
        assert!(!cond.matches(Some("abd")));
        assert!(!cond.matches(None));
        assert!(Condition::Any.matches(None));
        assert!(check_if_match(&cond, Some("nope")).is_err());
    }

    #[test]
    fn repeated_headers() {
        let mut headers = HeaderMap::new();
        headers.append(IF_MATCH, "abc".parse().unwrap());
        headers.append(IF_MATCH, "def".parse().unwrap());

        let cond = Condition::from_headers(&headers, IF_MATCH).unwrap().unwrap();

        assert!(cond.matches(Some("def")));
        assert!(Condition::from_headers(&headers, IF_NONE_MATCH).unwrap().is_none());
    }

    #[tokio::test]
    async fn hash_matches_blake3() {
        let mut reader: &[u8] = b"hello world";
        let tag = from_reader(&mut reader).await.unwrap();

        assert_eq!(tag, blake3::hash(b"hello world").to_hex().to_string());
        assert_eq!(tag.len(), 64);
    }
}
