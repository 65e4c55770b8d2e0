use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

/// the WHATWG path percent-encode set plus the characters that would split
/// or escape a single path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\')
    .add(b'%');

pub fn encode(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

pub fn decode(segment: &str) -> Result<String, std::str::Utf8Error> {
    percent_decode_str(segment)
        .decode_utf8()
        .map(|v| v.into_owned())
}

/// encodes each segment and joins them with `/`
pub fn encode_all<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut rtn = String::new();
    let mut first = true;

    for seg in segments {
        if first {
            first = false;
        } else {
            rtn.push('/');
        }

        rtn.push_str(&encode(seg.as_ref()));
    }

    rtn
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn spaces_round_trip() {
        let encoded = encode("my folder");

        assert_eq!(encoded, "my%20folder");
        assert_eq!(decode(&encoded).unwrap(), "my folder");
    }

    #[test]
    fn separators_are_escaped() {
        assert_eq!(encode("a/b"), "a%2Fb");
        assert_eq!(encode("100%"), "100%25");
        assert_eq!(encode("what?"), "what%3F");
    }

    #[test]
    fn joins_segments() {
        let joined = encode_all(["project", "my folder", "my subfolder"]);

        assert_eq!(joined, "project/my%20folder/my%20subfolder");
        assert_eq!(encode_all(Vec::<String>::new()), "");
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        assert!(decode("%FF%FE").is_err());
    }
}
