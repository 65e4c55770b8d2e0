use std::ffi::OsStr;
use std::collections::HashMap;

use mime::Mime;
use lazy_static::lazy_static;

lazy_static! {
    static ref EXT_MIME_MAP: HashMap<&'static OsStr, Mime> = {
        let mut m = HashMap::new();
        // image mime types
        m.insert(OsStr::new("jpg"), mime::IMAGE_JPEG);
        m.insert(OsStr::new("jpeg"), mime::IMAGE_JPEG);
        m.insert(OsStr::new("png"), mime::IMAGE_PNG);
        m.insert(OsStr::new("gif"), mime::IMAGE_GIF);
        m.insert(OsStr::new("svg"), mime::IMAGE_SVG);
        m.insert(OsStr::new("bmp"), mime::IMAGE_BMP);

        // text mime types
        m.insert(OsStr::new("css"), mime::TEXT_CSS_UTF_8);
        m.insert(OsStr::new("html"), mime::TEXT_HTML_UTF_8);
        m.insert(OsStr::new("htm"), mime::TEXT_HTML_UTF_8);
        m.insert(OsStr::new("txt"), mime::TEXT_PLAIN_UTF_8);
        m.insert(OsStr::new("md"), mime::TEXT_PLAIN_UTF_8);
        m.insert(OsStr::new("csv"), mime::TEXT_CSV_UTF_8);
        m.insert(OsStr::new("xml"), mime::TEXT_XML);

        // application mime types
        m.insert(OsStr::new("js"), mime::APPLICATION_JAVASCRIPT_UTF_8);
        m.insert(OsStr::new("json"), mime::APPLICATION_JSON);
        m.insert(OsStr::new("pdf"), mime::APPLICATION_PDF);
        m
    };
}

pub fn mime_from_ext(ext: Option<&OsStr>) -> Mime {
    ext.and_then(|ext| EXT_MIME_MAP.get(ext))
        .cloned()
        .unwrap_or(mime::APPLICATION_OCTET_STREAM)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn known_and_unknown_extensions() {
        assert_eq!(mime_from_ext(Some(OsStr::new("txt"))), mime::TEXT_PLAIN_UTF_8);
        assert_eq!(mime_from_ext(Some(OsStr::new("bin"))), mime::APPLICATION_OCTET_STREAM);
        assert_eq!(mime_from_ext(None), mime::APPLICATION_OCTET_STREAM);
    }
}
