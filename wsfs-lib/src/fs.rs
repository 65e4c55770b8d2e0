pub const MAX_NAME_CHARS: usize = 255;
pub const MIN_NAME_CHARS: usize = 1;

/// suffix given to in-flight upload files. entries ending with this are never
/// listed or resolved
pub const TMP_SUFFIX: &str = ".tmp.wsfs";

fn valid_name_char(ch: &char) -> bool {
    (match ch {
        '/' | '\\' => false,
        _ => true
    }) && !ch.is_control()
}

pub fn is_tmp_name(given: &str) -> bool {
    given.ends_with(TMP_SUFFIX)
}

/// checks that a segment can be used as-is for an on disk entry name without
/// escaping its parent directory
pub fn segment_valid(given: &str) -> bool {
    if given.is_empty() || given == "." || given == ".." {
        return false;
    }

    given.chars().all(|ch| valid_name_char(&ch))
}

/// stricter check for names supplied when creating new entries
pub fn name_valid(given: &str) -> bool {
    if !segment_valid(given) || is_tmp_name(given) {
        return false;
    }

    let mut count = 0;

    for ch in given.chars() {
        count += 1;

        if count > MAX_NAME_CHARS {
            return false;
        }
    }

    if count < MIN_NAME_CHARS {
        return false;
    }

    let mut iter = given.chars();

    if let Some(first) = iter.next() {
        if first.is_whitespace() {
            return false;
        }
    }

    if let Some(last) = iter.next_back() {
        if last.is_whitespace() {
            return false;
        }
    }

    true
}
