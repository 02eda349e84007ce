/// Shared utility functions

/// Safely truncate a string at a UTF-8 boundary
pub fn safe_truncate(s: &str, max_bytes: usize) -> &str {
    if max_bytes >= s.len() { return s; }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Reduce a client-supplied filename to something safe to report and store.
///
/// Non-ASCII characters are dropped, path separators split the name like
/// whitespace does, and the remaining words are joined with `_`. Only
/// `[A-Za-z0-9_.-]` survive. Leading and trailing `.`/`_` are stripped so
/// the result can never be `..` or a dotfile.
pub fn sanitize_filename(name: &str) -> String {
    let ascii: String = name
        .chars()
        .filter(|c| c.is_ascii())
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");

    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        "upload.pdf".to_string()
    } else {
        trimmed.to_string()
    }
}
