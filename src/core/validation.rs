use unicode_normalization::UnicodeNormalization;

pub const ALLOWED_EXTENSIONS: &[&str] = &["txt"];

const FALLBACK_FILENAME: &str = "upload.txt";

pub fn is_blank(input: &str) -> bool {
    input.trim().is_empty()
}

/// True when the text after the last `.` is an allowed extension, compared
/// case-insensitively.
pub fn has_allowed_extension(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// Reduces a client-supplied filename to something safe to echo back or log.
/// The result is never used as a filesystem path.
pub fn secure_filename(name: &str) -> String {
    // Decompose so accented letters fold to their ASCII base, then drop the rest.
    let spaced: String = name
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    let kept: String = joined
        .chars()
        .filter(|&c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
        .collect();

    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}
