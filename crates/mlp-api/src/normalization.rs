//! Text normalisation for user-supplied identifiers: tags, e-mail addresses and file names.
//!
//! Accents are stripped by NFD-decomposing and dropping the combining marks, so
//! `"Café"` and `"cafe"` produce the same tag.

use unicode_normalization::UnicodeNormalization;

/// Longest file name kept after sanitising
pub const MAX_FILE_NAME_LEN: usize = 100;

/// Lowercase, strip accents and join words with `-`.
///
/// `"  Machine Learning "` becomes `"machine-learning"`, `"Éducation"` becomes `"education"`.
pub fn normalize_tag(tag: &str) -> String {
    tag.to_lowercase()
        .replace('ß', "ss")
        .replace('æ', "ae")
        .replace('œ', "oe")
        .nfd()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '_')
        .collect::<String>()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Normalise every tag, dropping empties and duplicates while keeping first-seen order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = normalize_tag(tag.as_ref());
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Reduce a client-provided file name to `[A-Za-z0-9._-]`, safe to embed in a storage key.
pub fn sanitize_file_name(name: &str) -> String {
    // Drop any client-side directory components
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let mut sanitized = String::with_capacity(base.len());
    for c in base.nfd() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
            sanitized.push(c);
        } else if c.is_whitespace() && !sanitized.ends_with('_') {
            sanitized.push('_');
        }
    }

    let trimmed = sanitized.trim_start_matches('.').trim_matches('_');
    let truncated: String = trimmed.chars().take(MAX_FILE_NAME_LEN).collect();

    if truncated.is_empty() {
        "file".to_string()
    } else {
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_lowercase_and_accents() {
        assert_eq!(normalize_tag("Rust"), "rust");
        assert_eq!(normalize_tag("Éducation"), "education");
        assert_eq!(normalize_tag("straße"), "strasse");
    }

    #[test]
    fn test_tag_word_joining() {
        assert_eq!(normalize_tag("  Machine   Learning "), "machine-learning");
        assert_eq!(normalize_tag("web_dev"), "web-dev");
        assert_eq!(normalize_tag("c++ / rust!"), "c-rust");
    }

    #[test]
    fn test_tags_dedupe_and_drop_empty() {
        let tags = normalize_tags(["Rust", "rust", "  ", "Café", "cafe", "SQL"]);
        assert_eq!(tags, vec!["rust", "cafe", "sql"]);
    }

    #[test]
    fn test_email_normalization() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn test_file_name_basic() {
        assert_eq!(sanitize_file_name("photo.png"), "photo.png");
        assert_eq!(sanitize_file_name("My Holiday Photo.JPG"), "My_Holiday_Photo.JPG");
    }

    #[test]
    fn test_file_name_strips_paths_and_accents() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\résumé.pdf"), "resume.pdf");
    }

    #[test]
    fn test_file_name_hidden_and_empty() {
        assert_eq!(sanitize_file_name(".env"), "env");
        assert_eq!(sanitize_file_name("???"), "file");
        assert_eq!(sanitize_file_name(""), "file");
    }

    #[test]
    fn test_file_name_truncated() {
        let long = "a".repeat(300);
        assert_eq!(sanitize_file_name(&long).len(), MAX_FILE_NAME_LEN);
    }
}
