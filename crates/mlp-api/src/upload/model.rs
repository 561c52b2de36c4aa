use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Seconds a presigned upload URL stays valid
pub const PRESIGN_TTL_SECS: u64 = 900;

const MAX_SANITIZED_NAME_LEN: usize = 100;

pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "audio/mpeg",
    "audio/wav",
    "audio/ogg",
    "audio/webm",
    "audio/mp4",
    "audio/aac",
    "application/pdf",
];

pub fn is_allowed_mime(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ALLOWED_MIME_TYPES.contains(&essence.as_str())
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PresignRequest {
    #[validate(length(min = 1, max = 255, message = "must be 1-255 characters"))]
    pub file_name: String,
    #[validate(length(min = 1, message = "is required"))]
    pub content_type: String,
    #[validate(range(min = 1, message = "must be positive"))]
    pub size: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignResponse {
    pub key: String,
    pub upload_url: String,
    pub file_url: String,
    pub method: &'static str,
    pub expires_in: u64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordUploadRequest {
    #[validate(length(min = 1, max = 512, message = "must be 1-512 characters"))]
    pub key: String,
    #[validate(length(min = 1, max = 255, message = "must be 1-255 characters"))]
    pub file_name: String,
    #[validate(length(min = 1, message = "is required"))]
    pub content_type: String,
    #[validate(range(min = 1, message = "must be positive"))]
    pub size: i64,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUploadRequest {
    pub is_public: bool,
}

/// Storage prefix owned by one user.
pub fn user_prefix(user_id: Uuid) -> String {
    format!("uploads/{user_id}/")
}

/// `uploads/<userId>/<uuid>-<sanitised name>`
pub fn object_key(user_id: Uuid, object_id: Uuid, file_name: &str) -> String {
    format!("{}{object_id}-{}", user_prefix(user_id), sanitize_file_name(file_name))
}

/// Whether `key` has exactly the shape [`object_key`] hands out under the user's prefix.
/// Anything else (nested paths, `..`, backslashes) could point into another prefix.
pub fn is_owned_key(key: &str, user_id: Uuid) -> bool {
    let Some(rest) = key.strip_prefix(&user_prefix(user_id)) else {
        return false;
    };
    let Some((object_id, name)) = rest.split_at_checked(36) else {
        return false;
    };
    let Some(name) = name.strip_prefix('-') else {
        return false;
    };

    Uuid::try_parse(object_id).is_ok()
        && !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Keep ASCII letters, digits, `.`, `_` and `-`; collapse everything else into single dashes.
pub fn sanitize_file_name(file_name: &str) -> String {
    // Browsers may send a full client path
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);

    let mut out = String::with_capacity(base.len());
    for c in base.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            out.push(c);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }

    let trimmed: String = out
        .trim_matches(|c| c == '-' || c == '.')
        .chars()
        .take(MAX_SANITIZED_NAME_LEN)
        .collect();
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed
    }
}

/// Where the object will be served from once uploaded.
pub fn file_url(base_url: &str, key: &str) -> String {
    format!("{base_url}/files/{key}")
}

/// Development stand-in for a presigned object-storage URL.
// TODO: sign against the object store once a bucket is provisioned
pub fn local_upload_url(base_url: &str, key: &str) -> String {
    format!("{base_url}/v1/uploads/local/{key}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_allow_list() {
        assert!(is_allowed_mime("image/png"));
        assert!(is_allowed_mime("Audio/MPEG"));
        assert!(is_allowed_mime("application/pdf; charset=binary"));
        assert!(!is_allowed_mime("text/html"));
        assert!(!is_allowed_mime("application/x-msdownload"));
        assert!(!is_allowed_mime(""));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("My Notes (final).pdf"), "My-Notes-final-.pdf");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\photo.png"), "photo.png");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("日本語"), "file");
        assert_eq!(sanitize_file_name("...."), "file");
        assert_eq!(sanitize_file_name(&"a".repeat(300)).len(), 100);
    }

    #[test]
    fn test_object_key_layout() {
        let user_id = Uuid::new_v4();
        let object_id = Uuid::new_v4();
        let key = object_key(user_id, object_id, "lesson audio.mp3");

        assert!(key.starts_with(&user_prefix(user_id)));
        assert_eq!(key, format!("uploads/{user_id}/{object_id}-lesson-audio.mp3"));
    }

    #[test]
    fn test_owned_key_shape() {
        let me = Uuid::new_v4();
        let victim = Uuid::new_v4();
        let object_id = Uuid::new_v4();

        assert!(is_owned_key(&object_key(me, object_id, "My Notes (final).pdf"), me));
        assert!(!is_owned_key(&object_key(me, object_id, "notes.pdf"), victim));

        let prefix = user_prefix(me);
        for key in [
            format!("{prefix}../{victim}/secret.pdf"),
            format!("{prefix}{object_id}-../../{victim}/secret.pdf"),
            format!("{prefix}{object_id}-a\\b.pdf"),
            format!("{prefix}{object_id}/notes.pdf"),
            format!("{prefix}{object_id}-"),
            format!("{prefix}not-a-uuid-at-all-but-long-enough-x-notes.pdf"),
            format!("{prefix}notes.pdf"),
            prefix.clone(),
        ] {
            assert!(!is_owned_key(&key, me), "accepted {key}");
        }
    }

    #[test]
    fn test_urls() {
        let key = "uploads/u/x-file.png";
        assert_eq!(
            file_url("http://localhost:3000", key),
            "http://localhost:3000/files/uploads/u/x-file.png"
        );
        assert!(local_upload_url("http://localhost:3000", key).ends_with(key));
    }
}
