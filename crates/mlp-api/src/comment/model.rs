use std::collections::HashMap;

use mlp_db::models::{Comment, CommentAccess, CommentSort};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Replies embedded under each top-level comment in a lesson listing
pub const REPLY_PREVIEW_LIMIT: i64 = 50;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateCommentRequest {
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
    pub parent_comment_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ReportCommentRequest {
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CommentListQuery {
    #[serde(default)]
    pub sort: CommentSort,
}

/// A top-level comment with its first replies
#[derive(Debug, Serialize)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<Comment>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub likes: i32,
    pub is_liked: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReportResponse {
    pub flag_count: i32,
}

/// Trimmed content, rejected when only whitespace remains.
pub(crate) fn clean_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Replies always hang off a top-level comment: answering a reply attaches
/// the new comment to that reply's parent.
pub(crate) const fn thread_root(parent: &CommentAccess) -> Uuid {
    match parent.parent_comment_id {
        Some(root) => root,
        None => parent.id,
    }
}

/// Group reply previews under their parents, keeping the parents' order.
pub(crate) fn attach_replies(top_level: Vec<Comment>, replies: Vec<Comment>) -> Vec<CommentThread> {
    let mut by_parent: HashMap<Uuid, Vec<Comment>> = HashMap::new();
    for reply in replies {
        if let Some(parent_id) = reply.parent_comment_id {
            by_parent.entry(parent_id).or_default().push(reply);
        }
    }

    top_level
        .into_iter()
        .map(|comment| {
            let replies = by_parent.remove(&comment.id).unwrap_or_default();
            CommentThread { comment, replies }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn comment(id: Uuid, parent: Option<Uuid>, content: &str) -> Comment {
        let now = Utc::now();
        Comment {
            id,
            lesson_id: Uuid::nil(),
            user_id: Uuid::nil(),
            author_username: "reader".into(),
            parent_comment_id: parent,
            content: content.into(),
            likes_count: 0,
            is_edited: false,
            edited_at: None,
            is_deleted: false,
            is_flagged: false,
            flag_count: 0,
            reply_count: 0,
            is_liked: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_attach_replies_groups_by_parent() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let threads = attach_replies(
            vec![comment(a, None, "first"), comment(b, None, "second")],
            vec![
                comment(Uuid::new_v4(), Some(b), "b1"),
                comment(Uuid::new_v4(), Some(a), "a1"),
                comment(Uuid::new_v4(), Some(b), "b2"),
            ],
        );

        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].comment.id, a);
        assert_eq!(threads[0].replies.len(), 1);
        assert_eq!(threads[1].comment.id, b);
        let contents: Vec<_> = threads[1].replies.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["b1", "b2"]);
    }

    #[test]
    fn test_attach_replies_without_replies() {
        let threads = attach_replies(vec![comment(Uuid::new_v4(), None, "alone")], Vec::new());
        assert!(threads[0].replies.is_empty());
    }

    #[test]
    fn test_thread_root_flattens_nested_replies() {
        let root = Uuid::new_v4();
        let top = CommentAccess {
            id: root,
            lesson_id: Uuid::nil(),
            user_id: Uuid::nil(),
            parent_comment_id: None,
            is_deleted: false,
        };
        let reply = CommentAccess {
            id: Uuid::new_v4(),
            parent_comment_id: Some(root),
            ..top
        };
        assert_eq!(thread_root(&top), root);
        assert_eq!(thread_root(&reply), root);
    }

    #[test]
    fn test_clean_content() {
        assert_eq!(clean_content("  hi there \n").as_deref(), Some("hi there"));
        assert_eq!(clean_content(" \t "), None);
    }

    #[test]
    fn test_thread_serializes_flat() {
        let id = Uuid::new_v4();
        let thread = CommentThread {
            comment: comment(id, None, "hello"),
            replies: Vec::new(),
        };
        let json = serde_json::to_value(&thread).unwrap();
        assert_eq!(json["id"], id.to_string());
        assert_eq!(json["content"], "hello");
        assert_eq!(json["isLiked"], false);
        assert!(json["replies"].as_array().unwrap().is_empty());
    }
}
