use mlp_db::models::{LessonChanges, LessonDifficulty, LessonFilter, NewLesson};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    normalization::{normalize_tag, normalize_tags},
    validation::{non_blank, not_blank},
};

const fn default_duration() -> i32 {
    5
}

const fn default_xp_reward() -> i32 {
    10
}

const fn default_difficulty() -> LessonDifficulty {
    LessonDifficulty::Beginner
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLessonRequest {
    #[validate(length(min = 1, max = 200), custom(function = "not_blank"))]
    pub title: String,
    #[validate(length(max = 500))]
    pub summary: Option<String>,
    #[validate(length(min = 1, max = 50000))]
    pub content: String,
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub category: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: LessonDifficulty,
    #[serde(default = "default_duration")]
    #[validate(range(min = 1, max = 240))]
    pub duration_minutes: i32,
    #[serde(default = "default_xp_reward")]
    #[validate(range(min = 0, max = 1000))]
    pub xp_reward: i32,
    #[serde(default)]
    #[validate(length(max = 10, message = "at most 10 tags"))]
    pub tags: Vec<String>,
    #[validate(length(max = 2048))]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub is_published: bool,
}

impl CreateLessonRequest {
    pub fn into_new_lesson(self, author_id: Uuid) -> NewLesson {
        NewLesson {
            author_id,
            title: self.title.trim().to_string(),
            summary: non_blank(self.summary),
            content: self.content,
            category: self.category.trim().to_string(),
            difficulty: self.difficulty,
            duration_minutes: self.duration_minutes,
            xp_reward: self.xp_reward,
            tags: normalize_tags(&self.tags),
            audio_url: non_blank(self.audio_url),
            is_published: self.is_published,
        }
    }
}

/// Every field optional; absent fields keep their stored value
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLessonRequest {
    #[validate(length(min = 1, max = 200), custom(function = "not_blank"))]
    pub title: Option<String>,
    #[validate(length(max = 500))]
    pub summary: Option<String>,
    #[validate(length(min = 1, max = 50000))]
    pub content: Option<String>,
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub category: Option<String>,
    pub difficulty: Option<LessonDifficulty>,
    #[validate(range(min = 1, max = 240))]
    pub duration_minutes: Option<i32>,
    #[validate(range(min = 0, max = 1000))]
    pub xp_reward: Option<i32>,
    #[validate(length(max = 10, message = "at most 10 tags"))]
    pub tags: Option<Vec<String>>,
    #[validate(length(max = 2048))]
    pub audio_url: Option<String>,
    pub is_published: Option<bool>,
}

impl UpdateLessonRequest {
    pub fn into_changes(self) -> LessonChanges {
        LessonChanges {
            title: self.title.map(|t| t.trim().to_string()),
            summary: non_blank(self.summary),
            content: self.content,
            category: self.category.map(|c| c.trim().to_string()),
            difficulty: self.difficulty,
            duration_minutes: self.duration_minutes,
            xp_reward: self.xp_reward,
            tags: self.tags.map(|tags| normalize_tags(&tags)),
            audio_url: non_blank(self.audio_url),
            is_published: self.is_published,
        }
    }
}

/// Trim free-text filters and bring `tag` into stored form
pub(crate) fn normalize_filter(filter: LessonFilter) -> LessonFilter {
    LessonFilter {
        category: non_blank(filter.category),
        difficulty: filter.difficulty,
        tag: non_blank(filter.tag)
            .map(|t| normalize_tag(&t))
            .filter(|t| !t.is_empty()),
        search: non_blank(filter.search),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResponse {
    pub lesson_id: Uuid,
    pub already_completed: bool,
    pub xp_awarded: i64,
    pub total_xp: i64,
    pub level: i32,
    pub leveled_up: bool,
    pub completed_challenges: Vec<Uuid>,
    pub new_milestones: Vec<&'static str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request() -> CreateLessonRequest {
        serde_json::from_value(serde_json::json!({
            "title": "  Ownership basics ",
            "content": "Every value has an owner.",
            "category": "rust",
            "tags": ["Memory Safety", "memory-safety", "Borrowing"],
            "summary": "   "
        }))
        .unwrap()
    }

    #[test]
    fn test_create_defaults() {
        let req = create_request();
        assert_eq!(req.difficulty, LessonDifficulty::Beginner);
        assert_eq!(req.duration_minutes, 5);
        assert_eq!(req.xp_reward, 10);
        assert!(!req.is_published);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_into_new_lesson_normalizes() {
        let author = Uuid::new_v4();
        let lesson = create_request().into_new_lesson(author);
        assert_eq!(lesson.author_id, author);
        assert_eq!(lesson.title, "Ownership basics");
        assert_eq!(lesson.summary, None);
        assert_eq!(lesson.tags, vec!["memory-safety", "borrowing"]);
    }

    #[test]
    fn test_create_rejects_out_of_range() {
        let req: CreateLessonRequest = serde_json::from_value(serde_json::json!({
            "title": "",
            "content": "x",
            "category": "rust",
            "durationMinutes": 0,
            "xpReward": 5000,
            "tags": ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k"]
        }))
        .unwrap();

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("duration_minutes"));
        assert!(fields.contains_key("xp_reward"));
        assert!(fields.contains_key("tags"));
    }

    #[test]
    fn test_whitespace_title_and_category_are_rejected() {
        let create: CreateLessonRequest = serde_json::from_value(serde_json::json!({
            "title": "   ",
            "content": "x",
            "category": "\t"
        }))
        .unwrap();
        let errors = create.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("category"));

        let update: UpdateLessonRequest =
            serde_json::from_value(serde_json::json!({ "title": "  ", "category": " " }))
                .unwrap();
        let errors = update.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("category"));
    }

    #[test]
    fn test_update_only_touches_given_fields() {
        let req: UpdateLessonRequest =
            serde_json::from_value(serde_json::json!({ "isPublished": true, "tags": ["Déjà Vu"] }))
                .unwrap();
        let changes = req.into_changes();
        assert_eq!(changes.is_published, Some(true));
        assert_eq!(changes.tags, Some(vec!["deja-vu".to_string()]));
        assert!(changes.title.is_none());
        assert!(changes.content.is_none());
    }

    #[test]
    fn test_normalize_filter() {
        let filter = normalize_filter(LessonFilter {
            category: Some("  ".into()),
            difficulty: None,
            tag: Some(" Web Dev ".into()),
            search: Some(" closures ".into()),
        });
        assert_eq!(filter.category, None);
        assert_eq!(filter.tag.as_deref(), Some("web-dev"));
        assert_eq!(filter.search.as_deref(), Some("closures"));
    }
}
