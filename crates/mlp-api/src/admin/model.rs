use mlp_db::models::UserRole;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct UserFilter {
    pub search: Option<String>,
    pub role: Option<UserRole>,
    pub banned: Option<bool>,
}

impl UserFilter {
    /// Blank searches are treated as absent.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationAction {
    Approve,
    Remove,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ModerateRequest {
    pub action: ModerationAction,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BanResponse {
    pub user_id: Uuid,
    pub is_banned: bool,
    /// Refresh tokens revoked by this change
    pub revoked_sessions: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    pub user_id: Uuid,
    pub role: UserRole,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationResponse {
    pub comment_id: Uuid,
    pub action: &'static str,
}

impl ModerationAction {
    pub const fn past_tense(self) -> &'static str {
        match self {
            Self::Approve => "approved",
            Self::Remove => "removed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_moderation_action_parsing() {
        let req: ModerateRequest =
            serde_json::from_value(json!({"action": "remove"})).expect("valid body");
        assert_eq!(req.action, ModerationAction::Remove);
        assert!(serde_json::from_value::<ModerateRequest>(json!({"action": "ban"})).is_err());
    }

    #[test]
    fn test_blank_search_ignored() {
        let filter = UserFilter {
            search: Some("   ".to_string()),
            ..UserFilter::default()
        };
        assert_eq!(filter.search_term(), None);

        let filter = UserFilter {
            search: Some(" ada ".to_string()),
            ..UserFilter::default()
        };
        assert_eq!(filter.search_term(), Some("ada"));
    }
}
