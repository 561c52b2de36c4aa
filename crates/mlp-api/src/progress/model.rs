use std::{collections::HashMap, str::FromStr};

use mlp_db::models::{
    Milestone, ProgressShare, ProgressStats, ReactionCount, ReactionType, ShareAccess, ShareComment,
    ShareType, ShareVisibility,
};
use mlp_game::{MilestoneKind, level_progress};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: ProgressStats,
    pub level_floor_xp: i64,
    pub next_level_xp: i64,
    pub level_percent: f64,
}

impl From<ProgressStats> for StatsResponse {
    fn from(stats: ProgressStats) -> Self {
        let progress = level_progress(stats.total_xp);
        Self {
            stats,
            level_floor_xp: progress.level_floor_xp,
            next_level_xp: progress.next_level_xp,
            level_percent: progress.percent,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateShareRequest {
    pub share_type: ShareType,
    #[validate(length(min = 1, max = 1000))]
    pub content: String,
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub visibility: ShareVisibility,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReactionRequest {
    #[serde(alias = "type")]
    pub reaction_type: ReactionType,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ShareCommentRequest {
    #[validate(length(min = 1, max = 500))]
    pub content: String,
}

/// A feed entry with its per-type reaction counts
#[derive(Debug, Serialize)]
pub struct FeedItem {
    #[serde(flatten)]
    pub share: ProgressShare,
    pub reactions: Vec<ReactionCount>,
}

#[derive(Debug, Serialize)]
pub struct ShareDetail {
    #[serde(flatten)]
    pub share: ProgressShare,
    pub reactions: Vec<ReactionCount>,
    pub comments: Vec<ShareComment>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionResponse {
    /// The caller's reaction after the toggle, `None` if it was removed
    pub user_reaction: Option<ReactionType>,
    pub reactions: Vec<ReactionCount>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneView {
    #[serde(flatten)]
    pub milestone: Milestone,
    pub title: Option<&'static str>,
}

impl From<Milestone> for MilestoneView {
    fn from(milestone: Milestone) -> Self {
        let title = MilestoneKind::from_str(&milestone.milestone_type)
            .ok()
            .map(|kind| kind.title());
        Self { milestone, title }
    }
}

/// Private shares are only visible to their owner.
pub(crate) fn can_view(share: &ShareAccess, viewer_id: Option<Uuid>) -> bool {
    share.visibility == ShareVisibility::Public || viewer_id == Some(share.user_id)
}

/// Decide what a reaction request does given the caller's current reaction.
/// Reacting with the same type again withdraws it.
pub(crate) fn next_reaction(
    current: Option<ReactionType>,
    requested: ReactionType,
) -> Option<ReactionType> {
    match current {
        Some(existing) if existing == requested => None,
        _ => Some(requested),
    }
}

/// Spread grouped reaction counts over their shares, preserving feed order.
pub(crate) fn attach_reactions(shares: Vec<ProgressShare>, counts: Vec<ReactionCount>) -> Vec<FeedItem> {
    let mut by_share: HashMap<Uuid, Vec<ReactionCount>> = HashMap::new();
    for count in counts {
        by_share.entry(count.share_id).or_default().push(count);
    }

    shares
        .into_iter()
        .map(|share| {
            let reactions = by_share.remove(&share.id).unwrap_or_default();
            FeedItem { share, reactions }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn share(id: Uuid) -> ProgressShare {
        let now = Utc::now();
        ProgressShare {
            id,
            user_id: Uuid::nil(),
            author_username: "learner".into(),
            share_type: ShareType::Custom,
            content: "Finished my first week".into(),
            metadata: serde_json::json!({}),
            visibility: ShareVisibility::Public,
            reactions_count: 0,
            comments_count: 0,
            user_reaction: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_next_reaction_toggle_and_replace() {
        use ReactionType::{Celebrate, Like};
        assert_eq!(next_reaction(None, Like), Some(Like));
        assert_eq!(next_reaction(Some(Like), Like), None);
        assert_eq!(next_reaction(Some(Like), Celebrate), Some(Celebrate));
    }

    #[test]
    fn test_can_view_private_share() {
        let owner = Uuid::new_v4();
        let private = ShareAccess {
            id: Uuid::new_v4(),
            user_id: owner,
            visibility: ShareVisibility::Private,
        };
        assert!(can_view(&private, Some(owner)));
        assert!(!can_view(&private, Some(Uuid::new_v4())));
        assert!(!can_view(&private, None));

        let public = ShareAccess {
            visibility: ShareVisibility::Public,
            ..private
        };
        assert!(can_view(&public, None));
    }

    #[test]
    fn test_attach_reactions() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let items = attach_reactions(
            vec![share(a), share(b)],
            vec![
                ReactionCount {
                    share_id: b,
                    reaction_type: ReactionType::Like,
                    count: 3,
                },
                ReactionCount {
                    share_id: b,
                    reaction_type: ReactionType::Support,
                    count: 1,
                },
            ],
        );
        assert!(items[0].reactions.is_empty());
        assert_eq!(items[1].reactions.len(), 2);

        let json = serde_json::to_value(&items[1]).unwrap();
        assert_eq!(json["reactions"][0]["reactionType"], "like");
        assert_eq!(json["reactions"][0]["count"], 3);
        assert!(json["reactions"][0].get("shareId").is_none());
    }

    #[test]
    fn test_milestone_view_title() {
        let view = MilestoneView::from(Milestone {
            id: Uuid::new_v4(),
            milestone_type: "first_share".into(),
            achieved_at: Utc::now(),
        });
        assert_eq!(view.title, Some("Shared your progress"));

        let unknown = MilestoneView::from(Milestone {
            id: Uuid::new_v4(),
            milestone_type: "retired_kind".into(),
            achieved_at: Utc::now(),
        });
        assert_eq!(unknown.title, None);
    }

    #[test]
    fn test_reaction_request_accepts_type_alias() {
        let req: ReactionRequest = serde_json::from_str(r#"{"type":"insightful"}"#).unwrap();
        assert_eq!(req.reaction_type, ReactionType::Insightful);
        let req: ReactionRequest = serde_json::from_str(r#"{"reactionType":"support"}"#).unwrap();
        assert_eq!(req.reaction_type, ReactionType::Support);
    }
}
