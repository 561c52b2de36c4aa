use axum::{Router, extract::State, routing::get};
use mlp_db::{
    models::{LeaderboardRow, LeaderboardSort},
    pagination::{PageParams, Pagination},
    repositories::{leaderboard as leaderboard_repo, progress as progress_repo},
};
use serde::{Deserialize, Serialize};

use crate::{
    ApiState, auth::AuthUser, error::ApiError, response::ApiResponse,
    validation::ValidatedQuery,
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/leaderboard", get(leaderboard))
        .route("/leaderboard/me", get(my_rank))
}

#[derive(Debug, Default, Deserialize)]
struct SortQuery {
    #[serde(default)]
    sort: LeaderboardSort,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: i64,
    #[serde(flatten)]
    pub row: LeaderboardRow,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyRank {
    pub rank: i64,
    pub total_users: i64,
    pub total_xp: i64,
    pub level: i32,
    pub current_streak: i32,
    pub lessons_completed: i32,
}

fn rank_page(rows: Vec<LeaderboardRow>, offset: i64) -> Vec<LeaderboardEntry> {
    rows.into_iter()
        .enumerate()
        .map(|(idx, row)| LeaderboardEntry {
            rank: offset + idx as i64 + 1,
            row,
        })
        .collect()
}

async fn leaderboard(
    State(state): State<ApiState>,
    ValidatedQuery(page): ValidatedQuery<PageParams>,
    ValidatedQuery(query): ValidatedQuery<SortQuery>,
) -> Result<ApiResponse<Vec<LeaderboardEntry>>, ApiError> {
    let page = Pagination::from(page);
    let (rows, total) = tokio::try_join!(
        leaderboard_repo::list(&state.pool, query.sort, page.limit, page.offset()),
        leaderboard_repo::count(&state.pool),
    )?;

    Ok(ApiResponse::paginated(
        "Leaderboard retrieved",
        rank_page(rows, page.offset()),
        page.meta(total),
    ))
}

async fn my_rank(
    auth_user: AuthUser,
    State(state): State<ApiState>,
) -> Result<ApiResponse<MyRank>, ApiError> {
    let (stats, ahead, total_users) = tokio::try_join!(
        progress_repo::find_stats(&state.pool, auth_user.user_id),
        leaderboard_repo::count_ahead_by_xp(&state.pool, auth_user.user_id),
        leaderboard_repo::count(&state.pool),
    )?;
    let stats = stats.ok_or_else(|| ApiError::not_found("Progress stats"))?;

    Ok(ApiResponse::ok(
        "Rank retrieved",
        MyRank {
            rank: ahead + 1,
            total_users,
            total_xp: stats.total_xp,
            level: stats.level,
            current_streak: stats.current_streak,
            lessons_completed: stats.lessons_completed,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn row(username: &str, total_xp: i64) -> LeaderboardRow {
        LeaderboardRow {
            user_id: Uuid::new_v4(),
            username: username.to_string(),
            total_xp,
            level: mlp_game::level_for_xp(total_xp),
            current_streak: 0,
            lessons_completed: 0,
        }
    }

    #[test]
    fn test_rank_page_continues_from_offset() {
        let ranked = rank_page(vec![row("ada", 900), row("bob", 400)], 40);
        assert_eq!(ranked[0].rank, 41);
        assert_eq!(ranked[1].rank, 42);
    }

    #[test]
    fn test_first_page_starts_at_one() {
        let ranked = rank_page(vec![row("ada", 900)], 0);
        let json = serde_json::to_value(&ranked[0]).unwrap();
        assert_eq!(json["rank"], 1);
        assert_eq!(json["username"], "ada");
        assert_eq!(json["totalXp"], 900);
        assert_eq!(json["level"], 4);
    }

    #[test]
    fn test_sort_query_default_and_values() {
        let q: SortQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.sort, LeaderboardSort::Xp);
        let q: SortQuery = serde_json::from_str(r#"{"sort":"lessons"}"#).unwrap();
        assert_eq!(q.sort, LeaderboardSort::Lessons);
    }
}
