use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{
    ProgressShare, ReactionCount, ReactionType, ShareAccess, ShareComment, ShareType, ShareVisibility,
};

// --- Shares ---

pub async fn create_share<'e, E>(
    executor: E,
    user_id: Uuid,
    share_type: ShareType,
    content: &str,
    metadata: &serde_json::Value,
    visibility: ShareVisibility,
) -> Result<Uuid, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            INSERT INTO progress_shares (user_id, share_type, content, metadata, visibility)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(share_type)
    .bind(content)
    .bind(metadata)
    .bind(visibility)
    .fetch_one(executor)
    .await
}

pub async fn find_share<'e, E>(
    executor: E,
    share_id: Uuid,
    viewer_id: Option<Uuid>,
) -> Result<Option<ProgressShare>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT s.id, s.user_id, u.username AS author_username, s.share_type, s.content, s.metadata,
                   s.visibility,
                   (SELECT COUNT(*) FROM share_reactions r WHERE r.share_id = s.id) AS reactions_count,
                   (SELECT COUNT(*) FROM share_comments sc WHERE sc.share_id = s.id) AS comments_count,
                   (SELECT r.reaction_type FROM share_reactions r
                    WHERE r.share_id = s.id AND r.user_id = $2) AS user_reaction,
                   s.created_at, s.updated_at
            FROM progress_shares s
            JOIN users u ON u.id = s.user_id
            WHERE s.id = $1
        "#,
    )
    .bind(share_id)
    .bind(viewer_id)
    .fetch_optional(executor)
    .await
}

pub async fn find_share_access<'e, E>(
    executor: E,
    share_id: Uuid,
) -> Result<Option<ShareAccess>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, user_id, visibility
            FROM progress_shares
            WHERE id = $1
        "#,
    )
    .bind(share_id)
    .fetch_optional(executor)
    .await
}

pub async fn delete_share<'e, E>(
    executor: E,
    share_id: Uuid,
    actor_id: Uuid,
    is_admin: bool,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            DELETE FROM progress_shares
            WHERE id = $1 AND (user_id = $2 OR $3)
        "#,
    )
    .bind(share_id)
    .bind(actor_id)
    .bind(is_admin)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_public_feed<'e, E>(
    executor: E,
    viewer_id: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> Result<Vec<ProgressShare>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT s.id, s.user_id, u.username AS author_username, s.share_type, s.content, s.metadata,
                   s.visibility,
                   (SELECT COUNT(*) FROM share_reactions r WHERE r.share_id = s.id) AS reactions_count,
                   (SELECT COUNT(*) FROM share_comments sc WHERE sc.share_id = s.id) AS comments_count,
                   (SELECT r.reaction_type FROM share_reactions r
                    WHERE r.share_id = s.id AND r.user_id = $1) AS user_reaction,
                   s.created_at, s.updated_at
            FROM progress_shares s
            JOIN users u ON u.id = s.user_id
            WHERE s.visibility = 'public' AND u.is_banned = false
            ORDER BY s.created_at DESC, s.id
            LIMIT $2 OFFSET $3
        "#,
    )
    .bind(viewer_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}

pub async fn count_public_feed<'e, E>(executor: E) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*)
            FROM progress_shares s
            JOIN users u ON u.id = s.user_id
            WHERE s.visibility = 'public' AND u.is_banned = false
        "#,
    )
    .fetch_one(executor)
    .await
}

// --- Reactions ---

/// Per-type reaction counts for a set of shares.
pub async fn reaction_counts<'e, E>(
    executor: E,
    share_ids: &[Uuid],
) -> Result<Vec<ReactionCount>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT share_id, reaction_type, COUNT(*) AS count
            FROM share_reactions
            WHERE share_id = ANY($1)
            GROUP BY share_id, reaction_type
            ORDER BY share_id, reaction_type
        "#,
    )
    .bind(share_ids)
    .fetch_all(executor)
    .await
}

pub async fn find_reaction<'e, E>(
    executor: E,
    share_id: Uuid,
    user_id: Uuid,
) -> Result<Option<ReactionType>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT reaction_type
            FROM share_reactions
            WHERE share_id = $1 AND user_id = $2
            FOR UPDATE
        "#,
    )
    .bind(share_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

pub async fn upsert_reaction<'e, E>(
    executor: E,
    share_id: Uuid,
    user_id: Uuid,
    reaction_type: ReactionType,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO share_reactions (share_id, user_id, reaction_type)
            VALUES ($1, $2, $3)
            ON CONFLICT (share_id, user_id)
            DO UPDATE SET reaction_type = $3, created_at = NOW()
        "#,
    )
    .bind(share_id)
    .bind(user_id)
    .bind(reaction_type)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn delete_reaction<'e, E>(executor: E, share_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            DELETE FROM share_reactions
            WHERE share_id = $1 AND user_id = $2
        "#,
    )
    .bind(share_id)
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(())
}

// --- Share comments ---

pub async fn create_comment<'e, E>(
    executor: E,
    share_id: Uuid,
    user_id: Uuid,
    content: &str,
) -> Result<ShareComment, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            WITH inserted AS (
                INSERT INTO share_comments (share_id, user_id, content)
                VALUES ($1, $2, $3)
                RETURNING id, share_id, user_id, content, created_at
            )
            SELECT i.id, i.share_id, i.user_id, u.username AS author_username, i.content, i.created_at
            FROM inserted i
            JOIN users u ON u.id = i.user_id
        "#,
    )
    .bind(share_id)
    .bind(user_id)
    .bind(content)
    .fetch_one(executor)
    .await
}

pub async fn list_comments<'e, E>(executor: E, share_id: Uuid) -> Result<Vec<ShareComment>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT sc.id, sc.share_id, sc.user_id, u.username AS author_username, sc.content, sc.created_at
            FROM share_comments sc
            JOIN users u ON u.id = sc.user_id
            WHERE sc.share_id = $1
            ORDER BY sc.created_at, sc.id
        "#,
    )
    .bind(share_id)
    .fetch_all(executor)
    .await
}

/// Author of a comment on the given share, if that comment exists there.
pub async fn find_comment_author<'e, E>(
    executor: E,
    share_id: Uuid,
    comment_id: Uuid,
) -> Result<Option<Uuid>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT user_id
            FROM share_comments
            WHERE id = $1 AND share_id = $2
        "#,
    )
    .bind(comment_id)
    .bind(share_id)
    .fetch_optional(executor)
    .await
}

pub async fn delete_comment<'e, E>(executor: E, comment_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            DELETE FROM share_comments
            WHERE id = $1
        "#,
    )
    .bind(comment_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}
