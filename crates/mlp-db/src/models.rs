use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// --- Enumerations (PostgreSQL enum types) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "lesson_difficulty", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LessonDifficulty {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "challenge_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChallengeType {
    CompleteLessons,
    EarnXp,
    PostComments,
    ShareProgress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "challenge_period", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChallengePeriod {
    Daily,
    Weekly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "challenge_difficulty", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChallengeDifficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "activity_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    LessonCompleted,
    ChallengeCompleted,
    ChallengeClaimed,
    MilestoneReached,
    ProgressShared,
    CommentPosted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "share_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ShareType {
    LessonCompleted,
    Milestone,
    Streak,
    ChallengeCompleted,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "share_visibility", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ShareVisibility {
    #[default]
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "reaction_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReactionType {
    Like,
    Celebrate,
    Support,
    Insightful,
}

// --- Users & auth ---

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub is_banned: bool,
    pub created_at: DateTime<Utc>,
}

/// Login lookup; never serialized
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub is_banned: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserCredentials> for UserProfile {
    fn from(c: UserCredentials) -> Self {
        Self {
            id: c.id,
            username: c.username,
            email: c.email,
            role: c.role,
            is_banned: c.is_banned,
            created_at: c.created_at,
        }
    }
}

/// Current role and ban flag, checked on every authenticated request
#[derive(Debug, Clone, FromRow)]
pub struct UserAuthStatus {
    pub email: String,
    pub role: UserRole,
    pub is_banned: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub is_banned: bool,
    pub banned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub total_xp: i64,
    pub level: i32,
}

#[derive(Debug, Clone, Copy, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub users: i64,
    pub banned_users: i64,
    pub admins: i64,
    pub lessons: i64,
    pub published_lessons: i64,
    pub comments: i64,
    pub flagged_comments: i64,
    pub active_challenges: i64,
    pub shares: i64,
    pub tts_items: i64,
    pub files: i64,
}

// --- Lessons ---

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_username: String,
    pub title: String,
    pub summary: Option<String>,
    pub content: String,
    pub category: String,
    pub difficulty: LessonDifficulty,
    pub duration_minutes: i32,
    pub xp_reward: i32,
    pub tags: Vec<String>,
    pub audio_url: Option<String>,
    pub is_published: bool,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Optional filters for the lesson catalogue
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonFilter {
    pub category: Option<String>,
    pub difficulty: Option<LessonDifficulty>,
    pub tag: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewLesson {
    pub author_id: Uuid,
    pub title: String,
    pub summary: Option<String>,
    pub content: String,
    pub category: String,
    pub difficulty: LessonDifficulty,
    pub duration_minutes: i32,
    pub xp_reward: i32,
    pub tags: Vec<String>,
    pub audio_url: Option<String>,
    pub is_published: bool,
}

/// Partial update; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct LessonChanges {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<LessonDifficulty>,
    pub duration_minutes: Option<i32>,
    pub xp_reward: Option<i32>,
    pub tags: Option<Vec<String>>,
    pub audio_url: Option<String>,
    pub is_published: Option<bool>,
}

/// Fields needed for ownership and completion checks
#[derive(Debug, Clone, Copy, FromRow)]
pub struct LessonAccess {
    pub id: Uuid,
    pub author_id: Uuid,
    pub is_published: bool,
    pub xp_reward: i32,
}

// --- Comments ---

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub user_id: Uuid,
    pub author_username: String,
    pub parent_comment_id: Option<Uuid>,
    pub content: String,
    pub likes_count: i32,
    pub is_edited: bool,
    pub edited_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub is_flagged: bool,
    pub flag_count: i32,
    pub reply_count: i64,
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, FromRow)]
pub struct CommentAccess {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub user_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentSort {
    #[default]
    Newest,
    Oldest,
    Popular,
}

impl CommentSort {
    /// ORDER BY fragment; only ever one of these literals
    pub const fn order_by(&self) -> &'static str {
        match self {
            Self::Newest => "c.created_at DESC",
            Self::Oldest => "c.created_at ASC",
            Self::Popular => "c.likes_count DESC, c.created_at DESC",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FlaggedComment {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub lesson_title: String,
    pub user_id: Uuid,
    pub author_username: String,
    pub content: String,
    pub flag_count: i32,
    pub latest_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

// --- Challenges ---

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub challenge_type: ChallengeType,
    pub period: ChallengePeriod,
    pub difficulty: ChallengeDifficulty,
    pub target: i32,
    pub reward_xp: i32,
    pub reward_badge: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Challenge {
    /// Active and inside its `[starts_at, ends_at)` window
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.starts_at <= now && now < self.ends_at
    }
}

#[derive(Debug, Clone)]
pub struct NewChallenge {
    pub title: String,
    pub description: String,
    pub challenge_type: ChallengeType,
    pub period: ChallengePeriod,
    pub difficulty: ChallengeDifficulty,
    pub target: i32,
    pub reward_xp: i32,
    pub reward_badge: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct ChallengeChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub reward_xp: Option<i32>,
    pub reward_badge: Option<String>,
    pub ends_at: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeProgress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub challenge_id: Uuid,
    pub progress: i32,
    pub target: i32,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub is_claimed: bool,
    pub claimed_at: Option<DateTime<Utc>>,
    pub xp_awarded: i32,
    pub joined_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A challenge joined with the caller's progress, if any
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeWithProgress {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub challenge: Challenge,
    pub joined: bool,
    pub progress: Option<i32>,
    pub is_completed: Option<bool>,
    pub is_claimed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeHistoryEntry {
    pub challenge_id: Uuid,
    pub title: String,
    pub challenge_type: ChallengeType,
    pub period: ChallengePeriod,
    pub reward_xp: i32,
    pub progress: i32,
    pub target: i32,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub is_claimed: bool,
    pub xp_awarded: i32,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRankingRow {
    pub user_id: Uuid,
    pub username: String,
    pub progress: i32,
    pub target: i32,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Open challenge the user joined but has not completed
#[derive(Debug, Clone, Copy, FromRow)]
pub struct PendingChallenge {
    pub progress_id: Uuid,
    pub challenge_id: Uuid,
    pub period: ChallengePeriod,
    pub progress: i32,
    pub target: i32,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StreakRecord {
    pub user_id: Uuid,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub multiplier: f64,
    pub last_completed_on: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StreakMilestone {
    pub streak_value: i32,
    pub reached_at: DateTime<Utc>,
}

// --- Progress & social ---

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStats {
    pub user_id: Uuid,
    pub total_xp: i64,
    pub level: i32,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub lessons_completed: i32,
    pub challenges_completed: i32,
    pub shares_count: i32,
    pub comments_count: i32,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Stats rebuilt from the source tables
#[derive(Debug, Clone, Copy, FromRow)]
pub struct StatsRecount {
    pub total_xp: i64,
    pub lessons_completed: i32,
    pub challenges_completed: i32,
    pub shares_count: i32,
    pub comments_count: i32,
    pub current_streak: i32,
    pub longest_streak: i32,
}

/// Counter columns on `progress_stats` that events can bump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatCounter {
    LessonsCompleted,
    ChallengesCompleted,
    SharesCount,
    CommentsCount,
}

impl StatCounter {
    pub const fn column(&self) -> &'static str {
        match self {
            Self::LessonsCompleted => "lessons_completed",
            Self::ChallengesCompleted => "challenges_completed",
            Self::SharesCount => "shares_count",
            Self::CommentsCount => "comments_count",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_type: ActivityType,
    pub description: String,
    pub xp_earned: i32,
    pub reference_id: Option<Uuid>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProgressShare {
    pub id: Uuid,
    pub user_id: Uuid,
    pub author_username: String,
    pub share_type: ShareType,
    pub content: String,
    pub metadata: serde_json::Value,
    pub visibility: ShareVisibility,
    pub reactions_count: i64,
    pub comments_count: i64,
    pub user_reaction: Option<ReactionType>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReactionCount {
    #[serde(skip)]
    pub share_id: Uuid,
    pub reaction_type: ReactionType,
    pub count: i64,
}

/// Owner and visibility, for access checks
#[derive(Debug, Clone, Copy, FromRow)]
pub struct ShareAccess {
    pub id: Uuid,
    pub user_id: Uuid,
    pub visibility: ShareVisibility,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ShareComment {
    pub id: Uuid,
    pub share_id: Uuid,
    pub user_id: Uuid,
    pub author_username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: Uuid,
    pub milestone_type: String,
    pub achieved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardSort {
    #[default]
    Xp,
    Streak,
    Lessons,
}

impl LeaderboardSort {
    pub const fn order_by(&self) -> &'static str {
        match self {
            Self::Xp => "ps.total_xp DESC, u.created_at ASC",
            Self::Streak => "ps.current_streak DESC, ps.total_xp DESC, u.created_at ASC",
            Self::Lessons => "ps.lessons_completed DESC, ps.total_xp DESC, u.created_at ASC",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    pub user_id: Uuid,
    pub username: String,
    pub total_xp: i64,
    pub level: i32,
    pub current_streak: i32,
    pub lessons_completed: i32,
}

// --- TTS & uploads ---

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TtsLibraryItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub lesson_id: Option<Uuid>,
    pub title: String,
    pub text: String,
    pub voice: String,
    pub model: String,
    pub format: String,
    pub speed: f64,
    pub characters: i32,
    pub cost: f64,
    pub duration_seconds: f64,
    pub audio_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTtsLibraryItem {
    pub user_id: Uuid,
    pub lesson_id: Option<Uuid>,
    pub title: String,
    pub text: String,
    pub voice: String,
    pub model: String,
    pub format: String,
    pub speed: f64,
    pub characters: i32,
    pub cost: f64,
    pub duration_seconds: f64,
    pub audio_url: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub id: Uuid,
    pub user_id: Uuid,
    pub key: String,
    pub file_name: String,
    pub url: String,
    pub size_bytes: i64,
    pub mime_type: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFileMetadata {
    pub user_id: Uuid,
    pub key: String,
    pub file_name: String,
    pub url: String,
    pub size_bytes: i64,
    pub mime_type: String,
    pub is_public: bool,
}
