use crate::Config;
use crate::auth::AdminUser;
use crate::database::feedback::FeedbackStore;
use crate::database::postgres_repository::PostgresRepository;
use crate::database::session::SessionRegistry;
use crate::error::app_error::AppError;
use crate::models::analytics::{ConversationsByDay, DailyActivity, DashboardOverview, ResponseTimeSummary, UserResponseTime, UserStats, WeekdayAverage};
use crate::models::feedback::FeedbackRecord;
use crate::models::session::ConnectedUsers;
use crate::service::analytics::{document_census_from, label_conversation_days, merge_user_stats, response_time_distribution, satisfaction_rate, weekday_averages};
use crate::service::retrieval::SharedIndex;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use rocket::serde::json::Json;
use rocket::{State, get};
use rocket_okapi::openapi;
use sqlx::PgPool;
use tracing::info;

fn repo(pool: &State<PgPool>) -> PostgresRepository {
    PostgresRepository { pool: pool.inner().clone() }
}

fn reporting_tz(config: &Config) -> Result<Tz, AppError> {
    config
        .analytics
        .timezone
        .parse::<Tz>()
        .map_err(|_| AppError::Configuration(format!("invalid analytics.timezone: {}", config.analytics.timezone)))
}

fn thirty_days_ago() -> DateTime<Utc> {
    Utc::now() - Duration::days(30)
}

/// Force-close ghost sessions before answering any presence question.
/// When the sweep itself fails the read fails with it; reporting stale
/// "connected" numbers would be worse than an error.
async fn sweep_ghosts(repo: &PostgresRepository, config: &Config) -> Result<(), AppError> {
    let reclaimed = repo.reclaim_ghosts(Duration::hours(config.session.ghost_ttl_hours)).await?;
    if reclaimed > 0 {
        info!(reclaimed, "reclaimed ghost sessions");
    }

    Ok(())
}

/// Headline metrics for the admin landing view.
#[openapi(tag = "Analytics")]
#[get("/overview")]
pub async fn overview(
    pool: &State<PgPool>,
    index: &State<SharedIndex>,
    config: &State<Config>,
    _admin: AdminUser,
) -> Result<Json<DashboardOverview>, AppError> {
    let repo = repo(pool);
    sweep_ghosts(&repo, config).await?;

    let feedback = repo.feedback_totals().await?;
    let (total_documents, documents_by_type) = document_census_from(index.inner().as_ref()).await;

    Ok(Json(DashboardOverview {
        total_users: repo.total_users().await?,
        connected_now: repo.count_active(config.session.exclude_admin_from_presence).await?,
        total_conversations: repo.total_conversations().await?,
        total_documents,
        satisfaction_rate: satisfaction_rate(feedback.positive, feedback.negative),
        feedback,
        user_types: repo.user_types().await?,
        documents_by_type,
    }))
}

/// Distinct conversations per calendar day over the trailing 30 days.
#[openapi(tag = "Analytics")]
#[get("/conversations-by-day")]
pub async fn conversations_by_day(pool: &State<PgPool>, config: &State<Config>, _admin: AdminUser) -> Result<Json<Vec<ConversationsByDay>>, AppError> {
    let repo = repo(pool);
    let tz = reporting_tz(config)?;
    let rows = repo.conversation_days(tz.name(), Some(thirty_days_ago())).await?;

    Ok(Json(label_conversation_days(rows)))
}

/// All-time mean daily conversation volume per weekday.
#[openapi(tag = "Analytics")]
#[get("/conversations-by-weekday")]
pub async fn conversations_by_weekday(pool: &State<PgPool>, config: &State<Config>, _admin: AdminUser) -> Result<Json<Vec<WeekdayAverage>>, AppError> {
    let repo = repo(pool);
    let tz = reporting_tz(config)?;
    let rows = repo.conversation_days(tz.name(), None).await?;

    Ok(Json(weekday_averages(&rows)))
}

/// Global mean, bucketed distribution and trailing 30-day daily means
/// of assistant generation latency.
#[openapi(tag = "Analytics")]
#[get("/response-times")]
pub async fn response_times(pool: &State<PgPool>, config: &State<Config>, _admin: AdminUser) -> Result<Json<ResponseTimeSummary>, AppError> {
    let repo = repo(pool);
    let tz = reporting_tz(config)?;

    let times = repo.assistant_response_times().await?;

    Ok(Json(ResponseTimeSummary {
        average: repo.average_response_time().await?,
        distribution: response_time_distribution(&times),
        by_day: repo.response_time_by_day(tz.name(), thirty_days_ago()).await?,
    }))
}

#[openapi(tag = "Analytics")]
#[get("/response-times-by-user")]
pub async fn response_times_by_user(pool: &State<PgPool>, _admin: AdminUser) -> Result<Json<Vec<UserResponseTime>>, AppError> {
    Ok(Json(repo(pool).response_time_by_user().await?))
}

/// Questions, answers and distinct active users per day, trailing 30
/// days, newest first.
#[openapi(tag = "Analytics")]
#[get("/daily-activity")]
pub async fn daily_activity(pool: &State<PgPool>, config: &State<Config>, _admin: AdminUser) -> Result<Json<Vec<DailyActivity>>, AppError> {
    let repo = repo(pool);
    let tz = reporting_tz(config)?;

    Ok(Json(repo.daily_activity(tz.name(), thirty_days_ago()).await?))
}

/// Who is connected right now, ghost sessions swept first.
#[openapi(tag = "Analytics")]
#[get("/connected")]
pub async fn connected(pool: &State<PgPool>, config: &State<Config>, _admin: AdminUser) -> Result<Json<ConnectedUsers>, AppError> {
    let repo = repo(pool);
    sweep_ghosts(&repo, config).await?;

    let users = repo.list_active(config.session.exclude_admin_from_presence).await?;

    Ok(Json(ConnectedUsers { count: users.len(), users }))
}

/// Everyone whose latest login falls on today, connected or not.
#[openapi(tag = "Analytics")]
#[get("/connected-today")]
pub async fn connected_today(pool: &State<PgPool>, config: &State<Config>, _admin: AdminUser) -> Result<Json<ConnectedUsers>, AppError> {
    let repo = repo(pool);
    sweep_ghosts(&repo, config).await?;

    let tz = reporting_tz(config)?;
    let today = Utc::now().with_timezone(&tz).date_naive();
    let users = repo.list_active_today(tz.name(), today).await?;

    Ok(Json(ConnectedUsers { count: users.len(), users }))
}

/// Per-user leaderboard of questions, conversations and feedback.
#[openapi(tag = "Analytics")]
#[get("/user-stats")]
pub async fn user_stats(pool: &State<PgPool>, _admin: AdminUser) -> Result<Json<Vec<UserStats>>, AppError> {
    let repo = repo(pool);
    let message_stats = repo.user_message_stats().await?;
    let feedback = repo.feedback_by_user().await?;

    Ok(Json(merge_user_stats(message_stats, feedback)))
}

/// Raw feedback log, newest first, for export.
#[openapi(tag = "Analytics")]
#[get("/feedbacks")]
pub async fn feedbacks(pool: &State<PgPool>, _admin: AdminUser) -> Result<Json<Vec<FeedbackRecord>>, AppError> {
    Ok(Json(repo(pool).all_feedback().await?))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![
        overview,
        conversations_by_day,
        conversations_by_weekday,
        response_times,
        response_times_by_user,
        daily_activity,
        connected,
        connected_today,
        user_stats,
        feedbacks,
    ]
}
