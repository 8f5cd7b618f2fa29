//! Dashboard statistics aggregation.
//!
//! Every metric in a [`MetricSnapshot`] is read through one [`SnapshotScope`]
//! and filtered against one [`TimeWindow`], so counts never straddle a write.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::Semaphore;

use crate::config::DashboardConfig;
use crate::errors::AppError;
use crate::models::application::{ApplicationStatus, ApplicationSummary};
use crate::models::essay::EssayStatus;
use crate::services::snapshot::{ReadTx, SnapshotScope};

/// Status value marking active subscriptions and calendar events.
const ACTIVE: &str = "active";

/// Payment status counted as revenue.
const PAYMENT_SUCCEEDED: &str = "succeeded";

/// Maximum rows in each dashboard list.
const LIST_LIMIT: i64 = 10;

/// Time boundaries derived once from the request instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub now: DateTime<Utc>,
    pub thirty_days_ago: DateTime<Utc>,
    pub seven_days_ago: DateTime<Utc>,
    pub seven_days_from_now: DateTime<Utc>,
}

impl TimeWindow {
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            thirty_days_ago: now - Duration::days(30),
            seven_days_ago: now - Duration::days(7),
            seven_days_from_now: now + Duration::days(7),
        }
    }
}

/// Point-in-time platform metrics for the overview page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSnapshot {
    pub overview: Overview,
    pub recent_activity: RecentActivity,
    pub subscriptions: SubscriptionStats,
    pub essays: EssayStats,
    pub cvs: CvStats,
    pub financial: FinancialStats,
    pub personality: PersonalityStats,
    pub application_status_breakdown: BTreeMap<ApplicationStatus, i64>,
    pub upcoming_events: Vec<UpcomingEvent>,
    pub recent_applications: Vec<ApplicationSummary>,
    pub top_universities: Vec<TopUniversity>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_users: i64,
    pub new_users_last_30_days: i64,
    pub new_users_last_7_days: i64,
    pub total_students: i64,
    pub total_universities: i64,
    pub active_universities: i64,
    pub total_programs: i64,
    pub total_applications: i64,
    pub submitted_applications: i64,
    pub accepted_applications: i64,
    /// Accepted share of submitted applications, percent with one decimal.
    pub success_rate: f64,
    pub total_essays: i64,
    pub total_cvs: i64,
    pub total_scholarships: i64,
    pub active_scholarships: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub applications_last_30_days: i64,
    pub applications_last_7_days: i64,
    pub essays_last_30_days: i64,
    pub essays_last_7_days: i64,
    pub cvs_last_7_days: i64,
    pub subscriptions_last_30_days: i64,
}

#[derive(Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStats {
    pub total_active: i64,
    pub by_plan: BTreeMap<String, i64>,
    pub by_status: BTreeMap<String, i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EssayStats {
    pub total: i64,
    pub by_status: BTreeMap<EssayStatus, i64>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CvStats {
    pub total: i64,
    pub complete: i64,
    pub created_last_30_days: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FinancialStats {
    pub total_revenue: f64,
    pub revenue_last_30_days: f64,
    pub successful_payments: i64,
    pub active_subscription_value: f64,
    pub total_scholarship_funding: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalityStats {
    pub total_profiles: i64,
    pub completed_profiles: i64,
    /// Completed share, percent formatted with one decimal ("0" when empty).
    pub completion_rate: String,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingEvent {
    pub id: String,
    pub title: String,
    pub event_type: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: String,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TopUniversity {
    pub id: String,
    pub name: String,
    pub country: Option<String>,
    pub is_active: bool,
    pub application_count: i64,
}

/// One `(plan, status)` bucket from the subscriptions group-by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionGroup {
    pub plan: String,
    pub status: String,
    pub count: i64,
}

/// Intermediate row for the simple-count group.
#[derive(Debug, sqlx::FromRow)]
struct CountsRow {
    total_users: i64,
    new_users_last_30_days: i64,
    new_users_last_7_days: i64,
    total_students: i64,
    total_universities: i64,
    active_universities: i64,
    total_programs: i64,
    total_applications: i64,
    submitted_applications: i64,
    accepted_applications: i64,
    applications_last_30_days: i64,
    applications_last_7_days: i64,
    total_essays: i64,
    essays_last_30_days: i64,
    essays_last_7_days: i64,
    total_cvs: i64,
    cvs_last_7_days: i64,
    total_scholarships: i64,
    active_scholarships: i64,
    subscriptions_last_30_days: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct PersonalityRow {
    total_profiles: i64,
    completed_profiles: i64,
}

/// Build a snapshot as of now, bounded by the configured timeouts.
///
/// Either the whole snapshot is returned or an error; never a partial one.
/// `permits` caps how many snapshots hold connections at once; waiting for a
/// permit counts against the execute timeout.
pub async fn get_snapshot(
    pool: &PgPool,
    permits: &Semaphore,
    config: DashboardConfig,
) -> Result<MetricSnapshot, AppError> {
    let window = TimeWindow::starting_at(Utc::now());

    tokio::time::timeout(config.execute_timeout, async {
        let _permit = permits
            .acquire()
            .await
            .map_err(|_| AppError::Internal("dashboard permits closed".to_string()))?;
        collect(pool, window, config).await
    })
    .await
    .map_err(|_| {
        AppError::Timeout(format!(
            "Dashboard snapshot did not complete within {}s",
            config.execute_timeout.as_secs()
        ))
    })?
}

/// Holds at most [`crate::config::SNAPSHOT_CONNECTIONS`] connections at once:
/// the leader plus six readers.
async fn collect(
    pool: &PgPool,
    window: TimeWindow,
    config: DashboardConfig,
) -> Result<MetricSnapshot, AppError> {
    let scope = SnapshotScope::open(pool, config.acquire_timeout, config.execute_timeout).await?;

    let counts = fetch_counts(scope.reader().await?, window).await?;

    let [subs_tx, essays_tx, apps_tx, cvs_tx, financial_tx, personality_tx] =
        scope.readers::<6>().await?;
    let (subscription_groups, essay_statuses, application_statuses, cvs, financial, personality) =
        tokio::try_join!(
            fetch_subscription_groups(subs_tx),
            fetch_essay_status_counts(essays_tx),
            fetch_application_status_counts(apps_tx),
            fetch_cv_stats(cvs_tx, window),
            fetch_financial_stats(financial_tx, window),
            fetch_personality_counts(personality_tx),
        )?;

    let [events_tx, recent_tx, top_tx] = scope.readers::<3>().await?;
    let (upcoming_events, recent_applications, top_universities) = tokio::try_join!(
        fetch_upcoming_events(events_tx, window),
        fetch_recent_applications(recent_tx),
        fetch_top_universities(top_tx),
    )?;

    scope.close().await?;

    tracing::debug!(
        total_users = counts.total_users,
        total_applications = counts.total_applications,
        "Dashboard snapshot collected"
    );

    let essays = EssayStats {
        total: counts.total_essays,
        by_status: breakdown(essay_statuses),
    };

    Ok(MetricSnapshot {
        overview: Overview {
            total_users: counts.total_users,
            new_users_last_30_days: counts.new_users_last_30_days,
            new_users_last_7_days: counts.new_users_last_7_days,
            total_students: counts.total_students,
            total_universities: counts.total_universities,
            active_universities: counts.active_universities,
            total_programs: counts.total_programs,
            total_applications: counts.total_applications,
            submitted_applications: counts.submitted_applications,
            accepted_applications: counts.accepted_applications,
            success_rate: success_rate(counts.accepted_applications, counts.submitted_applications),
            total_essays: counts.total_essays,
            total_cvs: counts.total_cvs,
            total_scholarships: counts.total_scholarships,
            active_scholarships: counts.active_scholarships,
        },
        recent_activity: RecentActivity {
            applications_last_30_days: counts.applications_last_30_days,
            applications_last_7_days: counts.applications_last_7_days,
            essays_last_30_days: counts.essays_last_30_days,
            essays_last_7_days: counts.essays_last_7_days,
            cvs_last_7_days: counts.cvs_last_7_days,
            subscriptions_last_30_days: counts.subscriptions_last_30_days,
        },
        subscriptions: subscription_stats(&subscription_groups),
        essays,
        cvs,
        financial,
        personality: PersonalityStats {
            total_profiles: personality.total_profiles,
            completed_profiles: personality.completed_profiles,
            completion_rate: completion_rate(
                personality.completed_profiles,
                personality.total_profiles,
            ),
        },
        application_status_breakdown: breakdown(application_statuses),
        upcoming_events,
        recent_applications,
        top_universities,
        generated_at: window.now,
    })
}

// -- Shaping (pure) --

/// Round to one decimal place.
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `accepted / submitted` as a percentage with one decimal; 0 when nothing was submitted.
pub fn success_rate(accepted: i64, submitted: i64) -> f64 {
    if submitted <= 0 {
        return 0.0;
    }
    round1(accepted as f64 / submitted as f64 * 100.0).clamp(0.0, 100.0)
}

/// `completed / total` as a percentage string with one decimal; `"0"` when empty.
pub fn completion_rate(completed: i64, total: i64) -> String {
    if total <= 0 {
        return "0".to_string();
    }
    format!("{:.1}", (completed as f64 / total as f64 * 100.0).clamp(0.0, 100.0))
}

/// Active totals per plan, every count per status.
pub fn subscription_stats(groups: &[SubscriptionGroup]) -> SubscriptionStats {
    let mut stats = SubscriptionStats::default();
    for group in groups {
        *stats.by_status.entry(group.status.clone()).or_default() += group.count;
        if group.status == ACTIVE {
            stats.total_active += group.count;
            *stats.by_plan.entry(group.plan.clone()).or_default() += group.count;
        }
    }
    stats
}

/// Collapse group-by rows into a map, summing duplicate keys.
pub fn breakdown<K: Ord>(rows: Vec<(K, i64)>) -> BTreeMap<K, i64> {
    let mut map = BTreeMap::new();
    for (key, count) in rows {
        *map.entry(key).or_default() += count;
    }
    map
}

// -- Group 1: simple counts --

/// All scalar counts in one statement.
async fn fetch_counts(mut tx: ReadTx, window: TimeWindow) -> Result<CountsRow, AppError> {
    let row = sqlx::query_as::<_, CountsRow>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users)                                         AS total_users,
            (SELECT COUNT(*) FROM users WHERE created_at >= $1)                  AS new_users_last_30_days,
            (SELECT COUNT(*) FROM users WHERE created_at >= $2)                  AS new_users_last_7_days,
            (SELECT COUNT(*) FROM users WHERE role = 'STUDENT')                  AS total_students,
            (SELECT COUNT(*) FROM universities)                                  AS total_universities,
            (SELECT COUNT(*) FROM universities WHERE is_active)                  AS active_universities,
            (SELECT COUNT(*) FROM programs)                                      AS total_programs,
            (SELECT COUNT(*) FROM applications)                                  AS total_applications,
            (SELECT COUNT(*) FROM applications WHERE status = ANY($3))           AS submitted_applications,
            (SELECT COUNT(*) FROM applications WHERE status = $4)                AS accepted_applications,
            (SELECT COUNT(*) FROM applications WHERE created_at >= $1)           AS applications_last_30_days,
            (SELECT COUNT(*) FROM applications WHERE created_at >= $2)           AS applications_last_7_days,
            (SELECT COUNT(*) FROM essays)                                        AS total_essays,
            (SELECT COUNT(*) FROM essays WHERE created_at >= $1)                 AS essays_last_30_days,
            (SELECT COUNT(*) FROM essays WHERE created_at >= $2)                 AS essays_last_7_days,
            (SELECT COUNT(*) FROM cvs)                                           AS total_cvs,
            (SELECT COUNT(*) FROM cvs WHERE created_at >= $2)                    AS cvs_last_7_days,
            (SELECT COUNT(*) FROM scholarships)                                  AS total_scholarships,
            (SELECT COUNT(*) FROM scholarships WHERE is_active)                  AS active_scholarships,
            (SELECT COUNT(*) FROM subscriptions WHERE created_at >= $1)          AS subscriptions_last_30_days
        "#,
    )
    .bind(window.thirty_days_ago)
    .bind(window.seven_days_ago)
    .bind(ApplicationStatus::SUBMITTED.to_vec())
    .bind(ApplicationStatus::Accepted)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(row)
}

// -- Group 2: aggregates --

async fn fetch_subscription_groups(
    mut tx: ReadTx,
) -> Result<Vec<SubscriptionGroup>, AppError> {
    let rows = sqlx::query_as::<_, (String, String, i64)>(
        "SELECT plan, status, COUNT(*) FROM subscriptions GROUP BY plan, status",
    )
    .fetch_all(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(rows
        .into_iter()
        .map(|(plan, status, count)| SubscriptionGroup {
            plan,
            status,
            count,
        })
        .collect())
}

async fn fetch_essay_status_counts(
    mut tx: ReadTx,
) -> Result<Vec<(EssayStatus, i64)>, AppError> {
    let rows = sqlx::query_as::<_, (EssayStatus, i64)>(
        "SELECT status, COUNT(*) FROM essays GROUP BY status",
    )
    .fetch_all(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(rows)
}

async fn fetch_application_status_counts(
    mut tx: ReadTx,
) -> Result<Vec<(ApplicationStatus, i64)>, AppError> {
    let rows = sqlx::query_as::<_, (ApplicationStatus, i64)>(
        "SELECT status, COUNT(*) FROM applications GROUP BY status",
    )
    .fetch_all(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(rows)
}

async fn fetch_cv_stats(mut tx: ReadTx, window: TimeWindow) -> Result<CvStats, AppError> {
    let row = sqlx::query_as::<_, CvStats>(
        r#"
        SELECT
            COUNT(*)                                         AS total,
            COUNT(*) FILTER (WHERE is_complete)              AS complete,
            COUNT(*) FILTER (WHERE created_at >= $1)         AS created_last_30_days
        FROM cvs
        "#,
    )
    .bind(window.thirty_days_ago)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(row)
}

async fn fetch_financial_stats(
    mut tx: ReadTx,
    window: TimeWindow,
) -> Result<FinancialStats, AppError> {
    let row = sqlx::query_as::<_, FinancialStats>(
        r#"
        SELECT
            COALESCE(SUM(amount) FILTER (WHERE status = $2), 0)::float8                     AS total_revenue,
            COALESCE(SUM(amount) FILTER (WHERE status = $2 AND created_at >= $1), 0)::float8 AS revenue_last_30_days,
            COUNT(*) FILTER (WHERE status = $2)                                              AS successful_payments,
            (SELECT COALESCE(SUM(amount), 0)::float8 FROM subscriptions WHERE status = $3)   AS active_subscription_value,
            (SELECT COALESCE(SUM(amount), 0)::float8 FROM scholarships WHERE is_active)      AS total_scholarship_funding
        FROM payments
        "#,
    )
    .bind(window.thirty_days_ago)
    .bind(PAYMENT_SUCCEEDED)
    .bind(ACTIVE)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(row)
}

async fn fetch_personality_counts(mut tx: ReadTx) -> Result<PersonalityRow, AppError> {
    let row = sqlx::query_as::<_, PersonalityRow>(
        r#"
        SELECT
            COUNT(*)                              AS total_profiles,
            COUNT(*) FILTER (WHERE is_completed)  AS completed_profiles
        FROM personality_profiles
        "#,
    )
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(row)
}

// -- Group 3: lists --

/// Active events starting within the next seven days, soonest first.
async fn fetch_upcoming_events(
    mut tx: ReadTx,
    window: TimeWindow,
) -> Result<Vec<UpcomingEvent>, AppError> {
    let rows = sqlx::query_as::<_, UpcomingEvent>(
        r#"
        SELECT id, title, event_type, start_date, end_date, status
        FROM calendar_events
        WHERE start_date >= $1 AND start_date <= $2 AND status = $3
        ORDER BY start_date ASC
        LIMIT $4
        "#,
    )
    .bind(window.now)
    .bind(window.seven_days_from_now)
    .bind(ACTIVE)
    .bind(LIST_LIMIT)
    .fetch_all(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(rows)
}

async fn fetch_recent_applications(
    mut tx: ReadTx,
) -> Result<Vec<ApplicationSummary>, AppError> {
    let rows = sqlx::query_as::<_, ApplicationSummary>(
        r#"
        SELECT a.id, a.user_id, u.full_name AS student_name, a.university_id,
               un.name AS university_name, p.program_name, a.status, a.deadline, a.created_at
        FROM applications a
        INNER JOIN users u ON u.id = a.user_id
        INNER JOIN universities un ON un.id = a.university_id
        LEFT JOIN programs p ON p.id = a.program_id
        ORDER BY a.created_at DESC
        LIMIT $1
        "#,
    )
    .bind(LIST_LIMIT)
    .fetch_all(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(rows)
}

/// Active universities with the most applications.
async fn fetch_top_universities(mut tx: ReadTx) -> Result<Vec<TopUniversity>, AppError> {
    let rows = sqlx::query_as::<_, TopUniversity>(
        r#"
        SELECT un.id, un.name, un.country, un.is_active, COUNT(a.id) AS application_count
        FROM universities un
        LEFT JOIN applications a ON a.university_id = un.id
        WHERE un.is_active
        GROUP BY un.id, un.name, un.country, un.is_active
        ORDER BY application_count DESC, un.name ASC
        LIMIT $1
        "#,
    )
    .bind(LIST_LIMIT)
    .fetch_all(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(rows)
}
