//! College application tracking: CRUD and status transitions.

use sqlx::PgPool;

use crate::db;
use crate::errors::{conflict_on_unique, AppError};
use crate::models::application::{
    Application, ApplicationFilters, ApplicationStatus, ApplicationSummary, CreateApplication,
    UpdateApplication,
};
use crate::models::pagination::{PagedResult, Pagination, WhereClause};

/// List applications with filters and pagination.
pub async fn list(
    pool: &PgPool,
    filters: &ApplicationFilters,
    pagination: &Pagination,
) -> Result<PagedResult<ApplicationSummary>, AppError> {
    let mut clause = WhereClause::default();
    if filters.status.is_some() {
        clause.push("a.status = $?");
    }
    if filters.user_id.is_some() {
        clause.push("a.user_id = $?");
    }
    if filters.university_id.is_some() {
        clause.push("a.university_id = $?");
    }
    if filters.program_id.is_some() {
        clause.push("a.program_id = $?");
    }
    let where_clause = clause.to_sql();

    let count_sql = format!("SELECT COUNT(*) FROM applications a {where_clause}");
    let data_sql = format!(
        "SELECT a.id, a.user_id, s.full_name AS student_name, a.university_id, \
                un.name AS university_name, p.program_name, a.status, a.deadline, a.created_at \
         FROM applications a \
         INNER JOIN users s ON s.id = a.user_id \
         INNER JOIN universities un ON un.id = a.university_id \
         LEFT JOIN programs p ON p.id = a.program_id \
         {where_clause} ORDER BY {} {} NULLS LAST, a.id LIMIT {} OFFSET {}",
        filters.sort_by.column(),
        filters.order.as_sql(),
        pagination.limit(),
        pagination.offset()
    );

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    let mut data_query = sqlx::query_as::<_, ApplicationSummary>(&data_sql);

    macro_rules! bind_both {
        ($val:expr) => {
            count_query = count_query.bind($val);
            data_query = data_query.bind($val);
        };
    }

    if let Some(status) = filters.status {
        bind_both!(status);
    }
    if let Some(ref user_id) = filters.user_id {
        bind_both!(user_id);
    }
    if let Some(ref university_id) = filters.university_id {
        bind_both!(university_id);
    }
    if let Some(ref program_id) = filters.program_id {
        bind_both!(program_id);
    }

    let total = count_query.fetch_one(pool).await?;
    let items = data_query.fetch_all(pool).await?;

    Ok(PagedResult::new(items, total, pagination))
}

/// Find application by ID.
pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Application, AppError> {
    sqlx::query_as::<_, Application>("SELECT * FROM applications WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application '{id}' not found")))
}

/// Create an application. Creating directly as SUBMITTED stamps `submitted_at`.
pub async fn create(pool: &PgPool, input: &CreateApplication) -> Result<Application, AppError> {
    let status = input.status.unwrap_or(ApplicationStatus::Draft);

    let app = sqlx::query_as::<_, Application>(
        r#"
        INSERT INTO applications (id, user_id, university_id, program_id, status, notes, deadline,
            submitted_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, CASE WHEN $8 THEN NOW() END)
        RETURNING *
        "#,
    )
    .bind(db::new_id())
    .bind(&input.user_id)
    .bind(&input.university_id)
    .bind(&input.program_id)
    .bind(status)
    .bind(&input.notes)
    .bind(input.deadline)
    .bind(status == ApplicationStatus::Submitted)
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_unique(e, || "Application already exists".to_string()))?;

    tracing::info!(application_id = %app.id, status = ?app.status, "Application created");
    Ok(app)
}

/// Update an application by ID.
///
/// `submitted_at` is stamped only the first time the status becomes SUBMITTED.
pub async fn update(
    pool: &PgPool,
    id: &str,
    input: &UpdateApplication,
) -> Result<Application, AppError> {
    let entering_submitted = input.status == Some(ApplicationStatus::Submitted);

    let app = sqlx::query_as::<_, Application>(
        r#"
        UPDATE applications SET
            program_id = COALESCE($2, program_id),
            status = COALESCE($3, status),
            notes = COALESCE($4, notes),
            deadline = COALESCE($5, deadline),
            submitted_at = CASE
                WHEN $6 AND submitted_at IS NULL THEN NOW()
                ELSE submitted_at
            END,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&input.program_id)
    .bind(input.status)
    .bind(&input.notes)
    .bind(input.deadline)
    .bind(entering_submitted)
    .fetch_optional(pool)
    .await
    .map_err(|e| conflict_on_unique(e, || "Application conflicts with an existing one".to_string()))?
    .ok_or_else(|| AppError::NotFound(format!("Application '{id}' not found")))?;

    Ok(app)
}

/// Delete an application by ID.
pub async fn delete(pool: &PgPool, id: &str) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM applications WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Application '{id}' not found")));
    }
    Ok(())
}
