//! Student management: users holding the STUDENT role.

use sqlx::PgPool;

use crate::db;
use crate::errors::{conflict_on_unique, AppError};
use crate::models::pagination::{PagedResult, Pagination, WhereClause};
use crate::models::student::{CreateStudent, Student, StudentFilters, UpdateStudent};

const STUDENT_COLUMNS: &str = r#"
    u.id, u.email, u.full_name, u.country, u.graduation_year,
    (SELECT COUNT(*) FROM applications a WHERE a.user_id = u.id) AS application_count,
    (SELECT COUNT(*) FROM essays e WHERE e.user_id = u.id) AS essay_count,
    u.created_at, u.updated_at
"#;

/// List students with filters, sorting and pagination.
pub async fn list(
    pool: &PgPool,
    filters: &StudentFilters,
    pagination: &Pagination,
) -> Result<PagedResult<Student>, AppError> {
    let mut clause = WhereClause::default();
    clause.push_static("u.role = 'STUDENT'");
    if filters.search.is_some() {
        clause.push("(u.full_name ILIKE $? OR u.email ILIKE $?)");
    }
    if filters.country.is_some() {
        clause.push("u.country = $?");
    }
    if filters.graduation_year.is_some() {
        clause.push("u.graduation_year = $?");
    }
    let where_clause = clause.to_sql();

    let count_sql = format!("SELECT COUNT(*) FROM users u {where_clause}");
    let data_sql = format!(
        "SELECT {STUDENT_COLUMNS} FROM users u {where_clause} \
         ORDER BY {} {}, u.id LIMIT {} OFFSET {}",
        filters.sort_by.column(),
        filters.order.as_sql(),
        pagination.limit(),
        pagination.offset()
    );

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    let mut data_query = sqlx::query_as::<_, Student>(&data_sql);

    macro_rules! bind_both {
        ($val:expr) => {
            count_query = count_query.bind($val);
            data_query = data_query.bind($val);
        };
    }

    if let Some(ref search) = filters.search {
        let pattern = format!("%{search}%");
        bind_both!(pattern.clone());
    }
    if let Some(ref country) = filters.country {
        bind_both!(country);
    }
    if let Some(year) = filters.graduation_year {
        bind_both!(year);
    }

    let total = count_query.fetch_one(pool).await?;
    let items = data_query.fetch_all(pool).await?;

    Ok(PagedResult::new(items, total, pagination))
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Student, AppError> {
    let sql = format!("SELECT {STUDENT_COLUMNS} FROM users u WHERE u.id = $1 AND u.role = 'STUDENT'");
    sqlx::query_as::<_, Student>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Student '{id}' not found")))
}

pub async fn create(pool: &PgPool, input: &CreateStudent) -> Result<Student, AppError> {
    let id = db::new_id();
    sqlx::query(
        r#"
        INSERT INTO users (id, email, full_name, role, country, graduation_year)
        VALUES ($1, $2, $3, 'STUDENT', $4, $5)
        "#,
    )
    .bind(&id)
    .bind(input.email.trim().to_lowercase())
    .bind(input.full_name.trim())
    .bind(&input.country)
    .bind(input.graduation_year)
    .execute(pool)
    .await
    .map_err(|e| conflict_on_unique(e, || format!("Email '{}' is already registered", input.email)))?;

    tracing::info!(student_id = %id, "Student created");
    find_by_id(pool, &id).await
}

pub async fn update(pool: &PgPool, id: &str, input: &UpdateStudent) -> Result<Student, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE users SET
            email = COALESCE($2, email),
            full_name = COALESCE($3, full_name),
            country = COALESCE($4, country),
            graduation_year = COALESCE($5, graduation_year),
            updated_at = NOW()
        WHERE id = $1 AND role = 'STUDENT'
        "#,
    )
    .bind(id)
    .bind(input.email.as_deref().map(|e| e.trim().to_lowercase()))
    .bind(input.full_name.as_deref().map(str::trim))
    .bind(&input.country)
    .bind(input.graduation_year)
    .execute(pool)
    .await
    .map_err(|e| conflict_on_unique(e, || "Email is already registered".to_string()))?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Student '{id}' not found")));
    }
    find_by_id(pool, id).await
}

/// Remove a student and, through cascades, everything they own.
pub async fn delete(pool: &PgPool, id: &str) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1 AND role = 'STUDENT'")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Student '{id}' not found")));
    }
    tracing::info!(student_id = %id, "Student deleted");
    Ok(())
}
