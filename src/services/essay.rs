//! Essay management. Word counts are derived from the body on every write.

use sqlx::PgPool;

use crate::db;
use crate::errors::{conflict_on_unique, AppError};
use crate::models::essay::{self, CreateEssay, Essay, EssayFilters, EssayStatus, EssaySummary, UpdateEssay};
use crate::models::pagination::{PagedResult, Pagination, WhereClause};

pub async fn list(
    pool: &PgPool,
    filters: &EssayFilters,
    pagination: &Pagination,
) -> Result<PagedResult<EssaySummary>, AppError> {
    let mut clause = WhereClause::default();
    if filters.status.is_some() {
        clause.push("e.status = $?");
    }
    if filters.user_id.is_some() {
        clause.push("e.user_id = $?");
    }
    if filters.search.is_some() {
        clause.push("e.title ILIKE $?");
    }
    let where_clause = clause.to_sql();

    let count_sql = format!("SELECT COUNT(*) FROM essays e {where_clause}");
    let data_sql = format!(
        "SELECT e.id, e.user_id, u.full_name AS student_name, e.title, e.word_count, e.status, \
                e.created_at, e.updated_at \
         FROM essays e INNER JOIN users u ON u.id = e.user_id \
         {where_clause} ORDER BY {} {}, e.id LIMIT {} OFFSET {}",
        filters.sort_by.column(),
        filters.order.as_sql(),
        pagination.limit(),
        pagination.offset()
    );

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    let mut data_query = sqlx::query_as::<_, EssaySummary>(&data_sql);

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
    if let Some(ref search) = filters.search {
        let pattern = format!("%{search}%");
        bind_both!(pattern.clone());
    }

    let total = count_query.fetch_one(pool).await?;
    let items = data_query.fetch_all(pool).await?;

    Ok(PagedResult::new(items, total, pagination))
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Essay, AppError> {
    sqlx::query_as::<_, Essay>("SELECT * FROM essays WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Essay '{id}' not found")))
}

pub async fn create(pool: &PgPool, input: &CreateEssay) -> Result<Essay, AppError> {
    let created = sqlx::query_as::<_, Essay>(
        r#"
        INSERT INTO essays (id, user_id, application_id, title, prompt, content, word_count, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(db::new_id())
    .bind(&input.user_id)
    .bind(&input.application_id)
    .bind(input.title.trim())
    .bind(&input.prompt)
    .bind(&input.content)
    .bind(essay::word_count(&input.content))
    .bind(input.status.unwrap_or(EssayStatus::Draft))
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_unique(e, || "Essay already exists".to_string()))?;

    Ok(created)
}

pub async fn update(pool: &PgPool, id: &str, input: &UpdateEssay) -> Result<Essay, AppError> {
    let new_count = input.content.as_deref().map(essay::word_count);

    sqlx::query_as::<_, Essay>(
        r#"
        UPDATE essays SET
            title = COALESCE($2, title),
            prompt = COALESCE($3, prompt),
            content = COALESCE($4, content),
            word_count = COALESCE($5, word_count),
            status = COALESCE($6, status),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(input.title.as_deref().map(str::trim))
    .bind(&input.prompt)
    .bind(&input.content)
    .bind(new_count)
    .bind(input.status)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Essay '{id}' not found")))
}

pub async fn delete(pool: &PgPool, id: &str) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM essays WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Essay '{id}' not found")));
    }
    Ok(())
}
