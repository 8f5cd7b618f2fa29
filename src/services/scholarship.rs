use sqlx::PgPool;

use crate::db;
use crate::errors::{conflict_on_unique, AppError};
use crate::models::pagination::{PagedResult, Pagination, WhereClause};
use crate::models::scholarship::{
    CreateScholarship, Scholarship, ScholarshipFilters, UpdateScholarship,
};

pub async fn list(
    pool: &PgPool,
    filters: &ScholarshipFilters,
    pagination: &Pagination,
) -> Result<PagedResult<Scholarship>, AppError> {
    let mut clause = WhereClause::default();
    if filters.is_active.is_some() {
        clause.push("is_active = $?");
    }
    if filters.search.is_some() {
        clause.push("(name ILIKE $? OR provider ILIKE $?)");
    }
    if filters.deadline_before.is_some() {
        clause.push("deadline < $?");
    }
    let where_clause = clause.to_sql();

    let count_sql = format!("SELECT COUNT(*) FROM scholarships {where_clause}");
    let data_sql = format!(
        "SELECT * FROM scholarships {where_clause} \
         ORDER BY {} {} NULLS LAST, id LIMIT {} OFFSET {}",
        filters.sort_by.column(),
        filters.order.as_sql(),
        pagination.limit(),
        pagination.offset()
    );

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    let mut data_query = sqlx::query_as::<_, Scholarship>(&data_sql);

    macro_rules! bind_both {
        ($val:expr) => {
            count_query = count_query.bind($val);
            data_query = data_query.bind($val);
        };
    }

    if let Some(active) = filters.is_active {
        bind_both!(active);
    }
    if let Some(ref search) = filters.search {
        let pattern = format!("%{search}%");
        bind_both!(pattern.clone());
    }
    if let Some(before) = filters.deadline_before {
        bind_both!(before);
    }

    let total = count_query.fetch_one(pool).await?;
    let items = data_query.fetch_all(pool).await?;

    Ok(PagedResult::new(items, total, pagination))
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Scholarship, AppError> {
    sqlx::query_as::<_, Scholarship>("SELECT * FROM scholarships WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Scholarship '{id}' not found")))
}

pub async fn create(pool: &PgPool, input: &CreateScholarship) -> Result<Scholarship, AppError> {
    let scholarship = sqlx::query_as::<_, Scholarship>(
        r#"
        INSERT INTO scholarships (id, name, provider, description, amount, currency, deadline,
            eligibility, is_active)
        VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'USD'), $7, $8, COALESCE($9, TRUE))
        RETURNING *
        "#,
    )
    .bind(db::new_id())
    .bind(input.name.trim())
    .bind(input.provider.trim())
    .bind(&input.description)
    .bind(input.amount)
    .bind(input.currency.as_deref().map(str::to_uppercase))
    .bind(input.deadline)
    .bind(&input.eligibility)
    .bind(input.is_active)
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_unique(e, || format!("Scholarship '{}' already exists", input.name)))?;

    Ok(scholarship)
}

pub async fn update(
    pool: &PgPool,
    id: &str,
    input: &UpdateScholarship,
) -> Result<Scholarship, AppError> {
    sqlx::query_as::<_, Scholarship>(
        r#"
        UPDATE scholarships SET
            name = COALESCE($2, name),
            provider = COALESCE($3, provider),
            description = COALESCE($4, description),
            amount = COALESCE($5, amount),
            currency = COALESCE($6, currency),
            deadline = COALESCE($7, deadline),
            eligibility = COALESCE($8, eligibility),
            is_active = COALESCE($9, is_active),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(input.name.as_deref().map(str::trim))
    .bind(input.provider.as_deref().map(str::trim))
    .bind(&input.description)
    .bind(input.amount)
    .bind(input.currency.as_deref().map(str::to_uppercase))
    .bind(input.deadline)
    .bind(&input.eligibility)
    .bind(input.is_active)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Scholarship '{id}' not found")))
}

pub async fn delete(pool: &PgPool, id: &str) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM scholarships WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Scholarship '{id}' not found")));
    }
    Ok(())
}
