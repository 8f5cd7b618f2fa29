//! Academic programs. Detail reads include the syllabus record.

use sqlx::PgPool;

use crate::db;
use crate::errors::{conflict_on_unique, AppError};
use crate::models::pagination::{PagedResult, Pagination, WhereClause};
use crate::models::program::{CreateProgram, Program, ProgramDetail, ProgramFilters, UpdateProgram};
use crate::services::syllabus;

const PROGRAM_SELECT: &str = r#"
    SELECT p.id, p.university_id, u.name AS university_name, p.program_name, p.degree_level,
           p.field_of_study, p.duration_months, p.tuition_fee, p.is_active, p.created_at,
           p.updated_at
    FROM programs p
    INNER JOIN universities u ON u.id = p.university_id
"#;

pub async fn list(
    pool: &PgPool,
    filters: &ProgramFilters,
    pagination: &Pagination,
) -> Result<PagedResult<Program>, AppError> {
    let mut clause = WhereClause::default();
    if filters.university_id.is_some() {
        clause.push("p.university_id = $?");
    }
    if filters.degree_level.is_some() {
        clause.push("p.degree_level = $?");
    }
    if filters.is_active.is_some() {
        clause.push("p.is_active = $?");
    }
    if filters.search.is_some() {
        clause.push("(p.program_name ILIKE $? OR p.field_of_study ILIKE $?)");
    }
    let where_clause = clause.to_sql();

    let count_sql = format!("SELECT COUNT(*) FROM programs p {where_clause}");
    let data_sql = format!(
        "{PROGRAM_SELECT} {where_clause} ORDER BY {} {} NULLS LAST, p.id LIMIT {} OFFSET {}",
        filters.sort_by.column(),
        filters.order.as_sql(),
        pagination.limit(),
        pagination.offset()
    );

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    let mut data_query = sqlx::query_as::<_, Program>(&data_sql);

    macro_rules! bind_both {
        ($val:expr) => {
            count_query = count_query.bind($val);
            data_query = data_query.bind($val);
        };
    }

    if let Some(ref university_id) = filters.university_id {
        bind_both!(university_id);
    }
    if let Some(ref level) = filters.degree_level {
        bind_both!(level);
    }
    if let Some(active) = filters.is_active {
        bind_both!(active);
    }
    if let Some(ref search) = filters.search {
        let pattern = format!("%{search}%");
        bind_both!(pattern.clone());
    }

    let total = count_query.fetch_one(pool).await?;
    let items = data_query.fetch_all(pool).await?;

    Ok(PagedResult::new(items, total, pagination))
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Program, AppError> {
    let sql = format!("{PROGRAM_SELECT} WHERE p.id = $1");
    sqlx::query_as::<_, Program>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Program '{id}' not found")))
}

/// Program plus its syllabus, if one has been uploaded.
pub async fn find_detail(pool: &PgPool, id: &str) -> Result<ProgramDetail, AppError> {
    let program = find_by_id(pool, id).await?;
    let syllabus = syllabus::find_by_program(pool, id).await?;
    Ok(ProgramDetail { program, syllabus })
}

pub async fn create(pool: &PgPool, input: &CreateProgram) -> Result<ProgramDetail, AppError> {
    let id = db::new_id();
    sqlx::query(
        r#"
        INSERT INTO programs (id, university_id, program_name, degree_level, field_of_study,
            duration_months, tuition_fee, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, TRUE))
        "#,
    )
    .bind(&id)
    .bind(&input.university_id)
    .bind(input.program_name.trim())
    .bind(input.degree_level.trim())
    .bind(&input.field_of_study)
    .bind(input.duration_months)
    .bind(input.tuition_fee)
    .bind(input.is_active)
    .execute(pool)
    .await
    .map_err(|e| conflict_on_unique(e, || format!("Program '{}' already exists", input.program_name)))?;

    tracing::info!(program_id = %id, university_id = %input.university_id, "Program created");
    find_detail(pool, &id).await
}

pub async fn update(pool: &PgPool, id: &str, input: &UpdateProgram) -> Result<ProgramDetail, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE programs SET
            program_name = COALESCE($2, program_name),
            degree_level = COALESCE($3, degree_level),
            field_of_study = COALESCE($4, field_of_study),
            duration_months = COALESCE($5, duration_months),
            tuition_fee = COALESCE($6, tuition_fee),
            is_active = COALESCE($7, is_active),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(input.program_name.as_deref().map(str::trim))
    .bind(input.degree_level.as_deref().map(str::trim))
    .bind(&input.field_of_study)
    .bind(input.duration_months)
    .bind(input.tuition_fee)
    .bind(input.is_active)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Program '{id}' not found")));
    }
    find_detail(pool, id).await
}

/// Deletes the program; its syllabus row cascades but the remote file stays.
pub async fn delete(pool: &PgPool, id: &str) -> Result<(), AppError> {
    let orphaned = syllabus::find_by_program(pool, id).await?;

    let result = sqlx::query("DELETE FROM programs WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Program '{id}' not found")));
    }

    if let Some(s) = orphaned {
        tracing::warn!(
            program_id = %id,
            file_url = %s.file_url,
            "Program deleted; syllabus file left on media host"
        );
    }
    Ok(())
}
