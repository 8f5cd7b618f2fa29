//! Seed script for development. Populates a fresh database with sample data.
//!
//! Usage: `cargo run --bin seed`
//!
//! Requires `DATABASE_URL` and `JWT_SECRET` environment variables (reads .env).
//! Prints an admin bearer token for calling the API locally.

use anyhow::Context;
use chrono::{Duration, Utc};
use sqlx::PgPool;

use admitly::db::new_id;
use admitly::models::essay::word_count;
use admitly::services::auth::{issue_token, AdminRole};

const TOKEN_TTL_SECS: i64 = 7 * 24 * 3600;

const UNIVERSITIES: &[(&str, &str, &str)] = &[
    ("Northbridge University", "United Kingdom", "Manchester"),
    ("Lakeshore Institute of Technology", "Canada", "Toronto"),
    ("Universität Rheinfeld", "Germany", "Cologne"),
    ("Pacific Coast College", "United States", "San Diego"),
];

const PROGRAMS: &[(&str, &str, &str)] = &[
    ("Intro to AI!!", "BSc", "Computer Science"),
    ("M.Sc. Data Science", "MSc", "Data Science"),
    ("International Business", "BBA", "Business"),
];

const STUDENTS: &[(&str, &str, &str, i32)] = &[
    ("amara.okafor@example.com", "Amara Okafor", "Nigeria", 2026),
    ("liu.wei@example.com", "Liu Wei", "China", 2025),
    ("sofia.rossi@example.com", "Sofia Rossi", "Italy", 2026),
    ("arjun.mehta@example.com", "Arjun Mehta", "India", 2027),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let db_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    // Run migrations first
    admitly::db::migrate(&pool).await?;

    println!("=== Admitly Seed Script ===");

    let already_seeded: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM universities)")
        .fetch_one(&pool)
        .await?;

    if already_seeded {
        println!("[skip] Database already has universities");
    } else {
        let universities = seed_universities(&pool).await?;
        let programs = seed_programs(&pool, &universities).await?;
        let students = seed_students(&pool).await?;
        seed_applications(&pool, &students, &universities, &programs).await?;
        seed_student_activity(&pool, &students).await?;
        seed_billing(&pool, &students).await?;
        seed_scholarships(&pool).await?;
        seed_calendar(&pool, &students).await?;
    }

    let token = issue_token("dev-admin@admitly.local", AdminRole::SuperAdmin, &jwt_secret, TOKEN_TTL_SECS)?;

    println!("\n=== Seed complete! ===");
    println!("Admin bearer token (valid 7 days):\n{token}");

    Ok(())
}

async fn seed_universities(pool: &PgPool) -> anyhow::Result<Vec<String>> {
    let mut ids = Vec::with_capacity(UNIVERSITIES.len());
    for (name, country, city) in UNIVERSITIES {
        let id = new_id();
        sqlx::query("INSERT INTO universities (id, name, country, city) VALUES ($1, $2, $3, $4)")
            .bind(&id)
            .bind(name)
            .bind(country)
            .bind(city)
            .execute(pool)
            .await?;
        ids.push(id);
    }
    println!("[done] Created {} universities", ids.len());
    Ok(ids)
}

async fn seed_programs(pool: &PgPool, universities: &[String]) -> anyhow::Result<Vec<String>> {
    let mut ids = Vec::new();
    for (u_idx, university_id) in universities.iter().enumerate() {
        for (p_idx, (name, level, field)) in PROGRAMS.iter().enumerate() {
            let id = new_id();
            sqlx::query(
                "INSERT INTO programs (id, university_id, program_name, degree_level, field_of_study,
                    duration_months, tuition_fee)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(&id)
            .bind(university_id)
            .bind(name)
            .bind(level)
            .bind(field)
            .bind(if *level == "MSc" { 12 } else { 36 })
            .bind(9_000.0 + (u_idx * 1_500 + p_idx * 750) as f64)
            .execute(pool)
            .await?;
            ids.push(id);
        }
    }
    println!("[done] Created {} programs", ids.len());
    Ok(ids)
}

async fn seed_students(pool: &PgPool) -> anyhow::Result<Vec<String>> {
    let mut ids = Vec::with_capacity(STUDENTS.len());
    for (i, (email, name, country, year)) in STUDENTS.iter().enumerate() {
        let id = new_id();
        sqlx::query(
            "INSERT INTO users (id, email, full_name, role, country, graduation_year, created_at)
             VALUES ($1, $2, $3, 'STUDENT', $4, $5, $6)",
        )
        .bind(&id)
        .bind(email)
        .bind(name)
        .bind(country)
        .bind(year)
        .bind(Utc::now() - Duration::days(i as i64 * 9))
        .execute(pool)
        .await?;
        ids.push(id);
    }

    sqlx::query(
        "INSERT INTO users (id, email, full_name, role) VALUES ($1, 'counselor@admitly.local', 'Dana Counselor', 'COUNSELOR')",
    )
    .bind(new_id())
    .execute(pool)
    .await?;

    println!("[done] Created {} students and 1 counselor", ids.len());
    Ok(ids)
}

async fn seed_applications(
    pool: &PgPool,
    students: &[String],
    universities: &[String],
    programs: &[String],
) -> anyhow::Result<()> {
    let statuses = [
        "DRAFT",
        "SUBMITTED",
        "UNDER_REVIEW",
        "ACCEPTED",
        "REJECTED",
        "WAITLISTED",
    ];
    let mut created = 0;
    for (s_idx, student_id) in students.iter().enumerate() {
        for offset in 0..3 {
            let u_idx = (s_idx + offset) % universities.len();
            let program_id = &programs[u_idx * PROGRAMS.len() + offset % PROGRAMS.len()];
            let status = statuses[(s_idx * 3 + offset) % statuses.len()];
            let submitted = status != "DRAFT";
            sqlx::query(
                "INSERT INTO applications (id, user_id, university_id, program_id, status, deadline,
                    submitted_at)
                 VALUES ($1, $2, $3, $4, $5::application_status, $6, CASE WHEN $7 THEN NOW() END)",
            )
            .bind(new_id())
            .bind(student_id)
            .bind(&universities[u_idx])
            .bind(program_id)
            .bind(status)
            .bind(Utc::now() + Duration::days(30 + offset as i64 * 15))
            .bind(submitted)
            .execute(pool)
            .await?;
            created += 1;
        }
    }
    println!("[done] Created {created} applications");
    Ok(())
}

async fn seed_student_activity(pool: &PgPool, students: &[String]) -> anyhow::Result<()> {
    let essay_body = "Growing up between two languages taught me that every problem has more \
                      than one framing, and that curiosity is a discipline.";
    for (i, student_id) in students.iter().enumerate() {
        let status = ["DRAFT", "IN_REVIEW", "REVIEWED", "FINAL"][i % 4];
        sqlx::query(
            "INSERT INTO essays (id, user_id, title, prompt, content, word_count, status)
             VALUES ($1, $2, 'Personal statement', 'Why this field?', $3, $4, $5::essay_status)",
        )
        .bind(new_id())
        .bind(student_id)
        .bind(essay_body)
        .bind(word_count(essay_body))
        .bind(status)
        .execute(pool)
        .await?;

        sqlx::query("INSERT INTO cvs (id, user_id, title, is_complete) VALUES ($1, $2, 'Main CV', $3)")
            .bind(new_id())
            .bind(student_id)
            .bind(i % 2 == 0)
            .execute(pool)
            .await?;

        sqlx::query(
            "INSERT INTO personality_profiles (id, user_id, is_completed) VALUES ($1, $2, $3)",
        )
        .bind(new_id())
        .bind(student_id)
        .bind(i != 1)
        .execute(pool)
        .await?;
    }
    println!("[done] Created essays, CVs and personality profiles");
    Ok(())
}

async fn seed_billing(pool: &PgPool, students: &[String]) -> anyhow::Result<()> {
    let plans = [("premium", 29.0), ("basic", 9.0)];
    for (i, student_id) in students.iter().enumerate() {
        let (plan, amount) = plans[i % plans.len()];
        let status = if i == students.len() - 1 { "cancelled" } else { "active" };
        let subscription_id = new_id();
        sqlx::query(
            "INSERT INTO subscriptions (id, user_id, plan, status, amount) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&subscription_id)
        .bind(student_id)
        .bind(plan)
        .bind(status)
        .bind(amount)
        .execute(pool)
        .await?;

        for (payment_status, days_ago) in [("succeeded", 3i64), ("succeeded", 40), ("failed", 1)] {
            sqlx::query(
                "INSERT INTO payments (id, user_id, subscription_id, amount, status, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(new_id())
            .bind(student_id)
            .bind(&subscription_id)
            .bind(amount)
            .bind(payment_status)
            .bind(Utc::now() - Duration::days(days_ago))
            .execute(pool)
            .await?;
        }
    }
    println!("[done] Created subscriptions and payments");
    Ok(())
}

async fn seed_scholarships(pool: &PgPool) -> anyhow::Result<()> {
    let rows = [
        ("Global Merit Award", "Admitly Foundation", 5_000.0, 45),
        ("Women in STEM Grant", "Tech Futures Trust", 3_000.0, 20),
        ("First Generation Scholarship", "Open Doors Fund", 2_500.0, -10),
    ];
    for (name, provider, amount, days) in rows {
        sqlx::query(
            "INSERT INTO scholarships (id, name, provider, amount, deadline, is_active)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(new_id())
        .bind(name)
        .bind(provider)
        .bind(amount)
        .bind(Utc::now() + Duration::days(days))
        .bind(days > 0)
        .execute(pool)
        .await?;
    }
    println!("[done] Created {} scholarships", rows.len());
    Ok(())
}

async fn seed_calendar(pool: &PgPool, students: &[String]) -> anyhow::Result<()> {
    for (i, student_id) in students.iter().enumerate() {
        sqlx::query(
            "INSERT INTO calendar_events (id, user_id, title, event_type, start_date)
             VALUES ($1, $2, $3, 'deadline', $4)",
        )
        .bind(new_id())
        .bind(student_id)
        .bind(format!("Application deadline #{}", i + 1))
        .bind(Utc::now() + Duration::days(2 + i as i64 * 3))
        .execute(pool)
        .await?;
    }
    println!("[done] Created calendar events");
    Ok(())
}
