//! Database helpers for audit records.
//!
//! One `audits` table holds all three kinds; inputs and computed reports
//! are stored as JSONB alongside the typed kind column. Every query is
//! owner-scoped so one user's audits are invisible to another.

use super::AuditKind;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::{Instrument, info_span};
use uuid::Uuid;

/// Upper bound on list results, matching the frontend page size.
const LIST_LIMIT: i64 = 50;

#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: AuditKind,
    /// Facility, organization or building name depending on kind.
    pub name: String,
    pub audit_period: String,
    pub input: Value,
    pub report: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn record_from_row(row: &PgRow, kind: AuditKind) -> AuditRecord {
    AuditRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        kind,
        name: row.get("name"),
        audit_period: row.get("audit_period"),
        input: row.get("input"),
        report: row.get("report"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const AUDIT_COLUMNS: &str = "id, user_id, name, audit_period, input, report, created_at, updated_at";

/// Insert a computed audit and return the stored record.
///
/// # Errors
/// Returns an error on database failure.
pub async fn insert_audit(
    pool: &PgPool,
    user_id: Uuid,
    kind: AuditKind,
    name: &str,
    audit_period: &str,
    input: &Value,
    report: &Value,
) -> Result<AuditRecord> {
    let query = &format!(
        r"
        INSERT INTO audits
            (user_id, kind, name, audit_period, input, report)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {AUDIT_COLUMNS}
    "
    );
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .bind(kind.as_str())
        .bind(name)
        .bind(audit_period)
        .bind(input)
        .bind(report)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to insert audit")?;
    Ok(record_from_row(&row, kind))
}

/// Fetch one audit, scoped to its owner.
///
/// # Errors
/// Returns an error on database failure.
pub async fn find_audit(
    pool: &PgPool,
    kind: AuditKind,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<AuditRecord>> {
    let query = &format!(
        "SELECT {AUDIT_COLUMNS} FROM audits WHERE id = $1 AND user_id = $2 AND kind = $3"
    );
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(query)
        .bind(id)
        .bind(user_id)
        .bind(kind.as_str())
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to find audit")?;
    Ok(row.map(|row| record_from_row(&row, kind)))
}

/// List a user's audits of one kind, newest first.
///
/// # Errors
/// Returns an error on database failure.
pub async fn list_audits(pool: &PgPool, kind: AuditKind, user_id: Uuid) -> Result<Vec<AuditRecord>> {
    let query = &format!(
        r"
        SELECT {AUDIT_COLUMNS} FROM audits
        WHERE user_id = $1 AND kind = $2
        ORDER BY created_at DESC
        LIMIT $3
    "
    );
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let rows = sqlx::query(query)
        .bind(user_id)
        .bind(kind.as_str())
        .bind(LIST_LIMIT)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list audits")?;
    Ok(rows.iter().map(|row| record_from_row(row, kind)).collect())
}

/// Replace an audit's input and recomputed report, scoped to its owner.
///
/// # Errors
/// Returns an error on database failure.
pub async fn update_audit(
    pool: &PgPool,
    kind: AuditKind,
    id: Uuid,
    user_id: Uuid,
    input: &Value,
    report: &Value,
) -> Result<Option<AuditRecord>> {
    let query = &format!(
        r"
        UPDATE audits
        SET input = $4, report = $5, updated_at = NOW()
        WHERE id = $1 AND user_id = $2 AND kind = $3
        RETURNING {AUDIT_COLUMNS}
    "
    );
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query.as_str()
    );
    let row = sqlx::query(query)
        .bind(id)
        .bind(user_id)
        .bind(kind.as_str())
        .bind(input)
        .bind(report)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to update audit")?;
    Ok(row.map(|row| record_from_row(&row, kind)))
}

/// Delete an audit, scoped to its owner. Returns false when nothing matched.
///
/// # Errors
/// Returns an error on database failure.
pub async fn delete_audit(pool: &PgPool, kind: AuditKind, id: Uuid, user_id: Uuid) -> Result<bool> {
    let query = "DELETE FROM audits WHERE id = $1 AND user_id = $2 AND kind = $3";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(id)
        .bind(user_id)
        .bind(kind.as_str())
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete audit")?;
    Ok(result.rows_affected() == 1)
}
