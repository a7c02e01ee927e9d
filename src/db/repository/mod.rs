//! Repository layer — entity-scoped database operations.
//!
//! One sub-module per table. All public functions are re-exported here.

mod appointment;
mod blog_post;
mod booking;
mod doctor;
mod health_record;
mod lab;
mod lab_test;
mod onboarding;

#[cfg(test)]
pub(crate) mod fixtures;

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::ToSql;
use rusqlite::{Connection, Params};
use uuid::Uuid;

use super::{DatabaseError, DATETIME_FORMAT};
use crate::models::Page;

pub use appointment::*;
pub use blog_post::*;
pub use booking::*;
pub use doctor::*;
pub use health_record::*;
pub use lab::*;
pub use lab_test::*;
pub use onboarding::*;

// ═══════════════════════════════════════════════════════════
// Column codecs
// ═══════════════════════════════════════════════════════════

pub(crate) fn format_datetime(value: &NaiveDateTime) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

pub(crate) fn parse_uuid(table: &'static str, raw: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(raw).map_err(|e| DatabaseError::CorruptRow {
        table,
        reason: format!("bad id {raw:?}: {e}"),
    })
}

fn parse_opt_uuid(table: &'static str, raw: Option<String>) -> Result<Option<Uuid>, DatabaseError> {
    raw.map(|r| parse_uuid(table, &r)).transpose()
}

fn parse_datetime(table: &'static str, raw: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT).map_err(|e| DatabaseError::CorruptRow {
        table,
        reason: format!("bad datetime {raw:?}: {e}"),
    })
}

fn parse_opt_datetime(
    table: &'static str,
    raw: Option<String>,
) -> Result<Option<NaiveDateTime>, DatabaseError> {
    raw.map(|r| parse_datetime(table, &r)).transpose()
}

fn parse_date(table: &'static str, raw: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| DatabaseError::CorruptRow {
        table,
        reason: format!("bad date {raw:?}: {e}"),
    })
}

// ═══════════════════════════════════════════════════════════
// Filtered SELECT builder
// ═══════════════════════════════════════════════════════════

/// Accumulates `AND` clauses with numbered parameters onto a base query.
pub(crate) struct FilterQuery {
    sql: String,
    params: Vec<Box<dyn ToSql>>,
}

impl FilterQuery {
    /// `base` must end in a `WHERE` clause (e.g. `WHERE 1=1`).
    pub(crate) fn new(base: &str) -> Self {
        Self {
            sql: base.to_string(),
            params: Vec::new(),
        }
    }

    /// Append `AND <clause>`, where `{}` in `clause` is replaced by the parameter placeholder.
    pub(crate) fn and(&mut self, clause: &str, value: impl ToSql + 'static) -> &mut Self {
        self.params.push(Box::new(value));
        let placeholder = format!("?{}", self.params.len());
        self.sql.push_str(" AND ");
        self.sql.push_str(&clause.replace("{}", &placeholder));
        self
    }

    pub(crate) fn and_opt<T: ToSql + 'static>(&mut self, clause: &str, value: Option<T>) -> &mut Self {
        if let Some(v) = value {
            self.and(clause, v);
        }
        self
    }

    /// Finish with ordering and LIMIT/OFFSET.
    pub(crate) fn finish(mut self, order_by: &str, page: Page) -> (String, Vec<Box<dyn ToSql>>) {
        self.sql.push_str(" ORDER BY ");
        self.sql.push_str(order_by);
        self.sql
            .push_str(&format!(" LIMIT {} OFFSET {}", page.limit, page.offset));
        (self.sql, self.params)
    }
}

/// Substring pattern for `LIKE ... ESCAPE '\'`.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Run a `SELECT key, COUNT(*) ... GROUP BY key` query, seeding every expected
/// key with zero so absent groups still appear.
pub(crate) fn count_grouped<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    keys: impl IntoIterator<Item = &'static str>,
) -> Result<BTreeMap<String, i64>, DatabaseError> {
    let mut counts: BTreeMap<String, i64> = keys.into_iter().map(|k| (k.to_string(), 0)).collect();
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
    for row in rows {
        let (key, count) = row?;
        counts.insert(key, count);
    }
    Ok(counts)
}

pub(crate) fn param_refs(params: &[Box<dyn ToSql>]) -> Vec<&dyn ToSql> {
    params.iter().map(|p| p.as_ref()).collect()
}
