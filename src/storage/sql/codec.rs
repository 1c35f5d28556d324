//! Row decoding shared by all SQL backends.
//!
//! Money, dates and timestamps are selected as text (`CAST(.. AS TEXT)`) so
//! that every backend hands back the same representation and decimals stay
//! exact.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sea_query::{Alias, Expr, IntoColumnRef, SimpleExpr};
use sqlx::{ColumnIndex, Decode, Row, Type};

use crate::model::{
    LegacyBillableHour, LegacyCategory, LegacyCustomer, LegacyUser, RevenueLine,
};
use crate::storage::{Result, StorageError};

/// `CAST(col AS TEXT)`.
pub(crate) fn as_text<C: IntoColumnRef>(col: C) -> SimpleExpr {
    Expr::col(col).cast_as(Alias::new("TEXT"))
}

/// `CAST(col AS BIGINT)`, so legacy `INTEGER` keys decode as `i64` on every
/// backend.
pub(crate) fn as_bigint<C: IntoColumnRef>(col: C) -> SimpleExpr {
    Expr::col(col).cast_as(Alias::new("BIGINT"))
}

/// Typed column access over any sqlx row.
pub(crate) trait RowExt {
    fn int(&self, column: &'static str) -> Result<i64>;

    fn text(&self, column: &'static str) -> Result<String>;

    fn opt_text(&self, column: &'static str) -> Result<Option<String>>;

    fn decimal(&self, column: &'static str) -> Result<Decimal> {
        parse_decimal(column, &self.text(column)?)
    }

    fn timestamp(&self, column: &'static str) -> Result<DateTime<Utc>> {
        parse_timestamp(column, &self.text(column)?)
    }

    fn date(&self, column: &'static str) -> Result<NaiveDate> {
        parse_date(column, &self.text(column)?)
    }
}

impl<R> RowExt for R
where
    R: Row,
    &'static str: ColumnIndex<R>,
    for<'r> i64: Decode<'r, R::Database> + Type<R::Database>,
    for<'r> String: Decode<'r, R::Database> + Type<R::Database>,
{
    fn int(&self, column: &'static str) -> Result<i64> {
        Ok(self.try_get::<i64, _>(column)?)
    }

    fn text(&self, column: &'static str) -> Result<String> {
        Ok(self.try_get::<String, _>(column)?)
    }

    fn opt_text(&self, column: &'static str) -> Result<Option<String>> {
        Ok(self.try_get::<Option<String>, _>(column)?)
    }
}

pub(crate) fn parse_decimal(column: &'static str, raw: &str) -> Result<Decimal> {
    let trimmed = raw.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| StorageError::InvalidDecimal {
            column,
            value: raw.to_string(),
        })
}

/// Accepts RFC 3339, PostgreSQL `timestamptz` text, and naive timestamps
/// (read as UTC).
pub(crate) fn parse_timestamp(column: &'static str, raw: &str) -> Result<DateTime<Utc>> {
    let trimmed = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }

    Err(StorageError::InvalidTimestamp {
        column,
        value: raw.to_string(),
    })
}

pub(crate) fn parse_date(column: &'static str, raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    // Some backends render DATE columns with a time part.
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| StorageError::InvalidDate {
        column,
        value: raw.to_string(),
    })
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// =============================================================================
// Legacy row decoders
// =============================================================================

pub(crate) fn decode_user<R: RowExt>(row: &R) -> Result<LegacyUser> {
    Ok(LegacyUser {
        id: row.int("id")?,
        email: row.text("email")?,
        name: row.text("name")?,
    })
}

pub(crate) fn decode_customer<R: RowExt>(row: &R) -> Result<LegacyCustomer> {
    Ok(LegacyCustomer {
        id: row.int("id")?,
        name: row.text("name")?,
        email: row.text("email")?,
        address: row.opt_text("address")?,
        created_at: row.timestamp("created_at")?,
    })
}

pub(crate) fn decode_category<R: RowExt>(row: &R) -> Result<LegacyCategory> {
    Ok(LegacyCategory {
        id: row.int("id")?,
        name: row.text("name")?,
        description: row.opt_text("description")?,
        hourly_rate: row.decimal("hourly_rate")?,
    })
}

pub(crate) fn decode_billable_hour<R: RowExt>(row: &R) -> Result<LegacyBillableHour> {
    Ok(LegacyBillableHour {
        id: row.int("id")?,
        customer_id: row.int("customer_id")?,
        user_id: row.int("user_id")?,
        category_id: row.int("category_id")?,
        hours: row.decimal("hours")?,
        note: row.opt_text("note")?,
        date_logged: row.date("date_logged")?,
        created_at: row.timestamp("created_at")?,
    })
}

/// Decodes rows selected as `hours` and `rate`.
pub(crate) fn decode_revenue_line<R: RowExt>(row: &R) -> Result<RevenueLine> {
    Ok(RevenueLine {
        hours: row.decimal("hours")?,
        rate: row.decimal("rate")?,
    })
}
