//! Backend-neutral sea-query statements for the source reads and target
//! upserts.
//!
//! Upserts are `INSERT .. ON CONFLICT (id) DO UPDATE` over the business
//! columns only. `created_at`/`updated_at` bookkeeping is set by the first
//! insert, so replaying unchanged source rows leaves target rows untouched.

use chrono::{DateTime, Utc};
use sea_query::{Alias, Expr, InsertStatement, OnConflict, Order, Query, SelectStatement};

use super::codec::{as_bigint, as_text, format_date};
use crate::identity::EntityKind;
use crate::model::{
    MigratedBillableHour, MigratedCategory, MigratedCustomer, MigratedUser, ReportCategory,
    ReportCustomer, ReportUser,
};
use crate::storage::schema::{
    BillableHours, BillingCategories, Customers, ReportBillableHours, ReportBillingCategories,
    ReportCustomers, ReportUsers, Users,
};

// =============================================================================
// Source reads
// =============================================================================

pub(crate) fn select_users() -> SelectStatement {
    Query::select()
        .expr_as(as_bigint(Users::Id), Alias::new("id"))
        .columns([Users::Email, Users::Name])
        .from(Users::Table)
        .order_by(Users::Id, Order::Asc)
        .to_owned()
}

pub(crate) fn select_customers() -> SelectStatement {
    Query::select()
        .expr_as(as_bigint(Customers::Id), Alias::new("id"))
        .columns([Customers::Name, Customers::Email, Customers::Address])
        .expr_as(as_text(Customers::CreatedAt), Alias::new("created_at"))
        .from(Customers::Table)
        .order_by(Customers::Id, Order::Asc)
        .to_owned()
}

pub(crate) fn select_categories() -> SelectStatement {
    Query::select()
        .expr_as(as_bigint(BillingCategories::Id), Alias::new("id"))
        .columns([BillingCategories::Name, BillingCategories::Description])
        .expr_as(
            as_text(BillingCategories::HourlyRate),
            Alias::new("hourly_rate"),
        )
        .from(BillingCategories::Table)
        .order_by(BillingCategories::Id, Order::Asc)
        .to_owned()
}

/// Category id and current rate; decoded as `id` / `hourly_rate`.
pub(crate) fn select_category_rates() -> SelectStatement {
    Query::select()
        .expr_as(as_bigint(BillingCategories::Id), Alias::new("id"))
        .expr_as(
            as_text(BillingCategories::HourlyRate),
            Alias::new("hourly_rate"),
        )
        .from(BillingCategories::Table)
        .to_owned()
}

pub(crate) fn select_billable_hours() -> SelectStatement {
    Query::select()
        .expr_as(as_bigint(BillableHours::Id), Alias::new("id"))
        .expr_as(as_bigint(BillableHours::CustomerId), Alias::new("customer_id"))
        .expr_as(as_bigint(BillableHours::UserId), Alias::new("user_id"))
        .expr_as(as_bigint(BillableHours::CategoryId), Alias::new("category_id"))
        .column(BillableHours::Note)
        .expr_as(as_text(BillableHours::Hours), Alias::new("hours"))
        .expr_as(as_text(BillableHours::DateLogged), Alias::new("date_logged"))
        .expr_as(as_text(BillableHours::CreatedAt), Alias::new("created_at"))
        .from(BillableHours::Table)
        .order_by(BillableHours::Id, Order::Asc)
        .to_owned()
}

/// `hours` joined with the category's current `hourly_rate`.
pub(crate) fn select_source_revenue_lines() -> SelectStatement {
    Query::select()
        .expr_as(
            as_text((BillableHours::Table, BillableHours::Hours)),
            Alias::new("hours"),
        )
        .expr_as(
            as_text((BillingCategories::Table, BillingCategories::HourlyRate)),
            Alias::new("rate"),
        )
        .from(BillableHours::Table)
        .inner_join(
            BillingCategories::Table,
            Expr::col((BillableHours::Table, BillableHours::CategoryId))
                .equals((BillingCategories::Table, BillingCategories::Id)),
        )
        .to_owned()
}

/// `SELECT COUNT(*) AS n FROM <table>`.
pub(crate) fn select_count(table: &'static str) -> SelectStatement {
    Query::select()
        .expr_as(Expr::cust("CAST(COUNT(*) AS BIGINT)"), Alias::new("n"))
        .from(Alias::new(table))
        .to_owned()
}

// =============================================================================
// Target reads
// =============================================================================

/// `hours` with the `rate_snapshot` stored at migration time.
pub(crate) fn select_target_revenue_lines() -> SelectStatement {
    Query::select()
        .expr_as(as_text(BillableHours::Hours), Alias::new("hours"))
        .expr_as(as_text(BillableHours::RateSnapshot), Alias::new("rate"))
        .from(BillableHours::Table)
        .to_owned()
}

/// Billable hours with no matching category row.
pub(crate) fn select_orphaned_hours() -> SelectStatement {
    Query::select()
        .expr_as(Expr::cust("CAST(COUNT(*) AS BIGINT)"), Alias::new("n"))
        .from(BillableHours::Table)
        .left_join(
            BillingCategories::Table,
            Expr::col((BillableHours::Table, BillableHours::CategoryId))
                .equals((BillingCategories::Table, BillingCategories::Id)),
        )
        .and_where(Expr::col((BillingCategories::Table, BillingCategories::Id)).is_null())
        .to_owned()
}

// =============================================================================
// Target upserts
// =============================================================================

pub(crate) fn upsert_user(user: &MigratedUser, now: DateTime<Utc>) -> InsertStatement {
    let now = now.to_rfc3339();
    Query::insert()
        .into_table(Users::Table)
        .columns([
            Users::Id,
            Users::Name,
            Users::Email,
            Users::CreatedAt,
            Users::UpdatedAt,
        ])
        .values_panic([
            user.id.to_string().into(),
            user.name.clone().into(),
            user.email.clone().into(),
            now.clone().into(),
            now.into(),
        ])
        .on_conflict(
            OnConflict::column(Users::Id)
                .update_columns([Users::Name, Users::Email])
                .to_owned(),
        )
        .to_owned()
}

pub(crate) fn upsert_customer(customer: &MigratedCustomer, now: DateTime<Utc>) -> InsertStatement {
    Query::insert()
        .into_table(Customers::Table)
        .columns([
            Customers::Id,
            Customers::Name,
            Customers::Email,
            Customers::Address,
            Customers::CreatedAt,
            Customers::UpdatedAt,
        ])
        .values_panic([
            customer.id.to_string().into(),
            customer.name.clone().into(),
            customer.email.clone().into(),
            customer.address.clone().into(),
            customer.created_at.to_rfc3339().into(),
            now.to_rfc3339().into(),
        ])
        .on_conflict(
            OnConflict::column(Customers::Id)
                .update_columns([
                    Customers::Name,
                    Customers::Email,
                    Customers::Address,
                    Customers::CreatedAt,
                ])
                .to_owned(),
        )
        .to_owned()
}

pub(crate) fn upsert_category(category: &MigratedCategory, now: DateTime<Utc>) -> InsertStatement {
    let now = now.to_rfc3339();
    Query::insert()
        .into_table(BillingCategories::Table)
        .columns([
            BillingCategories::Id,
            BillingCategories::Name,
            BillingCategories::Description,
            BillingCategories::HourlyRate,
            BillingCategories::CreatedAt,
            BillingCategories::UpdatedAt,
        ])
        .values_panic([
            category.id.to_string().into(),
            category.name.clone().into(),
            category.description.clone().into(),
            category.hourly_rate.to_string().into(),
            now.clone().into(),
            now.into(),
        ])
        .on_conflict(
            OnConflict::column(BillingCategories::Id)
                .update_columns([
                    BillingCategories::Name,
                    BillingCategories::Description,
                    BillingCategories::HourlyRate,
                ])
                .to_owned(),
        )
        .to_owned()
}

pub(crate) fn upsert_billable_hour(hour: &MigratedBillableHour, now: DateTime<Utc>) -> InsertStatement {
    Query::insert()
        .into_table(BillableHours::Table)
        .columns([
            BillableHours::Id,
            BillableHours::CustomerId,
            BillableHours::UserId,
            BillableHours::CategoryId,
            BillableHours::Hours,
            BillableHours::RateSnapshot,
            BillableHours::DateLogged,
            BillableHours::Note,
            BillableHours::CreatedAt,
            BillableHours::UpdatedAt,
        ])
        .values_panic([
            hour.id.to_string().into(),
            hour.customer_id.to_string().into(),
            hour.user_id.to_string().into(),
            hour.category_id.to_string().into(),
            hour.hours.to_string().into(),
            hour.rate_snapshot.rate().to_string().into(),
            format_date(hour.date_logged).into(),
            hour.note.clone().into(),
            hour.created_at.to_rfc3339().into(),
            now.to_rfc3339().into(),
        ])
        .on_conflict(
            OnConflict::column(BillableHours::Id)
                .update_columns([
                    BillableHours::CustomerId,
                    BillableHours::UserId,
                    BillableHours::CategoryId,
                    BillableHours::Hours,
                    BillableHours::RateSnapshot,
                    BillableHours::DateLogged,
                    BillableHours::Note,
                    BillableHours::CreatedAt,
                ])
                .to_owned(),
        )
        .to_owned()
}

pub(crate) fn upsert_report_user(user: &ReportUser) -> InsertStatement {
    Query::insert()
        .into_table(ReportUsers::Table)
        .columns([ReportUsers::Id, ReportUsers::Name, ReportUsers::Email])
        .values_panic([
            user.id.to_string().into(),
            user.name.clone().into(),
            user.email.clone().into(),
        ])
        .on_conflict(
            OnConflict::column(ReportUsers::Id)
                .update_columns([ReportUsers::Name, ReportUsers::Email])
                .to_owned(),
        )
        .to_owned()
}

pub(crate) fn upsert_report_customer(customer: &ReportCustomer) -> InsertStatement {
    Query::insert()
        .into_table(ReportCustomers::Table)
        .columns([
            ReportCustomers::Id,
            ReportCustomers::Name,
            ReportCustomers::Email,
            ReportCustomers::Address,
        ])
        .values_panic([
            customer.id.to_string().into(),
            customer.name.clone().into(),
            customer.email.clone().into(),
            customer.address.clone().into(),
        ])
        .on_conflict(
            OnConflict::column(ReportCustomers::Id)
                .update_columns([
                    ReportCustomers::Name,
                    ReportCustomers::Email,
                    ReportCustomers::Address,
                ])
                .to_owned(),
        )
        .to_owned()
}

pub(crate) fn upsert_report_category(category: &ReportCategory) -> InsertStatement {
    Query::insert()
        .into_table(ReportBillingCategories::Table)
        .columns([
            ReportBillingCategories::Id,
            ReportBillingCategories::Name,
            ReportBillingCategories::HourlyRate,
        ])
        .values_panic([
            category.id.to_string().into(),
            category.name.clone().into(),
            category.hourly_rate.to_string().into(),
        ])
        .on_conflict(
            OnConflict::column(ReportBillingCategories::Id)
                .update_columns([
                    ReportBillingCategories::Name,
                    ReportBillingCategories::HourlyRate,
                ])
                .to_owned(),
        )
        .to_owned()
}

pub(crate) fn upsert_report_billable_hour(hour: &MigratedBillableHour) -> InsertStatement {
    Query::insert()
        .into_table(ReportBillableHours::Table)
        .columns([
            ReportBillableHours::Id,
            ReportBillableHours::CustomerId,
            ReportBillableHours::UserId,
            ReportBillableHours::CategoryId,
            ReportBillableHours::Hours,
            ReportBillableHours::RateSnapshot,
            ReportBillableHours::DateLogged,
            ReportBillableHours::Note,
            ReportBillableHours::CreatedAt,
        ])
        .values_panic([
            hour.id.to_string().into(),
            hour.customer_id.to_string().into(),
            hour.user_id.to_string().into(),
            hour.category_id.to_string().into(),
            hour.hours.to_string().into(),
            hour.rate_snapshot.rate().to_string().into(),
            format_date(hour.date_logged).into(),
            hour.note.clone().into(),
            hour.created_at.to_rfc3339().into(),
        ])
        .on_conflict(
            OnConflict::column(ReportBillableHours::Id)
                .update_columns([
                    ReportBillableHours::CustomerId,
                    ReportBillableHours::UserId,
                    ReportBillableHours::CategoryId,
                    ReportBillableHours::Hours,
                    ReportBillableHours::RateSnapshot,
                    ReportBillableHours::DateLogged,
                    ReportBillableHours::Note,
                    ReportBillableHours::CreatedAt,
                ])
                .to_owned(),
        )
        .to_owned()
}

/// Count query for a kind's read-model table.
pub(crate) fn select_report_count(kind: EntityKind) -> SelectStatement {
    select_count(kind.report_table())
}
