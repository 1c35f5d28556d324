//! Mock storage implementations for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    BillingTarget, CustomerTarget, ReportingTarget, Result, SourceStore, StorageError, UserTarget,
};
use crate::identity::EntityKind;
use crate::model::{
    LegacyBillableHour, LegacyCategory, LegacyCustomer, LegacyUser, MigratedBillableHour,
    MigratedCategory, MigratedCustomer, MigratedUser, ReportCategory, ReportCustomer, ReportUser,
    RevenueLine,
};

/// Mock legacy database holding rows in memory.
#[derive(Default)]
pub struct MockSourceStore {
    users: RwLock<Vec<LegacyUser>>,
    customers: RwLock<Vec<LegacyCustomer>>,
    categories: RwLock<Vec<LegacyCategory>>,
    billable_hours: RwLock<Vec<LegacyBillableHour>>,
    fail_on_read: RwLock<bool>,
    rate_lookups: AtomicUsize,
}

impl MockSourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two users, three customers, three categories (150/200/100) and four
    /// billable hours totalling 3200.00 in revenue.
    pub async fn with_fixture() -> Self {
        let store = Self::new();
        let created = Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).single().unwrap_or_default();

        for (id, email, name) in [
            (1, "john.doe@example.com", "John Doe"),
            (2, "jane.smith@example.com", "Jane Smith"),
        ] {
            store
                .insert_user(LegacyUser {
                    id,
                    email: email.to_string(),
                    name: name.to_string(),
                })
                .await;
        }

        for (id, name, email, address) in [
            (1, "Acme Corp", "billing@acme.com", "123 Business St"),
            (2, "TechStart Inc", "finance@techstart.com", "456 Innovation Ave"),
            (3, "MegaCorp Ltd", "accounts@megacorp.com", "789 Enterprise Blvd"),
        ] {
            store
                .insert_customer(LegacyCustomer {
                    id,
                    name: name.to_string(),
                    email: email.to_string(),
                    address: Some(address.to_string()),
                    created_at: created,
                })
                .await;
        }

        for (id, name, description, rate) in [
            (1, "Development", "Software development services", 150),
            (2, "Consulting", "Business consulting services", 200),
            (3, "Support", "Technical support services", 100),
        ] {
            store
                .insert_category(LegacyCategory {
                    id,
                    name: name.to_string(),
                    description: Some(description.to_string()),
                    hourly_rate: Decimal::new(rate * 100, 2),
                })
                .await;
        }

        for (id, customer_id, user_id, category_id, hours, note, day) in [
            (1, 1, 1, 1, 8, "Backend development", 15),
            (2, 1, 2, 2, 4, "Architecture consulting", 16),
            (3, 2, 1, 1, 6, "Frontend development", 17),
            (4, 3, 2, 3, 3, "Technical support", 18),
        ] {
            store
                .insert_billable_hour(LegacyBillableHour {
                    id,
                    customer_id,
                    user_id,
                    category_id,
                    hours: Decimal::new(hours * 100, 2),
                    note: Some(note.to_string()),
                    date_logged: NaiveDate::from_ymd_opt(2025, 1, day).unwrap_or_default(),
                    created_at: created,
                })
                .await;
        }

        store
    }

    pub async fn insert_user(&self, user: LegacyUser) {
        self.users.write().await.push(user);
    }

    pub async fn insert_customer(&self, customer: LegacyCustomer) {
        self.customers.write().await.push(customer);
    }

    pub async fn insert_category(&self, category: LegacyCategory) {
        self.categories.write().await.push(category);
    }

    pub async fn insert_billable_hour(&self, hour: LegacyBillableHour) {
        self.billable_hours.write().await.push(hour);
    }

    pub async fn remove_category(&self, id: i64) {
        self.categories.write().await.retain(|c| c.id != id);
    }

    /// Change a category's current rate, as a later edit in the legacy UI would.
    pub async fn set_rate(&self, category_id: i64, rate: Decimal) {
        for category in self.categories.write().await.iter_mut() {
            if category.id == category_id {
                category.hourly_rate = rate;
            }
        }
    }

    /// Number of `category_rates` calls so far.
    pub fn rate_lookups(&self) -> usize {
        self.rate_lookups.load(Ordering::SeqCst)
    }

    pub async fn set_fail_on_read(&self, fail: bool) {
        *self.fail_on_read.write().await = fail;
    }

    /// Snapshot `rows` ordered by legacy id, or a single error when reads are
    /// failing.
    fn rows<'a, T>(
        &'a self,
        rows: &'a RwLock<Vec<T>>,
        legacy_id: fn(&T) -> i64,
    ) -> BoxStream<'a, Result<T>>
    where
        T: Clone + Send + Sync + 'a,
    {
        stream::once(async move {
            if *self.fail_on_read.read().await {
                return vec![Err(StorageError::Unavailable(
                    "mock source read failure".to_string(),
                ))];
            }
            let mut snapshot = rows.read().await.clone();
            snapshot.sort_by_key(legacy_id);
            snapshot.into_iter().map(Ok).collect()
        })
        .flat_map(stream::iter)
        .boxed()
    }

    async fn check_read(&self) -> Result<()> {
        if *self.fail_on_read.read().await {
            return Err(StorageError::Unavailable(
                "mock source read failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl SourceStore for MockSourceStore {
    fn users(&self) -> BoxStream<'_, Result<LegacyUser>> {
        self.rows(&self.users, |u| u.id)
    }

    fn customers(&self) -> BoxStream<'_, Result<LegacyCustomer>> {
        self.rows(&self.customers, |c| c.id)
    }

    fn categories(&self) -> BoxStream<'_, Result<LegacyCategory>> {
        self.rows(&self.categories, |c| c.id)
    }

    fn billable_hours(&self) -> BoxStream<'_, Result<LegacyBillableHour>> {
        self.rows(&self.billable_hours, |h| h.id)
    }

    async fn category_rates(&self) -> Result<HashMap<i64, Decimal>> {
        self.rate_lookups.fetch_add(1, Ordering::SeqCst);
        self.check_read().await?;
        Ok(self
            .categories
            .read()
            .await
            .iter()
            .map(|c| (c.id, c.hourly_rate))
            .collect())
    }

    async fn count(&self, kind: EntityKind) -> Result<u64> {
        self.check_read().await?;
        let n = match kind {
            EntityKind::User => self.users.read().await.len(),
            EntityKind::Customer => self.customers.read().await.len(),
            EntityKind::Category => self.categories.read().await.len(),
            EntityKind::BillableHour => self.billable_hours.read().await.len(),
        };
        Ok(n as u64)
    }

    fn revenue_lines(&self) -> BoxStream<'_, Result<RevenueLine>> {
        stream::once(async move {
            if let Err(err) = self.check_read().await {
                return vec![Err(err)];
            }
            let rates: HashMap<i64, Decimal> = self
                .categories
                .read()
                .await
                .iter()
                .map(|c| (c.id, c.hourly_rate))
                .collect();
            self.billable_hours
                .read()
                .await
                .iter()
                .filter_map(|h| {
                    rates.get(&h.category_id).map(|rate| {
                        Ok(RevenueLine {
                            hours: h.hours,
                            rate: *rate,
                        })
                    })
                })
                .collect()
        })
        .flat_map(stream::iter)
        .boxed()
    }
}

/// Mock service database; one instance can stand in for any or all targets.
#[derive(Default)]
pub struct MockTargetStore {
    users: RwLock<HashMap<Uuid, MigratedUser>>,
    customers: RwLock<HashMap<Uuid, MigratedCustomer>>,
    categories: RwLock<HashMap<Uuid, MigratedCategory>>,
    billable_hours: RwLock<HashMap<Uuid, MigratedBillableHour>>,
    report_users: RwLock<HashMap<Uuid, ReportUser>>,
    report_customers: RwLock<HashMap<Uuid, ReportCustomer>>,
    report_categories: RwLock<HashMap<Uuid, ReportCategory>>,
    report_billable_hours: RwLock<HashMap<Uuid, MigratedBillableHour>>,
    fail_on_write: RwLock<bool>,
}

impl MockTargetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_write(&self, fail: bool) {
        *self.fail_on_write.write().await = fail;
    }

    pub async fn user(&self, id: Uuid) -> Option<MigratedUser> {
        self.users.read().await.get(&id).cloned()
    }

    pub async fn customer(&self, id: Uuid) -> Option<MigratedCustomer> {
        self.customers.read().await.get(&id).cloned()
    }

    pub async fn category(&self, id: Uuid) -> Option<MigratedCategory> {
        self.categories.read().await.get(&id).cloned()
    }

    pub async fn billable_hour(&self, id: Uuid) -> Option<MigratedBillableHour> {
        self.billable_hours.read().await.get(&id).cloned()
    }

    pub async fn report_billable_hour(&self, id: Uuid) -> Option<MigratedBillableHour> {
        self.report_billable_hours.read().await.get(&id).cloned()
    }

    /// Delete a canonical category row, leaving its hours dangling.
    pub async fn remove_category(&self, id: Uuid) {
        self.categories.write().await.remove(&id);
    }

    async fn check_write(&self) -> Result<()> {
        if *self.fail_on_write.read().await {
            return Err(StorageError::Unavailable(
                "mock target write failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl UserTarget for MockTargetStore {
    async fn upsert_user(&self, user: &MigratedUser) -> Result<()> {
        self.check_write().await?;
        self.users.write().await.insert(user.id, user.clone());
        Ok(())
    }

    async fn count_users(&self) -> Result<u64> {
        Ok(self.users.read().await.len() as u64)
    }
}

#[async_trait]
impl CustomerTarget for MockTargetStore {
    async fn upsert_customer(&self, customer: &MigratedCustomer) -> Result<()> {
        self.check_write().await?;
        self.customers
            .write()
            .await
            .insert(customer.id, customer.clone());
        Ok(())
    }

    async fn count_customers(&self) -> Result<u64> {
        Ok(self.customers.read().await.len() as u64)
    }
}

#[async_trait]
impl BillingTarget for MockTargetStore {
    async fn upsert_category(&self, category: &MigratedCategory) -> Result<()> {
        self.check_write().await?;
        self.categories
            .write()
            .await
            .insert(category.id, category.clone());
        Ok(())
    }

    async fn upsert_billable_hour(&self, hour: &MigratedBillableHour) -> Result<()> {
        self.check_write().await?;
        self.billable_hours
            .write()
            .await
            .insert(hour.id, hour.clone());
        Ok(())
    }

    async fn count_categories(&self) -> Result<u64> {
        Ok(self.categories.read().await.len() as u64)
    }

    async fn count_billable_hours(&self) -> Result<u64> {
        Ok(self.billable_hours.read().await.len() as u64)
    }

    fn revenue_lines(&self) -> BoxStream<'_, Result<RevenueLine>> {
        stream::once(async move {
            self.billable_hours
                .read()
                .await
                .values()
                .map(|h| {
                    Ok(RevenueLine {
                        hours: h.hours,
                        rate: h.rate_snapshot.rate(),
                    })
                })
                .collect::<Vec<Result<RevenueLine>>>()
        })
        .flat_map(stream::iter)
        .boxed()
    }

    async fn count_orphaned_hours(&self) -> Result<u64> {
        let categories = self.categories.read().await;
        let orphaned = self
            .billable_hours
            .read()
            .await
            .values()
            .filter(|h| !categories.contains_key(&h.category_id))
            .count();
        Ok(orphaned as u64)
    }
}

#[async_trait]
impl ReportingTarget for MockTargetStore {
    async fn upsert_report_user(&self, user: &ReportUser) -> Result<()> {
        self.check_write().await?;
        self.report_users
            .write()
            .await
            .insert(user.id, user.clone());
        Ok(())
    }

    async fn upsert_report_customer(&self, customer: &ReportCustomer) -> Result<()> {
        self.check_write().await?;
        self.report_customers
            .write()
            .await
            .insert(customer.id, customer.clone());
        Ok(())
    }

    async fn upsert_report_category(&self, category: &ReportCategory) -> Result<()> {
        self.check_write().await?;
        self.report_categories
            .write()
            .await
            .insert(category.id, category.clone());
        Ok(())
    }

    async fn upsert_report_billable_hour(&self, hour: &MigratedBillableHour) -> Result<()> {
        self.check_write().await?;
        self.report_billable_hours
            .write()
            .await
            .insert(hour.id, hour.clone());
        Ok(())
    }

    async fn count(&self, kind: EntityKind) -> Result<u64> {
        let n = match kind {
            EntityKind::User => self.report_users.read().await.len(),
            EntityKind::Customer => self.report_customers.read().await.len(),
            EntityKind::Category => self.report_categories.read().await.len(),
            EntityKind::BillableHour => self.report_billable_hours.read().await.len(),
        };
        Ok(n as u64)
    }
}

/// A `StoreSet` over one mock source and one mock target shared by all four
/// target roles.
pub fn mock_store_set(
    source: std::sync::Arc<MockSourceStore>,
    target: std::sync::Arc<MockTargetStore>,
) -> super::StoreSet {
    super::StoreSet {
        source,
        users: target.clone(),
        customers: target.clone(),
        billing: target.clone(),
        reporting: target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn test_fixture_shape() {
        let source = MockSourceStore::with_fixture().await;
        assert_eq!(source.count(EntityKind::User).await.unwrap(), 2);
        assert_eq!(source.count(EntityKind::Customer).await.unwrap(), 3);
        assert_eq!(source.count(EntityKind::Category).await.unwrap(), 3);
        assert_eq!(source.count(EntityKind::BillableHour).await.unwrap(), 4);

        let revenue: Decimal = source
            .revenue_lines()
            .map_ok(|line| line.amount())
            .try_fold(Decimal::ZERO, |acc, amount| async move { Ok(acc + amount) })
            .await
            .unwrap();
        assert_eq!(revenue, Decimal::new(320000, 2));
    }

    #[tokio::test]
    async fn test_rows_stream_in_id_order() {
        let source = MockSourceStore::new();
        for id in [3, 1, 2] {
            source
                .insert_user(LegacyUser {
                    id,
                    email: format!("u{}@example.com", id),
                    name: format!("User {}", id),
                })
                .await;
        }
        let ids: Vec<i64> = source.users().map_ok(|u| u.id).try_collect().await.unwrap();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_source_read_failure_surfaces_in_stream() {
        let source = MockSourceStore::with_fixture().await;
        source.set_fail_on_read(true).await;
        let result: Result<Vec<LegacyUser>> = source.users().try_collect().await;
        assert!(matches!(result, Err(StorageError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_source_revenue_skips_missing_category() {
        let source = MockSourceStore::with_fixture().await;
        source.remove_category(3).await;
        let lines: Vec<RevenueLine> = source.revenue_lines().try_collect().await.unwrap();
        assert_eq!(lines.len(), 3);
    }

    #[tokio::test]
    async fn test_target_upsert_replaces() {
        let target = MockTargetStore::new();
        let mut user = MigratedUser {
            id: EntityKind::User.identity(1),
            name: "John Doe".to_string(),
            email: "john.doe@example.com".to_string(),
        };
        target.upsert_user(&user).await.unwrap();
        user.name = "John Q. Doe".to_string();
        target.upsert_user(&user).await.unwrap();

        assert_eq!(target.count_users().await.unwrap(), 1);
        assert_eq!(target.user(user.id).await.unwrap().name, "John Q. Doe");
    }

    #[tokio::test]
    async fn test_target_write_failure() {
        let target = MockTargetStore::new();
        target.set_fail_on_write(true).await;
        let category = MigratedCategory {
            id: EntityKind::Category.identity(1),
            name: "Development".to_string(),
            description: None,
            hourly_rate: Decimal::new(15000, 2),
        };
        assert!(target.upsert_category(&category).await.is_err());
        assert_eq!(target.count_categories().await.unwrap(), 0);
    }
}
