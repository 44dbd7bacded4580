use async_trait::async_trait;
use chrono::NaiveDate;

use super::error::RepositoryResult;
use crate::models::{Subscription, SubscriptionId, SubscriptionType};

/// Repository trait for subscriptions.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Store a subscription as given. End-date derivation is a service concern.
    async fn insert_subscription(&self, subscription: &Subscription)
        -> RepositoryResult<Subscription>;

    async fn find_subscription(&self, id: SubscriptionId)
        -> RepositoryResult<Option<Subscription>>;

    async fn list_subscriptions(&self) -> RepositoryResult<Vec<Subscription>>;

    async fn update_subscription(&self, subscription: &Subscription)
        -> RepositoryResult<Subscription>;

    /// Remove a subscription; skiers holding it are left without one.
    async fn delete_subscription(&self, id: SubscriptionId) -> RepositoryResult<bool>;

    /// Subscriptions of one type, ordered by start date ascending.
    async fn list_subscriptions_by_type(
        &self,
        subscription_type: SubscriptionType,
    ) -> RepositoryResult<Vec<Subscription>>;

    /// Subscriptions whose start date lies in `[start, end]`, ordered by start date.
    async fn list_subscriptions_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Vec<Subscription>>;
}
