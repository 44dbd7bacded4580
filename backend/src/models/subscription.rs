use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{SubscriptionId, SubscriptionType};

/// A paid ski pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Option<SubscriptionId>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price: f64,
    pub subscription_type: SubscriptionType,
}

impl Subscription {
    /// Build a subscription whose end date is derived from its type.
    ///
    /// Returns `None` only when the end date would fall outside chrono's
    /// representable range.
    pub fn starting(
        start_date: NaiveDate,
        price: f64,
        subscription_type: SubscriptionType,
    ) -> Option<Self> {
        Some(Self {
            id: None,
            start_date,
            end_date: end_date_for(start_date, subscription_type)?,
            price,
            subscription_type,
        })
    }

    /// Recompute `end_date` from `start_date` and the subscription type.
    pub fn with_derived_end_date(mut self) -> Option<Self> {
        self.end_date = end_date_for(self.start_date, self.subscription_type)?;
        Some(self)
    }
}

/// End of the billing period starting on `start_date`.
///
/// Calendar-month arithmetic, clamped to the last day of the target month
/// (a monthly pass starting 31 January ends on 28 or 29 February).
pub fn end_date_for(start_date: NaiveDate, subscription_type: SubscriptionType) -> Option<NaiveDate> {
    start_date.checked_add_months(Months::new(subscription_type.duration_months()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_end_dates_by_type() {
        let start = date(2024, 12, 1);
        assert_eq!(end_date_for(start, SubscriptionType::Annual), Some(date(2025, 12, 1)));
        assert_eq!(end_date_for(start, SubscriptionType::SemiAnnual), Some(date(2025, 6, 1)));
        assert_eq!(end_date_for(start, SubscriptionType::Monthly), Some(date(2025, 1, 1)));
    }

    #[test]
    fn test_monthly_end_date_clamps_to_month_end() {
        let end = end_date_for(date(2024, 1, 31), SubscriptionType::Monthly);
        assert_eq!(end, Some(date(2024, 2, 29)));
    }

    #[test]
    fn test_derived_end_date_overrides_payload() {
        let sub = Subscription {
            id: None,
            start_date: date(2025, 1, 10),
            end_date: date(1999, 1, 1),
            price: 120.0,
            subscription_type: SubscriptionType::Monthly,
        }
        .with_derived_end_date()
        .unwrap();
        assert_eq!(sub.end_date, date(2025, 2, 10));
    }
}
