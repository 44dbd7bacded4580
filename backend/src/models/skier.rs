use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{PisteId, SkierId, SubscriptionId};

/// A skier known to the station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skier {
    pub id: Option<SkierId>,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub city: String,
    #[serde(default)]
    pub subscription_id: Option<SubscriptionId>,
    #[serde(default)]
    pub piste_ids: BTreeSet<PisteId>,
}

impl Skier {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        date_of_birth: NaiveDate,
        city: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            date_of_birth,
            city: city.into(),
            subscription_id: None,
            piste_ids: BTreeSet::new(),
        }
    }

    /// Age in whole completed years on `today`.
    ///
    /// Calendar-aware: a skier born on 2010-06-15 is 13 on 2024-06-14 and 14
    /// on 2024-06-15. A date of birth after `today` yields 0.
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        today.years_since(self.date_of_birth).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_age_truncates_before_birthday() {
        let skier = Skier::new("Lea", "Martin", date(2010, 6, 15), "Annecy");
        assert_eq!(skier.age_on(date(2024, 6, 14)), 13);
        assert_eq!(skier.age_on(date(2024, 6, 15)), 14);
    }

    #[test]
    fn test_age_of_leap_day_birth() {
        let skier = Skier::new("Tom", "Roux", date(2008, 2, 29), "Grenoble");
        assert_eq!(skier.age_on(date(2024, 2, 28)), 15);
        assert_eq!(skier.age_on(date(2024, 2, 29)), 16);
    }

    #[test]
    fn test_future_birth_date_counts_as_zero() {
        let skier = Skier::new("Ana", "Blanc", date(2030, 1, 1), "Chamonix");
        assert_eq!(skier.age_on(date(2024, 1, 1)), 0);
    }
}
