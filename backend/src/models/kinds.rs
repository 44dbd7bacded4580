//! Closed vocabularies used by the entities.
//!
//! Each enum round-trips through a stable upper-case token, used both on the
//! wire (serde) and in the text columns of the Postgres schema.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when a token does not name any variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Category of a course. Determines the age rule applied at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CourseType {
    Individual,
    CollectiveChildren,
    CollectiveAdult,
}

impl CourseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "INDIVIDUAL",
            Self::CollectiveChildren => "COLLECTIVE_CHILDREN",
            Self::CollectiveAdult => "COLLECTIVE_ADULT",
        }
    }
}

impl FromStr for CourseType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "INDIVIDUAL" => Ok(Self::Individual),
            "COLLECTIVE_CHILDREN" => Ok(Self::CollectiveChildren),
            "COLLECTIVE_ADULT" => Ok(Self::CollectiveAdult),
            _ => Err(UnknownVariant::new("course type", s)),
        }
    }
}

/// Equipment a course is taught on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Support {
    Ski,
    Snowboard,
}

impl Support {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ski => "SKI",
            Self::Snowboard => "SNOWBOARD",
        }
    }
}

impl FromStr for Support {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SKI" => Ok(Self::Ski),
            "SNOWBOARD" => Ok(Self::Snowboard),
            _ => Err(UnknownVariant::new("support", s)),
        }
    }
}

/// Difficulty color of a piste.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PisteColor {
    Green,
    Blue,
    Red,
    Black,
}

impl PisteColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "GREEN",
            Self::Blue => "BLUE",
            Self::Red => "RED",
            Self::Black => "BLACK",
        }
    }
}

impl FromStr for PisteColor {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GREEN" => Ok(Self::Green),
            "BLUE" => Ok(Self::Blue),
            "RED" => Ok(Self::Red),
            "BLACK" => Ok(Self::Black),
            _ => Err(UnknownVariant::new("piste color", s)),
        }
    }
}

/// Billing period of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionType {
    Annual,
    #[serde(alias = "SEMESTRIEL")]
    SemiAnnual,
    Monthly,
}

impl SubscriptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Annual => "ANNUAL",
            Self::SemiAnnual => "SEMI_ANNUAL",
            Self::Monthly => "MONTHLY",
        }
    }

    /// Length of one billing period in calendar months.
    pub fn duration_months(&self) -> u32 {
        match self {
            Self::Annual => 12,
            Self::SemiAnnual => 6,
            Self::Monthly => 1,
        }
    }
}

impl FromStr for SubscriptionType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ANNUAL" => Ok(Self::Annual),
            "SEMI_ANNUAL" | "SEMESTRIEL" => Ok(Self::SemiAnnual),
            "MONTHLY" => Ok(Self::Monthly),
            _ => Err(UnknownVariant::new("subscription type", s)),
        }
    }
}

macro_rules! display_as_str {
    ($($name:ident),*) => {
        $(
            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

display_as_str!(CourseType, Support, PisteColor, SubscriptionType);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_type_tokens() {
        for course_type in [
            CourseType::Individual,
            CourseType::CollectiveChildren,
            CourseType::CollectiveAdult,
        ] {
            assert_eq!(course_type.as_str().parse::<CourseType>().unwrap(), course_type);
        }
        assert_eq!(
            "collective_children".parse::<CourseType>().unwrap(),
            CourseType::CollectiveChildren
        );
    }

    #[test]
    fn test_unknown_course_type_is_rejected() {
        let err = "COLLECTIVE_SENIOR".parse::<CourseType>().unwrap_err();
        assert_eq!(err.kind, "course type");
        assert!(err.to_string().contains("COLLECTIVE_SENIOR"));
    }

    #[test]
    fn test_serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&CourseType::CollectiveAdult).unwrap();
        assert_eq!(json, "\"COLLECTIVE_ADULT\"");

        let parsed: Result<CourseType, _> = serde_json::from_str("\"SENIOR\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_legacy_semestriel_alias() {
        let parsed: SubscriptionType = serde_json::from_str("\"SEMESTRIEL\"").unwrap();
        assert_eq!(parsed, SubscriptionType::SemiAnnual);
        assert_eq!(
            "semestriel".parse::<SubscriptionType>().unwrap(),
            SubscriptionType::SemiAnnual
        );
        assert_eq!(SubscriptionType::SemiAnnual.to_string(), "SEMI_ANNUAL");
    }

    #[test]
    fn test_subscription_durations() {
        assert_eq!(SubscriptionType::Annual.duration_months(), 12);
        assert_eq!(SubscriptionType::SemiAnnual.duration_months(), 6);
        assert_eq!(SubscriptionType::Monthly.duration_months(), 1);
    }

    #[test]
    fn test_support_and_color_parse() {
        assert_eq!("snowboard".parse::<Support>().unwrap(), Support::Snowboard);
        assert_eq!("BLACK".parse::<PisteColor>().unwrap(), PisteColor::Black);
        assert!("purple".parse::<PisteColor>().is_err());
    }
}
