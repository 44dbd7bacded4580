use serde::{Deserialize, Serialize};

use super::{Course, CourseId, RegistrationId, Skier, SkierId};

/// Enrollment of one skier in one course for one week of the season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub id: Option<RegistrationId>,
    pub week_number: u32,
    #[serde(default)]
    pub skier_id: Option<SkierId>,
    #[serde(default)]
    pub course_id: Option<CourseId>,
}

impl Registration {
    pub fn for_week(week_number: u32) -> Self {
        Self {
            id: None,
            week_number,
            skier_id: None,
            course_id: None,
        }
    }
}

/// A persisted registration together with the skier and course it links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    pub registration: Registration,
    pub skier: Skier,
    pub course: Course,
}
