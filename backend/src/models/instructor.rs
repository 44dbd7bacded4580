use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{CourseId, InstructorId};

/// A ski instructor and the courses they teach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instructor {
    pub id: Option<InstructorId>,
    pub first_name: String,
    pub last_name: String,
    pub date_of_hire: NaiveDate,
    #[serde(default)]
    pub course_ids: BTreeSet<CourseId>,
}

impl Instructor {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        date_of_hire: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            date_of_hire,
            course_ids: BTreeSet::new(),
        }
    }
}
