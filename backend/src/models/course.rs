use serde::{Deserialize, Serialize};

use super::{CourseId, CourseType, Support};

/// A course offered by the ski school.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: Option<CourseId>,
    pub level: i32,
    pub course_type: CourseType,
    pub support: Support,
    pub price: f64,
    pub time_slot: i32,
}

impl Course {
    pub fn new(course_type: CourseType, support: Support) -> Self {
        Self {
            id: None,
            level: 1,
            course_type,
            support,
            price: 0.0,
            time_slot: 1,
        }
    }
}
