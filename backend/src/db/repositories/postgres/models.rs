use chrono::NaiveDate;
use diesel::prelude::*;
use std::collections::BTreeSet;
use std::str::FromStr;

use super::schema::{
    courses, instructor_courses, instructors, pistes, registrations, skier_pistes, skiers,
    subscriptions,
};
use crate::db::repository::{RepositoryError, RepositoryResult};
use crate::models::{
    Course, CourseId, Instructor, InstructorId, Piste, PisteId, Registration, RegistrationId,
    Skier, SkierId, Subscription, SubscriptionId, UnknownVariant,
};

fn parse_token<T>(value: &str) -> RepositoryResult<T>
where
    T: FromStr<Err = UnknownVariant>,
{
    value
        .parse()
        .map_err(|e: UnknownVariant| RepositoryError::internal(format!("Corrupt row: {}", e)))
}

// ==================== Skiers ====================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = skiers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SkierRow {
    pub skier_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub city: String,
    pub subscription_id: Option<i64>,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = skiers)]
#[diesel(treat_none_as_null = true)]
pub struct SkierChanges {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub city: String,
    pub subscription_id: Option<i64>,
}

impl From<&Skier> for SkierChanges {
    fn from(skier: &Skier) -> Self {
        Self {
            first_name: skier.first_name.clone(),
            last_name: skier.last_name.clone(),
            date_of_birth: skier.date_of_birth,
            city: skier.city.clone(),
            subscription_id: skier.subscription_id.map(i64::from),
        }
    }
}

impl SkierRow {
    pub fn into_skier(self, piste_ids: BTreeSet<PisteId>) -> Skier {
        Skier {
            id: Some(SkierId(self.skier_id)),
            first_name: self.first_name,
            last_name: self.last_name,
            date_of_birth: self.date_of_birth,
            city: self.city,
            subscription_id: self.subscription_id.map(SubscriptionId),
            piste_ids,
        }
    }
}

#[derive(Debug, Clone, Copy, Queryable, Selectable, Insertable)]
#[diesel(table_name = skier_pistes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SkierPisteRow {
    pub skier_id: i64,
    pub piste_id: i64,
}

// ==================== Courses ====================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = courses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CourseRow {
    pub course_id: i64,
    pub level: i32,
    pub course_type: String,
    pub support: String,
    pub price: f64,
    pub time_slot: i32,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = courses)]
pub struct CourseChanges {
    pub level: i32,
    pub course_type: String,
    pub support: String,
    pub price: f64,
    pub time_slot: i32,
}

impl From<&Course> for CourseChanges {
    fn from(course: &Course) -> Self {
        Self {
            level: course.level,
            course_type: course.course_type.as_str().to_string(),
            support: course.support.as_str().to_string(),
            price: course.price,
            time_slot: course.time_slot,
        }
    }
}

impl TryFrom<CourseRow> for Course {
    type Error = RepositoryError;

    fn try_from(row: CourseRow) -> Result<Self, Self::Error> {
        Ok(Course {
            id: Some(CourseId(row.course_id)),
            level: row.level,
            course_type: parse_token(&row.course_type)?,
            support: parse_token(&row.support)?,
            price: row.price,
            time_slot: row.time_slot,
        })
    }
}

// ==================== Instructors ====================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = instructors)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct InstructorRow {
    pub instructor_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub date_of_hire: NaiveDate,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = instructors)]
pub struct InstructorChanges {
    pub first_name: String,
    pub last_name: String,
    pub date_of_hire: NaiveDate,
}

impl From<&Instructor> for InstructorChanges {
    fn from(instructor: &Instructor) -> Self {
        Self {
            first_name: instructor.first_name.clone(),
            last_name: instructor.last_name.clone(),
            date_of_hire: instructor.date_of_hire,
        }
    }
}

impl InstructorRow {
    pub fn into_instructor(self, course_ids: BTreeSet<CourseId>) -> Instructor {
        Instructor {
            id: Some(InstructorId(self.instructor_id)),
            first_name: self.first_name,
            last_name: self.last_name,
            date_of_hire: self.date_of_hire,
            course_ids,
        }
    }
}

#[derive(Debug, Clone, Copy, Queryable, Selectable, Insertable)]
#[diesel(table_name = instructor_courses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct InstructorCourseRow {
    pub instructor_id: i64,
    pub course_id: i64,
}

// ==================== Pistes ====================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = pistes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PisteRow {
    pub piste_id: i64,
    pub piste_name: String,
    pub color: String,
    pub length_m: i32,
    pub slope: i32,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = pistes)]
pub struct PisteChanges {
    pub piste_name: String,
    pub color: String,
    pub length_m: i32,
    pub slope: i32,
}

impl From<&Piste> for PisteChanges {
    fn from(piste: &Piste) -> Self {
        Self {
            piste_name: piste.name.clone(),
            color: piste.color.as_str().to_string(),
            length_m: piste.length_m,
            slope: piste.slope,
        }
    }
}

impl TryFrom<PisteRow> for Piste {
    type Error = RepositoryError;

    fn try_from(row: PisteRow) -> Result<Self, Self::Error> {
        Ok(Piste {
            id: Some(PisteId(row.piste_id)),
            name: row.piste_name,
            color: parse_token(&row.color)?,
            length_m: row.length_m,
            slope: row.slope,
        })
    }
}

// ==================== Subscriptions ====================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = subscriptions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SubscriptionRow {
    pub subscription_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price: f64,
    pub subscription_type: String,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = subscriptions)]
pub struct SubscriptionChanges {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price: f64,
    pub subscription_type: String,
}

impl From<&Subscription> for SubscriptionChanges {
    fn from(sub: &Subscription) -> Self {
        Self {
            start_date: sub.start_date,
            end_date: sub.end_date,
            price: sub.price,
            subscription_type: sub.subscription_type.as_str().to_string(),
        }
    }
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = RepositoryError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            id: Some(SubscriptionId(row.subscription_id)),
            start_date: row.start_date,
            end_date: row.end_date,
            price: row.price,
            subscription_type: parse_token(&row.subscription_type)?,
        })
    }
}

// ==================== Registrations ====================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = registrations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RegistrationRow {
    pub registration_id: i64,
    pub week_number: i32,
    pub skier_id: Option<i64>,
    pub course_id: Option<i64>,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = registrations)]
#[diesel(treat_none_as_null = true)]
pub struct RegistrationChanges {
    pub week_number: i32,
    pub skier_id: Option<i64>,
    pub course_id: Option<i64>,
}

impl TryFrom<&Registration> for RegistrationChanges {
    type Error = RepositoryError;

    fn try_from(registration: &Registration) -> Result<Self, Self::Error> {
        Ok(Self {
            week_number: week_to_column(registration.week_number)?,
            skier_id: registration.skier_id.map(i64::from),
            course_id: registration.course_id.map(i64::from),
        })
    }
}

impl TryFrom<RegistrationRow> for Registration {
    type Error = RepositoryError;

    fn try_from(row: RegistrationRow) -> Result<Self, Self::Error> {
        Ok(Registration {
            id: Some(RegistrationId(row.registration_id)),
            week_number: u32::try_from(row.week_number).map_err(|_| {
                RepositoryError::internal(format!(
                    "Corrupt row: negative week number {}",
                    row.week_number
                ))
            })?,
            skier_id: row.skier_id.map(SkierId),
            course_id: row.course_id.map(CourseId),
        })
    }
}

pub fn week_to_column(week_number: u32) -> RepositoryResult<i32> {
    i32::try_from(week_number)
        .map_err(|_| RepositoryError::validation(format!("Week number {} out of range", week_number)))
}
