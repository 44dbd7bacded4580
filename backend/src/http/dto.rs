//! Data Transfer Objects for the HTTP API.
//!
//! Request bodies are checked through [`Validate`] before any service call.
//! Response bodies are built from the domain entities with `From` mappers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::extract::Validate;
use crate::models::{
    Course, CourseId, CourseType, Instructor, InstructorId, Piste, PisteColor, PisteId,
    Registration, RegistrationId, RegistrationRecord, Skier, SkierId, Subscription,
    SubscriptionId, SubscriptionType, Support,
};

fn require_name(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} must not be empty", field));
    }
    Ok(())
}

fn require_positive(field: &str, value: i64) -> Result<(), String> {
    if value <= 0 {
        return Err(format!("{} must be positive, got {}", field, value));
    }
    Ok(())
}

fn require_price(value: f64) -> Result<(), String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("price must be a non-negative amount, got {}", value));
    }
    Ok(())
}

fn require_week(value: u32) -> Result<(), String> {
    if value == 0 {
        return Err("week_number must be at least 1".to_string());
    }
    Ok(())
}

// =============================================================================
// Requests
// =============================================================================

/// Skier fields shared by creation and update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkierFields {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub city: String,
}

impl Validate for SkierFields {
    fn validate(&self) -> Result<(), String> {
        require_name("first_name", &self.first_name)?;
        require_name("last_name", &self.last_name)?;
        require_name("city", &self.city)
    }
}

impl SkierFields {
    pub fn to_skier(&self) -> Skier {
        Skier::new(
            self.first_name.trim(),
            self.last_name.trim(),
            self.date_of_birth,
            self.city.trim(),
        )
    }
}

/// Request body for `POST /v1/skiers`.
///
/// An attached subscription is stored first and linked to the new skier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSkierRequest {
    #[serde(flatten)]
    pub skier: SkierFields,
    #[serde(default)]
    pub subscription: Option<SubscriptionRequest>,
}

impl Validate for NewSkierRequest {
    fn validate(&self) -> Result<(), String> {
        self.skier.validate()?;
        match &self.subscription {
            Some(subscription) => subscription.validate(),
            None => Ok(()),
        }
    }
}

/// Request body for `PUT /v1/skiers/{id}`. Replaces every field and link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSkierRequest {
    #[serde(flatten)]
    pub skier: SkierFields,
    #[serde(default)]
    pub subscription_id: Option<i64>,
    #[serde(default)]
    pub piste_ids: BTreeSet<i64>,
}

impl Validate for UpdateSkierRequest {
    fn validate(&self) -> Result<(), String> {
        self.skier.validate()
    }
}

impl UpdateSkierRequest {
    pub fn to_skier(&self, id: SkierId) -> Skier {
        Skier {
            id: Some(id),
            subscription_id: self.subscription_id.map(SubscriptionId::new),
            piste_ids: self.piste_ids.iter().copied().map(PisteId::new).collect(),
            ..self.skier.to_skier()
        }
    }
}

/// Request body for `POST /v1/skiers/course/{course_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollSkierRequest {
    #[serde(flatten)]
    pub skier: NewSkierRequest,
    pub weeks: Vec<u32>,
}

impl Validate for EnrollSkierRequest {
    fn validate(&self) -> Result<(), String> {
        self.skier.validate()?;
        self.weeks.iter().try_for_each(|week| require_week(*week))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseRequest {
    pub level: i32,
    pub course_type: CourseType,
    pub support: Support,
    pub price: f64,
    pub time_slot: i32,
}

impl Validate for CourseRequest {
    fn validate(&self) -> Result<(), String> {
        require_positive("level", i64::from(self.level))?;
        require_positive("time_slot", i64::from(self.time_slot))?;
        require_price(self.price)
    }
}

impl CourseRequest {
    pub fn to_course(&self, id: Option<CourseId>) -> Course {
        Course {
            id,
            level: self.level,
            course_type: self.course_type,
            support: self.support,
            price: self.price,
            time_slot: self.time_slot,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructorRequest {
    pub first_name: String,
    pub last_name: String,
    pub date_of_hire: NaiveDate,
    #[serde(default)]
    pub course_ids: BTreeSet<i64>,
}

impl Validate for InstructorRequest {
    fn validate(&self) -> Result<(), String> {
        require_name("first_name", &self.first_name)?;
        require_name("last_name", &self.last_name)
    }
}

impl InstructorRequest {
    pub fn to_instructor(&self, id: Option<InstructorId>) -> Instructor {
        let mut instructor = Instructor::new(
            self.first_name.trim(),
            self.last_name.trim(),
            self.date_of_hire,
        );
        instructor.id = id;
        instructor.course_ids = self.course_ids.iter().copied().map(CourseId::new).collect();
        instructor
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PisteRequest {
    pub name: String,
    pub color: PisteColor,
    pub length_m: i32,
    pub slope: i32,
}

impl Validate for PisteRequest {
    fn validate(&self) -> Result<(), String> {
        require_name("name", &self.name)?;
        require_positive("length_m", i64::from(self.length_m))?;
        if self.slope < 0 {
            return Err(format!("slope must not be negative, got {}", self.slope));
        }
        Ok(())
    }
}

impl PisteRequest {
    pub fn to_piste(&self, id: Option<PisteId>) -> Piste {
        Piste {
            id,
            name: self.name.trim().to_string(),
            color: self.color,
            length_m: self.length_m,
            slope: self.slope,
        }
    }
}

/// Subscription payload. The end date is always derived from the type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    pub start_date: NaiveDate,
    pub price: f64,
    pub subscription_type: SubscriptionType,
}

impl Validate for SubscriptionRequest {
    fn validate(&self) -> Result<(), String> {
        require_price(self.price)
    }
}

impl SubscriptionRequest {
    pub fn to_subscription(&self, id: Option<SubscriptionId>) -> Subscription {
        Subscription {
            id,
            start_date: self.start_date,
            // Replaced by the service layer.
            end_date: self.start_date,
            price: self.price,
            subscription_type: self.subscription_type,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub week_number: u32,
}

impl Validate for RegistrationRequest {
    fn validate(&self) -> Result<(), String> {
        require_week(self.week_number)
    }
}

impl RegistrationRequest {
    pub fn to_registration(&self) -> Registration {
        Registration::for_week(self.week_number)
    }
}

/// Query parameters for `GET /v1/subscriptions/by-dates`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRangeQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkierDto {
    pub id: Option<SkierId>,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub city: String,
    pub subscription_id: Option<SubscriptionId>,
    pub piste_ids: Vec<PisteId>,
}

impl From<Skier> for SkierDto {
    fn from(skier: Skier) -> Self {
        Self {
            id: skier.id,
            first_name: skier.first_name,
            last_name: skier.last_name,
            date_of_birth: skier.date_of_birth,
            city: skier.city,
            subscription_id: skier.subscription_id,
            piste_ids: skier.piste_ids.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseDto {
    pub id: Option<CourseId>,
    pub level: i32,
    pub course_type: CourseType,
    pub support: Support,
    pub price: f64,
    pub time_slot: i32,
}

impl From<Course> for CourseDto {
    fn from(course: Course) -> Self {
        Self {
            id: course.id,
            level: course.level,
            course_type: course.course_type,
            support: course.support,
            price: course.price,
            time_slot: course.time_slot,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructorDto {
    pub id: Option<InstructorId>,
    pub first_name: String,
    pub last_name: String,
    pub date_of_hire: NaiveDate,
    pub course_ids: Vec<CourseId>,
}

impl From<Instructor> for InstructorDto {
    fn from(instructor: Instructor) -> Self {
        Self {
            id: instructor.id,
            first_name: instructor.first_name,
            last_name: instructor.last_name,
            date_of_hire: instructor.date_of_hire,
            course_ids: instructor.course_ids.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PisteDto {
    pub id: Option<PisteId>,
    pub name: String,
    pub color: PisteColor,
    pub length_m: i32,
    pub slope: i32,
}

impl From<Piste> for PisteDto {
    fn from(piste: Piste) -> Self {
        Self {
            id: piste.id,
            name: piste.name,
            color: piste.color,
            length_m: piste.length_m,
            slope: piste.slope,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionDto {
    pub id: Option<SubscriptionId>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price: f64,
    pub subscription_type: SubscriptionType,
}

impl From<Subscription> for SubscriptionDto {
    fn from(subscription: Subscription) -> Self {
        Self {
            id: subscription.id,
            start_date: subscription.start_date,
            end_date: subscription.end_date,
            price: subscription.price,
            subscription_type: subscription.subscription_type,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationDto {
    pub id: Option<RegistrationId>,
    pub week_number: u32,
    pub skier_id: Option<SkierId>,
    pub course_id: Option<CourseId>,
}

impl From<Registration> for RegistrationDto {
    fn from(registration: Registration) -> Self {
        Self {
            id: registration.id,
            week_number: registration.week_number,
            skier_id: registration.skier_id,
            course_id: registration.course_id,
        }
    }
}

/// Successful eligibility-checked registration, with the resolved parties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationRecordDto {
    pub registration: RegistrationDto,
    pub skier: SkierDto,
    pub course: CourseDto,
}

impl From<RegistrationRecord> for RegistrationRecordDto {
    fn from(record: RegistrationRecord) -> Self {
        Self {
            registration: record.registration.into(),
            skier: record.skier.into(),
            course: record.course.into(),
        }
    }
}

/// Response for `POST /v1/skiers/course/{course_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentResponse {
    pub skier: SkierDto,
    pub registrations: Vec<RegistrationDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeksResponse {
    pub instructor_id: InstructorId,
    pub support: Support,
    pub weeks: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// False when nothing matched the id
    pub deleted: bool,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_skier_request_flattens_fields() {
        let request: NewSkierRequest = serde_json::from_value(serde_json::json!({
            "first_name": "Lea",
            "last_name": "Martin",
            "date_of_birth": "2010-06-15",
            "city": "Annecy",
            "subscription": {
                "start_date": "2024-12-01",
                "price": 120.0,
                "subscription_type": "MONTHLY"
            }
        }))
        .unwrap();

        assert!(request.validate().is_ok());
        assert_eq!(request.skier.first_name, "Lea");
        assert_eq!(
            request.subscription.map(|s| s.subscription_type),
            Some(SubscriptionType::Monthly)
        );
    }

    #[test]
    fn test_validation_failures() {
        let blank = SkierFields {
            first_name: "  ".to_string(),
            last_name: "Martin".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            city: "Annecy".to_string(),
        };
        assert!(blank.validate().is_err());

        let course = CourseRequest {
            level: 0,
            course_type: CourseType::Individual,
            support: Support::Ski,
            price: 10.0,
            time_slot: 1,
        };
        assert!(course.validate().unwrap_err().contains("level"));

        let course = CourseRequest {
            level: 1,
            price: -1.0,
            ..course
        };
        assert!(course.validate().unwrap_err().contains("price"));

        assert!(RegistrationRequest { week_number: 0 }.validate().is_err());
    }

    #[test]
    fn test_unknown_course_type_does_not_deserialize() {
        let parsed = serde_json::from_value::<CourseRequest>(serde_json::json!({
            "level": 1,
            "course_type": "SENIOR",
            "support": "SKI",
            "price": 10.0,
            "time_slot": 1
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_update_request_carries_links() {
        let request = UpdateSkierRequest {
            skier: SkierFields {
                first_name: "Tom".to_string(),
                last_name: "Roux".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(2008, 2, 29).unwrap(),
                city: "Grenoble".to_string(),
            },
            subscription_id: Some(4),
            piste_ids: [2, 1].into_iter().collect(),
        };
        let skier = request.to_skier(SkierId::new(9));
        assert_eq!(skier.id, Some(SkierId::new(9)));
        assert_eq!(skier.subscription_id, Some(SubscriptionId::new(4)));

        let dto = SkierDto::from(skier);
        assert_eq!(dto.piste_ids, vec![PisteId::new(1), PisteId::new(2)]);
    }
}
