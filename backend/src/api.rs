//! Public API surface of the crate.
//!
//! Entities, identifiers and the registration outcome types, gathered in one
//! place for callers that embed the backend instead of going through HTTP.

pub use crate::models::{
    Course, CourseId, CourseType, Instructor, InstructorId, Piste, PisteColor, PisteId,
    Registration, RegistrationId, RegistrationRecord, Skier, SkierId, Subscription,
    SubscriptionId, SubscriptionType, Support, UnknownVariant,
};
pub use crate::services::registration::{
    RegistrationGate, RegistrationOutcome, RegistrationPolicy, RejectionReason,
};
