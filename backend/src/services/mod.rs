//! Business rules that sit on top of the repository layer.
//!
//! Plain CRUD and linking live in [`crate::db::services`]; this module holds
//! the eligibility-checked registration.

pub mod registration;


pub use registration::{
    register_skier_to_course, register_skier_to_course_on, GatePass, RegistrationGate,
    RegistrationOutcome, RegistrationPolicy, RejectionReason, DEFAULT_ADULT_AGE,
    DEFAULT_COURSE_CAPACITY,
};
