//! Domain entities of the ski station.
//!
//! Every entity carries an optional identifier: `None` until the persistence
//! gateway assigns one on insert.

pub mod course;
pub mod instructor;
pub mod kinds;
pub mod macros;
pub mod piste;
pub mod registration;
pub mod skier;
pub mod subscription;

pub use course::Course;
pub use instructor::Instructor;
pub use kinds::{CourseType, PisteColor, SubscriptionType, Support, UnknownVariant};
pub use piste::Piste;
pub use registration::{Registration, RegistrationRecord};
pub use skier::Skier;
pub use subscription::Subscription;

crate::define_id_type!(i64, SkierId, "Skier identifier (database primary key).");
crate::define_id_type!(i64, CourseId, "Course identifier (database primary key).");
crate::define_id_type!(
    i64,
    InstructorId,
    "Instructor identifier (database primary key)."
);
crate::define_id_type!(i64, PisteId, "Piste identifier (database primary key).");
crate::define_id_type!(
    i64,
    RegistrationId,
    "Registration identifier (database primary key)."
);
crate::define_id_type!(
    i64,
    SubscriptionId,
    "Subscription identifier (database primary key)."
);
