//! End-to-end service flows through the public API, using the repository
//! as the server does: behind `Arc<dyn FullRepository>`.

use std::sync::Arc;

use chrono::NaiveDate;
use ski_station::db::repositories::LocalRepository;
use ski_station::db::services;
use ski_station::db::{FullRepository, RegistrationRepository};
use ski_station::models::{
    Course, CourseType, Registration, Skier, Subscription, SubscriptionType, Support,
};
use ski_station::services::{
    register_skier_to_course_on, RegistrationGate, RegistrationPolicy, RejectionReason,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn shared_repo() -> Arc<dyn FullRepository> {
    Arc::new(LocalRepository::new())
}

#[tokio::test]
async fn test_season_flow() {
    let repo = shared_repo();
    let policy = RegistrationPolicy::default();
    let gate = RegistrationGate::new();
    let today = date(2025, 1, 10);

    let pass = Subscription::starting(date(2024, 12, 1), 620.0, SubscriptionType::SemiAnnual)
        .unwrap();
    let child = services::add_skier(
        repo.as_ref(),
        &Skier::new("Jules", "Perrin", date(2014, 3, 2), "Albertville"),
        Some(pass),
    )
    .await
    .unwrap();
    let parent = services::add_skier(
        repo.as_ref(),
        &Skier::new("Claire", "Perrin", date(1984, 7, 21), "Albertville"),
        None,
    )
    .await
    .unwrap();

    let kids = services::add_course(
        repo.as_ref(),
        &Course::new(CourseType::CollectiveChildren, Support::Ski),
    )
    .await
    .unwrap();
    let kids_id = kids.id.unwrap();

    let outcome = register_skier_to_course_on(
        repo.as_ref(),
        &policy,
        &gate,
        &Registration::for_week(2),
        child.id.unwrap(),
        kids_id,
        today,
    )
    .await
    .unwrap();
    let record = outcome.into_result().unwrap();
    assert_eq!(record.skier.first_name, "Jules");
    assert_eq!(record.course.id, Some(kids_id));
    assert_eq!(record.registration.week_number, 2);

    let outcome = register_skier_to_course_on(
        repo.as_ref(),
        &policy,
        &gate,
        &Registration::for_week(2),
        parent.id.unwrap(),
        kids_id,
        today,
    )
    .await
    .unwrap();
    assert_eq!(
        outcome.rejection(),
        Some(RejectionReason::AgeIneligible {
            age: 40,
            course_type: CourseType::CollectiveChildren,
        })
    );

    let semi_annual =
        services::retrieve_skiers_by_subscription_type(repo.as_ref(), SubscriptionType::SemiAnnual)
            .await
            .unwrap();
    assert_eq!(semi_annual.len(), 1);
    assert_eq!(semi_annual[0].id, child.id);

    let registrations = services::retrieve_all_registrations(repo.as_ref())
        .await
        .unwrap();
    assert_eq!(registrations.len(), 1);
}

#[tokio::test]
async fn test_removing_course_does_not_disturb_other_courses() {
    let repo = shared_repo();
    let board = services::add_course(
        repo.as_ref(),
        &Course::new(CourseType::Individual, Support::Snowboard),
    )
    .await
    .unwrap();
    let ski = services::add_course(repo.as_ref(), &Course::new(CourseType::Individual, Support::Ski))
        .await
        .unwrap();

    assert!(services::remove_course(repo.as_ref(), board.id.unwrap())
        .await
        .unwrap());
    let remaining = services::retrieve_all_courses(repo.as_ref()).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, ski.id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registrations_share_one_gate() {
    let repo = shared_repo();
    let policy = RegistrationPolicy {
        course_capacity: 3,
        ..RegistrationPolicy::default()
    };
    let gate = RegistrationGate::new();
    let course = services::add_course(
        repo.as_ref(),
        &Course::new(CourseType::CollectiveAdult, Support::Ski),
    )
    .await
    .unwrap();
    let course_id = course.id.unwrap();

    let mut skier_ids = Vec::new();
    for i in 0..8 {
        let skier = services::add_skier(
            repo.as_ref(),
            &Skier::new(format!("Skier{}", i), "Roche", date(1990, 1, 1), "Megeve"),
            None,
        )
        .await
        .unwrap();
        skier_ids.push(skier.id.unwrap());
    }

    let mut handles = Vec::new();
    for skier_id in skier_ids {
        let repo = Arc::clone(&repo);
        let gate = gate.clone();
        handles.push(tokio::spawn(async move {
            register_skier_to_course_on(
                repo.as_ref(),
                &policy,
                &gate,
                &Registration::for_week(5),
                skier_id,
                course_id,
                date(2025, 2, 1),
            )
            .await
            .unwrap()
        }));
    }

    let mut registered = 0;
    let mut full = 0;
    for handle in handles {
        match handle.await.unwrap().rejection() {
            None => registered += 1,
            Some(RejectionReason::CourseFull { capacity: 3 }) => full += 1,
            Some(other) => panic!("unexpected rejection: {:?}", other),
        }
    }
    assert_eq!(registered, 3);
    assert_eq!(full, 5);
    assert_eq!(
        repo.count_registrations_for_course_week(course_id, 5)
            .await
            .unwrap(),
        3
    );
}
