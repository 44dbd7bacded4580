use chrono::NaiveDate;

use super::repositories::LocalRepository;
use super::repository::RepositoryError;
use super::services;
use crate::models::{
    Course, CourseId, CourseType, Instructor, Piste, PisteColor, Registration, RegistrationId,
    Skier, SkierId, Subscription, SubscriptionId, SubscriptionType, Support,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn skier(first: &str) -> Skier {
    Skier::new(first, "Durand", date(1992, 4, 18), "Grenoble")
}

fn pass(start: NaiveDate, subscription_type: SubscriptionType) -> Subscription {
    Subscription {
        id: None,
        start_date: start,
        end_date: start,
        price: 350.0,
        subscription_type,
    }
}

fn piste(name: &str) -> Piste {
    Piste {
        id: None,
        name: name.to_string(),
        color: PisteColor::Red,
        length_m: 1800,
        slope: 28,
    }
}

#[tokio::test]
async fn test_add_skier_creates_attached_subscription() {
    let repo = LocalRepository::new();
    let stored = services::add_skier(
        &repo,
        &skier("Nina"),
        Some(pass(date(2024, 12, 1), SubscriptionType::SemiAnnual)),
    )
    .await
    .unwrap();

    let subscription_id = stored.subscription_id.expect("subscription linked");
    let subscription = services::retrieve_subscription(&repo, subscription_id)
        .await
        .unwrap();
    assert_eq!(subscription.end_date, date(2025, 6, 1));
}

#[tokio::test]
async fn test_retrieve_missing_skier_is_not_found() {
    let repo = LocalRepository::new();
    let err = services::retrieve_skier(&repo, SkierId(404)).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.message(), "Skier 404 not found");
}

#[tokio::test]
async fn test_remove_absent_entities_is_a_no_op() {
    let repo = LocalRepository::new();
    assert!(!services::remove_skier(&repo, SkierId(1)).await.unwrap());
    assert!(!services::remove_course(&repo, CourseId(1)).await.unwrap());
    assert!(!services::remove_subscription(&repo, SubscriptionId(1))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_update_skier_without_id_is_rejected() {
    let repo = LocalRepository::new();
    let err = services::update_skier(&repo, &skier("Ghost")).await.unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));
}

#[tokio::test]
async fn test_assign_piste_is_idempotent() {
    let repo = LocalRepository::new();
    let skier_id = services::add_skier(&repo, &skier("Tom"), None)
        .await
        .unwrap()
        .id
        .unwrap();
    let piste_id = services::add_piste(&repo, &piste("Vallée Blanche"))
        .await
        .unwrap()
        .id
        .unwrap();

    services::assign_skier_to_piste(&repo, skier_id, piste_id)
        .await
        .unwrap();
    let again = services::assign_skier_to_piste(&repo, skier_id, piste_id)
        .await
        .unwrap();
    assert_eq!(again.piste_ids.len(), 1);
    assert!(again.piste_ids.contains(&piste_id));
}

#[tokio::test]
async fn test_assign_unknown_subscription_leaves_skier_untouched() {
    let repo = LocalRepository::new();
    let skier_id = services::add_skier(&repo, &skier("Lou"), None)
        .await
        .unwrap()
        .id
        .unwrap();

    let err = services::assign_skier_to_subscription(&repo, skier_id, SubscriptionId(9))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    let current = services::retrieve_skier(&repo, skier_id).await.unwrap();
    assert_eq!(current.subscription_id, None);
}

#[tokio::test]
async fn test_bulk_enrollment_creates_one_registration_per_week() {
    let repo = LocalRepository::new();
    let course_id = services::add_course(
        &repo,
        &Course::new(CourseType::CollectiveChildren, Support::Snowboard),
    )
    .await
    .unwrap()
    .id
    .unwrap();

    // Adults are accepted here: the bulk path applies no age rule.
    let (stored, registrations) = services::add_skier_and_assign_to_course(
        &repo,
        &skier("Max"),
        None,
        &[2, 3, 5],
        course_id,
    )
    .await
    .unwrap();

    assert_eq!(registrations.len(), 3);
    assert!(registrations
        .iter()
        .all(|r| r.skier_id == stored.id && r.course_id == Some(course_id)));
    let weeks: Vec<u32> = registrations.iter().map(|r| r.week_number).collect();
    assert_eq!(weeks, vec![2, 3, 5]);
}

#[tokio::test]
async fn test_bulk_enrollment_with_unknown_course_creates_nothing() {
    let repo = LocalRepository::new();
    let err = services::add_skier_and_assign_to_course(&repo, &skier("Zoe"), None, &[1], CourseId(3))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(services::retrieve_all_skiers(&repo).await.unwrap().is_empty());
    assert_eq!(repo.registration_count(), 0);
}

#[tokio::test]
async fn test_skiers_by_subscription_type() {
    let repo = LocalRepository::new();
    services::add_skier(
        &repo,
        &skier("Annual"),
        Some(pass(date(2024, 11, 1), SubscriptionType::Annual)),
    )
    .await
    .unwrap();
    services::add_skier(
        &repo,
        &skier("Monthly"),
        Some(pass(date(2024, 11, 1), SubscriptionType::Monthly)),
    )
    .await
    .unwrap();
    services::add_skier(&repo, &skier("None"), None).await.unwrap();

    let annual =
        services::retrieve_skiers_by_subscription_type(&repo, SubscriptionType::Annual)
            .await
            .unwrap();
    assert_eq!(annual.len(), 1);
    assert_eq!(annual[0].first_name, "Annual");
}

#[tokio::test]
async fn test_subscription_queries() {
    let repo = LocalRepository::new();
    for start in [date(2025, 2, 1), date(2024, 12, 1), date(2025, 1, 1)] {
        services::add_subscription(&repo, pass(start, SubscriptionType::Monthly))
            .await
            .unwrap();
    }
    services::add_subscription(&repo, pass(date(2025, 1, 15), SubscriptionType::Annual))
        .await
        .unwrap();

    let monthly = services::retrieve_subscriptions_by_type(&repo, SubscriptionType::Monthly)
        .await
        .unwrap();
    let starts: Vec<NaiveDate> = monthly.iter().map(|s| s.start_date).collect();
    assert_eq!(
        starts,
        vec![date(2024, 12, 1), date(2025, 1, 1), date(2025, 2, 1)]
    );

    let january =
        services::retrieve_subscriptions_by_dates(&repo, date(2025, 1, 1), date(2025, 1, 31))
            .await
            .unwrap();
    assert_eq!(january.len(), 2);

    let err = services::retrieve_subscriptions_by_dates(&repo, date(2025, 2, 1), date(2025, 1, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));
}

#[tokio::test]
async fn test_update_subscription_rederives_end_date() {
    let repo = LocalRepository::new();
    let mut stored = services::add_subscription(&repo, pass(date(2025, 1, 31), SubscriptionType::Monthly))
        .await
        .unwrap();
    assert_eq!(stored.end_date, date(2025, 2, 28));

    stored.subscription_type = SubscriptionType::Annual;
    let updated = services::update_subscription(&repo, stored).await.unwrap();
    assert_eq!(updated.end_date, date(2026, 1, 31));
}

#[tokio::test]
async fn test_registration_linking() {
    let repo = LocalRepository::new();
    let skier_id = services::add_skier(&repo, &skier("Eli"), None)
        .await
        .unwrap()
        .id
        .unwrap();
    let course_id = services::add_course(&repo, &Course::new(CourseType::Individual, Support::Ski))
        .await
        .unwrap()
        .id
        .unwrap();

    let registration =
        services::add_registration_and_assign_to_skier(&repo, &Registration::for_week(8), skier_id)
            .await
            .unwrap();
    assert_eq!(registration.skier_id, Some(skier_id));
    assert_eq!(registration.course_id, None);

    let linked =
        services::assign_registration_to_course(&repo, registration.id.unwrap(), course_id)
            .await
            .unwrap();
    assert_eq!(linked.course_id, Some(course_id));

    let err = services::assign_registration_to_course(&repo, RegistrationId(77), course_id)
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err =
        services::add_registration_and_assign_to_skier(&repo, &Registration::for_week(0), skier_id)
            .await
            .unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));
}

#[tokio::test]
async fn test_weeks_for_instructor_by_support() {
    let repo = LocalRepository::new();
    let ski = services::add_course(&repo, &Course::new(CourseType::CollectiveAdult, Support::Ski))
        .await
        .unwrap()
        .id
        .unwrap();
    let board = services::add_course(
        &repo,
        &Course::new(CourseType::CollectiveAdult, Support::Snowboard),
    )
    .await
    .unwrap()
    .id
    .unwrap();

    let mut instructor = Instructor::new("Paul", "Girard", date(2015, 11, 2));
    instructor.course_ids.insert(board);
    let instructor = services::add_instructor_and_assign_to_course(&repo, &instructor, ski)
        .await
        .unwrap();
    assert_eq!(instructor.course_ids.len(), 2);

    services::add_skier_and_assign_to_course(&repo, &skier("A"), None, &[7, 2], ski)
        .await
        .unwrap();
    services::add_skier_and_assign_to_course(&repo, &skier("B"), None, &[2], ski)
        .await
        .unwrap();
    services::add_skier_and_assign_to_course(&repo, &skier("C"), None, &[4], board)
        .await
        .unwrap();

    let weeks =
        services::weeks_for_instructor_by_support(&repo, instructor.id.unwrap(), Support::Ski)
            .await
            .unwrap();
    assert_eq!(weeks, vec![2, 2, 7]);

    let weeks = services::weeks_for_instructor_by_support(
        &repo,
        instructor.id.unwrap(),
        Support::Snowboard,
    )
    .await
    .unwrap();
    assert_eq!(weeks, vec![4]);
}

#[tokio::test]
async fn test_add_instructor_to_unknown_course_fails() {
    let repo = LocalRepository::new();
    let instructor = Instructor::new("Ines", "Blanc", date(2019, 12, 1));
    let err = services::add_instructor_and_assign_to_course(&repo, &instructor, CourseId(5))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(services::retrieve_all_instructors(&repo).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_health_check_reflects_repository_state() {
    let repo = LocalRepository::new();
    assert!(services::health_check(&repo).await.unwrap());
    repo.set_healthy(false);
    assert!(!services::health_check(&repo).await.unwrap());
}
