//! Tests for loading `repository.toml` and resolving registration rules.

mod support;

use std::io::Write;

use ski_station::db::{RepositoryConfig, RepositoryFactory, RepositoryType};
use ski_station::db::{HealthRepository, RepositoryError};
use ski_station::services::RegistrationPolicy;

const LOCAL_CONFIG: &str = r#"
[repository]
type = "local"

[registration]
course_capacity = 8
"#;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_config_file() {
    let file = write_config(LOCAL_CONFIG);
    let config = RepositoryConfig::from_file(file.path()).unwrap();

    assert_eq!(config.repository_type().unwrap(), RepositoryType::Local);
    let policy = config.registration_policy(RegistrationPolicy::default());
    assert_eq!(policy.course_capacity, 8);
    assert_eq!(policy.adult_age, 16);
}

#[test]
fn test_missing_file_is_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = RepositoryConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, RepositoryError::ConfigurationError { .. }));
}

#[test]
fn test_malformed_file_is_configuration_error() {
    let file = write_config("[repository\ntype = ");
    let err = RepositoryConfig::from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[tokio::test]
async fn test_factory_from_config_file() {
    let file = write_config(LOCAL_CONFIG);
    let repo = RepositoryFactory::from_config_file(file.path()).await.unwrap();
    assert!(repo.health_check().await.unwrap());
}

#[test]
fn test_environment_overrides_file_rules() {
    let file = write_config(LOCAL_CONFIG);
    let config = RepositoryConfig::from_file(file.path()).unwrap();

    support::with_scoped_env(
        &[
            ("SKI_COURSE_CAPACITY", Some("4")),
            ("SKI_ADULT_AGE", Some("not-a-number")),
        ],
        || {
            let policy = config
                .registration_policy(RegistrationPolicy::default())
                .with_env_overrides();
            assert_eq!(policy.course_capacity, 4);
            // Unparseable values are ignored.
            assert_eq!(policy.adult_age, 16);
        },
    );
}

#[test]
fn test_policy_from_env_defaults() {
    support::with_scoped_env(
        &[("SKI_COURSE_CAPACITY", None), ("SKI_ADULT_AGE", None)],
        || assert_eq!(RegistrationPolicy::from_env(), RegistrationPolicy::default()),
    );
}
