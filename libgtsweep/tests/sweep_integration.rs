//! End-to-end sweeps: credentials from a config file, timeline from the mock

use std::fs;
use std::time::Duration;

use libgtsweep::config::{self, CONFIG_ENV_VAR};
use libgtsweep::error::ConfigError;
use libgtsweep::platforms::mock::MockTimeline;
use libgtsweep::sweeper::FetchRetry;
use libgtsweep::{
    CredentialField, CredentialResolver, GtSweepError, PartialCredentials, SweepConfig,
    SweepEvent, Sweeper, TimelineItem,
};
use serial_test::serial;
use tempfile::TempDir;

fn quiet_config() -> SweepConfig {
    SweepConfig {
        action_delay: Duration::ZERO,
        retry: FetchRetry::default().with_base_delay(Duration::ZERO),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_drains_timeline_across_pages() {
    let items: Vec<TimelineItem> = (1..=250)
        .map(|id| {
            if id % 5 == 0 {
                TimelineItem::repost(id, format!("RT {}", id))
            } else {
                TimelineItem::post(id, format!("post {}", id))
            }
        })
        .collect();
    let timeline = MockTimeline::new(items);

    let mut removed_ids = Vec::new();
    let report = Sweeper::new(&timeline, quiet_config())
        .run_with(|event| {
            if let SweepEvent::Removed { id, .. } = event {
                removed_ids.push(*id);
            }
        })
        .await
        .unwrap();

    assert!(timeline.remaining().is_empty());
    assert_eq!(report.pages, 4);
    assert_eq!(report.deleted, 200);
    assert_eq!(report.unretweeted, 50);
    assert_eq!(report.removed(), 250);
    assert_eq!(removed_ids, (1..=250).collect::<Vec<u64>>());
    assert_eq!(timeline.requested_counts(), vec![100; 4]);
}

#[tokio::test]
async fn test_credentials_file_feeds_sweep() {
    let temp_dir = TempDir::new().unwrap();
    let rc = temp_dir.path().join(".gtrc");
    fs::write(
        &rc,
        "user=\"alice\"\nconsumer-key=ckey1234\nconsumer-secret=\"csecret99\"\n\
         access-token=tok-5555\naccess-secret=\"asecret00\"\n",
    )
    .unwrap();

    let overrides = PartialCredentials::default()
        .with(CredentialField::User, Some("bob".to_string()));
    let credentials = CredentialResolver::new(overrides)
        .with_config_file(Some(rc))
        .resolve()
        .unwrap();

    assert_eq!(credentials.username(), "bob");
    assert_eq!(credentials.consumer_key(), "ckey1234");

    let timeline = MockTimeline::new(vec![TimelineItem::post(1, "only")]);
    let report = Sweeper::new(&timeline, quiet_config()).run().await.unwrap();
    assert_eq!(report.deleted, 1);
}

#[test]
fn test_incomplete_file_reports_masked_values() {
    let temp_dir = TempDir::new().unwrap();
    let rc = temp_dir.path().join(".gtrc");
    fs::write(
        &rc,
        "user=alice\nconsumer-key=\"ABCDEFGHIJ\"\naccess-token=\"TOKEN-XYZ\"\n",
    )
    .unwrap();

    let err = CredentialResolver::new(PartialCredentials::default())
        .with_config_file(Some(rc))
        .resolve()
        .unwrap_err();

    match &err {
        GtSweepError::Config(ConfigError::IncompleteCredentials(report)) => {
            let missing: Vec<_> = report.missing().collect();
            assert_eq!(
                missing,
                vec![CredentialField::ConsumerSecret, CredentialField::AccessSecret]
            );
        }
        other => panic!("Expected IncompleteCredentials, got {:?}", other),
    }

    let message = err.to_string();
    assert!(message.contains("have username 'alice'"));
    assert!(message.contains("ABCD..."));
    assert!(!message.contains("ABCDEFGHIJ"));
    assert!(message.contains("missing consumer secret"));
    assert!(message.contains("missing access secret"));
    assert_eq!(err.exit_code(), 1);
}

#[test]
#[serial]
fn test_config_env_var_locates_default_file() {
    let temp_dir = TempDir::new().unwrap();
    let rc = temp_dir.path().join("elsewhere.rc");
    fs::write(
        &rc,
        "user=carol\nconsumer-key=k\nconsumer-secret=s\naccess-token=t\naccess-secret=a\n",
    )
    .unwrap();

    std::env::set_var(CONFIG_ENV_VAR, &rc);
    let located = config::resolve_config_path();
    let resolved = CredentialResolver::new(PartialCredentials::default()).resolve();
    std::env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(located.unwrap(), rc);
    assert_eq!(resolved.unwrap().username(), "carol");
}
