//! Fetching, dependencies, lock files and rollback.

use crate::common::{
    ChartRepoServer, PublishedChart, TestProject, chart_spec, dependency, snapshot,
};
use anyhow::Result;
use chart_vendor::core::ChartVendorError;
use chart_vendor::lockfile::{LockRecord, compute_digest};
use chart_vendor::patch::PatchTools;
use chart_vendor::vendor::ChartVendor;
use predicates::prelude::*;

const MEMCACHED: &[(&str, &str)] = &[
    ("Chart.yaml", "apiVersion: v2\nname: memcached\nversion: 0.1.0\n"),
    ("values.yaml", "replicas: 1\n"),
    ("templates/service.yaml", "kind: Service\n"),
];
const COMMON: &[(&str, &str)] = &[("Chart.yaml", "apiVersion: v2\nname: common\nversion: 2.0.0\n")];

async fn repository() -> ChartRepoServer {
    ChartRepoServer::start(&[
        PublishedChart {
            name: "memcached",
            version: "0.1.0",
            files: MEMCACHED,
        },
        PublishedChart {
            name: "common",
            version: "2.0.0",
            files: COMMON,
        },
    ])
    .await
}

#[tokio::test(flavor = "multi_thread")]
async fn test_vendor_chart_with_dependency() -> Result<()> {
    chart_vendor::test_utils::init_test_logging(None);
    let repo = repository().await;
    let project = TestProject::new()?;

    let mut chart = chart_spec("memcached", "0.1.0", &repo.url());
    chart.dependencies = vec![dependency("common", "2.0.0", &repo.url())];
    project.write_config(vec![chart.clone()])?;

    project.command().assert().success();

    assert_eq!(project.read_file("charts/memcached/values.yaml")?, "replicas: 1\n");
    assert_eq!(
        project.read_file("charts/memcached/requirements.yaml")?,
        format!(
            "dependencies:\n- name: common\n  repository: {}\n  version: 2.0.0\n",
            repo.url()
        )
    );
    assert!(project.path().join("charts/memcached/charts/common/Chart.yaml").is_file());

    let lock = LockRecord::load(&project.charts_root().join("memcached/requirements.lock"))?;
    assert_eq!(lock.dependencies, chart.dependencies);
    assert_eq!(lock.digest, compute_digest(&chart.dependencies)?);

    let dep_lock =
        LockRecord::load(&project.charts_root().join("memcached/charts/common/requirements.lock"))?;
    assert!(dep_lock.dependencies.is_empty());
    assert_eq!(
        dep_lock.digest,
        "sha256:643d5437104296e21d906ecb15b2c96ad278f20cfc4af53b12bb6069bd853726"
    );

    // No backup or staging directories are left behind
    let mut entries: Vec<_> = std::fs::read_dir(project.charts_root())?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<Result<_, _>>()?;
    entries.sort();
    assert_eq!(entries, vec!["memcached"]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_revendoring_is_byte_identical() -> Result<()> {
    let repo = repository().await;
    let project = TestProject::new()?;
    let mut chart = chart_spec("memcached", "0.1.0", &repo.url());
    chart.directory = Some("cache".to_string());
    chart.dependencies = vec![dependency("common", "2.0.0", &repo.url())];
    project.write_config(vec![chart])?;

    project.command().assert().success();
    let first = snapshot(&project.charts_root());

    project.write_file("charts/cache/templates/local-edit.yaml", "kind: ConfigMap\n")?;
    project.command().assert().success();

    assert_eq!(snapshot(&project.charts_root()), first);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_fetch_rolls_back_existing_directory() -> Result<()> {
    let repo = repository().await;
    let project = TestProject::new()?;
    project.write_file("charts/memcached/Chart.yaml", "name: memcached\nversion: 0.0.9\n")?;
    project.write_file("charts/memcached/templates/old.yaml", "kind: Secret\n")?;
    let before = snapshot(&project.charts_root());

    let vendor =
        ChartVendor::with_client(project.charts_root(), reqwest::Client::new(), PatchTools::default());
    let err = vendor
        .fetch_chart(&chart_spec("memcached", "9.9.9", &repo.url()))
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ChartVendorError>(),
        Some(ChartVendorError::ChartNotFound { .. })
    ));
    assert_eq!(snapshot(&project.charts_root()), before);
    assert!(!project.charts_root().join("memcached-9.9.9").exists());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_one_failing_chart_does_not_stop_the_others() -> Result<()> {
    let repo = repository().await;
    let project = TestProject::new()?;
    project.write_config(vec![
        chart_spec("missing", "1.0.0", &repo.url()),
        chart_spec("memcached", "0.1.0", &repo.url()),
    ])?;

    project
        .command()
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Could not find chart 'missing' with version '1.0.0'"));

    assert!(project.charts_root().join("memcached/requirements.lock").is_file());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_selecting_charts_by_name() -> Result<()> {
    let repo = repository().await;
    let project = TestProject::new()?;
    project.write_config(vec![
        chart_spec("memcached", "0.1.0", &repo.url()),
        chart_spec("common", "2.0.0", &repo.url()),
    ])?;

    project.command().arg("common").assert().success();

    assert!(project.charts_root().join("common/Chart.yaml").is_file());
    assert!(!project.charts_root().join("memcached").exists());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_selection_is_not_an_error() -> Result<()> {
    let repo = repository().await;
    let project = TestProject::new()?;
    project.write_config(vec![chart_spec("memcached", "0.1.0", &repo.url())])?;

    project
        .command()
        .arg("redis")
        .assert()
        .success()
        .stderr(predicate::str::contains("No chart configured to fetch."));
    Ok(())
}

#[test]
fn test_invalid_config_is_reported() -> Result<()> {
    let project = TestProject::new()?;
    project.write_file(
        ".charts.yml",
        "charts:\n  - name: memcached\n    version: \"\"\n    repository:\n      url: https://charts.example.com\n",
    )?;

    project
        .command()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"))
        .stderr(predicate::str::contains("version must not be empty"));
    Ok(())
}
