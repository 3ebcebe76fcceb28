//! Review-system and local patch application through the real patch tools.

use crate::common::{
    ChartRepoServer, PublishedChart, TestProject, chart_spec, serve_gerrit_patch, snapshot,
    tools_available,
};
use anyhow::Result;
use chart_vendor::models::ChangeId;
use predicates::prelude::*;
use std::collections::BTreeMap;
use wiremock::MockServer;

const MEMCACHED: &[(&str, &str)] = &[
    ("Chart.yaml", "apiVersion: v2\nname: memcached\nversion: 0.1.0\n"),
    ("values.yaml", "replicas: 1\n"),
    ("values_overrides/prod.yaml", "replicas: 5\n"),
];

fn bump(path: &str, from: u32, to: u32) -> String {
    format!("--- a/{path}\n+++ b/{path}\n@@ -1 +1 @@\n-replicas: {from}\n+replicas: {to}\n")
}

/// Review change touching the chart, its protected files and another chart.
fn review_diff() -> String {
    [
        bump("memcached/values.yaml", 1, 2),
        "--- a/memcached/Chart.yaml\n+++ b/memcached/Chart.yaml\n@@ -3 +3 @@\n-version: 0.1.0\n+version: 0.2.0-dev\n".to_string(),
        bump("memcached/values_overrides/prod.yaml", 5, 6),
        bump("redis/values.yaml", 1, 2),
    ]
    .concat()
}

async fn setup(project: &TestProject) -> Result<(ChartRepoServer, MockServer)> {
    let repo = ChartRepoServer::start(&[PublishedChart {
        name: "memcached",
        version: "0.1.0",
        files: MEMCACHED,
    }])
    .await;
    let gerrit = MockServer::start().await;
    serve_gerrit_patch(&gerrit, "101", &review_diff()).await;

    let mut chart = chart_spec("memcached", "0.1.0", &repo.url());
    let mut changes = BTreeMap::new();
    changes.insert(gerrit.uri(), vec![ChangeId::from(101)]);
    chart.patches.gerrit = changes;
    project.write_config(vec![chart])?;

    // Written out of order on purpose; application order is lexical
    project.write_file("charts/patches/memcached/0002-more.patch", &bump("memcached/values.yaml", 3, 4))?;
    project.write_file("charts/patches/memcached/0001-bump.patch", &bump("memcached/values.yaml", 2, 3))?;
    Ok((repo, gerrit))
}

#[tokio::test(flavor = "multi_thread")]
async fn test_patches_apply_in_order_and_skip_protected_files() -> Result<()> {
    if !tools_available(&["filterdiff", "patch"]) {
        return Ok(());
    }
    chart_vendor::test_utils::init_test_logging(None);
    let project = TestProject::new()?;
    let (_repo, _gerrit) = setup(&project).await?;

    project.command().assert().success();

    // 1 -> 2 (review) -> 3 (0001) -> 4 (0002)
    assert_eq!(project.read_file("charts/memcached/values.yaml")?, "replicas: 4\n");
    assert_eq!(
        project.read_file("charts/memcached/Chart.yaml")?,
        "apiVersion: v2\nname: memcached\nversion: 0.1.0\n"
    );
    assert_eq!(project.read_file("charts/memcached/values_overrides/prod.yaml")?, "replicas: 5\n");
    assert!(!project.path().join("charts/redis").exists());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_patched_vendoring_is_idempotent() -> Result<()> {
    if !tools_available(&["filterdiff", "patch"]) {
        return Ok(());
    }
    let project = TestProject::new()?;
    let (_repo, _gerrit) = setup(&project).await?;

    project.command().assert().success();
    let first = snapshot(&project.charts_root());
    project.command().assert().success();

    assert_eq!(snapshot(&project.charts_root()), first);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_conflicting_local_patch_fails_in_apply_stage() -> Result<()> {
    if !tools_available(&["filterdiff", "patch"]) {
        return Ok(());
    }
    let project = TestProject::new()?;
    let (_repo, _gerrit) = setup(&project).await?;
    project.write_file("charts/patches/memcached/0003-stale.patch", &bump("memcached/values.yaml", 7, 8))?;

    project
        .command()
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("patch application failed"))
        .stderr(predicate::str::contains("0003-stale.patch"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_review_change_fails() -> Result<()> {
    let project = TestProject::new()?;
    let (repo, gerrit) = setup(&project).await?;

    let mut chart = chart_spec("memcached", "0.1.0", &repo.url());
    let mut changes = BTreeMap::new();
    changes.insert(gerrit.uri(), vec![ChangeId::from(404)]);
    chart.patches.gerrit = changes;
    project.write_config(vec![chart])?;

    project
        .command()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to fetch patch for change 404"));
    Ok(())
}
