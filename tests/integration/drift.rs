//! `--check` drift detection against a real git working tree.

use crate::common::{ChartRepoServer, PublishedChart, TestProject, chart_spec, tools_available};
use anyhow::Result;
use chart_vendor::test_utils::TestGit;
use predicates::prelude::*;

const MEMCACHED: &[(&str, &str)] = &[
    ("Chart.yaml", "apiVersion: v2\nname: memcached\nversion: 0.1.0\n"),
    ("values.yaml", "replicas: 1\n"),
];

async fn committed_project() -> Result<(TestProject, ChartRepoServer)> {
    let repo = ChartRepoServer::start(&[PublishedChart {
        name: "memcached",
        version: "0.1.0",
        files: MEMCACHED,
    }])
    .await;
    let project = TestProject::new()?;
    project.write_config(vec![chart_spec("memcached", "0.1.0", &repo.url())])?;

    let git = TestGit::new(project.path());
    git.init()?;
    project.command().assert().success();
    git.commit_all("Vendor charts")?;
    Ok((project, repo))
}

#[tokio::test(flavor = "multi_thread")]
async fn test_check_passes_on_clean_tree() -> Result<()> {
    if !tools_available(&["git"]) {
        return Ok(());
    }
    let (project, _repo) = committed_project().await?;

    project
        .command()
        .arg("--check")
        .assert()
        .success()
        .stderr(predicate::str::contains("No uncommitted changes"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_check_reports_untracked_files() -> Result<()> {
    if !tools_available(&["git"]) {
        return Ok(());
    }
    let (project, _repo) = committed_project().await?;
    project.write_file("notes.txt", "scratch\n")?;

    project
        .command()
        .arg("--check")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Untracked file: notes.txt"))
        .stderr(predicate::str::contains("Uncommitted changes or untracked files found"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_check_reports_local_edits_to_vendored_files() -> Result<()> {
    if !tools_available(&["git"]) {
        return Ok(());
    }
    let (project, _repo) = committed_project().await?;
    project.write_file("charts/memcached/values.yaml", "replicas: 9\n")?;
    let git = TestGit::new(project.path());
    git.commit_all("Hand edit")?;

    // Re-vendoring restores upstream content, which git sees as a change
    project
        .command()
        .arg("--check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Changed file: charts/memcached/values.yaml"));
    Ok(())
}
