//! Chained external-process pipeline.
//!
//! A [`ProcessPipeline`] runs a fixed sequence of [`Stage`]s, each an external
//! process, with every stage's stdout connected to the next stage's stdin. The
//! driver is responsible for keeping every pipe drained:
//!
//! - all stages are spawned first, in pipeline order
//! - a supervised writer task feeds the input into the first stage and closes
//!   its stdin when done
//! - one link task per adjacent pair copies stdout into the next stdin and
//!   closes that stdin on EOF, which signals end-of-input downstream
//! - every stderr, and the last stage's stdout, is drained by its own task
//!
//! Only then are the children awaited, all of them, in pipeline order. A failed
//! run is reported as [`ChartVendorError::PatchStageFailed`] for the most
//! downstream stage that failed on its own. Upstream stages that died of a
//! broken pipe are treated as a consequence of that failure, not its cause.
//! A stage that exits successfully without reading all of its input is a
//! failure of that stage.

use anyhow::{Context, Result};
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;

use crate::core::{ChartVendorError, PatchStage};

/// One external process of a pipeline.
#[derive(Debug, Clone)]
pub struct Stage {
    /// Which pipeline stage failures are attributed to
    pub kind: PatchStage,
    /// Executable to run
    pub program: PathBuf,
    /// Arguments
    pub args: Vec<OsString>,
}

impl Stage {
    /// Create a stage running `program` without arguments.
    pub fn new(kind: PatchStage, program: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    fn spawn(&self) -> Result<Child> {
        Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                let error = if e.kind() == io::ErrorKind::NotFound {
                    anyhow::Error::from(ChartVendorError::ToolNotFound {
                        tool: self.program.display().to_string(),
                    })
                } else {
                    anyhow::Error::from(ChartVendorError::PatchStageFailed {
                        stage: self.kind,
                        status: None,
                        output: e.to_string(),
                    })
                };
                error.context(format!("Failed to start {}", self.kind))
            })
    }
}

/// Captured result of a successful pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    /// Standard output of the last stage
    pub stdout: String,
    /// Standard error of every stage, in pipeline order
    pub stderr: Vec<String>,
}

/// A sequence of external processes connected by pipes.
///
/// # Examples
///
/// ```rust,no_run
/// use chart_vendor::core::PatchStage;
/// use chart_vendor::patch::pipeline::{ProcessPipeline, Stage};
///
/// # async fn example() -> anyhow::Result<()> {
/// let pipeline = ProcessPipeline::new(vec![
///     Stage::new(PatchStage::IncludeFilter, "cat"),
///     Stage::new(PatchStage::Apply, "wc").arg("-l"),
/// ]);
/// let output = pipeline.run(b"one\ntwo\n".to_vec()).await?;
/// assert_eq!(output.stdout.trim(), "2");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ProcessPipeline {
    stages: Vec<Stage>,
}

struct Running {
    kind: PatchStage,
    child: Child,
    stderr: JoinHandle<io::Result<Vec<u8>>>,
    input: JoinHandle<io::Result<u64>>,
}

impl ProcessPipeline {
    /// Create a pipeline from stages in execution order.
    pub fn new(stages: Vec<Stage>) -> Self {
        Self {
            stages,
        }
    }

    /// The configured stages.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Run the pipeline, feeding `input` into the first stage.
    pub async fn run(&self, input: Vec<u8>) -> Result<PipelineOutput> {
        if self.stages.is_empty() {
            anyhow::bail!("Pipeline has no stages");
        }

        let mut children = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            tracing::trace!(stage = %stage.kind, program = %stage.program.display(), "starting stage");
            children.push(stage.spawn()?);
        }

        let mut running = Vec::with_capacity(children.len());
        let mut upstream: Option<ChildStdout> = None;
        let mut input = input;

        for (stage, mut child) in self.stages.iter().zip(children) {
            let stdin = child.stdin.take().context("stage stdin was not captured")?;
            let stdout = child.stdout.take().context("stage stdout was not captured")?;
            let stderr = child.stderr.take().context("stage stderr was not captured")?;

            let input_task = match upstream.take() {
                Some(from) => tokio::spawn(link(from, stdin)),
                None => tokio::spawn(feed(stdin, std::mem::take(&mut input))),
            };

            upstream = Some(stdout);
            running.push(Running {
                kind: stage.kind,
                child,
                stderr: tokio::spawn(drain(stderr)),
                input: input_task,
            });
        }

        let last_stdout = upstream.context("pipeline has no final stdout")?;
        let collector = tokio::spawn(drain(last_stdout));

        // Wait for every stage before judging any of them: a stage that exits
        // early breaks the pipes of the stages feeding it.
        let mut finished = Vec::with_capacity(running.len());
        for stage in running {
            let Running {
                kind,
                mut child,
                stderr,
                input,
            } = stage;

            let status = child.wait().await.with_context(|| format!("Failed to wait for {kind}"))?;
            let stderr = stderr.await.context("stderr drain task panicked")?.unwrap_or_default();
            let delivered = input.await.context("pipe task panicked")?;
            finished.push(Finished {
                kind,
                status,
                stderr: String::from_utf8_lossy(&stderr).into_owned(),
                delivered,
            });
        }
        let final_stdout = collector.await.context("stdout drain task panicked")?.unwrap_or_default();
        let final_stdout = String::from_utf8_lossy(&final_stdout).into_owned();

        if let Some(index) = blamed_stage(&finished) {
            let last_index = finished.len() - 1;
            let stage = finished.swap_remove(index);
            let output = if !stage.status.success() {
                let mut output = stage.stderr;
                if index == last_index {
                    // `patch` reports rejected hunks on stdout
                    output.push_str(&final_stdout);
                }
                output
            } else {
                let reason = stage.delivered.err().map(|e| e.to_string()).unwrap_or_default();
                format!("input was not fully consumed: {reason}")
            };
            tracing::debug!(stage = %stage.kind, code = ?stage.status.code(), "stage failed");
            return Err(ChartVendorError::PatchStageFailed {
                stage: stage.kind,
                status: stage.status.code(),
                output,
            }
            .into());
        }

        Ok(PipelineOutput {
            stdout: final_stdout,
            stderr: finished.into_iter().map(|stage| stage.stderr).collect(),
        })
    }
}

struct Finished {
    kind: PatchStage,
    status: ExitStatus,
    stderr: String,
    delivered: io::Result<u64>,
}

/// Index of the stage a failed run is attributed to, if any stage failed.
///
/// The most downstream stage that failed on its own wins. Upstream stages
/// killed by a broken pipe only failed because that stage stopped reading.
/// When every failure is a broken pipe, the stage that closed its input
/// early is blamed.
fn blamed_stage(finished: &[Finished]) -> Option<usize> {
    let failed_on_own = |stage: &Finished| {
        !stage.status.success() && !is_broken_pipe(&stage.status)
    };
    if let Some(index) = finished.iter().rposition(failed_on_own) {
        return Some(index);
    }
    if let Some(index) = finished.iter().rposition(|stage| stage.delivered.is_err()) {
        return Some(index);
    }
    finished.iter().position(|stage| !stage.status.success())
}

/// Whether the process died writing to a closed pipe (SIGPIPE, or a shell
/// reporting it as 128 + 13).
fn is_broken_pipe(status: &ExitStatus) -> bool {
    const SIGPIPE: i32 = 13;
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if status.signal() == Some(SIGPIPE) {
            return true;
        }
    }
    status.code() == Some(128 + SIGPIPE)
}

async fn feed(mut stdin: ChildStdin, data: Vec<u8>) -> io::Result<u64> {
    stdin.write_all(&data).await?;
    stdin.shutdown().await?;
    Ok(data.len() as u64)
}

async fn link(mut from: ChildStdout, mut to: ChildStdin) -> io::Result<u64> {
    let copied = tokio::io::copy(&mut from, &mut to).await?;
    to.shutdown().await?;
    Ok(copied)
}

async fn drain<R: tokio::io::AsyncRead + Unpin>(mut reader: R) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer).await?;
    Ok(buffer)
}
