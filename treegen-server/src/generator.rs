//! Generator invoker trait and implementations
//!
//! Provides a trait for starting the external tree generator, with:
//! - Real implementation using tokio::process (stdout and stderr merged)
//! - Scripted implementation for tests
//!
//! The process is spawned with kill-on-drop: once the output stream is
//! dropped (the viewer closed its connection) the generator is terminated.

use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::future;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{info, warn};

/// Lines of generator output, in the order they were read
pub type OutputLines = BoxStream<'static, io::Result<String>>;

/// Trait for generator execution (testable)
#[async_trait]
pub trait GeneratorInvoker: Send + Sync {
    async fn spawn(&self) -> Result<OutputLines, InvokeError>;
}

/// Error while starting the generator
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("generator command is empty")]
    EmptyCommand,
}

/// Extract the image filename from a generator output line.
///
/// The filename is whatever follows the last occurrence of `marker`.
pub fn rendered_filename<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    if marker.is_empty() || !line.contains(marker) {
        return None;
    }

    let name = line.trim().rsplit(marker).next()?.trim();
    (!name.is_empty()).then_some(name)
}

/// Real invoker spawning a child process
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    program: String,
    args: Vec<String>,
    workdir: Option<PathBuf>,
}

impl ProcessInvoker {
    /// `command` is the program followed by its arguments
    pub fn new(command: &[String], workdir: Option<PathBuf>) -> Result<Self, InvokeError> {
        let (program, args) = command.split_first().ok_or(InvokeError::EmptyCommand)?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            workdir,
        })
    }
}

#[async_trait]
impl GeneratorInvoker for ProcessInvoker {
    async fn spawn(&self) -> Result<OutputLines, InvokeError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.workdir {
            command.current_dir(dir);
        }

        let mut child = command.spawn()?;
        info!(program = %self.program, pid = ?child.id(), "generator started");

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("generator stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::other("generator stderr was not captured"))?;

        let output = stream::select(
            line_stream(BufReader::new(stdout)),
            line_stream(BufReader::new(stderr)),
        );

        // The child lives inside the stream so dropping the stream kills it
        let reaper = stream::once(async move {
            match child.wait().await {
                Ok(status) => info!(%status, "generator exited"),
                Err(e) => warn!("failed to wait for generator: {}", e),
            }
        })
        .filter_map(|()| future::ready(None::<io::Result<String>>));

        Ok(output.chain(reaper).boxed())
    }
}

/// Read lines until EOF or the first read error
fn line_stream<R>(reader: R) -> impl Stream<Item = io::Result<String>> + Send + 'static
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    stream::unfold(Some(reader.lines()), |state| async move {
        let mut lines = state?;
        match lines.next_line().await {
            Ok(Some(line)) => Some((Ok(line), Some(lines))),
            Ok(None) => None,
            Err(e) => Some((Err(e), None)),
        }
    })
}

/// Scripted invoker for testing: every spawn replays the same lines
#[derive(Debug, Default)]
pub struct ScriptedInvoker {
    lines: Vec<String>,
    spawns: AtomicUsize,
}

impl ScriptedInvoker {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            spawns: AtomicUsize::new(0),
        }
    }

    /// How many times the generator was started
    pub fn spawn_count(&self) -> usize {
        self.spawns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeneratorInvoker for ScriptedInvoker {
    async fn spawn(&self) -> Result<OutputLines, InvokeError> {
        self.spawns.fetch_add(1, Ordering::SeqCst);
        Ok(stream::iter(self.lines.clone().into_iter().map(Ok)).boxed())
    }
}
