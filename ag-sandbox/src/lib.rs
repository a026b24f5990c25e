//! Wraps the external sandboxing binary with a fixed resource-limit policy
//! (spec.md §4.4). The binary itself is an opaque collaborator (spec.md §1,
//! §9 "Subprocess-based isolation": "the sandbox binary must be treated as
//! an opaque collaborator") — this crate only knows the flags it is invoked
//! with and how its combined stdout+stderr is captured.
//!
//! Grounded on `code_manager::container::run_container`: a `tokio::process::
//! Command` spawned with piped stdout/stderr, awaited under a
//! `tokio::time::timeout`, non-zero exit treated as data rather than a Rust
//! `Err`.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

/// Which kind of run this is, since unit tests and inline tests get
/// different wall-clock budgets (spec.md §4.4: "30 seconds for unit tests,
/// 10 seconds for inline tests").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceProfile {
    UnitTest,
    InlineTest,
}

impl ResourceProfile {
    pub fn wall_clock(self) -> Duration {
        match self {
            ResourceProfile::UnitTest => Duration::from_secs(30),
            ResourceProfile::InlineTest => Duration::from_secs(10),
        }
    }
}

/// The uniform policy applied to every user-code execution (spec.md §4.4).
#[derive(Debug, Clone)]
pub struct SandboxLimits {
    pub cpu_cores: u32,
    pub memory_bytes: u64,
    pub wall_clock: Duration,
    /// The only environment variable passed through (spec.md §4.4:
    /// "Environment: `LANG=en_US.UTF-8` only").
    pub env: Vec<(String, String)>,
    pub user: String,
    pub group: String,
    pub deny_loopback: bool,
    pub deny_procfs: bool,
}

impl SandboxLimits {
    pub fn for_profile(profile: ResourceProfile) -> Self {
        SandboxLimits {
            cpu_cores: 1,
            memory_bytes: 700 * 1024 * 1024,
            wall_clock: profile.wall_clock(),
            env: vec![("LANG".to_string(), "en_US.UTF-8".to_string())],
            user: "sandbox".to_string(),
            group: "sandbox".to_string(),
            deny_loopback: true,
            deny_procfs: true,
        }
    }

    /// Renders the limits as the flag sequence the sandbox binary expects,
    /// ahead of the `--` separator and the command to run.
    pub fn as_flags(&self) -> Vec<String> {
        let mut flags = vec![
            "--cpus".to_string(),
            self.cpu_cores.to_string(),
            "--memory".to_string(),
            self.memory_bytes.to_string(),
            "--timeout".to_string(),
            self.wall_clock.as_secs().to_string(),
            "--user".to_string(),
            self.user.clone(),
            "--group".to_string(),
            self.group.clone(),
        ];
        if self.deny_loopback {
            flags.push("--deny-loopback".to_string());
        }
        if self.deny_procfs {
            flags.push("--deny-procfs".to_string());
        }
        flags
    }
}

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("failed to spawn sandbox binary `{binary}`: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to wait on sandboxed process: {0}")]
    Wait(#[source] std::io::Error),
}

/// The result of one sandboxed run. A non-zero `exit_code` is not a Rust
/// error — it is classified further by the grading engine (spec.md §4.4:
/// "A non-zero exit status is not a pipeline error").
#[derive(Debug, Clone)]
pub struct SandboxOutput {
    /// stdout and stderr captured together (spec.md §4.4: "its stdout+stderr
    /// are captured together").
    pub combined: String,
    pub exit_code: Option<i32>,
}

/// Invokes the sandbox binary by path (spec.md §4.4).
#[derive(Debug, Clone)]
pub struct SandboxInvoker {
    binary: PathBuf,
}

impl SandboxInvoker {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        SandboxInvoker {
            binary: binary.into(),
        }
    }

    /// Runs `command` under the full resource-limit policy, in `working_dir`
    /// (spec.md §4.4: "Working directory: the per-exercise scratch
    /// directory").
    pub async fn run_sandboxed(
        &self,
        working_dir: &Path,
        limits: &SandboxLimits,
        command: &[String],
    ) -> Result<SandboxOutput, SandboxError> {
        let mut args = limits.as_flags();
        args.push("--".to_string());
        args.extend(command.iter().cloned());
        self.run(working_dir, &limits.env, limits.wall_clock, &args).await
    }

    /// Spawns the sandbox binary directly with `args`, merging stdout and
    /// stderr and awaiting under a backstop timeout. Split out from
    /// `run_sandboxed` so the spawn/capture plumbing is testable with a
    /// stand-in binary that doesn't understand the resource-limit flags.
    pub async fn run(
        &self,
        working_dir: &Path,
        env: &[(String, String)],
        wall_clock: Duration,
        args: &[String],
    ) -> Result<SandboxOutput, SandboxError> {
        let mut cmd = Command::new(&self.binary);
        cmd.current_dir(working_dir);
        cmd.env_clear();
        for (k, v) in env {
            cmd.env(k, v);
        }
        cmd.args(args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let child = cmd.spawn().map_err(|source| SandboxError::Spawn {
            binary: self.binary.display().to_string(),
            source,
        })?;

        // The sandbox binary enforces its own `--timeout`. This backstop only
        // guards the grader against a sandbox binary that hangs outright; its
        // message deliberately matches the same "time limit ... Killing it"
        // fragment the binary itself is expected to print (spec.md §4.4), so
        // a hung sandbox still classifies as a timeout downstream.
        let backstop = wall_clock + Duration::from_secs(5);
        match timeout(backstop, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
                combined.push_str(&String::from_utf8_lossy(&output.stderr));
                Ok(SandboxOutput {
                    combined,
                    exit_code: output.status.code(),
                })
            }
            Ok(Err(e)) => Err(SandboxError::Wait(e)),
            Err(_) => {
                tracing::warn!(binary = %self.binary.display(), "sandbox backstop timeout fired");
                Ok(SandboxOutput {
                    combined: "time limit exceeded. Killing it (grader backstop)".to_string(),
                    exit_code: None,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn limits_render_expected_flags() {
        let limits = SandboxLimits::for_profile(ResourceProfile::InlineTest);
        let flags = limits.as_flags();
        assert!(flags.contains(&"--cpus".to_string()));
        assert!(flags.contains(&"--deny-loopback".to_string()));
        assert!(flags.contains(&"--deny-procfs".to_string()));
        assert_eq!(limits.wall_clock, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn captures_combined_stdout_and_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = SandboxInvoker::new("/bin/sh");
        let out = invoker
            .run(
                dir.path(),
                &[],
                Duration::from_secs(5),
                &["-c".to_string(), "echo out; echo err 1>&2".to_string()],
            )
            .await
            .unwrap();
        assert!(out.combined.contains("out"));
        assert!(out.combined.contains("err"));
        assert_eq!(out.exit_code, Some(0));
    }

    #[tokio::test]
    async fn nonzero_exit_is_not_a_rust_error() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = SandboxInvoker::new("/bin/sh");
        let out = invoker
            .run(
                dir.path(),
                &[],
                Duration::from_secs(5),
                &["-c".to_string(), "exit 1".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(out.exit_code, Some(1));
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = SandboxInvoker::new("/no/such/sandbox-binary");
        let err = invoker
            .run(dir.path(), &[], Duration::from_secs(1), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, SandboxError::Spawn { .. }));
    }

    #[tokio::test]
    async fn backstop_fires_on_runaway_process() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = SandboxInvoker::new("/bin/sh");
        let out = invoker
            .run(
                dir.path(),
                &[],
                Duration::from_millis(50),
                &["-c".to_string(), "sleep 10".to_string()],
            )
            .await
            .unwrap();
        assert!(out.combined.contains("time limit"));
        assert!(out.combined.contains("Killing it"));
        assert_eq!(out.exit_code, None);
    }
}
