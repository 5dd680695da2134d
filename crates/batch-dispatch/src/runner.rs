use async_trait::async_trait;
use batch_core::ExecAction;
use std::process::Stdio;
use tokio::process::Command;

/// Result of one script execution. `connections`/`artifacts`/`checkout`
/// are opaque documents the runner is free to interpret (mounting
/// volumes, checking out a repo, ...); this crate's default runner
/// ignores them and only honours `script` and `env`.
#[derive(Debug)]
pub struct RunOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutcome {
    pub const fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Abstraction over "run this script and tell me how it went" so the
/// Dispatcher doesn't depend on a concrete process model.
#[async_trait]
pub trait ShellRunner: Send + Sync {
    async fn run(&self, action: &ExecAction) -> Result<RunOutcome, std::io::Error>;
}

/// Runs `exec.script` through `/bin/sh -c`, matching the external shell
/// runner the original dispatcher defers to.
#[derive(Debug, Default)]
pub struct ProcessShellRunner;

#[async_trait]
impl ShellRunner for ProcessShellRunner {
    async fn run(&self, action: &ExecAction) -> Result<RunOutcome, std::io::Error> {
        let mut command = Command::new("/bin/sh");
        command
            .arg("-c")
            .arg(&action.script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for env in &action.env {
            command.env(&env.name, &env.value);
        }

        let output = command.output().await?;
        Ok(RunOutcome {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
