use std::fmt;
use std::process::Command;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, error, info};

use crate::status::PowerState;

pub const POWERCFG: &str = "powercfg";

/// Pushes a power state to the OS.
pub trait PowerApplier: Send + Sync {
    fn apply(&self, state: PowerState) -> PowerCommandReport;
}

#[derive(Debug, Clone)]
pub struct PowerCommandReport {
    pub state: PowerState,
    pub command: String,
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// `None` when the process was terminated without an exit code.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

pub type CommandRunner = Arc<dyn Fn(&str, &[String]) -> Result<CommandOutput> + Send + Sync>;

/// Sets the AC standby timeout through `powercfg`.
#[derive(Clone)]
pub struct PowercfgController {
    sleep_after_min: u32,
    runner: CommandRunner,
}

impl fmt::Debug for PowercfgController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PowercfgController")
            .field("sleep_after_min", &self.sleep_after_min)
            .finish_non_exhaustive()
    }
}

impl PowercfgController {
    pub fn new(sleep_after_min: u32) -> Self {
        Self::with_runner(sleep_after_min, default_runner())
    }

    pub fn with_runner(sleep_after_min: u32, runner: CommandRunner) -> Self {
        Self {
            sleep_after_min,
            runner,
        }
    }

    /// Standby timeout in minutes; zero disables standby.
    pub fn timeout_minutes(&self, state: PowerState) -> u32 {
        match state {
            PowerState::Awake => 0,
            PowerState::Normal => self.sleep_after_min,
        }
    }

    pub fn arguments(&self, state: PowerState) -> Vec<String> {
        vec![
            "-change".to_string(),
            "-standby-timeout-ac".to_string(),
            self.timeout_minutes(state).to_string(),
        ]
    }
}

impl PowerApplier for PowercfgController {
    fn apply(&self, state: PowerState) -> PowerCommandReport {
        let args = self.arguments(state);
        let command = format!("{POWERCFG} {}", args.join(" "));
        let minutes = self.timeout_minutes(state);

        let report = match (self.runner)(POWERCFG, &args) {
            Ok(output) => PowerCommandReport {
                state,
                command,
                success: output.success(),
                exit_code: output.exit_code,
                stdout: output.stdout,
                stderr: output.stderr,
            },
            Err(err) => PowerCommandReport {
                state,
                command,
                success: false,
                exit_code: None,
                stdout: String::new(),
                stderr: format!("{err:#}"),
            },
        };

        if report.success {
            match state {
                PowerState::Awake => info!("standby disabled on AC power"),
                PowerState::Normal => info!(minutes, "standby enabled on AC power"),
            }
            debug!(command = report.command, stdout = report.stdout, "powercfg output");
        } else {
            let exit = report
                .exit_code
                .map(|code| code.to_string())
                .unwrap_or_else(|| "none".to_string());
            error!(
                ?state,
                exit_code = exit,
                stderr = report.stderr.trim(),
                command = report.command,
                "failed to run powercfg"
            );
        }

        report
    }
}

fn default_runner() -> CommandRunner {
    Arc::new(|program: &str, args: &[String]| run_hidden(program, args))
}

fn run_hidden(program: &str, args: &[String]) -> Result<CommandOutput> {
    let mut command = Command::new(program);
    command.args(args);

    // The tray host has no console; keep the child from flashing one up.
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        use windows_sys::Win32::System::Threading::CREATE_NO_WINDOW;
        command.creation_flags(CREATE_NO_WINDOW);
    }

    let output = command
        .output()
        .with_context(|| format!("failed to spawn {program}"))?;

    Ok(CommandOutput {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::Mutex;

    fn recording_runner(
        exit_code: Option<i32>,
        stderr: &str,
    ) -> (CommandRunner, Arc<Mutex<Vec<String>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&calls);
        let stderr = stderr.to_string();
        let runner: CommandRunner = Arc::new(move |program: &str, args: &[String]| {
            seen.lock()
                .unwrap()
                .push(format!("{program} {}", args.join(" ")));
            Ok::<_, anyhow::Error>(CommandOutput {
                exit_code,
                stdout: String::new(),
                stderr: stderr.clone(),
            })
        });
        (runner, calls)
    }

    #[test]
    fn awake_disables_standby() {
        let (runner, calls) = recording_runner(Some(0), "");
        let controller = PowercfgController::with_runner(30, runner);
        let report = controller.apply(PowerState::Awake);
        assert!(report.success);
        assert_eq!(report.command, "powercfg -change -standby-timeout-ac 0");
        assert_eq!(
            calls.lock().unwrap().as_slice(),
            ["powercfg -change -standby-timeout-ac 0"]
        );
    }

    #[test]
    fn normal_restores_configured_timeout() {
        let (runner, calls) = recording_runner(Some(0), "");
        let controller = PowercfgController::with_runner(45, runner);
        assert!(controller.apply(PowerState::Normal).success);
        assert_eq!(
            calls.lock().unwrap().as_slice(),
            ["powercfg -change -standby-timeout-ac 45"]
        );
    }

    #[test]
    fn non_zero_exit_is_reported_as_failure() {
        let (runner, _) = recording_runner(Some(1), "Access denied");
        let controller = PowercfgController::with_runner(30, runner);
        let report = controller.apply(PowerState::Awake);
        assert!(!report.success);
        assert_eq!(report.exit_code, Some(1));
        assert_eq!(report.stderr, "Access denied");
    }

    #[test]
    fn spawn_error_is_reported_as_failure() {
        let runner: CommandRunner = Arc::new(|_: &str, _: &[String]| -> Result<CommandOutput> {
            Err(anyhow!("not found"))
        });
        let controller = PowercfgController::with_runner(30, runner);
        let report = controller.apply(PowerState::Normal);
        assert!(!report.success);
        assert_eq!(report.exit_code, None);
        assert!(report.stderr.contains("not found"));
    }
}
