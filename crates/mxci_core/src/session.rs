//! Running an invocation against a container runner.

use tracing::{error, info};

use mxci_runner::{render_command, ContainerRunner};

use crate::error::{CiError, CiResult};
use crate::invocation::{Invocation, RunMode};

/// Run an invocation and return the interactive command line for it.
///
/// - `Execute` runs the command; a non-zero exit becomes
///   [`CiError::CommandFailed`] carrying the command and a debug command
///   that opens a shell in the same container.
/// - `IntoContainer` runs the interactive variant.
/// - `DryRun` never touches the runner.
pub async fn container_run<R>(runner: &R, invocation: &Invocation) -> CiResult<String>
where
    R: ContainerRunner + ?Sized,
{
    let program = runner.runtime().command();

    let run_config = invocation.run_config();
    let command = render_command(program, &run_config.args());

    let debug_config = invocation.debug_config();
    let debug_command = render_command(program, &debug_config.args());

    match invocation.mode {
        RunMode::DryRun => {}
        RunMode::Execute => {
            info!(
                "Running {:?} in container {}",
                invocation.command, invocation.tag
            );
            info!("Executing: {}", command);

            let result = runner.run_container(&run_config).await?;
            if !result.success() {
                error!(
                    "Running of command in container failed ({}): {}",
                    result.exit_code, command
                );
                error!(
                    "You can try to get into the container by using the following command: {}",
                    debug_command
                );
                return Err(CiError::CommandFailed {
                    exit_code: result.exit_code,
                    command,
                    debug_command,
                });
            }
        }
        RunMode::IntoContainer => {
            info!("Getting into container {}", invocation.tag);

            let result = runner.run_container(&debug_config).await?;
            if !result.success() {
                return Err(CiError::CommandFailed {
                    exit_code: result.exit_code,
                    command: debug_command.clone(),
                    debug_command,
                });
            }
        }
    }

    Ok(debug_command)
}
