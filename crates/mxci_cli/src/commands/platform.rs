//! Platform command - Build one platform's image and use it.

use anyhow::Result;
use tracing::info;

use mxci_core::{PlatformOutcome, PlatformRequest};

use super::{dispatcher, runner, Cli};

pub async fn execute(cli: &Cli, platform: &str) -> Result<()> {
    info!("Building and testing platform: {}", platform);

    let runner = runner(cli)?;
    let dispatcher = dispatcher(cli, &runner);

    let request =
        PlatformRequest::from_flags(cli.command.clone(), cli.print_docker_run, cli.into_container);

    match dispatcher.run_platform(platform, request).await? {
        PlatformOutcome::Printed(cmd) => println!("{}", cmd),
        PlatformOutcome::BuiltOnly | PlatformOutcome::Completed => {}
    }

    Ok(())
}
