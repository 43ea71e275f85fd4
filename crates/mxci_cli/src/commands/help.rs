//! Help output when no action is selected.

use anyhow::Result;
use clap::CommandFactory;

use super::{catalog, list, Cli};

const EXAMPLES: &str = r#"
Examples:

mxci-test -p rpi

    Will build a docker container with test tools setup and qemu emulated tests suite for MXNet for Raspberry Pi by
    running: ci/docker/runtime_test_functions.sh test_rpi inside the container.

mxci-test -p rpi ls

    Will execute the given command inside the rpi container.

mxci-test -p rpi --print-docker-run

    Will print a docker run command to get inside the container in an interactive shell.

mxci-test -p rpi --into-container

    Will execute a shell into the container.

mxci-test -a

    Runs the tests for all platforms.
"#;

pub fn execute() -> Result<()> {
    Cli::command().print_help()?;
    println!("{}", list::format_platforms(&catalog().platforms()));
    println!("{}", EXAMPLES);
    Ok(())
}
