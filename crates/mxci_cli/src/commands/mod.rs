//! CLI definition and shared command plumbing.
//!
//! The tool is flag-driven rather than subcommand-driven: exactly one of
//! `--list`, `--platform`, `--all` selects the action, and without any of
//! them the help is shown.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use mxci_core::{
    cache_enabled, BuildLayout, DispatchSettings, Dispatcher, PlatformCatalog, DEFAULT_REGISTRY,
    DEFAULT_SHM_SIZE, JOB_NAME_ENV,
};
use mxci_runner::{CliRunner, CliRunnerOptions, ContainerRuntime, UserMapping};

pub mod all;
pub mod help;
pub mod list;
pub mod platform;

/// Utility for building and testing MXNet on docker containers
#[derive(Parser, Debug)]
#[command(name = "mxci-test")]
#[command(version, about = "Utility for building and testing MXNet on docker containers")]
pub struct Cli {
    /// Build and test for a specific platform
    #[arg(short, long)]
    pub platform: Option<String>,

    /// Only build the container, don't build the project
    #[arg(long)]
    pub build_only: bool,

    /// Build and test for all platforms
    #[arg(short, long)]
    pub all: bool,

    /// Use nvidia docker
    #[arg(short, long)]
    pub nvidiadocker: bool,

    /// Size of the shared memory /dev/shm allocated in the container (e.g '1g')
    #[arg(long, value_name = "SIZE", default_value = DEFAULT_SHM_SIZE)]
    pub shm_size: String,

    /// List platforms
    #[arg(short, long)]
    pub list: bool,

    /// Print docker run command for manual inspection
    #[arg(long)]
    pub print_docker_run: bool,

    /// Go in a shell inside the container
    #[arg(short, long)]
    pub into_container: bool,

    /// Dockerhub registry name to retrieve cache from
    #[arg(short, long, env = "MXCI_DOCKER_REGISTRY", default_value = DEFAULT_REGISTRY)]
    pub docker_registry: String,

    /// Enable docker registry cache (implied when JOB_NAME is set)
    #[arg(short, long)]
    pub cache: bool,

    /// Directory holding docker/Dockerfile.build.test.* (the tool changes into it)
    #[arg(short = 'C', long, env = "MXCI_DIR", default_value = ".")]
    pub directory: PathBuf,

    /// Source tree root, relative to --directory, where build/ is produced
    #[arg(long, default_value = "..")]
    pub source_root: PathBuf,

    /// Container engine
    #[arg(long, value_enum, default_value_t = RuntimeArg::Docker)]
    pub runtime: RuntimeArg,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Command to run in the container
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Engine choices exposed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RuntimeArg {
    Docker,
    Podman,
}

/// What this invocation does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    List,
    Platform(String),
    All,
    Help,
}

impl Cli {
    /// Selected action. `--list` wins over `--platform`, which wins over `--all`.
    pub fn action(&self) -> Action {
        if self.list {
            Action::List
        } else if let Some(platform) = &self.platform {
            Action::Platform(platform.clone())
        } else if self.all {
            Action::All
        } else {
            Action::Help
        }
    }

    pub fn runtime(&self) -> ContainerRuntime {
        if self.nvidiadocker {
            return ContainerRuntime::NvidiaDocker;
        }
        match self.runtime {
            RuntimeArg::Docker => ContainerRuntime::Docker,
            RuntimeArg::Podman => ContainerRuntime::Podman,
        }
    }

    pub fn use_cache(&self) -> bool {
        cache_enabled(self.cache, std::env::var(JOB_NAME_ENV).ok().as_deref())
    }

    pub fn settings(&self) -> DispatchSettings {
        DispatchSettings {
            registry: self.docker_registry.clone(),
            shm_size: self.shm_size.clone(),
            build_only: self.build_only,
            use_cache: self.use_cache(),
            user: UserMapping::current(),
        }
    }

    pub fn layout(&self) -> BuildLayout {
        BuildLayout::new(&self.source_root)
    }
}

/// Catalog for the current working directory.
pub fn catalog() -> PlatformCatalog {
    PlatformCatalog::default()
}

/// Container runner for the engine selected on the command line.
pub fn runner(cli: &Cli) -> Result<CliRunner> {
    let options = CliRunnerOptions::new().prefer(cli.runtime());
    CliRunner::new(options).context("No usable container engine")
}

pub fn dispatcher<'a>(cli: &Cli, runner: &'a CliRunner) -> Dispatcher<'a, CliRunner> {
    Dispatcher::new(runner, catalog(), cli.layout(), cli.settings())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("mxci-test").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.action(), Action::Help);
        assert_eq!(cli.shm_size, "2g");
        assert_eq!(cli.runtime(), ContainerRuntime::Docker);
        assert!(cli.command.is_empty());
    }

    #[test]
    fn test_platform_with_trailing_command() {
        let cli = parse(&["-p", "rpi", "ls", "-la", "/work"]);
        assert_eq!(cli.action(), Action::Platform("rpi".to_string()));
        assert_eq!(cli.command, vec!["ls", "-la", "/work"]);
    }

    #[test]
    fn test_action_priority() {
        assert_eq!(parse(&["-l", "-a", "-p", "rpi"]).action(), Action::List);
        assert_eq!(
            parse(&["-a", "-p", "rpi"]).action(),
            Action::Platform("rpi".to_string())
        );
        assert_eq!(parse(&["--all"]).action(), Action::All);
    }

    #[test]
    fn test_flags() {
        let cli = parse(&[
            "-p",
            "armv7",
            "--build-only",
            "--shm-size",
            "8g",
            "-d",
            "myregistry",
            "--print-docker-run",
            "-i",
            "-c",
        ]);
        assert!(cli.build_only);
        assert!(cli.print_docker_run);
        assert!(cli.into_container);
        assert!(cli.cache);
        assert!(cli.use_cache());

        let settings = cli.settings();
        assert_eq!(settings.shm_size, "8g");
        assert_eq!(settings.registry, "myregistry");
    }

    #[test]
    fn test_nvidiadocker_overrides_runtime() {
        let cli = parse(&["-n", "--runtime", "podman", "-p", "rpi"]);
        assert_eq!(cli.runtime(), ContainerRuntime::NvidiaDocker);

        let cli = parse(&["--runtime", "podman"]);
        assert_eq!(cli.runtime(), ContainerRuntime::Podman);
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        let result = Cli::try_parse_from(["mxci-test", "-v", "-q"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_layout_uses_source_root() {
        let cli = parse(&["--source-root", "/src/mxnet"]);
        assert_eq!(cli.layout().build_dir(), PathBuf::from("/src/mxnet/build"));
    }
}
