//! Build and run configuration types.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Host user/group the container process is mapped to (`-u uid:gid`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMapping {
    pub uid: u32,
    pub gid: u32,
}

impl UserMapping {
    pub fn new(uid: u32, gid: u32) -> Self {
        Self { uid, gid }
    }

    /// Mapping for the user running this process.
    #[cfg(unix)]
    pub fn current() -> Option<Self> {
        Some(Self {
            uid: nix::unistd::getuid().as_raw(),
            gid: nix::unistd::getgid().as_raw(),
        })
    }

    #[cfg(not(unix))]
    pub fn current() -> Option<Self> {
        None
    }
}

impl fmt::Display for UserMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.uid, self.gid)
    }
}

/// Image build configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Dockerfile to build from
    pub dockerfile: PathBuf,
    /// Build context directory
    pub context: PathBuf,
    /// Tag applied to the resulting image
    pub tag: String,
    /// `--build-arg` pairs, in order
    pub build_args: Vec<(String, String)>,
    /// `--cache-from` image references
    pub cache_from: Vec<String>,
}

impl BuildConfig {
    pub fn new(
        dockerfile: impl Into<PathBuf>,
        context: impl Into<PathBuf>,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            dockerfile: dockerfile.into(),
            context: context.into(),
            tag: tag.into(),
            build_args: Vec::new(),
            cache_from: Vec::new(),
        }
    }

    pub fn build_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.build_args.push((key.into(), value.into()));
        self
    }

    pub fn cache_from(mut self, image: impl Into<String>) -> Self {
        self.cache_from.push(image.into());
        self
    }

    /// Engine arguments for `build`, excluding the engine binary.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "build".to_string(),
            "-f".to_string(),
            self.dockerfile.to_string_lossy().into_owned(),
        ];

        for (key, value) in &self.build_args {
            args.push("--build-arg".to_string());
            args.push(format!("{}={}", key, value));
        }

        for image in &self.cache_from {
            args.push("--cache-from".to_string());
            args.push(image.clone());
        }

        args.push("-t".to_string());
        args.push(self.tag.clone());
        args.push(self.context.to_string_lossy().into_owned());
        args
    }
}

/// Container run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Image tag to run
    pub tag: String,
    /// Command to run
    pub command: Vec<String>,
    /// Size of /dev/shm (e.g. "2g")
    pub shm_size: Option<String>,
    /// User/group mapping
    pub user: Option<UserMapping>,
    /// Whether to remove the container after execution
    pub auto_remove: bool,
    /// Allocate a pseudo-TTY
    pub tty: bool,
    /// Interactive shell entrypoint (`-ti --entrypoint <shell>`)
    pub entrypoint: Option<String>,
}

impl RunConfig {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            command: Vec::new(),
            shm_size: None,
            user: None,
            auto_remove: true,
            tty: true,
            entrypoint: None,
        }
    }

    pub fn command(mut self, cmd: Vec<String>) -> Self {
        self.command = cmd;
        self
    }

    pub fn cmd(mut self, cmd: impl Into<String>) -> Self {
        self.command.push(cmd.into());
        self
    }

    pub fn shm_size(mut self, size: impl Into<String>) -> Self {
        self.shm_size = Some(size.into());
        self
    }

    pub fn user(mut self, user: Option<UserMapping>) -> Self {
        self.user = user;
        self
    }

    pub fn auto_remove(mut self, remove: bool) -> Self {
        self.auto_remove = remove;
        self
    }

    /// Turn this into an interactive shell session in the same container.
    pub fn interactive(mut self, shell: impl Into<String>) -> Self {
        self.entrypoint = Some(shell.into());
        self
    }

    pub fn is_interactive(&self) -> bool {
        self.entrypoint.is_some()
    }

    /// Engine arguments for `run`, excluding the engine binary.
    ///
    /// The interactive flags go right after the user mapping so the
    /// rendered command reads the same as the non-interactive one up to
    /// that point.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["run".to_string()];

        if self.auto_remove {
            args.push("--rm".to_string());
        }

        if self.tty {
            args.push("-t".to_string());
        }

        if let Some(size) = &self.shm_size {
            args.push(format!("--shm-size={}", size));
        }

        if let Some(user) = &self.user {
            args.push("-u".to_string());
            args.push(user.to_string());
        }

        if let Some(shell) = &self.entrypoint {
            args.push("-ti".to_string());
            args.push("--entrypoint".to_string());
            args.push(shell.clone());
        }

        args.push(self.tag.clone());
        args.extend(self.command.iter().cloned());
        args
    }
}

/// Render a command line for logging and copy-paste.
///
/// Arguments containing whitespace (or empty ones) are single-quoted.
pub fn render_command(program: &str, args: &[String]) -> String {
    let mut cmd = program.to_string();
    for arg in args {
        if arg.is_empty() || arg.chars().any(char::is_whitespace) {
            cmd.push_str(&format!(" '{}'", arg));
        } else {
            cmd.push(' ');
            cmd.push_str(arg);
        }
    }
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_args_order() {
        let config = RunConfig::new("mxnetci/build.test.rpi")
            .shm_size("2g")
            .user(Some(UserMapping::new(1000, 100)))
            .command(vec!["ls".into(), "-la".into()]);

        assert_eq!(
            config.args(),
            vec![
                "run",
                "--rm",
                "-t",
                "--shm-size=2g",
                "-u",
                "1000:100",
                "mxnetci/build.test.rpi",
                "ls",
                "-la"
            ]
        );
    }

    #[test]
    fn test_interactive_flags_follow_user_mapping() {
        let config = RunConfig::new("reg/build.test.armv7")
            .shm_size("1g")
            .user(Some(UserMapping::new(1, 2)))
            .interactive("/bin/bash");

        assert!(config.is_interactive());
        assert_eq!(
            config.args(),
            vec![
                "run",
                "--rm",
                "-t",
                "--shm-size=1g",
                "-u",
                "1:2",
                "-ti",
                "--entrypoint",
                "/bin/bash",
                "reg/build.test.armv7"
            ]
        );
    }

    #[test]
    fn test_run_args_without_user() {
        let config = RunConfig::new("img").auto_remove(false).cmd("true");
        assert_eq!(config.args(), vec!["run", "-t", "img", "true"]);
    }

    #[test]
    fn test_build_args() {
        let config = BuildConfig::new("docker/Dockerfile.build.test.rpi", "docker", "r/build.test.rpi")
            .build_arg("USER_ID", "1000")
            .cache_from("r/build.test.rpi");

        assert_eq!(
            config.args(),
            vec![
                "build",
                "-f",
                "docker/Dockerfile.build.test.rpi",
                "--build-arg",
                "USER_ID=1000",
                "--cache-from",
                "r/build.test.rpi",
                "-t",
                "r/build.test.rpi",
                "docker"
            ]
        );
    }

    #[test]
    fn test_render_command_quotes_whitespace() {
        let args = vec!["run".to_string(), "echo hi".to_string(), String::new()];
        assert_eq!(render_command("docker", &args), "docker run 'echo hi' ''");
    }

    #[test]
    fn test_user_mapping_display() {
        assert_eq!(UserMapping::new(1000, 1000).to_string(), "1000:1000");
    }
}
