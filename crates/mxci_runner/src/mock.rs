//! Mock container runner for testing.
//!
//! Provides a configurable mock implementation of the ContainerRunner trait
//! for use in unit tests without requiring an actual container engine.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::cli::ContainerRuntime;
use crate::config::{BuildConfig, RunConfig};
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{ContainerRunner, ExecutionResult};

/// Predefined mock response for a container execution.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub exit_code: i64,
    pub duration_ms: u64,
}

impl MockResponse {
    pub fn success() -> Self {
        Self {
            exit_code: 0,
            duration_ms: 100,
        }
    }

    pub fn failure(exit_code: i64) -> Self {
        Self {
            exit_code,
            duration_ms: 100,
        }
    }

    pub fn with_duration(mut self, ms: u64) -> Self {
        self.duration_ms = ms;
        self
    }
}

/// Captured call information for verification.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub method: String,
    pub tag: Option<String>,
    /// Full engine argument list, when the call has one
    pub args: Option<Vec<String>>,
}

/// Mock container runner for testing.
///
/// Captures every call and returns predefined responses. Images that are
/// built or pulled start to "exist" unless their lookup is set to fail.
#[derive(Clone)]
pub struct MockRunner {
    runtime: ContainerRuntime,
    available: Arc<RwLock<bool>>,
    /// Predefined responses for run_container calls, used in order.
    responses: Arc<RwLock<Vec<MockResponse>>>,
    response_index: Arc<AtomicUsize>,
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
    existing_images: Arc<RwLock<HashSet<String>>>,
    /// Tags whose image id lookup comes back empty even after a build.
    missing_images: Arc<RwLock<HashSet<String>>>,
    failing_pulls: Arc<RwLock<HashSet<String>>>,
    failing_builds: Arc<RwLock<HashSet<String>>>,
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRunner {
    pub fn new() -> Self {
        Self {
            runtime: ContainerRuntime::Docker,
            available: Arc::new(RwLock::new(true)),
            responses: Arc::new(RwLock::new(Vec::new())),
            response_index: Arc::new(AtomicUsize::new(0)),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
            existing_images: Arc::new(RwLock::new(HashSet::new())),
            missing_images: Arc::new(RwLock::new(HashSet::new())),
            failing_pulls: Arc::new(RwLock::new(HashSet::new())),
            failing_builds: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    pub fn with_runtime(mut self, runtime: ContainerRuntime) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn set_available(self, available: bool) -> Self {
        *self.available.write() = available;
        self
    }

    /// Add a mock response for the next run_container call.
    pub fn add_response(self, response: MockResponse) -> Self {
        self.responses.write().push(response);
        self
    }

    pub fn with_responses(self, responses: Vec<MockResponse>) -> Self {
        *self.responses.write() = responses;
        self
    }

    pub fn add_existing_image(self, tag: impl Into<String>) -> Self {
        self.existing_images.write().insert(tag.into());
        self
    }

    /// Make the image id lookup for `tag` come back empty.
    pub fn missing_image(self, tag: impl Into<String>) -> Self {
        self.missing_images.write().insert(tag.into());
        self
    }

    pub fn fail_pull(self, tag: impl Into<String>) -> Self {
        self.failing_pulls.write().insert(tag.into());
        self
    }

    pub fn fail_build(self, tag: impl Into<String>) -> Self {
        self.failing_builds.write().insert(tag.into());
        self
    }

    pub fn clear_calls(&self) {
        self.captured_calls.write().clear();
    }

    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.captured_calls
            .read()
            .iter()
            .any(|c| c.method == method)
    }

    pub fn get_method_calls(&self, method: &str) -> Vec<CapturedCall> {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| c.method == method)
            .cloned()
            .collect()
    }

    fn record_call(&self, method: &str, tag: Option<&str>, args: Option<Vec<String>>) {
        self.captured_calls.write().push(CapturedCall {
            method: method.to_string(),
            tag: tag.map(str::to_string),
            args,
        });
    }

    fn next_response(&self) -> MockResponse {
        let responses = self.responses.read();
        if responses.is_empty() {
            return MockResponse::success();
        }
        let index = self.response_index.fetch_add(1, Ordering::SeqCst);
        responses
            .get(index % responses.len())
            .cloned()
            .unwrap_or_else(MockResponse::success)
    }

    fn lookup(&self, tag: &str) -> Option<String> {
        if self.missing_images.read().contains(tag) {
            return None;
        }
        self.existing_images
            .read()
            .contains(tag)
            .then(|| format!("sha256:mock-{}", tag.replace('/', "-")))
    }
}

#[async_trait]
impl ContainerRunner for MockRunner {
    fn runtime(&self) -> ContainerRuntime {
        self.runtime
    }

    async fn is_available(&self) -> RunnerResult<bool> {
        self.record_call("is_available", None, None);
        Ok(*self.available.read())
    }

    async fn pull_image(&self, tag: &str) -> RunnerResult<()> {
        self.record_call("pull_image", Some(tag), None);
        if self.failing_pulls.read().contains(tag) {
            return Err(RunnerError::ImagePullFailed(format!(
                "{} pull {} exited with code 1",
                self.runtime, tag
            )));
        }
        self.existing_images.write().insert(tag.to_string());
        Ok(())
    }

    async fn image_id(&self, tag: &str) -> RunnerResult<Option<String>> {
        self.record_call("image_id", Some(tag), None);
        Ok(self.lookup(tag))
    }

    async fn build_image(&self, config: &BuildConfig) -> RunnerResult<String> {
        let args = config.args();
        self.record_call("build_image", Some(&config.tag), Some(args.clone()));

        if self.failing_builds.read().contains(&config.tag) {
            return Err(RunnerError::BuildFailed {
                exit_code: 1,
                command: crate::config::render_command(self.runtime.command(), &args),
            });
        }

        self.existing_images.write().insert(config.tag.clone());
        self.lookup(&config.tag)
            .ok_or_else(|| RunnerError::ImageNotFound(config.tag.clone()))
    }

    async fn run_container(&self, config: &RunConfig) -> RunnerResult<ExecutionResult> {
        self.record_call("run_container", Some(&config.tag), Some(config.args()));

        let response = self.next_response();
        let started_at = Utc::now();
        let finished_at = started_at + chrono::Duration::milliseconds(response.duration_ms as i64);

        Ok(ExecutionResult::new(response.exit_code, started_at, finished_at))
    }
}
