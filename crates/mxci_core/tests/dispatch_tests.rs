//! Integration tests for the build-and-test dispatcher.
//!
//! A temporary directory stands in for the CI checkout and the mock runner
//! stands in for the container engine.

use std::fs;
use std::path::Path;

use mxci_core::{
    BuildLayout, CiError, DispatchSettings, Dispatcher, PlatformCatalog, PlatformOutcome,
    PlatformRequest,
};
use mxci_runner::{MockResponse, MockRunner, RunnerError, UserMapping};
use tempfile::TempDir;

struct Checkout {
    _temp: TempDir,
    catalog: PlatformCatalog,
    layout: BuildLayout,
}

fn checkout(platforms: &[&str]) -> Checkout {
    let temp = TempDir::new().unwrap();
    let docker_dir = temp.path().join("ci").join("docker");
    fs::create_dir_all(&docker_dir).unwrap();
    for platform in platforms {
        fs::write(
            docker_dir.join(format!("Dockerfile.build.test.{}", platform)),
            "FROM scratch\n",
        )
        .unwrap();
    }

    Checkout {
        catalog: PlatformCatalog::new(&docker_dir),
        layout: BuildLayout::new(temp.path()),
        _temp: temp,
    }
}

fn settings() -> DispatchSettings {
    DispatchSettings {
        user: Some(UserMapping::new(1000, 1000)),
        ..DispatchSettings::default()
    }
}

fn run_args(runner: &MockRunner) -> Vec<Vec<String>> {
    runner
        .get_method_calls("run_container")
        .into_iter()
        .filter_map(|c| c.args)
        .collect()
}

fn seed_build_output(root: &Path) {
    fs::create_dir_all(root.join("build")).unwrap();
    fs::write(root.join("build").join("libmxnet.so"), b"elf").unwrap();
}

/// Test the default test command for a single platform.
#[tokio::test]
async fn test_platform_runs_default_test() {
    let co = checkout(&["armv7", "rpi"]);
    let runner = MockRunner::new();
    let dispatcher = Dispatcher::new(&runner, co.catalog.clone(), co.layout.clone(), settings());

    let outcome = dispatcher
        .run_platform("rpi", PlatformRequest::DefaultTest)
        .await
        .unwrap();
    assert_eq!(outcome, PlatformOutcome::Completed);

    let builds = runner.get_method_calls("build_image");
    assert_eq!(builds.len(), 1);
    let build_args = builds[0].args.as_ref().unwrap();
    assert!(build_args.contains(&"USER_ID=1000".to_string()));
    assert!(build_args.contains(&"mxnetci/build.test.rpi".to_string()));

    let runs = run_args(&runner);
    assert_eq!(runs.len(), 1);
    assert!(runs[0].ends_with(&[
        "mxnetci/build.test.rpi".to_string(),
        "/work/runtime_test_functions.sh".to_string(),
        "test_rpi".to_string(),
    ]));
}

/// Test a custom command replaces the default test.
#[tokio::test]
async fn test_platform_runs_custom_command() {
    let co = checkout(&["rpi"]);
    let runner = MockRunner::new();
    let dispatcher = Dispatcher::new(&runner, co.catalog.clone(), co.layout.clone(), settings());

    dispatcher
        .run_platform("rpi", PlatformRequest::Command(vec!["ls".into(), "-la".into()]))
        .await
        .unwrap();

    let runs = run_args(&runner);
    assert_eq!(runs[0].last().map(String::as_str), Some("-la"));
}

/// Test print-docker-run builds but never runs.
#[tokio::test]
async fn test_print_docker_run_is_dry() {
    let co = checkout(&["rpi"]);
    let runner = MockRunner::new();
    let dispatcher = Dispatcher::new(&runner, co.catalog.clone(), co.layout.clone(), settings());

    let outcome = dispatcher
        .run_platform("rpi", PlatformRequest::PrintDockerRun)
        .await
        .unwrap();

    assert!(runner.was_called("build_image"));
    assert!(!runner.was_called("run_container"));
    assert_eq!(
        outcome,
        PlatformOutcome::Printed(
            "docker run --rm -t --shm-size=2g -u 1000:1000 -ti --entrypoint /bin/bash \
             mxnetci/build.test.rpi"
                .to_string()
        )
    );
}

/// Test build-only stops after the image build.
#[tokio::test]
async fn test_build_only_skips_run() {
    let co = checkout(&["rpi"]);
    let runner = MockRunner::new();
    let settings = DispatchSettings {
        build_only: true,
        ..settings()
    };
    let dispatcher = Dispatcher::new(&runner, co.catalog.clone(), co.layout.clone(), settings);

    let outcome = dispatcher
        .run_platform("rpi", PlatformRequest::Command(vec!["ls".into()]))
        .await
        .unwrap();

    assert_eq!(outcome, PlatformOutcome::BuiltOnly);
    assert!(!runner.was_called("run_container"));
}

/// Test the cache is pulled only when enabled.
#[tokio::test]
async fn test_cache_pull_when_enabled() {
    let co = checkout(&["rpi"]);

    let runner = MockRunner::new();
    let dispatcher = Dispatcher::new(&runner, co.catalog.clone(), co.layout.clone(), settings());
    dispatcher.prepare("rpi").await.unwrap();
    assert!(!runner.was_called("pull_image"));

    let runner = MockRunner::new().fail_pull("reg/build.test.rpi");
    let settings = DispatchSettings {
        use_cache: true,
        registry: "reg".to_string(),
        ..settings()
    };
    let dispatcher = Dispatcher::new(&runner, co.catalog.clone(), co.layout.clone(), settings);
    dispatcher.prepare("rpi").await.unwrap();

    let pulls = runner.get_method_calls("pull_image");
    assert_eq!(pulls.len(), 1);
    assert_eq!(pulls[0].tag.as_deref(), Some("reg/build.test.rpi"));
    // Pull came first, build still happened
    assert_eq!(runner.get_calls()[0].method, "pull_image");
    assert!(runner.was_called("build_image"));
}

/// Test a missing image after build aborts before any run.
#[tokio::test]
async fn test_missing_image_is_fatal() {
    let co = checkout(&["rpi"]);
    let runner = MockRunner::new().missing_image("mxnetci/build.test.rpi");
    let dispatcher = Dispatcher::new(&runner, co.catalog.clone(), co.layout.clone(), settings());

    let err = dispatcher
        .run_platform("rpi", PlatformRequest::DefaultTest)
        .await
        .unwrap_err();

    assert!(matches!(err, CiError::Runner(RunnerError::ImageNotFound(_))));
    assert!(!runner.was_called("run_container"));
}

/// Test an unknown platform is rejected before building.
#[tokio::test]
async fn test_unknown_platform() {
    let co = checkout(&["armv7", "rpi"]);
    let runner = MockRunner::new();
    let dispatcher = Dispatcher::new(&runner, co.catalog.clone(), co.layout.clone(), settings());

    let err = dispatcher
        .run_platform("jetson", PlatformRequest::DefaultTest)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("armv7, rpi"));
    assert_eq!(runner.call_count(), 0);
}

/// Test all platforms run in order and keep their artifacts apart.
#[tokio::test]
async fn test_all_platforms_sequential() {
    let co = checkout(&["rpi", "armv7"]);
    let root = co.layout.source_root().to_path_buf();
    seed_build_output(&root);
    let runner = MockRunner::new();
    let dispatcher = Dispatcher::new(&runner, co.catalog.clone(), co.layout.clone(), settings());

    let reports = dispatcher.run_all().await.unwrap();

    let order: Vec<_> = reports.iter().map(|r| r.platform.as_str()).collect();
    assert_eq!(order, vec!["armv7", "rpi"]);

    // The stale output is wiped before the first run, so nothing is moved.
    assert!(reports.iter().all(|r| r.artifacts.is_none()));
    assert!(!root.join("build").exists());

    let runs = run_args(&runner);
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].last().map(String::as_str), Some("test_armv7"));
    assert_eq!(runs[1].last().map(String::as_str), Some("test_rpi"));
}

/// Test the first failing platform aborts the rest.
#[tokio::test]
async fn test_all_platforms_abort_on_failure() {
    let co = checkout(&["armv7", "jetson", "rpi"]);
    let runner = MockRunner::new().with_responses(vec![
        MockResponse::success(),
        MockResponse::failure(1),
        MockResponse::success(),
    ]);
    let dispatcher = Dispatcher::new(&runner, co.catalog.clone(), co.layout.clone(), settings());

    let err = dispatcher.run_all().await.unwrap_err();

    match err {
        CiError::CommandFailed { command, .. } => assert!(command.contains("test_jetson")),
        other => panic!("Expected CommandFailed, got {:?}", other),
    }
    assert_eq!(runner.get_method_calls("build_image").len(), 2);
    assert_eq!(runner.get_method_calls("run_container").len(), 2);
}

/// Test build-only over all platforms builds everything and runs nothing.
#[tokio::test]
async fn test_all_platforms_build_only() {
    let co = checkout(&["armv7", "rpi"]);
    let runner = MockRunner::new();
    let settings = DispatchSettings {
        build_only: true,
        ..settings()
    };
    let dispatcher = Dispatcher::new(&runner, co.catalog.clone(), co.layout.clone(), settings);

    let reports = dispatcher.run_all().await.unwrap();

    assert_eq!(reports.len(), 2);
    assert_eq!(runner.get_method_calls("build_image").len(), 2);
    assert!(!runner.was_called("run_container"));
}

/// Test an empty catalog is a no-op.
#[tokio::test]
async fn test_all_platforms_empty_catalog() {
    let co = checkout(&[]);
    let runner = MockRunner::new();
    let dispatcher = Dispatcher::new(&runner, co.catalog.clone(), co.layout.clone(), settings());

    assert!(dispatcher.run_all().await.unwrap().is_empty());
    assert_eq!(runner.call_count(), 0);
}
