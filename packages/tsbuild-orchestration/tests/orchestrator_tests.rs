//! Multi-bundle builds through the real pipeline

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use tsbuild_core::{BuildConfig, BundleFormat, BundleSpec};
use tsbuild_orchestration::{build, BuildOrchestrator, ErrorCategory};

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn workspace() -> (TempDir, BuildConfig) {
    let dir = TempDir::new().unwrap();
    let packages = dir.path().join("packages");
    write(&packages, "core/src/index.ts", "export const core: string = 'core';\n");
    write(&packages, "core/index.d.ts", "export declare const core: string;\n");
    write(&packages, "web/src/app.js", "export default function app() {}\n");
    write(&packages, "broken/src/index.ts", "export const = ;\n");

    let mut config = BuildConfig::default();
    config.package_roots = vec![packages];
    config.output.root = dir.path().join("build");
    config.orchestration.parallel_bundles = 2;
    config.bundles = vec![
        BundleSpec::node("core"),
        BundleSpec::new("web", BundleFormat::Other),
        BundleSpec::node("broken"),
    ];
    (dir, config)
}

#[tokio::test]
async fn test_build_isolates_failing_bundle() {
    let (dir, config) = workspace();

    let summary = build(&config).await.unwrap();

    assert_eq!(summary.jobs.len(), 3);
    assert_eq!(summary.succeeded(), 2);
    assert_eq!(summary.failed(), 1);
    assert!(!summary.is_success());
    assert_eq!(summary.files_written(), 3);

    let broken = summary.report("broken").unwrap();
    assert_eq!(broken.job.error_category(), Some(ErrorCategory::Permanent));
    assert!(broken.job.error().unwrap().contains("index.ts"));

    let build_dir = dir.path().join("build");
    assert_eq!(
        fs::read_to_string(build_dir.join("core/node/index.js")).unwrap(),
        "export const core = 'core';\n"
    );
    assert!(build_dir.join("core/node/index.d.ts").is_file());
    assert!(build_dir.join("web/esm/app.js").is_file());
    assert!(!build_dir.join("broken").join("node").join("index.js").exists());
}

#[tokio::test]
async fn test_unknown_entry_fails_as_permanent() {
    let (_dir, config) = workspace();
    let orchestrator = BuildOrchestrator::from_config(&config).unwrap();

    let summary = orchestrator
        .run_all(vec![BundleSpec::node("ghost"), BundleSpec::node("core")])
        .await
        .unwrap();

    let ghost = &summary.jobs[0];
    assert!(ghost.job.is_failed());
    assert_eq!(ghost.job.error_category(), Some(ErrorCategory::Permanent));
    assert!(summary.jobs[1].job.is_completed());
}

#[tokio::test]
async fn test_generous_timeout_does_not_fail_bundles() {
    let (_dir, mut config) = workspace();
    config.orchestration.bundle_timeout_ms = Some(60_000);
    config.bundles.retain(|b| b.entry != "broken");

    let summary = build(&config).await.unwrap();
    assert!(summary.is_success());
    assert_eq!(summary.succeeded(), 2);
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let (_dir, mut config) = workspace();
    config.exclude.push("(".to_string());
    assert!(BuildOrchestrator::from_config(&config).is_err());
}
