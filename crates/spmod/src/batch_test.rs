// Copyright (c) Contributors to the spmod project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;

use super::*;
use crate::config::BackendSettings;

fn make_spec(name: &str, version: &str, hash: &str) -> PackageSpec {
    PackageSpec {
        name: name.to_string(),
        version: version.to_string(),
        hash: hash.to_string(),
        ..Default::default()
    }
}

fn config_with(backends: Vec<(&str, BackendSettings)>) -> ModulesConfig {
    ModulesConfig {
        backends: backends
            .into_iter()
            .map(|(name, settings)| (name.to_string(), settings))
            .collect(),
        ..Default::default()
    }
}

#[rstest]
fn test_write_batch_across_backends() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config = config_with(vec![
        ("tcl", BackendSettings::new(tmp.path().join("tcl"))),
        ("lua", BackendSettings::new(tmp.path().join("lua"))),
    ]);
    let spec = make_spec("zlib", "1.2.13", "abcdef123456");

    let report = write_modules(&spec, &config).expect("batch should run");
    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.succeeded(), 2);
    assert!(!report.has_failures());

    for outcome in &report.outcomes {
        let BackendResult::Done { action, path } = &outcome.result else {
            panic!("backend {} should succeed", outcome.backend);
        };
        assert_eq!(*action, ModuleAction::Written);
        assert!(path.is_file());
    }
}

#[rstest]
fn test_unknown_backend_reported_once_others_run() {
    // Three enabled backends, one of them unresolvable: the report carries
    // two successes and one error, and nothing escapes as a panic or Err.
    let tmp = tempfile::tempdir().expect("tempdir");
    let config = config_with(vec![
        ("tcl", BackendSettings::new(tmp.path().join("tcl"))),
        ("lua", BackendSettings::new(tmp.path().join("lua"))),
        ("dotkit", BackendSettings::new(tmp.path().join("dotkit"))),
    ]);
    let spec = make_spec("zlib", "1.2.13", "abcdef123456");

    let report = write_modules(&spec, &config).expect("batch should run");
    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);

    let failed: Vec<&BackendOutcome> = report
        .outcomes
        .iter()
        .filter(|o| matches!(o.result, BackendResult::Failed { .. }))
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].backend, "dotkit");
    assert!(matches!(
        failed[0].result,
        BackendResult::Failed {
            error: Error::UnknownBackend { .. }
        }
    ));
}

#[rstest]
fn test_write_failure_does_not_abort_batch() {
    let tmp = tempfile::tempdir().expect("tempdir");
    // Park the lua root below a regular file so directory creation fails
    let blocker = tmp.path().join("blocker");
    std::fs::write(&blocker, "not a directory").expect("write blocker");

    let config = config_with(vec![
        ("tcl", BackendSettings::new(tmp.path().join("tcl"))),
        ("lua", BackendSettings::new(blocker.join("lua"))),
    ]);
    let spec = make_spec("zlib", "1.2.13", "abcdef123456");

    let report = write_modules(&spec, &config).expect("batch should run");
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);

    let lua = report
        .outcomes
        .iter()
        .find(|o| o.backend == "lua")
        .expect("lua outcome present");
    assert!(matches!(
        lua.result,
        BackendResult::Failed {
            error: Error::WriteFailed { .. }
        }
    ));
}

#[rstest]
fn test_disabled_and_empty_configs_generate_nothing() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let mut disabled = BackendSettings::new(tmp.path().join("tcl"));
    disabled.enable = false;

    let spec = make_spec("zlib", "1.2.13", "abcdef123456");

    let report = write_modules(&spec, &config_with(vec![("tcl", disabled)]))
        .expect("batch should run");
    assert!(report.is_empty());

    let report = write_modules(&spec, &ModulesConfig::default()).expect("batch should run");
    assert!(report.is_empty());
}

#[rstest]
fn test_malformed_spec_is_fatal() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config = config_with(vec![("tcl", BackendSettings::new(tmp.path()))]);
    let spec = make_spec("zlib", "1.2.13", "");

    let result = write_modules(&spec, &config);
    assert!(matches!(result, Err(Error::MalformedSpec { .. })));
}

#[rstest]
fn test_remove_batch_is_symmetric() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config = config_with(vec![
        ("tcl", BackendSettings::new(tmp.path().join("tcl"))),
        ("lua", BackendSettings::new(tmp.path().join("lua"))),
    ]);
    let spec = make_spec("zlib", "1.2.13", "abcdef123456");

    write_modules(&spec, &config).expect("write batch");
    let report = remove_modules(&spec, &config).expect("remove batch");
    assert_eq!(report.succeeded(), 2);
    for outcome in &report.outcomes {
        let BackendResult::Done { action, path } = &outcome.result else {
            panic!("remove should succeed");
        };
        assert_eq!(*action, ModuleAction::Removed);
        assert!(!path.exists());
    }

    // Removing again reports AlreadyAbsent, still a success
    let report = remove_modules(&spec, &config).expect("second remove batch");
    assert_eq!(report.succeeded(), 2);
    for outcome in &report.outcomes {
        assert!(matches!(
            outcome.result,
            BackendResult::Done {
                action: ModuleAction::AlreadyAbsent,
                ..
            }
        ));
    }
}

#[rstest]
fn test_environment_conflict_skips_one_backend_only() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config = config_with(vec![
        ("tcl", BackendSettings::new(tmp.path().join("tcl"))),
        ("lua", BackendSettings::new(tmp.path().join("lua"))),
    ]);

    let mut spec = make_spec("zlib", "1.2.13", "abcdef123456");
    spec.environment = vec![
        crate::EnvOp::Unset(crate::environment::UnsetEnv {
            unset: "PATH".to_string(),
        }),
        crate::EnvOp::Prepend(crate::environment::PrependEnv {
            prepend: "PATH".to_string(),
            value: "/opt/zlib/bin".to_string(),
            separator: None,
        }),
    ];

    let report = write_modules(&spec, &config).expect("batch should run");
    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.failed(), 2);
    for outcome in &report.outcomes {
        assert!(matches!(
            outcome.result,
            BackendResult::Failed {
                error: Error::UnresolvableEnvironmentConflict { .. }
            }
        ));
    }
}

#[rstest]
fn test_excluded_spec_counts_as_skipped() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let mut settings = BackendSettings::new(tmp.path().join("tcl"));
    settings.exclude = vec!["zlib".to_string()];
    let config = config_with(vec![("tcl", settings)]);
    let spec = make_spec("zlib", "1.2.13", "abcdef123456");

    let report = write_modules(&spec, &config).expect("batch should run");
    assert_eq!(report.skipped(), 1);
    assert_eq!(report.succeeded(), 0);
    assert!(!report.has_failures());
}

#[rstest]
fn test_set_conflict_warnings_reach_the_report() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config = config_with(vec![("tcl", BackendSettings::new(tmp.path().join("tcl")))]);

    let mut spec = make_spec("root", "1.0", "hashroot1");
    spec.dependencies = vec![
        PackageSpec {
            name: "one".to_string(),
            version: "1.0".to_string(),
            hash: "hashone1".to_string(),
            environment: vec![crate::EnvOp::Set(crate::environment::SetEnv {
                set: "X".to_string(),
                value: "1".to_string(),
            })],
            ..Default::default()
        },
        PackageSpec {
            name: "two".to_string(),
            version: "1.0".to_string(),
            hash: "hashtwo1".to_string(),
            environment: vec![crate::EnvOp::Set(crate::environment::SetEnv {
                set: "X".to_string(),
                value: "2".to_string(),
            })],
            ..Default::default()
        },
    ];

    let report = write_modules(&spec, &config).expect("batch should run");
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.outcomes[0].warnings.len(), 1);
}
