// Copyright (c) Contributors to the spmod project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;

use super::*;
use crate::config::BackendSettings;
use crate::environment::{EnvOp, PrependEnv, SetEnv, UnsetEnv};

fn make_spec(name: &str, version: &str, hash: &str) -> PackageSpec {
    PackageSpec {
        name: name.to_string(),
        version: version.to_string(),
        hash: hash.to_string(),
        description: Some(format!("{name} test package")),
        environment: vec![
            EnvOp::Set(SetEnv {
                set: format!("{}_ROOT", name.to_uppercase()),
                value: format!("/opt/pkgs/{name}-{version}"),
            }),
            EnvOp::Prepend(PrependEnv {
                prepend: "PATH".to_string(),
                value: format!("/opt/pkgs/{name}-{version}/bin"),
                separator: None,
            }),
        ],
        ..Default::default()
    }
}

fn tcl_generator(root: &std::path::Path) -> Generator {
    Generator::from_backend_name("tcl", BackendSettings::new(root)).expect("tcl backend exists")
}

#[rstest]
fn test_write_creates_module_file() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let generator = tcl_generator(tmp.path());
    let spec = make_spec("zlib", "1.2.13", "abcdef123456");

    let outcome = generator.write(&spec).expect("write should succeed");
    let WriteOutcome::Written { location, warnings } = outcome else {
        panic!("first write must report Written");
    };
    assert!(warnings.is_empty());
    assert!(location.path.is_file());

    let content = std::fs::read_to_string(&location.path).expect("module file readable");
    assert!(content.starts_with("#%Module1.0"));
    assert!(content.contains("setenv ZLIB_ROOT"));
}

#[rstest]
fn test_write_twice_is_idempotent() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let generator = tcl_generator(tmp.path());
    let spec = make_spec("zlib", "1.2.13", "abcdef123456");

    let first = generator.write(&spec).expect("first write");
    let WriteOutcome::Written { location, .. } = first else {
        panic!("first write must report Written");
    };
    let before = std::fs::read_to_string(&location.path).expect("readable");

    let second = generator.write(&spec).expect("second write");
    assert!(
        matches!(second, WriteOutcome::UpToDate { .. }),
        "second write must be a no-op"
    );
    let after = std::fs::read_to_string(&location.path).expect("readable");
    assert_eq!(before, after);
}

#[rstest]
fn test_write_updates_changed_content() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let generator = tcl_generator(tmp.path());
    let mut spec = make_spec("zlib", "1.2.13", "abcdef123456");

    generator.write(&spec).expect("first write");

    spec.environment.push(EnvOp::Prepend(PrependEnv {
        prepend: "MANPATH".to_string(),
        value: "/opt/pkgs/zlib-1.2.13/man".to_string(),
        separator: None,
    }));
    let outcome = generator.write(&spec).expect("second write");
    let WriteOutcome::Written { location, .. } = outcome else {
        panic!("changed content must be rewritten");
    };

    let content = std::fs::read_to_string(&location.path).expect("readable");
    assert!(content.contains("prepend-path MANPATH"));
}

#[rstest]
fn test_remove_then_remove_again() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let generator = tcl_generator(tmp.path());
    let spec = make_spec("zlib", "1.2.13", "abcdef123456");

    generator.write(&spec).expect("write");

    let first = generator.remove(&spec).expect("first remove");
    let RemoveOutcome::Removed { location } = first else {
        panic!("first remove must delete the file");
    };
    assert!(!location.path.exists());

    let second = generator.remove(&spec).expect("second remove");
    assert!(matches!(second, RemoveOutcome::AlreadyAbsent { .. }));
}

#[rstest]
fn test_remove_never_written_is_noop() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let generator = tcl_generator(tmp.path());
    let spec = make_spec("zlib", "1.2.13", "abcdef123456");

    let outcome = generator.remove(&spec).expect("remove should succeed");
    assert!(matches!(outcome, RemoveOutcome::AlreadyAbsent { .. }));
}

#[rstest]
fn test_location_is_stable_across_generators() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let spec = make_spec("zlib", "1.2.13", "abcdef123456");

    let first = tcl_generator(tmp.path()).location(&spec).expect("location");
    let second = tcl_generator(tmp.path()).location(&spec).expect("location");
    assert_eq!(first, second);
}

#[rstest]
fn test_excluded_spec_writes_nothing() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let mut settings = BackendSettings::new(tmp.path());
    settings.exclude = vec!["zlib".to_string()];
    let generator = Generator::from_backend_name("tcl", settings).expect("tcl backend exists");
    let spec = make_spec("zlib", "1.2.13", "abcdef123456");

    let outcome = generator.write(&spec).expect("write should succeed");
    assert!(matches!(outcome, WriteOutcome::Excluded { .. }));
    assert_eq!(
        std::fs::read_dir(tmp.path()).expect("readable").count(),
        0,
        "no file may be created for an excluded spec"
    );
}

#[rstest]
fn test_unresolvable_conflict_fails_render() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let generator = tcl_generator(tmp.path());
    let mut spec = make_spec("zlib", "1.2.13", "abcdef123456");
    spec.environment = vec![
        EnvOp::Unset(UnsetEnv {
            unset: "PATH".to_string(),
        }),
        EnvOp::Prepend(PrependEnv {
            prepend: "PATH".to_string(),
            value: "/opt/zlib/bin".to_string(),
            separator: None,
        }),
    ];

    let result = generator.write(&spec);
    assert!(matches!(
        result,
        Err(crate::Error::UnresolvableEnvironmentConflict { .. })
    ));
}

#[rstest]
fn test_conflict_warnings_surface_in_outcome() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let generator = tcl_generator(tmp.path());
    let dep1 = PackageSpec {
        name: "one".to_string(),
        version: "1.0".to_string(),
        hash: "hashone".to_string(),
        environment: vec![EnvOp::Set(SetEnv {
            set: "X".to_string(),
            value: "1".to_string(),
        })],
        ..Default::default()
    };
    let dep2 = PackageSpec {
        name: "two".to_string(),
        version: "1.0".to_string(),
        hash: "hashtwo".to_string(),
        environment: vec![EnvOp::Set(SetEnv {
            set: "X".to_string(),
            value: "2".to_string(),
        })],
        ..Default::default()
    };
    let mut spec = make_spec("root", "1.0", "hashroot");
    spec.dependencies = vec![dep1, dep2];

    let outcome = generator.write(&spec).expect("write should succeed");
    let WriteOutcome::Written { location, warnings } = outcome else {
        panic!("write must succeed with warnings");
    };
    assert_eq!(warnings.len(), 1);

    let content = std::fs::read_to_string(&location.path).expect("readable");
    assert!(content.contains("setenv X \"2\""));
    assert!(!content.contains("setenv X \"1\""));
}

#[rstest]
fn test_autoload_direct_emits_dependency_keys() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let mut settings = BackendSettings::new(tmp.path());
    settings.autoload = crate::config::Autoload::Direct;
    let generator = Generator::from_backend_name("lua", settings).expect("lua backend exists");

    let mut spec = make_spec("hdf5", "1.14.3", "aaaa11112222");
    spec.dependencies = vec![make_spec("zlib", "1.2.13", "bbbb11112222")];

    let preview = generator.preview(&spec).expect("preview should succeed");
    assert!(preview.body.contains("depends_on(\"zlib/1.2.13-bbbb111\")"));
}

#[rstest]
fn test_autoload_all_walks_transitively() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let mut settings = BackendSettings::new(tmp.path());
    settings.autoload = crate::config::Autoload::All;
    let generator = Generator::from_backend_name("lua", settings).expect("lua backend exists");

    let leaf = make_spec("zlib", "1.2.13", "cccc11112222");
    let mut mid = make_spec("szip", "2.1.1", "bbbb11112222");
    mid.dependencies = vec![leaf];
    let mut spec = make_spec("hdf5", "1.14.3", "aaaa11112222");
    spec.dependencies = vec![mid];

    let preview = generator.preview(&spec).expect("preview should succeed");
    let zlib = preview.body.find("depends_on(\"zlib").expect("zlib autoloaded");
    let szip = preview.body.find("depends_on(\"szip").expect("szip autoloaded");
    assert!(zlib < szip, "dependencies load before dependents");
}

#[rstest]
fn test_conflict_templates_render() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let mut settings = BackendSettings::new(tmp.path());
    settings.conflict = vec!["{name}".to_string()];
    let generator = Generator::from_backend_name("tcl", settings).expect("tcl backend exists");
    let spec = make_spec("zlib", "1.2.13", "abcdef123456");

    let preview = generator.preview(&spec).expect("preview should succeed");
    assert!(preview.body.contains("conflict zlib\n"));
}

#[rstest]
fn test_preview_matches_written_file() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let generator = tcl_generator(tmp.path());
    let spec = make_spec("zlib", "1.2.13", "abcdef123456");

    let preview = generator.preview(&spec).expect("preview");
    let WriteOutcome::Written { location, .. } = generator.write(&spec).expect("write") else {
        panic!("first write must report Written");
    };

    let content = std::fs::read_to_string(&location.path).expect("readable");
    assert_eq!(content, preview.body);
}
