// Copyright (c) Contributors to the spmod project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;

use super::*;

fn make_cmd(path: &std::path::Path, template: &str) -> CmdInit {
    CmdInit {
        path: path.to_path_buf(),
        root: "/opt/modules".to_string(),
        template: template.to_string(),
    }
}

#[rstest]
#[case("minimal")]
#[case("standard")]
fn test_generated_templates_are_valid_configs(#[case] template: &str) {
    let tmp = tempfile::tempdir().expect("tempdir");
    let mut cmd = make_cmd(tmp.path(), template);

    let code = cmd.run().expect("init should succeed");
    assert_eq!(code, 0);

    let written = tmp.path().join(spmod::MODULES_CONFIG_FILENAME);
    let config = spmod::ModulesConfig::load(&written).expect("template must parse");
    config.validate().expect("template must validate");
    assert!(config.backends.contains_key("tcl"));
}

#[rstest]
fn test_init_refuses_to_overwrite() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let existing = tmp.path().join(spmod::MODULES_CONFIG_FILENAME);
    std::fs::write(&existing, "api: spmod/v0/config\n").expect("seed file");

    let mut cmd = make_cmd(tmp.path(), "standard");
    assert!(cmd.run().is_err(), "existing config must not be clobbered");
}
