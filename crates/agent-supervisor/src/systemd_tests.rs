// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn render_unit_file_includes_exec_start_and_restart_policy() {
    let mut spec = UnitSpec::new("agentd.service", vec!["/usr/bin/agentd".to_string(), "--join".to_string()]);
    spec.no_restart_exit_codes = vec![3, 4, 5];

    let rendered = SystemdUserAdapter::render_unit_file(&spec);

    assert!(rendered.contains("ExecStart=/usr/bin/agentd --join"));
    assert!(rendered.contains("Restart=always"));
    assert!(rendered.contains("RestartPreventExitStatus=3 4 5"));
    assert!(rendered.contains("WantedBy=default.target"));
}

#[test]
fn render_unit_file_carries_pre_start_and_environment() {
    let mut spec = UnitSpec::new("agentd.service", vec!["agentd".to_string()]);
    spec.pre_start.push(vec!["rm".to_string(), "-f".to_string(), "/tmp/agentd.sock".to_string()]);
    spec.environment.insert("AGENTD_STATE_DIR".to_string(), "/var/lib/agentd".to_string());

    let rendered = SystemdUserAdapter::render_unit_file(&spec);

    assert!(rendered.contains("ExecStartPre=rm -f /tmp/agentd.sock"));
    assert!(rendered.contains("Environment=\"AGENTD_STATE_DIR=/var/lib/agentd\""));
}

#[test]
fn unit_path_respects_absolute_names() {
    let adapter = SystemdUserAdapter::new(PathBuf::from("/home/user/.config/systemd/user"));
    assert_eq!(adapter.unit_path("/opt/custom/agentd.service"), PathBuf::from("/opt/custom/agentd.service"));
    assert_eq!(
        adapter.unit_path("agentd.service"),
        PathBuf::from("/home/user/.config/systemd/user/agentd.service")
    );
}

#[test]
fn translate_systemctl_error_recognizes_unknown_unit() {
    let err = translate_systemctl_error(b"Unit agentd.service not found.", "stop failed");
    assert!(matches!(err, SupervisorError::UnitNotFound(_)));
}
