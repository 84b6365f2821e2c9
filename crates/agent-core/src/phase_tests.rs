// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::OperationKey;

fn key() -> OperationKey {
    OperationKey::new("acct", "cluster", "op")
}

#[test]
fn root_phase_has_sentinel_id() {
    let phase = Phase::root(key());
    assert!(phase.is_root());
    assert_eq!(phase.id, "/");
    assert!(!phase.force);
    assert!(!phase.rollback);
}

#[test]
fn named_phase_is_not_root() {
    let phase = Phase { key: key(), id: "etcd".to_string(), force: true, rollback: true };
    assert!(!phase.is_root());
}
