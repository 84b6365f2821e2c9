// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    active = { ServiceStatus::Active, true },
    inactive = { ServiceStatus::Inactive, false },
    failed = { ServiceStatus::Failed, false },
    activating = { ServiceStatus::Activating, false },
    deactivating = { ServiceStatus::Deactivating, false },
    unknown = { ServiceStatus::Unknown, false },
)]
fn is_active_classification(status: ServiceStatus, expected: bool) {
    assert_eq!(status.is_active(), expected);
}
