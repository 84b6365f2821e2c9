// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor adapter: a thin facade over a host service manager
//! (systemd, launchd) that installs, starts, stops, and queries the worker
//! unit.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod adapter;
mod error;
#[cfg(target_os = "macos")]
mod launchd;
mod spec;
mod status;
mod systemd;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use adapter::SupervisorAdapter;
pub use error::SupervisorError;
#[cfg(target_os = "macos")]
pub use launchd::LaunchdAdapter;
pub use spec::{RestartPolicy, StartMode, UnitSpec};
pub use status::ServiceStatus;
pub use systemd::SystemdUserAdapter;

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeSupervisorAdapter;
