// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ID generation abstraction, mirroring the [`Clock`](crate::Clock) pattern:
//! real randomness behind a trait so tests can substitute a deterministic
//! sequence instead of asserting against actual UUIDs.

/// Generates opaque string identifiers, e.g. the `operation_id` leg of an
/// [`OperationKey`](crate::OperationKey) when the caller doesn't supply one.
pub trait IdGen: Send + Sync {
    fn next(&self) -> String;
}

/// Real id generator backed by UUIDv4.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn next(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
