// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Freedom integration tests.
//!
//! Provides mock adapters, a manually driven clock and test harness
//! infrastructure for fast, deterministic, CI-runnable tests without external
//! services.
//!
//! # Components
//!
//! - [`MockSource`] - Mock source adapter serving pre-configured pages
//! - [`MockDestination`] - Mock destination adapter capturing publishes
//! - [`ManualClock`] - Clock that only moves when told to
//! - [`TestHarness`] - Temp SQLite store wired to the mocks

pub mod clock;
pub mod harness;
pub mod mock_destination;
pub mod mock_source;

pub use clock::ManualClock;
pub use harness::TestHarness;
pub use mock_destination::{MockDestination, Published};
pub use mock_source::MockSource;
