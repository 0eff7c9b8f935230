// SPDX-License-Identifier: GPL-3.0-only

//! Fixture backends
//!
//! In-memory implementations of both native backend surfaces, built
//! from one shared [`FixtureDisk`] description. Tests use them for
//! call-count instrumentation; the agent uses them for dry runs
//! against a disk set loaded from JSON.

pub mod fixtures;
pub mod vds;
pub mod wmi;

pub use fixtures::{FixtureDisk, load_fixtures};
pub use vds::{FixtureServiceLoader, FixtureVdsService};
pub use wmi::FixtureQueryExecutor;
