// SPDX-License-Identifier: GPL-3.0-only

//! Disk management facade and selection engine
//!
//! [`DiskManager`] is the provider-agnostic entry point task-sequence
//! tasks use: it wraps exactly one active backend and never falls
//! back to another. The selection engine narrows an enumerated disk
//! set through an ordered list of declarative steps; the scheme
//! module synthesizes default partition plans; the retry module is
//! the caller-side retry policy for advanced operations.

pub mod manager;
pub mod retry;
pub mod scheme;
pub mod selection;

pub use manager::DiskManager;
pub use retry::retry_operation;
pub use scheme::{default_partition_scheme, gpt_scheme, mbr_scheme};
pub use selection::{CompiledCondition, ExprError, apply_pipeline, apply_step};
