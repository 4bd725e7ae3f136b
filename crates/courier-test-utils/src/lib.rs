// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Courier integration tests.
//!
//! Provides mock collaborators, fault injection, and a test harness for
//! fast, deterministic tests without external services.
//!
//! # Components
//!
//! - [`MockSender`] - Mock outbound sender with scripted replies and capture
//! - [`FaultyStore`] - Storage wrapper that fails or hangs chosen operations
//! - [`TestHarness`] - Full ingestion stack over a temp SQLite database

pub mod faulty_store;
pub mod harness;
pub mod mock_sender;

pub use faulty_store::{Fault, FaultyStore, StoreOp};
pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_sender::{MockReply, MockSender};
