// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Courier webhook service.
//!
//! Exposes the provider webhook intake, the per-counterparty history read,
//! outbound send endpoints, and unauthenticated health and metrics routes.

pub mod handlers;
pub mod server;

pub use server::{GatewayState, HealthState, build_router, start_server};
