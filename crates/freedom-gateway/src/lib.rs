// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Freedom pipeline.
//!
//! Exposes migration start, stop, resume and status to users, and push
//! endpoints through which an external task queue can deliver scan and
//! propagate tasks. Handlers are thin: every request maps onto one pipeline
//! operation and its error onto a status code.

pub mod handlers;
pub mod server;

pub use handlers::{ApiError, task_status};
pub use server::{GatewayState, ServerConfig, router, serve};
