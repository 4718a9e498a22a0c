// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Keel daemon library: configuration, lifecycle, and the socket protocol
//! that producers and tooling use to reach the queue and the reconcilers

pub mod config;
pub mod lifecycle;
pub mod protocol;
pub mod server;

pub use config::{Config, Settings};
pub use protocol::{Request, Response};
