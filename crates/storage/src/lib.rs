// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! WAL-backed durable key-value store

mod op;
mod state;
mod store;
mod wal;

pub use op::StoreOp;
pub use state::MaterializedStore;
pub use store::{DurableStore, KvStore, StoreError, Transaction, Watched};
pub use wal::{Wal, WalError};
