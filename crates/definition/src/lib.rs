// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Pipeline definition parsing and validation

mod parser;
mod pipeline;

pub use parser::{load_dir, parse_pipeline, ParseError};
pub use pipeline::{is_valid_name, PipelineDef};
