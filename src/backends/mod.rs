// SPDX-License-Identifier: GPL-3.0-only

//! The three backend technologies behind the one render contract
//!
//! Each concrete filter binds to exactly one of these:
//!
//! - [`graph`]: a declarative chain of built-in image operators, assembled
//!   per call from current parameter values
//! - [`compute`]: custom compute kernels compiled once at construction,
//!   dispatched on the GPU with a CPU reference fallback
//! - [`specialized`]: fixed, library-optimized operators needing only
//!   source/destination surfaces and a small parameter struct

pub mod compute;
pub mod graph;
pub mod specialized;
