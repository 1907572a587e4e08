//! # tandem-rpc-core
//!
//! This crate provides the core utilities for [`tandem-rpc`](https://docs.rs/tandem-rpc).
//! It includes the error taxonomy, the codec interface, client configuration and the
//! call context shared by the other crates in the workspace.

#[macro_use]
extern crate log;

mod codec;
pub use codec::Codec;
mod config;
pub use config::*;
mod context;
pub use context::CallContext;
pub mod error;
pub mod io;
