// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for modlink crates.
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`host`] - In-memory renderer host serving every outbound call
//! - [`harness`] - Socket fixtures: host server, module client, unreachable transport
#![forbid(unsafe_code)]

pub mod config;
pub mod harness;
pub mod host;

pub use config::InMemoryConfigStore;
pub use harness::{HostServer, ModuleClient, UnreachableTransport};
pub use host::{CapturedCallback, FakeHost, DEFAULT_PINS, DYNAMIC_ATTRIBUTE_BASE};
