// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Configuration services for modlink module processes.
//! Storage sits behind [`config::ConfigStore`] so tests can swap the filesystem out.

pub mod config;
pub mod fs;
pub mod prefs;

pub use config::{ConfigError, ConfigService, ConfigStore};
pub use fs::FsConfigStore;
pub use prefs::{ModulePrefs, PREFS_KEY};
