// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Saved defaults for module process startup.

use serde::{Deserialize, Serialize};

/// Config key the module binary reads its preferences from.
pub const PREFS_KEY: &str = "module";

/// Startup defaults. Command-line flags take precedence over every field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulePrefs {
    /// Host RPC server address.
    pub server_socket: Option<String>,
    /// Address the module listens on for callbacks.
    pub module_socket: Option<String>,
    /// Largest frame payload accepted.
    pub max_frame_bytes: usize,
    /// Log filter directives.
    pub log_filter: Option<String>,
}

impl Default for ModulePrefs {
    fn default() -> Self {
        Self {
            server_socket: None,
            module_socket: None,
            max_frame_bytes: 8 * 1024 * 1024,
            log_filter: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let prefs: ModulePrefs =
            serde_json::from_str(r#"{"server_socket":"unix:/run/host.sock"}"#).unwrap();
        assert_eq!(prefs.server_socket.as_deref(), Some("unix:/run/host.sock"));
        assert_eq!(prefs.max_frame_bytes, 8 * 1024 * 1024);
        assert!(prefs.log_filter.is_none());
    }
}
