// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Minimal module process.
//!
//! Started by the renderer with `--serverSocket` and `--moduleSocket`. Serves
//! callbacks on the module socket, starts a session on the host and blocks
//! until the host sends shutdown. Saved preferences (see `modlink-config`)
//! fill in whatever the command line leaves out.

use anyhow::{Context, Result};
use clap::Parser;
use modlink_client::{init_tracing, Endpoint, ModuleArgs, ModuleRuntime};
use modlink_config::{ConfigService, FsConfigStore, ModulePrefs, PREFS_KEY};
use tracing::{info, warn};

fn load_prefs(key: &str) -> Result<ModulePrefs> {
    let store = FsConfigStore::new()?;
    let prefs = ConfigService::new(store).load_or_default(key)?;
    Ok(prefs)
}

/// Fill unset flags from `prefs`. Flags always win.
fn apply_prefs(mut args: ModuleArgs, prefs: ModulePrefs) -> Result<ModuleArgs> {
    if args.server_socket.is_none() {
        if let Some(addr) = prefs.server_socket {
            args.server_socket = Some(
                addr.parse::<Endpoint>()
                    .context("saved server socket")?,
            );
        }
    }
    if args.module_socket.is_none() {
        if let Some(addr) = prefs.module_socket {
            args.module_socket = Some(
                addr.parse::<Endpoint>()
                    .context("saved module socket")?,
            );
        }
    }
    if args.log_filter.is_none() {
        args.log_filter = prefs.log_filter;
    }
    if args.max_frame_bytes == ModulePrefs::default().max_frame_bytes {
        args.max_frame_bytes = prefs.max_frame_bytes;
    }
    Ok(args)
}

fn main() -> Result<()> {
    let args = ModuleArgs::parse();
    let key = args.config_key.clone().unwrap_or_else(|| PREFS_KEY.to_string());
    let (prefs, prefs_err) = match load_prefs(&key) {
        Ok(prefs) => (prefs, None),
        Err(err) => (ModulePrefs::default(), Some(err)),
    };
    let args = apply_prefs(args, prefs)?;

    init_tracing(args.log_filter.as_deref())?;
    if let Some(err) = prefs_err {
        warn!(%key, "ignoring saved preferences: {err:#}");
    }

    let runtime = ModuleRuntime::start(&args).context("module startup failed")?;
    info!("waiting for host shutdown");
    runtime.wait();
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn flags_win_over_saved_prefs() {
        let args = ModuleArgs::try_parse_from(["module", "--serverSocket", "unix:/run/flag.sock"]).unwrap();
        let prefs = ModulePrefs {
            server_socket: Some("unix:/run/saved.sock".into()),
            module_socket: Some("127.0.0.1:7000".into()),
            max_frame_bytes: 1024,
            log_filter: Some("debug".into()),
        };
        let merged = apply_prefs(args, prefs).unwrap();
        assert_eq!(
            merged.server_socket,
            Some(Endpoint::Unix("/run/flag.sock".into()))
        );
        assert_eq!(merged.module_endpoint(), Endpoint::Tcp("127.0.0.1:7000".into()));
        assert_eq!(merged.max_frame_bytes, 1024);
        assert_eq!(merged.log_filter.as_deref(), Some("debug"));
    }

    #[test]
    fn malformed_saved_address_is_an_error() {
        let args = ModuleArgs::try_parse_from(["module"]).unwrap();
        let prefs = ModulePrefs {
            server_socket: Some("nowhere".into()),
            ..ModulePrefs::default()
        };
        assert!(apply_prefs(args, prefs).is_err());
    }
}
