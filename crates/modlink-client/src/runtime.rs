// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Module process bootstrap: command line, logging, bridge, session start.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use modlink_proto::wire::DEFAULT_MAX_PAYLOAD;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::bridge::CallbackBridge;
use crate::channel::{install_channel, Channel};
use crate::control::ControlService;
use crate::server::BridgeServer;
use crate::transport::{Endpoint, SocketTransport};

/// Arguments the host passes when it launches a module process.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Renderer module process")]
pub struct ModuleArgs {
    /// Address of the host RPC server.
    #[arg(long = "serverSocket", alias = "server-socket")]
    pub server_socket: Option<Endpoint>,
    /// Address this module listens on for callbacks.
    #[arg(long = "moduleSocket", alias = "module-socket")]
    pub module_socket: Option<Endpoint>,
    /// Largest frame payload accepted in either direction.
    #[arg(long, default_value_t = DEFAULT_MAX_PAYLOAD)]
    pub max_frame_bytes: usize,
    /// Log filter directives (overrides `RUST_LOG`).
    #[arg(long)]
    pub log_filter: Option<String>,
    /// Name of the saved preferences to start from.
    #[arg(long)]
    pub config_key: Option<String>,
}

impl ModuleArgs {
    /// Callback address, defaulting to a per-process socket in the temp dir.
    pub fn module_endpoint(&self) -> Endpoint {
        self.module_socket.clone().unwrap_or_else(|| {
            Endpoint::Unix(default_module_socket())
        })
    }
}

fn default_module_socket() -> PathBuf {
    std::env::temp_dir().join(format!("modlink-module-{}.sock", std::process::id()))
}

/// Install the fmt subscriber. `filter` wins over `RUST_LOG`; both default
/// to `info`.
pub fn init_tracing(filter: Option<&str>) -> Result<()> {
    let filter = match filter {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid log filter {directives:?}"))?,
        None => EnvFilter::from_default_env().add_directive("info".parse()?),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| anyhow!(err))
}

/// A running module: channel to the host plus the callback listener.
#[derive(Debug)]
pub struct ModuleRuntime {
    channel: Channel,
    server: BridgeServer,
    control: ControlService,
}

impl ModuleRuntime {
    /// Connect to the host named in `args`, install the channel process-wide,
    /// serve callbacks and start the session.
    pub fn start(args: &ModuleArgs) -> Result<Self> {
        let server = args
            .server_socket
            .clone()
            .context("--serverSocket is required")?;
        let channel = Channel::new(SocketTransport::new(server).with_max_payload(args.max_frame_bytes));
        if install_channel(channel.clone()).is_err() {
            warn!("process channel already installed; using a private channel");
        }
        Self::start_with(channel, args.module_endpoint(), args.max_frame_bytes)
    }

    /// Serve callbacks on `module` and start the session over `channel`.
    pub fn start_with(channel: Channel, module: Endpoint, max_frame_bytes: usize) -> Result<Self> {
        let bridge = Arc::new(CallbackBridge::for_channel(&channel));
        let server = BridgeServer::bind(module, bridge.clone(), max_frame_bytes)?;
        bridge.set_ready(true);

        let control = ControlService::new(&channel);
        let source = server.endpoint().to_string();
        if let Err(err) = control.start(&source) {
            server.shutdown();
            return Err(err).context("starting session");
        }
        info!(callbacks = %source, "module session started");
        Ok(Self {
            channel,
            server,
            control,
        })
    }

    /// Channel to the host.
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Session control for this runtime.
    pub fn control(&self) -> &ControlService {
        &self.control
    }

    /// Bridge serving inbound calls.
    pub fn bridge(&self) -> &Arc<CallbackBridge> {
        self.server.bridge()
    }

    /// Block until the host asks the module to shut down, then stop.
    pub fn wait(self) {
        self.bridge().shutdown_signal().wait();
        info!("shutdown received");
        self.shutdown();
    }

    /// Stop the session and close the listener.
    pub fn shutdown(self) {
        self.bridge().set_ready(false);
        if let Err(err) = self.control.stop() {
            warn!(%err, "stopping session failed");
        }
        self.server.shutdown();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parses_host_style_flags_with_quotes() {
        let args = ModuleArgs::try_parse_from([
            "module",
            "--serverSocket",
            "\"127.0.0.1:5555\"",
            "--moduleSocket",
            "'/tmp/mod.sock'",
        ])
        .unwrap();
        assert_eq!(
            args.server_socket,
            Some(Endpoint::Tcp("127.0.0.1:5555".into()))
        );
        assert_eq!(
            args.module_endpoint(),
            Endpoint::Unix(PathBuf::from("/tmp/mod.sock"))
        );
        assert_eq!(args.max_frame_bytes, DEFAULT_MAX_PAYLOAD);
        assert!(args.config_key.is_none());
    }

    #[test]
    fn module_socket_defaults_to_temp_dir() {
        let args = ModuleArgs::try_parse_from(["module", "--server-socket", "unix:/run/host.sock"]).unwrap();
        match args.module_endpoint() {
            Endpoint::Unix(path) => assert!(path.starts_with(std::env::temp_dir())),
            other => panic!("unexpected endpoint {other}"),
        }
    }

    #[test]
    fn rejects_malformed_server_address() {
        assert!(ModuleArgs::try_parse_from(["module", "--serverSocket", "nowhere"]).is_err());
    }

    #[test]
    fn start_requires_server_socket() {
        let args = ModuleArgs::try_parse_from(["module"]).unwrap();
        assert!(ModuleRuntime::start(&args).is_err());
    }
}
