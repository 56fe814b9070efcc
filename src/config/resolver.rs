// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Tunnel request resolution.
//!
//! Merges the three configuration layers into a single [`TunnelRequest`].
//! Resolution priority (highest to lowest):
//! 1. Command-line arguments
//! 2. The selected tunnel profile (`--profile`)
//! 3. Global `defaults:` section

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;
use crate::jump::{self, JumpHop};
use crate::tunnel::TunnelRequest;

use super::types::{Config, TunnelProfile};
use super::utils::{expand_env_vars, expand_tilde};

impl Config {
    /// Get a tunnel profile by name.
    pub fn get_tunnel(&self, name: &str) -> Option<&TunnelProfile> {
        self.tunnels.get(name)
    }
}

/// Build a [`TunnelRequest`] from the command line and loaded configuration.
///
/// Validation of the merged result (required fields, port allocation) is
/// deferred to [`TunnelRequest::resolve`]; this function only decides which
/// layer supplies each value.
pub fn resolve_request(cli: &Cli, config: &Config) -> Result<TunnelRequest> {
    let profile = match cli.profile.as_deref() {
        Some(name) => Some(config.get_tunnel(name).ok_or_else(|| {
            anyhow::anyhow!(
                "Tunnel '{}' not found in configuration.\nAvailable tunnels: {}\nPlease check your configuration file.",
                name,
                config.tunnels.keys().cloned().collect::<Vec<_>>().join(", ")
            )
        })?),
        None => None,
    };

    let destination = match cli.destination.as_deref() {
        Some(spec) => {
            let expanded = expand_env_vars(spec);
            Some(
                jump::parse_endpoint(&expanded)
                    .with_context(|| format!("invalid destination '{spec}'"))?,
            )
        }
        None => None,
    };

    let remote_host = destination
        .as_ref()
        .map(|d| d.host.clone())
        .or_else(|| profile.and_then(|p| p.host.as_ref().map(|h| expand_env_vars(h))));

    let remote_port = destination
        .as_ref()
        .and_then(|d| d.port)
        .or_else(|| profile.and_then(|p| p.port));

    let user = destination
        .as_ref()
        .and_then(|d| d.user.clone())
        .or_else(|| profile.and_then(|p| p.user.clone()))
        .or_else(|| config.defaults.user.clone())
        .map(|u| expand_env_vars(&u));

    let identity = cli
        .identity
        .as_ref()
        .map(|p| p.to_string_lossy().into_owned())
        .or_else(|| profile.and_then(|p| p.identity.clone()))
        .or_else(|| config.defaults.identity.clone())
        .map(|raw| expand_tilde(&PathBuf::from(expand_env_vars(&raw))));

    let (target_host, target_port) = match cli.target.as_deref() {
        Some(spec) => {
            let (host, port) = parse_target(spec)?;
            (host, Some(port))
        }
        None => (
            profile.and_then(|p| p.target_host.as_ref().map(|h| expand_env_vars(h))),
            profile.and_then(|p| p.target_port),
        ),
    };

    // An explicit -J overrides the profile entirely; `-J ""` disables
    // inherited jump hosts.
    let jump_hosts: Vec<JumpHop> = match cli.jump.as_deref() {
        Some(spec) => jump::parse_jump_hosts(&expand_env_vars(spec))?,
        None => profile
            .map(|p| p.jump_hosts.iter().map(|j| j.to_hop()).collect::<Result<Vec<_>>>())
            .transpose()?
            .unwrap_or_default(),
    };

    let local_port = cli.local_port.or_else(|| profile.and_then(|p| p.local_port));

    let compression = if cli.compression {
        Some(true)
    } else {
        profile
            .and_then(|p| p.compression)
            .or(config.defaults.compression)
    };

    let timeout = cli
        .timeout
        .map(Duration::from_secs)
        .or_else(|| {
            profile
                .and_then(|p| p.timeout_ms)
                .map(Duration::from_millis)
        })
        .or_else(|| config.defaults.timeout_ms.map(Duration::from_millis));

    Ok(TunnelRequest {
        user,
        identity,
        local_port,
        remote_host,
        remote_port,
        jump_hosts,
        target_host,
        target_port,
        compression,
        timeout,
    })
}

/// Parse a `[host:]port` forward target specification.
///
/// A bare port number forwards to the SSH host itself.
fn parse_target(spec: &str) -> Result<(Option<String>, u16)> {
    if let Ok(port) = spec.parse::<u16>() {
        anyhow::ensure!(port != 0, "target port must be non-zero");
        return Ok((None, port));
    }

    let (host, port) = match spec.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && !port.is_empty() => (host, port),
        _ => anyhow::bail!("invalid target '{spec}', expected [host:]port"),
    };

    let port = port
        .parse::<u16>()
        .with_context(|| format!("invalid target port '{port}'"))?;
    anyhow::ensure!(port != 0, "target port must be non-zero");

    Ok((Some(expand_env_vars(host)), port))
}
