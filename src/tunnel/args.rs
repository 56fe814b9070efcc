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

//! SSH client argument construction
//!
//! Pure translation of a resolved [`TunnelConfig`] into the ordered
//! argument vector for the `ssh` binary. The client parses flags and
//! positionals left-to-right, so the order is part of the contract:
//! remote port, connect target, local forward, `-N -v`, then the
//! optional identity, jump chain, and compression flags.
//!
//! `-v` is not cosmetic here: the readiness detector depends on the
//! client's verbose diagnostics for its signal.

use super::request::TunnelConfig;
use crate::jump::JumpHop;

/// Build the full argument vector for one tunnel invocation.
pub fn build_ssh_args(config: &TunnelConfig) -> Vec<String> {
    let connect_host = match &config.user {
        Some(user) => format!("{user}@{}", config.remote_host),
        None => config.remote_host.clone(),
    };

    let mut args = vec![
        "-p".to_string(),
        config.remote_port.to_string(),
        connect_host,
        "-L".to_string(),
        format!(
            "{}:{}:{}",
            config.local_port, config.target_host, config.target_port
        ),
        "-N".to_string(),
        "-v".to_string(),
    ];

    if let Some(identity) = &config.identity {
        args.push("-i".to_string());
        args.push(identity.to_string_lossy().into_owned());
    }

    let hops: Vec<String> = config
        .jump_hosts
        .iter()
        .map(|hop| format_hop(hop, config))
        .collect();
    if !hops.is_empty() {
        args.push("-J".to_string());
        args.push(hops.join(","));
    }

    if config.compression {
        args.push("-C".to_string());
    }

    args
}

/// Format one hop as `user@host:port` for the `-J` value.
///
/// A hop without a user inherits the request's user (an explicitly
/// empty one stays userless); a hop without a port inherits the
/// request's remote port, not 22 — surprising when hops listen on
/// different SSH ports, but it is what every existing caller relies on.
fn format_hop(hop: &JumpHop, config: &TunnelConfig) -> String {
    let port = hop.port.unwrap_or(config.remote_port);
    let user = match &hop.user {
        Some(user) if user.is_empty() => None,
        Some(user) => Some(user.as_str()),
        None => config.user.as_deref(),
    };
    match user {
        Some(user) => format!("{user}@{}:{port}", hop.host),
        None => format!("{}:{port}", hop.host),
    }
}
