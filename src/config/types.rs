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

//! Configuration type definitions.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::jump::{self, JumpHop};

/// Main configuration structure.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub tunnels: HashMap<String, TunnelProfile>,
}

/// Global default settings applied to every tunnel profile.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Defaults {
    pub user: Option<String>,
    pub identity: Option<String>,
    /// Readiness timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    pub compression: Option<bool>,
}

/// A named tunnel profile from the `tunnels:` section.
///
/// Every field is optional so a profile can be partial; anything left
/// unset falls back to the command line, then to [`Defaults`].
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct TunnelProfile {
    /// Host the SSH session terminates on.
    pub host: Option<String>,
    /// SSH port on that host.
    pub port: Option<u16>,
    pub user: Option<String>,
    pub identity: Option<String>,
    /// Local port to bind; allocated automatically when unset.
    pub local_port: Option<u16>,
    /// Forward destination host as seen from the remote side.
    pub target_host: Option<String>,
    /// Forward destination port.
    pub target_port: Option<u16>,
    #[serde(default)]
    pub jump_hosts: Vec<JumpHostConfig>,
    pub compression: Option<bool>,
    pub timeout_ms: Option<u64>,
}

/// Jump host configuration format.
///
/// Supports two formats:
/// - String format: `"[user@]hostname[:port]"`
/// - Structured format with explicit fields
///
/// Uses `#[serde(untagged)]` to allow seamless deserialization of both.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum JumpHostConfig {
    /// Structured format.
    /// Must be listed first for serde to try matching object format before string
    Detailed {
        host: String,
        #[serde(default)]
        user: Option<String>,
        #[serde(default)]
        port: Option<u16>,
    },
    /// String format: "[user@]hostname[:port]"
    Simple(String),
}

impl JumpHostConfig {
    /// Convert a configuration entry into a resolved [`JumpHop`].
    pub fn to_hop(&self) -> Result<JumpHop> {
        match self {
            JumpHostConfig::Detailed { host, user, port } => {
                Ok(JumpHop::new(host.clone(), user.clone(), *port))
            }
            JumpHostConfig::Simple(spec) => jump::parse_endpoint(spec)
                .with_context(|| format!("invalid jump host entry '{spec}'")),
        }
    }
}
