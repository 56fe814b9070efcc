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

//! Tunnel request resolution
//!
//! [`TunnelRequest`] is the partial configuration accepted from callers;
//! [`TunnelRequest::resolve`] validates it, fills defaults, and allocates
//! a local port when none is pinned, producing the fully-concrete
//! [`TunnelConfig`] the rest of the pipeline runs on.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::TunnelError;
use crate::jump::JumpHop;
use crate::port::PortAllocator;

/// Default SSH port when the request does not name one.
pub const DEFAULT_REMOTE_PORT: u16 = 22;

/// Default window for the readiness signal to appear.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(15_000);

/// A partial tunnel request.
///
/// Absent fields take defaults during resolution; caller-supplied
/// fields always win, field by field. Empty strings and zero ports
/// count as absent.
#[derive(Debug, Clone, Default)]
pub struct TunnelRequest {
    /// Username for the SSH connection
    pub user: Option<String>,
    /// Private key passed to the client with `-i`
    pub identity: Option<PathBuf>,
    /// Local port to bind; allocated when unset (or zero)
    pub local_port: Option<u16>,
    /// Host being SSH'd into (required by resolution)
    pub remote_host: Option<String>,
    /// SSH port on the remote host
    pub remote_port: Option<u16>,
    /// Intermediate hops, traversed in order
    pub jump_hosts: Vec<JumpHop>,
    /// Host that receives the forwarded connections; defaults to the
    /// remote host
    pub target_host: Option<String>,
    /// Port on the target host (required by resolution)
    pub target_port: Option<u16>,
    /// Ask the client for compression (`-C`)
    pub compression: Option<bool>,
    /// How long to wait for the readiness signal
    pub timeout: Option<Duration>,
}

impl TunnelRequest {
    /// Minimal request: forward to `target_port` on `remote_host`
    /// itself, with everything else defaulted.
    pub fn to_host(remote_host: impl Into<String>, target_port: u16) -> Self {
        Self {
            remote_host: Some(remote_host.into()),
            target_port: Some(target_port),
            ..Self::default()
        }
    }

    /// Validate the request and fill in defaults.
    ///
    /// Fails with [`TunnelError::MissingRemoteHost`] or
    /// [`TunnelError::MissingTargetPort`] before the allocator is ever
    /// consulted; allocator failure surfaces as
    /// [`TunnelError::PortAllocation`].
    pub async fn resolve(self, allocator: &dyn PortAllocator) -> Result<TunnelConfig, TunnelError> {
        let remote_host = match self.remote_host {
            Some(host) if !host.is_empty() => host,
            _ => return Err(TunnelError::MissingRemoteHost),
        };

        let target_port = match self.target_port {
            Some(port) if port != 0 => port,
            _ => return Err(TunnelError::MissingTargetPort),
        };

        let local_port = match self.local_port {
            Some(port) if port != 0 => port,
            _ => allocator
                .free_port()
                .await
                .map_err(|source| TunnelError::PortAllocation { source })?,
        };

        let target_host = self
            .target_host
            .filter(|host| !host.is_empty())
            .unwrap_or_else(|| remote_host.clone());

        Ok(TunnelConfig {
            user: self.user.filter(|user| !user.is_empty()),
            identity: self.identity,
            local_port,
            remote_host,
            remote_port: self.remote_port.unwrap_or(DEFAULT_REMOTE_PORT),
            jump_hosts: self.jump_hosts,
            target_host,
            target_port,
            compression: self.compression.unwrap_or(false),
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        })
    }
}

/// A fully-resolved tunnel request.
///
/// Every field is concrete: the local port is allocated, the target
/// host and remote port carry their defaults. This is what the argument
/// builder and the supervisor consume, and what an established handle
/// reports back to the caller.
#[derive(Debug, Clone)]
pub struct TunnelConfig {
    pub user: Option<String>,
    pub identity: Option<PathBuf>,
    pub local_port: u16,
    pub remote_host: String,
    pub remote_port: u16,
    pub jump_hosts: Vec<JumpHop>,
    pub target_host: String,
    pub target_port: u16,
    pub compression: bool,
    pub timeout: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::io;

    struct FixedPort(u16);

    #[async_trait]
    impl PortAllocator for FixedPort {
        async fn free_port(&self) -> io::Result<u16> {
            Ok(self.0)
        }
    }

    /// Allocator that fails every call; resolution taking this path is
    /// itself the assertion.
    struct NoPorts;

    #[async_trait]
    impl PortAllocator for NoPorts {
        async fn free_port(&self) -> io::Result<u16> {
            Err(io::Error::from(io::ErrorKind::AddrInUse))
        }
    }

    #[tokio::test]
    async fn test_missing_remote_host_fails_before_allocation() {
        let request = TunnelRequest {
            target_port: Some(80),
            ..Default::default()
        };
        // NoPorts would turn any allocation attempt into PortAllocation.
        let err = request.resolve(&NoPorts).await.unwrap_err();
        assert!(matches!(err, TunnelError::MissingRemoteHost));

        let request = TunnelRequest {
            remote_host: Some(String::new()),
            target_port: Some(80),
            ..Default::default()
        };
        let err = request.resolve(&NoPorts).await.unwrap_err();
        assert!(matches!(err, TunnelError::MissingRemoteHost));
    }

    #[tokio::test]
    async fn test_missing_target_port_fails_before_allocation() {
        let request = TunnelRequest {
            remote_host: Some("bastion".to_string()),
            ..Default::default()
        };
        let err = request.resolve(&NoPorts).await.unwrap_err();
        assert!(matches!(err, TunnelError::MissingTargetPort));

        // Port zero counts as absent.
        let request = TunnelRequest {
            remote_host: Some("bastion".to_string()),
            target_port: Some(0),
            ..Default::default()
        };
        let err = request.resolve(&NoPorts).await.unwrap_err();
        assert!(matches!(err, TunnelError::MissingTargetPort));
    }

    #[tokio::test]
    async fn test_minimal_request_takes_all_defaults() {
        let config = TunnelRequest::to_host("bastion", 80)
            .resolve(&FixedPort(50000))
            .await
            .unwrap();

        assert_eq!(config.remote_host, "bastion");
        assert_eq!(config.remote_port, 22);
        assert_eq!(config.target_host, "bastion");
        assert_eq!(config.target_port, 80);
        assert_eq!(config.local_port, 50000);
        assert_eq!(config.timeout, Duration::from_millis(15_000));
        assert!(!config.compression);
        assert!(config.user.is_none());
        assert!(config.identity.is_none());
        assert!(config.jump_hosts.is_empty());
    }

    #[tokio::test]
    async fn test_pinned_local_port_skips_allocation() {
        let request = TunnelRequest {
            local_port: Some(7777),
            ..TunnelRequest::to_host("bastion", 80)
        };
        let config = request.resolve(&NoPorts).await.unwrap();
        assert_eq!(config.local_port, 7777);
    }

    #[tokio::test]
    async fn test_zero_local_port_allocates() {
        let request = TunnelRequest {
            local_port: Some(0),
            ..TunnelRequest::to_host("bastion", 80)
        };
        let config = request.resolve(&FixedPort(50001)).await.unwrap();
        assert_eq!(config.local_port, 50001);
    }

    #[tokio::test]
    async fn test_allocator_failure_propagates() {
        let err = TunnelRequest::to_host("bastion", 80)
            .resolve(&NoPorts)
            .await
            .unwrap_err();
        assert!(matches!(err, TunnelError::PortAllocation { .. }));
    }

    #[tokio::test]
    async fn test_empty_user_and_target_host_are_normalized() {
        let request = TunnelRequest {
            user: Some(String::new()),
            target_host: Some(String::new()),
            ..TunnelRequest::to_host("bastion", 80)
        };
        let config = request.resolve(&FixedPort(50002)).await.unwrap();
        assert!(config.user.is_none());
        assert_eq!(config.target_host, "bastion");
    }

    #[tokio::test]
    async fn test_explicit_fields_override_defaults() {
        let request = TunnelRequest {
            user: Some("deploy".to_string()),
            remote_host: Some("bastion".to_string()),
            remote_port: Some(2200),
            target_host: Some("db.internal".to_string()),
            target_port: Some(5432),
            compression: Some(true),
            timeout: Some(Duration::from_secs(3)),
            ..Default::default()
        };
        let config = request.resolve(&FixedPort(50003)).await.unwrap();
        assert_eq!(config.user.as_deref(), Some("deploy"));
        assert_eq!(config.remote_port, 2200);
        assert_eq!(config.target_host, "db.internal");
        assert_eq!(config.target_port, 5432);
        assert!(config.compression);
        assert_eq!(config.timeout, Duration::from_secs(3));
    }
}
