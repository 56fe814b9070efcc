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

//! Error types for tunnel establishment

use thiserror::Error;

/// Errors that can occur while resolving a tunnel request and bringing
/// the forward up.
#[derive(Debug, Error)]
pub enum TunnelError {
    /// The request carried no remote host (or an empty one)
    #[error("missing remote host")]
    MissingRemoteHost,

    /// The request carried no target port
    #[error("missing target port")]
    MissingTargetPort,

    /// The local-port allocator could not supply a free port
    #[error("failed to allocate a free local port: {source}")]
    PortAllocation {
        #[source]
        source: std::io::Error,
    },

    /// The SSH client binary could not be started at all
    #[error("failed to spawn SSH client '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// No readiness signal was observed before the timeout elapsed.
    ///
    /// This collapses every not-ready-in-time outcome (authentication
    /// failure, unreachable host, dead jump hop, or a genuinely slow
    /// connection) into a single kind; the client's diagnostics are not
    /// interpreted beyond the readiness signal.
    #[error("failed to establish SSH connection within {timeout_ms} ms")]
    ConnectionTimeout { timeout_ms: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            TunnelError::MissingRemoteHost.to_string(),
            "missing remote host"
        );
        assert_eq!(
            TunnelError::MissingTargetPort.to_string(),
            "missing target port"
        );

        let err = TunnelError::ConnectionTimeout { timeout_ms: 15000 };
        assert_eq!(
            err.to_string(),
            "failed to establish SSH connection within 15000 ms"
        );
    }

    #[test]
    fn test_spawn_error_preserves_source() {
        let err = TunnelError::Spawn {
            program: "ssh".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().starts_with("failed to spawn SSH client 'ssh'"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
