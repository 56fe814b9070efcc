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

//! Tunnel lifecycle
//!
//! Establishes a local TCP port forward to a remote target through one
//! or more SSH hops by driving the system `ssh` binary as a subprocess
//! and watching its verbose diagnostics for the forwarding
//! announcement.
//!
//! # Architecture
//!
//! - **request**: partial [`TunnelRequest`] → validated, fully-concrete
//!   [`TunnelConfig`], allocating a local port when none is pinned
//! - **args**: [`TunnelConfig`] → the ordered `ssh` argument vector,
//!   jump chain included
//! - **process**: subprocess supervision; the readiness watcher races
//!   the timeout with exactly-once resolution
//! - **handle**: the [`TunnelHandle`] returned on success
//!
//! One invocation owns one subprocess and one timer; nothing is shared,
//! so callers may establish tunnels concurrently, each with its own
//! handle.
//!
//! # Example
//!
//! ```rust,no_run
//! use btun::tunnel::{self, TunnelRequest};
//!
//! # async fn run() -> Result<(), btun::TunnelError> {
//! let mut handle =
//!     tunnel::establish(TunnelRequest::to_host("bastion.example.com", 5432)).await?;
//! println!("forwarding 127.0.0.1:{}", handle.local_port());
//! handle.close().await;
//! # Ok(())
//! # }
//! ```

mod args;
mod handle;
mod process;
mod request;

pub use args::build_ssh_args;
pub use handle::TunnelHandle;
pub use process::{LineClassifier, ReadySignal};
pub use request::{TunnelConfig, TunnelRequest, DEFAULT_REMOTE_PORT, DEFAULT_TIMEOUT};

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::TunnelError;
use crate::port::{PortAllocator, SystemPortAllocator};

/// Readiness state of a tunnel operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunnelState {
    /// Client spawned, readiness signal not yet observed
    Pending,
    /// Forward socket announced as listening
    Established,
    /// Timed out before the signal appeared
    Failed,
    /// Torn down by the caller
    Closed,
}

/// Establishes tunnels, bundling the injectable collaborators: the SSH
/// client binary, the readiness classifier, and the port allocator.
///
/// The defaults drive `ssh` from `PATH` with the stock OpenSSH
/// readiness pattern and OS-assigned local ports; each seam exists so
/// deployments (and tests) can substitute their own.
#[derive(Clone)]
pub struct TunnelLauncher {
    ssh_program: PathBuf,
    classifier: Arc<dyn LineClassifier>,
    allocator: Arc<dyn PortAllocator>,
}

impl Default for TunnelLauncher {
    fn default() -> Self {
        Self {
            ssh_program: PathBuf::from("ssh"),
            classifier: Arc::new(ReadySignal),
            allocator: Arc::new(SystemPortAllocator),
        }
    }
}

impl TunnelLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a client binary other than `ssh` on `PATH`.
    pub fn with_ssh_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.ssh_program = program.into();
        self
    }

    /// Replace the readiness classifier.
    pub fn with_classifier(mut self, classifier: impl LineClassifier + 'static) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    /// Replace the local-port allocator.
    pub fn with_allocator(mut self, allocator: impl PortAllocator + 'static) -> Self {
        self.allocator = Arc::new(allocator);
        self
    }

    /// Resolve the request, spawn the client, and wait for readiness or
    /// the timeout, whichever comes first.
    pub async fn establish(&self, request: TunnelRequest) -> Result<TunnelHandle, TunnelError> {
        let config = request.resolve(self.allocator.as_ref()).await?;
        process::supervise(config, &self.ssh_program, self.classifier.as_ref()).await
    }
}

impl fmt::Debug for TunnelLauncher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TunnelLauncher")
            .field("ssh_program", &self.ssh_program)
            .finish_non_exhaustive()
    }
}

/// Establish a tunnel with the default launcher.
pub async fn establish(request: TunnelRequest) -> Result<TunnelHandle, TunnelError> {
    TunnelLauncher::default().establish(request).await
}
