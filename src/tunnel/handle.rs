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

//! Handle to an established tunnel

use tokio::process::Child;

use super::process::kill_and_reap;
use super::request::TunnelConfig;
use super::TunnelState;

/// A live, established tunnel.
///
/// Holds the resolved configuration and the owned SSH client process.
/// [`close`](TunnelHandle::close) tears the forward down; dropping the
/// handle does too (the child is spawned kill-on-drop), so an abandoned
/// handle cannot leak a client process.
#[derive(Debug)]
pub struct TunnelHandle {
    config: TunnelConfig,
    child: Child,
    state: TunnelState,
}

impl TunnelHandle {
    pub(super) fn new(config: TunnelConfig, child: Child) -> Self {
        Self {
            config,
            child,
            state: TunnelState::Established,
        }
    }

    /// The fully resolved configuration, concrete local port included.
    pub fn config(&self) -> &TunnelConfig {
        &self.config
    }

    /// The local port the forward listens on.
    pub fn local_port(&self) -> u16 {
        self.config.local_port
    }

    pub fn state(&self) -> TunnelState {
        self.state
    }

    /// OS pid of the SSH client while it is running.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Kill the SSH client and reap it.
    ///
    /// Safe to call repeatedly: a later call re-sends the kill signal
    /// to an already-dead process and ignores the refusal.
    pub async fn close(&mut self) {
        kill_and_reap(&mut self.child).await;
        self.state = TunnelState::Closed;
    }
}
