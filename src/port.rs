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

//! Local port allocation
//!
//! Supplies an unused local TCP port when a tunnel request does not pin
//! one. The allocation policy is behind a trait so callers can supply
//! their own (a fixed range, a registry, a mock in tests).

use async_trait::async_trait;
use std::io;
use tokio::net::TcpListener;

/// Source of free local TCP ports.
#[async_trait]
pub trait PortAllocator: Send + Sync {
    /// Return a local port that was unused at allocation time.
    async fn free_port(&self) -> io::Result<u16>;
}

/// Asks the OS for an ephemeral port by binding `127.0.0.1:0` and
/// reading back the assigned port.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPortAllocator;

#[async_trait]
impl PortAllocator for SystemPortAllocator {
    async fn free_port(&self) -> io::Result<u16> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let port = listener.local_addr()?.port();
        // The listener closes on return; the port is only guaranteed
        // unused at allocation time, not when the SSH client binds it.
        Ok(port)
    }
}
