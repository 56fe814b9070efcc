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

//! Subprocess supervision and readiness detection
//!
//! Spawns the SSH client, then races two futures: a line-oriented
//! watcher over the client's stderr and the establishment timeout.
//! `tokio::select!` is the single-resolution primitive — exactly one
//! side wins, so success and failure cannot both fire.
//!
//! The client's locale is pinned with `LANG=C` in the child's own
//! environment block, never the host process's, so the diagnostic text
//! the watcher matches on is stable and concurrent invocations cannot
//! interfere with each other.

use std::path::Path;
use std::process::Stdio;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStderr, Command};
use tracing::{debug, trace, warn};

use super::args::build_ssh_args;
use super::handle::TunnelHandle;
use super::request::TunnelConfig;
use super::TunnelState;
use crate::error::TunnelError;

/// Predicate over one line of the client's diagnostic output.
///
/// The readiness signal is plain text and varies with client version,
/// so the decision is a seam: swap in a stricter classifier when the
/// default substring match is not enough. Closures of the right shape
/// implement this directly.
pub trait LineClassifier: Send + Sync {
    /// Does this line announce that the local forward socket is bound?
    fn is_ready(&self, line: &str) -> bool;
}

impl<F> LineClassifier for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_ready(&self, line: &str) -> bool {
        self(line)
    }
}

static READY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new("(?i)local forwarding listening").expect("hard-coded pattern compiles")
});

/// Default classifier: case-insensitive substring match for the OpenSSH
/// announcement that the forward socket is listening. A substring, not
/// a full-line comparison — the client wraps the message in varying
/// prefixes and suffixes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadySignal;

impl LineClassifier for ReadySignal {
    fn is_ready(&self, line: &str) -> bool {
        READY_PATTERN.is_match(line)
    }
}

/// Spawn the client and wait for readiness or the timeout, whichever
/// comes first.
pub(super) async fn supervise(
    config: TunnelConfig,
    ssh_program: &Path,
    classifier: &dyn LineClassifier,
) -> Result<TunnelHandle, TunnelError> {
    let args = build_ssh_args(&config);
    debug!(program = %ssh_program.display(), ?args, "spawning SSH client");

    let mut child = Command::new(ssh_program)
        .args(&args)
        .env("LANG", "C")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| TunnelError::Spawn {
            program: ssh_program.display().to_string(),
            source,
        })?;

    let Some(stderr) = child.stderr.take() else {
        // Requested as piped above; a missing handle leaves nothing to
        // watch, so the child is unusable.
        let _ = child.start_kill();
        return Err(TunnelError::Spawn {
            program: ssh_program.display().to_string(),
            source: std::io::Error::other("stderr pipe was not captured"),
        });
    };

    debug!(
        pid = ?child.id(),
        state = ?TunnelState::Pending,
        "awaiting readiness signal"
    );

    let mut lines = BufReader::new(stderr).lines();
    let established = tokio::select! {
        _ = watch_for_readiness(&mut lines, classifier) => true,
        _ = tokio::time::sleep(config.timeout) => false,
    };

    if !established {
        debug!(
            state = ?TunnelState::Failed,
            timeout_ms = config.timeout.as_millis() as u64,
            "no readiness signal before the timeout"
        );
        kill_and_reap(&mut child).await;
        return Err(TunnelError::ConnectionTimeout {
            timeout_ms: config.timeout.as_millis() as u64,
        });
    }

    debug!(
        state = ?TunnelState::Established,
        local_port = config.local_port,
        "local forwarding ready"
    );

    // The client keeps writing diagnostics for every forwarded
    // connection; an undrained pipe would eventually stall it. The task
    // ends on its own when the child exits and the stream hits EOF.
    tokio::spawn(async move {
        while let Ok(Some(_)) = lines.next_line().await {}
        trace!("diagnostic stream closed");
    });

    Ok(TunnelHandle::new(config, child))
}

/// Resolve on the first line the classifier accepts. EOF (the client
/// exited on its own) and read errors do not resolve: those outcomes
/// are left to the timeout.
async fn watch_for_readiness(
    lines: &mut Lines<BufReader<ChildStderr>>,
    classifier: &dyn LineClassifier,
) {
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if classifier.is_ready(&line) => return,
            Ok(Some(_)) => continue,
            Ok(None) | Err(_) => std::future::pending::<()>().await,
        }
    }
}

pub(super) async fn kill_and_reap(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        debug!("kill signal not delivered: {e}");
    }
    match child.wait().await {
        Ok(status) => debug!(%status, "SSH client terminated"),
        Err(e) => warn!("failed to reap SSH client: {e}"),
    }
}
