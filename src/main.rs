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

use anyhow::{Context, Result};
use clap::Parser;

use btun::{
    cli::Cli,
    config::{self, expand_tilde, Config},
    tunnel::TunnelLauncher,
    utils::init_logging,
};

/// Show concise usage message (like SSH)
fn show_usage() {
    println!("usage: btun [-C] [-c profile] [-i identity_file] [-J destination[,destination...]]");
    println!("            [-L port] [-t [host:]port] [--config path] [--ssh-program path]");
    println!("            [--timeout seconds] [destination]");
    println!();
    println!("For more information, try 'btun --help'");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Check if no arguments were provided
    let args: Vec<String> = std::env::args().collect();
    if args.len() == 1 {
        // Show concise usage when no arguments provided (like SSH)
        show_usage();
        std::process::exit(0);
    }

    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // If user explicitly specified --config, ensure the file exists
    let has_explicit_config = args
        .iter()
        .any(|arg| arg == "--config" || arg.starts_with("--config="));
    if has_explicit_config {
        let expanded_path = expand_tilde(&cli.config);
        if !expanded_path.exists() {
            anyhow::bail!("Config file not found: {:?}", expanded_path);
        }
    }

    // Load configuration with priority
    let loaded = Config::load_with_priority(&cli.config).await?;

    // Merge CLI arguments over profile and default values
    let request = config::resolve_request(&cli, &loaded)?;

    if request.remote_host.as_deref().unwrap_or("").is_empty() {
        anyhow::bail!(
            "No destination specified. Please use one of the following options:\n  <destination>  SSH host in [user@]hostname[:port] format\n  -c <profile>   Use a tunnel profile from your configuration file"
        );
    }
    if request.target_port.unwrap_or(0) == 0 {
        anyhow::bail!(
            "No forward target specified. Please use one of the following options:\n  -t [host:]port  Forward target as seen from the SSH host\n  -c <profile>    Use a tunnel profile that sets target_port"
        );
    }

    // Display jump host information if present
    if !request.jump_hosts.is_empty() {
        if request.jump_hosts.len() == 1 {
            tracing::info!("Using jump host: {}", request.jump_hosts[0]);
        } else {
            tracing::info!(
                "Using jump host chain: {}",
                request
                    .jump_hosts
                    .iter()
                    .map(|j| j.to_string())
                    .collect::<Vec<_>>()
                    .join(" -> ")
            );
        }
    }

    let launcher = TunnelLauncher::new().with_ssh_program(&cli.ssh_program);
    let mut handle = launcher.establish(request).await?;

    {
        let tunnel = handle.config();
        tracing::info!(
            "Tunnel established: 127.0.0.1:{} -> {}:{} via {}",
            tunnel.local_port,
            tunnel.target_host,
            tunnel.target_port,
            tunnel.remote_host
        );
    }

    // The forwarding address is the only stdout output, so scripts can
    // capture it directly.
    println!("127.0.0.1:{}", handle.local_port());
    eprintln!("Press Ctrl-C to close the tunnel.");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for interrupt signal")?;

    tracing::info!("Interrupt received, closing tunnel");
    handle.close().await;

    Ok(())
}
