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

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "btun",
    version,
    before_help = "",
    about = "Backend tunnel - SSH local port forwarding through jump host chains",
    long_about = "btun opens a local TCP port and forwards it to a destination reachable from a remote\nSSH host, optionally routing the connection through a chain of jump hosts (ProxyJump).\nIt drives the system OpenSSH client, watches its diagnostics until the forwarding is\nconfirmed listening, and keeps the tunnel up until interrupted.\nTunnels can be described ad hoc on the command line or as named profiles in a YAML\nconfiguration file; command-line values always override profile and default values.",
    after_help = "EXAMPLES:\n  Forward to a port on the SSH host:  btun -t 5432 db.example.com\n  Explicit local port:                btun -L 15432 -t 5432 db.example.com\n  Reach an internal host behind it:   btun -t 10.0.0.7:6379 edge.example.com\n  Route through jump hosts:           btun -J bastion1,bob@bastion2:2222 -t 5432 db.internal\n  Use a configured profile:           btun -c staging-db\n  Override a profile's target:        btun -c staging-db -t 5433\n\nDeveloped and maintained as part of the Backend.AI project.\nFor more examples and documentation, visit: https://github.com/lablup/btun"
)]
pub struct Cli {
    #[arg(
        value_name = "DESTINATION",
        help = "SSH host in [user@]hostname[:port] format\nExamples: 'db.example.com' or 'alice@edge.example.com:2222'\nPort defaults to 22; user and port from the selected profile apply if not given"
    )]
    pub destination: Option<String>,

    #[arg(short = 'c', long, help = "Tunnel profile name from configuration file")]
    pub profile: Option<String>,

    #[arg(
        long,
        default_value = "~/.config/btun/config.yaml",
        help = "Configuration file path [default: ~/.config/btun/config.yaml]\nConfig loading priority:\n  1. This flag's value (when changed from the default)\n  2. Current directory (./btun.yaml)\n  3. User config (~/.config/btun/config.yaml)"
    )]
    pub config: PathBuf,

    #[arg(
        short = 't',
        long,
        value_name = "[HOST:]PORT",
        help = "Forward target as seen from the SSH host\nA bare port forwards to the SSH host itself; 'host:port' reaches another\nmachine on its network (e.g. '5432' or 'db.internal:5432')"
    )]
    pub target: Option<String>,

    #[arg(
        short = 'L',
        long,
        value_name = "PORT",
        help = "Local port to bind on 127.0.0.1\nA free port is allocated automatically if not specified"
    )]
    pub local_port: Option<u16>,

    #[arg(
        short = 'J',
        long,
        value_name = "SPEC",
        help = "Comma-separated jump hosts in [user@]hostname[:port] format (ProxyJump)\nExample: 'bastion1,bob@bastion2:2222'\nOverrides the profile's jump hosts; an empty value disables them"
    )]
    pub jump: Option<String>,

    #[arg(
        short = 'i',
        long,
        help = "SSH private key file path\nPassed through to the SSH client; supports ~ and environment variables"
    )]
    pub identity: Option<PathBuf>,

    #[arg(short = 'C', long, help = "Enable SSH compression")]
    pub compression: bool,

    #[arg(
        long,
        value_name = "SECONDS",
        help = "Seconds to wait for the forwarding to come up [default: 15]"
    )]
    pub timeout: Option<u64>,

    #[arg(
        long,
        default_value = "ssh",
        help = "SSH client executable to drive [default: ssh]\nUseful for pointing at a specific OpenSSH build"
    )]
    pub ssh_program: PathBuf,

    #[arg(
        short = 'v',
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,
}
