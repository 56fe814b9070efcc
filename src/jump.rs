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

//! Jump host specifications
//!
//! Parsing of `[user@]hostname[:port]` endpoints, both for the
//! connection destination and for comma-separated hop chains in
//! OpenSSH `-J` syntax. Bracketed IPv6 literals (`[::1]:2222`) are
//! supported.
//!
//! A parsed hop keeps `user` and `port` optional; how unset fields fall
//! back (to the outer request's user and remote port) is decided where
//! the `ssh` argument vector is built, because the fallbacks depend on
//! the surrounding configuration.

use anyhow::{bail, Context, Result};
use std::fmt;

/// One link in a jump chain, or a bare `[user@]host[:port]` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JumpHop {
    /// Username for this hop; `None` defers to the outer request
    pub user: Option<String>,
    /// Hostname or IP address
    pub host: String,
    /// SSH port; `None` defers to the outer request's remote port
    pub port: Option<u16>,
}

impl JumpHop {
    pub fn new(host: impl Into<String>, user: Option<String>, port: Option<u16>) -> Self {
        Self {
            user,
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for JumpHop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(user) = &self.user {
            write!(f, "{user}@")?;
        }
        write!(f, "{}", self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        Ok(())
    }
}

/// Parse a comma-separated jump chain in OpenSSH `-J` syntax.
///
/// An empty or whitespace-only specification yields an empty chain;
/// a specification consisting only of separators is an error.
///
/// # Examples
/// ```rust
/// use btun::jump::parse_jump_hosts;
///
/// let hops = parse_jump_hosts("bastion.example.com").unwrap();
/// assert_eq!(hops.len(), 1);
/// assert_eq!(hops[0].host, "bastion.example.com");
///
/// let hops = parse_jump_hosts("hop1, bob@hop2:2222").unwrap();
/// assert_eq!(hops.len(), 2);
/// assert_eq!(hops[1].user.as_deref(), Some("bob"));
/// assert_eq!(hops[1].port, Some(2222));
/// ```
pub fn parse_jump_hosts(spec: &str) -> Result<Vec<JumpHop>> {
    if spec.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut hops = Vec::new();
    for part in spec.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let hop = parse_endpoint(part)
            .with_context(|| format!("failed to parse jump host specification: '{part}'"))?;
        hops.push(hop);
    }

    if hops.is_empty() {
        bail!("no valid jump hosts in specification: '{spec}'");
    }

    Ok(hops)
}

/// Parse a single `[user@]hostname[:port]` endpoint.
pub fn parse_endpoint(spec: &str) -> Result<JumpHop> {
    let spec = spec.trim();
    if spec.is_empty() {
        bail!("empty endpoint specification");
    }

    let (user, host_port) = match spec.split_once('@') {
        Some((user, rest)) => {
            if user.is_empty() {
                bail!("empty username in '{spec}'");
            }
            if user.starts_with('-') {
                bail!("username must not begin with '-': '{user}'");
            }
            (Some(user.to_string()), rest)
        }
        None => (None, spec),
    };

    let (host, port) = split_host_port(host_port)
        .with_context(|| format!("invalid host:port specification: '{host_port}'"))?;

    // A leading dash would be taken for an option by the SSH client.
    if host.starts_with('-') {
        bail!("hostname must not begin with '-': '{host}'");
    }

    Ok(JumpHop { user, host, port })
}

/// Split `hostname[:port]`, tolerating bracketed and bare IPv6 forms.
fn split_host_port(input: &str) -> Result<(String, Option<u16>)> {
    if input.is_empty() {
        bail!("empty host specification");
    }

    // [ipv6] or [ipv6]:port
    if let Some(rest) = input.strip_prefix('[') {
        let (addr, tail) = rest
            .split_once(']')
            .context("unclosed bracket in IPv6 address")?;
        if addr.is_empty() {
            bail!("empty IPv6 address in brackets");
        }
        if tail.is_empty() {
            return Ok((addr.to_string(), None));
        }
        let port_str = tail
            .strip_prefix(':')
            .with_context(|| format!("unexpected characters after IPv6 address: '{tail}'"))?;
        return Ok((addr.to_string(), Some(parse_port(port_str)?)));
    }

    // hostname[:port]; the last colon is the candidate separator.
    match input.rsplit_once(':') {
        Some((host, port_str)) => {
            if host.is_empty() {
                bail!("empty hostname");
            }
            // More than one colon means a bare IPv6 literal; ports on
            // IPv6 addresses require the bracketed form.
            if host.contains(':') {
                return Ok((input.to_string(), None));
            }
            if port_str.is_empty() {
                bail!("empty port specification");
            }
            if port_str.chars().all(|c| c.is_ascii_digit()) {
                Ok((host.to_string(), Some(parse_port(port_str)?)))
            } else {
                // Not a port suffix; the whole input is a hostname.
                Ok((input.to_string(), None))
            }
        }
        None => Ok((input.to_string(), None)),
    }
}

fn parse_port(port_str: &str) -> Result<u16> {
    let port = port_str
        .parse::<u16>()
        .with_context(|| format!("invalid port number: '{port_str}'"))?;
    if port == 0 {
        bail!("port number cannot be zero");
    }
    Ok(port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_endpoint_hostname_only() {
        let hop = parse_endpoint("example.com").unwrap();
        assert_eq!(hop.host, "example.com");
        assert_eq!(hop.user, None);
        assert_eq!(hop.port, None);
    }

    #[test]
    fn test_parse_endpoint_with_user() {
        let hop = parse_endpoint("admin@example.com").unwrap();
        assert_eq!(hop.host, "example.com");
        assert_eq!(hop.user, Some("admin".to_string()));
        assert_eq!(hop.port, None);
    }

    #[test]
    fn test_parse_endpoint_with_port() {
        let hop = parse_endpoint("example.com:2222").unwrap();
        assert_eq!(hop.host, "example.com");
        assert_eq!(hop.user, None);
        assert_eq!(hop.port, Some(2222));
    }

    #[test]
    fn test_parse_endpoint_with_user_and_port() {
        let hop = parse_endpoint("admin@example.com:2222").unwrap();
        assert_eq!(hop.host, "example.com");
        assert_eq!(hop.user, Some("admin".to_string()));
        assert_eq!(hop.port, Some(2222));
    }

    #[test]
    fn test_parse_endpoint_ipv6() {
        let hop = parse_endpoint("[::1]").unwrap();
        assert_eq!(hop.host, "::1");
        assert_eq!(hop.port, None);

        let hop = parse_endpoint("[::1]:2222").unwrap();
        assert_eq!(hop.host, "::1");
        assert_eq!(hop.port, Some(2222));

        let hop = parse_endpoint("admin@[2001:db8::2]:2222").unwrap();
        assert_eq!(hop.host, "2001:db8::2");
        assert_eq!(hop.user, Some("admin".to_string()));
        assert_eq!(hop.port, Some(2222));
    }

    #[test]
    fn test_parse_endpoint_bare_ipv6_has_no_port() {
        // Without brackets a trailing group of hex digits is not taken
        // for a port.
        let hop = parse_endpoint("2001:db8::1").unwrap();
        assert_eq!(hop.host, "2001:db8::1");
        assert_eq!(hop.port, None);
    }

    #[test]
    fn test_parse_jump_hosts_multiple() {
        let hops = parse_jump_hosts("jump1@host1,user@host2:2222,host3").unwrap();
        assert_eq!(hops.len(), 3);

        assert_eq!(hops[0].host, "host1");
        assert_eq!(hops[0].user, Some("jump1".to_string()));
        assert_eq!(hops[0].port, None);

        assert_eq!(hops[1].host, "host2");
        assert_eq!(hops[1].user, Some("user".to_string()));
        assert_eq!(hops[1].port, Some(2222));

        assert_eq!(hops[2].host, "host3");
        assert_eq!(hops[2].user, None);
        assert_eq!(hops[2].port, None);
    }

    #[test]
    fn test_parse_jump_hosts_whitespace() {
        let hops = parse_jump_hosts(" host1 , user@host2:2222 , host3 ").unwrap();
        assert_eq!(hops.len(), 3);
        assert_eq!(hops[0].host, "host1");
        assert_eq!(hops[1].host, "host2");
        assert_eq!(hops[2].host, "host3");
    }

    #[test]
    fn test_parse_jump_hosts_empty_spec() {
        assert!(parse_jump_hosts("").unwrap().is_empty());
        assert!(parse_jump_hosts("   ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_jump_hosts_only_separators() {
        assert!(parse_jump_hosts(",,").is_err());
    }

    #[test]
    fn test_parse_endpoint_errors() {
        assert!(parse_endpoint("").is_err());
        assert!(parse_endpoint("@host").is_err());
        assert!(parse_endpoint("user@").is_err());
        assert!(parse_endpoint("host:").is_err());
        assert!(parse_endpoint("host:0").is_err());
        assert!(parse_endpoint("host:99999").is_err());
        assert!(parse_endpoint("[::1").is_err());
        assert!(parse_endpoint("[]").is_err());
        assert!(parse_endpoint("[::1]x").is_err());
    }

    #[test]
    fn test_parse_endpoint_rejects_leading_dash() {
        assert!(parse_endpoint("-oProxyCommand=evil").is_err());
        assert!(parse_endpoint("-badflag@host").is_err());
    }

    #[test]
    fn test_jump_hop_display() {
        let hop = JumpHop::new("example.com", None, None);
        assert_eq!(format!("{hop}"), "example.com");

        let hop = JumpHop::new("example.com", Some("user".to_string()), None);
        assert_eq!(format!("{hop}"), "user@example.com");

        let hop = JumpHop::new("example.com", None, Some(2222));
        assert_eq!(format!("{hop}"), "example.com:2222");

        let hop = JumpHop::new("example.com", Some("user".to_string()), Some(2222));
        assert_eq!(format!("{hop}"), "user@example.com:2222");
    }
}
