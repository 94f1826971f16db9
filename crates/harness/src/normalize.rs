// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Output normalization for machine-independent comparisons.
//!
//! stdout only loses its terminal escape sequences. stderr additionally has
//! paths, host addresses and ports replaced with fixed placeholders so the
//! same run produces the same text on every machine.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::sync::LazyLock;

use regex::{Captures, Regex};

pub const CWD_PLACEHOLDER: &str = "<cwd>";
pub const IPV4_PLACEHOLDER: &str = "<network-ip-v4>";
pub const IPV6_PLACEHOLDER: &str = "<network-ip-v6>";
pub const PORT_PLACEHOLDER: &str = ":<port>/";

/// Line inserted on hosts without IPv6 so output has the same shape everywhere.
pub const IPV6_NETWORK_LINE: &str =
    "<i> [webpack-dev-server] On Your Network (IPv6): http://[<network-ip-v6>]:<port>/";

/// Terminal color and control sequences (CSI and OSC forms).
static ANSI_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(
        r"[\x1b\x{9b}][\[\]()#;?]*(?:(?:(?:(?:;[-a-zA-Z\d/#&.:=?%@~_]+)*|[a-zA-Z\d]+(?:;[-a-zA-Z\d/#&.:=?%@~_]*)*)?\x07)|(?:(?:\d{1,4}(?:;\d{0,4})*)?[\dA-PR-TZcf-ntqry=><~]))",
    )
    .expect("ANSI regex pattern is invalid")
});

static PORT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r":[0-9]+/").expect("port regex pattern is invalid")
});

static IPV4_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"On Your Network \(IPv4\)").expect("IPv4 line regex pattern is invalid")
});

static IPV6_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"On Your Network \(IPv6\)").expect("IPv6 line regex pattern is invalid")
});

/// The host's outward-facing addresses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetworkAddrs {
    pub v4: Option<Ipv4Addr>,
    pub v6: Option<Ipv6Addr>,
}

impl NetworkAddrs {
    /// Addresses the OS would route public traffic from. Connecting a UDP
    /// socket only selects a route; nothing is sent.
    pub fn detect() -> Self {
        Self {
            v4: outbound_ip(SocketAddr::from((Ipv4Addr::new(8, 8, 8, 8), 53))).and_then(|ip| {
                match ip {
                    IpAddr::V4(ip) if !ip.is_loopback() && !ip.is_unspecified() => Some(ip),
                    _ => None,
                }
            }),
            v6: outbound_ip(SocketAddr::from((
                Ipv6Addr::new(0x2001, 0x4860, 0x4860, 0, 0, 0, 0, 0x8888),
                53,
            )))
            .and_then(|ip| match ip {
                IpAddr::V6(ip) if !ip.is_loopback() && !ip.is_unspecified() && !is_link_local(&ip) => {
                    Some(ip)
                }
                _ => None,
            }),
        }
    }
}

fn outbound_ip(target: SocketAddr) -> Option<IpAddr> {
    let bind: SocketAddr = match target {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    };
    let socket = UdpSocket::bind(bind).ok()?;
    socket.connect(target).ok()?;
    socket.local_addr().ok().map(|addr| addr.ip())
}

fn is_link_local(ip: &Ipv6Addr) -> bool {
    (ip.segments()[0] & 0xffc0) == 0xfe80
}

/// Host facts substituted out of stderr.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizeContext {
    pub cwd: String,
    pub network: NetworkAddrs,
}

impl NormalizeContext {
    pub fn new(cwd: impl Into<String>, network: NetworkAddrs) -> Self {
        Self {
            cwd: cwd.into(),
            network,
        }
    }

    /// Current directory and detected addresses of this host.
    pub fn detect() -> Self {
        let cwd = std::env::current_dir()
            .map(|dir| dir.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(cwd, NetworkAddrs::detect())
    }
}

/// Strip terminal color/control sequences.
pub fn normalize_stdout(stdout: &str) -> String {
    if stdout.is_empty() {
        return String::new();
    }
    ANSI_REGEX.replace_all(stdout, "").into_owned()
}

/// Replace host-specific details in stderr with placeholders.
pub fn normalize_stderr(stderr: &str, context: &NormalizeContext) -> String {
    if stderr.is_empty() {
        return String::new();
    }

    let mut normalized = stderr.replace('\\', "/");

    let cwd = context.cwd.replace('\\', "/");
    if !cwd.is_empty() {
        normalized = normalized.replace(&cwd, CWD_PLACEHOLDER);
    }

    if let Some(v4) = context.network.v4 {
        normalized = replace_ipv4(&normalized, v4);
    }

    if let Some(v6) = context.network.v6 {
        normalized = normalized.replace(&v6.to_string(), IPV6_PLACEHOLDER);
    }

    normalized = PORT_REGEX
        .replace_all(&normalized, PORT_PLACEHOLDER)
        .into_owned();

    if context.network.v6.is_none() {
        normalized = insert_ipv6_line(&normalized);
    }

    normalized
}

/// Replace `addr` where it stands alone, so `10.0.0.5` leaves `10.0.0.50`
/// and `110.0.0.5` untouched.
fn replace_ipv4(text: &str, addr: Ipv4Addr) -> String {
    let Ok(regex) = Regex::new(&format!(r"(^|[^0-9.]){}", regex::escape(&addr.to_string()))) else {
        return text.to_string();
    };
    regex
        .replace_all(text, |caps: &Captures<'_>| {
            let end = caps.get(0).map_or(text.len(), |m| m.end());
            let continues = match &text.as_bytes()[end..] {
                [next, ..] if next.is_ascii_digit() => true,
                [b'.', next, ..] if next.is_ascii_digit() => true,
                _ => false,
            };
            if continues {
                caps[0].to_string()
            } else {
                format!("{}{IPV4_PLACEHOLDER}", &caps[1])
            }
        })
        .into_owned()
}

/// Add [`IPV6_NETWORK_LINE`] after the IPv4 network line, unless an IPv6
/// line is already there.
fn insert_ipv6_line(text: &str) -> String {
    if IPV6_LINE_REGEX.is_match(text) {
        return text.to_string();
    }

    let mut lines: Vec<&str> = text.split('\n').collect();
    if let Some(index) = lines.iter().position(|line| IPV4_LINE_REGEX.is_match(line)) {
        lines.insert(index + 1, IPV6_NETWORK_LINE);
    }
    lines.join("\n")
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;
