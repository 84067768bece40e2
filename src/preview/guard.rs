use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use url::Url;

use super::{FetchFailure, PreviewError};

/// IPv4 blocks that never name a public web server, as `(network, prefix)`.
const NON_PUBLIC_V4: &[([u8; 4], u32)] = &[
    ([0, 0, 0, 0], 8),       // "this" network
    ([10, 0, 0, 0], 8),      // private
    ([100, 64, 0, 0], 10),   // carrier-grade NAT
    ([127, 0, 0, 0], 8),     // loopback
    ([169, 254, 0, 0], 16),  // link-local
    ([172, 16, 0, 0], 12),   // private
    ([192, 0, 0, 0], 24),    // IETF protocol assignments
    ([192, 0, 2, 0], 24),    // documentation
    ([192, 168, 0, 0], 16),  // private
    ([198, 18, 0, 0], 15),   // benchmarking
    ([198, 51, 100, 0], 24), // documentation
    ([203, 0, 113, 0], 24),  // documentation
    ([224, 0, 0, 0], 4),     // multicast
    ([240, 0, 0, 0], 4),     // reserved, includes broadcast
];

/// Returns `true` if `ip` is anything other than a globally routable unicast
/// address. IPv6 forms that embed an IPv4 address (mapped, compatible,
/// NAT64) are judged by the embedded address.
pub fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_private_v4(v4),
        IpAddr::V6(v6) => is_private_v6(v6),
    }
}

fn is_private_v4(ip: Ipv4Addr) -> bool {
    let addr = u32::from(ip);
    NON_PUBLIC_V4.iter().any(|&(network, prefix)| {
        let mask = u32::MAX << (32 - prefix);
        addr & mask == u32::from(Ipv4Addr::from(network)) & mask
    })
}

fn is_private_v6(ip: Ipv6Addr) -> bool {
    if ip.is_loopback() || ip.is_unspecified() {
        return true;
    }
    if let Some(v4) = embedded_v4(ip) {
        return is_private_v4(v4);
    }

    let first = ip.segments()[0];
    first & 0xff00 == 0xff00            // multicast
        || first & 0xfe00 == 0xfc00     // unique local
        || first & 0xffc0 == 0xfe80     // link-local
        || first & 0xffc0 == 0xfec0     // site-local
        || (first == 0x2001 && ip.segments()[1] == 0x0db8) // documentation
}

/// IPv4 address carried inside an IPv4-mapped (`::ffff:a.b.c.d`),
/// IPv4-compatible (`::a.b.c.d`) or NAT64 (`64:ff9b::a.b.c.d`) address.
fn embedded_v4(ip: Ipv6Addr) -> Option<Ipv4Addr> {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return Some(v4);
    }
    let s = ip.segments();
    let tail = Ipv4Addr::new(
        (s[6] >> 8) as u8,
        s[6] as u8,
        (s[7] >> 8) as u8,
        s[7] as u8,
    );
    match s[..6] {
        [0, 0, 0, 0, 0, 0] => Some(tail),
        [0x64, 0xff9b, 0, 0, 0, 0] => Some(tail),
        _ => None,
    }
}

/// Resolve the URL's host and refuse it if any address is private.
pub(super) async fn ensure_public_host(url: &Url) -> Result<(), PreviewError> {
    let host = url.host_str().ok_or(PreviewError::InvalidUrl)?;
    let port = url.port_or_known_default().unwrap_or(80);

    let addrs = tokio::net::lookup_host(format!("{host}:{port}"))
        .await
        .map_err(|e| {
            tracing::warn!(error = ?e, host = %host, "Could not resolve link preview host");
            FetchFailure::Resolve(e)
        })?;

    for addr in addrs {
        if is_private_ip(addr.ip()) {
            tracing::warn!(host = %host, ip = %addr.ip(), "Refusing link preview for private address");
            return Err(PreviewError::BlockedHost);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_loopback_ipv4() {
        assert!(is_private_ip("127.0.0.1".parse().unwrap()));
        assert!(is_private_ip("127.255.255.255".parse().unwrap()));
    }

    #[test]
    fn blocks_private_ranges() {
        assert!(is_private_ip("10.0.0.1".parse().unwrap()));
        assert!(is_private_ip("172.16.0.1".parse().unwrap()));
        assert!(is_private_ip("172.31.255.255".parse().unwrap()));
        assert!(is_private_ip("192.168.1.1".parse().unwrap()));
    }

    #[test]
    fn blocks_link_local() {
        assert!(is_private_ip("169.254.169.254".parse().unwrap()));
        assert!(is_private_ip("fe80::1".parse().unwrap()));
    }

    #[test]
    fn blocks_ipv6_loopback_and_unique_local() {
        assert!(is_private_ip("::1".parse().unwrap()));
        assert!(is_private_ip("fd00::1".parse().unwrap()));
    }

    #[test]
    fn blocks_ipv4_mapped_loopback() {
        assert!(is_private_ip("::ffff:127.0.0.1".parse().unwrap()));
    }

    #[test]
    fn blocks_cgnat_and_multicast() {
        assert!(is_private_ip("100.64.0.1".parse().unwrap()));
        assert!(is_private_ip("100.127.255.254".parse().unwrap()));
        assert!(!is_private_ip("100.128.0.1".parse().unwrap()));
        assert!(is_private_ip("224.0.0.251".parse().unwrap()));
        assert!(is_private_ip("239.255.255.250".parse().unwrap()));
        assert!(is_private_ip("255.255.255.255".parse().unwrap()));
        assert!(is_private_ip("ff02::1".parse().unwrap()));
    }

    #[test]
    fn blocks_ipv4_embedded_in_ipv6() {
        assert!(is_private_ip("::127.0.0.1".parse().unwrap()));
        assert!(is_private_ip("::10.0.0.1".parse().unwrap()));
        assert!(is_private_ip("64:ff9b::169.254.169.254".parse().unwrap()));
        assert!(is_private_ip("64:ff9b::c0a8:0101".parse().unwrap()));
        assert!(!is_private_ip("64:ff9b::8.8.8.8".parse().unwrap()));
    }

    #[test]
    fn allows_public_addresses() {
        assert!(!is_private_ip("8.8.8.8".parse().unwrap()));
        assert!(!is_private_ip("172.32.0.1".parse().unwrap()));
        assert!(!is_private_ip("2606:4700:4700::1111".parse().unwrap()));
    }

    #[tokio::test]
    async fn loopback_literal_is_refused() {
        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        assert!(matches!(
            ensure_public_host(&url).await,
            Err(PreviewError::BlockedHost)
        ));
    }
}
