use std::net::IpAddr;

/// Normalizes a remote address for tracking.
///
/// IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) collapse to their IPv4 form.
/// Returns `None` for addresses that are never tracked: loopback and unspecified.
pub fn normalize(addr: IpAddr) -> Option<IpAddr> {
    let addr = addr.to_canonical();
    if addr.is_loopback() || addr.is_unspecified() {
        None
    } else {
        Some(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_mapped_ipv6_becomes_ipv4() {
        let mapped: IpAddr = "::ffff:10.0.0.5".parse().unwrap();
        assert_eq!(normalize(mapped), Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5))));
    }

    #[test]
    fn test_loopback_is_dropped() {
        assert_eq!(normalize(IpAddr::V4(Ipv4Addr::LOCALHOST)), None);
        assert_eq!(normalize(IpAddr::V6(Ipv6Addr::LOCALHOST)), None);
        assert_eq!(normalize("::ffff:127.0.0.1".parse().unwrap()), None);
    }

    #[test]
    fn test_unspecified_is_dropped() {
        assert_eq!(normalize(IpAddr::V4(Ipv4Addr::UNSPECIFIED)), None);
        assert_eq!(normalize(IpAddr::V6(Ipv6Addr::UNSPECIFIED)), None);
    }

    #[test]
    fn test_plain_addresses_pass_through() {
        let v6: IpAddr = "2001:db8::7".parse().unwrap();
        assert_eq!(normalize(v6), Some(v6));
        let v4: IpAddr = "203.0.113.45".parse().unwrap();
        assert_eq!(normalize(v4), Some(v4));
    }
}
