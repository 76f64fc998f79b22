//! Parser for the kernel connection tables `/proc/net/tcp` and `/proc/net/tcp6`.
//!
//! Format (each line after the header):
//! ```text
//!   sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
//!    0: 0100007F:1E6C 0500000A:D431 01 00000000:00000000 00:00000000 00000000  1000        0 12345 ...
//! ```
//!
//! Addresses are hex words in host byte order; ports are big-endian hex.
//! IPv6 addresses are four such 32-bit words.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::error_handling::types::NetworkError;
use crate::network::types::{SocketEntry, TcpState};

/// Parses the whole table. `is_ipv6` selects the `tcp6` address width.
pub fn parse_table(content: &str, is_ipv6: bool) -> Result<Vec<SocketEntry>, NetworkError> {
    let mut entries = Vec::new();

    for line in content.lines().skip(1) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 4 {
            continue;
        }

        let local = parse_socket_addr(parts[1], is_ipv6)?;
        let remote = parse_socket_addr(parts[2], is_ipv6)?;
        let state = u8::from_str_radix(parts[3], 16)
            .map_err(|_| NetworkError::ParseError(format!("Invalid state: {}", parts[3])))?;

        entries.push(SocketEntry {
            local,
            remote,
            state: TcpState::from_code(state),
        });
    }

    Ok(entries)
}

fn parse_socket_addr(s: &str, is_ipv6: bool) -> Result<SocketAddr, NetworkError> {
    let (addr_hex, port_hex) = s
        .split_once(':')
        .ok_or_else(|| NetworkError::ParseError(format!("Invalid address format: {}", s)))?;

    let addr = if is_ipv6 {
        IpAddr::V6(parse_hex_v6(addr_hex)?)
    } else {
        IpAddr::V4(parse_hex_v4(addr_hex)?)
    };
    let port = u16::from_str_radix(port_hex, 16)
        .map_err(|_| NetworkError::ParseError(format!("Invalid port: {}", port_hex)))?;

    Ok(SocketAddr::new(addr, port))
}

fn parse_hex_word(hex: &str) -> Result<[u8; 4], NetworkError> {
    let word = u32::from_str_radix(hex, 16)
        .map_err(|_| NetworkError::ParseError(format!("Invalid address word: {}", hex)))?;
    Ok(word.to_ne_bytes())
}

fn parse_hex_v4(hex: &str) -> Result<Ipv4Addr, NetworkError> {
    if hex.len() != 8 {
        return Err(NetworkError::ParseError(format!("Invalid IPv4 address: {}", hex)));
    }
    Ok(Ipv4Addr::from(parse_hex_word(hex)?))
}

fn parse_hex_v6(hex: &str) -> Result<Ipv6Addr, NetworkError> {
    if hex.len() != 32 || !hex.is_ascii() {
        return Err(NetworkError::ParseError(format!(
            "Invalid IPv6 address length: expected 32 hex chars, got {}",
            hex.len()
        )));
    }
    let mut octets = [0u8; 16];
    for i in 0..4 {
        let word = parse_hex_word(&hex[i * 8..(i + 1) * 8])?;
        octets[i * 4..(i + 1) * 4].copy_from_slice(&word);
    }
    Ok(Ipv6Addr::from(octets))
}

#[cfg(all(test, target_endian = "little"))]
mod tests {
    use super::*;

    const TCP4: &str = "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
   0: 00000000:1E6C 00000000:0000 0A 00000000:00000000 00:00000000 00000000     0        0 1111 1 0000000000000000 100 0 0 10 0
   1: 0F02000A:1E6C 0500000A:D431 01 00000000:00000000 02:000A7214 00000000     0        0 2222 1 0000000000000000 20 4 30 10 -1
";

    #[test]
    fn test_parse_hex_v4() {
        assert_eq!(parse_hex_v4("0100007F").unwrap(), Ipv4Addr::new(127, 0, 0, 1));
        assert_eq!(parse_hex_v4("0500000A").unwrap(), Ipv4Addr::new(10, 0, 0, 5));
    }

    #[test]
    fn test_parse_hex_v6_loopback_and_mapped() {
        assert_eq!(
            parse_hex_v6("00000000000000000000000001000000").unwrap(),
            Ipv6Addr::LOCALHOST
        );
        let mapped = parse_hex_v6("0000000000000000FFFF00000500000A").unwrap();
        assert_eq!(mapped.to_ipv4_mapped(), Some(Ipv4Addr::new(10, 0, 0, 5)));
    }

    #[test]
    fn test_parse_table_v4() {
        let entries = parse_table(TCP4, false).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].state, TcpState::Listen);
        assert_eq!(entries[0].local.port(), 7788);
        assert_eq!(entries[1].state, TcpState::Established);
        assert_eq!(entries[1].local, "10.0.2.15:7788".parse().unwrap());
        assert_eq!(entries[1].remote, "10.0.0.5:54321".parse().unwrap());
    }

    #[test]
    fn test_parse_rejects_bad_address() {
        let content = "header\n   0: XYZ:1E6C 00000000:0000 0A\n";
        assert!(matches!(
            parse_table(content, false),
            Err(NetworkError::ParseError(_))
        ));
    }

    #[test]
    fn test_header_only_table_is_empty() {
        let content = "  sl  local_address rem_address   st tx_queue rx_queue\n";
        assert!(parse_table(content, true).unwrap().is_empty());
    }
}
