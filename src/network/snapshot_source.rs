use std::collections::HashSet;
use std::io::ErrorKind;
use std::net::IpAddr;
use std::path::PathBuf;

use log::trace;

use super::connection_filter::normalize;
use super::proc_net::parse_table;
use super::types::SocketEntry;
use crate::error_handling::types::NetworkError;

/// Produces the set of remote addresses currently connected to a local port.
///
/// Implementations must exclude other local ports, listening sockets and
/// loopback peers, normalize IPv4-mapped IPv6 addresses and deduplicate.
pub trait SnapshotSource {
    fn remote_addresses(&self, port: u16) -> Result<HashSet<IpAddr>, NetworkError>;
}

/// Snapshot source reading the Linux connection tables under `/proc`.
pub struct ProcNetSource {
    proc_root: PathBuf,
}

impl Default for ProcNetSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcNetSource {
    pub fn new() -> Self {
        Self::with_root("/proc")
    }

    /// Reads `<root>/net/tcp` and `<root>/net/tcp6` instead of the live `/proc`.
    pub fn with_root<P: Into<PathBuf>>(root: P) -> Self {
        Self { proc_root: root.into() }
    }

    fn read_table(&self, name: &str, is_ipv6: bool) -> Result<Vec<SocketEntry>, NetworkError> {
        let path = self.proc_root.join("net").join(name);
        match std::fs::read_to_string(&path) {
            Ok(content) => parse_table(&content, is_ipv6),
            // tcp6 is absent when IPv6 is disabled
            Err(e) if is_ipv6 && e.kind() == ErrorKind::NotFound => {
                trace!("{} not present, skipping", path.display());
                Ok(Vec::new())
            }
            Err(source) => Err(NetworkError::ReadFailed { path, source }),
        }
    }
}

/// Reduces raw table rows to the tracked remote addresses of `port`.
pub fn remote_addresses_of<'a, I>(entries: I, port: u16) -> HashSet<IpAddr>
where
    I: IntoIterator<Item = &'a SocketEntry>,
{
    entries
        .into_iter()
        .filter(|e| e.local.port() == port && e.state.holds_peer() && e.remote.port() != 0)
        .filter_map(|e| normalize(e.remote.ip()))
        .collect()
}

impl SnapshotSource for ProcNetSource {
    fn remote_addresses(&self, port: u16) -> Result<HashSet<IpAddr>, NetworkError> {
        let mut entries = self.read_table("tcp", false)?;
        entries.extend(self.read_table("tcp6", true)?);
        Ok(remote_addresses_of(&entries, port))
    }
}

#[cfg(all(test, target_endian = "little"))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const HEADER: &str = "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode\n";

    fn proc_root(tcp: Option<&str>, tcp6: Option<&str>) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("net")).unwrap();
        if let Some(rows) = tcp {
            fs::write(dir.path().join("net/tcp"), format!("{}{}", HEADER, rows)).unwrap();
        }
        if let Some(rows) = tcp6 {
            fs::write(dir.path().join("net/tcp6"), format!("{}{}", HEADER, rows)).unwrap();
        }
        dir
    }

    #[test]
    fn test_filters_port_state_and_loopback_and_dedups() {
        let tcp = "\
   0: 00000000:1E6C 00000000:0000 0A 00000000:00000000 00:00000000 00000000 0 0 1
   1: 0F02000A:1E6C 0500000A:D431 01 00000000:00000000 00:00000000 00000000 0 0 2
   2: 0F02000A:1E6C 0500000A:D432 01 00000000:00000000 00:00000000 00000000 0 0 3
   3: 0100007F:1E6C 0100007F:D433 01 00000000:00000000 00:00000000 00000000 0 0 4
   4: 0F02000A:0016 0600000A:D434 01 00000000:00000000 00:00000000 00000000 0 0 5
   5: 0F02000A:1E6C 0700000A:D435 06 00000000:00000000 00:00000000 00000000 0 0 6
";
        let dir = proc_root(Some(tcp), None);
        let source = ProcNetSource::with_root(dir.path());

        let addrs = source.remote_addresses(7788).unwrap();
        let expected: HashSet<IpAddr> = ["10.0.0.5".parse().unwrap()].into_iter().collect();
        assert_eq!(addrs, expected);
    }

    #[test]
    fn test_mapped_ipv6_peer_is_reported_as_ipv4() {
        let tcp6 = "\
   0: 00000000000000000000000000000000:1E6C 00000000000000000000000000000000:0000 0A 00000000:00000000 00:00000000 00000000 0 0 1
   1: 0000000000000000FFFF00000F02000A:1E6C 0000000000000000FFFF00000500000A:D431 01 00000000:00000000 00:00000000 00000000 0 0 2
   2: 00000000000000000000000001000000:1E6C 00000000000000000000000001000000:D432 01 00000000:00000000 00:00000000 00000000 0 0 3
";
        let dir = proc_root(Some(""), Some(tcp6));
        let source = ProcNetSource::with_root(dir.path());

        let addrs = source.remote_addresses(7788).unwrap();
        assert_eq!(addrs.len(), 1);
        assert!(addrs.contains(&"10.0.0.5".parse::<IpAddr>().unwrap()));
    }

    #[test]
    fn test_missing_tcp6_is_not_an_error() {
        let dir = proc_root(Some(""), None);
        let source = ProcNetSource::with_root(dir.path());
        assert!(source.remote_addresses(7788).unwrap().is_empty());
    }

    #[test]
    fn test_missing_tcp_is_an_error() {
        let dir = proc_root(None, Some(""));
        let source = ProcNetSource::with_root(dir.path());
        assert!(matches!(
            source.remote_addresses(7788),
            Err(NetworkError::ReadFailed { .. })
        ));
    }
}
