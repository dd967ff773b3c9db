// Client address resolution shared by the process pool and `get_ip`

use std::net::IpAddr;

use super::env::RequestEnv;

/// Separator used by proxies when appending hops to X-Forwarded-For
const HOP_SEPARATOR: &str = ", ";

/// Pick the client address from a forwarded-for chain and the direct peer
///
/// The candidate list is `forwarded_for + ", " + remote_addr` when a
/// forwarded header exists, otherwise just `remote_addr`. The first entry,
/// scanning left to right, that parses as an IPv4 or IPv6 literal wins.
pub fn resolve_client_address(
    forwarded_for: Option<&str>,
    remote_addr: Option<&str>,
) -> Option<IpAddr> {
    let record = match (forwarded_for, remote_addr) {
        (Some(forwarded), Some(remote)) => format!("{forwarded}{HOP_SEPARATOR}{remote}"),
        (Some(forwarded), None) => forwarded.to_string(),
        (None, Some(remote)) => remote.to_string(),
        (None, None) => return None,
    };

    record
        .split(HOP_SEPARATOR)
        .find_map(|candidate| candidate.parse::<IpAddr>().ok())
}

/// Client IP for a request environment, empty when nothing validates
pub fn get_ip(env: &RequestEnv) -> String {
    resolve_client_address(env.forwarded_for.as_deref(), env.remote_addr.as_deref())
        .map(|addr| addr.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_remote_only() {
        let addr = resolve_client_address(None, Some("10.0.0.7"));
        assert_eq!(addr, Some("10.0.0.7".parse().unwrap()));
    }

    #[test]
    fn test_first_valid_forwarded_wins() {
        let addr = resolve_client_address(Some("unknown, 203.0.113.9, 198.51.100.1"), Some("10.0.0.1"));
        assert_eq!(addr, Some("203.0.113.9".parse().unwrap()));
    }

    #[test]
    fn test_falls_back_to_remote_when_chain_invalid() {
        let addr = resolve_client_address(Some("garbage, also-garbage"), Some("10.0.0.1"));
        assert_eq!(addr, Some("10.0.0.1".parse().unwrap()));
    }

    #[test]
    fn test_ipv6_literal_accepted() {
        let addr = resolve_client_address(Some("2001:db8::1"), Some("10.0.0.1"));
        assert_eq!(addr, Some("2001:db8::1".parse().unwrap()));
    }

    #[test]
    fn test_comma_without_space_is_single_candidate() {
        // "1.2.3.4,5.6.7.8" is not split, so only the remote address validates
        let addr = resolve_client_address(Some("1.2.3.4,5.6.7.8"), Some("192.0.2.5"));
        assert_eq!(addr, Some("192.0.2.5".parse().unwrap()));
    }

    #[test]
    fn test_nothing_valid_is_none() {
        assert_eq!(resolve_client_address(Some("nope"), Some("also nope")), None);
        assert_eq!(resolve_client_address(None, None), None);
    }

    #[test]
    fn test_get_ip_empty_when_unresolved() {
        let env = RequestEnv::http();
        assert_eq!(get_ip(&env), "");
    }

    #[test]
    fn test_get_ip_matches_resolver() {
        let mut env = RequestEnv::http();
        env.forwarded_for = Some("bad, 198.51.100.23".to_string());
        env.remote_addr = Some("127.0.0.1".to_string());
        assert_eq!(get_ip(&env), "198.51.100.23");
    }
}
