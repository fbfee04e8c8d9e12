//! Parsing helpers shared by the platform scanners.

/// Parse an address:port string.
///
/// Handles multiple address formats:
/// - IPv4: "127.0.0.1:3000" or "*:8080"
/// - IPv6: "\[::1]:3000" or "\[fe80::1]:8080"
/// - Interface-scoped: "\[fe80::1]%eth0:22", "0.0.0.0%lo:53"
pub fn parse_address(address: &str) -> Option<(String, u16)> {
    let last_colon = address.rfind(':')?;
    let port: u16 = address[last_colon + 1..].parse().ok()?;
    let addr = strip_scope(&address[..last_colon]);

    if addr.starts_with('[') {
        if !addr.ends_with(']') {
            return None;
        }
        return Some((addr, port));
    }

    let addr = match addr.as_str() {
        "" | "0.0.0.0" => "*".to_string(),
        _ => addr,
    };
    Some((addr, port))
}

/// Drop a `%scope` zone suffix, inside or after IPv6 brackets.
fn strip_scope(addr: &str) -> String {
    let Some(percent) = addr.find('%') else {
        return addr.to_string();
    };
    match addr[percent..].find(']') {
        Some(close) => format!("{}{}", &addr[..percent], &addr[percent + close..]),
        None => addr[..percent].to_string(),
    }
}

/// Truncate long command lines for display.
pub fn truncate_command(command: &str) -> String {
    const MAX: usize = 200;
    if command.len() <= MAX {
        return command.to_string();
    }
    let mut end = MAX;
    while !command.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &command[..end])
}
