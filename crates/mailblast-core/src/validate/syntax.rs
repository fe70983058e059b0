//! Pure address syntax checks. No network I/O happens here.

/// A syntactically valid address split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAddress {
    /// Normalized (trimmed, lowercase) full address.
    pub email: String,
    /// Local part.
    pub local: String,
    /// Domain part.
    pub domain: String,
}

/// Parses and normalizes an address, returning `None` for anything that
/// cannot be a deliverable `local@domain`.
///
/// The check is a pragmatic RFC 5321 subset: ASCII local part without
/// spaces/control characters or misplaced dots, and a dotted domain of
/// LDH labels.
#[must_use]
pub fn parse_address(raw: &str) -> Option<ParsedAddress> {
    let email = raw.trim().to_lowercase();
    let (local, domain) = email.split_once('@')?;

    if !local_part_ok(local) || !domain_ok(domain) {
        return None;
    }

    Some(ParsedAddress {
        local: local.to_string(),
        domain: domain.to_string(),
        email,
    })
}

fn local_part_ok(local: &str) -> bool {
    if local.is_empty() || local.len() > 64 {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    local.bytes().all(|b| {
        b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-' | b'+' | b'=' | b'\'')
    })
}

fn domain_ok(domain: &str) -> bool {
    if domain.is_empty() || domain.len() > 253 || domain.contains('@') {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    // Top-level label must be alphabetic (rules out bare IPs and trailing
    // digits from truncated paste jobs).
    let tld = labels[labels.len() - 1];
    if tld.len() < 2 || !tld.bytes().all(|b| b.is_ascii_alphabetic()) {
        return false;
    }

    labels.iter().all(|label| label_ok(label))
}

fn label_ok(label: &str) -> bool {
    if label.is_empty() || label.len() > 63 {
        return false;
    }
    if label.starts_with('-') || label.ends_with('-') {
        return false;
    }
    label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_addresses() {
        for addr in [
            "alice@example.com",
            "first.last@mail.example.co.uk",
            "user+tag@example.org",
            "o'brien@example.ie",
            "x_1-2=3@sub.example.com",
        ] {
            assert!(parse_address(addr).is_some(), "rejected {addr}");
        }
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        let parsed = parse_address("  Alice.Smith@Example.COM ").unwrap();
        assert_eq!(parsed.email, "alice.smith@example.com");
        assert_eq!(parsed.local, "alice.smith");
        assert_eq!(parsed.domain, "example.com");
    }

    #[test]
    fn rejects_malformed_addresses() {
        for addr in [
            "",
            "plainaddress",
            "@example.com",
            "user@",
            "user@@example.com",
            "a@b@c.com",
            ".leading@example.com",
            "trailing.@example.com",
            "double..dot@example.com",
            "spaces in local@example.com",
            "user@nodot",
            "user@-bad.com",
            "user@bad-.com",
            "user@example.c",
            "user@example.123",
            "user@exa mple.com",
        ] {
            assert!(parse_address(addr).is_none(), "accepted {addr}");
        }
    }

    #[test]
    fn rejects_overlong_parts() {
        let long_local = format!("{}@example.com", "a".repeat(65));
        assert!(parse_address(&long_local).is_none());

        let long_domain = format!("user@{}.com", "a".repeat(250));
        assert!(parse_address(&long_domain).is_none());

        let long_label = format!("user@{}.com", "a".repeat(64));
        assert!(parse_address(&long_label).is_none());
    }
}
