//! Disposable/role classification, provider detection, and typo
//! suggestions.
//!
//! The domain sets are compiled in with `phf`. The disposable list is the
//! maintained source referenced in DESIGN.md; extending it is a one-line
//! change here and the scoring around it stays configuration-driven.

use phf::{phf_map, phf_set};

/// Domains of widely known disposable/throwaway mailbox providers.
static DISPOSABLE_DOMAINS: phf::Set<&'static str> = phf_set! {
    "10minutemail.com",
    "dispostable.com",
    "fakeinbox.com",
    "getnada.com",
    "guerrillamail.com",
    "guerrillamail.org",
    "mailcatch.com",
    "maildrop.cc",
    "mailinator.com",
    "mailnesia.com",
    "mintemail.com",
    "mytemp.email",
    "sharklasers.com",
    "spam4.me",
    "temp-mail.org",
    "tempmail.dev",
    "throwawaymail.com",
    "trashmail.com",
    "yopmail.com",
};

/// Role-account local parts that rarely map to a person.
static ROLE_LOCALS: phf::Set<&'static str> = phf_set! {
    "abuse",
    "admin",
    "billing",
    "contact",
    "help",
    "hello",
    "hostmaster",
    "info",
    "marketing",
    "noreply",
    "no-reply",
    "office",
    "postmaster",
    "sales",
    "security",
    "support",
    "webmaster",
};

/// Well-known mailbox providers, keyed by domain.
static PROVIDERS: phf::Map<&'static str, &'static str> = phf_map! {
    "aol.com" => "AOL",
    "gmail.com" => "Gmail",
    "googlemail.com" => "Gmail",
    "gmx.com" => "GMX",
    "gmx.de" => "GMX",
    "hotmail.com" => "Outlook",
    "icloud.com" => "iCloud",
    "live.com" => "Outlook",
    "mail.com" => "Mail.com",
    "me.com" => "iCloud",
    "msn.com" => "Outlook",
    "outlook.com" => "Outlook",
    "proton.me" => "Proton",
    "protonmail.com" => "Proton",
    "yahoo.com" => "Yahoo",
    "yahoo.co.uk" => "Yahoo",
    "yandex.com" => "Yandex",
    "zoho.com" => "Zoho",
};

/// Domains considered as typo-suggestion targets.
const SUGGESTION_TARGETS: [&str; 8] = [
    "gmail.com",
    "googlemail.com",
    "hotmail.com",
    "icloud.com",
    "live.com",
    "outlook.com",
    "protonmail.com",
    "yahoo.com",
];

/// Risk signals and metadata derived from the address parts alone.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classification {
    /// The domain is a known disposable provider.
    pub disposable: bool,
    /// The local part is a role account.
    pub role_account: bool,
    /// Detected mailbox provider name.
    pub provider: Option<&'static str>,
    /// Corrected address for a likely domain typo.
    pub suggestion: Option<String>,
}

/// Classifies an address already split into local and domain parts.
#[must_use]
pub fn classify(local: &str, domain: &str) -> Classification {
    Classification {
        disposable: DISPOSABLE_DOMAINS.contains(domain),
        role_account: ROLE_LOCALS.contains(local),
        provider: PROVIDERS.get(domain).copied(),
        suggestion: suggest_domain(domain).map(|fixed| format!("{local}@{fixed}")),
    }
}

/// Suggests a well-known domain within edit distance 1, unless the domain
/// already is one.
fn suggest_domain(domain: &str) -> Option<&'static str> {
    if PROVIDERS.contains_key(domain) {
        return None;
    }
    SUGGESTION_TARGETS
        .iter()
        .find(|target| edit_distance(domain, target) == 1)
        .copied()
}

/// Edit distance with adjacent transpositions counted as one operation
/// (optimal string alignment), since swapped letters are the dominant
/// domain typo. Early-exits on length gaps beyond the bound we care about.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<u8> = a.bytes().collect();
    let b: Vec<u8> = b.bytes().collect();
    if a.len().abs_diff(b.len()) > 1 {
        return a.len().abs_diff(b.len());
    }

    let mut grandparent: Vec<usize> = vec![0; b.len() + 1];
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
            if i > 0 && j > 0 && ca == b[j - 1] && a[i - 1] == cb {
                current[j + 1] = current[j + 1].min(grandparent[j - 1] + 1);
            }
        }
        std::mem::swap(&mut grandparent, &mut previous);
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_disposable_domains() {
        assert!(classify("bob", "mailinator.com").disposable);
        assert!(classify("bob", "yopmail.com").disposable);
        assert!(!classify("bob", "example.com").disposable);
    }

    #[test]
    fn flags_role_accounts() {
        assert!(classify("postmaster", "example.com").role_account);
        assert!(classify("no-reply", "example.com").role_account);
        assert!(!classify("alice", "example.com").role_account);
    }

    #[test]
    fn detects_providers() {
        assert_eq!(classify("alice", "gmail.com").provider, Some("Gmail"));
        assert_eq!(classify("alice", "hotmail.com").provider, Some("Outlook"));
        assert_eq!(classify("alice", "example.com").provider, None);
    }

    #[test]
    fn suggests_close_typos() {
        assert_eq!(
            classify("alice", "gmial.com").suggestion.as_deref(),
            Some("alice@gmail.com")
        );
        assert_eq!(
            classify("alice", "yaho.com").suggestion.as_deref(),
            Some("alice@yahoo.com")
        );
    }

    #[test]
    fn no_suggestion_for_exact_or_distant_domains() {
        assert_eq!(classify("alice", "gmail.com").suggestion, None);
        assert_eq!(classify("alice", "example.com").suggestion, None);
    }

    #[test]
    fn edit_distance_basics() {
        assert_eq!(edit_distance("gmail.com", "gmail.com"), 0);
        // Adjacent transposition counts once.
        assert_eq!(edit_distance("gmial.com", "gmail.com"), 1);
        assert_eq!(edit_distance("gmaill.com", "gmail.com"), 1);
        assert_eq!(edit_distance("gmal.com", "gmail.com"), 1);
        assert!(edit_distance("example.com", "gmail.com") > 1);
    }
}
