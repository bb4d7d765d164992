//! Email address helpers shared by validation and university resolution.

/// Split an address into `(local, domain)`.
///
/// Returns `None` unless the address contains exactly one `@` with text on
/// both sides.
#[must_use]
pub fn split_email(value: &str) -> Option<(&str, &str)> {
    let (local, domain) = value.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return None;
    }
    Some((local, domain))
}

/// Normalise an address by trimming it and lower-casing the domain part.
///
/// The local part is left as typed; mail servers may treat it case-sensitively.
#[must_use]
pub fn normalize_email(value: &str) -> String {
    let value = value.trim();
    match value.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => value.to_string(),
    }
}

/// Every label-boundary suffix of `domain`, longest first.
///
/// `"cs.bham.ac.uk"` yields `["cs.bham.ac.uk", "bham.ac.uk", "ac.uk", "uk"]`.
#[must_use]
pub fn domain_suffixes(domain: &str) -> Vec<String> {
    let domain = domain.trim().trim_end_matches('.').to_lowercase();
    if domain.is_empty() {
        return Vec::new();
    }

    let mut suffixes = vec![domain.clone()];
    let mut rest = domain.as_str();
    while let Some((_, tail)) = rest.split_once('.') {
        if tail.is_empty() {
            break;
        }
        suffixes.push(tail.to_string());
        rest = tail;
    }
    suffixes
}

/// The registrable part of `domain`: one label in front of its public suffix.
///
/// `"cs.bham.ac.uk"` yields `"bham.ac.uk"`. Names with no label in front of
/// a public suffix are returned whole.
#[must_use]
pub fn registrable_domain(domain: &str) -> String {
    let domain = domain.trim().trim_end_matches('.').to_lowercase();
    psl::domain_str(&domain).map_or_else(|| domain.clone(), str::to_string)
}

/// The label directly in front of the public suffix of `domain`.
///
/// `"cs.bham.ac.uk"` and `"bham.edu"` both yield `"bham"`.
#[must_use]
pub fn domain_name(domain: &str) -> String {
    let registrable = registrable_domain(domain);
    match registrable.split_once('.') {
        Some((name, _)) => name.to_string(),
        None => registrable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_email() {
        assert_eq!(split_email("a@bham.ac.uk"), Some(("a", "bham.ac.uk")));
        assert_eq!(split_email("a@b@c"), None);
        assert_eq!(split_email("@bham.ac.uk"), None);
        assert_eq!(split_email("a@"), None);
        assert_eq!(split_email("no-at-sign"), None);
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jo.Smith@BHAM.ac.UK "), "Jo.Smith@bham.ac.uk");
        assert_eq!(normalize_email("plain"), "plain");
    }

    #[test]
    fn test_domain_suffixes() {
        assert_eq!(
            domain_suffixes("CS.bham.ac.uk."),
            vec!["cs.bham.ac.uk", "bham.ac.uk", "ac.uk", "uk"]
        );
        assert_eq!(domain_suffixes("localhost"), vec!["localhost"]);
        assert!(domain_suffixes("").is_empty());
    }

    #[test]
    fn test_registrable_domain() {
        assert_eq!(registrable_domain("CS.bham.ac.uk."), "bham.ac.uk");
        assert_eq!(registrable_domain("acme.org"), "acme.org");
        assert_eq!(registrable_domain("mail.cs.acme.org"), "acme.org");
        assert_eq!(registrable_domain("ac.uk"), "ac.uk");
    }

    #[test]
    fn test_domain_name() {
        assert_eq!(domain_name("cs.bham.ac.uk"), "bham");
        assert_eq!(domain_name("test.bham.ac.uk"), "bham");
        assert_eq!(domain_name("mail.example.co.uk"), "example");
        assert_eq!(domain_name("localhost"), "localhost");
    }
}
