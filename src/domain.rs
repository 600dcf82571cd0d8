//! Domain name segmentation helpers.
//!
//! A domain is treated as an ordered list of `.`-separated labels. Empty labels
//! (leading, trailing, or doubled dots) are dropped before any decision is made.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("domain '{0}' has no parent domain (needs more than two labels)")]
    NoParentDomain(String),
}

/// Splits a domain into its non-empty labels.
pub fn labels(domain: &str) -> Vec<&str> {
    domain.split('.').filter(|label| !label.is_empty()).collect()
}

/// Returns `true` when the domain has at least one label beyond a two-label base,
/// e.g. `www.example.com` but not `example.com`.
pub fn has_parent_domain(domain: &str) -> bool {
    labels(domain).len() > 2
}

/// Returns the domain with its leftmost label removed.
///
/// # Errors
/// * `DomainError::NoParentDomain` when `has_parent_domain` is false. Stripping a
///   label from a two-label domain would produce a bare suffix, which is never a
///   useful query target.
pub fn parent_domain(domain: &str) -> Result<String, DomainError> {
    let labels = labels(domain);
    if labels.len() <= 2 {
        return Err(DomainError::NoParentDomain(domain.to_string()));
    }
    Ok(labels[1..].join("."))
}

/// Builds the wildcard identity one level above the domain (`*.example.com` for
/// `www.example.com`).
pub fn wildcard_parent(domain: &str) -> Result<String, DomainError> {
    parent_domain(domain).map(|parent| format!("*.{}", parent))
}

/// Derives the registrable ("base") domain using the public suffix list.
///
/// Falls back to the normalized input when the list cannot name a registrable
/// domain, such as for a bare suffix or a single label.
pub fn base_domain(domain: &str) -> String {
    let normalized = domain.trim().trim_end_matches('.').to_lowercase();
    match psl::domain_str(&normalized) {
        Some(base) => base.to_string(),
        None => normalized,
    }
}
