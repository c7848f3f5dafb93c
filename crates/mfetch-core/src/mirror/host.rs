//! CDN edge hostname decomposition.
//!
//! Edge hosts look like `rr3---sn-ab5l6nrs.googlevideo.com`: a two-letter
//! prefix, a numeric index, `---`, a stable suffix token and the CDN domain.
//! Siblings differ only in the index.

/// A hostname that matches the CDN edge naming pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdnHost {
    pub prefix: String,
    pub index: u32,
    pub suffix: String,
    pub domain: String,
}

impl CdnHost {
    /// Parses `host` against the pattern for `domain`. Returns `None` for any
    /// host that is not an edge host of that CDN.
    pub fn parse(host: &str, domain: &str) -> Option<Self> {
        let host = host.to_ascii_lowercase();
        let domain = domain.trim_start_matches('.').to_ascii_lowercase();
        let label = host.strip_suffix(&domain)?.strip_suffix('.')?;
        let (head, suffix) = label.split_once("---")?;

        if head.len() < 3 || !head.is_char_boundary(2) {
            return None;
        }
        let (prefix, digits) = head.split_at(2);
        if !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let index: u32 = digits.parse().ok()?;

        let suffix_ok = !suffix.is_empty()
            && suffix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !suffix_ok {
            return None;
        }

        Some(Self {
            prefix: prefix.to_string(),
            index,
            suffix: suffix.to_string(),
            domain,
        })
    }

    /// Hostname of the sibling edge server with the given index.
    pub fn with_index(&self, index: u32) -> String {
        format!("{}{}---{}.{}", self.prefix, index, self.suffix, self.domain)
    }
}
