//! Deterministic identity hash for a posting: `fingerprint(title, company,
//! url)` collapses whitespace/punctuation/stop-prefixes and strips
//! tracking parameters before hashing, so honest duplicates collide
//! across runs, machines, and processes.

use sha2::{Digest, Sha256};

const TITLE_STOP_PREFIXES: &[&str] = &["sr.", "sr", "senior", "jr.", "jr", "junior", "lead"];

const TRACKING_PARAM_PREFIXES: &[&str] = &["utm_", "gclid", "fbclid", "msclkid"];
const TRACKING_PARAM_EXACT: &[&str] = &["sid", "session_id", "ref", "source"];

/// Lowercase, collapse internal whitespace, strip punctuation.
fn normalize_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_was_space = false;
    for ch in input.chars() {
        let lower = ch.to_ascii_lowercase();
        if lower.is_alphanumeric() {
            out.push(lower);
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    out.trim().to_string()
}

/// Normalize a job title: lowercase, strip punctuation, drop a leading
/// stop-prefix word (`sr.`, `senior`, ...).
pub fn normalize_title(title: &str) -> String {
    let normalized = normalize_text(title);
    let mut words: Vec<&str> = normalized.split_whitespace().collect();
    while let Some(first) = words.first() {
        if TITLE_STOP_PREFIXES.contains(first) {
            words.remove(0);
        } else {
            break;
        }
    }
    words.join(" ")
}

/// Normalize a company name: lowercase, strip punctuation and collapse
/// whitespace. No stop-prefix stripping (company names don't carry
/// seniority qualifiers).
pub fn normalize_company(company: &str) -> String {
    normalize_text(company)
}

/// Normalize a location string the same way as a company name.
pub fn normalize_location(location: &str) -> String {
    normalize_text(location)
}

/// Strip query/fragment and known tracking parameters from a URL; fall
/// back to a host-only comparison when the path is empty (`/` or none).
fn normalize_url(raw: &str) -> Option<String> {
    let mut parsed = url::Url::parse(raw).ok()?;
    parsed.set_fragment(None);

    let kept_pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| {
            let key_lower = key.to_ascii_lowercase();
            !TRACKING_PARAM_PREFIXES
                .iter()
                .any(|prefix| key_lower.starts_with(prefix))
                && !TRACKING_PARAM_EXACT.contains(&key_lower.as_str())
        })
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept_pairs.is_empty() {
        parsed.set_query(None);
    } else {
        let query = kept_pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        parsed.set_query(Some(&query));
    }

    let host = parsed.host_str()?.to_ascii_lowercase();
    let path = parsed.path().trim_end_matches('/');
    if path.is_empty() {
        return Some(host);
    }
    Some(format!("{host}{path}{}", query_suffix(&parsed)))
}

fn query_suffix(parsed: &url::Url) -> String {
    match parsed.query() {
        Some(q) if !q.is_empty() => format!("?{q}"),
        _ => String::new(),
    }
}

/// Compute the 32-hex-character fingerprint for a posting.
///
/// `canonical_url` should be `None`/empty when the job has no resolvable
/// employer-side URL, or when it is itself a listing-site search URL —
/// in either case the fingerprint falls back to
/// `(normalized_title, normalized_company, normalized_location)`.
pub fn fingerprint(
    title: &str,
    company: &str,
    location: &str,
    canonical_url: Option<&str>,
    is_listing_url: bool,
) -> String {
    let norm_title = normalize_title(title);
    let norm_company = normalize_company(company);

    let key = match canonical_url.filter(|u| !u.trim().is_empty() && !is_listing_url) {
        Some(url) => match normalize_url(url) {
            Some(norm_url) => format!("{norm_title}|{norm_company}|{norm_url}"),
            None => format!(
                "{norm_title}|{norm_company}|{}",
                normalize_location(location)
            ),
        },
        None => format!(
            "{norm_title}|{norm_company}|{}",
            normalize_location(location)
        ),
    };

    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..16])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_prefix_is_stripped() {
        assert_eq!(normalize_title("Sr. Python Developer"), "python developer");
        assert_eq!(normalize_title("Senior Python Developer"), "python developer");
        assert_eq!(normalize_title("Python Developer"), "python developer");
    }

    #[test]
    fn whitespace_and_punctuation_collapse() {
        assert_eq!(normalize_title("  Python,  Developer!! "), "python developer");
    }

    #[test]
    fn tracking_params_are_stripped() {
        let normalized = normalize_url(
            "https://jobs.examplecorp.com/apply/42?utm_source=eluta&gclid=abc&ref=xyz",
        )
        .unwrap();
        assert_eq!(normalized, "jobs.examplecorp.com/apply/42");
    }

    #[test]
    fn host_only_when_path_empty() {
        let normalized = normalize_url("https://jobs.examplecorp.com/?utm_source=eluta").unwrap();
        assert_eq!(normalized, "jobs.examplecorp.com");
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let a = fingerprint(
            "Senior Python Developer",
            "Example Corp",
            "Toronto",
            Some("https://jobs.examplecorp.com/apply/42?utm_source=eluta"),
            false,
        );
        let b = fingerprint(
            "python developer",
            "example corp",
            "toronto",
            Some("https://jobs.examplecorp.com/apply/42?gclid=123"),
            false,
        );
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn listing_url_falls_back_to_title_company_location() {
        let with_listing_url = fingerprint(
            "Python Developer",
            "Example Corp",
            "Toronto",
            Some("https://www.eluta.ca/search?q=python&pg=2"),
            true,
        );
        let without_url = fingerprint(
            "Python Developer",
            "Example Corp",
            "Toronto",
            None,
            false,
        );
        assert_eq!(with_listing_url, without_url);
    }

    #[test]
    fn distinct_postings_do_not_collide() {
        let a = fingerprint("Python Developer", "Example Corp", "Toronto", None, false);
        let b = fingerprint("Java Developer", "Example Corp", "Toronto", None, false);
        assert_ne!(a, b);
    }

    proptest::proptest! {
        #[test]
        fn fingerprint_of_normalized_equals_fingerprint_of_raw(
            title in "[A-Za-z ]{1,30}",
            company in "[A-Za-z ]{1,30}",
            location in "[A-Za-z ]{1,20}",
        ) {
            let raw = fingerprint(&title, &company, &location, None, false);
            let pre_normalized = fingerprint(
                &normalize_title(&title),
                &normalize_company(&company),
                &normalize_location(&location),
                None,
                false,
            );
            proptest::prop_assert_eq!(raw, pre_normalized);
        }
    }
}
