use jobscout_domain_models::Profile;

/// One unit of crawl work: a site paired with a `(keyword, location)`
/// query from the profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub site_id: &'static str,
    pub keyword: String,
    pub location: String,
}

/// Build the `Σ (keywords × locations × pages)` work queue (§4.F step 1).
/// Order is not specified by the spec beyond "deterministic given the
/// same inputs" — this sorts by site id, then keyword, then location, so
/// two runs against the same profile always enqueue identically
/// regardless of hash-map iteration order upstream.
pub fn build_queue(profile: &Profile, site_ids: &[&'static str]) -> Vec<WorkItem> {
    let mut sites: Vec<&'static str> = site_ids.to_vec();
    sites.sort_unstable();

    let mut keywords = profile.keywords.clone();
    keywords.sort();

    let mut locations = if profile.preferred_locations.is_empty() {
        vec![String::new()]
    } else {
        profile.preferred_locations.clone()
    };
    locations.sort();

    let mut queue = Vec::with_capacity(sites.len() * keywords.len() * locations.len());
    for site_id in sites {
        for keyword in &keywords {
            for location in &locations {
                queue.push(WorkItem {
                    site_id,
                    keyword: keyword.clone(),
                    location: location.clone(),
                });
            }
        }
    }
    queue
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> Profile {
        Profile {
            name: "p".into(),
            keywords: vec!["developer".into(), "python developer".into()],
            skills: vec![],
            preferred_locations: vec!["Toronto".into(), "Remote".into()],
            allow_remote: true,
            seniority_preferences: vec![],
            document_paths: vec![],
            excluded_title_terms: vec![],
            include_entry_level: true,
        }
    }

    #[test]
    fn queue_is_deterministic_regardless_of_input_site_order() {
        let profile = profile();
        let a = build_queue(&profile, &["indeed", "eluta"]);
        let b = build_queue(&profile, &["eluta", "indeed"]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 2 * 2 * 2);
        assert_eq!(a[0].site_id, "eluta");
    }

    #[test]
    fn zero_keywords_yields_an_empty_queue() {
        let mut profile = profile();
        profile.keywords.clear();
        let queue = build_queue(&profile, &["eluta"]);
        assert!(queue.is_empty());
    }
}
