use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::error::{ErrorKind, HasErrorKind};

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile not found at {0}")]
    NotFound(String),
    #[error("profile file is not valid JSON: {0}")]
    Malformed(String),
    #[error("profile has no keywords and no preferred locations")]
    Empty,
}

impl HasErrorKind for ProfileError {
    fn kind(&self) -> ErrorKind {
        match self {
            ProfileError::NotFound(_) => ErrorKind::Invalid,
            ProfileError::Malformed(_) => ErrorKind::Invalid,
            ProfileError::Empty => ErrorKind::Invalid,
        }
    }
}

/// Read-only snapshot of a user's search preferences. Treated as immutable
/// for the duration of one scrape or processing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub preferred_locations: Vec<String>,
    #[serde(default = "default_true")]
    pub allow_remote: bool,
    #[serde(default)]
    pub seniority_preferences: Vec<String>,
    #[serde(default)]
    pub document_paths: Vec<String>,
    /// Title substrings that disqualify a posting regardless of keyword
    /// match (backend-only, frontend-only, full-stack, out-of-scope
    /// specialist roles, too-senior titles when targeting entry/mid).
    #[serde(default = "default_excluded_title_terms")]
    pub excluded_title_terms: Vec<String>,
    #[serde(default)]
    pub include_entry_level: bool,
}

fn default_true() -> bool {
    true
}

fn default_excluded_title_terms() -> Vec<String> {
    vec![
        "backend developer",
        "back-end developer",
        "backend engineer",
        "full stack developer",
        "fullstack developer",
        "full-stack developer",
        "frontend developer",
        "front-end developer",
        "ui developer",
        "principal engineer",
        "staff engineer",
        "distinguished engineer",
        "engineering manager",
        "devops engineer",
        "site reliability engineer",
        "data engineer",
        "machine learning engineer",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Profile {
    /// Load a profile JSON snapshot from disk. Profile authoring and
    /// validation beyond basic shape is an external collaborator's
    /// responsibility; this is the minimal loader the core needs to run.
    pub fn load_from_file(path: &Path) -> Result<Self, ProfileError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|_| ProfileError::NotFound(path.display().to_string()))?;
        let profile: Profile = serde_json::from_str(&contents)
            .map_err(|e| ProfileError::Malformed(e.to_string()))?;
        if profile.keywords.is_empty() && profile.preferred_locations.is_empty() {
            return Err(ProfileError::Empty);
        }
        Ok(profile)
    }

    pub fn allows_location(&self, location: &str) -> bool {
        let lower = location.to_ascii_lowercase();
        if self.allow_remote && lower.contains("remote") {
            return true;
        }
        self.preferred_locations
            .iter()
            .any(|preferred| lower.contains(&preferred.to_ascii_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_minimal_profile() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"name":"p","keywords":["python developer"],"preferred_locations":["Toronto"]}}"#
        )
        .unwrap();
        let profile = Profile::load_from_file(file.path()).unwrap();
        assert_eq!(profile.name, "p");
        assert!(profile.allow_remote);
        assert!(!profile.excluded_title_terms.is_empty());
    }

    #[test]
    fn rejects_empty_profile() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"name":"p","keywords":[],"preferred_locations":[]}}"#).unwrap();
        let err = Profile::load_from_file(file.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
    }

    #[test]
    fn remote_allowed_matches_remote_locations() {
        let profile = Profile {
            name: "p".into(),
            keywords: vec!["python".into()],
            skills: vec![],
            preferred_locations: vec!["Toronto".into()],
            allow_remote: true,
            seniority_preferences: vec![],
            document_paths: vec![],
            excluded_title_terms: vec![],
            include_entry_level: true,
        };
        assert!(profile.allows_location("Remote - Canada"));
        assert!(profile.allows_location("Toronto, ON"));
        assert!(!profile.allows_location("San Francisco"));
    }
}
