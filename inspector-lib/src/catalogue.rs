//! Platform catalogue: groups of URL templates resolved into probe targets.
//!
//! Built-in groups cover the social and tech platforms the tool ships with.
//! Users can add groups (or replace built-in ones) through the
//! `[custom_platforms]` table of a config file.

use crate::error::ProbeError;
use crate::types::{MatchRule, ProbeTarget};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Placeholder substituted with the username in every URL template.
pub const USERNAME_PLACEHOLDER: &str = "{username}";

/// Group searched when the caller does not pick one.
pub const DEFAULT_GROUP: &str = "social";

/// A platform URL template plus the rule that classifies its responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformTemplate {
    /// Platform name shown to the user
    pub name: String,

    /// URL containing the `{username}` placeholder
    pub url: String,

    /// Match rule, `status_equals 200` when omitted
    #[serde(default)]
    pub rule: MatchRule,
}

impl PlatformTemplate {
    /// Template matched by an exact `200 OK`.
    pub fn status_ok<N: Into<String>, U: Into<String>>(name: N, url: U) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            rule: MatchRule::default(),
        }
    }

    pub fn with_rule(mut self, rule: MatchRule) -> Self {
        self.rule = rule;
        self
    }

    /// Resolve the template for one username.
    ///
    /// The username is inserted verbatim; callers must make sure it is a safe
    /// URL path segment (see [`crate::validate_username`]).
    pub fn resolve(&self, username: &str) -> ProbeTarget {
        ProbeTarget::new(
            self.name.clone(),
            self.url.replace(USERNAME_PLACEHOLDER, username),
            self.rule.clone(),
        )
    }
}

/// A named, selectable set of platforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformGroup {
    pub id: String,
    pub description: String,
    pub platforms: Vec<PlatformTemplate>,
}

/// Ordered collection of platform groups.
#[derive(Debug, Clone)]
pub struct Catalogue {
    groups: Vec<PlatformGroup>,
}

impl Default for Catalogue {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalogue {
    /// Catalogue with only the built-in groups.
    pub fn builtin() -> Self {
        Self {
            groups: vec![social_group(), tech_group()],
        }
    }

    /// Catalogue from an explicit list of groups.
    pub fn from_groups(groups: Vec<PlatformGroup>) -> Self {
        Self { groups }
    }

    /// Merge user-defined groups into this catalogue.
    ///
    /// A custom group whose id matches an existing group replaces it in place;
    /// new groups are appended in alphabetical order.
    pub fn with_custom_groups(mut self, custom: HashMap<String, Vec<PlatformTemplate>>) -> Self {
        let mut custom: Vec<(String, Vec<PlatformTemplate>)> = custom
            .into_iter()
            .map(|(id, platforms)| (id.trim().to_lowercase(), platforms))
            .collect();
        custom.sort_by(|a, b| a.0.cmp(&b.0));

        for (id, platforms) in custom {
            let group = PlatformGroup {
                description: format!("Custom group ({} platforms)", platforms.len()),
                id: id.clone(),
                platforms,
            };
            match self.groups.iter_mut().find(|g| g.id == id) {
                Some(existing) => *existing = group,
                None => self.groups.push(group),
            }
        }

        self
    }

    /// Identifiers of every group, in catalogue order.
    pub fn group_ids(&self) -> Vec<String> {
        self.groups.iter().map(|g| g.id.clone()).collect()
    }

    /// All groups, in catalogue order.
    pub fn groups(&self) -> &[PlatformGroup] {
        &self.groups
    }

    /// Look up a group by id (case-insensitive).
    pub fn group(&self, id: &str) -> Option<&PlatformGroup> {
        let id = id.trim().to_lowercase();
        self.groups.iter().find(|g| g.id == id)
    }

    /// Build the ordered list of targets for `username` across the selected groups.
    ///
    /// # Errors
    ///
    /// - `InvalidUsername` if the username is empty
    /// - `NoPlatformSelected` if `groups` is empty
    /// - `UnknownPlatform` for the first group id the catalogue does not know
    pub fn build_targets<S: AsRef<str>>(
        &self,
        username: &str,
        groups: &[S],
    ) -> Result<Vec<ProbeTarget>, ProbeError> {
        if username.trim().is_empty() {
            return Err(ProbeError::invalid_username(
                username,
                "Username cannot be empty",
            ));
        }

        if groups.is_empty() {
            return Err(ProbeError::NoPlatformSelected);
        }

        // Resolve every id up front so an unknown id fails before anything is built.
        let mut selected: Vec<&PlatformGroup> = Vec::new();
        for id in groups {
            let id = id.as_ref();
            let group = self
                .group(id)
                .ok_or_else(|| ProbeError::unknown_platform(id, self.group_ids()))?;
            if !selected.iter().any(|g| g.id == group.id) {
                selected.push(group);
            }
        }

        let mut seen = HashSet::new();
        let targets = selected
            .into_iter()
            .flat_map(|group| group.platforms.iter())
            .map(|template| template.resolve(username))
            .filter(|target| seen.insert((target.name.clone(), target.url.clone())))
            .collect();

        Ok(targets)
    }
}

fn social_group() -> PlatformGroup {
    PlatformGroup {
        id: "social".to_string(),
        description: "Social networks and link-in-bio pages".to_string(),
        platforms: vec![
            PlatformTemplate::status_ok("LinkedIn", "https://www.linkedin.com/in/{username}"),
            PlatformTemplate::status_ok("Facebook", "https://www.facebook.com/{username}"),
            PlatformTemplate::status_ok("Instagram", "https://www.instagram.com/{username}"),
            PlatformTemplate::status_ok("Twitter", "https://twitter.com/{username}"),
            PlatformTemplate::status_ok("BioLink", "https://bio.link/{username}"),
        ],
    }
}

fn tech_group() -> PlatformGroup {
    PlatformGroup {
        id: "tech".to_string(),
        description: "Developer and competitive programming platforms".to_string(),
        platforms: vec![
            PlatformTemplate::status_ok("LeetCode", "https://leetcode.com/{username}"),
            PlatformTemplate::status_ok("GitHub", "https://github.com/{username}"),
            PlatformTemplate::status_ok("Codeforces", "https://codeforces.com/profile/{username}"),
            PlatformTemplate::status_ok("HackerEarth", "https://www.hackerearth.com/@{username}"),
            PlatformTemplate::status_ok("Codechef", "https://www.codechef.com/users/{username}"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_groups() {
        let catalogue = Catalogue::builtin();
        assert_eq!(catalogue.group_ids(), vec!["social", "tech"]);
        assert_eq!(catalogue.group("social").unwrap().platforms.len(), 5);
        assert_eq!(catalogue.group("tech").unwrap().platforms.len(), 5);
    }

    #[test]
    fn test_group_lookup_case_insensitive() {
        let catalogue = Catalogue::builtin();
        assert_eq!(catalogue.group("TECH"), catalogue.group("tech"));
        assert!(catalogue.group(" Social ").is_some());
        assert!(catalogue.group("gaming").is_none());
    }

    #[test]
    fn test_build_resolves_username() {
        let targets = Catalogue::builtin()
            .build_targets("alice", &["tech"])
            .unwrap();

        assert_eq!(targets.len(), 5);
        let github = targets.iter().find(|t| t.name == "GitHub").unwrap();
        assert_eq!(github.url, "https://github.com/alice");
        assert_eq!(github.rule, MatchRule::StatusEquals { status: 200 });
        assert!(targets.iter().all(|t| !t.url.contains(USERNAME_PLACEHOLDER)));
    }

    #[test]
    fn test_build_preserves_selection_order() {
        let targets = Catalogue::builtin()
            .build_targets("alice", &["tech", "social"])
            .unwrap();

        assert_eq!(targets.len(), 10);
        assert_eq!(targets[0].name, "LeetCode");
        assert_eq!(targets[5].name, "LinkedIn");
    }

    #[test]
    fn test_build_is_idempotent() {
        let catalogue = Catalogue::builtin();
        let first = catalogue.build_targets("alice", &["social", "tech"]).unwrap();
        let second = catalogue.build_targets("alice", &["social", "tech"]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_repeated_group_is_not_duplicated() {
        let targets = Catalogue::builtin()
            .build_targets("alice", &["tech", "TECH", "tech"])
            .unwrap();
        assert_eq!(targets.len(), 5);
    }

    #[test]
    fn test_empty_selection_fails() {
        let empty: [&str; 0] = [];
        let err = Catalogue::builtin().build_targets("alice", &empty).unwrap_err();
        assert!(matches!(err, ProbeError::NoPlatformSelected));
    }

    #[test]
    fn test_unknown_group_fails() {
        let err = Catalogue::builtin()
            .build_targets("alice", &["social", "gaming"])
            .unwrap_err();
        match err {
            ProbeError::UnknownPlatform { platform, known } => {
                assert_eq!(platform, "gaming");
                assert_eq!(known, vec!["social", "tech"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_username_fails() {
        let err = Catalogue::builtin().build_targets("", &["tech"]).unwrap_err();
        assert!(matches!(err, ProbeError::InvalidUsername { .. }));
    }

    #[test]
    fn test_custom_group_added_and_replacing() {
        let mut custom = HashMap::new();
        custom.insert(
            "Dev".to_string(),
            vec![PlatformTemplate::status_ok("GitLab", "https://gitlab.com/{username}")],
        );
        custom.insert(
            "tech".to_string(),
            vec![PlatformTemplate::status_ok("GitHub", "https://github.com/{username}")
                .with_rule(MatchRule::StatusInRange { min: 200, max: 299 })],
        );

        let catalogue = Catalogue::builtin().with_custom_groups(custom);
        assert_eq!(catalogue.group_ids(), vec!["social", "tech", "dev"]);

        let tech = catalogue.build_targets("bob", &["tech"]).unwrap();
        assert_eq!(tech.len(), 1);
        assert_eq!(tech[0].rule, MatchRule::StatusInRange { min: 200, max: 299 });

        let dev = catalogue.build_targets("bob", &["dev"]).unwrap();
        assert_eq!(dev[0].url, "https://gitlab.com/bob");
    }

    #[test]
    fn test_duplicate_platform_across_groups_emitted_once() {
        let mut custom = HashMap::new();
        custom.insert(
            "code".to_string(),
            vec![PlatformTemplate::status_ok("GitHub", "https://github.com/{username}")],
        );
        let catalogue = Catalogue::builtin().with_custom_groups(custom);

        let targets = catalogue.build_targets("alice", &["tech", "code"]).unwrap();
        assert_eq!(targets.iter().filter(|t| t.name == "GitHub").count(), 1);
    }
}
