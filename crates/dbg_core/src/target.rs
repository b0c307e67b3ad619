//! Target filters over build unit identities.
//!
//! Each field of a [`Target`] is either empty or `*` (match anything) or a
//! regular expression. Matching is case-sensitive and unanchored: `5.10`
//! matches `5.10.0-1160.el7.x86_64`. The distro field is passed through the
//! feed-to-backend translation table first, so `CentOS` filters on `centos`.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::distro;
use crate::error::{Error, Result};
use crate::identity::Identity;

pub const MATCH_ALL: &str = "*";

fn is_match_all(pattern: &str) -> bool {
    pattern.is_empty() || pattern == MATCH_ALL
}

/// What the user asked to operate on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    #[serde(default)]
    pub distro: String,
    #[serde(default)]
    pub kernel_release: String,
    #[serde(default)]
    pub kernel_version: String,
}

impl Target {
    pub fn new(
        distro: impl Into<String>,
        kernel_release: impl Into<String>,
        kernel_version: impl Into<String>,
    ) -> Self {
        Self {
            distro: distro.into(),
            kernel_release: kernel_release.into(),
            kernel_version: kernel_version.into(),
        }
    }

    /// True when every field names a concrete value, which selects
    /// single-target generation.
    pub fn is_set(&self) -> bool {
        !is_match_all(&self.distro)
            && !is_match_all(&self.kernel_release)
            && !is_match_all(&self.kernel_version)
    }

    /// True when no field filters anything.
    pub fn is_empty(&self) -> bool {
        is_match_all(&self.distro)
            && is_match_all(&self.kernel_release)
            && is_match_all(&self.kernel_version)
    }

    /// Distro in backend naming, or `None` if it matches anything.
    pub fn backend_distro(&self) -> Option<String> {
        if is_match_all(&self.distro) {
            None
        } else {
            Some(distro::to_backend_distro(&self.distro))
        }
    }

    /// Identity named by a fully set target, in backend naming.
    pub fn to_identity(&self) -> Option<Identity> {
        if !self.is_set() {
            return None;
        }
        Some(Identity::new(
            distro::to_backend_distro(&self.distro),
            &self.kernel_release,
            &self.kernel_version,
        ))
    }

    /// `{distro}_{kernelrelease}_{kernelversion}{suffix}` with every
    /// match-all field replaced by `*`.
    pub fn to_glob(&self, suffix: &str) -> String {
        let distro = self.backend_distro().unwrap_or_else(|| MATCH_ALL.to_string());
        let field = |value: &str| {
            if is_match_all(value) {
                MATCH_ALL.to_string()
            } else {
                value.to_string()
            }
        };
        format!(
            "{}_{}_{}{}",
            distro,
            field(&self.kernel_release),
            field(&self.kernel_version),
            suffix
        )
    }
}

/// A [`Target`] with its patterns compiled.
#[derive(Debug, Clone, Default)]
pub struct TargetFilter {
    distro: Option<Regex>,
    kernel_release: Option<Regex>,
    kernel_version: Option<Regex>,
}

impl TargetFilter {
    pub fn new(target: &Target) -> Result<Self> {
        let distro = match target.backend_distro() {
            Some(pattern) => Some(compile("distro", &pattern)?),
            None => None,
        };
        Ok(Self {
            distro,
            kernel_release: compile_field("kernelrelease", &target.kernel_release)?,
            kernel_version: compile_field("kernelversion", &target.kernel_version)?,
        })
    }

    /// Distro regex match restricted to the supported distro set.
    pub fn distro_filter(&self, candidate: &str) -> bool {
        field_matches(self.distro.as_ref(), candidate) && distro::is_supported(candidate)
    }

    pub fn kernel_release_filter(&self, candidate: &str) -> bool {
        field_matches(self.kernel_release.as_ref(), candidate)
    }

    pub fn kernel_version_filter(&self, candidate: &str) -> bool {
        field_matches(self.kernel_version.as_ref(), candidate)
    }

    /// Field-wise regex match of an identity, without the distro allow-list.
    pub fn matches(&self, identity: &Identity) -> bool {
        field_matches(self.distro.as_ref(), &identity.distro)
            && self.kernel_release_filter(&identity.kernel_release)
            && self.kernel_version_filter(&identity.kernel_version)
    }
}

/// Single-field predicate: empty or `*` always matches, anything else is an
/// unanchored regex. Invalid patterns never match.
pub fn matches(candidate: &str, pattern: &str) -> bool {
    if is_match_all(pattern) {
        return true;
    }
    Regex::new(pattern)
        .map(|re| re.is_match(candidate))
        .unwrap_or(false)
}

fn field_matches(re: Option<&Regex>, candidate: &str) -> bool {
    re.map_or(true, |re| re.is_match(candidate))
}

fn compile_field(field: &'static str, pattern: &str) -> Result<Option<Regex>> {
    if is_match_all(pattern) {
        return Ok(None);
    }
    compile(field, pattern).map(Some)
}

fn compile(field: &'static str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| Error::InvalidPattern {
        field,
        pattern: pattern.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_target_matches_everything() {
        let filter = TargetFilter::new(&Target::default()).unwrap();
        for id in [
            Identity::new("centos", "5.10.0", "1"),
            Identity::new("flatcar", "6.1.0", "#1 SMP"),
            Identity::new("", "", ""),
        ] {
            assert!(filter.matches(&id));
        }
    }

    #[test]
    fn test_star_matches_everything() {
        let target = Target::new("*", "*", "*");
        assert!(target.is_empty());
        assert!(!target.is_set());
        let filter = TargetFilter::new(&target).unwrap();
        assert!(filter.matches(&Identity::new("ubuntu", "6.2.0-1", "12")));
    }

    #[test]
    fn test_is_set() {
        assert!(Target::new("centos", "5.10.0", "1").is_set());
        assert!(!Target::new("centos", "5.10.0", "").is_set());
        assert!(!Target::new("centos", "*", "1").is_set());
    }

    #[test]
    fn test_regex_substring_semantics() {
        let filter = TargetFilter::new(&Target::new("", "5.10", "")).unwrap();
        assert!(filter.kernel_release_filter("5.10.0-1160.el7.x86_64"));
        assert!(filter.kernel_release_filter("4.5.10"));
        assert!(!filter.kernel_release_filter("4.18.0"));

        let anchored = TargetFilter::new(&Target::new("", "^5\\.10\\.0$", "")).unwrap();
        assert!(anchored.kernel_release_filter("5.10.0"));
        assert!(!anchored.kernel_release_filter("5.10.0-1"));
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let filter = TargetFilter::new(&Target::new("", "EL7", "")).unwrap();
        assert!(!filter.kernel_release_filter("3.10.0.el7.x86_64"));
    }

    #[test]
    fn test_feed_distro_name_is_translated() {
        let filter = TargetFilter::new(&Target::new("CentOS", "", "")).unwrap();
        assert!(filter.distro_filter("centos"));
        assert!(filter.matches(&Identity::new("centos", "5.10.0", "1")));
    }

    #[test]
    fn test_case_sensitive_escapes_survive_translation() {
        let filter = TargetFilter::new(&Target::new(r"^\D+$", "", "")).unwrap();
        assert!(filter.distro_filter("centos"));
        assert!(!filter.matches(&Identity::new("123", "1", "1")));
    }

    #[test]
    fn test_distro_allow_list() {
        let filter = TargetFilter::new(&Target::new(".*", "", "")).unwrap();
        assert!(filter.distro_filter("ubuntu"));
        assert!(!filter.distro_filter("flatcar"));
        // The plain identity match does not consult the allow-list.
        assert!(filter.matches(&Identity::new("flatcar", "1", "1")));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = TargetFilter::new(&Target::new("", "5.10(", "")).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidPattern { field: "kernelrelease", .. }
        ));
    }

    #[test]
    fn test_to_glob() {
        assert_eq!(Target::default().to_glob(".yaml"), "*_*_*.yaml");
        assert_eq!(
            Target::new("CentOS", "5.10.0", "").to_glob(".yaml"),
            "centos_5.10.0_*.yaml"
        );
        assert_eq!(
            Target::new("", "*", "1").to_glob(".ko"),
            "*_*_1.ko"
        );
    }

    #[test]
    fn test_single_field_predicate() {
        assert!(matches("anything", ""));
        assert!(matches("anything", "*"));
        assert!(matches("centos", "cent"));
        assert!(!matches("centos", "CentOS"));
        assert!(!matches("centos", "("));
    }

    #[test]
    fn test_to_identity() {
        assert_eq!(
            Target::new("AmazonLinux2", "4.14.0", "1").to_identity(),
            Some(Identity::new("amazonlinux2", "4.14.0", "1"))
        );
        assert_eq!(Target::new("centos", "", "1").to_identity(), None);
    }
}
