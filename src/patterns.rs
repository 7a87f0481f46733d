//! Static deny-list loading and placeholder expansion from denylist.toml.

use crate::platform::PlatformIdentifiers;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Replaced with the host's GOOS value during expansion.
pub const OS_PLACEHOLDER: &str = "{os}";
/// Replaced with the host's GOARCH value during expansion.
pub const ARCH_PLACEHOLDER: &str = "{arch}";

// Embed the TOML file directly in the binary at compile time
const DENYLIST_TOML: &str = include_str!("../denylist.toml");

/// A path template relative to the tree root, `/`-separated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct RemovalPattern(String);

impl RemovalPattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substitute every placeholder with the platform's identifiers.
    pub fn expand(&self, platform: &PlatformIdentifiers) -> String {
        self.0
            .replace(OS_PLACEHOLDER, &platform.os)
            .replace(ARCH_PLACEHOLDER, &platform.arch)
    }

    /// Expand the pattern and join it onto `root` one segment at a time, so the
    /// result uses the native separator.
    pub fn resolve(&self, root: &Path, platform: &PlatformIdentifiers) -> PathBuf {
        let expanded = self.expand(platform);
        let mut path = root.to_path_buf();
        for segment in expanded.split('/').filter(|s| !s.is_empty() && *s != ".") {
            path.push(segment);
        }
        path
    }

    fn validate(&self) -> Result<()> {
        let pattern = self.0.as_str();
        if pattern.starts_with('/') || pattern.starts_with('\\') || pattern.contains(':') {
            bail!("pattern '{}' must be relative to the tree root", pattern);
        }
        let mut segments = pattern.split('/').filter(|s| !s.is_empty() && *s != ".");
        if segments.clone().any(|s| s == "..") {
            bail!("pattern '{}' must not leave the tree root", pattern);
        }
        if segments.next().is_none() {
            bail!("pattern '{}' names the tree root itself", pattern);
        }
        Ok(())
    }
}

/// A named run of patterns sharing the same ownership.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternGroup {
    pub name: String,
    pub patterns: Vec<RemovalPattern>,
    /// The group may be preserved with `--keep`.
    #[serde(default)]
    pub optional: bool,
    /// Nobody is sure the group belongs on the list. Removed unless kept.
    #[serde(default)]
    pub uncertain: bool,
}

impl PatternGroup {
    pub fn can_keep(&self) -> bool {
        self.optional || self.uncertain
    }
}

/// Where and what the dynamic test-artifact scan looks for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanRules {
    /// Scan root, relative to the tree root.
    pub root: String,
    /// Directory name marking test data.
    pub marker: String,
    /// File name suffix marking test sources.
    pub suffix: String,
}

impl Default for ScanRules {
    fn default() -> Self {
        Self {
            root: "src".to_string(),
            marker: "testdata".to_string(),
            suffix: "_test.go".to_string(),
        }
    }
}

/// The static deny-list plus scan rules, in removal order.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DenyList {
    #[serde(default)]
    pub scan: ScanRules,
    #[serde(rename = "group", default)]
    pub groups: Vec<PatternGroup>,
}

impl DenyList {
    /// Parse and validate a deny-list from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let list: DenyList = toml::from_str(content).context("Failed to parse deny-list TOML")?;
        list.validate()?;
        Ok(list)
    }

    /// The deny-list compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_toml_str(DENYLIST_TOML).context("Embedded deny-list is invalid")
    }

    /// Load an override file, or fall back to the embedded list.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .with_context(|| format!("reading deny-list {}", path.display()))?;
                Self::from_toml_str(&content)
                    .with_context(|| format!("loading deny-list {}", path.display()))
            }
            None => Self::embedded(),
        }
    }

    pub fn group(&self, name: &str) -> Option<&PatternGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Reject `--keep` names that don't exist or can't be kept.
    pub fn check_keep(&self, keep: &[String]) -> Result<()> {
        for name in keep {
            match self.group(name) {
                Some(group) if group.can_keep() => {}
                Some(_) => bail!("group '{}' is always removed and cannot be kept", name),
                None => {
                    let keepable: Vec<&str> = self
                        .groups
                        .iter()
                        .filter(|g| g.can_keep())
                        .map(|g| g.name.as_str())
                        .collect();
                    bail!(
                        "unknown group '{}' (keepable groups: {})",
                        name,
                        keepable.join(", ")
                    );
                }
            }
        }
        Ok(())
    }

    /// Groups that will be removed, in order, given the kept group names.
    pub fn active_groups<'a>(
        &'a self,
        keep: &'a [String],
    ) -> impl Iterator<Item = &'a PatternGroup> + 'a {
        self.groups
            .iter()
            .filter(move |g| !(g.can_keep() && keep.iter().any(|k| *k == g.name)))
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for group in &self.groups {
            if !seen.insert(group.name.as_str()) {
                bail!("group '{}' is defined more than once", group.name);
            }
            for pattern in &group.patterns {
                pattern
                    .validate()
                    .with_context(|| format!("in group '{}'", group.name))?;
            }
        }
        if self.scan.marker.is_empty() || self.scan.suffix.is_empty() {
            bail!("scan marker and suffix must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linux_amd64() -> PlatformIdentifiers {
        PlatformIdentifiers::new("linux", "amd64")
    }

    #[test]
    fn test_expand_replaces_every_placeholder() {
        let pattern = RemovalPattern::new("pkg/{os}_{arch}/cmd/{os}");
        let expanded = pattern.expand(&linux_amd64());
        assert_eq!(expanded, "pkg/linux_amd64/cmd/linux");
        assert!(!expanded.contains(OS_PLACEHOLDER));
        assert!(!expanded.contains(ARCH_PLACEHOLDER));
    }

    #[test]
    fn test_expand_without_placeholders_is_noop() {
        let pattern = RemovalPattern::new("src/cmd/yacc");
        assert_eq!(pattern.expand(&linux_amd64()), "src/cmd/yacc");
    }

    #[test]
    fn test_expand_keeps_literal_segments() {
        let pattern = RemovalPattern::new("pkg/tool/{os}_{arch}/objdump");
        let platform = PlatformIdentifiers::new("windows", "386");
        let expanded = pattern.expand(&platform);
        assert!(expanded.starts_with("pkg/tool/"));
        assert!(expanded.ends_with("/objdump"));
        assert_eq!(
            expanded.len(),
            pattern.as_str().len() - OS_PLACEHOLDER.len() - ARCH_PLACEHOLDER.len()
                + platform.os.len()
                + platform.arch.len()
        );
    }

    #[test]
    fn test_resolve_joins_under_root() {
        let root = Path::new("/tmp/go");
        let pattern = RemovalPattern::new("pkg/tool/{os}_{arch}/dist");
        let resolved = pattern.resolve(root, &linux_amd64());
        assert_eq!(
            resolved,
            root.join("pkg").join("tool").join("linux_amd64").join("dist")
        );
    }

    #[test]
    fn test_embedded_denylist_loads() {
        let list = DenyList::embedded().unwrap();
        assert_eq!(list.scan, ScanRules::default());

        let patterns: Vec<&str> = list
            .groups
            .iter()
            .flat_map(|g| g.patterns.iter().map(|p| p.as_str()))
            .collect();
        assert_eq!(patterns.first(), Some(&".git"));
        assert!(patterns.contains(&"pkg/tool/{os}_{arch}/dist"));
        assert!(patterns.contains(&"src/run.bash"));
        assert!(patterns.contains(&"doc"));

        let pack = list.group("pack").unwrap();
        assert!(pack.uncertain);
        for name in ["pprof", "gofmt", "doc"] {
            assert!(list.group(name).unwrap().optional, "{name} should be optional");
        }
    }

    #[test]
    fn test_keep_skips_optional_groups() {
        let list = DenyList::embedded().unwrap();
        let keep = vec!["doc".to_string(), "pack".to_string()];
        list.check_keep(&keep).unwrap();

        let names: Vec<&str> = list.active_groups(&keep).map(|g| g.name.as_str()).collect();
        assert!(!names.contains(&"doc"));
        assert!(!names.contains(&"pack"));
        assert!(names.contains(&"pprof"));
        assert!(names.contains(&"repository"));
    }

    #[test]
    fn test_keep_rejects_unknown_and_mandatory_groups() {
        let list = DenyList::embedded().unwrap();

        let err = list.check_keep(&["nope".to_string()]).unwrap_err();
        assert!(err.to_string().contains("unknown group 'nope'"));

        let err = list.check_keep(&["repository".to_string()]).unwrap_err();
        assert!(err.to_string().contains("cannot be kept"));
    }

    #[test]
    fn test_scan_rules_default_when_omitted() {
        let list = DenyList::from_toml_str(
            r#"
            [[group]]
            name = "docs"
            patterns = ["doc"]
            "#,
        )
        .unwrap();
        assert_eq!(list.scan.root, "src");
        assert_eq!(list.groups.len(), 1);
    }

    #[test]
    fn test_rejects_patterns_escaping_root() {
        for bad in ["/etc", "../sibling", "src/../..", ".", ""] {
            let toml = format!("[[group]]\nname = \"bad\"\npatterns = [\"{bad}\"]\n");
            assert!(
                DenyList::from_toml_str(&toml).is_err(),
                "pattern {bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_duplicate_groups_and_unknown_keys() {
        let dup = "[[group]]\nname = \"a\"\npatterns = []\n[[group]]\nname = \"a\"\npatterns = []\n";
        assert!(DenyList::from_toml_str(dup).is_err());

        let typo = "[[group]]\nname = \"a\"\npaterns = [\"doc\"]\n";
        assert!(DenyList::from_toml_str(typo).is_err());
    }
}
