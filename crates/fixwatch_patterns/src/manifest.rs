//! Read-only view of the project's declared dependencies (`package.json`).

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::{PatternError, PatternResult};

/// Manifest file name at the project root.
pub const MANIFEST_FILE: &str = "package.json";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Manifest {
    #[serde(default)]
    dependencies: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    dev_dependencies: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    peer_dependencies: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    optional_dependencies: serde_json::Map<String, serde_json::Value>,
}

/// The set of package names a project declares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet {
    names: BTreeSet<String>,
}

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the manifest under `root`. Returns `Ok(None)` when there is none.
    pub fn load(root: &Path) -> PatternResult<Option<Self>> {
        let path = root.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        Self::parse(&content)
            .map(Some)
            .map_err(|e| PatternError::InvalidManifest {
                path: path.display().to_string(),
                message: e.to_string(),
            })
    }

    /// Parse manifest JSON text.
    pub fn parse(content: &str) -> PatternResult<Self> {
        let manifest: Manifest = serde_json::from_str(content)?;
        let names = manifest
            .dependencies
            .into_iter()
            .chain(manifest.dev_dependencies)
            .chain(manifest.peer_dependencies)
            .chain(manifest.optional_dependencies)
            .map(|(name, _)| name)
            .collect();
        Ok(Self { names })
    }

    pub fn with(mut self, name: impl Into<String>) -> Self {
        self.names.insert(name.into());
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Installable package name for a bare module specifier.
///
/// `lodash/fp` -> `lodash`, `@scope/pkg/sub` -> `@scope/pkg`.
pub fn package_name(specifier: &str) -> Option<String> {
    let mut parts = specifier.split('/').filter(|p| !p.is_empty());
    let first = parts.next()?;
    if let Some(scope) = first.strip_prefix('@') {
        if scope.is_empty() {
            return None;
        }
        let name = parts.next()?;
        return Some(format!("{}/{}", first, name));
    }
    Some(first.to_string())
}

/// Whether a specifier points into the project rather than a package.
pub fn is_local_specifier(specifier: &str, local_prefixes: &[String]) -> bool {
    specifier.starts_with('.')
        || specifier.starts_with('/')
        || specifier.starts_with("~/")
        || specifier.starts_with("@/")
        || local_prefixes.iter().any(|p| specifier.starts_with(p.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_all_sections() {
        let deps = DependencySet::parse(
            r#"{
                "name": "estate-admin",
                "dependencies": { "next": "15.1.0", "react": "^19" },
                "devDependencies": { "typescript": "^5" },
                "peerDependencies": { "react-dom": "^19" }
            }"#,
        )
        .unwrap();

        assert_eq!(deps.len(), 4);
        assert!(deps.contains("next"));
        assert!(deps.contains("typescript"));
        assert!(!deps.contains("left-pad"));
    }

    #[test]
    fn test_load_missing_manifest() {
        let temp = tempdir().unwrap();
        assert!(DependencySet::load(temp.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_invalid_manifest() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join(MANIFEST_FILE), "{ not json").unwrap();
        assert!(matches!(
            DependencySet::load(temp.path()),
            Err(PatternError::InvalidManifest { .. })
        ));
    }

    #[test]
    fn test_package_name() {
        assert_eq!(package_name("left-pad"), Some("left-pad".into()));
        assert_eq!(package_name("lodash/fp"), Some("lodash".into()));
        assert_eq!(package_name("@radix-ui/react-dialog/dist"), Some("@radix-ui/react-dialog".into()));
        assert_eq!(package_name("@scope"), None);
        assert_eq!(package_name(""), None);
    }

    #[test]
    fn test_local_specifiers() {
        let prefixes = vec!["#internal/".to_string()];
        assert!(is_local_specifier("./utils", &prefixes));
        assert!(is_local_specifier("../lib/format", &prefixes));
        assert!(is_local_specifier("@/components/ui/button", &prefixes));
        assert!(is_local_specifier("#internal/db", &prefixes));
        assert!(!is_local_specifier("@tanstack/react-table", &prefixes));
        assert!(!is_local_specifier("zod", &prefixes));
    }
}
