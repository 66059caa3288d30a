//! Install-time resolution of a manifest against a target environment
//!
//! Mirrors what a package installer checks before placing the scripts:
//! the runtime requirement, which conditional requirements apply, and
//! whether each applicable requirement is met by an available package.

use tracing::debug;

use super::PackageManifest;
use crate::error::Result;
use crate::error::install::{conflict, missing, pinned_source_mismatch, runtime_unsupported};
use crate::requirement::{MarkerEnvironment, Requirement, normalize_name};
use crate::version::Version;

/// A package the installer could use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailablePackage {
    pub name: String,
    pub version: Version,
    /// Artifact URL the package was built from, for direct-URL pins
    pub source_url: Option<String>,
}

impl AvailablePackage {
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
            source_url: None,
        }
    }

    pub fn from_url(name: impl Into<String>, version: Version, url: impl Into<String>) -> Self {
        Self {
            source_url: Some(url.into()),
            ..Self::new(name, version)
        }
    }
}

/// A requirement matched to the package that satisfies it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
    pub requirement: Requirement,
    pub package: AvailablePackage,
}

/// Outcome of resolving a manifest, in manifest order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPlan {
    pub resolved: Vec<ResolvedDependency>,
    /// Requirements whose marker excludes the target environment
    pub skipped: Vec<Requirement>,
}

impl InstallPlan {
    /// Resolve every requirement of `manifest` for `target`
    pub fn resolve(
        manifest: &PackageManifest,
        target: &MarkerEnvironment,
        available: &[AvailablePackage],
    ) -> Result<Self> {
        check_runtime(manifest, target)?;

        let mut plan = Self {
            resolved: Vec::new(),
            skipped: Vec::new(),
        };

        for requirement in &manifest.install_requires {
            if !requirement.applies_to(target) {
                debug!(requirement = %requirement, "skipping requirement for target");
                plan.skipped.push(requirement.clone());
                continue;
            }

            let package = match_requirement(requirement, available)?;
            debug!(
                requirement = %requirement,
                version = %package.version,
                "resolved requirement"
            );
            plan.resolved.push(ResolvedDependency {
                requirement: requirement.clone(),
                package: package.clone(),
            });
        }

        Ok(plan)
    }

    pub fn is_skipped(&self, name: &str) -> bool {
        let wanted = normalize_name(name);
        self.skipped
            .iter()
            .any(|requirement| requirement.normalized_name() == wanted)
    }

    pub fn resolved(&self, name: &str) -> Option<&ResolvedDependency> {
        let wanted = normalize_name(name);
        self.resolved
            .iter()
            .find(|dep| dep.requirement.normalized_name() == wanted)
    }
}

fn check_runtime(manifest: &PackageManifest, target: &MarkerEnvironment) -> Result<()> {
    if manifest.python_requires.is_empty() {
        return Ok(());
    }
    let runtime_text = if target.python_full_version.is_empty() {
        &target.python_version
    } else {
        &target.python_full_version
    };
    let runtime = Version::parse(runtime_text)
        .map_err(|_| runtime_unsupported(runtime_text, manifest.python_requires.to_string()))?;
    if manifest.python_requires.allows(&runtime, true) {
        Ok(())
    } else {
        Err(runtime_unsupported(
            runtime_text,
            manifest.python_requires.to_string(),
        ))
    }
}

fn match_requirement<'a>(
    requirement: &Requirement,
    available: &'a [AvailablePackage],
) -> Result<&'a AvailablePackage> {
    let wanted = requirement.normalized_name();
    let candidates: Vec<&AvailablePackage> = available
        .iter()
        .filter(|package| normalize_name(&package.name) == wanted)
        .collect();
    if candidates.is_empty() {
        return Err(missing(requirement.to_string()));
    }

    if let Some(pin) = requirement.direct_url() {
        return candidates
            .iter()
            .find(|package| {
                package
                    .source_url
                    .as_deref()
                    .is_some_and(|url| strip_fragment(url) == pin.url)
            })
            .copied()
            .ok_or_else(|| {
                let found = candidates
                    .iter()
                    .map(|package| package.source_url.as_deref().unwrap_or("a package index"))
                    .collect::<Vec<_>>()
                    .join(", ");
                pinned_source_mismatch(&requirement.name, &pin.url, found)
            });
    }

    // Highest acceptable version wins.
    let best = candidates
        .iter()
        .filter(|package| requirement.is_satisfied_by(&package.version))
        .max_by(|a, b| a.version.cmp(&b.version))
        .copied();
    best.ok_or_else(|| {
        let found = candidates
            .iter()
            .map(|package| package.version.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        conflict(&requirement.name, found, requirement.to_string())
    })
}

fn strip_fragment(url: &str) -> &str {
    url.split_once('#').map_or(url, |(base, _)| base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TsdError;

    const FORK_URL: &str =
        "https://github.com/unioslo/s3cmd/archive/v2.1.0-custom-headers.tar.gz";

    fn v(input: &str) -> Version {
        Version::parse(input).unwrap()
    }

    fn available(client: &str) -> Vec<AvailablePackage> {
        vec![
            AvailablePackage::new("tsd-api-client", v(client)),
            AvailablePackage::from_url("s3cmd", v("2.1.0"), FORK_URL),
            AvailablePackage::new("importlib_metadata", v("4.8.3")),
        ]
    }

    fn manifest() -> PackageManifest {
        PackageManifest::current().unwrap()
    }

    #[test]
    fn test_backport_installed_only_below_3_8() {
        let plan = InstallPlan::resolve(
            &manifest(),
            &MarkerEnvironment::python("3.7.12"),
            &available("3.4.3"),
        )
        .unwrap();
        assert!(plan.resolved("importlib-metadata").is_some());
        assert!(plan.skipped.is_empty());

        let plan = InstallPlan::resolve(
            &manifest(),
            &MarkerEnvironment::python("3.8.0"),
            &available("3.4.3"),
        )
        .unwrap();
        assert!(plan.resolved("importlib-metadata").is_none());
        assert!(plan.is_skipped("importlib-metadata"));
    }

    #[test]
    fn test_resolution_keeps_manifest_order() {
        let plan = InstallPlan::resolve(
            &manifest(),
            &MarkerEnvironment::python("3.6.15"),
            &available("3.5.0"),
        )
        .unwrap();
        let names: Vec<&str> = plan
            .resolved
            .iter()
            .map(|dep| dep.requirement.name.as_str())
            .collect();
        assert_eq!(names, vec!["tsd-api-client", "s3cmd", "importlib-metadata"]);
    }

    #[test]
    fn test_too_old_client_is_a_conflict() {
        let err = InstallPlan::resolve(
            &manifest(),
            &MarkerEnvironment::python("3.9.1"),
            &available("3.4.2"),
        )
        .unwrap_err();
        assert!(matches!(err, TsdError::DependencyConflict { .. }));
        assert!(err.to_string().contains("3.4.2"));
    }

    #[test]
    fn test_highest_satisfying_version_is_chosen() {
        let mut packages = available("3.4.2");
        packages.push(AvailablePackage::new("tsd-api-client", v("3.6.1")));
        packages.push(AvailablePackage::new("tsd-api-client", v("3.5.0")));
        let plan =
            InstallPlan::resolve(&manifest(), &MarkerEnvironment::python("3.9.1"), &packages)
                .unwrap();
        assert_eq!(
            plan.resolved("tsd-api-client").unwrap().package.version,
            v("3.6.1")
        );
    }

    #[test]
    fn test_runtime_below_minimum_is_rejected() {
        let err = InstallPlan::resolve(
            &manifest(),
            &MarkerEnvironment::python("3.5.9"),
            &available("3.4.3"),
        )
        .unwrap_err();
        assert!(matches!(err, TsdError::RuntimeUnsupported { .. }));
    }

    #[test]
    fn test_runtime_falls_back_to_short_python_version() {
        let mut target = MarkerEnvironment::python("3.7");
        target.python_full_version = String::new();
        let plan = InstallPlan::resolve(&manifest(), &target, &available("3.4.3")).unwrap();
        assert!(plan.resolved("importlib-metadata").is_some());

        target.python_version = "3.5".to_string();
        let err = InstallPlan::resolve(&manifest(), &target, &available("3.4.3")).unwrap_err();
        assert!(matches!(err, TsdError::RuntimeUnsupported { .. }));
        assert!(err.to_string().contains("Runtime 3.5"));
    }

    #[test]
    fn test_unparsable_runtime_is_rejected() {
        let err = InstallPlan::resolve(
            &manifest(),
            &MarkerEnvironment::python("cpython-dev"),
            &available("3.4.3"),
        )
        .unwrap_err();
        assert!(matches!(err, TsdError::RuntimeUnsupported { .. }));
        assert!(err.to_string().contains("cpython-dev"));
    }

    #[test]
    fn test_missing_dependency() {
        let packages = vec![AvailablePackage::new("tsd-api-client", v("3.4.3"))];
        let err =
            InstallPlan::resolve(&manifest(), &MarkerEnvironment::python("3.9.1"), &packages)
                .unwrap_err();
        assert!(matches!(err, TsdError::DependencyMissing { .. }));
        assert!(err.to_string().contains("s3cmd"));
    }

    #[test]
    fn test_fork_from_registry_is_a_pin_mismatch() {
        let packages = vec![
            AvailablePackage::new("tsd-api-client", v("3.4.3")),
            AvailablePackage::new("s3cmd", v("2.1.0")),
        ];
        let err =
            InstallPlan::resolve(&manifest(), &MarkerEnvironment::python("3.9.1"), &packages)
                .unwrap_err();
        assert!(matches!(err, TsdError::PinnedSourceMismatch { .. }));
        assert!(err.to_string().contains("a package index"));
    }

    #[test]
    fn test_fork_url_fragment_is_ignored_when_matching() {
        let packages = vec![
            AvailablePackage::new("tsd-api-client", v("3.4.3")),
            AvailablePackage::from_url(
                "s3cmd",
                v("2.1.0"),
                format!("{FORK_URL}#egg=s3cmd-2.1.0-custom-headers"),
            ),
        ];
        let plan =
            InstallPlan::resolve(&manifest(), &MarkerEnvironment::python("3.10.0"), &packages)
                .unwrap();
        assert!(plan.resolved("s3cmd").is_some());
    }
}
