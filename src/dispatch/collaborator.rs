//! Finding the program an entry point forwards to

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::UserConfig;
use crate::error::Result;
use crate::error::dispatch::{not_executable, not_found};
use crate::manifest::PackageManifest;

/// The external program behind one entry point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collaborator {
    /// Entry point name, e.g. `tsd-s3cmd`
    pub entry_point: String,
    /// Default program name, e.g. `s3cmd`
    pub program: String,
    /// Requirement that installs the program, as declared
    pub provided_by: String,
    /// Environment variable overriding the program
    pub env_var: String,
}

impl Collaborator {
    /// Collaborator for a script declared in the manifest
    pub fn for_script(manifest: &PackageManifest, script_name: &str) -> Result<Self> {
        let script = manifest.script(script_name).ok_or_else(|| {
            crate::error::manifest::invalid(format!(
                "'{script_name}' is not an entry point of {}",
                manifest.name
            ))
        })?;
        let provided_by = manifest
            .requirement(&script.provided_by)
            .map_or_else(|| script.provided_by.clone(), ToString::to_string);

        Ok(Self {
            entry_point: script.name.clone(),
            program: script.program.clone(),
            provided_by,
            env_var: override_var(&script.program),
        })
    }

    fn install_hint(&self) -> String {
        format!(
            "Install {} or set {} to the {} executable",
            self.provided_by, self.env_var, self.program
        )
    }
}

/// `TSD_S3CMD_<PROGRAM>` with the program name upper-cased
pub fn override_var(program: &str) -> String {
    let suffix: String = program
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("TSD_S3CMD_{suffix}")
}

/// Where the program location came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSource {
    Environment,
    Config,
    Default,
}

impl fmt::Display for LookupSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LookupSource::Environment => "environment",
            LookupSource::Config => "config file",
            LookupSource::Default => "default",
        })
    }
}

/// A program resolved to an executable file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub path: PathBuf,
    pub source: LookupSource,
}

/// Inputs for resolving a collaborator, captured from the process
#[derive(Debug, Clone, Default)]
pub struct Lookup {
    pub env_override: Option<OsString>,
    pub config_override: Option<String>,
    pub search_path: Option<OsString>,
}

impl Lookup {
    /// Capture overrides from the environment and config for a collaborator
    pub fn from_process(collaborator: &Collaborator, config: &UserConfig) -> Self {
        Self {
            env_override: std::env::var_os(&collaborator.env_var),
            config_override: config.program(&collaborator.program).map(str::to_string),
            search_path: std::env::var_os("PATH"),
        }
    }

    /// Resolve the collaborator to an executable
    ///
    /// An explicit override (environment, then config) replaces the default
    /// program name entirely; it is never silently skipped when invalid.
    pub fn locate(&self, collaborator: &Collaborator) -> Result<Located> {
        let (program, source) = match (&self.env_override, &self.config_override) {
            (Some(value), _) if !value.is_empty() => (value.clone(), LookupSource::Environment),
            (_, Some(value)) => (OsString::from(value), LookupSource::Config),
            _ => (OsString::from(&collaborator.program), LookupSource::Default),
        };

        let path = if has_path_separator(&program) {
            let path = PathBuf::from(&program);
            if !path.exists() {
                return Err(not_found(
                    &collaborator.entry_point,
                    path.display().to_string(),
                    collaborator.install_hint(),
                ));
            }
            if !is_executable(&path) {
                return Err(not_executable(
                    &collaborator.entry_point,
                    path.display().to_string(),
                    &collaborator.env_var,
                ));
            }
            path
        } else {
            self.search(&program).ok_or_else(|| {
                not_found(
                    &collaborator.entry_point,
                    program.to_string_lossy(),
                    collaborator.install_hint(),
                )
            })?
        };

        debug!(
            entry_point = %collaborator.entry_point,
            path = %path.display(),
            source = %source,
            "located collaborator"
        );
        Ok(Located { path, source })
    }

    /// First executable named `program` on the search path
    fn search(&self, program: &OsStr) -> Option<PathBuf> {
        let search_path = self.search_path.as_ref()?;
        std::env::split_paths(search_path)
            .filter(|dir| !dir.as_os_str().is_empty())
            .flat_map(|dir| candidates(&dir, program))
            .find(|candidate| is_executable(candidate))
    }
}

fn has_path_separator(program: &OsStr) -> bool {
    Path::new(program).components().count() > 1
}

/// Extensions Windows tries when none is given
#[cfg(any(windows, test))]
const DEFAULT_PATHEXT: &str = ".COM;.EXE;.BAT;.CMD";

/// Files in `dir` that `program` may refer to, given a `PATHEXT` value
///
/// A name that already carries one of the extensions is used as is;
/// otherwise each extension is appended in order.
#[cfg(any(windows, test))]
fn candidates_with_extensions(dir: &Path, program: &OsStr, pathext: &str) -> Vec<PathBuf> {
    let plain = dir.join(program);
    let extensions: Vec<&str> = pathext.split(';').filter(|ext| !ext.is_empty()).collect();
    let has_extension = Path::new(program)
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|known| known.trim_start_matches('.').eq_ignore_ascii_case(ext))
        });
    if has_extension {
        return vec![plain];
    }
    extensions
        .into_iter()
        .map(|ext| {
            let mut candidate = plain.clone().into_os_string();
            candidate.push(ext);
            PathBuf::from(candidate)
        })
        .collect()
}

#[cfg(windows)]
fn candidates(dir: &Path, program: &OsStr) -> Vec<PathBuf> {
    let pathext = std::env::var("PATHEXT").unwrap_or_else(|_| DEFAULT_PATHEXT.to_string());
    candidates_with_extensions(dir, program, &pathext)
}

#[cfg(not(windows))]
fn candidates(dir: &Path, program: &OsStr) -> Vec<PathBuf> {
    vec![dir.join(program)]
}

/// A regular file the current user may execute
#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use nix::unistd::{AccessFlags, access};

    path.is_file() && access(path, AccessFlags::X_OK).is_ok()
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TsdError;
    use tempfile::TempDir;

    fn collaborator() -> Collaborator {
        Collaborator::for_script(&PackageManifest::current().unwrap(), "tsd-s3cmd").unwrap()
    }

    #[cfg(unix)]
    fn write_program(dir: &Path, name: &str, mode: u32) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    #[test]
    fn test_collaborators_from_manifest() {
        let manifest = PackageManifest::current().unwrap();
        let s3cmd = Collaborator::for_script(&manifest, "tsd-s3cmd").unwrap();
        assert_eq!(s3cmd.program, "s3cmd");
        assert_eq!(s3cmd.env_var, "TSD_S3CMD_S3CMD");
        assert!(s3cmd.provided_by.contains("v2.1.0-custom-headers"));

        let tacl = Collaborator::for_script(&manifest, "tacl_auth").unwrap();
        assert_eq!(tacl.program, "tacl");
        assert_eq!(tacl.env_var, "TSD_S3CMD_TACL");
        assert_eq!(tacl.provided_by, "tsd-api-client>=3.4.3");

        assert!(Collaborator::for_script(&manifest, "s3cmd").is_err());
    }

    #[test]
    fn test_override_var_sanitizes_program_name() {
        assert_eq!(override_var("s3cmd-custom.py"), "TSD_S3CMD_S3CMD_CUSTOM_PY");
    }

    #[cfg(unix)]
    #[test]
    fn test_searches_path_in_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        write_program(first.path(), "s3cmd", 0o644);
        let expected = write_program(second.path(), "s3cmd", 0o755);

        let lookup = Lookup {
            search_path: Some(std::env::join_paths([first.path(), second.path()]).unwrap()),
            ..Lookup::default()
        };
        let located = lookup.locate(&collaborator()).unwrap();
        assert_eq!(located.path, expected);
        assert_eq!(located.source, LookupSource::Default);
    }

    #[test]
    fn test_missing_program_is_not_found() {
        let empty = TempDir::new().unwrap();
        let lookup = Lookup {
            search_path: Some(empty.path().as_os_str().to_os_string()),
            ..Lookup::default()
        };
        let err = lookup.locate(&collaborator()).unwrap_err();
        assert!(matches!(err, TsdError::CollaboratorNotFound { .. }));
        assert!(err.to_string().contains("'s3cmd'"));
    }

    #[test]
    fn test_no_search_path_is_not_found() {
        let err = Lookup::default().locate(&collaborator()).unwrap_err();
        assert!(matches!(err, TsdError::CollaboratorNotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_environment_override_beats_config() {
        let temp = TempDir::new().unwrap();
        let from_env = write_program(temp.path(), "env-s3cmd", 0o755);
        let from_config = write_program(temp.path(), "config-s3cmd", 0o755);

        let lookup = Lookup {
            env_override: Some(from_env.clone().into_os_string()),
            config_override: Some(from_config.display().to_string()),
            search_path: None,
        };
        let located = lookup.locate(&collaborator()).unwrap();
        assert_eq!(located.path, from_env);
        assert_eq!(located.source, LookupSource::Environment);

        let lookup = Lookup {
            env_override: Some(OsString::new()),
            ..lookup
        };
        let located = lookup.locate(&collaborator()).unwrap();
        assert_eq!(located.path, from_config);
        assert_eq!(located.source, LookupSource::Config);
    }

    #[cfg(unix)]
    #[test]
    fn test_bare_override_is_searched_on_path() {
        let temp = TempDir::new().unwrap();
        let expected = write_program(temp.path(), "s3cmd-custom", 0o755);
        let lookup = Lookup {
            config_override: Some("s3cmd-custom".to_string()),
            search_path: Some(temp.path().as_os_str().to_os_string()),
            ..Lookup::default()
        };
        assert_eq!(lookup.locate(&collaborator()).unwrap().path, expected);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_executable_override_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = write_program(temp.path(), "s3cmd", 0o644);
        let lookup = Lookup {
            env_override: Some(path.into_os_string()),
            ..Lookup::default()
        };
        let err = lookup.locate(&collaborator()).unwrap_err();
        assert!(matches!(err, TsdError::CollaboratorNotExecutable { .. }));
        assert!(err.to_string().contains("not an executable file"));
    }

    #[test]
    fn test_missing_override_path_is_not_found() {
        let temp = TempDir::new().unwrap();
        let lookup = Lookup {
            env_override: Some(temp.path().join("nope").into_os_string()),
            ..Lookup::default()
        };
        let err = lookup.locate(&collaborator()).unwrap_err();
        assert!(matches!(err, TsdError::CollaboratorNotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_execute_bit_must_apply_to_current_user() {
        let temp = TempDir::new().unwrap();
        let owner = write_program(temp.path(), "owner-only", 0o700);
        assert!(is_executable(&owner));

        // Only "others" may execute; the owner may not.
        let others = write_program(temp.path(), "others-only", 0o601);
        if !nix::unistd::Uid::effective().is_root() {
            assert!(!is_executable(&others));
        }
        assert!(!is_executable(&write_program(temp.path(), "plain", 0o644)));
    }

    #[test]
    fn test_pathext_candidates() {
        let dir = Path::new("bin");
        assert_eq!(
            candidates_with_extensions(dir, OsStr::new("s3cmd"), DEFAULT_PATHEXT),
            vec![
                dir.join("s3cmd.COM"),
                dir.join("s3cmd.EXE"),
                dir.join("s3cmd.BAT"),
                dir.join("s3cmd.CMD"),
            ]
        );
        assert_eq!(
            candidates_with_extensions(dir, OsStr::new("tacl.cmd"), DEFAULT_PATHEXT),
            vec![dir.join("tacl.cmd")]
        );
        assert_eq!(
            candidates_with_extensions(dir, OsStr::new("s3cmd"), ".exe;;.py"),
            vec![dir.join("s3cmd.exe"), dir.join("s3cmd.py")]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_is_not_executable() {
        let temp = TempDir::new().unwrap();
        let lookup = Lookup {
            env_override: Some(temp.path().as_os_str().to_os_string()),
            ..Lookup::default()
        };
        let err = lookup.locate(&collaborator()).unwrap_err();
        assert!(matches!(err, TsdError::CollaboratorNotExecutable { .. }));
    }
}
