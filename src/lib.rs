//! tsd-s3cmd - TSD wrapper for s3cmd
//!
//! Installs two commands, `tsd-s3cmd` and `tacl_auth`, that forward to the
//! pinned s3cmd fork and the TSD API client respectively, and carries the
//! packaging metadata (versions, requirements, markers) that pins those
//! collaborators together.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod requirement;
pub mod ui;
pub mod version;

pub use dispatch::EntryPoint;
pub use error::{Result, TsdError};
pub use manifest::{PackageManifest, ReleaseHistory};
pub use requirement::{MarkerEnvironment, Requirement};
pub use version::{SpecifierSet, Version};
