//! droid-lint - static analysis for Android projects
//!
//! Checks Android project sources (the manifest, XML resources and the
//! ProGuard configuration) against a registry of issues and reports the
//! findings as text, XML or HTML.
//!
//! # Architecture
//!
//! ```text
//! CLI -> LintDriver -> XmlVisitor -> Detector -> Context::report -> Warning -> Reporter
//! ```
//!
//! The driver maps inputs to projects, instantiates the detectors whose
//! issues are enabled by the active [`Configuration`], and dispatches each
//! parsed file to them. Detectors report through their context; the
//! collected [`Warning`]s are sorted and handed to a [`Reporter`].
//!
//! # Configuration
//!
//! Severity overrides can be kept in `lint.yaml` in a project directory or
//! `~/.droidlintrc.yaml`:
//!
//! ```yaml
//! severity: "HardcodedText=ERROR,PxUsage=INFORMATIONAL"
//! disabled: "UselessLeaf"
//! ```

pub mod checks;
pub mod client;
pub mod config;
pub mod context;
pub mod detector;
pub mod driver;
pub mod issue;
pub mod location;
pub mod output;
pub mod project;
pub mod registry;
pub mod scope;
mod visitor;
pub mod warning;
pub mod xml;

// Re-export main types
pub use client::{CliClient, LintClient};
pub use config::{
    CliConfiguration, ConfigError, Configuration, DefaultConfiguration, LintConfig, LintOptions,
    PersistedConfiguration,
};
pub use context::{Context, XmlContext};
pub use detector::{Applicable, Detector};
pub use driver::{
    CancelToken, CheckedProject, DriverOptions, LintDriver, LintEvent, LintListener, LintResult,
};
pub use issue::{Category, Issue, Severity};
pub use location::{Location, Position};
pub use output::{Reporter, ReportError};
pub use project::Project;
pub use registry::{IssueRegistry, RegistryBuilder};
pub use scope::{ResourceFolderType, Scope, ScopeSet};
pub use warning::Warning;

/// Exit code when errors were found
pub const ERRNO_ERRORS: i32 = -1;
/// Exit code for missing or unusable arguments
pub const ERRNO_USAGE: i32 = -2;
/// Exit code when an existing output file cannot be replaced
pub const ERRNO_EXISTS: i32 = -3;
/// Exit code after printing help
pub const ERRNO_HELP: i32 = -4;
/// Exit code for invalid arguments
pub const ERRNO_INVALIDARGS: i32 = -5;
