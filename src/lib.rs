//! Icon Debug Patcher: injects env-gated icon selection logging into UI blocks
//!
//! Three landing-page UI blocks resolve their icons from AI-provided fields
//! with fallbacks. This crate rewrites those blocks in place so every icon
//! decision is logged when `NEXT_PUBLIC_DEBUG_ICON_SELECTION=true` at the
//! app's runtime.
//!
//! # Architecture
//!
//! - [`targets`] defines the three built-in targets and their rules.
//! - A [`PatchRule`] finds its first anchor match and compiles it to an
//!   [`Edit`], a byte-span replacement.
//! - [`patch_file`] runs a target's rules over one file and writes it back,
//!   refusing if the file changed on disk in the meantime.
//! - [`driver::run`] runs every target behind its own failure boundary and
//!   prints a status line per target.
//!
//! A rule whose anchor is missing changes nothing. It is reported as
//! [`RuleStatus::NotFound`], or [`RuleStatus::AlreadyApplied`] when the text
//! it injects is already present, so re-running is a no-op.
//!
//! # Example
//!
//! ```no_run
//! use icon_debug_patcher::{builtin_targets, driver, RootGuard};
//!
//! let targets = builtin_targets().expect("built-in rules compile");
//! let guard = RootGuard::new("/path/to/app").expect("project root exists");
//! let summary = driver::run(
//!     &targets,
//!     &guard,
//!     &driver::RunOptions::default(),
//!     &mut std::io::stdout(),
//! )
//! .expect("stdout is writable");
//! println!("{} patched", summary.patched);
//! ```

pub mod config;
pub mod driver;
pub mod edit;
pub mod logging;
pub mod patcher;
pub mod rule;
pub mod safety;
pub mod targets;

// Re-exports
pub use config::{load_from_path, load_from_str, ConfigError, PatchConfig};
pub use driver::{RunOptions, RunSummary};
pub use edit::{Edit, EditError, Fingerprint};
pub use patcher::{
    patch_content, patch_file, PatchError, PatchOptions, PatchOutcome, PatchReport, RuleReport,
};
pub use rule::{PatchRule, RuleAction, RuleError, RuleStatus};
pub use safety::{RootGuard, SafetyError};
pub use targets::{builtin_targets, MissingFilePolicy, Target, BUILTIN_IDS, DEBUG_FLAG};
