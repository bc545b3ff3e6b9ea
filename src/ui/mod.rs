//! UI module for consistent CLI output
//!
//! Styled output with `console` and spinners with `indicatif`, falling back
//! to plain lines in CI/non-interactive environments.
//!
//! # Example
//!
//! ```rust,ignore
//! use docsrv::ui::{self, TaskSpinner, UiContext};
//!
//! let ctx = UiContext::detect();
//!
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Resolving widgets@latest...");
//! // ... do work ...
//! spinner.stop("Resolved widgets 2.0.0");
//!
//! ui::key_value(&ctx, "Location", "/var/lib/docsrv/docs/widgets/2.0.0");
//! ```

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{intro, key_value, remark, step_ok, step_warn_hint};
pub use progress::TaskSpinner;
