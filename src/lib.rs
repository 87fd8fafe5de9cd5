//! # xai-study: Explanation-Treatment User Study Service
//!
//! Participants guess the class of a few images, are taught under one of
//! three treatments (plain caption, prototype patches, prototype rectangles),
//! and are then re-tested on fresh images. Every answer lands in a CSV
//! response table that the analysis binary turns into accuracy tables, a
//! confusion matrix and a treatment comparison.
//!
//! ## Design Principles
//!
//! - **Per-session state**: each participant owns a [`session::SessionState`]
//!   keyed by session id; nothing is buffered process-wide
//! - **Degrade, don't fail**: missing image folders or tables shrink results
//!   instead of raising errors
//! - **Whole-table rewrites**: persistence merges, dedups by
//!   `(class_name, user_name)` and renames a temp file over the table
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use xai_study::session::{SessionId, Submission};
//! use xai_study::{Study, StudyConfig};
//!
//! let study = Study::builder()
//!     .config(StudyConfig::default().with_image_root("data/images/train"))
//!     .build()?;
//!
//! let view = study.start_session();
//! let id: SessionId = view.session_id.parse()?;
//! let view = study.submit(&id, Submission::Name("Alice".to_string()))?;
//! println!("{:?}", view.trial_header);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod recorder;
pub mod server;
pub mod session;
pub mod study;
pub mod trial;

pub use config::StudyConfig;
pub use error::{Error, Result};
pub use study::{Study, StudyBuilder};

use tracing_subscriber::EnvFilter;

/// Install the `tracing` subscriber used by the binaries.
///
/// Respects the `XAI_STUDY_LOG` environment variable for filtering and
/// defaults to `info`. Logs go to stderr so reports on stdout stay clean.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("XAI_STUDY_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
