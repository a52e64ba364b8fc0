// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! timewarp-git: repository driver for timewarp
//!
//! This library crate owns every interaction with version control: creating
//! the bootstrap commit, appending to the marker file and committing it with
//! forged dates, and resetting history back to the root commit.

#![warn(missing_docs)]

//! # Example
//!
//! ```no_run
//! use chrono::{FixedOffset, TimeZone};
//! use timewarp_git::{GitDriver, HistoryDriver};
//!
//! let mut driver = GitDriver::new("/path/to/workspace");
//! driver.ensure_initialized().expect("bootstrap");
//!
//! let when = FixedOffset::east_opt(0)
//!     .unwrap()
//!     .with_ymd_and_hms(2024, 1, 2, 14, 30, 0)
//!     .unwrap();
//! let outcome = driver.commit_at(&when);
//! assert!(outcome.is_success());
//! ```

pub mod commit;
pub mod driver;
pub mod error;
pub mod marker;
pub mod memory;
pub mod repo;

pub use commit::Commit;
pub use driver::{Bootstrap, CommitOutcome, HistoryDriver};
pub use error::GitError;
pub use marker::MarkerFile;
pub use memory::MemoryDriver;
pub use repo::{GitDriver, Identity};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::driver::{Bootstrap, CommitOutcome, HistoryDriver};
    pub use crate::error::GitError;
    pub use crate::memory::MemoryDriver;
    pub use crate::repo::{GitDriver, Identity};
}
