//! `critter-core`: create and update code reviews over the review service's
//! REST API.
//!
//! # Architecture
//!
//! ```text
//! Review          ← populated by the front-end (flags, patch files, stdin)
//!     │
//!     ▼
//! Connector       ← sequences the stages of a create or update
//!     │
//!     ▼
//! Action          ← CreateReview | AddReviewers | AddPatches | AddChangesets | StartReview
//!     │              one in-flight call at a time
//!     ▼
//! Communicator    ← reqwest + basic auth, single attempt per call
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use critter_core::{Connector, Review, Settings};
//!
//! let settings = Settings::load(&Settings::default_path()?)?;
//! let connector = Connector::new(&settings)?;
//!
//! let mut review = Review::new();
//! review.set_project("CR");
//! review.set_name("Fix flaky test");
//! review.add_patch(std::fs::read("fix.diff")?);
//!
//! let report = connector.create_review(&mut review).await?;
//! println!("created {:?}", report.review_id);
//! ```

pub mod action;
pub mod catalog;
pub mod communicator;
pub mod config;
pub mod connector;
pub mod error;
pub mod input;
pub mod review;

pub use action::{Action, ActionEvent, ActionName, ActionState};
pub use communicator::{Body, Call, Communicator, Reply, Service};
pub use config::{PatchOrder, Settings};
pub use connector::{Connector, Operation, PipelineReport, StageFailure};
pub use error::{CritterError, Result};
pub use review::Review;
