//! Orchestrates the actions that satisfy one create or update invocation.
//!
//! Stages run strictly one after another; each starts only once the previous
//! one reached a terminal state.
//!
//! | operation | stages                                                     |
//! |-----------|------------------------------------------------------------|
//! | create    | create → reviewers → patches → changesets → start          |
//! | update    | reviewers → patches → changesets → start                   |
//!
//! Stages after the first are skipped when the review has nothing for them
//! (no reviewers, no patches, ...). A failed create aborts the pipeline since
//! nothing downstream has a review id; every later failure is recorded in
//! the [`PipelineReport`] and the pipeline moves on.

use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::action::{Action, ActionEvent, ActionName};
use crate::communicator::{Communicator, Service};
use crate::config::{PatchOrder, Settings};
use crate::error::{CritterError, Result};
use crate::review::Review;

/// Top-level operation requested by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update(String),
}

impl Operation {
    /// Resolve the mutually exclusive create/update flags.
    pub fn from_flags(create: bool, update: Option<String>) -> Result<Self> {
        match (create, update) {
            (true, Some(_)) => Err(CritterError::Configuration(
                "you can't create and update a review at the same time".into(),
            )),
            (true, None) => Ok(Operation::Create),
            (false, Some(id)) if id.trim().is_empty() => Err(CritterError::Configuration(
                "--update needs a non-empty review id".into(),
            )),
            (false, Some(id)) => Ok(Operation::Update(id.trim().to_string())),
            (false, None) => Err(CritterError::Configuration(
                "nothing to do: pass --create or --update <id>".into(),
            )),
        }
    }
}

/// A stage that failed without aborting the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageFailure {
    pub stage: ActionName,
    pub message: String,
}

/// Outcome of a pipeline that ran to its end.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineReport {
    pub review_id: Option<String>,
    pub events: Vec<ActionEvent>,
    pub failures: Vec<StageFailure>,
}

impl PipelineReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Connector {
    communicator: Communicator,
    patch_order: PatchOrder,
    cancel: CancellationToken,
    subscribers: Vec<mpsc::UnboundedSender<ActionEvent>>,
}

impl Connector {
    pub fn new(settings: &Settings) -> Result<Self> {
        let communicator = Communicator::new(settings, Service::Reviews)?;
        Ok(Self::with_communicator(communicator, settings.patch_order))
    }

    pub fn with_communicator(communicator: Communicator, patch_order: PatchOrder) -> Self {
        Self {
            communicator,
            patch_order,
            cancel: CancellationToken::new(),
            subscribers: Vec::new(),
        }
    }

    pub fn communicator(&self) -> &Communicator {
        &self.communicator
    }

    /// Configured user name, the default review author.
    pub fn user(&self) -> &str {
        self.communicator.user()
    }

    /// Token that stops the pipeline before its next call once cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Receive every completion event as its action succeeds.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ActionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Run `operation` against `review`. An update targets the id it carries.
    pub async fn execute(&self, operation: &Operation, review: &mut Review) -> Result<PipelineReport> {
        match operation {
            Operation::Create => self.create_review(review).await,
            Operation::Update(id) => {
                review.set_id(id.as_str());
                self.update_review(review).await
            }
        }
    }

    /// Create `review`, then attach whatever it carries.
    pub async fn create_review(&self, review: &mut Review) -> Result<PipelineReport> {
        let mut report = PipelineReport::default();
        let created = self
            .stage(Action::create_review(review, &self.communicator))
            .await?;
        report.events.push(created);
        self.follow_up(review, report).await
    }

    /// Attach reviewers, patches and changesets to an existing review and
    /// optionally start it.
    pub async fn update_review(&self, review: &mut Review) -> Result<PipelineReport> {
        if review.id().map_or(true, |id| id.trim().is_empty()) {
            return Err(CritterError::MissingReviewId);
        }
        self.follow_up(review, PipelineReport::default()).await
    }

    async fn follow_up(
        &self,
        review: &mut Review,
        mut report: PipelineReport,
    ) -> Result<PipelineReport> {
        if !review.reviewers().is_empty() {
            let action = Action::add_reviewers(review, &self.communicator);
            self.optional_stage(action, &mut report).await?;
        }
        if !review.patches().is_empty() {
            let action = Action::add_patches(review, &self.communicator, self.patch_order);
            self.optional_stage(action, &mut report).await?;
        }
        if !review.changesets().is_empty() {
            let action = Action::add_changesets(review, &self.communicator);
            self.optional_stage(action, &mut report).await?;
        }
        if review.should_start() {
            let action = Action::start_review(review, &self.communicator);
            self.optional_stage(action, &mut report).await?;
        }

        report.review_id = review.id().map(str::to_string);
        Ok(report)
    }

    /// Run a stage whose failure is recorded rather than fatal. Cancellation
    /// still aborts.
    async fn optional_stage<'a>(
        &'a self,
        action: Action<'a>,
        report: &mut PipelineReport,
    ) -> Result<()> {
        let stage = action.name();
        match self.stage(action).await {
            Ok(event) => report.events.push(event),
            Err(CritterError::Cancelled) => return Err(CritterError::Cancelled),
            Err(e) => report.failures.push(StageFailure {
                stage,
                message: e.to_string(),
            }),
        }
        Ok(())
    }

    async fn stage<'a>(&'a self, action: Action<'a>) -> Result<ActionEvent> {
        let mut action = action.with_cancellation(self.cancel.clone());
        let subscribers = &self.subscribers;
        action.on_succeeded(move |event| {
            for tx in subscribers {
                let _ = tx.send(event.clone());
            }
        });
        action.run().await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
