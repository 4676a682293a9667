//! Asynchronous units of REST work against one review.
//!
//! An [`Action`] borrows the [`Review`] and [`Communicator`] for its whole
//! lifetime and moves through `Idle -> InFlight -> {Succeeded, Failed}`.
//! Terminal states are final: a second [`Action::run`] fails with
//! [`CritterError::ActionAlreadyRun`] before touching the network.
//!
//! The five variants share one driver loop. Each variant decides what the
//! next call is and what a reply means:
//!
//! ```text
//! run()
//!   │
//!   ▼
//! next() ──Done(event)──▶ Succeeded
//!   │
//!   Issue(call)
//!   ▼
//! Communicator::send ──▶ on_reply() ──Some(event)──▶ Succeeded
//!   ▲                        │   └──Err──▶ Failed
//!   └────────── None ────────┘
//! ```
//!
//! Only one call is in flight per action. `AddPatches` is the only variant
//! that loops: each patch is one call, and a failed patch is logged and
//! skipped rather than aborting the queue.

use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::communicator::{Body, Call, Communicator, Reply};
use crate::config::PatchOrder;
use crate::error::{CritterError, Result};
use crate::review::Review;

// ─── Names, states, events ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionName {
    CreateReview,
    AddReviewers,
    AddChangesets,
    AddPatches,
    StartReview,
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionName::CreateReview => "create_review",
            ActionName::AddReviewers => "add_reviewers",
            ActionName::AddChangesets => "add_changesets",
            ActionName::AddPatches => "add_patches",
            ActionName::StartReview => "start_review",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

/// Completion event emitted once by a successful action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ActionEvent {
    ReviewCreated { id: String },
    ReviewersAdded { count: usize },
    ChangesetsAdded { count: usize },
    PatchesAdded { attempted: usize, failed: usize },
    ReviewStarted,
}

// ─── Patch queue ──────────────────────────────────────────────────────────

/// Pending patch blobs for [`ActionName::AddPatches`].
#[derive(Debug, Default)]
struct PatchQueue {
    order: PatchOrder,
    pending: VecDeque<Vec<u8>>,
    attempted: usize,
    failed: usize,
}

impl PatchQueue {
    fn new(order: PatchOrder) -> Self {
        Self {
            order,
            ..Default::default()
        }
    }

    /// Snapshot the review's patches in insertion order.
    fn load(&mut self, patches: &[Vec<u8>]) {
        self.pending = patches.iter().cloned().collect();
    }

    fn pop(&mut self) -> Option<Vec<u8>> {
        match self.order {
            PatchOrder::Lifo => self.pending.pop_back(),
            PatchOrder::Fifo => self.pending.pop_front(),
        }
    }
}

// ─── Variants ─────────────────────────────────────────────────────────────

enum Kind {
    CreateReview,
    AddReviewers,
    AddChangesets,
    AddPatches(PatchQueue),
    StartReview,
}

enum Next {
    Issue(Call),
    Done(ActionEvent),
}

impl Kind {
    fn name(&self) -> ActionName {
        match self {
            Kind::CreateReview => ActionName::CreateReview,
            Kind::AddReviewers => ActionName::AddReviewers,
            Kind::AddChangesets => ActionName::AddChangesets,
            Kind::AddPatches(_) => ActionName::AddPatches,
            Kind::StartReview => ActionName::StartReview,
        }
    }

    fn prepare(&mut self, review: &Review) {
        if let Kind::AddPatches(queue) = self {
            queue.load(review.patches());
        }
    }

    /// Decide the next call, or finish without one.
    fn next(&mut self, review: &Review) -> Result<Next> {
        let call = match self {
            Kind::CreateReview => Call::post_data("", Body::Json(review.create_request())),
            Kind::AddReviewers => Call::post_data(
                format!("{}/reviewers", required_id(review)?),
                Body::Text(review.reviewer_data()),
            ),
            Kind::AddChangesets => Call::post_data(
                format!("{}/addChangeset", required_id(review)?),
                Body::Json(review.changeset_data()),
            ),
            Kind::AddPatches(queue) => {
                let id = required_id(review)?;
                match queue.pop() {
                    Some(patch) => {
                        queue.attempted += 1;
                        Call::post_data(
                            format!("{id}/addPatch"),
                            Body::Json(review.patch_data(&patch)),
                        )
                    }
                    None => {
                        let n = queue.attempted;
                        tracing::info!(
                            review = %id,
                            failed = queue.failed,
                            "Added {n} {}",
                            if n == 1 { "patch" } else { "patches" }
                        );
                        return Ok(Next::Done(ActionEvent::PatchesAdded {
                            attempted: n,
                            failed: queue.failed,
                        }));
                    }
                }
            }
            Kind::StartReview => Call::post(format!(
                "{}/transition?action=action:approveReview",
                required_id(review)?
            )),
        };
        Ok(Next::Issue(call))
    }

    /// Interpret one reply. `Ok(None)` means issue the next call.
    fn on_reply(&mut self, review: &mut Review, reply: Result<Reply>) -> Result<Option<ActionEvent>> {
        match self {
            Kind::AddPatches(queue) => {
                if let Err(e) = reply {
                    queue.failed += 1;
                    tracing::warn!(
                        review = review.id().unwrap_or_default(),
                        error = %e,
                        "could not add patch"
                    );
                }
                Ok(None)
            }
            Kind::CreateReview => {
                let id = created_review_id(&reply?)?;
                tracing::info!(review = %id, "review created");
                review.set_id(id.clone());
                Ok(Some(ActionEvent::ReviewCreated { id }))
            }
            Kind::AddReviewers => {
                reply?;
                Ok(Some(ActionEvent::ReviewersAdded {
                    count: review.reviewers().len(),
                }))
            }
            Kind::AddChangesets => {
                reply?;
                Ok(Some(ActionEvent::ChangesetsAdded {
                    count: review.changesets().len(),
                }))
            }
            Kind::StartReview => {
                reply?;
                tracing::info!(review = review.id().unwrap_or_default(), "review started");
                Ok(Some(ActionEvent::ReviewStarted))
            }
        }
    }
}

fn required_id(review: &Review) -> Result<&str> {
    review.id().ok_or(CritterError::MissingReviewId)
}

/// Pull the assigned identifier out of a create response: `permaId.id`, or a
/// bare `permaId` string.
fn created_review_id(reply: &Reply) -> Result<String> {
    let value = reply
        .json()
        .map_err(|e| CritterError::Protocol(format!("create response is not JSON: {e}")))?;
    let perma = &value["permaId"];
    perma["id"]
        .as_str()
        .or_else(|| perma.as_str())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| CritterError::Protocol("create response has no permaId".into()))
}

// ─── Action ───────────────────────────────────────────────────────────────

type SuccessHandler<'a> = Box<dyn FnMut(&ActionEvent) + 'a>;
type FailureHandler<'a> = Box<dyn FnMut(&CritterError) + 'a>;

pub struct Action<'a> {
    review: &'a mut Review,
    communicator: &'a Communicator,
    kind: Kind,
    state: ActionState,
    cancel: CancellationToken,
    on_succeeded: Vec<SuccessHandler<'a>>,
    on_failed: Vec<FailureHandler<'a>>,
}

impl<'a> Action<'a> {
    fn new(review: &'a mut Review, communicator: &'a Communicator, kind: Kind) -> Self {
        Self {
            review,
            communicator,
            kind,
            state: ActionState::Idle,
            cancel: CancellationToken::new(),
            on_succeeded: Vec::new(),
            on_failed: Vec::new(),
        }
    }

    pub fn create_review(review: &'a mut Review, communicator: &'a Communicator) -> Self {
        Self::new(review, communicator, Kind::CreateReview)
    }

    pub fn add_reviewers(review: &'a mut Review, communicator: &'a Communicator) -> Self {
        Self::new(review, communicator, Kind::AddReviewers)
    }

    pub fn add_changesets(review: &'a mut Review, communicator: &'a Communicator) -> Self {
        Self::new(review, communicator, Kind::AddChangesets)
    }

    pub fn add_patches(
        review: &'a mut Review,
        communicator: &'a Communicator,
        order: PatchOrder,
    ) -> Self {
        Self::new(review, communicator, Kind::AddPatches(PatchQueue::new(order)))
    }

    pub fn start_review(review: &'a mut Review, communicator: &'a Communicator) -> Self {
        Self::new(review, communicator, Kind::StartReview)
    }

    /// Checked before every call; a cancelled action fails with
    /// [`CritterError::Cancelled`].
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn on_succeeded(&mut self, handler: impl FnMut(&ActionEvent) + 'a) {
        self.on_succeeded.push(Box::new(handler));
    }

    pub fn on_failed(&mut self, handler: impl FnMut(&CritterError) + 'a) {
        self.on_failed.push(Box::new(handler));
    }

    pub fn name(&self) -> ActionName {
        self.kind.name()
    }

    pub fn state(&self) -> ActionState {
        self.state
    }

    /// Drive the action to a terminal state. Must be called once.
    pub async fn run(&mut self) -> Result<ActionEvent> {
        if self.state != ActionState::Idle {
            return Err(CritterError::ActionAlreadyRun(self.name()));
        }
        self.state = ActionState::InFlight;
        self.kind.prepare(self.review);

        let outcome = self.drive().await;
        match &outcome {
            Ok(event) => {
                self.state = ActionState::Succeeded;
                for handler in &mut self.on_succeeded {
                    handler(event);
                }
            }
            Err(e) => {
                self.state = ActionState::Failed;
                tracing::warn!(
                    action = %self.name(),
                    review = self.review.id().unwrap_or_default(),
                    error = %e,
                    "action failed"
                );
                for handler in &mut self.on_failed {
                    handler(e);
                }
            }
        }
        outcome
    }

    async fn drive(&mut self) -> Result<ActionEvent> {
        loop {
            if self.cancel.is_cancelled() {
                return Err(CritterError::Cancelled);
            }
            let call = match self.kind.next(self.review)? {
                Next::Issue(call) => call,
                Next::Done(event) => return Ok(event),
            };
            let reply = self.communicator.send(&call).await;
            if let Some(event) = self.kind.on_reply(self.review, reply)? {
                return Ok(event);
            }
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
