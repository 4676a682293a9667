use std::borrow::Cow;

use serde::Serialize;
use serde_json::{json, Value};

/// A review request under construction.
///
/// Built once per invocation by the front-end, then handed to the
/// [`Connector`](crate::connector::Connector). The identifier stays unset until
/// the caller supplies one for an update or the create call returns one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Review {
    author: String,
    name: String,
    description: String,
    project: String,
    repository: String,
    creator: String,
    moderator: String,
    reviewers: Vec<String>,
    changesets: Vec<String>,
    patches: Vec<Vec<u8>>,
    id: Option<String>,
    should_start: bool,
}

impl Review {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn set_author(&mut self, author: impl Into<String>) {
        self.author = author.into();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn set_project(&mut self, project: impl Into<String>) {
        self.project = project.into();
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn set_repository(&mut self, repository: impl Into<String>) {
        self.repository = repository.into();
    }

    pub fn creator(&self) -> &str {
        &self.creator
    }

    pub fn set_creator(&mut self, creator: impl Into<String>) {
        self.creator = creator.into();
    }

    pub fn moderator(&self) -> &str {
        &self.moderator
    }

    pub fn set_moderator(&mut self, moderator: impl Into<String>) {
        self.moderator = moderator.into();
    }

    pub fn reviewers(&self) -> &[String] {
        &self.reviewers
    }

    /// Add a reviewer, ignoring duplicates so insertion order is kept.
    pub fn add_reviewer(&mut self, reviewer: impl Into<String>) {
        let reviewer = reviewer.into();
        if !self.reviewers.contains(&reviewer) {
            self.reviewers.push(reviewer);
        }
    }

    pub fn changesets(&self) -> &[String] {
        &self.changesets
    }

    pub fn add_changeset(&mut self, changeset: impl Into<String>) {
        self.changesets.push(changeset.into());
    }

    pub fn patches(&self) -> &[Vec<u8>] {
        &self.patches
    }

    pub fn add_patch(&mut self, patch: Vec<u8>) {
        self.patches.push(patch);
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    pub fn should_start(&self) -> bool {
        self.should_start
    }

    pub fn set_should_start(&mut self, should_start: bool) {
        self.should_start = should_start;
    }

    // -----------------------------------------------------------------------
    // Request bodies
    // -----------------------------------------------------------------------

    /// Body of the review-creation call.
    pub fn create_request(&self) -> Value {
        let data = ReviewData {
            project_key: &self.project,
            name: &self.name,
            description: &self.description,
            author: UserRef::from_name(&self.author),
            creator: UserRef::from_name(&self.creator),
            moderator: UserRef::from_name(&self.moderator),
            state: "Draft",
            allow_reviewers_to_join: true,
        };
        json!({ "reviewData": data })
    }

    /// Wrap one patch blob in the envelope expected by `addPatch`.
    ///
    /// The service takes patches as text; bytes that are not valid UTF-8 are
    /// replaced with U+FFFD and a warning is logged.
    pub fn patch_data(&self, patch: &[u8]) -> Value {
        let text = String::from_utf8_lossy(patch);
        if let Cow::Owned(_) = text {
            tracing::warn!(
                review = self.id().unwrap_or_default(),
                bytes = patch.len(),
                "patch is not valid UTF-8, invalid bytes were replaced"
            );
        }
        let mut body = json!({ "patch": text });
        if !self.repository.is_empty() {
            body["anchor"] = json!({ "anchorRepository": self.repository });
        }
        body
    }

    /// Body of the `addChangeset` call, changesets in insertion order.
    pub fn changeset_data(&self) -> Value {
        let ids: Vec<Value> = self
            .changesets
            .iter()
            .map(|id| json!({ "id": id }))
            .collect();
        json!({
            "repository": self.repository,
            "changesets": { "changesetData": ids },
        })
    }

    /// Comma-joined reviewer list accepted by the `reviewers` endpoint.
    pub fn reviewer_data(&self) -> String {
        self.reviewers.join(",")
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReviewData<'a> {
    #[serde(skip_serializing_if = "is_blank")]
    project_key: &'a str,
    #[serde(skip_serializing_if = "is_blank")]
    name: &'a str,
    #[serde(skip_serializing_if = "is_blank")]
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<UserRef<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    creator: Option<UserRef<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    moderator: Option<UserRef<'a>>,
    state: &'static str,
    allow_reviewers_to_join: bool,
}

fn is_blank(s: &&str) -> bool {
    s.is_empty()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserRef<'a> {
    user_name: &'a str,
}

impl<'a> UserRef<'a> {
    fn from_name(name: &'a str) -> Option<Self> {
        (!name.is_empty()).then_some(UserRef { user_name: name })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
