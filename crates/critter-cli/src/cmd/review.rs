use std::io::IsTerminal;
use std::path::PathBuf;

use crate::output::{print_json, print_report};
use anyhow::Context;
use clap::Args;
use critter_core::{input, Connector, Operation, PatchOrder, Review, Settings};

#[derive(Args, Debug, Default)]
pub struct ReviewArgs {
    /// Create a new review
    #[arg(short = 'c', long)]
    pub create: bool,

    /// Update the review with this id
    #[arg(short = 'u', long, value_name = "ID")]
    pub update: Option<String>,

    /// Review author (default: the configured user)
    #[arg(short = 'a', long)]
    pub author: Option<String>,

    /// Review title
    #[arg(short = 't', long)]
    pub title: Option<String>,

    /// Review objectives, used as the description
    #[arg(short = 'o', long)]
    pub objectives: Option<String>,

    /// Project key
    #[arg(short = 'p', long, default_value = "CR")]
    pub project: String,

    /// Start the review once everything is attached
    #[arg(short = 's', long)]
    pub start: bool,

    /// Review creator
    #[arg(long)]
    pub creator: Option<String>,

    /// Review moderator
    #[arg(long)]
    pub moderator: Option<String>,

    /// Reviewers to invite
    #[arg(short = 'r', long, num_args = 1.., value_delimiter = ',')]
    pub reviewers: Vec<String>,

    /// Repository for changesets and patch anchors
    #[arg(long)]
    pub repository: Option<String>,

    /// Changeset revisions to add (disables reading stdin)
    #[arg(long = "changeset", num_args = 1..)]
    pub changesets: Vec<String>,

    /// Patch file to add; repeat for several (disables reading stdin)
    #[arg(long = "patch", value_name = "FILE")]
    pub patches: Vec<PathBuf>,

    /// Order in which patches are uploaded: lifo or fifo
    #[arg(long, value_name = "ORDER", value_parser = parse_patch_order)]
    pub patch_order: Option<PatchOrder>,
}

fn parse_patch_order(s: &str) -> critter_core::Result<PatchOrder> {
    s.parse()
}

impl ReviewArgs {
    /// Stdin is only scraped when nothing was named explicitly.
    fn reads_stdin(&self) -> bool {
        self.patches.is_empty() && self.changesets.is_empty()
    }
}

pub fn run(mut settings: Settings, args: ReviewArgs, json: bool) -> anyhow::Result<()> {
    let operation = Operation::from_flags(args.create, args.update.clone())?;
    if let Some(order) = args.patch_order {
        settings.patch_order = order;
    }

    let connector = Connector::new(&settings).context("failed to build HTTP client")?;
    tracing::debug!(server = %connector.communicator().server(), "using review server");
    let mut review = build_review(&args, &operation, connector.user());

    let skipped = input::add_patch_files(&args.patches, &mut review);
    if skipped > 0 {
        tracing::warn!(skipped, "some patch files were not added");
    }

    let stdin = std::io::stdin();
    if args.reads_stdin() && !stdin.is_terminal() {
        input::read_into(stdin.lock(), &mut review).context("failed to read stdin")?;
    }

    let rt = super::runtime()?;
    let report = rt.block_on(async {
        let token = connector.cancellation_token();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted, stopping before the next call");
                token.cancel();
            }
        });
        connector.execute(&operation, &mut review).await
    });
    let report = match operation {
        Operation::Create => report.context("failed to create review")?,
        Operation::Update(ref id) => report.with_context(|| format!("failed to update {id}"))?,
    };

    if json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }
    Ok(())
}

fn build_review(args: &ReviewArgs, operation: &Operation, user: &str) -> Review {
    let mut review = Review::new();
    match operation {
        Operation::Create => review.set_author(args.author.as_deref().unwrap_or(user)),
        Operation::Update(id) => {
            review.set_id(id.as_str());
            if let Some(author) = &args.author {
                review.set_author(author.as_str());
            }
        }
    }
    if let Some(title) = &args.title {
        review.set_name(title.as_str());
    }
    if let Some(objectives) = &args.objectives {
        review.set_description(objectives.as_str());
    }
    review.set_project(args.project.as_str());
    review.set_should_start(args.start);
    if let Some(creator) = &args.creator {
        review.set_creator(creator.as_str());
    }
    if let Some(moderator) = &args.moderator {
        review.set_moderator(moderator.as_str());
    }
    if let Some(repository) = &args.repository {
        review.set_repository(repository.as_str());
    }
    for reviewer in &args.reviewers {
        review.add_reviewer(reviewer.as_str());
    }
    for changeset in &args.changesets {
        review.add_changeset(changeset.as_str());
    }
    review
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_defaults_to_configured_user_on_create() {
        let args = ReviewArgs {
            create: true,
            project: "CR".into(),
            ..Default::default()
        };
        let review = build_review(&args, &Operation::Create, "alice");
        assert_eq!(review.author(), "alice");
        assert_eq!(review.id(), None);
    }

    #[test]
    fn update_targets_the_given_id() {
        let args = ReviewArgs {
            update: Some("CR-9".into()),
            reviewers: vec!["bob".into(), "carol".into(), "bob".into()],
            changesets: vec!["101".into()],
            project: "CR".into(),
            start: true,
            ..Default::default()
        };
        let review = build_review(&args, &Operation::Update("CR-9".into()), "alice");
        assert_eq!(review.id(), Some("CR-9"));
        assert_eq!(review.author(), "");
        assert_eq!(review.reviewers(), ["bob", "carol"]);
        assert_eq!(review.changesets(), ["101"]);
        assert!(review.should_start());
    }

    #[derive(clap::Parser)]
    struct Harness {
        #[command(flatten)]
        args: ReviewArgs,
    }

    #[test]
    fn patch_order_flag_parses_to_enum() {
        use clap::Parser;

        let parsed = Harness::try_parse_from(["critter", "--patch-order", "fifo"]).unwrap();
        assert_eq!(parsed.args.patch_order, Some(PatchOrder::Fifo));

        let parsed = Harness::try_parse_from(["critter"]).unwrap();
        assert_eq!(parsed.args.patch_order, None);
        assert_eq!(parsed.args.project, "CR");

        assert!(Harness::try_parse_from(["critter", "--patch-order", "random"]).is_err());
    }

    #[test]
    fn named_inputs_disable_stdin() {
        let mut args = ReviewArgs::default();
        assert!(args.reads_stdin());
        args.patches.push(PathBuf::from("fix.diff"));
        assert!(!args.reads_stdin());
    }
}
