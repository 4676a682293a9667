use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use critter_core::{catalog, Communicator, Service, Settings};

#[derive(Subcommand)]
pub enum ListSubcommand {
    /// Projects a review can be filed under
    Projects,
    /// Repositories changesets and patch anchors can refer to
    Repositories,
    /// People who can author, moderate or review
    Users,
}

pub fn run(settings: &Settings, subcmd: ListSubcommand, json: bool) -> anyhow::Result<()> {
    let communicator =
        Communicator::new(settings, Service::Reviews).context("failed to build HTTP client")?;
    let rt = super::runtime()?;
    rt.block_on(async {
        match subcmd {
            ListSubcommand::Projects => projects(&communicator, json).await,
            ListSubcommand::Repositories => repositories(&communicator, json).await,
            ListSubcommand::Users => users(&communicator, json).await,
        }
    })
}

async fn projects(communicator: &Communicator, json: bool) -> anyhow::Result<()> {
    let projects = catalog::load_projects(communicator)
        .await
        .context("failed to list projects")?;
    if json {
        return print_json(&projects);
    }
    if projects.is_empty() {
        println!("No projects found.");
        return Ok(());
    }
    for project in &projects {
        println!("{}", project.label());
    }
    Ok(())
}

async fn repositories(communicator: &Communicator, json: bool) -> anyhow::Result<()> {
    let repos = catalog::load_repositories(communicator)
        .await
        .context("failed to list repositories")?;
    if json {
        return print_json(&repos);
    }
    if repos.is_empty() {
        println!("No repositories found.");
        return Ok(());
    }
    let rows = repos
        .iter()
        .map(|r| {
            vec![
                r.name.clone(),
                r.kind.clone(),
                if r.enabled { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    print_table(&["NAME", "TYPE", "ENABLED"], rows);
    Ok(())
}

async fn users(communicator: &Communicator, json: bool) -> anyhow::Result<()> {
    let users = catalog::load_users(communicator)
        .await
        .context("failed to list users")?;
    if json {
        return print_json(&users);
    }
    if users.is_empty() {
        println!("No users found.");
        return Ok(());
    }
    let rows = users
        .iter()
        .map(|u| vec![u.user_name.clone(), u.label().to_string()])
        .collect();
    print_table(&["USER", "NAME"], rows);
    Ok(())
}
