//! Read-only listings used to pick projects, repositories and people.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::communicator::{Communicator, Service};
use crate::error::{CritterError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub key: String,
    #[serde(default)]
    pub name: String,
}

impl Project {
    pub fn label(&self) -> String {
        format!("{}: {}", self.key, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_name: String,
    #[serde(default)]
    pub display_name: String,
}

impl User {
    /// Display name, or the user name when the service has none.
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.user_name
        } else {
            &self.display_name
        }
    }
}

pub async fn load_projects(communicator: &Communicator) -> Result<Vec<Project>> {
    load(communicator, Service::Projects, "projectData").await
}

pub async fn load_repositories(communicator: &Communicator) -> Result<Vec<Repository>> {
    load(communicator, Service::Repositories, "repoData").await
}

pub async fn load_users(communicator: &Communicator) -> Result<Vec<User>> {
    load(communicator, Service::Users, "userData").await
}

async fn load<T>(communicator: &Communicator, service: Service, key: &str) -> Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
{
    let reply = communicator.for_service(service).get("").await?;
    let mut value = reply.json()?;
    let items = match value.get_mut(key).map(Value::take) {
        Some(Value::Null) | None => return Ok(Vec::new()),
        Some(items) => items,
    };
    serde_json::from_value(items)
        .map_err(|e| CritterError::Protocol(format!("malformed {key} in {}: {e}", service.path())))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
