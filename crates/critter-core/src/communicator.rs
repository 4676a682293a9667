//! HTTP transport for the review service's REST API.
//!
//! A [`Communicator`] is bound to one REST resource (`reviews-v1`,
//! `projects-v1`, ...) under `<server>/rest-service/`. Every call is a single
//! attempt: there is no retry and no coalescing, so two actions sharing a
//! communicator issue independent requests.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;

use crate::config::Settings;
use crate::error::{CritterError, Result};

pub const REST_BASE: &str = "rest-service";

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// REST resource a communicator talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Reviews,
    Projects,
    Repositories,
    Users,
}

impl Service {
    pub fn path(self) -> &'static str {
        match self {
            Service::Reviews => "reviews-v1",
            Service::Projects => "projects-v1",
            Service::Repositories => "repositories-v1",
            Service::Users => "users-v1",
        }
    }
}

// ---------------------------------------------------------------------------
// Call / Reply
// ---------------------------------------------------------------------------

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(Value),
    Text(String),
}

/// One HTTP request relative to the communicator's base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub body: Body,
}

impl Call {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: Body::Empty,
        }
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: Body::Empty,
        }
    }

    pub fn post_data(path: impl Into<String>, body: Body) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body,
        }
    }
}

/// A successful (2xx) response.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

// ---------------------------------------------------------------------------
// Communicator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Communicator {
    client: reqwest::Client,
    server: String,
    service: Service,
    user: String,
    password: String,
}

impl Communicator {
    pub fn new(settings: &Settings, service: Service) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| CritterError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            server: settings.server_url(),
            service,
            user: settings.username.clone(),
            password: settings.password.clone(),
        })
    }

    /// Another communicator sharing this one's client and credentials.
    pub fn for_service(&self, service: Service) -> Self {
        Self {
            service,
            ..self.clone()
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    /// Absolute URL for `path` under this communicator's resource.
    pub fn url(&self, path: &str) -> String {
        let base = format!("{}/{}/{}", self.server, REST_BASE, self.service.path());
        if path.is_empty() {
            base
        } else {
            format!("{base}/{}", path.trim_start_matches('/'))
        }
    }

    pub async fn get(&self, path: &str) -> Result<Reply> {
        self.send(&Call::get(path)).await
    }

    pub async fn post(&self, path: &str) -> Result<Reply> {
        self.send(&Call::post(path)).await
    }

    pub async fn post_data(&self, path: &str, body: Body) -> Result<Reply> {
        self.send(&Call::post_data(path, body)).await
    }

    /// Issue one request. Network failures and non-2xx statuses both come
    /// back as [`CritterError::Transport`] naming the endpoint.
    pub async fn send(&self, call: &Call) -> Result<Reply> {
        let url = self.url(&call.path);
        tracing::debug!(method = %call.method, url = %url, "sending request");

        let mut request = self
            .client
            .request(call.method.clone(), &url)
            .basic_auth(&self.user, Some(&self.password))
            .header(ACCEPT, "application/json");
        request = match &call.body {
            Body::Empty => request,
            Body::Json(value) => request.json(value),
            Body::Text(text) => request
                .header(CONTENT_TYPE, "text/plain")
                .body(text.clone()),
        };

        let transport = |message: String| CritterError::Transport {
            endpoint: url.clone(),
            message,
        };

        let response = request.send().await.map_err(|e| transport(e.to_string()))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| transport(e.to_string()))?;

        if !status.is_success() {
            return Err(transport(format!("{status}: {}", body.trim())));
        }
        Ok(Reply {
            status: status.as_u16(),
            body,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
