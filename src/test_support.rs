//! In-memory upstream used by unit tests

use async_trait::async_trait;
use std::sync::Mutex;

use crate::cluster::ClusterRecord;
use crate::error::UpstreamError;
use crate::transport::{HttpFetch, RawResponse, UpstreamRequest};

enum Reply {
    Body { status: u16, body: Option<String> },
    Fail(String),
}

/// Routes requests by URL suffix and records every request it sees
#[derive(Default)]
pub struct FakeUpstream {
    routes: Vec<(String, Reply)>,
    requests: Mutex<Vec<UpstreamRequest>>,
}

impl FakeUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, path: &str, status: u16, body: &str) -> Self {
        self.routes.push((
            path.to_string(),
            Reply::Body {
                status,
                body: Some(body.to_string()),
            },
        ));
        self
    }

    pub fn respond_without_body(mut self, path: &str, status: u16) -> Self {
        self.routes
            .push((path.to_string(), Reply::Body { status, body: None }));
        self
    }

    pub fn fail(mut self, path: &str, message: &str) -> Self {
        self.routes
            .push((path.to_string(), Reply::Fail(message.to_string())));
        self
    }

    pub fn requests(&self) -> Vec<UpstreamRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpFetch for FakeUpstream {
    async fn fetch(&self, request: UpstreamRequest) -> Result<RawResponse, UpstreamError> {
        self.requests.lock().unwrap().push(request.clone());

        let reply = self
            .routes
            .iter()
            .find(|(path, _)| request.url.ends_with(path.as_str()))
            .map(|(_, reply)| reply);

        match reply {
            Some(Reply::Body { status, body }) => Ok(RawResponse {
                url: request.url,
                status: *status,
                body: body.as_ref().map(|b| b.clone().into_bytes()),
            }),
            Some(Reply::Fail(message)) => Err(UpstreamError::transport(request.url, message.as_str())),
            None => Ok(RawResponse {
                url: request.url,
                status: 404,
                body: Some(b"no route".to_vec()),
            }),
        }
    }
}

/// A cluster with every field filled in from `identifier`
pub fn cluster(identifier: &str, address: &str) -> ClusterRecord {
    ClusterRecord {
        identifier: identifier.to_string(),
        address: address.to_string(),
        version: "v1.9".to_string(),
        username: format!("{}-user", identifier),
        password: format!("{}-password", identifier),
        cluster_type: "kubernetes".to_string(),
    }
}
