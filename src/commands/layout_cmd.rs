//! Layout Commands
//!
//! Read/write handlers for one scope, and raw request dispatch for hosts that
//! route by path and hand over the body as bytes.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::domain::{DomainError, DomainResult, ElementEdit, Scope};
use crate::engine::{LayoutEngine, LayoutView};
use crate::reconcile::RequestContext;

/// `{"data": ...}` envelope of every read
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

/// Body of a write: the full level as the client last saw it
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WriteRequest {
    pub data: Vec<ElementEdit>,
}

/// Empty acknowledgment of a successful write
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct WriteAck {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolResponse {
    pub status: u16,
    pub body: Value,
}

impl ProtocolResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }
}

impl From<DomainError> for ProtocolResponse {
    fn from(e: DomainError) -> Self {
        ProtocolResponse::error(status_for(&e), e.to_string())
    }
}

/// HTTP status a failed request maps to
pub fn status_for(error: &DomainError) -> u16 {
    match error {
        DomainError::Validation(_) => 400,
        DomainError::NotFound(_) => 404,
        DomainError::RecursionDetected => 409,
        DomainError::AdapterUnavailable(_) => 503,
        _ => 500,
    }
}

pub struct LayoutCommands {
    engine: Arc<LayoutEngine>,
    route_prefix: String,
}

impl LayoutCommands {
    pub fn new(engine: Arc<LayoutEngine>, route_prefix: impl Into<String>) -> Self {
        Self {
            engine,
            route_prefix: route_prefix.into(),
        }
    }

    pub fn engine(&self) -> &Arc<LayoutEngine> {
        &self.engine
    }

    /// Current merged view of `scope`
    pub async fn get(
        &self,
        ctx: &RequestContext,
        scope: &Scope,
    ) -> DomainResult<DataResponse<LayoutView>> {
        let data = self.engine.read(ctx, scope).await?;
        Ok(DataResponse { data })
    }

    /// Store a submitted ordering/visibility
    pub async fn post(
        &self,
        ctx: &RequestContext,
        scope: &Scope,
        request: WriteRequest,
    ) -> DomainResult<WriteAck> {
        self.engine.edit(ctx, scope, &request.data).await?;
        Ok(WriteAck {})
    }

    /// Store, then answer with the freshly merged view
    pub async fn post_and_read(
        &self,
        ctx: &RequestContext,
        scope: &Scope,
        request: WriteRequest,
    ) -> DomainResult<DataResponse<LayoutView>> {
        self.post(ctx, scope, request).await?;
        self.get(ctx, scope).await
    }

    /// Handle a raw request addressed by console route
    pub async fn handle(
        &self,
        ctx: &RequestContext,
        method: Method,
        path: &str,
        body: &[u8],
    ) -> ProtocolResponse {
        let scope = match Scope::from_route(path, &self.route_prefix) {
            Ok(scope) => scope,
            Err(e) => return e.into(),
        };

        let result = match method {
            Method::Get => self.get(ctx, &scope).await.and_then(to_value),
            Method::Post => {
                let request: WriteRequest = match serde_json::from_slice(body) {
                    Ok(request) => request,
                    Err(e) => {
                        log::debug!("Rejected write to {}: {}", scope, e);
                        return ProtocolResponse::error(400, "Invalid JSON");
                    }
                };
                self.post(ctx, &scope, request).await.and_then(to_value)
            }
        };

        match result {
            Ok(body) => ProtocolResponse::ok(body),
            Err(e) => e.into(),
        }
    }
}

fn to_value<T: Serialize>(payload: T) -> DomainResult<Value> {
    serde_json::to_value(payload).map_err(|e| DomainError::Storage(e.to_string()))
}
