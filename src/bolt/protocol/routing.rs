//! Routing table discovery.
//!
//! From 4.3 the server answers a ROUTE message with the table in the `rt`
//! metadata. Older servers are asked through a procedure call that looks like
//! any other query and returns the table as a single `[ttl, servers]` record.

use std::collections::HashMap;

use super::{Feature, Protocol};
use crate::bolt::error::{BoltError, BoltResult};
use crate::bolt::message::{
    AccessMode, BoltRequest, RouteMessage, RouteTarget, RoutingTable, StreamMessage, SuccessMessage,
    TxConfig,
};
use crate::bolt::packstream::PackStreamValue;

/// Routing procedure on Bolt 3.
pub const ROUTING_PROCEDURE: &str = "CALL dbms.cluster.routing.getRoutingTable($context)";

/// Routing procedure on Bolt 4.0 to 4.2.
pub const ROUTING_PROCEDURE_MULTI_DB: &str =
    "CALL dbms.routing.getRoutingTable($context, $database)";

/// Database the multi-database procedure runs against.
pub const SYSTEM_DATABASE: &str = "system";

/// What to ask the router for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteParams {
    pub routing: HashMap<String, PackStreamValue>,
    pub bookmarks: Vec<String>,
    /// `None` for the home database
    pub database: Option<String>,
    pub impersonated_user: Option<String>,
}

impl RouteParams {
    pub fn new(routing: HashMap<String, PackStreamValue>) -> Self {
        Self {
            routing,
            ..Self::default()
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into()).filter(|db: &String| !db.is_empty());
        self
    }

    pub fn with_bookmarks(mut self, bookmarks: Vec<String>) -> Self {
        self.bookmarks = bookmarks;
        self
    }

    pub fn with_impersonated_user(mut self, user: impl Into<String>) -> Self {
        self.impersonated_user = Some(user.into());
        self
    }
}

/// Messages that fetch a routing table, and how the answer arrives.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingRequest {
    /// ROUTE, answered by one SUCCESS carrying `rt`
    Route(BoltRequest),
    /// RUN of the routing procedure plus PULL, answered by one record
    Procedure {
        run: BoltRequest,
        pull: BoltRequest,
        database: Option<String>,
    },
}

impl RoutingRequest {
    pub fn into_messages(self) -> Vec<BoltRequest> {
        match self {
            RoutingRequest::Route(route) => vec![route],
            RoutingRequest::Procedure { run, pull, .. } => vec![run, pull],
        }
    }
}

impl Protocol {
    /// Build the routing table request for this version.
    pub fn route(&self, params: &RouteParams) -> BoltResult<RoutingRequest> {
        if params.impersonated_user.is_some() {
            self.require(Feature::Impersonation)?;
        }
        if params.database.is_some() {
            self.require(Feature::MultiDatabase)?;
        }

        if self.supports(Feature::RouteMessage) {
            let target = if self.supports(Feature::Impersonation) {
                RouteTarget::Extra {
                    database: params.database.clone(),
                    impersonated_user: params.impersonated_user.clone(),
                }
            } else {
                RouteTarget::Database(params.database.clone())
            };
            return Ok(RoutingRequest::Route(BoltRequest::Route(RouteMessage {
                routing: params.routing.clone(),
                bookmarks: params.bookmarks.clone(),
                target,
            })));
        }

        let mut parameters = HashMap::new();
        parameters.insert("context".to_string(), params.routing.clone().into());
        let (query, config) = if self.supports(Feature::MultiDatabase) {
            parameters.insert(
                "database".to_string(),
                params
                    .database
                    .as_deref()
                    .map_or(PackStreamValue::Null, Into::into),
            );
            let config = TxConfig::new()
                .with_bookmarks(params.bookmarks.clone())
                .with_mode(AccessMode::Read)
                .with_database(SYSTEM_DATABASE);
            (ROUTING_PROCEDURE_MULTI_DB, config)
        } else {
            (
                ROUTING_PROCEDURE,
                TxConfig::new().with_bookmarks(params.bookmarks.clone()),
            )
        };

        Ok(RoutingRequest::Procedure {
            run: self.run_auto_commit(query, parameters, &config)?,
            pull: self.pull(StreamMessage::ALL, None),
            database: params.database.clone(),
        })
    }
}

/// Routing table from a ROUTE SUCCESS.
pub fn decode_route_success(success: &SuccessMessage) -> BoltResult<RoutingTable> {
    let rt = success
        .get("rt")
        .and_then(|v| v.as_map())
        .ok_or_else(|| BoltError::protocol("ROUTE response has no routing table"))?;
    RoutingTable::from_map(rt).map_err(|e| BoltError::protocol(e.to_string()))
}

/// Routing table from the procedure's single record.
pub fn decode_routing_record(
    fields: &[PackStreamValue],
    database: Option<&str>,
) -> BoltResult<RoutingTable> {
    RoutingTable::from_record(fields, database).map_err(|e| BoltError::protocol(e.to_string()))
}
