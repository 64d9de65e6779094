//! Error types for graph construction, registration and serialization

use crate::graph::NodeId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown op: {0}")]
    UnknownOp(String),

    /// A non-hidden op was registered without one of its documentation fields.
    #[error("op '{op}' is missing documentation: {field}")]
    MissingDocumentation { op: String, field: String },

    #[error("op '{op}' has no input named '{input}'")]
    UnexpectedInput { op: String, input: String },

    #[error("node {0} does not exist in this graph")]
    UnknownNode(NodeId),

    /// An executor query failed.
    #[error("query failed: {0}")]
    Query(#[from] anyhow::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid type: {0}")]
    InvalidType(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
