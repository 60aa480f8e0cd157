// src/error.rs

use crate::model::node::{NodeId, StateCategory};
use thiserror::Error;

/// Errors raised while advancing node state or running an episode.
///
/// None of these are retried; they surface to the caller immediately.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("invariant violation on node {node}: {message}")]
    InvariantViolation { node: NodeId, message: String },

    #[error("invalid transition on node {node}: {operation} not allowed in {category:?} with {remaining_time} periods left")]
    InvalidTransition {
        node: NodeId,
        operation: &'static str,
        category: StateCategory,
        remaining_time: u32,
    },

    #[error("policy for node {node} is misconfigured: {message}")]
    PolicyMisconfiguration { node: NodeId, message: String },

    #[error("policy bound to node {bound} was asked to decide for node {requested}")]
    PolicyBinding { bound: NodeId, requested: NodeId },

    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Rejected network or simulation configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("duplicate node id {0}")]
    DuplicateNode(NodeId),

    #[error("node {node} references unknown node {missing}")]
    UnknownEdgeEndpoint { node: NodeId, missing: NodeId },

    #[error("configuration refers to unknown node {0}")]
    UnknownNode(NodeId),

    #[error("at most one sub-assembly node is supported, found {0}")]
    MultipleSubAssemblies(usize),

    #[error("requirement vector has {actual} entries but the network has {expected} raw-material nodes")]
    RequirementLength { expected: usize, actual: usize },

    #[error("requirement for raw-material input {0} must be at least 1")]
    ZeroRequirement(usize),

    #[error("sub-assembly node {0} has no raw-material inputs")]
    MissingRawMaterials(NodeId),

    #[error("node {0} must have a positive capacity")]
    InvalidCapacity(NodeId),

    #[error("{what} must be finite and non-negative, got {value}")]
    InvalidRate { what: String, value: f64 },

    #[error("{what} must be finite and non-negative, got {value}")]
    InvalidCost { what: String, value: f64 },

    #[error("lead time range [{min}, {max}] is invalid (need 1 <= min <= max)")]
    InvalidLeadTime { min: u32, max: u32 },

    #[error("simulation horizon must be at least one period")]
    ZeroHorizon,

    #[error("initial state of node {node} is invalid: {message}")]
    InitialState { node: NodeId, message: String },
}

/// Failure while rendering period records for the log collaborator.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("csv serialization failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("csv buffer could not be flushed: {0}")]
    Flush(String),

    #[error("csv output is not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type SimResult<T> = Result<T, SimError>;
