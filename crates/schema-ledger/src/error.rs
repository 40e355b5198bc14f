//! Error types for catalog validation, reconciliation, and persistence.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::{IdUid, Uid};

/// A single `id` or `uid` component failed to resolve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComponentError {
    #[error("is undefined")]
    Undefined,

    #[error("can't parse '{text}' as unsigned int")]
    Unparsable { text: String },

    #[error("equals to zero")]
    Zero,
}

/// Malformed `"<id>:<uid>"` identity text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("id: {0}")]
    Id(ComponentError),

    #[error("uid: {0}")]
    Uid(ComponentError),

    #[error("invalid format - too many colons")]
    Format,
}

/// Catalog corruption, invalid structure, or identity-allocation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("entity {name} {id} is invalid: {source}")]
    InvalidEntity {
        name: String,
        id: IdUid,
        source: Box<ModelError>,
    },

    #[error("property {name} {id} is invalid: {source}")]
    InvalidProperty {
        name: String,
        id: IdUid,
        source: Box<ModelError>,
    },

    #[error("relation {name} {id} is invalid: {source}")]
    InvalidRelation {
        name: String,
        id: IdUid,
        source: Box<ModelError>,
    },

    #[error("{field}: {source}")]
    LastIdInvalid {
        field: &'static str,
        source: IdentityError,
    },

    #[error("{field} {last} doesn't match {kind} {name} {id}")]
    LastIdMismatch {
        field: &'static str,
        last: IdUid,
        kind: &'static str,
        name: String,
        id: IdUid,
    },

    #[error("{field} {last} is lower than {kind} {name} {id}")]
    LastIdLow {
        field: &'static str,
        last: IdUid,
        kind: &'static str,
        name: String,
        id: IdUid,
    },

    #[error("{field} {last} doesn't match any {kind}")]
    LastIdOrphaned {
        field: &'static str,
        last: IdUid,
        kind: &'static str,
    },

    #[error("indexId: {0}")]
    IndexId(IdentityError),

    #[error("name is undefined")]
    NameUndefined,

    #[error("duplicate {kind} name {name}: {first} and {second}")]
    DuplicateName {
        kind: &'static str,
        name: String,
        first: IdUid,
        second: IdUid,
    },

    #[error("can't create an index - it already exists")]
    IndexExists,

    #[error("can't remove index - it's not defined")]
    IndexMissing,

    #[error("internal error: could not generate a unique uid after {attempts} attempts")]
    UidExhausted { attempts: usize },
}

/// Reconciliation failure: the binding and the catalog cannot be merged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("entity with uid {uid} was not found")]
    EntityUidNotFound { uid: Uid },

    #[error("property with uid {uid} was not found in entity {entity}")]
    PropertyUidNotFound { uid: Uid, entity: String },

    #[error("relation with uid {uid} was not found in entity {entity}")]
    RelationUidNotFound { uid: Uid, entity: String },

    #[error("uid annotation value must not be empty ({hint}) on entity {entity}")]
    EntityUidRequest { hint: String, entity: String },

    #[error("uid annotation value must not be empty ({hint}) on property {property}, entity {entity}")]
    PropertyUidRequest {
        hint: String,
        property: String,
        entity: String,
    },

    #[error("uid annotation value must not be empty ({hint}) on relation {relation}, entity {entity}")]
    RelationUidRequest {
        hint: String,
        relation: String,
        entity: String,
    },

    #[error("relation {relation} of entity {entity} targets unknown entity {target}")]
    RelationTargetNotFound {
        relation: String,
        entity: String,
        target: String,
    },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Identity(#[from] IdentityError),
}

/// A cycle in the relation graph between catalog entities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("relation cycle detected: {path} ({closing})")]
pub struct CycleError {
    /// Dotted path of relation hops, starting at the entity that opened the
    /// traversal (e.g. `Order.customer.employer`).
    pub path: String,
    /// Name of the entity at which the cycle closes.
    pub closing: String,
}

/// Catalog file I/O or deserialization failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("can't open file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("file {path} is already locked by another process")]
    Locked { path: PathBuf },

    #[error("can't read file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("can't parse file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("can't write file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("can't close file {path}: {source}")]
    Close {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Umbrella error for a full generator pass.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Cycle(#[from] CycleError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
