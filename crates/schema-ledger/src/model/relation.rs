//! Standalone to-many relations between entities.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::model::IdUid;

/// A to-many relation declared on an entity, pointing at another entity.
///
/// Relations draw their ids from the catalog-level `lastRelationId` counter
/// and the catalog-wide uid space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    pub id: IdUid,
    pub name: String,

    /// Target entity name. Not persisted: targets are re-established from
    /// the binding on every generator run, so a freshly loaded catalog has
    /// no relation edges until it has been reconciled.
    #[serde(skip)]
    pub target: String,
}

impl Relation {
    pub(crate) fn new(id: IdUid) -> Self {
        Self {
            id,
            name: String::new(),
            target: String::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        self.id.validate()?;

        if self.name.is_empty() {
            return Err(ModelError::NameUndefined);
        }

        Ok(())
    }
}
