//! A named field within an entity.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::model::{Id, IdUid, Uid};

/// A named field of an [`Entity`](crate::model::Entity).
///
/// The id is sequential within the owning entity; the uid is drawn from the
/// catalog-wide uid space. An optional index identity is allocated from the
/// catalog's `lastIndexId` counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: IdUid,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_id: Option<IdUid>,

    /// Value-type code declared by the binding; opaque to the catalog.
    #[serde(rename = "type", default)]
    pub type_code: u32,

    /// Flag bits declared by the binding; opaque to the catalog.
    #[serde(default, skip_serializing_if = "flags_unset")]
    pub flags: u32,

    /// Target entity name of a to-one relation, if this property is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_target: Option<String>,
}

fn flags_unset(flags: &u32) -> bool {
    *flags == 0
}

impl Property {
    pub(crate) fn new(id: Id, uid: Uid) -> Self {
        Self {
            id: IdUid::new(id, uid),
            name: String::new(),
            index_id: None,
            type_code: 0,
            flags: 0,
            relation_target: None,
        }
    }

    /// Initial validation of loaded data so later passes can assume sane
    /// identities.
    pub fn validate(&self) -> Result<(), ModelError> {
        self.id.validate()?;

        if let Some(index_id) = &self.index_id {
            index_id.validate().map_err(ModelError::IndexId)?;
        }

        if self.name.is_empty() {
            return Err(ModelError::NameUndefined);
        }

        Ok(())
    }

    /// Whether the given uid belongs to this property or its index.
    pub fn contains_uid(&self, searched: Uid) -> bool {
        if self.id.uid_or_zero() == searched {
            return true;
        }

        matches!(&self.index_id, Some(index_id) if index_id.uid_or_zero() == searched)
    }
}
