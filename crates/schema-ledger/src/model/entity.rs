//! A named schema element owning properties and to-many relations.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::model::{Id, IdUid, Property, Relation, Uid};

/// A named entity in the catalog.
///
/// Owns its properties and relations by value; the catalog addresses
/// entities by index, never by shared reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: IdUid,

    /// Identity of the most recently created property, also driving the
    /// next sequential property id. Empty until the first property exists.
    #[serde(default)]
    pub last_property_id: IdUid,

    pub name: String,
    pub properties: Vec<Property>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<Relation>,
}

impl Entity {
    pub(crate) fn new(id: Id, uid: Uid) -> Self {
        Self {
            id: IdUid::new(id, uid),
            last_property_id: IdUid::unset(),
            name: String::new(),
            properties: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Finds a property by uid.
    pub fn find_property_by_uid(&self, uid: Uid) -> Option<usize> {
        self.properties
            .iter()
            .position(|property| property.id.uid_or_zero() == uid)
    }

    /// Finds a property by name (case-sensitive exact match, first wins).
    pub fn find_property_by_name(&self, name: &str) -> Option<usize> {
        self.properties
            .iter()
            .position(|property| property.name == name)
    }

    /// Finds a to-many relation by uid.
    pub fn find_relation_by_uid(&self, uid: Uid) -> Option<usize> {
        self.relations
            .iter()
            .position(|relation| relation.id.uid_or_zero() == uid)
    }

    /// Finds a to-many relation by name (case-sensitive exact match).
    pub fn find_relation_by_name(&self, name: &str) -> Option<usize> {
        self.relations
            .iter()
            .position(|relation| relation.name == name)
    }

    /// Appends a property under the next sequential id, with a uid the
    /// caller already verified to be unique catalog-wide.
    pub(crate) fn create_property(&mut self, uid: Uid) -> usize {
        let id: Id = if self.properties.is_empty() {
            1
        } else {
            self.last_property_id.id_or_zero() + 1
        };

        let property = Property::new(id, uid);
        self.last_property_id = property.id.clone();
        self.properties.push(property);
        self.properties.len() - 1
    }

    /// Initial validation of loaded data so it doesn't have to be checked in
    /// each operation.
    ///
    /// `retired_property_uids` comes from the owning catalog: a
    /// `lastPropertyId` whose uid matches no live property is still fine if
    /// that uid was retired (the newest property may have been removed).
    pub fn validate(&self, retired_property_uids: &[Uid]) -> Result<(), ModelError> {
        self.id.validate()?;

        if self.name.is_empty() {
            return Err(ModelError::NameUndefined);
        }

        if !self.properties.is_empty() {
            self.last_property_id
                .validate()
                .map_err(|source| ModelError::LastIdInvalid {
                    field: "lastPropertyId",
                    source,
                })?;

            let last_id = self.last_property_id.id_or_zero();
            let last_uid = self.last_property_id.uid_or_zero();

            let mut found = false;
            for property in &self.properties {
                if last_id == property.id.id_or_zero() {
                    if last_uid != property.id.uid_or_zero() {
                        return Err(ModelError::LastIdMismatch {
                            field: "lastPropertyId",
                            last: self.last_property_id.clone(),
                            kind: "property",
                            name: property.name.clone(),
                            id: property.id.clone(),
                        });
                    }
                    found = true;
                } else if last_id < property.id.id_or_zero() {
                    return Err(ModelError::LastIdLow {
                        field: "lastPropertyId",
                        last: self.last_property_id.clone(),
                        kind: "property",
                        name: property.name.clone(),
                        id: property.id.clone(),
                    });
                }
            }

            if !found && !retired_property_uids.contains(&last_uid) {
                return Err(ModelError::LastIdOrphaned {
                    field: "lastPropertyId",
                    last: self.last_property_id.clone(),
                    kind: "property",
                });
            }
        }

        for property in &self.properties {
            property
                .validate()
                .map_err(|source| ModelError::InvalidProperty {
                    name: property.name.clone(),
                    id: property.id.clone(),
                    source: Box::new(source),
                })?;
        }

        let mut seen: FxHashMap<&str, &IdUid> = FxHashMap::default();
        for property in &self.properties {
            if let Some(first) = seen.insert(property.name.as_str(), &property.id) {
                return Err(ModelError::DuplicateName {
                    kind: "property",
                    name: property.name.clone(),
                    first: first.clone(),
                    second: property.id.clone(),
                });
            }
        }

        for relation in &self.relations {
            relation
                .validate()
                .map_err(|source| ModelError::InvalidRelation {
                    name: relation.name.clone(),
                    id: relation.id.clone(),
                    source: Box::new(source),
                })?;
        }

        let mut seen: FxHashMap<&str, &IdUid> = FxHashMap::default();
        for relation in &self.relations {
            if let Some(first) = seen.insert(relation.name.as_str(), &relation.id) {
                return Err(ModelError::DuplicateName {
                    kind: "relation",
                    name: relation.name.clone(),
                    first: first.clone(),
                    second: relation.id.clone(),
                });
            }
        }

        Ok(())
    }

    /// Whether the given uid appears anywhere inside this entity.
    pub fn contains_uid(&self, searched: Uid) -> bool {
        if self.id.uid_or_zero() == searched {
            return true;
        }

        if self.last_property_id.uid_or_zero() == searched {
            return true;
        }

        if self.properties.iter().any(|p| p.contains_uid(searched)) {
            return true;
        }

        self.relations
            .iter()
            .any(|r| r.id.uid_or_zero() == searched)
    }
}
