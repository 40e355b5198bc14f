//! The persisted catalog root.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ModelError;
use crate::model::{Entity, IdUid, Relation, Uid};
use crate::uid::{UidSource, generate_unique_uid};

/// Root of the persisted schema: every known entity plus the allocation
/// state needed to keep identities stable across runs and contributors.
///
/// Entities are addressed by index into `entities`; the insertion order is
/// kept stable but carries no meaning beyond diff friendliness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    /// Header lines telling users to keep the file under version control.
    #[serde(default)]
    pub comment: Vec<String>,

    pub entities: Vec<Entity>,

    /// Identity of the most recently created entity; drives the next
    /// sequential entity id. Empty while the catalog has no entities.
    #[serde(default)]
    pub last_entity_id: IdUid,

    #[serde(default)]
    pub last_index_id: IdUid,

    #[serde(default)]
    pub last_relation_id: IdUid,

    /// Uids that once existed and must never be reallocated. The entity,
    /// index, and property lists are required in the file; the relation
    /// list is tolerated as absent because older catalogs predate it.
    pub retired_entity_uids: Vec<Uid>,
    pub retired_index_uids: Vec<Uid>,
    pub retired_property_uids: Vec<Uid>,

    #[serde(default)]
    pub retired_relation_uids: Vec<Uid>,

    /// Package the bindings are generated into. Not persisted.
    #[serde(skip)]
    pub package: String,
}

impl Catalog {
    /// A fresh, empty catalog carrying the version-control header comment.
    pub fn new() -> Self {
        Self {
            comment: vec![
                "KEEP THIS FILE! Check it into a version control system (VCS) like git.".to_string(),
                "The schema ledger stores crucial IDs for your data model. See docs for details."
                    .to_string(),
                "If you have VCS merge conflicts, you must resolve them before generating again."
                    .to_string(),
            ],
            entities: Vec::new(),
            last_entity_id: IdUid::unset(),
            last_index_id: IdUid::unset(),
            last_relation_id: IdUid::unset(),
            retired_entity_uids: Vec::new(),
            retired_index_uids: Vec::new(),
            retired_property_uids: Vec::new(),
            retired_relation_uids: Vec::new(),
            package: String::new(),
        }
    }

    /// Finds an entity by uid.
    pub fn find_entity_by_uid(&self, uid: Uid) -> Option<usize> {
        self.entities
            .iter()
            .position(|entity| entity.id.uid_or_zero() == uid)
    }

    /// Finds an entity by name (case-sensitive exact match, first wins).
    pub fn find_entity_by_name(&self, name: &str) -> Option<usize> {
        self.entities.iter().position(|entity| entity.name == name)
    }

    /// Creates a new entity under the next sequential id and a fresh uid,
    /// advancing `lastEntityId`.
    pub fn create_entity(
        &mut self,
        name: impl Into<String>,
        uids: &mut dyn UidSource,
    ) -> Result<usize, ModelError> {
        let id = if self.entities.is_empty() {
            1
        } else {
            self.last_entity_id.id_or_zero() + 1
        };

        let uid = self.generate_uid(uids)?;
        let mut entity = Entity::new(id, uid);
        entity.name = name.into();
        debug!(name = %entity.name, id = %entity.id, "created entity");

        self.last_entity_id = entity.id.clone();
        self.entities.push(entity);
        Ok(self.entities.len() - 1)
    }

    /// Creates a new property on the given entity, drawing its uid from the
    /// catalog-wide uid space.
    pub fn create_property(
        &mut self,
        entity: usize,
        uids: &mut dyn UidSource,
    ) -> Result<usize, ModelError> {
        let uid = self.generate_uid(uids)?;
        Ok(self.entities[entity].create_property(uid))
    }

    /// Creates a new to-many relation on the given entity, advancing
    /// `lastRelationId`.
    pub fn create_relation(
        &mut self,
        entity: usize,
        uids: &mut dyn UidSource,
    ) -> Result<usize, ModelError> {
        let id = if self.last_relation_id.is_empty() {
            1
        } else {
            self.last_relation_id.id_or_zero() + 1
        };
        let uid = self.generate_uid(uids)?;
        self.last_relation_id = IdUid::new(id, uid);

        let owner = &mut self.entities[entity];
        owner.relations.push(Relation::new(self.last_relation_id.clone()));
        Ok(owner.relations.len() - 1)
    }

    /// Gives the property an index identity, advancing `lastIndexId`.
    pub fn create_index(
        &mut self,
        entity: usize,
        property: usize,
        uids: &mut dyn UidSource,
    ) -> Result<(), ModelError> {
        if self.entities[entity].properties[property].index_id.is_some() {
            return Err(ModelError::IndexExists);
        }

        let id = if self.last_index_id.is_empty() {
            1
        } else {
            self.last_index_id.id_or_zero() + 1
        };
        let uid = self.generate_uid(uids)?;
        self.last_index_id = IdUid::new(id, uid);

        self.entities[entity].properties[property].index_id = Some(self.last_index_id.clone());
        Ok(())
    }

    /// Removes the property's index, retiring its uid.
    pub fn remove_index(&mut self, entity: usize, property: usize) -> Result<(), ModelError> {
        let Some(index_id) = self.entities[entity].properties[property].index_id.take() else {
            return Err(ModelError::IndexMissing);
        };

        self.retired_index_uids.push(index_id.uid_or_zero());
        Ok(())
    }

    /// Removes a property, retiring its uid (and its index uid first).
    pub fn remove_property(&mut self, entity: usize, property: usize) -> Result<(), ModelError> {
        if self.entities[entity].properties[property].index_id.is_some() {
            self.remove_index(entity, property)?;
        }

        let removed = self.entities[entity].properties.remove(property);
        debug!(property = %removed.name, id = %removed.id, "retired property");
        self.retired_property_uids.push(removed.id.uid_or_zero());
        Ok(())
    }

    /// Removes a to-many relation, retiring its uid.
    pub fn remove_relation(&mut self, entity: usize, relation: usize) {
        let removed = self.entities[entity].relations.remove(relation);
        debug!(relation = %removed.name, id = %removed.id, "retired relation");
        self.retired_relation_uids.push(removed.id.uid_or_zero());
    }

    /// Draws a fresh uid that is unused anywhere in this catalog.
    pub fn generate_uid(&self, uids: &mut dyn UidSource) -> Result<Uid, ModelError> {
        generate_unique_uid(uids, |candidate| self.contains_uid(candidate))
    }

    /// Whether the given uid is present anywhere in the catalog, including
    /// the "last id" markers and all retired lists.
    pub fn contains_uid(&self, searched: Uid) -> bool {
        if self.last_entity_id.uid_or_zero() == searched
            || self.last_index_id.uid_or_zero() == searched
            || self.last_relation_id.uid_or_zero() == searched
        {
            return true;
        }

        if self.retired_entity_uids.contains(&searched)
            || self.retired_index_uids.contains(&searched)
            || self.retired_property_uids.contains(&searched)
            || self.retired_relation_uids.contains(&searched)
        {
            return true;
        }

        self.entities
            .iter()
            .any(|entity| entity.contains_uid(searched))
    }

    /// Initial validation of loaded data so it doesn't have to be checked in
    /// each operation.
    ///
    /// Reports the first violation found, wrapped with the entity context
    /// needed to locate it. A broken `lastEntityId` pairing is catalog
    /// corruption (typically a bad manual edit or VCS merge) and is never
    /// repaired here.
    pub fn validate(&self) -> Result<(), ModelError> {
        for entity in &self.entities {
            entity
                .validate(&self.retired_property_uids)
                .map_err(|source| ModelError::InvalidEntity {
                    name: entity.name.clone(),
                    id: entity.id.clone(),
                    source: Box::new(source),
                })?;
        }

        let mut seen: FxHashMap<&str, &IdUid> = FxHashMap::default();
        for entity in &self.entities {
            if let Some(first) = seen.insert(entity.name.as_str(), &entity.id) {
                return Err(ModelError::DuplicateName {
                    kind: "entity",
                    name: entity.name.clone(),
                    first: first.clone(),
                    second: entity.id.clone(),
                });
            }
        }

        if !self.entities.is_empty() {
            self.last_entity_id
                .validate()
                .map_err(|source| ModelError::LastIdInvalid {
                    field: "lastEntityId",
                    source,
                })?;

            let last_id = self.last_entity_id.id_or_zero();
            let last_uid = self.last_entity_id.uid_or_zero();

            let mut found = false;
            for entity in &self.entities {
                if last_id == entity.id.id_or_zero() {
                    if last_uid != entity.id.uid_or_zero() {
                        return Err(ModelError::LastIdMismatch {
                            field: "lastEntityId",
                            last: self.last_entity_id.clone(),
                            kind: "entity",
                            name: entity.name.clone(),
                            id: entity.id.clone(),
                        });
                    }
                    found = true;
                } else if last_id < entity.id.id_or_zero() {
                    return Err(ModelError::LastIdLow {
                        field: "lastEntityId",
                        last: self.last_entity_id.clone(),
                        kind: "entity",
                        name: entity.name.clone(),
                        id: entity.id.clone(),
                    });
                }
            }

            if !found && !self.retired_entity_uids.contains(&last_uid) {
                return Err(ModelError::LastIdOrphaned {
                    field: "lastEntityId",
                    last: self.last_entity_id.clone(),
                    kind: "entity",
                });
            }
        }

        if !self.last_index_id.is_empty() {
            self.last_index_id
                .validate()
                .map_err(|source| ModelError::LastIdInvalid {
                    field: "lastIndexId",
                    source,
                })?;
        }

        if !self.last_relation_id.is_empty() {
            self.last_relation_id
                .validate()
                .map_err(|source| ModelError::LastIdInvalid {
                    field: "lastRelationId",
                    source,
                })?;
        }

        Ok(())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
