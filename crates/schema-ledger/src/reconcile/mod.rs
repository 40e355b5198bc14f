//! Merges a freshly parsed binding into the persisted catalog.
//!
//! Matching policy, at every level: an explicit uid wins over a name match,
//! a name match wins over creation, and an explicit uid that matches nothing
//! is fatal (it protects against stale or mistyped migration annotations).
//! The uid-first rule is what makes renames safe — an element keeping its
//! uid annotation resolves to its existing catalog row even though the name
//! changed, instead of being treated as delete-plus-create.

use tracing::debug;

use crate::error::{IdentityError, MergeError};
use crate::model::{
    Binding, BindingEntity, BindingProperty, BindingRelation, Catalog, Identifier,
};
use crate::uid::UidSource;

/// Reconciles `binding` against `catalog`.
///
/// Mutates the catalog (new elements, renames, pruned properties/relations,
/// advanced "last id" markers) and the binding (resolved identities). Any
/// failure aborts the whole merge; the caller must not persist the catalog
/// afterwards.
pub fn reconcile(
    binding: &mut Binding,
    catalog: &mut Catalog,
    uids: &mut dyn UidSource,
) -> Result<(), MergeError> {
    // Resolve every entity before merging any of them, so relation targets
    // can be found even when the target entity appears later in the binding.
    let mut resolved = Vec::with_capacity(binding.entities.len());
    for entity in &binding.entities {
        resolved.push(resolve_entity(entity, catalog, uids)?);
    }

    for (bind, index) in binding.entities.iter_mut().zip(resolved) {
        merge_entity(bind, catalog, index, uids)?;
    }

    catalog.package = binding.package.clone();
    Ok(())
}

/// Finds the catalog entity the binding entity refers to, creating one when
/// it is genuinely new.
fn resolve_entity(
    bind: &BindingEntity,
    catalog: &mut Catalog,
    uids: &mut dyn UidSource,
) -> Result<usize, MergeError> {
    if let Some(uid) = bind.uid {
        return catalog
            .find_entity_by_uid(uid)
            .ok_or(MergeError::EntityUidNotFound { uid });
    }

    let by_name = catalog.find_entity_by_name(&bind.name);

    if bind.uid_request {
        let hint = match by_name {
            Some(index) => {
                let uid = catalog.entities[index]
                    .id
                    .uid()
                    .map_err(IdentityError::Uid)?;
                format!("entity uid = {uid}")
            }
            None => "entity not found in the model".to_string(),
        };
        return Err(MergeError::EntityUidRequest {
            hint,
            entity: bind.name.clone(),
        });
    }

    match by_name {
        Some(index) => {
            debug!(entity = %bind.name, "matched entity by name");
            Ok(index)
        }
        None => Ok(catalog.create_entity(bind.name.clone(), uids)?),
    }
}

fn merge_entity(
    bind: &mut BindingEntity,
    catalog: &mut Catalog,
    index: usize,
    uids: &mut dyn UidSource,
) -> Result<(), MergeError> {
    // A uid match with a changed name lands here: the catalog row keeps its
    // identity and takes the binding's current name.
    catalog.entities[index].name = bind.name.clone();
    let (id, uid) = catalog.entities[index].id.get()?;
    bind.resolved = Identifier { id, uid };

    for property in &mut bind.properties {
        let slot = resolve_property(property, catalog, index, uids)?;
        merge_property(property, catalog, index, slot, uids)?;
    }

    // Prune catalog properties that disappeared from the binding, retiring
    // their uids so they are never reallocated.
    let removed: Vec<usize> = catalog.entities[index]
        .properties
        .iter()
        .enumerate()
        .filter(|(_, property)| !bind.properties.iter().any(|bp| bp.name == property.name))
        .map(|(slot, _)| slot)
        .collect();
    for slot in removed.into_iter().rev() {
        catalog.remove_property(index, slot)?;
    }

    bind.last_property_id = catalog.entities[index].last_property_id.clone();

    for relation in &mut bind.relations {
        let slot = resolve_relation(relation, catalog, index, uids)?;
        merge_relation(relation, catalog, index, slot)?;
    }

    let removed: Vec<usize> = catalog.entities[index]
        .relations
        .iter()
        .enumerate()
        .filter(|(_, relation)| !bind.relations.iter().any(|br| br.name == relation.name))
        .map(|(slot, _)| slot)
        .collect();
    for slot in removed.into_iter().rev() {
        catalog.remove_relation(index, slot);
    }

    Ok(())
}

fn resolve_property(
    bind: &BindingProperty,
    catalog: &mut Catalog,
    entity: usize,
    uids: &mut dyn UidSource,
) -> Result<usize, MergeError> {
    if let Some(uid) = bind.uid {
        return catalog.entities[entity]
            .find_property_by_uid(uid)
            .ok_or_else(|| MergeError::PropertyUidNotFound {
                uid,
                entity: catalog.entities[entity].name.clone(),
            });
    }

    let by_name = catalog.entities[entity].find_property_by_name(&bind.name);

    if bind.uid_request {
        let hint = match by_name {
            Some(slot) => {
                let uid = catalog.entities[entity].properties[slot]
                    .id
                    .uid()
                    .map_err(IdentityError::Uid)?;
                format!("property uid = {uid}")
            }
            None => "property not found in the model".to_string(),
        };
        return Err(MergeError::PropertyUidRequest {
            hint,
            property: bind.name.clone(),
            entity: catalog.entities[entity].name.clone(),
        });
    }

    match by_name {
        Some(slot) => Ok(slot),
        None => Ok(catalog.create_property(entity, uids)?),
    }
}

fn merge_property(
    bind: &mut BindingProperty,
    catalog: &mut Catalog,
    entity: usize,
    slot: usize,
    uids: &mut dyn UidSource,
) -> Result<(), MergeError> {
    {
        let property = &mut catalog.entities[entity].properties[slot];
        property.name = bind.name.clone();
        property.type_code = bind.type_code;
        property.flags = bind.flags;
        property.relation_target = bind.relation_target.clone();

        let (id, uid) = property.id.get()?;
        bind.resolved = Identifier { id, uid };
    }

    match &mut bind.index {
        None => {
            // The binding no longer wants an index; drop a stale one.
            if catalog.entities[entity].properties[slot].index_id.is_some() {
                catalog.remove_index(entity, slot)?;
            }
        }
        Some(requested) => {
            if catalog.entities[entity].properties[slot].index_id.is_none() {
                catalog.create_index(entity, slot, uids)?;
            }

            if let Some(index_id) = &catalog.entities[entity].properties[slot].index_id {
                let (id, uid) = index_id.get()?;
                *requested = Identifier { id, uid };
            }
        }
    }

    Ok(())
}

fn resolve_relation(
    bind: &BindingRelation,
    catalog: &mut Catalog,
    entity: usize,
    uids: &mut dyn UidSource,
) -> Result<usize, MergeError> {
    if let Some(uid) = bind.uid {
        return catalog.entities[entity]
            .find_relation_by_uid(uid)
            .ok_or_else(|| MergeError::RelationUidNotFound {
                uid,
                entity: catalog.entities[entity].name.clone(),
            });
    }

    let by_name = catalog.entities[entity].find_relation_by_name(&bind.name);

    if bind.uid_request {
        let hint = match by_name {
            Some(slot) => {
                let uid = catalog.entities[entity].relations[slot]
                    .id
                    .uid()
                    .map_err(IdentityError::Uid)?;
                format!("relation uid = {uid}")
            }
            None => "relation not found in the model".to_string(),
        };
        return Err(MergeError::RelationUidRequest {
            hint,
            relation: bind.name.clone(),
            entity: catalog.entities[entity].name.clone(),
        });
    }

    match by_name {
        Some(slot) => Ok(slot),
        None => Ok(catalog.create_relation(entity, uids)?),
    }
}

fn merge_relation(
    bind: &mut BindingRelation,
    catalog: &mut Catalog,
    entity: usize,
    slot: usize,
) -> Result<(), MergeError> {
    {
        let relation = &mut catalog.entities[entity].relations[slot];
        relation.name = bind.name.clone();
        relation.target = bind.target.clone();

        let (id, uid) = relation.id.get()?;
        bind.resolved = Identifier { id, uid };
    }

    // The target must already be in the catalog: either it was there before
    // or the first reconciliation phase created it from this binding.
    let Some(target) = catalog.find_entity_by_name(&bind.target) else {
        return Err(MergeError::RelationTargetNotFound {
            relation: bind.name.clone(),
            entity: catalog.entities[entity].name.clone(),
            target: bind.target.clone(),
        });
    };

    let (id, uid) = catalog.entities[target].id.get()?;
    bind.target_resolved = Identifier { id, uid };
    Ok(())
}
