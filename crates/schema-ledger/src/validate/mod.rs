//! Semantic validation over the reconciled catalog: relation-cycle detection.
//!
//! Structural validation (identities, "last id" pairings, duplicate names)
//! lives on the model types; this pass needs the whole catalog because it
//! follows edges between entities.

use rustc_hash::FxHashSet;

use crate::error::CycleError;
use crate::model::Catalog;

/// Checks to-one and to-many relation edges between entities for cycles.
///
/// Depth-first per entity, with a recursion-stack set of entities on the
/// current path. Following an edge into an entity that is already on the
/// stack is a cycle, reported with the dotted path walked so far and the
/// entity the cycle closes at. A relation target naming an entity that is
/// not in this catalog is skipped — the generator may process source files
/// independently, so an unresolved target is not an error here.
pub fn check_relation_cycles(catalog: &Catalog) -> Result<(), CycleError> {
    let mut stack = FxHashSet::default();
    for index in 0..catalog.entities.len() {
        visit(catalog, index, &mut stack, catalog.entities[index].name.clone())?;
    }

    Ok(())
}

fn visit(
    catalog: &Catalog,
    index: usize,
    stack: &mut FxHashSet<usize>,
    path: String,
) -> Result<(), CycleError> {
    stack.insert(index);
    let entity = &catalog.entities[index];

    // to-many relations
    for relation in &entity.relations {
        follow(
            catalog,
            catalog.find_entity_by_name(&relation.target),
            stack,
            &path,
            &relation.name,
        )?;
    }

    // to-one relations
    for property in &entity.properties {
        let Some(target) = &property.relation_target else {
            continue;
        };

        follow(
            catalog,
            catalog.find_entity_by_name(target),
            stack,
            &path,
            &property.name,
        )?;
    }

    // Not globally "visited": the same entity reachable over two disjoint
    // paths is not a cycle, so it must be revisitable after backtracking.
    stack.remove(&index);
    Ok(())
}

fn follow(
    catalog: &Catalog,
    target: Option<usize>,
    stack: &mut FxHashSet<usize>,
    path: &str,
    edge: &str,
) -> Result<(), CycleError> {
    let Some(target) = target else {
        // Target entity not defined in the files processed by this run.
        return Ok(());
    };

    if stack.contains(&target) {
        return Err(CycleError {
            path: path.to_string(),
            closing: catalog.entities[target].name.clone(),
        });
    }

    visit(catalog, target, stack, format!("{path}.{edge}"))
}
