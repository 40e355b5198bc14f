//! schema-ledger: stable-identity schema catalog for binding generators.
//!
//! A binding generator turns data-model declarations into serialization
//! code plus schema metadata. The hard part is not the code generation —
//! it is keeping every entity, property, and relation pinned to the same
//! numeric identity across repeated runs, renames, reordered fields, and
//! independent edits merged through version control. This crate is that
//! part: the persisted catalog, the reconciliation between a fresh parse
//! and the catalog, unique-identity allocation, structural validation, and
//! relation-cycle detection.
//!
//! # Overview
//!
//! - Every schema element carries an [`IdUid`]: a sequential id scoped to
//!   its siblings plus a random 64-bit uid that never changes and is never
//!   reused, even after the element is gone (retired uids stay on record).
//! - A generator run parses the user's declarations into a [`Binding`]
//!   (the parser lives in the generator, not in this crate), then
//!   [`reconcile`]s it against the [`Catalog`]:
//!   match by explicit uid, else by name, else create. Matched elements
//!   keep their identities through renames; new ones get the next
//!   sequential id and a fresh random uid.
//! - [`check_relation_cycles`] rejects cyclic to-one/to-many relation
//!   graphs before any code is emitted.
//! - [`CatalogFile`] persists the catalog as human-diffable JSON meant to
//!   live in version control, holding an exclusively locked file handle so
//!   concurrent runs fail fast instead of corrupting each other's merges.
//!
//! # Quick start
//!
//! ```no_run
//! use schema_ledger::{Binding, BindingEntity, BindingProperty, RandomUidSource, process};
//!
//! let mut binding = Binding {
//!     package: "model".to_string(),
//!     entities: vec![BindingEntity {
//!         name: "Task".to_string(),
//!         properties: vec![
//!             BindingProperty { name: "id".to_string(), ..Default::default() },
//!             BindingProperty { name: "text".to_string(), ..Default::default() },
//!         ],
//!         ..Default::default()
//!     }],
//! };
//!
//! let mut uids = RandomUidSource::new();
//! process("schema-ledger.json", &mut binding, &mut uids)?;
//!
//! // Each binding element now carries its resolved identity.
//! assert_ne!(binding.entities[0].resolved.uid, 0);
//! # Ok::<(), schema_ledger::Error>(())
//! ```
//!
//! # Modules
//!
//! - [`model`]: the catalog tree, identities, and binding shapes
//! - [`uid`]: unique-uid generation behind an injected randomness source
//! - [`reconcile`]: the merge engine
//! - [`validate`]: relation-cycle detection
//! - [`store`]: catalog file persistence
//! - [`pipeline`]: the composed load→merge→check→write pass
//! - [`error`]: error types
//!
//! Failures are never repaired silently: a catalog whose `lastEntityId`
//! does not pair up with its entities, a binding annotation naming an
//! unknown uid, or a relation cycle each abort the run before anything is
//! persisted.

pub mod error;
pub mod model;
pub mod pipeline;
pub mod reconcile;
pub mod store;
pub mod uid;
pub mod validate;

// Re-export commonly used types at crate root
pub use error::{
    ComponentError, CycleError, Error, IdentityError, MergeError, ModelError, StoreError,
};
pub use model::{
    Binding, BindingEntity, BindingProperty, BindingRelation, Catalog, Entity, Id, IdUid,
    Identifier, Property, Relation, Uid,
};
pub use pipeline::process;
pub use reconcile::reconcile;
pub use store::CatalogFile;
pub use uid::{
    RandomUidSource, SequenceUidSource, UID_GENERATION_ATTEMPTS, UidSource, generate_unique_uid,
};
pub use validate::check_relation_cycles;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
