//! Freshly parsed binding declarations, before identity resolution.
//!
//! A binding is the parser's unvalidated mirror of the user's data-model
//! declarations. Reconciliation resolves every element against the catalog
//! and writes the resulting identities back onto these structs; the template
//! renderer consumes the annotated binding afterwards.

use crate::model::{Id, IdUid, Uid};

/// Resolved numeric identity pair, copied onto binding elements during
/// reconciliation. Zero components mean "not resolved yet".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identifier {
    pub id: Id,
    pub uid: Uid,
}

/// Parser output for one generator invocation.
#[derive(Debug, Clone, Default)]
pub struct Binding {
    pub package: String,
    pub entities: Vec<BindingEntity>,
}

#[derive(Debug, Clone, Default)]
pub struct BindingEntity {
    pub name: String,

    /// Explicit uid from a migration annotation, if any. Matching by uid
    /// beats matching by name, which is what makes renames safe.
    pub uid: Option<Uid>,

    /// Set when the annotation was present but empty: the user is asking
    /// the generator to report the element's current uid for a rename.
    pub uid_request: bool,

    pub properties: Vec<BindingProperty>,
    pub relations: Vec<BindingRelation>,

    /// Resolved identity, written by reconciliation.
    pub resolved: Identifier,

    /// The catalog entity's `lastPropertyId` after reconciliation; the
    /// renderer embeds it into the generated model code.
    pub last_property_id: IdUid,
}

#[derive(Debug, Clone, Default)]
pub struct BindingProperty {
    pub name: String,
    pub uid: Option<Uid>,
    pub uid_request: bool,

    /// Value-type code for the generated binding; opaque here.
    pub type_code: u32,

    /// Flag bits for the generated binding; opaque here.
    pub flags: u32,

    /// Target entity name when this property is a to-one relation.
    pub relation_target: Option<String>,

    /// `Some` when the property wants an index; reconciliation fills in the
    /// resolved index identity (the initial value is ignored).
    pub index: Option<Identifier>,

    /// Resolved identity, written by reconciliation.
    pub resolved: Identifier,
}

#[derive(Debug, Clone, Default)]
pub struct BindingRelation {
    pub name: String,
    pub uid: Option<Uid>,
    pub uid_request: bool,

    /// Target entity name.
    pub target: String,

    /// Resolved identity of the relation itself.
    pub resolved: Identifier,

    /// Resolved identity of the target entity.
    pub target_resolved: Identifier,
}
