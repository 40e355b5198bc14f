//! Paired sequential-id / random-uid identities.
//!
//! Every schema element carries an [`IdUid`]: a sequential id scoped to its
//! siblings plus a random 64-bit uid that stays stable across renames and
//! generator runs. The canonical text form is `"<id>:<uid>"`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ComponentError, IdentityError};

/// Sequential id, scoped to siblings (entities within a catalog, properties
/// within an entity).
pub type Id = u32;

/// Random uid. Unique across the whole catalog for entities, indexes, and
/// relations; unique within an entity for properties. Zero is reserved as
/// "unset".
pub type Uid = u64;

/// A paired identity in its canonical `"<id>:<uid>"` text form.
///
/// The raw text is kept verbatim so that invalid values loaded from a
/// catalog file stay representable until [`IdUid::validate`] reports them;
/// accessors parse on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdUid(String);

impl IdUid {
    /// Builds the canonical text for an `(id, uid)` pair.
    ///
    /// Never fails; a zero component is a caller bug that the value keeps
    /// representable so [`IdUid::validate`] can catch it.
    pub fn new(id: Id, uid: Uid) -> Self {
        Self(format!("{id}:{uid}"))
    }

    /// The "unset" identity (empty text).
    pub fn unset() -> Self {
        Self(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checks both components and the overall format.
    ///
    /// Fails when the text is empty, does not split into exactly two
    /// components, either component does not parse within its bit width,
    /// or either component is zero.
    pub fn validate(&self) -> Result<(), IdentityError> {
        self.uid().map_err(IdentityError::Uid)?;
        self.id().map_err(IdentityError::Id)?;

        if self.0.split(':').count() != 2 {
            return Err(IdentityError::Format);
        }

        Ok(())
    }

    /// The sequential id component.
    pub fn id(&self) -> Result<Id, ComponentError> {
        self.component(0, 32).map(|value| value as Id)
    }

    /// The uid component.
    pub fn uid(&self) -> Result<Uid, ComponentError> {
        self.component(1, 64)
    }

    /// Both components at once.
    pub fn get(&self) -> Result<(Id, Uid), IdentityError> {
        let id = self.id().map_err(IdentityError::Id)?;
        let uid = self.uid().map_err(IdentityError::Uid)?;
        Ok((id, uid))
    }

    /// The id component, or zero when the text is not a valid identity.
    pub fn id_or_zero(&self) -> Id {
        self.id().unwrap_or(0)
    }

    /// The uid component, or zero when the text is not a valid identity.
    pub fn uid_or_zero(&self) -> Uid {
        self.uid().unwrap_or(0)
    }

    fn component(&self, n: usize, bits: u32) -> Result<u64, ComponentError> {
        if self.0.is_empty() {
            return Err(ComponentError::Undefined);
        }

        let text = self
            .0
            .split(':')
            .nth(n)
            .ok_or(ComponentError::Undefined)?;

        let value: u64 = text.parse().map_err(|_| ComponentError::Unparsable {
            text: text.to_string(),
        })?;

        if bits < u64::BITS && value >> bits != 0 {
            return Err(ComponentError::Unparsable {
                text: text.to_string(),
            });
        }

        if value == 0 {
            return Err(ComponentError::Zero);
        }

        Ok(value)
    }
}

impl fmt::Display for IdUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IdUid {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_new_get_roundtrip() {
        let id_uid = IdUid::new(7, 4025884778037989846);
        assert_eq!(id_uid.as_str(), "7:4025884778037989846");
        assert_eq!(id_uid.id().unwrap(), 7);
        assert_eq!(id_uid.uid().unwrap(), 4025884778037989846);
        assert_eq!(id_uid.get().unwrap(), (7, 4025884778037989846));
        assert!(id_uid.validate().is_ok());
    }

    #[test]
    fn test_zero_components_rejected() {
        assert_eq!(
            IdUid::new(0, 5).validate(),
            Err(IdentityError::Id(ComponentError::Zero))
        );
        assert_eq!(
            IdUid::new(5, 0).validate(),
            Err(IdentityError::Uid(ComponentError::Zero))
        );
    }

    #[test]
    fn test_empty_is_undefined() {
        let id_uid = IdUid::unset();
        assert!(id_uid.is_empty());
        assert_eq!(
            id_uid.validate(),
            Err(IdentityError::Uid(ComponentError::Undefined))
        );
        assert_eq!(id_uid.id_or_zero(), 0);
        assert_eq!(id_uid.uid_or_zero(), 0);
    }

    #[test]
    fn test_missing_component() {
        // No separator at all: the uid component does not exist.
        let id_uid = IdUid::from("42");
        assert_eq!(
            id_uid.validate(),
            Err(IdentityError::Uid(ComponentError::Undefined))
        );
        assert_eq!(id_uid.id_or_zero(), 42);
    }

    #[test]
    fn test_too_many_colons() {
        // Both leading components parse, so only the format check trips.
        let id_uid = IdUid::from("1:2:3");
        assert_eq!(id_uid.validate(), Err(IdentityError::Format));
    }

    #[test]
    fn test_unparsable_components() {
        assert!(matches!(
            IdUid::from("x:2").validate(),
            Err(IdentityError::Id(ComponentError::Unparsable { .. }))
        ));
        assert!(matches!(
            IdUid::from("1:-2").validate(),
            Err(IdentityError::Uid(ComponentError::Unparsable { .. }))
        ));
    }

    #[test]
    fn test_id_exceeds_32_bits() {
        let id_uid = IdUid::from("4294967296:1");
        assert!(matches!(
            id_uid.id(),
            Err(ComponentError::Unparsable { .. })
        ));
        // The uid side of the same value is fine.
        assert_eq!(id_uid.uid().unwrap(), 1);
    }

    #[test]
    fn test_serde_transparent() {
        let id_uid = IdUid::new(3, 99);
        let json = serde_json::to_string(&id_uid).unwrap();
        assert_eq!(json, "\"3:99\"");
        let back: IdUid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id_uid);
    }

    proptest! {
        #[test]
        fn prop_roundtrip(id in 1u32.., uid in 1u64..) {
            let id_uid = IdUid::new(id, uid);
            prop_assert_eq!(id_uid.id().unwrap(), id);
            prop_assert_eq!(id_uid.uid().unwrap(), uid);
            prop_assert!(id_uid.validate().is_ok());
        }
    }
}
