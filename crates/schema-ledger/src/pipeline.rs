//! One full generator pass over a catalog file.

use std::path::Path;

use tracing::debug;

use crate::error::Error;
use crate::model::Binding;
use crate::reconcile::reconcile;
use crate::store::CatalogFile;
use crate::uid::UidSource;
use crate::validate::check_relation_cycles;

/// Loads (or creates) the catalog at `path`, reconciles `binding` into it,
/// checks relation cycles, and persists the result.
///
/// The merged catalog reaches disk only after reconciliation and cycle
/// checking have both succeeded; any earlier failure leaves the file with
/// its previous contents. The binding carries resolved identities afterwards
/// and is ready for the template renderer.
pub fn process(
    path: impl AsRef<Path>,
    binding: &mut Binding,
    uids: &mut dyn UidSource,
) -> Result<(), Error> {
    let mut file = CatalogFile::load_or_create(path)?;

    file.catalog().validate()?;
    reconcile(binding, file.catalog_mut(), uids)?;
    check_relation_cycles(file.catalog())?;

    file.write()?;
    file.close()?;

    debug!(entities = binding.entities.len(), "binding reconciled");
    Ok(())
}
