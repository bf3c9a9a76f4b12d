use tracing::debug;

use super::domain::AssetId;
use super::InventoryError;
use crate::store::InventoryRecords;

/// Sole writer of `Asset::quantity`.
///
/// Callers read the quantity through [`InventoryLedger::lock_and_read_quantity`] before deciding
/// anything; the row lock it takes is held until the transaction ends, so a second transaction
/// observing the same stock waits instead of racing.
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryLedger;

impl InventoryLedger {
    pub fn lock_and_read_quantity<T: InventoryRecords>(
        &self,
        tx: &mut T,
        asset_id: AssetId,
    ) -> Result<u32, InventoryError> {
        let asset = tx
            .lock_asset(asset_id)?
            .ok_or(InventoryError::AssetNotFound(asset_id))?;
        Ok(asset.quantity)
    }

    /// Decrement stock; returns the remaining quantity.
    pub fn decrement<T: InventoryRecords>(
        &self,
        tx: &mut T,
        asset_id: AssetId,
        amount: u32,
    ) -> Result<u32, InventoryError> {
        let available = self.lock_and_read_quantity(tx, asset_id)?;
        if tx.decrement_quantity(asset_id, amount)? == 0 {
            return Err(InventoryError::InsufficientStock {
                asset_id,
                available,
                requested: amount,
            });
        }
        let remaining = available - amount;
        debug!(asset_id = %asset_id, remaining, "asset stock decremented");
        Ok(remaining)
    }
}
