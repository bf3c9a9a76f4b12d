//! Asset catalogue and stock ledger.

pub mod domain;
pub mod ledger;
pub mod router;

use std::sync::Arc;

use tracing::info;

use crate::store::{transaction, InventoryRecords, Store, StoreError};
use domain::{Asset, AssetId, AssetRegistration, AssetUpdate, NewAsset};

pub use ledger::InventoryLedger;
pub use router::inventory_router;

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("asset with id {0} not found")]
    AssetNotFound(AssetId),
    #[error("insufficient asset quantity for asset {asset_id} (available {available}, requested {requested})")]
    InsufficientStock {
        asset_id: AssetId,
        available: u32,
        requested: u32,
    },
    #[error("serial number already exists")]
    SerialNumberTaken,
    #[error("Cannot delete asset: it is assigned to an employee or referenced elsewhere")]
    AssetReferenced(AssetId),
    #[error("invalid asset: {0}")]
    Invalid(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AssetRegistration {
    /// Validate an inbound registration into an insertable row.
    pub fn validate(self) -> Result<NewAsset, InventoryError> {
        let asset_type = required(self.asset_type, "asset_type")?;
        let serial_number = required(self.serial_number, "serial_number")?;
        let quantity = match self.quantity {
            None => 1,
            Some(quantity) => u32::try_from(quantity).map_err(|_| {
                InventoryError::Invalid(format!(
                    "quantity must be a non-negative integer, got {quantity}"
                ))
            })?,
        };
        if let (Some(purchased), Some(expiry)) = (self.purchase_date, self.warranty_expiry) {
            if expiry < purchased {
                return Err(InventoryError::Invalid(
                    "warranty_expiry must not precede purchase_date".to_string(),
                ));
            }
        }

        Ok(NewAsset {
            asset_type,
            brand: self.brand,
            model: self.model,
            specifications: self.specifications,
            serial_number,
            vendor: self.vendor,
            purchase_date: self.purchase_date,
            warranty_expiry: self.warranty_expiry,
            status: self.status.unwrap_or_default(),
            quantity,
        })
    }
}

impl AssetUpdate {
    /// Apply the provided fields onto `asset`, leaving omitted ones untouched.
    pub fn apply(self, asset: &mut Asset) -> Result<(), InventoryError> {
        if self.quantity.is_some() {
            return Err(InventoryError::Invalid(
                "quantity cannot be edited; stock changes through issuance".to_string(),
            ));
        }
        if let Some(asset_type) = self.asset_type {
            asset.asset_type = required(Some(asset_type), "asset_type")?;
        }
        if let Some(serial_number) = self.serial_number {
            asset.serial_number = required(Some(serial_number), "serial_number")?;
        }
        if self.brand.is_some() {
            asset.brand = self.brand;
        }
        if self.model.is_some() {
            asset.model = self.model;
        }
        if self.specifications.is_some() {
            asset.specifications = self.specifications;
        }
        if self.vendor.is_some() {
            asset.vendor = self.vendor;
        }
        if self.purchase_date.is_some() {
            asset.purchase_date = self.purchase_date;
        }
        if self.warranty_expiry.is_some() {
            asset.warranty_expiry = self.warranty_expiry;
        }
        if let Some(status) = self.status {
            asset.status = status;
        }
        if let (Some(purchased), Some(expiry)) = (asset.purchase_date, asset.warranty_expiry) {
            if expiry < purchased {
                return Err(InventoryError::Invalid(
                    "warranty_expiry must not precede purchase_date".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, InventoryError> {
    match value.map(|value| value.trim().to_string()) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(InventoryError::Invalid(format!("{field} is required"))),
    }
}

/// Administrative catalogue operations. Stock decrements belong to [`InventoryLedger`].
pub struct InventoryService<S> {
    store: Arc<S>,
}

impl<S: Store> InventoryService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn register(&self, registration: AssetRegistration) -> Result<Asset, InventoryError> {
        let asset = registration.validate()?;
        let asset = transaction(self.store.as_ref(), |tx| {
            tx.insert_asset(asset).map_err(InventoryError::from)
        })
        .map_err(|err| match err {
            InventoryError::Store(StoreError::Conflict(_)) => InventoryError::SerialNumberTaken,
            other => other,
        })?;
        info!(asset_id = %asset.asset_id, serial = %asset.serial_number, "asset registered");
        Ok(asset)
    }

    pub fn get(&self, asset_id: AssetId) -> Result<Asset, InventoryError> {
        transaction(self.store.as_ref(), |tx| {
            tx.asset(asset_id)?
                .ok_or(InventoryError::AssetNotFound(asset_id))
        })
    }

    /// All assets ordered by id.
    pub fn list(&self) -> Result<Vec<Asset>, InventoryError> {
        transaction(self.store.as_ref(), |tx| Ok(tx.assets()?))
    }

    /// Edit descriptive columns under the row lock; quantity is left to the ledger.
    pub fn update(&self, asset_id: AssetId, update: AssetUpdate) -> Result<Asset, InventoryError> {
        let asset = transaction(self.store.as_ref(), |tx| {
            let mut asset = tx
                .lock_asset(asset_id)?
                .ok_or(InventoryError::AssetNotFound(asset_id))?;
            update.apply(&mut asset)?;
            if !tx.update_asset_details(&asset)? {
                return Err(InventoryError::AssetNotFound(asset_id));
            }
            Ok(asset)
        })
        .map_err(|err| match err {
            InventoryError::Store(StoreError::Conflict(_)) => InventoryError::SerialNumberTaken,
            other => other,
        })?;
        info!(asset_id = %asset_id, serial = %asset.serial_number, "asset updated");
        Ok(asset)
    }

    pub fn remove(&self, asset_id: AssetId) -> Result<(), InventoryError> {
        transaction(self.store.as_ref(), |tx| match tx.delete_asset(asset_id) {
            Ok(true) => Ok(()),
            Ok(false) => Err(InventoryError::AssetNotFound(asset_id)),
            Err(StoreError::Referenced(_)) => Err(InventoryError::AssetReferenced(asset_id)),
            Err(other) => Err(other.into()),
        })?;
        info!(asset_id = %asset_id, "asset removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn registration(serial: &str) -> AssetRegistration {
        AssetRegistration {
            asset_type: Some("Monitor".to_string()),
            brand: Some("Dell".to_string()),
            model: Some("U2723QE".to_string()),
            serial_number: Some(serial.to_string()),
            quantity: Some(4),
            ..AssetRegistration::default()
        }
    }

    fn service() -> InventoryService<MemoryStore> {
        InventoryService::new(Arc::new(MemoryStore::default()))
    }

    #[test]
    fn registration_requires_type_and_serial() {
        let mut missing_type = registration("SN-1");
        missing_type.asset_type = Some("   ".to_string());
        match missing_type.validate() {
            Err(InventoryError::Invalid(message)) => assert!(message.contains("asset_type")),
            other => panic!("expected invalid asset, got {other:?}"),
        }

        let mut missing_serial = registration("SN-1");
        missing_serial.serial_number = None;
        assert!(matches!(
            missing_serial.validate(),
            Err(InventoryError::Invalid(_))
        ));
    }

    #[test]
    fn registration_defaults_quantity_and_status() {
        let mut registration = registration("SN-2");
        registration.quantity = None;
        let asset = registration.validate().expect("valid registration");
        assert_eq!(asset.quantity, 1);
        assert_eq!(asset.status, domain::AssetStatus::Available);
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let mut registration = registration("SN-3");
        registration.quantity = Some(-1);
        assert!(matches!(
            registration.validate(),
            Err(InventoryError::Invalid(_))
        ));
    }

    #[test]
    fn duplicate_serial_numbers_are_translated() {
        let service = service();
        service.register(registration("SN-DUP")).expect("first insert");
        match service.register(registration("SN-DUP")) {
            Err(InventoryError::SerialNumberTaken) => {}
            other => panic!("expected serial number conflict, got {other:?}"),
        }
        assert_eq!(service.list().expect("list").len(), 1);
    }

    #[test]
    fn remove_reports_missing_assets() {
        let service = service();
        match service.remove(AssetId(9)) {
            Err(InventoryError::AssetNotFound(AssetId(9))) => {}
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[test]
    fn remove_deletes_unreferenced_assets() {
        let service = service();
        let asset = service.register(registration("SN-DEL")).expect("insert");
        service.remove(asset.asset_id).expect("removed");
        assert!(matches!(
            service.get(asset.asset_id),
            Err(InventoryError::AssetNotFound(_))
        ));
    }

    #[test]
    fn update_edits_details_but_keeps_stock() {
        let service = service();
        let asset = service.register(registration("SN-UPD")).expect("insert");

        let updated = service
            .update(
                asset.asset_id,
                AssetUpdate {
                    model: Some("U3223QE".to_string()),
                    status: Some(domain::AssetStatus::Repair),
                    ..AssetUpdate::default()
                },
            )
            .expect("updated");

        assert_eq!(updated.model.as_deref(), Some("U3223QE"));
        assert_eq!(updated.brand.as_deref(), Some("Dell"));
        assert_eq!(updated.quantity, 4);
        assert_eq!(service.get(asset.asset_id).expect("read back"), updated);
    }

    #[test]
    fn update_refuses_quantity_and_taken_serials() {
        let service = service();
        let first = service.register(registration("SN-A")).expect("insert");
        service.register(registration("SN-B")).expect("insert");

        let stock_edit = AssetUpdate {
            quantity: Some(10),
            ..AssetUpdate::default()
        };
        assert!(matches!(
            service.update(first.asset_id, stock_edit),
            Err(InventoryError::Invalid(_))
        ));

        let serial_edit = AssetUpdate {
            serial_number: Some("SN-B".to_string()),
            ..AssetUpdate::default()
        };
        assert!(matches!(
            service.update(first.asset_id, serial_edit),
            Err(InventoryError::SerialNumberTaken)
        ));
        assert_eq!(
            service.get(first.asset_id).expect("unchanged").serial_number,
            "SN-A"
        );
    }

    #[test]
    fn update_reports_missing_assets() {
        assert!(matches!(
            service().update(AssetId(5), AssetUpdate::default()),
            Err(InventoryError::AssetNotFound(AssetId(5)))
        ));
    }
}
