use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::organization::domain::numeric_id;

numeric_id!(
    /// Identifier wrapper for catalogued assets.
    AssetId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AssetStatus {
    #[default]
    Available,
    Requested,
    Assigned,
    Repair,
    Retired,
}

/// A catalogued asset and its stock count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub asset_id: AssetId,
    pub asset_type: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub specifications: Option<String>,
    pub serial_number: String,
    pub vendor: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub warranty_expiry: Option<NaiveDate>,
    pub status: AssetStatus,
    pub quantity: u32,
}

impl Asset {
    pub fn summary(&self) -> AssetSummary {
        AssetSummary {
            asset_type: self.asset_type.clone(),
            brand: self.brand.clone(),
            model: self.model.clone(),
            serial_number: self.serial_number.clone(),
        }
    }
}

/// Validated asset registration; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAsset {
    pub asset_type: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub specifications: Option<String>,
    pub serial_number: String,
    pub vendor: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub warranty_expiry: Option<NaiveDate>,
    pub status: AssetStatus,
    pub quantity: u32,
}

impl NewAsset {
    pub(crate) fn into_asset(self, asset_id: AssetId) -> Asset {
        Asset {
            asset_id,
            asset_type: self.asset_type,
            brand: self.brand,
            model: self.model,
            specifications: self.specifications,
            serial_number: self.serial_number,
            vendor: self.vendor,
            purchase_date: self.purchase_date,
            warranty_expiry: self.warranty_expiry,
            status: self.status,
            quantity: self.quantity,
        }
    }
}

/// Inbound registration payload prior to validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRegistration {
    #[serde(default)]
    pub asset_type: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub specifications: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub warranty_expiry: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<AssetStatus>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

/// Partial update of an asset's descriptive columns. Stock is not editable here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetUpdate {
    #[serde(default)]
    pub asset_type: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub specifications: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub warranty_expiry: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<AssetStatus>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

/// Asset columns joined into request listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetSummary {
    pub asset_type: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: String,
}
