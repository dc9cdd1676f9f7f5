use crate::config::MarketplaceConfig;
use crate::models::ListingDraft;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use urlencoding::encode;

#[derive(Debug, Error)]
pub enum MarketplaceInventoryError {
    #[error("inventory request failed: {0}")]
    Request(String),
    #[error("inventory endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemRequest {
    pub availability: InventoryAvailability,
    pub condition: &'static str,
    pub product: InventoryProduct,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryAvailability {
    pub ship_to_location_availability: ShipToLocationAvailability,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipToLocationAvailability {
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryProduct {
    pub title: String,
    pub description: String,
}

impl InventoryItemRequest {
    /// Fixed publish shape: single unit, NEW condition, generated copy.
    pub fn for_draft(draft: &ListingDraft) -> Self {
        Self {
            availability: InventoryAvailability {
                ship_to_location_availability: ShipToLocationAvailability { quantity: 1 },
            },
            condition: "NEW",
            product: InventoryProduct {
                title: draft.title.clone(),
                description: draft.description.clone(),
            },
        }
    }
}

/// Create-or-replace the inventory record addressed by `sku`. Any 2xx
/// (the endpoint usually answers 204) counts as success.
pub async fn upsert_inventory_item(
    http: &Client,
    config: &MarketplaceConfig,
    sku: &str,
    payload: &InventoryItemRequest,
    access_token: &str,
) -> Result<(), MarketplaceInventoryError> {
    let url = format!(
        "{}/sell/inventory/v1/inventory_item/{}",
        config.api_root,
        encode(sku)
    );
    let response = http
        .put(url)
        .bearer_auth(access_token)
        .json(payload)
        .send()
        .await
        .map_err(|err| MarketplaceInventoryError::Request(err.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(MarketplaceInventoryError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(())
}
