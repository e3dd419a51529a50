//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use libaas_core::{Email, OrderId, OrderNumber, OrderStatus, PaymentMethod, ProductId, UserRef};

/// One line of an order: a product at the quantity and unit price captured at
/// submission time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub price: Decimal,
    #[serde(default)]
    pub selected_size: Option<String>,
    #[serde(default)]
    pub selected_color: Option<String>,
}

impl LineItem {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Recipient contact and address captured when the order was placed.
///
/// A snapshot, not a reference: editing the profile later must not change
/// where a past order was shipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    pub full_name: String,
    pub email: Email,
    pub phone: String,
    pub address: String,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    pub country: String,
}

/// A persisted order document, as returned by the store's order queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total: Decimal,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub items: Vec<LineItem>,
    pub shipping_info: ShippingInfo,
}

/// The minimal projection the cancel path needs: enough to run the
/// eligibility policy, nothing more.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSnapshot {
    #[serde(rename = "_id")]
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
}

/// A new order ready to be written to the store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub order_number: OrderNumber,
    /// Customer document id; written as a store reference, so it is excluded
    /// from the flat serialization.
    #[serde(skip)]
    pub customer: UserRef,
    pub items: Vec<LineItem>,
    pub shipping_info: ShippingInfo,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_deserializes_store_document() {
        let json = serde_json::json!({
            "_id": "order-1",
            "orderNumber": "ORD-20250601-A1B2C",
            "createdAt": "2025-06-01T12:00:00Z",
            "status": "pending",
            "total": 3500,
            "items": [{
                "productId": "product-1",
                "name": "Oxford Shirt",
                "quantity": 2,
                "price": 1000,
                "selectedSize": "M",
                "selectedColor": "white"
            }],
            "shippingInfo": {
                "fullName": "Ayesha Khan",
                "email": "ayesha@example.com",
                "phone": "03001234567",
                "address": "12 Mall Road",
                "city": "Lahore",
                "country": "Pakistan"
            }
        });

        let order: Order = serde_json::from_value(json).unwrap();
        assert_eq!(order.id.as_str(), "order-1");
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total, Decimal::from(3500));
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].line_total(), Decimal::from(2000));
        assert!(order.shipping_info.postal_code.is_none());
        // Absent paymentMethod falls back to the default
        assert_eq!(order.payment_method, PaymentMethod::CashOnDelivery);
    }

    #[test]
    fn test_line_item_price_serializes_as_number() {
        let item = LineItem {
            product_id: ProductId::new("product-1"),
            name: "Oxford Shirt".to_owned(),
            quantity: 1,
            price: Decimal::from(1500),
            selected_size: None,
            selected_color: None,
        };
        let value = serde_json::to_value(&item).unwrap();
        assert!(value["price"].is_number());
    }
}
