//! Order queries and mutations against the content store.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::ser::Error as _;

use libaas_core::{OrderId, OrderStatus, ProductId, UserRef};

use super::{SanityClient, StoreError};
use crate::models::{NewOrder, Order, OrderSnapshot};

impl SanityClient {
    /// Fetch the cancellation snapshot for an order, scoped to its owner.
    ///
    /// The ownership condition lives in the query itself, so a missing order
    /// and somebody else's order produce the same `None`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query fails.
    pub async fn order_for_cancellation(
        &self,
        order_id: &OrderId,
        customer: &UserRef,
    ) -> Result<Option<OrderSnapshot>, StoreError> {
        const QUERY: &str = r#"*[_type == "order" && _id == $orderId && customer._ref == $customerId][0]{
            _id,
            createdAt,
            status
        }"#;

        self.query(
            QUERY,
            &[
                ("orderId", serde_json::json!(order_id.as_str())),
                ("customerId", serde_json::json!(customer.as_str())),
            ],
        )
        .await
    }

    /// Overwrite an order's status with a single-field patch.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the mutation is rejected.
    pub async fn write_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> Result<(), StoreError> {
        let mutations = serde_json::json!([{
            "patch": {
                "id": order_id.as_str(),
                "set": { "status": status }
            }
        }]);

        self.mutate(mutations).await
    }

    /// Create a new order document.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if serialization or the mutation fails.
    pub async fn insert_order(&self, order: &NewOrder) -> Result<(), StoreError> {
        let mut doc = serde_json::to_value(order)?;
        let fields = doc
            .as_object_mut()
            .ok_or_else(|| StoreError::Json(serde_json::Error::custom("order is not an object")))?;
        fields.insert("_type".to_owned(), serde_json::json!("order"));
        fields.insert(
            "customer".to_owned(),
            serde_json::json!({
                "_type": "reference",
                "_ref": order.customer.as_str()
            }),
        );

        let mutations = serde_json::json!([{ "create": doc }]);
        self.mutate(mutations).await
    }

    /// Fetch a customer's orders created on or after `since`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query fails.
    pub async fn orders_created_since(
        &self,
        customer: &UserRef,
        since: DateTime<Utc>,
    ) -> Result<Vec<Order>, StoreError> {
        const QUERY: &str = r#"*[_type == "order" && customer._ref == $customerId && dateTime(createdAt) >= dateTime($since)] | order(createdAt desc) {
            _id,
            orderNumber,
            createdAt,
            status,
            total,
            paymentMethod,
            items,
            shippingInfo
        }"#;

        self.query(
            QUERY,
            &[
                ("customerId", serde_json::json!(customer.as_str())),
                ("since", serde_json::json!(since.to_rfc3339())),
            ],
        )
        .await
    }

    /// Current catalog prices for a set of products.
    ///
    /// Products the store does not know are simply absent from the map.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query fails.
    pub async fn prices_for(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Decimal>, StoreError> {
        const QUERY: &str = r#"*[_type == "product" && _id in $ids]{ _id, price }"#;

        #[derive(Deserialize)]
        struct PriceRow {
            #[serde(rename = "_id")]
            id: ProductId,
            price: Decimal,
        }

        let rows: Vec<PriceRow> = self
            .query(QUERY, &[("ids", serde_json::json!(ids))])
            .await?;

        Ok(rows.into_iter().map(|row| (row.id, row.price)).collect())
    }
}
