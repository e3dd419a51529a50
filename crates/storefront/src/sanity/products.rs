//! Product catalog reads, cached for a few minutes.

use std::sync::Arc;

use tracing::debug;

use libaas_core::ProductId;

use super::{CacheValue, SanityClient, StoreError};
use crate::models::Product;

const PRODUCT_PROJECTION: &str = r"
            _id,
            name,
            description,
            price,
            category,
            inStock,
            stockQuantity,
            sizes,
            colors
";

impl SanityClient {
    /// List products, optionally restricted to one category.
    ///
    /// Served from the in-memory cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query fails.
    pub async fn list_products(
        &self,
        category: Option<&str>,
    ) -> Result<Arc<Vec<Product>>, StoreError> {
        let cache_key = category.map_or_else(
            || "products:all".to_owned(),
            |slug| format!("products:{slug}"),
        );

        if let Some(CacheValue::ProductList(products)) = self.product_cache().get(&cache_key).await
        {
            debug!("cache hit for product list");
            return Ok(products);
        }

        let products: Vec<Product> = match category {
            Some(slug) => {
                let query = format!(
                    r#"*[_type == "product" && category == $category]{{{PRODUCT_PROJECTION}}}"#
                );
                self.query(&query, &[("category", serde_json::json!(slug))])
                    .await?
            }
            None => {
                let query = format!(r#"*[_type == "product"]{{{PRODUCT_PROJECTION}}}"#);
                self.query(&query, &[]).await?
            }
        };

        let products = Arc::new(products);
        self.product_cache()
            .insert(cache_key, CacheValue::ProductList(Arc::clone(&products)))
            .await;

        Ok(products)
    }

    /// Fetch a single product by id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query fails.
    pub async fn product_by_id(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        let cache_key = format!("product:{id}");

        if let Some(CacheValue::Product(product)) = self.product_cache().get(&cache_key).await {
            debug!("cache hit for product");
            return Ok(Some(*product));
        }

        let query =
            format!(r#"*[_type == "product" && _id == $id][0]{{{PRODUCT_PROJECTION}}}"#);
        let product: Option<Product> = self
            .query(&query, &[("id", serde_json::json!(id.as_str()))])
            .await?;

        if let Some(found) = &product {
            self.product_cache()
                .insert(cache_key, CacheValue::Product(Box::new(found.clone())))
                .await;
        }

        Ok(product)
    }
}
