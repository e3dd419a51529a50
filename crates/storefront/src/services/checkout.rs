//! Order submission: shipping-form validation, server-side pricing, and the
//! order create.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use rand::Rng;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use libaas_core::{
    Email, OrderNumber, OrderStatus, PaymentMethod, ProductId, SubjectId, shipping_fee,
};

use super::ContentStore;
use crate::models::{LineItem, NewOrder, ShippingInfo};
use crate::sanity::StoreError;
use crate::supabase::AuthenticatedUser;

/// Shape check for email addresses, matching what the checkout form enforces.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email regex is valid"));

/// Phone numbers must carry exactly this many digits, punctuation aside.
const PHONE_DIGITS: usize = 11;

/// The shipping form as submitted, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: String,
}

/// Field-level validation failures, keyed by the form field name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationErrors {
    #[serde(flatten)]
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    fn insert(&mut self, field: &str, message: &str) {
        self.fields.insert(field.to_owned(), message.to_owned());
    }

    /// Whether any field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The failing fields and their messages.
    #[must_use]
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .fields
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{joined}")
    }
}

/// Validate the shipping form. Purely syntactic - required-non-empty checks,
/// the email shape, and the phone digit count.
///
/// # Errors
///
/// Returns every failing field at once, not just the first.
pub fn validate_shipping(form: &ShippingForm) -> Result<ShippingInfo, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let full_name = form.full_name.trim();
    if full_name.is_empty() {
        errors.insert("fullName", "Full name is required");
    }

    let email = form.email.trim();
    if email.is_empty() {
        errors.insert("email", "Email is required");
    } else if !EMAIL_RE.is_match(email) {
        errors.insert("email", "Please enter a valid email");
    }

    let phone = form.phone_number.trim();
    let digit_count = phone.chars().filter(char::is_ascii_digit).count();
    if phone.is_empty() {
        errors.insert("phoneNumber", "Phone number is required");
    } else if digit_count != PHONE_DIGITS {
        errors.insert("phoneNumber", "Please enter a valid 11-digit phone number");
    }

    let address = form.address.trim();
    if address.is_empty() {
        errors.insert("address", "Address is required");
    }

    let city = form.city.trim();
    if city.is_empty() {
        errors.insert("city", "City is required");
    }

    let country = form.country.trim();
    if country.is_empty() {
        errors.insert("country", "Country is required");
    }

    let parsed_email = match Email::parse(email) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            if !email.is_empty() && !errors.fields.contains_key("email") {
                errors.insert("email", &e.to_string());
            }
            None
        }
    };

    let Some(email) = parsed_email else {
        return Err(errors);
    };
    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ShippingInfo {
        full_name: full_name.to_owned(),
        email,
        phone: phone.to_owned(),
        address: address.to_owned(),
        city: city.to_owned(),
        postal_code: form
            .postal_code
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned),
        country: country.to_owned(),
    })
}

/// Sum of line totals, before shipping.
#[must_use]
pub fn order_subtotal(items: &[LineItem]) -> Decimal {
    items.iter().map(LineItem::line_total).sum()
}

/// Subtotal plus the flat shipping fee.
#[must_use]
pub fn order_total(items: &[LineItem]) -> Decimal {
    order_subtotal(items) + shipping_fee()
}

/// A create-order request as received from the client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSubmission {
    pub items: Vec<LineItem>,
    pub shipping_info: ShippingForm,
    /// Client-computed total; verified against current store prices, never
    /// trusted.
    pub total: Decimal,
    pub user_id: SubjectId,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

/// Everything that can stop an order submission.
#[derive(Debug, Error)]
pub enum PlaceOrderError {
    /// The claimed user id does not match the credential's subject.
    #[error("user id does not match the authenticated user")]
    IdentityMismatch,

    /// The customer has no user document in the store.
    #[error("user profile not found")]
    UserNotFound,

    /// The cart came in empty.
    #[error("cart is empty")]
    EmptyCart,

    /// Field-level form failures.
    #[error("validation failed: {0}")]
    Invalid(ValidationErrors),

    /// A cart line references a product the store does not know.
    #[error("unknown product in cart: {0}")]
    UnknownProduct(ProductId),

    /// The client total disagrees with current store prices.
    #[error("order total does not match current prices (expected {expected})")]
    TotalMismatch {
        /// What the total should have been.
        expected: Decimal,
    },

    /// The store read or write failed.
    #[error("content store error: {0}")]
    Store(#[from] StoreError),
}

/// Place an order for the authenticated customer.
///
/// The persisted line prices and total are re-derived from the store's
/// current catalog; a client total that disagrees is rejected rather than
/// recorded.
///
/// # Errors
///
/// See [`PlaceOrderError`].
pub async fn place_order<S: ContentStore>(
    store: &S,
    customer: &AuthenticatedUser,
    submission: &OrderSubmission,
    now: DateTime<Utc>,
) -> Result<OrderNumber, PlaceOrderError> {
    if submission.user_id != customer.subject {
        return Err(PlaceOrderError::IdentityMismatch);
    }

    let shipping = validate_shipping(&submission.shipping_info).map_err(PlaceOrderError::Invalid)?;

    if submission.items.is_empty() {
        return Err(PlaceOrderError::EmptyCart);
    }
    if submission.items.iter().any(|item| item.quantity == 0) {
        let mut errors = ValidationErrors::default();
        errors.insert("items", "Quantities must be at least 1");
        return Err(PlaceOrderError::Invalid(errors));
    }

    // Re-price every line from the catalog
    let ids: Vec<ProductId> = submission
        .items
        .iter()
        .map(|item| item.product_id.clone())
        .collect();
    let prices = store.product_prices(&ids).await?;

    let mut items = Vec::with_capacity(submission.items.len());
    for item in &submission.items {
        let price = *prices
            .get(&item.product_id)
            .ok_or_else(|| PlaceOrderError::UnknownProduct(item.product_id.clone()))?;
        items.push(LineItem {
            price,
            ..item.clone()
        });
    }

    let expected = order_total(&items);
    if expected != submission.total {
        return Err(PlaceOrderError::TotalMismatch { expected });
    }

    let customer_ref = store
        .find_user_ref(&customer.subject)
        .await?
        .ok_or(PlaceOrderError::UserNotFound)?;

    let order = NewOrder {
        order_number: generate_order_number(now),
        customer: customer_ref,
        items,
        shipping_info: shipping,
        total: expected,
        payment_method: submission.payment_method,
        status: OrderStatus::Pending,
        created_at: now,
    };

    store.create_order(&order).await?;

    tracing::info!(order_number = %order.order_number, "order placed");
    Ok(order.order_number)
}

/// A human-facing order number: date plus a short random suffix.
fn generate_order_number(now: DateTime<Utc>) -> OrderNumber {
    let suffix: String = rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(5)
        .map(char::from)
        .collect::<String>()
        .to_ascii_uppercase();
    OrderNumber::new(format!("ORD-{}-{suffix}", now.format("%Y%m%d")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use libaas_core::UserRef;

    use super::super::testing::{MemoryIdentity, MemoryStore};
    use super::*;

    fn valid_form() -> ShippingForm {
        ShippingForm {
            full_name: "Ayesha Khan".to_owned(),
            email: "ayesha@example.com".to_owned(),
            phone_number: "0300-1234567".to_owned(),
            address: "12 Mall Road".to_owned(),
            city: "Lahore".to_owned(),
            postal_code: Some("54000".to_owned()),
            country: "Pakistan".to_owned(),
        }
    }

    fn line(product: &str, quantity: u32, price: i64) -> LineItem {
        LineItem {
            product_id: ProductId::new(product),
            name: format!("Product {product}"),
            quantity,
            price: Decimal::from(price),
            selected_size: Some("M".to_owned()),
            selected_color: None,
        }
    }

    fn submission(items: Vec<LineItem>, total: i64) -> OrderSubmission {
        OrderSubmission {
            items,
            shipping_info: valid_form(),
            total: Decimal::from(total),
            user_id: SubjectId::new("subject-1"),
            payment_method: PaymentMethod::CashOnDelivery,
        }
    }

    fn setup() -> (MemoryStore, AuthenticatedUser, DateTime<Utc>) {
        let store = MemoryStore::new();
        store.add_user(
            &SubjectId::new("subject-1"),
            &UserRef::new("user-1"),
            "ayesha@example.com",
        );
        store.set_price(&ProductId::new("product-1"), Decimal::from(1000));
        store.set_price(&ProductId::new("product-2"), Decimal::from(500));

        let customer = MemoryIdentity::user("subject-1", "ayesha@example.com");
        let now: DateTime<Utc> = "2025-06-01T12:00:00Z".parse().unwrap();
        (store, customer, now)
    }

    #[test]
    fn test_validate_accepts_complete_form() {
        let info = validate_shipping(&valid_form()).unwrap();
        assert_eq!(info.full_name, "Ayesha Khan");
        assert_eq!(info.phone, "0300-1234567");
        assert_eq!(info.postal_code.as_deref(), Some("54000"));
    }

    #[test]
    fn test_validate_reports_every_missing_field() {
        let errors = validate_shipping(&ShippingForm::default()).unwrap_err();
        for field in ["fullName", "email", "phoneNumber", "address", "city", "country"] {
            assert!(errors.fields().contains_key(field), "missing {field}");
        }
    }

    #[test]
    fn test_validate_email_shape() {
        let mut form = valid_form();
        form.email = "not-an-email".to_owned();
        let errors = validate_shipping(&form).unwrap_err();
        assert_eq!(
            errors.fields().get("email").map(String::as_str),
            Some("Please enter a valid email")
        );
    }

    #[test]
    fn test_validate_phone_digit_count() {
        let mut form = valid_form();
        form.phone_number = "0300-123456".to_owned(); // 10 digits
        let errors = validate_shipping(&form).unwrap_err();
        assert!(errors.fields().contains_key("phoneNumber"));

        form.phone_number = "(0300) 123-4567-8".to_owned(); // 12 digits
        assert!(validate_shipping(&form).is_err());

        form.phone_number = "03001234567".to_owned(); // exactly 11
        assert!(validate_shipping(&form).is_ok());
    }

    #[test]
    fn test_order_total_example() {
        // 1000 x 2 + 500 x 1 + 1000 shipping = 3500
        let items = vec![line("product-1", 2, 1000), line("product-2", 1, 500)];
        assert_eq!(order_subtotal(&items), Decimal::from(2500));
        assert_eq!(order_total(&items), Decimal::from(3500));
    }

    #[tokio::test]
    async fn test_place_order_persists_pending_order() {
        let (store, customer, now) = setup();
        let submission = submission(
            vec![line("product-1", 2, 1000), line("product-2", 1, 500)],
            3500,
        );

        let order_number = place_order(&store, &customer, &submission, now)
            .await
            .unwrap();
        assert!(order_number.as_str().starts_with("ORD-20250601-"));

        let created = store.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        let order = &created[0];
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.created_at, now);
        assert_eq!(order.total, Decimal::from(3500));
        assert_eq!(order.customer, UserRef::new("user-1"));
        assert_eq!(order.shipping_info.full_name, "Ayesha Khan");
    }

    #[tokio::test]
    async fn test_place_order_rejects_stale_total() {
        let (store, customer, now) = setup();
        // Client thinks product-1 still costs 900
        let submission = submission(vec![line("product-1", 2, 900)], 2800);

        let err = place_order(&store, &customer, &submission, now)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PlaceOrderError::TotalMismatch { expected } if expected == Decimal::from(3000)
        ));
        assert!(store.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_place_order_uses_catalog_prices_in_snapshot() {
        let (store, customer, now) = setup();
        // Client line price is stale but the claimed total happens to match
        // catalog pricing; the snapshot still records the catalog price.
        let submission = submission(vec![line("product-1", 1, 999)], 2000);

        place_order(&store, &customer, &submission, now)
            .await
            .unwrap();
        let created = store.created.lock().unwrap();
        assert_eq!(created[0].items[0].price, Decimal::from(1000));
    }

    #[tokio::test]
    async fn test_place_order_unknown_product() {
        let (store, customer, now) = setup();
        let submission = submission(vec![line("product-404", 1, 1000)], 2000);

        let err = place_order(&store, &customer, &submission, now)
            .await
            .unwrap_err();
        assert!(matches!(err, PlaceOrderError::UnknownProduct(id) if id.as_str() == "product-404"));
    }

    #[tokio::test]
    async fn test_place_order_identity_mismatch() {
        let (store, _customer, now) = setup();
        let submission = submission(vec![line("product-1", 1, 1000)], 2000);
        let other = MemoryIdentity::user("subject-2", "saad@example.com");

        let err = place_order(&store, &other, &submission, now)
            .await
            .unwrap_err();
        assert!(matches!(err, PlaceOrderError::IdentityMismatch));
    }

    #[tokio::test]
    async fn test_place_order_empty_cart() {
        let (store, customer, now) = setup();
        let submission = submission(vec![], 1000);

        let err = place_order(&store, &customer, &submission, now)
            .await
            .unwrap_err();
        assert!(matches!(err, PlaceOrderError::EmptyCart));
    }

    #[tokio::test]
    async fn test_place_order_zero_quantity() {
        let (store, customer, now) = setup();
        let submission = submission(vec![line("product-1", 0, 1000)], 1000);

        let err = place_order(&store, &customer, &submission, now)
            .await
            .unwrap_err();
        assert!(matches!(err, PlaceOrderError::Invalid(_)));
    }
}
