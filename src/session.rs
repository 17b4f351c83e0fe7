//! Carts and per-customer sessions built on tabular parameters.

use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::call::{CallExecutor, ResultEnvelope, TableParameter, TableRow, Value, ValueKind};
use crate::catalog::{
    COMPLETE_TRANSACTION, Catalog, CatalogError, RECORD_SHIPMENT_PURCHASE, REVIEW_PRODUCT,
    VIEW_PURCHASES,
};

/// Highest star rating a review may give.
pub const MAX_RATING: i32 = 5;

/// One line of a customer's cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionCartRow {
    pub chemical_id: i32,
    pub quantity: Decimal,
}

impl TableRow for TransactionCartRow {
    const TYPE_NAME: &'static str = "TRANSACTIONCART";
    const COLUMNS: &'static [(&'static str, ValueKind)] = &[
        ("ChemicalID", ValueKind::Integer),
        ("Quantity", ValueKind::DecimalText),
    ];

    fn values(&self) -> Vec<Option<Value>> {
        vec![
            Some(Value::Integer(self.chemical_id)),
            Some(Value::Decimal(self.quantity)),
        ]
    }
}

/// One line of a shipment purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentCartRow {
    pub chemical_type_id: i32,
    pub purity: Decimal,
    pub quantity: Decimal,
    pub purchase_price: Decimal,
}

impl TableRow for ShipmentCartRow {
    const TYPE_NAME: &'static str = "SHIPMENTCART";
    const COLUMNS: &'static [(&'static str, ValueKind)] = &[
        ("ChemicalTypeID", ValueKind::Integer),
        ("Purity", ValueKind::DecimalText),
        ("Quantity", ValueKind::DecimalText),
        ("PurchasePrice", ValueKind::DecimalText),
    ];

    fn values(&self) -> Vec<Option<Value>> {
        vec![
            Some(Value::Integer(self.chemical_type_id)),
            Some(Value::Decimal(self.purity)),
            Some(Value::Decimal(self.quantity)),
            Some(Value::Decimal(self.purchase_price)),
        ]
    }
}

pub type TransactionCart = TableParameter<TransactionCartRow>;
pub type ShipmentCart = TableParameter<ShipmentCartRow>;

/// Remove the first cart line for a chemical. Returns false if none matched.
pub fn remove_cart_item(cart: &TransactionCart, chemical_id: i32) -> bool {
    cart.remove_where(|row| row.chemical_id == chemical_id)
}

/// Remove the first shipment line for a chemical quality (type and purity).
pub fn remove_shipment_item(cart: &ShipmentCart, chemical_type_id: i32, purity: Decimal) -> bool {
    cart.remove_where(|row| row.chemical_type_id == chemical_type_id && row.purity == purity)
}

/// Record a purchase of the shipment lines in `cart` from a distributor.
///
/// The cart is left as it was; callers clear it once the purchase is shown.
pub fn record_shipment_purchase(
    executor: &CallExecutor,
    catalog: &Catalog,
    distributor_id: i32,
    cart: &ShipmentCart,
) -> Result<ResultEnvelope, SessionError> {
    let descriptor = catalog.descriptor(RECORD_SHIPMENT_PURCHASE)?;
    Ok(executor.invoke(
        descriptor,
        &[Some(Value::Integer(distributor_id)), Some(cart.to_value())],
    ))
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("At least one item is required for a transaction.")]
    EmptyCart,

    #[error("Rating out of range.")]
    RatingOutOfRange { stars: i32 },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// A logged-in customer with a cart.
pub struct CustomerSession {
    customer_id: i32,
    online: bool,
    cart: TransactionCart,
    catalog: Arc<Catalog>,
    executor: CallExecutor,
}

impl CustomerSession {
    pub fn new(customer_id: i32, online: bool, catalog: Arc<Catalog>, executor: CallExecutor) -> Self {
        Self {
            customer_id,
            online,
            cart: TransactionCart::new(),
            catalog,
            executor,
        }
    }

    pub fn customer_id(&self) -> i32 {
        self.customer_id
    }

    pub fn cart(&self) -> &TransactionCart {
        &self.cart
    }

    pub fn add_item_to_cart(&self, chemical_id: i32, quantity: Decimal) {
        self.cart.add_row(TransactionCartRow {
            chemical_id,
            quantity,
        });
    }

    pub fn remove_item_from_cart(&self, chemical_id: i32) -> bool {
        remove_cart_item(&self.cart, chemical_id)
    }

    pub fn view_cart(&self) -> Vec<TransactionCartRow> {
        self.cart.rows()
    }

    /// Check out the cart. On success the envelope holds `(subtotal, tax)`
    /// and the purchased lines leave the cart; lines added while the call
    /// ran stay. On failure the cart is left as it was.
    pub fn complete_transaction(
        &self,
        tax_percent: &str,
        discount_id: Option<i32>,
    ) -> Result<ResultEnvelope, SessionError> {
        let purchased = self.cart.rows();
        if purchased.is_empty() {
            return Err(SessionError::EmptyCart);
        }

        let descriptor = self.catalog.descriptor(COMPLETE_TRANSACTION)?;
        let envelope = self.executor.invoke(
            descriptor,
            &[
                Some(Value::Integer(self.customer_id)),
                Some(Value::Text(tax_percent.to_string())),
                discount_id.map(Value::Integer),
                Some(Value::Table(TransactionCart::snapshot_of(&purchased))),
                Some(Value::Boolean(self.online)),
            ],
        );

        if envelope.is_success() {
            self.cart.remove_rows(&purchased);
        }
        Ok(envelope)
    }

    pub fn view_purchases(
        &self,
        first_result: i32,
        result_count: i32,
        newest_first: bool,
    ) -> Result<ResultEnvelope, SessionError> {
        let descriptor = self.catalog.descriptor(VIEW_PURCHASES)?;
        Ok(self.executor.invoke(
            descriptor,
            &[
                Some(Value::Integer(first_result)),
                Some(Value::Integer(result_count)),
                Some(Value::Integer(self.customer_id)),
                Some(Value::Boolean(newest_first)),
            ],
        ))
    }

    pub fn review_product(
        &self,
        chemical_id: i32,
        stars: i32,
        text: &str,
    ) -> Result<ResultEnvelope, SessionError> {
        if !(0..=MAX_RATING).contains(&stars) {
            return Err(SessionError::RatingOutOfRange { stars });
        }

        let descriptor = self.catalog.descriptor(REVIEW_PRODUCT)?;
        Ok(self.executor.invoke(
            descriptor,
            &[
                Some(Value::Integer(self.customer_id)),
                Some(Value::Integer(chemical_id)),
                Some(Value::Integer(stars)),
                Some(Value::Text(text.to_string())),
            ],
        ))
    }
}
