//! The routine catalog of the chemical retailer database.
//!
//! Every descriptor is built once by `Catalog::build` at startup and shared
//! read-only afterwards. A build failure means this file and the deployed
//! database disagree; callers treat it as fatal.
//!
//! Nullable and output positions are 1-based, matching the placeholders.

use thiserror::Error;

use crate::call::{
    CallDescriptor, DescriptorError, ReturnShape, ValueKind, build_function, build_procedure,
    build_query,
};

use ValueKind::{Binary as BIN, Boolean as BOOL, DecimalText as DEC, Date as DATE, Integer as INT};
use ValueKind::{SingleChar as CHAR, Table as TABLE, Text as TEXT};

// Scenarios
pub const REGISTER_CUSTOMER: &str = "RegisterCustomer";
pub const SEARCH_PRODUCTS: &str = "SearchProducts";
pub const VIEW_REVIEWS: &str = "ViewReviews";
pub const GET_CUSTOMER_AND_SALT: &str = "GetCustomerAndSalt";
pub const VALIDATE_CUSTOMER: &str = "ValidateCustomer";
pub const COMPLETE_TRANSACTION: &str = "CompleteTransaction";
pub const MARK_TRANSACTION_DELIVERED: &str = "MarkTransactionDelivered";
pub const VIEW_PURCHASES: &str = "ViewPurchases";
pub const VIEW_SUBPURCHASES: &str = "ViewSubpurchases";
pub const REVIEW_PRODUCT: &str = "ReviewProduct";
pub const ADD_DISTRIBUTOR: &str = "AddDistributor";
pub const RECORD_SHIPMENT_PURCHASE: &str = "RecordShipmentPurchase";
pub const MARK_SHIPMENT_RECEIVED: &str = "MarkShipmentReceived";
pub const ADD_CHEMICAL_TYPE: &str = "AddChemicalType";
pub const ADD_CHEMICAL_QUALITY: &str = "AddChemicalQuality";

// Analytical functions
pub const HIGHLY_RATED_FIRST_TIME_AND_MIN_REVIEWS_CHEMICALS: &str =
    "HighlyRatedFirstTimeAndMinReviewsChemicals";
pub const LARGEST_PURITY_AMOUNTS: &str = "LargestPurityAmounts";
pub const HIGHEST_RATIO_PRODUCTS_TO_REVIEW: &str = "HighestRatioProductsToReview";
pub const HIGHEST_RECENT_SPENDERS: &str = "HighestRecentSpenders";
pub const HIGHEST_PROFIT_PRODUCTS: &str = "HighestProfitProducts";
pub const HIGHEST_RATED_DISTRIBUTOR_WITH_MIN_REVIEWS: &str = "HighestRatedDistributorWithMinReviews";
pub const DISTRIBUTOR_HIGHEST_AVG_RATING: &str = "DistributorHighestAvgRating";
pub const PERCENTAGE_PURCHASE_W_DISCOUNTS: &str = "PercentagePurchaseWDiscounts";

// Lookup queries
pub const GET_DISTRIBUTORS: &str = "GetDistributors";
pub const GET_PENDING_SHIPMENTS: &str = "GetPendingShipments";
pub const GET_CUSTOMERS: &str = "GetCustomers";
pub const GET_MEASUREMENT_UNIT_APPLICABILITIES: &str = "GetMeasurementUnitApplicabilities";
pub const GET_CHEMICAL_TYPES: &str = "GetChemicalTypes";
pub const GET_CHEMICAL_QUALITIES: &str = "GetChemicalQualities";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Invalid descriptor for {routine}: {source}")]
    Descriptor {
        routine: &'static str,
        source: DescriptorError,
    },

    #[error("Unknown routine '{name}'")]
    UnknownRoutine { name: String },
}

/// A named routine and its descriptor.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub descriptor: CallDescriptor,
}

/// All routine descriptors, in declaration order.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

/// `"Name(?, ?, ?)"` for `count` parameters.
fn call(name: &str, count: usize) -> String {
    format!("{name}({})", vec!["?"; count].join(", "))
}

fn function(
    name: &'static str,
    kinds: &[ValueKind],
    nullable: &[usize],
    names: &[&str],
    returns: &[ValueKind],
    shape: ReturnShape,
) -> Result<CatalogEntry, CatalogError> {
    let descriptor = build_function(&call(name, kinds.len()), kinds, nullable, names, returns, shape)
        .map_err(|source| CatalogError::Descriptor { routine: name, source })?;
    Ok(CatalogEntry { name, descriptor })
}

fn tabular(
    name: &'static str,
    kinds: &[ValueKind],
    names: &[&str],
    returns: &[ValueKind],
) -> Result<CatalogEntry, CatalogError> {
    function(name, kinds, &[], names, returns, ReturnShape::Tabular)
}

fn procedure(
    name: &'static str,
    kinds: &[ValueKind],
    nullable: &[usize],
    names: &[&str],
    outputs: &[usize],
) -> Result<CatalogEntry, CatalogError> {
    let descriptor = build_procedure(&call(name, kinds.len()), kinds, nullable, names, outputs)
        .map_err(|source| CatalogError::Descriptor { routine: name, source })?;
    Ok(CatalogEntry { name, descriptor })
}

fn query(name: &'static str, sql: &str, returns: &[ValueKind]) -> Result<CatalogEntry, CatalogError> {
    let descriptor = build_query(sql, returns)
        .map_err(|source| CatalogError::Descriptor { routine: name, source })?;
    Ok(CatalogEntry { name, descriptor })
}

impl Catalog {
    /// Build every descriptor, failing on the first invalid one.
    pub fn build() -> Result<Self, CatalogError> {
        let entries = vec![
            procedure(
                REGISTER_CUSTOMER,
                &[TEXT, BIN, BIN, TEXT, TEXT, TEXT, TEXT, INT],
                &[],
                &[
                    "Email Address", "Password", "Password",
                    "First Name", "Last Name",
                    "Address Line 1", "Address Line 2", "ZIP Code",
                ],
                &[],
            )?,
            // Everything but paging and the first sort condition is optional.
            function(
                SEARCH_PRODUCTS,
                &[
                    INT, INT,
                    TEXT,
                    DEC, DEC,
                    TEXT, TEXT,
                    CHAR, CHAR, CHAR, CHAR,
                    BOOL, BOOL, BOOL, BOOL,
                ],
                &[3, 4, 5, 6, 7, 9, 10, 11, 13, 14, 15],
                &[
                    "First Result to Show", "Number of Results to Show",
                    "Chemical",
                    "Min Purity", "Max Purity",
                    "State of Matter", "Distributor",
                    "First Sorter", "Second Sorter", "Third Sorter", "Fourth Sorter",
                    "First Sort Asc.", "Second Sort Asc.", "Third Sort Asc.", "Fourth Sort Asc.",
                ],
                &[INT, TEXT, DEC, TEXT, DEC, DEC, TEXT, TEXT, TEXT, DEC, INT],
                ReturnShape::Tabular,
            )?,
            tabular(
                VIEW_REVIEWS,
                &[INT, INT, INT],
                &["First Result to Show", "Number of Results to Show", "Chemical"],
                &[TEXT, TEXT, INT, TEXT, DATE],
            )?,
            tabular(GET_CUSTOMER_AND_SALT, &[TEXT], &["Email Address"], &[INT, BIN])?,
            function(
                VALIDATE_CUSTOMER,
                &[INT, BIN],
                &[],
                &["Customer", "Password"],
                &[BOOL],
                ReturnShape::Scalar,
            )?,
            procedure(
                COMPLETE_TRANSACTION,
                &[INT, DEC, INT, TABLE, BOOL, DEC, DEC],
                &[3],
                &[
                    "Customer", "Tax Percent", "Discount",
                    "Cart", "Online Status",
                    "Subtotal", "Tax Amount",
                ],
                &[6, 7],
            )?,
            procedure(MARK_TRANSACTION_DELIVERED, &[INT], &[], &["Transaction ID"], &[])?,
            tabular(
                VIEW_PURCHASES,
                &[INT, INT, INT, BOOL],
                &[
                    "First Result to Show", "Number of Results to Show",
                    "Customer", "Sort Newest First",
                ],
                &[DATE, DEC, TEXT, DEC, INT, DATE],
            )?,
            tabular(
                VIEW_SUBPURCHASES,
                &[INT, INT, INT],
                &["First Result to Show", "Number of Results to Show", "Transaction"],
                &[TEXT, DEC, DEC, TEXT, TEXT, DEC],
            )?,
            procedure(
                REVIEW_PRODUCT,
                &[INT, INT, INT, TEXT],
                &[],
                &["Customer", "Chemical", "Rating", "Text"],
                &[],
            )?,
            procedure(ADD_DISTRIBUTOR, &[TEXT], &[], &["Distributor Name"], &[])?,
            procedure(
                RECORD_SHIPMENT_PURCHASE,
                &[INT, TABLE],
                &[],
                &["Distributor", "Shipment Items"],
                &[],
            )?,
            procedure(MARK_SHIPMENT_RECEIVED, &[INT], &[], &["ShipmentID"], &[])?,
            procedure(
                ADD_CHEMICAL_TYPE,
                &[TEXT, TEXT, TEXT],
                &[],
                &["Chemical Name", "Measurement Unit", "State of Matter"],
                &[],
            )?,
            procedure(
                ADD_CHEMICAL_QUALITY,
                &[INT, DEC, DEC],
                &[],
                &["Chemical Type ID", "Purity", "Cost per Unit"],
                &[],
            )?,
            tabular(
                HIGHLY_RATED_FIRST_TIME_AND_MIN_REVIEWS_CHEMICALS,
                &[INT, INT, INT],
                &["Number of Months", "Min Number of Reviews", "Number of Results"],
                &[INT, TEXT, DEC, DEC],
            )?,
            tabular(
                LARGEST_PURITY_AMOUNTS,
                &[INT, INT],
                &["Chemical Type ID", "Number of Results"],
                &[DEC, DEC],
            )?,
            tabular(
                HIGHEST_RATIO_PRODUCTS_TO_REVIEW,
                &[INT],
                &["Number of Top Reviewers"],
                &[INT, TEXT, TEXT, INT, INT, DEC],
            )?,
            tabular(
                HIGHEST_RECENT_SPENDERS,
                &[INT, INT],
                &["Number of Months", "Number of Top Spenders"],
                &[INT, TEXT, TEXT, DEC],
            )?,
            tabular(
                HIGHEST_PROFIT_PRODUCTS,
                &[INT, INT],
                &["Number of Months", "Number of Top Products"],
                &[TEXT, DEC, TEXT, DEC],
            )?,
            tabular(
                HIGHEST_RATED_DISTRIBUTOR_WITH_MIN_REVIEWS,
                &[INT, INT],
                &["Min Review Count", "Number of Top Distributors"],
                &[INT, TEXT, INT, DEC],
            )?,
            tabular(
                DISTRIBUTOR_HIGHEST_AVG_RATING,
                &[DEC, INT, INT],
                &["Purity", "Chemical Type", "Number of Top Distributors for This Product"],
                &[INT, TEXT, DEC],
            )?,
            tabular(
                PERCENTAGE_PURCHASE_W_DISCOUNTS,
                &[INT],
                &["Number of Months"],
                &[INT, INT, DEC],
            )?,
            query(GET_DISTRIBUTORS, "SELECT * FROM DISTRIBUTOR", &[INT, TEXT])?,
            query(GET_PENDING_SHIPMENTS, "SELECT * FROM PENDING_SHIPMENT", &[INT, INT, DATE])?,
            query(GET_CUSTOMERS, "SELECT CustomerID, EmailAddress FROM CUSTOMER", &[INT, TEXT])?,
            query(
                GET_MEASUREMENT_UNIT_APPLICABILITIES,
                "SELECT * FROM MEASUREMENT_UNIT_APPLICABILITY",
                &[TEXT, TEXT],
            )?,
            query(GET_CHEMICAL_TYPES, "SELECT * FROM CHEMICAL_TYPE", &[INT, TEXT, TEXT, TEXT])?,
            query(GET_CHEMICAL_QUALITIES, "SELECT * FROM CHEMICAL_QUALITY", &[INT, DEC, DEC])?,
        ];
        Ok(Self { entries })
    }

    /// Look a routine up by name, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
    }

    /// Descriptor for a routine that must exist.
    pub fn descriptor(&self, name: &str) -> Result<&CallDescriptor, CatalogError> {
        self.get(name)
            .map(|entry| &entry.descriptor)
            .ok_or_else(|| CatalogError::UnknownRoutine {
                name: name.to_string(),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.name)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
