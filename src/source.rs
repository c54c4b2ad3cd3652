use crate::models::ForecastError;
use crate::types::{ProductId, SaleRecord};
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Read-only access to historical sales.
///
/// Absence of data is an empty vector. An `Err` means the source itself could not be
/// reached; callers absorb it rather than retrying.
pub trait SalesSource: Send + Sync {
    /// Records in `[date_from, date_to]`, optionally restricted to one product.
    fn fetch_sales(
        &self,
        product_id: Option<ProductId>,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<Vec<SaleRecord>, ForecastError>;

    fn fetch_unit_price(&self, product_id: ProductId) -> Result<Decimal, ForecastError>;

    /// The product catalogue, ordered by name.
    fn fetch_products(&self) -> Result<Vec<Product>, ForecastError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// In-memory snapshot of the product catalogue and sales ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    pub products: Vec<Product>,
    pub sales: Vec<SaleRecord>,
}

impl Ledger {
    pub fn new(products: Vec<Product>, sales: Vec<SaleRecord>) -> Result<Self> {
        let ledger = Self { products, sales };
        ledger.validate()?;
        Ok(ledger)
    }

    /// Loads a JSON snapshot of `{ "products": [...], "sales": [...] }`.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Reading sales file {}", path.display()))?;

        let ledger: Ledger = serde_json::from_str(&contents)
            .with_context(|| format!("Parsing sales file {}", path.display()))?;

        ledger.validate()?;
        Ok(ledger)
    }

    fn validate(&self) -> Result<()> {
        if let Some(product) = self.products.iter().find(|p| p.price.is_sign_negative()) {
            return Err(anyhow!("Product {} has a negative price", product.id));
        }

        if let Some(sale) = self.sales.iter().find(|s| s.revenue.is_sign_negative()) {
            return Err(anyhow!(
                "Sale of product {} on {} has negative revenue",
                sale.product_id,
                sale.date
            ));
        }

        Ok(())
    }

    pub fn product(&self, product_id: ProductId) -> Option<&Product> {
        self.products.iter().find(|product| product.id == product_id)
    }
}

impl SalesSource for Ledger {
    fn fetch_sales(
        &self,
        product_id: Option<ProductId>,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<Vec<SaleRecord>, ForecastError> {
        let mut records: Vec<SaleRecord> = self
            .sales
            .iter()
            .filter(|sale| product_id.map_or(true, |id| sale.product_id == id))
            .filter(|sale| sale.date >= date_from && sale.date <= date_to)
            .cloned()
            .collect();

        records.sort_by_key(|sale| (sale.date, sale.product_id));
        Ok(records)
    }

    fn fetch_unit_price(&self, product_id: ProductId) -> Result<Decimal, ForecastError> {
        self.product(product_id)
            .map(|product| product.price)
            .ok_or_else(|| {
                ForecastError::data_unavailable(format!("Unknown product {}", product_id))
            })
    }

    fn fetch_products(&self) -> Result<Vec<Product>, ForecastError> {
        let mut products = self.products.clone();
        products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(products)
    }
}
