//! Typed wrappers over the backend's REST resources. Each wrapper borrows
//! the client; list reads go through the cached GET path, mutations bypass
//! the cache.

mod catalog;
mod customers;
mod orders;
mod products;
mod quotes;
mod suppliers;

pub use catalog::{Attribute, Catalog, Category, CategoryInput};
pub use customers::{Customer, CustomerInput, CustomerQuery, Customers};
pub use orders::{Order, OrderItem, OrderQuery, OrderStatus, Orders};
pub use products::{Product, ProductInput, ProductQuery, Products};
pub use quotes::{Quote, QuoteInput, QuoteItemInput, QuoteQuery, QuoteStatus, Quotes};
pub use suppliers::{Supplier, SupplierInput, Suppliers};

use crate::error::Error;
use getset::Getters;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Paginated list envelope returned by the backend's list endpoints.
#[derive(Clone, Debug, Deserialize, Serialize, Getters)]
#[get = "pub"]
pub struct Page<T> {
    items: Vec<T>,
    page: u32,
    per_page: u32,
    total: u64,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

pub(crate) fn to_body<T: Serialize>(input: &T) -> Result<Value, Error> {
    serde_json::to_value(input).map_err(|err| Error::Decode(err.to_string()))
}
