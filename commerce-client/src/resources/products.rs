use super::{to_body, Page};
use crate::error::Error;
use crate::ApiClient;
use chrono::{DateTime, Utc};
use getset::Getters;
use serde::{Deserialize, Serialize};
use utils::query::QueryParams;

#[derive(Clone, Debug, Deserialize, Serialize, Getters)]
#[get = "pub"]
pub struct Product {
    id: u64,
    sku: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    price_cents: i64,
    currency: String,
    stock: i64,
    #[serde(default)]
    category_id: Option<u64>,
    #[serde(default)]
    supplier_id: Option<u64>,
    created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ProductInput {
    pub sku: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price_cents: i64,
    pub currency: String,
    pub stock: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<u64>,
}

#[derive(Clone, Debug, Default)]
pub struct ProductQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
    pub category_id: Option<u64>,
    pub supplier_id: Option<u64>,
}

impl ProductQuery {
    fn to_query_string(&self) -> String {
        let mut params = QueryParams::new();
        params.push_opt("page", self.page);
        params.push_opt("per_page", self.per_page);
        params.push_opt("search", self.search.as_deref());
        params.push_opt("category_id", self.category_id);
        params.push_opt("supplier_id", self.supplier_id);
        params.to_query_string()
    }
}

/// Product endpoints.
pub struct Products<'a> {
    client: &'a ApiClient,
}

impl<'a> Products<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &ProductQuery) -> Result<Option<Page<Product>>, Error> {
        self.client
            .get(&format!("products{}", query.to_query_string()))
            .await
    }

    pub async fn get(&self, id: u64) -> Result<Option<Product>, Error> {
        self.client.get(&format!("products/{id}")).await
    }

    pub async fn create(&self, input: &ProductInput) -> Result<Option<Product>, Error> {
        self.client.post("products", to_body(input)?).await
    }

    pub async fn update(&self, id: u64, input: &ProductInput) -> Result<Option<Product>, Error> {
        self.client
            .put(&format!("products/{id}"), to_body(input)?)
            .await
    }

    pub async fn remove(&self, id: u64) -> Result<(), Error> {
        self.client
            .delete(&format!("products/{id}"))
            .await
            .map(|_| ())
    }
}
