use super::Page;
use crate::error::Error;
use crate::ApiClient;
use chrono::{DateTime, Utc};
use getset::Getters;
use serde::{Deserialize, Serialize};
use serde_json::json;
use strum_macros::{Display, EnumString};
use utils::query::QueryParams;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

#[derive(Clone, Debug, Deserialize, Serialize, Getters)]
#[get = "pub"]
pub struct OrderItem {
    product_id: u64,
    name: String,
    quantity: u32,
    unit_price_cents: i64,
}

#[derive(Clone, Debug, Deserialize, Serialize, Getters)]
#[get = "pub"]
pub struct Order {
    id: u64,
    customer_id: u64,
    status: OrderStatus,
    currency: String,
    total_cents: i64,
    items: Vec<OrderItem>,
    created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default)]
pub struct OrderQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<OrderStatus>,
    pub customer_id: Option<u64>,
}

impl OrderQuery {
    fn to_query_string(&self) -> String {
        let mut params = QueryParams::new();
        params.push_opt("page", self.page);
        params.push_opt("per_page", self.per_page);
        params.push_opt("status", self.status);
        params.push_opt("customer_id", self.customer_id);
        params.to_query_string()
    }
}

/// Order endpoints.
pub struct Orders<'a> {
    client: &'a ApiClient,
}

impl<'a> Orders<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &OrderQuery) -> Result<Option<Page<Order>>, Error> {
        self.client
            .get(&format!("orders{}", query.to_query_string()))
            .await
    }

    pub async fn get(&self, id: u64) -> Result<Option<Order>, Error> {
        self.client.get(&format!("orders/{id}")).await
    }

    /// Move an order through its fulfilment workflow.
    pub async fn update_status(
        &self,
        id: u64,
        status: OrderStatus,
    ) -> Result<Option<Order>, Error> {
        self.client
            .put(&format!("orders/{id}/status"), json!({ "status": status }))
            .await
    }

    pub async fn remove(&self, id: u64) -> Result<(), Error> {
        self.client.delete(&format!("orders/{id}")).await.map(|_| ())
    }
}
