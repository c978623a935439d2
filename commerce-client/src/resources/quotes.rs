use super::{to_body, Order, Page};
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
pub enum QuoteStatus {
    Draft,
    Sent,
    Accepted,
    Declined,
    Expired,
}

#[derive(Clone, Debug, Deserialize, Serialize, Getters)]
#[get = "pub"]
pub struct Quote {
    id: u64,
    customer_id: u64,
    status: QuoteStatus,
    currency: String,
    total_cents: i64,
    valid_until: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
pub struct QuoteItemInput {
    pub product_id: u64,
    pub quantity: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct QuoteInput {
    pub customer_id: u64,
    pub items: Vec<QuoteItemInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default)]
pub struct QuoteQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<QuoteStatus>,
    pub customer_id: Option<u64>,
}

impl QuoteQuery {
    fn to_query_string(&self) -> String {
        let mut params = QueryParams::new();
        params.push_opt("page", self.page);
        params.push_opt("per_page", self.per_page);
        params.push_opt("status", self.status);
        params.push_opt("customer_id", self.customer_id);
        params.to_query_string()
    }
}

/// Quote endpoints.
pub struct Quotes<'a> {
    client: &'a ApiClient,
}

impl<'a> Quotes<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &QuoteQuery) -> Result<Option<Page<Quote>>, Error> {
        self.client
            .get(&format!("quotes{}", query.to_query_string()))
            .await
    }

    pub async fn get(&self, id: u64) -> Result<Option<Quote>, Error> {
        self.client.get(&format!("quotes/{id}")).await
    }

    pub async fn create(&self, input: &QuoteInput) -> Result<Option<Quote>, Error> {
        self.client.post("quotes", to_body(input)?).await
    }

    pub async fn update_status(
        &self,
        id: u64,
        status: QuoteStatus,
    ) -> Result<Option<Quote>, Error> {
        self.client
            .put(&format!("quotes/{id}/status"), json!({ "status": status }))
            .await
    }

    /// Turn an accepted quote into an order.
    pub async fn convert(&self, id: u64) -> Result<Option<Order>, Error> {
        self.client
            .post(&format!("quotes/{id}/convert"), json!({}))
            .await
    }

    pub async fn remove(&self, id: u64) -> Result<(), Error> {
        self.client.delete(&format!("quotes/{id}")).await.map(|_| ())
    }
}
