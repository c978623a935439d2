use super::{to_body, Page};
use crate::error::Error;
use crate::ApiClient;
use chrono::{DateTime, Utc};
use getset::Getters;
use serde::{Deserialize, Serialize};
use utils::query::QueryParams;

#[derive(Clone, Debug, Deserialize, Serialize, Getters)]
#[get = "pub"]
pub struct Customer {
    id: u64,
    email: String,
    first_name: String,
    last_name: String,
    #[serde(default)]
    company: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct CustomerInput {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct CustomerQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
}

impl CustomerQuery {
    fn to_query_string(&self) -> String {
        let mut params = QueryParams::new();
        params.push_opt("page", self.page);
        params.push_opt("per_page", self.per_page);
        params.push_opt("search", self.search.as_deref());
        params.to_query_string()
    }
}

/// Customer endpoints.
pub struct Customers<'a> {
    client: &'a ApiClient,
}

impl<'a> Customers<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &CustomerQuery) -> Result<Option<Page<Customer>>, Error> {
        self.client
            .get(&format!("customers{}", query.to_query_string()))
            .await
    }

    pub async fn get(&self, id: u64) -> Result<Option<Customer>, Error> {
        self.client.get(&format!("customers/{id}")).await
    }

    pub async fn create(&self, input: &CustomerInput) -> Result<Option<Customer>, Error> {
        self.client.post("customers", to_body(input)?).await
    }

    pub async fn update(&self, id: u64, input: &CustomerInput) -> Result<Option<Customer>, Error> {
        self.client
            .put(&format!("customers/{id}"), to_body(input)?)
            .await
    }

    pub async fn remove(&self, id: u64) -> Result<(), Error> {
        self.client
            .delete(&format!("customers/{id}"))
            .await
            .map(|_| ())
    }
}
