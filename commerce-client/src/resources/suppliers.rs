use super::to_body;
use crate::error::Error;
use crate::ApiClient;
use chrono::{DateTime, Utc};
use getset::Getters;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, Getters)]
#[get = "pub"]
pub struct Supplier {
    id: u64,
    name: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct SupplierInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Supplier endpoints. The supplier list is small enough that the backend
/// returns it unpaged.
pub struct Suppliers<'a> {
    client: &'a ApiClient,
}

impl<'a> Suppliers<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Option<Vec<Supplier>>, Error> {
        self.client.get("suppliers").await
    }

    pub async fn get(&self, id: u64) -> Result<Option<Supplier>, Error> {
        self.client.get(&format!("suppliers/{id}")).await
    }

    pub async fn create(&self, input: &SupplierInput) -> Result<Option<Supplier>, Error> {
        self.client.post("suppliers", to_body(input)?).await
    }

    pub async fn update(&self, id: u64, input: &SupplierInput) -> Result<Option<Supplier>, Error> {
        self.client
            .put(&format!("suppliers/{id}"), to_body(input)?)
            .await
    }

    pub async fn remove(&self, id: u64) -> Result<(), Error> {
        self.client
            .delete(&format!("suppliers/{id}"))
            .await
            .map(|_| ())
    }
}
