use super::to_body;
use crate::error::Error;
use crate::ApiClient;
use futures::try_join;
use getset::Getters;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, Getters)]
#[get = "pub"]
pub struct Category {
    id: u64,
    name: String,
    slug: String,
    #[serde(default)]
    parent_id: Option<u64>,
    position: u32,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct CategoryInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<u64>,
}

/// A product attribute definition (size, color, material, ...).
#[derive(Clone, Debug, Deserialize, Serialize, Getters)]
#[get = "pub"]
pub struct Attribute {
    id: u64,
    code: String,
    label: String,
    kind: String,
}

/// Catalog metadata endpoints: categories and attribute definitions.
pub struct Catalog<'a> {
    client: &'a ApiClient,
}

impl<'a> Catalog<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn categories(&self) -> Result<Option<Vec<Category>>, Error> {
        self.client.get("catalog/categories").await
    }

    pub async fn create_category(&self, input: &CategoryInput) -> Result<Option<Category>, Error> {
        self.client.post("catalog/categories", to_body(input)?).await
    }

    pub async fn update_category(
        &self,
        id: u64,
        input: &CategoryInput,
    ) -> Result<Option<Category>, Error> {
        self.client
            .put(&format!("catalog/categories/{id}"), to_body(input)?)
            .await
    }

    pub async fn remove_category(&self, id: u64) -> Result<(), Error> {
        self.client
            .delete(&format!("catalog/categories/{id}"))
            .await
            .map(|_| ())
    }

    pub async fn attributes(&self) -> Result<Option<Vec<Attribute>>, Error> {
        self.client.get("catalog/attributes").await
    }

    /// Categories and attribute definitions together, the way the dashboard
    /// loads them on startup.
    pub async fn metadata(
        &self,
    ) -> Result<(Option<Vec<Category>>, Option<Vec<Attribute>>), Error> {
        try_join!(self.categories(), self.attributes())
    }
}
