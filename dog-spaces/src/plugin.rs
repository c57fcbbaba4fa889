//! Host-facing plugin metadata and construction.
//!
//! A host application lists providers by id, renders a settings form from
//! [`auth_fields`], and calls [`init`] with the values the user entered.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{SpacesConfig, SpacesProvider, SpacesResult, SpacesStore};

/// Identifier the host registers this provider under
pub const PROVIDER_ID: &str = "do";

/// Human readable provider name
pub const PROVIDER_NAME: &str = "Digital Ocean Spaces";

/// Input widget of a settings field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
}

/// One settings field shown by the host's configuration UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthField {
    /// Config key the value is stored under
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldType,
}

impl AuthField {
    fn text(name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldType::Text,
        }
    }
}

/// Settings fields in display order. Descriptive only; nothing here is
/// checked at runtime.
pub fn auth_fields() -> Vec<AuthField> {
    vec![
        AuthField::text("key", "Key"),
        AuthField::text("secret", "Secret"),
        AuthField::text("endpoint", "Endpoint (e.g. 'fra1.digitaloceanspaces.com')"),
        AuthField::text("cdn", "CDN Endpoint (Optional - e.g. 'https://cdn.space.com')"),
        AuthField::text("space", "Space (e.g. myspace)"),
        AuthField::text(
            "directory",
            "Directory (Optional - e.g. directory - place when you want to save files)",
        ),
    ]
}

/// Provider description handed to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub provider: String,
    pub name: String,
    pub auth: Vec<AuthField>,
}

pub fn provider_info() -> ProviderInfo {
    ProviderInfo {
        provider: PROVIDER_ID.to_string(),
        name: PROVIDER_NAME.to_string(),
        auth: auth_fields(),
    }
}

/// Build a provider talking to Spaces from the host's configuration
pub async fn init(config: SpacesConfig) -> SpacesResult<SpacesProvider> {
    let config = config.validate()?;
    let store = SpacesStore::new(&config).await?;

    info!(
        space = %config.space,
        endpoint = %config.endpoint,
        cdn = config.cdn.as_deref().unwrap_or("-"),
        folders = config.folders.len(),
        "initialized {} provider",
        PROVIDER_NAME
    );

    SpacesProvider::new(store, config)
}
