//! Triggers: saved queries that the service evaluates on a schedule and
//! compares against a threshold, notifying recipients when it is crossed.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::client::{path_segment, Client};
use crate::error::{ApiError, Result};
use crate::http::HttpMethod;
use crate::query::QuerySpec;

/// A trigger definition.
///
/// `id` is assigned by the server and is left empty when creating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<QuerySpec>,
    /// Evaluation interval in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<TriggerThreshold>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipients: Vec<TriggerRecipient>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerThreshold {
    pub op: TriggerThresholdOp,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerThresholdOp {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessThanOrEqual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRecipient {
    /// Set by the server for recipients shared across triggers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub recipient_type: RecipientType,
    pub target: String,
}

impl TriggerRecipient {
    pub fn email(address: impl Into<String>) -> Self {
        Self {
            id: None,
            recipient_type: RecipientType::Email,
            target: address.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientType {
    Email,
    Marker,
    Pagerduty,
    Slack,
}

/// Trigger operations scoped to the client's dataset.
#[derive(Debug, Clone, Copy)]
pub struct Triggers<'a> {
    client: &'a Client,
}

impl<'a> Triggers<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    #[instrument(skip(self), fields(dataset = %self.client.dataset()))]
    pub fn list(&self) -> Result<Vec<Trigger>> {
        let request = self.client.request(HttpMethod::Get, &self.collection_path())?;
        self.client.send(request)
    }

    #[instrument(skip(self), fields(dataset = %self.client.dataset()))]
    pub fn get(&self, id: &str) -> Result<Trigger> {
        let request = self.client.request(HttpMethod::Get, &self.item_path(id)?)?;
        self.client.send(request)
    }

    /// Create a trigger. Any `id` on `data` is ignored by the server.
    #[instrument(skip(self, data), fields(dataset = %self.client.dataset(), name = %data.name))]
    pub fn create(&self, data: &Trigger) -> Result<Trigger> {
        let request = self
            .client
            .json_request(HttpMethod::Post, &self.collection_path(), data)?;
        self.client.send(request)
    }

    /// Replace the trigger `id` with the full definition in `data`.
    #[instrument(skip(self, data), fields(dataset = %self.client.dataset()))]
    pub fn update(&self, id: &str, data: &Trigger) -> Result<Trigger> {
        let request = self
            .client
            .json_request(HttpMethod::Put, &self.item_path(id)?, data)?;
        self.client.send(request)
    }

    #[instrument(skip(self), fields(dataset = %self.client.dataset()))]
    pub fn delete(&self, id: &str) -> Result<()> {
        let request = self.client.request(HttpMethod::Delete, &self.item_path(id)?)?;
        self.client.send_empty(request)
    }

    fn collection_path(&self) -> String {
        format!("/1/triggers/{}", path_segment(self.client.dataset()))
    }

    fn item_path(&self, id: &str) -> Result<String> {
        if id.is_empty() {
            return Err(ApiError::MissingId);
        }
        Ok(format!(
            "/1/triggers/{}/{}",
            path_segment(self.client.dataset()),
            path_segment(id)
        ))
    }
}
