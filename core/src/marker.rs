//! Markers: timestamped annotations on a dataset's timeline.
//!
//! The API offers list and create only. `Markers::get` is emulated by
//! scanning a fresh list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::client::{path_segment, Client};
use crate::error::{ApiError, Result};
use crate::http::HttpMethod;

/// A marker as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Unix timestamp, truncated to seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    /// Unix timestamp, truncated to seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Free-form kind, e.g. `deploy` or `chef-run`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub marker_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Filled in by the server from the marker's type; cannot be set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Fields a client may supply when creating a marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerCreateData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub marker_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Marker operations scoped to the client's dataset.
#[derive(Debug, Clone, Copy)]
pub struct Markers<'a> {
    client: &'a Client,
}

impl<'a> Markers<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// List all markers in the dataset, in server order.
    #[instrument(skip(self), fields(dataset = %self.client.dataset()))]
    pub fn list(&self) -> Result<Vec<Marker>> {
        let request = self.client.request(HttpMethod::Get, &self.collection_path())?;
        self.client.send(request)
    }

    /// Find a marker by id.
    ///
    /// There is no single-marker endpoint, so this lists every marker and
    /// scans for a match: O(n) per call against a fresh snapshot.
    #[instrument(skip(self), fields(dataset = %self.client.dataset()))]
    pub fn get(&self, id: &str) -> Result<Marker> {
        self.list()?
            .into_iter()
            .find(|marker| marker.id == id)
            .ok_or(ApiError::NotFound)
    }

    #[instrument(skip(self, data), fields(dataset = %self.client.dataset()))]
    pub fn create(&self, data: &MarkerCreateData) -> Result<Marker> {
        let request = self
            .client
            .json_request(HttpMethod::Post, &self.collection_path(), data)?;
        self.client.send(request)
    }

    fn collection_path(&self) -> String {
        format!("/1/markers/{}", path_segment(self.client.dataset()))
    }
}
