//! Boards: named collections of saved queries. Boards belong to the
//! account rather than a dataset, so paths carry no dataset segment.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::client::{path_segment, Client};
use crate::error::{ApiError, Result};
use crate::http::HttpMethod;
use crate::query::QuerySpec;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Board {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub style: BoardStyle,
    #[serde(default)]
    pub queries: Vec<BoardQuery>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardStyle {
    #[default]
    List,
    Visual,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub dataset: String,
    pub query: QuerySpec,
}

#[derive(Debug, Clone, Copy)]
pub struct Boards<'a> {
    client: &'a Client,
}

impl<'a> Boards<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub fn list(&self) -> Result<Vec<Board>> {
        let request = self.client.request(HttpMethod::Get, "/1/boards")?;
        self.client.send(request)
    }

    #[instrument(skip(self))]
    pub fn get(&self, id: &str) -> Result<Board> {
        let request = self.client.request(HttpMethod::Get, &item_path(id)?)?;
        self.client.send(request)
    }

    #[instrument(skip(self, data), fields(name = %data.name))]
    pub fn create(&self, data: &Board) -> Result<Board> {
        let request = self.client.json_request(HttpMethod::Post, "/1/boards", data)?;
        self.client.send(request)
    }

    #[instrument(skip(self, data))]
    pub fn update(&self, id: &str, data: &Board) -> Result<Board> {
        let request = self.client.json_request(HttpMethod::Put, &item_path(id)?, data)?;
        self.client.send(request)
    }

    #[instrument(skip(self))]
    pub fn delete(&self, id: &str) -> Result<()> {
        let request = self.client.request(HttpMethod::Delete, &item_path(id)?)?;
        self.client.send_empty(request)
    }
}

fn item_path(id: &str) -> Result<String> {
    if id.is_empty() {
        return Err(ApiError::MissingId);
    }
    Ok(format!("/1/boards/{}", path_segment(id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn style_defaults_to_list() {
        let board: Board = serde_json::from_value(json!({ "name": "Ops" })).unwrap();
        assert_eq!(board.style, BoardStyle::List);
        assert!(board.queries.is_empty());
        assert!(board.id.is_none());
    }

    #[test]
    fn board_serializes_queries() {
        let board = Board {
            name: "Ops".to_string(),
            style: BoardStyle::Visual,
            queries: vec![BoardQuery {
                caption: Some("errors".to_string()),
                dataset: "api".to_string(),
                query: QuerySpec::default(),
            }],
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&board).unwrap(),
            json!({
                "name": "Ops",
                "style": "visual",
                "queries": [{ "caption": "errors", "dataset": "api", "query": {} }]
            })
        );
    }

    #[test]
    fn empty_id_is_rejected() {
        assert_eq!(item_path(""), Err(ApiError::MissingId));
        assert_eq!(item_path("b1"), Ok("/1/boards/b1".to_string()));
    }

    #[test]
    fn id_is_escaped_as_one_segment() {
        assert_eq!(item_path("b1?x=1"), Ok("/1/boards/b1%3Fx%3D1".to_string()));
        assert_eq!(item_path("../triggers"), Ok("/1/boards/..%2Ftriggers".to_string()));
    }
}
