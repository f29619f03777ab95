#![forbid(unsafe_code)]

//! Layout graph builder + canvas materializer for XMind workbooks.
//!
//! Bridges tree semantics (parent/child) to graph semantics (sized nodes and
//! directed edges with geometry). The layout algorithm itself is consumed as
//! an opaque [`engine::LayoutEngine`]; this crate owns only request/response
//! shaping and error translation.

pub mod canvas;
pub mod engine;
pub mod graph;

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use xmindcanvas_core::Workbook;

pub use canvas::{CanvasDocument, CanvasEdge, CanvasMaterializer, CanvasNode, CanvasNodeType, Side};
pub use engine::{LayoutEngine, TreeLayoutEngine};
pub use graph::{LayoutGraph, PositionedGraph, flatten_topic_tree};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Layout failed: {message}")]
    Layout { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    Right,
    Left,
    Down,
    Up,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Right => "RIGHT",
            Direction::Left => "LEFT",
            Direction::Down => "DOWN",
            Direction::Up => "UP",
        }
    }
}

impl FromStr for Direction {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RIGHT" => Ok(Self::Right),
            "LEFT" => Ok(Self::Left),
            "DOWN" => Ok(Self::Down),
            "UP" => Ok(Self::Up),
            _ => Err(()),
        }
    }
}

/// Conversion options. Defaults match the canonical left-to-right mind-map
/// rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOptions {
    pub layout_algorithm: String,
    pub direction: Direction,
    pub node_spacing: f64,
    pub layer_spacing: f64,
    pub default_node_width: f64,
    pub default_node_height: f64,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            layout_algorithm: "mrtree".to_string(),
            direction: Direction::Right,
            node_spacing: 80.0,
            layer_spacing: 150.0,
            default_node_width: 200.0,
            default_node_height: 80.0,
        }
    }
}

/// Submits the workbook's first sheet to a layout engine and returns the
/// positioned graph.
///
/// Fails fast with a "no sheets" condition before invoking the engine, and
/// wraps an engine rejection into [`Error::Layout`] with the engine's message.
pub fn calculate_layout(
    workbook: &Workbook,
    options: &ConversionOptions,
    engine: &dyn LayoutEngine,
) -> Result<PositionedGraph> {
    let Some(sheet) = workbook.sheets.first() else {
        return Err(Error::Layout {
            message: "no sheets found in workbook".to_string(),
        });
    };

    let request = graph::flatten_topic_tree(&sheet.root_topic, options);
    tracing::debug!(
        nodes = request.nodes.len(),
        edges = request.edges.len(),
        algorithm = %request.options.algorithm,
        "submitting layout request"
    );
    engine.layout(&request).map_err(|message| Error::Layout { message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use xmindcanvas_core::{Sheet, TopicNode};

    fn workbook(sheets: Vec<Sheet>) -> Workbook {
        Workbook {
            sheets,
            images: IndexMap::new(),
        }
    }

    fn sheet(root_topic: TopicNode) -> Sheet {
        Sheet {
            id: "s".to_string(),
            title: "Sheet".to_string(),
            root_topic,
        }
    }

    fn topic(id: &str, children: Vec<TopicNode>) -> TopicNode {
        TopicNode {
            id: id.to_string(),
            title: id.to_string(),
            children,
            notes: None,
            labels: None,
            markers: None,
            image: None,
        }
    }

    #[test]
    fn empty_workbook_fails_with_no_sheets() {
        let err = calculate_layout(
            &workbook(vec![]),
            &ConversionOptions::default(),
            &TreeLayoutEngine,
        )
        .unwrap_err();
        let Error::Layout { message } = err;
        assert!(message.contains("no sheets"), "message: {message}");
    }

    #[test]
    fn lays_out_the_first_sheet() {
        let book = workbook(vec![
            sheet(topic("r", vec![topic("a", vec![]), topic("b", vec![])])),
            sheet(topic("other", vec![])),
        ]);
        let positioned =
            calculate_layout(&book, &ConversionOptions::default(), &TreeLayoutEngine).unwrap();
        assert_eq!(positioned.nodes.len(), 3);
        assert_eq!(positioned.edges.len(), 2);
        assert_eq!(positioned.nodes[0].node.id, "r");
    }

    #[test]
    fn engine_rejection_becomes_a_layout_error() {
        struct RejectingEngine;
        impl LayoutEngine for RejectingEngine {
            fn layout(&self, _graph: &LayoutGraph) -> std::result::Result<PositionedGraph, String> {
                Err("engine exploded".to_string())
            }
        }

        let book = workbook(vec![sheet(topic("r", vec![]))]);
        let err = calculate_layout(&book, &ConversionOptions::default(), &RejectingEngine)
            .unwrap_err();
        let Error::Layout { message } = err;
        assert_eq!(message, "engine exploded");
    }
}
