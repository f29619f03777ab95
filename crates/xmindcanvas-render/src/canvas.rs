use crate::graph::{LayoutEdge, PositionedGraph, PositionedNode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Suffix appended to an image node's id for its caption node.
const CAPTION_ID_SUFFIX: &str = "-title";
/// Gap between an image node and its caption node.
const CAPTION_GAP: i64 = 10;
const CAPTION_HEIGHT: i64 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanvasNodeType {
    Text,
    File,
    Link,
    Group,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

/// JSON Canvas node (jsoncanvas.org spec 1.0). All geometry is integral.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: CanvasNodeType,
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasEdge {
    pub id: String,
    pub from_node: String,
    pub to_node: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_side: Option<Side>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_side: Option<Side>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// The final output document: positioned, typed nodes plus directed edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasDocument {
    pub nodes: Vec<CanvasNode>,
    pub edges: Vec<CanvasEdge>,
}

/// Resolves an image resource name to the path written into `file` nodes.
pub type ImagePathResolver = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Converts a positioned graph into a canvas document.
///
/// Plain nodes become `text` nodes; image-bearing nodes become a `file` node
/// plus, when the title is meaningful, a caption `text` node directly below.
/// Image paths go through the caller-supplied resolver, defaulting to
/// `<image_folder>/<name>`.
#[derive(Clone, Default)]
pub struct CanvasMaterializer {
    image_folder: Option<String>,
    image_path: Option<ImagePathResolver>,
}

impl CanvasMaterializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image_folder(mut self, folder: impl Into<String>) -> Self {
        self.image_folder = Some(folder.into());
        self
    }

    pub fn with_image_path_resolver(
        mut self,
        resolver: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.image_path = Some(Arc::new(resolver));
        self
    }

    pub fn materialize(&self, graph: &PositionedGraph) -> CanvasDocument {
        let mut nodes = Vec::with_capacity(graph.nodes.len());
        for positioned in &graph.nodes {
            nodes.extend(self.convert_node(positioned));
        }
        let edges = graph.edges.iter().map(convert_edge).collect();
        CanvasDocument { nodes, edges }
    }

    fn resolve_image_path(&self, name: &str) -> String {
        if let Some(resolver) = &self.image_path {
            return resolver(name);
        }
        let folder = self.image_folder.as_deref().unwrap_or("images");
        format!("{folder}/{name}")
    }

    /// One logical node materializes as 1 or 2 records: the node itself and,
    /// for image nodes with a non-default title, a caption below it.
    fn convert_node(&self, positioned: &PositionedNode) -> Vec<CanvasNode> {
        let node = &positioned.node;
        let x = positioned.x.round() as i64;
        let y = positioned.y.round() as i64;
        let width = node.width.round() as i64;
        let height = node.height.round() as i64;

        let Some(image_src) = node.image_src.as_deref().filter(|_| node.has_image) else {
            return vec![CanvasNode {
                id: node.id.clone(),
                node_type: CanvasNodeType::Text,
                x,
                y,
                width,
                height,
                text: Some(format!("### {}", node.label)),
                file: None,
                url: None,
                color: None,
            }];
        };

        let mut records = vec![CanvasNode {
            id: node.id.clone(),
            node_type: CanvasNodeType::File,
            x,
            y,
            width,
            height,
            text: None,
            file: Some(self.resolve_image_path(image_src)),
            url: None,
            color: None,
        }];

        if !node.label.is_empty() && node.label != "Untitled" {
            records.push(CanvasNode {
                id: format!("{}{CAPTION_ID_SUFFIX}", node.id),
                node_type: CanvasNodeType::Text,
                x,
                y: y + height + CAPTION_GAP,
                width,
                height: CAPTION_HEIGHT,
                text: Some(format!("### {}", node.label)),
                file: None,
                url: None,
                color: None,
            });
        }

        records
    }
}

/// Fixed directional convention matching left-to-right layout.
fn convert_edge(edge: &LayoutEdge) -> CanvasEdge {
    CanvasEdge {
        id: edge.id.clone(),
        from_node: edge.source.clone(),
        to_node: edge.target.clone(),
        from_side: Some(Side::Right),
        to_side: Some(Side::Left),
        color: None,
        label: None,
    }
}
