use crate::{ConversionOptions, Direction};
use serde::{Deserialize, Serialize};
use xmindcanvas_core::TopicNode;

/// Vertical space reserved under an image for its caption row.
const CAPTION_SPACE: f64 = 40.0;
/// Fallback dimensions for images whose reference carries no width/height.
const DEFAULT_IMAGE_WIDTH: f64 = 200.0;
const DEFAULT_IMAGE_HEIGHT: f64 = 150.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutNode {
    pub id: String,
    pub label: String,
    pub width: f64,
    pub height: f64,
    pub has_image: bool,
    pub image_src: Option<String>,
    pub image_width: Option<f64>,
    pub image_height: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

/// Textual layout options submitted alongside the graph, mirroring what an
/// external engine consumes (algorithm name, direction, spacings).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphLayoutOptions {
    pub algorithm: String,
    pub direction: Direction,
    pub node_spacing: f64,
    pub layer_spacing: f64,
}

/// The sized-node/edge request handed to a layout engine. Built and consumed
/// once per conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutGraph {
    pub root: String,
    pub options: GraphLayoutOptions,
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
}

/// A layout node with the position the engine assigned to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionedNode {
    pub node: LayoutNode,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionedGraph {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<LayoutEdge>,
}

/// Size heuristic: a pure function of title length and image dimensions.
/// No text measurement is involved, which keeps geometry byte-for-byte
/// reproducible across platforms.
pub fn node_dimensions(topic: &TopicNode, options: &ConversionOptions) -> (f64, f64) {
    let title_len = topic.title.chars().count() as f64;
    let mut width = options
        .default_node_width
        .max((title_len * 8.0).min(400.0));
    let mut height = options.default_node_height;

    if let Some(image) = &topic.image {
        let image_width = image.width.unwrap_or(DEFAULT_IMAGE_WIDTH);
        let image_height = image.height.unwrap_or(DEFAULT_IMAGE_HEIGHT);
        width = width.max(image_width).min(500.0);
        height = height.max(image_height + CAPTION_SPACE);
    }

    (width.max(1.0), height.max(1.0))
}

/// Flattens one topic tree into a layout request: one node per topic and one
/// edge per parent->child relationship (N nodes, N-1 edges for a tree).
///
/// Traversal is depth-first pre-order via an explicit work stack, so deep or
/// malformed trees cannot exhaust the call stack.
pub fn flatten_topic_tree(root: &TopicNode, options: &ConversionOptions) -> LayoutGraph {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();

    let mut stack: Vec<(&TopicNode, Option<String>)> = vec![(root, None)];
    while let Some((topic, parent_id)) = stack.pop() {
        let (width, height) = node_dimensions(topic, options);
        nodes.push(LayoutNode {
            id: topic.id.clone(),
            label: topic.title.clone(),
            width,
            height,
            has_image: topic.image.is_some(),
            image_src: topic.image.as_ref().map(|img| img.src.clone()),
            image_width: topic.image.as_ref().and_then(|img| img.width),
            image_height: topic.image.as_ref().and_then(|img| img.height),
        });

        if let Some(parent_id) = parent_id {
            edges.push(LayoutEdge {
                // Deterministic: the same parent/child pair regenerates the same id.
                id: format!("edge-{}-{}", parent_id, topic.id),
                source: parent_id,
                target: topic.id.clone(),
            });
        }

        // Reverse push so pop order preserves document order.
        for child in topic.children.iter().rev() {
            stack.push((child, Some(topic.id.clone())));
        }
    }

    LayoutGraph {
        root: "root".to_string(),
        options: GraphLayoutOptions {
            algorithm: options.layout_algorithm.clone(),
            direction: options.direction,
            node_spacing: options.node_spacing,
            layer_spacing: options.layer_spacing,
        },
        nodes,
        edges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xmindcanvas_core::TopicImage;

    fn topic(id: &str, title: &str, children: Vec<TopicNode>) -> TopicNode {
        TopicNode {
            id: id.to_string(),
            title: title.to_string(),
            children,
            notes: None,
            labels: None,
            markers: None,
            image: None,
        }
    }

    #[test]
    fn tree_flattens_to_n_nodes_and_n_minus_one_edges() {
        let root = topic(
            "r",
            "root",
            vec![
                topic("a", "a", vec![topic("a1", "a1", vec![])]),
                topic("b", "b", vec![]),
            ],
        );
        let graph = flatten_topic_tree(&root, &ConversionOptions::default());
        assert_eq!(graph.nodes.len(), 4);
        assert_eq!(graph.edges.len(), 3);
    }

    #[test]
    fn single_node_tree_has_zero_edges() {
        let graph = flatten_topic_tree(&topic("r", "root", vec![]), &ConversionOptions::default());
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn traversal_is_depth_first_pre_order() {
        let root = topic(
            "r",
            "root",
            vec![
                topic("a", "a", vec![topic("a1", "a1", vec![])]),
                topic("b", "b", vec![]),
            ],
        );
        let graph = flatten_topic_tree(&root, &ConversionOptions::default());
        let order: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(order, ["r", "a", "a1", "b"]);
    }

    #[test]
    fn edge_ids_are_deterministic() {
        let root = topic("r", "root", vec![topic("a", "a", vec![])]);
        let options = ConversionOptions::default();
        let first = flatten_topic_tree(&root, &options);
        let second = flatten_topic_tree(&root, &options);
        assert_eq!(first.edges[0].id, "edge-r-a");
        assert_eq!(first.edges[0].id, second.edges[0].id);
    }

    #[test]
    fn deep_tree_does_not_overflow_the_stack() {
        let mut node = topic("leaf", "leaf", vec![]);
        for depth in 0..50_000 {
            node = topic(&format!("n{depth}"), "n", vec![node]);
        }
        let graph = flatten_topic_tree(&node, &ConversionOptions::default());
        assert_eq!(graph.nodes.len(), 50_001);
        assert_eq!(graph.edges.len(), 50_000);
    }

    #[test]
    fn size_heuristic_for_plain_titles() {
        let options = ConversionOptions::default();
        let short = flatten_topic_tree(&topic("r", "hi", vec![]), &options);
        assert_eq!(short.nodes[0].width, 200.0);
        assert_eq!(short.nodes[0].height, 80.0);

        // 30 chars * 8 = 240 > default 200, below the 400 cap.
        let mid = flatten_topic_tree(&topic("r", &"x".repeat(30), vec![]), &options);
        assert_eq!(mid.nodes[0].width, 240.0);

        let long = flatten_topic_tree(&topic("r", &"x".repeat(80), vec![]), &options);
        assert_eq!(long.nodes[0].width, 400.0);
    }

    #[test]
    fn size_heuristic_for_image_nodes() {
        let mut node = topic("r", "pic", vec![]);
        node.image = Some(TopicImage {
            src: "a.png".to_string(),
            width: Some(100.0),
            height: Some(80.0),
        });
        let (width, height) = node_dimensions(&node, &ConversionOptions::default());
        // width = min(max(200, 100), 500); height = max(80, 80 + 40)
        assert_eq!(width, 200.0);
        assert_eq!(height, 120.0);

        node.image = Some(TopicImage {
            src: "big.png".to_string(),
            width: Some(900.0),
            height: Some(600.0),
        });
        let (width, height) = node_dimensions(&node, &ConversionOptions::default());
        assert_eq!(width, 500.0);
        assert_eq!(height, 640.0);
    }
}
