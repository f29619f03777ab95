use crate::Direction;
use crate::graph::{LayoutGraph, PositionedGraph, PositionedNode};
use std::collections::HashMap;

/// An opaque graph-layout capability: sized nodes and edges in, positioned
/// nodes out. Engines own no request building and no error taxonomy; a
/// rejection is a plain message the adapter wraps into a layout error.
pub trait LayoutEngine {
    fn layout(&self, graph: &LayoutGraph) -> Result<PositionedGraph, String>;
}

/// Built-in deterministic tree placer.
///
/// Handles the `mrtree` and `layered` algorithm names. Both assign one layer
/// per tree depth along the primary axis (`layer_spacing` between layers) and
/// stack nodes along the cross axis (`node_spacing` between neighbors);
/// `mrtree` additionally centers each parent over its children's span.
/// Positions are a pure function of the request, so identical inputs yield
/// identical geometry.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeLayoutEngine;

impl LayoutEngine for TreeLayoutEngine {
    fn layout(&self, graph: &LayoutGraph) -> Result<PositionedGraph, String> {
        let center_parents = match graph.options.algorithm.as_str() {
            "mrtree" => true,
            "layered" => false,
            other => return Err(format!("unknown layout algorithm: {other}")),
        };

        if graph.nodes.is_empty() {
            return Ok(PositionedGraph {
                nodes: Vec::new(),
                edges: graph.edges.clone(),
            });
        }

        let index_of: HashMap<&str, usize> = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();

        // Child adjacency in edge order; the tree root is the first node of
        // the flattening (pre-order starts at the root).
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); graph.nodes.len()];
        for edge in &graph.edges {
            let source = *index_of
                .get(edge.source.as_str())
                .ok_or_else(|| format!("edge {} references unknown source {}", edge.id, edge.source))?;
            let target = *index_of
                .get(edge.target.as_str())
                .ok_or_else(|| format!("edge {} references unknown target {}", edge.id, edge.target))?;
            children[source].push(target);
        }

        let horizontal = matches!(graph.options.direction, Direction::Right | Direction::Left);
        let primary_extent =
            |i: usize| if horizontal { graph.nodes[i].width } else { graph.nodes[i].height };
        let cross_extent =
            |i: usize| if horizontal { graph.nodes[i].height } else { graph.nodes[i].width };

        let depths = assign_depths(&children, graph.nodes.len());
        let max_depth = depths.iter().copied().max().unwrap_or(0);

        // Primary-axis offset per layer: previous layers' widest extent plus
        // the inter-layer spacing.
        let mut layer_extent = vec![0.0_f64; max_depth + 1];
        for (i, depth) in depths.iter().enumerate() {
            layer_extent[*depth] = layer_extent[*depth].max(primary_extent(i));
        }
        let mut layer_offset = vec![0.0_f64; max_depth + 1];
        for depth in 1..=max_depth {
            layer_offset[depth] =
                layer_offset[depth - 1] + layer_extent[depth - 1] + graph.options.layer_spacing;
        }

        let cross = if center_parents {
            centered_cross_positions(&children, graph.options.node_spacing, &cross_extent)
        } else {
            layered_cross_positions(&depths, max_depth, graph.options.node_spacing, &cross_extent)
        };

        let nodes = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| {
                let mut primary = layer_offset[depths[i]];
                if matches!(graph.options.direction, Direction::Left | Direction::Up) {
                    primary = -primary - primary_extent(i);
                }
                let (x, y) = if horizontal {
                    (primary, cross[i])
                } else {
                    (cross[i], primary)
                };
                PositionedNode {
                    node: node.clone(),
                    x,
                    y,
                }
            })
            .collect();

        Ok(PositionedGraph {
            nodes,
            edges: graph.edges.clone(),
        })
    }
}

fn assign_depths(children: &[Vec<usize>], count: usize) -> Vec<usize> {
    let mut depths = vec![0_usize; count];
    let mut stack: Vec<usize> = vec![0];
    while let Some(index) = stack.pop() {
        for &child in &children[index] {
            depths[child] = depths[index] + 1;
            stack.push(child);
        }
    }
    depths
}

/// Stacks each layer's nodes in flattening order.
fn layered_cross_positions(
    depths: &[usize],
    max_depth: usize,
    node_spacing: f64,
    cross_extent: &dyn Fn(usize) -> f64,
) -> Vec<f64> {
    let mut cursors = vec![0.0_f64; max_depth + 1];
    let mut cross = vec![0.0_f64; depths.len()];
    for (i, depth) in depths.iter().enumerate() {
        cross[i] = cursors[*depth];
        cursors[*depth] += cross_extent(i) + node_spacing;
    }
    cross
}

/// Places leaves at successive cross positions and centers each parent over
/// the span of its children (post-order, explicit stack).
fn centered_cross_positions(
    children: &[Vec<usize>],
    node_spacing: f64,
    cross_extent: &dyn Fn(usize) -> f64,
) -> Vec<f64> {
    let mut post_order = Vec::with_capacity(children.len());
    let mut stack: Vec<usize> = vec![0];
    while let Some(index) = stack.pop() {
        post_order.push(index);
        stack.extend(children[index].iter().copied());
    }
    post_order.reverse();

    let mut cross = vec![0.0_f64; children.len()];
    let mut cursor = 0.0_f64;
    for index in post_order {
        if children[index].is_empty() {
            cross[index] = cursor;
            cursor += cross_extent(index) + node_spacing;
        } else {
            let center = |child: usize| cross[child] + cross_extent(child) / 2.0;
            let first = children[index][0];
            let last = *children[index].last().expect("non-empty children");
            cross[index] = (center(first) + center(last)) / 2.0 - cross_extent(index) / 2.0;
        }
    }
    cross
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphLayoutOptions, LayoutEdge, LayoutNode};

    fn node(id: &str) -> LayoutNode {
        LayoutNode {
            id: id.to_string(),
            label: id.to_string(),
            width: 200.0,
            height: 80.0,
            has_image: false,
            image_src: None,
            image_width: None,
            image_height: None,
        }
    }

    fn edge(source: &str, target: &str) -> LayoutEdge {
        LayoutEdge {
            id: format!("edge-{source}-{target}"),
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    fn graph(algorithm: &str, direction: Direction) -> LayoutGraph {
        LayoutGraph {
            root: "root".to_string(),
            options: GraphLayoutOptions {
                algorithm: algorithm.to_string(),
                direction,
                node_spacing: 80.0,
                layer_spacing: 150.0,
            },
            nodes: vec![node("r"), node("a"), node("b")],
            edges: vec![edge("r", "a"), edge("r", "b")],
        }
    }

    #[test]
    fn preserves_node_and_edge_order() {
        let positioned = TreeLayoutEngine
            .layout(&graph("mrtree", Direction::Right))
            .unwrap();
        let ids: Vec<&str> = positioned.nodes.iter().map(|n| n.node.id.as_str()).collect();
        assert_eq!(ids, ["r", "a", "b"]);
        assert_eq!(positioned.edges.len(), 2);
        assert_eq!(positioned.edges[0].id, "edge-r-a");
    }

    #[test]
    fn children_land_one_layer_past_the_root() {
        let positioned = TreeLayoutEngine
            .layout(&graph("mrtree", Direction::Right))
            .unwrap();
        let root = &positioned.nodes[0];
        assert_eq!(root.x, 0.0);
        for child in &positioned.nodes[1..] {
            // root width 200 + layer spacing 150
            assert_eq!(child.x, 350.0);
        }
    }

    #[test]
    fn mrtree_centers_the_parent_over_its_children() {
        let positioned = TreeLayoutEngine
            .layout(&graph("mrtree", Direction::Right))
            .unwrap();
        let (root, a, b) = (
            &positioned.nodes[0],
            &positioned.nodes[1],
            &positioned.nodes[2],
        );
        let root_center = root.y + root.node.height / 2.0;
        let span_center =
            (a.y + a.node.height / 2.0 + b.y + b.node.height / 2.0) / 2.0;
        assert_eq!(root_center, span_center);
    }

    #[test]
    fn direction_changes_coordinates_but_not_counts() {
        let right = TreeLayoutEngine
            .layout(&graph("mrtree", Direction::Right))
            .unwrap();
        let down = TreeLayoutEngine
            .layout(&graph("mrtree", Direction::Down))
            .unwrap();
        assert_eq!(right.nodes.len(), down.nodes.len());
        assert_eq!(right.edges.len(), down.edges.len());

        let coords = |g: &PositionedGraph| -> Vec<(f64, f64)> {
            g.nodes.iter().map(|n| (n.x, n.y)).collect()
        };
        assert_ne!(coords(&right), coords(&down));
    }

    #[test]
    fn left_and_up_mirror_the_primary_axis() {
        let left = TreeLayoutEngine
            .layout(&graph("layered", Direction::Left))
            .unwrap();
        assert!(left.nodes[1].x < 0.0);

        let up = TreeLayoutEngine
            .layout(&graph("layered", Direction::Up))
            .unwrap();
        assert!(up.nodes[1].y < 0.0);
    }

    #[test]
    fn unknown_algorithm_is_rejected() {
        let err = TreeLayoutEngine
            .layout(&graph("cose", Direction::Right))
            .unwrap_err();
        assert!(err.contains("unknown layout algorithm"));
    }

    #[test]
    fn identical_requests_yield_identical_geometry() {
        let request = graph("mrtree", Direction::Right);
        let first = TreeLayoutEngine.layout(&request).unwrap();
        let second = TreeLayoutEngine.layout(&request).unwrap();
        let coords = |g: &PositionedGraph| -> Vec<(f64, f64)> {
            g.nodes.iter().map(|n| (n.x, n.y)).collect()
        };
        assert_eq!(coords(&first), coords(&second));
    }
}
