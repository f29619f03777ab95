use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A binary image extracted from the archive's `resources/` folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResource {
    /// Filename within `resources/` (the canonical lookup key).
    pub name: String,
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// Image reference carried by a topic.
///
/// `src` holds only the trailing filename; the `xap:resources/` prefix used by
/// XMind Zen is stripped during parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicImage {
    pub src: String,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

/// One node of a sheet's topic tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicNode {
    pub id: String,
    pub title: String,
    pub children: Vec<TopicNode>,
    pub notes: Option<String>,
    pub labels: Option<Vec<String>>,
    pub markers: Option<Vec<String>>,
    pub image: Option<TopicImage>,
}

/// The derived `Drop` would recurse through `children`, so a deep tree could
/// exhaust the call stack on destruction. Drain descendants into a worklist
/// instead; each node's children are detached before the node itself drops.
impl Drop for TopicNode {
    fn drop(&mut self) {
        let mut worklist = std::mem::take(&mut self.children);
        while let Some(mut node) = worklist.pop() {
            worklist.append(&mut node.children);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(depth: usize) -> TopicNode {
        let mut node = TopicNode {
            id: "leaf".to_string(),
            title: "leaf".to_string(),
            children: Vec::new(),
            notes: None,
            labels: None,
            markers: None,
            image: None,
        };
        for level in 0..depth {
            node = TopicNode {
                id: format!("n{level}"),
                title: "n".to_string(),
                children: vec![node],
                notes: None,
                labels: None,
                markers: None,
                image: None,
            };
        }
        node
    }

    #[test]
    fn dropping_a_deep_tree_does_not_overflow_the_stack() {
        drop(chain(50_000));
    }
}

/// One page of a workbook, holding exactly one topic tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    pub id: String,
    pub title: String,
    pub root_topic: TopicNode,
}

/// The parsed document: all sheets plus extracted image resources.
///
/// Built once per conversion and discarded afterwards; nothing here persists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
    /// Resource filename -> image, in archive entry order.
    pub images: IndexMap<String, ImageResource>,
}
