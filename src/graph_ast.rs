use std::collections::HashMap;

/// Diagram flow direction. `TB` in the source text folds into `TopDown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    LeftRight,
    TopDown,
}

/// A node as it appears in the text: its name doubles as the rendered
/// label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    pub name: String,
    pub style_class: Option<String>,
}

impl TextNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            style_class: None,
        }
    }
}

/// A directed edge between two named nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdge {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
}

/// A `classDef` declaration. Only the `color` key is interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyleClass {
    pub name: String,
    pub styles: HashMap<String, String>,
}

impl StyleClass {
    pub fn color(&self) -> Option<&str> {
        self.styles.get("color").map(String::as_str)
    }
}

/// One `subgraph ... end` block. Subgraphs form a tree: `parent` and
/// `children` are indices into the owning `GraphProperties::subgraphs`
/// arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSubgraph {
    pub name: String,
    pub nodes: Vec<String>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

/// Parser output for the graph dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphProperties {
    pub direction: Direction,
    /// Nodes in first-seen order.
    pub nodes: Vec<TextNode>,
    /// Edges in declaration order.
    pub edges: Vec<TextEdge>,
    pub style_classes: HashMap<String, StyleClass>,
    pub subgraphs: Vec<TextSubgraph>,
    pub padding_x: usize,
    pub padding_y: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_class_color_lookup() {
        let mut class = StyleClass {
            name: "hot".to_string(),
            styles: HashMap::new(),
        };
        assert_eq!(class.color(), None);
        class.styles.insert("color".to_string(), "#f9f".to_string());
        assert_eq!(class.color(), Some("#f9f"));
    }

    #[test]
    fn text_node_defaults_to_no_class() {
        let node = TextNode::new("A");
        assert_eq!(node.name, "A");
        assert!(node.style_class.is_none());
    }
}
