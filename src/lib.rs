pub mod ast;
pub mod canvas;
pub mod config;
pub mod display_width;
pub mod graph_ast;
pub mod graph_layout;
pub mod graph_parser;
pub mod graph_renderer;
pub mod graph_router;
pub mod layout;
pub mod parser;
pub mod renderer;

use thiserror::Error;

pub use config::{RenderConfig, StyleType};
pub use graph_ast::Direction;

/// The engine fails in exactly two ways: the diagram text is malformed,
/// or the configuration is invalid. Both abort the whole render.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("parse error: {0}")]
    Parse(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Input lines: real newlines plus the literal `\n` sequences some
/// callers pass through.
pub(crate) fn logical_lines(input: &str) -> impl Iterator<Item = &str> {
    input.split('\n').flat_map(|line| line.split("\\n"))
}

/// Render a diagram, dispatching on the first significant line: the
/// `sequenceDiagram` keyword selects the sequence pipeline, everything
/// else is treated as a graph/flowchart.
pub fn try_render(input: &str, config: &RenderConfig) -> Result<String, RenderError> {
    config.validate()?;
    if is_sequence_diagram(input) {
        let diagram = parser::parse_sequence(input)?;
        let layout = layout::compute(&diagram, config)?;
        Ok(renderer::render(&layout, config))
    } else {
        let props = graph_parser::parse_graph(input, config)?;
        let graph = graph_layout::compute(&props, config);
        Ok(graph_renderer::render(&graph, config))
    }
}

/// Declined-style entry point: callers get either a complete rendering
/// or `None`, never a partial drawing or an error to handle.
pub fn render(input: &str, config: &RenderConfig) -> Option<String> {
    try_render(input, config).ok()
}

fn is_sequence_diagram(input: &str) -> bool {
    for raw in logical_lines(input) {
        let line = match raw.find("%%") {
            Some(i) => &raw[..i],
            None => raw,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        return line.split_whitespace().next() == Some("sequenceDiagram");
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_graph_by_default() {
        let output = try_render("graph LR\nA --> B\n", &RenderConfig::default()).unwrap();
        assert!(output.contains("┌───┐"));
    }

    #[test]
    fn dispatch_sequence_by_keyword() {
        let output =
            try_render("sequenceDiagram\nAlice->>Bob: Hello\n", &RenderConfig::default()).unwrap();
        assert!(output.contains("Alice"));
        assert!(output.contains(">"));
    }

    #[test]
    fn dispatch_skips_comments_when_sniffing() {
        let input = "%% a comment\n\nsequenceDiagram\nA->>B: hi\n";
        assert!(is_sequence_diagram(input));
        assert!(try_render(input, &RenderConfig::default()).is_ok());
    }

    #[test]
    fn render_declines_on_parse_error() {
        assert_eq!(render("graph XY\nA --> B\n", &RenderConfig::default()), None);
    }

    #[test]
    fn render_declines_on_config_error() {
        let config = RenderConfig {
            seq_self_message_width: 0,
            ..RenderConfig::default()
        };
        assert_eq!(render("graph LR\nA --> B\n", &config), None);
    }

    #[test]
    fn config_error_wins_over_parse_error() {
        let config = RenderConfig {
            seq_self_message_width: 1,
            ..RenderConfig::default()
        };
        let err = try_render("not a diagram", &config).unwrap_err();
        assert!(matches!(err, RenderError::Config(_)));
    }

    #[test]
    fn rendering_is_idempotent() {
        let config = RenderConfig::default();
        for input in [
            "graph LR\nA --> B\nA --> C\nB --> D\n",
            "graph TD\nsubgraph one\nA --> B\nend\nC --> A\n",
            "sequenceDiagram\nautonumber\nAlice->>Bob: Hello\nBob-->>Alice: Hi!\n",
        ] {
            let first = try_render(input, &config).unwrap();
            let second = try_render(input, &config).unwrap();
            assert_eq!(first, second, "output must be byte-identical for {input:?}");
        }
    }
}
