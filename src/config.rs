use std::str::FromStr;

use crate::RenderError;
use crate::graph_ast::Direction;

/// How colored glyphs are encoded in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StyleType {
    /// Terminal escape sequences.
    #[default]
    Cli,
    /// Inline HTML markup.
    Html,
}

impl FromStr for StyleType {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cli" => Ok(StyleType::Cli),
            "html" => Ok(StyleType::Html),
            other => Err(RenderError::Config(format!(
                "unknown style type '{other}'. Supported types: cli, html"
            ))),
        }
    }
}

impl FromStr for Direction {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LR" => Ok(Direction::LeftRight),
            "TD" | "TB" => Ok(Direction::TopDown),
            other => Err(RenderError::Config(format!(
                "unknown graph direction '{other}'. Supported directions: LR, TD"
            ))),
        }
    }
}

/// Options recognized by the engine. One value per render call; the
/// engine never mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Force plain ASCII glyphs instead of box-drawing characters.
    pub use_ascii: bool,
    /// Debug overlay printing column/row indices around graph output.
    pub show_coords: bool,
    /// Extra padding between a node's label and its border.
    pub box_border_padding: usize,
    /// Horizontal spacing between node levels.
    pub padding_between_x: usize,
    /// Vertical spacing between node levels.
    pub padding_between_y: usize,
    /// Direction assumed by the surrounding system; the diagram header
    /// always decides for a given render.
    pub graph_direction: Direction,
    pub style_type: StyleType,
    /// Minimum gap between sequence participant centers.
    pub seq_participant_spacing: usize,
    /// Blank rows between consecutive sequence messages.
    pub seq_message_spacing: usize,
    /// Arm length of a self-message loop, in columns.
    pub seq_self_message_width: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            use_ascii: false,
            show_coords: false,
            box_border_padding: 0,
            padding_between_x: 5,
            padding_between_y: 5,
            graph_direction: Direction::LeftRight,
            style_type: StyleType::Cli,
            seq_participant_spacing: 10,
            seq_message_spacing: 1,
            seq_self_message_width: 4,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.seq_self_message_width < 2 {
            return Err(RenderError::Config(format!(
                "self message width must be at least 2, got {}",
                self.seq_self_message_width
            )));
        }
        Ok(())
    }
}
