use std::collections::HashMap;

use log::debug;
use winnow::ascii::{space0, space1};
use winnow::combinator::{alt, opt, preceded, repeat, separated};
use winnow::prelude::*;
use winnow::token::{rest, take_while};

use crate::RenderError;
use crate::config::RenderConfig;
use crate::graph_ast::*;
use crate::logical_lines;

pub fn parse_graph(input: &str, config: &RenderConfig) -> Result<GraphProperties, RenderError> {
    let mut lines: Vec<&str> = Vec::new();
    for raw in logical_lines(input) {
        if raw.trim() == "---" {
            break;
        }
        let without_comment = match raw.find("%%") {
            Some(i) => &raw[..i],
            None => raw,
        };
        let line = without_comment.trim();
        if !line.is_empty() {
            lines.push(line);
        }
    }

    let mut padding_x = config.padding_between_x;
    let mut padding_y = config.padding_between_y;
    let mut idx = 0;
    while idx < lines.len() {
        match padding_directive(lines[idx])? {
            Some(('y', value)) => padding_y = value,
            Some((_, value)) => padding_x = value,
            None => break,
        }
        idx += 1;
    }

    let Some(&header_line) = lines.get(idx) else {
        return Err(RenderError::Parse("missing graph definition".to_string()));
    };
    let direction = parse_header(header_line)?;
    idx += 1;

    let mut props = GraphProperties {
        direction,
        nodes: Vec::new(),
        edges: Vec::new(),
        style_classes: HashMap::new(),
        subgraphs: Vec::new(),
        padding_x,
        padding_y,
    };
    let mut open_subgraphs: Vec<usize> = Vec::new();

    for &line in &lines[idx..] {
        debug!("parsing line: {line}");

        if line == "end" {
            open_subgraphs.pop();
            continue;
        }
        if let Ok(name) = subgraph_start.parse(line) {
            let sg_idx = props.subgraphs.len();
            let parent = open_subgraphs.last().copied();
            props.subgraphs.push(TextSubgraph {
                name,
                nodes: Vec::new(),
                parent,
                children: Vec::new(),
            });
            if let Some(parent_idx) = parent {
                props.subgraphs[parent_idx].children.push(sg_idx);
            }
            open_subgraphs.push(sg_idx);
            continue;
        }
        if let Ok(class) = class_def.parse(line) {
            props.style_classes.insert(class.name.clone(), class);
            continue;
        }

        let (nodes, edges) = statement
            .parse(line)
            .map_err(|_| RenderError::Parse(format!("could not parse line: `{line}`")))?;

        let mut newly_added: Vec<String> = Vec::new();
        for node in nodes {
            let name = node.name.clone();
            if add_node(&mut props.nodes, node) {
                newly_added.push(name);
            }
        }
        props.edges.extend(edges);

        for name in &newly_added {
            for &sg_idx in &open_subgraphs {
                let sg = &mut props.subgraphs[sg_idx];
                if !sg.nodes.contains(name) {
                    sg.nodes.push(name.clone());
                }
            }
        }
    }

    debug!(
        "parsed graph: {} nodes, {} edges, {} subgraphs",
        props.nodes.len(),
        props.edges.len(),
        props.subgraphs.len()
    );
    Ok(props)
}

/// `paddingX=<n>` / `paddingY=<n>`, case-insensitive on the axis.
/// Returns Ok(None) for lines that are not padding directives.
fn padding_directive(line: &str) -> Result<Option<(char, usize)>, RenderError> {
    let lower = line.to_ascii_lowercase();
    let axis = if lower.starts_with("paddingx") {
        'x'
    } else if lower.starts_with("paddingy") {
        'y'
    } else {
        return Ok(None);
    };
    let Some(value) = line[8..].trim_start().strip_prefix('=') else {
        return Ok(None);
    };
    match value.trim().parse::<usize>() {
        Ok(v) => Ok(Some((axis, v))),
        Err(_) => Err(RenderError::Parse(format!(
            "padding directive requires a numeric value: `{line}`"
        ))),
    }
}

fn parse_header(line: &str) -> Result<Direction, RenderError> {
    header.parse(line).map_err(|_| {
        RenderError::Parse(format!(
            "unsupported graph type '{line}'. Supported types: graph TD, graph TB, graph LR, \
             flowchart TD, flowchart TB, flowchart LR"
        ))
    })
}

fn header(input: &mut &str) -> winnow::Result<Direction> {
    alt(("graph", "flowchart")).parse_next(input)?;
    space1.parse_next(input)?;
    let direction = alt((
        "LR".value(Direction::LeftRight),
        "TD".value(Direction::TopDown),
        "TB".value(Direction::TopDown),
    ))
    .parse_next(input)?;
    space0.parse_next(input)?;
    Ok(direction)
}

fn ident<'s>(input: &mut &'s str) -> winnow::Result<&'s str> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_').parse_next(input)
}

fn node_ref(input: &mut &str) -> winnow::Result<TextNode> {
    let name = ident.parse_next(input)?;
    let class = opt(preceded(":::", ident)).parse_next(input)?;
    Ok(TextNode {
        name: name.to_string(),
        style_class: class.map(str::to_string),
    })
}

/// One or more node references joined by `&`.
fn node_list(input: &mut &str) -> winnow::Result<Vec<TextNode>> {
    separated(1.., node_ref, (space0, '&', space0)).parse_next(input)
}

fn edge_label(input: &mut &str) -> winnow::Result<String> {
    '|'.parse_next(input)?;
    let text = take_while(1.., |c: char| c != '|').parse_next(input)?;
    '|'.parse_next(input)?;
    Ok(text.trim().to_string())
}

fn edge_hop(input: &mut &str) -> winnow::Result<(Option<String>, Vec<TextNode>)> {
    (space0, "-->").parse_next(input)?;
    let label = opt(edge_label).parse_next(input)?;
    space0.parse_next(input)?;
    let targets = node_list.parse_next(input)?;
    Ok((label, targets))
}

/// An edge chain (`A --> B -->|l| C & D`) or a bare node list. Every hop
/// links the full left set to the full right set.
fn statement(input: &mut &str) -> winnow::Result<(Vec<TextNode>, Vec<TextEdge>)> {
    let first = node_list.parse_next(input)?;
    let hops: Vec<(Option<String>, Vec<TextNode>)> = repeat(0.., edge_hop).parse_next(input)?;
    space0.parse_next(input)?;

    let mut nodes = first.clone();
    let mut edges = Vec::new();
    let mut sources = first;
    for (label, targets) in hops {
        for from in &sources {
            for to in &targets {
                edges.push(TextEdge {
                    from: from.name.clone(),
                    to: to.name.clone(),
                    label: label.clone(),
                });
            }
        }
        nodes.extend(targets.iter().cloned());
        sources = targets;
    }
    Ok((nodes, edges))
}

fn subgraph_start(input: &mut &str) -> winnow::Result<String> {
    ("subgraph", space1).parse_next(input)?;
    let name: &str = rest.parse_next(input)?;
    Ok(name.trim().to_string())
}

fn class_def(input: &mut &str) -> winnow::Result<StyleClass> {
    ("classDef", space1).parse_next(input)?;
    let name = ident.parse_next(input)?;
    space1.parse_next(input)?;
    let styles: &str = rest.parse_next(input)?;
    Ok(parse_style_class(name, styles))
}

fn parse_style_class(name: &str, styles: &str) -> StyleClass {
    let mut map = HashMap::new();
    for item in styles.split(',') {
        let mut parts = item.splitn(2, ':');
        let key = parts.next().unwrap_or("").trim();
        let value = parts.next().unwrap_or("").trim();
        if !key.is_empty() {
            map.insert(key.to_string(), value.to_string());
        }
    }
    StyleClass {
        name: name.to_string(),
        styles: map,
    }
}

/// First-definition-wins; a later mention may still attach a style class
/// if the first one had none. Returns true when the node is new.
fn add_node(nodes: &mut Vec<TextNode>, node: TextNode) -> bool {
    if let Some(existing) = nodes.iter_mut().find(|n| n.name == node.name) {
        if existing.style_class.is_none() && node.style_class.is_some() {
            existing.style_class = node.style_class;
        }
        false
    } else {
        nodes.push(node);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(input: &str) -> Result<GraphProperties, RenderError> {
        parse_graph(input, &RenderConfig::default())
    }

    #[test]
    fn parse_simple_lr_graph() {
        let props = parse("graph LR\nA --> B\n").unwrap();
        assert_eq!(props.direction, Direction::LeftRight);
        assert_eq!(props.nodes.len(), 2);
        assert_eq!(props.nodes[0].name, "A");
        assert_eq!(props.nodes[1].name, "B");
        assert_eq!(props.edges.len(), 1);
        assert_eq!(props.edges[0].from, "A");
        assert_eq!(props.edges[0].to, "B");
        assert_eq!(props.edges[0].label, None);
    }

    #[test]
    fn parse_flowchart_tb_alias() {
        let td = parse("graph TD\nA --> B\n").unwrap();
        let tb = parse("flowchart TB\nA --> B\n").unwrap();
        assert_eq!(td.direction, Direction::TopDown);
        assert_eq!(tb.direction, Direction::TopDown);
    }

    #[test]
    fn unsupported_direction_is_parse_error() {
        let err = parse("graph XY\nA --> B\n").unwrap_err();
        assert!(matches!(err, RenderError::Parse(_)));
        assert!(err.to_string().contains("unsupported graph type"));
    }

    #[test]
    fn missing_header_is_parse_error() {
        let err = parse("").unwrap_err();
        assert!(err.to_string().contains("missing graph definition"));
    }

    #[test]
    fn parse_labeled_edge() {
        let props = parse("graph LR\nA -->|yes| B\n").unwrap();
        assert_eq!(props.edges[0].label.as_deref(), Some("yes"));
    }

    #[test]
    fn parse_edge_chain() {
        let props = parse("graph LR\nA --> B --> C\n").unwrap();
        assert_eq!(props.nodes.len(), 3);
        assert_eq!(props.edges.len(), 2);
        assert_eq!(props.edges[0].from, "A");
        assert_eq!(props.edges[0].to, "B");
        assert_eq!(props.edges[1].from, "B");
        assert_eq!(props.edges[1].to, "C");
    }

    #[test]
    fn fan_out_distributes_right_side() {
        let props = parse("graph LR\nA --> B & C\n").unwrap();
        assert_eq!(props.edges.len(), 2);
        assert_eq!(props.edges[0].to, "B");
        assert_eq!(props.edges[1].to, "C");
    }

    #[test]
    fn fan_out_conjoins_left_side() {
        let props = parse("graph LR\nA & B --> C\n").unwrap();
        assert_eq!(props.edges.len(), 2);
        assert_eq!(props.edges[0].from, "A");
        assert_eq!(props.edges[1].from, "B");
        assert!(props.edges.iter().all(|e| e.to == "C"));
    }

    #[test]
    fn fan_out_both_sides_is_cross_product() {
        let props = parse("graph LR\nA & B --> C & D\n").unwrap();
        assert_eq!(props.edges.len(), 4);
    }

    #[test]
    fn comments_are_stripped() {
        let props = parse("graph LR\n%% a comment\nA --> B %% trailing\n").unwrap();
        assert_eq!(props.nodes.len(), 2);
        assert_eq!(props.edges.len(), 1);
    }

    #[test]
    fn frontmatter_fence_terminates_input() {
        let props = parse("graph LR\nA --> B\n---\nnot parsed\n").unwrap();
        assert_eq!(props.nodes.len(), 2);
    }

    #[test]
    fn escaped_newlines_split_lines() {
        let props = parse("graph LR\\nA --> B\\nB --> C\n").unwrap();
        assert_eq!(props.nodes.len(), 3);
        assert_eq!(props.edges.len(), 2);
    }

    #[test]
    fn padding_directives_override_defaults() {
        let props = parse("paddingX=9\npaddingY=2\ngraph LR\nA\n").unwrap();
        assert_eq!(props.padding_x, 9);
        assert_eq!(props.padding_y, 2);
    }

    #[test]
    fn non_numeric_padding_is_parse_error() {
        let err = parse("paddingX=lots\ngraph LR\nA\n").unwrap_err();
        assert!(err.to_string().contains("numeric"));
    }

    #[test]
    fn bare_node_with_style_class() {
        let props = parse("graph LR\nclassDef hot color:#f00\nA:::hot\n").unwrap();
        assert_eq!(props.nodes[0].style_class.as_deref(), Some("hot"));
        assert_eq!(props.style_classes["hot"].color(), Some("#f00"));
    }

    #[test]
    fn class_def_parses_multiple_styles() {
        let props = parse("graph LR\nclassDef big fill:#fff,color:blue\nA\n").unwrap();
        let class = &props.style_classes["big"];
        assert_eq!(class.styles["fill"], "#fff");
        assert_eq!(class.color(), Some("blue"));
    }

    #[test]
    fn first_definition_wins_for_nodes() {
        let props = parse("graph LR\nA:::x --> B\nA:::y --> C\n").unwrap();
        let a = props.nodes.iter().find(|n| n.name == "A").unwrap();
        assert_eq!(a.style_class.as_deref(), Some("x"));
        assert_eq!(props.nodes.len(), 4);
    }

    #[test]
    fn unparseable_line_is_parse_error() {
        let err = parse("graph LR\nA ==> B\n").unwrap_err();
        assert!(err.to_string().contains("could not parse line"));
    }

    #[test]
    fn subgraph_collects_first_seen_nodes() {
        let props = parse("graph LR\nsubgraph one\nA --> B\nend\nB --> C\n").unwrap();
        assert_eq!(props.subgraphs.len(), 1);
        assert_eq!(props.subgraphs[0].name, "one");
        assert_eq!(props.subgraphs[0].nodes, vec!["A", "B"]);
        assert_eq!(props.nodes.len(), 3);
    }

    #[test]
    fn nested_subgraphs_share_new_nodes() {
        let props =
            parse("graph LR\nsubgraph outer\nA\nsubgraph inner\nB\nend\nend\n").unwrap();
        assert_eq!(props.subgraphs.len(), 2);
        let outer = &props.subgraphs[0];
        let inner = &props.subgraphs[1];
        assert_eq!(outer.nodes, vec!["A", "B"]);
        assert_eq!(inner.nodes, vec!["B"]);
        assert_eq!(inner.parent, Some(0));
        assert_eq!(outer.children, vec![1]);
    }

    #[test]
    fn subgraph_name_may_contain_spaces() {
        let props = parse("graph LR\nsubgraph data plane\nA\nend\n").unwrap();
        assert_eq!(props.subgraphs[0].name, "data plane");
    }

    #[test]
    fn node_mentioned_outside_subgraph_first_stays_outside() {
        let props = parse("graph LR\nA\nsubgraph one\nA --> B\nend\n").unwrap();
        assert_eq!(props.subgraphs[0].nodes, vec!["B"]);
    }
}
