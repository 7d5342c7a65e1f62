use crate::canvas::Canvas;
use crate::config::RenderConfig;
use crate::display_width::display_width;
use crate::graph_layout::{CharCoord, Compass, LayoutGraph};

/// Compose the final character grid. Pass order keeps later layers
/// visually on top: frames, node boxes, edge lines, corners, source
/// tees, arrowheads, edge labels, subgraph names.
pub fn render(graph: &LayoutGraph, config: &RenderConfig) -> String {
    let mut canvas = Canvas::new(!config.use_ascii);
    let (width, height) = graph.char_extent();
    if width > 0 && height > 0 {
        canvas.ensure((width - 1) as usize, (height - 1) as usize);
    }

    draw_subgraph_frames(&mut canvas, graph, config);
    for node in &graph.nodes {
        draw_node_box(&mut canvas, node, config);
    }

    let traced: Vec<TracedEdge> = graph
        .edges
        .iter()
        .map(|edge| trace_edge(graph, edge))
        .collect();
    for edge in &traced {
        draw_edge_lines(&mut canvas, edge, config);
    }
    for edge in &graph.edges {
        draw_corners(&mut canvas, graph, edge, config);
    }
    for edge in &traced {
        draw_source_tee(&mut canvas, edge, config);
    }
    for edge in &traced {
        draw_arrow_head(&mut canvas, edge, config);
    }
    for edge in &graph.edges {
        draw_edge_label(&mut canvas, graph, edge);
    }
    draw_subgraph_labels(&mut canvas, graph);

    let text = canvas.to_text(config.style_type);
    if config.show_coords {
        with_coords(&text)
    } else {
        text
    }
}

/// Character cells of an edge, one list per simplified path segment, in
/// travel order from source toward destination.
struct TracedEdge {
    lines: Vec<Vec<CharCoord>>,
    dirs: Vec<Compass>,
}

fn trace_edge(graph: &LayoutGraph, edge: &crate::graph_layout::Edge) -> TracedEdge {
    let mut lines = Vec::new();
    let mut dirs = Vec::new();
    if edge.path.len() >= 2 {
        let mut previous = edge.path[0];
        for &next in &edge.path[1..] {
            let from = graph.grid_to_char(previous);
            let to = graph.grid_to_char(next);
            if from == to {
                // zero-width track, nothing to draw for this hop
                previous = next;
                continue;
            }
            let dir = Compass::between((previous.x, previous.y), (next.x, next.y));
            let mut cells = line_cells(from, to);
            if cells.is_empty() {
                cells.push(from);
            }
            lines.push(cells);
            dirs.push(dir);
            previous = next;
        }
    }
    TracedEdge { lines, dirs }
}

/// Cells covered by one segment, excluding both anchor cells.
fn line_cells(from: CharCoord, to: CharCoord) -> Vec<CharCoord> {
    let mut cells = Vec::new();
    match Compass::between((from.x, from.y), (to.x, to.y)) {
        Compass::Down => {
            for y in (from.y + 1)..=(to.y - 1) {
                cells.push(CharCoord { x: from.x, y });
            }
        }
        Compass::Up => {
            for y in ((to.y + 1)..=(from.y - 1)).rev() {
                cells.push(CharCoord { x: from.x, y });
            }
        }
        Compass::Right => {
            for x in (from.x + 1)..=(to.x - 1) {
                cells.push(CharCoord { x, y: from.y });
            }
        }
        Compass::Left => {
            for x in ((to.x + 1)..=(from.x - 1)).rev() {
                cells.push(CharCoord { x, y: from.y });
            }
        }
        Compass::LowerRight => {
            let (mut x, mut y) = (from.x, from.y + 1);
            while x <= to.x - 1 && y <= to.y - 1 {
                cells.push(CharCoord { x, y });
                x += 1;
                y += 1;
            }
        }
        Compass::UpperRight => {
            let (mut x, mut y) = (from.x, from.y - 1);
            while x <= to.x - 1 && y >= to.y + 1 {
                cells.push(CharCoord { x, y });
                x += 1;
                y -= 1;
            }
        }
        Compass::LowerLeft => {
            let (mut x, mut y) = (from.x, from.y + 1);
            while x >= to.x + 1 && y <= to.y - 1 {
                cells.push(CharCoord { x, y });
                x -= 1;
                y += 1;
            }
        }
        Compass::UpperLeft => {
            let (mut x, mut y) = (from.x, from.y - 1);
            while x >= to.x + 1 && y >= to.y + 1 {
                cells.push(CharCoord { x, y });
                x -= 1;
                y -= 1;
            }
        }
        Compass::Middle => {}
    }
    cells
}

fn draw_edge_lines(canvas: &mut Canvas, traced: &TracedEdge, config: &RenderConfig) {
    for (cells, dir) in traced.lines.iter().zip(&traced.dirs) {
        let glyph = match dir {
            Compass::Up | Compass::Down => {
                if config.use_ascii {
                    '|'
                } else {
                    '│'
                }
            }
            Compass::Left | Compass::Right => {
                if config.use_ascii {
                    '-'
                } else {
                    '─'
                }
            }
            Compass::LowerRight | Compass::UpperLeft => {
                if config.use_ascii {
                    continue; // no diagonals in ASCII mode
                }
                '╲'
            }
            Compass::UpperRight | Compass::LowerLeft => {
                if config.use_ascii {
                    continue;
                }
                '╱'
            }
            Compass::Middle => continue,
        };
        for cell in cells {
            canvas.put(cell.x, cell.y, glyph);
        }
    }
}

fn draw_corners(
    canvas: &mut Canvas,
    graph: &LayoutGraph,
    edge: &crate::graph_layout::Edge,
    config: &RenderConfig,
) {
    use Compass::*;
    let path = &edge.path;
    for idx in 1..path.len().saturating_sub(1) {
        let pos = graph.grid_to_char(path[idx]);
        let prev_dir = Compass::between(
            (path[idx - 1].x, path[idx - 1].y),
            (path[idx].x, path[idx].y),
        );
        let next_dir = Compass::between(
            (path[idx].x, path[idx].y),
            (path[idx + 1].x, path[idx + 1].y),
        );
        let glyph = if config.use_ascii {
            '+'
        } else {
            match (prev_dir, next_dir) {
                (Right, Down) | (Up, Left) => '┐',
                (Right, Up) | (Down, Left) => '┘',
                (Left, Down) | (Up, Right) => '┌',
                (Left, Up) | (Down, Right) => '└',
                _ => '+',
            }
        };
        canvas.put(pos.x, pos.y, glyph);
    }
}

/// T-junction where the first segment leaves the source box.
fn draw_source_tee(canvas: &mut Canvas, traced: &TracedEdge, config: &RenderConfig) {
    if config.use_ascii {
        return;
    }
    let (Some(first_line), Some(first_dir)) = (traced.lines.first(), traced.dirs.first()) else {
        return;
    };
    let Some(first) = first_line.first() else {
        return;
    };
    match first_dir {
        Compass::Up => canvas.put(first.x, first.y + 1, '┴'),
        Compass::Down => canvas.put(first.x, first.y - 1, '┬'),
        Compass::Left => canvas.put(first.x + 1, first.y, '┤'),
        Compass::Right => canvas.put(first.x - 1, first.y, '├'),
        _ => {}
    }
}

fn draw_arrow_head(canvas: &mut Canvas, traced: &TracedEdge, config: &RenderConfig) {
    let (Some(last_line), Some(&fallback)) = (traced.lines.last(), traced.dirs.last()) else {
        return;
    };
    let (Some(first), Some(last)) = (last_line.first(), last_line.last()) else {
        return;
    };
    let mut dir = Compass::between((first.x, first.y), (last.x, last.y));
    if last_line.len() == 1 || dir == Compass::Middle {
        dir = fallback;
    }
    let glyph = if config.use_ascii {
        match dir {
            Compass::Up => '^',
            Compass::Down => 'v',
            Compass::Left => '<',
            Compass::Right => '>',
            _ => '*',
        }
    } else {
        match dir {
            Compass::Up => '▲',
            Compass::Down => '▼',
            Compass::Left => '◄',
            Compass::Right => '►',
            Compass::UpperRight => '◥',
            Compass::UpperLeft => '◤',
            Compass::LowerRight => '◢',
            Compass::LowerLeft => '◣',
            Compass::Middle => '●',
        }
    };
    canvas.set(last.x, last.y, glyph);
}

fn draw_edge_label(canvas: &mut Canvas, graph: &LayoutGraph, edge: &crate::graph_layout::Edge) {
    let (Some(label), Some((a, b))) = (&edge.label, edge.label_line) else {
        return;
    };
    let ca = graph.grid_to_char(a);
    let cb = graph.grid_to_char(b);
    let mid_x = ca.x.min(cb.x) + (ca.x - cb.x).abs() / 2;
    let mid_y = ca.y.min(cb.y) + (ca.y - cb.y).abs() / 2;
    let start_x = mid_x - display_width(label) as i32 / 2;
    canvas.write_str(start_x, mid_y, label);
}

fn draw_node_box(canvas: &mut Canvas, node: &crate::graph_layout::Node, config: &RenderConfig) {
    let Some(pos) = node.pos else {
        return;
    };
    let (w, h) = (node.width, node.height);
    let (tl, tr, bl, br, horiz, vert) = if config.use_ascii {
        ('+', '+', '+', '+', '-', '|')
    } else {
        ('┌', '┐', '└', '┘', '─', '│')
    };

    for x in 1..w {
        canvas.put(pos.x + x, pos.y, horiz);
        canvas.put(pos.x + x, pos.y + h, horiz);
    }
    for y in 1..h {
        canvas.put(pos.x, pos.y + y, vert);
        canvas.put(pos.x + w, pos.y + y, vert);
    }
    canvas.put(pos.x, pos.y, tl);
    canvas.put(pos.x + w, pos.y, tr);
    canvas.put(pos.x, pos.y + h, bl);
    canvas.put(pos.x + w, pos.y + h, br);

    let label_len = display_width(&node.name) as i32;
    let text_x = pos.x + w / 2 - ceil_div(label_len, 2) + 1;
    let text_y = pos.y + h / 2;
    canvas.write_str_styled(text_x, text_y, &node.name, node.color.as_deref());
}

fn draw_subgraph_frames(canvas: &mut Canvas, graph: &LayoutGraph, config: &RenderConfig) {
    let (tl, tr, bl, br, horiz, vert) = if config.use_ascii {
        ('+', '+', '+', '+', '-', '|')
    } else {
        ('┌', '┐', '└', '┘', '─', '│')
    };
    for idx in graph.sort_subgraphs_by_depth() {
        let sg = &graph.subgraphs[idx];
        if sg.nodes.is_empty() {
            continue;
        }
        for x in (sg.min_x + 1)..sg.max_x {
            canvas.put(x, sg.min_y, horiz);
            canvas.put(x, sg.max_y, horiz);
        }
        for y in (sg.min_y + 1)..sg.max_y {
            canvas.put(sg.min_x, y, vert);
            canvas.put(sg.max_x, y, vert);
        }
        canvas.put(sg.min_x, sg.min_y, tl);
        canvas.put(sg.max_x, sg.min_y, tr);
        canvas.put(sg.min_x, sg.max_y, bl);
        canvas.put(sg.max_x, sg.max_y, br);
    }
}

fn draw_subgraph_labels(canvas: &mut Canvas, graph: &LayoutGraph) {
    for sg in &graph.subgraphs {
        if sg.nodes.is_empty() {
            continue;
        }
        let width = sg.max_x - sg.min_x;
        let label_len = display_width(&sg.name) as i32;
        let label_x = (width / 2 - label_len / 2).max(1);
        for (i, ch) in sg.name.chars().enumerate() {
            let x = label_x + i as i32;
            if x < width {
                canvas.set(sg.min_x + x, sg.min_y + 1, ch);
            }
        }
    }
}

/// Debug overlay: column indices across the top, row indices down the
/// left.
fn with_coords(text: &str) -> String {
    let width = text.lines().map(display_width).max().unwrap_or(0);
    let mut out = String::from("   ");
    for x in 0..width {
        out.push_str(&(x % 10).to_string());
    }
    for (y, line) in text.lines().enumerate() {
        out.push('\n');
        out.push_str(&format!("{:>2} {line}", y % 100));
    }
    out
}

fn ceil_div(a: i32, b: i32) -> i32 {
    if a % b == 0 { a / b } else { a / b + 1 }
}
