use std::collections::{HashMap, HashSet};

use log::debug;

use crate::config::RenderConfig;
use crate::display_width::display_width;
use crate::graph_ast::{Direction, GraphProperties};

/// Lattice distance between sibling levels. The three cells past a node's
/// anchor belong to its reserved block, the fourth is free for routing.
pub const LEVEL_STRIDE: i32 = 4;

/// Position on the coarse placement lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
}

impl GridCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The lattice cell on this node's boundary where an edge pointing
    /// `dir` attaches.
    pub fn anchor(self, dir: Compass) -> GridCoord {
        let (dx, dy) = dir.block_offset();
        GridCoord {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Final character-level coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharCoord {
    pub x: i32,
    pub y: i32,
}

/// The eight compass directions plus `Middle` (no direction / self).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compass {
    Up,
    Down,
    Left,
    Right,
    UpperLeft,
    UpperRight,
    LowerLeft,
    LowerRight,
    Middle,
}

impl Compass {
    /// Offset of this direction's cell within a node's reserved 3×3
    /// block; the block's top-left corner is the node anchor.
    pub fn block_offset(self) -> (i32, i32) {
        match self {
            Compass::Up => (1, 0),
            Compass::Down => (1, 2),
            Compass::Left => (0, 1),
            Compass::Right => (2, 1),
            Compass::UpperLeft => (0, 0),
            Compass::UpperRight => (2, 0),
            Compass::LowerLeft => (0, 2),
            Compass::LowerRight => (2, 2),
            Compass::Middle => (1, 1),
        }
    }

    pub fn opposite(self) -> Compass {
        match self {
            Compass::Up => Compass::Down,
            Compass::Down => Compass::Up,
            Compass::Left => Compass::Right,
            Compass::Right => Compass::Left,
            Compass::UpperLeft => Compass::LowerRight,
            Compass::UpperRight => Compass::LowerLeft,
            Compass::LowerLeft => Compass::UpperRight,
            Compass::LowerRight => Compass::UpperLeft,
            Compass::Middle => Compass::Middle,
        }
    }

    /// Direction from one point toward another, `Middle` when equal.
    pub fn between(from: (i32, i32), to: (i32, i32)) -> Compass {
        use std::cmp::Ordering::*;
        match (to.0.cmp(&from.0), to.1.cmp(&from.1)) {
            (Equal, Equal) => Compass::Middle,
            (Equal, Greater) => Compass::Down,
            (Equal, Less) => Compass::Up,
            (Greater, Equal) => Compass::Right,
            (Less, Equal) => Compass::Left,
            (Greater, Greater) => Compass::LowerRight,
            (Greater, Less) => Compass::UpperRight,
            (Less, Greater) => Compass::LowerLeft,
            (Less, Less) => Compass::UpperLeft,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub grid: Option<GridCoord>,
    /// Top-left character coordinate of the box, once assigned.
    pub pos: Option<CharCoord>,
    /// Index extents of the box: cells `pos.x ..= pos.x + width`.
    pub width: i32,
    pub height: i32,
    pub color: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub label: Option<String>,
    pub path: Vec<GridCoord>,
    /// The path segment chosen to carry the label.
    pub label_line: Option<(GridCoord, GridCoord)>,
    pub start_dir: Compass,
    pub end_dir: Compass,
}

#[derive(Debug, Clone)]
pub struct Subgraph {
    pub name: String,
    pub nodes: Vec<usize>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

/// Per-render layout state: node/edge/subgraph arenas, the occupancy
/// grid, and the lattice-to-character size maps.
pub struct LayoutGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub subgraphs: Vec<Subgraph>,
    pub direction: Direction,
    pub padding_x: i32,
    pub padding_y: i32,
    border_padding: i32,
    grid: HashMap<GridCoord, usize>,
    column_widths: HashMap<i32, i32>,
    row_heights: HashMap<i32, i32>,
    offset_x: i32,
    offset_y: i32,
}

pub fn compute(props: &GraphProperties, config: &RenderConfig) -> LayoutGraph {
    let mut graph = LayoutGraph::build(props, config);
    graph.place_nodes();
    for idx in 0..graph.nodes.len() {
        graph.size_tracks(idx);
    }
    crate::graph_router::route_edges(&mut graph);
    graph.assign_positions();
    graph.compute_subgraph_boxes();
    graph.apply_subgraph_offset();
    debug!(
        "layout: {} nodes placed, extent {:?}",
        graph.nodes.len(),
        graph.char_extent()
    );
    graph
}

impl LayoutGraph {
    fn build(props: &GraphProperties, config: &RenderConfig) -> Self {
        let mut index_by_name: HashMap<&str, usize> = HashMap::new();
        let mut nodes = Vec::with_capacity(props.nodes.len());
        for text_node in &props.nodes {
            index_by_name.insert(text_node.name.as_str(), nodes.len());
            let color = text_node
                .style_class
                .as_deref()
                .and_then(|class| props.style_classes.get(class))
                .and_then(|class| class.color())
                .map(str::to_string);
            nodes.push(Node {
                name: text_node.name.clone(),
                grid: None,
                pos: None,
                width: 0,
                height: 0,
                color,
            });
        }

        let edges = props
            .edges
            .iter()
            .filter_map(|edge| {
                let from = *index_by_name.get(edge.from.as_str())?;
                let to = *index_by_name.get(edge.to.as_str())?;
                Some(Edge {
                    from,
                    to,
                    label: edge.label.clone(),
                    path: Vec::new(),
                    label_line: None,
                    start_dir: Compass::Middle,
                    end_dir: Compass::Middle,
                })
            })
            .collect();

        let subgraphs = props
            .subgraphs
            .iter()
            .map(|sg| Subgraph {
                name: sg.name.clone(),
                nodes: sg
                    .nodes
                    .iter()
                    .filter_map(|name| index_by_name.get(name.as_str()).copied())
                    .collect(),
                parent: sg.parent,
                children: sg.children.clone(),
                min_x: 0,
                min_y: 0,
                max_x: 0,
                max_y: 0,
            })
            .collect();

        LayoutGraph {
            nodes,
            edges,
            subgraphs,
            direction: props.direction,
            padding_x: props.padding_x as i32,
            padding_y: props.padding_y as i32,
            border_padding: config.box_border_padding as i32,
            grid: HashMap::new(),
            column_widths: HashMap::new(),
            row_heights: HashMap::new(),
            offset_x: 0,
            offset_y: 0,
        }
    }

    pub fn children(&self, idx: usize) -> Vec<usize> {
        self.edges
            .iter()
            .filter(|e| e.from == idx)
            .map(|e| e.to)
            .collect()
    }

    pub fn is_free(&self, coord: GridCoord) -> bool {
        coord.x >= 0 && coord.y >= 0 && !self.grid.contains_key(&coord)
    }

    pub fn col_width(&self, col: i32) -> i32 {
        *self.column_widths.get(&col).unwrap_or(&0)
    }

    pub fn row_height(&self, row: i32) -> i32 {
        *self.row_heights.get(&row).unwrap_or(&0)
    }

    /// Roots sit at level 0, every child one stride past its parent, in
    /// discovery order; first placement wins.
    fn place_nodes(&mut self) {
        let mut seen: HashSet<usize> = HashSet::new();
        let mut roots: Vec<usize> = Vec::new();
        for idx in 0..self.nodes.len() {
            if !seen.contains(&idx) {
                roots.push(idx);
            }
            for child in self.children(idx) {
                seen.insert(child);
            }
        }

        // Plain roots and subgraph-confined roots interleave badly in LR
        // layouts; give the subgraph group its own starting level.
        let separate = self.direction == Direction::LeftRight
            && roots.iter().any(|&r| !self.in_any_subgraph(r))
            && roots
                .iter()
                .any(|&r| self.in_any_subgraph(r) && !self.children(r).is_empty());

        let mut next_slot: HashMap<i32, i32> = HashMap::new();
        if separate {
            let (subgraph_roots, external_roots): (Vec<usize>, Vec<usize>) =
                roots.iter().partition(|&&r| self.in_any_subgraph(r));
            for idx in external_roots {
                self.place_at_level(idx, 0, &mut next_slot);
            }
            for idx in subgraph_roots {
                self.place_at_level(idx, LEVEL_STRIDE, &mut next_slot);
            }
        } else {
            for idx in roots {
                self.place_at_level(idx, 0, &mut next_slot);
            }
        }

        for idx in 0..self.nodes.len() {
            let Some(coord) = self.nodes[idx].grid else {
                continue;
            };
            let level = match self.direction {
                Direction::LeftRight => coord.x,
                Direction::TopDown => coord.y,
            } + LEVEL_STRIDE;
            for child in self.children(idx) {
                if self.nodes[child].grid.is_none() {
                    self.place_at_level(child, level, &mut next_slot);
                }
            }
        }
    }

    fn place_at_level(&mut self, idx: usize, level: i32, next_slot: &mut HashMap<i32, i32>) {
        let slot = *next_slot.get(&level).unwrap_or(&0);
        let requested = match self.direction {
            Direction::LeftRight => GridCoord::new(level, slot),
            Direction::TopDown => GridCoord::new(slot, level),
        };
        let assigned = self.reserve(idx, requested);
        let cross = match self.direction {
            Direction::LeftRight => assigned.y,
            Direction::TopDown => assigned.x,
        };
        next_slot.insert(level, cross + LEVEL_STRIDE);
        self.nodes[idx].grid = Some(assigned);
    }

    /// Claim the requested anchor, advancing along the cross axis while
    /// occupied, then mark the 3×3 block.
    fn reserve(&mut self, idx: usize, requested: GridCoord) -> GridCoord {
        let mut coord = requested;
        while self.grid.contains_key(&coord) {
            coord = match self.direction {
                Direction::LeftRight => GridCoord::new(coord.x, coord.y + LEVEL_STRIDE),
                Direction::TopDown => GridCoord::new(coord.x + LEVEL_STRIDE, coord.y),
            };
        }
        for dx in 0..3 {
            for dy in 0..3 {
                self.grid.insert(GridCoord::new(coord.x + dx, coord.y + dy), idx);
            }
        }
        coord
    }

    fn size_tracks(&mut self, idx: usize) {
        let Some(coord) = self.nodes[idx].grid else {
            return;
        };
        let label = display_width(&self.nodes[idx].name) as i32;
        let bp = self.border_padding;
        let cols = [1, label + 2 + 2 * bp, 1];
        let rows = [1, 1 + 2 * bp, 1];
        for (i, width) in cols.iter().enumerate() {
            let entry = self.column_widths.entry(coord.x + i as i32).or_insert(0);
            *entry = (*entry).max(*width);
        }
        for (i, height) in rows.iter().enumerate() {
            let entry = self.row_heights.entry(coord.y + i as i32).or_insert(0);
            *entry = (*entry).max(*height);
        }
        if coord.x > 0 {
            self.column_widths.insert(coord.x - 1, self.padding_x);
        }
        if coord.y > 0 {
            let mut padding = self.padding_y;
            if self.cross_subgraph_target(idx) {
                padding += 4;
            }
            let entry = self.row_heights.entry(coord.y - 1).or_insert(0);
            *entry = (*entry).max(padding);
        }
    }

    /// True when this node takes an edge from outside its subgraph and no
    /// higher-placed sibling does; such nodes get extra room above so the
    /// incoming edge does not merge with sibling edges.
    fn cross_subgraph_target(&self, idx: usize) -> bool {
        let Some(own_sg) = self.node_subgraph(idx) else {
            return false;
        };
        if !self.has_external_incoming(idx, own_sg) {
            return false;
        }
        let Some(own_coord) = self.nodes[idx].grid else {
            return false;
        };
        for &other in &self.subgraphs[own_sg].nodes {
            if other == idx {
                continue;
            }
            let Some(other_coord) = self.nodes[other].grid else {
                continue;
            };
            if self.has_external_incoming(other, own_sg) && other_coord.y < own_coord.y {
                return false;
            }
        }
        true
    }

    fn has_external_incoming(&self, idx: usize, own_sg: usize) -> bool {
        self.edges
            .iter()
            .any(|e| e.to == idx && self.node_subgraph(e.from) != Some(own_sg))
    }

    pub fn in_any_subgraph(&self, idx: usize) -> bool {
        self.subgraphs.iter().any(|sg| sg.nodes.contains(&idx))
    }

    pub fn node_subgraph(&self, idx: usize) -> Option<usize> {
        self.subgraphs.iter().position(|sg| sg.nodes.contains(&idx))
    }

    /// Give every lattice cell an edge routes through a minimal size so
    /// the drawn line has somewhere to exist.
    pub fn widen_for_path(&mut self, path: &[GridCoord]) {
        for coord in path {
            self.column_widths.entry(coord.x).or_insert(self.padding_x / 2);
            self.row_heights.entry(coord.y).or_insert(self.padding_y / 2);
        }
    }

    /// Pick the path segment that carries the label: the first one at
    /// least as wide as the text, else the widest seen. The segment's
    /// middle column is widened to fit the text plus clearance.
    pub fn choose_label_line(&mut self, edge_idx: usize) {
        let label_len = match &self.edges[edge_idx].label {
            Some(label) => display_width(label) as i32,
            None => return,
        };
        let path = &self.edges[edge_idx].path;
        if path.len() < 2 {
            return;
        }
        let mut best = (path[0], path[1]);
        let mut best_width = 0;
        let mut prev = path[0];
        for &step in path.iter().skip(1) {
            let width = self.col_width(prev.x) + self.col_width(step.x);
            if width >= label_len {
                best = (prev, step);
                break;
            }
            if width > best_width {
                best_width = width;
                best = (prev, step);
            }
            prev = step;
        }

        let middle_x = best.0.x.min(best.1.x) + (best.0.x - best.1.x).abs() / 2;
        let entry = self.column_widths.entry(middle_x).or_insert(0);
        *entry = (*entry).max(label_len + 2);
        self.edges[edge_idx].label_line = Some(best);
    }

    /// Character coordinate of a lattice cell: prefix sums of track sizes
    /// plus half the cell's own track, shifted by the drawing offset.
    pub fn grid_to_char(&self, coord: GridCoord) -> CharCoord {
        let x: i32 = (0..coord.x).map(|c| self.col_width(c)).sum();
        let y: i32 = (0..coord.y).map(|r| self.row_height(r)).sum();
        CharCoord {
            x: x + self.col_width(coord.x) / 2 + self.offset_x,
            y: y + self.row_height(coord.y) / 2 + self.offset_y,
        }
    }

    fn assign_positions(&mut self) {
        for idx in 0..self.nodes.len() {
            let Some(grid) = self.nodes[idx].grid else {
                continue;
            };
            let pos = self.grid_to_char(grid);
            let width = self.col_width(grid.x) + self.col_width(grid.x + 1);
            let height = self.row_height(grid.y) + self.row_height(grid.y + 1);
            let node = &mut self.nodes[idx];
            node.pos = Some(pos);
            node.width = width;
            node.height = height;
        }
    }

    fn compute_subgraph_boxes(&mut self) {
        for idx in 0..self.subgraphs.len() {
            self.compute_subgraph_box(idx);
        }
        self.space_sibling_subgraphs();
    }

    fn compute_subgraph_box(&mut self, idx: usize) {
        if self.subgraphs[idx].nodes.is_empty() {
            return;
        }
        let mut min_x = i32::MAX;
        let mut min_y = i32::MAX;
        let mut max_x = i32::MIN;
        let mut max_y = i32::MIN;

        for child in self.subgraphs[idx].children.clone() {
            self.compute_subgraph_box(child);
            let child_sg = &self.subgraphs[child];
            if !child_sg.nodes.is_empty() {
                min_x = min_x.min(child_sg.min_x);
                min_y = min_y.min(child_sg.min_y);
                max_x = max_x.max(child_sg.max_x);
                max_y = max_y.max(child_sg.max_y);
            }
        }

        for node_idx in self.subgraphs[idx].nodes.clone() {
            let node = &self.nodes[node_idx];
            let Some(pos) = node.pos else {
                continue;
            };
            min_x = min_x.min(pos.x);
            min_y = min_y.min(pos.y);
            max_x = max_x.max(pos.x + node.width);
            max_y = max_y.max(pos.y + node.height);
        }
        if min_x == i32::MAX {
            return;
        }

        // 2 cells of padding all around, 2 extra rows above for the name.
        let sg = &mut self.subgraphs[idx];
        sg.min_x = min_x - 2;
        sg.min_y = min_y - 4;
        sg.max_x = max_x + 2;
        sg.max_y = max_y + 2;
    }

    /// Root-level sibling frames must not touch; overlapping boxes get
    /// their near boundary pulled back.
    fn space_sibling_subgraphs(&mut self) {
        let min_spacing = 1;
        let roots: Vec<usize> = (0..self.subgraphs.len())
            .filter(|&i| self.subgraphs[i].parent.is_none() && !self.subgraphs[i].nodes.is_empty())
            .collect();

        for i in 0..roots.len() {
            for j in (i + 1)..roots.len() {
                let (a, b) = (roots[i], roots[j]);

                let sg_a = &self.subgraphs[a];
                let sg_b = &self.subgraphs[b];
                if sg_a.min_x < sg_b.max_x && sg_a.max_x > sg_b.min_x {
                    if sg_a.max_y >= sg_b.min_y - min_spacing && sg_a.min_y < sg_b.min_y {
                        self.subgraphs[b].min_y = self.subgraphs[a].max_y + min_spacing + 1;
                    } else if sg_b.max_y >= sg_a.min_y - min_spacing && sg_b.min_y < sg_a.min_y {
                        self.subgraphs[a].min_y = self.subgraphs[b].max_y + min_spacing + 1;
                    }
                }

                let sg_a = &self.subgraphs[a];
                let sg_b = &self.subgraphs[b];
                if sg_a.min_y < sg_b.max_y && sg_a.max_y > sg_b.min_y {
                    if sg_a.max_x >= sg_b.min_x - min_spacing && sg_a.min_x < sg_b.min_x {
                        self.subgraphs[b].min_x = self.subgraphs[a].max_x + min_spacing + 1;
                    } else if sg_b.max_x >= sg_a.min_x - min_spacing && sg_b.min_x < sg_a.min_x {
                        self.subgraphs[a].min_x = self.subgraphs[b].max_x + min_spacing + 1;
                    }
                }
            }
        }
    }

    /// Frames extend above and left of their content; shift everything so
    /// the drawing starts at (0, 0).
    fn apply_subgraph_offset(&mut self) {
        if self.subgraphs.is_empty() {
            return;
        }
        let mut min_x = 0;
        let mut min_y = 0;
        for sg in &self.subgraphs {
            if sg.nodes.is_empty() {
                continue;
            }
            min_x = min_x.min(sg.min_x);
            min_y = min_y.min(sg.min_y);
        }
        let (offset_x, offset_y) = (-min_x, -min_y);
        if offset_x == 0 && offset_y == 0 {
            return;
        }
        self.offset_x = offset_x;
        self.offset_y = offset_y;
        for sg in &mut self.subgraphs {
            if sg.nodes.is_empty() {
                continue;
            }
            sg.min_x += offset_x;
            sg.min_y += offset_y;
            sg.max_x += offset_x;
            sg.max_y += offset_y;
        }
        for node in &mut self.nodes {
            if let Some(pos) = &mut node.pos {
                pos.x += offset_x;
                pos.y += offset_y;
            }
        }
    }

    /// Total character size implied by the track maps and offset.
    pub fn char_extent(&self) -> (i32, i32) {
        let width: i32 = self.column_widths.values().sum();
        let height: i32 = self.row_heights.values().sum();
        (width + self.offset_x, height + self.offset_y)
    }

    pub fn sort_subgraphs_by_depth(&self) -> Vec<usize> {
        let mut sorted: Vec<usize> = (0..self.subgraphs.len()).collect();
        sorted.sort_by_key(|&idx| self.subgraph_depth(idx));
        sorted
    }

    fn subgraph_depth(&self, idx: usize) -> usize {
        match self.subgraphs[idx].parent {
            Some(parent) => 1 + self.subgraph_depth(parent),
            None => 0,
        }
    }
}
