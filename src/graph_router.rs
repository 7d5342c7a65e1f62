use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use log::trace;

use crate::graph_ast::Direction;
use crate::graph_layout::{Compass, GridCoord, LayoutGraph};

/// Route every edge over the free lattice, then reserve track space for
/// the chosen paths and pick label segments.
pub fn route_edges(graph: &mut LayoutGraph) {
    for idx in 0..graph.edges.len() {
        determine_path(graph, idx);
        let path = graph.edges[idx].path.clone();
        graph.widen_for_path(&path);
        graph.choose_label_line(idx);
    }
}

/// Try the preferred and the alternative (start, end) direction pair and
/// keep the shorter simplified path; ties favor the preferred pair. When
/// neither routes, the edge degrades to the direct anchor-to-anchor
/// segment.
fn determine_path(graph: &mut LayoutGraph, edge_idx: usize) {
    let edge = &graph.edges[edge_idx];
    let (Some(from_coord), Some(to_coord)) =
        (graph.nodes[edge.from].grid, graph.nodes[edge.to].grid)
    else {
        return;
    };
    let (preferred, alternative) =
        direction_pairs(graph.direction, from_coord, to_coord, edge.from == edge.to);

    let preferred_ends = (from_coord.anchor(preferred.0), to_coord.anchor(preferred.1));
    let alternative_ends = (
        from_coord.anchor(alternative.0),
        to_coord.anchor(alternative.1),
    );

    let preferred_path =
        shortest_path(graph, preferred_ends.0, preferred_ends.1).map(simplify_path);
    let alternative_path =
        shortest_path(graph, alternative_ends.0, alternative_ends.1).map(simplify_path);

    let (dirs, path) = match (preferred_path, alternative_path) {
        (Some(p), Some(a)) if p.len() <= a.len() => (preferred, p),
        (_, Some(a)) => (alternative, a),
        (Some(p), None) => (preferred, p),
        (None, None) => {
            trace!("edge {edge_idx}: no route, drawing anchor to anchor");
            (preferred, vec![preferred_ends.0, preferred_ends.1])
        }
    };

    let edge = &mut graph.edges[edge_idx];
    edge.start_dir = dirs.0;
    edge.end_dir = dirs.1;
    edge.path = path;
}

type DirPair = (Compass, Compass);

/// Preferred and alternative (start, end) direction pairs for an edge,
/// chosen from the endpoints' relative grid position and the diagram
/// direction. Self-loops always use the fixed pair for the direction.
fn direction_pairs(
    direction: Direction,
    from: GridCoord,
    to: GridCoord,
    self_loop: bool,
) -> (DirPair, DirPair) {
    use Compass::*;
    let lr = direction == Direction::LeftRight;

    if self_loop {
        return if lr {
            ((Right, Down), (Down, Right))
        } else {
            ((Down, Right), (Right, Down))
        };
    }

    let d = Compass::between((from.x, from.y), (to.x, to.y));
    match d {
        LowerRight if lr => ((Down, Left), (Right, Up)),
        LowerRight => ((Right, Up), (Down, Left)),
        UpperRight if lr => ((Up, Left), (Right, Down)),
        UpperRight => ((Right, Down), (Up, Left)),
        LowerLeft if lr => ((Down, Down), (Left, Up)),
        LowerLeft => ((Left, Up), (Down, Right)),
        UpperLeft if lr => ((Down, Down), (Left, Down)),
        UpperLeft => ((Right, Right), (Up, Right)),
        Left if lr => ((Down, Down), (Left, Right)),
        Up if !lr => ((Right, Right), (Up, Down)),
        _ => ((d, d.opposite()), (d, d.opposite())),
    }
}

/// Manhattan distance, plus one when the displacement is not
/// axis-aligned (every such route needs at least one bend).
fn heuristic(a: GridCoord, b: GridCoord) -> i32 {
    let dx = (a.x - b.x).abs();
    let dy = (a.y - b.y).abs();
    if dx == 0 || dy == 0 { dx + dy } else { dx + dy + 1 }
}

/// Uniform-cost A* over the four-connected free lattice. The goal cell is
/// always enterable even though it lies on a node border.
fn shortest_path(graph: &LayoutGraph, from: GridCoord, to: GridCoord) -> Option<Vec<GridCoord>> {
    let mut counter: u64 = 0;
    let mut open: BinaryHeap<(Reverse<i32>, Reverse<u64>, i32, i32)> = BinaryHeap::new();
    open.push((Reverse(heuristic(from, to)), Reverse(counter), from.x, from.y));

    let mut cost_so_far: HashMap<GridCoord, i32> = HashMap::new();
    cost_so_far.insert(from, 0);
    let mut came_from: HashMap<GridCoord, GridCoord> = HashMap::new();

    while let Some((_, _, cx, cy)) = open.pop() {
        let current = GridCoord::new(cx, cy);
        if current == to {
            let mut path = vec![current];
            let mut cursor = current;
            while let Some(&prev) = came_from.get(&cursor) {
                path.push(prev);
                cursor = prev;
            }
            path.reverse();
            return Some(path);
        }

        let current_cost = *cost_so_far.get(&current).unwrap_or(&0);
        for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            let next = GridCoord::new(cx + dx, cy + dy);
            if next != to && !graph.is_free(next) {
                continue;
            }
            let new_cost = current_cost + 1;
            if !cost_so_far.contains_key(&next) || new_cost < cost_so_far[&next] {
                cost_so_far.insert(next, new_cost);
                counter += 1;
                open.push((
                    Reverse(new_cost + heuristic(next, to)),
                    Reverse(counter),
                    next.x,
                    next.y,
                ));
                came_from.insert(next, current);
            }
        }
    }
    None
}

/// Collapse consecutive lattice steps that continue in the same
/// direction, keeping only bends and endpoints.
fn simplify_path(path: Vec<GridCoord>) -> Vec<GridCoord> {
    if path.len() <= 2 {
        return path;
    }
    let mut result = vec![path[0]];
    for i in 1..path.len() - 1 {
        let prev_dir = Compass::between((path[i - 1].x, path[i - 1].y), (path[i].x, path[i].y));
        let next_dir = Compass::between((path[i].x, path[i].y), (path[i + 1].x, path[i + 1].y));
        if prev_dir != next_dir {
            result.push(path[i]);
        }
    }
    result.push(path[path.len() - 1]);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use crate::graph_layout::compute;
    use crate::graph_parser::parse_graph;
    use pretty_assertions::assert_eq;

    fn layout(input: &str) -> LayoutGraph {
        let config = RenderConfig::default();
        let props = parse_graph(input, &config).unwrap();
        compute(&props, &config)
    }

    #[test]
    fn heuristic_prefers_axis_aligned() {
        let a = GridCoord::new(0, 0);
        assert_eq!(heuristic(a, GridCoord::new(4, 0)), 4);
        assert_eq!(heuristic(a, GridCoord::new(0, 3)), 3);
        assert_eq!(heuristic(a, GridCoord::new(2, 2)), 5);
    }

    #[test]
    fn simplify_drops_collinear_points() {
        let path = vec![
            GridCoord::new(0, 0),
            GridCoord::new(1, 0),
            GridCoord::new(2, 0),
            GridCoord::new(2, 1),
            GridCoord::new(2, 2),
        ];
        let simplified = simplify_path(path);
        assert_eq!(
            simplified,
            vec![GridCoord::new(0, 0), GridCoord::new(2, 0), GridCoord::new(2, 2)]
        );
    }

    #[test]
    fn forward_edge_uses_relative_direction() {
        let (preferred, alternative) = direction_pairs(
            Direction::LeftRight,
            GridCoord::new(0, 0),
            GridCoord::new(4, 0),
            false,
        );
        assert_eq!(preferred, (Compass::Right, Compass::Left));
        assert_eq!(alternative, (Compass::Right, Compass::Left));
    }

    #[test]
    fn backward_lr_edge_prefers_going_under() {
        let (preferred, alternative) = direction_pairs(
            Direction::LeftRight,
            GridCoord::new(4, 0),
            GridCoord::new(0, 0),
            false,
        );
        assert_eq!(preferred, (Compass::Down, Compass::Down));
        assert_eq!(alternative, (Compass::Left, Compass::Right));
    }

    #[test]
    fn self_loop_pairs_are_fixed() {
        let lr = direction_pairs(
            Direction::LeftRight,
            GridCoord::new(0, 0),
            GridCoord::new(0, 0),
            true,
        );
        assert_eq!(lr.0, (Compass::Right, Compass::Down));
        let td = direction_pairs(
            Direction::TopDown,
            GridCoord::new(0, 0),
            GridCoord::new(0, 0),
            true,
        );
        assert_eq!(td.0, (Compass::Down, Compass::Right));
    }

    #[test]
    fn straight_lr_edge_routes_to_two_points() {
        let graph = layout("graph LR\nA --> B\n");
        let edge = &graph.edges[0];
        assert_eq!(edge.start_dir, Compass::Right);
        assert_eq!(edge.end_dir, Compass::Left);
        assert_eq!(
            edge.path,
            vec![GridCoord::new(2, 1), GridCoord::new(4, 1)]
        );
    }

    #[test]
    fn straight_td_edge_routes_to_two_points() {
        let graph = layout("graph TD\nA --> B\n");
        let edge = &graph.edges[0];
        assert_eq!(edge.start_dir, Compass::Down);
        assert_eq!(edge.end_dir, Compass::Up);
        assert_eq!(
            edge.path,
            vec![GridCoord::new(1, 2), GridCoord::new(1, 4)]
        );
    }

    #[test]
    fn paths_avoid_reserved_blocks() {
        let graph = layout("graph LR\nA --> B\nA --> C\nA --> D\n");
        for edge in &graph.edges {
            for window in edge.path.windows(2) {
                // every simplified hop is axis-aligned
                let dir = Compass::between(
                    (window[0].x, window[0].y),
                    (window[1].x, window[1].y),
                );
                assert!(matches!(
                    dir,
                    Compass::Up | Compass::Down | Compass::Left | Compass::Right
                ));
            }
            // interior waypoints never sit inside a reserved block
            for coord in &edge.path[1..edge.path.len() - 1] {
                assert!(graph.is_free(*coord), "waypoint {coord:?} is blocked");
            }
        }
    }

    #[test]
    fn self_loop_routes_from_right_into_bottom() {
        let graph = layout("graph LR\nA --> A\n");
        let edge = &graph.edges[0];
        assert_eq!(edge.path[0], GridCoord::new(2, 1));
        assert_eq!(*edge.path.last().unwrap(), GridCoord::new(1, 2));
        assert!(edge.path.len() > 2, "self loop must route around the node");
    }

    #[test]
    fn every_edge_gets_a_path() {
        let graph = layout("graph TD\nA --> B\nB --> C\nA --> C\nC --> A\n");
        for edge in &graph.edges {
            assert!(edge.path.len() >= 2);
        }
    }
}
