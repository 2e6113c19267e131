use halcyon_core::{FieldBounds, PlannerSettings, Segment, Vector2};
use rand::distributions::{Distribution, Uniform};
use rand::Rng;

use super::obstacles::{clearance_to_point, clearance_to_segment, Obstacle};

/// A node in the search tree. Nodes are stored in an arena and linked by
/// index; `cost` is the path cost from the root, kept in sync by rewiring.
#[derive(Clone, Copy, Debug)]
struct Node {
    pos: Vector2,
    parent: Option<usize>,
    cost: f64,
}

/// Uniform 1m-cell grid over the field, bucketing tree nodes so "nearby"
/// queries only scan adjacent cells. Purely an optimization; correctness
/// does not depend on the cell size.
struct NodeGrid {
    cells: Vec<Vec<usize>>,
    nx: i64,
    ny: i64,
    half_length: f64,
    half_width: f64,
}

impl NodeGrid {
    const CELL_SIZE: f64 = 1.0;

    fn new(field: &FieldBounds) -> Self {
        let nx = (2.0 * field.half_length / Self::CELL_SIZE).ceil().max(1.0) as i64;
        let ny = (2.0 * field.half_width / Self::CELL_SIZE).ceil().max(1.0) as i64;
        Self {
            cells: vec![Vec::new(); (nx * ny) as usize],
            nx,
            ny,
            half_length: field.half_length,
            half_width: field.half_width,
        }
    }

    fn cell_of(&self, p: Vector2) -> (i64, i64) {
        let gx = ((p.x + self.half_length) / Self::CELL_SIZE).floor() as i64;
        let gy = ((p.y + self.half_width) / Self::CELL_SIZE).floor() as i64;
        (gx.clamp(0, self.nx - 1), gy.clamp(0, self.ny - 1))
    }

    fn insert(&mut self, p: Vector2, idx: usize) {
        let (gx, gy) = self.cell_of(p);
        self.cells[(gy * self.nx + gx) as usize].push(idx);
    }

    /// Node indices in the 3x3 cell neighborhood around `p`.
    fn near(&self, p: Vector2) -> impl Iterator<Item = usize> + '_ {
        let (gx, gy) = self.cell_of(p);
        (-1..=1)
            .flat_map(move |dy| (-1..=1).map(move |dx| (gx + dx, gy + dy)))
            .filter(move |&(x, y)| x >= 0 && x < self.nx && y >= 0 && y < self.ny)
            .flat_map(move |(x, y)| self.cells[(y * self.nx + x) as usize].iter().copied())
    }
}

/// Global path planner: an incremental sampling tree with cost-based
/// rewiring (RRT*), producing a waypoint polyline from start to target.
///
/// The planner is stateless across calls; the tree is rebuilt on every
/// invocation. It is best-effort, not optimal: the iteration cap is the only
/// latency bound, so `max_iterations` must be tuned to the tick budget when
/// planning runs inside the control loop.
pub struct RrtPlanner {
    settings: PlannerSettings,
}

impl RrtPlanner {
    pub fn new(settings: PlannerSettings) -> Self {
        Self { settings }
    }

    /// Plan a path from `start` to `target` around the given obstacles,
    /// sampling within the given field bounds.
    ///
    /// Degenerate cases short-circuit without building a tree:
    /// - target inside an obstacle: returns `[start]` (no path there);
    /// - start already within a robot radius of the target: `[target]`;
    /// - straight line well clear of everything: `[target]`.
    ///
    /// Returns `None` when no path was found within the iteration budget, or
    /// when a cycle is detected in the tree (a bug surfaced, not hidden).
    pub fn path_to(
        &self,
        start: Vector2,
        target: Vector2,
        obstacles: &[Obstacle],
        field: &FieldBounds,
    ) -> Option<Vec<Vector2>> {
        let s = &self.settings;

        if clearance_to_point(obstacles, target) < s.robot_radius {
            log::debug!("rrt: target is inside an obstacle, holding at start");
            return Some(vec![start]);
        }

        if (target - start).norm() < s.robot_radius {
            return Some(vec![target]);
        }

        // Trim the robot's own footprint off the start of the segment, then
        // require a generous margin: at speed the safe radius alone is not
        // enough for a straight shot.
        let direct = Segment::new(start, target);
        let adjusted = Segment::new(direct.interpolate(s.robot_radius), target);
        if clearance_to_segment(obstacles, &adjusted) > 3.0 * s.safe_obstacle_radius {
            log::debug!("rrt: direct line of sight, going straight");
            return Some(vec![target]);
        }

        let (nodes, goal_parent) = self.grow_tree(start, target, obstacles, field);
        let goal_parent = goal_parent?;
        let chain = parent_chain(&nodes, goal_parent)?;
        let mut path: Vec<Vector2> = chain.iter().rev().map(|&i| nodes[i].pos).collect();
        path.push(target);
        Some(self.reduce_waypoints(path))
    }

    /// Build the search tree rooted at `start` and return it together with
    /// the index of the node the target was connected through, if any.
    fn grow_tree(
        &self,
        start: Vector2,
        target: Vector2,
        obstacles: &[Obstacle],
        field: &FieldBounds,
    ) -> (Vec<Node>, Option<usize>) {
        let s = &self.settings;

        let mut nodes = vec![Node {
            pos: start,
            parent: None,
            cost: 0.0,
        }];
        let mut grid = NodeGrid::new(field);
        grid.insert(start, 0);

        let mut goal_parent: Option<usize> = None;
        let mut goal_cost = f64::INFINITY;
        let euclid = (target - start).norm();

        let mut rng = rand::thread_rng();
        let x_dist = Uniform::new(-field.half_length, field.half_length);
        let y_dist = Uniform::new(-field.half_width, field.half_width);

        for its in 0..s.max_iterations {
            if its % 250 == 0 {
                log::debug!(
                    "rrt: iter {} nodes {} best {:.3} euclid {:.3}",
                    its,
                    nodes.len(),
                    goal_cost,
                    euclid
                );
            }

            let sample = if rng.gen::<f64>() < s.explore_bias {
                Vector2::new(x_dist.sample(&mut rng), y_dist.sample(&mut rng))
            } else {
                target
            };

            let nearest = nearest_node(&nodes, sample);
            let towards = Segment::new(nodes[nearest].pos, sample);
            if towards.length() < f64::EPSILON {
                continue;
            }
            let candidate = towards.interpolate(s.step_size);
            let new_seg = Segment::new(nodes[nearest].pos, candidate);

            let is_duplicate = grid
                .near(candidate)
                .any(|i| (nodes[i].pos - candidate).norm() < 1e-9);

            if clearance_to_segment(obstacles, &new_seg) > s.safe_obstacle_radius
                && !is_duplicate
                && field.contains(candidate)
            {
                // Choose the best parent among nearby nodes
                let mut best_parent = nearest;
                let mut min_cost = nodes[nearest].cost + (nodes[nearest].pos - candidate).norm();
                for p in grid.near(candidate) {
                    let d = (nodes[p].pos - candidate).norm();
                    if d <= 2.0 * s.step_size
                        && nodes[p].cost + d < min_cost
                        && clearance_to_segment(
                            obstacles,
                            &Segment::new(nodes[p].pos, candidate),
                        ) > s.safe_obstacle_radius
                    {
                        best_parent = p;
                        min_cost = nodes[p].cost + d;
                    }
                }

                let new_idx = nodes.len();
                nodes.push(Node {
                    pos: candidate,
                    parent: Some(best_parent),
                    cost: min_cost,
                });

                // Rewire: nearby nodes that would be cheaper to reach through
                // the new node are re-parented, and the improvement is pushed
                // down to their descendants.
                let near: Vec<usize> = grid
                    .near(candidate)
                    .filter(|&p| (nodes[p].pos - candidate).norm() <= 2.0 * s.step_size)
                    .collect();
                for p in near {
                    let d = (nodes[p].pos - candidate).norm();
                    if min_cost + d < nodes[p].cost
                        && !is_ancestor(&nodes, p, new_idx)
                        && clearance_to_segment(
                            obstacles,
                            &Segment::new(nodes[p].pos, candidate),
                        ) > s.safe_obstacle_radius
                    {
                        nodes[p].parent = Some(new_idx);
                        nodes[p].cost = min_cost + d;
                        propagate_cost(&mut nodes, p);
                    }
                }

                // Goal connection: close enough edges may link the target in
                let edge = Segment::new(nodes[best_parent].pos, candidate);
                let to_goal = (candidate - target).norm();
                if edge.distance_to_point(target) < s.stopping_distance
                    && min_cost + to_goal < goal_cost
                {
                    goal_parent = Some(new_idx);
                    goal_cost = min_cost + to_goal;
                }

                grid.insert(candidate, new_idx);
            }

            if goal_parent.is_some() {
                let good_enough = goal_cost <= s.good_enough_rel * euclid
                    || goal_cost - euclid < s.good_enough_abs;
                if good_enough || its >= 1000 {
                    break;
                }
            }
        }

        (nodes, goal_parent)
    }

    /// Collapse near-collinear runs: drop interior waypoints that sit within
    /// `collinear_tolerance` of the segment joining their neighbors, as long
    /// as the skip segment stays short.
    fn reduce_waypoints(&self, waypoints: Vec<Vector2>) -> Vec<Vector2> {
        if waypoints.len() < 3 {
            return waypoints;
        }
        let mut reduced = vec![waypoints[0]];
        for i in 1..waypoints.len() - 1 {
            let skip = Segment::new(*reduced.last().unwrap(), waypoints[i + 1]);
            if skip.distance_to_point(waypoints[i]) > self.settings.collinear_tolerance
                || skip.length() > self.settings.max_skip_segment
            {
                reduced.push(waypoints[i]);
            }
        }
        reduced.push(*waypoints.last().unwrap());
        reduced
    }
}

fn nearest_node(nodes: &[Node], sample: Vector2) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, node) in nodes.iter().enumerate() {
        let d = (node.pos - sample).norm_squared();
        if d < best_dist {
            best = i;
            best_dist = d;
        }
    }
    best
}

/// The indices on `leaf`'s path back to the root, leaf first. `None` when
/// the parent links contain a cycle, which means the rewiring bookkeeping
/// broke an invariant; surface it rather than looping forever.
fn parent_chain(nodes: &[Node], leaf: usize) -> Option<Vec<usize>> {
    let mut chain = Vec::new();
    let mut visited = vec![false; nodes.len()];
    let mut current = Some(leaf);
    while let Some(i) = current {
        if visited[i] {
            log::warn!("rrt: cycle detected while extracting path");
            return None;
        }
        visited[i] = true;
        chain.push(i);
        current = nodes[i].parent;
    }
    Some(chain)
}

/// Whether `candidate` appears on `node`'s path back to the root.
fn is_ancestor(nodes: &[Node], candidate: usize, node: usize) -> bool {
    let mut current = Some(node);
    while let Some(i) = current {
        if i == candidate {
            return true;
        }
        current = nodes[i].parent;
    }
    false
}

/// Push a cost change at `root` down to all its descendants, iteratively.
fn propagate_cost(nodes: &mut [Node], root: usize) {
    let mut stack = vec![root];
    while let Some(i) = stack.pop() {
        for j in 0..nodes.len() {
            if nodes[j].parent == Some(i) {
                nodes[j].cost = nodes[i].cost + (nodes[j].pos - nodes[i].pos).norm();
                stack.push(j);
            }
        }
    }
}
