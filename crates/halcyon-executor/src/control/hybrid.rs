use std::collections::{HashMap, VecDeque};

use halcyon_core::{PlannerSettings, PlayerId, Polygon, TeamData, Vector2};

use super::{
    dwa::DynamicWindowPlanner,
    obstacles::obstacles_for,
    rrt::RrtPlanner,
};

/// Per-robot navigation state. Reset whenever the caller supplies a new
/// target or the robot reaches the current one.
#[derive(Clone, Debug)]
struct NavState {
    target: Vector2,
    waypoints: VecDeque<Vector2>,
    /// Waypoints to consume before re-trying local planning; doubles on
    /// every fresh stuck detection (adaptive backoff)
    waypoint_budget: usize,
    waypoints_taken: usize,
}

impl NavState {
    fn new(target: Vector2, budget: usize) -> Self {
        Self {
            target,
            waypoints: VecDeque::new(),
            waypoint_budget: budget,
            waypoints_taken: 0,
        }
    }
}

/// Hybrid navigator: trusts the reactive local planner while it makes
/// progress, and falls back to consuming waypoints from the global planner
/// when it reports being stuck.
///
/// The global planner only supplies waypoints; the local planner still
/// drives the moment-to-moment motion toward each one, so obstacle motion is
/// reacted to even in fallback.
pub struct HybridNavigator {
    settings: PlannerSettings,
    global: RrtPlanner,
    local: DynamicWindowPlanner,
    states: HashMap<PlayerId, NavState>,
}

impl HybridNavigator {
    pub fn new(settings: PlannerSettings) -> Self {
        Self {
            global: RrtPlanner::new(settings.clone()),
            local: DynamicWindowPlanner::new(settings.clone()),
            settings,
            states: HashMap::new(),
        }
    }

    /// The per-tick entry point: always returns a concrete next point to
    /// drive toward, never fails.
    pub fn path_to(
        &mut self,
        world: &TeamData,
        id: PlayerId,
        target: Vector2,
        keep_out: &[Polygon],
    ) -> Vector2 {
        let robot = match world.own_player(id) {
            Some(robot) => robot.clone(),
            None => {
                // Robot not in the snapshot; nothing sensible to plan
                log::warn!("navigator: no data for robot {}, holding target", id);
                return target;
            }
        };
        let obstacles = obstacles_for(world, id, self.settings.robot_radius);
        if !world.field.contains(target) {
            log::debug!("navigator: target for robot {} is outside the field", id);
        }

        if (robot.position - target).norm() < self.settings.robot_radius {
            self.states.remove(&id);
            return target;
        }

        let default_budget = self.settings.default_waypoint_budget;
        let state = self
            .states
            .entry(id)
            .or_insert_with(|| NavState::new(target, default_budget));
        if state.target != target {
            // A new target restarts the state machine
            *state = NavState::new(target, default_budget);
        }

        if state.waypoints.is_empty() || state.waypoints_taken >= state.waypoint_budget {
            let best = self.local.path_to(&robot, target, &obstacles, keep_out);
            if best.score >= self.settings.stuck_score_threshold {
                return best.point;
            }

            // Stuck: bring in global guidance and back off from local
            // re-checks for twice as long as last time
            if state.waypoints.is_empty() {
                match self
                    .global
                    .path_to(robot.position, target, &obstacles, &world.field)
                {
                    Some(waypoints) => state.waypoints = waypoints.into(),
                    None => log::debug!(
                        "navigator: global planner found no path for robot {}, retrying next tick",
                        id
                    ),
                }
            }
            // A robot can stay boxed in for minutes; the backoff must
            // saturate, not overflow
            state.waypoint_budget = state.waypoint_budget.saturating_mul(2);
            state.waypoints_taken = 0;

            if state.waypoints.is_empty() {
                // No global path either; the local best is still the safest
                // move we know
                return best.point;
            }
        }

        if let Some(&head) = state.waypoints.front() {
            let mut next = head;
            if (robot.position - head).norm() < self.settings.waypoint_tolerance {
                state.waypoints.pop_front();
                state.waypoints_taken += 1;
                next = state.waypoints.front().copied().unwrap_or(target);
            }
            self.local.path_to(&robot, next, &obstacles, keep_out).point
        } else {
            // Waypoints drained without reaching the target; clear so the
            // next tick replans globally instead of standing still
            log::warn!("navigator: waypoints exhausted for robot {} before target", id);
            self.states.remove(&id);
            target
        }
    }

    #[cfg(test)]
    fn budget_of(&self, id: PlayerId) -> Option<usize> {
        self.states.get(&id).map(|s| s.waypoint_budget)
    }
}

#[cfg(test)]
mod tests {
    use halcyon_core::PlayerData;

    use super::*;

    fn world(own: Vec<Vector2>, opp: Vec<Vector2>) -> TeamData {
        TeamData {
            own_players: own
                .into_iter()
                .enumerate()
                .map(|(i, p)| PlayerData::new(PlayerId::new(i as u32), p))
                .collect(),
            opp_players: opp
                .into_iter()
                .enumerate()
                .map(|(i, p)| PlayerData::new(PlayerId::new(i as u32), p))
                .collect(),
            ..Default::default()
        }
    }

    fn navigator(settings: PlannerSettings) -> HybridNavigator {
        HybridNavigator::new(settings)
    }

    #[test]
    fn test_reached_target_is_terminal() {
        let mut nav = navigator(PlannerSettings::default());
        let world = world(vec![Vector2::new(1.0, 1.0)], vec![]);
        let target = Vector2::new(1.05, 1.0);
        let id = PlayerId::new(0);
        assert_eq!(nav.path_to(&world, id, target, &[]), target);
        assert!(nav.budget_of(id).is_none());
    }

    #[test]
    fn test_clear_field_stays_local() {
        let mut nav = navigator(PlannerSettings::default());
        let world = world(vec![Vector2::new(0.0, 0.0)], vec![]);
        let id = PlayerId::new(0);
        let next = nav.path_to(&world, id, Vector2::new(2.0, 0.0), &[]);
        // Local planner makes progress; the returned point steps toward the
        // target, no waypoints involved
        assert!(next.x > 0.0);
        let state = nav.states.get(&id).unwrap();
        assert!(state.waypoints.is_empty());
        assert_eq!(state.waypoint_budget, nav.settings.default_waypoint_budget);
    }

    /// Boxed in by an obstacle dead ahead, the local score drops below the
    /// stuck threshold and every fresh stuck detection doubles the budget.
    #[test]
    fn test_stuck_doubles_budget_and_new_target_resets() {
        let mut settings = PlannerSettings::default();
        settings.default_waypoint_budget = 1;
        settings.max_iterations = 10_000;
        let mut nav = navigator(settings);
        let id = PlayerId::new(0);
        let target = Vector2::new(2.0, 0.0);
        // Obstacle close ahead keeps even the scaled-down local moves below
        // the stuck threshold
        let world = world(vec![Vector2::new(0.0, 0.0)], vec![Vector2::new(0.15, 0.0)]);

        nav.path_to(&world, id, target, &[]);
        assert_eq!(nav.budget_of(id), Some(2));

        // Burn through the tiny budget by ticking until the taken counter
        // triggers a re-check, which is still stuck
        let mut budgets = vec![2];
        for _ in 0..20 {
            nav.path_to(&world, id, target, &[]);
            let b = nav.budget_of(id).unwrap();
            if *budgets.last().unwrap() != b {
                budgets.push(b);
            }
            if budgets.len() >= 3 {
                break;
            }
        }
        assert!(budgets.windows(2).all(|w| w[1] == w[0] * 2));
        assert!(budgets.len() >= 2);

        // A new target restarts the state machine with the default budget
        nav.path_to(&world, id, Vector2::new(-2.0, 0.0), &[]);
        let state = nav.states.get(&id).unwrap();
        assert_eq!(state.target, Vector2::new(-2.0, 0.0));
    }

    /// A robot ringed in on all sides stays stuck indefinitely; the backoff
    /// must keep producing a move every tick instead of overflowing.
    #[test]
    fn test_boxed_in_robot_survives_prolonged_stuck_backoff() {
        let mut settings = PlannerSettings::default();
        settings.max_iterations = 300;
        let mut nav = navigator(settings);
        let id = PlayerId::new(0);
        let target = Vector2::new(2.0, 0.0);

        let ring: Vec<Vector2> = (0..8)
            .map(|i| {
                let ang = i as f64 * std::f64::consts::PI / 4.0;
                Vector2::new(0.15 * ang.cos(), 0.15 * ang.sin())
            })
            .collect();
        let world = world(vec![Vector2::new(0.0, 0.0)], ring);

        // Far more ticks than it takes a doubling budget to exhaust usize
        for _ in 0..70 {
            let next = nav.path_to(&world, id, target, &[]);
            assert!(next.x.is_finite() && next.y.is_finite());
        }
        assert!(nav.budget_of(id).unwrap() >= nav.settings.default_waypoint_budget);
    }
}
