use std::f64::consts::PI;

use halcyon_core::{PlannerSettings, PlayerData, Polygon, Segment, Vector2};

use super::obstacles::Obstacle;

/// Reactive local planner: every tick, fan out candidate motion segments
/// reachable within one simulated step given the acceleration limit, score
/// them, and take the best one.
///
/// Deliberately myopic -- it never looks more than one step ahead. The
/// hybrid controller uses the returned score to decide when this planner is
/// stuck and a global replan is needed.
pub struct DynamicWindowPlanner {
    settings: PlannerSettings,
}

/// The best short-horizon move and its score.
#[derive(Clone, Copy, Debug)]
pub struct LocalMove {
    pub point: Vector2,
    pub score: f64,
}

impl DynamicWindowPlanner {
    /// Scale factors below this stop the search; the robot is boxed in.
    const MIN_SCALE: f64 = 0.05;

    pub fn new(settings: PlannerSettings) -> Self {
        Self { settings }
    }

    /// Pick the next point to drive toward. Obstacle list excludes the
    /// acting robot; `keep_out` polygons are rejected outright within a
    /// robot radius (defense areas and the like).
    pub fn path_to(
        &self,
        robot: &PlayerData,
        target: Vector2,
        obstacles: &[Obstacle],
        keep_out: &[Polygon],
    ) -> LocalMove {
        let s = &self.settings;
        let start = robot.position;

        if (target - start).norm() < 1.5 * s.robot_radius {
            return LocalMove {
                point: target,
                score: f64::INFINITY,
            };
        }

        let velocity = robot.velocity_or_zero();
        let delta_vel = s.simulated_timestep * s.max_acceleration;

        let mut best = LocalMove {
            point: start,
            score: f64::NEG_INFINITY,
        };

        // Start at full speed and shrink the window while nothing scores
        // positive; a slower, shorter move often clears where a fast one
        // cannot.
        let mut sf = 1.0;
        while best.score < 0.0 && sf > Self::MIN_SCALE {
            for i in 0..s.num_directions {
                let ang = i as f64 * 2.0 * PI / s.num_directions as f64;
                let segment = self.motion_segment(start, velocity, delta_vel * sf, ang);
                if keep_out
                    .iter()
                    .any(|p| p.boundary_distance(&segment) < s.robot_radius)
                {
                    continue;
                }
                let score = self.evaluate_segment(&segment, target, obstacles);
                if score > best.score {
                    best = LocalMove {
                        point: segment.end,
                        score,
                    };
                }
            }
            sf /= 4.0;
        }

        best
    }

    /// The segment travelled in one simulated step when accelerating by
    /// `delta_vel` in direction `ang` on top of the current velocity.
    fn motion_segment(
        &self,
        start: Vector2,
        velocity: Vector2,
        delta_vel: f64,
        ang: f64,
    ) -> Segment {
        let step = velocity * self.settings.simulated_timestep
            + Vector2::new(delta_vel * ang.cos(), delta_vel * ang.sin());
        Segment::new(start, start + step)
    }

    /// Score a candidate segment; bigger is better.
    ///
    /// Progress toward the target is rewarded, passing close to the target
    /// is rewarded, and the single worst predicted encounter with another
    /// robot is penalized -- risks are not summed, the most dangerous
    /// obstacle dominates.
    fn evaluate_segment(&self, segment: &Segment, target: Vector2, obstacles: &[Obstacle]) -> f64 {
        let progress = (target - segment.start).norm() - (target - segment.end).norm();
        let our_velocity = (segment.end - segment.start) / self.settings.simulated_timestep;

        let mut obstacle_factor: f64 = 0.0;
        for obstacle in obstacles {
            let rel_vel = our_velocity - obstacle.velocity;
            let rel_pos = segment.start - obstacle.position;

            // Minimize |rel_pos + t * rel_vel|^2 over t to find the closest
            // approach; only future approaches matter. Tangential motion
            // yields a t of rounding-error size (cos(pi/2) is not exactly
            // zero), which must not count as an imminent encounter.
            let denom = rel_vel.norm_squared();
            if denom == 0.0 {
                continue;
            }
            let t = -rel_vel.dot(&rel_pos) / denom;
            if t > 1e-6 {
                let closest_sq = (rel_pos + rel_vel * t).norm_squared();
                let penalty = obstacle_penalty(closest_sq) * obstacle_penalty(t);
                obstacle_factor = obstacle_factor.max(penalty);
            }
        }

        let closeness = 4.0 * (-8.0 * segment.distance_to_point(target)).exp();

        5.0 * progress - obstacle_factor + closeness
    }
}

/// Exponential risk falloff, tuned so the penalty is ~1 at 0.22 (squared
/// meters of closest approach, or seconds to it).
fn obstacle_penalty(x: f64) -> f64 {
    (-8.0 * (x - 0.22)).exp()
}
