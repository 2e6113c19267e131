use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

/// Tunables for the global (RRT*) and local (dynamic window) planners.
///
/// All distances in meters, times in seconds. The defaults are the
/// empirically tuned values the stack ships with; none of them is assumed
/// optimal for a particular field or robot generation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlannerSettings {
    /// Physical robot radius
    pub robot_radius: f64,
    /// Minimum clearance a planned segment keeps from any other robot:
    /// both robots' radii plus wiggle room
    pub safe_obstacle_radius: f64,
    /// RRT* extension step
    pub step_size: f64,
    /// Probability of sampling a uniformly random point instead of the target
    pub explore_bias: f64,
    /// Distance at which a tree edge may connect to the target
    pub stopping_distance: f64,
    /// Absolute slack over the straight-line distance that counts as good enough
    pub good_enough_abs: f64,
    /// Relative factor over the straight-line distance that counts as good enough
    pub good_enough_rel: f64,
    /// Hard cap on RRT* iterations; the only latency bound when planning in-tick
    pub max_iterations: usize,
    /// Number of candidate headings the local planner evaluates
    pub num_directions: usize,
    /// Lookahead of one local-planner candidate segment
    pub simulated_timestep: f64,
    /// Acceleration limit used to size the dynamic window \[m/s^2]
    pub max_acceleration: f64,
    /// Local-planner score below which the robot counts as stuck
    pub stuck_score_threshold: f64,
    /// Waypoints consumed from a global plan before re-trying local planning
    pub default_waypoint_budget: usize,
    /// Distance at which a waypoint counts as reached
    pub waypoint_tolerance: f64,
    /// Perpendicular distance below which a waypoint is dropped as collinear
    pub collinear_tolerance: f64,
    /// Longest segment the waypoint reduction may create by skipping
    pub max_skip_segment: f64,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        let robot_radius = 0.09;
        Self {
            robot_radius,
            safe_obstacle_radius: 2.0 * robot_radius + 0.08,
            step_size: 0.15,
            explore_bias: 0.1,
            stopping_distance: 0.2,
            good_enough_abs: 1.0,
            good_enough_rel: 1.2,
            max_iterations: 3000,
            num_directions: 16,
            simulated_timestep: 0.2,
            max_acceleration: 2.0,
            stuck_score_threshold: 0.2,
            default_waypoint_budget: 30,
            waypoint_tolerance: 0.2,
            collinear_tolerance: 0.03,
            max_skip_segment: 2.0,
        }
    }
}

/// Gains and limits for one PID axis.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f64,
    pub kd: f64,
    pub ki: f64,
    /// Anti-windup clamp on the integral accumulator
    pub integral_min: Option<f64>,
    pub integral_max: Option<f64>,
    /// Output slew limit enforced by the acceleration limiter \[units/s]
    pub max_acceleration: f64,
}

/// A full gain set for one deployment target. Simulation and real hardware
/// need different gains; pick with [`PidSettings::simulation`] or
/// [`PidSettings::real`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PidSettings {
    pub orientation: PidGains,
    /// Symmetric clamp on the orientation output \[rad/s]
    pub max_angular_velocity: f64,
    pub translation: PidGains,
    /// Cap on the translation output's norm \[m/s]
    pub max_velocity: f64,
    /// Command transmission delay compensated by linear error extrapolation \[s]
    pub sending_delay: f64,
}

impl PidSettings {
    pub fn simulation() -> Self {
        Self {
            orientation: PidGains {
                kp: 3.0,
                kd: 0.015,
                ki: 0.0,
                integral_min: Some(-10.0),
                integral_max: Some(10.0),
                max_acceleration: 50.0,
            },
            max_angular_velocity: 4.0,
            translation: PidGains {
                kp: 1.8,
                kd: 0.025,
                ki: 0.0,
                integral_min: Some(-5.0),
                integral_max: Some(5.0),
                max_acceleration: 2.0,
            },
            max_velocity: 2.0,
            sending_delay: 0.0,
        }
    }

    pub fn real() -> Self {
        Self {
            orientation: PidGains {
                kp: 0.5,
                kd: 0.075,
                ki: 0.0,
                integral_min: None,
                integral_max: None,
                max_acceleration: 0.2,
            },
            // Any faster and the real robots become unstable
            max_angular_velocity: 0.5,
            translation: PidGains {
                kp: 0.0,
                kd: 0.0,
                ki: 0.0,
                integral_min: None,
                integral_max: None,
                max_acceleration: 0.05,
            },
            max_velocity: 0.2,
            sending_delay: 0.0,
        }
    }
}

impl Default for PidSettings {
    fn default() -> Self {
        Self::simulation()
    }
}

/// Settings for the control loop itself.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ControllerSettings {
    /// Target tick rate \[Hz]
    pub tick_rate: f64,
    /// Ticks without fresh vision data before a robot is stopped
    pub missing_frames_threshold: usize,
}

impl ControllerSettings {
    /// Nominal tick period, used as the dt fallback when wall-clock timing
    /// misbehaves.
    pub fn tick_period(&self) -> f64 {
        1.0 / self.tick_rate
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            missing_frames_threshold: 50,
        }
    }
}

/// All settings for the executor, persisted as a single JSON document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExecutorSettings {
    pub controller: ControllerSettings,
    pub planner: PlannerSettings,
    pub pid: PidSettings,
}

impl ExecutorSettings {
    /// Load the settings from a file, or store the defaults if the file does
    /// not exist or is invalid.
    ///
    /// # Panics
    ///
    /// Panics if the file exists but cannot be read, or if creating it fails.
    pub fn load_or_insert(path: impl AsRef<Path>) -> Self {
        match fs::read_to_string(path.as_ref()) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(settings) => settings,
                Err(err) => {
                    log::error!("Failed to parse executor settings: {}", err);
                    Self::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let settings = Self::default();
                fs::write(path, serde_json::to_string_pretty(&settings).unwrap())
                    .expect("Failed to write executor settings");
                settings
            }
            Err(err) => panic!("Failed to read executor settings: {}", err),
        }
    }

    /// Store the settings in the given file.
    pub async fn store(&self, path: impl AsRef<Path>) {
        if let Err(err) = tokio::fs::write(path, serde_json::to_string_pretty(self).unwrap()).await
        {
            log::error!("Failed to write executor settings: {}", err);
        }
    }
}
