mod angle;
mod geom;
mod player_id;
mod settings;
mod world;

pub use angle::*;
pub use geom::*;
pub use player_id::*;
pub use settings::*;
pub use world::*;

use serde::{Deserialize, Serialize};

/// A 2D vector in field coordinates, in meters.
pub type Vector2 = nalgebra::Vector2<f64>;

/// A command to one of our players as it will be sent to the robot.
///
/// All velocities are in the robot's local frame: `+forward` is towards the
/// dribbler, `+left` is 90 degrees counter-clockwise from that.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct PlayerCmd {
    /// The robot's ID
    pub id: PlayerId,
    /// Forward velocity \[m/s]
    pub forward_vel: f64,
    /// Leftward velocity \[m/s]
    pub left_vel: f64,
    /// Angular velocity, `+` counter-clockwise \[rad/s]
    pub angular_vel: f64,
    /// Engage the kicker for a flat kick
    pub kick: bool,
    /// Engage the kicker for a chip kick
    pub chip: bool,
    /// Whether the dribbler should spin
    pub dribble: bool,
}

impl PlayerCmd {
    pub fn zero(id: PlayerId) -> PlayerCmd {
        PlayerCmd {
            id,
            ..Default::default()
        }
    }
}
