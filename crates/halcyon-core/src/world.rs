use serde::{Deserialize, Serialize};

use crate::{Angle, PlayerId, TeamColor, Vector2};

/// The playable area, centered on the field origin. Distances in meters.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FieldBounds {
    /// Half the distance between the goal lines
    pub half_length: f64,
    /// Half the distance between the touch lines
    pub half_width: f64,
}

impl Default for FieldBounds {
    fn default() -> Self {
        // SSL division B field (9m x 6m)
        Self {
            half_length: 4.5,
            half_width: 3.0,
        }
    }
}

impl FieldBounds {
    pub fn contains(&self, p: Vector2) -> bool {
        p.x.abs() <= self.half_length && p.y.abs() <= self.half_width
    }
}

/// The state of one robot in a single frame.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerData {
    /// The robot's unique id
    pub id: PlayerId,
    /// Position in field coordinates \[m]
    pub position: Vector2,
    /// Velocity estimate \[m/s]. `None` means unknown; consumers treat the
    /// robot as stationary.
    pub velocity: Option<Vector2>,
    /// Heading in (-pi, pi], 0 is the positive x direction
    pub yaw: Angle,
    /// Angular speed \[rad/s]
    pub angular_speed: f64,
}

impl PlayerData {
    pub fn new(id: PlayerId, position: Vector2) -> Self {
        Self {
            id,
            position,
            velocity: None,
            yaw: Angle::default(),
            angular_speed: 0.0,
        }
    }

    /// Velocity estimate, falling back to stationary when unknown.
    pub fn velocity_or_zero(&self) -> Vector2 {
        self.velocity.unwrap_or_else(Vector2::zeros)
    }
}

/// The ball's state in a single frame.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BallData {
    /// Position in field coordinates \[m]
    pub position: Vector2,
    /// Velocity \[m/s]
    pub velocity: Vector2,
}

/// A read-only snapshot of the world for one tick.
///
/// Built by the vision ingestion layer before the tick starts; the planning
/// and control code only ever reads it. All per-robot planning within a tick
/// must observe the same snapshot.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TeamData {
    /// Which side `own_players` refers to
    pub color: TeamColor,
    pub own_players: Vec<PlayerData>,
    pub opp_players: Vec<PlayerData>,
    pub ball: Option<BallData>,
    pub field: FieldBounds,
}

impl TeamData {
    /// Look up one of our players by id.
    pub fn own_player(&self, id: PlayerId) -> Option<&PlayerData> {
        self.own_players.iter().find(|p| p.id == id)
    }
}
