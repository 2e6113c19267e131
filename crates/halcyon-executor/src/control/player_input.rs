use std::collections::HashMap;

use halcyon_core::{Angle, PlayerId, Vector2};

/// What the kicker should do this tick. `Kick` and `Chip` are one-shot; the
/// caller re-arms by issuing them again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KickerControlInput {
    #[default]
    Idle,
    Kick,
    Chip,
}

/// One robot's desired state for a tick, produced by strategy code.
///
/// `position` and `yaw` are setpoints the controllers steer toward;
/// `velocity` and `angular_velocity` are feed-forward terms added on top of
/// the controller output.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlayerControlInput {
    /// Global position setpoint, `None` to leave translation uncontrolled
    pub position: Option<Vector2>,
    /// Global feed-forward velocity
    pub velocity: Vector2,
    /// Yaw setpoint, `None` to leave orientation uncontrolled
    pub yaw: Option<Angle>,
    /// Feed-forward angular velocity
    pub angular_velocity: f64,
    pub dribble: bool,
    pub kicker: KickerControlInput,
}

impl PlayerControlInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_position(mut self, position: Vector2) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_yaw(mut self, yaw: Angle) -> Self {
        self.yaw = Some(yaw);
        self
    }

    pub fn with_velocity(mut self, velocity: Vector2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_kicker(mut self, kicker: KickerControlInput) -> Self {
        self.kicker = kicker;
        self
    }
}

/// The team's control inputs for one tick. Robots without an entry fall back
/// to a default (stand still) input.
#[derive(Clone, Debug, Default)]
pub struct PlayerInputs(HashMap<PlayerId, PlayerControlInput>);

impl PlayerInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: PlayerId, input: PlayerControlInput) {
        self.0.insert(id, input);
    }

    pub fn player(&self, id: PlayerId) -> PlayerControlInput {
        self.0.get(&id).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlayerId, &PlayerControlInput)> {
        self.0.iter()
    }
}

impl FromIterator<(PlayerId, PlayerControlInput)> for PlayerInputs {
    fn from_iter<T: IntoIterator<Item = (PlayerId, PlayerControlInput)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
