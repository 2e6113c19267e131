use std::time::Instant;

use halcyon_core::{Angle, ExecutorSettings, PlayerCmd, PlayerData, PlayerId, Vector2};

use super::{
    pid::{team_pids, AccelLimiter, Pid, PidController, TwoDPid},
    player_input::{KickerControlInput, PlayerControlInput},
};

/// How far a position setpoint may move between ticks before it counts as a
/// new target and the translation PID is reset.
const TARGET_JUMP_DISTANCE: f64 = 0.5;

/// The low-level controller for a single robot: turns a control input and the
/// robot's observed state into one local-frame velocity command per tick.
pub struct PlayerController {
    id: PlayerId,
    orientation: AccelLimiter<Pid>,
    translation: AccelLimiter<TwoDPid>,
    last_position_target: Option<Vector2>,
    last_yaw_target: Option<Angle>,
    max_velocity: f64,
    max_angular_velocity: f64,
    /// Consecutive ticks the robot was missing from the world snapshot
    frame_misses: usize,
    missing_frames_threshold: usize,
}

impl PlayerController {
    pub fn new(id: PlayerId, settings: &ExecutorSettings) -> Self {
        let (orientation, translation) = team_pids(&settings.pid, settings.controller.tick_period());
        Self {
            id,
            orientation,
            translation,
            last_position_target: None,
            last_yaw_target: None,
            max_velocity: settings.pid.max_velocity,
            max_angular_velocity: settings.pid.max_angular_velocity,
            frame_misses: 0,
            missing_frames_threshold: settings.controller.missing_frames_threshold,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    /// Record a tick in which the robot was not seen by vision. After enough
    /// consecutive misses the controller stops emitting motion.
    pub fn increment_frames_misses(&mut self) {
        self.frame_misses += 1;
        if self.frame_misses == self.missing_frames_threshold {
            log::warn!("Player {} missing from vision, stopping", self.id);
        }
    }

    /// Compute the command for one tick.
    ///
    /// `track_point` is the point the navigator wants the robot to drive
    /// toward right now; it may differ from the input's position setpoint
    /// while the robot detours around obstacles.
    pub fn update_at(
        &mut self,
        state: &PlayerData,
        track_point: Option<Vector2>,
        input: &PlayerControlInput,
        now: Instant,
    ) -> PlayerCmd {
        self.frame_misses = 0;

        // A setpoint jump means strategy picked a genuinely new target;
        // stale derivative and integral history would spike the output
        if let (Some(last), Some(current)) = (self.last_position_target, input.position) {
            if (last - current).norm() > TARGET_JUMP_DISTANCE {
                self.translation.reset(self.id);
            }
        }
        self.last_position_target = input.position;
        if let (Some(last), Some(current)) = (self.last_yaw_target, input.yaw) {
            if last != current {
                self.orientation.reset(self.id);
            }
        }
        self.last_yaw_target = input.yaw;

        let mut global_velocity = input.velocity;
        if let Some(point) = track_point {
            global_velocity += self
                .translation
                .calculate_at(point, state.position, self.id, now);
        }
        let global_velocity = global_velocity.cap_magnitude(self.max_velocity);

        let mut angular_velocity = input.angular_velocity;
        if let Some(yaw) = input.yaw {
            angular_velocity += self.orientation.calculate_at(
                yaw.radians(),
                state.yaw.radians(),
                self.id,
                now,
            );
        }
        let angular_velocity = angular_velocity.clamp(-self.max_angular_velocity, self.max_angular_velocity);

        // Commands are sent in the robot's local frame
        let local_velocity = state.yaw.inv().rotate_vector(&global_velocity);

        PlayerCmd {
            id: self.id,
            forward_vel: local_velocity.x,
            left_vel: local_velocity.y,
            angular_vel: angular_velocity,
            kick: input.kicker == KickerControlInput::Kick,
            chip: input.kicker == KickerControlInput::Chip,
            dribble: input.dribble,
        }
    }

    pub fn update(
        &mut self,
        state: &PlayerData,
        track_point: Option<Vector2>,
        input: &PlayerControlInput,
    ) -> PlayerCmd {
        self.update_at(state, track_point, input, Instant::now())
    }

    /// Whether the robot has been missing long enough that it must be told to
    /// stop rather than keep executing a stale command.
    pub fn is_lost(&self) -> bool {
        self.frame_misses >= self.missing_frames_threshold
    }
}
