use std::collections::HashMap;
use std::time::Instant;

use halcyon_core::{ExecutorSettings, PlayerCmd, PlayerId, Polygon, TeamData, Vector2};

use super::{
    hybrid::HybridNavigator,
    player_controller::PlayerController,
    player_input::PlayerInputs,
};

/// The per-tick controller for the whole team. Owns one navigator and one
/// low-level controller per robot, creating them lazily as robots first
/// appear in the world snapshot.
pub struct TeamController {
    settings: ExecutorSettings,
    navigator: HybridNavigator,
    players: HashMap<PlayerId, PlayerController>,
    /// Keep-out zones applied to every robot's navigation (defense areas,
    /// stop-distance circles around the ball rendered as polygons)
    keep_out: Vec<Polygon>,
}

impl TeamController {
    pub fn new(settings: ExecutorSettings) -> Self {
        Self {
            navigator: HybridNavigator::new(settings.planner.clone()),
            settings,
            players: HashMap::new(),
            keep_out: Vec::new(),
        }
    }

    pub fn set_keep_out(&mut self, zones: Vec<Polygon>) {
        self.keep_out = zones;
    }

    /// Run one control tick: navigate and control every robot we have input
    /// or state for, producing at most one command per robot.
    pub fn update(&mut self, world: &TeamData, inputs: &PlayerInputs) -> Vec<PlayerCmd> {
        self.update_at(world, inputs, Instant::now())
    }

    pub fn update_at(&mut self, world: &TeamData, inputs: &PlayerInputs, now: Instant) -> Vec<PlayerCmd> {
        let mut cmds = Vec::with_capacity(world.own_players.len());

        for state in &world.own_players {
            let id = state.id;
            let controller = self
                .players
                .entry(id)
                .or_insert_with(|| PlayerController::new(id, &self.settings));

            let input = inputs.player(id);
            let track_point = input
                .position
                .map(|target| self.navigator.path_to(world, id, target, &self.keep_out));

            cmds.push(controller.update_at(state, track_point, &input, now));
        }

        // Robots we control but vision lost this tick
        let seen: Vec<PlayerId> = world.own_players.iter().map(|p| p.id).collect();
        for (id, controller) in self.players.iter_mut() {
            if !seen.contains(id) {
                controller.increment_frames_misses();
                if controller.is_lost() {
                    cmds.push(PlayerCmd::zero(*id));
                }
            }
        }

        cmds
    }

    /// The point the navigator would steer the given robot toward for the
    /// given target, without producing a command. Exposed for debug overlays.
    pub fn preview_path(&mut self, world: &TeamData, id: PlayerId, target: Vector2) -> Vector2 {
        self.navigator.path_to(world, id, target, &self.keep_out)
    }
}

#[cfg(test)]
mod tests {
    use halcyon_core::PlayerData;

    use super::super::player_input::PlayerControlInput;
    use super::*;

    fn world_with(own: Vec<Vector2>) -> TeamData {
        TeamData {
            own_players: own
                .into_iter()
                .enumerate()
                .map(|(i, p)| PlayerData::new(PlayerId::new(i as u32), p))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_one_command_per_visible_robot() {
        let mut tc = TeamController::new(ExecutorSettings::default());
        let world = world_with(vec![Vector2::zeros(), Vector2::new(1.0, 1.0)]);
        let cmds = tc.update(&world, &PlayerInputs::new());
        assert_eq!(cmds.len(), 2);
        let mut ids: Vec<u32> = cmds.iter().map(|c| c.id.as_u32()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn test_no_input_means_no_motion() {
        let mut tc = TeamController::new(ExecutorSettings::default());
        let world = world_with(vec![Vector2::zeros()]);
        let cmds = tc.update(&world, &PlayerInputs::new());
        assert_eq!(cmds[0].forward_vel, 0.0);
        assert_eq!(cmds[0].left_vel, 0.0);
        assert_eq!(cmds[0].angular_vel, 0.0);
    }

    #[test]
    fn test_lost_robot_gets_stop_command() {
        let settings = ExecutorSettings::default();
        let threshold = settings.controller.missing_frames_threshold;
        let mut tc = TeamController::new(settings);

        // Robot 0 appears once, then vanishes
        let full = world_with(vec![Vector2::zeros()]);
        tc.update(&full, &PlayerInputs::new());

        let empty = world_with(vec![]);
        let mut stop_seen = false;
        for _ in 0..threshold + 1 {
            let cmds = tc.update(&empty, &PlayerInputs::new());
            if cmds.iter().any(|c| c.id == PlayerId::new(0)) {
                stop_seen = true;
                let cmd = cmds.iter().find(|c| c.id == PlayerId::new(0)).unwrap();
                assert_eq!(cmd.forward_vel, 0.0);
                assert_eq!(cmd.angular_vel, 0.0);
            }
        }
        assert!(stop_seen);
    }

    #[test]
    fn test_position_input_produces_motion_toward_target() {
        let mut tc = TeamController::new(ExecutorSettings::default());
        let world = world_with(vec![Vector2::zeros()]);
        let mut inputs = PlayerInputs::new();
        inputs.insert(
            PlayerId::new(0),
            PlayerControlInput::new().with_position(Vector2::new(2.0, 0.0)),
        );

        // Tick a few times so the acceleration limiter ramps up
        let t0 = std::time::Instant::now();
        let mut cmd = PlayerCmd::zero(PlayerId::new(0));
        for i in 0..30u64 {
            let cmds = tc.update_at(&world, &inputs, t0 + std::time::Duration::from_millis(17 * i));
            cmd = cmds[0];
        }
        assert!(cmd.forward_vel > 0.0);
    }
}
