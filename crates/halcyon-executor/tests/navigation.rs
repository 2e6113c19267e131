use halcyon_core::{
    ExecutorSettings, FieldBounds, PlannerSettings, PlayerData, PlayerId, Segment, TeamData,
    Vector2,
};
use halcyon_executor::{Obstacle, PlayerControlInput, PlayerInputs, RrtPlanner, TeamController};

fn settings_with_budget(max_iterations: usize) -> PlannerSettings {
    let mut settings = PlannerSettings::default();
    settings.max_iterations = max_iterations;
    settings
}

/// The canonical scenario: a robot at the origin, its target 2m ahead, and a
/// single opponent parked halfway on the straight line.
#[test]
fn test_global_plan_detours_around_blocking_robot() {
    let settings = settings_with_budget(10_000);
    let safe = settings.safe_obstacle_radius;
    let collinear = settings.collinear_tolerance;
    let planner = RrtPlanner::new(settings);

    let start = Vector2::new(0.0, 0.0);
    let target = Vector2::new(2.0, 0.0);
    let blocker = Vector2::new(1.0, 0.0);
    let obstacles = [Obstacle {
        position: blocker,
        velocity: Vector2::zeros(),
        radius: 0.09,
    }];

    let path = planner
        .path_to(start, target, &obstacles, &FieldBounds::default())
        .expect("one blocker on an open field is always routable");

    assert!((path.last().unwrap() - target).norm() < 1e-6);
    for pair in path.windows(2) {
        let seg = Segment::new(pair[0], pair[1]);
        assert!(seg.distance_to_point(blocker) > safe - collinear - 1e-6);
    }
}

#[test]
fn test_team_controller_drives_around_blocker() {
    let mut exec_settings = ExecutorSettings::default();
    exec_settings.planner = settings_with_budget(10_000);
    let mut tc = TeamController::new(exec_settings);

    let world = TeamData {
        own_players: vec![PlayerData::new(PlayerId::new(0), Vector2::zeros())],
        opp_players: vec![PlayerData::new(PlayerId::new(7), Vector2::new(1.0, 0.0))],
        ..Default::default()
    };

    let mut inputs = PlayerInputs::new();
    inputs.insert(
        PlayerId::new(0),
        PlayerControlInput::new().with_position(Vector2::new(2.0, 0.0)),
    );

    let t0 = std::time::Instant::now();
    let mut last_speed = 0.0;
    for i in 0..60u64 {
        let cmds = tc.update_at(
            &world,
            &inputs,
            t0 + std::time::Duration::from_millis(17 * i),
        );
        assert_eq!(cmds.len(), 1);
        let cmd = cmds[0];
        assert!(cmd.forward_vel.is_finite() && cmd.left_vel.is_finite());
        last_speed = (cmd.forward_vel.powi(2) + cmd.left_vel.powi(2)).sqrt();
        assert!(last_speed <= 2.0 + 1e-9);
    }
    // After the ramp-up the robot is actually moving
    assert!(last_speed > 0.05);
}

/// The navigator never leaves a robot without a next point, even when the
/// target is unreachable.
#[test]
fn test_unreachable_target_still_yields_a_point() {
    let mut exec_settings = ExecutorSettings::default();
    exec_settings.planner = settings_with_budget(2_000);
    let mut tc = TeamController::new(exec_settings);

    let world = TeamData {
        own_players: vec![PlayerData::new(PlayerId::new(0), Vector2::zeros())],
        // Opponent sitting exactly on the target
        opp_players: vec![PlayerData::new(PlayerId::new(1), Vector2::new(2.0, 0.0))],
        ..Default::default()
    };

    let point = tc.preview_path(&world, PlayerId::new(0), Vector2::new(2.0, 0.0));
    assert!(point.x.is_finite() && point.y.is_finite());
}
