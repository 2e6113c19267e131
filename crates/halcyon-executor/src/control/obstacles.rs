use halcyon_core::{PlayerId, Segment, TeamData, Vector2};

/// Another robot treated as a circular obstacle.
///
/// Unknown velocities have already been collapsed to zero, per the "assume
/// stationary" policy.
#[derive(Clone, Copy, Debug)]
pub struct Obstacle {
    pub position: Vector2,
    pub velocity: Vector2,
    pub radius: f64,
}

/// Every robot other than the acting one, friendly and enemy alike, as a
/// circular obstacle. An empty list is valid and means a free field.
pub fn obstacles_for(world: &TeamData, acting_id: PlayerId, radius: f64) -> Vec<Obstacle> {
    world
        .own_players
        .iter()
        .filter(|p| p.id != acting_id)
        .chain(world.opp_players.iter())
        .map(|p| Obstacle {
            position: p.position,
            velocity: p.velocity_or_zero(),
            radius,
        })
        .collect()
}

/// Distance from the nearest obstacle center to a point.
pub fn clearance_to_point(obstacles: &[Obstacle], p: Vector2) -> f64 {
    obstacles
        .iter()
        .map(|o| (o.position - p).norm())
        .fold(f64::INFINITY, f64::min)
}

/// Distance from the nearest obstacle center to a segment.
pub fn clearance_to_segment(obstacles: &[Obstacle], seg: &Segment) -> f64 {
    obstacles
        .iter()
        .map(|o| seg.distance_to_point(o.position))
        .fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use halcyon_core::PlayerData;

    use super::*;

    fn world_with_players(own: Vec<Vector2>, opp: Vec<Vector2>) -> TeamData {
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

    #[test]
    fn test_excludes_acting_robot_only() {
        let world = world_with_players(
            vec![Vector2::new(0.0, 0.0), Vector2::new(1.0, 0.0)],
            vec![Vector2::new(2.0, 0.0)],
        );
        let obstacles = obstacles_for(&world, PlayerId::new(0), 0.09);
        assert_eq!(obstacles.len(), 2);
        assert!(obstacles.iter().all(|o| o.position.x > 0.5));
    }

    #[test]
    fn test_empty_world_fails_open() {
        let world = world_with_players(vec![Vector2::new(0.0, 0.0)], vec![]);
        let obstacles = obstacles_for(&world, PlayerId::new(0), 0.09);
        assert!(obstacles.is_empty());
        assert_eq!(
            clearance_to_point(&obstacles, Vector2::zeros()),
            f64::INFINITY
        );
    }

    #[test]
    fn test_unknown_velocity_is_stationary() {
        let world = world_with_players(vec![Vector2::zeros(), Vector2::new(1.0, 0.0)], vec![]);
        let obstacles = obstacles_for(&world, PlayerId::new(0), 0.09);
        assert_eq!(obstacles[0].velocity, Vector2::zeros());
    }
}
