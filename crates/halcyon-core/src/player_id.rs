use serde::{Deserialize, Serialize};

/// A robot's unique, stable id within its team. Per-robot controller state is
/// keyed by this, so callers must use the same id for the same physical robot
/// across ticks.
#[derive(
    Clone, Copy, Debug, Default, Serialize, Deserialize, Hash, PartialEq, Eq, PartialOrd, Ord,
)]
pub struct PlayerId(u32);

impl PlayerId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which team a robot belongs to, resolved once per tick when the snapshot is
/// built -- never inferred ad hoc from ids.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Hash, PartialEq, Eq)]
pub enum TeamColor {
    #[default]
    Blue,
    Yellow,
}

impl TeamColor {
    pub fn opponent(&self) -> TeamColor {
        match self {
            TeamColor::Blue => TeamColor::Yellow,
            TeamColor::Yellow => TeamColor::Blue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opponent_is_an_involution() {
        assert_eq!(TeamColor::Blue.opponent(), TeamColor::Yellow);
        assert_eq!(TeamColor::Yellow.opponent().opponent(), TeamColor::Yellow);
    }
}
