mod dwa;
mod hybrid;
mod obstacles;
mod pid;
mod player_controller;
mod player_input;
mod rrt;
mod team_controller;
mod variable;

pub use dwa::{DynamicWindowPlanner, LocalMove};
pub use hybrid::HybridNavigator;
pub use obstacles::{obstacles_for, Obstacle};
pub use pid::{team_pids, AccelLimiter, Pid, PidController, TwoDPid};
pub use player_controller::PlayerController;
pub use player_input::{KickerControlInput, PlayerControlInput, PlayerInputs};
pub use rrt::RrtPlanner;
pub use team_controller::TeamController;
pub use variable::Variable;
