use std::time::Duration;

use anyhow::{bail, Result};
use halcyon_core::{ExecutorSettings, PlayerCmd, TeamData};
use tokio::sync::{mpsc, watch};

mod control;
mod handle;

pub use control::{
    obstacles_for, DynamicWindowPlanner, HybridNavigator, KickerControlInput, LocalMove, Obstacle,
    PlayerControlInput, PlayerInputs, RrtPlanner, TeamController,
};
pub use handle::{ControlMsg, ExecutorHandle};

/// Drives the team controller at a fixed tick rate.
///
/// World snapshots and control inputs arrive over watch channels, so the
/// executor always reads the latest state and never queues up stale frames.
/// Commands go out over an unbounded channel to whatever transport is in use
/// (serial bridge, simulator).
pub struct Executor {
    settings: ExecutorSettings,
    controller: TeamController,
    world_rx: watch::Receiver<TeamData>,
    inputs_rx: watch::Receiver<PlayerInputs>,
    cmd_tx: mpsc::UnboundedSender<PlayerCmd>,
    command_tx: mpsc::UnboundedSender<ControlMsg>,
    command_rx: mpsc::UnboundedReceiver<ControlMsg>,
    paused: bool,
}

impl Executor {
    pub fn new(
        settings: ExecutorSettings,
        world_rx: watch::Receiver<TeamData>,
        inputs_rx: watch::Receiver<PlayerInputs>,
        cmd_tx: mpsc::UnboundedSender<PlayerCmd>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        Self {
            controller: TeamController::new(settings.clone()),
            settings,
            world_rx,
            inputs_rx,
            cmd_tx,
            command_tx,
            command_rx,
            paused: false,
        }
    }

    pub fn handle(&self) -> ExecutorHandle {
        ExecutorHandle {
            control_tx: self.command_tx.clone(),
        }
    }

    /// Run the tick loop until [`ControlMsg::Stop`] arrives or the command
    /// consumer goes away.
    pub async fn run(mut self) -> Result<()> {
        let mut interval =
            tokio::time::interval(Duration::from_secs_f64(self.settings.controller.tick_period()));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                // Control messages take priority over ticking
                biased;
                Some(msg) = self.command_rx.recv() => {
                    match msg {
                        ControlMsg::Stop => break,
                        msg => self.handle_control_msg(msg),
                    }
                }
                _ = interval.tick() => {
                    if !self.paused {
                        self.tick()?;
                    }
                }
            }
        }

        Ok(())
    }

    fn handle_control_msg(&mut self, msg: ControlMsg) {
        match msg {
            ControlMsg::SetPause(paused) => self.paused = paused,
            ControlMsg::SetKeepOut(zones) => self.controller.set_keep_out(zones),
            ControlMsg::UpdateSettings(settings) => {
                self.controller = TeamController::new(settings.clone());
                self.settings = settings;
                log::info!("Executor settings updated, controllers rebuilt");
            }
            ControlMsg::Stop => unreachable!(),
        }
    }

    fn tick(&mut self) -> Result<()> {
        let world = self.world_rx.borrow_and_update().clone();
        let inputs = self.inputs_rx.borrow_and_update().clone();
        for cmd in self.controller.update(&world, &inputs) {
            if self.cmd_tx.send(cmd).is_err() {
                bail!("Player command receiver dropped, stopping executor");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use halcyon_core::{PlayerData, PlayerId, Vector2};

    use super::*;

    fn one_robot_world() -> TeamData {
        TeamData {
            own_players: vec![PlayerData::new(PlayerId::new(0), Vector2::zeros())],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_run_emits_commands_and_stops() {
        let (_world_tx, world_rx) = watch::channel(one_robot_world());
        let (_inputs_tx, inputs_rx) = watch::channel(PlayerInputs::new());
        let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel();

        let executor = Executor::new(ExecutorSettings::default(), world_rx, inputs_rx, cmd_tx);
        let handle = executor.handle();
        let task = tokio::spawn(executor.run());

        let cmd = tokio::time::timeout(Duration::from_secs(1), cmd_rx.recv())
            .await
            .expect("no command within a second")
            .expect("command channel closed");
        assert_eq!(cmd.id, PlayerId::new(0));

        handle.send(ControlMsg::Stop);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_pause_suppresses_commands() {
        let (_world_tx, world_rx) = watch::channel(one_robot_world());
        let (_inputs_tx, inputs_rx) = watch::channel(PlayerInputs::new());
        let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel();

        let executor = Executor::new(ExecutorSettings::default(), world_rx, inputs_rx, cmd_tx);
        let handle = executor.handle();
        handle.send(ControlMsg::SetPause(true));
        let task = tokio::spawn(executor.run());

        let got = tokio::time::timeout(Duration::from_millis(200), cmd_rx.recv()).await;
        assert!(got.is_err(), "paused executor must not emit commands");

        handle.send(ControlMsg::Stop);
        task.await.unwrap().unwrap();
    }
}
