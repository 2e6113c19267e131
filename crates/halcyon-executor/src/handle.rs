use halcyon_core::{ExecutorSettings, Polygon};
use tokio::sync::mpsc;

/// Messages the outside world can send to a running executor.
#[derive(Debug)]
pub enum ControlMsg {
    /// Pause or resume command output; the tick loop keeps running so the
    /// controllers stay warm
    SetPause(bool),
    /// Replace the keep-out zones applied to all navigation
    SetKeepOut(Vec<Polygon>),
    /// Swap in a new settings document; takes effect for controllers created
    /// after this point
    UpdateSettings(ExecutorSettings),
    Stop,
}

/// A cheap, cloneable handle for controlling a running executor.
#[derive(Debug, Clone)]
pub struct ExecutorHandle {
    pub(crate) control_tx: mpsc::UnboundedSender<ControlMsg>,
}

impl ExecutorHandle {
    /// Send a control message. Errors are logged, not returned; a closed
    /// channel means the executor already stopped.
    pub fn send(&self, msg: ControlMsg) {
        self.control_tx
            .send(msg)
            .map_err(|err| {
                log::error!("Error sending control message: {:?}", err);
            })
            .ok();
    }
}
