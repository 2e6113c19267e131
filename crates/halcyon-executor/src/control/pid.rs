use std::collections::HashMap;
use std::time::Instant;

use halcyon_core::{wrap_angle, PidGains, PidSettings, PlayerId, Vector2};

use super::variable::Variable;

/// Fallback frame time when wall-clock timing misbehaves (first call, or an
/// elapsed time that rounds to zero).
const NOMINAL_DT: f64 = 1.0 / 60.0;

/// Orientation errors below this produce no output, to stop jitter near the
/// setpoint.
const ORIENTATION_DEADBAND: f64 = 0.05;
/// Translation errors below this (3mm) produce no output.
const TRANSLATION_DEADBAND: f64 = 0.003;

/// A keyed PID controller: one instance serves every robot on the team, with
/// per-robot error/integral state addressed by [`PlayerId`].
///
/// Callers must use a stable id per physical robot, and must call
/// [`PidController::reset`] whenever a target changes abruptly, or stale
/// history produces derivative and integral spikes.
pub trait PidController {
    type Value: Variable;

    /// Run one PID step at an explicit time. Used directly by tests and
    /// replays; live code goes through [`PidController::calculate`].
    fn calculate_at(
        &mut self,
        target: Self::Value,
        current: Self::Value,
        id: PlayerId,
        now: Instant,
    ) -> Self::Value;

    /// Run one PID step against the wall clock.
    fn calculate(&mut self, target: Self::Value, current: Self::Value, id: PlayerId) -> Self::Value {
        self.calculate_at(target, current, id, Instant::now())
    }

    /// Clear the given robot's error, integral, and first-call state.
    fn reset(&mut self, id: PlayerId);
}

#[derive(Clone, Copy, Debug)]
struct AxisState {
    prev_error: f64,
    integral: f64,
    prev_time: Option<Instant>,
    first_call: bool,
}

impl AxisState {
    fn new() -> Self {
        Self {
            prev_error: 0.0,
            integral: 0.0,
            prev_time: None,
            first_call: true,
        }
    }
}

/// The shared scalar P/I/D step. The derivative uses measured wall-clock
/// time; the integral accumulates on the nominal tick period so anti-windup
/// clamps stay calibrated.
fn scalar_step(
    state: &mut AxisState,
    error: f64,
    gains: &PidGains,
    nominal_dt: f64,
    delay: f64,
    wrap: bool,
    now: Instant,
) -> f64 {
    let dt = match state.prev_time {
        Some(prev) => {
            let measured = now.duration_since(prev).as_secs_f64();
            if measured > 0.0 {
                measured
            } else {
                nominal_dt
            }
        }
        None => nominal_dt,
    };

    let derivative = if state.first_call {
        state.first_call = false;
        0.0
    } else {
        (error - state.prev_error) / dt
    };

    // Compensate the command transmission delay by extrapolating the error
    // forward along its derivative
    let effective = if delay > 0.0 {
        let predicted = error + derivative * delay;
        if wrap {
            wrap_angle(predicted)
        } else {
            predicted
        }
    } else {
        error
    };

    let p_out = gains.kp * effective;

    let i_out = if gains.ki != 0.0 {
        state.integral += effective * nominal_dt;
        if let Some(max) = gains.integral_max {
            state.integral = state.integral.min(max);
        }
        if let Some(min) = gains.integral_min {
            state.integral = state.integral.max(min);
        }
        gains.ki * state.integral
    } else {
        0.0
    };

    let d_out = gains.kd * derivative;

    state.prev_error = error;
    state.prev_time = Some(now);

    p_out + i_out + d_out
}

/// Scalar PID, used for orientation control. Constructed with
/// [`Pid::angular`] the error is wrapped into (-pi, pi] so the controller
/// always turns the short way.
pub struct Pid {
    dt: f64,
    gains: PidGains,
    max_output: f64,
    min_output: f64,
    wrap: bool,
    deadband: f64,
    delay: f64,
    states: HashMap<PlayerId, AxisState>,
}

impl Pid {
    /// # Panics
    ///
    /// Panics if `dt` is not positive; a zero tick period is always a
    /// programmer error.
    pub fn new(dt: f64, max_output: f64, min_output: f64, gains: PidGains) -> Self {
        assert!(dt > 0.0, "dt must be greater than zero");
        Self {
            dt,
            gains,
            max_output,
            min_output,
            wrap: false,
            deadband: 0.0,
            delay: 0.0,
            states: HashMap::new(),
        }
    }

    /// A scalar PID for angular quantities: errors wrap and small errors are
    /// ignored.
    pub fn angular(dt: f64, max_output: f64, min_output: f64, gains: PidGains) -> Self {
        let mut pid = Self::new(dt, max_output, min_output, gains);
        pid.wrap = true;
        pid.deadband = ORIENTATION_DEADBAND;
        pid
    }

    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }
}

impl PidController for Pid {
    type Value = f64;

    fn calculate_at(&mut self, target: f64, current: f64, id: PlayerId, now: Instant) -> f64 {
        let raw_error = target - current;
        let error = if self.wrap {
            wrap_angle(raw_error)
        } else {
            raw_error
        };

        let state = self.states.entry(id).or_insert_with(AxisState::new);
        if error.abs() < self.deadband {
            state.prev_time = Some(now);
            return 0.0;
        }

        let out = scalar_step(state, error, &self.gains, self.dt, self.delay, self.wrap, now);
        out.clamp(self.min_output, self.max_output)
    }

    fn reset(&mut self, id: PlayerId) {
        self.states.remove(&id);
    }
}

/// 2D PID, used for translation. Runs the scalar P/I/D math on the distance
/// to the target, then decomposes the output along the direction to the
/// target and caps the result at `max_velocity` without changing direction.
pub struct TwoDPid {
    dt: f64,
    gains: PidGains,
    max_velocity: f64,
    delay: f64,
    states: HashMap<PlayerId, AxisState>,
}

impl TwoDPid {
    /// # Panics
    ///
    /// Panics if `dt` is not positive.
    pub fn new(dt: f64, max_velocity: f64, gains: PidGains) -> Self {
        assert!(dt > 0.0, "dt must be greater than zero");
        Self {
            dt,
            gains,
            max_velocity,
            delay: 0.0,
            states: HashMap::new(),
        }
    }

    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }
}

impl PidController for TwoDPid {
    type Value = Vector2;

    fn calculate_at(
        &mut self,
        target: Vector2,
        current: Vector2,
        id: PlayerId,
        now: Instant,
    ) -> Vector2 {
        let diff = target - current;
        let error = diff.norm();

        let state = self.states.entry(id).or_insert_with(AxisState::new);
        if error < TRANSLATION_DEADBAND {
            state.prev_time = Some(now);
            return Vector2::zeros();
        }

        let out = scalar_step(state, error, &self.gains, self.dt, self.delay, false, now);
        let velocity = diff * (out / error);
        velocity.cap_magnitude(self.max_velocity)
    }

    fn reset(&mut self, id: PlayerId) {
        self.states.remove(&id);
    }
}

/// Wraps a PID controller and limits how fast its output may change:
/// successive outputs differ by at most `max_acceleration * elapsed`, by
/// absolute value for scalars and by norm for vectors. The first call
/// assumes one nominal frame has elapsed.
pub struct AccelLimiter<C: PidController> {
    inner: C,
    max_acceleration: f64,
    last_outputs: HashMap<PlayerId, (C::Value, Instant)>,
}

impl<C: PidController> AccelLimiter<C> {
    pub fn new(inner: C, max_acceleration: f64) -> Self {
        Self {
            inner,
            max_acceleration,
            last_outputs: HashMap::new(),
        }
    }
}

impl<C: PidController> PidController for AccelLimiter<C> {
    type Value = C::Value;

    fn calculate_at(
        &mut self,
        target: C::Value,
        current: C::Value,
        id: PlayerId,
        now: Instant,
    ) -> C::Value {
        let result = self.inner.calculate_at(target, current, id, now);

        let (last_val, allowed) = match self.last_outputs.get(&id) {
            Some((val, time)) => {
                let elapsed = now.duration_since(*time).as_secs_f64();
                let elapsed = if elapsed > 0.0 { elapsed } else { NOMINAL_DT };
                (*val, self.max_acceleration * elapsed)
            }
            None => (C::Value::zero(), self.max_acceleration * NOMINAL_DT),
        };

        let diff = result - last_val;
        let limited = if diff.magnitude() <= allowed {
            result
        } else {
            last_val + diff * (allowed / diff.magnitude())
        };

        self.last_outputs.insert(id, (limited, now));
        limited
    }

    fn reset(&mut self, id: PlayerId) {
        self.inner.reset(id);
        self.last_outputs.remove(&id);
    }
}

/// The orientation and translation controllers for one team, built from a
/// deployment gain set.
pub fn team_pids(settings: &PidSettings, dt: f64) -> (AccelLimiter<Pid>, AccelLimiter<TwoDPid>) {
    let orientation = Pid::angular(
        dt,
        settings.max_angular_velocity,
        -settings.max_angular_velocity,
        settings.orientation,
    )
    .with_delay(settings.sending_delay);
    let translation =
        TwoDPid::new(dt, settings.max_velocity, settings.translation).with_delay(settings.sending_delay);
    (
        AccelLimiter::new(orientation, settings.orientation.max_acceleration),
        AccelLimiter::new(translation, settings.translation.max_acceleration),
    )
}
