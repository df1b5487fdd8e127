//! Linear ramping of the power, voltage and current setpoints.
//!
//! Each channel moves its `actual` value toward the operator's `target` by a fixed
//! increment every tick. The increment is only recomputed when the configuration
//! changes, never on a plain tick, and a channel that reaches its target goes idle
//! until it is given a new target or rate.

use fugit::MillisDurationU32;
use strum::{EnumCount, IntoEnumIterator};
use strum_macros::{EnumCount as EnumCountMacro, EnumIter};

/// The three independently ramped quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumCountMacro)]
pub enum ChannelKind {
    Power,
    Voltage,
    Current,
}

/// Operator input for a single channel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Setpoint {
    /// Value to ramp toward.
    pub target: f64,
    /// Units per second. The sign is ignored.
    pub ramp_rate: f64,
}

impl Setpoint {
    pub const fn new(target: f64, ramp_rate: f64) -> Self {
        Self { target, ramp_rate }
    }
}

/// Operator input for all three channels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RampSetpoints {
    pub power: Setpoint,
    pub voltage: Setpoint,
    pub current: Setpoint,
}

impl RampSetpoints {
    pub fn get(&self, kind: ChannelKind) -> Setpoint {
        match kind {
            ChannelKind::Power => self.power,
            ChannelKind::Voltage => self.voltage,
            ChannelKind::Current => self.current,
        }
    }

    pub fn set(&mut self, kind: ChannelKind, setpoint: Setpoint) {
        match kind {
            ChannelKind::Power => self.power = setpoint,
            ChannelKind::Voltage => self.voltage = setpoint,
            ChannelKind::Current => self.current = setpoint,
        }
    }
}

/// Ramp state of one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Channel {
    actual: f64,
    target: f64,
    ramp_rate: f64,
    increment: f64,
}

impl Channel {
    /// A channel that starts settled at its setpoint.
    pub fn new(setpoint: Setpoint) -> Self {
        Self {
            actual: setpoint.target,
            target: setpoint.target,
            ramp_rate: setpoint.ramp_rate,
            increment: 0.0,
        }
    }

    pub fn actual(&self) -> f64 {
        self.actual
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn ramp_rate(&self) -> f64 {
        self.ramp_rate
    }

    /// Signed change applied on the next tick.
    pub fn increment(&self) -> f64 {
        self.increment
    }

    /// True once the target has been reached or nothing is moving.
    pub fn is_idle(&self) -> bool {
        self.increment == 0.0
    }

    /// Recompute the per-tick increment for a tick lasting `dt_secs`.
    pub fn recompute_increment(&mut self, dt_secs: f64) {
        let delta = self.target - self.actual;
        let direction = if delta > 0.0 {
            1.0
        } else if delta < 0.0 {
            -1.0
        } else {
            0.0
        };
        self.increment = self.ramp_rate.abs() * dt_secs * direction;
    }

    /// Step toward the target, clamping instead of overshooting.
    pub fn advance(&mut self) {
        if self.increment == 0.0 {
            return;
        }
        self.actual += self.increment;
        let reached = if self.increment > 0.0 {
            self.actual >= self.target
        } else {
            self.actual <= self.target
        };
        if reached {
            self.actual = self.target;
            self.increment = 0.0;
        }
    }

    /// Returns whether anything changed.
    fn apply(&mut self, setpoint: Setpoint) -> bool {
        let changed = self.target != setpoint.target || self.ramp_rate != setpoint.ramp_rate;
        self.target = setpoint.target;
        self.ramp_rate = setpoint.ramp_rate;
        changed
    }
}

/// Ramps all three channels in lock step.
#[derive(Debug, Clone)]
pub struct RampController {
    channels: [Channel; ChannelKind::COUNT],
    tick_period: MillisDurationU32,
}

impl RampController {
    /// Start with every channel settled at its setpoint.
    pub fn new(setpoints: RampSetpoints, tick_period: MillisDurationU32) -> Self {
        Self {
            channels: [
                Channel::new(setpoints.power),
                Channel::new(setpoints.voltage),
                Channel::new(setpoints.current),
            ],
            tick_period,
        }
    }

    /// Apply a new operator configuration.
    ///
    /// Increments are recomputed for all channels when anything differs from the
    /// current configuration. Returns whether that happened.
    pub fn configure(&mut self, setpoints: RampSetpoints, tick_period: MillisDurationU32) -> bool {
        let mut changed = self.tick_period != tick_period;
        self.tick_period = tick_period;
        for (kind, channel) in ChannelKind::iter().zip(self.channels.iter_mut()) {
            changed |= channel.apply(setpoints.get(kind));
        }
        if changed {
            self.recompute_increments();
            log::debug!(
                "ramp reconfigured: P {:+.3}/tick, U {:+.3}/tick, I {:+.3}/tick",
                self.channel(ChannelKind::Power).increment,
                self.channel(ChannelKind::Voltage).increment,
                self.channel(ChannelKind::Current).increment,
            );
        }
        changed
    }

    /// Change a single channel's setpoint.
    pub fn set_setpoint(&mut self, kind: ChannelKind, setpoint: Setpoint) -> bool {
        let mut setpoints = self.setpoints();
        setpoints.set(kind, setpoint);
        self.configure(setpoints, self.tick_period)
    }

    /// Change how often [`Self::advance`] is called.
    pub fn set_tick_period(&mut self, tick_period: MillisDurationU32) -> bool {
        self.configure(self.setpoints(), tick_period)
    }

    /// Advance every channel by one tick.
    pub fn advance(&mut self) {
        for channel in &mut self.channels {
            channel.advance();
        }
    }

    pub fn channel(&self, kind: ChannelKind) -> &Channel {
        &self.channels[kind as usize]
    }

    pub fn actual(&self, kind: ChannelKind) -> f64 {
        self.channel(kind).actual()
    }

    pub fn tick_period(&self) -> MillisDurationU32 {
        self.tick_period
    }

    /// The configuration currently in effect.
    pub fn setpoints(&self) -> RampSetpoints {
        let setpoint = |kind: ChannelKind| {
            let channel = self.channel(kind);
            Setpoint::new(channel.target, channel.ramp_rate)
        };
        RampSetpoints {
            power: setpoint(ChannelKind::Power),
            voltage: setpoint(ChannelKind::Voltage),
            current: setpoint(ChannelKind::Current),
        }
    }

    /// Whether all channels have reached their targets.
    pub fn is_idle(&self) -> bool {
        self.channels.iter().all(Channel::is_idle)
    }

    fn recompute_increments(&mut self) {
        let dt_secs = f64::from(self.tick_period.to_millis()) / 1000.0;
        for channel in &mut self.channels {
            channel.recompute_increment(dt_secs);
        }
    }
}
