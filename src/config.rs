//! Settings for the control loop and the link.

use fugit::{ExtU32, MillisDurationU32};

use crate::{error::ConfigError, frame::DEFAULT_COMMAND};

/// Baud rate the supply ships with. Frames are 8N1.
pub const DEFAULT_BAUD_RATE: u32 = 38_400;
/// Broadcast-style address every request is sent to by default.
pub const DEFAULT_DESTINATION: u16 = 0xFFFF;
pub const DEFAULT_SOURCE: u16 = 0x0000;

/// Control loop configuration.
///
/// Use the `with_*` methods to adjust the defaults, then [`Config::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Time between ticks. Default 1 s.
    pub tick_period: MillisDurationU32,
    /// Wait between writing a request and reading the response. Default 100 ms.
    pub settle_delay: MillisDurationU32,
    /// How often arc rates are sampled. Default 60 s.
    pub sample_interval: MillisDurationU32,
    /// Whether the arc-rate sampler runs at all.
    pub arc_rate_tracking: bool,
    pub destination: u16,
    pub source: u16,
    pub command: u16,
    /// Only used by hosts opening the port.
    pub baud_rate: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_period: 1000.millis(),
            settle_delay: 100.millis(),
            sample_interval: 60_000.millis(),
            arc_rate_tracking: true,
            destination: DEFAULT_DESTINATION,
            source: DEFAULT_SOURCE,
            command: DEFAULT_COMMAND,
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

impl Config {
    pub fn with_tick_period(mut self, tick_period: MillisDurationU32) -> Self {
        self.tick_period = tick_period;
        self
    }

    pub fn with_settle_delay(mut self, settle_delay: MillisDurationU32) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn with_sample_interval(mut self, sample_interval: MillisDurationU32) -> Self {
        self.sample_interval = sample_interval;
        self
    }

    pub fn with_arc_rate_tracking(mut self, enabled: bool) -> Self {
        self.arc_rate_tracking = enabled;
        self
    }

    pub fn with_addresses(mut self, destination: u16, source: u16) -> Self {
        self.destination = destination;
        self.source = source;
        self
    }

    pub fn with_command(mut self, command: u16) -> Self {
        self.command = command;
        self
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Check the timing values are usable together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_period.to_millis() == 0 {
            return Err(ConfigError::ZeroTickPeriod);
        }
        if self.sample_interval < self.tick_period {
            return Err(ConfigError::SampleIntervalTooShort);
        }
        if self.settle_delay >= self.tick_period {
            return Err(ConfigError::SettleDelayTooLong);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.tick_period.to_millis(), 1000);
        assert_eq!(config.settle_delay.to_millis(), 100);
        assert_eq!(config.destination, 0xFFFF);
        assert_eq!(config.command, 0x6040);
        assert_eq!(config.baud_rate, 38_400);
    }

    #[test]
    fn rejects_zero_tick() {
        let config = Config::default().with_tick_period(0.millis());
        assert_eq!(config.validate(), Err(ConfigError::ZeroTickPeriod));
    }

    #[test]
    fn rejects_sample_interval_below_tick() {
        let config = Config::default()
            .with_tick_period(2000.millis())
            .with_sample_interval(1000.millis());
        assert_eq!(config.validate(), Err(ConfigError::SampleIntervalTooShort));
    }

    #[test]
    fn rejects_settle_delay_longer_than_tick() {
        let config = Config::default().with_settle_delay(1000.millis());
        assert_eq!(config.validate(), Err(ConfigError::SettleDelayTooLong));
    }
}
