//! Hourly arc-event rates derived from the supply's cumulative counters.

use fugit::MillisDurationU32;

use crate::types::ArcCounts;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Events since `previous`, treating a smaller `current` as a counter wrap.
pub fn counter_delta(previous: u16, current: u16) -> u16 {
    current.wrapping_sub(previous)
}

/// Events per hour for each counter over one sampling interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArcRates {
    pub du: u64,
    pub im: u64,
    pub uxi: u64,
}

impl ArcRates {
    /// Current spikes and UxI events together.
    pub fn combined(&self) -> u64 {
        self.im.saturating_add(self.uxi)
    }
}

/// One point of a rate series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatePoint {
    /// Minutes since the sampler started.
    pub minutes: f64,
    /// Events per hour.
    pub rate: u64,
}

/// Samples the arc counters every `sample_ticks` ticks.
#[derive(Debug, Clone)]
pub struct ArcRateSampler {
    sample_interval: MillisDurationU32,
    sample_ticks: u32,
    tick_count: u32,
    latest: Option<ArcCounts>,
    previous: Option<ArcCounts>,
    rates: ArcRates,
    elapsed_minutes: f64,
    du_series: Vec<RatePoint>,
    combined_series: Vec<RatePoint>,
}

impl ArcRateSampler {
    pub fn new(sample_interval: MillisDurationU32, tick_period: MillisDurationU32) -> Self {
        Self {
            sample_interval,
            sample_ticks: Self::ticks_per_sample(sample_interval, tick_period),
            tick_count: 0,
            latest: None,
            previous: None,
            rates: ArcRates::default(),
            elapsed_minutes: 0.0,
            du_series: Vec::new(),
            combined_series: Vec::new(),
        }
    }

    /// Whole ticks per sample, never less than one.
    pub fn ticks_per_sample(sample_interval: MillisDurationU32, tick_period: MillisDurationU32) -> u32 {
        let tick_ms = tick_period.to_millis().max(1);
        let ticks = (f64::from(sample_interval.to_millis()) / f64::from(tick_ms)).round();
        (ticks as u32).max(1)
    }

    /// Keep the sampling interval when the tick period changes.
    pub fn set_tick_period(&mut self, tick_period: MillisDurationU32) {
        self.sample_ticks = Self::ticks_per_sample(self.sample_interval, tick_period);
        self.tick_count = self.tick_count.min(self.sample_ticks - 1);
    }

    /// Record the counters from the latest response.
    ///
    /// The first reading becomes the baseline, so counts that accumulated before
    /// the session started are not reported as a burst.
    pub fn observe(&mut self, counts: ArcCounts) {
        if self.previous.is_none() {
            self.previous = Some(counts);
        }
        self.latest = Some(counts);
    }

    /// Count one tick. Returns the new rates when a sample was taken.
    pub fn tick(&mut self) -> Option<ArcRates> {
        self.tick_count += 1;
        if self.tick_count < self.sample_ticks {
            return None;
        }
        self.tick_count = 0;
        Some(self.sample())
    }

    fn sample(&mut self) -> ArcRates {
        let interval_secs = f64::from(self.sample_interval.to_millis()) / 1000.0;
        let per_hour = |delta: u16| (SECONDS_PER_HOUR * f64::from(delta) / interval_secs).round() as u64;

        if let (Some(previous), Some(current)) = (self.previous, self.latest) {
            self.rates = ArcRates {
                du: per_hour(counter_delta(previous.du, current.du)),
                im: per_hour(counter_delta(previous.im, current.im)),
                uxi: per_hour(counter_delta(previous.uxi, current.uxi)),
            };
            self.previous = Some(current);
        } else {
            self.rates = ArcRates::default();
        }

        self.elapsed_minutes += interval_secs / 60.0;
        self.du_series.push(RatePoint {
            minutes: self.elapsed_minutes,
            rate: self.rates.du,
        });
        self.combined_series.push(RatePoint {
            minutes: self.elapsed_minutes,
            rate: self.rates.combined(),
        });
        log::info!(
            "arc rates at {:.1} min: dU {}/h, Im {}/h, UxI {}/h",
            self.elapsed_minutes,
            self.rates.du,
            self.rates.im,
            self.rates.uxi
        );
        self.rates
    }

    /// Rates from the most recent sample.
    pub fn rates(&self) -> ArcRates {
        self.rates
    }

    pub fn sample_ticks(&self) -> u32 {
        self.sample_ticks
    }

    pub fn sample_interval(&self) -> MillisDurationU32 {
        self.sample_interval
    }

    /// The dU rate history.
    pub fn du_series(&self) -> &[RatePoint] {
        &self.du_series
    }

    /// The Im + UxI rate history.
    pub fn combined_series(&self) -> &[RatePoint] {
        &self.combined_series
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fugit::ExtU32;

    #[test]
    fn ticks_per_sample_rounds() {
        assert_eq!(ArcRateSampler::ticks_per_sample(60_000.millis(), 1000.millis()), 60);
        assert_eq!(ArcRateSampler::ticks_per_sample(1000.millis(), 400.millis()), 3);
        assert_eq!(ArcRateSampler::ticks_per_sample(100.millis(), 1000.millis()), 1);
    }

    #[test]
    fn fires_every_sample_ticks() {
        let mut sampler = ArcRateSampler::new(3000.millis(), 1000.millis());
        assert_eq!(sampler.tick(), None);
        assert_eq!(sampler.tick(), None);
        assert!(sampler.tick().is_some());
        assert_eq!(sampler.tick(), None);
    }

    #[test]
    fn rate_is_events_per_hour() {
        let mut sampler = ArcRateSampler::new(10_000.millis(), 1000.millis());
        sampler.observe(ArcCounts::new(0, 0, 0));
        for _ in 0..9 {
            assert_eq!(sampler.tick(), None);
        }
        sampler.observe(ArcCounts::new(5, 5, 5));
        let rates = sampler.tick().unwrap();
        // round(3600 * 5 / 10)
        assert_eq!(rates, ArcRates { du: 1800, im: 1800, uxi: 1800 });
        assert_eq!(rates.combined(), 3600);
    }

    #[test]
    fn rate_rounds_to_nearest() {
        let mut sampler = ArcRateSampler::new(7000.millis(), 1000.millis());
        sampler.observe(ArcCounts::new(0, 0, 0));
        sampler.observe(ArcCounts::new(1, 2, 3));
        for _ in 0..6 {
            sampler.tick();
        }
        let rates = sampler.tick().unwrap();
        assert_eq!(rates.du, (3600.0f64 / 7.0).round() as u64);
        assert_eq!(rates.im, (7200.0f64 / 7.0).round() as u64);
        assert_eq!(rates.uxi, (10800.0f64 / 7.0).round() as u64);
    }

    #[test]
    fn wrap_counts_forward() {
        assert_eq!(counter_delta(65530, 4), 10);
        assert_eq!(counter_delta(4, 4), 0);

        let mut sampler = ArcRateSampler::new(3_600_000.millis(), 1000.millis());
        sampler.set_tick_period(3_600_000.millis());
        sampler.observe(ArcCounts::new(65535, 0, 0));
        sampler.observe(ArcCounts::new(1, 0, 0));
        let rates = sampler.tick().unwrap();
        assert_eq!(rates.du, 2);
    }

    #[test]
    fn counter_reset_on_short_interval_does_not_overflow() {
        let mut sampler = ArcRateSampler::new(10.millis(), 10.millis());
        sampler.observe(ArcCounts::new(0, 100, 100));
        sampler.observe(ArcCounts::new(0, 0, 0));
        let rates = sampler.tick().unwrap();
        // round(3600 * 65436 / 0.01)
        assert_eq!(rates.im, 23_556_960_000);
        assert_eq!(rates.uxi, 23_556_960_000);
        assert_eq!(rates.combined(), 47_113_920_000);
        assert_eq!(sampler.combined_series()[0].rate, 47_113_920_000);
    }

    #[test]
    fn combined_saturates() {
        let rates = ArcRates { du: 0, im: u64::MAX, uxi: 1 };
        assert_eq!(rates.combined(), u64::MAX);
    }

    #[test]
    fn first_reading_is_baseline() {
        let mut sampler = ArcRateSampler::new(1000.millis(), 1000.millis());
        sampler.observe(ArcCounts::new(500, 500, 500));
        assert_eq!(sampler.tick(), Some(ArcRates::default()));
    }

    #[test]
    fn series_share_a_minute_axis() {
        let mut sampler = ArcRateSampler::new(30_000.millis(), 1000.millis());
        sampler.observe(ArcCounts::new(0, 0, 0));
        for round in 1..=3u16 {
            sampler.observe(ArcCounts::new(round, round * 2, round));
            for _ in 0..30 {
                sampler.tick();
            }
        }
        let minutes: Vec<f64> = sampler.du_series().iter().map(|p| p.minutes).collect();
        assert_eq!(minutes, vec![0.5, 1.0, 1.5]);
        assert_eq!(sampler.du_series()[0].rate, 120);
        assert_eq!(sampler.combined_series()[0].rate, 360);
        assert_eq!(sampler.combined_series().len(), 3);
    }

    #[test]
    fn samples_without_readings_report_zero() {
        let mut sampler = ArcRateSampler::new(1000.millis(), 1000.millis());
        assert_eq!(sampler.tick(), Some(ArcRates::default()));
        assert_eq!(sampler.du_series().len(), 1);
    }

    #[test]
    fn shorter_tick_period_resamples_cadence() {
        let mut sampler = ArcRateSampler::new(2000.millis(), 1000.millis());
        assert_eq!(sampler.sample_ticks(), 2);
        sampler.set_tick_period(500.millis());
        assert_eq!(sampler.sample_ticks(), 4);
    }
}
