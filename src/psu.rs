use embedded_hal::delay::DelayNs;
use embedded_io::{Error as _, ErrorKind};
use fugit::MillisDurationU32;

use crate::{
    arc_rate::{ArcRateSampler, ArcRates},
    config::Config,
    error::{ConfigError, Error, Result},
    frame::Frame,
    ramp::{ChannelKind, RampController, RampSetpoints},
    response::Response,
    transport::Transport,
    types::{AckStatus, ArcCounts, Measurements, Readout, State},
};

/// Whether ticks are allowed to talk to the supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    /// Never opened.
    #[default]
    Idle,
    Open,
    Closed,
}

/// The last values successfully decoded from the supply.
///
/// A failed tick leaves these untouched, so they may be stale but are never invalid.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Telemetry {
    pub ack: Option<[u8; 2]>,
    pub status: Option<AckStatus>,
    pub measurements: Option<Measurements>,
    pub arcs: Option<ArcCounts>,
}

impl Telemetry {
    fn update(&mut self, readout: &Readout) {
        self.ack = Some(readout.ack);
        self.status = Some(readout.status);
        if readout.measurements.is_some() {
            self.measurements = readout.measurements;
        }
        if readout.arcs.is_some() {
            self.arcs = readout.arcs;
        }
    }
}

/// What one tick did.
#[derive(Debug)]
pub enum TickOutcome<I: embedded_io::Error> {
    /// Link not open. Nothing was sent and the ramp did not move.
    Skipped,
    /// A request went out but too few bytes came back to decode.
    NoResponse { received: usize },
    Decoded(Readout),
    /// The exchange failed; [`Telemetry`] keeps the previous values.
    Failed(Error<I>),
}

/// Result of [`TrueDc::tick`].
#[derive(Debug)]
pub struct TickReport<I: embedded_io::Error> {
    pub outcome: TickOutcome<I>,
    /// Present on ticks where the arc-rate sampler fired.
    pub arc_rates: Option<ArcRates>,
}

/// Drives a TrueDC supply from a periodic tick.
///
/// You can create a TrueDc using any interface which implements [Transport] and any delay
/// implementing [DelayNs]. The host calls [Self::tick] once per [Config::tick_period];
/// each call ramps the setpoints, sends one request and decodes the response.
pub struct TrueDc<S: Transport, D: DelayNs, const L: usize = 64> {
    interface: S,
    delay: D,
    config: Config,
    ramp: RampController,
    sampler: ArcRateSampler,
    link: LinkState,
    output: State,
    telemetry: Telemetry,
}

impl<S: Transport, D: DelayNs, const L: usize> TrueDc<S, D, L> {
    /// Create a controller with every channel settled at its setpoint and the output off.
    pub fn new(
        interface: S,
        delay: D,
        config: Config,
        setpoints: RampSetpoints,
    ) -> core::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            interface,
            delay,
            ramp: RampController::new(setpoints, config.tick_period),
            sampler: ArcRateSampler::new(config.sample_interval, config.tick_period),
            config,
            link: LinkState::Idle,
            output: State::Off,
            telemetry: Telemetry::default(),
        })
    }

    /// Start talking to the supply. The transport must already be open.
    ///
    /// Anything left in the receive buffer is discarded.
    pub fn open_link(&mut self) -> Result<(), S::Error> {
        if !self.interface.is_open() {
            return Err(Error::LinkClosed);
        }
        self.discard_input()?;
        self.link = LinkState::Open;
        log::info!("link opened");
        Ok(())
    }

    /// Stop talking to the supply. Later ticks are skipped until reopened.
    pub fn close_link(&mut self) {
        if self.link == LinkState::Open {
            log::info!("link closed");
        }
        self.link = LinkState::Closed;
    }

    pub fn link_state(&self) -> LinkState {
        self.link
    }

    /// Switch the power stage and output relay on or off with the next request.
    pub fn set_output(&mut self, state: impl Into<State>) {
        self.output = state.into();
    }

    pub fn output(&self) -> State {
        self.output
    }

    /// Take new operator setpoints. Returns whether the ramp was recomputed.
    pub fn apply_setpoints(&mut self, setpoints: RampSetpoints) -> bool {
        self.ramp.configure(setpoints, self.config.tick_period)
    }

    /// Change the tick period the host is using.
    ///
    /// Ramp increments and the arc sampling cadence follow. Returns whether the ramp
    /// was recomputed.
    pub fn set_tick_period(
        &mut self,
        tick_period: MillisDurationU32,
    ) -> core::result::Result<bool, ConfigError> {
        let config = self.config.with_tick_period(tick_period);
        config.validate()?;
        self.config = config;
        self.sampler.set_tick_period(tick_period);
        Ok(self.ramp.set_tick_period(tick_period))
    }

    /// Build the request for the current ramp values and output state.
    pub fn build_request(&self) -> Frame<L> {
        let mut frame = Frame::new();
        frame.set_destination(self.config.destination);
        frame.set_source(self.config.source);
        frame.set_command(self.config.command);
        frame.set_voltage(self.ramp.actual(ChannelKind::Voltage));
        frame.set_current(self.ramp.actual(ChannelKind::Current));
        frame.set_power(self.ramp.actual(ChannelKind::Power));
        match self.output {
            State::On => {
                frame.power_on();
                frame.relay_on();
            }
            State::Off => {
                frame.power_off();
                frame.relay_off();
            }
        }
        frame
    }

    /// Run one control cycle.
    ///
    /// Failures only affect this tick; the next one simply tries again.
    pub fn tick(&mut self) -> TickReport<S::Error> {
        let outcome = if self.link_is_open() {
            self.ramp.advance();
            let mut request = self.build_request();
            let bytes = request.finish();
            log::debug!("tx {:02X?}", bytes);
            match self.exchange(bytes) {
                Ok(response) => self.decode(&response),
                Err(err) => {
                    log::warn!("tick failed: {err}");
                    TickOutcome::Failed(err)
                }
            }
        } else {
            TickOutcome::Skipped
        };

        let arc_rates = if self.config.arc_rate_tracking {
            self.sampler.tick()
        } else {
            None
        };

        TickReport { outcome, arc_rates }
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub fn ramp(&self) -> &RampController {
        &self.ramp
    }

    pub fn sampler(&self) -> &ArcRateSampler {
        &self.sampler
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn interface(&self) -> &S {
        &self.interface
    }

    pub fn interface_mut(&mut self) -> &mut S {
        &mut self.interface
    }

    /// Give back the transport and delay.
    pub fn release(self) -> (S, D) {
        (self.interface, self.delay)
    }

    fn link_is_open(&mut self) -> bool {
        if self.link != LinkState::Open {
            return false;
        }
        if !self.interface.is_open() {
            log::warn!("transport closed underneath an open link");
            self.link = LinkState::Closed;
            return false;
        }
        true
    }

    /// Write a request, wait for the supply, and collect whatever it sent back.
    fn exchange(&mut self, request: &[u8]) -> Result<heapless::Vec<u8, L>, S::Error> {
        self.interface
            .write_all(request)
            .map_err(Error::SerialError)?;
        self.interface.flush().map_err(Error::SerialError)?;

        self.delay.delay_ms(self.config.settle_delay.to_millis());

        let mut buff: heapless::Vec<u8, L> = heapless::Vec::new();
        let mut temp_buf = [0u8; 8];
        loop {
            let available = self
                .interface
                .bytes_available()
                .map_err(Error::SerialError)?;
            if available == 0 {
                break;
            }
            let chunk = available.min(temp_buf.len());
            match self.interface.read(&mut temp_buf[..chunk]) {
                Ok(0) => break,
                Ok(bytes_read) => {
                    if buff.extend_from_slice(&temp_buf[..bytes_read]).is_err() {
                        self.discard_input()?;
                        return Err(Error::BufferError);
                    }
                }
                // Nothing more arrived in time; decode what we have.
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted) => break,
                Err(e) => return Err(Error::SerialError(e)),
            }
        }
        log::debug!("rx {:02X?}", buff.as_slice());
        Ok(buff)
    }

    fn decode(&mut self, bytes: &[u8]) -> TickOutcome<S::Error> {
        let response = Response::new(bytes);
        match response.readout() {
            Ok(readout) => {
                if readout.status == AckStatus::Fault {
                    log::warn!("supply reported fault, ack {:02X?}", readout.ack);
                }
                self.telemetry.update(&readout);
                if let Some(arcs) = readout.arcs {
                    self.sampler.observe(arcs);
                }
                TickOutcome::Decoded(readout)
            }
            Err(_) => {
                log::warn!("no usable response, {} bytes received", response.len());
                TickOutcome::NoResponse {
                    received: response.len(),
                }
            }
        }
    }

    fn discard_input(&mut self) -> Result<(), S::Error> {
        let mut temp_buf = [0u8; 8];
        loop {
            let available = self
                .interface
                .bytes_available()
                .map_err(Error::SerialError)?;
            if available == 0 {
                return Ok(());
            }
            let chunk = available.min(temp_buf.len());
            match self.interface.read(&mut temp_buf[..chunk]) {
                Ok(0) => return Ok(()),
                Ok(_) => {}
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted) => {
                    return Ok(());
                }
                Err(e) => return Err(Error::SerialError(e)),
            }
        }
    }
}
