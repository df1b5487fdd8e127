use std::env;

use inquire::Select;
use serialport::SerialPort;
use truedc_psu::{
    config::Config,
    psu::{LinkState, TickOutcome, TrueDc},
    ramp::{RampSetpoints, Setpoint},
    transport::Transport,
};

// Configuration constants - adjust these for your setup
const SERIAL_TIMEOUT_MS: u64 = 50;
const RUN_TICKS: u32 = 120;
// Targets and ramp rates (units per second).
const POWER_W: Setpoint = Setpoint::new(500.0, 50.0);
const VOLTAGE_V: Setpoint = Setpoint::new(400.0, 20.0);
const CURRENT_A: Setpoint = Setpoint::new(1.5, 0.1);

pub struct PortWrapper(Box<dyn SerialPort>);

#[derive(Debug)]
pub struct IoError(std::io::Error);

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl embedded_io::Error for IoError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self.0.kind() {
            std::io::ErrorKind::NotFound => embedded_io::ErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => embedded_io::ErrorKind::PermissionDenied,
            std::io::ErrorKind::BrokenPipe => embedded_io::ErrorKind::BrokenPipe,
            std::io::ErrorKind::InvalidInput => embedded_io::ErrorKind::InvalidInput,
            std::io::ErrorKind::InvalidData => embedded_io::ErrorKind::InvalidData,
            std::io::ErrorKind::TimedOut => embedded_io::ErrorKind::TimedOut,
            std::io::ErrorKind::Interrupted => embedded_io::ErrorKind::Interrupted,
            std::io::ErrorKind::Unsupported => embedded_io::ErrorKind::Unsupported,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}

impl From<serialport::Error> for IoError {
    fn from(err: serialport::Error) -> Self {
        IoError(err.into())
    }
}

impl embedded_io::ErrorType for PortWrapper {
    type Error = IoError;
}

impl embedded_io::Read for PortWrapper {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        std::io::Read::read(&mut self.0, buf).map_err(IoError)
    }
}

impl embedded_io::Write for PortWrapper {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        std::io::Write::write(&mut self.0, buf).map_err(IoError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        std::io::Write::flush(&mut self.0).map_err(IoError)
    }
}

impl Transport for PortWrapper {
    fn is_open(&self) -> bool {
        // The port is owned for the lifetime of the wrapper.
        true
    }

    fn bytes_available(&mut self) -> Result<usize, Self::Error> {
        Ok(self.0.bytes_to_read()? as usize)
    }
}

/// Settle delay backed by the OS scheduler.
pub struct SleepDelay;

impl embedded_hal::delay::DelayNs for SleepDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Get serial port from command line arg or interactive selection
    let port_name = env::args().nth(1).unwrap_or_else(|| {
        // List available serial ports
        let ports = serialport::available_ports().expect("Failed to enumerate serial ports");

        if ports.is_empty() {
            eprintln!("No serial ports found!");
            std::process::exit(1);
        }

        let port_names: Vec<String> = ports.iter().map(|p| p.port_name.clone()).collect();

        // Interactive selection
        Select::new("Select a serial port:", port_names)
            .prompt()
            .expect("Failed to select port")
    });

    println!("Using port: {}", port_name);

    let config = Config::default();

    // Open serial port, 8N1
    let port = serialport::new(&port_name, config.baud_rate)
        .data_bits(serialport::DataBits::Eight)
        .parity(serialport::Parity::None)
        .stop_bits(serialport::StopBits::One)
        .timeout(std::time::Duration::from_millis(SERIAL_TIMEOUT_MS))
        .open()
        .expect("Failed to open serial port");

    let setpoints = RampSetpoints {
        power: Setpoint::new(0.0, POWER_W.ramp_rate),
        voltage: Setpoint::new(0.0, VOLTAGE_V.ramp_rate),
        current: Setpoint::new(0.0, CURRENT_A.ramp_rate),
    };

    let mut psu: TrueDc<PortWrapper, SleepDelay> =
        TrueDc::new(PortWrapper(port), SleepDelay, config, setpoints)
            .expect("Invalid configuration");
    psu.open_link().expect("Failed to open link");

    // Ramp from zero up to the targets with the output enabled.
    psu.apply_setpoints(RampSetpoints {
        power: POWER_W,
        voltage: VOLTAGE_V,
        current: CURRENT_A,
    });
    psu.set_output(true);

    let tick_period = std::time::Duration::from_millis(u64::from(config.tick_period.to_millis()));
    for _ in 0..RUN_TICKS {
        let started = std::time::Instant::now();
        let report = psu.tick();

        match report.outcome {
            TickOutcome::Decoded(readout) => {
                print!("{:>5}", readout.status);
                if let Some(m) = readout.measurements {
                    print!(
                        "  U {:8.2} V  I {:6.3} A  P {:8.1} W",
                        m.voltage, m.current, m.power
                    );
                }
                if let Some(arcs) = readout.arcs {
                    print!("  arcs dU {} Im {} UxI {}", arcs.du, arcs.im, arcs.uxi);
                }
                println!();
            }
            TickOutcome::NoResponse { received } => println!("No response ({received} bytes)"),
            TickOutcome::Failed(err) => println!("Tick failed: {err}"),
            TickOutcome::Skipped => println!("Link not open"),
        }

        if let Some(rates) = report.arc_rates {
            println!(
                "Arc rates: dU {}/h, Im+UxI {}/h",
                rates.du,
                rates.combined()
            );
        }

        std::thread::sleep(tick_period.saturating_sub(started.elapsed()));
    }

    // Ramp back down to zero, then switch the output off.
    psu.apply_setpoints(setpoints);
    while !psu.ramp().is_idle() && psu.link_state() == LinkState::Open {
        let started = std::time::Instant::now();
        if let TickOutcome::Failed(err) = psu.tick().outcome {
            println!("Tick failed: {err}");
        }
        std::thread::sleep(tick_period.saturating_sub(started.elapsed()));
    }
    psu.set_output(false);
    psu.tick();
    psu.close_link();

    println!("\n--- Arc rate history (minutes, dU/h, Im+UxI/h) ---");
    for (du, combined) in psu
        .sampler()
        .du_series()
        .iter()
        .zip(psu.sampler().combined_series())
    {
        println!("{:6.1} {:8} {:8}", du.minutes, du.rate, combined.rate);
    }
}
