use std::env;
use std::time::Duration;

use inquire::Select;
use serialport::SerialPort;
use scpi_pps::{
    profile::{self, DeviceProfile},
    psu::ScpiPps,
    transport::SerialScpi,
    types::Sample,
};
use tracing_subscriber::EnvFilter;

// Configuration constants - adjust these for your setup
const BAUD_RATE: u32 = 9600;
// Reads must not stall the poll loop, a timed out read just means "no reply yet".
const SERIAL_TIMEOUT_MS: u64 = 10;
const OUTPUT_VOLTAGE_V: f32 = 5.0;
const CURRENT_LIMIT_A: f32 = 0.1;
const POLL_INTERVAL_MS: u64 = 50;
const SAMPLE_COUNT: usize = 20;

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
            std::io::ErrorKind::ConnectionRefused => embedded_io::ErrorKind::ConnectionRefused,
            std::io::ErrorKind::ConnectionReset => embedded_io::ErrorKind::ConnectionReset,
            std::io::ErrorKind::ConnectionAborted => embedded_io::ErrorKind::ConnectionAborted,
            std::io::ErrorKind::NotConnected => embedded_io::ErrorKind::NotConnected,
            std::io::ErrorKind::AddrInUse => embedded_io::ErrorKind::AddrInUse,
            std::io::ErrorKind::AddrNotAvailable => embedded_io::ErrorKind::AddrNotAvailable,
            std::io::ErrorKind::BrokenPipe => embedded_io::ErrorKind::BrokenPipe,
            std::io::ErrorKind::AlreadyExists => embedded_io::ErrorKind::AlreadyExists,
            std::io::ErrorKind::InvalidInput => embedded_io::ErrorKind::InvalidInput,
            std::io::ErrorKind::InvalidData => embedded_io::ErrorKind::InvalidData,
            std::io::ErrorKind::TimedOut => embedded_io::ErrorKind::TimedOut,
            std::io::ErrorKind::Interrupted => embedded_io::ErrorKind::Interrupted,
            std::io::ErrorKind::Unsupported => embedded_io::ErrorKind::Unsupported,
            std::io::ErrorKind::OutOfMemory => embedded_io::ErrorKind::OutOfMemory,
            _ => embedded_io::ErrorKind::Other,
        }
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

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
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

    // Optional profile file, the built-in Rigol DP800 profile otherwise
    let profile: DeviceProfile = match env::args().nth(2) {
        Some(path) => DeviceProfile::from_file(&path).expect("Failed to load profile"),
        None => profile::rigol_dp800().expect("Built-in profile is invalid"),
    };

    println!("Using port: {}", port_name);
    println!("Profile: {} {}", profile.vendor, profile.model);

    // Open serial port
    let port = serialport::new(&port_name, BAUD_RATE)
        .timeout(Duration::from_millis(SERIAL_TIMEOUT_MS))
        .open()
        .expect("Failed to open serial port");

    let port = PortWrapper(port);

    // Create a PSU object
    let mut psu = ScpiPps::with_default_channels(SerialScpi::<_, 128>::new(port), &profile);
    psu.open().unwrap();

    // Configure the first channel
    let first = psu.channels()[0].name.clone();
    psu.set_voltage_target(&first, OUTPUT_VOLTAGE_V).unwrap();
    psu.set_current_limit(&first, CURRENT_LIMIT_A).unwrap();
    psu.set_output_enabled(&first, true).unwrap();
    println!(
        "Channel {}: {}V, limit {}A, output enabled",
        first, OUTPUT_VOLTAGE_V, CURRENT_LIMIT_A
    );

    // This loop plays the part of the event loop, calling back until enough samples arrived.
    psu.start_acquisition().unwrap();
    let mut received = 0;
    while received < SAMPLE_COUNT {
        psu.receive_data(&mut |sample: &Sample<'_>| {
            received += 1;
            println!(
                "{} channel {}: {:.4}{}",
                sample.timestamp.format("%H:%M:%S%.3f"),
                sample.channel.name,
                sample.value,
                sample.unit
            );
        })
        .unwrap();
        std::thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
    }

    psu.set_output_enabled(&first, false).unwrap();
    psu.close().unwrap();
    println!("Done");
}
