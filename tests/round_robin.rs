//! Drives the poll loop through the public API with a scripted instrument.

use std::collections::VecDeque;

use scpi_pps::{
    acquisition::PollState,
    error::Error,
    profile::DeviceProfile,
    psu::ScpiPps,
    transport::ScpiTransport,
    types::{Channel, MeasuredQuantity, Sample},
};

#[derive(Debug)]
struct LinkDown;

impl core::fmt::Display for LinkDown {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "link down")
    }
}

impl core::error::Error for LinkDown {}

impl embedded_io::Error for LinkDown {
    fn kind(&self) -> embedded_io::ErrorKind {
        embedded_io::ErrorKind::NotConnected
    }
}

/// Answers every measurement query with the next scripted value.
#[derive(Default)]
struct ScriptedInstrument {
    sent: Vec<String>,
    replies: VecDeque<f32>,
    /// Replies become readable only after a query was sent.
    ready: usize,
    link_down: bool,
}

impl ScpiTransport for ScriptedInstrument {
    type Error = LinkDown;

    fn send(&mut self, command: &str) -> Result<(), LinkDown> {
        if self.link_down {
            return Err(LinkDown);
        }
        self.sent.push(command.to_string());
        if command.contains('?') {
            self.ready += 1;
        }
        Ok(())
    }

    fn read_one_numeric(&mut self) -> Option<f32> {
        if self.ready == 0 {
            return None;
        }
        let value = self.replies.pop_front()?;
        self.ready -= 1;
        Some(value)
    }
}

const PROFILE: &str = r#"
vendor = "Acme"
model = "Quad"
channels = ["A", "B", "C", "D"]

[[commands]]
command = "get_meas_voltage"
template = "MEAS:VOLT? (@{channel})"

[[commands]]
command = "get_meas_current"
template = "MEAS:CURR? (@{channel})"
"#;

fn record(seen: &mut Vec<(String, MeasuredQuantity)>) -> impl FnMut(&Sample<'_>) + '_ {
    move |sample| seen.push((sample.channel.name.clone(), sample.quantity))
}

#[test]
fn cycles_enabled_channels_in_order() {
    let profile = DeviceProfile::from_toml_str(PROFILE).unwrap();
    let channels = vec![
        Channel::new("A", true),
        Channel::new("B", false),
        Channel::new("C", true),
        Channel::new("D", false),
    ];
    let instrument = ScriptedInstrument {
        replies: (0..40).map(|i| i as f32).collect(),
        ..Default::default()
    };
    let mut pps = ScpiPps::new(instrument, &profile, channels);
    let mut seen = Vec::new();

    pps.start_acquisition().unwrap();
    {
        let mut sink = record(&mut seen);
        for _ in 0..40 {
            assert!(pps.receive_data(&mut sink).unwrap());
        }
    }

    assert_eq!(seen.len(), 40);
    for (i, (name, quantity)) in seen.iter().enumerate() {
        let expected_name = if (i / 2) % 2 == 0 { "A" } else { "C" };
        let expected_quantity = if i % 2 == 0 {
            MeasuredQuantity::Voltage
        } else {
            MeasuredQuantity::Current
        };
        assert_eq!(name, expected_name);
        assert_eq!(*quantity, expected_quantity);
    }

    // Never more than the one query in flight.
    let sent = &pps.transport().sent;
    assert_eq!(sent.len(), 41);
    assert_eq!(sent[0], "MEAS:VOLT? (@A)");
    assert_eq!(sent[1], "MEAS:CURR? (@A)");
    assert_eq!(sent[2], "MEAS:VOLT? (@C)");
    assert!(sent.iter().all(|command| !command.contains("@B") && !command.contains("@D")));
}

#[test]
fn link_failure_is_reported_and_state_kept() {
    let profile = DeviceProfile::from_toml_str(PROFILE).unwrap();
    let instrument = ScriptedInstrument {
        replies: [1.0, 2.0].into_iter().collect(),
        ..Default::default()
    };
    let mut pps = ScpiPps::with_default_channels(instrument, &profile);
    let mut seen = Vec::new();

    pps.start_acquisition().unwrap();
    pps.transport_mut().link_down = true;

    let result = pps.receive_data(&mut record(&mut seen));
    assert!(matches!(result, Err(Error::SerialError(LinkDown))));
    assert_eq!(pps.poll_state(), PollState::AwaitingCurrent);
    assert_eq!(pps.current_channel().unwrap().name, "A");

    // Once the link is back the loop carries on where it was.
    pps.transport_mut().link_down = false;
    pps.transport_mut().ready = 1;
    assert!(pps.receive_data(&mut record(&mut seen)).unwrap());
    assert_eq!(
        seen,
        [
            ("A".to_string(), MeasuredQuantity::Voltage),
            ("A".to_string(), MeasuredQuantity::Current)
        ]
    );
    assert_eq!(pps.current_channel().unwrap().name, "B");
}

#[test]
fn stopped_device_ignores_callbacks() {
    let profile = DeviceProfile::from_toml_str(PROFILE).unwrap();
    let instrument = ScriptedInstrument {
        replies: [1.0].into_iter().collect(),
        ready: 1,
        ..Default::default()
    };
    let mut pps = ScpiPps::with_default_channels(instrument, &profile);
    let mut seen = Vec::new();

    for _ in 0..5 {
        assert!(pps.receive_data(&mut record(&mut seen)).unwrap());
    }
    assert!(seen.is_empty());
    assert!(pps.transport().sent.is_empty());
    assert_eq!(pps.transport().replies.len(), 1);
}
