use crate::clock::Micros;
use crate::midi::codec::message_length;
use crate::midi::{MidiError, MidiTransport, Result};
use crossbeam::channel::{unbounded, Receiver};
use log::{debug, info, warn};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};

/// Transport bound to the first input/output ports whose names contain `device_name`.
/// A missing device is not fatal: `maintain` keeps retrying.
pub struct MidirTransport {
    device_name: String,
    output: Option<MidiOutputConnection>,
    #[allow(dead_code)]
    input: Option<MidiInputConnection<()>>,
    rx: Option<Receiver<Vec<u8>>>,
    reconnect_interval: Micros,
    next_attempt: Micros,
    reported_absent: bool,
}

impl MidirTransport {
    pub fn new(device_name: String, reconnect_interval: Micros) -> Self {
        MidirTransport {
            device_name,
            output: None,
            input: None,
            rx: None,
            reconnect_interval,
            next_attempt: 0,
            reported_absent: false,
        }
    }

    pub fn connect(&mut self) -> Result<()> {
        let output = connect_output(&self.device_name)?;

        // Output-only devices are still useful; inbound sync is simply unavailable.
        match connect_input(&self.device_name) {
            Ok((input, rx)) => {
                self.input = Some(input);
                self.rx = Some(rx);
            }
            Err(e) => {
                warn!("No MIDI input for '{}': {}", self.device_name, e);
                self.input = None;
                self.rx = None;
            }
        }

        self.output = Some(output);
        self.reported_absent = false;
        info!("Connected to MIDI device '{}'", self.device_name);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.output = None;
        self.input = None;
        self.rx = None;
        warn!("Lost MIDI device '{}'", self.device_name);
    }
}

fn connect_output(device_name: &str) -> Result<MidiOutputConnection> {
    let midi_out = MidiOutput::new("pedalsyncrs-out")?;

    let out_ports = midi_out.ports();
    let out_port = out_ports
        .iter()
        .find(|p| {
            midi_out
                .port_name(p)
                .unwrap_or_default()
                .contains(device_name)
        })
        .ok_or_else(|| {
            MidiError::ConnectionError(format!("output device '{}' not found", device_name))
        })?;

    let port_name = midi_out.port_name(out_port)?;
    debug!("Connecting to MIDI output port: {}", port_name);
    Ok(midi_out.connect(out_port, "pedalsyncrs-output")?)
}

fn connect_input(device_name: &str) -> Result<(MidiInputConnection<()>, Receiver<Vec<u8>>)> {
    let mut midi_in = MidiInput::new("pedalsyncrs-in")?;
    // SysEx, clock and active sensing are of no use to the scanner.
    midi_in.ignore(Ignore::All);

    let in_ports = midi_in.ports();
    let in_port = in_ports
        .iter()
        .find(|p| midi_in.port_name(p).unwrap_or_default().contains(device_name))
        .ok_or_else(|| {
            MidiError::ConnectionError(format!("input device '{}' not found", device_name))
        })?;

    let (tx, rx) = unbounded();
    let input = midi_in.connect(
        in_port,
        "pedalsyncrs-input",
        move |_stamp, message, _| {
            let _ = tx.send(message.to_vec());
        },
        (),
    )?;
    Ok((input, rx))
}

impl MidiTransport for MidirTransport {
    fn is_connected(&self) -> bool {
        self.output.is_some()
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<usize> {
        let Some(output) = self.output.as_mut() else {
            return Ok(0);
        };

        // midir sends whole messages, so split the stream at message boundaries.
        let mut written = 0;
        while written < bytes.len() {
            let end = (written + message_length(bytes[written])).min(bytes.len());
            if let Err(e) = output.send(&bytes[written..end]) {
                self.disconnect();
                if written == 0 {
                    return Err(e.into());
                }
                warn!("MIDI send failed after {} byte(s): {}", written, e);
                break;
            }
            written = end;
        }
        Ok(written)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn poll_inbound(&mut self, on_bytes_received: &mut dyn FnMut(&[u8])) {
        if let Some(rx) = &self.rx {
            for chunk in rx.try_iter() {
                on_bytes_received(&chunk);
            }
        }
    }

    fn maintain(&mut self, now: Micros) {
        if self.output.is_some() || now < self.next_attempt {
            return;
        }
        self.next_attempt = now + self.reconnect_interval;

        if let Err(e) = self.connect() {
            if self.reported_absent {
                debug!("Reconnect attempt failed: {}", e);
            } else {
                warn!("MIDI device unavailable, will keep retrying: {}", e);
                self.reported_absent = true;
            }
        }
    }
}

/// Names of every MIDI output port currently visible.
pub fn list_output_ports() -> Result<Vec<String>> {
    let midi_out = MidiOutput::new("pedalsyncrs-port-lister")?;
    let ports = midi_out.ports();
    Ok(ports
        .iter()
        .filter_map(|p| midi_out.port_name(p).ok())
        .collect())
}
