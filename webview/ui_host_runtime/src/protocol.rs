use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{self, Read, Write};
use std::sync::mpsc::Receiver;
use tracing::warn;

use crate::binder::InteractionKind;

pub const UI_TO_HOST_CAP: usize = 65_536;
pub const HOST_TO_UI_CAP: usize = 1_048_576;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "t")]
pub enum UiEnvelope {
    #[serde(rename = "event")]
    Event { name: String, payload: Value },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "t")]
pub enum HostEnvelope {
    #[serde(rename = "event")]
    Event {
        name: String,
        #[serde(default)]
        payload: Option<Value>,
    },

    /// Synthetic user input against an element id.
    #[serde(rename = "input")]
    Input {
        target: String,
        #[serde(default)]
        kind: InteractionKind,
        #[serde(default)]
        value: Option<String>,
    },
}

pub fn event_envelope(name: impl Into<String>, payload: Value) -> UiEnvelope {
    UiEnvelope::Event {
        name: name.into(),
        payload,
    }
}

pub fn writer_loop(rx: Receiver<UiEnvelope>) -> io::Result<()> {
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    write_envelopes(&mut writer, rx)
}

pub fn write_envelopes(writer: &mut impl Write, rx: Receiver<UiEnvelope>) -> io::Result<()> {
    for envelope in rx {
        write_envelope(writer, &envelope)?;
        writer.flush()?;
    }

    Ok(())
}

pub fn reader_loop<F>(on_envelope: F) -> io::Result<()>
where
    F: FnMut(HostEnvelope) -> bool,
{
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    read_envelopes(&mut reader, on_envelope)
}

/// Read frames until EOF or until `on_envelope` returns `false`.
///
/// Frames that are not valid envelopes are skipped; framing errors end the
/// loop.
pub fn read_envelopes<F>(reader: &mut impl Read, mut on_envelope: F) -> io::Result<()>
where
    F: FnMut(HostEnvelope) -> bool,
{
    loop {
        match read_frame(reader, HOST_TO_UI_CAP) {
            Ok(payload) => match decode_host_envelope(&payload) {
                Ok(envelope) => {
                    if !on_envelope(envelope) {
                        return Ok(());
                    }
                }
                Err(err) => warn!(error = %err, len = payload.len(), "skipping undecodable frame"),
            },
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(err) => return Err(err),
        }
    }
}

fn decode_host_envelope(payload: &[u8]) -> io::Result<HostEnvelope> {
    serde_json::from_slice(payload).map_err(invalid_data)
}

/// Serialize and frame one envelope. Nothing is written when it is over cap.
fn write_envelope(writer: &mut impl Write, envelope: &UiEnvelope) -> io::Result<()> {
    let body = serde_json::to_vec(envelope).map_err(invalid_data)?;
    let len = frame_len(body.len(), UI_TO_HOST_CAP)?;

    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(&body)
}

fn read_frame(reader: &mut impl Read, cap: usize) -> io::Result<Vec<u8>> {
    let mut prefix = [0_u8; 4];
    reader.read_exact(&mut prefix)?;
    let len = u32::from_be_bytes(prefix) as usize;
    frame_len(len, cap)?;

    let mut body = vec![0_u8; len];
    reader.read_exact(&mut body)?;
    Ok(body)
}

/// Length prefix for a body of `len` bytes, refusing anything over `cap`.
fn frame_len(len: usize, cap: usize) -> io::Result<u32> {
    if len > cap {
        return Err(invalid_data(format!("frame of {len} bytes exceeds cap {cap}")));
    }
    u32::try_from(len).map_err(invalid_data)
}

fn invalid_data(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err)
}
