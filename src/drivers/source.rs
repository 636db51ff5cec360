#[cfg(test)]
use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, ErrorKind, Read};
use std::thread;
use std::time::{Duration, Instant};
use rand::Rng;
use serialport::SerialPort;
use crate::drivers::AcquisitionError;
/// Something that yields newline-terminated text lines, one attempt at a time.
///
/// `Ok(None)` means nothing complete arrived within the read timeout; the
/// caller is expected to check for cancellation and try again.
pub trait LineSource: Send {
    fn read_line(&mut self) -> Result<Option<String>, AcquisitionError>;
    fn describe(&self) -> String;
}
/// Lists the serial ports currently present on the host.
pub fn available_ports() -> Result<Vec<String>, AcquisitionError> {
    let mut names: Vec<String> = serialport::available_ports()
        .map_err(AcquisitionError::Enumerate)?
        .into_iter()
        .map(|info| info.port_name)
        .collect();
    names.sort();
    Ok(names)
}
/// Splits a byte stream into lines. A line interrupted by a read timeout is
/// dropped together with the remainder that completes it later.
pub struct SerialLineSource<R = Box<dyn SerialPort>> {
    port_name: String,
    reader: BufReader<R>,
    line: Vec<u8>,
    resync: bool,
}
impl SerialLineSource {
    pub fn open(port_name: &str, baud: u32, timeout: Duration) -> Result<Self, AcquisitionError> {
        let port = serialport::new(port_name, baud)
            .timeout(timeout)
            .open()
            .map_err(|source| AcquisitionError::Open {
                port: port_name.to_string(),
                baud,
                source,
            })?;
        Ok(Self::from_reader(port_name, port))
    }
}
impl<R: Read> SerialLineSource<R> {
    pub fn from_reader(name: &str, reader: R) -> Self {
        Self {
            port_name: name.to_string(),
            reader: BufReader::new(reader),
            line: Vec::with_capacity(64),
            resync: false,
        }
    }
}
impl<R: Read + Send> LineSource for SerialLineSource<R> {
    fn read_line(&mut self) -> Result<Option<String>, AcquisitionError> {
        self.line.clear();
        match self.reader.read_until(b'\n', &mut self.line) {
            Ok(0) => Err(AcquisitionError::Read(io::Error::new(
                ErrorKind::UnexpectedEof,
                format!("{} closed", self.port_name),
            ))),
            // Trailing bytes of an interrupted line, or an unterminated
            // fragment right before end of stream.
            Ok(_) if self.resync || self.line.last() != Some(&b'\n') => {
                self.resync = false;
                Ok(None)
            }
            Ok(_) => Ok(Some(String::from_utf8_lossy(&self.line).into_owned())),
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                if !self.line.is_empty() {
                    self.resync = true;
                }
                Ok(None)
            }
            Err(e) => Err(AcquisitionError::Read(e)),
        }
    }
    fn describe(&self) -> String {
        self.port_name.clone()
    }
}
/// Fake device emitting well-formed lines with a slow random walk around
/// room temperature.
pub struct SimulatedSource {
    temperatures: Vec<f64>,
    interval: Duration,
    next_emit: Instant,
}
impl SimulatedSource {
    pub fn new(channels: usize, interval: Duration) -> Self {
        let temperatures = (0..channels).map(|i| 22.0 + i as f64 * 0.75).collect();
        Self {
            temperatures,
            interval,
            next_emit: Instant::now(),
        }
    }
    fn step(&mut self) -> String {
        let mut rng = rand::thread_rng();
        self.temperatures
            .iter_mut()
            .map(|t| {
                *t = (*t + rng.gen_range(-0.08..=0.08)).clamp(15.0, 35.0);
                format!("{:.2}", t)
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}
impl LineSource for SimulatedSource {
    fn read_line(&mut self) -> Result<Option<String>, AcquisitionError> {
        let now = Instant::now();
        if now < self.next_emit {
            thread::sleep(self.next_emit - now);
        }
        self.next_emit = Instant::now() + self.interval;
        Ok(Some(format!("{}\n", self.step())))
    }
    fn describe(&self) -> String {
        "simulated device".to_owned()
    }
}
/// Replays scripted lines, then either idles or reports a broken link.
#[cfg(test)]
pub struct ManualSource {
    lines: VecDeque<String>,
    fail_when_exhausted: bool,
}
#[cfg(test)]
impl ManualSource {
    pub fn new(lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            fail_when_exhausted: false,
        }
    }
    /// Reports a broken link once every scripted line has been read.
    pub fn then_fail(mut self) -> Self {
        self.fail_when_exhausted = true;
        self
    }
}
#[cfg(test)]
impl LineSource for ManualSource {
    fn read_line(&mut self) -> Result<Option<String>, AcquisitionError> {
        match self.lines.pop_front() {
            Some(line) => Ok(Some(line)),
            None if self.fail_when_exhausted => Err(AcquisitionError::Read(
                io::Error::new(ErrorKind::BrokenPipe, "device unplugged"),
            )),
            None => {
                thread::sleep(Duration::from_millis(2));
                Ok(None)
            }
        }
    }
    fn describe(&self) -> String {
        "manual source".to_owned()
    }
}
