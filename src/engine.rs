// src/engine.rs
use std::path::Path;
use std::time::Duration;
use log::{info, warn};
use crate::config::{AppConfig, ChannelSettings};
use crate::drivers::{
    render_logs_png, AcquisitionError, ExportError, LineSource, PlotStyle, ReaderHandle,
    RecorderError, Sample, SampleQueue, SerialLineSource, SimulatedSource,
};
use crate::exporter;
use crate::recorder::{ChannelLog, Recorder};
use crate::types::{BaudRate, ConnectionMode};

// What to open on connect
#[derive(Clone, Debug, PartialEq)]
pub enum ConnectTarget {
    Serial { port: String, baud: BaudRate },
    Simulated { interval: Duration },
}

impl ConnectTarget {
    pub fn from_config(config: &AppConfig) -> Result<Self, AcquisitionError> {
        match config.mode {
            ConnectionMode::Simulation => Ok(ConnectTarget::Simulated {
                interval: Duration::from_secs(1),
            }),
            ConnectionMode::Hardware => {
                let port = config
                    .port
                    .clone()
                    .filter(|p| !p.trim().is_empty())
                    .ok_or(AcquisitionError::NoPortSelected)?;
                Ok(ConnectTarget::Serial {
                    port,
                    baud: config.baud,
                })
            }
        }
    }
}

pub enum ConnectionState {
    Disconnected,
    Connected(ReaderHandle),
}

/// Result of one foreground tick.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Samples drained this tick, in arrival order.
    pub samples: Vec<Sample>,
    /// Channels that reached their max duration during this tick.
    pub auto_stopped: Vec<usize>,
    /// Set when the reader ended on its own; the engine is now disconnected.
    pub link_error: Option<AcquisitionError>,
}

/// Explicitly owned acquisition state: one connection, the sample queue
/// shared with its reader thread, and the per-channel recorder.
pub struct Engine {
    channels: usize,
    read_timeout: Duration,
    queue: SampleQueue,
    recorder: Recorder,
    connection: ConnectionState,
    // Reader signalled by `disconnect` but not yet joined.
    retiring: Option<ReaderHandle>,
}

impl Engine {
    pub fn new(channels: usize, read_timeout: Duration) -> Self {
        Self {
            channels,
            read_timeout,
            queue: SampleQueue::new(),
            recorder: Recorder::new(channels),
            connection: ConnectionState::Disconnected,
            retiring: None,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.channel_count(), config.read_timeout())
    }

    pub fn num_channels(&self) -> usize {
        self.channels
    }

    pub fn connect(&mut self, target: &ConnectTarget) -> Result<(), AcquisitionError> {
        if let ConnectionState::Connected(reader) = &self.connection {
            return Err(AcquisitionError::AlreadyConnected(reader.source_name().to_owned()));
        }
        match target {
            ConnectTarget::Serial { port, baud } => {
                self.reap_retired();
                let source = SerialLineSource::open(port, baud.as_u32(), self.read_timeout)?;
                self.attach(source)
            }
            ConnectTarget::Simulated { interval } => {
                self.attach(SimulatedSource::new(self.channels, *interval))
            }
        }
    }

    /// Starts a reader over an already opened source.
    pub fn attach<S: LineSource + 'static>(&mut self, source: S) -> Result<(), AcquisitionError> {
        if let ConnectionState::Connected(reader) = &self.connection {
            return Err(AcquisitionError::AlreadyConnected(reader.source_name().to_owned()));
        }
        self.reap_retired();
        let reader = ReaderHandle::spawn(source, self.channels, self.queue.clone())?;
        info!("connected to {}", reader.source_name());
        self.connection = ConnectionState::Connected(reader);
        Ok(())
    }

    /// Signals the reader to stop without waiting for it.
    pub fn disconnect(&mut self) -> Result<(), AcquisitionError> {
        match std::mem::replace(&mut self.connection, ConnectionState::Disconnected) {
            ConnectionState::Connected(reader) => {
                reader.signal_stop();
                info!("disconnecting from {}", reader.source_name());
                self.retiring = Some(reader);
                Ok(())
            }
            ConnectionState::Disconnected => Err(AcquisitionError::NotConnected),
        }
    }

    fn reap_retired(&mut self) {
        if let Some(reader) = self.retiring.take() {
            if let Err(e) = reader.join() {
                warn!("previous reader ended with error: {}", e);
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.connection, ConnectionState::Connected(_))
    }

    pub fn connected_to(&self) -> Option<&str> {
        match &self.connection {
            ConnectionState::Connected(reader) => Some(reader.source_name()),
            ConnectionState::Disconnected => None,
        }
    }

    /// Drains everything the reader produced since the last tick, feeds it
    /// to the recorder, and reports a reader that died on its own.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport {
            samples: self.queue.drain_all(),
            ..Default::default()
        };
        for sample in &report.samples {
            report.auto_stopped.extend(self.recorder.ingest(sample));
        }
        let reader_died = matches!(&self.connection, ConnectionState::Connected(r) if r.is_finished());
        if reader_died {
            if let ConnectionState::Connected(reader) =
                std::mem::replace(&mut self.connection, ConnectionState::Disconnected)
            {
                let name = reader.source_name().to_owned();
                report.link_error = Some(match reader.join() {
                    Err(e) => e,
                    Ok(_) => AcquisitionError::Read(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        format!("{name} closed"),
                    )),
                });
            }
        }
        if let Some(reader) = &self.retiring {
            if reader.is_finished() {
                self.reap_retired();
            }
        }
        report
    }

    /// Display-side view of the most recent sample.
    pub fn latest(&self) -> Option<Sample> {
        self.queue.latest()
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn start_recording(
        &mut self,
        channel: usize,
        settings: &ChannelSettings,
    ) -> Result<(), RecorderError> {
        self.recorder
            .start(channel, settings.period_secs(), settings.max_duration_secs())
    }

    pub fn stop_recording(&mut self, channel: usize) -> Result<(), RecorderError> {
        self.recorder.stop(channel)
    }

    pub fn start_all(&mut self, settings: &[ChannelSettings]) -> Result<(), RecorderError> {
        for (channel, settings) in settings.iter().enumerate() {
            self.start_recording(channel, settings)?;
        }
        Ok(())
    }

    pub fn stop_all(&mut self) {
        self.recorder.stop_all();
    }

    pub fn export_csv(&self, path: &Path, labels: &[String]) -> Result<usize, ExportError> {
        let logs: Vec<&ChannelLog> = self.recorder.logs().collect();
        exporter::export_csv(path, &logs, labels)
    }

    pub fn save_plot(&self, path: &Path, labels: &[String]) -> Result<(), ExportError> {
        let logs: Vec<(&str, &ChannelLog)> = self
            .recorder
            .logs()
            .zip(labels)
            .map(|(log, label)| (label.as_str(), log))
            .collect();
        let png = render_logs_png(&logs, PlotStyle::default())?;
        exporter::write_atomically(path, |w| {
            use std::io::Write;
            w.write_all(&png).map_err(|source| ExportError::Io {
                path: path.display().to_string(),
                source,
            })
        })?;
        info!("saved plot to {}", path.display());
        Ok(())
    }
}
