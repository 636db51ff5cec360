use thiserror::Error;
/// Failures of the serial link and the reader task.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("failed to open {port} at {baud} baud: {source}")]
    Open {
        port: String,
        baud: u32,
        #[source]
        source: serialport::Error,
    },
    #[error("no serial port selected")]
    NoPortSelected,
    #[error("serial read failed: {0}")]
    Read(#[from] std::io::Error),
    #[error("already connected to {0}; disconnect first")]
    AlreadyConnected(String),
    #[error("not connected")]
    NotConnected,
    #[error("reader thread could not be started: {0}")]
    Spawn(String),
    #[error("reader thread panicked")]
    ReaderPanicked,
    #[error("failed to enumerate serial ports: {0}")]
    Enumerate(#[source] serialport::Error),
}
/// Why a received line was not turned into a sample.
#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    #[error("field count mismatch: expected {expected}, got {actual}")]
    FieldCount { expected: usize, actual: usize },
    #[error("field {index} is not a number: {field:?}")]
    InvalidNumber { index: usize, field: String },
}
#[derive(Debug, Error, PartialEq)]
pub enum RecorderError {
    #[error("unknown channel {channel}; {count} channels configured")]
    UnknownChannel { channel: usize, count: usize },
}
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("i/o error while exporting {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("csv encoding failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("label count mismatch: {logs} logs, {labels} labels")]
    LabelMismatch { logs: usize, labels: usize },
    #[error("nothing recorded yet")]
    Empty,
    #[error("failed to render plot: {0}")]
    Plot(String),
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for ExportError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        ExportError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for ExportError {
    fn from(value: image::ImageError) -> Self {
        ExportError::Plot(value.to_string())
    }
}
