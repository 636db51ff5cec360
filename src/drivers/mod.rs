// Acquisition plumbing: line sources, frame parsing, the sample hand-off
// queue and the reader thread, plus live history and PNG rendering.
pub mod buffer;
pub mod error;
pub mod plot;
pub mod queue;
pub mod reader;
pub mod sample;
pub mod source;
pub use buffer::LiveHistory;
pub use error::{AcquisitionError, ExportError, FrameError, RecorderError};
pub use plot::{render_logs_png, PlotStyle};
pub use queue::SampleQueue;
pub use reader::ReaderHandle;
pub use sample::{parse_frame, Sample};
#[cfg(test)]
pub use source::ManualSource;
pub use source::{available_ports, LineSource, SerialLineSource, SimulatedSource};
