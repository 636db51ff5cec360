use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use chrono::Local;
use log::{info, warn};
use crate::drivers::ExportError;
use crate::recorder::ChannelLog;
pub const CSV_HEADER: [&str; 5] = ["Title", "Sensor", "Time (s)", "Temp (°C)", "Timestamp"];
/// Writes one row per (channel, entry) in channel order, then log order.
/// Returns the number of data rows written.
pub fn write_csv<W: Write>(
    writer: W,
    logs: &[&ChannelLog],
    labels: &[String],
) -> Result<usize, ExportError> {
    if logs.len() != labels.len() {
        return Err(ExportError::LabelMismatch {
            logs: logs.len(),
            labels: labels.len(),
        });
    }
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(CSV_HEADER)?;
    let mut rows = 0;
    for (index, (log, label)) in logs.iter().zip(labels).enumerate() {
        let sensor = format!("Sensor {}", index + 1);
        for entry in log.entries() {
            let elapsed = format!("{:.1}", entry.elapsed_s);
            let value = format!("{:.2}", entry.value);
            csv_writer.write_record([
                label.as_str(),
                sensor.as_str(),
                elapsed.as_str(),
                value.as_str(),
                entry.wall_clock.as_str(),
            ])?;
            rows += 1;
        }
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(rows)
}
/// Exports the logs to `path`. The previous content of `path` is only
/// replaced once the new file has been written completely.
pub fn export_csv(path: &Path, logs: &[&ChannelLog], labels: &[String]) -> Result<usize, ExportError> {
    let mut rows = 0;
    write_atomically(path, |file| {
        rows = write_csv(file, logs, labels)?;
        Ok(())
    })?;
    info!("exported {} rows to {}", rows, path.display());
    Ok(rows)
}
/// Writes through a temporary sibling file and renames it over `path`.
/// On failure the temporary file is removed and `path` is left untouched.
pub fn write_atomically<F>(path: &Path, write: F) -> Result<(), ExportError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), ExportError>,
{
    let io_err = |source: io::Error| ExportError::Io {
        path: path.display().to_string(),
        source,
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| io_err(io::Error::new(io::ErrorKind::InvalidInput, "not a file path")))?;
    let tmp = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));
    let result = File::create(&tmp).map_err(io_err).and_then(|file| {
        let mut writer = BufWriter::new(file);
        write(&mut writer)?;
        let file = writer.into_inner().map_err(|e| io_err(e.into_error()))?;
        file.sync_all().map_err(io_err)?;
        drop(file);
        fs::rename(&tmp, path).map_err(io_err)
    });
    if let Err(e) = &result {
        warn!("export to {} failed: {}", path.display(), e);
        let _ = fs::remove_file(&tmp);
    }
    result
}
/// `<dir>/thermolog_<YYYYmmdd_HHMMSS>.<extension>`
pub fn default_export_path(dir: &Path, extension: &str) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("thermolog_{stamp}.{extension}"))
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::Sample;
    use crate::recorder::Recorder;
    fn recorded(counts: &[u32]) -> Recorder {
        let mut recorder = Recorder::new(counts.len());
        for channel in 0..counts.len() {
            recorder.start(channel, 0.0, 0.0).unwrap();
        }
        let longest = counts.iter().copied().max().unwrap_or(0);
        for t in 0..longest {
            for (channel, &count) in counts.iter().enumerate() {
                if t == count {
                    recorder.stop(channel).unwrap();
                }
            }
            let values = (0..counts.len()).map(|c| 20.0 + c as f64 + t as f64 * 0.25).collect();
            recorder.ingest(&Sample::new(100.0 + t as f64 * 1.5, values));
        }
        recorder
    }
    fn export_to_string(recorder: &Recorder, labels: &[&str]) -> (usize, String) {
        let logs: Vec<&ChannelLog> = recorder.logs().collect();
        let labels: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
        let mut out = Vec::new();
        let rows = write_csv(&mut out, &logs, &labels).unwrap();
        (rows, String::from_utf8(out).unwrap())
    }
    #[test]
    fn empty_channel_contributes_no_rows() {
        let recorder = recorded(&[3, 0]);
        let (rows, text) = export_to_string(&recorder, &["run A", "run B"]);
        assert_eq!(rows, 3);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Title,Sensor,Time (s),Temp (°C),Timestamp");
        assert!(lines[1].starts_with("run A,Sensor 1,0.0,20.00,"));
        assert!(lines[2].starts_with("run A,Sensor 1,1.5,20.25,"));
        assert!(lines[3].starts_with("run A,Sensor 1,3.0,20.50,"));
    }
    #[test]
    fn rows_follow_channel_then_log_order() {
        let recorder = recorded(&[1, 2]);
        let (rows, text) = export_to_string(&recorder, &["a", "b"]);
        assert_eq!(rows, 3);
        let sensors: Vec<&str> = text
            .lines()
            .skip(1)
            .map(|l| l.split(',').nth(1).unwrap())
            .collect();
        assert_eq!(sensors, vec!["Sensor 1", "Sensor 2", "Sensor 2"]);
    }
    #[test]
    fn labels_with_commas_are_quoted() {
        let recorder = recorded(&[1]);
        let (_, text) = export_to_string(&recorder, &["oven, shelf 2"]);
        assert!(text.lines().nth(1).unwrap().starts_with("\"oven, shelf 2\",Sensor 1,"));
    }
    #[test]
    fn label_count_must_match() {
        let recorder = recorded(&[1, 1]);
        let logs: Vec<&ChannelLog> = recorder.logs().collect();
        let result = write_csv(Vec::new(), &logs, &["only one".to_string()]);
        assert!(matches!(result, Err(ExportError::LabelMismatch { logs: 2, labels: 1 })));
    }
    #[test]
    fn export_replaces_target_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "old").unwrap();
        let recorder = recorded(&[2]);
        let logs: Vec<&ChannelLog> = recorder.logs().collect();
        let rows = export_csv(&path, &logs, &["x".to_string()]).unwrap();
        assert_eq!(rows, 2);
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
    #[test]
    fn unwritable_destination_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        let recorder = recorded(&[1]);
        let logs: Vec<&ChannelLog> = recorder.logs().collect();
        let result = export_csv(&path, &logs, &["x".to_string()]);
        assert!(matches!(result, Err(ExportError::Io { .. })));
        assert!(!path.exists());
    }
    #[test]
    fn failed_write_keeps_previous_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "previous").unwrap();
        let result = write_atomically(&path, |w| {
            w.write_all(b"partial").map_err(|source| ExportError::Io {
                path: String::new(),
                source,
            })?;
            Err(ExportError::Empty)
        });
        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "previous");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
    #[test]
    fn default_path_uses_timestamped_name() {
        let path = default_export_path(Path::new("logs"), "csv");
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("thermolog_"));
        assert!(name.ends_with(".csv"));
        assert_eq!(name.len(), "thermolog_20240101_120000.csv".len());
    }
}
