use std::io::Cursor;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::LineSeries;
use plotters::prelude::*;
use crate::drivers::error::ExportError;
use crate::recorder::ChannelLog;
#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub palette: Vec<RGBColor>,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 900,
            height: 400,
            background: RGBColor(10, 10, 10),
            palette: vec![CYAN, YELLOW, MAGENTA, GREEN, RED, BLUE, WHITE],
        }
    }
}
/// Temperature range over every entry of the given logs, padded so a flat
/// trace still gets a visible axis.
fn value_bounds(logs: &[(&str, &ChannelLog)]) -> (f64, f64) {
    let (min, max) = logs
        .iter()
        .flat_map(|(_, log)| log.entries().iter().map(|e| e.value))
        .fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if (max - min).abs() < 0.5 {
        (min - 1.0, max + 1.0)
    } else {
        let pad = (max - min) * 0.05;
        (min - pad, max + pad)
    }
}
fn series_color(palette: &[RGBColor], idx: usize) -> RGBColor {
    if palette.is_empty() {
        WHITE
    } else {
        palette[idx % palette.len()]
    }
}
/// Renders every non-empty log as one line of temperature over elapsed time.
pub fn render_logs_png(
    logs: &[(&str, &ChannelLog)],
    style: PlotStyle,
) -> Result<Vec<u8>, ExportError> {
    let logs: Vec<(&str, &ChannelLog)> = logs
        .iter()
        .filter(|(_, log)| !log.is_empty())
        .copied()
        .collect();
    if logs.is_empty() {
        return Err(ExportError::Empty);
    }
    let x_max = logs
        .iter()
        .filter_map(|(_, log)| log.entries().last().map(|e| e.elapsed_s))
        .fold(1.0f64, f64::max);
    let (y_min, y_max) = value_bounds(&logs);
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption("Recorded Temperatures", ("sans-serif", 20).into_font().color(&WHITE))
            .set_label_area_size(LabelAreaPosition::Left, 45)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(0f64..x_max, y_min..y_max)?;
        chart
            .configure_mesh()
            .x_desc("Time (s)")
            .y_desc("Temperature (°C)")
            .label_style(("sans-serif", 12).into_font().color(&WHITE))
            .light_line_style(&WHITE.mix(0.1))
            .draw()?;
        for (idx, (label, log)) in logs.iter().enumerate() {
            let color = series_color(&style.palette, idx);
            let series = log.entries().iter().map(|e| (e.elapsed_s, e.value));
            chart
                .draw_series(LineSeries::new(series, &color))?
                .label(label.to_string())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
        }
        chart
            .configure_series_labels()
            .label_font(("sans-serif", 12).into_font().color(&WHITE))
            .border_style(&WHITE.mix(0.2))
            .background_style(&style.background)
            .draw()?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ExportError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| ExportError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
