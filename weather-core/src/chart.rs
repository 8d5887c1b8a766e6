//! PNG line charts of one history column over time.

use std::{io::Cursor, path::Path, sync::OnceLock};

use chrono::{Duration, NaiveDateTime};
use plotters::{
    coord::types::RangedDateTime,
    prelude::*,
    style::{FontStyle, FontTransform},
};

use crate::{
    error::{Result, WeatherError},
    model::{ChartField, HistoryRow},
};

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 600;
const FONT_FAMILY: &str = "sans-serif";

/// DejaVu Sans, used when no font file is configured.
static BUNDLED_FONT: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Set once any font is registered under `FONT_FAMILY`.
static FONT_READY: OnceLock<()> = OnceLock::new();

type DrawResult = std::result::Result<(), Box<dyn std::error::Error>>;

/// Register the TTF/OTF font used for chart text, replacing the bundled one.
pub fn register_font(path: &Path) -> Result<()> {
    let bytes = std::fs::read(path)
        .map_err(|e| WeatherError::Chart(format!("cannot read font {}: {e}", path.display())))?;

    // plotters keeps registered fonts for the life of the process.
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    plotters::style::register_font(FONT_FAMILY, FontStyle::Normal, bytes)
        .map_err(|_| WeatherError::Chart(format!("invalid font file {}", path.display())))?;
    let _ = FONT_READY.set(());

    tracing::info!(font = %path.display(), "registered chart font");
    Ok(())
}

/// Make sure some font is registered, falling back to the bundled one.
fn ensure_font() {
    FONT_READY.get_or_init(|| {
        if plotters::style::register_font(FONT_FAMILY, FontStyle::Normal, BUNDLED_FONT).is_err() {
            tracing::warn!("bundled chart font failed to load");
        }
    });
}

/// Render `field` from `rows` as PNG bytes. `Ok(None)` when there are no rows.
///
/// A single unparsable value or timestamp fails the whole chart.
pub fn render(field: ChartField, rows: &[HistoryRow]) -> Result<Option<Vec<u8>>> {
    if rows.is_empty() {
        return Ok(None);
    }

    let mut points = rows
        .iter()
        .map(|row| -> Result<(NaiveDateTime, f64)> { Ok((row.timestamp()?, row.numeric(field)?)) })
        .collect::<Result<Vec<_>>>()?;
    points.sort_by_key(|(ts, _)| *ts);

    ensure_font();
    let mut buffer = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
    if let Err(err) = draw(&mut buffer, &points, field, true) {
        tracing::warn!(error = %err, "chart text unavailable, drawing without labels");
        draw(&mut buffer, &points, field, false)
            .map_err(|e| WeatherError::Chart(e.to_string()))?;
    }

    encode_png(buffer).map(Some)
}

fn draw(
    buffer: &mut [u8],
    points: &[(NaiveDateTime, f64)],
    field: ChartField,
    labelled: bool,
) -> DrawResult {
    let root = BitMapBackend::with_buffer(buffer, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    let (start, end) = time_range(points);
    let (low, high) = value_range(points);

    let mut builder = ChartBuilder::on(&root);
    builder.margin(20);
    if labelled {
        builder
            .caption(
                format!("{} Over Time", field.title()),
                (FONT_FAMILY, 30).into_font(),
            )
            .x_label_area_size(120)
            .y_label_area_size(70);
    }

    let mut chart = builder.build_cartesian_2d(RangedDateTime::from(start..end), low..high)?;

    let time_label = |ts: &NaiveDateTime| ts.format("%Y-%m-%d %H:%M").to_string();
    let mut mesh = chart.configure_mesh();
    mesh.light_line_style(BLACK.mix(0.05))
        .bold_line_style(BLACK.mix(0.15));
    if labelled {
        mesh.x_desc("Date & Time")
            .y_desc(field.title())
            .x_labels(8)
            .x_label_formatter(&time_label)
            .x_label_style(
                (FONT_FAMILY, 13)
                    .into_font()
                    .transform(FontTransform::Rotate90),
            );
    }
    mesh.draw()?;

    chart.draw_series(LineSeries::new(points.iter().copied(), BLUE.stroke_width(2)))?;
    chart.draw_series(
        points
            .iter()
            .map(|&(ts, value)| Circle::new((ts, value), 4, BLUE.filled())),
    )?;

    root.present()?;
    Ok(())
}

fn time_range(points: &[(NaiveDateTime, f64)]) -> (NaiveDateTime, NaiveDateTime) {
    let first = points[0].0;
    let last = points[points.len() - 1].0;
    if first == last {
        (first - Duration::hours(1), last + Duration::hours(1))
    } else {
        (first, last)
    }
}

fn value_range(points: &[(NaiveDateTime, f64)]) -> (f64, f64) {
    let (min, max) = points.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(min, max), (_, v)| (min.min(*v), max.max(*v)),
    );
    let padding = if (max - min).abs() > 1e-6 {
        (max - min) * 0.1
    } else {
        1.0
    };
    (min - padding, max + padding)
}

fn encode_png(buffer: Vec<u8>) -> Result<Vec<u8>> {
    let image = image::RgbImage::from_raw(WIDTH, HEIGHT, buffer)
        .ok_or_else(|| WeatherError::Chart("pixel buffer has the wrong size".to_string()))?;

    let mut png = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut png, image::ImageOutputFormat::Png)
        .map_err(|e| WeatherError::Chart(e.to_string()))?;

    Ok(png.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn row(time: &str, temperature: &str) -> HistoryRow {
        HistoryRow {
            city: "Madrid".into(),
            temperature: temperature.into(),
            humidity: "40".into(),
            wind_speed: "5.5".into(),
            date: "2024-08-10".into(),
            time: time.into(),
            description: "clear sky".into(),
            icon: "01d".into(),
        }
    }

    #[test]
    fn empty_rows_render_nothing() {
        assert!(render(ChartField::Temperature, &[]).unwrap().is_none());
    }

    #[test]
    fn single_row_renders_png() {
        let png = render(ChartField::Temperature, &[row("14:00:00", "31.2")])
            .unwrap()
            .expect("chart bytes");
        assert!(png.starts_with(&PNG_MAGIC));
    }

    #[test]
    fn series_renders_png() {
        let rows = vec![
            row("09:00:00", "24"),
            row("12:00:00", "29.5"),
            row("15:00:00", "33.1"),
        ];
        let png = render(ChartField::WindSpeed, &rows).unwrap().expect("chart bytes");
        assert!(png.len() > PNG_MAGIC.len());
    }

    #[test]
    fn labelled_chart_draws_with_default_font() {
        ensure_font();
        let ts = row("09:00:00", "24").timestamp().unwrap();
        let points = [(ts, 24.0), (ts + Duration::hours(3), 29.5)];
        let mut buffer = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
        draw(&mut buffer, &points, ChartField::Temperature, true)
            .expect("labelled chart should draw with the bundled font");
    }

    #[test]
    fn missing_font_file_is_reported() {
        let err = register_font(Path::new("/nonexistent/font.ttf")).unwrap_err();
        assert!(matches!(err, WeatherError::Chart(_)));
    }

    #[test]
    fn unparsable_value_fails_whole_chart() {
        let rows = vec![row("09:00:00", "24"), row("12:00:00", "hot")];
        let err = render(ChartField::Temperature, &rows).unwrap_err();
        assert!(matches!(err, WeatherError::MalformedRow(_)));
    }

    #[test]
    fn flat_series_gets_padded_range() {
        let ts = row("09:00:00", "10").timestamp().unwrap();
        let (low, high) = value_range(&[(ts, 10.0), (ts, 10.0)]);
        assert_eq!((low, high), (9.0, 11.0));
        let (start, end) = time_range(&[(ts, 10.0)]);
        assert_eq!(end - start, Duration::hours(2));
    }
}
