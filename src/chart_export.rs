use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use image::{ColorType, ImageFormat};
use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;

use crate::state::ChartState;

pub const CHART_WIDTH: u32 = 800;
pub const CHART_HEIGHT: u32 = 500;

const BAR_GRAY: RGBColor = RGBColor(128, 128, 128);
const BAR_HALF_WIDTH: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Png => "PNG",
            ExportFormat::Pdf => "PDF",
        }
    }

    pub fn next(self) -> Self {
        match self {
            ExportFormat::Png => ExportFormat::Pdf,
            ExportFormat::Pdf => ExportFormat::Png,
        }
    }
}

/// Turns the dialog's filename into a target path. Relative names land in
/// `dir`; a name without an extension gets the format's.
pub fn resolve_export_path(dir: &Path, filename: &str, format: ExportFormat) -> PathBuf {
    let name = filename.trim();
    let name = if name.is_empty() {
        format!("chart.{}", format.extension())
    } else if Path::new(name).extension().is_none() {
        format!("{name}.{}", format.extension())
    } else {
        name.to_string()
    };

    let candidate = PathBuf::from(name);
    if candidate.is_absolute() {
        candidate
    } else {
        dir.join(candidate)
    }
}

/// Writes `chart` to `path` in `format`, creating missing parent directories.
pub fn export_chart(chart: &ChartState, path: &Path, format: ExportFormat) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create export dir {}", parent.display()))?;
    }

    match format {
        // The encoder is fixed by `format`; the file's extension never picks it.
        ExportFormat::Png => {
            let rgb = render_rgb(chart)?;
            image::save_buffer_with_format(
                path,
                &rgb,
                CHART_WIDTH,
                CHART_HEIGHT,
                ColorType::Rgb8,
                ImageFormat::Png,
            )
            .with_context(|| format!("write {}", path.display()))?;
        }
        ExportFormat::Pdf => {
            let rgb = render_rgb(chart)?;
            let bytes = pdf_with_image(&rgb, CHART_WIDTH, CHART_HEIGHT);
            fs::write(path, bytes).with_context(|| format!("write {}", path.display()))?;
        }
    }
    Ok(())
}

fn render_rgb(chart: &ChartState) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; (CHART_WIDTH * CHART_HEIGHT * 3) as usize];
    {
        let root =
            BitMapBackend::with_buffer(&mut buf, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
        draw_chart(&root, chart).map_err(render_err)?;
        root.present().map_err(render_err)?;
    }
    Ok(buf)
}

fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    chart: &ChartState,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    let mut title = chart.title.lines();
    let heading = title.next().unwrap_or_default();
    let subtitle = title.next().unwrap_or_default();
    let area = root.titled(heading, ("sans-serif", 24))?;

    let x_max = chart.distribution.max_goals as f64 + 0.5;
    let y_max = chart
        .distribution
        .pmf
        .iter()
        .copied()
        .fold(0.0_f64, f64::max)
        .max(0.01)
        * 1.15;

    let mut ctx = ChartBuilder::on(&area)
        .caption(subtitle, ("sans-serif", 18))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5..x_max, 0.0..y_max)?;

    ctx.configure_mesh()
        .x_desc("Goals")
        .y_desc("Probability")
        .draw()?;

    let highlighted = chart.highlighted_index();
    ctx.draw_series(chart.bars().map(|(goals, p)| {
        let color = if highlighted == Some(goals as usize) {
            RED
        } else {
            BAR_GRAY
        };
        let x = goals as f64;
        Rectangle::new(
            [(x - BAR_HALF_WIDTH, 0.0), (x + BAR_HALF_WIDTH, p)],
            color.filled(),
        )
    }))?;

    ctx.draw_series(LineSeries::new(
        chart.bars().map(|(goals, p)| (goals as f64, p)),
        BLUE.stroke_width(2),
    ))?;

    Ok(())
}

/// Single-page PDF sized to the chart, holding the raster as an RGB image.
fn pdf_with_image(rgb: &[u8], width: u32, height: u32) -> Vec<u8> {
    let catalog_id = Ref::new(1);
    let page_tree_id = Ref::new(2);
    let page_id = Ref::new(3);
    let image_id = Ref::new(4);
    let content_id = Ref::new(5);
    let image_name = Name(b"Chart");
    let (w, h) = (width as f32, height as f32);

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id).kids([page_id]).count(1);

    let mut page = pdf.page(page_id);
    page.media_box(Rect::new(0.0, 0.0, w, h));
    page.parent(page_tree_id);
    page.contents(content_id);
    page.resources().x_objects().pair(image_name, image_id);
    page.finish();

    let mut image = pdf.image_xobject(image_id, rgb);
    image.width(width as i32);
    image.height(height as i32);
    image.color_space().device_rgb();
    image.bits_per_component(8);
    image.finish();

    let mut content = Content::new();
    content.save_state();
    content.transform([w, 0.0, 0.0, h, 0.0, 0.0]);
    content.x_object(image_name);
    content.restore_state();
    pdf.stream(content_id, &content.finish());

    pdf.finish()
}

fn render_err(err: impl std::fmt::Display) -> anyhow::Error {
    anyhow!("chart render failed: {err}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binom::{AnalysisInput, compute_distribution};

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

    #[test]
    fn resolves_relative_names_against_export_dir() {
        let dir = Path::new("/tmp/exports");
        assert_eq!(
            resolve_export_path(dir, "chart.png", ExportFormat::Png),
            PathBuf::from("/tmp/exports/chart.png")
        );
        assert_eq!(
            resolve_export_path(dir, " kane ", ExportFormat::Pdf),
            PathBuf::from("/tmp/exports/kane.pdf")
        );
        assert_eq!(
            resolve_export_path(dir, "", ExportFormat::Pdf),
            PathBuf::from("/tmp/exports/chart.pdf")
        );
    }

    #[test]
    fn absolute_names_ignore_export_dir() {
        let target = std::env::temp_dir().join("season.png");
        let resolved = resolve_export_path(
            Path::new("elsewhere"),
            target.to_str().unwrap(),
            ExportFormat::Png,
        );
        assert_eq!(resolved, target);
    }

    #[test]
    fn pdf_wrapper_is_a_single_page_document() {
        let rgb = vec![255u8; 4 * 2 * 3];
        let bytes = pdf_with_image(&rgb, 4, 2);
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.starts_with("%PDF-"));
        assert!(text.contains("/Count 1"));
        assert!(text.contains("/Subtype /Image"));
        assert!(text.trim_end().ends_with("%%EOF"));
    }

    fn sample_chart() -> ChartState {
        let input = AnalysisInput::new(5.0, 20, 3, "Kane");
        let distribution = compute_distribution(&input).unwrap();
        ChartState::new(&input, distribution)
    }

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("xg_export_{name}_{}", std::process::id()))
    }

    #[test]
    fn png_export_writes_png_and_creates_parent_dirs() {
        let dir = scratch_dir("png").join("nested");
        let path = resolve_export_path(&dir, "kane", ExportFormat::Png);
        export_chart(&sample_chart(), &path, ExportFormat::Png).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(PNG_MAGIC));
        let _ = fs::remove_dir_all(dir.parent().unwrap());
    }

    #[test]
    fn pdf_export_writes_pdf() {
        let dir = scratch_dir("pdf");
        let path = resolve_export_path(&dir, "kane", ExportFormat::Pdf);
        export_chart(&sample_chart(), &path, ExportFormat::Pdf).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn png_format_wins_over_filename_extension() {
        let dir = scratch_dir("mismatch");
        let chart = sample_chart();
        for name in ["report.jpg", "report.pdf"] {
            let path = resolve_export_path(&dir, name, ExportFormat::Png);
            export_chart(&chart, &path, ExportFormat::Png).unwrap();
            let bytes = fs::read(&path).unwrap();
            assert!(bytes.starts_with(PNG_MAGIC), "{name} is not a PNG");
        }
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn format_cycle_and_extensions() {
        assert_eq!(ExportFormat::Png.next(), ExportFormat::Pdf);
        assert_eq!(ExportFormat::Pdf.next().extension(), "png");
    }
}
