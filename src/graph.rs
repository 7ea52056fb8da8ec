use anyhow::{anyhow, Context, Result};
use image::ImageEncoder;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::f64::consts::PI;
use std::ops::Range;
use tracing::debug;

use crate::ir::{Archetype, GridShape, RenderPlan, StyledChart, Tone};
use crate::palette;
use crate::style::format_value;
use crate::OutputFormat;

const FONT: &str = "sans-serif";

/// Draw a plan and encode it as PNG or SVG bytes
pub fn render_plan(plan: &RenderPlan, format: OutputFormat) -> Result<Vec<u8>> {
    let (width, height) = (plan.canvas.width, plan.canvas.height);
    if width == 0 || height == 0 {
        anyhow::bail!("Cannot render a {}x{} canvas", width, height);
    }
    debug!(title = %plan.title, charts = plan.charts.len(), ?format, "Rendering plan");

    match format {
        OutputFormat::Png => {
            let mut buffer = vec![0u8; width as usize * height as usize * 3];
            {
                let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
                draw_plan(&root, plan)?;
                root.present().context("Failed to present drawing")?;
            }
            encode_png(&buffer, width, height)
        }
        OutputFormat::Svg => {
            let mut svg = String::new();
            {
                let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
                draw_plan(&root, plan)?;
                root.present().context("Failed to present drawing")?;
            }
            Ok(svg.into_bytes())
        }
    }
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let mut png_bytes = Vec::new();
    {
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(buffer, width, height, image::ColorType::Rgb8)
            .context("Failed to encode PNG")?;
    }
    Ok(png_bytes)
}

fn draw_plan<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, plan: &RenderPlan) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&rgb(palette::LIGHT)).context("Failed to fill background")?;

    let Some(shape) = plan.grid else {
        for placed in &plan.charts {
            draw_chart(root, &placed.chart)?;
        }
        return Ok(());
    };

    let body = root
        .titled(&plan.title, (FONT, 40).into_font().color(&rgb(palette::DARK)))
        .context("Failed to draw dashboard title")?;
    let (cell_width, cell_height) = cell_pixels(body.dim_in_pixel(), shape);

    for placed in &plan.charts {
        let cell = placed
            .cell
            .ok_or_else(|| anyhow!("Dashboard chart '{}' has no grid cell", placed.chart.spec.title))?;
        let area = body.clone().shrink(
            (cell.col as i32 * cell_width, cell.row as i32 * cell_height),
            (cell.col_span as i32 * cell_width, cell.row_span as i32 * cell_height),
        );
        area.fill(&WHITE).context("Failed to fill chart cell")?;
        draw_chart(&area, &placed.chart)?;
    }
    Ok(())
}

fn cell_pixels((width, height): (u32, u32), shape: GridShape) -> (i32, i32) {
    (
        (width / shape.cols.max(1) as u32) as i32,
        (height / shape.rows.max(1) as u32) as i32,
    )
}

fn draw_chart<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, chart: &StyledChart) -> Result<()>
where
    DB::ErrorType: 'static,
{
    match chart.spec.archetype {
        Archetype::Bar => draw_bar(area, chart),
        Archetype::Pie => draw_pie(area, chart),
        Archetype::Trend => draw_trend(area, chart),
        Archetype::DualAxisComparison => draw_dual_axis(area, chart),
    }
    .with_context(|| format!("Failed to draw {} chart '{}'", chart.spec.archetype, chart.spec.title))
}

fn draw_bar<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, chart: &StyledChart) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let spec = &chart.spec;
    let series = spec.series.first().ok_or_else(|| anyhow!("No series to draw"))?;
    let categories = &spec.categories;
    let percent = series.token().is_percent();

    let mut ctx = ChartBuilder::on(area)
        .margin(20)
        .caption(&spec.title, (FONT, 28))
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(0.0..categories.len() as f64, value_range(series.present(), true))
        .context("Failed to build chart")?;

    ctx.configure_mesh()
        .disable_x_mesh()
        .x_labels(categories.len())
        .x_label_formatter(&|x| category_at(categories, *x))
        .y_label_formatter(&|y| format_value(*y, percent))
        .y_desc(series.name.as_str())
        .draw()
        .context("Failed to draw mesh")?;

    draw_bars(&mut ctx, chart)?;
    Ok(())
}

/// Bars of the primary series with their value labels
fn draw_bars<'a, DB: DrawingBackend + 'a>(
    ctx: &mut ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    chart: &StyledChart,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let series = chart.spec.series.first().ok_or_else(|| anyhow!("No series to draw"))?;
    let style = &chart.style;

    let bars = series.values.iter().enumerate().filter_map(|(i, v)| {
        let v = (*v)?;
        let fill = style.element_colors.get(i).copied().unwrap_or(style.color);
        let x = i as f64;
        Some(Rectangle::new([(x + 0.15, 0.0), (x + 0.85, v)], rgb(fill).filled()))
    });
    ctx.draw_series(bars)
        .context("Failed to draw bars")?
        .label(series.name.as_str())
        .legend(legend_swatch(rgb(style.color)));

    ctx.draw_series(value_labels(chart, 0))
        .context("Failed to draw value labels")?;
    Ok(())
}

/// Label texts of series `index`, above each value (below for negatives)
fn value_labels(chart: &StyledChart, index: usize) -> Vec<Text<'static, (f64, f64), String>> {
    let Some(series) = chart.spec.series.get(index) else {
        return Vec::new();
    };
    let labels = chart.style.labels.get(index);

    series
        .values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| {
            let v = (*v)?;
            let label = labels?.get(i)?.as_ref()?;
            let anchor = if v < 0.0 { VPos::Top } else { VPos::Bottom };
            let font = (FONT, 16)
                .into_font()
                .color(&tone_color(label.tone))
                .pos(Pos::new(HPos::Center, anchor));
            Some(Text::new(label.text.clone(), (i as f64 + 0.5, v), font))
        })
        .collect()
}

/// Point markers of series `index`; the primary series takes its per-element colors
fn point_markers(chart: &StyledChart, index: usize, color: RGBColor) -> Vec<Circle<(f64, f64), i32>> {
    let Some(series) = chart.spec.series.get(index) else {
        return Vec::new();
    };

    series
        .values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| {
            let v = (*v)?;
            let fill = match chart.style.element_colors.get(i) {
                Some(&c) if index == 0 => rgb(c),
                _ => color,
            };
            Some(Circle::new((i as f64 + 0.5, v), 5, fill.filled()))
        })
        .collect()
}

fn draw_pie<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, chart: &StyledChart) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let spec = &chart.spec;
    let style = &chart.style;
    let series = spec.series.first().ok_or_else(|| anyhow!("No series to draw"))?;

    let area = area
        .titled(&spec.title, (FONT, 28))
        .context("Failed to draw caption")?;
    let (width, height) = area.dim_in_pixel();
    let center = (width as f64 / 2.0, height as f64 / 2.0);
    let radius = width.min(height) as f64 * 0.35;

    let total: f64 = series.present().filter(|v| *v > 0.0).sum();
    if total <= 0.0 {
        return Ok(());
    }

    let mut start = -PI / 2.0;
    for (i, value) in series.values.iter().enumerate() {
        let Some(value) = value.filter(|v| *v > 0.0) else {
            continue;
        };
        let sweep = value / total * 2.0 * PI;
        let mid = start + sweep / 2.0;
        let offset = if style.pull_out == Some(i) { radius * 0.08 } else { 0.0 };
        let origin = (center.0 + offset * mid.cos(), center.1 + offset * mid.sin());

        let fill = style.element_colors.get(i).copied().unwrap_or(style.color);
        area.draw(&Polygon::new(slice_points(origin, radius, start, sweep), rgb(fill).filled()))
            .context("Failed to draw slice")?;

        if let Some(label) = style.labels.first().and_then(|l| l.get(i)).and_then(|l| l.as_ref()) {
            let category = spec.categories.get(i).map(String::as_str).unwrap_or("");
            let at = (
                (origin.0 + radius * 1.2 * mid.cos()) as i32,
                (origin.1 + radius * 1.2 * mid.sin()) as i32,
            );
            let font = (FONT, 18)
                .into_font()
                .color(&rgb(palette::DARK))
                .pos(Pos::new(HPos::Center, VPos::Center));
            area.draw(&Text::new(format!("{}: {}", category, label.text), at, font))
                .context("Failed to draw slice label")?;
        }
        start += sweep;
    }
    Ok(())
}

fn slice_points(origin: (f64, f64), radius: f64, start: f64, sweep: f64) -> Vec<(i32, i32)> {
    let steps = ((sweep / (2.0 * PI)) * 120.0).ceil().max(2.0) as usize;
    let mut points = vec![(origin.0 as i32, origin.1 as i32)];
    points.extend((0..=steps).map(|s| {
        let angle = start + sweep * s as f64 / steps as f64;
        (
            (origin.0 + radius * angle.cos()) as i32,
            (origin.1 + radius * angle.sin()) as i32,
        )
    }));
    points
}

fn draw_trend<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, chart: &StyledChart) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let spec = &chart.spec;
    let style = &chart.style;
    let categories = &spec.categories;
    let percent = spec.style_token.is_percent();

    let all_values = spec.series.iter().flat_map(|s| s.present());
    let mut ctx = ChartBuilder::on(area)
        .margin(20)
        .caption(&spec.title, (FONT, 28))
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(0.0..categories.len() as f64, value_range(all_values, false))
        .context("Failed to build chart")?;

    ctx.configure_mesh()
        .x_labels(categories.len())
        .x_label_formatter(&|x| category_at(categories, *x))
        .y_label_formatter(&|y| format_value(*y, percent))
        .draw()
        .context("Failed to draw mesh")?;

    for (i, series) in spec.series.iter().enumerate() {
        let color = rgb(style.series_colors.get(i).copied().unwrap_or(style.color));
        ctx.draw_series(LineSeries::new(line_points(&series.values), color.stroke_width(3)))
            .context("Failed to draw line series")?
            .label(series.name.as_str())
            .legend(legend_swatch(color));
        ctx.draw_series(point_markers(chart, i, color))
            .context("Failed to draw points")?;
        ctx.draw_series(value_labels(chart, i))
            .context("Failed to draw value labels")?;
    }

    if let Some(fit) = spec.trend {
        let color = rgb(style.color).mix(0.5);
        let n = categories.len() as f64;
        let ends = vec![(0.5, fit.at(0.0)), (n - 0.5, fit.at(n - 1.0))];
        ctx.draw_series(LineSeries::new(ends, color.stroke_width(2)))
            .context("Failed to draw trend line")?
            .label("Trend")
            .legend(legend_swatch(rgb(style.color)));
    }

    draw_legend(&mut ctx)
}

fn draw_dual_axis<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, chart: &StyledChart) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let spec = &chart.spec;
    let style = &chart.style;
    let categories = &spec.categories;
    let [lead, other] = spec.series.as_slice() else {
        anyhow::bail!("Dual-axis chart needs exactly two series");
    };
    let (lead_percent, other_percent) = (lead.token().is_percent(), other.token().is_percent());
    let x_range = 0.0..categories.len() as f64;

    let mut ctx = ChartBuilder::on(area)
        .margin(20)
        .caption(&spec.title, (FONT, 28))
        .x_label_area_size(50)
        .y_label_area_size(80)
        .right_y_label_area_size(80)
        .build_cartesian_2d(x_range.clone(), value_range(lead.present(), true))
        .context("Failed to build chart")?
        .set_secondary_coord(x_range, value_range(other.present(), true));

    ctx.configure_mesh()
        .disable_x_mesh()
        .x_labels(categories.len())
        .x_label_formatter(&|x| category_at(categories, *x))
        .y_label_formatter(&|y| format_value(*y, lead_percent))
        .y_desc(lead.name.as_str())
        .draw()
        .context("Failed to draw mesh")?;
    ctx.configure_secondary_axes()
        .y_label_formatter(&|y| format_value(*y, other_percent))
        .y_desc(other.name.as_str())
        .draw()
        .context("Failed to draw secondary axis")?;

    draw_bars(&mut *ctx, chart)?;

    let color = rgb(style.series_colors.get(1).copied().unwrap_or(palette::EMPHASIS));
    ctx.draw_secondary_series(LineSeries::new(line_points(&other.values), color.stroke_width(3)))
        .context("Failed to draw secondary line")?
        .label(other.name.as_str())
        .legend(legend_swatch(color));
    ctx.draw_secondary_series(point_markers(chart, 1, color))
        .context("Failed to draw secondary points")?;
    ctx.draw_secondary_series(value_labels(chart, 1))
        .context("Failed to draw secondary value labels")?;

    draw_legend(&mut *ctx)
}

fn draw_legend<'a, DB: DrawingBackend + 'a, X: Ranged, Y: Ranged>(
    ctx: &mut ChartContext<'a, DB, Cartesian2d<X, Y>>,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    ctx.configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&rgb(palette::DARK))
        .draw()
        .context("Failed to draw legend")?;
    Ok(())
}

fn legend_swatch(color: RGBColor) -> impl Fn((i32, i32)) -> Rectangle<(i32, i32)> {
    move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled())
}

/// Present values at category centers
fn line_points(values: &[Option<f64>]) -> Vec<(f64, f64)> {
    values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i as f64 + 0.5, v)))
        .collect()
}

fn category_at(categories: &[String], x: f64) -> String {
    if x < 0.0 {
        return String::new();
    }
    categories.get(x.floor() as usize).cloned().unwrap_or_default()
}

/// Padded axis range; bars and comparisons always include zero
fn value_range(values: impl Iterator<Item = f64>, include_zero: bool) -> Range<f64> {
    let (mut lo, mut hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    if include_zero {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }
    if lo == hi {
        return (lo - 1.0)..(hi + 1.0);
    }

    let padding = (hi - lo) * 0.1;
    let lo = if include_zero && lo == 0.0 { 0.0 } else { lo - padding };
    let hi = if include_zero && hi == 0.0 { 0.0 } else { hi + padding };
    lo..hi
}

fn tone_color(tone: Tone) -> RGBColor {
    match tone {
        Tone::Neutral => rgb(palette::DARK),
        Tone::Success => rgb(palette::SUCCESS),
        Tone::Danger => rgb(palette::DANGER),
    }
}

fn rgb(color: palette::Color) -> RGBColor {
    let (r, g, b) = color.rgb();
    RGBColor(r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::DashboardComposer;
    use crate::data::{Column, Dataset};
    use crate::ComposeOptions;

    fn datasets() -> Vec<Dataset> {
        vec![
            Dataset::new(
                "financial_data",
                vec![
                    Column::text("Year", &["FY 2023", "FY 2024", "FY 2025"]),
                    Column::numbers("Revenue", &[876396.0, 899041.0, 962820.0]),
                    Column::numbers("Net_Profit", &[74088.0, 79020.0, 81309.0]),
                ],
            ),
            Dataset::new(
                "shareholding_data",
                vec![
                    Column::text("Shareholder", &["Promoters", "FIIs", "Public"]),
                    Column::numbers("Percentage", &[50.0, 30.0, 20.0]),
                ],
            ),
        ]
    }

    fn small_options() -> ComposeOptions {
        let mut options = ComposeOptions::default();
        options.canvas.chart_width = 400;
        options.canvas.chart_height = 300;
        options.canvas.cell_width = 400;
        options.canvas.cell_height = 300;
        options
    }

    #[test]
    fn test_value_range_includes_zero_for_bars() {
        let range = value_range([5.0, 10.0].into_iter(), true);
        assert_eq!(range.start, 0.0);
        assert!(range.end > 10.0);

        let negative = value_range([-44.0, 3.0].into_iter(), true);
        assert!(negative.start < -44.0 && negative.end > 3.0);

        let line = value_range([5.0, 10.0].into_iter(), false);
        assert!(line.start > 0.0 && line.start < 5.0);
    }

    #[test]
    fn test_value_range_degenerate() {
        assert_eq!(value_range(std::iter::empty(), true), 0.0..1.0);
        assert_eq!(value_range([0.0].into_iter(), true), -1.0..1.0);
    }

    #[test]
    fn test_category_at() {
        let categories = vec!["a".to_string(), "b".to_string()];
        assert_eq!(category_at(&categories, 0.0), "a");
        assert_eq!(category_at(&categories, 1.7), "b");
        assert_eq!(category_at(&categories, 2.0), "");
        assert_eq!(category_at(&categories, -0.5), "");
    }

    #[test]
    fn test_slice_points_start_at_origin() {
        let points = slice_points((100.0, 100.0), 50.0, 0.0, PI / 2.0);
        assert_eq!(points[0], (100, 100));
        assert_eq!(points[1], (150, 100));
        assert_eq!(*points.last().unwrap(), (100, 150));
    }

    #[test]
    fn test_render_dashboard_png() {
        let plan = DashboardComposer::new(small_options()).compose(&datasets());
        let png = render_plan(&plan, OutputFormat::Png).unwrap();
        assert!(png.len() > 8);
        assert_eq!(&png[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
    }

    #[test]
    fn test_render_standalone_svg() {
        let plans = DashboardComposer::new(small_options()).standalone(&datasets());
        assert_eq!(plans.len(), 3);
        for plan in &plans {
            let svg = String::from_utf8(render_plan(plan, OutputFormat::Svg).unwrap()).unwrap();
            assert!(svg.contains("<svg"));
        }
    }

    #[test]
    fn test_trend_svg_carries_value_labels() {
        let growth = Dataset::new(
            "growth_data",
            vec![
                Column::text("Year", &["FY 2022", "FY 2023", "FY 2024", "FY 2025"]),
                Column::numbers("Revenue", &[694673.0, 876396.0, 899041.0, 962820.0]),
                Column::numbers("Expenses", &[608268.0, 772321.0, 782127.0, 834110.0]),
            ],
        );
        let plans = DashboardComposer::new(small_options()).standalone(&[growth]);
        let trend = plans
            .iter()
            .find(|p| p.charts[0].chart.spec.archetype == Archetype::Trend)
            .expect("no trend plan");

        let svg = String::from_utf8(render_plan(trend, OutputFormat::Svg).unwrap()).unwrap();
        assert!(svg.contains("962.8K"));
        assert!(svg.contains("834.1K"));
    }

    #[test]
    fn test_render_rejects_empty_canvas() {
        let mut plan = DashboardComposer::new(small_options()).compose(&datasets());
        plan.canvas.width = 0;
        assert!(render_plan(&plan, OutputFormat::Png).is_err());
    }
}
