use anyhow::{Context, Result};
use plotters::prelude::*;

const CHART_SIZE: (u32, u32) = (1000, 500);
const LINE_COLOR: RGBColor = RGBColor(37, 99, 235);

/// Render vehicle count against frame index as an SVG line chart
pub fn render_density_chart(counts: &[u32]) -> Result<String> {
    let _span = tracing::debug_span!("density_chart").entered();

    let x_max = counts.len().max(2) as u32 - 1;
    let y_max = counts.iter().copied().max().unwrap_or(0) + 1;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).context("Failed to clear chart")?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Traffic Density", ("sans-serif", 26))
            .margin(20)
            .x_label_area_size(45)
            .y_label_area_size(55)
            .build_cartesian_2d(0u32..x_max, 0u32..y_max)
            .context("Failed to build chart axes")?;

        chart
            .configure_mesh()
            .x_desc("Frame Number")
            .y_desc("Number of Vehicles")
            .light_line_style(BLACK.mix(0.06))
            .draw()
            .context("Failed to draw chart grid")?;

        chart
            .draw_series(LineSeries::new(
                counts.iter().enumerate().map(|(i, &c)| (i as u32, c)),
                LINE_COLOR.stroke_width(2),
            ))
            .context("Failed to draw density line")?;

        root.present().context("Failed to finish chart")?;
    }

    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_svg_with_axis_titles() {
        let svg = render_density_chart(&[1, 2, 0, 4, 3]).unwrap();

        assert!(svg.contains("<svg"));
        assert!(svg.contains("Traffic Density"));
        assert!(svg.contains("Frame Number"));
        assert!(svg.contains("Number of Vehicles"));
        assert!(svg.contains("<polyline"));
    }

    #[test]
    fn single_frame_still_renders() {
        let svg = render_density_chart(&[0]).unwrap();
        assert!(svg.contains("<svg"));
    }
}
