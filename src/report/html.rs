use super::chart::render_density_chart;
use super::AnalysisReport;
use crate::annotate::{label_color, OTHER_COLOR};
use crate::counting::VEHICLE_LABELS;
use crate::sampling::SampleRecord;
use anyhow::{Context, Result};
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::Rgb;
use std::fmt::Write;

const JPEG_QUALITY: u8 = 85;

const STYLE: &str = r#"
    body { font-family: "Segoe UI", Helvetica, Arial, sans-serif; background: #f1f5f9; color: #1e293b; margin: 0; }
    main { max-width: 1040px; margin: 0 auto; padding: 2em 1.5em; }
    h1 { text-align: center; color: #0f172a; margin-bottom: 0.2em; }
    .lead { text-align: center; color: #475569; margin-top: 0; }
    form { background: #ffffff; border-radius: 1em; padding: 1.5em; text-align: center; box-shadow: 0 1px 3px rgba(15, 23, 42, 0.15); }
    button { background: #2563eb; color: #ffffff; border: none; border-radius: 0.5em; padding: 0.6em 1.4em; font-weight: 600; cursor: pointer; }
    .metric-box { background: #e0f2f1; padding: 1em; border-radius: 1em; text-align: center; color: #004d40; font-weight: 600; margin-top: 1.5em; font-size: 1.1rem; }
    .notice { background: #fef9c3; color: #713f12; padding: 1em; border-radius: 1em; text-align: center; margin-top: 1.5em; }
    .error { background: #fee2e2; color: #7f1d1d; padding: 1em; border-radius: 1em; text-align: center; margin-top: 1.5em; }
    figure { margin: 0 0 1.5em 0; text-align: center; }
    figure img { max-width: 100%; border-radius: 0.5em; }
    .legend { list-style: none; padding: 0; text-align: center; color: #475569; }
    .legend li { display: inline-block; margin: 0 0.8em; }
    .swatch { display: inline-block; width: 0.9em; height: 0.9em; border-radius: 0.2em; margin-right: 0.3em; vertical-align: middle; }
    figcaption { color: #475569; font-size: 0.95rem; margin-top: 0.3em; }
    .chart svg { width: 100%; height: auto; background: #ffffff; border-radius: 0.5em; }
    a { color: #2563eb; }
    footer { color: #64748b; font-size: 0.85rem; text-align: center; margin-top: 2em; }
"#;

/// Escape text for inclusion in HTML element content or attributes
pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{style}</style>
</head>
<body>
<main>
<h1>Traffic Density Analyzer</h1>
<p class="lead">Upload a highway traffic video to measure vehicle density with YOLOv8</p>
{body}
<footer>Built with actix-web, ONNX Runtime &amp; YOLOv8</footer>
</main>
</body>
</html>
"#,
        title = escape_html(title),
        style = STYLE,
    )
}

fn upload_form() -> &'static str {
    r#"<form action="/analyze" method="post" enctype="multipart/form-data">
<p><label for="video">Upload Traffic Video (mp4)</label></p>
<p><input id="video" name="video" type="file" accept=".mp4,video/mp4" required></p>
<p><button type="submit">Analyze</button></p>
</form>"#
}

/// Page shown while awaiting input
pub fn render_upload_page() -> String {
    let body = format!(
        "{}\n<div class=\"notice\">Please upload a traffic video to begin analysis.</div>",
        upload_form()
    );
    page("Traffic Density Analyzer", &body)
}

/// Page shown when an upload could not be analyzed
pub fn render_error_page(message: &str) -> String {
    let body = format!(
        "<div class=\"error\">Analysis failed: {}</div>\n<p style=\"text-align:center\"><a href=\"/\">Try another video</a></p>",
        escape_html(message)
    );
    page("Analysis failed", &body)
}

/// Page with the summary, sampled frames and density chart
pub fn render_report_page(report: &AnalysisReport, file_name: &str) -> Result<String> {
    let _span = tracing::debug_span!("render_report").entered();

    let mut body = String::new();
    writeln!(
        body,
        "<p class=\"lead\">Results for <strong>{}</strong></p>",
        escape_html(file_name)
    )?;

    match report.summary.mean_vehicles {
        None => {
            body.push_str(
                "<div class=\"notice\">No frames were decoded from this video, so there is nothing to report.</div>\n",
            );
        }
        Some(mean) => {
            writeln!(
                body,
                "<div class=\"metric-box\">Processed <strong>{}</strong> frames.<br>Average vehicles per frame: <strong>{:.2}</strong></div>",
                report.summary.frames_processed, mean
            )?;

            body.push_str("<h2>Sample Processed Frames</h2>\n");
            body.push_str(&render_legend());
            for sample in &report.samples {
                body.push_str(&render_sample(sample)?);
            }

            body.push_str("<h2>Traffic Density over Frames</h2>\n<div class=\"chart\">\n");
            body.push_str(&render_density_chart(&report.counts)?);
            body.push_str("</div>\n");
        }
    }

    body.push_str("<h2>Analyze another video</h2>\n");
    body.push_str(upload_form());

    Ok(page("Traffic Density Report", &body))
}

fn css_color(color: Rgb<u8>) -> String {
    let [r, g, b] = color.0;
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Key for the box colors drawn on sampled frames
fn render_legend() -> String {
    let mut legend = String::from("<ul class=\"legend\">");
    let entries = VEHICLE_LABELS
        .iter()
        .map(|&label| (label, label_color(label)))
        .chain([("other objects", OTHER_COLOR)]);
    for (label, color) in entries {
        legend.push_str(&format!(
            "<li><span class=\"swatch\" style=\"background:{}\"></span>{}</li>",
            css_color(color),
            escape_html(label)
        ));
    }
    legend.push_str("</ul>\n");
    legend
}

fn render_sample(sample: &SampleRecord) -> Result<String> {
    let caption = format!("Frame {} | Vehicles: {}", sample.index, sample.vehicle_count);

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode_image(&sample.image)
        .with_context(|| format!("Failed to encode frame {}", sample.index))?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(&jpeg);

    Ok(format!(
        "<figure><img src=\"data:image/jpeg;base64,{encoded}\" alt=\"{caption}\"><figcaption>{caption}</figcaption></figure>\n",
        caption = escape_html(&caption),
    ))
}
