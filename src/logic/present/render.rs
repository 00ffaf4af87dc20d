//! Text and HTML renderers
//!
//! Thin and swappable: both consume a `Presentation` and nothing else from
//! the pipeline.

use std::collections::BTreeMap;
use std::fmt::Write;

use super::{Presentation, Waterfall};
use crate::logic::features::{FieldKind, FEATURE_LAYOUT};

const TEXT_BAR_WIDTH: usize = 30;

/// Price as shown to the user
pub fn format_price(price: f64) -> String {
    format!("{:.2} €", price)
}

fn signed(v: f64) -> String {
    format!("{:+.2}", v)
}

// ============================================================================
// TEXT
// ============================================================================

pub fn render_text(presentation: &Presentation) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Predicted nightly price: {}", presentation.headline);

    if let Some(waterfall) = &presentation.waterfall {
        out.push_str(&render_waterfall_text(waterfall));
    } else if let Some(notice) = &presentation.notice {
        let _ = writeln!(out, "(explanation unavailable: {})", notice);
    }
    out
}

fn render_waterfall_text(waterfall: &Waterfall) -> String {
    let mut out = String::new();
    let label_width = waterfall
        .steps
        .iter()
        .map(|s| s.label.len())
        .max()
        .unwrap_or(0)
        .max("prediction".len());
    let max = waterfall.max_magnitude();

    let _ = writeln!(out, "{:<w$} {:>10}", "baseline", format!("{:.2}", waterfall.baseline), w = label_width);
    for step in &waterfall.steps {
        let len = if max > 0.0 {
            ((step.contribution.abs() / max) * TEXT_BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        let bar = if step.contribution >= 0.0 { "+" } else { "-" }.repeat(len.max(1));
        let _ = writeln!(
            out,
            "{:<w$} {:>10} | {}",
            step.label,
            signed(step.contribution),
            bar,
            w = label_width
        );
    }
    let _ = writeln!(out, "{:<w$} {:>10}", "prediction", format!("{:.2}", waterfall.final_value()), w = label_width);
    out
}

// ============================================================================
// HTML
// ============================================================================

/// Everything the form page needs
#[derive(Debug, Default)]
pub struct PageContext<'a> {
    /// Previously submitted raw values, echoed back into the controls
    pub form_values: Option<&'a BTreeMap<String, String>>,
    pub presentation: Option<&'a Presentation>,
    /// Input error to show above the form
    pub error: Option<&'a str>,
    pub show_image: bool,
    pub explain_checked: bool,
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

pub fn render_page(ctx: &PageContext<'_>) -> String {
    let mut body = String::new();

    if ctx.show_image {
        body.push_str(
            "<figure><img src=\"/assets/cover\" alt=\"Port de Marseille\" width=\"640\">\
             <figcaption>Port de Marseille</figcaption></figure>\n",
        );
    }
    body.push_str("<h1>What is the rental price for a house in Marseille?</h1>\n");

    if let Some(error) = ctx.error {
        let _ = writeln!(body, "<p class=\"error\" role=\"alert\">{}</p>", escape_html(error));
    }

    if let Some(presentation) = ctx.presentation {
        body.push_str(&render_result_html(presentation));
    }

    body.push_str(&render_form(ctx));

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>Marseille rental price</title>\n<style>{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        PAGE_CSS, body
    )
}

fn render_form(ctx: &PageContext<'_>) -> String {
    let previous = |name: &str| ctx.form_values.and_then(|v| v.get(name)).map(String::as_str);

    let mut form = String::from("<form method=\"post\" action=\"/predict\">\n");
    for spec in FEATURE_LAYOUT {
        let name = spec.name;
        let label = escape_html(spec.label);
        match spec.kind {
            FieldKind::Binary => {
                let checked = matches!(previous(name), Some(v) if !v.is_empty() && v != "0" && v != "off");
                let _ = writeln!(
                    form,
                    "<label><input type=\"checkbox\" name=\"{}\" value=\"1\"{}> {}</label>",
                    name,
                    if checked { " checked" } else { "" },
                    label
                );
            }
            FieldKind::Count { min, max } | FieldKind::Continuous { min, max } => {
                let step = if matches!(spec.kind, FieldKind::Count { .. }) { "1" } else { "any" };
                let value = previous(name)
                    .map(escape_html)
                    .unwrap_or_else(|| format!("{}", min));
                let _ = writeln!(
                    form,
                    "<label>{} <input type=\"number\" name=\"{}\" min=\"{}\" max=\"{}\" step=\"{}\" value=\"{}\" required></label>",
                    label, name, min, max, step, value
                );
            }
        }
    }
    let _ = writeln!(
        form,
        "<label><input type=\"checkbox\" name=\"explain\" value=\"1\"{}> Explain the prediction</label>",
        if ctx.explain_checked { " checked" } else { "" }
    );
    form.push_str("<button type=\"submit\">Predict</button>\n</form>\n");
    form
}

fn render_result_html(presentation: &Presentation) -> String {
    let mut out = String::from("<section class=\"result\">\n");
    let _ = writeln!(
        out,
        "<p class=\"price\">Predicted nightly price: <strong>{}</strong></p>",
        escape_html(&presentation.headline)
    );

    if let Some(waterfall) = &presentation.waterfall {
        let max = waterfall.max_magnitude();
        out.push_str("<table class=\"waterfall\">\n<thead><tr><th>Feature</th><th>Value</th><th>Contribution</th><th></th><th>Cumulative</th></tr></thead>\n<tbody>\n");
        let _ = writeln!(
            out,
            "<tr class=\"baseline\"><td>Average prediction</td><td></td><td></td><td></td><td>{:.2}</td></tr>",
            waterfall.baseline
        );
        for step in &waterfall.steps {
            let pct = if max > 0.0 { step.contribution.abs() / max * 100.0 } else { 0.0 };
            let class = if step.contribution >= 0.0 { "up" } else { "down" };
            let value = step.value.map(|v| format!("{}", v)).unwrap_or_default();
            let _ = writeln!(
                out,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td><span class=\"bar {}\" style=\"width:{:.1}%\"></span></td><td>{:.2}</td></tr>",
                escape_html(&step.label),
                value,
                signed(step.contribution),
                class,
                pct,
                step.end
            );
        }
        out.push_str("</tbody>\n</table>\n");
    } else if let Some(notice) = &presentation.notice {
        let _ = writeln!(
            out,
            "<p class=\"notice\">Explanation unavailable: {}</p>",
            escape_html(notice)
        );
    }

    out.push_str("</section>\n");
    out
}

const PAGE_CSS: &str = "body{font-family:sans-serif;max-width:720px;margin:2em auto}\
label{display:block;margin:.3em 0}\
.error{color:#b00020}.notice{color:#666}\
.price{font-size:1.4em;background:#e8f5e9;padding:.5em}\
.waterfall{border-collapse:collapse;width:100%}.waterfall td{padding:2px 6px}\
.bar{display:inline-block;height:.8em}.bar.up{background:#d62728}.bar.down{background:#1f77b4}";
