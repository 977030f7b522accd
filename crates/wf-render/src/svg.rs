//! Static SVG export of a render frame.

use crate::frame::{Highlight, RenderFrame};
use crate::path::to_bez_path;
use kurbo::Shape;
use std::fmt::Write;

const PADDING: f64 = 40.0;
const STATE_FILL: &str = "#F5F6FA";
const STATE_STROKE: &str = "#2D3436";
const EDGE_STROKE: &str = "#636E72";
const ACCENT: &str = "#6C5CE7";

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the frame as a standalone SVG document.
pub fn render_svg(frame: &RenderFrame) -> String {
    let mut min_x = f64::MAX;
    let mut min_y = f64::MAX;
    let mut max_x = f64::MIN;
    let mut max_y = f64::MIN;
    let mut grow = |r: kurbo::Rect| {
        min_x = min_x.min(r.x0);
        min_y = min_y.min(r.y0);
        max_x = max_x.max(r.x1);
        max_y = max_y.max(r.y1);
    };

    for s in &frame.states {
        let b = s.bounds;
        grow(kurbo::Rect::new(
            b.x as f64,
            b.y as f64,
            (b.x + b.width) as f64,
            (b.y + b.height) as f64,
        ));
    }
    let paths: Vec<kurbo::BezPath> = frame.transitions.iter().map(|t| to_bez_path(&t.path)).collect();
    for p in &paths {
        grow(p.bounding_box());
    }
    let preview = frame.preview.as_ref().map(|p| (to_bez_path(&p.path), p.dashed()));
    if let Some((p, _)) = &preview {
        grow(p.bounding_box());
    }

    if min_x > max_x {
        min_x = 0.0;
        min_y = 0.0;
        max_x = 0.0;
        max_y = 0.0;
    }
    let (vx, vy) = (min_x - PADDING, min_y - PADDING);
    let (vw, vh) = (max_x - min_x + 2.0 * PADDING, max_y - min_y + 2.0 * PADDING);

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{vx} {vy} {vw} {vh}" width="{vw}" height="{vh}">"#
    );
    let _ = writeln!(
        svg,
        r#"  <defs><marker id="arrow" viewBox="0 0 10 10" refX="10" refY="5" markerWidth="8" markerHeight="8" orient="auto-start-reverse"><path d="M 0 0 L 10 5 L 0 10 z" fill="{EDGE_STROKE}"/></marker></defs>"#
    );

    for (t, bez) in frame.transitions.iter().zip(&paths) {
        let stroke = match frame.highlight {
            Some(Highlight::Transition(id)) if id == t.id => ACCENT,
            _ => EDGE_STROKE,
        };
        let _ = writeln!(
            svg,
            r#"  <path data-id="{}" d="{}" fill="none" stroke="{stroke}" stroke-width="1.5" marker-end="url(#arrow)"/>"#,
            escape(t.id.as_str()),
            bez.to_svg()
        );
        for w in &t.waypoints {
            let _ = writeln!(
                svg,
                r#"  <circle cx="{}" cy="{}" r="4" fill="{ACCENT}"/>"#,
                w.x, w.y
            );
        }
        let caption = match (&t.label, t.gates.is_empty()) {
            (Some(label), true) => Some(escape(label)),
            (Some(label), false) => Some(format!("{} [{}]", escape(label), escape(&t.gates.join(", ")))),
            (None, false) => Some(format!("[{}]", escape(&t.gates.join(", ")))),
            (None, true) => None,
        };
        if let Some(caption) = caption {
            let mid = bez.bounding_box().center();
            let _ = writeln!(
                svg,
                r#"  <text x="{}" y="{}" font-size="11" text-anchor="middle" fill="{EDGE_STROKE}">{caption}</text>"#,
                mid.x, mid.y
            );
        }
    }

    for s in &frame.states {
        let stroke = match frame.highlight {
            Some(Highlight::State(id)) if id == s.id => ACCENT,
            _ => STATE_STROKE,
        };
        let b = s.bounds;
        let _ = writeln!(
            svg,
            r#"  <rect data-id="{}" x="{}" y="{}" width="{}" height="{}" rx="8" fill="{STATE_FILL}" stroke="{stroke}"/>"#,
            escape(s.id.as_str()),
            b.x,
            b.y,
            b.width,
            b.height
        );
        let _ = writeln!(
            svg,
            r#"  <text x="{}" y="{}" font-size="14" text-anchor="middle" dominant-baseline="middle">{}</text>"#,
            b.x + b.width / 2.0,
            b.y + b.height / 2.0,
            escape(&s.label)
        );
    }

    if let Some((bez, dashed)) = preview {
        let dash = if dashed { r#" stroke-dasharray="6 4""# } else { "" };
        let _ = writeln!(
            svg,
            r#"  <path d="{}" fill="none" stroke="{ACCENT}" stroke-width="1.5"{dash}/>"#,
            bez.to_svg()
        );
    }

    svg.push_str("</svg>\n");
    svg
}
