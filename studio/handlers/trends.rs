use std::io::Cursor;
use tiny_http::Response;

use chrono::Datelike;
use jean_o_type::trends::{self, TrendPoint};

use crate::render::{error_html, html_escape, render_page, Page};
use crate::routes::html_response;
use crate::state::SharedState;
use crate::util::form::{form_get_all, parse_form};

const CHART_TITLE: &str = "Jean Style Trends Since 2004";

/// One colour per style, cycled.
const PALETTE: [&str; 10] = [
    "#636efa", "#ef553b", "#00cc96", "#ab63fa", "#ffa15a",
    "#19d3f3", "#ff6692", "#b6e880", "#ff97ff", "#fecb52",
];

// ---------------------------------------------------------------------------
// GET /trends?style=a.csv&style=b.csv
// ---------------------------------------------------------------------------

pub fn handle_get(query: &str, state: &SharedState) -> Response<Cursor<Vec<u8>>> {
    let dir = &state.config.trends_dir;

    let available = match trends::list_trend_files(dir) {
        Ok(files) => files,
        Err(e) => {
            log::warn!("trend directory unavailable: {}", e);
            let body = error_html(&format!("Could not list trend files: {}", html_escape(&e.to_string())));
            return html_response(render_page(Page::Trends, |t| t.replace("{{BODY}}", &body)));
        }
    };

    let requested = form_get_all(&parse_form(query), "style");
    let selected = trends::sanitize_selection(&requested, &available);

    let chart = if selected.is_empty() {
        String::new()
    } else {
        match trends::load_selected(dir, &selected) {
            Ok(series) => build_svg_trend_chart(&trends::combine(&series)),
            Err(e) => error_html(&html_escape(&e.to_string())),
        }
    };

    let body = format!("{}\n{}", build_selector(&available, &selected), chart);
    html_response(render_page(Page::Trends, |t| t.replace("{{BODY}}", &body)))
}

fn build_selector(available: &[String], selected: &[String]) -> String {
    let options = if available.is_empty() {
        r#"<option disabled>No trend CSVs found</option>"#.to_owned()
    } else {
        available.iter().map(|file| {
            let sel = if selected.contains(file) { " selected" } else { "" };
            format!(
                "<option value=\"{}\"{}>{}</option>",
                html_escape(file), sel, html_escape(&trends::style_name_from_file(file))
            )
        }).collect::<Vec<_>>().join("\n")
    };

    format!(
        r#"<form class="card" method="GET" action="/trends">
  <label for="style">Select jean styles to compare:</label>
  <select id="style" name="style" multiple>
{}
  </select>
  <p class="hint">Hold Ctrl / Cmd to pick several.</p>
  <div class="mt"><button type="submit" class="btn btn-primary">Compare</button></div>
</form>"#,
        options
    )
}

// ---------------------------------------------------------------------------
// SVG line chart
// ---------------------------------------------------------------------------

/// Months since year 0, so consecutive months are one unit apart.
fn month_index(p: &TrendPoint) -> i64 {
    p.month.year() as i64 * 12 + p.month.month0() as i64
}

/// Groups rows by style, keeping first-appearance order and row order.
fn group_by_style(points: &[TrendPoint]) -> Vec<(&str, Vec<&TrendPoint>)> {
    let mut groups: Vec<(&str, Vec<&TrendPoint>)> = Vec::new();
    for p in points {
        match groups.iter().position(|(s, _)| *s == p.style) {
            Some(i) => groups[i].1.push(p),
            None => groups.push((p.style.as_str(), vec![p])),
        }
    }
    groups
}

pub fn build_svg_trend_chart(points: &[TrendPoint]) -> String {
    if points.is_empty() {
        return "<p class=\"hint\">The selected files contain no data.</p>".into();
    }

    let w = 1000.0f64;
    let h = 500.0f64;
    let pad_l = 56.0f64;
    let pad_r = 150.0f64;
    let pad_t = 52.0f64;
    let pad_b = 36.0f64;

    let min_x = points.iter().map(month_index).min().unwrap_or(0);
    let max_x = points.iter().map(month_index).max().unwrap_or(0);
    let span_x = ((max_x - min_x) as f64).max(1.0);

    let max_v = points.iter().map(|p| p.popularity).fold(f64::NEG_INFINITY, f64::max);
    let min_v = points.iter().map(|p| p.popularity).fold(f64::INFINITY, f64::min);
    let min_y = min_v.min(0.0);
    let max_y = if max_v > min_y { max_v * 1.05 } else { min_y + 1.0 };

    let px = |p: &TrendPoint| -> (f64, f64) {
        let x = pad_l + (month_index(p) - min_x) as f64 / span_x * (w - pad_l - pad_r);
        let y = pad_t + (max_y - p.popularity) / (max_y - min_y) * (h - pad_t - pad_b);
        (x, y)
    };

    let grey_grid = "#f0f2f5";
    let grey_text = "#999";
    let dark_text = "#222";

    // Y axis labels and grid.
    let y_labels: String = (0..=4).map(|g| {
        let frac = g as f64 / 4.0;
        let val  = min_y + (max_y - min_y) * frac;
        let y    = pad_t + (1.0 - frac) * (h - pad_t - pad_b);
        format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" fill=\"{}\" font-size=\"11\">{:.0}</text>\n\
             <line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"1\"/>",
            pad_l - 6.0, y + 4.0, grey_text, val,
            pad_l, y, w - pad_r, y, grey_grid
        )
    }).collect::<Vec<_>>().join("\n");

    // X axis: one label per year, thinned to at most ~10.
    let first_year = (min_x / 12) as i32;
    let last_year  = (max_x / 12) as i32;
    let step = (((last_year - first_year + 1) as f64) / 10.0).ceil().max(1.0) as i32;
    let x_labels: String = (first_year..=last_year)
        .step_by(step as usize)
        .filter(|&year| (year as i64) * 12 >= min_x)
        .map(|year| {
            let x = pad_l + ((year as i64) * 12 - min_x) as f64 / span_x * (w - pad_l - pad_r);
            format!(
                "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" fill=\"{}\" font-size=\"11\">{}</text>",
                x, h - pad_b + 16.0, grey_text, year
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    // One polyline and legend entry per style.
    let groups = group_by_style(points);
    let mut lines  = String::new();
    let mut legend = String::new();
    for (i, (style, rows)) in groups.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        let path: String = rows.iter().enumerate().map(|(j, p)| {
            let (x, y) = px(p);
            if j == 0 { format!("M{:.1},{:.1}", x, y) } else { format!(" L{:.1},{:.1}", x, y) }
        }).collect();
        lines.push_str(&format!(
            "<path class=\"series\" data-style=\"{}\" d=\"{}\" stroke=\"{}\" stroke-width=\"1.5\" fill=\"none\"/>\n",
            html_escape(style), path, color
        ));

        let ly = pad_t + 8.0 + i as f64 * 18.0;
        let lx = w - pad_r + 16.0;
        legend.push_str(&format!(
            "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"2\"/>\n\
             <text x=\"{:.1}\" y=\"{:.1}\" fill=\"{}\" font-size=\"12\">{}</text>\n",
            lx, ly, lx + 18.0, ly, color,
            lx + 24.0, ly + 4.0, dark_text, html_escape(style)
        ));
    }

    format!(
        "<div class=\"card\"><svg class=\"trend-svg\" width=\"{w}\" height=\"{h}\" xmlns=\"http://www.w3.org/2000/svg\">\n\
         <text x=\"{tx:.1}\" y=\"30\" text-anchor=\"middle\" fill=\"black\" font-size=\"24\" font-family=\"Arial, sans-serif\">{title}</text>\n\
         {y_labels}\n{x_labels}\n\
         <text x=\"{mx:.1}\" y=\"{my:.1}\" text-anchor=\"middle\" fill=\"{grey}\" font-size=\"11\">Month</text>\n\
         {lines}\
         <text x=\"{lgx:.1}\" y=\"{lgy:.1}\" fill=\"{dark}\" font-size=\"12\" font-weight=\"600\">Style</text>\n\
         {legend}\
         </svg></div>",
        w = w, h = h,
        tx = (pad_l + w - pad_r) / 2.0,
        title = CHART_TITLE,
        y_labels = y_labels, x_labels = x_labels,
        mx = (pad_l + w - pad_r) / 2.0, my = h - 4.0, grey = grey_text,
        lines = lines,
        lgx = w - pad_r + 16.0, lgy = pad_t - 8.0, dark = dark_text,
        legend = legend,
    )
}
