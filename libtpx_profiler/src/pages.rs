//! Static HTML pages for browsing run profiles and plots.
use std::collections::BTreeMap;

use super::calendar::{month_caption, timestamp_label};
use super::constants::{SECONDS_IN_AN_HOUR, SECONDS_IN_A_DAY, SECONDS_IN_A_MINUTE};
use super::error::CalendarError;
use super::summary::RunSummary;

const PAGE_CSS: &str = r#"
  body, h1, h2, h3, p, ul, li, form {
    border:0;
    margin:0px;
    padding:0px;
  }

  body, form, input {
    color:#000000;
    font-family:Arial, Helvetica, sans-serif;
    font-size:12px;
  }

  h1{font-size:24px;}
  h2{font-size:18px;}
  h3{font-size:13px;}

  a:link, a:visited{
    color:#0033CC;
  }

  table{
    color: #222222;
    border-collapse: collapse;
    border-spacing: 0;
    margin: 20px;
    width: 90%;
  }

  td, th {
    border: 1px solid #cccccc;
    transition: all 0.3s;
    padding: 5px;
  }

  th {
    background: #e2e2e2;
    font-weight: bold;
  }

  td{
    background: #f5f5f5;
    font-family: Monospace;
  }

  td.number {
    text-align:right;
  }

  tr:nth-child(even) td {
    background: #f5f5f5;
  }

  tr:nth-child(odd) td {
    background: #fcfcfc;
  }

  tr td:hover {
    background: #778877;
    color: #ffffff;
  }

  #container{
    margin: 30px auto;
    width:100%;
  }

  #footer{
    clear:both;
    color:#666666;
    font-size:11px;
    text-align:center;
  }

  .caption {
    font-family:Arial, Helvetica, sans-serif;
    text-align:center;
  }
"#;

const PAGE_FOOTER: &str = "&copy; CERN@school";

/// Wrap table rows in the common page layout
fn make_page(table_rows: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <style>
{PAGE_CSS}
  </style>
</head>
<div id="container">

  <div id="main">
    <table>
{table_rows}
    </table>
  </div>

  <div id="footer">{PAGE_FOOTER}</div>

</div>
</html>
"#
    )
}

/// Escape text for an HTML element body or a quoted attribute
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Run length as whole days, hours and minutes
pub fn format_run_length(run_length_s: f64) -> String {
    let total = run_length_s.max(0.0) as i64;
    let days = total / SECONDS_IN_A_DAY;
    let hours = (total % SECONDS_IN_A_DAY) / SECONDS_IN_AN_HOUR;
    let mins = (total % SECONDS_IN_AN_HOUR) / SECONDS_IN_A_MINUTE;
    format!("{days:3} days, {hours:3} hours, {mins:2} mins.")
}

/// Table of run summaries, one row per run ID
pub fn make_profile_page(summaries: &BTreeMap<String, RunSummary>) -> Result<String, CalendarError> {
    let mut rows = String::from(
        r#"      <tr>
        <th>Run ID</th>
        <th>Frames</th>
        <th>Size [B]</th>
        <th>Start time</th>
        <th>&Delta; <em>T</em></th>
        <th>&Delta; <em>t</em> [s]</th>
        <th>&delta; <em>t</em> [s]</th>
        <th>File name</th>
      </tr>
"#,
    );
    for (run_id, summary) in summaries {
        rows.push_str(&format!(
            r#"      <tr>
        <td>{}</td>
        <td class="number">{}</td>
        <td class="number">{}</td>
        <td>{}</td>
        <td>{}</td>
        <td class="number">{:.2}</td>
        <td class="number">{:.4}</td>
        <td>{}</td>
      </tr>
"#,
            escape_html(run_id),
            summary.n_frames,
            summary.file_size_bytes(),
            timestamp_label(summary.start_time_s)?,
            format_run_length(summary.run_length_s),
            summary.mean_interval_s,
            summary.acq_time_s,
            escape_html(&summary.file_name)
        ));
    }
    Ok(make_page(&rows))
}

/// One column per month: the plot image above a "January 2012" caption.
///
/// `plots` maps `YYYY-MM` month IDs to image paths.
pub fn make_plot_page(plots: &BTreeMap<String, String>) -> Result<String, CalendarError> {
    let mut images = String::from("      <tr>");
    let mut captions = String::from("      <tr>");
    for (month_id, image) in plots {
        images.push_str(&format!(
            r#"<td><img src="{}" /></td>"#,
            escape_html(image)
        ));
        captions.push_str(&format!(
            r#"<td class="caption">{}</td>"#,
            month_caption(month_id)?
        ));
    }
    images.push_str("</tr>\n");
    captions.push_str("</tr>\n");
    Ok(make_page(&(images + &captions)))
}

/// One row per hour of a day: the hour number and its plot
pub fn make_day_plot_page(plots: &BTreeMap<u32, String>) -> String {
    let mut rows = String::new();
    for (hour, image) in plots {
        rows.push_str(&format!(
            "      <tr><td class=\"number\">{hour:02}</td><td><img style=\"width: 100%\" src=\"{}\" /></td></tr>\n",
            escape_html(image)
        ));
    }
    make_page(&rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_length() {
        assert_eq!(format_run_length(0.0), "  0 days,   0 hours,  0 mins.");
        assert_eq!(
            format_run_length((2 * 86400 + 3 * 3600 + 4 * 60 + 59) as f64),
            "  2 days,   3 hours,  4 mins."
        );
    }

    #[test]
    fn test_profile_page() {
        let mut summaries = BTreeMap::new();
        summaries.insert(
            String::from("F03-W0098_2012-01-01-000000"),
            RunSummary {
                chip_id: String::from("F03-W0098"),
                start_time_s: 1325376000,
                run_length_s: 90000.0,
                mean_interval_s: 12.5,
                acq_time_s: 0.1,
                file_name: String::from("tpx01_run.bin"),
                n_frames: 7201,
            },
        );
        let page = make_profile_page(&summaries).unwrap();
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<td>F03-W0098_2012-01-01-000000</td>"));
        assert!(page.contains(r#"<td class="number">57608</td>"#));
        assert!(page.contains("<td>2012-01-01-000000</td>"));
        assert!(page.contains("  1 days,   1 hours,  0 mins."));
        assert!(page.contains(r#"<td class="number">12.50</td>"#));
        assert!(page.contains(r#"<td class="number">0.1000</td>"#));
        assert!(page.contains("td.number"));
    }

    #[test]
    fn test_names_are_escaped() {
        assert_eq!(escape_html(r#"a<b>&"c""#), "a&lt;b&gt;&amp;&quot;c&quot;");
        let summaries = BTreeMap::from([(
            String::from("<run>"),
            RunSummary {
                chip_id: String::from("F03-W0098"),
                start_time_s: 1325376000,
                run_length_s: 0.0,
                mean_interval_s: 0.0,
                acq_time_s: 1.0,
                file_name: String::from("tpx01_a&b.bin"),
                n_frames: 1,
            },
        )]);
        let page = make_profile_page(&summaries).unwrap();
        assert!(page.contains("<td>&lt;run&gt;</td>"));
        assert!(page.contains("<td>tpx01_a&amp;b.bin</td>"));
        assert!(!page.contains("<run>"));
    }

    #[test]
    fn test_plot_pages() {
        let plots = BTreeMap::from([
            (String::from("2012-02"), String::from("2012-02.png")),
            (String::from("2012-01"), String::from("2012-01.png")),
        ]);
        let page = make_plot_page(&plots).unwrap();
        let january = page.find("January 2012").unwrap();
        let february = page.find("February 2012").unwrap();
        assert!(january < february);
        assert!(page.find("2012-01.png").unwrap() < page.find("2012-02.png").unwrap());

        let bad = BTreeMap::from([(String::from("2012-13"), String::from("x.png"))]);
        assert!(make_plot_page(&bad).is_err());

        let hours = BTreeMap::from([(3, String::from("03.png")), (12, String::from("12.png"))]);
        let page = make_day_plot_page(&hours);
        assert!(page.contains(r#"<td class="number">03</td>"#));
        assert!(page.contains(r#"src="12.png""#));
    }
}
