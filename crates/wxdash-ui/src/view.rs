//! Plain-text rendering of the dashboard for the terminal front-end.

use std::fmt::Write;

use wxdash_auth::AuthGateway;
use wxdash_weather::{ForecastRow, PipelineStatus};

use crate::models::DashboardModel;

const DATE_HEADING: &str = "Date";
const TEMP_HEADING: &str = "Max Temp (°C)";

/// Whole-screen render: selector, session line, then the forecast area.
pub fn render<G: AuthGateway>(model: &DashboardModel<G>) -> String {
    let mut out = String::new();

    let selector: Vec<String> = model
        .locations()
        .iter()
        .map(|name| {
            if name == model.selection() {
                format!("[{}]", name)
            } else {
                name.clone()
            }
        })
        .collect();
    let _ = writeln!(out, "Location: {}", selector.join("  "));

    let session = match (model.is_initialized(), model.is_authenticated()) {
        (false, _) => "Restoring session...",
        (true, true) => "Signed in",
        (true, false) => "Signed out (type 'login')",
    };
    let _ = writeln!(out, "{}", session);
    out.push('\n');

    match (model.status(), model.header()) {
        (PipelineStatus::Loading, _) => out.push_str("Loading...\n"),
        (PipelineStatus::Ready, Some(header)) => out.push_str(&render_table(&header, model.rows())),
        (PipelineStatus::Failed, _) => out.push_str("No forecast available.\n"),
        _ if !model.is_authenticated() => out.push_str("Log in to see the forecast.\n"),
        _ => {}
    }

    out
}

/// Header line followed by an aligned two-column table.
pub fn render_table(header: &str, rows: &[ForecastRow]) -> String {
    let date_width = rows
        .iter()
        .map(|r| r.date.chars().count())
        .chain(std::iter::once(DATE_HEADING.len()))
        .max()
        .unwrap_or_default();

    let mut out = String::new();
    let _ = writeln!(out, "{}", header);
    let _ = writeln!(out, "{:<width$}  {}", DATE_HEADING, TEMP_HEADING, width = date_width);
    for row in rows {
        let _ = writeln!(
            out,
            "{:<width$}  {:>5}",
            row.date,
            row.max_temperature,
            width = date_width
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(date: &str, temp: &str) -> ForecastRow {
        ForecastRow {
            date: date.to_string(),
            max_temperature: temp.to_string(),
        }
    }

    #[test]
    fn table_for_leeds() {
        let table = render_table(
            "7-Day Weather Forecast (Leeds)",
            &[row("Fri, Mar 1", "10.2"), row("Sat, Mar 2", "11.7")],
        );

        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "7-Day Weather Forecast (Leeds)");
        assert_eq!(lines[1], "Date        Max Temp (°C)");
        assert_eq!(lines[2], "Fri, Mar 1   10.2");
        assert_eq!(lines[3], "Sat, Mar 2   11.7");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn empty_table_has_headings() {
        let table = render_table("7-Day Weather Forecast (York)", &[]);
        assert_eq!(table.lines().nth(1), Some("Date  Max Temp (°C)"));
    }
}
