use atty::Stream;
use color_eyre::Result;
use serde_json::Value;
use wsx_core::api::{CommandInfo, CommandStatus, ExecutionOutcome};

use crate::style::Style;

#[derive(Clone, Copy, Debug)]
pub struct OutputOptions {
    pub quiet: bool,
    pub json: bool,
    pub no_color: bool,
}

pub fn exit_code(status: &CommandStatus) -> i32 {
    match status {
        CommandStatus::Ok => 0,
        CommandStatus::UserError => 1,
        CommandStatus::Failure => 2,
    }
}

pub fn emit_output(
    opts: &OutputOptions,
    info: CommandInfo,
    outcome: &ExecutionOutcome,
) -> Result<i32> {
    let code = exit_code(&outcome.status);
    let style = Style::new(opts.no_color, atty::is(Stream::Stdout));

    if opts.json {
        let payload = wsx_core::api::to_json_response(info, outcome);
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(code);
    }

    if let CommandStatus::Ok = outcome.status {
        if !opts.quiet {
            let message = wsx_core::api::format_status_message(info, &outcome.message);
            println!("{}", style.status(&outcome.status, &message));
            for line in render_body(&style, info, &outcome.details) {
                println!("{line}");
            }
            if let Some(hint) = hint_from_details(&outcome.details) {
                println!("{}", style.info(&format!("Tip: {hint}")));
            }
        }
    } else {
        // Failures go to stderr even under --quiet.
        let message = wsx_core::api::format_status_message(info, &outcome.message);
        eprintln!("{}", style.status(&outcome.status, &message));
        if let Some(error) = outcome.details.get("error").and_then(Value::as_str) {
            if !outcome.message.contains(error) {
                eprintln!("  {error}");
            }
        }
        if let Some(hint) = hint_from_details(&outcome.details) {
            eprintln!("{}", style.info(&format!("Hint: {hint}")));
        }
    }

    Ok(code)
}

fn hint_from_details(details: &Value) -> Option<&str> {
    details
        .as_object()
        .and_then(|map| map.get("hint"))
        .and_then(Value::as_str)
}

fn render_body(style: &Style, info: CommandInfo, details: &Value) -> Vec<String> {
    match info.name {
        "ls" => details
            .get("items")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|item| format!("  {item}"))
                    .collect()
            })
            .unwrap_or_default(),
        "status" => render_runs_table(style, details),
        "export" => render_export(details),
        _ => Vec::new(),
    }
}

/// Unsaved exports print their base64 content so it can be piped elsewhere.
fn render_export(details: &Value) -> Vec<String> {
    if details.get("saved_to").is_some_and(|saved| !saved.is_null()) {
        return Vec::new();
    }
    details
        .get("content")
        .and_then(Value::as_str)
        .map(|content| vec![content.to_string()])
        .unwrap_or_default()
}

struct RunRow {
    run_id: String,
    name: String,
    state: String,
    result: String,
}

fn render_runs_table(style: &Style, details: &Value) -> Vec<String> {
    let Some(summaries) = details.get("summaries").and_then(Value::as_array) else {
        return Vec::new();
    };
    if summaries.is_empty() {
        return Vec::new();
    }
    let text = |value: &Value, key: &str| {
        value
            .get(key)
            .and_then(|field| match field {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .unwrap_or_else(|| "-".to_string())
    };
    let rows: Vec<RunRow> = summaries
        .iter()
        .map(|summary| RunRow {
            run_id: text(summary, "run_id"),
            name: text(summary, "run_name"),
            state: text(summary, "life_cycle_state"),
            result: text(summary, "result_state"),
        })
        .collect();

    let headers = ["Run", "Name", "State", "Result"];
    let mut widths = headers.map(str::len);
    for row in &rows {
        widths[0] = widths[0].max(row.run_id.len());
        widths[1] = widths[1].max(row.name.len());
        widths[2] = widths[2].max(row.state.len());
        widths[3] = widths[3].max(row.result.len());
    }
    let line = |cells: [&str; 4]| {
        format!(
            "{:<w0$}  {:<w1$}  {:<w2$}  {:<w3$}",
            cells[0],
            cells[1],
            cells[2],
            cells[3],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
            w3 = widths[3],
        )
        .trim_end()
        .to_string()
    };

    let mut lines = vec![style.table_header(&line(headers))];
    lines.push(style.dimmed(&format!(
        "{:-<w0$}  {:-<w1$}  {:-<w2$}  {:-<w3$}",
        "",
        "",
        "",
        "",
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2],
        w3 = widths[3],
    )));
    for row in &rows {
        lines.push(line([
            row.run_id.as_str(),
            row.name.as_str(),
            row.state.as_str(),
            row.result.as_str(),
        ]));
    }
    lines
}
