//! Result Formatter
//!
//! Pure transforms from a `ToolResult` to one of four textual encodings:
//! structured JSON passthrough, Markdown, flattened plain text, and
//! escaped HTML. Every encoding represents every field of the payload;
//! nested structures render recursively. Unknown format names are an
//! `UnsupportedFormat` error - there is no silent default.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use toolgate_foundation::{Error, Result, ToolResult};

// ============================================================================
// Output Format
// ============================================================================

/// Supported output encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Markdown,
    Text,
    Html,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "markdown",
            Self::Text => "text",
            Self::Html => "html",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "markdown" => Ok(Self::Markdown),
            "text" => Ok(Self::Text),
            "html" => Ok(Self::Html),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Json
    }
}

// ============================================================================
// Formatted Result
// ============================================================================

/// Metadata attached to a formatted result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatMetadata {
    pub tool_name: String,
    pub cached: bool,
    pub format: OutputFormat,
    pub timestamp: DateTime<Utc>,
}

/// A per-call response entry: structured payload plus its rendering
///
/// Transient - constructed per response, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormattedResult {
    /// The structured result (success/data/error shape)
    pub result: Value,

    /// Rendered string in the requested encoding
    pub formatted: String,

    pub metadata: FormatMetadata,
}

/// Render a call's result and wrap it with metadata
pub fn format_call_result(
    tool_name: &str,
    result: &ToolResult,
    cached: bool,
    format: OutputFormat,
    include_metadata: bool,
) -> Result<FormattedResult> {
    let formatted = format_result(result, format, include_metadata)?;
    Ok(FormattedResult {
        result: serde_json::to_value(result)?,
        formatted,
        metadata: FormatMetadata {
            tool_name: tool_name.to_string(),
            cached,
            format,
            timestamp: Utc::now(),
        },
    })
}

// ============================================================================
// Encoders
// ============================================================================

/// Render a tool result in the requested encoding
///
/// With `include_metadata` the full success/data/error structure is
/// rendered; without it, only the payload (or the error for failures).
pub fn format_result(
    result: &ToolResult,
    format: OutputFormat,
    include_metadata: bool,
) -> Result<String> {
    let payload = if include_metadata {
        serde_json::to_value(result)?
    } else if result.success {
        result.data.clone().unwrap_or(Value::Null)
    } else {
        serde_json::json!({ "error": result.error_message() })
    };

    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&payload)
            .map_err(|e| Error::Formatting(e.to_string())),
        OutputFormat::Markdown => Ok(render_markdown(&payload, result.success)),
        OutputFormat::Text => Ok(render_text(&payload, result.success)),
        OutputFormat::Html => Ok(render_html(&payload, result.success)),
    }
}

fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ----------------------------------------------------------------------------
// Markdown
// ----------------------------------------------------------------------------

fn render_markdown(payload: &Value, success: bool) -> String {
    if !success {
        let message = payload
            .get("error")
            .map(scalar_to_string)
            .unwrap_or_else(|| pretty_json(payload));
        return format!("## Error\n\n{}", message);
    }

    match payload {
        Value::Object(map) => {
            let mut out = String::from("## Result\n\n");
            for (key, value) in map {
                match value {
                    Value::Object(_) | Value::Array(_) => {
                        out.push_str(&format!(
                            "**{}**:\n\n```json\n{}\n```\n\n",
                            key,
                            pretty_json(value)
                        ));
                    }
                    other => out.push_str(&format!("**{}**: {}\n\n", key, scalar_to_string(other))),
                }
            }
            out.trim_end().to_string()
        }
        Value::Array(items) => {
            let mut out = String::from("## Results\n\n");
            for item in items {
                match item {
                    Value::Object(_) | Value::Array(_) => {
                        out.push_str(&format!("- `{}`\n", item));
                    }
                    other => out.push_str(&format!("- {}\n", scalar_to_string(other))),
                }
            }
            out.trim_end().to_string()
        }
        other => format!("## Result\n\n{}", scalar_to_string(other)),
    }
}

// ----------------------------------------------------------------------------
// Plain text
// ----------------------------------------------------------------------------

fn render_text(payload: &Value, success: bool) -> String {
    if !success {
        let message = payload
            .get("error")
            .map(scalar_to_string)
            .unwrap_or_else(|| payload.to_string());
        return format!("error: {}", message);
    }

    let mut out = String::new();
    render_text_value(payload, 0, &mut out);
    out.trim_end().to_string()
}

fn render_text_value(value: &Value, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    match value {
        Value::Object(map) => {
            for (key, v) in map {
                match v {
                    Value::Object(_) | Value::Array(_) => {
                        out.push_str(&format!("{}{}:\n", pad, key));
                        render_text_value(v, indent + 1, out);
                    }
                    other => out.push_str(&format!("{}{}: {}\n", pad, key, scalar_to_string(other))),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::Object(_) | Value::Array(_) => {
                        out.push_str(&format!("{}-\n", pad));
                        render_text_value(item, indent + 1, out);
                    }
                    other => out.push_str(&format!("{}- {}\n", pad, scalar_to_string(other))),
                }
            }
        }
        other => out.push_str(&format!("{}{}\n", pad, scalar_to_string(other))),
    }
}

// ----------------------------------------------------------------------------
// HTML
// ----------------------------------------------------------------------------

/// Escape the five characters that matter in element and attribute context
fn html_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn render_html(payload: &Value, success: bool) -> String {
    if !success {
        let message = payload
            .get("error")
            .map(scalar_to_string)
            .unwrap_or_else(|| payload.to_string());
        return format!(
            "<div class=\"error-message\"><h3>Error</h3><p>{}</p></div>",
            html_escape(&message)
        );
    }

    match payload {
        Value::Object(map) => {
            let mut rows = String::new();
            for (key, value) in map {
                let cell = match value {
                    Value::Object(_) | Value::Array(_) => {
                        format!("<pre>{}</pre>", html_escape(&pretty_json(value)))
                    }
                    other => html_escape(&scalar_to_string(other)),
                };
                rows.push_str(&format!(
                    "<tr><th>{}</th><td>{}</td></tr>",
                    html_escape(key),
                    cell
                ));
            }
            format!(
                "<div class=\"result-container\"><h3>Result</h3><table class=\"result-table\">{}</table></div>",
                rows
            )
        }
        Value::Array(items) => {
            let list: String = items
                .iter()
                .map(|item| match item {
                    Value::Object(_) | Value::Array(_) => {
                        format!("<li><pre>{}</pre></li>", html_escape(&pretty_json(item)))
                    }
                    other => format!("<li>{}</li>", html_escape(&scalar_to_string(other))),
                })
                .collect();
            format!(
                "<div class=\"result-list\"><h3>Results</h3><ul>{}</ul></div>",
                list
            )
        }
        other => format!(
            "<div class=\"result-text\"><h3>Result</h3><p>{}</p></div>",
            html_escape(&scalar_to_string(other))
        ),
    }
}
