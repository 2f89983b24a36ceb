//! Renderer module
//!
//! Renders ResultSet to different output formats: jsonl, json, md

use crate::core::model::{Kind, ResultItem, ResultSet};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jsonl,
    Json,
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jsonl" => Ok(OutputFormat::Jsonl),
            "json" => Ok(OutputFormat::Json),
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Render configuration combining format and options
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl RenderConfig {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            pretty: false,
        }
    }

    pub fn with_pretty(format: OutputFormat, pretty: bool) -> Self {
        Self { format, pretty }
    }
}

/// Renderer for result sets
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            config: RenderConfig::new(format),
        }
    }

    pub fn with_config(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render a result set to a string
    pub fn render(&self, result_set: &ResultSet) -> String {
        match self.config.format {
            OutputFormat::Jsonl => self.render_jsonl(result_set),
            OutputFormat::Json => self.render_json(result_set),
            OutputFormat::Markdown => self.render_markdown(result_set),
        }
    }

    /// Render as JSON Lines (one JSON object per line)
    fn render_jsonl(&self, result_set: &ResultSet) -> String {
        result_set
            .items
            .iter()
            .filter_map(|item| {
                if self.config.pretty {
                    serde_json::to_string_pretty(item).ok()
                } else {
                    serde_json::to_string(item).ok()
                }
            })
            .collect::<Vec<_>>()
            .join(if self.config.pretty { "\n\n" } else { "\n" })
    }

    /// Render as a single JSON array
    fn render_json(&self, result_set: &ResultSet) -> String {
        if self.config.pretty {
            serde_json::to_string_pretty(&result_set.items).unwrap_or_else(|_| "[]".to_string())
        } else {
            serde_json::to_string(&result_set.items).unwrap_or_else(|_| "[]".to_string())
        }
    }

    /// Render as Markdown
    fn render_markdown(&self, result_set: &ResultSet) -> String {
        let mut output = String::new();

        let mut entries = Vec::new();
        let mut statuses = Vec::new();

        for item in &result_set.items {
            match item.kind {
                Kind::Entry => entries.push(item),
                Kind::Status => statuses.push(item),
            }
        }

        if !entries.is_empty() {
            output.push_str("## Entries\n\n");
            for item in entries {
                self.render_entry_md(&mut output, item);
            }
            output.push('\n');
        }

        if !statuses.is_empty() {
            output.push_str("## Results\n\n");
            for item in statuses {
                let op = item.op.as_deref().unwrap_or("?");
                let outcome = if item.ok.unwrap_or(false) { "ok" } else { "failed" };
                output.push_str(&format!("- {}", op));
                if let Some(key) = &item.key {
                    output.push_str(&format!(" `{}`", key));
                }
                output.push_str(&format!(": {}", outcome));
                if let Some(count) = item.count {
                    output.push_str(&format!(" ({} entries)", count));
                }
                output.push('\n');
            }
            output.push('\n');
        }

        output
    }

    fn render_entry_md(&self, output: &mut String, item: &ResultItem) {
        let key = item.key.as_deref().unwrap_or("");
        output.push_str(&format!("- `{}`", key));

        if let Some(expires) = &item.expires {
            output.push_str(&format!(" (expires: {})", expires));
        }
        if item.expired == Some(true) {
            output.push_str(" **expired**");
        }
        if let Some(value) = &item.value {
            output.push_str(&format!(": `{}`", value));
        }

        output.push('\n');
    }
}
