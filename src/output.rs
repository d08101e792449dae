// ABOUTME: Terminal and JSON presentation for debate results.
// ABOUTME: Renders phase sections with per-provider colors; JSON output is the serialized record.

use clap::ValueEnum;
use owo_colors::{OwoColorize, Style};
use std::io::IsTerminal;

use council_core::{DebateRecord, DebateResult, ProviderKind, Reply};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn enabled(self) -> bool {
        match self {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => std::io::stdout().is_terminal(),
        }
    }
}

/// Render a debate result to a printable string in the requested format.
pub fn render(result: &DebateResult, format: OutputFormat, color: ColorMode) -> String {
    match format {
        OutputFormat::Json => {
            let record = DebateRecord::from(result);
            serde_json::to_string_pretty(&record)
                .unwrap_or_else(|err| format!("{{\"error\": \"failed to serialize result: {}\"}}", err))
        }
        OutputFormat::Text => render_text(result, &Palette::new(color.enabled())),
    }
}

pub fn print_result(result: &DebateResult, format: OutputFormat, color: ColorMode) {
    println!("{}", render(result, format, color));
}

struct Palette {
    enabled: bool,
}

impl Palette {
    fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn paint(&self, text: &str, style: Style) -> String {
        if self.enabled {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }

    fn provider_style(kind: ProviderKind) -> Style {
        let style = Style::new().bold();
        match kind {
            ProviderKind::Gemini => style.blue(),
            ProviderKind::Anthropic => style.yellow(),
            ProviderKind::OpenAi => style.green(),
        }
    }
}

fn render_text(result: &DebateResult, palette: &Palette) -> String {
    let mut out = String::new();
    render_section(&mut out, "Round 1", &result.round1, palette);
    render_section(&mut out, "Round 2 (Rebuttals)", &result.round2, palette);
    render_section(&mut out, "Moderator", result.moderator.as_slice(), palette);
    out.trim_end().to_string()
}

fn render_section(out: &mut String, title: &str, replies: &[Reply], palette: &Palette) {
    out.push_str(&palette.paint(&format!("=== {} ===", title), Style::new().bold()));
    out.push_str("\n\n");

    if replies.is_empty() {
        out.push_str("(no responses)\n\n");
        return;
    }

    for reply in replies {
        render_reply(out, reply, palette);
        out.push('\n');
    }
}

fn render_reply(out: &mut String, reply: &Reply, palette: &Palette) {
    let label = palette.paint(
        &reply.member.label(),
        Palette::provider_style(reply.member.provider),
    );
    out.push_str(&format!("[{}]\n", label));

    match &reply.error {
        Some(error) => {
            let line = palette.paint(&format!("ERROR: {}", error), Style::new().red().bold());
            out.push_str(&line);
            out.push('\n');
        }
        None => {
            let body = reply.text.trim();
            if body.is_empty() {
                out.push_str("(no response)\n");
            } else {
                out.push_str(body);
                out.push('\n');
            }
        }
    }
}
