use crate::styles;
use crossterm::style::ContentStyle;
use phonetrace_lookup::{ChannelPresence, Confidence, LookupResult};
use std::fmt::Write;

const LABEL_WIDTH: usize = 12;

/// Applies styles only when writing to a terminal.
#[derive(Debug, Clone, Copy)]
pub struct Painter {
    color: bool,
}

impl Painter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn paint(&self, style: ContentStyle, text: &str) -> String {
        if self.color {
            style.apply(text).to_string()
        } else {
            text.to_string()
        }
    }
}

fn confidence_style(confidence: Confidence) -> ContentStyle {
    match confidence {
        Confidence::High => styles::confidence_high(),
        Confidence::Medium => styles::confidence_medium(),
        Confidence::Low => styles::confidence_low(),
    }
}

fn field(out: &mut String, p: Painter, label: &str, value: &str) {
    let value = if value.trim().is_empty() { "-" } else { value };
    let _ = writeln!(
        out,
        "  {} {}",
        p.paint(styles::label(), &format!("{label:<LABEL_WIDTH$}")),
        p.paint(styles::value(), value)
    );
}

fn channel(out: &mut String, p: Painter, label: &str, presence: &ChannelPresence) {
    let status = if presence.available {
        p.paint(styles::available(), "available")
    } else {
        p.paint(styles::unavailable(), "not found")
    };
    let mut line = format!(
        "  {} {status}",
        p.paint(styles::label(), &format!("{label:<LABEL_WIDTH$}"))
    );
    if !presence.link.trim().is_empty() {
        let _ = write!(line, "  {}", p.paint(styles::link(), presence.link.trim()));
    }
    if !presence.note.trim().is_empty() {
        let _ = write!(line, "  ({})", presence.note.trim());
    }
    let _ = writeln!(out, "{line}");
}

/// The result card printed after a successful lookup.
pub fn render_card(result: &LookupResult, p: Painter) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{}  {} {}",
        p.paint(styles::title(), &result.phone_number),
        p.paint(styles::label(), "confidence:"),
        p.paint(confidence_style(result.confidence), result.confidence.as_str())
    );

    let _ = writeln!(out, "{}", p.paint(styles::section(), "Identity"));
    field(&mut out, p, "Name", &result.name);
    field(&mut out, p, "Admin name", &result.admin_name);

    let _ = writeln!(out, "{}", p.paint(styles::section(), "Location"));
    field(&mut out, p, "City", &result.city);
    field(&mut out, p, "Region", &result.location);

    let _ = writeln!(out, "{}", p.paint(styles::section(), "Network"));
    field(&mut out, p, "Carrier", &result.carrier);
    field(&mut out, p, "Line type", &result.line_type);

    let _ = writeln!(out, "{}", p.paint(styles::section(), "Social presence"));
    channel(&mut out, p, "WhatsApp", &result.social_presence.whatsapp);
    channel(&mut out, p, "Telegram", &result.social_presence.telegram);

    let _ = writeln!(out, "{}", p.paint(styles::section(), "Summary"));
    let _ = writeln!(out, "  {}", result.summary.trim());

    if !result.sources.is_empty() {
        let _ = writeln!(out, "{}", p.paint(styles::section(), "Sources"));
        for (i, source) in result.sources.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {}. {}  {}",
                i + 1,
                source.title,
                p.paint(styles::link(), &source.uri)
            );
        }
    }

    out
}

pub fn render_json(result: &LookupResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(result)
}

pub fn render_error(message: &str, p: Painter) -> String {
    format!("{} {message}", p.paint(styles::error(), "error:"))
}
