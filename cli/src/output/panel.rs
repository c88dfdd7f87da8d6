//! Framed text panels for the terminal

use colored::{Color, Colorize};
use console::measure_text_width;

const MIN_WIDTH: usize = 40;
const MAX_WIDTH: usize = 100;

/// Width of the panel for the current terminal
pub fn panel_width() -> usize {
    let (_, columns) = console::Term::stdout().size();
    (columns as usize).clamp(MIN_WIDTH, MAX_WIDTH)
}

/// Greedy word wrap on display width; existing line breaks are kept and
/// lines that already fit are left untouched
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        if measure_text_width(paragraph) <= width {
            lines.push(paragraph.to_string());
            continue;
        }
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let needed = if current.is_empty() {
                measure_text_width(word)
            } else {
                measure_text_width(&current) + 1 + measure_text_width(word)
            };
            if needed > width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }
    lines
}

/// Render `body` inside a rounded box with `title` in the top border
pub fn render_panel(title: &str, body: &str, color: Color, width: usize) -> String {
    let inner = width.saturating_sub(4).max(1);
    let title = format!(" {} ", title);
    let title_width = measure_text_width(&title);
    let top_fill = (width.saturating_sub(2)).saturating_sub(title_width + 1);

    let mut out = String::new();
    out.push_str(&format!(
        "{}{}{}\n",
        "╭─".color(color),
        title.bold(),
        format!("{}╮", "─".repeat(top_fill)).color(color)
    ));
    for line in wrap_text(body, inner) {
        let pad = inner.saturating_sub(measure_text_width(&line));
        out.push_str(&format!(
            "{} {}{} {}\n",
            "│".color(color),
            line,
            " ".repeat(pad),
            "│".color(color)
        ));
    }
    out.push_str(
        &format!("╰{}╯", "─".repeat(width.saturating_sub(2)))
            .color(color)
            .to_string(),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_respects_width() {
        let lines = wrap_text("Ride up the Col de la Madone early in the morning", 16);
        assert!(lines.iter().all(|l| measure_text_width(l) <= 16));
        assert_eq!(lines.join(" "), "Ride up the Col de la Madone early in the morning");
    }

    #[test]
    fn test_wrap_keeps_paragraphs() {
        let lines = wrap_text("First line\n\nThird line", 40);
        assert_eq!(lines, vec!["First line", "", "Third line"]);
    }

    #[test]
    fn test_panel_lines_have_equal_width() {
        colored::control::set_override(false);
        let panel = render_panel("Cycling Assistant", "Sunny, 21°C. Great day for a ride.", Color::Green, 30);
        let widths: Vec<usize> = panel.lines().map(measure_text_width).collect();
        assert!(widths.iter().all(|w| *w == 30), "{:?}", widths);
        assert!(panel.starts_with("╭─ Cycling Assistant ─"));
    }
}
