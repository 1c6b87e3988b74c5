//! ANSI color helpers for terminal output

use colored::Colorize;

/// Disable colors when stdout is not a terminal
pub fn init() {
    if !atty::is(atty::Stream::Stdout) {
        colored::control::set_override(false);
    }
}

/// Get colored timestamp
pub fn colored_time(time: &str) -> String {
    time.white().dimmed().to_string()
}

/// Get colored date
pub fn colored_date(date: &str) -> String {
    date.yellow().to_string()
}

/// Get colored streamer name
pub fn colored_streamer(name: &str) -> String {
    name.cyan().bold().to_string()
}

/// Get colored stream type; the restricted type stands out
pub fn colored_type(stream_type: &str, restricted_type: &str) -> String {
    if stream_type == restricted_type {
        stream_type.magenta().to_string()
    } else {
        stream_type.blue().to_string()
    }
}

/// Get colored line position
pub fn colored_position(position: &str) -> String {
    format!("{:>5}", position).white().dimmed().to_string()
}

/// Get colored header
pub fn header(text: &str) -> String {
    text.bold().underline().to_string()
}

/// Get colored label
pub fn label(text: &str) -> String {
    text.white().dimmed().to_string()
}

/// Get colored value
pub fn value(text: &str) -> String {
    text.white().to_string()
}

/// Highlight a matched span
pub fn highlight(text: &str) -> String {
    text.black().on_yellow().to_string()
}

/// Get colored success message
pub fn success(text: &str) -> String {
    format!("{} {}", "✓".green(), text)
}

/// Get colored warning message
pub fn warning(text: &str) -> String {
    format!("{} {}", "⚠".yellow(), text)
}

/// Get colored error message
pub fn error(text: &str) -> String {
    format!("{} {}", "✗".red(), text)
}

/// Format count with comma separators
pub fn format_count(n: u64) -> String {
    let s = n.to_string();
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::new();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }
}
