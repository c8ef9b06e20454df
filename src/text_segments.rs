//! Inline color markup: `"{gold}Gold{/} and {#FF0000}red{/}"`.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::color::Color;
use crate::logging::Logger;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSegment {
    pub text: String,
    pub color: Color,
}

pub type ColorAliases = HashMap<String, String>;

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{(/|[^{}]*)\}").expect("tag pattern is valid"))
}

fn hex_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^#(?:[0-9A-Fa-f]{6}|[0-9A-Fa-f]{8})$").expect("hex pattern is valid")
    })
}

/// Splits `text` into colored runs.
///
/// `{tag}` pushes a color, `{/}` pops the latest one. Untagged text is white,
/// and so is anything inside a tag that is neither an alias nor a hex value.
/// Empty runs are dropped; adjacent runs of the same color are not merged.
pub fn parse_segments(text: &str, aliases: &ColorAliases, logger: &dyn Logger) -> Vec<TextSegment> {
    let mut segments = Vec::new();
    let mut stack: Vec<Color> = Vec::new();
    let mut cursor = 0;

    for captures in tag_pattern().captures_iter(text) {
        let (Some(whole), Some(tag)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        push_segment(
            &mut segments,
            &text[cursor..whole.start()],
            current_color(&stack),
        );
        cursor = whole.end();

        if tag.as_str() == "/" {
            if stack.pop().is_none() {
                logger.debug("color tag close without a matching open");
            }
        } else {
            stack.push(resolve_tag(tag.as_str(), aliases, logger));
        }
    }

    push_segment(&mut segments, &text[cursor..], current_color(&stack));
    segments
}

fn resolve_tag(tag: &str, aliases: &ColorAliases, logger: &dyn Logger) -> Color {
    let tag = tag.trim();
    let value = aliases.get(tag).map(String::as_str).unwrap_or(tag);
    if hex_pattern().is_match(value) {
        if let Ok(color) = Color::parse_hex(value) {
            return color;
        }
    }
    logger.warn(&format!("unknown color tag '{tag}', using white"));
    Color::WHITE
}

fn current_color(stack: &[Color]) -> Color {
    stack.last().copied().unwrap_or(Color::WHITE)
}

fn push_segment(segments: &mut Vec<TextSegment>, text: &str, color: Color) {
    if text.is_empty() {
        return;
    }
    segments.push(TextSegment {
        text: text.to_owned(),
        color,
    });
}
