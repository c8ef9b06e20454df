//! Text laid out as one tile per character.

use std::mem;

use super::Display;
use crate::animation::{ColorAnimation, ColorBounds, ColorField, Timeline};
use crate::color::Color;
use crate::text_segments::parse_segments;
use crate::tile::{TileConfig, TileId};

/// Fades each character's foreground in from `from`, one after another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reveal {
    pub from: Color,
    /// Seconds between consecutive characters starting.
    pub delay: f64,
    /// Seconds each character takes.
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringOptions {
    pub z_index: i32,
    pub bg: Color,
    pub reveal: Option<Reveal>,
    pub style: TileConfig,
}

impl Default for StringOptions {
    fn default() -> Self {
        Self {
            z_index: 1,
            bg: Color::TRANSPARENT,
            reveal: None,
            style: TileConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WrapOptions {
    pub text: StringOptions,
    /// Cells of space around the text inside the box.
    pub padding: u32,
    /// Fills the padded box one z-layer behind the text.
    pub box_bg: Option<Color>,
}

/// Tiles created for a wrapped string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WrappedString {
    pub text: Vec<TileId>,
    pub background: Vec<TileId>,
    pub lines: usize,
}

type Cell = (char, Color);

impl Display {
    /// Lays `text` out from `(x, y)`, one tile per character; `\n` starts a
    /// new row at `x`. Color tags are resolved against the display's aliases.
    pub fn create_string(&mut self, x: i64, y: i64, text: &str, options: &StringOptions) -> Vec<TileId> {
        let cells = self.colored_cells(text);
        let lines = cells
            .split(|(ch, _)| *ch == '\n')
            .map(<[Cell]>::to_vec)
            .collect::<Vec<_>>();
        self.place_lines(x, y, &lines, options)
    }

    /// Word-wraps `text` to `width` columns; words longer than a line are
    /// split. With padding or a box, the text starts `padding` cells in.
    pub fn create_wrapped_string(
        &mut self,
        x: i64,
        y: i64,
        width: u32,
        text: &str,
        options: &WrapOptions,
    ) -> WrappedString {
        let cells = self.colored_cells(text);
        let lines = wrap_cells(&cells, width.max(1) as usize);
        let padding = i64::from(options.padding);

        let mut background = Vec::new();
        if let Some(fill) = options.box_bg {
            let box_width = i64::from(width.max(1)) + padding * 2;
            let box_height = lines.len() as i64 + padding * 2;
            for row in 0..box_height {
                for column in 0..box_width {
                    background.push(self.create_tile(
                        (x + column) as f64,
                        (y + row) as f64,
                        " ",
                        Color::TRANSPARENT,
                        fill,
                        options.text.z_index - 1,
                        &TileConfig::default(),
                    ));
                }
            }
        }

        let text = self.place_lines(x + padding, y + padding, &lines, &options.text);
        WrappedString {
            text,
            background,
            lines: lines.len(),
        }
    }

    fn colored_cells(&self, text: &str) -> Vec<Cell> {
        parse_segments(text, &self.color_aliases, self.logger.as_ref())
            .into_iter()
            .flat_map(|segment| {
                let color = segment.color;
                segment.text.chars().map(move |ch| (ch, color)).collect::<Vec<_>>()
            })
            .collect()
    }

    fn place_lines(&mut self, x: i64, y: i64, lines: &[Vec<Cell>], options: &StringOptions) -> Vec<TileId> {
        let mut ids = Vec::new();

        for (row, line) in lines.iter().enumerate() {
            for (column, (ch, color)) in line.iter().enumerate() {
                let fg = match options.reveal {
                    Some(reveal) => reveal.from,
                    None => *color,
                };
                let id = self.create_tile(
                    (x + column as i64) as f64,
                    (y + row as i64) as f64,
                    ch.to_string(),
                    fg,
                    options.bg,
                    options.z_index,
                    &options.style,
                );

                if let Some(reveal) = options.reveal {
                    self.add_color_animation(
                        id,
                        ColorAnimation::new().delayed(ids.len() as f64 * reveal.delay).with(
                            ColorField::Fg,
                            Timeline::new(reveal.duration, ColorBounds::between(reveal.from, *color)),
                        ),
                    );
                }
                ids.push(id);
            }
        }
        ids
    }
}

/// Greedy word wrap over colored characters.
fn wrap_cells(cells: &[Cell], width: usize) -> Vec<Vec<Cell>> {
    let mut lines = Vec::new();
    for paragraph in cells.split(|(ch, _)| *ch == '\n') {
        let mut line: Vec<Cell> = Vec::new();
        for word in paragraph.split(|(ch, _)| *ch == ' ').filter(|word| !word.is_empty()) {
            if !line.is_empty() && line.len() + 1 + word.len() > width {
                lines.push(mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push((' ', word[0].1));
            }
            let mut rest = word;
            while line.len() + rest.len() > width {
                let room = width - line.len();
                if room == 0 {
                    lines.push(mem::take(&mut line));
                    continue;
                }
                line.extend_from_slice(&rest[..room]);
                lines.push(mem::take(&mut line));
                rest = &rest[room..];
            }
            line.extend_from_slice(rest);
        }
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::wrap_cells;
    use crate::color::Color;

    fn cells(text: &str) -> Vec<(char, Color)> {
        text.chars().map(|ch| (ch, Color::WHITE)).collect()
    }

    fn render(lines: &[Vec<(char, Color)>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.iter().map(|(ch, _)| *ch).collect())
            .collect()
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let lines = wrap_cells(&cells("the quick brown fox"), 10);
        assert_eq!(render(&lines), vec!["the quick", "brown fox"]);
    }

    #[test]
    fn splits_words_longer_than_the_line() {
        let lines = wrap_cells(&cells("abcdefgh ij"), 3);
        assert_eq!(render(&lines), vec!["abc", "def", "gh", "ij"]);
    }

    #[test]
    fn keeps_explicit_line_breaks() {
        let lines = wrap_cells(&cells("a\n\nb"), 5);
        assert_eq!(render(&lines), vec!["a", "", "b"]);
    }
}
