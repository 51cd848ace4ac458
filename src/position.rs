//! Cursor resolution and coordinate conversion
//!
//! Editor positions are 0-based (line, character); engine locations are 1-based
//! (line, column). Conversion lives here so that every feature applies it exactly
//! once. Columns are counted in `char`s.

use tower_lsp::lsp_types::{Position, Range};

use crate::engine::Location;

/// `[A-Za-z0-9_]`
pub fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Converts an engine location to an editor position
pub fn to_position(location: Location) -> Position {
    Position::new(
        location.line.saturating_sub(1),
        location.column.saturating_sub(1),
    )
}

/// Single-line range covering `name` starting at an engine location
pub fn name_range(location: Location, name: &str) -> Range {
    let start = to_position(location);
    let end = Position::new(start.line, start.character + name.chars().count() as u32);
    Range::new(start, end)
}

/// Range from the start of the document to the line after its last line
pub fn full_document_range(text: &str) -> Range {
    Range::new(
        Position::new(0, 0),
        Position::new(text.lines().count() as u32, 0),
    )
}

/// Identifier under the cursor.
///
/// Extends left while the preceding character is an identifier character, then
/// right while the following one is. `None` when the line does not exist or no
/// identifier character touches the position, including positions past the end
/// of the line.
pub fn word_at(text: &str, position: Position) -> Option<String> {
    word_range_at(text, position).map(|(word, _)| word)
}

/// Like [`word_at`], also returning the editor range of the word
pub fn word_range_at(text: &str, position: Position) -> Option<(String, Range)> {
    let line = text.lines().nth(position.line as usize)?;
    let chars: Vec<char> = line.chars().collect();

    let cursor = position.character as usize;
    if cursor > chars.len() {
        return None;
    }
    let mut start = cursor;
    let mut end = cursor;

    while start > 0 && is_identifier_char(chars[start - 1]) {
        start -= 1;
    }
    while end < chars.len() && is_identifier_char(chars[end]) {
        end += 1;
    }

    if start == end {
        return None;
    }

    let word: String = chars[start..end].iter().collect();
    let range = Range::new(
        Position::new(position.line, start as u32),
        Position::new(position.line, end as u32),
    );
    Some((word, range))
}
