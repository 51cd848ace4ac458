use std::collections::HashSet;

use tower_lsp::lsp_types::{Location as LspLocation, Position};

use crate::engine::Location;
use crate::handlers::DocumentSnapshot;
use crate::position::{name_range, word_at};
use crate::symbols::SymbolIndex;

/// Declaration (optionally) plus every heuristic occurrence of the name under the
/// cursor. See [`SymbolIndex::occurrences`] for how usages are found.
pub fn references(
    doc: &DocumentSnapshot,
    position: Position,
    include_declaration: bool,
) -> Vec<LspLocation> {
    let Some(index) = doc.index() else {
        return Vec::new();
    };
    let Some(symbol) = word_at(doc.text(), position) else {
        return Vec::new();
    };

    symbol_references(&index, doc.text(), &symbol, include_declaration)
        .into_iter()
        .map(|location| LspLocation::new(doc.uri.clone(), name_range(location, &symbol)))
        .collect()
}

/// Engine-style locations of `symbol`, de-duplicated by (line, column).
///
/// With `include_declaration = false` the declaring location is removed even when
/// the text scan finds it, which happens for rule names.
pub fn symbol_references(
    index: &SymbolIndex,
    text: &str,
    symbol: &str,
    include_declaration: bool,
) -> Vec<Location> {
    let declaration = index.declaration_location(text, symbol);

    let mut seen = HashSet::new();
    let mut locations = Vec::new();

    if include_declaration {
        if let Some(location) = declaration {
            seen.insert(location);
            locations.push(location);
        }
    }

    for location in index.occurrences(text, symbol) {
        if !include_declaration && Some(location) == declaration {
            continue;
        }
        if seen.insert(location) {
            locations.push(location);
        }
    }

    locations
}
