use tower_lsp::lsp_types::{Location as LspLocation, SymbolInformation, SymbolKind, Url};

use crate::document::DocumentStore;
use crate::engine::Location;
use crate::position::name_range;
use crate::symbols::{SymbolIndex, name_location};

/// Relevance of `name` for a lower-cased `query`; lower is better.
///
/// An empty query matches everything at rank 0.
pub fn relevance(name: &str, query: &str) -> u8 {
    if query.is_empty() {
        return 0;
    }

    let name = name.to_lowercase();
    if name == query {
        1
    } else if name.starts_with(query) {
        2
    } else if name.contains(query) {
        3
    } else {
        4
    }
}

/// Tokens, types and rules of every open document with a cached AST, filtered by
/// case-insensitive substring match and ordered by [`relevance`]. Documents are
/// visited in the order they were opened and the sort is stable.
pub fn search_symbols(query: &str, store: &DocumentStore) -> Vec<SymbolInformation> {
    let query = query.to_lowercase();
    let mut matches = Vec::new();

    for (uri, record) in store.iter() {
        let Some(ast) = record.ast.as_deref() else {
            continue;
        };
        let index = SymbolIndex::new(ast);
        let text = record.text.as_str();
        let declared_at = |name: &str, location: Option<Location>| {
            location.map(|location| name_location(text, name, location))
        };

        let tokens = index.token_declarations().flat_map(|decl| {
            decl.names.iter().map(move |name| {
                let location = declared_at(name, decl.location);
                (name.as_str(), SymbolKind::CONSTANT, "Tokens", location)
            })
        });
        let types = index.type_declarations().flat_map(|decl| {
            decl.names.iter().map(move |name| {
                let location = declared_at(name, decl.location);
                (name.as_str(), SymbolKind::CLASS, "Types", location)
            })
        });
        let rules = index
            .rules()
            .map(|rule| (rule.name.as_str(), SymbolKind::FUNCTION, "Rules", rule.location));

        for (name, kind, container, location) in tokens.chain(types).chain(rules) {
            let Some(location) = location else {
                continue;
            };
            if !name.to_lowercase().contains(&query) {
                continue;
            }
            matches.push((
                relevance(name, &query),
                symbol_information(name, kind, container, uri, location),
            ));
        }
    }

    matches.sort_by_key(|(rank, _)| *rank);
    matches.into_iter().map(|(_, symbol)| symbol).collect()
}

#[allow(deprecated)]
fn symbol_information(
    name: &str,
    kind: SymbolKind,
    container: &str,
    uri: &Url,
    location: Location,
) -> SymbolInformation {
    SymbolInformation {
        name: name.to_string(),
        kind,
        tags: None,
        deprecated: None,
        location: LspLocation::new(uri.clone(), name_range(location, name)),
        container_name: Some(container.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{SAMPLE_GRAMMAR, sample_ast};
    use rstest::rstest;

    fn store_with_sample() -> DocumentStore {
        let mut store = DocumentStore::new();
        let uri = Url::parse("file:///test/calc.y").unwrap();
        store.open(uri.clone(), SAMPLE_GRAMMAR.to_string(), 1);
        store.update_ast(&uri, sample_ast().into());
        // Opened but never parsed: contributes nothing
        store.open(
            Url::parse("file:///test/other.y").unwrap(),
            "%%\n".to_string(),
            1,
        );
        store
    }

    #[rstest]
    #[case("expr", "", 0)]
    #[case("expr", "expr", 1)]
    #[case("EXPR", "expr", 1)]
    #[case("expression", "expr", 2)]
    #[case("subexpr", "expr", 3)]
    #[case("NUMBER", "expr", 4)]
    fn relevance_ranks(#[case] name: &str, #[case] query: &str, #[case] expected: u8) {
        assert_eq!(relevance(name, query), expected);
    }

    #[test]
    fn empty_query_returns_everything_in_declaration_order() {
        let store = store_with_sample();

        let symbols = search_symbols("", &store);
        let names: Vec<(&str, Option<&str>)> = symbols
            .iter()
            .map(|s| (s.name.as_str(), s.container_name.as_deref()))
            .collect();

        assert_eq!(
            names,
            vec![
                ("NUMBER", Some("Tokens")),
                ("IDENTIFIER", Some("Tokens")),
                ("expr", Some("Types")),
                ("program", Some("Rules")),
                ("expr", Some("Rules")),
            ]
        );
    }

    #[test]
    fn query_is_case_insensitive_and_ranked() {
        let store = store_with_sample();

        let symbols = search_symbols("Er", &store);
        let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();

        // NUMBER and IDENTIFIER contain "er"; nothing else does
        assert_eq!(names, vec!["NUMBER", "IDENTIFIER"]);
        assert_eq!(symbols[0].kind, SymbolKind::CONSTANT);
    }

    #[test]
    fn exact_match_sorts_before_substring_match() {
        let store = store_with_sample();

        let symbols = search_symbols("expr", &store);
        let kinds: Vec<SymbolKind> = symbols.iter().map(|s| s.kind).collect();

        assert_eq!(kinds, vec![SymbolKind::CLASS, SymbolKind::FUNCTION]);
        assert_eq!(
            symbols[1].location.range.start,
            tower_lsp::lsp_types::Position::new(6, 0)
        );
    }

    #[test]
    fn tokens_sharing_a_declaration_point_at_their_own_names() {
        let store = store_with_sample();

        let symbols = search_symbols("identifier", &store);

        assert_eq!(symbols.len(), 1);
        assert_eq!(
            symbols[0].location.range,
            tower_lsp::lsp_types::Range::new(
                tower_lsp::lsp_types::Position::new(0, 14),
                tower_lsp::lsp_types::Position::new(0, 24),
            )
        );
    }

    #[test]
    fn search_on_empty_store_is_empty() {
        assert!(search_symbols("", &DocumentStore::new()).is_empty());
    }
}
