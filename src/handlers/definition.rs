use tower_lsp::lsp_types::{Location as LspLocation, Position};

use crate::handlers::DocumentSnapshot;
use crate::position::{name_range, word_at};

/// Location of the token declaration or rule named under the cursor
pub fn definition(doc: &DocumentSnapshot, position: Position) -> Option<LspLocation> {
    let index = doc.index()?;
    let symbol = word_at(doc.text(), position)?;
    let location = index.declaration_location(doc.text(), &symbol)?;

    Some(LspLocation::new(
        doc.uri.clone(),
        name_range(location, &symbol),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ast::{GrammarAst, Location};
    use crate::handlers::test_support::{record, sample_record, sample_uri, token_decl};
    use tower_lsp::lsp_types::Range;

    #[test]
    fn definition_converts_engine_location() {
        let uri = sample_uri();
        let ast = GrammarAst {
            declarations: vec![token_decl(&["TEST"], None, Location::new(5, 10))],
            ..Default::default()
        };
        let record = record("%token TEST\n%%\nstart: TEST;\n", Some(ast));
        let doc = DocumentSnapshot::new(&uri, &record);

        let location = definition(&doc, Position::new(2, 9)).unwrap();

        assert_eq!(location.uri, uri);
        assert_eq!(
            location.range,
            Range::new(Position::new(4, 9), Position::new(4, 13))
        );
    }

    #[test]
    fn definition_of_second_declared_token_covers_its_name() {
        let uri = sample_uri();
        let record = sample_record();
        let doc = DocumentSnapshot::new(&uri, &record);

        // `IDENTIFIER` in `| IDENTIFIER`
        let location = definition(&doc, Position::new(8, 8)).unwrap();

        assert_eq!(
            location.range,
            Range::new(Position::new(0, 14), Position::new(0, 24))
        );
    }

    #[test]
    fn definition_jumps_to_rule() {
        let uri = sample_uri();
        let record = sample_record();
        let doc = DocumentSnapshot::new(&uri, &record);

        // `expr` inside `program: expr`
        let location = definition(&doc, Position::new(4, 11)).unwrap();

        assert_eq!(
            location.range,
            Range::new(Position::new(6, 0), Position::new(6, 4))
        );
    }

    #[test]
    fn definition_returns_none_for_undeclared_name() {
        let uri = sample_uri();
        let record = sample_record();
        let doc = DocumentSnapshot::new(&uri, &record);

        assert!(definition(&doc, Position::new(2, 7)).is_none());
    }
}
