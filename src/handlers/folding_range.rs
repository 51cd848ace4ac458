//! Folding ranges from three independent scanners
//!
//! Results are merged and sorted by (start line, end line). Overlapping ranges are
//! left in place; clients cope with them.

use tower_lsp::lsp_types::{FoldingRange, FoldingRangeKind};

use crate::engine::GrammarAst;
use crate::handlers::DocumentSnapshot;

/// Lines folded below the last rule, which has no following rule to stop at
const LAST_RULE_FOLD_SPAN: u32 = 10;

pub fn folding_ranges(doc: &DocumentSnapshot) -> Vec<FoldingRange> {
    build_folding_ranges(doc.text(), doc.record.ast.as_deref())
}

pub fn build_folding_ranges(text: &str, ast: Option<&GrammarAst>) -> Vec<FoldingRange> {
    let lines: Vec<&str> = text.lines().collect();

    let mut ranges = Vec::new();
    if let Some(ast) = ast {
        ranges.extend(rule_folds(ast, lines.len()));
    }
    ranges.extend(comment_block_folds(&lines));
    ranges.extend(code_block_folds(&lines));
    ranges.extend(action_block_folds(&lines));

    ranges.sort_by_key(|range| (range.start_line, range.end_line));
    ranges
}

/// Rules with two or more alternatives fold up to the line before the next rule
pub fn rule_folds(ast: &GrammarAst, line_count: usize) -> Vec<FoldingRange> {
    let last_line = line_count.saturating_sub(1) as u32;
    let mut ranges = Vec::new();

    for (idx, rule) in ast.rules.iter().enumerate() {
        let Some(location) = rule.location else {
            continue;
        };
        if rule.alternatives.len() < 2 {
            continue;
        }

        let start = location.line.saturating_sub(1);
        let next_start = ast
            .rules
            .get(idx + 1)
            .and_then(|next| next.location)
            .map(|next| next.line.saturating_sub(1));
        let end = match next_start {
            Some(next_start) => next_start.saturating_sub(1),
            None => (start + LAST_RULE_FOLD_SPAN).min(last_line),
        };

        if end > start {
            ranges.push(fold(start, end, FoldingRangeKind::Region));
        }
    }

    ranges
}

/// `/*` ... `*/` spanning several lines
pub fn comment_block_folds(lines: &[&str]) -> Vec<FoldingRange> {
    let mut ranges = Vec::new();
    let mut open: Option<usize> = None;

    for (idx, line) in lines.iter().enumerate() {
        match open {
            None => {
                if let Some(pos) = line.find("/*") {
                    // A comment closed on its own line does not open a block
                    if !line[pos + 2..].contains("*/") {
                        open = Some(idx);
                    }
                }
            }
            Some(start) => {
                if line.contains("*/") {
                    ranges.push(fold(start as u32, idx as u32, FoldingRangeKind::Comment));
                    open = None;
                }
            }
        }
    }

    ranges
}

/// `%{` ... `%}` verbatim code sections
pub fn code_block_folds(lines: &[&str]) -> Vec<FoldingRange> {
    let mut ranges = Vec::new();
    let mut open: Option<usize> = None;

    for (idx, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        match open {
            None if trimmed == "%{" => open = Some(idx),
            Some(start) if trimmed == "%}" => {
                if idx > start {
                    ranges.push(fold(start as u32, idx as u32, FoldingRangeKind::Region));
                }
                open = None;
            }
            _ => {}
        }
    }

    ranges
}

/// `{` ... `}` action blocks; only the first brace on each line is considered
pub fn action_block_folds(lines: &[&str]) -> Vec<FoldingRange> {
    lines
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| {
            let brace = line.find('{')?;
            let end = matching_brace_line(lines, idx, brace)?;
            (end > idx).then(|| fold(idx as u32, end as u32, FoldingRangeKind::Region))
        })
        .collect()
}

/// Line holding the `}` that balances the `{` at byte `brace` of `start_line`
pub fn matching_brace_line(lines: &[&str], start_line: usize, brace: usize) -> Option<usize> {
    let mut depth = 1usize;

    for (line_idx, line) in lines.iter().enumerate().skip(start_line) {
        let rest = if line_idx == start_line {
            &line[brace + 1..]
        } else {
            line
        };
        for c in rest.chars() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(line_idx);
                    }
                }
                _ => {}
            }
        }
    }

    None
}

fn fold(start_line: u32, end_line: u32, kind: FoldingRangeKind) -> FoldingRange {
    FoldingRange {
        start_line,
        start_character: None,
        end_line,
        end_character: None,
        kind: Some(kind),
        collapsed_text: None,
    }
}
