//! Ledger-text tokenizer (spec.md §4.10): not part of the analytical core,
//! but the contract the editor's syntax highlighter relies on. Produces a
//! flat stream of tagged tokens; it does not build a parse tree.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    TagName,
    Number,
    Operator,
    String,
    Unit,
    Link,
    Comment,
    Strong,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerToken {
    pub kind: TokenKind,
    pub text: String,
    pub start: u32,
    pub end: u32,
}

/// From spec.md §4.10: `[^\][(); \t\n]((?!  )[^\][();\t\n])*` — any run of
/// characters excluding brackets/parens/semicolon/whitespace, where two
/// consecutive spaces or a tab terminates the match. The `regex` crate has
/// no lookahead, so this is scanned by hand instead of translated literally.
fn scan_account(text: &str) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut start = 0;
    while start < bytes.len() && (bytes[start] == b' ' || bytes[start] == b'\t') {
        start += 1;
    }
    if start >= bytes.len() || matches!(bytes[start], b'[' | b']' | b'(' | b')' | b';') {
        return None;
    }

    let mut end = start;
    while end < bytes.len() {
        let c = bytes[end];
        if matches!(c, b'[' | b']' | b'(' | b')' | b';' | b'\n' | b'\t') {
            break;
        }
        if c == b' ' && bytes.get(end + 1) == Some(&b' ') {
            break;
        }
        end += 1;
    }
    if end == start {
        None
    } else {
        Some((start, end))
    }
}

fn date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\d{4}[/-]\d{2}[/-]\d{2}(\s\d{2}:\d{2}:\d{2})?").expect("valid regex")
    })
}

fn amount_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-?\d[\d,]*(\.\d+)?").expect("valid regex"))
}

fn comment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r";.*$").expect("valid regex"))
}

/// Tokenizes one ledger-journal line for syntax highlighting. This is a
/// presentational tokenizer, not the parser that populates the posting
/// store — that external collaborator is assumed upstream (spec.md §6).
pub fn tokenize_line(line: &str) -> Vec<LedgerToken> {
    let mut tokens = Vec::new();

    if let Some(m) = comment_regex().find(line) {
        tokens.push(LedgerToken {
            kind: TokenKind::Comment,
            text: m.as_str().to_string(),
            start: m.start() as u32,
            end: m.end() as u32,
        });
        let head = &line[..m.start()];
        tokens.extend(tokenize_head(head));
        tokens.sort_by_key(|t| t.start);
        return tokens;
    }

    tokenize_head(line)
}

fn tokenize_head(line: &str) -> Vec<LedgerToken> {
    let mut tokens = Vec::new();

    if let Some(m) = date_regex().find(line) {
        tokens.push(LedgerToken {
            kind: TokenKind::Strong,
            text: m.as_str().to_string(),
            start: m.start() as u32,
            end: m.end() as u32,
        });
        return tokens;
    }

    if line.starts_with(' ') || line.starts_with('\t') {
        if let Some((start, end)) = scan_account(line) {
            tokens.push(LedgerToken {
                kind: TokenKind::TagName,
                text: line[start..end].to_string(),
                start: start as u32,
                end: end as u32,
            });
            let rest = &line[end..];
            if let Some(amount) = amount_regex().find(rest) {
                tokens.push(LedgerToken {
                    kind: TokenKind::Number,
                    text: amount.as_str().to_string(),
                    start: end as u32 + amount.start() as u32,
                    end: end as u32 + amount.end() as u32,
                });
            }
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_a_date_header_line() {
        let tokens = tokenize_line("2024/01/01 Broker purchase");
        assert_eq!(tokens[0].kind, TokenKind::Strong);
        assert_eq!(tokens[0].text, "2024/01/01");
    }

    #[test]
    fn recognizes_account_and_amount_on_a_posting_line() {
        let tokens = tokenize_line("    Assets:Checking  -1,000.00");
        assert!(tokens.iter().any(|t| t.kind == TokenKind::TagName && t.text == "Assets:Checking"));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Number));
    }

    #[test]
    fn recognizes_trailing_comment() {
        let tokens = tokenize_line("    Expenses:Food  100 ; lunch");
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Comment));
    }
}
