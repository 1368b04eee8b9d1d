use std::fmt::Display;

use crate::atom::{classify, Atom, LiteralError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Assignment,
    MethodDefinition,
    Block,
}

impl Display for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Marker::Assignment => write!(f, "="),
            Marker::MethodDefinition => write!(f, ">>"),
            Marker::Block => write!(f, ":"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineItem {
    Atom(Atom),
    Marker(Marker),
}

impl Display for LineItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineItem::Atom(atom) => write!(f, "{}", atom),
            LineItem::Marker(marker) => write!(f, "{}", marker),
        }
    }
}

/// One physical source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 1-based line number.
    pub number: usize,
    /// Count of leading spaces.
    pub indent: usize,
    pub items: Vec<LineItem>,
    /// Text after `--`, verbatim.
    pub comment: Option<String>,
}

impl Line {
    pub fn is_blank(&self) -> bool {
        self.items.is_empty() && self.comment.is_none()
    }

    pub fn is_comment_only(&self) -> bool {
        self.items.is_empty() && self.comment.is_some()
    }

    pub fn is_substantial(&self) -> bool {
        !self.items.is_empty()
    }
}

impl Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:indent$}", "", indent = self.indent)?;
        let items = self
            .items
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        write!(f, "{}", items)?;
        if let Some(comment) = &self.comment {
            if !self.items.is_empty() {
                write!(f, " ")?;
            }
            write!(f, "--{}", comment)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Line {line}: {error}")]
pub struct LexError {
    pub line: usize,
    #[source]
    pub error: LexErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexErrorKind {
    #[error(transparent)]
    Literal(#[from] LiteralError),
    #[error("Tab in indentation")]
    TabIndent,
}

pub fn lines(source: &str) -> Result<Vec<Line>, LexError> {
    source
        .lines()
        .enumerate()
        .map(|(index, text)| line(index + 1, text))
        .collect()
}

pub fn line(number: usize, source: &str) -> Result<Line, LexError> {
    let indent = source.chars().take_while(|c| *c == ' ').count();
    let mut remaining = &source[indent..];
    if remaining
        .chars()
        .take_while(|c| c.is_whitespace())
        .any(|c| c == '\t')
    {
        return Err(LexError {
            line: number,
            error: LexErrorKind::TabIndent,
        });
    }
    let mut items = Vec::new();
    let mut comment = None;

    while let Some((token, rest)) = token(remaining) {
        remaining = rest;
        match token {
            Token::Marker(marker) => items.push(LineItem::Marker(marker)),
            Token::Word(word) => {
                let atom = classify(word).map_err(|error| LexError {
                    line: number,
                    error: error.into(),
                })?;
                items.push(LineItem::Atom(atom));
            }
            Token::Comment(text) => comment = Some(text.to_string()),
        }
    }

    Ok(Line {
        number,
        indent,
        items,
        comment,
    })
}

#[derive(Debug)]
enum Token<'a> {
    Marker(Marker),
    Word(&'a str),
    Comment(&'a str),
}

fn token(mut source: &str) -> Option<(Token<'_>, &str)> {
    while let Some(((), rest)) = whitespace(source) {
        source = rest;
    }

    if source.is_empty() {
        return None;
    }

    comment(source)
        .or_else(|| {
            maximal(&[assignment, method_definition, block], source)
                .map(|(marker, rest)| (Token::Marker(marker), rest))
        })
        .or_else(|| word(source))
}

fn maximal<'a, T: std::fmt::Debug>(
    parsers: &[fn(&str) -> Option<(T, &str)>],
    source: &'a str,
) -> Option<(T, &'a str)> {
    let mut min_left = source.len() + 1;
    let mut max_match = None;

    let matching_parsers = parsers.iter().filter_map(|parser| parser(source));
    for (m, rest) in matching_parsers {
        let left = rest.len();
        if left < min_left {
            min_left = left;
            max_match = Some((m, rest));
        }
    }

    max_match
}

fn whitespace(source: &str) -> Option<((), &str)> {
    let len = source
        .chars()
        .take_while(|c| c.is_whitespace())
        .map(char::len_utf8)
        .sum();
    if len > 0 {
        Some(((), &source[len..]))
    } else {
        None
    }
}

fn comment(source: &str) -> Option<(Token<'_>, &str)> {
    source
        .strip_prefix("--")
        .map(|text| (Token::Comment(text), &source[source.len()..]))
}

macro_rules! match_literal {
    ($name:ident, $word:literal, $marker:expr) => {
        fn $name(source: &str) -> Option<(Marker, &str)> {
            if source.starts_with($word) {
                Some(($marker, &source[$word.len()..]))
            } else {
                None
            }
        }
    };
}

match_literal! { assignment, "=", Marker::Assignment }
match_literal! { method_definition, ">>", Marker::MethodDefinition }
match_literal! { block, ":", Marker::Block }

fn ends_word(rest: &str) -> bool {
    rest.starts_with(|c: char| c.is_whitespace() || c == ':' || c == '=')
        || rest.starts_with("--")
        || rest.starts_with(">>")
}

fn word(source: &str) -> Option<(Token<'_>, &str)> {
    let len = source
        .char_indices()
        .find(|(index, _)| ends_word(&source[*index..]))
        .map_or(source.len(), |(index, _)| index);

    if len > 0 {
        Some((Token::Word(&source[..len]), &source[len..]))
    } else {
        None
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::number::Number;

    fn identifier(name: &str) -> LineItem {
        LineItem::Atom(Atom::Identifier(name.to_string()))
    }

    fn number(n: Number) -> LineItem {
        LineItem::Atom(Atom::Number(n))
    }

    #[test]
    fn test_words_and_markers() {
        let line = line(1, "  abc def  =    10   20").unwrap();
        let expected = Line {
            number: 1,
            indent: 2,
            items: vec![
                identifier("abc"),
                identifier("def"),
                LineItem::Marker(Marker::Assignment),
                number(Number::I32(10)),
                number(Number::I32(20)),
            ],
            comment: None,
        };
        assert_eq!(line, expected);
    }

    #[test]
    fn test_markers_split_words() {
        let line = line(1, "f>>x y=1 block:").unwrap();
        assert_eq!(
            line.items,
            vec![
                identifier("f"),
                LineItem::Marker(Marker::MethodDefinition),
                identifier("x"),
                identifier("y"),
                LineItem::Marker(Marker::Assignment),
                number(Number::I32(1)),
                identifier("block"),
                LineItem::Marker(Marker::Block),
            ]
        );
    }

    #[test]
    fn test_comments() {
        let line = line(3, "abc--de").unwrap();
        assert_eq!(line.items, vec![identifier("abc")]);
        assert_eq!(line.comment.as_deref(), Some("de"));

        let line = super::line(4, "    -- de").unwrap();
        assert!(line.is_comment_only());
        assert_eq!(line.indent, 4);
        assert_eq!(line.comment.as_deref(), Some(" de"));
    }

    #[test]
    fn test_single_dash_is_literal() {
        let line = line(1, "a-b-c 123- x > y").unwrap();
        assert_eq!(
            line.items,
            vec![
                identifier("a-b-c"),
                number(Number::I32(-123)),
                identifier("x"),
                identifier(">"),
                identifier("y"),
            ]
        );
        assert_eq!(line.comment, None);
    }

    #[test]
    fn test_comment_inside_hex_literal() {
        let line = line(1, "0x1-2--xyz").unwrap();
        assert_eq!(line.items, vec![number(Number::U8(0x12))]);
        assert_eq!(line.comment.as_deref(), Some("xyz"));
    }

    #[test]
    fn test_lines() {
        assert_eq!(lines("").unwrap(), Vec::<Line>::new());
        assert_eq!(lines("a\n").unwrap().len(), 1);

        let lines = lines("\n    \r\nb").unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].is_blank());
        assert_eq!(lines[1].indent, 4);
        assert!(lines[1].is_blank());
        assert_eq!(lines[2].number, 3);
        assert!(lines[2].is_substantial());
    }

    #[test]
    fn test_literal_error_reports_line() {
        let error = lines("a\nb 12q").unwrap_err();
        assert_eq!(error.line, 2);
        assert!(matches!(
            error.error,
            LexErrorKind::Literal(LiteralError::UnrecognizedSuffix { .. })
        ));
    }

    #[test]
    fn test_tab_indentation_is_rejected() {
        for source in ["\tx", "  \tx", " \t", "a\n\t-- note"] {
            let error = lines(source).unwrap_err();
            assert_eq!(error.error, LexErrorKind::TabIndent, "{source:?}");
        }
        let line = line(1, "a\tb").unwrap();
        assert_eq!(line.items, vec![identifier("a"), identifier("b")]);
    }

    #[test]
    fn test_display_relexes() {
        for source in ["  a b = 1 2 --note", "-- only", "    ", "f >> x :", "5ib- 0"] {
            let line = line(1, source).unwrap();
            assert_eq!(super::line(1, &line.to_string()).unwrap(), line);
        }
    }
}
