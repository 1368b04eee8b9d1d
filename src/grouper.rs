use std::fmt::Display;

use crate::lexer::Line;

/// Lines sharing one indentation level, with deeper levels nested as
/// sibling items directly after the line that introduced them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Group {
    pub items: Vec<GroupItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupItem {
    Line(Line),
    Group(Group),
}

impl Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for item in &self.items {
            match item {
                GroupItem::Line(line) => writeln!(f, "{}", line)?,
                GroupItem::Group(group) => write!(f, "{}", group)?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndentError {
    #[error("Line {line}: indent of {indent} spaces is not a multiple of two")]
    OddIndent { line: usize, indent: usize },
    #[error("Line {line}: indented to level {level} with only {open} levels open")]
    UnexpectedIndent {
        line: usize,
        level: usize,
        open: usize,
    },
}

pub fn group(lines: Vec<Line>) -> Result<Group, IndentError> {
    let mut grouper = Grouper::new();
    for line in lines {
        grouper.line(line)?;
    }
    Ok(grouper.finish())
}

/// Blank and comment-only lines wait in `pending` until the next substantial
/// line (or the end of input) confirms which level they belong to. Only a
/// substantial line opens a new level; comments ahead of it stay outside.
struct Grouper {
    open: Vec<Group>,
    pending: Vec<Line>,
}

impl Grouper {
    fn new() -> Self {
        Self {
            open: vec![Group::default()],
            pending: Vec::new(),
        }
    }

    /// Level of the innermost open group.
    fn depth(&self) -> usize {
        self.open.len().saturating_sub(1)
    }

    fn line(&mut self, line: Line) -> Result<(), IndentError> {
        if !line.is_substantial() {
            self.pending.push(line);
            return Ok(());
        }

        if line.indent % 2 != 0 {
            return Err(IndentError::OddIndent {
                line: line.number,
                indent: line.indent,
            });
        }

        // A dedenting comment closes groups, so the bound is checked after it lands.
        self.flush_pending();
        let level = line.indent / 2;
        if level > self.depth() + 1 {
            return Err(IndentError::UnexpectedIndent {
                line: line.number,
                level,
                open: self.open.len(),
            });
        }

        self.place(level, line);
        Ok(())
    }

    fn flush_pending(&mut self) {
        for line in std::mem::take(&mut self.pending) {
            if line.is_blank() {
                self.push_line(line);
            } else {
                self.place(self.depth().min(line.indent / 2), line);
            }
        }
    }

    fn place(&mut self, level: usize, line: Line) {
        if level == self.open.len() {
            self.open.push(Group::default());
        }
        while self.open.len() > level + 1 {
            self.close();
        }
        self.push_line(line);
    }

    fn push_line(&mut self, line: Line) {
        if let Some(top) = self.open.last_mut() {
            top.items.push(GroupItem::Line(line));
        }
    }

    fn close(&mut self) {
        if let Some(group) = self.open.pop() {
            if let Some(parent) = self.open.last_mut() {
                parent.items.push(GroupItem::Group(group));
            }
        }
    }

    fn finish(mut self) -> Group {
        self.flush_pending();
        while self.open.len() > 1 {
            self.close();
        }
        self.open.pop().unwrap_or_default()
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::lexer::lines;

    fn group_source(source: &str) -> Group {
        group(lines(source).unwrap()).unwrap()
    }

    fn line(number: usize, source: &str) -> GroupItem {
        GroupItem::Line(crate::lexer::line(number, source).unwrap())
    }

    fn nested(items: Vec<GroupItem>) -> GroupItem {
        GroupItem::Group(Group { items })
    }

    #[test]
    fn test_no_lines() {
        assert_eq!(group_source(""), Group::default());
    }

    #[test]
    fn test_empty_line() {
        assert_eq!(
            group_source("\n"),
            Group {
                items: vec![line(1, "")]
            }
        );
    }

    #[test]
    fn test_simple_indent() {
        let source = "a\n  b\n  c\nd";
        let expected = Group {
            items: vec![
                line(1, "a"),
                nested(vec![line(2, "  b"), line(3, "  c")]),
                line(4, "d"),
            ],
        };
        assert_eq!(group_source(source), expected);
    }

    #[test]
    fn test_double_dedent() {
        let source = "a\n  b\n    c\nd";
        let expected = Group {
            items: vec![
                line(1, "a"),
                nested(vec![line(2, "  b"), nested(vec![line(3, "    c")])]),
                line(4, "d"),
            ],
        };
        assert_eq!(group_source(source), expected);
    }

    #[test]
    fn test_blank_lines_of_different_indents() {
        let source = "a\n  b\n\n      \n  c";
        let expected = Group {
            items: vec![
                line(1, "a"),
                nested(vec![
                    line(2, "  b"),
                    line(3, ""),
                    line(4, "      "),
                    line(5, "  c"),
                ]),
            ],
        };
        assert_eq!(group_source(source), expected);
    }

    #[test]
    fn test_blank_line_before_dedent_stays_in_group() {
        let source = "a\n  b\n\nc";
        let expected = Group {
            items: vec![
                line(1, "a"),
                nested(vec![line(2, "  b"), line(3, "")]),
                line(4, "c"),
            ],
        };
        assert_eq!(group_source(source), expected);
    }

    #[test]
    fn test_blank_line_starting_a_group() {
        let source = "a\n\n  b";
        let expected = Group {
            items: vec![line(1, "a"), line(2, ""), nested(vec![line(3, "  b")])],
        };
        assert_eq!(group_source(source), expected);
    }

    #[test]
    fn test_large_blank_line_starting_a_group() {
        let source = "a\n          \n  b";
        let expected = Group {
            items: vec![
                line(1, "a"),
                line(2, "          "),
                nested(vec![line(3, "  b")]),
            ],
        };
        assert_eq!(group_source(source), expected);
    }

    #[test]
    fn test_comments_in_and_out_of_group() {
        let source = "a\n  b\n  -- in\n-- out\nc";
        let expected = Group {
            items: vec![
                line(1, "a"),
                nested(vec![line(2, "  b"), line(3, "  -- in")]),
                line(4, "-- out"),
                line(5, "c"),
            ],
        };
        assert_eq!(group_source(source), expected);
    }

    #[test]
    fn test_comment_starting_a_group() {
        let source = "x\n  -- 0\n  y\n-- 2\nz";
        let expected = Group {
            items: vec![
                line(1, "x"),
                line(2, "  -- 0"),
                nested(vec![line(3, "  y")]),
                line(4, "-- 2"),
                line(5, "z"),
            ],
        };
        assert_eq!(group_source(source), expected);

        let source = "a\n-- head\n  b";
        let expected = Group {
            items: vec![line(1, "a"), line(2, "-- head"), nested(vec![line(3, "  b")])],
        };
        assert_eq!(group_source(source), expected);
    }

    #[test]
    fn test_indented_comment_starting_a_group() {
        let source = "x\n    -- 0\n        -- 1\n  y";
        let expected = Group {
            items: vec![
                line(1, "x"),
                line(2, "    -- 0"),
                line(3, "        -- 1"),
                nested(vec![line(4, "  y")]),
            ],
        };
        assert_eq!(group_source(source), expected);
    }

    #[test]
    fn test_deeper_comments_stay_in_open_group() {
        let source = "x\n  y\n  -- 0\n    -- 1\n-- 2\nz";
        let expected = Group {
            items: vec![
                line(1, "x"),
                nested(vec![line(2, "  y"), line(3, "  -- 0"), line(4, "    -- 1")]),
                line(5, "-- 2"),
                line(6, "z"),
            ],
        };
        assert_eq!(group_source(source), expected);
    }

    #[test]
    fn test_comment_cannot_skip_levels() {
        let source = "a\n      -- deep\nb";
        let expected = Group {
            items: vec![line(1, "a"), line(2, "      -- deep"), line(3, "b")],
        };
        assert_eq!(group_source(source), expected);
    }

    #[test]
    fn test_trailing_comments_close_to_confirmed_level() {
        let source = "a\n  b\n    -- deep\n-- top";
        let expected = Group {
            items: vec![
                line(1, "a"),
                nested(vec![line(2, "  b"), line(3, "    -- deep")]),
                line(4, "-- top"),
            ],
        };
        assert_eq!(group_source(source), expected);
    }

    #[test]
    fn test_indent_errors() {
        assert_eq!(
            group(lines("a\n b").unwrap()),
            Err(IndentError::OddIndent { line: 2, indent: 1 })
        );
        assert_eq!(
            group(lines("a\n    b").unwrap()),
            Err(IndentError::UnexpectedIndent {
                line: 2,
                level: 2,
                open: 1
            })
        );
    }

    #[test]
    fn test_dedenting_comment_closes_groups() {
        assert_eq!(
            group(lines("a\n  b\n-- out\n    c").unwrap()),
            Err(IndentError::UnexpectedIndent {
                line: 4,
                level: 2,
                open: 1
            })
        );

        let source = "a\n  b\n-- out\n  c";
        let expected = Group {
            items: vec![
                line(1, "a"),
                nested(vec![line(2, "  b")]),
                line(3, "-- out"),
                nested(vec![line(4, "  c")]),
            ],
        };
        assert_eq!(group_source(source), expected);
    }

    #[test]
    fn test_odd_indent_allowed_on_comments() {
        let source = "a\n  b\n   -- odd\n  c";
        let expected = Group {
            items: vec![
                line(1, "a"),
                nested(vec![line(2, "  b"), line(3, "   -- odd"), line(4, "  c")]),
            ],
        };
        assert_eq!(group_source(source), expected);
    }

    fn well_formed_source() -> impl Strategy<Value = String> {
        prop::collection::vec((0..3u8, 0..4usize), 0..24).prop_map(|lines| {
            let mut substantial = 0;
            let mut source = Vec::new();
            for (i, (kind, level)) in lines.into_iter().enumerate() {
                match kind {
                    0 => {
                        substantial = level.min(substantial + 1);
                        source.push(format!("{:1$}x{2} = {2}", "", substantial * 2, i));
                    }
                    1 => {
                        substantial = substantial.min(level);
                        source.push(format!("{:1$}-- note {2}", "", level * 2, i));
                    }
                    _ => source.push(" ".repeat(level)),
                }
            }
            source.join("\n")
        })
    }

    proptest! {
        #[test]
        fn test_rendered_groups_regroup_identically(source in well_formed_source()) {
            let first = group(lines(&source).unwrap()).unwrap();
            let second = group(lines(&first.to_string()).unwrap()).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
