use std::{rc::Rc, slice::Iter};

use crate::{
    ast::{Assignment, Block, Expression, MethodDefinition, Statement, Term},
    atom::Atom,
    grouper::{group, Group, GroupItem, IndentError},
    lexer::{lines, LexError, Line, LineItem, Marker},
    number::Number,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Indent(#[from] IndentError),
    #[error("Line {line}: syntax error: {error}")]
    Syntax {
        line: usize,
        #[source]
        error: SyntaxError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("Missing binding before \"=\"")]
    MissingAssignmentBinding,
    #[error("Missing binding before \">>\"")]
    MissingMethodBinding,
    #[error("Expected exactly one binding before \">>\", found {0:?}")]
    MultipleMethodBindings(Vec<String>),
    #[error("Cannot bind to number {0}")]
    NumberInBinding(Number),
    #[error("Missing expected block")]
    MissingBlock,
    #[error("Value given both inline and as a nested block")]
    InlineAndNestedBlock,
    #[error("Unexpected nested group")]
    UnexpectedNestedGroup,
    #[error("Unexpected \"{0}\" after \":\"")]
    MisplacedBlockMarker(String),
}

/// Lexes, groups and builds `source` into its root block.
#[tracing::instrument(level = "debug", skip(source), fields(bytes = source.len()))]
pub fn parse(source: &str) -> Result<Block, ParseError> {
    let lines = lines(source)?;
    tracing::trace!(lines = lines.len(), "lexed");
    let root = group(lines)?;
    tracing::trace!(items = root.items.len(), "grouped");
    let block = block(&root)?;
    tracing::trace!(statements = block.statements.len(), "built");
    Ok(block)
}

/// The items after the line being built, plus any comment-only lines
/// stepped over while claiming a group for it.
struct Following<'a> {
    items: Iter<'a, GroupItem>,
    skipped: Vec<&'a Line>,
}

pub fn block(group: &Group) -> Result<Block, ParseError> {
    let mut statements = Vec::new();
    let mut following = Following {
        items: group.items.iter(),
        skipped: Vec::new(),
    };

    while let Some(item) = following.items.next() {
        match item {
            GroupItem::Group(nested) => {
                return Err(ParseError::Syntax {
                    line: first_line(nested),
                    error: SyntaxError::UnexpectedNestedGroup,
                })
            }
            GroupItem::Line(line) if line.is_blank() => {}
            GroupItem::Line(line) => {
                statements.push(statement(line, &mut following)?);
                for comment in std::mem::take(&mut following.skipped) {
                    statements.push(statement(comment, &mut following)?);
                }
            }
        }
    }

    Ok(Block::new(statements))
}

fn first_line(group: &Group) -> usize {
    group
        .items
        .iter()
        .find_map(|item| match item {
            GroupItem::Line(line) => Some(line.number),
            GroupItem::Group(nested) => Some(first_line(nested)),
        })
        .unwrap_or_default()
}

fn statement(line: &Line, following: &mut Following<'_>) -> Result<Statement, ParseError> {
    let mut comment = line.comment.clone();
    let mut statement = line_statement(line.number, &line.items, &mut comment, following)?;

    // Whatever comment no `:` block claimed belongs to the statement itself.
    let slot = match &mut statement {
        Statement::Expression(e) => &mut e.comment,
        Statement::Assignment(a) => &mut a.comment,
        Statement::MethodDefinition(m) => &mut m.comment,
    };
    *slot = comment;

    Ok(statement)
}

fn line_statement(
    line: usize,
    items: &[LineItem],
    comment: &mut Option<String>,
    following: &mut Following<'_>,
) -> Result<Statement, ParseError> {
    let syntax = |error| ParseError::Syntax { line, error };

    let marker = items.iter().position(|item| {
        matches!(
            item,
            LineItem::Marker(Marker::Assignment | Marker::MethodDefinition)
        )
    });
    let Some(position) = marker else {
        let terms = terms(line, items, comment, following)?;
        return Ok(Statement::Expression(Expression {
            terms,
            comment: None,
        }));
    };

    let bindings = bindings(&items[..position]).map_err(syntax)?;
    let rest = &items[position + 1..];

    match &items[position] {
        LineItem::Marker(Marker::MethodDefinition) => {
            let binding = match <[String; 1]>::try_from(bindings) {
                Ok([binding]) => binding,
                Err(bindings) if bindings.is_empty() => {
                    return Err(syntax(SyntaxError::MissingMethodBinding))
                }
                Err(bindings) => return Err(syntax(SyntaxError::MultipleMethodBindings(bindings))),
            };
            let block = value_block(line, rest, comment, following)?;
            Ok(Statement::MethodDefinition(MethodDefinition {
                binding,
                block,
                comment: None,
            }))
        }
        _ => {
            if bindings.is_empty() {
                return Err(syntax(SyntaxError::MissingAssignmentBinding));
            }
            let block = value_block(line, rest, comment, following)?;
            Ok(Statement::Assignment(Assignment {
                bindings,
                block,
                comment: None,
            }))
        }
    }
}

fn bindings(items: &[LineItem]) -> Result<Vec<String>, SyntaxError> {
    items
        .iter()
        .map(|item| match item {
            LineItem::Atom(Atom::Identifier(name)) => Ok(name.clone()),
            LineItem::Atom(Atom::Number(n)) => Err(SyntaxError::NumberInBinding(*n)),
            LineItem::Marker(marker) => Err(SyntaxError::MisplacedBlockMarker(marker.to_string())),
        })
        .collect()
}

/// Resolves a value body: the rest of the line if any, otherwise the next group.
fn value_block(
    line: usize,
    rest: &[LineItem],
    comment: &mut Option<String>,
    following: &mut Following<'_>,
) -> Result<Rc<Block>, ParseError> {
    let syntax = |error| ParseError::Syntax { line, error };

    if rest.is_empty() {
        let group = claim_group(following).ok_or_else(|| syntax(SyntaxError::MissingBlock))?;
        return Ok(Rc::new(block(group)?));
    }

    let inline = line_statement(line, rest, comment, following)?;
    if claim_group(following).is_some() {
        return Err(syntax(SyntaxError::InlineAndNestedBlock));
    }
    Ok(Rc::new(Block::new(vec![inline])))
}

fn terms(
    line: usize,
    items: &[LineItem],
    comment: &mut Option<String>,
    following: &mut Following<'_>,
) -> Result<Vec<Term>, ParseError> {
    let syntax = |error| ParseError::Syntax { line, error };
    let mut terms = Vec::with_capacity(items.len() + 1);

    for (index, item) in items.iter().enumerate() {
        match item {
            LineItem::Atom(Atom::Number(n)) => terms.push(Term::Number(*n)),
            LineItem::Atom(Atom::Identifier(name)) => terms.push(Term::Identifier(name.clone())),
            LineItem::Marker(Marker::Block) => {
                if let Some(next) = items.get(index + 1) {
                    return Err(syntax(SyntaxError::MisplacedBlockMarker(next.to_string())));
                }
                let group =
                    claim_group(following).ok_or_else(|| syntax(SyntaxError::MissingBlock))?;
                if let Some(comment) = comment.take() {
                    terms.push(Term::Comment(comment));
                }
                terms.push(Term::Block(Rc::new(block(group)?)));
            }
            LineItem::Marker(marker) => {
                return Err(syntax(SyntaxError::MisplacedBlockMarker(marker.to_string())))
            }
        }
    }

    Ok(terms)
}

/// Takes the next group, stepping over blank and comment-only lines before
/// it. Stepped-over comments are kept in `skipped` for the enclosing block.
fn claim_group<'a>(following: &mut Following<'a>) -> Option<&'a Group> {
    let mut lookahead = following.items.clone();
    let mut comments = Vec::new();

    loop {
        match lookahead.next()? {
            GroupItem::Line(line) if line.is_blank() => {}
            GroupItem::Line(line) if line.is_comment_only() => comments.push(line),
            GroupItem::Line(_) => return None,
            GroupItem::Group(group) => {
                following.items = lookahead;
                following.skipped.extend(comments);
                return Some(group);
            }
        }
    }
}
