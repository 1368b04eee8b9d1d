use std::{fmt::Display, rc::Rc};

use crate::number::Number;

const INDENT: &str = "  ";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Expression(Expression),
    Assignment(Assignment),
    MethodDefinition(MethodDefinition),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expression {
    pub terms: Vec<Term>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub bindings: Vec<String>,
    pub block: Rc<Block>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDefinition {
    pub binding: String,
    pub block: Rc<Block>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Number(Number),
    Identifier(String),
    Comment(String),
    Block(Rc<Block>),
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    /// Whether this block renders on the line that owns it.
    fn is_inline(&self) -> bool {
        match self.statements.as_slice() {
            [statement] => statement.comment().is_none() && statement.is_inline(),
            _ => false,
        }
    }
}

impl Statement {
    pub fn comment(&self) -> Option<&str> {
        match self {
            Statement::Expression(e) => e.comment.as_deref(),
            Statement::Assignment(a) => a.comment.as_deref(),
            Statement::MethodDefinition(m) => m.comment.as_deref(),
        }
    }

    fn is_inline(&self) -> bool {
        match self {
            Statement::Expression(e) => e
                .terms
                .iter()
                .all(|term| matches!(term, Term::Number(_) | Term::Identifier(_))),
            Statement::Assignment(a) => a.block.is_inline(),
            Statement::MethodDefinition(m) => m.block.is_inline(),
        }
    }

    fn rendered(&self) -> Rendered<'_> {
        match self {
            Statement::Expression(e) => {
                let mut rendered = Rendered::new(e.comment.as_deref());
                for term in &e.terms {
                    match term {
                        Term::Number(n) => rendered.words.push(n.to_string()),
                        Term::Identifier(name) => rendered.words.push(name.clone()),
                        Term::Comment(comment) => rendered.comment = Some(comment.as_str()),
                        Term::Block(block) => {
                            rendered.words.push(":".to_string());
                            rendered.nested = Some(block.as_ref());
                        }
                    }
                }
                rendered
            }
            Statement::Assignment(a) => {
                let mut rendered = Rendered::new(a.comment.as_deref());
                rendered.words.extend(a.bindings.iter().cloned());
                rendered.words.push("=".to_string());
                rendered.with_block(&a.block)
            }
            Statement::MethodDefinition(m) => {
                let mut rendered = Rendered::new(m.comment.as_deref());
                rendered.words.push(m.binding.clone());
                rendered.words.push(">>".to_string());
                rendered.with_block(&m.block)
            }
        }
    }

    fn write_at(&self, f: &mut std::fmt::Formatter<'_>, level: usize) -> std::fmt::Result {
        let rendered = self.rendered();
        write!(f, "{}{}", INDENT.repeat(level), rendered.words.join(" "))?;
        if let Some(comment) = rendered.comment {
            if !rendered.words.is_empty() {
                write!(f, " ")?;
            }
            write!(f, "--{}", comment)?;
        }
        if let Some(block) = rendered.nested {
            for statement in &block.statements {
                writeln!(f)?;
                statement.write_at(f, level + 1)?;
            }
        }
        Ok(())
    }
}

/// One statement's header line plus the block nested under it.
struct Rendered<'a> {
    words: Vec<String>,
    comment: Option<&'a str>,
    nested: Option<&'a Block>,
}

impl<'a> Rendered<'a> {
    fn new(comment: Option<&'a str>) -> Self {
        Self {
            words: Vec::new(),
            comment,
            nested: None,
        }
    }

    fn with_block(mut self, block: &'a Block) -> Self {
        match block.statements.as_slice() {
            [statement] if block.is_inline() => {
                self.words.extend(statement.rendered().words);
            }
            _ => self.nested = Some(block),
        }
        self
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for statement in &self.statements {
            statement.write_at(f, 0)?;
            writeln!(f)?;
        }
        Ok(())
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.write_at(f, 0)
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Number(n) => write!(f, "{}", n),
            Term::Identifier(name) => write!(f, "{}", name),
            Term::Comment(comment) => write!(f, "--{}", comment),
            Term::Block(block) => write!(f, "<block of {}>", block.statements.len()),
        }
    }
}
