mod callable;
mod marshal;
mod scope;
mod stack;
mod value;

use std::rc::Rc;

use crate::ast::{Block, Statement, Term};

pub use self::{
    callable::{Call, GuestCall},
    marshal::{FromValue, HostCall, HostError, IntoHostFunction, IntoResults, IntoValue},
    scope::{Binding, Environment},
    stack::Stack,
    value::{Stream, Value, ValueType},
};

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("Error executing statement: {statement} - {kind}")]
    Execution {
        #[source]
        kind: ExecutionErrorKind,
        statement: Statement,
    },
}

impl ExecutionError {
    pub fn kind(&self) -> &ExecutionErrorKind {
        match self {
            ExecutionError::Execution { kind, .. } => kind,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutionErrorKind {
    #[error("Unbound name: {0}")]
    UnboundName(String),
    #[error("Stack underflow: needed {needed} values, found {found}")]
    StackUnderflow { needed: usize, found: usize },
    #[error("Error calling {name}: {error}")]
    HostCall {
        name: String,
        #[source]
        error: HostError,
    },
}

/// Where a frame is in its block.
///
/// `term_index` doubles as the assignment phase: zero before the value block
/// has been entered, non-zero once it has completed.
#[derive(Debug, Clone)]
pub struct InstructionPointer {
    pub block: Rc<Block>,
    pub statement_index: usize,
    pub term_index: usize,
}

#[derive(Debug, Clone)]
pub struct Frame {
    pub ip: InstructionPointer,
    pub environment: Environment,
}

impl Frame {
    fn new(block: Rc<Block>, environment: Environment) -> Self {
        Self {
            ip: InstructionPointer {
                block,
                statement_index: 0,
                term_index: 0,
            },
            environment,
        }
    }
}

/// A trampolined interpreter: guest calls and nested blocks push frames
/// instead of recursing, and every frame shares the one evaluation stack.
pub struct Machine<'s> {
    frames: Vec<Frame>,
    stack: &'s mut Stack,
}

impl<'s> Machine<'s> {
    pub fn new(block: Rc<Block>, stack: &'s mut Stack, environment: Environment) -> Self {
        Self {
            frames: vec![Frame::new(block, environment)],
            stack,
        }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn stack(&self) -> &Stack {
        self.stack
    }

    pub fn is_finished(&self) -> bool {
        self.frames.is_empty()
    }

    /// Executes one step of the current frame.
    ///
    /// After an error the machine must not be stepped again.
    pub fn step(&mut self) -> Result<(), ExecutionError> {
        let Some(frame) = self.frames.last() else {
            return Ok(());
        };

        #[cfg(feature = "trace")]
        tracing::trace!(
            depth = self.frames.len(),
            statement = frame.ip.statement_index,
            term = frame.ip.term_index,
            stack = %self.stack,
            "step"
        );

        let block = Rc::clone(&frame.ip.block);
        let environment = frame.environment.clone();
        let term_index = frame.ip.term_index;

        let Some(statement) = block.statements.get(frame.ip.statement_index) else {
            self.frames.pop();
            return Ok(());
        };

        self.statement(statement, term_index, &environment)
            .map_err(|kind| {
                tracing::debug!(error = %kind, "execution failed");
                ExecutionError::Execution {
                    kind,
                    statement: statement.clone(),
                }
            })
    }

    fn statement(
        &mut self,
        statement: &Statement,
        term_index: usize,
        environment: &Environment,
    ) -> Result<(), ExecutionErrorKind> {
        match statement {
            Statement::Expression(expression) => match expression.terms.get(term_index) {
                Some(term) => self.term(term, environment),
                None => {
                    self.next_statement();
                    Ok(())
                }
            },
            Statement::Assignment(assignment) => {
                if term_index == 0 {
                    self.next_term();
                    self.frames
                        .push(Frame::new(Rc::clone(&assignment.block), environment.extend()));
                    return Ok(());
                }

                let needed = assignment.bindings.len();
                let values = self
                    .stack
                    .pop_many(needed)
                    .ok_or_else(|| ExecutionErrorKind::StackUnderflow {
                        needed,
                        found: self.stack.len(),
                    })?;
                // The last name takes the top of the stack.
                for (name, value) in assignment.bindings.iter().zip(values) {
                    environment.bind(name.clone(), value);
                }
                self.next_statement();
                Ok(())
            }
            Statement::MethodDefinition(definition) => {
                let call = GuestCall {
                    environment: environment.clone(),
                    block: Rc::clone(&definition.block),
                };
                environment.bind(definition.binding.clone(), Call::Guest(call));
                self.next_statement();
                Ok(())
            }
        }
    }

    fn term(&mut self, term: &Term, environment: &Environment) -> Result<(), ExecutionErrorKind> {
        match term {
            Term::Number(n) => {
                self.stack.push(Value::Number(*n));
                self.next_term();
            }
            Term::Identifier(name) => match environment.get(name) {
                Some(Binding::Value(value)) => {
                    self.stack.push(value);
                    self.next_term();
                }
                Some(Binding::Call(Call::Guest(call))) => {
                    self.next_term();
                    self.frames
                        .push(Frame::new(call.block, call.environment.extend()));
                }
                Some(Binding::Call(Call::Host(call))) => {
                    self.host_call(&call)?;
                    self.next_term();
                }
                None => return Err(ExecutionErrorKind::UnboundName(name.clone())),
            },
            Term::Comment(_) => self.next_term(),
            Term::Block(block) => {
                self.next_term();
                self.frames
                    .push(Frame::new(Rc::clone(block), environment.extend()));
            }
        }
        Ok(())
    }

    /// Pops the declared arguments, runs the native function and pushes its
    /// results. A failure consumes the arguments and pushes nothing.
    fn host_call(&mut self, call: &HostCall) -> Result<(), ExecutionErrorKind> {
        let needed = call.parameters().len();
        let arguments =
            self.stack
                .pop_many(needed)
                .ok_or_else(|| ExecutionErrorKind::StackUnderflow {
                    needed,
                    found: self.stack.len(),
                })?;

        let results = call
            .invoke(arguments)
            .map_err(|error| ExecutionErrorKind::HostCall {
                name: call.name().to_string(),
                error,
            })?;

        for value in results {
            self.stack.push(value);
        }
        Ok(())
    }

    fn next_term(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.ip.term_index += 1;
        }
    }

    fn next_statement(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.ip.statement_index += 1;
            frame.ip.term_index = 0;
        }
    }
}

/// Runs `block` to completion in `environment`, leaving its results on `stack`.
#[tracing::instrument(level = "debug", skip_all, fields(statements = block.statements.len()))]
pub fn interpret(
    block: Rc<Block>,
    stack: &mut Stack,
    environment: &Environment,
) -> Result<(), ExecutionError> {
    let mut machine = Machine::new(block, stack, environment.clone());
    while !machine.is_finished() {
        machine.step()?;
    }
    Ok(())
}
