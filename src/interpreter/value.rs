use std::{cell::RefCell, fmt::Display, io::Write, rc::Rc};

use crate::number::{Number, NumberType};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(Number),
    Array(Vec<Value>),
    Stream(Stream),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Number(n) => ValueType::Number(n.number_type()),
            Value::Array(_) => ValueType::Array,
            Value::Stream(_) => ValueType::Stream,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Array(values) => {
                write!(f, "[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, "]")
            }
            Value::Stream(stream) => write!(f, "<stream {}>", stream.name),
        }
    }
}

/// The declared type of a host call parameter or result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Number(NumberType),
    /// A number of any width.
    Integer,
    Array,
    /// An array of `uint8` numbers.
    Bytes,
    Stream,
    Any,
}

impl Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueType::Number(number_type) => write!(f, "{}", number_type),
            ValueType::Integer => write!(f, "integer"),
            ValueType::Array => write!(f, "array"),
            ValueType::Bytes => write!(f, "bytes"),
            ValueType::Stream => write!(f, "stream"),
            ValueType::Any => write!(f, "value"),
        }
    }
}

/// A shared output handle. Two streams are equal when they share a writer.
#[derive(Clone)]
pub struct Stream {
    name: String,
    writer: Rc<RefCell<dyn Write>>,
}

impl Stream {
    pub fn new(name: impl Into<String>, writer: Rc<RefCell<dyn Write>>) -> Self {
        Self {
            name: name.into(),
            writer,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn write_all(&self, bytes: &[u8]) -> std::io::Result<()> {
        let mut writer = self.writer.borrow_mut();
        writer.write_all(bytes)?;
        writer.flush()
    }
}

impl PartialEq for Stream {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.writer, &other.writer)
    }
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Stream<{:?}>({})", Rc::as_ptr(&self.writer), self.name)
    }
}
