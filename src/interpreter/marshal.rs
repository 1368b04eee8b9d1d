use std::fmt::{Debug, Display};

use crate::number::{Number, NumberType};

use super::value::{Stream, Value, ValueType};

// Typed Rust functions are adapted into the erased `HostFunction` here.
// Each binding records its parameter and result types when it is
// registered, so calls never inspect native signatures at runtime.

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Argument {position} expected {expected}, found {found}")]
    Type {
        position: usize,
        expected: ValueType,
        found: ValueType,
    },
    #[error("Expected {expected} arguments, found {found}")]
    Arity { expected: usize, found: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Failed(String),
}

/// Erased native function: owned arguments in push order, results in push order.
pub type HostFunction = Box<dyn Fn(Vec<Value>) -> Result<Vec<Value>, HostError>>;

pub trait FromValue: Sized {
    const TYPE: ValueType;

    fn from_value(value: Value) -> Option<Self>;
}

pub trait IntoValue {
    const TYPE: ValueType;

    fn into_value(self) -> Value;
}

/// Normalizes native return shapes (nothing, one value, a tuple, or a
/// fallible version of those) into the values pushed back on the stack.
pub trait IntoResults {
    fn types() -> Vec<ValueType>;

    fn into_results(self) -> Result<Vec<Value>, HostError>;
}

impl FromValue for Value {
    const TYPE: ValueType = ValueType::Any;

    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

impl IntoValue for Value {
    const TYPE: ValueType = ValueType::Any;

    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for Number {
    const TYPE: ValueType = ValueType::Integer;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }
}

impl IntoValue for Number {
    const TYPE: ValueType = ValueType::Integer;

    fn into_value(self) -> Value {
        Value::Number(self)
    }
}

macro_rules! number_conversions {
    ($( $native:ty => $variant:ident, $number_type:ident; )+) => {
        $(
            impl FromValue for $native {
                const TYPE: ValueType = ValueType::Number(NumberType::$number_type);

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::Number(Number::$variant(n)) => Some(n),
                        _ => None,
                    }
                }
            }

            impl IntoValue for $native {
                const TYPE: ValueType = ValueType::Number(NumberType::$number_type);

                fn into_value(self) -> Value {
                    Value::Number(Number::$variant(self))
                }
            }
        )+
    };
}

number_conversions! {
    i8 => I8, INT8;
    u8 => U8, UINT8;
    i16 => I16, INT16;
    u16 => U16, UINT16;
    i32 => I32, INT32;
    u32 => U32, UINT32;
    i64 => I64, INT64;
    u64 => U64, UINT64;
}

impl FromValue for Vec<Value> {
    const TYPE: ValueType = ValueType::Array;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }
}

impl IntoValue for Vec<Value> {
    const TYPE: ValueType = ValueType::Array;

    fn into_value(self) -> Value {
        Value::Array(self)
    }
}

impl FromValue for Vec<u8> {
    const TYPE: ValueType = ValueType::Bytes;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(values) => values
                .into_iter()
                .map(|value| match value {
                    Value::Number(Number::U8(byte)) => Some(byte),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }
}

impl IntoValue for Vec<u8> {
    const TYPE: ValueType = ValueType::Bytes;

    fn into_value(self) -> Value {
        Value::Array(
            self.into_iter()
                .map(|byte| Value::Number(Number::U8(byte)))
                .collect(),
        )
    }
}

impl FromValue for Stream {
    const TYPE: ValueType = ValueType::Stream;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Stream(stream) => Some(stream),
            _ => None,
        }
    }
}

impl IntoValue for Stream {
    const TYPE: ValueType = ValueType::Stream;

    fn into_value(self) -> Value {
        Value::Stream(self)
    }
}

impl IntoResults for () {
    fn types() -> Vec<ValueType> {
        Vec::new()
    }

    fn into_results(self) -> Result<Vec<Value>, HostError> {
        Ok(Vec::new())
    }
}

impl<T> IntoResults for T
where
    T: IntoValue,
{
    fn types() -> Vec<ValueType> {
        vec![T::TYPE]
    }

    fn into_results(self) -> Result<Vec<Value>, HostError> {
        Ok(vec![self.into_value()])
    }
}

impl<A, B> IntoResults for (A, B)
where
    A: IntoValue,
    B: IntoValue,
{
    fn types() -> Vec<ValueType> {
        vec![A::TYPE, B::TYPE]
    }

    fn into_results(self) -> Result<Vec<Value>, HostError> {
        Ok(vec![self.0.into_value(), self.1.into_value()])
    }
}

impl<A, B, C> IntoResults for (A, B, C)
where
    A: IntoValue,
    B: IntoValue,
    C: IntoValue,
{
    fn types() -> Vec<ValueType> {
        vec![A::TYPE, B::TYPE, C::TYPE]
    }

    fn into_results(self) -> Result<Vec<Value>, HostError> {
        Ok(vec![
            self.0.into_value(),
            self.1.into_value(),
            self.2.into_value(),
        ])
    }
}

impl<R> IntoResults for Result<R, HostError>
where
    R: IntoResults,
{
    fn types() -> Vec<ValueType> {
        R::types()
    }

    fn into_results(self) -> Result<Vec<Value>, HostError> {
        self?.into_results()
    }
}

/// Converts typed Rust functions and closures into a [`HostFunction`],
/// parameterized by their argument tuple.
pub trait IntoHostFunction<Args> {
    fn parameters() -> Vec<ValueType>;

    fn results() -> Vec<ValueType>;

    fn into_host_function(self) -> HostFunction;
}

fn argument<T: FromValue>(position: usize, value: Value) -> Result<T, HostError> {
    let found = value.value_type();
    T::from_value(value).ok_or(HostError::Type {
        position,
        expected: T::TYPE,
        found,
    })
}

impl<F, R> IntoHostFunction<()> for F
where
    F: Fn() -> R + 'static,
    R: IntoResults + 'static,
{
    fn parameters() -> Vec<ValueType> {
        Vec::new()
    }

    fn results() -> Vec<ValueType> {
        R::types()
    }

    fn into_host_function(self) -> HostFunction {
        Box::new(move |arguments: Vec<Value>| {
            if !arguments.is_empty() {
                return Err(HostError::Arity {
                    expected: 0,
                    found: arguments.len(),
                });
            }
            (self)().into_results()
        })
    }
}

/// Implements `IntoHostFunction` for one arity. The argument vector is
/// destructured up front, so a wrong count fails before any conversion.
macro_rules! impl_into_host_function_for_arity {
    ($arity:literal, $( $position:literal $v:ident : $A:ident ),+ ) => {
        impl<F, R, $( $A ),+> IntoHostFunction<( $( $A, )+ )> for F
        where
            F: Fn( $( $A ),+ ) -> R + 'static,
            $( $A: FromValue + 'static, )+
            R: IntoResults + 'static,
        {
            fn parameters() -> Vec<ValueType> {
                vec![ $( <$A as FromValue>::TYPE ),+ ]
            }

            fn results() -> Vec<ValueType> {
                R::types()
            }

            fn into_host_function(self) -> HostFunction {
                Box::new(move |arguments: Vec<Value>| {
                    let found = arguments.len();
                    let [ $( $v ),+ ] = <[Value; $arity]>::try_from(arguments)
                        .map_err(|_| HostError::Arity { expected: $arity, found })?;
                    $(
                        let $v = argument::<$A>($position, $v)?;
                    )+
                    (self)( $( $v ),+ ).into_results()
                })
            }
        }
    };
}

impl_into_host_function_for_arity!(1, 0 v0: A1);
impl_into_host_function_for_arity!(2, 0 v0: A1, 1 v1: A2);
impl_into_host_function_for_arity!(3, 0 v0: A1, 1 v1: A2, 2 v2: A3);
impl_into_host_function_for_arity!(4, 0 v0: A1, 1 v1: A2, 2 v2: A3, 3 v3: A4);

/// A native function bound into guest code, with its declared signature.
pub struct HostCall {
    name: String,
    parameters: Vec<ValueType>,
    results: Vec<ValueType>,
    function: HostFunction,
}

impl HostCall {
    pub fn new<Args, F>(name: impl Into<String>, function: F) -> Self
    where
        F: IntoHostFunction<Args>,
    {
        Self {
            name: name.into(),
            parameters: F::parameters(),
            results: F::results(),
            function: function.into_host_function(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[ValueType] {
        &self.parameters
    }

    pub fn results(&self) -> &[ValueType] {
        &self.results
    }

    /// Runs the native function on arguments given oldest first.
    pub fn invoke(&self, arguments: Vec<Value>) -> Result<Vec<Value>, HostError> {
        (self.function)(arguments)
    }
}

fn types(types: &[ValueType]) -> String {
    types
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl Display for HostCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<host call {}({}) -> ({})>",
            self.name,
            types(&self.parameters),
            types(&self.results)
        )
    }
}

impl Debug for HostCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostCall")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("results", &self.results)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn int(n: i32) -> Value {
        Value::Number(Number::I32(n))
    }

    #[test]
    fn test_signature_is_declared() {
        let call = HostCall::new("swap", |a: i32, b: Value| (b, a));
        assert_eq!(
            call.parameters(),
            &[ValueType::Number(NumberType::INT32), ValueType::Any]
        );
        assert_eq!(
            call.results(),
            &[ValueType::Any, ValueType::Number(NumberType::INT32)]
        );
        assert_eq!(call.invoke(vec![int(1), int(2)]).unwrap(), vec![int(2), int(1)]);
    }

    #[test]
    fn test_nothing_returns_no_values() {
        let call = HostCall::new("drop", |_: Value| ());
        assert!(call.results().is_empty());
        assert_eq!(call.invoke(vec![int(1)]).unwrap(), Vec::<Value>::new());

        let call = HostCall::new("nothing", || ());
        assert!(call.parameters().is_empty());
        assert_eq!(call.invoke(vec![]).unwrap(), Vec::<Value>::new());
    }

    #[test]
    fn test_argument_type_mismatch() {
        let call = HostCall::new("twice", |n: u8| n.wrapping_mul(2));
        let error = call.invoke(vec![int(3)]).unwrap_err();
        assert!(matches!(
            error,
            HostError::Type {
                position: 0,
                expected: ValueType::Number(NumberType::UINT8),
                found: ValueType::Number(NumberType::INT32),
            }
        ));
    }

    #[test]
    fn test_arity_mismatch() {
        let call = HostCall::new("pair", |a: Value, b: Value| (a, b));
        assert!(matches!(
            call.invoke(vec![int(1)]),
            Err(HostError::Arity {
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn test_bytes_conversion() {
        let call = HostCall::new("len", |bytes: Vec<u8>| bytes.len() as u32);
        let bytes = Vec::<u8>::from([1, 2, 3]).into_value();
        assert_eq!(
            call.invoke(vec![bytes]).unwrap(),
            vec![Value::Number(Number::U32(3))]
        );
        assert!(call.invoke(vec![Value::Array(vec![int(1)])]).is_err());
    }

    #[test]
    fn test_fallible_results() {
        let call = HostCall::new("check", |n: i32| {
            if n < 0 {
                Err(HostError::Failed("negative".to_string()))
            } else {
                Ok(n)
            }
        });
        assert_eq!(call.results(), &[ValueType::Number(NumberType::INT32)]);
        assert_eq!(call.invoke(vec![int(4)]).unwrap(), vec![int(4)]);
        assert!(matches!(
            call.invoke(vec![int(-4)]),
            Err(HostError::Failed(_))
        ));
    }
}
