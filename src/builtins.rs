use std::{cell::RefCell, io::Write, rc::Rc};

use crate::{
    interpreter::{Binding, Call, Environment, HostCall, HostError, Stream, Value},
    number::Number,
};

/// Guest-visible name of a native function: trailing `_` trimmed, `_` as `-`.
fn host_name(name: &str) -> String {
    name.trim_end_matches('_').replace('_', "-")
}

macro_rules! host_calls {
    ($( $function:ident ),+ $(,)?) => {
        vec![
            $(
                {
                    let name = host_name(stringify!($function));
                    let call = HostCall::new(name.clone(), $function);
                    (name, Binding::Call(Call::from(call)))
                },
            )+
        ]
    };
}

fn add(mut array: Vec<Value>, value: Value) -> Vec<Value> {
    array.push(value);
    array
}

fn arr(_: Value) -> Vec<Value> {
    Vec::new()
}

fn cat(mut first: Vec<Value>, second: Vec<Value>) -> Vec<Value> {
    first.extend(second);
    first
}

fn sqrt(n: i32) -> Result<i32, HostError> {
    if n < 0 {
        return Err(HostError::Failed(format!("Square root of negative number {n}")));
    }
    Ok(f64::from(n).sqrt() as i32)
}

fn to_be(n: Number) -> Vec<u8> {
    n.to_be_bytes()
}

fn to_le(n: Number) -> Vec<u8> {
    n.to_le_bytes()
}

fn to_me(n: Number) -> Vec<u8> {
    n.to_ne_bytes()
}

fn write(stream: Stream, bytes: Vec<u8>) -> Result<(), HostError> {
    stream.write_all(&bytes)?;
    Ok(())
}

/// The root environment with every builtin, writing `cout` to standard output.
pub fn base_environment() -> Environment {
    base_environment_with_output(Rc::new(RefCell::new(std::io::stdout())))
}

pub fn base_environment_with_output(output: Rc<RefCell<dyn Write>>) -> Environment {
    let environment = Environment::from_bindings(host_calls![
        add, arr, cat, sqrt, to_be, to_le, to_me, write,
    ]);
    environment.bind("cout", Value::Stream(Stream::new("cout", output)));
    environment.bind("pi", Value::Number(Number::I32(3)));
    environment
}
