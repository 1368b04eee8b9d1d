use std::{fmt::Display, rc::Rc};

use crate::ast::Block;

use super::{marshal::HostCall, scope::Environment};

#[derive(Debug, Clone)]
pub enum Call {
    Guest(GuestCall),
    Host(Rc<HostCall>),
}

/// A closure: the body block and the environment it was defined in.
#[derive(Debug, Clone)]
pub struct GuestCall {
    pub environment: Environment,
    pub block: Rc<Block>,
}

impl From<HostCall> for Call {
    fn from(call: HostCall) -> Self {
        Call::Host(Rc::new(call))
    }
}

impl Display for Call {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Call::Guest(GuestCall { block, .. }) => {
                write!(f, "<guest call of {} statements>", block.statements.len())
            }
            Call::Host(host) => write!(f, "{}", host),
        }
    }
}
