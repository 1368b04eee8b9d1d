use std::fmt::Display;

use crate::number::{Number, NumberType, Width};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Atom {
    Number(Number),
    Identifier(String),
}

impl Display for Atom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Atom::Number(n) => write!(f, "{}", n),
            Atom::Identifier(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LiteralError {
    #[error("Unrecognized suffix \"{suffix}\" in literal \"{literal}\"")]
    UnrecognizedSuffix { literal: String, suffix: String },
    #[error("Literal \"{literal}\" does not fit in {number_type}")]
    Overflow {
        literal: String,
        number_type: NumberType,
    },
    #[error("Malformed digits in literal \"{0}\"")]
    MalformedDigits(String),
}

/// Classifies a whitespace-delimited word.
///
/// Words starting with an ASCII digit are numeric literals; everything else
/// is an identifier, kept verbatim.
pub fn classify(word: &str) -> Result<Atom, LiteralError> {
    if word.starts_with(|c: char| c.is_ascii_digit()) {
        number(word).map(Atom::Number)
    } else {
        Ok(Atom::Identifier(word.to_string()))
    }
}

fn number(literal: &str) -> Result<Number, LiteralError> {
    let (body, negative) = match literal.strip_suffix('-') {
        Some(body) => (body, true),
        None => (literal.strip_suffix('+').unwrap_or(literal), false),
    };

    match body.strip_prefix("0x") {
        Some(hex) => hex_number(literal, hex, negative),
        None => decimal_number(literal, body, negative),
    }
}

fn is_separator(c: char) -> bool {
    c == '-' || c == '_'
}

/// Splits `source` after the longest prefix of digits and separators.
fn digits(source: &str, radix: u32) -> (&str, &str) {
    let len = source
        .chars()
        .take_while(|c| is_separator(*c) || is_digit(*c, radix))
        .map(char::len_utf8)
        .sum();
    source.split_at(len)
}

// Hex digits are upper-case only so that `x` and the suffix letters stay unambiguous.
fn is_digit(c: char, radix: u32) -> bool {
    match radix {
        16 => c.is_ascii_digit() || ('A'..='F').contains(&c),
        _ => c.is_ascii_digit(),
    }
}

/// Accumulates the digits of `source`, skipping separators.
///
/// Returns the value and the number of digits, or `None` on u64 overflow.
fn accumulate(source: &str, radix: u32) -> Option<(u64, u32)> {
    let mut value: u64 = 0;
    let mut count = 0;
    for c in source.chars().filter(|c| !is_separator(*c)) {
        let digit = c.to_digit(radix)?;
        value = value.checked_mul(radix.into())?.checked_add(digit.into())?;
        count += 1;
    }
    Some((value, count))
}

struct Suffix {
    signed: Option<bool>,
    width: Option<Width>,
}

fn suffix(literal: &str, source: &str) -> Result<Suffix, LiteralError> {
    let unrecognized = || LiteralError::UnrecognizedSuffix {
        literal: literal.to_string(),
        suffix: source.to_string(),
    };

    let mut chars = source.chars().peekable();
    let mut signed = match chars.peek() {
        Some('i') => Some(true),
        Some('u') => Some(false),
        _ => None,
    };
    if signed.is_some() {
        chars.next();
    }

    let width = match chars.next() {
        None => None,
        Some('b') => {
            signed.get_or_insert(false);
            Some(Width::Byte)
        }
        Some('h') => Some(Width::Half),
        Some('w') => Some(Width::Word),
        Some('d') => Some(Width::Double),
        Some(_) => return Err(unrecognized()),
    };

    if chars.next().is_some() {
        return Err(unrecognized());
    }

    Ok(Suffix { signed, width })
}

fn overflow(literal: &str, number_type: NumberType) -> LiteralError {
    LiteralError::Overflow {
        literal: literal.to_string(),
        number_type,
    }
}

fn decimal_number(literal: &str, body: &str, negative: bool) -> Result<Number, LiteralError> {
    let (digits, rest) = digits(body, 10);
    let suffix = suffix(literal, rest)?;
    let number_type = NumberType::new(
        suffix.width.unwrap_or(Width::Word),
        suffix.signed.unwrap_or(true),
    );

    let (magnitude, _) = accumulate(digits, 10).ok_or_else(|| overflow(literal, number_type))?;
    Number::from_magnitude(number_type, magnitude, negative)
        .ok_or_else(|| overflow(literal, number_type))
}

fn hex_number(literal: &str, body: &str, negative: bool) -> Result<Number, LiteralError> {
    let (digits, rest) = digits(body, 16);
    let suffix = match rest {
        "" => Suffix {
            signed: None,
            width: None,
        },
        _ => match rest.strip_prefix('x') {
            Some(letters) => suffix(literal, letters)?,
            None => return Err(LiteralError::MalformedDigits(literal.to_string())),
        },
    };

    let (bits, count) = match accumulate(digits, 16) {
        Some((_, 0)) => return Err(LiteralError::MalformedDigits(literal.to_string())),
        Some(accumulated) => accumulated,
        None => {
            return Err(overflow(
                literal,
                NumberType::new(Width::Double, suffix.signed.unwrap_or(false)),
            ))
        }
    };

    let number_type = NumberType::new(
        suffix.width.unwrap_or_else(|| Width::holding(count * 4)),
        suffix.signed.unwrap_or(false),
    );
    let number =
        Number::from_bits(number_type, bits).ok_or_else(|| overflow(literal, number_type))?;

    if negative {
        number
            .checked_neg()
            .ok_or_else(|| overflow(literal, number_type))
    } else {
        Ok(number)
    }
}
