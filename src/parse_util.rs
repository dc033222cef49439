use std::str::FromStr;
use std::str::Utf8Error;

use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unexpected end of line, expected '{exp}'")]
    UnexpectedEof { exp: char },

    #[error("Expected '{exp}', but got '{got}'")]
    UnexpectedToken { exp: char, got: char },
}

/// Consumes the slice until a non-ascii whitespace character is reached.
pub fn take_ws(bytes: &[u8]) -> &[u8] {
    let i = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());

    &bytes[i..]
}

/// Takes the next character from the slice. If none is found, the slice is left as-is.
pub const fn take_1(bytes: &[u8]) -> (Option<u8>, &[u8]) {
    let [b, bytes @ ..] = bytes else {
        return (None, bytes);
    };

    (Some(*b), bytes)
}

/// Expects the next character in `bytes` to be `b`.
pub fn expect(b: u8, bytes: &[u8]) -> ParseResult<&[u8]> {
    let (Some(a), bytes) = take_1(bytes) else {
        return Err(ParseError::UnexpectedEof { exp: b as char });
    };

    if a != b {
        return Err(ParseError::UnexpectedToken {
            exp: b as char,
            got: a as char,
        });
    }

    Ok(bytes)
}

/// Advance the slice until `P` is satisfied, without consuming the byte that satisfied it. If `P`
/// never holds, the whole slice is taken.
///
/// Returns `None` when nothing was consumed.
#[inline]
pub fn take_until_fn<P>(p: P, bytes: &[u8]) -> (Option<&[u8]>, &[u8])
where
    P: Fn(u8) -> bool,
{
    let i = bytes.iter().position(|&b| p(b)).unwrap_or(bytes.len());

    if i == 0 {
        (None, bytes)
    } else {
        let (res, bytes) = bytes.split_at(i);

        (Some(res), bytes)
    }
}

/// Takes a run of ascii digits.
pub fn take_digits(bytes: &[u8]) -> (Option<&[u8]>, &[u8]) {
    take_until_fn(|b| !b.is_ascii_digit(), bytes)
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("Error parsing bytes from UTF-8: {0}")]
    InvalidUTF8(Utf8Error),

    #[error("Failed to convert \"{str}\"")]
    ParseError { str: String },
}

/// Converts `&[u8]` to `T` if `T: FromStr`.
pub fn convert<T: FromStr>(bytes: &[u8]) -> Result<T, ConvertError> {
    let str = std::str::from_utf8(bytes).map_err(ConvertError::InvalidUTF8)?;

    let Ok(res) = str.parse::<T>() else {
        return Err(ConvertError::ParseError {
            str: str.to_string(),
        });
    };

    Ok(res)
}
