//! Account and action names.
//!
//! Names are up to 13 characters from `.12345abcdefghijklmnopqrstuvwxyz`,
//! packed into a `u64`: 5 bits for each of the first 12 characters and
//! 4 bits for the 13th.

use thiserror::Error;

pub const MAX_NAME_LEN: usize = 13;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("name '{0}' is longer than {MAX_NAME_LEN} characters")]
    TooLong(String),
    #[error("name '{name}' contains invalid character '{ch}'")]
    InvalidChar { name: String, ch: char },
    #[error("13th character of name '{0}' must be in [.1-5a-j]")]
    InvalidLastChar(String),
}

fn char_to_symbol(c: u8) -> Option<u64> {
    match c {
        b'a'..=b'z' => Some((c - b'a') as u64 + 6),
        b'1'..=b'5' => Some((c - b'1') as u64 + 1),
        b'.' => Some(0),
        _ => None,
    }
}

/// Encode a name string into its 64-bit chain representation
pub fn encode(name: &str) -> Result<u64, NameError> {
    let bytes = name.as_bytes();
    if bytes.len() > MAX_NAME_LEN {
        return Err(NameError::TooLong(name.to_string()));
    }

    let mut value = 0u64;
    for (i, &c) in bytes.iter().enumerate() {
        let symbol = char_to_symbol(c).ok_or_else(|| NameError::InvalidChar {
            name: name.to_string(),
            ch: c as char,
        })?;

        if i < 12 {
            value |= (symbol & 0x1f) << (64 - 5 * (i + 1));
        } else {
            if symbol > 0x0f {
                return Err(NameError::InvalidLastChar(name.to_string()));
            }
            value |= symbol;
        }
    }

    Ok(value)
}
