use std::{error::Error, fmt, fmt::Debug};

use proc_macro::TokenStream;
use quote::quote;

#[derive(Debug)]
enum HexError {
    InvalidCharacter(char),
    InvalidStringLength(usize),
}

impl Error for HexError {}

impl fmt::Display for HexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidCharacter(char) => {
                write!(f, "invalid hex character {char}")
            }
            Self::InvalidStringLength(length) => {
                write!(f, "expected 40 hex digits for an address, found {length}")
            }
        }
    }
}

/// Accepts the literal as written, with or without quotes and `0x` prefix.
fn address_bytes(literal: &str) -> Result<[u8; 20], HexError> {
    let literal = literal.trim().trim_matches('"');
    let hex = literal
        .strip_prefix("0x")
        .or_else(|| literal.strip_prefix("0X"))
        .unwrap_or(literal)
        .as_bytes();
    if hex.len() != 40 {
        return Err(HexError::InvalidStringLength(hex.len()));
    }

    let hex_value = |char: u8| -> Result<u8, HexError> {
        match char {
            b'A'..=b'F' => Ok(char - b'A' + 10),
            b'a'..=b'f' => Ok(char - b'a' + 10),
            b'0'..=b'9' => Ok(char - b'0'),
            _ => Err(HexError::InvalidCharacter(char as char)),
        }
    };

    let mut bytes = [0u8; 20];
    for (byte, chunk) in bytes.iter_mut().zip(hex.chunks(2)) {
        *byte = hex_value(chunk[0])? << 4 | hex_value(chunk[1])?;
    }
    Ok(bytes)
}

/// Builds an `ethers::types::H160` from a hex literal at compile time:
/// `h160!(0x0200000000000000000000000000000000000005)`.
#[proc_macro]
pub fn h160(input: TokenStream) -> TokenStream {
    let expanded = match address_bytes(&input.to_string()) {
        Ok(bytes) => quote! {
            ::ethers::types::H160([#(#bytes,)*])
        },
        Err(e) => {
            let message = e.to_string();
            quote! { compile_error!(#message) }
        }
    };

    expanded.into()
}
