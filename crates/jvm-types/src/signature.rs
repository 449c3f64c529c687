use crate::{Utf8, error::ResolutionError};

/// Stack accounting for a method descriptor such as `(IJ[Ljava/lang/String;)V`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    /// Argument words, excluding any receiver. `J` and `D` take two.
    pub ins: u16,
    /// Return words: 0 for `V`, 2 for `J`/`D`, otherwise 1.
    pub outs: u8,
    /// First character of the return descriptor.
    pub return_type: char,
}

impl MethodSignature {
    /// No arguments and no result.
    pub const EMPTY: Self = Self {
        ins: 0,
        outs: 0,
        return_type: 'V',
    };

    pub fn parse(signature: &Utf8) -> Result<Self, ResolutionError> {
        let bad = || ResolutionError::MalformedSignature(signature.clone());
        let bytes = signature.as_bytes();
        if bytes.first() != Some(&b'(') {
            return Err(bad());
        }

        let mut pos = 1;
        let mut ins: u16 = 0;
        loop {
            match bytes.get(pos) {
                None => return Err(bad()),
                Some(b')') => {
                    pos += 1;
                    break;
                }
                Some(_) => {
                    let (next, words) = field_type(bytes, pos).ok_or_else(bad)?;
                    ins = ins.checked_add(words as u16).ok_or_else(bad)?;
                    pos = next;
                }
            }
        }

        let return_type = *bytes.get(pos).ok_or_else(bad)? as char;
        let (end, outs) = if return_type == 'V' {
            (pos + 1, 0)
        } else {
            field_type(bytes, pos).ok_or_else(bad)?
        };
        if end != bytes.len() {
            return Err(bad());
        }

        Ok(Self {
            ins,
            outs,
            return_type,
        })
    }
}

/// Parses one field descriptor starting at `pos`, returning the position just
/// past it and the number of stack words it occupies.
fn field_type(bytes: &[u8], pos: usize) -> Option<(usize, u8)> {
    match *bytes.get(pos)? {
        b'B' | b'C' | b'F' | b'I' | b'S' | b'Z' => Some((pos + 1, 1)),
        b'J' | b'D' => Some((pos + 1, 2)),
        b'L' => {
            let len = bytes[pos + 1..].iter().position(|b| *b == b';')?;
            if len == 0 {
                return None;
            }
            Some((pos + len + 2, 1))
        }
        b'[' => {
            let (next, _) = field_type(bytes, pos + 1)?;
            Some((next, 1))
        }
        _ => None,
    }
}
