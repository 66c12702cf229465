//! Binary property list (`bplist00`) decoder.
//!
//! Only the subset of the format needed to read dynamic wallpaper metadata is
//! required, but every object type Apple writes is understood so that
//! unrelated payloads still decode into a [`Value`] tree. Every read is bounds
//! checked: a hostile buffer produces a [`DecodeError`], never a panic.

mod value;

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;
pub use value::Value;

const MAGIC: &[u8] = b"bplist00";
const HEADER_LEN: usize = 8;
const TRAILER_LEN: usize = 32;

/// Containers nested deeper than this are rejected.
const MAX_DEPTH: usize = 512;

/// Upper bound on object visits, so heavily shared references cannot blow up.
const MAX_VISITS: usize = 1 << 20;

/// Errors produced while decoding a property list.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed bplist: {0}")]
    Malformed(String),

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

fn malformed(message: impl Into<String>) -> DecodeError { DecodeError::Malformed(message.into()) }

/// Decodes a base64 string (whitespace is ignored) and then the bplist inside.
///
/// # Errors
///
/// Returns [`DecodeError::Base64`] when the text is not base64 and
/// [`DecodeError::Malformed`] when the decoded bytes are not a valid bplist.
pub fn decode_base64(text: &str) -> Result<Value, DecodeError> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(compact.as_bytes())?;
    decode(&bytes)
}

/// Decodes a `bplist00` buffer into its top-level [`Value`].
///
/// # Errors
///
/// Returns [`DecodeError::Malformed`] on a bad header or trailer, out-of-range
/// offsets or references, unknown markers, reference cycles, or nesting deeper
/// than the supported limit.
pub fn decode(bytes: &[u8]) -> Result<Value, DecodeError> {
    if bytes.len() < HEADER_LEN + TRAILER_LEN {
        return Err(malformed(format!("buffer too short ({} bytes)", bytes.len())));
    }
    if &bytes[..HEADER_LEN] != MAGIC {
        return Err(malformed("missing bplist00 header"));
    }

    let trailer = Trailer::parse(bytes)?;
    let offsets = trailer.read_offsets(bytes)?;
    let mut decoder = Decoder {
        bytes,
        object_limit: trailer.offset_table_offset,
        in_progress: vec![false; offsets.len()],
        offsets,
        ref_size: trailer.object_ref_size,
        visits: 0,
    };
    decoder.object(trailer.top_object, 0)
}

// ============================================================================
// Trailer
// ============================================================================

#[derive(Debug)]
struct Trailer {
    offset_int_size: usize,
    object_ref_size: usize,
    num_objects: usize,
    top_object: usize,
    offset_table_offset: usize,
}

impl Trailer {
    fn parse(bytes: &[u8]) -> Result<Self, DecodeError> {
        let trailer = &bytes[bytes.len() - TRAILER_LEN..];
        let offset_int_size = usize::from(trailer[6]);
        let object_ref_size = usize::from(trailer[7]);
        let num_objects = to_usize(read_be(&trailer[8..16]))?;
        let top_object = to_usize(read_be(&trailer[16..24]))?;
        let offset_table_offset = to_usize(read_be(&trailer[24..32]))?;

        if !(1..=8).contains(&offset_int_size) {
            return Err(malformed(format!("invalid offset size {offset_int_size}")));
        }
        if !(1..=8).contains(&object_ref_size) {
            return Err(malformed(format!("invalid object reference size {object_ref_size}")));
        }
        if num_objects == 0 {
            return Err(malformed("object table is empty"));
        }
        if top_object >= num_objects {
            return Err(malformed(format!(
                "top object {top_object} outside object table of {num_objects}"
            )));
        }

        let table_len = num_objects
            .checked_mul(offset_int_size)
            .ok_or_else(|| malformed("offset table size overflows"))?;
        let table_end = offset_table_offset
            .checked_add(table_len)
            .ok_or_else(|| malformed("offset table size overflows"))?;
        if offset_table_offset < HEADER_LEN || table_end > bytes.len() - TRAILER_LEN {
            return Err(malformed("offset table lies outside the buffer"));
        }

        Ok(Self {
            offset_int_size,
            object_ref_size,
            num_objects,
            top_object,
            offset_table_offset,
        })
    }

    fn read_offsets(&self, bytes: &[u8]) -> Result<Vec<usize>, DecodeError> {
        let table = &bytes[self.offset_table_offset..];
        (0..self.num_objects)
            .map(|index| {
                let start = index * self.offset_int_size;
                let offset = to_usize(read_be(&table[start..start + self.offset_int_size]))?;
                if offset < HEADER_LEN || offset >= self.offset_table_offset {
                    return Err(malformed(format!("object {index} has invalid offset {offset}")));
                }
                Ok(offset)
            })
            .collect()
    }
}

// ============================================================================
// Object decoding
// ============================================================================

struct Decoder<'a> {
    bytes: &'a [u8],
    /// Objects must end before the offset table starts.
    object_limit: usize,
    offsets: Vec<usize>,
    ref_size: usize,
    /// Objects on the current decode path; shared references are fine, cycles are not.
    in_progress: Vec<bool>,
    visits: usize,
}

impl Decoder<'_> {
    fn object(&mut self, index: usize, depth: usize) -> Result<Value, DecodeError> {
        if depth > MAX_DEPTH {
            return Err(malformed(format!("nesting deeper than {MAX_DEPTH}")));
        }
        let offset = *self
            .offsets
            .get(index)
            .ok_or_else(|| malformed(format!("object reference {index} out of range")))?;
        if self.in_progress[index] {
            return Err(malformed(format!("reference cycle through object {index}")));
        }
        self.visits += 1;
        if self.visits > MAX_VISITS {
            return Err(malformed("too many objects"));
        }

        self.in_progress[index] = true;
        let result = self.parse_object(offset, depth);
        self.in_progress[index] = false;
        result
    }

    fn parse_object(&mut self, offset: usize, depth: usize) -> Result<Value, DecodeError> {
        let marker = self.slice(offset, 1)?[0];
        let info = marker & 0x0F;

        match marker >> 4 {
            0x0 => match marker {
                0x00 | 0x0F => Ok(Value::Null),
                0x08 => Ok(Value::Boolean(false)),
                0x09 => Ok(Value::Boolean(true)),
                _ => Err(malformed(format!("unknown marker {marker:#04x} at {offset}"))),
            },
            0x1 => self.integer(offset + 1, info).map(Value::Integer),
            0x2 => self.real(offset + 1, info).map(Value::Real),
            0x3 if marker == 0x33 => self.real(offset + 1, 3).map(Value::Date),
            0x4 => {
                let (len, start) = self.length(offset, info)?;
                Ok(Value::Data(self.slice(start, len)?.to_vec()))
            }
            0x5 => {
                let (len, start) = self.length(offset, info)?;
                Ok(Value::String(self.slice(start, len)?.iter().map(|&b| char::from(b)).collect()))
            }
            0x6 => {
                let (units, start) = self.length(offset, info)?;
                let len = units.checked_mul(2).ok_or_else(|| malformed("string length overflows"))?;
                let raw = self.slice(start, len)?;
                let code_units = raw.chunks_exact(2).map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
                char::decode_utf16(code_units)
                    .collect::<Result<String, _>>()
                    .map(Value::String)
                    .map_err(|err| malformed(format!("invalid UTF-16 string at {offset}: {err}")))
            }
            0x8 => {
                let raw = self.slice(offset + 1, usize::from(info) + 1)?;
                if raw.len() > 8 {
                    return Err(malformed(format!("uid wider than 8 bytes at {offset}")));
                }
                Ok(Value::Uid(read_be(raw)))
            }
            0xA | 0xC => {
                let (count, start) = self.length(offset, info)?;
                let refs = self.refs(start, count)?;
                let mut items = Vec::with_capacity(refs.len());
                for index in refs {
                    items.push(self.object(index, depth + 1)?);
                }
                Ok(Value::Array(items))
            }
            0xD => {
                let (count, start) = self.length(offset, info)?;
                let refs = self.refs(start, count.checked_mul(2).ok_or_else(|| malformed("dictionary size overflows"))?)?;
                let (key_refs, value_refs) = refs.split_at(count);
                let mut map = BTreeMap::new();
                for (&key_ref, &value_ref) in key_refs.iter().zip(value_refs) {
                    let key = match self.object(key_ref, depth + 1)? {
                        Value::String(key) => key,
                        other => {
                            return Err(malformed(format!(
                                "dictionary key must be a string, found {}",
                                other.kind_name()
                            )));
                        }
                    };
                    let value = self.object(value_ref, depth + 1)?;
                    map.insert(key, value);
                }
                Ok(Value::Dictionary(map))
            }
            _ => Err(malformed(format!("unknown marker {marker:#04x} at {offset}"))),
        }
    }

    /// Reads an integer of `2^exponent` bytes starting at `start`.
    fn integer(&self, start: usize, exponent: u8) -> Result<i64, DecodeError> {
        match exponent {
            0..=2 => {
                let raw = self.slice(start, 1 << exponent)?;
                i64::try_from(read_be(raw)).map_err(|_| malformed("integer overflows"))
            }
            3 => Ok(i64::from_be_bytes(self.array::<8>(start)?)),
            // 128-bit integers: only the low 64 bits are kept.
            4 => Ok(i64::from_be_bytes(self.array::<8>(start + 8)?)),
            _ => Err(malformed(format!("unsupported integer width 2^{exponent}"))),
        }
    }

    fn real(&self, start: usize, exponent: u8) -> Result<f64, DecodeError> {
        match exponent {
            2 => Ok(f64::from(f32::from_be_bytes(self.array::<4>(start)?))),
            3 => Ok(f64::from_be_bytes(self.array::<8>(start)?)),
            _ => Err(malformed(format!("unsupported real width 2^{exponent}"))),
        }
    }

    /// Resolves the element count of a variable-length object and where its
    /// payload begins.
    fn length(&self, offset: usize, info: u8) -> Result<(usize, usize), DecodeError> {
        if info != 0x0F {
            return Ok((usize::from(info), offset + 1));
        }

        let marker = self.slice(offset + 1, 1)?[0];
        let exponent = marker & 0x0F;
        if marker >> 4 != 0x1 || exponent > 3 {
            return Err(malformed(format!("invalid length marker {marker:#04x} at {offset}")));
        }
        let value = self.integer(offset + 2, exponent)?;
        let len = usize::try_from(value).map_err(|_| malformed(format!("negative length at {offset}")))?;
        Ok((len, offset + 2 + (1 << exponent)))
    }

    fn refs(&self, start: usize, count: usize) -> Result<Vec<usize>, DecodeError> {
        let len = count
            .checked_mul(self.ref_size)
            .ok_or_else(|| malformed("reference list size overflows"))?;
        self.slice(start, len)?
            .chunks_exact(self.ref_size)
            .map(|chunk| {
                let index = to_usize(read_be(chunk))?;
                if index >= self.offsets.len() {
                    return Err(malformed(format!("object reference {index} out of range")));
                }
                Ok(index)
            })
            .collect()
    }

    fn array<const N: usize>(&self, start: usize) -> Result<[u8; N], DecodeError> {
        let mut out = [0; N];
        out.copy_from_slice(self.slice(start, N)?);
        Ok(out)
    }

    fn slice(&self, start: usize, len: usize) -> Result<&[u8], DecodeError> {
        start
            .checked_add(len)
            .filter(|&end| end <= self.object_limit)
            .map(|end| &self.bytes[start..end])
            .ok_or_else(|| malformed(format!("{len} bytes at {start} run past the object table")))
    }
}

fn read_be(bytes: &[u8]) -> u64 { bytes.iter().fold(0, |acc, &b| (acc << 8) | u64::from(b)) }

fn to_usize(value: u64) -> Result<usize, DecodeError> {
    usize::try_from(value).map_err(|_| malformed(format!("value {value} does not fit in memory")))
}
