//! Companion message dictionary
//!
//! The companion app and the watch exchange flat key/value dictionaries:
//!
//! ```text
//! count: u8
//! count times: key: u32 | type: u8 | length: u16 | value: [u8; length]
//! ```
//!
//! All integers are little endian. Integer values are 1, 2 or 4 bytes wide,
//! strings carry their trailing NUL.

use core::fmt;

/// Largest encoded message accepted from the companion
pub const MESSAGE_MAX_LEN: usize = 128;

const TUPLE_HEADER_LEN: usize = 7;

/// Keys understood by the watch and the companion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum MessageKey {
    /// Sent by the watch to ask the companion for fresh weather
    RequestWeather = 0,
    Units = 10_000,
    WeatherOn = 10_001,
    WeatherSafemode = 10_002,
    Temperature = 10_003,
    Icon = 10_004,
    BackgroundColor = 10_005,
    BackgroundOn = 10_006,
    /// Only used by the companion to look up the weather
    Location = 10_007,
}

impl MessageKey {
    /// Numeric key on the wire and in persisted storage
    pub const fn id(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum TupleType {
    ByteArray = 0,
    CString = 1,
    UInt = 2,
    Int = 3,
}

/// Value of a single dictionary entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value<'a> {
    Bytes(&'a [u8]),
    CString(&'a str),
    UInt(u32),
    Int(i32),
}

impl<'a> Value<'a> {
    /// Integer value of either signedness
    pub fn as_int(&self) -> Option<i32> {
        match *self {
            Value::Int(value) => Some(value),
            Value::UInt(value) => Some(value as i32),
            _ => None,
        }
    }

    /// Integer value interpreted as a flag (non-zero is `true`)
    pub fn as_bool(&self) -> Option<bool> {
        self.as_int().map(|value| value != 0)
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match *self {
            Value::CString(text) => Some(text),
            _ => None,
        }
    }
}

/// A key with its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tuple<'a> {
    pub key: u32,
    pub value: Value<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// No tuple count
    Empty,
    /// A tuple header or value runs past the end of the buffer
    Truncated,
    UnknownType(u8),
    /// Integer value that is not 1, 2 or 4 bytes wide
    BadIntWidth(u16),
    MissingNul,
    InvalidUtf8,
    /// Bytes left over after the announced number of tuples
    TrailingBytes,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Empty => f.write_str("empty message"),
            DecodeError::Truncated => f.write_str("truncated tuple"),
            DecodeError::UnknownType(kind) => write!(f, "unknown tuple type {}", kind),
            DecodeError::BadIntWidth(width) => write!(f, "bad integer width {}", width),
            DecodeError::MissingNul => f.write_str("string without terminator"),
            DecodeError::InvalidUtf8 => f.write_str("string is not utf-8"),
            DecodeError::TrailingBytes => f.write_str("trailing bytes after last tuple"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    BufferFull,
    TooManyTuples,
    ValueTooLong,
    /// A string value containing NUL would be cut short by the reader
    InteriorNul,
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::BufferFull => f.write_str("message buffer full"),
            EncodeError::TooManyTuples => f.write_str("too many tuples"),
            EncodeError::ValueTooLong => f.write_str("value too long"),
            EncodeError::InteriorNul => f.write_str("string contains NUL"),
        }
    }
}

/// A validated, borrowed dictionary
#[derive(Debug, Clone, Copy)]
pub struct Message<'a> {
    count: u8,
    body: &'a [u8],
}

impl<'a> Message<'a> {
    /// Validate a complete dictionary.
    ///
    /// Every tuple is checked up front, so lookups on the returned message
    /// never observe a malformed buffer.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, DecodeError> {
        let (&count, body) = bytes.split_first().ok_or(DecodeError::Empty)?;

        let mut rest = body;
        for _ in 0..count {
            let (_, tail) = read_tuple(rest)?;
            rest = tail;
        }
        if !rest.is_empty() {
            return Err(DecodeError::TrailingBytes);
        }

        Ok(Self { count, body })
    }

    /// Number of tuples
    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn iter(&self) -> Tuples<'a> {
        Tuples {
            remaining: self.count,
            rest: self.body,
        }
    }

    /// First tuple stored under `key`
    pub fn find(&self, key: MessageKey) -> Option<Tuple<'a>> {
        self.iter().find(|tuple| tuple.key == key.id())
    }
}

/// Iterator over the tuples of a [`Message`]
pub struct Tuples<'a> {
    remaining: u8,
    rest: &'a [u8],
}

impl<'a> Iterator for Tuples<'a> {
    type Item = Tuple<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let (tuple, rest) = read_tuple(self.rest).ok()?;
        self.remaining -= 1;
        self.rest = rest;
        Some(tuple)
    }
}

fn read_tuple(bytes: &[u8]) -> Result<(Tuple<'_>, &[u8]), DecodeError> {
    if bytes.len() < TUPLE_HEADER_LEN {
        return Err(DecodeError::Truncated);
    }
    let (header, rest) = bytes.split_at(TUPLE_HEADER_LEN);
    let key = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let kind = header[4];
    let length = u16::from_le_bytes([header[5], header[6]]) as usize;

    if rest.len() < length {
        return Err(DecodeError::Truncated);
    }
    let (raw, rest) = rest.split_at(length);

    let value = match kind {
        k if k == TupleType::ByteArray as u8 => Value::Bytes(raw),
        k if k == TupleType::CString as u8 => {
            let end = raw
                .iter()
                .position(|&b| b == 0)
                .ok_or(DecodeError::MissingNul)?;
            let text = core::str::from_utf8(&raw[..end]).map_err(|_| DecodeError::InvalidUtf8)?;
            Value::CString(text)
        }
        k if k == TupleType::UInt as u8 => Value::UInt(read_uint(raw)?),
        k if k == TupleType::Int as u8 => Value::Int(read_int(raw)?),
        other => return Err(DecodeError::UnknownType(other)),
    };

    Ok((Tuple { key, value }, rest))
}

fn read_uint(raw: &[u8]) -> Result<u32, DecodeError> {
    match *raw {
        [a] => Ok(a as u32),
        [a, b] => Ok(u16::from_le_bytes([a, b]) as u32),
        [a, b, c, d] => Ok(u32::from_le_bytes([a, b, c, d])),
        _ => Err(DecodeError::BadIntWidth(raw.len() as u16)),
    }
}

fn read_int(raw: &[u8]) -> Result<i32, DecodeError> {
    match *raw {
        [a] => Ok(a as i8 as i32),
        [a, b] => Ok(i16::from_le_bytes([a, b]) as i32),
        [a, b, c, d] => Ok(i32::from_le_bytes([a, b, c, d])),
        _ => Err(DecodeError::BadIntWidth(raw.len() as u16)),
    }
}

/// Builds a dictionary into a caller provided buffer
pub struct DictWriter<'a> {
    buf: &'a mut [u8],
    len: usize,
    count: u8,
}

impl<'a> DictWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Result<Self, EncodeError> {
        let count = buf.first_mut().ok_or(EncodeError::BufferFull)?;
        *count = 0;
        Ok(Self { buf, len: 1, count: 0 })
    }

    pub fn write_uint8(&mut self, key: u32, value: u8) -> Result<(), EncodeError> {
        self.push(key, TupleType::UInt, &[value], false)
    }

    pub fn write_uint32(&mut self, key: u32, value: u32) -> Result<(), EncodeError> {
        self.push(key, TupleType::UInt, &value.to_le_bytes(), false)
    }

    pub fn write_int32(&mut self, key: u32, value: i32) -> Result<(), EncodeError> {
        self.push(key, TupleType::Int, &value.to_le_bytes(), false)
    }

    pub fn write_cstring(&mut self, key: u32, value: &str) -> Result<(), EncodeError> {
        if value.as_bytes().contains(&0) {
            return Err(EncodeError::InteriorNul);
        }
        self.push(key, TupleType::CString, value.as_bytes(), true)
    }

    pub fn write_bytes(&mut self, key: u32, value: &[u8]) -> Result<(), EncodeError> {
        self.push(key, TupleType::ByteArray, value, false)
    }

    /// Encoded dictionary
    pub fn finish(self) -> &'a [u8] {
        let len = self.len;
        let buf: &'a [u8] = self.buf;
        &buf[..len]
    }

    fn push(&mut self, key: u32, kind: TupleType, value: &[u8], nul: bool) -> Result<(), EncodeError> {
        let count = self.count.checked_add(1).ok_or(EncodeError::TooManyTuples)?;
        let length = value.len() + nul as usize;
        let length_field = u16::try_from(length).map_err(|_| EncodeError::ValueTooLong)?;
        let end = self.len + TUPLE_HEADER_LEN + length;
        if end > self.buf.len() {
            return Err(EncodeError::BufferFull);
        }

        let tuple = &mut self.buf[self.len..end];
        tuple[..4].copy_from_slice(&key.to_le_bytes());
        tuple[4] = kind as u8;
        tuple[5..7].copy_from_slice(&length_field.to_le_bytes());
        tuple[7..7 + value.len()].copy_from_slice(value);
        if nul {
            tuple[length + TUPLE_HEADER_LEN - 1] = 0;
        }

        self.len = end;
        self.count = count;
        self.buf[0] = count;
        Ok(())
    }
}

/// Encode the request asking the companion for a weather update
pub fn weather_request(buf: &mut [u8]) -> Result<&[u8], EncodeError> {
    let mut writer = DictWriter::new(buf)?;
    writer.write_uint8(MessageKey::RequestWeather.id(), 0)?;
    Ok(writer.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_values_written_by_the_companion() {
        let mut buf = [0u8; MESSAGE_MAX_LEN];
        let mut writer = DictWriter::new(&mut buf).unwrap();
        writer.write_int32(MessageKey::Temperature.id(), -7).unwrap();
        writer.write_cstring(MessageKey::Icon.id(), "Rain").unwrap();
        writer.write_uint8(MessageKey::WeatherOn.id(), 1).unwrap();
        let bytes = writer.finish();

        let message = Message::parse(bytes).unwrap();
        assert_eq!(message.len(), 3);
        assert_eq!(
            message.find(MessageKey::Temperature).unwrap().value.as_int(),
            Some(-7)
        );
        assert_eq!(
            message.find(MessageKey::Icon).unwrap().value.as_str(),
            Some("Rain")
        );
        assert_eq!(
            message.find(MessageKey::WeatherOn).unwrap().value.as_bool(),
            Some(true)
        );
        assert!(message.find(MessageKey::Units).is_none());
    }

    #[test]
    fn narrow_integers_keep_their_sign() {
        // count 2; int8 -1 and uint8 255
        let bytes = [
            2, //
            0x10, 0x27, 0, 0, 3, 1, 0, 0xff, //
            0x11, 0x27, 0, 0, 2, 1, 0, 0xff,
        ];
        let message = Message::parse(&bytes).unwrap();
        assert_eq!(message.find(MessageKey::Units).unwrap().value, Value::Int(-1));
        assert_eq!(message.find(MessageKey::WeatherOn).unwrap().value, Value::UInt(255));
    }

    #[test]
    fn weather_request_is_a_single_zero_byte() {
        let mut buf = [0u8; 16];
        let bytes = weather_request(&mut buf).unwrap();
        assert_eq!(bytes, &[1, 0, 0, 0, 0, 2, 1, 0, 0]);
    }

    #[test]
    fn rejects_malformed_buffers() {
        assert_eq!(Message::parse(&[]).unwrap_err(), DecodeError::Empty);
        assert_eq!(
            Message::parse(&[1, 0x10, 0x27, 0]).unwrap_err(),
            DecodeError::Truncated
        );
        assert_eq!(
            Message::parse(&[1, 0x10, 0x27, 0, 0, 2, 4, 0, 1]).unwrap_err(),
            DecodeError::Truncated
        );
        assert_eq!(
            Message::parse(&[1, 0x10, 0x27, 0, 0, 9, 1, 0, 1]).unwrap_err(),
            DecodeError::UnknownType(9)
        );
        assert_eq!(
            Message::parse(&[1, 0x10, 0x27, 0, 0, 3, 3, 0, 1, 2, 3]).unwrap_err(),
            DecodeError::BadIntWidth(3)
        );
        assert_eq!(
            Message::parse(&[1, 0x14, 0x27, 0, 0, 1, 2, 0, b'h', b'i']).unwrap_err(),
            DecodeError::MissingNul
        );
        assert_eq!(
            Message::parse(&[1, 0x14, 0x27, 0, 0, 1, 3, 0, 0xc3, 0x28, 0]).unwrap_err(),
            DecodeError::InvalidUtf8
        );
        assert_eq!(
            Message::parse(&[0, 0xaa]).unwrap_err(),
            DecodeError::TrailingBytes
        );
    }

    #[test]
    fn strings_with_nul_are_refused() {
        let mut buf = [0u8; MESSAGE_MAX_LEN];
        let mut writer = DictWriter::new(&mut buf).unwrap();
        assert_eq!(
            writer.write_cstring(MessageKey::Icon.id(), "Sun\0ny"),
            Err(EncodeError::InteriorNul)
        );
        writer.write_cstring(MessageKey::Icon.id(), "Sunny").unwrap();

        let message = Message::parse(writer.finish()).unwrap();
        assert_eq!(message.len(), 1);
        assert_eq!(
            message.find(MessageKey::Icon).unwrap().value.as_str(),
            Some("Sunny")
        );
    }

    #[test]
    fn empty_dictionary_is_valid() {
        let message = Message::parse(&[0]).unwrap();
        assert!(message.is_empty());
        assert_eq!(message.iter().count(), 0);
    }

    #[test]
    fn writer_refuses_to_truncate() {
        let mut buf = [0u8; 10];
        let mut writer = DictWriter::new(&mut buf).unwrap();
        assert_eq!(
            writer.write_cstring(MessageKey::Icon.id(), "Thunderstorm"),
            Err(EncodeError::BufferFull)
        );
        writer.write_uint8(MessageKey::Units.id(), 1).unwrap();
        assert_eq!(writer.finish().len(), 9);

        assert_eq!(DictWriter::new(&mut []).err(), Some(EncodeError::BufferFull));
    }
}
