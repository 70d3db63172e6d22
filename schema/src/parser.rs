use crate::{
    error::SjsonError,
    stream::InputStream,
    value::{Map, Value},
};

const RAW_OPEN: &[u8] = b"[=[";
const RAW_CLOSE: &[u8] = b"]=]";

fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r')
}

fn is_identifier(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

fn is_number_separator(byte: Option<u8>) -> bool {
    match byte {
        None => true,
        Some(b) => is_whitespace(b) || matches!(b, b',' | b']' | b'}'),
    }
}

/// Parse SJSON text into its root object.
///
/// The root is an object whose surrounding braces are optional.
pub fn parse(text: &str) -> Result<Map, SjsonError> {
    let mut stream = InputStream::new(text.as_bytes());
    skip_whitespace(&mut stream)?;

    let map = if stream.peek() == Some(b'{') {
        stream.read()?;
        let map = decode_object(&mut stream, true)?;
        skip_whitespace(&mut stream)?;
        if !stream.is_at_end() {
            return Err(stream.error("Unexpected content after root object"));
        }
        map
    } else {
        decode_object(&mut stream, false)?
    };
    Ok(map)
}

/// Skip whitespace and comments. Returns the next byte, or `None` at the end
/// of the stream.
fn skip_whitespace(stream: &mut InputStream) -> Result<Option<u8>, SjsonError> {
    loop {
        match stream.peek() {
            Some(byte) if is_whitespace(byte) => {
                stream.read()?;
            }
            Some(b'/') if stream.starts_with(b"/*") => skip_block_comment(stream)?,
            Some(b'/') if stream.starts_with(b"//") => skip_line_comment(stream)?,
            next => return Ok(next),
        }
    }
}

fn skip_block_comment(stream: &mut InputStream) -> Result<(), SjsonError> {
    let start = stream.location();
    stream.skip(2)?;
    // Block comments do not nest.
    loop {
        if stream.is_at_end() {
            return Err(SjsonError::at("Could not find closing '*/' for comment", start));
        }
        if stream.starts_with(b"*/") {
            return stream.skip(2);
        }
        stream.read()?;
    }
}

fn skip_line_comment(stream: &mut InputStream) -> Result<(), SjsonError> {
    stream.skip(2)?;
    while let Some(byte) = stream.peek() {
        if byte == b'\n' {
            break;
        }
        stream.read()?;
    }
    Ok(())
}

/// Decode the entries of an object. The opening brace, if any, has already
/// been consumed. A delimited object must end with `}`; an undelimited one
/// (the root) ends at the end of the stream.
fn decode_object(stream: &mut InputStream, delimited: bool) -> Result<Map, SjsonError> {
    let mut map = Map::new();
    let mut next = skip_whitespace(stream)?;

    loop {
        match next {
            None if delimited => return Err(stream.end_of_stream()),
            None => break,
            Some(b'}') if delimited => {
                stream.read()?;
                break;
            }
            Some(b'}') => return Err(stream.error("Unbalanced '}'")),
            Some(_) => {}
        }

        let key = decode_key(stream)?;
        next = skip_whitespace(stream)?;
        // Both '=' and ':' are accepted as separators, and both are optional.
        if matches!(next, Some(b'=') | Some(b':')) {
            stream.read()?;
        }
        let value = parse_value(stream)?;
        map.insert(key, value);

        next = skip_whitespace(stream)?;
        if next == Some(b',') {
            stream.read()?;
            next = skip_whitespace(stream)?;
        }
    }

    Ok(map)
}

fn decode_list(stream: &mut InputStream) -> Result<Vec<Value>, SjsonError> {
    // skip '['
    stream.read()?;
    let mut values = Vec::new();
    let mut next = skip_whitespace(stream)?;

    loop {
        match next {
            None => return Err(stream.end_of_stream()),
            Some(b']') => {
                stream.read()?;
                break;
            }
            Some(_) => {}
        }

        values.push(parse_value(stream)?);

        next = skip_whitespace(stream)?;
        if next == Some(b',') {
            stream.read()?;
            next = skip_whitespace(stream)?;
        }
    }

    Ok(values)
}

fn decode_key(stream: &mut InputStream) -> Result<String, SjsonError> {
    match stream.peek() {
        Some(b'"') => decode_quoted_string(stream),
        Some(b'[') => decode_raw_string(stream),
        Some(byte) if is_identifier(byte) => {
            let mut bytes = Vec::new();
            while let Some(byte) = stream.peek() {
                if !is_identifier(byte) {
                    break;
                }
                bytes.push(stream.read()?);
            }
            // Identifier bytes are ASCII.
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        Some(_) => Err(stream.error("Expected a key")),
        None => Err(stream.end_of_stream()),
    }
}

fn decode_escaped(stream: &mut InputStream) -> Result<u8, SjsonError> {
    let location = stream.location();
    match stream.read()? {
        b'b' => Ok(0x08),
        b'n' => Ok(b'\n'),
        b't' => Ok(b'\t'),
        b'\\' => Ok(b'\\'),
        b'"' => Ok(b'"'),
        other => Err(SjsonError::at(
            format!("Invalid escape sequence '\\{}'", other as char),
            location,
        )),
    }
}

fn decode_quoted_string(stream: &mut InputStream) -> Result<String, SjsonError> {
    let start = stream.location();
    stream.consume(b"\"")?;
    let mut bytes = Vec::new();
    loop {
        match stream.peek() {
            None => return Err(SjsonError::at("Unterminated string", start)),
            Some(b'"') => {
                stream.read()?;
                break;
            }
            Some(b'\\') => {
                stream.read()?;
                if stream.is_at_end() {
                    return Err(SjsonError::at("Unterminated string", start));
                }
                bytes.push(decode_escaped(stream)?);
            }
            Some(_) => bytes.push(stream.read()?),
        }
    }
    into_string(bytes, start)
}

fn decode_raw_string(stream: &mut InputStream) -> Result<String, SjsonError> {
    let start = stream.location();
    if !stream.starts_with(RAW_OPEN) {
        return Err(stream.error("Raw quoted string must start with [=["));
    }
    stream.skip(RAW_OPEN.len())?;
    let mut bytes = Vec::new();
    loop {
        if stream.is_at_end() {
            return Err(SjsonError::at("Unterminated raw string", start));
        }
        if stream.starts_with(RAW_CLOSE) {
            stream.skip(RAW_CLOSE.len())?;
            break;
        }
        bytes.push(stream.read()?);
    }
    into_string(bytes, start)
}

fn into_string(bytes: Vec<u8>, start: crate::stream::Location) -> Result<String, SjsonError> {
    String::from_utf8(bytes).map_err(|_| SjsonError::at("Invalid UTF-8 in string", start))
}

fn decode_number(stream: &mut InputStream) -> Result<Value, SjsonError> {
    let start = stream.location();
    let mut text = String::new();
    let mut is_decimal = false;

    while !is_number_separator(stream.peek()) {
        let byte = stream.read()?;
        if matches!(byte, b'.' | b'e' | b'E') {
            is_decimal = true;
        }
        text.push(byte as char);
    }

    let parsed = if is_decimal {
        text.parse::<f64>().ok().map(Value::Float)
    } else {
        text.parse::<i64>().ok().map(Value::Int)
    };
    parsed.ok_or_else(|| SjsonError::at("Invalid character", start))
}

fn parse_value(stream: &mut InputStream) -> Result<Value, SjsonError> {
    match skip_whitespace(stream)? {
        None => Err(stream.end_of_stream()),
        Some(b't') => stream.consume(b"true").map(|_| Value::Bool(true)),
        Some(b'f') => stream.consume(b"false").map(|_| Value::Bool(false)),
        Some(b'n') => stream.consume(b"null").map(|_| Value::Null),
        Some(b'{') => {
            stream.read()?;
            decode_object(stream, true).map(Value::Object)
        }
        Some(b'"') => decode_quoted_string(stream).map(Value::String),
        Some(b'[') if stream.peek_at(1) == Some(b'=') => {
            decode_raw_string(stream).map(Value::String)
        }
        Some(b'[') => decode_list(stream).map(Value::Array),
        Some(_) => decode_number(stream),
    }
}
