use std::fmt;
use std::time::Duration;

/// Parse interval lengths such as `20s`, `1m30s`, `1.5s` or `750ms`.
///
/// # Grammar
///
/// ```text
/// duration  = component , { separators , component } ;
/// component = number , [ separators ] , unit ;
/// number    = digits , [ "." , digits ] ;
/// unit      = "ms" | "s" | "m" | "h" ;
/// separators = { whitespace | "_" } ;
/// ```
///
/// A bare number without unit is read as seconds, matching how workout
/// intervals are usually quoted. Units may not repeat and the total must be a
/// whole number of milliseconds. Zero is rejected; use
/// [`parse_duration_allow_zero`] for optional sections.
pub fn parse_duration(value: &str) -> Result<Duration, DurationParseError> {
    let duration = parse_duration_allow_zero(value)?;
    if duration.is_zero() {
        return Err(DurationParseError::Zero);
    }
    Ok(duration)
}

/// Like [`parse_duration`] but accepts `0`, `0s` and friends.
pub fn parse_duration_allow_zero(value: &str) -> Result<Duration, DurationParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DurationParseError::Empty);
    }

    if let Some((index, found)) = trimmed
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '.' || *c == '_' || c.is_whitespace()))
    {
        return Err(DurationParseError::UnexpectedChar { index, found });
    }

    if trimmed.bytes().all(|b| b.is_ascii_digit()) {
        let seconds: u64 = trimmed.parse().map_err(|_| DurationParseError::TooLarge)?;
        return Ok(Duration::from_secs(seconds));
    }

    let bytes = trimmed.as_bytes();
    let mut cursor = 0usize;
    let mut seen = [false; Unit::COUNT];
    let mut total_ms: u128 = 0;

    while cursor < bytes.len() {
        skip_separators(bytes, &mut cursor);
        if cursor >= bytes.len() {
            break;
        }

        let (whole, fraction, fraction_digits) = read_number(bytes, &mut cursor)?;
        skip_separators(bytes, &mut cursor);
        let unit = read_unit(trimmed, &mut cursor)?;

        if std::mem::replace(&mut seen[unit as usize], true) {
            return Err(DurationParseError::DuplicateUnit { unit });
        }

        let scale = 10u128.pow(fraction_digits);
        let numerator = whole
            .checked_mul(scale)
            .and_then(|v| v.checked_add(fraction))
            .and_then(|v| v.checked_mul(unit.millis()))
            .ok_or(DurationParseError::TooLarge)?;
        if numerator % scale != 0 {
            return Err(DurationParseError::SubMillisecond { unit });
        }
        total_ms = total_ms
            .checked_add(numerator / scale)
            .ok_or(DurationParseError::TooLarge)?;
    }

    let total_ms = u64::try_from(total_ms).map_err(|_| DurationParseError::TooLarge)?;
    Ok(Duration::from_millis(total_ms))
}

fn read_number(bytes: &[u8], cursor: &mut usize) -> Result<(u128, u128, u32), DurationParseError> {
    let start = *cursor;
    let whole = read_digits(bytes, cursor)?;
    if *cursor == start {
        return Err(DurationParseError::ExpectedNumber {
            index: start,
            found: bytes.get(start).map(|b| *b as char),
        });
    }

    if bytes.get(*cursor) != Some(&b'.') {
        return Ok((whole, 0, 0));
    }

    let dot = *cursor;
    *cursor += 1;
    let fraction_start = *cursor;
    let fraction = read_digits(bytes, cursor)?;
    let digits = (*cursor - fraction_start) as u32;
    if digits == 0 {
        return Err(DurationParseError::MissingFractionDigits { index: dot });
    }
    // Keeps the fixed-point scale well inside u128.
    if digits > 9 {
        return Err(DurationParseError::TooLarge);
    }
    Ok((whole, fraction, digits))
}

fn read_digits(bytes: &[u8], cursor: &mut usize) -> Result<u128, DurationParseError> {
    let mut value: u128 = 0;
    while let Some(byte) = bytes.get(*cursor).filter(|b| b.is_ascii_digit()) {
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(u128::from(byte - b'0')))
            .ok_or(DurationParseError::TooLarge)?;
        *cursor += 1;
    }
    Ok(value)
}

fn read_unit(text: &str, cursor: &mut usize) -> Result<Unit, DurationParseError> {
    let start = *cursor;
    let end = text[start..]
        .find(|c: char| !c.is_ascii_alphabetic())
        .map_or(text.len(), |offset| start + offset);

    let unit = match &text[start..end] {
        "ms" => Unit::Millisecond,
        "s" => Unit::Second,
        "m" => Unit::Minute,
        "h" => Unit::Hour,
        "" => {
            return Err(DurationParseError::ExpectedUnit {
                index: start,
                found: text[start..].chars().next(),
            })
        }
        other => {
            return Err(DurationParseError::UnknownUnit {
                index: start,
                found: other.to_owned(),
            })
        }
    };
    *cursor = end;
    Ok(unit)
}

fn skip_separators(bytes: &[u8], cursor: &mut usize) {
    while bytes
        .get(*cursor)
        .is_some_and(|b| *b == b'_' || b.is_ascii_whitespace())
    {
        *cursor += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DurationParseError {
    Empty,
    ExpectedNumber { index: usize, found: Option<char> },
    ExpectedUnit { index: usize, found: Option<char> },
    UnknownUnit { index: usize, found: String },
    DuplicateUnit { unit: Unit },
    MissingFractionDigits { index: usize },
    SubMillisecond { unit: Unit },
    UnexpectedChar { index: usize, found: char },
    Zero,
    TooLarge,
}

impl std::error::Error for DurationParseError {}

impl fmt::Display for DurationParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationParseError::Empty => write!(f, "duration cannot be empty"),
            DurationParseError::ExpectedNumber { index, found } => match found {
                Some(ch) => write!(f, "expected a number at position {} but found '{ch}'", index + 1),
                None => write!(f, "expected a number at position {}", index + 1),
            },
            DurationParseError::ExpectedUnit { index, found } => match found {
                Some(ch) => write!(f, "expected a unit at position {} but found '{ch}'", index + 1),
                None => write!(f, "expected a unit at position {}", index + 1),
            },
            DurationParseError::UnknownUnit { index, found } => {
                write!(f, "unknown unit '{found}' at position {} (use ms, s, m or h)", index + 1)
            }
            DurationParseError::DuplicateUnit { unit } => {
                write!(f, "unit '{}' appears more than once", unit.symbol())
            }
            DurationParseError::MissingFractionDigits { index } => write!(
                f,
                "expected digits after decimal point at position {}",
                index + 1
            ),
            DurationParseError::SubMillisecond { unit } => write!(
                f,
                "'{}' value is finer than one millisecond",
                unit.symbol()
            ),
            DurationParseError::UnexpectedChar { index, found } => {
                write!(f, "unexpected character '{found}' at position {}", index + 1)
            }
            DurationParseError::Zero => write!(f, "duration must be greater than zero"),
            DurationParseError::TooLarge => write!(f, "duration is too large"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Unit {
    Millisecond = 0,
    Second = 1,
    Minute = 2,
    Hour = 3,
}

impl Unit {
    const COUNT: usize = 4;

    fn millis(self) -> u128 {
        match self {
            Unit::Millisecond => 1,
            Unit::Second => 1_000,
            Unit::Minute => 60_000,
            Unit::Hour => 3_600_000,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Unit::Millisecond => "ms",
            Unit::Second => "s",
            Unit::Minute => "m",
            Unit::Hour => "h",
        }
    }
}
