//! `UTCTime` and `GeneralizedTime` lexing and rendering.
//!
//! Both types share the same field layout, calendar fields of
//! increasing granularity followed by a timezone suffix, so one parser
//! serves both, parameterized by whether the year is two or four ASCII
//! digits.

use crate::error::{Error, Result};
use crate::tag::UniversalType;

/// How much of the time-of-day was present in the encoded form.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DatetimeFormat {
    Hours,
    Minutes,
    Seconds,
    Fractions,
}

/// The timezone suffix attached to a time value.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Timezone {
    /// Trailing `Z`.
    Utc,
    /// No suffix at all.
    Local,
    /// `+HHMM` or `-HHMM` differential from UTC.
    Diff { positive: bool, hours: u8, minutes: u8 },
}

/// A decoded/to-be-encoded `UTCTime` or `GeneralizedTime` value.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeValue {
    /// Two digits for `UTCTime`, four for `GeneralizedTime`.
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: Option<u8>,
    pub second: Option<u8>,
    /// Fractional-second digits, kept as decimal text (not a float) so
    /// round-tripping never introduces rounding error.
    pub fraction: Option<String>,
    pub timezone: Timezone,
    pub format: DatetimeFormat,
}

fn decode_digit(byte: u8) -> Result<u32> {
    if byte.is_ascii_digit() {
        Ok(u32::from(byte - b'0'))
    } else {
        Err(Error::encoder("Time value contains a non-digit character"))
    }
}

fn decode_decimal(bytes: &[u8]) -> Result<u32> {
    let mut value = 0;
    for byte in bytes {
        value = value * 10 + decode_digit(*byte)?;
    }
    Ok(value)
}

fn encode_decimal(out: &mut String, value: u32, digits: usize) {
    out.push_str(&format!("{:0width$}", value, width = digits));
}

/// Parse a time payload. `four_digit_year` selects `GeneralizedTime`'s
/// four-digit year over `UTCTime`'s two-digit year.
pub(crate) fn parse_time(payload: &[u8], four_digit_year: bool) -> Result<TimeValue> {
    let year_digits = if four_digit_year { 4 } else { 2 };
    let min_len = year_digits + 6; // YY[YY]MMDDHH minimum
    if payload.len() < min_len {
        return Err(Error::encoder("Time value is too short"));
    }

    let mut pos = 0;
    let year = decode_decimal(&payload[pos..pos + year_digits])? as i32;
    pos += year_digits;
    let month = decode_decimal(&payload[pos..pos + 2])? as u8;
    pos += 2;
    let day = decode_decimal(&payload[pos..pos + 2])? as u8;
    pos += 2;
    let hour = decode_decimal(&payload[pos..pos + 2])? as u8;
    pos += 2;

    if hour == 24 {
        return Err(Error::encoder(
            "Midnight must only be specified by 00, but got 24.",
        ));
    }

    let mut minute = None;
    let mut second = None;
    let mut fraction = None;
    let mut format = DatetimeFormat::Hours;

    // Minutes, if present, are two more digits not consumed by the
    // timezone suffix below.
    if payload.get(pos).map(u8::is_ascii_digit).unwrap_or(false) {
        minute = Some(decode_decimal(payload.get(pos..pos + 2).ok_or_else(|| {
            Error::encoder("Time value is truncated in the minutes field")
        })?)? as u8);
        pos += 2;
        format = DatetimeFormat::Minutes;

        if payload.get(pos).map(u8::is_ascii_digit).unwrap_or(false) {
            second = Some(decode_decimal(payload.get(pos..pos + 2).ok_or_else(|| {
                Error::encoder("Time value is truncated in the seconds field")
            })?)? as u8);
            pos += 2;
            format = DatetimeFormat::Seconds;

            if payload.get(pos) == Some(&b'.') || payload.get(pos) == Some(&b',') {
                pos += 1;
                let start = pos;
                while payload.get(pos).map(u8::is_ascii_digit).unwrap_or(false) {
                    pos += 1;
                }
                if pos == start {
                    return Err(Error::encoder("Fractional seconds marker with no digits"));
                }
                fraction = Some(
                    std::str::from_utf8(&payload[start..pos])
                        .map_err(|_| Error::encoder("Fractional seconds are not valid UTF-8"))?
                        .to_string(),
                );
                format = DatetimeFormat::Fractions;
            }
        }
    }

    let timezone = match payload.get(pos) {
        None => Timezone::Local,
        Some(b'Z') if pos + 1 == payload.len() => Timezone::Utc,
        Some(sign @ (b'+' | b'-')) => {
            let diff = payload.get(pos + 1..pos + 5).ok_or_else(|| {
                Error::encoder("Timezone differential is truncated")
            })?;
            Timezone::Diff {
                positive: *sign == b'+',
                hours: decode_decimal(&diff[0..2])? as u8,
                minutes: decode_decimal(&diff[2..4])? as u8,
            }
        }
        Some(_) => return Err(Error::encoder("Unrecognized timezone suffix")),
    };

    if !four_digit_year && timezone == Timezone::Local {
        return Err(Error::encoder(
            "UTCTime must carry a timezone modifier",
        ));
    }

    Ok(TimeValue {
        year,
        month,
        day,
        hour,
        minute,
        second,
        fraction,
        timezone,
        format,
    })
}

/// Render a time value to its BER payload bytes.
pub(crate) fn encode_time(value: &TimeValue, universal_type: UniversalType) -> Result<Vec<u8>> {
    if value.hour == 24 {
        return Err(Error::encoder(
            "Midnight must only be specified by 00, but got 24.",
        ));
    }

    let mut out = String::new();
    let year_digits = if universal_type == UniversalType::GeneralizedTime {
        4
    } else {
        2
    };
    encode_decimal(&mut out, (value.year.rem_euclid(10i32.pow(year_digits as u32))) as u32, year_digits);
    encode_decimal(&mut out, u32::from(value.month), 2);
    encode_decimal(&mut out, u32::from(value.day), 2);
    encode_decimal(&mut out, u32::from(value.hour), 2);

    if let Some(minute) = value.minute {
        encode_decimal(&mut out, u32::from(minute), 2);
        if let Some(second) = value.second {
            encode_decimal(&mut out, u32::from(second), 2);
            if let Some(fraction) = &value.fraction {
                out.push('.');
                out.push_str(fraction);
            }
        }
    }

    match value.timezone {
        Timezone::Utc => out.push('Z'),
        Timezone::Local => {
            if universal_type == UniversalType::UtcTime {
                return Err(Error::encoder("UTCTime must carry a timezone modifier"));
            }
        }
        Timezone::Diff {
            positive,
            hours,
            minutes,
        } => {
            out.push(if positive { '+' } else { '-' });
            encode_decimal(&mut out, u32::from(hours), 2);
            encode_decimal(&mut out, u32::from(minutes), 2);
        }
    }

    Ok(out.into_bytes())
}
