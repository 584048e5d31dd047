// ── Binary event tables ──
//
// Status updates stream in as binary payloads following an event-table
// header. Each table is a packed sequence of fixed or length-prefixed
// records keyed by binary identifiers.

use bytes::Buf;
use serde::Serialize;

use crate::error::Error;
use crate::id::{ID128_BINARY_LEN, Id128};

const VALUE_RECORD_LEN: usize = ID128_BINARY_LEN + 8;
const TEXT_RECORD_MIN_LEN: usize = 2 * ID128_BINARY_LEN + 4;
const DAYTIMER_RECORD_MIN_LEN: usize = ID128_BINARY_LEN + 8 + 4;
const DAYTIMER_ENTRY_LEN: usize = 4 * 4 + 8;
const WEATHER_RECORD_MIN_LEN: usize = ID128_BINARY_LEN + 4 + 4;
const WEATHER_ENTRY_LEN: usize = 5 * 4 + 6 * 8;

/// Minutes in a day; daytimer bounds at or past it mean "end of day".
pub const MINUTES_PER_DAY: i32 = 1440;

/// One record of an `EventTableValueStates` payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueState {
    pub uuid: Id128,
    pub value: f64,
}

/// One record of an `EventTableTextStates` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextState {
    pub uuid: Id128,
    pub icon: Id128,
    pub text: String,
}

/// One switching period of a daytimer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DaytimerEntry {
    pub mode: i32,
    /// Start, in minutes since midnight.
    pub from: i32,
    /// End, in minutes since midnight.
    pub to: i32,
    pub need_activate: i32,
    /// Output value, for analog daytimers.
    pub value: f64,
}

/// One record of an `EventTableDaytimerStates` payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaytimerState {
    pub uuid: Id128,
    pub default_value: f64,
    pub entries: Vec<DaytimerEntry>,
}

/// One forecast slot of a weather record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeatherEntry {
    /// Seconds since the weather epoch (2009-01-01T00:00:00Z).
    pub timestamp: i32,
    pub weather_type: i32,
    pub wind_direction: i32,
    pub solar_radiation: i32,
    pub relative_humidity: i32,
    pub temperature: f64,
    pub perceived_temperature: f64,
    pub dew_point: f64,
    pub precipitation: f64,
    pub wind_speed: f64,
    pub barometric_pressure: f64,
}

/// One record of an `EventTableWeatherStates` payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherState {
    pub uuid: Id128,
    /// Seconds since the weather epoch.
    pub last_modified: u32,
    pub entries: Vec<WeatherEntry>,
}

fn truncated(needed: usize, buf: &impl Buf) -> Error {
    Error::Truncated {
        needed,
        available: buf.remaining(),
    }
}

/// Decode every `(uuid, f64 LE)` record in `buf`.
pub fn decode_value_states(buf: &mut impl Buf) -> Result<Vec<ValueState>, Error> {
    let mut states = Vec::with_capacity(buf.remaining() / VALUE_RECORD_LEN);
    while buf.has_remaining() {
        if buf.remaining() < VALUE_RECORD_LEN {
            return Err(truncated(VALUE_RECORD_LEN, buf));
        }
        let uuid = Id128::read_le(buf)?;
        let value = buf.get_f64_le();
        tracing::trace!(%uuid, value, "value state");
        states.push(ValueState { uuid, value });
    }
    Ok(states)
}

/// Decode every text record in `buf`.
///
/// Record layout: uuid, icon uuid, `u32 LE` byte length, UTF-8 text, then
/// zero padding up to the next 4-byte boundary. Invalid UTF-8 is replaced
/// rather than rejected.
pub fn decode_text_states(buf: &mut impl Buf) -> Result<Vec<TextState>, Error> {
    let mut states = Vec::new();
    while buf.has_remaining() {
        if buf.remaining() < TEXT_RECORD_MIN_LEN {
            return Err(truncated(TEXT_RECORD_MIN_LEN, buf));
        }
        let uuid = Id128::read_le(buf)?;
        let icon = Id128::read_le(buf)?;
        let len = usize::try_from(buf.get_u32_le()).unwrap_or(usize::MAX);
        if buf.remaining() < len {
            return Err(truncated(len, buf));
        }
        let raw = buf.copy_to_bytes(len);
        let text = String::from_utf8_lossy(&raw).into_owned();

        let padding = (4 - len % 4) % 4;
        buf.advance(padding.min(buf.remaining()));

        tracing::trace!(%uuid, %text, "text state");
        states.push(TextState { uuid, icon, text });
    }
    Ok(states)
}

/// Read a `u32 LE` entry count and check that `count` entries of
/// `entry_len` bytes are buffered.
fn entry_count(buf: &mut impl Buf, entry_len: usize) -> Result<usize, Error> {
    let count = usize::try_from(buf.get_u32_le()).unwrap_or(usize::MAX);
    let needed = count.saturating_mul(entry_len);
    if buf.remaining() < needed {
        return Err(truncated(needed, buf));
    }
    Ok(count)
}

/// Decode every daytimer record in `buf`.
///
/// Record layout: uuid, `f64 LE` default value, `u32 LE` entry count, then
/// per entry four `i32 LE` (mode, from, to, need-activate) and an `f64 LE`
/// value.
pub fn decode_daytimer_states(buf: &mut impl Buf) -> Result<Vec<DaytimerState>, Error> {
    let mut states = Vec::new();
    while buf.has_remaining() {
        if buf.remaining() < DAYTIMER_RECORD_MIN_LEN {
            return Err(truncated(DAYTIMER_RECORD_MIN_LEN, buf));
        }
        let uuid = Id128::read_le(buf)?;
        let default_value = buf.get_f64_le();
        let count = entry_count(buf, DAYTIMER_ENTRY_LEN)?;
        let entries: Vec<DaytimerEntry> = (0..count)
            .map(|_| DaytimerEntry {
                mode: buf.get_i32_le(),
                from: buf.get_i32_le(),
                to: buf.get_i32_le(),
                need_activate: buf.get_i32_le(),
                value: buf.get_f64_le(),
            })
            .collect();
        tracing::trace!(%uuid, default_value, entries = entries.len(), "daytimer state");
        states.push(DaytimerState {
            uuid,
            default_value,
            entries,
        });
    }
    Ok(states)
}

/// Decode every weather record in `buf`.
///
/// Record layout: uuid, `u32 LE` last-modified, `u32 LE` entry count, then
/// per entry five `i32 LE` (timestamp, type, wind direction, solar
/// radiation, humidity) and six `f64 LE` (temperature, perceived
/// temperature, dew point, precipitation, wind speed, pressure).
pub fn decode_weather_states(buf: &mut impl Buf) -> Result<Vec<WeatherState>, Error> {
    let mut states = Vec::new();
    while buf.has_remaining() {
        if buf.remaining() < WEATHER_RECORD_MIN_LEN {
            return Err(truncated(WEATHER_RECORD_MIN_LEN, buf));
        }
        let uuid = Id128::read_le(buf)?;
        let last_modified = buf.get_u32_le();
        let count = entry_count(buf, WEATHER_ENTRY_LEN)?;
        let entries: Vec<WeatherEntry> = (0..count)
            .map(|_| WeatherEntry {
                timestamp: buf.get_i32_le(),
                weather_type: buf.get_i32_le(),
                wind_direction: buf.get_i32_le(),
                solar_radiation: buf.get_i32_le(),
                relative_humidity: buf.get_i32_le(),
                temperature: buf.get_f64_le(),
                perceived_temperature: buf.get_f64_le(),
                dew_point: buf.get_f64_le(),
                precipitation: buf.get_f64_le(),
                wind_speed: buf.get_f64_le(),
                barometric_pressure: buf.get_f64_le(),
            })
            .collect();
        tracing::trace!(%uuid, last_modified, entries = entries.len(), "weather state");
        states.push(WeatherState {
            uuid,
            last_modified,
            entries,
        });
    }
    Ok(states)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bytes::BufMut;
    use pretty_assertions::assert_eq;

    fn id(n: u128) -> Id128 {
        Id128::from_u128(n)
    }

    #[test]
    fn decodes_value_table() {
        let mut payload = Vec::new();
        id(1).write_le(&mut payload);
        payload.put_f64_le(21.5);
        id(2).write_le(&mut payload);
        payload.put_f64_le(-1.0);

        let states = decode_value_states(&mut &payload[..]).unwrap();
        assert_eq!(
            states,
            vec![
                ValueState {
                    uuid: id(1),
                    value: 21.5
                },
                ValueState {
                    uuid: id(2),
                    value: -1.0
                },
            ]
        );
    }

    #[test]
    fn partial_value_record_is_truncated() {
        let mut payload = Vec::new();
        id(1).write_le(&mut payload);
        payload.put_u32_le(0);
        let err = decode_value_states(&mut &payload[..]).unwrap_err();
        assert!(err.is_incomplete());
    }

    #[test]
    fn decodes_padded_text_records() {
        let mut payload = Vec::new();
        id(7).write_le(&mut payload);
        id(8).write_le(&mut payload);
        payload.put_u32_le(5);
        payload.put_slice(b"Hello\0\0\0");
        id(9).write_le(&mut payload);
        id(8).write_le(&mut payload);
        payload.put_u32_le(4);
        payload.put_slice("Tür".as_bytes());

        let states = decode_text_states(&mut &payload[..]).unwrap();
        assert_eq!(states.len(), 2);
        assert_eq!(states[0].text, "Hello");
        assert_eq!(states[0].icon, id(8));
        assert_eq!(states[1].uuid, id(9));
        assert_eq!(states[1].text, "Tür");
    }

    #[test]
    fn text_length_past_end_is_truncated() {
        let mut payload = Vec::new();
        id(7).write_le(&mut payload);
        id(8).write_le(&mut payload);
        payload.put_u32_le(100);
        payload.put_slice(b"short");
        let err = decode_text_states(&mut &payload[..]).unwrap_err();
        assert!(matches!(err, Error::Truncated { needed: 100, available: 5 }));
    }

    #[test]
    fn empty_tables() {
        assert!(decode_value_states(&mut &b""[..]).unwrap().is_empty());
        assert!(decode_text_states(&mut &b""[..]).unwrap().is_empty());
        assert!(decode_daytimer_states(&mut &b""[..]).unwrap().is_empty());
        assert!(decode_weather_states(&mut &b""[..]).unwrap().is_empty());
    }

    fn daytimer_entry(out: &mut Vec<u8>, mode: i32, from: i32, to: i32, value: f64) {
        out.put_i32_le(mode);
        out.put_i32_le(from);
        out.put_i32_le(to);
        out.put_i32_le(0);
        out.put_f64_le(value);
    }

    #[test]
    fn decodes_daytimer_table() {
        let mut payload = Vec::new();
        id(4).write_le(&mut payload);
        payload.put_f64_le(18.0);
        payload.put_u32_le(2);
        daytimer_entry(&mut payload, 0, 360, 480, 21.0);
        daytimer_entry(&mut payload, 1, 1020, MINUTES_PER_DAY, 20.5);
        id(5).write_le(&mut payload);
        payload.put_f64_le(0.0);
        payload.put_u32_le(0);

        let states = decode_daytimer_states(&mut &payload[..]).unwrap();
        assert_eq!(states.len(), 2);
        assert_eq!(states[0].uuid, id(4));
        assert_eq!(states[0].default_value, 18.0);
        assert_eq!(
            states[0].entries[1],
            DaytimerEntry {
                mode: 1,
                from: 1020,
                to: MINUTES_PER_DAY,
                need_activate: 0,
                value: 20.5
            }
        );
        assert!(states[1].entries.is_empty());
    }

    #[test]
    fn daytimer_count_past_end_is_truncated() {
        let mut payload = Vec::new();
        id(4).write_le(&mut payload);
        payload.put_f64_le(18.0);
        payload.put_u32_le(3);
        daytimer_entry(&mut payload, 0, 0, 60, 1.0);
        let err = decode_daytimer_states(&mut &payload[..]).unwrap_err();
        assert!(matches!(err, Error::Truncated { needed: 72, available: 24 }));
    }

    #[test]
    fn decodes_weather_table() {
        let mut payload = Vec::new();
        id(6).write_le(&mut payload);
        payload.put_u32_le(500_000_000);
        payload.put_u32_le(1);
        for v in [500_003_600, 3, 270, 120, 65] {
            payload.put_i32_le(v);
        }
        for v in [12.5, 10.0, 6.2, 0.4, 3.1, 1013.0] {
            payload.put_f64_le(v);
        }

        let states = decode_weather_states(&mut &payload[..]).unwrap();
        assert_eq!(states.len(), 1);
        let state = &states[0];
        assert_eq!(state.uuid, id(6));
        assert_eq!(state.last_modified, 500_000_000);
        let entry = state.entries[0];
        assert_eq!(entry.timestamp, 500_003_600);
        assert_eq!(entry.relative_humidity, 65);
        assert_eq!(entry.temperature, 12.5);
        assert_eq!(entry.barometric_pressure, 1013.0);
    }

    #[test]
    fn partial_weather_record_is_truncated() {
        let mut payload = Vec::new();
        id(6).write_le(&mut payload);
        payload.put_u32_le(0);
        let err = decode_weather_states(&mut &payload[..]).unwrap_err();
        assert!(err.is_incomplete());
    }
}
