// ── State events ──
//
// Decoded event-table records, stamped with their config and arrival time.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use loxly_api::{
    ConfigId, DaytimerEntry, DaytimerState, Id128, MINUTES_PER_DAY, TextState, ValueState,
    WeatherEntry, WeatherState,
};

/// Unix seconds of the weather epoch, 2009-01-01T00:00:00Z.
pub const WEATHER_EPOCH_SECS: i64 = 1_230_768_000;

/// Anything stored per `(config, uuid)` in an event store.
pub trait EventEntity: Clone + Send + Sync + 'static {
    fn config_id(&self) -> ConfigId;
    fn uuid(&self) -> Id128;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueEvent {
    pub config_id: ConfigId,
    pub uuid: Id128,
    pub created: DateTime<Utc>,
    pub value: f64,
}

impl ValueEvent {
    pub fn from_state(config_id: ConfigId, created: DateTime<Utc>, state: ValueState) -> Self {
        Self {
            config_id,
            uuid: state.uuid,
            created,
            value: state.value,
        }
    }

    /// Same value bit for bit, so `NaN` equals `NaN` and `0.0` differs
    /// from `-0.0`.
    pub fn same_value(&self, value: f64) -> bool {
        self.value.to_bits() == value.to_bits()
    }
}

impl EventEntity for ValueEvent {
    fn config_id(&self) -> ConfigId {
        self.config_id
    }

    fn uuid(&self) -> Id128 {
        self.uuid
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEvent {
    pub config_id: ConfigId,
    pub uuid: Id128,
    pub created: DateTime<Utc>,
    pub icon: Id128,
    pub text: String,
}

impl TextEvent {
    pub fn from_state(config_id: ConfigId, created: DateTime<Utc>, state: TextState) -> Self {
        Self {
            config_id,
            uuid: state.uuid,
            created,
            icon: state.icon,
            text: state.text,
        }
    }
}

impl EventEntity for TextEvent {
    fn config_id(&self) -> ConfigId {
        self.config_id
    }

    fn uuid(&self) -> Id128 {
        self.uuid
    }
}

/// One daytimer period with its bounds resolved to wall-clock times.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DaytimerSpan {
    pub mode: i32,
    pub from: NaiveTime,
    pub to: NaiveTime,
    pub need_activate: i32,
    pub value: f64,
}

impl From<DaytimerEntry> for DaytimerSpan {
    fn from(entry: DaytimerEntry) -> Self {
        Self {
            mode: entry.mode,
            from: minute_of_day(entry.from),
            to: minute_of_day(entry.to),
            need_activate: entry.need_activate,
            value: entry.value,
        }
    }
}

/// Minutes since midnight as a time; a full day or more is the last
/// instant of the day, negatives are midnight.
fn minute_of_day(minutes: i32) -> NaiveTime {
    if minutes >= MINUTES_PER_DAY {
        return NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN);
    }
    u32::try_from(minutes)
        .ok()
        .and_then(|m| NaiveTime::from_num_seconds_from_midnight_opt(m * 60, 0))
        .unwrap_or(NaiveTime::MIN)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaytimerEvent {
    pub config_id: ConfigId,
    pub uuid: Id128,
    pub created: DateTime<Utc>,
    pub default_value: f64,
    pub entries: Vec<DaytimerSpan>,
}

impl DaytimerEvent {
    pub fn from_state(config_id: ConfigId, created: DateTime<Utc>, state: DaytimerState) -> Self {
        Self {
            config_id,
            uuid: state.uuid,
            created,
            default_value: state.default_value,
            entries: state.entries.into_iter().map(DaytimerSpan::from).collect(),
        }
    }
}

impl EventEntity for DaytimerEvent {
    fn config_id(&self) -> ConfigId {
        self.config_id
    }

    fn uuid(&self) -> Id128 {
        self.uuid
    }
}

/// Seconds since the weather epoch as a UTC instant.
pub fn weather_time(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(WEATHER_EPOCH_SECS.saturating_add(secs), 0)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// One forecast slot of a weather event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub time: DateTime<Utc>,
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

impl From<WeatherEntry> for Forecast {
    fn from(entry: WeatherEntry) -> Self {
        Self {
            time: weather_time(i64::from(entry.timestamp)),
            weather_type: entry.weather_type,
            wind_direction: entry.wind_direction,
            solar_radiation: entry.solar_radiation,
            relative_humidity: entry.relative_humidity,
            temperature: entry.temperature,
            perceived_temperature: entry.perceived_temperature,
            dew_point: entry.dew_point,
            precipitation: entry.precipitation,
            wind_speed: entry.wind_speed,
            barometric_pressure: entry.barometric_pressure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherEvent {
    pub config_id: ConfigId,
    pub uuid: Id128,
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub forecasts: Vec<Forecast>,
}

impl WeatherEvent {
    pub fn from_state(config_id: ConfigId, created: DateTime<Utc>, state: WeatherState) -> Self {
        Self {
            config_id,
            uuid: state.uuid,
            created,
            last_modified: weather_time(i64::from(state.last_modified)),
            forecasts: state.entries.into_iter().map(Forecast::from).collect(),
        }
    }
}

impl EventEntity for WeatherEvent {
    fn config_id(&self) -> ConfigId {
        self.config_id
    }

    fn uuid(&self) -> Id128 {
        self.uuid
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn value_comparison_is_exact() {
        let event = ValueEvent {
            config_id: ConfigId::new(1),
            uuid: Id128::NIL,
            created: Utc::now(),
            value: f64::NAN,
        };
        assert!(event.same_value(f64::NAN));
        assert!(!event.same_value(0.0));

        let zero = ValueEvent { value: 0.0, ..event };
        assert!(zero.same_value(0.0));
        assert!(!zero.same_value(-0.0));
    }

    #[test]
    fn daytimer_minutes_become_times() {
        let state = DaytimerState {
            uuid: Id128::NIL,
            default_value: 0.0,
            entries: vec![DaytimerEntry {
                mode: 2,
                from: 390,
                to: MINUTES_PER_DAY,
                need_activate: 0,
                value: 1.0,
            }],
        };
        let event = DaytimerEvent::from_state(ConfigId::new(1), Utc::now(), state);
        let span = event.entries[0];
        assert_eq!(span.from, NaiveTime::from_hms_opt(6, 30, 0).unwrap());
        assert_eq!(span.to.format("%H:%M:%S").to_string(), "23:59:59");
        assert!(span.to > NaiveTime::from_hms_opt(23, 59, 59).unwrap());
        assert_eq!(minute_of_day(-5), NaiveTime::MIN);
    }

    #[test]
    fn weather_times_count_from_2009() {
        assert_eq!(weather_time(0).to_rfc3339(), "2009-01-01T00:00:00+00:00");
        assert_eq!(weather_time(86_400).to_rfc3339(), "2009-01-02T00:00:00+00:00");
    }
}
