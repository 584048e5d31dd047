// ── Frame dispatch ──
//
// Routes each decoded frame to the decoder for its kind and records the
// results through the store traits. The transport owns the socket and
// hands over `(header, payload)` pairs; `dispatch_stream` covers captures
// where headers and payloads sit back to back in one buffer.

use bytes::Buf;
use chrono::{DateTime, Utc};

use loxly_api::event::{
    decode_daytimer_states, decode_text_states, decode_value_states, decode_weather_states,
};
use loxly_api::{CommandKind, CommandResponse, ConfigId, HEADER_LEN, MessageHeader, MessageKind};

use crate::error::CoreError;
use crate::model::{
    DaytimerEvent, StructureFile, TextEvent, ValueEvent, WeatherEvent, parse_last_modified,
};
use crate::store::{ConfigStore, EventStore};

/// What a frame turned out to carry.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    /// A command reply with no further handling here.
    Response(CommandResponse),
    /// The Miniserver's structure file modification date, and whether the
    /// stored config predates it.
    StructureModified {
        last_modified: DateTime<Utc>,
        outdated: bool,
    },
    /// A full structure file; its config has been stored.
    StructureFile(Box<StructureFile>),
    /// Value events that changed and were stored.
    ValueEvents(Vec<ValueEvent>),
    TextEvents(Vec<TextEvent>),
    /// Daytimer schedules; handed on, not stored.
    DaytimerEvents(Vec<DaytimerEvent>),
    /// Weather forecasts that carry at least one slot; handed on, not stored.
    WeatherEvents(Vec<WeatherEvent>),
    /// The Miniserver is about to go offline.
    OutOfService,
    Keepalive,
    /// A frame this workspace does not act on.
    Ignored { kind: MessageKind, length: u32 },
    /// A reply to a command this client does not know.
    UnknownCommand { control: String },
}

/// Decodes frames for one Miniserver configuration.
#[derive(Debug, Clone)]
pub struct FrameDispatcher<S> {
    config_id: ConfigId,
    store: S,
    ignore_unchanged_values: bool,
}

impl<S> FrameDispatcher<S>
where
    S: ConfigStore + EventStore<ValueEvent> + EventStore<TextEvent>,
{
    pub fn new(config_id: ConfigId, store: S) -> Self {
        Self {
            config_id,
            store,
            ignore_unchanged_values: true,
        }
    }

    /// Store value events even when the value did not change.
    pub fn with_ignore_unchanged_values(mut self, ignore: bool) -> Self {
        self.ignore_unchanged_values = ignore;
        self
    }

    pub fn config_id(&self) -> ConfigId {
        self.config_id
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Handle one frame's payload.
    pub fn dispatch(&self, header: MessageHeader, payload: &[u8]) -> Result<Dispatched, CoreError> {
        tracing::trace!(%header, "dispatching frame");
        match header.kind {
            MessageKind::TextMessage => self.on_text(payload),
            MessageKind::EventTableValueStates => self.on_value_states(payload),
            MessageKind::EventTableTextStates => self.on_text_states(payload),
            MessageKind::EventTableDaytimerStates => self.on_daytimer_states(payload),
            MessageKind::EventTableWeatherStates => self.on_weather_states(payload),
            MessageKind::OutOfServiceIndicator => {
                tracing::warn!(config_id = %self.config_id, "Miniserver going out of service");
                Ok(Dispatched::OutOfService)
            }
            MessageKind::Keepalive => {
                tracing::debug!(config_id = %self.config_id, "keepalive");
                Ok(Dispatched::Keepalive)
            }
            kind @ MessageKind::BinaryFile => {
                tracing::debug!(%kind, length = header.length, "ignoring frame");
                Ok(Dispatched::Ignored {
                    kind,
                    length: header.length,
                })
            }
        }
    }

    /// Decode and dispatch every complete frame in `buf`.
    ///
    /// Headers with an estimated length are skipped; the exact header
    /// follows them. Frames of unknown kind are skipped by their length.
    /// Only whole frames are consumed: on return `buf` sits at a frame
    /// boundary, so the caller can append the rest of a partial frame and
    /// call again.
    pub fn dispatch_stream<B>(&self, buf: &mut B) -> Result<Vec<Dispatched>, CoreError>
    where
        B: Buf + Clone,
    {
        let mut out = Vec::new();
        while buf.remaining() >= HEADER_LEN {
            let mut peek = buf.clone();
            let header = match MessageHeader::decode(&mut peek) {
                Ok(header) => header,
                Err(loxly_api::Error::UnknownMessageKind { raw, length }) => {
                    let Some(len) = complete_payload(&peek, length) else {
                        break;
                    };
                    tracing::warn!(raw, length, "skipping frame of unknown kind");
                    buf.advance(HEADER_LEN + len);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if header.is_estimated() {
                tracing::trace!(%header, "estimated header, waiting for exact one");
                buf.advance(HEADER_LEN);
                continue;
            }
            if header.kind.is_header_only() {
                buf.advance(HEADER_LEN);
                out.push(self.dispatch(header, &[])?);
                continue;
            }

            let Some(len) = complete_payload(&peek, header.length) else {
                tracing::debug!(%header, available = peek.remaining(), "incomplete payload");
                break;
            };
            buf.advance(HEADER_LEN);
            let payload = buf.copy_to_bytes(len);
            out.push(self.dispatch(header, &payload)?);
        }
        Ok(out)
    }

    // ── Handlers ─────────────────────────────────────────────────────

    fn on_text(&self, payload: &[u8]) -> Result<Dispatched, CoreError> {
        let text = String::from_utf8_lossy(payload);
        match CommandResponse::parse(&text) {
            Ok(response) => self.on_response(response),
            Err(_) if text.contains("\"lastModified\"") => self.on_structure_file(&text),
            Err(e) => Err(e.into()),
        }
    }

    fn on_response(&self, response: CommandResponse) -> Result<Dispatched, CoreError> {
        let Some(kind) = response.kind else {
            return Ok(Dispatched::UnknownCommand {
                control: response.control,
            });
        };
        if !response.is_success() {
            tracing::warn!(%kind, code = response.code, "command returned error status");
            return Ok(Dispatched::Response(response));
        }

        match (kind, response.value_str()) {
            (CommandKind::StructureFileLastModifiedDate, Some(value)) => {
                let last_modified = parse_last_modified(value)?;
                let outdated = self
                    .store
                    .load_config(self.config_id)?
                    .is_none_or(|config| config.is_outdated_by(last_modified));
                tracing::debug!(%last_modified, outdated, "structure file modification date");
                Ok(Dispatched::StructureModified {
                    last_modified,
                    outdated,
                })
            }
            _ => Ok(Dispatched::Response(response)),
        }
    }

    fn on_structure_file(&self, text: &str) -> Result<Dispatched, CoreError> {
        let file = StructureFile::parse(self.config_id, text)?;
        self.store.store_config(file.config.clone())?;
        Ok(Dispatched::StructureFile(Box::new(file)))
    }

    fn on_value_states(&self, mut payload: &[u8]) -> Result<Dispatched, CoreError> {
        let now = Utc::now();
        let mut updated = Vec::new();
        for state in decode_value_states(&mut payload)? {
            if self.ignore_unchanged_values {
                let existing =
                    EventStore::<ValueEvent>::load_event(&self.store, self.config_id, state.uuid)?;
                if existing.is_some_and(|e| e.same_value(state.value)) {
                    tracing::trace!(uuid = %state.uuid, value = state.value, "value unchanged");
                    continue;
                }
            }
            let event = ValueEvent::from_state(self.config_id, now, state);
            EventStore::<ValueEvent>::store_event(&self.store, event.clone())?;
            updated.push(event);
        }
        tracing::debug!(updated = updated.len(), "value events");
        Ok(Dispatched::ValueEvents(updated))
    }

    fn on_text_states(&self, mut payload: &[u8]) -> Result<Dispatched, CoreError> {
        let now = Utc::now();
        let mut events = Vec::new();
        for state in decode_text_states(&mut payload)? {
            let event = TextEvent::from_state(self.config_id, now, state);
            EventStore::<TextEvent>::store_event(&self.store, event.clone())?;
            events.push(event);
        }
        tracing::debug!(events = events.len(), "text events");
        Ok(Dispatched::TextEvents(events))
    }

    fn on_daytimer_states(&self, mut payload: &[u8]) -> Result<Dispatched, CoreError> {
        let now = Utc::now();
        let events: Vec<DaytimerEvent> = decode_daytimer_states(&mut payload)?
            .into_iter()
            .map(|state| DaytimerEvent::from_state(self.config_id, now, state))
            .collect();
        tracing::debug!(events = events.len(), "daytimer events");
        Ok(Dispatched::DaytimerEvents(events))
    }

    fn on_weather_states(&self, mut payload: &[u8]) -> Result<Dispatched, CoreError> {
        let now = Utc::now();
        let mut events = Vec::new();
        for state in decode_weather_states(&mut payload)? {
            if state.entries.is_empty() {
                tracing::trace!(uuid = %state.uuid, "weather state without forecasts");
                continue;
            }
            events.push(WeatherEvent::from_state(self.config_id, now, state));
        }
        tracing::debug!(events = events.len(), "weather events");
        Ok(Dispatched::WeatherEvents(events))
    }
}

/// Payload length when all `length` bytes are buffered after the header.
fn complete_payload(after_header: &impl Buf, length: u32) -> Option<usize> {
    usize::try_from(length)
        .ok()
        .filter(|len| after_header.remaining() >= *len)
}
