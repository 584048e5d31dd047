//! Decoding of captured frame streams.

use serde::Serialize;
use tabled::Tabled;

use loxly_api::ConfigId;
use loxly_config::Config;
use loxly_core::{
    DaytimerEvent, Dispatched, FrameDispatcher, MemoryStore, TextEvent, ValueEvent, WeatherEvent,
};

use crate::cli::{FramesArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct FrameView {
    index: usize,
    kind: &'static str,
    summary: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    values: Vec<ValueEvent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    texts: Vec<TextEvent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    daytimers: Vec<DaytimerEvent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    weather: Vec<WeatherEvent>,
}

impl FrameView {
    fn new(kind: &'static str, summary: String) -> Self {
        Self {
            index: 0,
            kind,
            summary,
            values: Vec::new(),
            texts: Vec::new(),
            daytimers: Vec::new(),
            weather: Vec::new(),
        }
    }
}

impl From<Dispatched> for FrameView {
    fn from(d: Dispatched) -> Self {
        match d {
            Dispatched::Response(r) => {
                let kind = r.kind.map_or("unknown", Into::into);
                Self::new(
                    "response",
                    format!("{kind} code={} value={}", r.code, r.value),
                )
            }
            Dispatched::StructureModified {
                last_modified,
                outdated,
            } => Self::new(
                "structure-modified",
                format!(
                    "{} outdated={outdated}",
                    last_modified.format(loxly_core::model::LAST_MODIFIED_FORMAT)
                ),
            ),
            Dispatched::StructureFile(file) => Self::new(
                "structure-file",
                format!(
                    "{} rooms, {} categories, {} controls",
                    file.rooms.len(),
                    file.categories.len(),
                    file.controls.len()
                ),
            ),
            Dispatched::ValueEvents(values) => Self {
                values,
                ..Self::new("values", String::new())
            }
            .summarized(),
            Dispatched::TextEvents(texts) => Self {
                texts,
                ..Self::new("texts", String::new())
            }
            .summarized(),
            Dispatched::DaytimerEvents(daytimers) => Self {
                daytimers,
                ..Self::new("daytimers", String::new())
            }
            .summarized(),
            Dispatched::WeatherEvents(weather) => Self {
                weather,
                ..Self::new("weather", String::new())
            }
            .summarized(),
            Dispatched::OutOfService => Self::new("out-of-service", String::new()),
            Dispatched::Keepalive => Self::new("keepalive", String::new()),
            Dispatched::Ignored { kind, length } => {
                Self::new("ignored", format!("{kind} ({length} bytes)"))
            }
            Dispatched::UnknownCommand { control } => Self::new("unknown-command", control),
        }
    }
}

impl FrameView {
    fn summarized(mut self) -> Self {
        let mut parts: Vec<String> = self
            .values
            .iter()
            .map(|v| format!("{}={}", v.uuid, v.value))
            .collect();
        parts.extend(self.texts.iter().map(|t| format!("{}={:?}", t.uuid, t.text)));
        parts.extend(
            self.daytimers
                .iter()
                .map(|d| format!("{} default={} {} periods", d.uuid, d.default_value, d.entries.len())),
        );
        parts.extend(
            self.weather
                .iter()
                .map(|w| format!("{} {} forecasts", w.uuid, w.forecasts.len())),
        );
        self.summary = if parts.is_empty() {
            "no changes".into()
        } else {
            parts.join("\n")
        };
        self
    }
}

#[derive(Tabled)]
struct FrameRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Frame")]
    kind: &'static str,
    #[tabled(rename = "Detail")]
    summary: String,
}

pub fn handle(args: &FramesArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let data = std::fs::read(&args.file)?;
    let profile = config::active_profile(global, cfg)?;
    let config_id = config::config_id(global, cfg)?.unwrap_or_default();
    let ignore_unchanged =
        !args.keep_unchanged && profile.is_none_or(|p| p.ignore_unchanged_values);

    let dispatcher = dispatcher(config_id, ignore_unchanged);
    let mut buf = &data[..];
    let frames: Vec<FrameView> = dispatcher
        .dispatch_stream(&mut buf)?
        .into_iter()
        .enumerate()
        .map(|(index, d)| FrameView {
            index,
            ..FrameView::from(d)
        })
        .collect();
    if !buf.is_empty() {
        tracing::warn!(trailing = buf.len(), "capture ends inside a frame");
    }

    let out = output::render_list(
        &global.format(),
        &frames,
        |f| FrameRow {
            index: f.index,
            kind: f.kind,
            summary: f.summary.clone(),
        },
        |f| f.kind.to_owned(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn dispatcher(config_id: ConfigId, ignore_unchanged: bool) -> FrameDispatcher<MemoryStore> {
    FrameDispatcher::new(config_id, MemoryStore::new())
        .with_ignore_unchanged_values(ignore_unchanged)
}
