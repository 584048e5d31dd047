// ── Structure mapping scanner ──
//
// The Miniserver's XML project file can hold tens of thousands of
// elements. Only `<C>` elements nested inside program containers name
// controls, so a single forward pull over the document extracts their
// `U` (identifier) and `Title` attributes without building a tree.
//
// quick-xml performs no DTD processing: `<!DOCTYPE>` is skipped and
// entities are never resolved from outside the document.

use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::errors::IllFormedError;
use quick_xml::events::{BytesStart, Event};

use loxly_api::Id128;

use crate::error::CoreError;
use crate::model::SourceMapping;

const CONTROL_ELEMENT: &[u8] = b"C";
const DEFAULT_CONTAINER_TYPES: [&str; 2] = ["LoxLIVE", "Program"];

/// Extracts source mappings from a structure document.
pub trait SourceMappingParser {
    /// Parse `input`, calling `callback` once per mapping in document order.
    /// Returns the number of mappings emitted.
    ///
    /// On error, mappings already passed to `callback` stand.
    fn parse<R: BufRead>(
        &self,
        input: R,
        callback: &mut dyn FnMut(SourceMapping),
    ) -> Result<usize, CoreError>;
}

/// Where the scan is relative to a tracked container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Outside,
    /// `depth` counts open elements, the container itself included.
    Inside { depth: usize },
}

/// Pull-parser implementation of [`SourceMappingParser`] for the XML
/// project file.
#[derive(Debug, Clone)]
pub struct StructureScanner {
    container_types: Vec<String>,
}

impl Default for StructureScanner {
    fn default() -> Self {
        Self {
            container_types: DEFAULT_CONTAINER_TYPES.map(String::from).to_vec(),
        }
    }
}

impl StructureScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track containers whose `Type` is one of `types` instead of the
    /// defaults.
    pub fn with_container_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            container_types: types.into_iter().map(Into::into).collect(),
        }
    }

    /// Scan `input`, reporting each mapping to `callback`.
    ///
    /// A document that ends with elements still open is an error, so a
    /// cut-off download never passes for a complete scan.
    pub fn scan<R, F>(&self, input: R, mut callback: F) -> Result<usize, CoreError>
    where
        R: BufRead,
        F: FnMut(SourceMapping),
    {
        let mut reader = Reader::from_reader(input);
        reader.config_mut().trim_text(true);

        let mut state = ScanState::Outside;
        let mut emitted = 0_usize;
        let mut open: Vec<String> = Vec::new();
        let mut buf = Vec::new();

        loop {
            let event = reader.read_event_into(&mut buf).map_err(|source| {
                let err = io_error(&reader, source);
                tracing::error!(error = %err, "structure file parse error");
                err
            });

            match event? {
                Event::Start(ref start) => {
                    open.push(String::from_utf8_lossy(start.name().as_ref()).into_owned());
                    state = self
                        .on_start(state, start, &mut callback, &mut emitted)
                        .map_err(|source| io_error(&reader, source))?;
                }
                Event::Empty(ref start) => {
                    state = self
                        .on_start(state, start, &mut callback, &mut emitted)
                        .map_err(|source| io_error(&reader, source))?;
                    state = on_end(state);
                }
                Event::End(_) => {
                    open.pop();
                    state = on_end(state);
                }
                Event::Eof => {
                    if let Some(name) = open.pop() {
                        let err = io_error(
                            &reader,
                            quick_xml::Error::IllFormed(IllFormedError::MissingEndTag(name)),
                        );
                        tracing::error!(error = %err, "structure file ends inside an element");
                        return Err(err);
                    }
                    break;
                }
                _ => {}
            }
            buf.clear();
        }

        tracing::debug!(emitted, "structure scan complete");
        Ok(emitted)
    }

    fn is_container(&self, start: &BytesStart<'_>) -> Result<bool, quick_xml::Error> {
        if start.local_name().as_ref() != CONTROL_ELEMENT {
            return Ok(false);
        }
        let kind = attribute(start, "Type")?;
        Ok(kind.is_some_and(|k| self.container_types.iter().any(|t| *t == k)))
    }

    fn on_start(
        &self,
        state: ScanState,
        start: &BytesStart<'_>,
        callback: &mut dyn FnMut(SourceMapping),
        emitted: &mut usize,
    ) -> Result<ScanState, quick_xml::Error> {
        let depth = match state {
            ScanState::Outside => {
                return Ok(if self.is_container(start)? {
                    ScanState::Inside { depth: 1 }
                } else {
                    ScanState::Outside
                });
            }
            ScanState::Inside { depth } => depth + 1,
        };

        if start.local_name().as_ref() == CONTROL_ELEMENT {
            if let Some(mapping) = mapping_for(start)? {
                tracing::trace!(uuid = %mapping.uuid, title = %mapping.source_id, "source mapping");
                callback(mapping);
                *emitted += 1;
            }
        }
        Ok(ScanState::Inside { depth })
    }
}

impl SourceMappingParser for StructureScanner {
    fn parse<R: BufRead>(
        &self,
        input: R,
        callback: &mut dyn FnMut(SourceMapping),
    ) -> Result<usize, CoreError> {
        self.scan(input, callback)
    }
}

fn on_end(state: ScanState) -> ScanState {
    match state {
        ScanState::Inside { depth } if depth > 1 => ScanState::Inside { depth: depth - 1 },
        _ => ScanState::Outside,
    }
}

/// A mapping when the element has both `Title` and a valid `U`.
fn mapping_for(start: &BytesStart<'_>) -> Result<Option<SourceMapping>, quick_xml::Error> {
    let Some(title) = attribute(start, "Title")? else {
        return Ok(None);
    };
    let Some(raw_uuid) = attribute(start, "U")? else {
        return Ok(None);
    };
    match Id128::decode(&raw_uuid) {
        Ok(uuid) => Ok(Some(SourceMapping::new(uuid, title))),
        Err(e) => {
            tracing::debug!(uuid = %raw_uuid, %title, error = %e, "ignoring malformed identifier");
            Ok(None)
        }
    }
}

/// Unescaped attribute value.
///
/// Malformed attribute syntax is an error; a value that cannot be
/// unescaped (e.g. it references an undeclared entity) reads as absent.
fn attribute(start: &BytesStart<'_>, name: &str) -> Result<Option<String>, quick_xml::Error> {
    let Some(attr) = start.try_get_attribute(name)? else {
        return Ok(None);
    };
    match attr.unescape_value() {
        Ok(value) => Ok(Some(value.into_owned())),
        Err(e) => {
            tracing::debug!(attribute = name, error = %e, "ignoring undecodable attribute");
            Ok(None)
        }
    }
}

fn io_error<R>(reader: &Reader<R>, source: quick_xml::Error) -> CoreError {
    CoreError::Io {
        position: u64::try_from(reader.buffer_position()).unwrap_or(u64::MAX),
        source,
    }
}
