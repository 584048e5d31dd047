//! Frame header decoding.

use serde::Serialize;

use loxly_api::{HEADER_LEN, MessageHeader};

use crate::cli::{GlobalOpts, HeaderArgs};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct HeaderView {
    kind: &'static str,
    raw_kind: u8,
    estimated: bool,
    length: u32,
    header_only: bool,
}

impl From<MessageHeader> for HeaderView {
    fn from(h: MessageHeader) -> Self {
        Self {
            kind: h.kind.into(),
            raw_kind: h.kind.raw(),
            estimated: h.is_estimated(),
            length: h.length,
            header_only: h.kind.is_header_only(),
        }
    }
}

fn detail(h: &HeaderView) -> String {
    output::detail_lines(&[
        ("Kind", format!("{} (0x{:02x})", h.kind, h.raw_kind)),
        ("Length", h.length.to_string()),
        ("Estimated", h.estimated.to_string()),
        ("Header only", h.header_only.to_string()),
    ])
}

pub fn handle(args: &HeaderArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let bytes = util::parse_hex_bytes(&args.hex)?;
    if bytes.len() != HEADER_LEN {
        return Err(CliError::Validation {
            field: "header".into(),
            reason: format!("expected {HEADER_LEN} bytes, got {}", bytes.len()),
        });
    }

    let header = MessageHeader::decode_slice(&bytes)?;
    tracing::debug!(%header, "decoded header");

    let view = HeaderView::from(header);
    let out = output::render_single(&global.format(), &view, detail, |h| h.kind.to_owned())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
