//! Command text resolution.

use serde::Serialize;
use strum::IntoEnumIterator;
use tabled::Tabled;

use loxly_api::CommandKind;

use crate::cli::{CommandArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct CommandView {
    kind: &'static str,
    canonical: &'static str,
    internal: bool,
    takes_args: bool,
    args: Vec<String>,
}

#[derive(Debug, Serialize)]
struct KindEntry {
    kind: &'static str,
    spellings: &'static [&'static str],
    takes_args: bool,
    internal: bool,
}

#[derive(Tabled)]
struct KindRow {
    #[tabled(rename = "Command")]
    kind: &'static str,
    #[tabled(rename = "Spellings")]
    spellings: String,
    #[tabled(rename = "Args")]
    takes_args: &'static str,
    #[tabled(rename = "Internal")]
    internal: &'static str,
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

impl From<&KindEntry> for KindRow {
    fn from(e: &KindEntry) -> Self {
        Self {
            kind: e.kind,
            spellings: e.spellings.join("\n"),
            takes_args: yes_no(e.takes_args),
            internal: yes_no(e.internal),
        }
    }
}

pub fn handle(args: &CommandArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let format = global.format();

    let Some(text) = args.text.as_deref().filter(|_| !args.list) else {
        let entries: Vec<KindEntry> = CommandKind::iter()
            .map(|kind| KindEntry {
                kind: kind.into(),
                spellings: kind.spellings(),
                takes_args: kind.takes_args(),
                internal: kind.is_internal(),
            })
            .collect();
        let out = output::render_list(&format, &entries, |e| KindRow::from(e), |e| {
            e.spellings.first().copied().unwrap_or(e.kind).to_owned()
        })?;
        output::print_output(&out, global.quiet);
        return Ok(());
    };

    let (kind, args) = CommandKind::resolve_with_args(text)?;
    let view = CommandView {
        kind: kind.into(),
        canonical: kind.canonical(),
        internal: kind.is_internal(),
        takes_args: kind.takes_args(),
        args: args.into_iter().map(str::to_owned).collect(),
    };
    let out = output::render_single(
        &format,
        &view,
        |v| {
            output::detail_lines(&[
                ("Command", v.kind.to_owned()),
                ("Canonical", v.canonical.to_owned()),
                ("Internal", yes_no(v.internal).to_owned()),
                (
                    "Args",
                    if v.args.is_empty() {
                        "-".into()
                    } else {
                        v.args.join(" ")
                    },
                ),
            ])
        },
        |v| v.kind.to_owned(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
