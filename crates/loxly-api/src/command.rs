// ── Command resolution ──
//
// Commands travel as slash-separated text paths. The Miniserver echoes some
// requests under a different spelling than the one sent (`jdev/sps/...` is
// answered on `dev/sps/...`), and parameterised commands come back with
// their arguments appended. Resolution maps any of those spellings to one
// closed `CommandKind`.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use strum::{Display, EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::error::Error;
use crate::id::Id128;

// ── CommandKind ─────────────────────────────────────────────────────

/// Every command this client sends or understands in a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
pub enum CommandKind {
    /// Key for hashing credentials.
    GetAuthenticationKey,
    Authenticate,
    /// Response to `authenticate`.
    Auth,
    /// X.509 public key of the Miniserver.
    GetPublicKey,
    /// Session key exchange.
    KeyExchange,
    /// Key for authenticating with a token.
    GetTokenKey,
    GetToken,
    AuthenticateWithToken,
    RefreshToken,
    DeleteToken,
    /// Last modification date of the structure file.
    StructureFileLastModifiedDate,
    GetStructureFile,
    /// Start streaming binary event tables.
    EnableInputStatusUpdate,
    /// Icons are requested by sending the icon identifier itself.
    GetIcon,
    /// Read or update a control value: `jdev/sps/io/<uuid>/<value>`.
    IoControl,
    /// Prevents the Miniserver from dropping an idle connection.
    KeepAlive,
}

/// Accepted spellings and argument support for one command.
struct CommandSpec {
    /// The first spelling is the one sent; the rest are response forms.
    spellings: &'static [&'static str],
    takes_args: bool,
}

const fn spec(spellings: &'static [&'static str], takes_args: bool) -> CommandSpec {
    CommandSpec {
        spellings,
        takes_args,
    }
}

/// Canonical name of the default icon.
const DEFAULT_ICON: &str = "00000000-0000-0020-2000000000000000";

/// Spelling → kind, built once from every variant's spellings.
static SPELLINGS: LazyLock<HashMap<&'static str, CommandKind>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    for kind in CommandKind::iter() {
        for spelling in kind.spec().spellings {
            map.insert(*spelling, kind);
        }
    }
    map
});

impl CommandKind {
    fn spec(self) -> CommandSpec {
        match self {
            Self::GetAuthenticationKey => spec(&["jdev/sys/getkey", "dev/sys/getkey"], false),
            Self::Authenticate => spec(&["authenticate"], true),
            Self::Auth => spec(&["Auth"], false),
            Self::GetPublicKey => spec(&["jdev/sys/getPublicKey", "dev/sys/getPublicKey"], false),
            Self::KeyExchange => spec(&["jdev/sys/keyexchange", "dev/sys/keyexchange"], true),
            Self::GetTokenKey => spec(&["jdev/sys/getkey2", "dev/sys/getkey2"], true),
            Self::GetToken => spec(&["jdev/sys/gettoken", "dev/sys/gettoken"], true),
            Self::AuthenticateWithToken => spec(&["authwithtoken"], true),
            Self::RefreshToken => spec(&["jdev/sys/refreshtoken", "dev/sys/refreshtoken"], true),
            Self::DeleteToken => spec(&["jdev/sys/killtoken", "dev/sys/killtoken"], true),
            Self::StructureFileLastModifiedDate => {
                spec(&["jdev/sps/LoxAPPversion3", "dev/sps/LoxAPPversion3"], false)
            }
            Self::GetStructureFile => spec(&["data/LoxAPP3.json"], false),
            Self::EnableInputStatusUpdate => spec(
                &["jdev/sps/enablebinstatusupdate", "dev/sps/enablebinstatusupdate"],
                false,
            ),
            Self::GetIcon => spec(&[DEFAULT_ICON], false),
            Self::IoControl => spec(&["jdev/sps/io", "dev/sps/io"], true),
            Self::KeepAlive => spec(&["keepalive"], false),
        }
    }

    /// The path used when sending this command.
    pub fn canonical(self) -> &'static str {
        self.spec().spellings[0]
    }

    /// Every spelling this command is recognised by.
    pub fn spellings(self) -> &'static [&'static str] {
        self.spec().spellings
    }

    /// Whether `/`-separated arguments may follow the command path.
    pub fn takes_args(self) -> bool {
        self.spec().takes_args
    }

    /// Protocol housekeeping that is handled by the connection itself and
    /// never surfaced to consumers.
    pub fn is_internal(self) -> bool {
        matches!(
            self,
            Self::GetAuthenticationKey
                | Self::Authenticate
                | Self::Auth
                | Self::GetPublicKey
                | Self::KeyExchange
                | Self::GetTokenKey
                | Self::GetToken
                | Self::AuthenticateWithToken
                | Self::RefreshToken
                | Self::DeleteToken
                | Self::EnableInputStatusUpdate
                | Self::KeepAlive
        )
    }

    /// Resolve command text to its kind.
    pub fn resolve(text: &str) -> Result<Self, Error> {
        Self::resolve_with_args(text).map(|(kind, _)| kind)
    }

    /// Resolve command text, also returning any trailing arguments.
    ///
    /// An exact spelling wins. Otherwise the longest spelling that ends on
    /// a `/` boundary and whose command takes arguments is used, and the
    /// remainder is split on `/`. Icon requests are recognised by the text
    /// being an identifier in wire form.
    pub fn resolve_with_args(text: &str) -> Result<(Self, Vec<&str>), Error> {
        if let Some(kind) = SPELLINGS.get(text) {
            return Ok((*kind, Vec::new()));
        }

        for (idx, _) in text.rmatch_indices('/') {
            let Some(kind) = SPELLINGS.get(&text[..idx]) else {
                continue;
            };
            // the first argument must not be empty
            let rest = &text[idx + 1..];
            if kind.takes_args() && !rest.is_empty() && !rest.starts_with('/') {
                return Ok((*kind, rest.split('/').collect()));
            }
        }

        if is_icon_name(text) {
            return Ok((Self::GetIcon, Vec::new()));
        }

        Err(Error::UnknownCommand(text.to_owned()))
    }

    /// Command text to send: the canonical path with `args` appended.
    pub fn command_text(self, args: &[&str]) -> String {
        let mut text = self.canonical().to_owned();
        for arg in args {
            text.push('/');
            text.push_str(arg);
        }
        text
    }
}

fn is_icon_name(text: &str) -> bool {
    Id128::decode(text).is_ok_and(|id| id.encode().eq_ignore_ascii_case(text))
}

// ── Response envelope ───────────────────────────────────────────────

/// Text reply to a command: `{"LL": {"control": …, "value": …, "Code": …}}`.
///
/// `kind` is `None` when `control` matches no known command; newer
/// firmware answers commands this client does not know about.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResponse {
    pub control: String,
    pub kind: Option<CommandKind>,
    pub value: Value,
    pub code: u16,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "LL")]
    ll: RawResponse,
}

#[derive(Deserialize)]
struct RawResponse {
    control: String,
    #[serde(default)]
    value: Value,
    #[serde(rename = "Code", alias = "code", deserialize_with = "deserialize_code")]
    code: u16,
}

fn deserialize_code<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Number(u16),
        Text(String),
    }

    match Code::deserialize(deserializer)? {
        Code::Number(n) => Ok(n),
        Code::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

impl CommandResponse {
    pub fn parse(body: &str) -> Result<Self, Error> {
        let envelope: Envelope =
            serde_json::from_str(body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: body.to_owned(),
            })?;
        let RawResponse {
            control,
            value,
            code,
        } = envelope.ll;

        let kind = match CommandKind::resolve(&control) {
            Ok(kind) => Some(kind),
            Err(e) => {
                tracing::debug!(%control, error = %e, "response for unknown command");
                None
            }
        };

        Ok(Self {
            control,
            kind,
            value,
            code,
        })
    }

    pub fn is_success(&self) -> bool {
        self.code == 200
    }

    /// `value` when it is a JSON string.
    pub fn value_str(&self) -> Option<&str> {
        self.value.as_str()
    }

    /// Arguments that followed the command path in `control`.
    pub fn args(&self) -> Vec<&str> {
        CommandKind::resolve_with_args(&self.control)
            .map(|(_, args)| args)
            .unwrap_or_default()
    }
}
