//! Implementation of the Java Minecraft ping protocol.
//! [Server List Ping](https://wiki.vg/Server_List_Ping)

use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{packet::ReadJavaExt, Error};

/// The default port of a Java Edition server.
pub const DEFAULT_PORT: u16 = 25565;

/// How long a ping may spend connecting, and then again exchanging packets.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Protocol version advertised in the handshake (1.20.1).
///
/// Servers answer status requests whatever version the client claims, so this
/// is never negotiated.
pub const PROTOCOL_VERSION: u32 = 763;

/// Configuration for pinging a Java server.
///
/// # Examples
///
/// ```
/// use slping::Java;
/// use std::time::Duration;
///
/// let java_config = Java {
///     server_address: "mc.hypixel.net".to_string(),
///     timeout: Duration::from_secs(10),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Java {
    /// The java server address.
    ///
    /// This can be either an IP or a hostname. DNS resolution will be
    /// performed on hostnames. The address is also sent verbatim in the
    /// handshake.
    ///
    /// # Examples
    ///
    /// ```text
    /// test.server.com
    /// 13.212.76.209
    /// ```
    pub server_address: String,
    /// The TCP port of the server.
    pub port: u16,
    /// Budget for resolving and connecting, and separately for exchanging
    /// packets once connected.
    pub timeout: Duration,
}

impl Default for Java {
    fn default() -> Self {
        Self {
            server_address: String::new(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// An online player of the server.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Player {
    /// The name of the player.
    pub name: String,
    /// The player's UUID
    pub id: String,
}

/// A mod reported by a Forge server.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize)]
pub struct ModInfo {
    pub id: String,
    pub version: String,
}

/// The server status reponse
///
/// More information can be found [here](https://wiki.vg/Server_List_Ping).
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Response {
    /// The name of the version the server is running
    ///
    /// In practice this comes in a large variety of different formats.
    pub version_name: String,
    /// See [Protocol Version Numbers](https://wiki.vg/Protocol_version_numbers)
    pub protocol_version: i64,
    /// The max amount of players.
    pub max_players: i64,
    /// The amount of players online.
    pub online_players: i64,
    /// A preview of which players are online
    ///
    /// In practice servers often don't send this or use it for more advertising
    pub sample: Option<Vec<Player>>,
    /// The description of the server (MOTD), flattened to plain text.
    ///
    /// Legacy `§` formatting codes are left in place.
    pub motd: String,
    /// The server icon (a Base64-encoded PNG data URI)
    pub favicon: Option<String>,
    /// Whether the server advertised Forge metadata.
    pub modded: bool,
    /// The mod loader named in `modinfo.type`, e.g. `FML`.
    pub mod_loader: Option<String>,
    /// Mods listed by legacy Forge servers.
    pub mod_list: Option<Vec<ModInfo>>,
    /// Does this server enforce server signing?
    pub enforces_secure_chat: Option<bool>,
    /// Does this server have chat previews?
    pub previews_chat: Option<bool>,
}

/// A Minecraft chat component, reduced to the parts that carry text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Chat {
    String(String),
    Component {
        #[serde(default)]
        text: String,
        #[serde(default)]
        extra: Vec<Chat>,
    },
    List(Vec<Chat>),
}

impl Chat {
    /// Concatenates the text of this component and all of its children.
    #[must_use]
    pub fn flatten(&self) -> String {
        let mut out = String::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(&self, out: &mut String) {
        match self {
            Self::String(s) => out.push_str(s),
            Self::Component { text, extra } => {
                out.push_str(text);
                for child in extra {
                    child.flatten_into(out);
                }
            }
            Self::List(children) => {
                for child in children {
                    child.flatten_into(out);
                }
            }
        }
    }
}

impl Default for Chat {
    fn default() -> Self {
        Self::String(String::new())
    }
}

#[derive(Deserialize)]
struct Version {
    name: String,
    protocol: i64,
}

#[derive(Deserialize)]
struct Players {
    max: i64,
    online: i64,
    sample: Option<Vec<Player>>,
}

#[derive(Deserialize)]
struct ForgeModMetadata {
    modid: String,
    version: String,
}

#[derive(Deserialize)]
struct ForgeModInfo {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(rename = "modList")]
    mod_list: Option<Vec<ForgeModMetadata>>,
}

impl Response {
    /// Parses the payload of a status response packet: a VarInt byte count
    /// followed by that many bytes of UTF-8 JSON.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidJsonLength`] if the count disagrees with the bytes
    /// present, [`Error::InvalidUtf8`] or [`Error::Json`] if they are not a
    /// JSON document, and [`Error::MalformedPayload`] if a field is missing or
    /// has the wrong shape.
    pub fn from_payload(mut payload: &[u8]) -> Result<Self, Error> {
        let declared = payload.read_varint()? as usize;
        if declared != payload.len() {
            return Err(Error::InvalidJsonLength {
                declared,
                actual: payload.len(),
            });
        }
        Self::from_json(std::str::from_utf8(payload)?)
    }

    /// Parses a status JSON document.
    ///
    /// # Errors
    ///
    /// [`Error::Json`] if `json` is not a JSON object, and
    /// [`Error::MalformedPayload`] if `version` or `players` is missing or any
    /// field has the wrong shape.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let Value::Object(mut root) = serde_json::from_str::<Value>(json)? else {
            return Err(Error::MalformedPayload("$".to_string()));
        };

        let version: Version = required(&mut root, "version")?;
        let players: Players = required(&mut root, "players")?;
        let description: Chat = optional(&mut root, "description")?.unwrap_or_default();
        let favicon = optional(&mut root, "favicon")?;
        let enforces_secure_chat = optional(&mut root, "enforcesSecureChat")?;
        let previews_chat = optional(&mut root, "previewsChat")?;

        let modinfo: Option<ForgeModInfo> = optional(&mut root, "modinfo")?;
        let modded = modinfo.is_some() || root.contains_key("forgeData");
        let (mod_loader, mod_list) = modinfo.map_or((None, None), |info| {
            let mods = info.mod_list.map(|mods| {
                mods.into_iter()
                    .map(|m| ModInfo {
                        id: m.modid,
                        version: m.version,
                    })
                    .collect()
            });
            (info.kind, mods)
        });

        Ok(Self {
            version_name: version.name,
            protocol_version: version.protocol,
            max_players: players.max,
            online_players: players.online,
            sample: players.sample,
            motd: description.flatten(),
            favicon,
            modded,
            mod_loader,
            mod_list,
            enforces_secure_chat,
            previews_chat,
        })
    }
}

fn required<T: DeserializeOwned>(root: &mut Map<String, Value>, key: &str) -> Result<T, Error> {
    optional(root, key)?.ok_or_else(|| Error::MalformedPayload(key.to_string()))
}

/// Takes `key` out of `root`, treating `null` the same as absent.
fn optional<T: DeserializeOwned>(
    root: &mut Map<String, Value>,
    key: &str,
) -> Result<Option<T>, Error> {
    match root.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|_| Error::MalformedPayload(key.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::varint;

    const VANILLA: &str = r#"{
        "version": {"name": "1.20.1", "protocol": 763},
        "players": {"max": 20, "online": 3, "sample": [{"name": "Alice", "id": "uuid"}]},
        "description": "A Server"
    }"#;

    fn chat(json: &str) -> String {
        serde_json::from_str::<Chat>(json).unwrap().flatten()
    }

    #[test]
    fn flatten_plain_string() {
        assert_eq!(chat(r#""Plain MOTD""#), "Plain MOTD");
    }

    #[test]
    fn flatten_extra() {
        assert_eq!(
            chat(r#"{"text": "Hello, ", "extra": [{"text": "World"}, {"text": "!"}]}"#),
            "Hello, World!"
        );
    }

    #[test]
    fn flatten_nested_extra() {
        let json = r#"{
            "text": "a",
            "extra": [
                {"text": "b", "color": "gold", "extra": [{"text": "c"}, "d"]},
                {"bold": true, "extra": [{"text": "e"}]},
                "f"
            ]
        }"#;
        assert_eq!(chat(json), "abcdef");
    }

    #[test]
    fn flatten_top_level_list() {
        assert_eq!(chat(r#"[{"text": "x"}, "y", {"text": "z"}]"#), "xyz");
    }

    #[test]
    fn flatten_keeps_legacy_codes() {
        assert_eq!(chat(r#"{"text": "§aGreen §rnormal"}"#), "§aGreen §rnormal");
    }

    #[test]
    fn parse_vanilla() {
        let response = Response::from_json(VANILLA).unwrap();
        assert_eq!(response.version_name, "1.20.1");
        assert_eq!(response.protocol_version, 763);
        assert_eq!(response.max_players, 20);
        assert_eq!(response.online_players, 3);
        assert_eq!(
            response.sample,
            Some(vec![Player {
                name: "Alice".to_string(),
                id: "uuid".to_string(),
            }])
        );
        assert_eq!(response.motd, "A Server");
        assert_eq!(response.favicon, None);
        assert!(!response.modded);
        assert_eq!(response.mod_list, None);
    }

    #[test]
    fn parse_without_sample_or_description() {
        let json = r#"{"version": {"name": "Paper 1.20.4", "protocol": 765},
                       "players": {"max": 100, "online": 42},
                       "favicon": "data:image/png;base64,AAAA",
                       "enforcesSecureChat": true}"#;
        let response = Response::from_json(json).unwrap();
        assert_eq!(response.online_players, 42);
        assert_eq!(response.sample, None);
        assert_eq!(response.motd, "");
        assert_eq!(
            response.favicon.as_deref(),
            Some("data:image/png;base64,AAAA")
        );
        assert_eq!(response.enforces_secure_chat, Some(true));
        assert_eq!(response.previews_chat, None);
    }

    #[test]
    fn parse_modinfo() {
        let json = r#"{"version": {"name": "1.12.2", "protocol": 340},
                       "players": {"max": 10, "online": 0},
                       "description": {"text": "modded"},
                       "modinfo": {"type": "FML", "modList": [{"modid": "a", "version": "1.0"}]}}"#;
        let response = Response::from_json(json).unwrap();
        assert!(response.modded);
        assert_eq!(response.mod_loader.as_deref(), Some("FML"));
        assert_eq!(
            response.mod_list,
            Some(vec![ModInfo {
                id: "a".to_string(),
                version: "1.0".to_string(),
            }])
        );
    }

    #[test]
    fn parse_forge_data_without_mod_list() {
        let json = r#"{"version": {"name": "1.20.1", "protocol": 763},
                       "players": {"max": 10, "online": 0},
                       "forgeData": {"channels": [], "mods": [], "fmlNetworkVersion": 3}}"#;
        let response = Response::from_json(json).unwrap();
        assert!(response.modded);
        assert_eq!(response.mod_list, None);
    }

    #[test]
    fn missing_version() {
        let json = r#"{"players": {"max": 1, "online": 0}, "description": ""}"#;
        match Response::from_json(json) {
            Err(Error::MalformedPayload(field)) => assert_eq!(field, "version"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_players() {
        let json = r#"{"version": {"name": "1.20.1", "protocol": 763}}"#;
        match Response::from_json(json) {
            Err(Error::MalformedPayload(field)) => assert_eq!(field, "players"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn wrong_shape() {
        let json = r#"{"version": {"name": "1.20.1", "protocol": 763},
                       "players": {"max": "many", "online": 0}}"#;
        match Response::from_json(json) {
            Err(Error::MalformedPayload(field)) => assert_eq!(field, "players"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn not_an_object() {
        assert!(matches!(
            Response::from_json("[1, 2]"),
            Err(Error::MalformedPayload(_))
        ));
        assert!(matches!(Response::from_json("{"), Err(Error::Json(_))));
    }

    #[test]
    fn payload_length_prefix() {
        let mut payload = varint::encode(u32::try_from(VANILLA.len()).unwrap());
        payload.extend_from_slice(VANILLA.as_bytes());
        let response = Response::from_payload(&payload).unwrap();
        assert_eq!(response.version_name, "1.20.1");
    }

    #[test]
    fn payload_length_mismatch() {
        let mut payload = varint::encode(u32::try_from(VANILLA.len()).unwrap() + 1);
        payload.extend_from_slice(VANILLA.as_bytes());
        assert!(matches!(
            Response::from_payload(&payload),
            Err(Error::InvalidJsonLength { declared, actual })
                if declared == VANILLA.len() + 1 && actual == VANILLA.len()
        ));
    }
}
