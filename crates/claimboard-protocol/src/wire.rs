//! Wire formats: the compact share string for plans, and JSON documents.
//!
//! Share strings are built in two layers. Each step becomes a token (`d` for
//! a day marker, `c:<tile>:<alliance>` / `x:<tile>:<alliance>` for claim and
//! clear), tokens are joined with `,`, and the result is base64 encoded with
//! the URL-safe alphabet so it can sit in a query parameter unescaped.
//!
//! Alliance ids are percent-escaped inside a token: `%` as `%25`, `,` as
//! `%2C` and `:` as `%3A`. Any other `%` sequence decodes literally.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use thiserror::Error;

use crate::{AllianceId, BoardState, MapGeometry, MoveAction, PlanStep, TileId};

/// Query parameter that carries an encoded plan.
pub const PLAN_PARAM: &str = "plan";

const DAY_TOKEN: &str = "d";
const CLAIM_TAG: &str = "c";
const CLEAR_TAG: &str = "x";
const ITEM_DELIMITER: char = ',';
const FIELD_DELIMITER: char = ':';
const ID_ESCAPES: [(char, &str); 3] = [
    ('%', "%25"),
    (ITEM_DELIMITER, "%2C"),
    (FIELD_DELIMITER, "%3A"),
];

#[derive(Debug, Error)]
pub enum WireError {
    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("plan text is not utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed plan token #{index}: {token:?}")]
    MalformedToken { index: usize, token: String },
    #[error("unknown action tag {tag:?} in plan token #{index}")]
    UnknownAction { index: usize, tag: String },
    #[error("invalid tile id {raw:?} in plan token #{index}")]
    InvalidTile { index: usize, raw: String },
    #[error("alliance id cannot be carried in a share string: {0:?}")]
    InvalidAllianceId(AllianceId),
}

/// Render steps as the plain token list, before the base64 layer.
pub fn encode_tokens(steps: &[PlanStep]) -> Result<String, WireError> {
    let mut tokens = Vec::with_capacity(steps.len());
    for step in steps {
        match step {
            PlanStep::NewDay => tokens.push(DAY_TOKEN.to_string()),
            PlanStep::Move {
                action,
                tile,
                alliance,
            } => {
                if alliance.as_str().is_empty() {
                    return Err(WireError::InvalidAllianceId(alliance.clone()));
                }
                let id = escape_alliance(alliance.as_str());
                let tag = match action {
                    MoveAction::Claim => CLAIM_TAG,
                    MoveAction::Clear => CLEAR_TAG,
                };
                tokens.push(format!("{tag}{FIELD_DELIMITER}{tile}{FIELD_DELIMITER}{id}"));
            }
        }
    }
    Ok(tokens.join(&ITEM_DELIMITER.to_string()))
}

/// Parse the plain token list. Any bad token rejects the whole plan.
pub fn decode_tokens(text: &str) -> Result<Vec<PlanStep>, WireError> {
    if text.is_empty() {
        return Ok(Vec::new());
    }

    text.split(ITEM_DELIMITER)
        .enumerate()
        .map(|(index, token)| decode_token(index, token))
        .collect()
}

fn decode_token(index: usize, token: &str) -> Result<PlanStep, WireError> {
    if token == DAY_TOKEN {
        return Ok(PlanStep::NewDay);
    }

    let mut fields = token.split(FIELD_DELIMITER);
    let (Some(tag), Some(tile), Some(alliance), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(WireError::MalformedToken {
            index,
            token: token.to_string(),
        });
    };

    let action = match tag {
        CLAIM_TAG => MoveAction::Claim,
        CLEAR_TAG => MoveAction::Clear,
        other => {
            return Err(WireError::UnknownAction {
                index,
                tag: other.to_string(),
            })
        }
    };
    let tile: u32 = tile.parse().map_err(|_| WireError::InvalidTile {
        index,
        raw: tile.to_string(),
    })?;
    if alliance.is_empty() {
        return Err(WireError::MalformedToken {
            index,
            token: token.to_string(),
        });
    }

    Ok(PlanStep::Move {
        action,
        tile: TileId(tile),
        alliance: AllianceId::new(unescape_alliance(alliance)),
    })
}

fn escape_alliance(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for c in id.chars() {
        match ID_ESCAPES.iter().find(|(raw, _)| *raw == c) {
            Some((_, escaped)) => out.push_str(escaped),
            None => out.push(c),
        }
    }
    out
}

fn unescape_alliance(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut rest = field;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let known = ID_ESCAPES.iter().find(|(_, escaped)| {
            tail.get(..escaped.len()).is_some_and(|head| head.eq_ignore_ascii_case(escaped))
        });
        match known {
            Some((raw, escaped)) => {
                out.push(*raw);
                rest = &tail[escaped.len()..];
            }
            None => {
                out.push('%');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Encode a plan for a share URL. An empty plan encodes to an empty string.
pub fn encode_plan(steps: &[PlanStep]) -> Result<String, WireError> {
    let tokens = encode_tokens(steps)?;
    Ok(URL_SAFE_NO_PAD.encode(tokens.as_bytes()))
}

/// Decode a share-URL plan.
///
/// Accepts the URL-safe alphabet produced by [`encode_plan`] as well as the
/// standard alphabet with padding, so links made by older clients still load.
pub fn decode_plan(encoded: &str) -> Result<Vec<PlanStep>, WireError> {
    let normalized: String = encoded
        .trim()
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    if normalized.is_empty() {
        return Ok(Vec::new());
    }

    let bytes = URL_SAFE_NO_PAD.decode(normalized.as_bytes())?;
    let text = String::from_utf8(bytes)?;
    decode_tokens(&text)
}

/// Set (or, for an empty plan, drop) the `plan` parameter on `base`,
/// keeping every other query parameter and any fragment.
pub fn share_url(base: &str, steps: &[PlanStep]) -> Result<String, WireError> {
    let encoded = encode_plan(steps)?;

    let (without_fragment, fragment) = match base.split_once('#') {
        Some((head, frag)) => (head, Some(frag)),
        None => (base, None),
    };
    let (path, query) = without_fragment
        .split_once('?')
        .unwrap_or((without_fragment, ""));

    let mut pairs: Vec<String> = query
        .split('&')
        .filter(|pair| !pair.is_empty() && param_name(pair) != PLAN_PARAM)
        .map(str::to_string)
        .collect();
    if !encoded.is_empty() {
        pairs.push(format!("{PLAN_PARAM}={encoded}"));
    }

    let mut url = path.to_string();
    if !pairs.is_empty() {
        url.push('?');
        url.push_str(&pairs.join("&"));
    }
    if let Some(fragment) = fragment {
        url.push('#');
        url.push_str(fragment);
    }
    Ok(url)
}

/// Extract the raw `plan` value from a URL or bare query string.
///
/// Missing or empty means "no plan", never an error.
pub fn plan_param(url_or_query: &str) -> Option<String> {
    let without_fragment = url_or_query.split('#').next().unwrap_or_default();
    let query = match without_fragment.split_once('?') {
        Some((_, query)) => query,
        None => without_fragment,
    };

    query
        .split('&')
        .find(|pair| param_name(pair) == PLAN_PARAM)
        .and_then(|pair| pair.split_once('='))
        .map(|(_, value)| unescape_base64(value))
        .filter(|value| !value.is_empty())
}

fn param_name(pair: &str) -> &str {
    pair.split('=').next().unwrap_or_default()
}

/// Undo the percent-escapes a browser applies to standard base64.
fn unescape_base64(value: &str) -> String {
    value
        .replace("%2B", "+")
        .replace("%2b", "+")
        .replace("%2F", "/")
        .replace("%2f", "/")
        .replace("%3D", "=")
        .replace("%3d", "=")
}

pub fn deserialize_geometry_json(json: &str) -> Result<MapGeometry, WireError> {
    Ok(serde_json::from_str(json)?)
}

pub fn serialize_geometry_json(geometry: &MapGeometry) -> Result<String, WireError> {
    Ok(serde_json::to_string(geometry)?)
}

pub fn deserialize_board_json(json: &str) -> Result<BoardState, WireError> {
    Ok(serde_json::from_str(json)?)
}

pub fn serialize_board_json(board: &BoardState) -> Result<String, WireError> {
    Ok(serde_json::to_string(board)?)
}

pub fn deserialize_steps_json(json: &str) -> Result<Vec<PlanStep>, WireError> {
    Ok(serde_json::from_str(json)?)
}

pub fn serialize_steps_json(steps: &[PlanStep]) -> Result<String, WireError> {
    Ok(serde_json::to_string(steps)?)
}
