//! Wire decoding: `aura://verify?data=<token>` or a raw token, down to a
//! schema-validated [`Presentation`].

use std::collections::BTreeMap;

use serde_json::Value;

use crate::crypto;
use crate::error::Error;

use super::types::{Presentation, MAX_OPAQUE_ID_LEN};

/// Options governing [`parse`]/[`parse_safe`].
#[derive(Clone, Debug)]
pub struct ParseOptions {
    /// Accepted protocol versions. Default: `{"1.0"}`.
    pub supported_versions: Vec<String>,
    /// Extra seconds of slack applied when checking `exp` against the
    /// lower bound; strict mode always rejects `exp <= now`.
    pub tolerance_seconds: i64,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { supported_versions: vec!["1.0".to_string()], tolerance_seconds: 0 }
    }
}

const ONE_YEAR_SECONDS: i64 = 365 * 24 * 3600;
const TEN_YEARS_SECONDS: i64 = 10 * ONE_YEAR_SECONDS;
const FORBIDDEN_KEYS: [&str; 3] = ["__proto__", "constructor", "prototype"];

/// Decode and strictly validate a presentation from either the
/// `aura://verify?data=<token>` wire form or a raw base64 token.
pub fn parse(input: &str, options: &ParseOptions, now: i64) -> Result<Presentation, Error> {
    let token = extract_token(input)?;
    let decoded = crypto::base64_decode(&token).map_err(|_| {
        Error::Parse("invalid base64 in presentation token".to_string())
    })?;
    let text = String::from_utf8(decoded)
        .map_err(|_| Error::Parse("presentation payload is not valid UTF-8".to_string()))?;
    let raw: Value = serde_json::from_str(&text)
        .map_err(|e| Error::Parse(format!("invalid JSON in presentation payload: {e}")))?;
    let object = strip_dangerous_keys(raw)
        .as_object()
        .cloned()
        .ok_or_else(|| Error::Parse("presentation payload must be a JSON object".to_string()))?;

    let presentation = build_presentation(&object)?;
    validate(&presentation, options, now)?;
    Ok(presentation)
}

/// Non-raising variant of [`parse`].
pub fn parse_safe(input: &str, options: &ParseOptions, now: i64) -> Result<Presentation, Error> {
    parse(input, options, now)
}

/// Pull `<token>` out of either wire shape.
fn extract_token(input: &str) -> Result<String, Error> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::Parse("empty presentation input".to_string()));
    }
    if !trimmed.starts_with("aura://") {
        return Ok(trimmed.to_string());
    }

    // `Url` has no notion of custom schemes without a registered handler,
    // so parse under a throwaway `http` scheme and require the verify path
    // whether it lands in the authority or the path segment.
    let substituted = format!("http://{}", &trimmed["aura://".len()..]);
    let url = url::Url::parse(&substituted)
        .map_err(|_| Error::Parse("malformed aura:// URL".to_string()))?;
    let is_verify = url.host_str() == Some("verify") || url.path() == "/verify";
    if !is_verify {
        return Err(Error::Parse("aura:// URL must be the verify action".to_string()));
    }

    // The token is ASCII-safe base64, so read the raw query string rather
    // than `query_pairs` (which percent-decodes into an owned `Cow` for no
    // benefit here).
    let query = url.query().ok_or_else(|| Error::Parse("aura:// URL missing data".to_string()))?;
    raw_query_param(query, "data")
        .map(str::to_string)
        .ok_or_else(|| Error::Parse("aura:// URL missing data param".to_string()))
}

fn raw_query_param<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key && !v.is_empty()).then_some(v)
    })
}

fn strip_dangerous_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let cleaned: serde_json::Map<String, Value> = map
                .into_iter()
                .filter(|(k, _)| !FORBIDDEN_KEYS.contains(&k.as_str()))
                .map(|(k, v)| (k, strip_dangerous_keys(v)))
                .collect();
            Value::Object(cleaned)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(strip_dangerous_keys).collect()),
        other => other,
    }
}

fn build_presentation(object: &serde_json::Map<String, Value>) -> Result<Presentation, Error> {
    let required = ["v", "p", "h", "vcs", "ctx", "exp", "n", "sig"];
    let missing: Vec<&str> = required.iter().filter(|k| !object.contains_key(**k)).copied().collect();
    if !missing.is_empty() {
        return Err(Error::Parse(format!("missing required fields: {}", missing.join(", "))));
    }

    let v = string_field(object, "v")?;
    let p = string_field(object, "p")?;
    let h = string_field(object, "h")?;
    let vcs = object["vcs"]
        .as_array()
        .ok_or_else(|| Error::Parse("vcs must be an array".to_string()))?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect::<Option<Vec<String>>>()
        .ok_or_else(|| Error::Parse("vcs entries must be strings".to_string()))?;
    let ctx = object["ctx"]
        .as_object()
        .ok_or_else(|| Error::Parse("ctx must be an object".to_string()))?
        .iter()
        .map(|(k, v)| v.as_bool().map(|b| (k.clone(), b)))
        .collect::<Option<BTreeMap<String, bool>>>()
        .ok_or_else(|| Error::Parse("ctx values must be booleans".to_string()))?;
    let exp = object["exp"].as_i64().ok_or_else(|| Error::Parse("exp must be an integer".to_string()))?;
    let n = object["n"].as_u64().ok_or_else(|| Error::Parse("n must be a non-negative integer".to_string()))?;
    let sig = string_field(object, "sig")?;

    Ok(Presentation { v, p, h, vcs, ctx, exp, n, sig })
}

fn string_field(object: &serde_json::Map<String, Value>, key: &str) -> Result<String, Error> {
    object[key]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::Parse(format!("field `{key}` must be a string")))
}

fn validate(presentation: &Presentation, options: &ParseOptions, now: i64) -> Result<(), Error> {
    if !options.supported_versions.iter().any(|v| v == &presentation.v) {
        return Err(Error::Validation(format!("unsupported protocol version `{}`", presentation.v)));
    }
    if presentation.p.trim().is_empty() || presentation.p.len() > MAX_OPAQUE_ID_LEN {
        return Err(Error::Validation("presentation id `p` is empty or too long".to_string()));
    }
    if presentation.h.trim().is_empty() {
        return Err(Error::Validation("holder DID `h` is empty".to_string()));
    }
    if !crate::vc::is_valid_did(&presentation.h) {
        return Err(Error::Validation(format!("holder DID `{}` is malformed", presentation.h)));
    }
    if presentation.sig.trim().is_empty() {
        return Err(Error::Validation("signature `sig` is empty".to_string()));
    }
    if crypto::from_hex(&presentation.sig).is_err() {
        return Err(Error::Validation("signature `sig` is not valid hex".to_string()));
    }
    if presentation.vcs.is_empty() {
        return Err(Error::Validation("vcs must not be empty".to_string()));
    }
    for id in &presentation.vcs {
        if id.trim().is_empty() || id.len() > MAX_OPAQUE_ID_LEN || !is_valid_vc_id_charset(id) {
            return Err(Error::Validation(format!("vc id `{id}` is malformed")));
        }
    }
    if presentation.exp <= 0 {
        return Err(Error::Validation("exp must be a positive integer".to_string()));
    }
    let lower_bound = now - ONE_YEAR_SECONDS - options.tolerance_seconds;
    let upper_bound = now + TEN_YEARS_SECONDS;
    if presentation.exp < lower_bound || presentation.exp > upper_bound {
        return Err(Error::Validation(format!(
            "exp `{}` is outside the accepted window [{lower_bound}, {upper_bound}]",
            presentation.exp
        )));
    }
    Ok(())
}

fn is_valid_vc_id_charset(id: &str) -> bool {
    id.bytes().all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
}
