//! Share links.
//!
//! A token is the map's JSON, percent-escaped so any Unicode survives as
//! ASCII, then base64 encoded. Links carry it as `?shared=<token>&view=true`.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ShareError;
use crate::limits::MAX_SHARE_TOKEN_BYTES;
use crate::model::GraphSnapshot;

pub const SHARED_PARAM: &str = "shared";
pub const VIEW_PARAM: &str = "view";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SharedMap {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub graph: GraphSnapshot,
}

impl SharedMap {
    pub fn new(name: impl Into<String>, description: Option<String>, graph: GraphSnapshot) -> Self {
        SharedMap {
            name: name.into(),
            description,
            graph,
        }
    }

    pub fn graph(&self) -> GraphSnapshot {
        self.graph.clone()
    }
}

pub fn encode(map: &SharedMap) -> Result<String, ShareError> {
    let json = serde_json::to_string(map)?;
    let escaped = urlencoding::encode(&json);
    Ok(STANDARD.encode(escaped.as_bytes()))
}

/// Inverse of [`encode`]. Accepts standard or URL-safe base64 with or
/// without padding; the decoded graph must pass validation.
pub fn decode(token: &str) -> Result<SharedMap, ShareError> {
    // A '+' that went through naive form decoding comes back as a space
    let token = token.trim().replace(' ', "+");
    if token.len() > MAX_SHARE_TOKEN_BYTES {
        return Err(ShareError::TooLarge {
            max: MAX_SHARE_TOKEN_BYTES,
            got: token.len(),
        });
    }
    let url_safe = token.contains(['-', '_']);
    let padded = token.ends_with('=');
    let engine = match (url_safe, padded) {
        (false, true) => &STANDARD,
        (false, false) => &STANDARD_NO_PAD,
        (true, true) => &URL_SAFE,
        (true, false) => &URL_SAFE_NO_PAD,
    };
    let escaped = String::from_utf8(engine.decode(token.as_bytes())?)?;
    let json = urlencoding::decode(&escaped)?;
    let map: SharedMap = serde_json::from_str(&json)?;
    map.graph.validate()?;
    Ok(map)
}

/// Link to `page_url` (query and fragment replaced) that opens `map` read-only
pub fn share_link(page_url: &str, map: &SharedMap) -> Result<Url, ShareError> {
    let mut url = Url::parse(page_url)?;
    let token = encode(map)?;
    url.set_fragment(None);
    url.set_query(None);
    url.query_pairs_mut()
        .append_pair(SHARED_PARAM, &token)
        .append_pair(VIEW_PARAM, "true");
    Ok(url)
}

/// Share parameters found in a page URL
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SharedLink {
    pub token: String,
    pub view_only: bool,
}

impl SharedLink {
    /// `Ok(None)` when the URL carries no share token
    pub fn parse(page_url: &str) -> Result<Option<SharedLink>, ShareError> {
        let url = Url::parse(page_url)?;
        let mut token = None;
        let mut view_only = false;
        for (k, v) in url.query_pairs() {
            match k.as_ref() {
                SHARED_PARAM => token = Some(v.into_owned()),
                VIEW_PARAM => view_only = v == "true",
                _ => {}
            }
        }
        Ok(token
            .filter(|t| !t.is_empty())
            .map(|token| SharedLink { token, view_only }))
    }

    pub fn decode(&self) -> Result<SharedMap, ShareError> {
        decode(&self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GraphEdge, GraphNode, NodeData, NodeKind, Position, Relationship};

    fn sample() -> SharedMap {
        let mut a = NodeData::titled("Lauf 10 km — schneller");
        a.description = Some("日本語 ✓ and emoji 🏃".into());
        a.set_tags(["fitness", "größe"]);
        SharedMap::new(
            "Ziele 2026",
            Some("Beschreibung".into()),
            GraphSnapshot::new(
                vec![
                    GraphNode::new("a", NodeKind::Goal, Position::new(1.5, -2.0), a),
                    GraphNode::new("b", NodeKind::Note, Position::new(0.0, 0.0), NodeData::titled("b")),
                ],
                vec![GraphEdge::new("e", "a", "b", Relationship::Blocks)],
            ),
        )
    }

    #[test]
    fn test_roundtrip_non_ascii() {
        let m = sample();
        let token = encode(&m).unwrap();
        assert!(token.is_ascii());
        assert_eq!(decode(&token).unwrap(), m);
    }

    #[test]
    fn test_wire_format_is_escaped_json() {
        let m = SharedMap::new("é", None, GraphSnapshot::default());
        let token = encode(&m).unwrap();
        let escaped = String::from_utf8(STANDARD.decode(&token).unwrap()).unwrap();
        assert_eq!(escaped, "%7B%22name%22%3A%22%C3%A9%22%2C%22nodes%22%3A%5B%5D%2C%22edges%22%3A%5B%5D%7D");
    }

    #[test]
    fn test_accepts_url_safe_and_unpadded() {
        let m = sample();
        let raw = urlencoding::encode(&serde_json::to_string(&m).unwrap()).into_owned();
        let t = URL_SAFE_NO_PAD.encode(raw.as_bytes());
        assert_eq!(decode(&t).unwrap(), m);
    }

    #[test]
    fn test_malformed_tokens_fail_with_codes() {
        assert_eq!(decode("***").unwrap_err().code(), "invalid_token");
        let not_json = STANDARD.encode("hello");
        assert_eq!(decode(&not_json).unwrap_err().code(), "invalid_payload");
        let bad_escape = STANDARD.encode("%FF%FE");
        assert_eq!(decode(&bad_escape).unwrap_err().code(), "invalid_token");
        let dangling = STANDARD.encode(urlencoding::encode(
            r#"{"name":"x","nodes":[],"edges":[{"id":"e","source":"a","target":"b"}]}"#,
        ).as_bytes());
        assert_eq!(decode(&dangling).unwrap_err().code(), "invalid_graph");
        let huge = "A".repeat(MAX_SHARE_TOKEN_BYTES + 4);
        assert_eq!(decode(&huge).unwrap_err().code(), "token_too_large");
    }

    #[test]
    fn test_share_link_replaces_query() {
        let m = sample();
        let link = share_link("https://example.com/goals?tab=map#top", &m).unwrap();
        assert_eq!(link.path(), "/goals");
        assert_eq!(link.fragment(), None);
        let parsed = SharedLink::parse(link.as_str()).unwrap().unwrap();
        assert!(parsed.view_only);
        assert_eq!(parsed.decode().unwrap(), m);
        assert!(link.as_str().ends_with("&view=true"));
    }

    #[test]
    fn test_parse_without_token() {
        assert_eq!(SharedLink::parse("https://example.com/?view=true").unwrap(), None);
        assert_eq!(SharedLink::parse("not a url").unwrap_err().code(), "invalid_url");
    }
}
