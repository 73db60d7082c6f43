//! src/protocol.rs
//!
//! The wire codec (C2): encodes and decodes the two gossip message kinds —
//! rumor and status — in the newline-free ASCII text format spec.md §4.2
//! defines. Neither kind is escaped; the codec trusts its caller not to
//! embed `,`, `:`, `{`, `}` or a newline inside message text (spec.md §9,
//! "Text encoding constraint").

use crate::store::{OriginId, SeqNum};

/// Target size for a single encoded message, matching the original
/// implementation's buffer and the spec's "≤ ~1 KiB" guidance.
pub const MAX_DATAGRAM_SIZE: usize = 1024;

/// A decoded gossip message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireMessage {
    Rumor {
        sender: OriginId,
        origin: OriginId,
        seq: SeqNum,
        text: String,
    },
    Status {
        sender: OriginId,
        pairs: Vec<(OriginId, SeqNum)>,
    },
}

/// Raised when a datagram doesn't match either wire format. Per spec.md
/// §7, the caller logs this and drops the datagram — it never propagates
/// further.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("malformed gossip message: {raw:?}")]
pub struct MalformedMessage {
    raw: String,
}

impl MalformedMessage {
    fn new(raw: &str) -> Self {
        Self { raw: raw.to_string() }
    }
}

pub fn encode_rumor(sender: OriginId, origin: OriginId, seq: SeqNum, text: &str) -> String {
    format!("rumor:{sender}:{{{text},{origin},{seq}}}")
}

pub fn encode_status(sender: OriginId, pairs: &[(OriginId, SeqNum)]) -> String {
    let body = pairs
        .iter()
        .map(|(origin, low)| format!("{origin}:{low}"))
        .collect::<Vec<_>>()
        .join(",");
    format!("status:{sender}:{{{body}}}")
}

/// Parses a single datagram's payload. Splits the leading `kind:sender:`
/// prefix, then dispatches on `kind` to parse the brace-enclosed body.
pub fn decode(raw: &str) -> Result<WireMessage, MalformedMessage> {
    let trimmed = raw.trim_end_matches(['\n', '\r']);
    let err = || MalformedMessage::new(trimmed);

    let mut parts = trimmed.splitn(3, ':');
    let kind = parts.next().ok_or_else(err)?;
    let sender: OriginId = parts.next().ok_or_else(err)?.parse().map_err(|_| err())?;
    let body = parts
        .next()
        .ok_or_else(err)?
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .ok_or_else(err)?;

    match kind {
        "rumor" => decode_rumor_body(sender, body, trimmed),
        "status" => decode_status_body(sender, body, trimmed),
        _ => Err(err()),
    }
}

fn decode_rumor_body(sender: OriginId, body: &str, raw: &str) -> Result<WireMessage, MalformedMessage> {
    let err = || MalformedMessage::new(raw);
    let mut fields = body.splitn(3, ',');
    let text = fields.next().ok_or_else(err)?;
    let origin: OriginId = fields.next().ok_or_else(err)?.parse().map_err(|_| err())?;
    let seq: SeqNum = fields.next().ok_or_else(err)?.parse().map_err(|_| err())?;
    Ok(WireMessage::Rumor {
        sender,
        origin,
        seq,
        text: text.to_string(),
    })
}

fn decode_status_body(sender: OriginId, body: &str, raw: &str) -> Result<WireMessage, MalformedMessage> {
    let err = || MalformedMessage::new(raw);
    if body.is_empty() {
        return Ok(WireMessage::Status { sender, pairs: Vec::new() });
    }
    let mut pairs = Vec::new();
    for pair in body.split(',') {
        let mut kv = pair.splitn(2, ':');
        let origin: OriginId = kv.next().ok_or_else(err)?.parse().map_err(|_| err())?;
        let low: SeqNum = kv.next().ok_or_else(err)?.parse().map_err(|_| err())?;
        pairs.push((origin, low));
    }
    Ok(WireMessage::Status { sender, pairs })
}
