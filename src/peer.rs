//! Peer identity and roster payload mapping.
//!
//! A [`Peer`] is a value type replaced wholesale on each roster broadcast.
//! The roster travels inside a PeerList message's attachment map, one entry
//! per peer: the key is the server-assigned peer id, the value is the
//! peer's role (`"self"` for the receiving client's own entry, `"peer"`
//! otherwise).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TermlinkError};
use crate::message::{Message, MessageKind};

const ROLE_SELF: &str = "self";
const ROLE_PEER: &str = "peer";

/// Remote identity from the server's roster broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    /// Stable server-assigned id.
    pub id: String,
    /// Whether this entry is the receiving client itself.
    pub is_self: bool,
}

impl Peer {
    /// Create a peer entry.
    pub fn new(id: &str, is_self: bool) -> Self {
        Self {
            id: id.to_string(),
            is_self,
        }
    }
}

/// Build a PeerList message from a roster.
pub fn roster_message(peers: &[Peer]) -> Message {
    let mut msg = Message::new(MessageKind::PeerList);
    for peer in peers {
        let role = if peer.is_self { ROLE_SELF } else { ROLE_PEER };
        msg.attachments.insert(peer.id.clone(), role.to_string());
    }
    msg
}

/// Parse a roster out of a PeerList message's attachments.
///
/// # Errors
///
/// Returns [`TermlinkError::Protocol`] for a role value neither end of the
/// protocol defines.
pub fn roster_from_attachments(attachments: &HashMap<String, String>) -> Result<Vec<Peer>> {
    let mut peers = Vec::with_capacity(attachments.len());
    for (id, role) in attachments {
        let is_self = match role.as_str() {
            ROLE_SELF => true,
            ROLE_PEER => false,
            other => {
                return Err(TermlinkError::Protocol(format!(
                    "unknown roster role {other:?} for peer {id}"
                )))
            }
        };
        peers.push(Peer::new(id, is_self));
    }
    Ok(peers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_roundtrip() {
        let roster = vec![Peer::new("a", true), Peer::new("b", false)];
        let msg = roster_message(&roster);
        assert_eq!(msg.kind, MessageKind::PeerList);

        let mut parsed = roster_from_attachments(&msg.attachments).unwrap();
        parsed.sort_by(|x, y| x.id.cmp(&y.id));
        assert_eq!(parsed, roster);
    }

    #[test]
    fn test_empty_roster() {
        let msg = roster_message(&[]);
        let parsed = roster_from_attachments(&msg.attachments).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_unknown_role_rejected() {
        let mut attachments = HashMap::new();
        attachments.insert("a".to_string(), "admin".to_string());
        let err = roster_from_attachments(&attachments).unwrap_err();
        assert!(matches!(err, TermlinkError::Protocol(_)));
    }
}
