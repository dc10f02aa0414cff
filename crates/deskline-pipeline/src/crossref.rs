// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message cross-referencing.
//!
//! The upstream only exposes raw user ids on messages. This module joins each
//! message with its ticket and the agent directory to decide who sent it and
//! who it was addressed to, then emits one flat row per individual message.

use deskline_core::Row;
use deskline_liveagent::{AgentLookup, MessageGroup};
use serde_json::Value;

/// Receiver marker when the assigned agent is not in the directory.
pub const UNKNOWN_PARTY: &str = "Unknown";

/// Role of a message party.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyType {
    Agent,
    Customer,
}

impl PartyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartyType::Agent => "Agent",
            PartyType::Customer => "Customer",
        }
    }
}

/// Ticket-level fields repeated on every message row.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketContext {
    pub ticket_id: String,
    pub code: Value,
    pub owner_name: Option<String>,
    pub subject: Value,
    pub agentid: Option<String>,
    pub status: Value,
    pub channel_type: Value,
    pub tags: Value,
    pub date_created: Value,
}

impl TicketContext {
    /// Extracts the context from a ticket row. Rows without an id yield `None`.
    pub fn from_row(row: &Row) -> Option<Self> {
        let ticket_id = text(row.get("id"))?;
        Some(Self {
            ticket_id,
            code: field(row, "code"),
            owner_name: text(row.get("owner_name")),
            subject: field(row, "subject"),
            agentid: text(row.get("agentid")),
            status: field(row, "status"),
            channel_type: field(row, "channel_type"),
            tags: field(row, "tags"),
            date_created: field(row, "date_created"),
        })
    }
}

fn field(row: &Row, name: &str) -> Value {
    row.get(name).cloned().unwrap_or(Value::Null)
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Resolved sender and receiver of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parties {
    pub sender_name: Option<String>,
    pub sender_type: PartyType,
    pub receiver_name: Option<String>,
    pub receiver_type: PartyType,
}

/// Decides sender and receiver from the message's originating user id.
///
/// An originating id found in the agent directory means an agent wrote to
/// the ticket owner. Anything else is the owner writing to the ticket's
/// assigned agent.
pub fn resolve_parties(
    userid: Option<&str>,
    ticket: &TicketContext,
    agents: &AgentLookup,
) -> Parties {
    match userid.and_then(|id| agents.name(id)) {
        Some(agent_name) => Parties {
            sender_name: Some(agent_name.to_string()),
            sender_type: PartyType::Agent,
            receiver_name: ticket.owner_name.clone(),
            receiver_type: PartyType::Customer,
        },
        None => Parties {
            sender_name: ticket.owner_name.clone(),
            sender_type: PartyType::Customer,
            receiver_name: Some(
                ticket
                    .agentid
                    .as_deref()
                    .and_then(|id| agents.name(id))
                    .unwrap_or(UNKNOWN_PARTY)
                    .to_string(),
            ),
            receiver_type: PartyType::Agent,
        },
    }
}

/// Unnests `groups` into one row per individual message.
pub fn message_rows(
    ticket: &TicketContext,
    groups: &[MessageGroup],
    agents: &AgentLookup,
) -> Vec<Row> {
    let agent_name = ticket
        .agentid
        .as_deref()
        .and_then(|id| agents.name(id))
        .map(|name| Value::String(name.to_string()))
        .unwrap_or(Value::Null);

    let mut rows = Vec::new();
    for group in groups {
        for message in &group.messages {
            let parties = resolve_parties(message.userid.as_deref(), ticket, agents);

            let mut row = Row::new();
            row.insert("ticket_id".into(), Value::String(ticket.ticket_id.clone()));
            row.insert("code".into(), ticket.code.clone());
            row.insert("owner_name".into(), opt(&ticket.owner_name));
            row.insert("message_id".into(), opt(&message.id));
            row.insert("message_group_id".into(), opt(&group.id));
            row.insert("subject".into(), ticket.subject.clone());
            row.insert("message".into(), opt(&message.message));
            row.insert("userid".into(), opt(&message.userid));
            row.insert("datecreated".into(), opt(&message.datecreated));
            row.insert("ticket_date_created".into(), ticket.date_created.clone());
            row.insert("type".into(), opt(&message.kind));
            row.insert("visibility".into(), opt(&message.visibility));
            row.insert("agentid".into(), opt(&ticket.agentid));
            row.insert("status".into(), ticket.status.clone());
            row.insert("channel_type".into(), ticket.channel_type.clone());
            row.insert("agent_name".into(), agent_name.clone());
            row.insert("sender_name".into(), opt(&parties.sender_name));
            row.insert("sender_type".into(), parties.sender_type.as_str().into());
            row.insert("receiver_type".into(), parties.receiver_type.as_str().into());
            row.insert("receiver_name".into(), opt(&parties.receiver_name));
            row.insert("tags".into(), ticket.tags.clone());
            rows.push(row);
        }
    }
    rows
}

fn opt(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskline_liveagent::Message;
    use serde_json::json;

    fn ticket() -> TicketContext {
        let row = json!({
            "id": "t1",
            "code": "ABC-123",
            "owner_name": "Bob",
            "agentid": "A1",
            "subject": "Refund",
            "status": "R",
            "channel_type": "E",
            "tags": "vip,refund",
            "date_created": "2025-04-01 00:00:00"
        });
        TicketContext::from_row(row.as_object().unwrap()).unwrap()
    }

    fn lookup() -> AgentLookup {
        [("A1", "Alice")].into_iter().collect()
    }

    #[test]
    fn agent_author_writes_to_customer() {
        let parties = resolve_parties(Some("A1"), &ticket(), &lookup());
        assert_eq!(parties.sender_name.as_deref(), Some("Alice"));
        assert_eq!(parties.sender_type, PartyType::Agent);
        assert_eq!(parties.receiver_type, PartyType::Customer);
        assert_eq!(parties.receiver_name.as_deref(), Some("Bob"));
    }

    #[test]
    fn customer_author_writes_to_assigned_agent() {
        let parties = resolve_parties(Some("U9"), &ticket(), &lookup());
        assert_eq!(parties.sender_name.as_deref(), Some("Bob"));
        assert_eq!(parties.sender_type, PartyType::Customer);
        assert_eq!(parties.receiver_type, PartyType::Agent);
        assert_eq!(parties.receiver_name.as_deref(), Some("Alice"));
    }

    #[test]
    fn unknown_assigned_agent_falls_back() {
        let mut t = ticket();
        t.agentid = Some("A404".into());
        let parties = resolve_parties(Some("U9"), &t, &lookup());
        assert_eq!(parties.receiver_name.as_deref(), Some(UNKNOWN_PARTY));

        t.agentid = None;
        let parties = resolve_parties(None, &t, &lookup());
        assert_eq!(parties.receiver_name.as_deref(), Some(UNKNOWN_PARTY));
        assert_eq!(parties.sender_name.as_deref(), Some("Bob"));
    }

    #[test]
    fn groups_are_unnested_with_ticket_context() {
        let groups = vec![
            MessageGroup {
                id: Some("g1".into()),
                messages: vec![
                    Message {
                        id: Some("m1".into()),
                        userid: Some("U9".into()),
                        message: Some("where is my refund".into()),
                        ..Message::default()
                    },
                    Message {
                        id: Some("m2".into()),
                        userid: Some("A1".into()),
                        message: Some("on its way".into()),
                        ..Message::default()
                    },
                ],
                ..MessageGroup::default()
            },
            MessageGroup {
                id: Some("g2".into()),
                ..MessageGroup::default()
            },
        ];

        let rows = message_rows(&ticket(), &groups, &lookup());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["message_group_id"], json!("g1"));
        assert_eq!(rows[0]["sender_name"], json!("Bob"));
        assert_eq!(rows[1]["sender_type"], json!("Agent"));
        assert_eq!(rows[1]["receiver_name"], json!("Bob"));
        for row in &rows {
            assert_eq!(row["ticket_id"], json!("t1"));
            assert_eq!(row["tags"], json!("vip,refund"));
            assert_eq!(row["agent_name"], json!("Alice"));
            assert_eq!(row.len(), 21);
        }
    }

    #[test]
    fn ticket_without_id_has_no_context() {
        let row = json!({"subject": "orphan"});
        assert!(TicketContext::from_row(row.as_object().unwrap()).is_none());
    }
}
