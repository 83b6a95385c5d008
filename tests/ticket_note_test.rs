#![allow(clippy::unwrap_used)]
// Ticket notes: payloads, listings and lazy loading from a ticket.

mod common;

use pretty_assertions::assert_eq;
use serde_json::json;

use common::{client, field, ticket_note_node, ScriptedTransport};
use kayako_client::models::{NoteColor, NoteCreator, NoteType, Ticket, TicketNote};
use kayako_client::{Entity, Identity, KayakoError, Operation, Resource};

fn note(ticket_id: Option<u64>) -> Entity<TicketNote> {
    let mut note = TicketNote::default();
    note.set_ticket_id(ticket_id)
        .set_creator(NoteCreator::StaffId(7))
        .set_contents("hello");
    Entity::new(note)
}

#[test]
fn test_create_payload() {
    let note = note(Some(42));

    let data = note.build(Operation::Create).unwrap();

    assert_eq!(data.scalar("ticketid"), Some("42"));
    assert_eq!(data.scalar("staffid"), Some("7"));
    assert_eq!(data.scalar("contents"), Some("hello"));
    assert!(!data.contains("fullname"));
}

#[tokio::test]
async fn test_create_without_ticket_fails_before_sending() {
    let transport = ScriptedTransport::new();
    let client = client(&transport);
    let mut note = note(None);

    let err = note.create(&client).await.unwrap_err();

    match err {
        KayakoError::MissingRequiredField { field, operation } => {
            assert_eq!(field, "ticketid");
            assert_eq!(operation, Operation::Create);
        }
        other => panic!("expected MissingRequiredField, got {other:?}"),
    }
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_create_posts_and_reads_back() {
    let transport = ScriptedTransport::new();
    let client = client(&transport);
    transport.respond(json!({ "note": ticket_note_node(42, 15, "hello") }));
    let mut note = note(Some(42));
    note.set_note_color(Some(NoteColor::Green));

    note.create(&client).await.unwrap();

    let call = &transport.calls()[0];
    assert_eq!(call.method, "POST");
    assert_eq!(call.controller, "/Tickets/TicketNote");
    assert_eq!(field(call, "notecolor"), Some("4"));
    assert_eq!(note.identity(), Some(Identity::nested(&[42, 15])));
    assert_eq!(note.creator_name(), Some("Jane Admin"));
}

#[tokio::test]
async fn test_get_all_keeps_server_order() {
    let transport = ScriptedTransport::new();
    let client = client(&transport);
    transport.respond(json!({
        "note": [
            ticket_note_node(42, 1, "first"),
            ticket_note_node(42, 2, "second"),
            ticket_note_node(42, 3, "third")
        ]
    }));

    let notes = TicketNote::get_all(&client, 42).await.unwrap();

    assert_eq!(notes.len(), 3);
    assert_eq!(notes.first().unwrap().contents(), Some("first"));
    assert_eq!(notes.to_list()[2].contents(), Some("third"));
    assert_eq!(notes.at(1).unwrap().id(), Some(2));
    assert!(notes.at(3).is_none());
    assert_eq!(
        notes.collect_ids(),
        vec![
            Identity::nested(&[42, 1]),
            Identity::nested(&[42, 2]),
            Identity::nested(&[42, 3]),
        ]
    );
    assert_eq!(
        transport.calls()[0].params,
        vec!["ListAll".to_string(), "42".to_string()]
    );
}

#[tokio::test]
async fn test_single_note_listing_is_a_list_of_one() {
    let transport = ScriptedTransport::new();
    let client = client(&transport);
    transport.respond(json!({ "note": ticket_note_node(42, 1, "only") }));

    let notes = TicketNote::get_all(&client, 42).await.unwrap();

    assert_eq!(notes.len(), 1);
    assert_eq!(notes.first().unwrap().note_type(), Some(NoteType::Ticket));
}

#[tokio::test]
async fn test_empty_listing_is_empty_set() {
    let transport = ScriptedTransport::new();
    let client = client(&transport);

    let notes = TicketNote::get_all(&client, 42).await.unwrap();

    assert!(notes.is_empty());
    assert!(notes.first().is_none());
}

#[tokio::test]
async fn test_ticket_notes_are_loaded_once() {
    let transport = ScriptedTransport::new();
    let client = client(&transport);
    transport
        .respond(json!({
            "ticket": {
                "_attributes": { "id": "42" },
                "_contents": "",
                "subject": "Printer on fire"
            }
        }))
        .respond(json!({ "note": [ticket_note_node(42, 1, "a"), ticket_note_node(42, 2, "b")] }));

    let mut ticket = Ticket::get(&client, 42).await.unwrap();
    assert_eq!(ticket.notes(&client, false).await.unwrap().len(), 2);
    assert_eq!(ticket.notes(&client, false).await.unwrap().len(), 2);

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].controller, "/Tickets/TicketNote");
}

#[test]
fn test_identity_follows_note_type() {
    let owners = kayako_client::models::NoteOwnerIds {
        ticket: Some(42),
        user: Some(8),
        user_organization: Some(3),
    };

    assert_eq!(
        TicketNote::identity_for(Some(NoteType::Ticket), owners, Some(1)),
        Some(Identity::nested(&[42, 1]))
    );
    assert_eq!(
        TicketNote::identity_for(Some(NoteType::User), owners, Some(1)),
        Some(Identity::nested(&[8, 1]))
    );
    assert_eq!(
        TicketNote::identity_for(Some(NoteType::UserOrganization), owners, Some(1)),
        Some(Identity::nested(&[3, 1]))
    );
    assert_eq!(TicketNote::identity_for(Some(NoteType::User), owners, None), None);
}
