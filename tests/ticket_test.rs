#![allow(clippy::unwrap_used)]
// Tickets over a scripted transport: creation defaults, search, statistics.

mod common;

use pretty_assertions::assert_eq;
use serde_json::json;

use common::{client, department_node, departments, field, ScriptedTransport};
use kayako_client::models::{
    Department, DepartmentModule, Staff, Ticket, TicketCreator, TicketSearchArea, Visibility,
};
use kayako_client::{Entity, KayakoError};

fn ticket_node(id: u64, subject: &str) -> serde_json::Value {
    json!({
        "_attributes": { "id": id.to_string(), "flagtype": "0" },
        "_contents": "",
        "displayid": format!("ABC-{id}"),
        "departmentid": "4",
        "statusid": "1",
        "priorityid": "2",
        "typeid": "3",
        "userid": "8",
        "fullname": "Jan Nowak",
        "email": "jan@example.com",
        "subject": subject,
        "creator": "2"
    })
}

#[tokio::test]
async fn test_create_applies_configured_defaults() {
    let transport = ScriptedTransport::new();
    let client = client(&transport);
    transport.respond(json!({ "ticket": ticket_node(42, "Printer on fire") }));
    let department: Entity<Department> = Entity::from_wire(&department_node(4, "Sales")).unwrap();

    let mut ticket = Ticket::create_new(
        &client,
        &department,
        TicketCreator::Auto {
            full_name: "Jan Nowak".into(),
            email: "jan@example.com".into(),
        },
        "It is smoking.",
        "Printer on fire",
    );
    ticket.create(&client).await.unwrap();

    let call = &transport.calls()[0];
    assert_eq!(call.controller, "/Tickets/Ticket");
    assert_eq!(field(call, "departmentid"), Some("4"));
    assert_eq!(field(call, "ticketstatusid"), Some("1"));
    assert_eq!(field(call, "ticketpriorityid"), Some("2"));
    assert_eq!(field(call, "tickettypeid"), Some("3"));
    assert_eq!(field(call, "autouserid"), Some("1"));
    assert_eq!(field(call, "contents"), Some("It is smoking."));
    assert_eq!(ticket.id(), Some(42));
    assert_eq!(ticket.to_string(), "ABC-42 Printer on fire (creator: Jan Nowak)");
}

#[tokio::test]
async fn test_update_sends_user_instead_of_creator() {
    let transport = ScriptedTransport::new();
    let client = client(&transport);
    transport
        .respond(json!({ "ticket": ticket_node(42, "Printer on fire") }))
        .respond(json!({ "ticket": ticket_node(42, "Printer fixed") }));

    let mut ticket = Ticket::get(&client, 42).await.unwrap();
    ticket.set_subject("Printer fixed");
    ticket.update(&client).await.unwrap();

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].method, "PUT");
    assert_eq!(calls[1].params, vec!["42".to_string()]);
    assert_eq!(field(&calls[1], "userid"), Some("8"));
    assert_eq!(field(&calls[1], "autouserid"), None);
    assert_eq!(ticket.subject(), Some("Printer fixed"));
}

#[tokio::test]
async fn test_get_all_builds_filter_params() {
    let transport = ScriptedTransport::new();
    let client = client(&transport);
    transport.respond(json!({ "ticket": [ticket_node(1, "a"), ticket_node(2, "b")] }));

    let none: &[u64] = &[];
    let tickets = Ticket::get_all(&client, &[4u64, 5], none, &[7u64], none, Default::default())
        .await
        .unwrap();

    assert_eq!(tickets.len(), 2);
    assert_eq!(
        transport.calls()[0].params,
        vec!["ListAll", "4,5", "-1", "7", "-1"]
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_get_all_takes_fetched_objects_as_filters() {
    let transport = ScriptedTransport::new();
    let client = client(&transport);
    transport
        .respond(departments(vec![department_node(4, "Sales"), department_node(5, "Billing")]))
        .respond(json!({ "ticket": ticket_node(1, "a") }));

    let all_departments = Department::get_all(&client).await.unwrap();
    let owner: Entity<Staff> =
        Entity::from_wire(&json!({ "id": "7", "firstname": "Jane", "lastname": "Admin" })).unwrap();
    let none: &[u64] = &[];

    let tickets =
        Ticket::get_all(&client, &all_departments, &[1u64], &owner, none, Default::default())
            .await
            .unwrap();

    assert_eq!(tickets.len(), 1);
    assert_eq!(
        transport.calls()[1].params,
        vec!["ListAll", "4,5", "1", "7", "-1"]
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_get_all_with_unsaved_department_is_rejected() {
    let transport = ScriptedTransport::new();
    let client = client(&transport);
    let draft = Department::create_new("Draft", Visibility::Public, DepartmentModule::Tickets);
    let none: &[u64] = &[];

    let err = Ticket::get_all(&client, &draft, none, none, none, Default::default())
        .await
        .unwrap_err();

    assert!(matches!(err, KayakoError::Validation(_)));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_search_posts_query_and_areas() {
    let transport = ScriptedTransport::new();
    let client = client(&transport);
    transport.respond(json!({ "ticket": ticket_node(42, "Printer on fire") }));

    let found = Ticket::search(
        &client,
        "printer",
        &[TicketSearchArea::Contents, TicketSearchArea::Tags],
    )
    .await
    .unwrap();

    assert_eq!(found.len(), 1);
    let call = &transport.calls()[0];
    assert_eq!(call.method, "POST");
    assert_eq!(call.controller, "/Tickets/TicketSearch");
    assert_eq!(field(call, "query"), Some("printer"));
    assert_eq!(field(call, "contents"), Some("1"));
    assert_eq!(field(call, "tags"), Some("1"));
    assert_eq!(field(call, "notes"), None);
}

#[tokio::test]
async fn test_statistics_are_cached_per_client() {
    let transport = ScriptedTransport::new();
    let client = client(&transport);
    let counts = json!({
        "departments": {
            "department": {
                "_attributes": { "id": "4" },
                "_contents": "",
                "lastactivity": "0",
                "totalitems": "12",
                "totalunresolveditems": "3"
            }
        }
    });
    transport.respond(counts.clone()).respond(counts);

    let first = Ticket::statistics(&client, false).await.unwrap();
    let second = Ticket::statistics(&client, false).await.unwrap();
    assert_eq!(first.total_items(), 12);
    assert_eq!(second.total_items(), 12);
    assert_eq!(transport.call_count(), 1);

    Ticket::statistics(&client, true).await.unwrap();
    assert_eq!(transport.call_count(), 2);

    client.clear_statistics();
    assert!(client.cached_statistics().is_none());
}
