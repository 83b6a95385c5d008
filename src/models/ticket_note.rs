//! Notes attached to tickets, users and user organizations.
//!
//! Notes are listed and created through the ticket note controller, so only
//! notes of type `ticket` can be created or deleted here. Notes of the other
//! types arrive embedded in their owners.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::client::Client;
use crate::codec::{
    excerpt, format_timestamp, node_attribute, to_constant_opt, to_positive_int,
    to_string_or_null, to_timestamp, ConstantSet, CONTENTS_KEY,
};
use crate::entity::{Entity, FieldSpec, Relation, Requirement, Resource};
use crate::error::{KayakoError, Operation, Result};
use crate::identity::Identity;
use crate::models::common::{NoteColor, LIST_ALL};
use crate::models::staff::Staff;
use crate::models::ticket::Ticket;
use crate::models::user::{User, UserOrganization};
use crate::result_set::ResultSet;
use crate::transport::{RequestData, WireMap};
use crate::wire_constants;

wire_constants! {
    /// What a note is attached to.
    pub enum NoteType("TicketNote", "TYPE") {
        /// A ticket.
        Ticket = "ticket",
        /// A user.
        User = "user",
        /// A user organization.
        UserOrganization = "userorganization",
    }
}

/// Ids of the objects a note may be attached to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoteOwnerIds {
    /// Ticket id.
    pub ticket: Option<u64>,
    /// User id.
    pub user: Option<u64>,
    /// User organization id.
    pub user_organization: Option<u64>,
}

/// Who wrote a note.
#[derive(Debug, Clone)]
pub enum NoteCreator {
    /// A staff member; its id and full name are taken.
    Staff(Entity<Staff>),
    /// A staff id only.
    StaffId(u64),
    /// A free-form name, used when no staff id is known.
    Name(String),
}

/// A note.
#[derive(Debug, Clone)]
pub struct TicketNote {
    id: Option<u64>,
    note_type: Option<NoteType>,
    ticket: Relation<Ticket>,
    user: Relation<User>,
    user_organization: Relation<UserOrganization>,
    note_color: Option<NoteColor>,
    creator_staff: Relation<Staff>,
    creator_staff_name: Option<String>,
    for_staff: Relation<Staff>,
    creation_date: Option<DateTime<Utc>>,
    contents: Option<String>,
}

impl Default for TicketNote {
    fn default() -> Self {
        Self {
            id: None,
            note_type: Some(NoteType::Ticket),
            ticket: Relation::default(),
            user: Relation::default(),
            user_organization: Relation::default(),
            note_color: None,
            creator_staff: Relation::default(),
            creator_staff_name: None,
            for_staff: Relation::default(),
            creation_date: None,
            contents: None,
        }
    }
}

impl Resource for TicketNote {
    const NAME: &'static str = "TicketNote";
    const CONTROLLER: &'static str = "/Tickets/TicketNote";
    const NODE: &'static str = "note";
    const FIELDS: &'static [FieldSpec<Self>] = &[
        FieldSpec {
            name: "ticket_id",
            wire: "ticketid",
            requirement: Requirement::Create,
            is_set: |n| n.ticket.id().is_some(),
        },
        FieldSpec {
            name: "contents",
            wire: "contents",
            requirement: Requirement::Create,
            is_set: |n| n.contents.as_deref().is_some_and(|c| !c.is_empty()),
        },
    ];

    fn parse(data: &WireMap) -> Result<Self> {
        let attr = |name| node_attribute(data, name);
        let note_type: Option<NoteType> = to_constant_opt(attr("type"))?;

        let mut note = TicketNote {
            id: to_positive_int(attr("id")),
            note_type,
            note_color: to_constant_opt(attr("notecolor"))?,
            creator_staff: Relation::new(to_positive_int(attr("creatorstaffid"))),
            creator_staff_name: to_string_or_null(attr("creatorstaffname")),
            for_staff: Relation::new(to_positive_int(attr("forstaffid"))),
            creation_date: to_timestamp(attr("creationdate")),
            contents: to_string_or_null(data.get(CONTENTS_KEY)),
            ..TicketNote::default()
        };
        match note_type {
            Some(NoteType::Ticket) | None => note.ticket.set_id(to_positive_int(attr("ticketid"))),
            Some(NoteType::User) => note.user.set_id(to_positive_int(attr("userid"))),
            Some(NoteType::UserOrganization) => note
                .user_organization
                .set_id(to_positive_int(attr("userorganizationid"))),
        }
        Ok(note)
    }

    fn build(&self, op: Operation) -> Result<RequestData> {
        let mut data = RequestData::new();
        data.put_u64("ticketid", self.ticket.id())
            .put_str("notecolor", self.note_color.map(|c| c.wire_value()));

        if let Some(staff_id) = self.creator_staff.id() {
            data.put_u64("staffid", Some(staff_id));
        } else if let Some(name) = self.creator_staff_name.as_deref().filter(|n| !n.is_empty()) {
            data.put_str("fullname", Some(name));
        } else {
            return Err(KayakoError::missing_field("staffid", op));
        }

        data.put_u64("forstaffid", self.for_staff.id())
            .put_str("contents", self.contents.as_deref());
        Ok(data)
    }

    fn identity(&self) -> Option<Identity> {
        TicketNote::identity_for(self.note_type, self.owner_ids(), self.id)
    }

    fn permits(op: Operation) -> bool {
        op != Operation::Update
    }

    fn check_instance(&self, op: Operation) -> Result<()> {
        if matches!(op, Operation::Create | Operation::Delete)
            && self.note_type != Some(NoteType::Ticket)
        {
            return Err(KayakoError::illegal_state(format!(
                "you can only {} notes of type \"ticket\"",
                op
            )));
        }
        Ok(())
    }

    fn invalidate_relations(&mut self) {
        self.ticket.invalidate();
        self.user.invalidate();
        self.user_organization.invalidate();
        self.creator_staff.invalidate();
        self.for_staff.invalidate();
    }
}

impl TicketNote {
    /// Identity of a note: the id of the object it is attached to, then its own id.
    ///
    /// The owner id is chosen by `note_type`; notes without a type are
    /// treated as ticket notes.
    #[must_use]
    pub fn identity_for(
        note_type: Option<NoteType>,
        owners: NoteOwnerIds,
        id: Option<u64>,
    ) -> Option<Identity> {
        let owner = match note_type {
            Some(NoteType::Ticket) | None => owners.ticket,
            Some(NoteType::User) => owners.user,
            Some(NoteType::UserOrganization) => owners.user_organization,
        };
        Some(Identity::nested(&[owner?, id?]))
    }

    /// A new ticket note written by `creator`.
    #[must_use]
    pub fn create_new(
        ticket: &Entity<Ticket>,
        creator: &Entity<Staff>,
        contents: impl Into<String>,
    ) -> Entity<TicketNote> {
        let mut note = TicketNote::default();
        note.set_ticket_id(ticket.identity().and_then(|id| id.own_id()))
            .set_creator(NoteCreator::Staff(creator.clone()))
            .set_contents(contents);
        Entity::new(note)
    }

    /// Fetches one note of a ticket.
    pub async fn get(client: &Client, ticket_id: u64, id: u64) -> Result<Entity<TicketNote>> {
        Entity::fetch(client, &[ticket_id.to_string(), id.to_string()]).await
    }

    /// Fetches every note of a ticket.
    pub async fn get_all(client: &Client, ticket_id: u64) -> Result<ResultSet<TicketNote>> {
        Entity::fetch_all(client, &[LIST_ALL.to_string(), ticket_id.to_string()]).await
    }

    /// Server id.
    #[must_use]
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    /// What the note is attached to.
    #[must_use]
    pub fn note_type(&self) -> Option<NoteType> {
        self.note_type
    }

    /// Ids of the possible owners.
    #[must_use]
    pub fn owner_ids(&self) -> NoteOwnerIds {
        NoteOwnerIds {
            ticket: self.ticket.id(),
            user: self.user.id(),
            user_organization: self.user_organization.id(),
        }
    }

    /// Ticket id, for ticket notes.
    #[must_use]
    pub fn ticket_id(&self) -> Option<u64> {
        self.ticket.id()
    }

    /// Attaches the note to a ticket; `None` leaves it without a type.
    pub fn set_ticket_id(&mut self, ticket_id: Option<u64>) -> &mut Self {
        self.ticket.set_id(ticket_id);
        self.note_type = ticket_id.map(|_| NoteType::Ticket);
        self
    }

    /// Ticket, fetched on first use.
    pub async fn ticket(&mut self, client: &Client, reload: bool) -> Result<Option<&Entity<Ticket>>> {
        self.ticket.resolve(client, reload).await
    }

    /// Attaches the note to a ticket.
    pub fn set_ticket(&mut self, ticket: Option<Entity<Ticket>>) -> &mut Self {
        self.note_type = ticket.as_ref().map(|_| NoteType::Ticket);
        self.ticket.set(ticket);
        self
    }

    /// User id, for user notes.
    #[must_use]
    pub fn user_id(&self) -> Option<u64> {
        self.user.id()
    }

    /// User, fetched on first use.
    pub async fn user(&mut self, client: &Client, reload: bool) -> Result<Option<&Entity<User>>> {
        self.user.resolve(client, reload).await
    }

    /// Organization id, for organization notes.
    #[must_use]
    pub fn user_organization_id(&self) -> Option<u64> {
        self.user_organization.id()
    }

    /// Organization, fetched on first use.
    pub async fn user_organization(
        &mut self,
        client: &Client,
        reload: bool,
    ) -> Result<Option<&Entity<UserOrganization>>> {
        self.user_organization.resolve(client, reload).await
    }

    /// Color.
    #[must_use]
    pub fn note_color(&self) -> Option<NoteColor> {
        self.note_color
    }

    /// Sets the color.
    pub fn set_note_color(&mut self, color: Option<NoteColor>) -> &mut Self {
        self.note_color = color;
        self
    }

    /// Author staff id.
    #[must_use]
    pub fn creator_staff_id(&self) -> Option<u64> {
        self.creator_staff.id()
    }

    /// Author, fetched on first use.
    pub async fn creator_staff(&mut self, client: &Client, reload: bool) -> Result<Option<&Entity<Staff>>> {
        self.creator_staff.resolve(client, reload).await
    }

    /// Author name.
    #[must_use]
    pub fn creator_name(&self) -> Option<&str> {
        self.creator_staff_name.as_deref()
    }

    /// Sets the author.
    pub fn set_creator(&mut self, creator: NoteCreator) -> &mut Self {
        match creator {
            NoteCreator::Staff(staff) => {
                self.creator_staff_name = staff.full_name();
                self.creator_staff.set(Some(staff));
            }
            NoteCreator::StaffId(id) => {
                self.creator_staff.set_id(Some(id));
                self.creator_staff_name = None;
            }
            NoteCreator::Name(name) => {
                self.creator_staff.set(None);
                self.creator_staff_name = Some(name).filter(|n| !n.is_empty());
            }
        }
        self
    }

    /// Staff member the note is addressed to.
    #[must_use]
    pub fn for_staff_id(&self) -> Option<u64> {
        self.for_staff.id()
    }

    /// Sets the addressee id.
    pub fn set_for_staff_id(&mut self, id: Option<u64>) -> &mut Self {
        self.for_staff.set_id(id);
        self
    }

    /// Addressee, fetched on first use.
    pub async fn for_staff(&mut self, client: &Client, reload: bool) -> Result<Option<&Entity<Staff>>> {
        self.for_staff.resolve(client, reload).await
    }

    /// Sets the addressee.
    pub fn set_for_staff(&mut self, staff: Option<Entity<Staff>>) -> &mut Self {
        self.for_staff.set(staff);
        self
    }

    /// Creation time.
    #[must_use]
    pub fn creation_date(&self) -> Option<DateTime<Utc>> {
        self.creation_date
    }

    /// Creation time formatted with `format`, or the configured datetime format.
    #[must_use]
    pub fn creation_date_formatted(&self, client: &Client, format: Option<&str>) -> Option<String> {
        format_timestamp(
            self.creation_date,
            format.unwrap_or(client.config().datetime_format.as_str()),
        )
    }

    /// Text.
    #[must_use]
    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }

    /// Sets the text.
    pub fn set_contents(&mut self, contents: impl Into<String>) -> &mut Self {
        self.contents = Some(contents.into());
        self
    }
}

impl fmt::Display for TicketNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (type: {})",
            excerpt(self.contents.as_deref().unwrap_or_default(), 50),
            self.note_type.map(|t| t.wire_value()).unwrap_or_default()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_build_for_ticket_note() {
        let mut note = TicketNote::default();
        note.set_ticket_id(Some(42))
            .set_creator(NoteCreator::StaffId(7))
            .set_contents("hello");

        crate::entity::check_required_fields(&note, Operation::Create).unwrap();
        let data = note.build(Operation::Create).unwrap();
        assert_eq!(data.scalar("ticketid"), Some("42"));
        assert_eq!(data.scalar("staffid"), Some("7"));
        assert_eq!(data.scalar("contents"), Some("hello"));
        assert!(!data.contains("fullname"));
    }

    #[test]
    fn test_missing_ticket_id() {
        let mut note = TicketNote::default();
        note.set_creator(NoteCreator::StaffId(7)).set_contents("hello");

        let err = crate::entity::check_required_fields(&note, Operation::Create).unwrap_err();
        assert!(matches!(
            err,
            KayakoError::MissingRequiredField { ref field, operation: Operation::Create } if field == "ticketid"
        ));
    }

    #[test]
    fn test_name_creator_is_sent_as_fullname() {
        let mut note = TicketNote::default();
        note.set_ticket_id(Some(42))
            .set_creator(NoteCreator::Name("Front desk".into()))
            .set_contents("hello");
        let data = note.build(Operation::Create).unwrap();
        assert_eq!(data.scalar("fullname"), Some("Front desk"));
        assert!(!data.contains("staffid"));
    }

    #[test]
    fn test_creator_is_required() {
        let mut note = TicketNote::default();
        note.set_ticket_id(Some(42)).set_contents("hello");
        assert!(matches!(
            note.build(Operation::Create),
            Err(KayakoError::MissingRequiredField { .. })
        ));
    }

    #[test]
    fn test_identity_follows_note_type() {
        let owners = NoteOwnerIds {
            ticket: Some(1),
            user: Some(2),
            user_organization: Some(3),
        };
        assert_eq!(
            TicketNote::identity_for(Some(NoteType::Ticket), owners, Some(9)),
            Some(Identity::nested(&[1, 9]))
        );
        assert_eq!(
            TicketNote::identity_for(Some(NoteType::User), owners, Some(9)),
            Some(Identity::nested(&[2, 9]))
        );
        assert_eq!(
            TicketNote::identity_for(Some(NoteType::UserOrganization), owners, Some(9)),
            Some(Identity::nested(&[3, 9]))
        );
        assert_eq!(
            TicketNote::identity_for(Some(NoteType::User), NoteOwnerIds::default(), Some(9)),
            None
        );
    }

    #[test]
    fn test_parse_user_note() {
        let note = Entity::<TicketNote>::from_wire(&json!({
            "_attributes": {
                "id": "5",
                "type": "user",
                "userid": "12",
                "notecolor": "2",
                "creatorstaffid": "1",
                "creatorstaffname": "Ann Lee",
                "creationdate": "1300000000"
            },
            "_contents": "Prefers phone calls"
        }))
        .unwrap();
        assert_eq!(note.note_type(), Some(NoteType::User));
        assert_eq!(note.user_id(), Some(12));
        assert_eq!(note.ticket_id(), None);
        assert_eq!(note.identity(), Some(Identity::nested(&[12, 5])));
        assert_eq!(note.note_color(), Some(NoteColor::Purple));
        assert_eq!(note.to_string(), "Prefers phone calls (type: user)");
    }

    #[test]
    fn test_only_ticket_notes_are_deletable() {
        let note = Entity::<TicketNote>::from_wire(&json!({
            "_attributes": { "id": "5", "type": "user", "userid": "12" },
            "_contents": "x"
        }))
        .unwrap();
        assert!(note.check_instance(Operation::Delete).is_err());
        assert!(!TicketNote::permits(Operation::Update));
    }

    #[test]
    fn test_long_contents_are_shortened() {
        let mut note = TicketNote::default();
        note.set_contents("a".repeat(60));
        assert_eq!(note.to_string(), format!("{}... (type: ticket)", "a".repeat(50)));
    }
}
