//! Ticket posts.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::client::Client;
use crate::codec::{excerpt, to_bool, to_constant_opt, to_positive_int, to_string_or_null, to_timestamp};
use crate::entity::{Entity, FieldSpec, Relation, Requirement, Resource};
use crate::error::{KayakoError, Operation, Result};
use crate::identity::Identity;
use crate::models::common::LIST_ALL;
use crate::models::staff::Staff;
use crate::models::ticket::Ticket;
use crate::models::user::User;
use crate::result_set::ResultSet;
use crate::transport::{RequestData, WireMap};
use crate::wire_constants;

wire_constants! {
    /// Who wrote a post.
    pub enum PostCreatorType("TicketPost", "CREATOR") {
        /// A staff member.
        Staff = "1",
        /// A user.
        User = "2",
    }
}

/// Author of a new post.
#[derive(Debug, Clone)]
pub enum PostCreator {
    /// A staff member.
    Staff(Entity<Staff>),
    /// A user.
    User(Entity<User>),
}

/// A reply or message in a ticket thread.
#[derive(Debug, Clone, Default)]
pub struct TicketPost {
    id: Option<u64>,
    ticket: Relation<Ticket>,
    created: Option<DateTime<Utc>>,
    user_id: Option<u64>,
    staff_id: Option<u64>,
    creator_type: Option<PostCreatorType>,
    full_name: Option<String>,
    email: Option<String>,
    email_to: Option<String>,
    ip_address: Option<String>,
    has_attachments: Option<bool>,
    is_third_party: Option<bool>,
    is_html: Option<bool>,
    is_emailed: Option<bool>,
    is_survey_comment: Option<bool>,
    subject: Option<String>,
    contents: Option<String>,
}

impl Resource for TicketPost {
    const NAME: &'static str = "TicketPost";
    const CONTROLLER: &'static str = "/Tickets/TicketPost";
    const NODE: &'static str = "post";
    const FIELDS: &'static [FieldSpec<Self>] = &[
        FieldSpec {
            name: "ticket_id",
            wire: "ticketid",
            requirement: Requirement::Create,
            is_set: |p| p.ticket.id().is_some(),
        },
        FieldSpec {
            name: "contents",
            wire: "contents",
            requirement: Requirement::Create,
            is_set: |p| p.contents.is_some(),
        },
    ];

    fn parse(data: &WireMap) -> Result<Self> {
        Ok(TicketPost {
            id: to_positive_int(data.get("id")),
            ticket: Relation::new(to_positive_int(data.get("ticketid"))),
            created: to_timestamp(data.get("dateline")),
            user_id: to_positive_int(data.get("userid")),
            staff_id: to_positive_int(data.get("staffid")),
            creator_type: to_constant_opt(data.get("creator"))?,
            full_name: to_string_or_null(data.get("fullname")),
            email: to_string_or_null(data.get("email")),
            email_to: to_string_or_null(data.get("emailto")),
            ip_address: to_string_or_null(data.get("ipaddress")),
            has_attachments: to_bool(data.get("hasattachments")),
            is_third_party: to_bool(data.get("isthirdparty")),
            is_html: to_bool(data.get("ishtml")),
            is_emailed: to_bool(data.get("isemailed")),
            is_survey_comment: to_bool(data.get("issurveycomment")),
            subject: to_string_or_null(data.get("subject")),
            contents: to_string_or_null(data.get("contents")),
        })
    }

    fn build(&self, op: Operation) -> Result<RequestData> {
        let mut data = RequestData::new();
        data.put_u64("ticketid", self.ticket.id())
            .put_str("subject", self.subject.as_deref())
            .put_str("contents", self.contents.as_deref());
        match (self.creator_type, self.staff_id, self.user_id) {
            (Some(PostCreatorType::Staff), Some(staff_id), _) => {
                data.put_u64("staffid", Some(staff_id));
            }
            (Some(PostCreatorType::User), _, Some(user_id)) => {
                data.put_u64("userid", Some(user_id));
            }
            _ => return Err(KayakoError::missing_field("staffid", op)),
        }
        Ok(data)
    }

    fn identity(&self) -> Option<Identity> {
        Some(Identity::nested(&[self.ticket.id()?, self.id?]))
    }

    fn permits(op: Operation) -> bool {
        op != Operation::Update
    }

    fn invalidate_relations(&mut self) {
        self.ticket.invalidate();
    }
}

impl TicketPost {
    /// A new post in `ticket`.
    #[must_use]
    pub fn create_new(ticket: &Entity<Ticket>, creator: PostCreator, contents: impl Into<String>) -> Entity<TicketPost> {
        let mut post = TicketPost::default();
        post.ticket.set_id(ticket.identity().and_then(|id| id.own_id()));
        post.subject = ticket.subject().map(str::to_string);
        post.set_creator(creator).set_contents(contents);
        Entity::new(post)
    }

    /// Fetches one post of a ticket.
    pub async fn get(client: &Client, ticket_id: u64, id: u64) -> Result<Entity<TicketPost>> {
        Entity::fetch(client, &[ticket_id.to_string(), id.to_string()]).await
    }

    /// Fetches every post of a ticket.
    pub async fn get_all(client: &Client, ticket_id: u64) -> Result<ResultSet<TicketPost>> {
        Entity::fetch_all(client, &[LIST_ALL.to_string(), ticket_id.to_string()]).await
    }

    /// Server id.
    #[must_use]
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    /// Ticket id.
    #[must_use]
    pub fn ticket_id(&self) -> Option<u64> {
        self.ticket.id()
    }

    /// Ticket, fetched on first use.
    pub async fn ticket(&mut self, client: &Client, reload: bool) -> Result<Option<&Entity<Ticket>>> {
        self.ticket.resolve(client, reload).await
    }

    /// Posting time.
    #[must_use]
    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created
    }

    /// Author kind.
    #[must_use]
    pub fn creator_type(&self) -> Option<PostCreatorType> {
        self.creator_type
    }

    /// Sets the author.
    pub fn set_creator(&mut self, creator: PostCreator) -> &mut Self {
        match creator {
            PostCreator::Staff(staff) => {
                self.creator_type = Some(PostCreatorType::Staff);
                self.staff_id = staff.identity().and_then(|id| id.own_id());
                self.user_id = None;
                self.full_name = staff.full_name();
                self.email = staff.email().map(str::to_string);
            }
            PostCreator::User(user) => {
                self.creator_type = Some(PostCreatorType::User);
                self.user_id = user.identity().and_then(|id| id.own_id());
                self.staff_id = None;
                self.full_name = user.full_name().map(str::to_string);
                self.email = user.email().map(str::to_string);
            }
        }
        self
    }

    /// Author user id.
    #[must_use]
    pub fn user_id(&self) -> Option<u64> {
        self.user_id
    }

    /// Author staff id.
    #[must_use]
    pub fn staff_id(&self) -> Option<u64> {
        self.staff_id
    }

    /// Author name.
    #[must_use]
    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    /// Author email.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Recipient address of emailed posts.
    #[must_use]
    pub fn email_to(&self) -> Option<&str> {
        self.email_to.as_deref()
    }

    /// Author IP address.
    #[must_use]
    pub fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }

    /// Whether files are attached.
    #[must_use]
    pub fn has_attachments(&self) -> Option<bool> {
        self.has_attachments
    }

    /// Whether the author is neither the requester nor staff.
    #[must_use]
    pub fn is_third_party(&self) -> Option<bool> {
        self.is_third_party
    }

    /// Whether the contents are HTML.
    #[must_use]
    pub fn is_html(&self) -> Option<bool> {
        self.is_html
    }

    /// Whether the post arrived by email.
    #[must_use]
    pub fn is_emailed(&self) -> Option<bool> {
        self.is_emailed
    }

    /// Whether the post is a survey comment.
    #[must_use]
    pub fn is_survey_comment(&self) -> Option<bool> {
        self.is_survey_comment
    }

    /// Subject.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Sets the subject.
    pub fn set_subject(&mut self, subject: impl Into<String>) -> &mut Self {
        self.subject = Some(subject.into());
        self
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

impl fmt::Display for TicketPost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (author: {})",
            excerpt(self.contents.as_deref().unwrap_or_default(), 50),
            self.full_name.as_deref().unwrap_or_default()
        )
    }
}
