//! Tickets.
//!
//! A ticket response embeds its notes, time tracks and posts. They are kept
//! as the initial contents of the child collections, so reading them does
//! not cost another request until a reload is asked for.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::client::Client;
use crate::codec::{
    as_list, attribute, format_timestamp, node_attribute, scalar_text, to_bool, to_constant_opt,
    to_int, to_positive_int, to_string_or_null, to_timestamp, ConstantSet,
};
use crate::entity::{Entity, FieldSpec, Relation, Requirement, Resource};
use crate::error::{KayakoError, Operation, Result};
use crate::identity::Identity;
use crate::models::common::{id_filter, Paging, LIST_ALL};
use crate::models::custom_field::{CustomFieldGroup, HasCustomFields, TicketFields};
use crate::models::department::Department;
use crate::models::post::{PostCreator, TicketPost};
use crate::models::staff::Staff;
use crate::models::statistics::{TicketStatistics, STATISTICS_CONTROLLER};
use crate::models::ticket_lookup::{TicketPriority, TicketStatus, TicketType};
use crate::models::ticket_note::TicketNote;
use crate::models::time_track::TicketTimeTrack;
use crate::models::user::{User, UserOrganization};
use crate::result_set::{IdSource, ResultSet};
use crate::transport::{RequestData, WireData, WireMap};
use crate::wire_constants;

/// Controller answering ticket searches.
pub const SEARCH_CONTROLLER: &str = "/Tickets/TicketSearch";

wire_constants! {
    /// Flag set on a ticket.
    pub enum TicketFlag("Ticket", "FLAG") {
        /// No flag.
        Unflagged = "0",
        /// Purple.
        Purple = "1",
        /// Orange.
        Orange = "2",
        /// Green.
        Green = "3",
        /// Yellow.
        Yellow = "4",
        /// Red.
        Red = "5",
        /// Blue.
        Blue = "6",
    }
}

wire_constants! {
    /// Who opened a ticket.
    pub enum TicketCreatorType("Ticket", "CREATOR") {
        /// A user created by the server from name and email.
        Auto = "0",
        /// A staff member.
        Staff = "1",
        /// A user.
        User = "2",
    }
}

wire_constants! {
    /// Channel a ticket was opened through.
    pub enum TicketCreationMode("Ticket", "CREATION_MODE") {
        /// Support center.
        SupportCenter = "1",
        /// Staff control panel.
        StaffCp = "2",
        /// Email.
        Email = "3",
        /// REST API.
        Api = "4",
        /// Site badge.
        SiteBadge = "5",
    }
}

wire_constants! {
    /// Kind of a new ticket.
    pub enum TicketCreationType("Ticket", "CREATION_TYPE") {
        /// Regular ticket.
        Default = "default",
        /// Phone call.
        Phone = "phone",
    }
}

wire_constants! {
    /// Where a ticket search looks for the query.
    pub enum TicketSearchArea("Ticket", "SEARCH") {
        /// Ticket id or display id.
        TicketId = "ticketid",
        /// Post contents.
        Contents = "contents",
        /// Author name.
        Author = "author",
        /// Any email address.
        Email = "email",
        /// Creator email address.
        CreatorEmail = "creatoremail",
        /// Creator full name.
        FullName = "fullname",
        /// Ticket notes.
        Notes = "notes",
        /// User group title.
        UserGroup = "usergroup",
        /// User organization name.
        UserOrganization = "userorganization",
        /// User name.
        User = "user",
        /// Tags.
        Tags = "tags",
    }
}

/// Creator of a new ticket.
///
/// Id variants only store the id; name and email stay as they are.
#[derive(Debug, Clone)]
pub enum TicketCreator {
    /// A staff member; name and email are copied.
    Staff(Entity<Staff>),
    /// A user; name and email are copied.
    User(Entity<User>),
    /// A staff member by id.
    StaffId(u64),
    /// A user by id.
    UserId(u64),
    /// A user the server looks up or creates from name and email.
    Auto {
        /// Full name.
        full_name: String,
        /// Email address.
        email: String,
    },
}

/// A staff member watching a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketWatcher {
    /// Staff id.
    pub staff_id: Option<u64>,
    /// Staff name.
    pub name: Option<String>,
}

/// A workflow available for a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketWorkflow {
    /// Workflow id.
    pub id: Option<u64>,
    /// Workflow title.
    pub title: Option<String>,
}

/// A ticket.
#[derive(Debug, Clone, Default)]
pub struct Ticket {
    id: Option<u64>,
    flag_type: Option<TicketFlag>,
    display_id: Option<String>,
    department: Relation<Department>,
    status: Relation<TicketStatus>,
    priority: Relation<TicketPriority>,
    ticket_type: Relation<TicketType>,
    user: Relation<User>,
    user_organization_name: Option<String>,
    user_organization: Relation<UserOrganization>,
    owner_staff: Relation<Staff>,
    owner_staff_name: Option<String>,
    staff: Relation<Staff>,
    full_name: Option<String>,
    email: Option<String>,
    last_replier: Option<String>,
    subject: Option<String>,
    creation_time: Option<DateTime<Utc>>,
    last_activity: Option<DateTime<Utc>>,
    last_staff_reply: Option<DateTime<Utc>>,
    last_user_reply: Option<DateTime<Utc>>,
    sla_plan_id: Option<u64>,
    next_reply_due: Option<DateTime<Utc>>,
    resolution_due: Option<DateTime<Utc>>,
    replies: Option<i64>,
    ip_address: Option<String>,
    creator_type: Option<TicketCreatorType>,
    creation_mode: Option<TicketCreationMode>,
    creation_type: Option<TicketCreationType>,
    is_escalated: Option<bool>,
    escalation_rule_id: Option<u64>,
    template_group_id: Option<u64>,
    template_group_name: Option<String>,
    tags: Option<String>,
    watchers: Vec<TicketWatcher>,
    workflows: Vec<TicketWorkflow>,
    contents: Option<String>,
    ignore_auto_responder: Option<bool>,
    auto_create_user: bool,
    notes: Option<ResultSet<TicketNote>>,
    time_tracks: Option<ResultSet<TicketTimeTrack>>,
    posts: Option<ResultSet<TicketPost>>,
    custom_fields: Option<ResultSet<CustomFieldGroup<TicketFields>>>,
}

#[async_trait]
impl Resource for Ticket {
    const NAME: &'static str = "Ticket";
    const CONTROLLER: &'static str = "/Tickets/Ticket";
    const NODE: &'static str = "ticket";
    const FIELDS: &'static [FieldSpec<Self>] = &[
        FieldSpec {
            name: "department_id",
            wire: "departmentid",
            requirement: Requirement::Create,
            is_set: |t| t.department.id().is_some(),
        },
        FieldSpec {
            name: "status_id",
            wire: "ticketstatusid",
            requirement: Requirement::Create,
            is_set: |t| t.status.id().is_some(),
        },
        FieldSpec {
            name: "priority_id",
            wire: "ticketpriorityid",
            requirement: Requirement::Create,
            is_set: |t| t.priority.id().is_some(),
        },
        FieldSpec {
            name: "type_id",
            wire: "tickettypeid",
            requirement: Requirement::Create,
            is_set: |t| t.ticket_type.id().is_some(),
        },
        FieldSpec {
            name: "full_name",
            wire: "fullname",
            requirement: Requirement::Create,
            is_set: |t| t.full_name.is_some(),
        },
        FieldSpec {
            name: "email",
            wire: "email",
            requirement: Requirement::Create,
            is_set: |t| t.email.is_some(),
        },
        FieldSpec {
            name: "subject",
            wire: "subject",
            requirement: Requirement::Create,
            is_set: |t| t.subject.is_some(),
        },
        FieldSpec {
            name: "contents",
            wire: "contents",
            requirement: Requirement::Create,
            is_set: |t| t.contents.is_some(),
        },
    ];

    fn parse(data: &WireMap) -> Result<Self> {
        let id = to_positive_int(node_attribute(data, "id"));
        let template_group_id = to_positive_int(data.get("templategroupid"));

        let mut ticket = Ticket {
            id,
            flag_type: to_constant_opt(node_attribute(data, "flagtype"))?,
            display_id: to_string_or_null(data.get("displayid")),
            department: Relation::new(to_positive_int(data.get("departmentid"))),
            status: Relation::new(to_positive_int(data.get("statusid"))),
            priority: Relation::new(to_positive_int(data.get("priorityid"))),
            ticket_type: Relation::new(to_positive_int(data.get("typeid"))),
            user: Relation::new(to_positive_int(data.get("userid"))),
            user_organization_name: to_string_or_null(data.get("userorganization")),
            user_organization: Relation::new(to_positive_int(data.get("userorganizationid"))),
            owner_staff: Relation::new(to_positive_int(data.get("ownerstaffid"))),
            owner_staff_name: to_string_or_null(data.get("ownerstaffname")),
            full_name: to_string_or_null(data.get("fullname")),
            email: to_string_or_null(data.get("email")),
            last_replier: to_string_or_null(data.get("lastreplier")),
            subject: to_string_or_null(data.get("subject")),
            creation_time: to_timestamp(data.get("creationtime")),
            last_activity: to_timestamp(data.get("lastactivity")),
            last_staff_reply: to_timestamp(data.get("laststaffreply")),
            last_user_reply: to_timestamp(data.get("lastuserreply")),
            sla_plan_id: to_positive_int(data.get("slaplanid")),
            next_reply_due: to_timestamp(data.get("nextreplydue")),
            resolution_due: to_timestamp(data.get("resolutiondue")),
            replies: to_int(data.get("replies"), Some(0)),
            ip_address: to_string_or_null(data.get("ipaddress")),
            creator_type: to_constant_opt(data.get("creator"))?,
            creation_mode: to_constant_opt(data.get("creationmode"))?,
            // Older servers report the creation type as a number.
            creation_type: to_constant_opt(data.get("creationtype")).unwrap_or(None),
            is_escalated: to_bool(data.get("isescalated")),
            escalation_rule_id: to_positive_int(data.get("escalationruleid")),
            template_group_id,
            template_group_name: template_group_id
                .and_then(|_| to_string_or_null(data.get("templategroupname"))),
            tags: to_string_or_null(data.get("tags")),
            watchers: as_list(data.get("watcher"))
                .into_iter()
                .map(|w| TicketWatcher {
                    staff_id: to_positive_int(attribute(w, "staffid")),
                    name: to_string_or_null(attribute(w, "name")),
                })
                .collect(),
            workflows: as_list(data.get("workflow"))
                .into_iter()
                .map(|w| TicketWorkflow {
                    id: to_positive_int(attribute(w, "id")),
                    title: to_string_or_null(attribute(w, "title")),
                })
                .collect(),
            ..Ticket::default()
        };

        ticket.parse_embedded_notes(data.get("note"))?;
        if let Some(posts) = data.get("posts") {
            let posts = as_list(posts.get("post"))
                .into_iter()
                .map(Entity::<TicketPost>::from_wire)
                .collect::<Result<Vec<_>>>()?;
            ticket.posts = Some(ResultSet::new(posts));
        }
        Ok(ticket)
    }

    fn build(&self, op: Operation) -> Result<RequestData> {
        let mut data = RequestData::new();
        data.put_str("subject", self.subject.as_deref())
            .put_str("fullname", self.full_name.as_deref())
            .put_str("email", self.email.as_deref())
            .put_u64("departmentid", self.department.id())
            .put_u64("ticketstatusid", self.status.id())
            .put_u64("ticketpriorityid", self.priority.id())
            .put_u64("tickettypeid", self.ticket_type.id())
            .put_u64("ownerstaffid", self.owner_staff.id());
        match self.template_group_id {
            Some(id) => data.put_u64("templategroup", Some(id)),
            None => data.put_str("templategroup", self.template_group_name.as_deref()),
        };

        if op == Operation::Create {
            match self.creator_type {
                Some(TicketCreatorType::Staff) if self.staff.id().is_some() => {
                    data.put_u64("staffid", self.staff.id());
                }
                Some(TicketCreatorType::User) if self.user.id().is_some() => {
                    data.put_u64("userid", self.user.id());
                }
                Some(TicketCreatorType::Auto) if self.auto_create_user => {
                    data.put_u64("autouserid", Some(1));
                }
                _ => return Err(KayakoError::missing_field("staffid", op)),
            }
            data.put_str("contents", self.contents.as_deref())
                .put_str("type", self.creation_type.map(|t| t.wire_value()))
                .put_bool("ignoreautoresponder", self.ignore_auto_responder);
        } else {
            data.put_u64("userid", self.user.id());
        }
        Ok(data)
    }

    fn identity(&self) -> Option<Identity> {
        self.id.map(Identity::single)
    }

    fn invalidate_relations(&mut self) {
        self.department.invalidate();
        self.status.invalidate();
        self.priority.invalidate();
        self.ticket_type.invalidate();
        self.user.invalidate();
        self.user_organization.invalidate();
        self.owner_staff.invalidate();
        self.staff.invalidate();
        self.notes = None;
        self.time_tracks = None;
        self.posts = None;
    }

    async fn after_update(
        entity: &mut Entity<Self>,
        previous: Self,
        client: &Client,
    ) -> Result<()> {
        entity.update_custom_fields_from(previous, client).await
    }
}

impl HasCustomFields for Ticket {
    type Kind = TicketFields;

    fn custom_field_slot(&self) -> Option<&ResultSet<CustomFieldGroup<Self::Kind>>> {
        self.custom_fields.as_ref()
    }

    fn custom_field_slot_mut(&mut self) -> &mut Option<ResultSet<CustomFieldGroup<Self::Kind>>> {
        &mut self.custom_fields
    }
}

impl Ticket {
    /// Splits embedded `note` nodes into notes and time tracks.
    ///
    /// Time tracks are tagged `type="timetrack"`; older servers only mark
    /// them with a `timeworked` attribute.
    fn parse_embedded_notes(&mut self, value: Option<&WireData>) -> Result<()> {
        let mut notes = Vec::new();
        let mut time_tracks = Vec::new();
        for node in as_list(value) {
            let is_time_track = attribute(node, "type")
                .and_then(scalar_text)
                .is_some_and(|t| t == "timetrack")
                || attribute(node, "timeworked").is_some();
            if is_time_track {
                let mut track = Entity::<TicketTimeTrack>::from_wire(node)?;
                if track.ticket_id().is_none() {
                    track.set_ticket_id(self.id);
                }
                time_tracks.push(track);
            } else {
                let mut note = Entity::<TicketNote>::from_wire(node)?;
                if note.ticket_id().is_none() {
                    note.set_ticket_id(self.id);
                }
                notes.push(note);
            }
        }
        if !notes.is_empty() {
            self.notes = Some(ResultSet::new(notes));
        }
        if !time_tracks.is_empty() {
            self.time_tracks = Some(ResultSet::new(time_tracks));
        }
        Ok(())
    }

    /// A new ticket in `department`, opened by `creator`.
    ///
    /// Status, priority and type come from the configured ticket defaults,
    /// as does permission for the server to create an unknown user.
    #[must_use]
    pub fn create_new(
        client: &Client,
        department: &Entity<Department>,
        creator: TicketCreator,
        contents: impl Into<String>,
        subject: impl Into<String>,
    ) -> Entity<Ticket> {
        let defaults = &client.config().ticket_defaults;
        let mut ticket = Ticket {
            auto_create_user: defaults.auto_create_user,
            ..Ticket::default()
        };
        ticket.status.set_id(defaults.status_id);
        ticket.priority.set_id(defaults.priority_id);
        ticket.ticket_type.set_id(defaults.type_id);
        ticket.department.set(Some(department.clone()));
        ticket
            .set_subject(subject)
            .set_contents(contents)
            .set_creator(creator);
        Entity::new(ticket)
    }

    /// A new ticket whose user the server looks up or creates from name and email.
    #[must_use]
    pub fn create_new_auto(
        client: &Client,
        department: &Entity<Department>,
        full_name: impl Into<String>,
        email: impl Into<String>,
        contents: impl Into<String>,
        subject: impl Into<String>,
    ) -> Entity<Ticket> {
        let creator = TicketCreator::Auto {
            full_name: full_name.into(),
            email: email.into(),
        };
        Ticket::create_new(client, department, creator, contents, subject)
    }

    /// Fetches one ticket by id or display id.
    pub async fn get(client: &Client, id: impl fmt::Display) -> Result<Entity<Ticket>> {
        Entity::fetch(client, &[id.to_string()]).await
    }

    /// Lists tickets of the given departments.
    ///
    /// Each filter takes raw ids, a fetched object or a result set. Empty
    /// status, owner and user filters match everything.
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::Validation` when no department is given.
    pub async fn get_all(
        client: &Client,
        departments: &(impl IdSource + ?Sized),
        statuses: &(impl IdSource + ?Sized),
        owners: &(impl IdSource + ?Sized),
        users: &(impl IdSource + ?Sized),
        paging: Paging,
    ) -> Result<ResultSet<Ticket>> {
        let departments = departments.own_ids();
        if departments.is_empty() {
            return Err(KayakoError::validation(
                "you must provide at least one department to list tickets",
            ));
        }
        let mut params = vec![
            LIST_ALL.to_string(),
            id_filter(&departments),
            id_filter(&statuses.own_ids()),
            id_filter(&owners.own_ids()),
            id_filter(&users.own_ids()),
        ];
        paging.append_to(&mut params);
        Entity::fetch_all(client, &params).await
    }

    /// Searches tickets for `query` in the given areas.
    ///
    /// # Errors
    ///
    /// Returns transport and mapping errors.
    pub async fn search(
        client: &Client,
        query: &str,
        areas: &[TicketSearchArea],
    ) -> Result<ResultSet<Ticket>> {
        let mut data = RequestData::new();
        data.put_str("query", Some(query));
        for area in areas {
            data.put_u64(area.wire_value(), Some(1));
        }
        debug!(query, areas = areas.len(), "Searching tickets");

        let response = client
            .transport()
            .post(SEARCH_CONTROLLER, &[], &data, &[])
            .await?;
        Entity::list_from_wire(&response)
    }

    /// Ticket counts, cached on the client until `reload` is set.
    ///
    /// # Errors
    ///
    /// Returns transport errors.
    pub async fn statistics(client: &Client, reload: bool) -> Result<Arc<TicketStatistics>> {
        if !reload {
            if let Some(stats) = client.cached_statistics() {
                return Ok(stats);
            }
        }

        debug!("Fetching ticket statistics");
        let data = client.transport().get(STATISTICS_CONTROLLER, &[]).await?;
        let stats = Arc::new(TicketStatistics::parse(
            &data,
            &client.config().datetime_format,
        ));
        client.store_statistics(Arc::clone(&stats));
        Ok(stats)
    }

    /// Server id.
    #[must_use]
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    /// Flag.
    #[must_use]
    pub fn flag_type(&self) -> Option<TicketFlag> {
        self.flag_type
    }

    /// Display id, e.g. `ABC-123-4567`.
    #[must_use]
    pub fn display_id(&self) -> Option<&str> {
        self.display_id.as_deref()
    }

    /// Department id.
    #[must_use]
    pub fn department_id(&self) -> Option<u64> {
        self.department.id()
    }

    /// Sets the department id.
    pub fn set_department_id(&mut self, id: Option<u64>) -> &mut Self {
        self.department.set_id(id);
        self
    }

    /// Department, fetched on first use.
    pub async fn department(&mut self, client: &Client, reload: bool) -> Result<Option<&Entity<Department>>> {
        self.department.resolve(client, reload).await
    }

    /// Sets the department.
    pub fn set_department(&mut self, department: Option<Entity<Department>>) -> &mut Self {
        self.department.set(department);
        self
    }

    /// Status id.
    #[must_use]
    pub fn status_id(&self) -> Option<u64> {
        self.status.id()
    }

    /// Sets the status id.
    pub fn set_status_id(&mut self, id: Option<u64>) -> &mut Self {
        self.status.set_id(id);
        self
    }

    /// Status, fetched on first use.
    pub async fn status(&mut self, client: &Client, reload: bool) -> Result<Option<&Entity<TicketStatus>>> {
        self.status.resolve(client, reload).await
    }

    /// Sets the status.
    pub fn set_status(&mut self, status: Option<Entity<TicketStatus>>) -> &mut Self {
        self.status.set(status);
        self
    }

    /// Priority id.
    #[must_use]
    pub fn priority_id(&self) -> Option<u64> {
        self.priority.id()
    }

    /// Sets the priority id.
    pub fn set_priority_id(&mut self, id: Option<u64>) -> &mut Self {
        self.priority.set_id(id);
        self
    }

    /// Priority, fetched on first use.
    pub async fn priority(&mut self, client: &Client, reload: bool) -> Result<Option<&Entity<TicketPriority>>> {
        self.priority.resolve(client, reload).await
    }

    /// Sets the priority.
    pub fn set_priority(&mut self, priority: Option<Entity<TicketPriority>>) -> &mut Self {
        self.priority.set(priority);
        self
    }

    /// Type id.
    #[must_use]
    pub fn type_id(&self) -> Option<u64> {
        self.ticket_type.id()
    }

    /// Sets the type id.
    pub fn set_type_id(&mut self, id: Option<u64>) -> &mut Self {
        self.ticket_type.set_id(id);
        self
    }

    /// Type, fetched on first use.
    pub async fn ticket_type(&mut self, client: &Client, reload: bool) -> Result<Option<&Entity<TicketType>>> {
        self.ticket_type.resolve(client, reload).await
    }

    /// Sets the type.
    pub fn set_ticket_type(&mut self, ticket_type: Option<Entity<TicketType>>) -> &mut Self {
        self.ticket_type.set(ticket_type);
        self
    }

    /// Id of the user who opened the ticket.
    #[must_use]
    pub fn user_id(&self) -> Option<u64> {
        self.user.id()
    }

    /// User who opened the ticket, fetched on first use.
    pub async fn user(&mut self, client: &Client, reload: bool) -> Result<Option<&Entity<User>>> {
        self.user.resolve(client, reload).await
    }

    /// Organization name of the user.
    #[must_use]
    pub fn user_organization_name(&self) -> Option<&str> {
        self.user_organization_name.as_deref()
    }

    /// Organization id of the user.
    #[must_use]
    pub fn user_organization_id(&self) -> Option<u64> {
        self.user_organization.id()
    }

    /// Organization of the user, fetched on first use.
    pub async fn user_organization(
        &mut self,
        client: &Client,
        reload: bool,
    ) -> Result<Option<&Entity<UserOrganization>>> {
        self.user_organization.resolve(client, reload).await
    }

    /// Id of the staff member who opened the ticket, known only for new tickets.
    #[must_use]
    pub fn staff_id(&self) -> Option<u64> {
        self.staff.id()
    }

    /// Staff member who opened the ticket, fetched on first use.
    pub async fn staff(&mut self, client: &Client, reload: bool) -> Result<Option<&Entity<Staff>>> {
        self.staff.resolve(client, reload).await
    }

    /// Creator kind.
    #[must_use]
    pub fn creator_type(&self) -> Option<TicketCreatorType> {
        self.creator_type
    }

    /// Sets who opens the ticket.
    ///
    /// A staff creator clears the user and the other way round.
    pub fn set_creator(&mut self, creator: TicketCreator) -> &mut Self {
        match creator {
            TicketCreator::Staff(staff) => {
                self.full_name = staff.full_name();
                self.email = staff.email().map(str::to_string);
                self.staff.set(Some(staff));
                self.user.set(None);
                self.creator_type = Some(TicketCreatorType::Staff);
            }
            TicketCreator::User(user) => {
                self.full_name = user.full_name().map(str::to_string);
                self.email = user.email().map(str::to_string);
                self.user.set(Some(user));
                self.staff.set(None);
                self.creator_type = Some(TicketCreatorType::User);
            }
            TicketCreator::StaffId(id) => {
                self.staff.set_id(Some(id));
                self.user.set(None);
                self.creator_type = Some(TicketCreatorType::Staff);
            }
            TicketCreator::UserId(id) => {
                self.user.set_id(Some(id));
                self.staff.set(None);
                self.creator_type = Some(TicketCreatorType::User);
            }
            TicketCreator::Auto { full_name, email } => {
                self.full_name = Some(full_name);
                self.email = Some(email);
                self.user.set(None);
                self.staff.set(None);
                self.creator_type = Some(TicketCreatorType::Auto);
            }
        }
        self
    }

    /// Whether the server may create the user of an automatic creator.
    #[must_use]
    pub fn auto_create_user(&self) -> bool {
        self.auto_create_user
    }

    /// Allows or forbids automatic user creation.
    pub fn set_auto_create_user(&mut self, enabled: bool) -> &mut Self {
        self.auto_create_user = enabled;
        self
    }

    /// Owner id.
    #[must_use]
    pub fn owner_staff_id(&self) -> Option<u64> {
        self.owner_staff.id()
    }

    /// Owner name.
    #[must_use]
    pub fn owner_staff_name(&self) -> Option<&str> {
        self.owner_staff_name.as_deref()
    }

    /// Sets the owner id.
    pub fn set_owner_staff_id(&mut self, id: Option<u64>) -> &mut Self {
        self.owner_staff.set_id(id);
        self.owner_staff_name = None;
        self
    }

    /// Owner, fetched on first use.
    pub async fn owner_staff(&mut self, client: &Client, reload: bool) -> Result<Option<&Entity<Staff>>> {
        self.owner_staff.resolve(client, reload).await
    }

    /// Sets the owner.
    pub fn set_owner_staff(&mut self, staff: Option<Entity<Staff>>) -> &mut Self {
        self.owner_staff_name = staff.as_ref().and_then(|s| s.full_name());
        self.owner_staff.set(staff);
        self
    }

    /// Creator name.
    #[must_use]
    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    /// Sets the creator name.
    pub fn set_full_name(&mut self, full_name: impl Into<String>) -> &mut Self {
        self.full_name = Some(full_name.into());
        self
    }

    /// Creator email.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Sets the creator email.
    pub fn set_email(&mut self, email: impl Into<String>) -> &mut Self {
        self.email = Some(email.into());
        self
    }

    /// Name of the last replier.
    #[must_use]
    pub fn last_replier(&self) -> Option<&str> {
        self.last_replier.as_deref()
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

    /// Creation time.
    #[must_use]
    pub fn creation_time(&self) -> Option<DateTime<Utc>> {
        self.creation_time
    }

    /// Creation time formatted with `format`, or the configured datetime format.
    #[must_use]
    pub fn creation_time_formatted(&self, client: &Client, format: Option<&str>) -> Option<String> {
        format_timestamp(
            self.creation_time,
            format.unwrap_or(client.config().datetime_format.as_str()),
        )
    }

    /// Last activity.
    #[must_use]
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.last_activity
    }

    /// Last activity formatted with `format`, or the configured datetime format.
    #[must_use]
    pub fn last_activity_formatted(&self, client: &Client, format: Option<&str>) -> Option<String> {
        format_timestamp(
            self.last_activity,
            format.unwrap_or(client.config().datetime_format.as_str()),
        )
    }

    /// Last staff reply.
    #[must_use]
    pub fn last_staff_reply(&self) -> Option<DateTime<Utc>> {
        self.last_staff_reply
    }

    /// Last user reply.
    #[must_use]
    pub fn last_user_reply(&self) -> Option<DateTime<Utc>> {
        self.last_user_reply
    }

    /// SLA plan id.
    #[must_use]
    pub fn sla_plan_id(&self) -> Option<u64> {
        self.sla_plan_id
    }

    /// Reply deadline.
    #[must_use]
    pub fn next_reply_due(&self) -> Option<DateTime<Utc>> {
        self.next_reply_due
    }

    /// Resolution deadline.
    #[must_use]
    pub fn resolution_due(&self) -> Option<DateTime<Utc>> {
        self.resolution_due
    }

    /// Resolution deadline formatted with `format`, or the configured datetime format.
    #[must_use]
    pub fn resolution_due_formatted(&self, client: &Client, format: Option<&str>) -> Option<String> {
        format_timestamp(
            self.resolution_due,
            format.unwrap_or(client.config().datetime_format.as_str()),
        )
    }

    /// Number of replies.
    #[must_use]
    pub fn replies(&self) -> Option<i64> {
        self.replies
    }

    /// Creator IP address.
    #[must_use]
    pub fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }

    /// Channel the ticket was opened through.
    #[must_use]
    pub fn creation_mode(&self) -> Option<TicketCreationMode> {
        self.creation_mode
    }

    /// Ticket kind.
    #[must_use]
    pub fn creation_type(&self) -> Option<TicketCreationType> {
        self.creation_type
    }

    /// Sets the ticket kind; only sent on create.
    pub fn set_creation_type(&mut self, creation_type: Option<TicketCreationType>) -> &mut Self {
        self.creation_type = creation_type;
        self
    }

    /// Whether the ticket is escalated.
    #[must_use]
    pub fn is_escalated(&self) -> Option<bool> {
        self.is_escalated
    }

    /// Escalation rule id.
    #[must_use]
    pub fn escalation_rule_id(&self) -> Option<u64> {
        self.escalation_rule_id
    }

    /// Tags as sent by the server.
    #[must_use]
    pub fn tags(&self) -> Option<&str> {
        self.tags.as_deref()
    }

    /// Template group id.
    #[must_use]
    pub fn template_group_id(&self) -> Option<u64> {
        self.template_group_id
    }

    /// Template group name.
    #[must_use]
    pub fn template_group_name(&self) -> Option<&str> {
        self.template_group_name.as_deref()
    }

    /// Sets the template group by id, or by name when the text is not a number.
    pub fn set_template_group(&mut self, id_or_name: &str) -> &mut Self {
        match id_or_name.trim().parse::<u64>() {
            Ok(id) if id > 0 => {
                self.template_group_id = Some(id);
                self.template_group_name = None;
            }
            _ => {
                self.template_group_id = None;
                self.template_group_name = Some(id_or_name.to_string()).filter(|n| !n.is_empty());
            }
        }
        self
    }

    /// Staff members watching the ticket.
    #[must_use]
    pub fn watchers(&self) -> &[TicketWatcher] {
        &self.watchers
    }

    /// Workflows available for the ticket.
    #[must_use]
    pub fn workflows(&self) -> &[TicketWorkflow] {
        &self.workflows
    }

    /// Contents of the first post; only sent on create.
    #[must_use]
    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }

    /// Sets the contents of the first post.
    pub fn set_contents(&mut self, contents: impl Into<String>) -> &mut Self {
        self.contents = Some(contents.into());
        self
    }

    /// Whether the autoresponder email is suppressed on create.
    #[must_use]
    pub fn ignore_auto_responder(&self) -> Option<bool> {
        self.ignore_auto_responder
    }

    /// Suppresses or allows the autoresponder email.
    pub fn set_ignore_auto_responder(&mut self, ignore: bool) -> &mut Self {
        self.ignore_auto_responder = Some(ignore);
        self
    }
}

impl Entity<Ticket> {
    fn ticket_id(&self) -> Result<u64> {
        let identity = self.require_persisted()?;
        identity
            .own_id()
            .ok_or_else(|| KayakoError::illegal_state("Ticket has no numeric id"))
    }

    /// Notes, fetched on first use.
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::IllegalState` for new tickets, and fetch errors.
    pub async fn notes(&mut self, client: &Client, reload: bool) -> Result<&ResultSet<TicketNote>> {
        let ticket_id = self.ticket_id()?;
        if reload || self.notes.is_none() {
            self.notes = Some(TicketNote::get_all(client, ticket_id).await?);
        }
        self.notes
            .as_ref()
            .ok_or_else(|| KayakoError::illegal_state("ticket notes were not loaded"))
    }

    /// Time tracks, fetched on first use.
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::IllegalState` for new tickets, and fetch errors.
    pub async fn time_tracks(
        &mut self,
        client: &Client,
        reload: bool,
    ) -> Result<&ResultSet<TicketTimeTrack>> {
        let ticket_id = self.ticket_id()?;
        if reload || self.time_tracks.is_none() {
            self.time_tracks = Some(TicketTimeTrack::get_all(client, ticket_id).await?);
        }
        self.time_tracks
            .as_ref()
            .ok_or_else(|| KayakoError::illegal_state("ticket time tracks were not loaded"))
    }

    /// Posts, fetched on first use.
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::IllegalState` for new tickets, and fetch errors.
    pub async fn posts(&mut self, client: &Client, reload: bool) -> Result<&ResultSet<TicketPost>> {
        let ticket_id = self.ticket_id()?;
        if reload || self.posts.is_none() {
            self.posts = Some(TicketPost::get_all(client, ticket_id).await?);
        }
        self.posts
            .as_ref()
            .ok_or_else(|| KayakoError::illegal_state("ticket posts were not loaded"))
    }

    /// The opening post.
    ///
    /// # Errors
    ///
    /// Same as [`Entity::posts`].
    pub async fn first_post(&mut self, client: &Client) -> Result<Option<&Entity<TicketPost>>> {
        Ok(self.posts(client, false).await?.first())
    }

    /// A new note in this ticket.
    #[must_use]
    pub fn new_note(&self, creator: &Entity<Staff>, contents: impl Into<String>) -> Entity<TicketNote> {
        TicketNote::create_new(self, creator, contents)
    }

    /// A new time track in this ticket.
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::Validation` for malformed durations.
    pub fn new_time_track(
        &self,
        contents: impl Into<String>,
        staff: &Entity<Staff>,
        time_worked: &str,
        time_billable: &str,
    ) -> Result<Entity<TicketTimeTrack>> {
        TicketTimeTrack::create_new(self, contents, staff, time_worked, time_billable)
    }

    /// A new post in this ticket.
    #[must_use]
    pub fn new_post(&self, creator: PostCreator, contents: impl Into<String>) -> Entity<TicketPost> {
        TicketPost::create_new(self, creator, contents)
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (creator: {})",
            self.display_id.as_deref().unwrap_or_default(),
            self.subject.as_deref().unwrap_or_default(),
            self.full_name.as_deref().unwrap_or_default()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, TicketDefaults};
    use crate::models::ticket_note::NoteType;
    use crate::transport::{FilePart, Transport};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct Offline;

    #[async_trait]
    impl Transport for Offline {
        async fn get(&self, controller: &str, _params: &[String]) -> Result<WireData> {
            panic!("unexpected GET {controller}")
        }

        async fn post(
            &self,
            controller: &str,
            _params: &[String],
            _fields: &RequestData,
            _files: &[FilePart],
        ) -> Result<WireData> {
            panic!("unexpected POST {controller}")
        }

        async fn put(&self, controller: &str, _params: &[String], _fields: &RequestData) -> Result<WireData> {
            panic!("unexpected PUT {controller}")
        }

        async fn delete(&self, controller: &str, _params: &[String]) -> Result<()> {
            panic!("unexpected DELETE {controller}")
        }
    }

    fn client(auto_create_user: bool) -> Client {
        let config = Config::new("https://help.example.com/api/", "key", "secret")
            .unwrap()
            .with_ticket_defaults(TicketDefaults {
                status_id: Some(1),
                priority_id: Some(2),
                type_id: Some(3),
                auto_create_user,
            });
        Client::with_transport(config, Arc::new(Offline))
    }

    fn department() -> Entity<Department> {
        Entity::from_wire(&json!({ "id": "4", "title": "Sales", "type": "public", "module": "tickets" }))
            .unwrap()
    }

    fn sample() -> WireData {
        json!({
            "_attributes": { "id": "42", "flagtype": "5" },
            "_contents": "",
            "displayid": "ABC-123-4567",
            "departmentid": "4",
            "statusid": "1",
            "priorityid": "2",
            "typeid": "3",
            "userid": "8",
            "userorganization": "Acme",
            "userorganizationid": "0",
            "ownerstaffid": "7",
            "ownerstaffname": "Ann Lee",
            "fullname": "Jan Nowak",
            "email": "jan@example.com",
            "subject": "Printer on fire",
            "creationtime": "1300000000",
            "replies": "2",
            "creator": "2",
            "creationmode": "4",
            "templategroupid": "1",
            "templategroupname": "Default",
            "watcher": { "_attributes": { "staffid": "7", "name": "Ann Lee" }, "_contents": "" },
            "note": [
                { "_attributes": { "type": "ticket", "id": "1", "creatorstaffid": "7" }, "_contents": "Called the user" },
                { "_attributes": { "type": "timetrack", "id": "2", "timeworked": "3600" }, "_contents": "Travel" }
            ],
            "posts": {
                "post": [
                    { "id": "11", "ticketid": "42", "creator": "2", "fullname": "Jan Nowak", "contents": "Help" },
                    { "id": "12", "ticketid": "42", "creator": "1", "fullname": "Ann Lee", "contents": "On it" }
                ]
            }
        })
    }

    #[test]
    fn test_parse_ticket() {
        let ticket = Entity::<Ticket>::from_wire(&sample()).unwrap();
        assert_eq!(ticket.identity(), Some(Identity::single(42)));
        assert_eq!(ticket.flag_type(), Some(TicketFlag::Red));
        assert_eq!(ticket.user_organization_id(), None);
        assert_eq!(ticket.creator_type(), Some(TicketCreatorType::User));
        assert_eq!(ticket.creation_mode(), Some(TicketCreationMode::Api));
        assert_eq!(ticket.template_group_name(), Some("Default"));
        assert_eq!(
            ticket.watchers(),
            &[TicketWatcher {
                staff_id: Some(7),
                name: Some("Ann Lee".to_string())
            }]
        );
        assert_eq!(ticket.to_string(), "ABC-123-4567 Printer on fire (creator: Jan Nowak)");
    }

    #[test]
    fn test_embedded_children_fill_caches() {
        let ticket = Entity::<Ticket>::from_wire(&sample()).unwrap();

        let notes = ticket.notes.as_ref().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes.first().unwrap().note_type(), Some(NoteType::Ticket));
        assert_eq!(notes.first().unwrap().identity(), Some(Identity::nested(&[42, 1])));

        let tracks = ticket.time_tracks.as_ref().unwrap();
        assert_eq!(tracks.first().unwrap().time_worked(), Some(3600));
        assert_eq!(tracks.first().unwrap().ticket_id(), Some(42));

        assert_eq!(ticket.posts.as_ref().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_embedded_posts_are_served_without_requests() {
        let client = client(true);
        let mut ticket = Entity::<Ticket>::from_wire(&sample()).unwrap();
        let first = ticket.first_post(&client).await.unwrap().unwrap();
        assert_eq!(first.contents(), Some("Help"));
    }

    #[test]
    fn test_create_new_applies_defaults() {
        let client = client(true);
        let ticket = Ticket::create_new_auto(
            &client,
            &department(),
            "Jan Nowak",
            "jan@example.com",
            "My printer is on fire",
            "Printer",
        );
        assert!(ticket.is_new());
        assert_eq!(ticket.status_id(), Some(1));
        assert_eq!(ticket.priority_id(), Some(2));
        assert_eq!(ticket.type_id(), Some(3));
        assert_eq!(ticket.department_id(), Some(4));

        let data = ticket.build(Operation::Create).unwrap();
        assert_eq!(data.scalar("autouserid"), Some("1"));
        assert_eq!(data.scalar("fullname"), Some("Jan Nowak"));
        assert_eq!(data.scalar("contents"), Some("My printer is on fire"));
        assert!(!data.contains("userid"));
    }

    #[test]
    fn test_auto_creator_requires_auto_create_user() {
        let client = client(false);
        let ticket = Ticket::create_new_auto(&client, &department(), "Jan", "jan@example.com", "Hi", "Hello");
        let err = ticket.build(Operation::Create).unwrap_err();
        assert!(matches!(err, KayakoError::MissingRequiredField { .. }));
    }

    #[test]
    fn test_staff_creator_clears_user() {
        let client = client(true);
        let staff = Entity::<Staff>::from_wire(&json!({
            "id": "7", "firstname": "Ann", "lastname": "Lee", "email": "ann@example.com"
        }))
        .unwrap();
        let mut ticket = Ticket::create_new(&client, &department(), TicketCreator::UserId(8), "Hi", "Hello");
        assert_eq!(ticket.user_id(), Some(8));

        ticket.set_creator(TicketCreator::Staff(staff));
        assert_eq!(ticket.user_id(), None);
        assert_eq!(ticket.staff_id(), Some(7));
        assert_eq!(ticket.full_name(), Some("Ann Lee"));

        let data = ticket.build(Operation::Create).unwrap();
        assert_eq!(data.scalar("staffid"), Some("7"));
    }

    #[test]
    fn test_update_sends_user_and_template_group() {
        let mut ticket = Entity::<Ticket>::from_wire(&sample()).unwrap();
        ticket.set_template_group("Support");

        let data = ticket.build(Operation::Update).unwrap();
        assert_eq!(data.scalar("userid"), Some("8"));
        assert_eq!(data.scalar("templategroup"), Some("Support"));
        assert_eq!(data.scalar("ownerstaffid"), Some("7"));
        assert!(!data.contains("contents"));
    }

    #[tokio::test]
    async fn test_get_all_requires_department() {
        let client = client(true);
        let none: &[u64] = &[];
        let err = Ticket::get_all(&client, none, none, none, none, Paging::default())
            .await
            .unwrap_err();
        assert!(matches!(err, KayakoError::Validation(_)));
    }

    #[tokio::test]
    async fn test_children_of_new_ticket_are_illegal() {
        let client = client(true);
        let mut ticket = Ticket::create_new(&client, &department(), TicketCreator::UserId(8), "Hi", "Hello");
        let err = ticket.notes(&client, false).await.unwrap_err();
        assert!(matches!(err, KayakoError::IllegalState(_)));
    }
}
