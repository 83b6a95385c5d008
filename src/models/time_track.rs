//! Time tracking entries of tickets.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::client::Client;
use crate::codec::{
    excerpt, format_seconds, format_timestamp, node_attribute, parse_hours_minutes,
    to_constant_opt, to_positive_int, to_string_or_null, to_timestamp, ConstantSet, CONTENTS_KEY,
};
use crate::entity::{Entity, FieldSpec, Relation, Requirement, Resource};
use crate::error::{Operation, Result};
use crate::identity::Identity;
use crate::models::common::{NoteColor, LIST_ALL};
use crate::models::staff::Staff;
use crate::models::ticket::Ticket;
use crate::result_set::ResultSet;
use crate::transport::{RequestData, WireMap};

/// Time worked and billed on a ticket.
#[derive(Debug, Clone, Default)]
pub struct TicketTimeTrack {
    id: Option<u64>,
    ticket: Relation<Ticket>,
    time_worked: Option<u64>,
    time_billable: Option<u64>,
    bill_date: Option<DateTime<Utc>>,
    work_date: Option<DateTime<Utc>>,
    worker_staff: Relation<Staff>,
    worker_staff_name: Option<String>,
    creator_staff: Relation<Staff>,
    creator_staff_name: Option<String>,
    note_color: Option<NoteColor>,
    contents: Option<String>,
}

impl Resource for TicketTimeTrack {
    const NAME: &'static str = "TicketTimeTrack";
    const CONTROLLER: &'static str = "/Tickets/TicketTimeTrack";
    const NODE: &'static str = "timetrack";
    const FIELDS: &'static [FieldSpec<Self>] = &[
        FieldSpec {
            name: "ticket_id",
            wire: "ticketid",
            requirement: Requirement::Create,
            is_set: |t| t.ticket.id().is_some(),
        },
        FieldSpec {
            name: "time_worked",
            wire: "timespent",
            requirement: Requirement::Create,
            is_set: |t| t.time_worked.is_some(),
        },
        FieldSpec {
            name: "time_billable",
            wire: "timebillable",
            requirement: Requirement::Create,
            is_set: |t| t.time_billable.is_some(),
        },
        FieldSpec {
            name: "bill_date",
            wire: "billtimeline",
            requirement: Requirement::Create,
            is_set: |t| t.bill_date.is_some(),
        },
        FieldSpec {
            name: "work_date",
            wire: "worktimeline",
            requirement: Requirement::Create,
            is_set: |t| t.work_date.is_some(),
        },
        FieldSpec {
            name: "creator_staff_id",
            wire: "staffid",
            requirement: Requirement::Create,
            is_set: |t| t.creator_staff.id().is_some(),
        },
        FieldSpec {
            name: "contents",
            wire: "contents",
            requirement: Requirement::Create,
            is_set: |t| t.contents.as_deref().is_some_and(|c| !c.is_empty()),
        },
    ];

    fn parse(data: &WireMap) -> Result<Self> {
        let attr = |name| node_attribute(data, name);
        Ok(TicketTimeTrack {
            id: to_positive_int(attr("id")),
            ticket: Relation::new(to_positive_int(attr("ticketid"))),
            time_worked: to_positive_int(attr("timeworked")),
            time_billable: to_positive_int(attr("timebillable")),
            bill_date: to_timestamp(attr("billdate")),
            work_date: to_timestamp(attr("workdate")),
            worker_staff: Relation::new(to_positive_int(attr("workerstaffid"))),
            worker_staff_name: to_string_or_null(attr("workerstaffname")),
            creator_staff: Relation::new(to_positive_int(attr("creatorstaffid"))),
            creator_staff_name: to_string_or_null(attr("creatorstaffname")),
            note_color: to_constant_opt(attr("notecolor"))?,
            contents: to_string_or_null(data.get(CONTENTS_KEY)),
        })
    }

    fn build(&self, _op: Operation) -> Result<RequestData> {
        let mut data = RequestData::new();
        data.put_u64("ticketid", self.ticket.id())
            .put_str("contents", self.contents.as_deref())
            .put_u64("staffid", self.creator_staff.id())
            .put_i64("worktimeline", self.work_date.map(|t| t.timestamp()))
            .put_i64("billtimeline", self.bill_date.map(|t| t.timestamp()))
            .put_u64("timespent", self.time_worked)
            .put_u64("timebillable", self.time_billable)
            .put_u64("workerstaffid", self.worker_staff.id())
            .put_str("notecolor", self.note_color.map(|c| c.wire_value()));
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
        self.worker_staff.invalidate();
        self.creator_staff.invalidate();
    }
}

impl TicketTimeTrack {
    /// A new entry worked and billed now by `staff`.
    ///
    /// `time_worked` and `time_billable` are seconds or `hh:mm`.
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::Validation` for malformed durations.
    pub fn create_new(
        ticket: &Entity<Ticket>,
        contents: impl Into<String>,
        staff: &Entity<Staff>,
        time_worked: &str,
        time_billable: &str,
    ) -> Result<Entity<TicketTimeTrack>> {
        let mut track = TicketTimeTrack::default();
        track
            .set_ticket_id(ticket.identity().and_then(|id| id.own_id()))
            .set_contents(contents)
            .set_creator_staff(Some(staff.clone()))
            .set_worker_staff(Some(staff.clone()));
        track.set_billing_data(time_billable, None)?;
        track.set_worked_data(time_worked, None)?;
        Ok(Entity::new(track))
    }

    /// Fetches one entry of a ticket.
    pub async fn get(client: &Client, ticket_id: u64, id: u64) -> Result<Entity<TicketTimeTrack>> {
        Entity::fetch(client, &[ticket_id.to_string(), id.to_string()]).await
    }

    /// Fetches every entry of a ticket.
    pub async fn get_all(client: &Client, ticket_id: u64) -> Result<ResultSet<TicketTimeTrack>> {
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

    /// Sets the ticket id.
    pub fn set_ticket_id(&mut self, id: Option<u64>) -> &mut Self {
        self.ticket.set_id(id);
        self
    }

    /// Ticket, fetched on first use.
    pub async fn ticket(&mut self, client: &Client, reload: bool) -> Result<Option<&Entity<Ticket>>> {
        self.ticket.resolve(client, reload).await
    }

    /// Seconds worked.
    #[must_use]
    pub fn time_worked(&self) -> Option<u64> {
        self.time_worked
    }

    /// Seconds worked as `HH:MM:SS`.
    #[must_use]
    pub fn time_worked_formatted(&self) -> Option<String> {
        self.time_worked.map(format_seconds)
    }

    /// Sets the time worked from seconds or `hh:mm`.
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::Validation` for malformed input.
    pub fn set_time_worked(&mut self, time_worked: &str) -> Result<&mut Self> {
        self.time_worked = Some(parse_hours_minutes(time_worked)?);
        Ok(self)
    }

    /// Seconds billable.
    #[must_use]
    pub fn time_billable(&self) -> Option<u64> {
        self.time_billable
    }

    /// Seconds billable as `HH:MM:SS`.
    #[must_use]
    pub fn time_billable_formatted(&self) -> Option<String> {
        self.time_billable.map(format_seconds)
    }

    /// Sets the billable time from seconds or `hh:mm`.
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::Validation` for malformed input.
    pub fn set_time_billable(&mut self, time_billable: &str) -> Result<&mut Self> {
        self.time_billable = Some(parse_hours_minutes(time_billable)?);
        Ok(self)
    }

    /// When the work was done.
    #[must_use]
    pub fn work_date(&self) -> Option<DateTime<Utc>> {
        self.work_date
    }

    /// Work date formatted with `format`, or the configured datetime format.
    #[must_use]
    pub fn work_date_formatted(&self, client: &Client, format: Option<&str>) -> Option<String> {
        format_timestamp(
            self.work_date,
            format.unwrap_or(client.config().datetime_format.as_str()),
        )
    }

    /// Sets the work date.
    pub fn set_work_date(&mut self, date: Option<DateTime<Utc>>) -> &mut Self {
        self.work_date = date;
        self
    }

    /// When the work was billed.
    #[must_use]
    pub fn bill_date(&self) -> Option<DateTime<Utc>> {
        self.bill_date
    }

    /// Bill date formatted with `format`, or the configured datetime format.
    #[must_use]
    pub fn bill_date_formatted(&self, client: &Client, format: Option<&str>) -> Option<String> {
        format_timestamp(
            self.bill_date,
            format.unwrap_or(client.config().datetime_format.as_str()),
        )
    }

    /// Sets the bill date.
    pub fn set_bill_date(&mut self, date: Option<DateTime<Utc>>) -> &mut Self {
        self.bill_date = date;
        self
    }

    /// Sets time worked and work date; the date defaults to now.
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::Validation` for a malformed duration.
    pub fn set_worked_data(&mut self, time_worked: &str, work_date: Option<DateTime<Utc>>) -> Result<&mut Self> {
        self.set_time_worked(time_worked)?;
        self.work_date = Some(work_date.unwrap_or_else(Utc::now));
        Ok(self)
    }

    /// Sets billable time and bill date; the date defaults to now.
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::Validation` for a malformed duration.
    pub fn set_billing_data(
        &mut self,
        time_billable: &str,
        bill_date: Option<DateTime<Utc>>,
    ) -> Result<&mut Self> {
        self.set_time_billable(time_billable)?;
        self.bill_date = Some(bill_date.unwrap_or_else(Utc::now));
        Ok(self)
    }

    /// Staff id of the worker.
    #[must_use]
    pub fn worker_staff_id(&self) -> Option<u64> {
        self.worker_staff.id()
    }

    /// Worker name.
    #[must_use]
    pub fn worker_staff_name(&self) -> Option<&str> {
        self.worker_staff_name.as_deref()
    }

    /// Sets the worker id.
    pub fn set_worker_staff_id(&mut self, id: Option<u64>) -> &mut Self {
        self.worker_staff.set_id(id);
        self.worker_staff_name = None;
        self
    }

    /// Worker, fetched on first use.
    pub async fn worker_staff(&mut self, client: &Client, reload: bool) -> Result<Option<&Entity<Staff>>> {
        self.worker_staff.resolve(client, reload).await
    }

    /// Sets the worker.
    pub fn set_worker_staff(&mut self, staff: Option<Entity<Staff>>) -> &mut Self {
        self.worker_staff_name = staff.as_ref().and_then(|s| s.full_name());
        self.worker_staff.set(staff);
        self
    }

    /// Staff id of the author.
    #[must_use]
    pub fn creator_staff_id(&self) -> Option<u64> {
        self.creator_staff.id()
    }

    /// Author name.
    #[must_use]
    pub fn creator_staff_name(&self) -> Option<&str> {
        self.creator_staff_name.as_deref()
    }

    /// Sets the author id.
    pub fn set_creator_staff_id(&mut self, id: Option<u64>) -> &mut Self {
        self.creator_staff.set_id(id);
        self.creator_staff_name = None;
        self
    }

    /// Author, fetched on first use.
    pub async fn creator_staff(&mut self, client: &Client, reload: bool) -> Result<Option<&Entity<Staff>>> {
        self.creator_staff.resolve(client, reload).await
    }

    /// Sets the author.
    pub fn set_creator_staff(&mut self, staff: Option<Entity<Staff>>) -> &mut Self {
        self.creator_staff_name = staff.as_ref().and_then(|s| s.full_name());
        self.creator_staff.set(staff);
        self
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

impl fmt::Display for TicketTimeTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (worker: {})",
            excerpt(self.contents.as_deref().unwrap_or_default(), 50),
            self.worker_staff_name.as_deref().unwrap_or_default()
        )
    }
}
