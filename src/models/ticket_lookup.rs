//! Read-only ticket lookups: priorities, statuses and types.

use std::fmt;

use crate::client::Client;
use crate::codec::{to_bool, to_constant_opt, to_int, to_positive_int, to_string_or_null};
use crate::entity::{Entity, FieldSpec, Relation, Resource};
use crate::error::Result;
use crate::identity::Identity;
use crate::models::common::{UserGroupVisibility, Visibility};
use crate::models::department::Department;
use crate::models::user::UserGroup;
use crate::result_set::ResultSet;
use crate::transport::{RequestData, WireMap};

/// Fields shared by every ticket lookup.
#[derive(Debug, Clone, Default)]
struct LookupFields {
    id: Option<u64>,
    title: Option<String>,
    display_order: Option<i64>,
    visibility: Option<Visibility>,
    user_groups: UserGroupVisibility,
}

impl LookupFields {
    fn parse(data: &WireMap) -> Result<Self> {
        Ok(LookupFields {
            id: to_positive_int(data.get("id")),
            title: to_string_or_null(data.get("title")),
            display_order: to_int(data.get("displayorder"), None),
            visibility: to_constant_opt(data.get("type"))?,
            user_groups: UserGroupVisibility::parse(
                data.get("uservisibilitycustom"),
                data.get("usergroupid"),
            ),
        })
    }

    /// Only public items can be visible, then the group restriction applies.
    fn is_visible_to(&self, user_group_id: u64) -> bool {
        self.visibility == Some(Visibility::Public) && self.user_groups.allows(user_group_id)
    }

    fn fmt_summary(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (type: {})",
            self.title.as_deref().unwrap_or_default(),
            self.visibility.map(|v| v.to_string()).unwrap_or_default()
        )
    }
}

/// Visibility check shared by the lookups that carry user group restrictions.
fn visible_to(fields: &LookupFields, user_group: &Entity<UserGroup>) -> bool {
    user_group
        .id()
        .is_some_and(|id| fields.is_visible_to(id))
}

/// A ticket priority.
#[derive(Debug, Clone, Default)]
pub struct TicketPriority {
    fields: LookupFields,
    foreground_color: Option<String>,
    background_color: Option<String>,
}

impl Resource for TicketPriority {
    const NAME: &'static str = "TicketPriority";
    const CONTROLLER: &'static str = "/Tickets/TicketPriority";
    const NODE: &'static str = "ticketpriority";
    const FIELDS: &'static [FieldSpec<Self>] = &[];
    const READ_ONLY: bool = true;

    fn parse(data: &WireMap) -> Result<Self> {
        Ok(TicketPriority {
            fields: LookupFields::parse(data)?,
            foreground_color: to_string_or_null(data.get("frcolorcode")),
            background_color: to_string_or_null(data.get("bgcolorcode")),
        })
    }

    fn build(&self, _op: crate::error::Operation) -> Result<RequestData> {
        Ok(RequestData::new())
    }

    fn identity(&self) -> Option<Identity> {
        self.fields.id.map(Identity::single)
    }
}

impl TicketPriority {
    /// Fetches one priority.
    pub async fn get(client: &Client, id: u64) -> Result<Entity<TicketPriority>> {
        Entity::fetch(client, &[id.to_string()]).await
    }

    /// Fetches every priority.
    pub async fn get_all(client: &Client) -> Result<ResultSet<TicketPriority>> {
        Entity::fetch_all(client, &[]).await
    }

    /// Server id.
    #[must_use]
    pub fn id(&self) -> Option<u64> {
        self.fields.id
    }

    /// Title.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.fields.title.as_deref()
    }

    /// Display order.
    #[must_use]
    pub fn display_order(&self) -> Option<i64> {
        self.fields.display_order
    }

    /// Text color, e.g. `#ffffff`.
    #[must_use]
    pub fn foreground_color(&self) -> Option<&str> {
        self.foreground_color.as_deref()
    }

    /// Background color.
    #[must_use]
    pub fn background_color(&self) -> Option<&str> {
        self.background_color.as_deref()
    }

    /// Public or private.
    #[must_use]
    pub fn visibility(&self) -> Option<Visibility> {
        self.fields.visibility
    }

    /// User group restriction.
    #[must_use]
    pub fn user_group_visibility(&self) -> &UserGroupVisibility {
        &self.fields.user_groups
    }

    /// Returns true if members of the user group can see this priority.
    #[must_use]
    pub fn is_visible_to_user_group_id(&self, user_group_id: u64) -> bool {
        self.fields.is_visible_to(user_group_id)
    }

    /// Returns true if members of `user_group` can see this priority.
    #[must_use]
    pub fn is_visible_to_user_group(&self, user_group: &Entity<UserGroup>) -> bool {
        visible_to(&self.fields, user_group)
    }
}

impl fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fields.fmt_summary(f)
    }
}

/// A ticket status.
#[derive(Debug, Clone, Default)]
pub struct TicketStatus {
    fields: LookupFields,
    department: Relation<Department>,
    mark_as_resolved: Option<bool>,
    display_count: Option<bool>,
    status_color: Option<String>,
    status_background_color: Option<String>,
    reset_due_time: Option<bool>,
    display_in_main_list: Option<bool>,
}

impl Resource for TicketStatus {
    const NAME: &'static str = "TicketStatus";
    const CONTROLLER: &'static str = "/Tickets/TicketStatus";
    const NODE: &'static str = "ticketstatus";
    const FIELDS: &'static [FieldSpec<Self>] = &[];
    const READ_ONLY: bool = true;

    fn parse(data: &WireMap) -> Result<Self> {
        Ok(TicketStatus {
            fields: LookupFields::parse(data)?,
            department: Relation::new(to_positive_int(data.get("departmentid"))),
            mark_as_resolved: to_bool(data.get("markasresolved")),
            display_count: to_bool(data.get("displaycount")),
            status_color: to_string_or_null(data.get("statuscolor")),
            status_background_color: to_string_or_null(data.get("statusbgcolor")),
            reset_due_time: to_bool(data.get("resetduetime")),
            display_in_main_list: to_bool(data.get("displayinmainlist")),
        })
    }

    fn build(&self, _op: crate::error::Operation) -> Result<RequestData> {
        Ok(RequestData::new())
    }

    fn identity(&self) -> Option<Identity> {
        self.fields.id.map(Identity::single)
    }

    fn invalidate_relations(&mut self) {
        self.department.invalidate();
    }
}

impl TicketStatus {
    /// Fetches one status.
    pub async fn get(client: &Client, id: u64) -> Result<Entity<TicketStatus>> {
        Entity::fetch(client, &[id.to_string()]).await
    }

    /// Fetches every status.
    pub async fn get_all(client: &Client) -> Result<ResultSet<TicketStatus>> {
        Entity::fetch_all(client, &[]).await
    }

    /// Server id.
    #[must_use]
    pub fn id(&self) -> Option<u64> {
        self.fields.id
    }

    /// Title.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.fields.title.as_deref()
    }

    /// Display order.
    #[must_use]
    pub fn display_order(&self) -> Option<i64> {
        self.fields.display_order
    }

    /// Public or private.
    #[must_use]
    pub fn visibility(&self) -> Option<Visibility> {
        self.fields.visibility
    }

    /// Department the status is limited to, if any.
    #[must_use]
    pub fn department_id(&self) -> Option<u64> {
        self.department.id()
    }

    /// Department, fetched on first use.
    pub async fn department(&mut self, client: &Client, reload: bool) -> Result<Option<&Entity<Department>>> {
        self.department.resolve(client, reload).await
    }

    /// Whether tickets with this status count as resolved.
    #[must_use]
    pub fn mark_as_resolved(&self) -> Option<bool> {
        self.mark_as_resolved
    }

    /// Whether a ticket count is shown next to the status.
    #[must_use]
    pub fn display_count(&self) -> Option<bool> {
        self.display_count
    }

    /// Text color.
    #[must_use]
    pub fn status_color(&self) -> Option<&str> {
        self.status_color.as_deref()
    }

    /// Background color.
    #[must_use]
    pub fn status_background_color(&self) -> Option<&str> {
        self.status_background_color.as_deref()
    }

    /// Whether setting this status resets the due time.
    #[must_use]
    pub fn reset_due_time(&self) -> Option<bool> {
        self.reset_due_time
    }

    /// Whether tickets with this status appear in the main list.
    #[must_use]
    pub fn display_in_main_list(&self) -> Option<bool> {
        self.display_in_main_list
    }

    /// Returns true if members of `user_group` can see this status.
    #[must_use]
    pub fn is_visible_to_user_group(&self, user_group: &Entity<UserGroup>) -> bool {
        visible_to(&self.fields, user_group)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fields.fmt_summary(f)
    }
}

/// A ticket type.
#[derive(Debug, Clone, Default)]
pub struct TicketType {
    fields: LookupFields,
    department: Relation<Department>,
}

impl Resource for TicketType {
    const NAME: &'static str = "TicketType";
    const CONTROLLER: &'static str = "/Tickets/TicketType";
    const NODE: &'static str = "tickettype";
    const FIELDS: &'static [FieldSpec<Self>] = &[];
    const READ_ONLY: bool = true;

    fn parse(data: &WireMap) -> Result<Self> {
        Ok(TicketType {
            fields: LookupFields::parse(data)?,
            department: Relation::new(to_positive_int(data.get("departmentid"))),
        })
    }

    fn build(&self, _op: crate::error::Operation) -> Result<RequestData> {
        Ok(RequestData::new())
    }

    fn identity(&self) -> Option<Identity> {
        self.fields.id.map(Identity::single)
    }

    fn invalidate_relations(&mut self) {
        self.department.invalidate();
    }
}

impl TicketType {
    /// Fetches one type.
    pub async fn get(client: &Client, id: u64) -> Result<Entity<TicketType>> {
        Entity::fetch(client, &[id.to_string()]).await
    }

    /// Fetches every type.
    pub async fn get_all(client: &Client) -> Result<ResultSet<TicketType>> {
        Entity::fetch_all(client, &[]).await
    }

    /// Server id.
    #[must_use]
    pub fn id(&self) -> Option<u64> {
        self.fields.id
    }

    /// Title.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.fields.title.as_deref()
    }

    /// Display order.
    #[must_use]
    pub fn display_order(&self) -> Option<i64> {
        self.fields.display_order
    }

    /// Public or private.
    #[must_use]
    pub fn visibility(&self) -> Option<Visibility> {
        self.fields.visibility
    }

    /// Department the type is limited to, if any.
    #[must_use]
    pub fn department_id(&self) -> Option<u64> {
        self.department.id()
    }

    /// Department, fetched on first use.
    pub async fn department(&mut self, client: &Client, reload: bool) -> Result<Option<&Entity<Department>>> {
        self.department.resolve(client, reload).await
    }

    /// Returns true if members of `user_group` can see this type.
    #[must_use]
    pub fn is_visible_to_user_group(&self, user_group: &Entity<UserGroup>) -> bool {
        visible_to(&self.fields, user_group)
    }
}

impl fmt::Display for TicketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fields.fmt_summary(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{KayakoError, Operation};
    use serde_json::json;

    fn priority(visibility: &str, custom: &str) -> Entity<TicketPriority> {
        Entity::from_wire(&json!({
            "id": "3",
            "title": "Urgent",
            "displayorder": "1",
            "frcolorcode": "#ffffff",
            "bgcolorcode": "#ff0000",
            "type": visibility,
            "uservisibilitycustom": custom,
            "usergroupid": ["2", "5"]
        }))
        .unwrap()
    }

    #[test]
    fn test_priority_display() {
        assert_eq!(priority("public", "0").to_string(), "Urgent (type: public)");
    }

    #[test]
    fn test_private_priority_is_hidden_from_users() {
        let p = priority("private", "0");
        assert!(!p.is_visible_to_user_group_id(2));
    }

    #[test]
    fn test_custom_visibility_limits_groups() {
        let p = priority("public", "1");
        assert!(p.is_visible_to_user_group_id(5));
        assert!(!p.is_visible_to_user_group_id(1));

        let open = priority("public", "0");
        assert!(open.is_visible_to_user_group_id(1));
    }

    #[test]
    fn test_lookups_are_read_only() {
        assert!(TicketPriority::permits(Operation::Get));
        assert!(TicketStatus::permits(Operation::GetAll));
        assert!(!TicketType::permits(Operation::Create));
        assert!(!TicketStatus::permits(Operation::Delete));
    }

    #[test]
    fn test_unknown_visibility_is_rejected() {
        let err = Entity::<TicketType>::from_wire(&json!({ "id": "1", "type": "internal" })).unwrap_err();
        assert!(matches!(err, KayakoError::InvalidEnumValue { .. }));
    }
}
