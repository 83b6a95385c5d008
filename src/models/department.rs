//! Departments.

use std::fmt;

use crate::client::Client;
use crate::codec::{to_constant_opt, to_int, to_positive_int, to_string_or_null, ConstantSet};
use crate::entity::{Entity, FieldSpec, Relation, Requirement, Resource};
use crate::error::{Operation, Result};
use crate::identity::Identity;
use crate::models::common::{UserGroupVisibility, Visibility};
use crate::result_set::ResultSet;
use crate::transport::{RequestData, WireMap};
use crate::wire_constants;

wire_constants! {
    /// Application a department belongs to.
    pub enum DepartmentModule("Department", "MODULE") {
        /// Ticket department.
        Tickets = "tickets",
        /// Live chat department.
        Livechat = "livechat",
    }
}

/// A department.
#[derive(Debug, Clone, Default)]
pub struct Department {
    id: Option<u64>,
    title: Option<String>,
    visibility: Option<Visibility>,
    module: Option<DepartmentModule>,
    display_order: Option<i64>,
    parent: Relation<Department>,
    user_groups: UserGroupVisibility,
}

impl Resource for Department {
    const NAME: &'static str = "Department";
    const CONTROLLER: &'static str = "/Base/Department";
    const NODE: &'static str = "department";
    const FIELDS: &'static [FieldSpec<Self>] = &[
        FieldSpec {
            name: "title",
            wire: "title",
            requirement: Requirement::Both,
            is_set: |d| d.title.is_some(),
        },
        FieldSpec {
            name: "visibility",
            wire: "type",
            requirement: Requirement::Create,
            is_set: |d| d.visibility.is_some(),
        },
        FieldSpec {
            name: "module",
            wire: "module",
            requirement: Requirement::Create,
            is_set: |d| d.module.is_some(),
        },
    ];

    fn parse(data: &WireMap) -> Result<Self> {
        Ok(Department {
            id: to_positive_int(data.get("id")),
            title: to_string_or_null(data.get("title")),
            visibility: to_constant_opt(data.get("type"))?,
            module: to_constant_opt(data.get("module"))?,
            display_order: to_int(data.get("displayorder"), None),
            parent: Relation::new(to_positive_int(data.get("parentdepartmentid"))),
            user_groups: UserGroupVisibility::parse(
                data.get("uservisibilitycustom"),
                data.get("usergroups").and_then(|g| g.get("id")),
            ),
        })
    }

    fn build(&self, op: Operation) -> Result<RequestData> {
        let mut data = RequestData::new();
        data.put_str("title", self.title.as_deref())
            .put_str("type", self.visibility.map(|v| v.wire_value()))
            .put_i64("displayorder", self.display_order)
            .put_u64("parentdepartmentid", self.parent.id());
        if op == Operation::Create {
            data.put_str("module", self.module.map(|m| m.wire_value()));
        }
        self.user_groups.append_to(&mut data);
        Ok(data)
    }

    fn identity(&self) -> Option<Identity> {
        self.id.map(Identity::single)
    }

    fn invalidate_relations(&mut self) {
        self.parent.invalidate();
    }
}

impl Department {
    /// A new department.
    #[must_use]
    pub fn create_new(
        title: impl Into<String>,
        visibility: Visibility,
        module: DepartmentModule,
    ) -> Entity<Department> {
        Entity::new(Department {
            title: Some(title.into()),
            visibility: Some(visibility),
            module: Some(module),
            ..Department::default()
        })
    }

    /// Fetches one department.
    pub async fn get(client: &Client, id: u64) -> Result<Entity<Department>> {
        Entity::fetch(client, &[id.to_string()]).await
    }

    /// Fetches every department.
    pub async fn get_all(client: &Client) -> Result<ResultSet<Department>> {
        Entity::fetch_all(client, &[]).await
    }

    /// Server id.
    #[must_use]
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    /// Title.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Sets the title.
    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = Some(title.into());
        self
    }

    /// Public or private.
    #[must_use]
    pub fn visibility(&self) -> Option<Visibility> {
        self.visibility
    }

    /// Sets public or private.
    pub fn set_visibility(&mut self, visibility: Visibility) -> &mut Self {
        self.visibility = Some(visibility);
        self
    }

    /// Module; only sent on create.
    #[must_use]
    pub fn module(&self) -> Option<DepartmentModule> {
        self.module
    }

    /// Display order.
    #[must_use]
    pub fn display_order(&self) -> Option<i64> {
        self.display_order
    }

    /// Sets the display order.
    pub fn set_display_order(&mut self, display_order: Option<i64>) -> &mut Self {
        self.display_order = display_order;
        self
    }

    /// Parent department id.
    #[must_use]
    pub fn parent_department_id(&self) -> Option<u64> {
        self.parent.id()
    }

    /// Sets the parent department id.
    pub fn set_parent_department_id(&mut self, id: Option<u64>) -> &mut Self {
        self.parent.set_id(id);
        self
    }

    /// Parent department, fetched on first use.
    pub async fn parent_department(
        &mut self,
        client: &Client,
        reload: bool,
    ) -> Result<Option<&Entity<Department>>> {
        self.parent.resolve(client, reload).await
    }

    /// Sets the parent department.
    pub fn set_parent_department(&mut self, parent: Option<Entity<Department>>) -> &mut Self {
        self.parent.set(parent);
        self
    }

    /// User group restriction.
    #[must_use]
    pub fn user_group_visibility(&self) -> &UserGroupVisibility {
        &self.user_groups
    }

    /// Limits the department to the given user groups; an empty list lifts the limit.
    pub fn set_visible_user_groups(&mut self, user_group_ids: Vec<u64>) -> &mut Self {
        self.user_groups = UserGroupVisibility {
            custom: !user_group_ids.is_empty(),
            user_group_ids,
        };
        self
    }

    /// Returns true if members of the user group can see this department.
    #[must_use]
    pub fn is_visible_to_user_group_id(&self, user_group_id: u64) -> bool {
        self.visibility == Some(Visibility::Public) && self.user_groups.allows(user_group_id)
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (type: {}, module: {})",
            self.title.as_deref().unwrap_or_default(),
            self.visibility.map(|v| v.wire_value()).unwrap_or_default(),
            self.module.map(|m| m.wire_value()).unwrap_or_default()
        )
    }
}
