//! Staff members and staff groups.

use std::fmt;

use serde::Serialize;

use crate::client::Client;
use crate::codec::{to_bool, to_positive_int, to_string_or_null};
use crate::entity::{Entity, FieldSpec, Relation, Requirement, Resource};
use crate::error::{Operation, Result};
use crate::identity::Identity;
use crate::result_set::ResultSet;
use crate::transport::{RequestData, WireMap};

/// A staff group.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StaffGroup {
    id: Option<u64>,
    title: Option<String>,
    is_admin: bool,
}

impl Resource for StaffGroup {
    const NAME: &'static str = "StaffGroup";
    const CONTROLLER: &'static str = "/Base/StaffGroup";
    const NODE: &'static str = "staffgroup";
    const FIELDS: &'static [FieldSpec<Self>] = &[
        FieldSpec {
            name: "title",
            wire: "title",
            requirement: Requirement::Both,
            is_set: |g| g.title.is_some(),
        },
        FieldSpec {
            name: "is_admin",
            wire: "isadmin",
            requirement: Requirement::Create,
            is_set: |_| true,
        },
    ];

    fn parse(data: &WireMap) -> Result<Self> {
        Ok(StaffGroup {
            id: to_positive_int(data.get("id")),
            title: to_string_or_null(data.get("title")),
            is_admin: to_bool(data.get("isadmin")).unwrap_or(false),
        })
    }

    fn build(&self, _op: Operation) -> Result<RequestData> {
        let mut data = RequestData::new();
        data.put_str("title", self.title.as_deref())
            .put_bool("isadmin", Some(self.is_admin));
        Ok(data)
    }

    fn identity(&self) -> Option<Identity> {
        self.id.map(Identity::single)
    }
}

impl StaffGroup {
    /// A new staff group.
    #[must_use]
    pub fn create_new(title: impl Into<String>, is_admin: bool) -> Entity<StaffGroup> {
        Entity::new(StaffGroup {
            id: None,
            title: Some(title.into()),
            is_admin,
        })
    }

    /// Fetches one staff group.
    pub async fn get(client: &Client, id: u64) -> Result<Entity<StaffGroup>> {
        Entity::fetch(client, &[id.to_string()]).await
    }

    /// Fetches every staff group.
    pub async fn get_all(client: &Client) -> Result<ResultSet<StaffGroup>> {
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

    /// Whether members are administrators.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Sets the administrator flag.
    pub fn set_is_admin(&mut self, is_admin: bool) -> &mut Self {
        self.is_admin = is_admin;
        self
    }
}

impl Entity<StaffGroup> {
    /// A new staff member in this group.
    #[must_use]
    pub fn new_staff(
        &self,
        first_name: &str,
        last_name: &str,
        user_name: &str,
        email: &str,
        password: &str,
    ) -> Entity<Staff> {
        Staff::create_new(first_name, last_name, user_name, email, self, password)
    }
}

impl fmt::Display for StaffGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (isadmin: {})",
            self.title.as_deref().unwrap_or_default(),
            if self.is_admin { "yes" } else { "no" }
        )
    }
}

/// A staff member.
#[derive(Debug, Clone, Default)]
pub struct Staff {
    id: Option<u64>,
    staff_group: Relation<StaffGroup>,
    first_name: Option<String>,
    last_name: Option<String>,
    full_name: Option<String>,
    user_name: Option<String>,
    email: Option<String>,
    designation: Option<String>,
    greeting: Option<String>,
    mobile_number: Option<String>,
    signature: Option<String>,
    is_enabled: Option<bool>,
    time_zone: Option<String>,
    enable_dst: Option<bool>,
    password: Option<String>,
}

impl Resource for Staff {
    const NAME: &'static str = "Staff";
    const CONTROLLER: &'static str = "/Base/Staff";
    const NODE: &'static str = "staff";
    const FIELDS: &'static [FieldSpec<Self>] = &[
        FieldSpec {
            name: "first_name",
            wire: "firstname",
            requirement: Requirement::Create,
            is_set: |s| s.first_name.is_some(),
        },
        FieldSpec {
            name: "last_name",
            wire: "lastname",
            requirement: Requirement::Create,
            is_set: |s| s.last_name.is_some(),
        },
        FieldSpec {
            name: "user_name",
            wire: "username",
            requirement: Requirement::Create,
            is_set: |s| s.user_name.is_some(),
        },
        FieldSpec {
            name: "staff_group_id",
            wire: "staffgroupid",
            requirement: Requirement::Create,
            is_set: |s| s.staff_group.id().is_some(),
        },
        FieldSpec {
            name: "email",
            wire: "email",
            requirement: Requirement::Create,
            is_set: |s| s.email.is_some(),
        },
        FieldSpec {
            name: "password",
            wire: "password",
            requirement: Requirement::Create,
            is_set: |s| s.password.is_some(),
        },
    ];

    fn parse(data: &WireMap) -> Result<Self> {
        Ok(Staff {
            id: to_positive_int(data.get("id")),
            staff_group: Relation::new(to_positive_int(data.get("staffgroupid"))),
            first_name: to_string_or_null(data.get("firstname")),
            last_name: to_string_or_null(data.get("lastname")),
            full_name: to_string_or_null(data.get("fullname")),
            user_name: to_string_or_null(data.get("username")),
            email: to_string_or_null(data.get("email")),
            designation: to_string_or_null(data.get("designation")),
            greeting: to_string_or_null(data.get("greeting")),
            mobile_number: to_string_or_null(data.get("mobilenumber")),
            signature: to_string_or_null(data.get("signature")),
            is_enabled: to_bool(data.get("isenabled")),
            time_zone: to_string_or_null(data.get("timezone")),
            enable_dst: to_bool(data.get("enabledst")),
            password: None,
        })
    }

    fn build(&self, op: Operation) -> Result<RequestData> {
        let mut data = RequestData::new();
        data.put_str("firstname", self.first_name.as_deref())
            .put_str("lastname", self.last_name.as_deref())
            .put_str("username", self.user_name.as_deref())
            .put_u64("staffgroupid", self.staff_group.id())
            .put_str("email", self.email.as_deref())
            .put_str("designation", self.designation.as_deref())
            .put_str("greeting", self.greeting.as_deref())
            .put_str("mobilenumber", self.mobile_number.as_deref())
            .put_str("signature", self.signature.as_deref())
            .put_bool("isenabled", self.is_enabled)
            .put_str("timezone", self.time_zone.as_deref())
            .put_bool("enabledst", self.enable_dst);
        if op == Operation::Create {
            data.put_str("password", self.password.as_deref());
        }
        Ok(data)
    }

    fn identity(&self) -> Option<Identity> {
        self.id.map(Identity::single)
    }

    fn invalidate_relations(&mut self) {
        self.staff_group.invalidate();
    }
}

impl Staff {
    /// A new staff member.
    #[must_use]
    pub fn create_new(
        first_name: &str,
        last_name: &str,
        user_name: &str,
        email: &str,
        staff_group: &Entity<StaffGroup>,
        password: &str,
    ) -> Entity<Staff> {
        let mut staff = Staff {
            first_name: Some(first_name.to_string()),
            last_name: Some(last_name.to_string()),
            user_name: Some(user_name.to_string()),
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            ..Staff::default()
        };
        staff.staff_group.set(Some(staff_group.clone()));
        Entity::new(staff)
    }

    /// Fetches one staff member.
    pub async fn get(client: &Client, id: u64) -> Result<Entity<Staff>> {
        Entity::fetch(client, &[id.to_string()]).await
    }

    /// Fetches every staff member.
    pub async fn get_all(client: &Client) -> Result<ResultSet<Staff>> {
        Entity::fetch_all(client, &[]).await
    }

    /// Server id.
    #[must_use]
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    /// Staff group id.
    #[must_use]
    pub fn staff_group_id(&self) -> Option<u64> {
        self.staff_group.id()
    }

    /// Sets the staff group id.
    pub fn set_staff_group_id(&mut self, id: Option<u64>) -> &mut Self {
        self.staff_group.set_id(id);
        self
    }

    /// Staff group, fetched on first use.
    pub async fn staff_group(
        &mut self,
        client: &Client,
        reload: bool,
    ) -> Result<Option<&Entity<StaffGroup>>> {
        self.staff_group.resolve(client, reload).await
    }

    /// Sets the staff group.
    pub fn set_staff_group(&mut self, group: Option<Entity<StaffGroup>>) -> &mut Self {
        self.staff_group.set(group);
        self
    }

    /// First name.
    #[must_use]
    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    /// Sets the first name.
    pub fn set_first_name(&mut self, first_name: impl Into<String>) -> &mut Self {
        self.first_name = Some(first_name.into());
        self
    }

    /// Last name.
    #[must_use]
    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    /// Sets the last name.
    pub fn set_last_name(&mut self, last_name: impl Into<String>) -> &mut Self {
        self.last_name = Some(last_name.into());
        self
    }

    /// Full name as reported by the server, or first and last name joined.
    #[must_use]
    pub fn full_name(&self) -> Option<String> {
        if let Some(full) = &self.full_name {
            return Some(full.clone());
        }
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            (Some(only), None) | (None, Some(only)) => Some(only.clone()),
            (None, None) => None,
        }
    }

    /// Login name.
    #[must_use]
    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    /// Sets the login name.
    pub fn set_user_name(&mut self, user_name: impl Into<String>) -> &mut Self {
        self.user_name = Some(user_name.into());
        self
    }

    /// Email address.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Sets the email address.
    pub fn set_email(&mut self, email: impl Into<String>) -> &mut Self {
        self.email = Some(email.into());
        self
    }

    /// Designation.
    #[must_use]
    pub fn designation(&self) -> Option<&str> {
        self.designation.as_deref()
    }

    /// Sets the designation.
    pub fn set_designation(&mut self, designation: Option<String>) -> &mut Self {
        self.designation = designation;
        self
    }

    /// Greeting used in replies.
    #[must_use]
    pub fn greeting(&self) -> Option<&str> {
        self.greeting.as_deref()
    }

    /// Sets the greeting.
    pub fn set_greeting(&mut self, greeting: Option<String>) -> &mut Self {
        self.greeting = greeting;
        self
    }

    /// Mobile number.
    #[must_use]
    pub fn mobile_number(&self) -> Option<&str> {
        self.mobile_number.as_deref()
    }

    /// Sets the mobile number.
    pub fn set_mobile_number(&mut self, number: Option<String>) -> &mut Self {
        self.mobile_number = number;
        self
    }

    /// Reply signature.
    #[must_use]
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    /// Sets the reply signature.
    pub fn set_signature(&mut self, signature: Option<String>) -> &mut Self {
        self.signature = signature;
        self
    }

    /// Whether the account is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> Option<bool> {
        self.is_enabled
    }

    /// Enables or disables the account.
    pub fn set_is_enabled(&mut self, enabled: bool) -> &mut Self {
        self.is_enabled = Some(enabled);
        self
    }

    /// Time zone name.
    #[must_use]
    pub fn time_zone(&self) -> Option<&str> {
        self.time_zone.as_deref()
    }

    /// Sets the time zone.
    pub fn set_time_zone(&mut self, time_zone: Option<String>) -> &mut Self {
        self.time_zone = time_zone;
        self
    }

    /// Whether daylight saving time is applied.
    #[must_use]
    pub fn enable_dst(&self) -> Option<bool> {
        self.enable_dst
    }

    /// Sets daylight saving time handling.
    pub fn set_enable_dst(&mut self, enable: bool) -> &mut Self {
        self.enable_dst = Some(enable);
        self
    }

    /// Sets the password sent on create.
    pub fn set_password(&mut self, password: impl Into<String>) -> &mut Self {
        self.password = Some(password.into());
        self
    }
}

impl fmt::Display for Staff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({})",
            self.full_name().unwrap_or_default(),
            self.user_name.as_deref().unwrap_or_default()
        )
    }
}
