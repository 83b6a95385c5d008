//! Users, user groups and user organizations.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::client::Client;
use crate::codec::{
    as_list, format_timestamp, to_bool, to_constant_opt, to_positive_int, to_string_or_null,
    to_timestamp, ConstantSet,
};
use crate::entity::{Entity, FieldSpec, Relation, Requirement, Resource};
use crate::error::{KayakoError, Operation, Result};
use crate::identity::Identity;
use crate::models::common::{Paging, DEFAULT_PAGE_SIZE};
use crate::models::custom_field::{
    CustomFieldGroup, HasCustomFields, UserFields, UserOrganizationFields,
};
use crate::result_set::ResultSet;
use crate::transport::{RequestData, WireMap};
use crate::wire_constants;

wire_constants! {
    /// Kind of user group.
    pub enum UserGroupType("UserGroup", "TYPE") {
        /// Anonymous visitors.
        Guest = "guest",
        /// Registered users.
        Registered = "registered",
    }
}

wire_constants! {
    /// Role of a user.
    pub enum UserRole("User", "ROLE") {
        /// Regular user.
        User = "user",
        /// Organization manager.
        Manager = "manager",
    }
}

wire_constants! {
    /// Kind of user organization.
    pub enum OrganizationType("UserOrganization", "TYPE") {
        /// Members only see their own tickets.
        Restricted = "restricted",
        /// Members see every ticket of the organization.
        Shared = "shared",
    }
}

/// A user group.
#[derive(Debug, Clone, Default)]
pub struct UserGroup {
    id: Option<u64>,
    title: Option<String>,
    group_type: Option<UserGroupType>,
    is_master: bool,
}

impl Resource for UserGroup {
    const NAME: &'static str = "UserGroup";
    const CONTROLLER: &'static str = "/Base/UserGroup";
    const NODE: &'static str = "usergroup";
    const FIELDS: &'static [FieldSpec<Self>] = &[
        FieldSpec {
            name: "title",
            wire: "title",
            requirement: Requirement::Both,
            is_set: |g| g.title.is_some(),
        },
        FieldSpec {
            name: "group_type",
            wire: "grouptype",
            requirement: Requirement::Create,
            is_set: |g| g.group_type.is_some(),
        },
    ];

    fn parse(data: &WireMap) -> Result<Self> {
        Ok(UserGroup {
            id: to_positive_int(data.get("id")),
            title: to_string_or_null(data.get("title")),
            group_type: to_constant_opt(data.get("grouptype"))?,
            is_master: to_bool(data.get("ismaster")).unwrap_or(false),
        })
    }

    fn build(&self, _op: Operation) -> Result<RequestData> {
        let mut data = RequestData::new();
        data.put_str("title", self.title.as_deref())
            .put_str("grouptype", self.group_type.map(|t| t.wire_value()));
        Ok(data)
    }

    fn identity(&self) -> Option<Identity> {
        self.id.map(Identity::single)
    }

    fn check_instance(&self, op: Operation) -> Result<()> {
        if op == Operation::Delete && self.is_master {
            return Err(KayakoError::illegal_state(
                "master user groups can't be deleted",
            ));
        }
        Ok(())
    }
}

impl UserGroup {
    /// A new user group.
    #[must_use]
    pub fn create_new(title: impl Into<String>, group_type: UserGroupType) -> Entity<UserGroup> {
        Entity::new(UserGroup {
            title: Some(title.into()),
            group_type: Some(group_type),
            ..UserGroup::default()
        })
    }

    /// Fetches one user group.
    pub async fn get(client: &Client, id: u64) -> Result<Entity<UserGroup>> {
        Entity::fetch(client, &[id.to_string()]).await
    }

    /// Fetches every user group.
    pub async fn get_all(client: &Client) -> Result<ResultSet<UserGroup>> {
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

    /// Group type.
    #[must_use]
    pub fn group_type(&self) -> Option<UserGroupType> {
        self.group_type
    }

    /// Sets the group type.
    pub fn set_group_type(&mut self, group_type: UserGroupType) -> &mut Self {
        self.group_type = Some(group_type);
        self
    }

    /// Whether this is a built-in group.
    #[must_use]
    pub fn is_master(&self) -> bool {
        self.is_master
    }
}

impl fmt::Display for UserGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title.as_deref().unwrap_or_default())?;
        if let Some(group_type) = self.group_type {
            write!(f, " (type: {})", group_type)?;
        }
        Ok(())
    }
}

/// A user organization.
#[derive(Debug, Clone, Default)]
pub struct UserOrganization {
    id: Option<u64>,
    name: Option<String>,
    organization_type: Option<OrganizationType>,
    address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    postal_code: Option<String>,
    country: Option<String>,
    phone: Option<String>,
    fax: Option<String>,
    website: Option<String>,
    sla_plan_id: Option<u64>,
    sla_plan_expiry: Option<DateTime<Utc>>,
    created: Option<DateTime<Utc>>,
    updated: Option<DateTime<Utc>>,
    custom_fields: Option<ResultSet<CustomFieldGroup<UserOrganizationFields>>>,
}

#[async_trait]
impl Resource for UserOrganization {
    const NAME: &'static str = "UserOrganization";
    const CONTROLLER: &'static str = "/Base/UserOrganization";
    const NODE: &'static str = "userorganization";
    const FIELDS: &'static [FieldSpec<Self>] = &[
        FieldSpec {
            name: "name",
            wire: "name",
            requirement: Requirement::Both,
            is_set: |o| o.name.is_some(),
        },
        FieldSpec {
            name: "organization_type",
            wire: "organizationtype",
            requirement: Requirement::Both,
            is_set: |o| o.organization_type.is_some(),
        },
    ];

    fn parse(data: &WireMap) -> Result<Self> {
        Ok(UserOrganization {
            id: to_positive_int(data.get("id")),
            name: to_string_or_null(data.get("name")),
            organization_type: to_constant_opt(data.get("organizationtype"))?,
            address: to_string_or_null(data.get("address")),
            city: to_string_or_null(data.get("city")),
            state: to_string_or_null(data.get("state")),
            postal_code: to_string_or_null(data.get("postalcode")),
            country: to_string_or_null(data.get("country")),
            phone: to_string_or_null(data.get("phone")),
            fax: to_string_or_null(data.get("fax")),
            website: to_string_or_null(data.get("website")),
            sla_plan_id: to_positive_int(data.get("slaplanid")),
            sla_plan_expiry: to_timestamp(data.get("slaplanexpiry")),
            created: to_timestamp(data.get("dateline")),
            updated: to_timestamp(data.get("lastupdate")),
            custom_fields: None,
        })
    }

    fn build(&self, _op: Operation) -> Result<RequestData> {
        let mut data = RequestData::new();
        data.put_str("name", self.name.as_deref())
            .put_str(
                "organizationtype",
                self.organization_type.map(|t| t.wire_value()),
            )
            .put_str("address", self.address.as_deref())
            .put_str("city", self.city.as_deref())
            .put_str("state", self.state.as_deref())
            .put_str("postalcode", self.postal_code.as_deref())
            .put_str("country", self.country.as_deref())
            .put_str("phone", self.phone.as_deref())
            .put_str("fax", self.fax.as_deref())
            .put_str("website", self.website.as_deref())
            .put_u64("slaplanid", self.sla_plan_id)
            .put_i64(
                "slaplanexpiry",
                self.sla_plan_expiry.map(|t| t.timestamp()),
            );
        Ok(data)
    }

    fn identity(&self) -> Option<Identity> {
        self.id.map(Identity::single)
    }

    async fn after_update(
        entity: &mut Entity<Self>,
        previous: Self,
        client: &Client,
    ) -> Result<()> {
        entity.update_custom_fields_from(previous, client).await
    }
}

impl HasCustomFields for UserOrganization {
    type Kind = UserOrganizationFields;

    fn custom_field_slot(&self) -> Option<&ResultSet<CustomFieldGroup<Self::Kind>>> {
        self.custom_fields.as_ref()
    }

    fn custom_field_slot_mut(&mut self) -> &mut Option<ResultSet<CustomFieldGroup<Self::Kind>>> {
        &mut self.custom_fields
    }
}

impl UserOrganization {
    /// A new organization.
    #[must_use]
    pub fn create_new(name: impl Into<String>, organization_type: OrganizationType) -> Entity<UserOrganization> {
        Entity::new(UserOrganization {
            name: Some(name.into()),
            organization_type: Some(organization_type),
            ..UserOrganization::default()
        })
    }

    /// Fetches one organization.
    pub async fn get(client: &Client, id: u64) -> Result<Entity<UserOrganization>> {
        Entity::fetch(client, &[id.to_string()]).await
    }

    /// Fetches every organization.
    pub async fn get_all(client: &Client) -> Result<ResultSet<UserOrganization>> {
        Entity::fetch_all(client, &[]).await
    }

    /// Server id.
    #[must_use]
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    /// Name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Sets the name.
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// Organization type.
    #[must_use]
    pub fn organization_type(&self) -> Option<OrganizationType> {
        self.organization_type
    }

    /// Sets the organization type.
    pub fn set_organization_type(&mut self, organization_type: OrganizationType) -> &mut Self {
        self.organization_type = Some(organization_type);
        self
    }

    /// Street address.
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Sets the street address.
    pub fn set_address(&mut self, address: Option<String>) -> &mut Self {
        self.address = address;
        self
    }

    /// City.
    #[must_use]
    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    /// Sets the city.
    pub fn set_city(&mut self, city: Option<String>) -> &mut Self {
        self.city = city;
        self
    }

    /// State or region.
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    /// Sets the state or region.
    pub fn set_state(&mut self, state: Option<String>) -> &mut Self {
        self.state = state;
        self
    }

    /// Postal code.
    #[must_use]
    pub fn postal_code(&self) -> Option<&str> {
        self.postal_code.as_deref()
    }

    /// Sets the postal code.
    pub fn set_postal_code(&mut self, postal_code: Option<String>) -> &mut Self {
        self.postal_code = postal_code;
        self
    }

    /// Country.
    #[must_use]
    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    /// Sets the country.
    pub fn set_country(&mut self, country: Option<String>) -> &mut Self {
        self.country = country;
        self
    }

    /// Phone number.
    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    /// Sets the phone number.
    pub fn set_phone(&mut self, phone: Option<String>) -> &mut Self {
        self.phone = phone;
        self
    }

    /// Fax number.
    #[must_use]
    pub fn fax(&self) -> Option<&str> {
        self.fax.as_deref()
    }

    /// Sets the fax number.
    pub fn set_fax(&mut self, fax: Option<String>) -> &mut Self {
        self.fax = fax;
        self
    }

    /// Website.
    #[must_use]
    pub fn website(&self) -> Option<&str> {
        self.website.as_deref()
    }

    /// Sets the website.
    pub fn set_website(&mut self, website: Option<String>) -> &mut Self {
        self.website = website;
        self
    }

    /// SLA plan id.
    #[must_use]
    pub fn sla_plan_id(&self) -> Option<u64> {
        self.sla_plan_id
    }

    /// Sets the SLA plan and when it expires.
    pub fn set_sla_plan(&mut self, id: Option<u64>, expiry: Option<DateTime<Utc>>) -> &mut Self {
        self.sla_plan_id = id;
        self.sla_plan_expiry = expiry;
        self
    }

    /// SLA plan expiry.
    #[must_use]
    pub fn sla_plan_expiry(&self) -> Option<DateTime<Utc>> {
        self.sla_plan_expiry
    }

    /// Creation time.
    #[must_use]
    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created
    }

    /// Last update time.
    #[must_use]
    pub fn updated(&self) -> Option<DateTime<Utc>> {
        self.updated
    }
}

impl fmt::Display for UserOrganization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (type: {})",
            self.name.as_deref().unwrap_or_default(),
            self.organization_type
                .map(|t| t.wire_value())
                .unwrap_or_default()
        )
    }
}

/// A user of the support center.
#[derive(Debug, Clone, Default)]
pub struct User {
    id: Option<u64>,
    user_group: Relation<UserGroup>,
    user_organization: Relation<UserOrganization>,
    role: Option<UserRole>,
    salutation: Option<String>,
    expiry: Option<DateTime<Utc>>,
    full_name: Option<String>,
    emails: Vec<String>,
    designation: Option<String>,
    phone: Option<String>,
    created: Option<DateTime<Utc>>,
    last_visit: Option<DateTime<Utc>>,
    is_enabled: Option<bool>,
    time_zone: Option<String>,
    enable_dst: Option<bool>,
    sla_plan_id: Option<u64>,
    sla_plan_expiry: Option<DateTime<Utc>>,
    password: Option<String>,
    send_welcome_email: Option<bool>,
    custom_fields: Option<ResultSet<CustomFieldGroup<UserFields>>>,
}

#[async_trait]
impl Resource for User {
    const NAME: &'static str = "User";
    const CONTROLLER: &'static str = "/Base/User";
    const NODE: &'static str = "user";
    const FIELDS: &'static [FieldSpec<Self>] = &[
        FieldSpec {
            name: "full_name",
            wire: "fullname",
            requirement: Requirement::Create,
            is_set: |u| u.full_name.is_some(),
        },
        FieldSpec {
            name: "user_group_id",
            wire: "usergroupid",
            requirement: Requirement::Create,
            is_set: |u| u.user_group.id().is_some(),
        },
        FieldSpec {
            name: "emails",
            wire: "email",
            requirement: Requirement::Create,
            is_set: |u| !u.emails.is_empty(),
        },
        FieldSpec {
            name: "password",
            wire: "password",
            requirement: Requirement::Create,
            is_set: |u| u.password.is_some(),
        },
    ];

    fn parse(data: &WireMap) -> Result<Self> {
        Ok(User {
            id: to_positive_int(data.get("id")),
            user_group: Relation::new(to_positive_int(data.get("usergroupid"))),
            user_organization: Relation::new(to_positive_int(data.get("userorganizationid"))),
            role: to_constant_opt(data.get("userrole"))?,
            salutation: to_string_or_null(data.get("salutation")),
            expiry: to_timestamp(data.get("userexpiry")),
            full_name: to_string_or_null(data.get("fullname")),
            emails: as_list(data.get("email"))
                .into_iter()
                .filter_map(|e| to_string_or_null(Some(e)))
                .collect(),
            designation: to_string_or_null(data.get("designation")),
            phone: to_string_or_null(data.get("phone")),
            created: to_timestamp(data.get("dateline")),
            last_visit: to_timestamp(data.get("lastvisit")),
            is_enabled: to_bool(data.get("isenabled")),
            time_zone: to_string_or_null(data.get("timezone")),
            enable_dst: to_bool(data.get("enabledst")),
            sla_plan_id: to_positive_int(data.get("slaplanid")),
            sla_plan_expiry: to_timestamp(data.get("slaplanexpiry")),
            password: None,
            send_welcome_email: None,
            custom_fields: None,
        })
    }

    fn build(&self, op: Operation) -> Result<RequestData> {
        let mut data = RequestData::new();
        data.put_str("fullname", self.full_name.as_deref())
            .put_u64("usergroupid", self.user_group.id())
            .put_u64("userorganizationid", self.user_organization.id())
            .put_str("userrole", self.role.map(|r| r.wire_value()))
            .put_str("salutation", self.salutation.as_deref())
            .put_i64("userexpiry", self.expiry.map(|t| t.timestamp()))
            .put_list("email", &self.emails)
            .put_str("designation", self.designation.as_deref())
            .put_str("phone", self.phone.as_deref())
            .put_bool("isenabled", self.is_enabled)
            .put_str("timezone", self.time_zone.as_deref())
            .put_bool("enabledst", self.enable_dst)
            .put_u64("slaplanid", self.sla_plan_id)
            .put_i64("slaplanexpiry", self.sla_plan_expiry.map(|t| t.timestamp()));
        if op == Operation::Create {
            data.put_str("password", self.password.as_deref())
                .put_bool("sendwelcomeemail", self.send_welcome_email);
        }
        Ok(data)
    }

    fn identity(&self) -> Option<Identity> {
        self.id.map(Identity::single)
    }

    fn invalidate_relations(&mut self) {
        self.user_group.invalidate();
        self.user_organization.invalidate();
    }

    async fn after_update(
        entity: &mut Entity<Self>,
        previous: Self,
        client: &Client,
    ) -> Result<()> {
        entity.update_custom_fields_from(previous, client).await
    }
}

impl HasCustomFields for User {
    type Kind = UserFields;

    fn custom_field_slot(&self) -> Option<&ResultSet<CustomFieldGroup<Self::Kind>>> {
        self.custom_fields.as_ref()
    }

    fn custom_field_slot_mut(&mut self) -> &mut Option<ResultSet<CustomFieldGroup<Self::Kind>>> {
        &mut self.custom_fields
    }
}

impl User {
    /// A new user in `user_group`.
    #[must_use]
    pub fn create_new(
        full_name: &str,
        email: &str,
        user_group: &Entity<UserGroup>,
        password: &str,
    ) -> Entity<User> {
        let mut user = User {
            full_name: Some(full_name.to_string()),
            emails: vec![email.to_string()],
            password: Some(password.to_string()),
            ..User::default()
        };
        user.user_group.set(Some(user_group.clone()));
        Entity::new(user)
    }

    /// Fetches one user.
    pub async fn get(client: &Client, id: u64) -> Result<Entity<User>> {
        Entity::fetch(client, &[id.to_string()]).await
    }

    /// Fetches users by id range.
    ///
    /// Users are listed through `Filter/<first id>/<count>`; without paging
    /// values listing starts at id 1 with the default page size.
    pub async fn get_all(client: &Client, paging: Paging) -> Result<ResultSet<User>> {
        let params = vec![
            "Filter".to_string(),
            paging.starting_id.unwrap_or(1).to_string(),
            paging
                .max_items
                .filter(|m| *m > 0)
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .to_string(),
        ];
        Entity::fetch_all(client, &params).await
    }

    /// Server id.
    #[must_use]
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    /// User group id.
    #[must_use]
    pub fn user_group_id(&self) -> Option<u64> {
        self.user_group.id()
    }

    /// Sets the user group id.
    pub fn set_user_group_id(&mut self, id: Option<u64>) -> &mut Self {
        self.user_group.set_id(id);
        self
    }

    /// User group, fetched on first use.
    pub async fn user_group(&mut self, client: &Client, reload: bool) -> Result<Option<&Entity<UserGroup>>> {
        self.user_group.resolve(client, reload).await
    }

    /// Sets the user group.
    pub fn set_user_group(&mut self, group: Option<Entity<UserGroup>>) -> &mut Self {
        self.user_group.set(group);
        self
    }

    /// Organization id.
    #[must_use]
    pub fn user_organization_id(&self) -> Option<u64> {
        self.user_organization.id()
    }

    /// Sets the organization id.
    pub fn set_user_organization_id(&mut self, id: Option<u64>) -> &mut Self {
        self.user_organization.set_id(id);
        self
    }

    /// Organization, fetched on first use.
    pub async fn user_organization(
        &mut self,
        client: &Client,
        reload: bool,
    ) -> Result<Option<&Entity<UserOrganization>>> {
        self.user_organization.resolve(client, reload).await
    }

    /// Sets the organization.
    pub fn set_user_organization(&mut self, organization: Option<Entity<UserOrganization>>) -> &mut Self {
        self.user_organization.set(organization);
        self
    }

    /// Role.
    #[must_use]
    pub fn role(&self) -> Option<UserRole> {
        self.role
    }

    /// Sets the role.
    pub fn set_role(&mut self, role: UserRole) -> &mut Self {
        self.role = Some(role);
        self
    }

    /// Salutation.
    #[must_use]
    pub fn salutation(&self) -> Option<&str> {
        self.salutation.as_deref()
    }

    /// Sets the salutation.
    pub fn set_salutation(&mut self, salutation: Option<String>) -> &mut Self {
        self.salutation = salutation;
        self
    }

    /// Account expiry.
    #[must_use]
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expiry
    }

    /// Account expiry formatted with `format`, or the configured date format.
    #[must_use]
    pub fn expiry_formatted(&self, client: &Client, format: Option<&str>) -> Option<String> {
        format_timestamp(self.expiry, format.unwrap_or(client.config().date_format.as_str()))
    }

    /// Sets the account expiry.
    pub fn set_expiry(&mut self, expiry: Option<DateTime<Utc>>) -> &mut Self {
        self.expiry = expiry;
        self
    }

    /// Full name.
    #[must_use]
    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    /// Sets the full name.
    pub fn set_full_name(&mut self, full_name: impl Into<String>) -> &mut Self {
        self.full_name = Some(full_name.into());
        self
    }

    /// Every email address; the first one is the primary address.
    #[must_use]
    pub fn emails(&self) -> &[String] {
        &self.emails
    }

    /// Primary email address.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.emails.first().map(String::as_str)
    }

    /// Adds an email address unless already present.
    pub fn add_email(&mut self, email: impl Into<String>) -> &mut Self {
        let email = email.into();
        if !self.emails.contains(&email) {
            self.emails.push(email);
        }
        self
    }

    /// Replaces every email address.
    pub fn set_emails(&mut self, emails: Vec<String>) -> &mut Self {
        self.emails = emails;
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

    /// Phone number.
    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    /// Sets the phone number.
    pub fn set_phone(&mut self, phone: Option<String>) -> &mut Self {
        self.phone = phone;
        self
    }

    /// Registration time.
    #[must_use]
    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created
    }

    /// Last visit time.
    #[must_use]
    pub fn last_visit(&self) -> Option<DateTime<Utc>> {
        self.last_visit
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

    /// SLA plan id.
    #[must_use]
    pub fn sla_plan_id(&self) -> Option<u64> {
        self.sla_plan_id
    }

    /// Sets the SLA plan and when it expires.
    pub fn set_sla_plan(&mut self, id: Option<u64>, expiry: Option<DateTime<Utc>>) -> &mut Self {
        self.sla_plan_id = id;
        self.sla_plan_expiry = expiry;
        self
    }

    /// Sets the password sent on create.
    pub fn set_password(&mut self, password: impl Into<String>) -> &mut Self {
        self.password = Some(password.into());
        self
    }

    /// Whether the server sends a welcome email on create.
    pub fn set_send_welcome_email(&mut self, send: bool) -> &mut Self {
        self.send_welcome_email = Some(send);
        self
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({})",
            self.full_name.as_deref().unwrap_or_default(),
            self.email().unwrap_or_default()
        )
    }
}
