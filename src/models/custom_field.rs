//! Custom field groups and values of tickets, users and organizations.
//!
//! Groups are read-only and only listed per owning object
//! (`GET /Tickets/TicketCustomField/<ticketid>`). Values are written back by
//! posting to the same controller. Only values changed through
//! [`CustomField::set_value`] are sent.

use std::fmt;
use std::marker::PhantomData;

use crate::client::Client;
use crate::codec::{
    as_list, attribute, node_attribute, scalar_text, to_constant_opt, to_int, to_positive_int,
    to_string_or_null,
};
use crate::entity::{Entity, FieldSpec, Resource};
use crate::error::{KayakoError, Operation, Result};
use crate::identity::Identity;
use crate::result_set::ResultSet;
use crate::transport::{FilePart, RequestData, WireData, WireMap};
use crate::wire_constants;

/// Separator between parent and child values of a linked select.
pub const LINKED_SELECT_SEPARATOR: &str = " > ";

const ESCAPED_LINKED_SELECT_SEPARATOR: &str = " &gt; ";

wire_constants! {
    /// What kind of object a custom field group belongs to.
    pub enum CustomFieldGroupType("CustomFieldGroup", "TYPE") {
        /// Ticket fields.
        Ticket = "0",
        /// User fields.
        User = "1",
        /// User organization fields.
        UserOrganization = "2",
        /// Live chat user fields.
        UserLivechat = "3",
        /// Time track fields.
        TimeTrack = "4",
    }
}

wire_constants! {
    /// Input type of a custom field.
    pub enum CustomFieldType("CustomFieldDefinition", "TYPE") {
        /// Single line text.
        Text = "1",
        /// Multi line text.
        TextArea = "2",
        /// Masked text.
        Password = "3",
        /// Check boxes.
        Checkbox = "4",
        /// Radio buttons.
        Radio = "5",
        /// Drop down.
        Select = "6",
        /// Multi select list.
        MultiSelect = "7",
        /// Free-form value.
        Custom = "8",
        /// Two-level select.
        LinkedSelect = "9",
        /// Date.
        Date = "10",
        /// File upload.
        File = "11",
    }
}

/// A custom field owner family: where its groups live.
pub trait CustomFieldKind: Clone + fmt::Debug + Default + Send + Sync + 'static {
    /// Group controller, also used to post values.
    const CONTROLLER: &'static str;
    /// Group type reported for this family.
    const GROUP_TYPE: CustomFieldGroupType;
}

/// Ticket custom fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct TicketFields;

impl CustomFieldKind for TicketFields {
    const CONTROLLER: &'static str = "/Tickets/TicketCustomField";
    const GROUP_TYPE: CustomFieldGroupType = CustomFieldGroupType::Ticket;
}

/// User custom fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserFields;

impl CustomFieldKind for UserFields {
    const CONTROLLER: &'static str = "/Base/UserCustomField";
    const GROUP_TYPE: CustomFieldGroupType = CustomFieldGroupType::User;
}

/// User organization custom fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserOrganizationFields;

impl CustomFieldKind for UserOrganizationFields {
    const CONTROLLER: &'static str = "/Base/UserOrganizationCustomField";
    const GROUP_TYPE: CustomFieldGroupType = CustomFieldGroupType::UserOrganization;
}

/// A value to write into a custom field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomFieldValue {
    /// Text, text area, password, custom and date fields.
    Text(String),
    /// Radio and select fields: the chosen option id.
    Option(u64),
    /// Checkbox and multi select fields: the chosen option ids.
    Options(Vec<u64>),
    /// Linked select: parent option and, optionally, its child option.
    LinkedOption {
        /// Parent option id.
        parent: u64,
        /// Child option id.
        child: Option<u64>,
    },
    /// File field contents.
    File {
        /// File name reported to the server.
        file_name: String,
        /// Raw bytes.
        contents: Vec<u8>,
    },
}

impl CustomFieldValue {
    fn accepted_by(&self, field_type: CustomFieldType) -> bool {
        use CustomFieldType as T;
        match self {
            CustomFieldValue::Text(_) => matches!(
                field_type,
                T::Text | T::TextArea | T::Password | T::Custom | T::Date
            ),
            CustomFieldValue::Option(_) => matches!(field_type, T::Radio | T::Select),
            CustomFieldValue::Options(_) => matches!(field_type, T::Checkbox | T::MultiSelect),
            CustomFieldValue::LinkedOption { .. } => field_type == T::LinkedSelect,
            CustomFieldValue::File { .. } => field_type == T::File,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            CustomFieldValue::Text(_) => "text",
            CustomFieldValue::Option(_) => "option",
            CustomFieldValue::Options(_) => "options",
            CustomFieldValue::LinkedOption { .. } => "linked option",
            CustomFieldValue::File { .. } => "file",
        }
    }
}

/// One custom field with its current value.
#[derive(Debug, Clone, Default)]
pub struct CustomField {
    id: Option<u64>,
    field_type: Option<CustomFieldType>,
    name: String,
    title: Option<String>,
    raw_value: Option<String>,
    file_name: Option<String>,
    pending: Option<CustomFieldValue>,
}

impl CustomField {
    /// Maps a `<field>` element.
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::InvalidEnumValue` for an unknown field type.
    pub fn parse(data: &WireData) -> Result<Self> {
        let name = attribute(data, "name")
            .and_then(scalar_text)
            .map(|s| s.into_owned())
            .unwrap_or_default();
        Ok(CustomField {
            id: to_positive_int(attribute(data, "id")),
            field_type: to_constant_opt(attribute(data, "type"))?,
            name,
            title: to_string_or_null(attribute(data, "title")),
            raw_value: to_string_or_null(Some(data)),
            file_name: to_string_or_null(attribute(data, "filename")),
            pending: None,
        })
    }

    /// Field id.
    #[must_use]
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    /// Input type.
    #[must_use]
    pub fn field_type(&self) -> Option<CustomFieldType> {
        self.field_type
    }

    /// Form name, unique per owner.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display title.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Value as displayed by the server.
    #[must_use]
    pub fn raw_value(&self) -> Option<&str> {
        self.raw_value.as_deref()
    }

    /// File name of a file field.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Parent and child display values of a linked select.
    #[must_use]
    pub fn linked_values(&self) -> Option<(&str, &str)> {
        let raw = self.raw_value.as_deref()?;
        raw.split_once(LINKED_SELECT_SEPARATOR)
            .or_else(|| raw.split_once(ESCAPED_LINKED_SELECT_SEPARATOR))
    }

    /// Value set locally and not yet sent.
    #[must_use]
    pub fn pending_value(&self) -> Option<&CustomFieldValue> {
        self.pending.as_ref()
    }

    /// Sets a new value, sent with the owner's next update.
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::TypeMismatch` if the value does not fit the field type.
    pub fn set_value(&mut self, value: CustomFieldValue) -> Result<()> {
        if let Some(field_type) = self.field_type {
            if !value.accepted_by(field_type) {
                return Err(KayakoError::type_mismatch(
                    format!("value for {} field '{}'", field_type, self.name),
                    value.kind(),
                ));
            }
        }
        if let CustomFieldValue::Text(text) = &value {
            self.raw_value = Some(text.clone());
        }
        self.pending = Some(value);
        Ok(())
    }

    /// Form fields and file parts for the pending value.
    #[must_use]
    pub fn build(&self) -> (RequestData, Vec<FilePart>) {
        let mut data = RequestData::new();
        let mut files = Vec::new();
        match &self.pending {
            None => {}
            Some(CustomFieldValue::Text(text)) => {
                data.put_str(&self.name, Some(text));
            }
            Some(CustomFieldValue::Option(id)) => {
                data.put_u64(&self.name, Some(*id));
            }
            Some(CustomFieldValue::Options(ids)) => {
                data.put_list(&self.name, ids);
            }
            Some(CustomFieldValue::LinkedOption { parent, child }) => {
                data.put_u64(&format!("{}[0]", self.name), Some(*parent));
                if let Some(child) = child {
                    data.put_u64(&format!("{}[1][{}]", self.name, parent), Some(*child));
                }
            }
            Some(CustomFieldValue::File {
                file_name,
                contents,
            }) => files.push(FilePart {
                field: self.name.clone(),
                file_name: file_name.clone(),
                contents: contents.clone(),
            }),
        }
        (data, files)
    }
}

impl fmt::Display for CustomField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}",
            self.title.as_deref().unwrap_or(&self.name),
            self.raw_value.as_deref().unwrap_or_default()
        )
    }
}

/// A group of custom fields.
#[derive(Debug, Clone, Default)]
pub struct CustomFieldGroup<K: CustomFieldKind> {
    id: Option<u64>,
    title: Option<String>,
    display_order: Option<i64>,
    fields: Vec<CustomField>,
    kind: PhantomData<K>,
}

impl<K: CustomFieldKind> Resource for CustomFieldGroup<K> {
    const NAME: &'static str = "CustomFieldGroup";
    const CONTROLLER: &'static str = K::CONTROLLER;
    const NODE: &'static str = "group";
    const FIELDS: &'static [FieldSpec<Self>] = &[];
    const READ_ONLY: bool = true;

    fn parse(data: &WireMap) -> Result<Self> {
        let fields = as_list(data.get("field"))
            .into_iter()
            .map(CustomField::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(CustomFieldGroup {
            id: to_positive_int(node_attribute(data, "id")),
            title: to_string_or_null(node_attribute(data, "title")),
            display_order: to_int(node_attribute(data, "displayorder"), None),
            fields,
            kind: PhantomData,
        })
    }

    fn build(&self, _op: Operation) -> Result<RequestData> {
        let mut data = RequestData::new();
        for field in &self.fields {
            data.merge(field.build().0);
        }
        Ok(data)
    }

    fn identity(&self) -> Option<Identity> {
        self.id.map(Identity::single)
    }

    fn permits(op: Operation) -> bool {
        op == Operation::GetAll
    }

    fn files(&self) -> Vec<FilePart> {
        self.fields.iter().flat_map(|f| f.build().1).collect()
    }
}

impl<K: CustomFieldKind> CustomFieldGroup<K> {
    /// Fetches the groups, with values, of one owning object.
    pub async fn get_all(client: &Client, owner_id: u64) -> Result<ResultSet<Self>> {
        Entity::fetch_all(client, &[owner_id.to_string()]).await
    }

    /// Group type of this family.
    #[must_use]
    pub fn group_type(&self) -> CustomFieldGroupType {
        K::GROUP_TYPE
    }

    /// Group id.
    #[must_use]
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    /// Title.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Display order.
    #[must_use]
    pub fn display_order(&self) -> Option<i64> {
        self.display_order
    }

    /// Fields in display order.
    #[must_use]
    pub fn fields(&self) -> &[CustomField] {
        &self.fields
    }

    /// Mutable field by name.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut CustomField> {
        self.fields.iter_mut().find(|f| f.name == name)
    }
}

impl<K: CustomFieldKind> fmt::Display for CustomFieldGroup<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} fields)",
            self.title.as_deref().unwrap_or_default(),
            self.fields.len()
        )
    }
}

/// Capability of objects that carry custom fields.
///
/// Implementors only expose a cache slot; loading, editing and saving live
/// on `Entity<R>`.
pub trait HasCustomFields: Resource {
    /// Owner family.
    type Kind: CustomFieldKind;

    /// Loaded groups, if any.
    fn custom_field_slot(&self) -> Option<&ResultSet<CustomFieldGroup<Self::Kind>>>;

    /// Mutable cache slot.
    fn custom_field_slot_mut(&mut self) -> &mut Option<ResultSet<CustomFieldGroup<Self::Kind>>>;
}

impl<R: HasCustomFields> Entity<R> {
    fn custom_field_owner_id(&self) -> Result<u64> {
        let identity = self.require_persisted().map_err(|_| {
            KayakoError::illegal_state(
                "custom fields are not available for new objects, create the object first",
            )
        })?;
        identity
            .own_id()
            .ok_or_else(|| KayakoError::illegal_state(format!("{} has no numeric id", R::NAME)))
    }

    /// Custom field groups, fetched on first use.
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::IllegalState` for new objects, and fetch errors.
    pub async fn custom_field_groups(
        &mut self,
        client: &Client,
        reload: bool,
    ) -> Result<&ResultSet<CustomFieldGroup<R::Kind>>> {
        let owner_id = self.custom_field_owner_id()?;
        if reload || self.custom_field_slot().is_none() {
            let groups = CustomFieldGroup::<R::Kind>::get_all(client, owner_id).await?;
            *self.custom_field_slot_mut() = Some(groups);
        }
        self.custom_field_slot()
            .ok_or_else(|| KayakoError::illegal_state("custom fields were not loaded"))
    }

    /// Every custom field across groups.
    ///
    /// # Errors
    ///
    /// Same as [`Entity::custom_field_groups`].
    pub async fn custom_fields(&mut self, client: &Client, reload: bool) -> Result<Vec<&CustomField>> {
        let groups = self.custom_field_groups(client, reload).await?;
        Ok(groups.iter().flat_map(|g| g.fields().iter()).collect())
    }

    /// One custom field by name.
    ///
    /// # Errors
    ///
    /// Same as [`Entity::custom_field_groups`].
    pub async fn custom_field(&mut self, client: &Client, name: &str) -> Result<Option<&CustomField>> {
        let groups = self.custom_field_groups(client, false).await?;
        Ok(groups
            .iter()
            .flat_map(|g| g.fields().iter())
            .find(|f| f.name() == name))
    }

    /// Sets a custom field value, sent by the next `update`.
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::Validation` for an unknown field name and
    /// `KayakoError::TypeMismatch` for a value of the wrong kind.
    pub async fn set_custom_field_value(
        &mut self,
        client: &Client,
        name: &str,
        value: CustomFieldValue,
    ) -> Result<()> {
        self.custom_field_groups(client, false).await?;
        let field = self
            .custom_field_slot_mut()
            .as_mut()
            .and_then(|groups| groups.iter_mut().find_map(|g| g.field_mut(name)))
            .ok_or_else(|| KayakoError::validation(format!("unknown custom field '{}'", name)))?;
        field.set_value(value)
    }

    /// Posts pending custom field values and reloads the groups.
    ///
    /// Does nothing when the groups were never loaded or nothing changed.
    ///
    /// # Errors
    ///
    /// Returns transport errors.
    pub async fn update_custom_fields(&mut self, client: &Client) -> Result<()> {
        let Some(groups) = self.custom_field_slot() else {
            return Ok(());
        };

        let mut data = RequestData::new();
        let mut files = Vec::new();
        for group in groups.iter() {
            for field in group.fields() {
                let (field_data, field_files) = field.build();
                data.merge(field_data);
                files.extend(field_files);
            }
        }
        if data.is_empty() && files.is_empty() {
            return Ok(());
        }

        let owner_id = self.custom_field_owner_id()?;
        tracing::debug!(
            resource = R::NAME,
            id = owner_id,
            fields = data.len(),
            files = files.len(),
            "Updating custom fields"
        );
        client
            .transport()
            .post(R::Kind::CONTROLLER, &[owner_id.to_string()], &data, &files)
            .await?;

        self.custom_field_groups(client, true).await?;
        Ok(())
    }

    /// Carries loaded groups over from the record before an update, then saves them.
    ///
    /// # Errors
    ///
    /// Returns transport errors.
    pub async fn update_custom_fields_from(&mut self, mut previous: R, client: &Client) -> Result<()> {
        if let Some(groups) = previous.custom_field_slot_mut().take() {
            *self.custom_field_slot_mut() = Some(groups);
        }
        self.update_custom_fields(client).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn field(field_type: &str, name: &str, value: &str) -> CustomField {
        CustomField::parse(&json!({
            "_attributes": { "id": "1", "type": field_type, "name": name, "title": "Field" },
            "_contents": value
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_field_attributes() {
        let f = field("1", "abc123", "hello");
        assert_eq!(f.field_type(), Some(CustomFieldType::Text));
        assert_eq!(f.name(), "abc123");
        assert_eq!(f.raw_value(), Some("hello"));
        assert!(f.pending_value().is_none());
    }

    #[test]
    fn test_unchanged_field_builds_nothing() {
        let (data, files) = field("1", "abc", "hello").build();
        assert!(data.is_empty());
        assert!(files.is_empty());
    }

    #[test]
    fn test_linked_select_builds_parent_and_child() {
        let mut f = field("9", "region", "Europe > Poland");
        assert_eq!(f.linked_values(), Some(("Europe", "Poland")));

        f.set_value(CustomFieldValue::LinkedOption {
            parent: 4,
            child: Some(11),
        })
        .unwrap();
        let (data, _) = f.build();
        assert_eq!(data.scalar("region[0]"), Some("4"));
        assert_eq!(data.scalar("region[1][4]"), Some("11"));
    }

    #[test]
    fn test_linked_select_parent_only() {
        let mut f = field("9", "region", "");
        f.set_value(CustomFieldValue::LinkedOption {
            parent: 4,
            child: None,
        })
        .unwrap();
        let (data, _) = f.build();
        assert_eq!(data.len(), 1);
        assert_eq!(data.scalar("region[0]"), Some("4"));
    }

    #[test]
    fn test_escaped_linked_separator() {
        let f = field("9", "region", "Europe &gt; Poland");
        assert_eq!(f.linked_values(), Some(("Europe", "Poland")));
    }

    #[test]
    fn test_value_kind_must_match_type() {
        let mut f = field("6", "color", "Red");
        let err = f.set_value(CustomFieldValue::Text("Blue".into())).unwrap_err();
        assert!(matches!(err, KayakoError::TypeMismatch { .. }));
        assert!(f.set_value(CustomFieldValue::Option(3)).is_ok());
    }

    #[test]
    fn test_file_value_becomes_file_part() {
        let mut f = field("11", "scan", "");
        f.set_value(CustomFieldValue::File {
            file_name: "scan.pdf".into(),
            contents: vec![1, 2, 3],
        })
        .unwrap();
        let (data, files) = f.build();
        assert!(data.is_empty());
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].field, "scan");
        assert_eq!(files[0].file_name, "scan.pdf");
    }

    #[test]
    fn test_group_parse_and_display() {
        let group = Entity::<CustomFieldGroup<TicketFields>>::from_wire(&json!({
            "_attributes": { "id": "2", "title": "Extra", "displayorder": "1" },
            "field": [
                { "_attributes": { "id": "1", "type": "1", "name": "a", "title": "A" }, "_contents": "x" },
                { "_attributes": { "id": "2", "type": "6", "name": "b", "title": "B" }, "_contents": "y" }
            ]
        }))
        .unwrap();
        assert_eq!(group.to_string(), "Extra (2 fields)");
        assert_eq!(group.group_type(), CustomFieldGroupType::Ticket);
    }

    #[test]
    fn test_group_operations_are_restricted() {
        assert!(CustomFieldGroup::<UserFields>::permits(Operation::GetAll));
        assert!(!CustomFieldGroup::<UserFields>::permits(Operation::Get));
        assert!(!CustomFieldGroup::<UserFields>::permits(Operation::Refresh));
        assert!(!CustomFieldGroup::<UserFields>::permits(Operation::Create));
    }
}
