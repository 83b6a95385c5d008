//! The generic object mapper.
//!
//! A concrete type implements [`Resource`]: where it lives on the server,
//! how its node is named, which fields it has and how to move between the
//! wire tree and its typed record. [`Entity`] wraps a record with its
//! lifecycle state and performs every REST operation; [`Relation`] holds a
//! foreign key together with the lazily fetched object it points to.

use std::fmt;
use std::ops::{Deref, DerefMut};

use async_trait::async_trait;
use tracing::debug;

use crate::client::Client;
use crate::codec::{as_list, ensure_node};
use crate::error::{KayakoError, Operation, Result};
use crate::identity::Identity;
use crate::result_set::ResultSet;
use crate::transport::{FilePart, RequestData, WireData};

/// When a field must carry a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Never required.
    Optional,
    /// Required to create.
    Create,
    /// Required to update.
    Update,
    /// Required to create and to update.
    Both,
    /// Set by the server only.
    ReadOnly,
}

impl Requirement {
    /// Returns true if the field is required for `op`.
    #[must_use]
    pub fn applies_to(self, op: Operation) -> bool {
        matches!(
            (self, op),
            (Requirement::Create, Operation::Create)
                | (Requirement::Update, Operation::Update)
                | (Requirement::Both, Operation::Create | Operation::Update)
        )
    }
}

/// Schema entry for one mapped field.
pub struct FieldSpec<R> {
    /// Property name on the Rust side.
    pub name: &'static str,
    /// Wire name used in requests and responses.
    pub wire: &'static str,
    /// When the field is required.
    pub requirement: Requirement,
    /// Presence check on a record.
    pub is_set: fn(&R) -> bool,
}

impl<R> fmt::Debug for FieldSpec<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("wire", &self.wire)
            .field("requirement", &self.requirement)
            .finish()
    }
}

/// A REST resource type.
///
/// Implementors are plain records. Everything network-related happens on
/// [`Entity`].
#[async_trait]
pub trait Resource: Sized + Clone + fmt::Debug + Send + Sync + 'static {
    /// Type name used in messages, e.g. `TicketNote`.
    const NAME: &'static str;
    /// Controller path, e.g. `/Tickets/TicketNote`.
    const CONTROLLER: &'static str;
    /// Element name of one object in responses, e.g. `note`.
    const NODE: &'static str;
    /// Mapped fields with their requirements.
    const FIELDS: &'static [FieldSpec<Self>];
    /// Read-only types only allow fetching.
    const READ_ONLY: bool = false;

    /// Maps one decoded node into a record.
    fn parse(data: &crate::transport::WireMap) -> Result<Self>;

    /// Builds the request payload for `op`.
    ///
    /// Called after [`Entity::check_required_fields`].
    fn build(&self, op: Operation) -> Result<RequestData>;

    /// Identity of the record, `None` until the server assigned one.
    fn identity(&self) -> Option<Identity>;

    /// Type-wide operation permission.
    fn permits(op: Operation) -> bool {
        !Self::READ_ONLY || !op.is_mutation()
    }

    /// Instance-level check that depends on field values.
    ///
    /// Runs after the required-field check on create and update.
    fn check_instance(&self, _op: Operation) -> Result<()> {
        Ok(())
    }

    /// Files sent with a create request.
    fn files(&self) -> Vec<FilePart> {
        Vec::new()
    }

    /// Drops every cached related object.
    fn invalidate_relations(&mut self) {}

    /// Runs after a successful update, with the record already re-parsed.
    ///
    /// `previous` is the record as it was before the update was sent.
    async fn after_update(
        _entity: &mut Entity<Self>,
        _previous: Self,
        _client: &Client,
    ) -> Result<()> {
        Ok(())
    }
}

/// Lifecycle state of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Built locally, not yet on the server.
    New,
    /// Mirrors a server object.
    Persisted,
    /// Deleted on the server.
    Deleted,
}

/// A record plus its lifecycle state.
///
/// Dereferences to the record, so getters and setters of the concrete type
/// are called directly on the entity.
#[derive(Clone)]
pub struct Entity<R: Resource> {
    record: R,
    state: State,
}

impl<R: Resource> Entity<R> {
    /// Wraps a locally built record.
    #[must_use]
    pub fn new(record: R) -> Self {
        Self {
            record,
            state: State::New,
        }
    }

    /// Maps a decoded node into a persisted entity.
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::TypeMismatch` if `data` is not a node.
    pub fn from_wire(data: &WireData) -> Result<Self> {
        let node = ensure_node(data, R::NODE)?;
        Ok(Self {
            record: R::parse(node)?,
            state: State::Persisted,
        })
    }

    /// Lifecycle state.
    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    /// Returns true until the entity was created on the server.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.state == State::New
    }

    /// Identity, available once persisted.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        match self.state {
            State::New => None,
            _ => self.record.identity(),
        }
    }

    /// The record.
    #[must_use]
    pub fn record(&self) -> &R {
        &self.record
    }

    /// Consumes the entity.
    #[must_use]
    pub fn into_record(self) -> R {
        self.record
    }

    /// Drops every cached related object.
    pub fn invalidate_relations(&mut self) {
        self.record.invalidate_relations();
    }

    /// Identity of a persisted entity.
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::IllegalState` for new or deleted entities.
    pub fn require_persisted(&self) -> Result<Identity> {
        match self.state {
            State::New => Err(KayakoError::illegal_state(format!(
                "{} is not created yet",
                R::NAME
            ))),
            State::Deleted => Err(KayakoError::illegal_state(format!(
                "{} was deleted",
                R::NAME
            ))),
            State::Persisted => self.record.identity().ok_or_else(|| {
                KayakoError::illegal_state(format!("{} has no id", R::NAME))
            }),
        }
    }

    fn ensure_permitted(op: Operation) -> Result<()> {
        if R::permits(op) {
            Ok(())
        } else {
            Err(KayakoError::illegal_state(format!(
                "you can't {} objects of type {}",
                op,
                R::NAME
            )))
        }
    }

    /// Fails with the first field that is required for `op` but unset.
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::MissingRequiredField` naming the wire field.
    pub fn check_required_fields(&self, op: Operation) -> Result<()> {
        check_required_fields(&self.record, op)
    }

    /// Fetches exactly one object.
    ///
    /// # Arguments
    ///
    /// * `client` - Client handle
    /// * `params` - Positional URL parameters, usually the identity
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::NotFound` if the response holds no object,
    /// and transport errors unchanged.
    pub async fn fetch(client: &Client, params: &[String]) -> Result<Self> {
        Self::ensure_permitted(Operation::Get)?;
        debug!(resource = R::NAME, params = ?params, "Fetching object");

        let data = client.transport().get(R::CONTROLLER, params).await?;
        let node = first_node(&data, R::NODE)
            .ok_or_else(|| KayakoError::not_found(R::CONTROLLER, params))?;
        Self::from_wire(node)
    }

    /// Fetches zero or more objects in server order.
    ///
    /// # Errors
    ///
    /// Returns transport and mapping errors.
    pub async fn fetch_all(client: &Client, params: &[String]) -> Result<ResultSet<R>> {
        Self::ensure_permitted(Operation::GetAll)?;
        debug!(resource = R::NAME, params = ?params, "Fetching objects");

        let data = client.transport().get(R::CONTROLLER, params).await?;
        Self::list_from_wire(&data)
    }

    /// Maps every `R::NODE` child of a response.
    ///
    /// # Errors
    ///
    /// Returns the first mapping error.
    pub fn list_from_wire(data: &WireData) -> Result<ResultSet<R>> {
        as_list(data.get(R::NODE))
            .into_iter()
            .map(Self::from_wire)
            .collect::<Result<Vec<_>>>()
            .map(ResultSet::new)
    }

    /// Creates the object on the server and re-reads it from the response.
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::IllegalState` unless the entity is new,
    /// `KayakoError::MissingRequiredField` before any request is sent, and
    /// transport errors. State is unchanged on failure.
    pub async fn create(&mut self, client: &Client) -> Result<()> {
        if self.state != State::New {
            return Err(KayakoError::illegal_state(format!(
                "{} is already created",
                R::NAME
            )));
        }
        Self::ensure_permitted(Operation::Create)?;
        self.check_required_fields(Operation::Create)?;
        self.record.check_instance(Operation::Create)?;

        let fields = self.record.build(Operation::Create)?;
        let files = self.record.files();
        debug!(resource = R::NAME, fields = fields.len(), files = files.len(), "Creating object");

        let data = client
            .transport()
            .post(R::CONTROLLER, &[], &fields, &files)
            .await?;
        self.resync(&data)?;
        self.state = State::Persisted;
        Ok(())
    }

    /// Sends changed fields to the server and re-reads the object.
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::IllegalState` unless the entity is persisted,
    /// `KayakoError::MissingRequiredField` before any request is sent, and
    /// transport errors.
    pub async fn update(&mut self, client: &Client) -> Result<()> {
        let identity = self.require_persisted()?;
        Self::ensure_permitted(Operation::Update)?;
        self.check_required_fields(Operation::Update)?;
        self.record.check_instance(Operation::Update)?;

        let fields = self.record.build(Operation::Update)?;
        let params = identity.to_params();
        debug!(resource = R::NAME, id = %identity, fields = fields.len(), "Updating object");

        let data = client
            .transport()
            .put(R::CONTROLLER, &params, &fields)
            .await?;
        let previous = self.resync(&data)?;
        R::after_update(self, previous, client).await
    }

    /// Deletes the object on the server.
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::IllegalState` unless the entity is persisted,
    /// and transport errors.
    pub async fn delete(&mut self, client: &Client) -> Result<()> {
        let identity = self.require_persisted()?;
        Self::ensure_permitted(Operation::Delete)?;
        self.record.check_instance(Operation::Delete)?;

        debug!(resource = R::NAME, id = %identity, "Deleting object");
        client
            .transport()
            .delete(R::CONTROLLER, &identity.to_params())
            .await?;
        self.state = State::Deleted;
        Ok(())
    }

    /// Re-fetches every field. Cached related objects are dropped.
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::IllegalState` unless the entity is persisted,
    /// `KayakoError::NotFound` if it no longer exists, and transport errors.
    pub async fn refresh(&mut self, client: &Client) -> Result<()> {
        let identity = self.require_persisted()?;
        Self::ensure_permitted(Operation::Refresh)?;

        let fresh = Self::fetch(client, &identity.to_params()).await?;
        self.record = fresh.record;
        Ok(())
    }

    /// Replaces the record with the response node and returns the old one.
    fn resync(&mut self, data: &WireData) -> Result<R> {
        let node = first_node(data, R::NODE).ok_or_else(|| {
            KayakoError::decode(format!("response holds no {} node", R::NODE))
        })?;
        let fresh = R::parse(ensure_node(node, R::NODE)?)?;
        Ok(std::mem::replace(&mut self.record, fresh))
    }
}

/// Checks a record against its type's field schema.
///
/// # Errors
///
/// Returns `KayakoError::MissingRequiredField` for the first unset field.
pub fn check_required_fields<R: Resource>(record: &R, op: Operation) -> Result<()> {
    match R::FIELDS
        .iter()
        .find(|spec| spec.requirement.applies_to(op) && !(spec.is_set)(record))
    {
        Some(spec) => Err(KayakoError::missing_field(spec.wire, op)),
        None => Ok(()),
    }
}

fn first_node<'a>(data: &'a WireData, node: &str) -> Option<&'a WireData> {
    as_list(data.get(node)).into_iter().next()
}

impl<R: Resource> Deref for Entity<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.record
    }
}

impl<R: Resource> DerefMut for Entity<R> {
    fn deref_mut(&mut self) -> &mut R {
        &mut self.record
    }
}

impl<R: Resource> fmt::Debug for Entity<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("state", &self.state)
            .field("record", &self.record)
            .finish()
    }
}

impl<R: Resource + fmt::Display> fmt::Display for Entity<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.record, f)
    }
}

/// Two entities are equal when both are saved and share an identity.
impl<R: Resource> PartialEq for Entity<R> {
    fn eq(&self, other: &Self) -> bool {
        match (self.identity(), other.identity()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

/// A foreign key and the object it refers to, fetched on demand.
///
/// Setting the id drops the cached object; setting the object sets both.
#[derive(Clone)]
pub struct Relation<T: Resource> {
    id: Option<u64>,
    cached: Option<Box<Entity<T>>>,
}

impl<T: Resource> Relation<T> {
    /// A relation holding only an id.
    #[must_use]
    pub fn new(id: Option<u64>) -> Self {
        Self { id, cached: None }
    }

    /// The foreign key.
    #[must_use]
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    /// Replaces the foreign key and drops the cached object.
    pub fn set_id(&mut self, id: Option<u64>) {
        self.id = id;
        self.cached = None;
    }

    /// Replaces the object and its id; `None` clears both.
    pub fn set(&mut self, entity: Option<Entity<T>>) {
        match entity {
            Some(entity) => {
                self.id = entity.identity().and_then(|id| id.own_id());
                self.cached = Some(Box::new(entity));
            }
            None => {
                self.id = None;
                self.cached = None;
            }
        }
    }

    /// The cached object, without fetching.
    #[must_use]
    pub fn cached(&self) -> Option<&Entity<T>> {
        self.cached.as_deref()
    }

    /// Returns true if an object is cached.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.cached.is_some()
    }

    /// Drops the cached object.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// Returns the related object, fetching it when not cached or when `reload` is set.
    ///
    /// A cached object is returned even while it has no id, e.g. one assigned
    /// with [`Relation::set`] before it was created. Otherwise returns `None`
    /// without a request when no id is set.
    ///
    /// # Errors
    ///
    /// Returns fetch errors; the previous cache is kept on failure.
    pub async fn resolve(&mut self, client: &Client, reload: bool) -> Result<Option<&Entity<T>>> {
        if !reload && self.cached.is_some() {
            return Ok(self.cached.as_deref());
        }
        let Some(id) = self.id else {
            return Ok(None);
        };
        let entity = Entity::<T>::fetch(client, &[id.to_string()]).await?;
        self.cached = Some(Box::new(entity));
        Ok(self.cached.as_deref())
    }
}

impl<T: Resource> Default for Relation<T> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<T: Resource> fmt::Debug for Relation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation")
            .field("id", &self.id)
            .field("loaded", &self.cached.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{to_positive_int, to_string_or_null};
    use crate::transport::WireMap;
    use serde_json::json;

    #[derive(Debug, Clone, Default)]
    struct Widget {
        id: Option<u64>,
        title: Option<String>,
        owner: Option<u64>,
    }

    impl Resource for Widget {
        const NAME: &'static str = "Widget";
        const CONTROLLER: &'static str = "/Test/Widget";
        const NODE: &'static str = "widget";
        const FIELDS: &'static [FieldSpec<Self>] = &[
            FieldSpec {
                name: "title",
                wire: "title",
                requirement: Requirement::Both,
                is_set: |w| w.title.is_some(),
            },
            FieldSpec {
                name: "owner",
                wire: "ownerid",
                requirement: Requirement::Update,
                is_set: |w| w.owner.is_some(),
            },
        ];

        fn parse(data: &WireMap) -> Result<Self> {
            Ok(Widget {
                id: to_positive_int(data.get("id")),
                title: to_string_or_null(data.get("title")),
                owner: to_positive_int(data.get("ownerid")),
            })
        }

        fn build(&self, _op: Operation) -> Result<RequestData> {
            let mut data = RequestData::new();
            data.put_str("title", self.title.as_deref())
                .put_u64("ownerid", self.owner);
            Ok(data)
        }

        fn identity(&self) -> Option<Identity> {
            self.id.map(Identity::single)
        }
    }

    impl fmt::Display for Widget {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.title.as_deref().unwrap_or_default())
        }
    }

    #[test]
    fn test_entity_displays_its_record() {
        let entity = Entity::<Widget>::from_wire(&json!({ "id": "4", "title": "gear" })).unwrap();
        assert_eq!(entity.to_string(), "gear");
        assert_eq!(format!("[{}]", Entity::new(Widget::default())), "[]");
    }

    #[test]
    fn test_requirement_applies_to() {
        assert!(Requirement::Both.applies_to(Operation::Create));
        assert!(Requirement::Both.applies_to(Operation::Update));
        assert!(!Requirement::Create.applies_to(Operation::Update));
        assert!(!Requirement::ReadOnly.applies_to(Operation::Create));
    }

    #[test]
    fn test_check_required_fields_is_per_operation() {
        let entity = Entity::new(Widget {
            title: Some("gear".to_string()),
            ..Widget::default()
        });
        assert!(entity.check_required_fields(Operation::Create).is_ok());

        let err = entity.check_required_fields(Operation::Update).unwrap_err();
        match err {
            KayakoError::MissingRequiredField { field, operation } => {
                assert_eq!(field, "ownerid");
                assert_eq!(operation, Operation::Update);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_from_wire_is_persisted() {
        let entity = Entity::<Widget>::from_wire(&json!({ "id": "4", "title": "gear" })).unwrap();
        assert!(!entity.is_new());
        assert_eq!(entity.identity(), Some(Identity::single(4)));
        assert_eq!(entity.title.as_deref(), Some("gear"));
    }

    #[test]
    fn test_from_wire_rejects_scalar() {
        let err = Entity::<Widget>::from_wire(&json!("4")).unwrap_err();
        assert!(matches!(err, KayakoError::TypeMismatch { .. }));
    }

    #[test]
    fn test_new_entities_are_never_equal() {
        let a = Entity::new(Widget::default());
        let b = Entity::new(Widget::default());
        assert!(a != b);

        let c = Entity::<Widget>::from_wire(&json!({ "id": "4" })).unwrap();
        let d = Entity::<Widget>::from_wire(&json!({ "id": "4", "title": "other" })).unwrap();
        assert!(c == d);
    }

    #[test]
    fn test_new_entity_has_no_identity_even_with_id_field() {
        let entity = Entity::new(Widget {
            id: Some(9),
            ..Widget::default()
        });
        assert_eq!(entity.identity(), None);
        assert!(matches!(
            entity.require_persisted(),
            Err(KayakoError::IllegalState(_))
        ));
    }

    #[test]
    fn test_relation_set_and_set_id() {
        let mut relation: Relation<Widget> = Relation::new(Some(1));
        let widget = Entity::<Widget>::from_wire(&json!({ "id": "5" })).unwrap();

        relation.set(Some(widget));
        assert_eq!(relation.id(), Some(5));
        assert!(relation.is_loaded());

        relation.set_id(Some(6));
        assert_eq!(relation.id(), Some(6));
        assert!(!relation.is_loaded());

        relation.set(None);
        assert_eq!(relation.id(), None);
        assert!(relation.cached().is_none());
    }
}
