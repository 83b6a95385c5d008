//! Comments on news items, knowledgebase articles and troubleshooter steps.
//!
//! The three comment controllers share one wire shape and differ only in
//! path, node name and the field naming the commented item. Those live on
//! a [`CommentKind`]; everything else is [`Comment`].

use std::fmt;

use chrono::{DateTime, Utc};

use crate::client::Client;
use crate::codec::{
    format_timestamp, to_constant_opt, to_positive_int, to_string_or_null, to_timestamp,
    ConstantSet,
};
use crate::entity::{Entity, FieldSpec, Relation, Requirement, Resource};
use crate::error::{KayakoError, Operation, Result};
use crate::identity::Identity;
use crate::models::common::LIST_ALL;
use crate::models::staff::Staff;
use crate::models::user::User;
use crate::result_set::ResultSet;
use crate::transport::{RequestData, WireMap};
use crate::wire_constants;

wire_constants! {
    /// Who wrote a comment.
    pub enum CommentCreatorType("Comment", "CREATOR_TYPE") {
        /// A staff member.
        Staff = "1",
        /// A user or a visitor known by name.
        User = "2",
    }
}

wire_constants! {
    /// Moderation state of a comment.
    pub enum CommentStatus("Comment", "STATUS") {
        /// Awaiting approval.
        Pending = "1",
        /// Approved.
        Approved = "2",
        /// Marked as spam.
        Spam = "3",
    }
}

/// What a comment family is attached to.
pub trait CommentKind: fmt::Debug + Clone + Default + Send + Sync + 'static {
    /// Type name used in messages.
    const NAME: &'static str;
    /// Controller path.
    const CONTROLLER: &'static str;
    /// Element name of one comment.
    const NODE: &'static str;
    /// Wire field holding the id of the commented item.
    const ITEM_FIELD: &'static str;
}

/// Comments on news items.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewsComments;

impl CommentKind for NewsComments {
    const NAME: &'static str = "NewsComment";
    const CONTROLLER: &'static str = "/News/Comment";
    const NODE: &'static str = "newsitemcomment";
    const ITEM_FIELD: &'static str = "newsitemid";
}

/// Comments on knowledgebase articles.
#[derive(Debug, Clone, Copy, Default)]
pub struct KnowledgebaseComments;

impl CommentKind for KnowledgebaseComments {
    const NAME: &'static str = "KnowledgebaseComment";
    const CONTROLLER: &'static str = "/Knowledgebase/Comment";
    const NODE: &'static str = "kbarticlecomment";
    const ITEM_FIELD: &'static str = "kbarticleid";
}

/// Comments on troubleshooter steps.
#[derive(Debug, Clone, Copy, Default)]
pub struct TroubleshooterComments;

impl CommentKind for TroubleshooterComments {
    const NAME: &'static str = "TroubleshooterComment";
    const CONTROLLER: &'static str = "/Troubleshooter/Comment";
    const NODE: &'static str = "troubleshooterstepcomment";
    const ITEM_FIELD: &'static str = "troubleshooterstepid";
}

/// A news item comment.
pub type NewsComment = Comment<NewsComments>;
/// A knowledgebase article comment.
pub type KnowledgebaseComment = Comment<KnowledgebaseComments>;
/// A troubleshooter step comment.
pub type TroubleshooterComment = Comment<TroubleshooterComments>;

/// Author of a comment.
#[derive(Debug, Clone)]
pub enum CommentCreator {
    /// A staff member.
    Staff(Entity<Staff>),
    /// A registered user.
    User(Entity<User>),
    /// A visitor known only by name; an empty name clears the creator.
    NameOnly(String),
    /// No creator.
    Cleared,
}

/// A comment.
#[derive(Debug, Clone, Default)]
pub struct Comment<K: CommentKind> {
    id: Option<u64>,
    item_id: Option<u64>,
    creator_type: Option<CommentCreatorType>,
    creator_staff: Relation<Staff>,
    creator_user: Relation<User>,
    full_name: Option<String>,
    email: Option<String>,
    ip_address: Option<String>,
    dateline: Option<DateTime<Utc>>,
    parent: Relation<Comment<K>>,
    status: Option<CommentStatus>,
    user_agent: Option<String>,
    referrer: Option<String>,
    parent_url: Option<String>,
    contents: Option<String>,
    kind: K,
}

impl<K: CommentKind> Resource for Comment<K> {
    const NAME: &'static str = K::NAME;
    const CONTROLLER: &'static str = K::CONTROLLER;
    const NODE: &'static str = K::NODE;
    const FIELDS: &'static [FieldSpec<Self>] = &[
        FieldSpec {
            name: "item_id",
            wire: K::ITEM_FIELD,
            requirement: Requirement::Create,
            is_set: |c| c.item_id.is_some(),
        },
        FieldSpec {
            name: "creator_type",
            wire: "creatortype",
            requirement: Requirement::Create,
            is_set: |c| c.creator_type.is_some(),
        },
        FieldSpec {
            name: "contents",
            wire: "contents",
            requirement: Requirement::Create,
            is_set: |c| c.contents.is_some(),
        },
    ];

    fn parse(data: &WireMap) -> Result<Self> {
        let creator_type = to_constant_opt(data.get("creatortype"))?;
        let creator_id = to_positive_int(data.get("creatorid"));

        let mut comment = Comment {
            id: to_positive_int(data.get("id")),
            item_id: to_positive_int(data.get(K::ITEM_FIELD)),
            creator_type,
            full_name: to_string_or_null(data.get("fullname")),
            email: to_string_or_null(data.get("email")),
            ip_address: to_string_or_null(data.get("ipaddress")),
            dateline: to_timestamp(data.get("dateline")),
            parent: Relation::new(to_positive_int(data.get("parentcommentid"))),
            status: to_constant_opt(data.get("commentstatus"))?,
            user_agent: to_string_or_null(data.get("useragent")),
            referrer: to_string_or_null(data.get("referrer")),
            parent_url: to_string_or_null(data.get("parenturl")),
            contents: to_string_or_null(data.get("contents")),
            ..Comment::default()
        };
        match creator_type {
            Some(CommentCreatorType::Staff) => comment.creator_staff.set_id(creator_id),
            Some(CommentCreatorType::User) => comment.creator_user.set_id(creator_id),
            None => {}
        }
        Ok(comment)
    }

    fn build(&self, op: Operation) -> Result<RequestData> {
        let mut data = RequestData::new();
        match self.creator_type {
            Some(CommentCreatorType::Staff) => {
                let creator_id = self
                    .creator_staff
                    .id()
                    .ok_or_else(|| KayakoError::missing_field("creatorid", op))?;
                data.put_u64("creatorid", Some(creator_id));
            }
            Some(CommentCreatorType::User) => match (self.creator_user.id(), &self.full_name) {
                (Some(creator_id), _) => {
                    data.put_u64("creatorid", Some(creator_id));
                }
                (None, Some(full_name)) => {
                    data.put_str("fullname", Some(full_name));
                }
                (None, None) => return Err(KayakoError::missing_field("creatorid", op)),
            },
            None => {}
        }

        data.put_u64(K::ITEM_FIELD, self.item_id)
            .put_str("contents", self.contents.as_deref())
            .put_str("creatortype", self.creator_type.map(|t| t.wire_value()))
            .put_str("email", self.email.as_deref())
            .put_u64("parentcommentid", self.parent.id());
        Ok(data)
    }

    fn identity(&self) -> Option<Identity> {
        self.id.map(Identity::single)
    }

    fn permits(op: Operation) -> bool {
        op != Operation::Update
    }

    fn invalidate_relations(&mut self) {
        self.creator_staff.invalidate();
        self.creator_user.invalidate();
        self.parent.invalidate();
    }
}

impl<K: CommentKind> Comment<K> {
    /// A new comment on the item with id `item_id`.
    #[must_use]
    pub fn create_new(
        item_id: u64,
        creator: CommentCreator,
        contents: impl Into<String>,
    ) -> Entity<Comment<K>> {
        let mut comment = Comment {
            item_id: Some(item_id),
            ..Comment::default()
        };
        comment.set_creator(creator).set_contents(contents);
        Entity::new(comment)
    }

    /// Fetches one comment.
    pub async fn get(client: &Client, id: u64) -> Result<Entity<Comment<K>>> {
        Entity::fetch(client, &[id.to_string()]).await
    }

    /// Fetches every comment of an item.
    pub async fn get_all(client: &Client, item_id: u64) -> Result<ResultSet<Comment<K>>> {
        Entity::fetch_all(client, &[LIST_ALL.to_string(), item_id.to_string()]).await
    }

    /// Server id.
    #[must_use]
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    /// Id of the commented item.
    #[must_use]
    pub fn item_id(&self) -> Option<u64> {
        self.item_id
    }

    /// Sets the id of the commented item.
    pub fn set_item_id(&mut self, item_id: Option<u64>) -> &mut Self {
        self.item_id = item_id;
        self
    }

    /// Author kind.
    #[must_use]
    pub fn creator_type(&self) -> Option<CommentCreatorType> {
        self.creator_type
    }

    /// Sets the author kind.
    ///
    /// Switching to staff drops the name and the cached user; switching to
    /// user drops the cached staff member.
    pub fn set_creator_type(&mut self, creator_type: CommentCreatorType) -> &mut Self {
        let creator_id = self.creator_id();
        self.creator_type = Some(creator_type);
        match creator_type {
            CommentCreatorType::Staff => {
                self.full_name = None;
                self.creator_user.set(None);
                self.creator_staff.set_id(creator_id);
            }
            CommentCreatorType::User => {
                self.creator_staff.set(None);
                self.creator_user.set_id(creator_id);
            }
        }
        self
    }

    /// Author id, for staff or user authors.
    #[must_use]
    pub fn creator_id(&self) -> Option<u64> {
        match self.creator_type {
            Some(CommentCreatorType::Staff) => self.creator_staff.id(),
            Some(CommentCreatorType::User) => self.creator_user.id(),
            None => None,
        }
    }

    /// Sets the author id; the author name is dropped.
    pub fn set_creator_id(&mut self, creator_id: Option<u64>) -> &mut Self {
        match self.creator_type {
            Some(CommentCreatorType::Staff) => self.creator_staff.set_id(creator_id),
            Some(CommentCreatorType::User) => self.creator_user.set_id(creator_id),
            None => {}
        }
        self.full_name = None;
        self
    }

    /// Staff author, fetched on first use.
    ///
    /// Returns `None` for user authors.
    pub async fn creator_staff(&mut self, client: &Client, reload: bool) -> Result<Option<&Entity<Staff>>> {
        if self.creator_type != Some(CommentCreatorType::Staff) {
            return Ok(None);
        }
        self.creator_staff.resolve(client, reload).await
    }

    /// User author, fetched on first use.
    ///
    /// Returns `None` for staff authors and visitors known only by name.
    pub async fn creator_user(&mut self, client: &Client, reload: bool) -> Result<Option<&Entity<User>>> {
        if self.creator_type != Some(CommentCreatorType::User) {
            return Ok(None);
        }
        self.creator_user.resolve(client, reload).await
    }

    /// Sets the author.
    pub fn set_creator(&mut self, creator: CommentCreator) -> &mut Self {
        match creator {
            CommentCreator::Staff(staff) => {
                self.creator_type = Some(CommentCreatorType::Staff);
                self.creator_staff.set(Some(staff));
                self.creator_user.set(None);
            }
            CommentCreator::User(user) => {
                self.creator_type = Some(CommentCreatorType::User);
                self.creator_user.set(Some(user));
                self.creator_staff.set(None);
            }
            CommentCreator::NameOnly(name) if !name.is_empty() => {
                self.set_full_name(name);
            }
            CommentCreator::NameOnly(_) | CommentCreator::Cleared => {
                self.creator_type = None;
                self.creator_staff.set(None);
                self.creator_user.set(None);
            }
        }
        self
    }

    /// Author name.
    #[must_use]
    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    /// Sets the author name; the author becomes a user known only by name.
    pub fn set_full_name(&mut self, full_name: impl Into<String>) -> &mut Self {
        self.full_name = Some(full_name.into());
        self.creator_type = Some(CommentCreatorType::User);
        self.creator_staff.set(None);
        self.creator_user.set(None);
        self
    }

    /// Author email.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Sets the author email.
    pub fn set_email(&mut self, email: Option<String>) -> &mut Self {
        self.email = email;
        self
    }

    /// Author IP address.
    #[must_use]
    pub fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }

    /// Posting time.
    #[must_use]
    pub fn dateline(&self) -> Option<DateTime<Utc>> {
        self.dateline
    }

    /// Posting time formatted with `format`, or the configured datetime format.
    #[must_use]
    pub fn dateline_formatted(&self, client: &Client, format: Option<&str>) -> Option<String> {
        format_timestamp(
            self.dateline,
            format.unwrap_or(client.config().datetime_format.as_str()),
        )
    }

    /// Id of the comment this one replies to.
    #[must_use]
    pub fn parent_comment_id(&self) -> Option<u64> {
        self.parent.id()
    }

    /// Sets the id of the comment this one replies to.
    pub fn set_parent_comment_id(&mut self, id: Option<u64>) -> &mut Self {
        self.parent.set_id(id);
        self
    }

    /// Comment this one replies to, fetched on first use.
    pub async fn parent_comment(
        &mut self,
        client: &Client,
        reload: bool,
    ) -> Result<Option<&Entity<Comment<K>>>> {
        self.parent.resolve(client, reload).await
    }

    /// Sets the comment this one replies to.
    pub fn set_parent_comment(&mut self, parent: Option<Entity<Comment<K>>>) -> &mut Self {
        self.parent.set(parent);
        self
    }

    /// Moderation state.
    #[must_use]
    pub fn status(&self) -> Option<CommentStatus> {
        self.status
    }

    /// Author browser.
    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// Page the comment was written on.
    #[must_use]
    pub fn referrer(&self) -> Option<&str> {
        self.referrer.as_deref()
    }

    /// URL of the commented item.
    #[must_use]
    pub fn parent_url(&self) -> Option<&str> {
        self.parent_url.as_deref()
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

    /// Comment family marker.
    #[must_use]
    pub fn kind(&self) -> &K {
        &self.kind
    }
}

impl<K: CommentKind> fmt::Display for Comment<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let contents = self.contents.as_deref().unwrap_or_default();
        let head: String = contents
            .chars()
            .take(20)
            .map(|c| if c == '\n' { ' ' } else { c })
            .collect();
        write!(
            f,
            "{}{} (author: {}, status: {})",
            head,
            if contents.chars().count() > 20 { "..." } else { "" },
            self.full_name.as_deref().unwrap_or_default(),
            self.status.map(|s| s.wire_value()).unwrap_or("0")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::to_constant;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_creator_type_constants() {
        let creator: CommentCreatorType = to_constant(Some(&json!("2"))).unwrap();
        assert_eq!(creator, CommentCreatorType::User);

        let err = to_constant::<CommentCreatorType>(Some(&json!("3"))).unwrap_err();
        assert!(matches!(err, KayakoError::InvalidEnumValue { .. }));
    }

    #[test]
    fn test_parse_news_comment() {
        let comment = Entity::<NewsComment>::from_wire(&json!({
            "id": "3",
            "newsitemid": "9",
            "creatortype": "1",
            "creatorid": "7",
            "fullname": "Ann Lee",
            "parentcommentid": "0",
            "commentstatus": "2",
            "contents": "Thanks for the update,\nvery helpful"
        }))
        .unwrap();
        assert_eq!(comment.item_id(), Some(9));
        assert_eq!(comment.creator_id(), Some(7));
        assert_eq!(comment.parent_comment_id(), None);
        assert_eq!(
            comment.to_string(),
            "Thanks for the updat... (author: Ann Lee, status: 2)"
        );
    }

    #[test]
    fn test_name_only_author() {
        let comment = KnowledgebaseComment::create_new(5, CommentCreator::NameOnly("Visitor".into()), "Nice");
        assert_eq!(comment.creator_type(), Some(CommentCreatorType::User));

        let data = comment.build(Operation::Create).unwrap();
        assert_eq!(data.scalar("kbarticleid"), Some("5"));
        assert_eq!(data.scalar("fullname"), Some("Visitor"));
        assert_eq!(data.scalar("creatortype"), Some("2"));
        assert!(!data.contains("creatorid"));
    }

    #[test]
    fn test_staff_author_requires_id() {
        let mut comment = TroubleshooterComment::create_new(2, CommentCreator::Cleared, "Step fixed it");
        assert_eq!(comment.creator_type(), None);
        assert!(matches!(
            comment.check_required_fields(Operation::Create),
            Err(KayakoError::MissingRequiredField { .. })
        ));

        comment.set_creator_type(CommentCreatorType::Staff);
        let err = comment.build(Operation::Create).unwrap_err();
        match err {
            KayakoError::MissingRequiredField { field, .. } => assert_eq!(field, "creatorid"),
            other => panic!("unexpected error: {other:?}"),
        }

        comment.set_creator_id(Some(7));
        let data = comment.build(Operation::Create).unwrap();
        assert_eq!(data.scalar("creatorid"), Some("7"));
        assert_eq!(data.scalar("troubleshooterstepid"), Some("2"));
    }
}
