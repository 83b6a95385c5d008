//! Knowledgebase categories.

use std::fmt;

use crate::client::Client;
use crate::codec::{
    to_bool, to_constant_opt, to_id_list, to_int, to_positive_int, to_string_or_null,
    ConstantSet,
};
use crate::entity::{Entity, FieldSpec, Relation, Requirement, Resource};
use crate::error::{Operation, Result};
use crate::identity::Identity;
use crate::models::common::{Paging, UserGroupVisibility, LIST_ALL};
use crate::models::staff::Staff;
use crate::result_set::ResultSet;
use crate::transport::{RequestData, WireMap};
use crate::wire_constants;

wire_constants! {
    /// Audience of a knowledgebase category.
    pub enum KnowledgebaseCategoryType("KnowledgebaseCategory", "CATEGORY_TYPE") {
        /// Visible everywhere.
        Global = "1",
        /// Support center only.
        Public = "2",
        /// Staff only.
        Private = "3",
        /// Same as the parent category.
        Inherit = "4",
    }
}

/// A knowledgebase category.
#[derive(Debug, Clone, Default)]
pub struct KnowledgebaseCategory {
    id: Option<u64>,
    title: Option<String>,
    category_type: Option<KnowledgebaseCategoryType>,
    parent: Relation<KnowledgebaseCategory>,
    display_order: Option<i64>,
    article_sort_order: Option<i64>,
    allow_comments: Option<bool>,
    allow_rating: Option<bool>,
    is_published: Option<bool>,
    user_groups: UserGroupVisibility,
    staff_visibility_custom: bool,
    staff_group_ids: Vec<u64>,
    staff: Relation<Staff>,
}

impl Resource for KnowledgebaseCategory {
    const NAME: &'static str = "KnowledgebaseCategory";
    const CONTROLLER: &'static str = "/Knowledgebase/Category";
    const NODE: &'static str = "kbcategory";
    const FIELDS: &'static [FieldSpec<Self>] = &[
        FieldSpec {
            name: "title",
            wire: "title",
            requirement: Requirement::Both,
            is_set: |c| c.title.is_some(),
        },
        FieldSpec {
            name: "category_type",
            wire: "categorytype",
            requirement: Requirement::Both,
            is_set: |c| c.category_type.is_some(),
        },
    ];

    fn parse(data: &WireMap) -> Result<Self> {
        let staff_visibility_custom = to_bool(data.get("staffvisibilitycustom")).unwrap_or(false);
        Ok(KnowledgebaseCategory {
            id: to_positive_int(data.get("id")),
            title: to_string_or_null(data.get("title")),
            category_type: to_constant_opt(data.get("categorytype"))?,
            parent: Relation::new(to_positive_int(data.get("parentkbcategoryid"))),
            display_order: to_int(data.get("displayorder"), None),
            article_sort_order: to_int(data.get("articlesortorder"), None),
            allow_comments: to_bool(data.get("allowcomments")),
            allow_rating: to_bool(data.get("allowrating")),
            is_published: to_bool(data.get("ispublished")),
            user_groups: UserGroupVisibility::parse(
                data.get("uservisibilitycustom"),
                data.get("usergroupidlist").and_then(|l| l.get("usergroupid")),
            ),
            staff_visibility_custom,
            staff_group_ids: if staff_visibility_custom {
                to_id_list(data.get("staffgroupidlist").and_then(|l| l.get("staffgroupid")))
            } else {
                Vec::new()
            },
            staff: Relation::new(to_positive_int(data.get("staffid"))),
        })
    }

    fn build(&self, _op: Operation) -> Result<RequestData> {
        let mut data = RequestData::new();
        data.put_str("title", self.title.as_deref())
            .put_str("categorytype", self.category_type.map(|t| t.wire_value()))
            .put_u64("parentkbcategoryid", self.parent.id())
            .put_i64("displayorder", self.display_order)
            .put_i64("articlesortorder", self.article_sort_order)
            .put_bool("allowcomments", self.allow_comments)
            .put_bool("allowrating", self.allow_rating)
            .put_bool("ispublished", self.is_published)
            .put_bool("uservisibilitycustom", Some(self.user_groups.custom));
        if self.user_groups.custom {
            data.put_list("usergroupidlist", &self.user_groups.user_group_ids);
        }
        data.put_bool("staffvisibilitycustom", Some(self.staff_visibility_custom));
        if self.staff_visibility_custom {
            data.put_list("staffgroupidlist", &self.staff_group_ids);
        }
        data.put_u64("staffid", self.staff.id());
        Ok(data)
    }

    fn identity(&self) -> Option<Identity> {
        self.id.map(Identity::single)
    }

    fn invalidate_relations(&mut self) {
        self.parent.invalidate();
        self.staff.invalidate();
    }
}

impl KnowledgebaseCategory {
    /// A new category.
    #[must_use]
    pub fn create_new(
        title: impl Into<String>,
        category_type: KnowledgebaseCategoryType,
    ) -> Entity<KnowledgebaseCategory> {
        Entity::new(KnowledgebaseCategory {
            title: Some(title.into()),
            category_type: Some(category_type),
            ..KnowledgebaseCategory::default()
        })
    }

    /// Fetches one category.
    pub async fn get(client: &Client, id: u64) -> Result<Entity<KnowledgebaseCategory>> {
        Entity::fetch(client, &[id.to_string()]).await
    }

    /// Fetches categories, optionally one page at a time.
    pub async fn get_all(client: &Client, paging: Paging) -> Result<ResultSet<KnowledgebaseCategory>> {
        let mut params = vec![LIST_ALL.to_string()];
        paging.append_to(&mut params);
        Entity::fetch_all(client, &params).await
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

    /// Audience.
    #[must_use]
    pub fn category_type(&self) -> Option<KnowledgebaseCategoryType> {
        self.category_type
    }

    /// Sets the audience.
    pub fn set_category_type(&mut self, category_type: KnowledgebaseCategoryType) -> &mut Self {
        self.category_type = Some(category_type);
        self
    }

    /// Parent category id.
    #[must_use]
    pub fn parent_category_id(&self) -> Option<u64> {
        self.parent.id()
    }

    /// Sets the parent category id.
    pub fn set_parent_category_id(&mut self, id: Option<u64>) -> &mut Self {
        self.parent.set_id(id);
        self
    }

    /// Parent category, fetched on first use.
    pub async fn parent_category(
        &mut self,
        client: &Client,
        reload: bool,
    ) -> Result<Option<&Entity<KnowledgebaseCategory>>> {
        self.parent.resolve(client, reload).await
    }

    /// Sets the parent category.
    pub fn set_parent_category(&mut self, parent: Option<Entity<KnowledgebaseCategory>>) -> &mut Self {
        self.parent.set(parent);
        self
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

    /// Article sort order.
    #[must_use]
    pub fn article_sort_order(&self) -> Option<i64> {
        self.article_sort_order
    }

    /// Sets the article sort order.
    pub fn set_article_sort_order(&mut self, sort_order: Option<i64>) -> &mut Self {
        self.article_sort_order = sort_order;
        self
    }

    /// Whether articles accept comments.
    #[must_use]
    pub fn allow_comments(&self) -> Option<bool> {
        self.allow_comments
    }

    /// Allows or forbids comments.
    pub fn set_allow_comments(&mut self, allow: bool) -> &mut Self {
        self.allow_comments = Some(allow);
        self
    }

    /// Whether articles can be rated.
    #[must_use]
    pub fn allow_rating(&self) -> Option<bool> {
        self.allow_rating
    }

    /// Allows or forbids rating.
    pub fn set_allow_rating(&mut self, allow: bool) -> &mut Self {
        self.allow_rating = Some(allow);
        self
    }

    /// Whether the category is published.
    #[must_use]
    pub fn is_published(&self) -> Option<bool> {
        self.is_published
    }

    /// Publishes or hides the category.
    pub fn set_is_published(&mut self, published: bool) -> &mut Self {
        self.is_published = Some(published);
        self
    }

    /// User group restriction.
    #[must_use]
    pub fn user_group_visibility(&self) -> &UserGroupVisibility {
        &self.user_groups
    }

    /// Limits the category to the given user groups; an empty list lifts the limit.
    pub fn set_visible_user_groups(&mut self, user_group_ids: Vec<u64>) -> &mut Self {
        self.user_groups = UserGroupVisibility {
            custom: !user_group_ids.is_empty(),
            user_group_ids,
        };
        self
    }

    /// Whether visibility is limited to selected staff groups.
    #[must_use]
    pub fn staff_visibility_custom(&self) -> bool {
        self.staff_visibility_custom
    }

    /// Staff groups that see the category when visibility is limited.
    #[must_use]
    pub fn staff_group_ids(&self) -> &[u64] {
        &self.staff_group_ids
    }

    /// Limits the category to the given staff groups; an empty list lifts the limit.
    pub fn set_visible_staff_groups(&mut self, staff_group_ids: Vec<u64>) -> &mut Self {
        self.staff_visibility_custom = !staff_group_ids.is_empty();
        self.staff_group_ids = staff_group_ids;
        self
    }

    /// Id of the staff member who created the category.
    #[must_use]
    pub fn staff_id(&self) -> Option<u64> {
        self.staff.id()
    }

    /// Sets the creating staff member id.
    pub fn set_staff_id(&mut self, id: Option<u64>) -> &mut Self {
        self.staff.set_id(id);
        self
    }

    /// Creating staff member, fetched on first use.
    pub async fn staff(&mut self, client: &Client, reload: bool) -> Result<Option<&Entity<Staff>>> {
        self.staff.resolve(client, reload).await
    }

    /// Sets the creating staff member.
    pub fn set_staff(&mut self, staff: Option<Entity<Staff>>) -> &mut Self {
        self.staff.set(staff);
        self
    }
}

impl fmt::Display for KnowledgebaseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (category type: {})",
            self.title.as_deref().unwrap_or_default(),
            self.category_type.map(|t| t.wire_value()).unwrap_or_default()
        )
    }
}
