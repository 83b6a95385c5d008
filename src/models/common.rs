//! Types shared across the entity catalog.
//!
//! Colors, visibility kinds and the paging rules of `ListAll` requests.

use crate::codec::{to_bool, to_id_list};
use crate::transport::{RequestData, WireData};
use crate::wire_constants;

/// Page size sent when only a starting id is given.
pub const DEFAULT_PAGE_SIZE: u64 = 1000;

/// First positional parameter of every collection request.
pub const LIST_ALL: &str = "ListAll";

wire_constants! {
    /// Color of a ticket note or time track entry.
    pub enum NoteColor("TicketNote", "COLOR") {
        /// Yellow.
        Yellow = "1",
        /// Purple.
        Purple = "2",
        /// Blue.
        Blue = "3",
        /// Green.
        Green = "4",
        /// Red.
        Red = "5",
    }
}

wire_constants! {
    /// Whether a lookup item is visible to users or staff only.
    pub enum Visibility("TicketPriority", "TYPE") {
        /// Visible in the support center.
        Public = "public",
        /// Staff only.
        Private = "private",
    }
}

/// Paging parameters for `ListAll` requests.
///
/// When a starting id is given without a page size, the page size defaults
/// to [`DEFAULT_PAGE_SIZE`] because the server reads both positionally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Paging {
    /// Maximum number of items.
    pub max_items: Option<u64>,
    /// Id of the first item.
    pub starting_id: Option<u64>,
}

impl Paging {
    /// Limits the number of items.
    #[must_use]
    pub fn with_max_items(mut self, max_items: u64) -> Self {
        self.max_items = Some(max_items);
        self
    }

    /// Starts listing at the given id.
    #[must_use]
    pub fn with_starting_id(mut self, starting_id: u64) -> Self {
        self.starting_id = Some(starting_id);
        self
    }

    /// Appends the paging parameters.
    pub fn append_to(self, params: &mut Vec<String>) {
        if let Some(max) = self.max_items {
            params.push(max.to_string());
        }
        if let Some(start) = self.starting_id.filter(|s| *s > 0) {
            if self.max_items.map_or(true, |m| m == 0) {
                params.push(DEFAULT_PAGE_SIZE.to_string());
            }
            params.push(start.to_string());
        }
    }
}

/// Joins ids with commas, or `-1` when there are none.
#[must_use]
pub fn id_filter(ids: &[u64]) -> String {
    if ids.is_empty() {
        "-1".to_string()
    } else {
        ids.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Restriction of an item to selected user groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserGroupVisibility {
    /// Whether visibility is limited to `user_group_ids`.
    pub custom: bool,
    /// Groups that see the item when `custom` is set.
    pub user_group_ids: Vec<u64>,
}

impl UserGroupVisibility {
    /// Reads `uservisibilitycustom` and the group ids listed under `ids`.
    #[must_use]
    pub fn parse(custom: Option<&WireData>, ids: Option<&WireData>) -> Self {
        let custom = to_bool(custom).unwrap_or(false);
        Self {
            custom,
            user_group_ids: if custom { to_id_list(ids) } else { Vec::new() },
        }
    }

    /// Returns true if members of the group see the item.
    #[must_use]
    pub fn allows(&self, user_group_id: u64) -> bool {
        !self.custom || self.user_group_ids.contains(&user_group_id)
    }

    /// Writes the flag and, when custom, the group id list.
    pub fn append_to(&self, data: &mut RequestData) {
        data.put_bool("uservisibilitycustom", Some(self.custom));
        if self.custom {
            data.put_list("usergroupid", &self.user_group_ids);
        }
    }
}
