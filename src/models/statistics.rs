//! Ticket counts per department, status, type and owner.
//!
//! Read from `/Tickets/TicketCount`. The server reports the ticket type of
//! every department bucket as `0`, so all types end up under
//! [`StatsKey::Unknown`]; the bucket is kept as reported.

use std::fmt;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use crate::codec::{
    as_list, attribute, format_timestamp, node_attribute, to_positive_int, to_timestamp,
};
use crate::transport::{WireData, WireMap};

/// Controller answering ticket counts.
pub const STATISTICS_CONTROLLER: &str = "/Tickets/TicketCount";

/// Key of a statistics bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatsKey {
    /// A department, status, type or staff id.
    Id(u64),
    /// No department or type, e.g. tickets in the trash.
    Unknown,
    /// Tickets without an owner.
    Unassigned,
}

impl StatsKey {
    fn from_id(id: Option<u64>, fallback: StatsKey) -> Self {
        id.map_or(fallback, StatsKey::Id)
    }
}

impl fmt::Display for StatsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatsKey::Id(id) => write!(f, "{}", id),
            StatsKey::Unknown => f.write_str("unknown"),
            StatsKey::Unassigned => f.write_str("unassigned"),
        }
    }
}

impl Serialize for StatsKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Counts of one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TicketCount {
    /// Last activity, formatted with the configured datetime format.
    pub last_activity: Option<String>,
    /// Number of tickets.
    pub total_items: u64,
    /// Number of unresolved tickets, when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_unresolved_items: Option<u64>,
}

impl TicketCount {
    fn from_attributes(node: &WireData, datetime_format: &str) -> Self {
        TicketCount {
            last_activity: format_timestamp(
                to_timestamp(attribute(node, "lastactivity")),
                datetime_format,
            ),
            total_items: to_positive_int(attribute(node, "totalitems")).unwrap_or(0),
            total_unresolved_items: attribute(node, "totalunresolveditems")
                .map(|v| to_positive_int(Some(v)).unwrap_or(0)),
        }
    }
}

/// Counts of one department.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DepartmentStatistics {
    /// Department totals.
    #[serde(flatten)]
    pub totals: TicketCount,
    /// Per ticket status.
    pub ticket_statuses: IndexMap<StatsKey, TicketCount>,
    /// Per ticket type.
    pub ticket_types: IndexMap<StatsKey, TicketCount>,
    /// Per owner.
    pub ticket_owners: IndexMap<StatsKey, TicketCount>,
}

/// Ticket counts of the whole helpdesk.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TicketStatistics {
    /// Per department.
    pub departments: IndexMap<StatsKey, DepartmentStatistics>,
    /// Per ticket status across departments.
    pub ticket_statuses: IndexMap<StatsKey, TicketCount>,
    /// Per owner across departments.
    pub ticket_owners: IndexMap<StatsKey, TicketCount>,
}

impl TicketStatistics {
    /// Maps a `/Tickets/TicketCount` response.
    ///
    /// Missing sections become empty maps.
    #[must_use]
    pub fn parse(data: &WireData, datetime_format: &str) -> Self {
        let mut stats = TicketStatistics::default();

        for department in as_list(data.get("departments").and_then(|d| d.get("department"))) {
            let Some(node) = department.as_object() else {
                continue;
            };
            let id = to_positive_int(node_attribute(node, "id"));
            stats.departments.insert(
                StatsKey::from_id(id, StatsKey::Unknown),
                parse_department(node, datetime_format),
            );
        }

        stats.ticket_statuses = counts(
            data.get("statuses").and_then(|s| s.get("ticketstatus")),
            StatsKey::Unknown,
            datetime_format,
        );
        stats.ticket_owners = counts(
            data.get("owners").and_then(|o| o.get("ownerstaff")),
            StatsKey::Unassigned,
            datetime_format,
        );
        stats
    }

    /// Total tickets over every department.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.departments.values().map(|d| d.totals.total_items).sum()
    }
}

fn parse_department(node: &WireMap, datetime_format: &str) -> DepartmentStatistics {
    DepartmentStatistics {
        totals: TicketCount {
            last_activity: format_timestamp(to_timestamp(node.get("lastactivity")), datetime_format),
            total_items: to_positive_int(node.get("totalitems")).unwrap_or(0),
            total_unresolved_items: Some(
                to_positive_int(node.get("totalunresolveditems")).unwrap_or(0),
            ),
        },
        ticket_statuses: counts(node.get("ticketstatus"), StatsKey::Unknown, datetime_format),
        ticket_types: counts(node.get("tickettype"), StatsKey::Unknown, datetime_format),
        ticket_owners: counts(node.get("ownerstaff"), StatsKey::Unassigned, datetime_format),
    }
}

fn counts(
    value: Option<&WireData>,
    fallback: StatsKey,
    datetime_format: &str,
) -> IndexMap<StatsKey, TicketCount> {
    as_list(value)
        .into_iter()
        .map(|node| {
            let key = StatsKey::from_id(to_positive_int(attribute(node, "id")), fallback);
            (key, TicketCount::from_attributes(node, datetime_format))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> WireData {
        json!({
            "departments": {
                "department": [
                    {
                        "_attributes": { "id": "1" },
                        "_contents": "",
                        "lastactivity": "1300000000",
                        "totalitems": "5",
                        "totalunresolveditems": "2",
                        "ticketstatus": [
                            { "_attributes": { "id": "1", "lastactivity": "1300000000", "totalitems": "3" }, "_contents": "" },
                            { "_attributes": { "id": "3", "lastactivity": "0", "totalitems": "2" }, "_contents": "" }
                        ],
                        "tickettype": { "_attributes": { "id": "0", "lastactivity": "0", "totalitems": "5", "totalunresolveditems": "2" }, "_contents": "" },
                        "ownerstaff": [
                            { "_attributes": { "id": "0", "lastactivity": "0", "totalitems": "1", "totalunresolveditems": "1" }, "_contents": "" },
                            { "_attributes": { "id": "7", "lastactivity": "0", "totalitems": "4", "totalunresolveditems": "1" }, "_contents": "" }
                        ]
                    },
                    {
                        "_attributes": { "id": "0" },
                        "_contents": "",
                        "lastactivity": "0",
                        "totalitems": "1",
                        "totalunresolveditems": "0"
                    }
                ]
            },
            "statuses": {
                "ticketstatus": { "_attributes": { "id": "1", "lastactivity": "0", "totalitems": "3" }, "_contents": "" }
            },
            "owners": {
                "ownerstaff": { "_attributes": { "id": "7", "lastactivity": "0", "totalitems": "4", "totalunresolveditems": "1" }, "_contents": "" }
            }
        })
    }

    #[test]
    fn test_parse_departments() {
        let stats = TicketStatistics::parse(&sample(), "%Y-%m-%d");
        assert_eq!(stats.departments.len(), 2);
        assert_eq!(stats.total_items(), 6);

        let sales = &stats.departments[&StatsKey::Id(1)];
        assert_eq!(sales.totals.last_activity.as_deref(), Some("2011-03-13"));
        assert_eq!(sales.ticket_statuses.len(), 2);
        assert_eq!(sales.ticket_statuses[&StatsKey::Id(3)].last_activity, None);
        assert!(stats.departments.contains_key(&StatsKey::Unknown));
    }

    #[test]
    fn test_unknown_type_and_unassigned_owner_are_kept() {
        let stats = TicketStatistics::parse(&sample(), "%Y-%m-%d");
        let sales = &stats.departments[&StatsKey::Id(1)];
        assert_eq!(
            sales.ticket_types.keys().copied().collect::<Vec<_>>(),
            vec![StatsKey::Unknown]
        );
        assert_eq!(sales.ticket_owners[&StatsKey::Unassigned].total_items, 1);
        assert_eq!(sales.ticket_owners[&StatsKey::Id(7)].total_unresolved_items, Some(1));
    }

    #[test]
    fn test_top_level_sections() {
        let stats = TicketStatistics::parse(&sample(), "%Y-%m-%d");
        assert_eq!(stats.ticket_statuses[&StatsKey::Id(1)].total_items, 3);
        assert_eq!(stats.ticket_statuses[&StatsKey::Id(1)].total_unresolved_items, None);
        assert_eq!(stats.ticket_owners[&StatsKey::Id(7)].total_items, 4);
    }

    #[test]
    fn test_keys_serialize_as_strings() {
        let stats = TicketStatistics::parse(&sample(), "%Y-%m-%d");
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["departments"]["unknown"]["total_items"], json!(1));
        assert_eq!(value["departments"]["1"]["ticket_types"]["unknown"]["total_items"], json!(5));
    }

    #[test]
    fn test_empty_response() {
        let stats = TicketStatistics::parse(&json!({}), "%Y-%m-%d");
        assert!(stats.departments.is_empty());
        assert!(stats.ticket_owners.is_empty());
    }
}
