//! Bolt protocol metadata types.
//!
//! Typed views over SUCCESS metadata: update counters, notifications and
//! routing tables.

use std::collections::HashMap;

use crate::bolt::packstream::{PackStreamError, PackStreamValue};

/// Counter keys in the `stats` map, in field order of [`QueryStats`].
const COUNTER_KEYS: [&str; 11] = [
    "nodes-created",
    "nodes-deleted",
    "relationships-created",
    "relationships-deleted",
    "properties-set",
    "labels-added",
    "labels-removed",
    "indexes-added",
    "indexes-removed",
    "constraints-added",
    "constraints-removed",
];

/// Query statistics returned in the final SUCCESS of a stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryStats {
    pub nodes_created: i64,
    pub nodes_deleted: i64,
    pub relationships_created: i64,
    pub relationships_deleted: i64,
    pub properties_set: i64,
    pub labels_added: i64,
    pub labels_removed: i64,
    pub indexes_added: i64,
    pub indexes_removed: i64,
    pub constraints_added: i64,
    pub constraints_removed: i64,
    /// System updates (4.0+)
    pub system_updates: i64,
    contains_updates: Option<bool>,
    contains_system_updates: Option<bool>,
}

impl QueryStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn counters_mut(&mut self) -> [&mut i64; 11] {
        [
            &mut self.nodes_created,
            &mut self.nodes_deleted,
            &mut self.relationships_created,
            &mut self.relationships_deleted,
            &mut self.properties_set,
            &mut self.labels_added,
            &mut self.labels_removed,
            &mut self.indexes_added,
            &mut self.indexes_removed,
            &mut self.constraints_added,
            &mut self.constraints_removed,
        ]
    }

    /// True if the query changed data. Uses the server's flag when sent.
    pub fn contains_updates(&self) -> bool {
        self.contains_updates.unwrap_or_else(|| {
            self.nodes_created > 0
                || self.nodes_deleted > 0
                || self.relationships_created > 0
                || self.relationships_deleted > 0
                || self.properties_set > 0
                || self.labels_added > 0
                || self.labels_removed > 0
                || self.indexes_added > 0
                || self.indexes_removed > 0
                || self.constraints_added > 0
                || self.constraints_removed > 0
        })
    }

    pub fn contains_system_updates(&self) -> bool {
        self.contains_system_updates.unwrap_or(self.system_updates > 0)
    }

    /// Parse from the `stats` map. Missing counters are zero.
    pub fn from_map(map: &HashMap<String, PackStreamValue>) -> Self {
        let mut stats = Self::default();
        for (key, slot) in COUNTER_KEYS.iter().zip(stats.counters_mut()) {
            *slot = map.get(*key).and_then(|v| v.as_int()).unwrap_or(0);
        }
        stats.system_updates = map.get("system-updates").and_then(|v| v.as_int()).unwrap_or(0);
        stats.contains_updates = map.get("contains-updates").and_then(|v| v.as_bool());
        stats.contains_system_updates =
            map.get("contains-system-updates").and_then(|v| v.as_bool());
        stats
    }

    /// Non-zero counters as a `stats` map.
    pub fn to_map(&self) -> HashMap<String, PackStreamValue> {
        let mut copy = self.clone();
        let mut map: HashMap<String, PackStreamValue> = COUNTER_KEYS
            .iter()
            .zip(copy.counters_mut())
            .filter(|(_, v)| **v > 0)
            .map(|(k, v)| (k.to_string(), PackStreamValue::Integer(*v)))
            .collect();
        if self.system_updates > 0 {
            map.insert("system-updates".to_string(), self.system_updates.into());
        }
        map
    }
}

/// Position in query for notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationPosition {
    /// Line number (1-based)
    pub line: i64,
    /// Column number (1-based)
    pub column: i64,
    pub offset: i64,
}

/// Notification returned in SUCCESS metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub code: String,
    pub title: String,
    pub description: String,
    /// `WARNING`, `INFORMATION` or whatever the server sends
    pub severity: String,
    /// Bolt 5.2+
    pub category: Option<String>,
    pub position: Option<NotificationPosition>,
}

impl Notification {
    pub fn from_map(map: &HashMap<String, PackStreamValue>) -> Option<Self> {
        let text = |key: &str| {
            map.get(key)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };
        let position = map.get("position").and_then(|v| v.as_map()).and_then(|pos| {
            Some(NotificationPosition {
                line: pos.get("line")?.as_int()?,
                column: pos.get("column")?.as_int()?,
                offset: pos.get("offset").and_then(|v| v.as_int()).unwrap_or(0),
            })
        });
        Some(Self {
            code: text("code")?,
            title: text("title").unwrap_or_default(),
            description: text("description").unwrap_or_default(),
            severity: text("severity").unwrap_or_else(|| "INFORMATION".to_string()),
            category: text("category"),
            position,
        })
    }

    /// Parse the `notifications` list, skipping entries without a code.
    pub fn list_from(value: &PackStreamValue) -> Vec<Self> {
        value
            .as_list()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_map().and_then(Notification::from_map))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Routing table for one database.
///
/// Produced from either the `rt` map of a ROUTE SUCCESS or the single record
/// of the routing procedure on older servers. Both carry a TTL and a list of
/// `{addresses, role}` entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingTable {
    /// Time to live in seconds
    pub ttl: i64,
    /// `None` for the home database
    pub database: Option<String>,
    pub routers: Vec<String>,
    pub readers: Vec<String>,
    pub writers: Vec<String>,
}

impl RoutingTable {
    /// Decode the `rt` map: `{ttl, db?, servers}`.
    pub fn from_map(rt: &HashMap<String, PackStreamValue>) -> Result<Self, PackStreamError> {
        let ttl = rt
            .get("ttl")
            .and_then(|v| v.as_int())
            .ok_or_else(|| invalid("routing table requires an integer ttl"))?;
        let servers = rt
            .get("servers")
            .and_then(|v| v.as_list())
            .ok_or_else(|| invalid("routing table requires a servers list"))?;
        let database = rt.get("db").and_then(|v| v.as_str()).map(str::to_string);
        Self::build(ttl, database, servers)
    }

    /// Decode a routing procedure record: `[ttl, servers]`.
    pub fn from_record(
        fields: &[PackStreamValue],
        database: Option<&str>,
    ) -> Result<Self, PackStreamError> {
        let [ttl, servers] = fields else {
            return Err(invalid(format!(
                "routing record must have 2 fields, got {}",
                fields.len()
            )));
        };
        let ttl = ttl.as_int().ok_or_else(|| invalid("routing ttl must be an integer"))?;
        let servers = servers
            .as_list()
            .ok_or_else(|| invalid("routing servers must be a list"))?;
        Self::build(ttl, database.map(str::to_string), servers)
    }

    fn build(
        ttl: i64,
        database: Option<String>,
        servers: &[PackStreamValue],
    ) -> Result<Self, PackStreamError> {
        let mut table = Self {
            ttl,
            database,
            ..Self::default()
        };
        for server in servers {
            let entry = server
                .as_map()
                .ok_or_else(|| invalid("routing server entry must be a map"))?;
            let addresses = entry
                .get("addresses")
                .and_then(|v| v.as_string_list())
                .ok_or_else(|| invalid("routing server entry requires addresses"))?;
            let role = entry.get("role").and_then(|v| v.as_str()).unwrap_or_default();
            let target = match role {
                "ROUTE" => &mut table.routers,
                "READ" => &mut table.readers,
                "WRITE" => &mut table.writers,
                other => return Err(invalid(format!("unknown server role '{}'", other))),
            };
            target.extend(addresses);
        }
        Ok(table)
    }

    /// Encode as an `rt` map, used by test servers.
    pub fn to_map(&self) -> HashMap<String, PackStreamValue> {
        let servers = [
            ("ROUTE", &self.routers),
            ("READ", &self.readers),
            ("WRITE", &self.writers),
        ]
        .into_iter()
        .filter(|(_, addresses)| !addresses.is_empty())
        .map(|(role, addresses)| {
            let mut entry = HashMap::new();
            entry.insert("role".to_string(), role.into());
            entry.insert("addresses".to_string(), addresses.clone().into());
            PackStreamValue::Map(entry)
        })
        .collect();

        let mut map = HashMap::new();
        map.insert("ttl".to_string(), self.ttl.into());
        map.insert("servers".to_string(), PackStreamValue::List(servers));
        if let Some(ref db) = self.database {
            map.insert("db".to_string(), db.as_str().into());
        }
        map
    }
}

fn invalid(msg: impl Into<String>) -> PackStreamError {
    PackStreamError::InvalidStructure(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_stats_empty() {
        let stats = QueryStats::new();
        assert!(!stats.contains_updates());
        assert!(!stats.contains_system_updates());
        assert!(stats.to_map().is_empty());
    }

    #[test]
    fn test_query_stats_from_map() {
        let mut map = HashMap::new();
        map.insert("nodes-created".to_string(), PackStreamValue::Integer(2));
        map.insert("labels-added".to_string(), PackStreamValue::Integer(3));
        let stats = QueryStats::from_map(&map);
        assert_eq!(stats.nodes_created, 2);
        assert_eq!(stats.labels_added, 3);
        assert_eq!(stats.relationships_created, 0);
        assert!(stats.contains_updates());
        assert_eq!(stats.to_map(), map);
    }

    #[test]
    fn test_server_flag_wins() {
        let mut map = HashMap::new();
        map.insert("contains-updates".to_string(), PackStreamValue::Boolean(false));
        map.insert("properties-set".to_string(), PackStreamValue::Integer(1));
        assert!(!QueryStats::from_map(&map).contains_updates());

        let mut map = HashMap::new();
        map.insert("system-updates".to_string(), PackStreamValue::Integer(1));
        assert!(QueryStats::from_map(&map).contains_system_updates());
    }

    #[test]
    fn test_notification_list() {
        let mut pos = HashMap::new();
        pos.insert("line".to_string(), PackStreamValue::Integer(1));
        pos.insert("column".to_string(), PackStreamValue::Integer(10));
        let mut n = HashMap::new();
        n.insert("code".to_string(), "Neo.ClientNotification.Statement.UnknownLabelWarning".into());
        n.insert("severity".to_string(), "WARNING".into());
        n.insert("position".to_string(), PackStreamValue::Map(pos));
        let list = PackStreamValue::List(vec![
            PackStreamValue::Map(n),
            PackStreamValue::Map(HashMap::new()),
        ]);

        let parsed = Notification::list_from(&list);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].severity, "WARNING");
        assert_eq!(
            parsed[0].position,
            Some(NotificationPosition { line: 1, column: 10, offset: 0 })
        );
        assert!(parsed[0].category.is_none());
    }

    fn server(role: &str, addresses: &[&str]) -> PackStreamValue {
        let mut entry = HashMap::new();
        entry.insert("role".to_string(), role.into());
        entry.insert(
            "addresses".to_string(),
            addresses.iter().map(|a| a.to_string()).collect::<Vec<_>>().into(),
        );
        PackStreamValue::Map(entry)
    }

    #[test]
    fn test_routing_table_from_record() {
        let fields = vec![
            PackStreamValue::Integer(300),
            PackStreamValue::List(vec![
                server("WRITE", &["a:7687"]),
                server("READ", &["b:7687", "c:7687"]),
                server("ROUTE", &["a:7687", "b:7687"]),
            ]),
        ];
        let table = RoutingTable::from_record(&fields, Some("movies")).unwrap();
        assert_eq!(table.ttl, 300);
        assert_eq!(table.database.as_deref(), Some("movies"));
        assert_eq!(table.writers, vec!["a:7687"]);
        assert_eq!(table.readers, vec!["b:7687", "c:7687"]);
        assert_eq!(table.routers.len(), 2);

        assert_eq!(RoutingTable::from_map(&table.to_map()).unwrap(), table);
    }

    #[test]
    fn test_routing_table_rejects_bad_shapes() {
        assert!(RoutingTable::from_record(&[PackStreamValue::Integer(1)], None).is_err());
        let fields = vec![
            PackStreamValue::Integer(1),
            PackStreamValue::List(vec![server("LEADER", &["a:1"])]),
        ];
        assert!(RoutingTable::from_record(&fields, None).is_err());
        assert!(RoutingTable::from_map(&HashMap::new()).is_err());
    }
}
