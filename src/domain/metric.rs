// Metric groups, series keys and the fixed type palette
use crate::error::AppError;
use serde::Serialize;
use std::fmt;

/// Identifiers of application metric types and timer statistics.
pub mod type_id {
    pub const HTTP_REQUEST: i32 = 1;
    pub const HTTP_200: i32 = 2;
    pub const HTTP_400: i32 = 3;
    pub const HTTP_401: i32 = 4;
    pub const HTTP_404: i32 = 5;
    pub const HTTP_500: i32 = 6;
    pub const HTTP_503: i32 = 7;

    pub const MEM_SYS: i32 = 1000;
    pub const MEM_HEAP_ALLOC: i32 = 1001;
    pub const MEM_HEAP_SYS: i32 = 1002;
    pub const MEM_HEAP_OBJECTS: i32 = 1003;

    pub const ROUTINES: i32 = 1100;

    pub const AVG_MEAN: i32 = 1200;
    pub const MAX_FIFTY: i32 = 1201;
    pub const MAX_NINETY: i32 = 1202;
}

pub const MEMORY_TYPES: [i32; 3] = [
    type_id::MEM_SYS,
    type_id::MEM_HEAP_ALLOC,
    type_id::MEM_HEAP_SYS,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricGroup {
    Counters,
    Timers,
    Memory,
    Objects,
    Routines,
}

impl MetricGroup {
    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "counters" => Ok(MetricGroup::Counters),
            "timers" => Ok(MetricGroup::Timers),
            "memory" => Ok(MetricGroup::Memory),
            "objects" => Ok(MetricGroup::Objects),
            "routines" => Ok(MetricGroup::Routines),
            _ => Err(AppError::bad_input("invalid value for group")),
        }
    }

    /// Comma separated list, e.g. "counters,memory". Duplicates are kept once.
    pub fn parse_list(value: &str) -> Result<Vec<Self>, AppError> {
        let mut groups = Vec::new();
        for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let group = Self::parse(part)?;
            if !groups.contains(&group) {
                groups.push(group);
            }
        }
        if groups.is_empty() {
            return Err(AppError::bad_input("no groups requested"));
        }
        Ok(groups)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricGroup::Counters => "counters",
            MetricGroup::Timers => "timers",
            MetricGroup::Memory => "memory",
            MetricGroup::Objects => "objects",
            MetricGroup::Routines => "routines",
        }
    }
}

impl fmt::Display for MetricGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Series key for metrics reported per application instance.
/// Orders by instance, then type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceKey {
    pub instance_id: String,
    pub type_id: i32,
}

impl InstanceKey {
    pub fn new(instance_id: impl Into<String>, type_id: i32) -> Self {
        Self {
            instance_id: instance_id.into(),
            type_id,
        }
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.instance_id, self.type_id)
    }
}

/// Display names and fixed colours for metric type ids.
pub trait KeyPalette: Send + Sync {
    fn display_name(&self, type_id: i32) -> String;
    fn colour(&self, type_id: i32) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinPalette;

const BUILTIN: &[(i32, &str, &str)] = &[
    (type_id::HTTP_REQUEST, "Requests", "#1f78b4"),
    (type_id::HTTP_200, "200 OK", "#33a02c"),
    (type_id::HTTP_400, "400 Bad Request", "#fdbf6f"),
    (type_id::HTTP_401, "401 Unauthorized", "#ff7f00"),
    (type_id::HTTP_404, "404 Not Found", "#cab2d6"),
    (type_id::HTTP_500, "500 Internal Server Error", "#e31a1c"),
    (type_id::HTTP_503, "503 Service Unavailable", "#6a3d9a"),
    (type_id::MEM_SYS, "Mem Sys", "#e41a1c"),
    (type_id::MEM_HEAP_ALLOC, "Mem Heap Alloc", "#377eb8"),
    (type_id::MEM_HEAP_SYS, "Mem Heap Sys", "#4daf4a"),
    (type_id::MEM_HEAP_OBJECTS, "Mem Heap Objects", "#984ea3"),
    (type_id::ROUTINES, "Routines", "#ff7f00"),
    (type_id::AVG_MEAN, "Average Mean", "#a6cee3"),
    (type_id::MAX_FIFTY, "Max 50th Percentile", "#1f78b4"),
    (type_id::MAX_NINETY, "Max 90th Percentile", "#e34a33"),
];

impl BuiltinPalette {
    fn lookup(type_id: i32) -> Option<&'static (i32, &'static str, &'static str)> {
        BUILTIN.iter().find(|(id, _, _)| *id == type_id)
    }
}

impl KeyPalette for BuiltinPalette {
    fn display_name(&self, type_id: i32) -> String {
        match Self::lookup(type_id) {
            Some((_, name, _)) => name.to_string(),
            None => format!("Unknown {}", type_id),
        }
    }

    fn colour(&self, type_id: i32) -> String {
        Self::lookup(type_id)
            .map(|(_, _, c)| c.to_string())
            .unwrap_or_else(|| "grey".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_group() {
        assert_eq!(MetricGroup::parse("timers").unwrap(), MetricGroup::Timers);
        assert!(matches!(MetricGroup::parse("cpu"), Err(AppError::BadInput(_))));
    }

    #[test]
    fn test_parse_group_list() {
        let groups = MetricGroup::parse_list("memory, counters,memory").unwrap();
        assert_eq!(groups, vec![MetricGroup::Memory, MetricGroup::Counters]);
        assert!(MetricGroup::parse_list(" , ").is_err());
        assert!(MetricGroup::parse_list("memory,disk").is_err());
    }

    #[test]
    fn test_instance_key_order() {
        let mut keys = vec![
            InstanceKey::new("b", 1000),
            InstanceKey::new("a", 1002),
            InstanceKey::new("a", 1000),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                InstanceKey::new("a", 1000),
                InstanceKey::new("a", 1002),
                InstanceKey::new("b", 1000),
            ]
        );
    }

    #[test]
    fn test_builtin_palette() {
        let p = BuiltinPalette;
        assert_eq!(p.display_name(type_id::MEM_HEAP_ALLOC), "Mem Heap Alloc");
        assert_eq!(p.colour(type_id::MAX_NINETY), "#e34a33");
        assert_eq!(p.display_name(42), "Unknown 42");
        assert_eq!(p.colour(42), "grey");
    }
}
