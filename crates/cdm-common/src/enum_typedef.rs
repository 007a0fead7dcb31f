//! Enumeration typedefs mapping integral codes to labels.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data_type::DataType;

/// A named enumeration: code → label.
///
/// Serialized with members as a list of `{ "code", "label" }` objects so the
/// codes stay integers inside buffered (tagged) serde content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumTypedef {
    name: String,
    base_type: DataType,
    #[serde(rename = "members", with = "member_list")]
    map: BTreeMap<i64, String>,
}

mod member_list {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Member {
        code: i64,
        label: String,
    }

    pub fn serialize<S: Serializer>(map: &BTreeMap<i64, String>, s: S) -> Result<S::Ok, S::Error> {
        let members: Vec<Member> = map
            .iter()
            .map(|(&code, label)| Member {
                code,
                label: label.clone(),
            })
            .collect();
        members.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<i64, String>, D::Error> {
        let members = Vec::<Member>::deserialize(d)?;
        Ok(members.into_iter().map(|m| (m.code, m.label)).collect())
    }
}

impl EnumTypedef {
    /// Create a typedef; `base_type` should be one of the enum types.
    pub fn new(name: impl Into<String>, base_type: DataType) -> Self {
        Self {
            name: name.into(),
            base_type,
            map: BTreeMap::new(),
        }
    }

    /// Builder-style member insertion.
    pub fn with_member(mut self, code: i64, label: impl Into<String>) -> Self {
        self.map.insert(code, label.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_type(&self) -> DataType {
        self.base_type
    }

    pub fn lookup(&self, code: i64) -> Option<&str> {
        self.map.get(&code).map(String::as_str)
    }

    /// Label for `code`, or a placeholder naming the unknown code.
    pub fn lookup_enum_string(&self, code: i64) -> String {
        self.lookup(code)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Unknown enum value={code}"))
    }

    pub fn members(&self) -> impl Iterator<Item = (i64, &str)> {
        self.map.iter().map(|(&k, v)| (k, v.as_str()))
    }
}
