// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque lookup key the server binds to each rendered formula row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct FormulaId(String);

impl FormulaId {
    /// Keeps the identifier verbatim. Returns `None` for empty or
    /// whitespace-only values.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            return None;
        }
        Some(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FormulaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for FormulaId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<u64> for FormulaId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFormulaId {
    Text(String),
    Integer(i64),
    Unsigned(u64),
    Other(serde::de::IgnoredAny),
}

/// Decodes a row identifier that the server may emit as a string, an
/// integer, `null`, or something unusable. Only strings and integers yield
/// an id; floats and other shapes mean the row has none.
pub fn deserialize_formula_id<'de, D>(deserializer: D) -> Result<Option<FormulaId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawFormulaId>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawFormulaId::Text(value)) => FormulaId::parse(&value),
        Some(RawFormulaId::Integer(value)) => Some(FormulaId::from(value)),
        Some(RawFormulaId::Unsigned(value)) => Some(FormulaId::from(value)),
        Some(RawFormulaId::Other(_)) | None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::{FormulaId, deserialize_formula_id};
    use anyhow::Result;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "deserialize_formula_id")]
        id: Option<FormulaId>,
    }

    fn decode(json: &str) -> Result<Option<FormulaId>> {
        Ok(serde_json::from_str::<Holder>(json)?.id)
    }

    #[test]
    fn parse_keeps_value_verbatim_and_rejects_blank() {
        assert_eq!(
            FormulaId::parse(" 42 ").map(|id| id.to_string()),
            Some(" 42 ".to_owned())
        );
        assert_eq!(FormulaId::parse(""), None);
        assert_eq!(FormulaId::parse("   "), None);
    }

    #[test]
    fn identifiers_decode_from_strings_and_integers() -> Result<()> {
        assert_eq!(decode(r#"{"id":"abc-7"}"#)?, FormulaId::parse("abc-7"));
        assert_eq!(decode(r#"{"id":17}"#)?, Some(FormulaId::from(17_i64)));
        assert_eq!(
            decode(r#"{"id":18446744073709551615}"#)?,
            Some(FormulaId::from(u64::MAX))
        );
        assert_eq!(decode(r#"{"id":-3}"#)?, Some(FormulaId::from(-3_i64)));
        Ok(())
    }

    #[test]
    fn unusable_identifiers_decode_to_none() -> Result<()> {
        assert_eq!(decode(r#"{"id":null}"#)?, None);
        assert_eq!(decode(r#"{"id":""}"#)?, None);
        assert_eq!(decode(r#"{"id":true}"#)?, None);
        assert_eq!(decode(r#"{"id":4.5}"#)?, None);
        assert_eq!(decode(r#"{"id":{"nested":1}}"#)?, None);
        assert_eq!(decode("{}")?, None);
        Ok(())
    }
}
