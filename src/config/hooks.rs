//! `functions.hooks` configuration.
//!
//! Each event name maps to the hook identifiers fired for it. Operators may
//! write a single identifier or an ordered list:
//!
//! ```json
//! { "signup": "identity-signup", "login": ["audit", "notify"] }
//! ```
//!
//! Both normalize to an ordered list. Any other shape fails the whole decode.

use std::collections::HashMap;
use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};

/// Event name -> ordered, non-empty hook identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionHooks(HashMap<String, Vec<String>>);

impl FunctionHooks {
    /// Hook identifiers for `event`, in invocation order. Empty when the event
    /// has no hooks configured.
    pub fn get(&self, event: &str) -> &[String] {
        self.0.get(event).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<'de> Deserialize<'de> for FunctionHooks {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(FunctionHooksVisitor)
    }
}

struct FunctionHooksVisitor;

impl<'de> Visitor<'de> for FunctionHooksVisitor {
    type Value = FunctionHooks;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of event names to hook names")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut hooks = HashMap::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((event, HookList(names))) = map.next_entry::<String, HookList>()? {
            hooks.insert(event, names);
        }
        Ok(FunctionHooks(hooks))
    }
}

/// One event's value: a string or a sequence of strings.
struct HookList(Vec<String>);

impl<'de> Deserialize<'de> for HookList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(HookListVisitor)
    }
}

struct HookListVisitor;

impl<'de> Visitor<'de> for HookListVisitor {
    type Value = HookList;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a hook name or a list of hook names")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        // `String` rejects non-string elements, so mixed lists fail here.
        let mut names = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(name) = seq.next_element::<String>()? {
            names.push(name);
        }
        if names.is_empty() {
            return Err(de::Error::invalid_length(0, &"at least one hook name"));
        }
        Ok(HookList(names))
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(HookList(vec![v.to_string()]))
    }

    fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(HookList(vec![v]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(raw: &str) -> Result<FunctionHooks, serde_json::Error> {
        serde_json::from_str(raw)
    }

    fn expected(event: &str, names: &[&str]) -> FunctionHooks {
        let mut map = HashMap::new();
        map.insert(
            event.to_string(),
            names.iter().map(|s| s.to_string()).collect(),
        );
        FunctionHooks(map)
    }

    #[test]
    fn single_name_becomes_one_element_list() {
        let hooks = decode(r#"{ "signup" : "identity-signup" }"#).unwrap();
        assert_eq!(hooks, expected("signup", &["identity-signup"]));
    }

    #[test]
    fn list_is_kept_in_order() {
        let hooks = decode(r#"{ "signup" : ["identity-signup"] }"#).unwrap();
        assert_eq!(hooks, expected("signup", &["identity-signup"]));

        let hooks = decode(r#"{ "signup" : ["x", "y", "a"] }"#).unwrap();
        assert_eq!(hooks.get("signup"), ["x", "y", "a"]);
    }

    #[test]
    fn other_shapes_are_rejected() {
        for raw in [
            r#"{ "signup" : {"foo" : "bar"} }"#,
            r#"{ "signup" : 42 }"#,
            r#"{ "signup" : true }"#,
            r#"{ "signup" : null }"#,
            r#"{ "signup" : ["ok", 1] }"#,
            r#"{ "signup" : [] }"#,
            r#"["signup"]"#,
        ] {
            assert!(decode(raw).is_err(), "{raw} should not decode");
        }
    }

    #[test]
    fn one_bad_event_fails_everything() {
        let err = decode(r#"{ "signup" : "ok", "login" : {"a" : "b"} }"#);
        assert!(err.is_err());
    }

    #[test]
    fn unknown_event_has_no_hooks() {
        let hooks = decode(r#"{ "signup" : "identity-signup" }"#).unwrap();
        assert!(hooks.get("login").is_empty());
        assert_eq!(hooks.len(), 1);
        assert_eq!(hooks.events().collect::<Vec<_>>(), ["signup"]);
    }
}
