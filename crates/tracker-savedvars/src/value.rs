//! Language-neutral value tree decoded from SavedVariables tables.

/// A decoded Lua value.
///
/// Tables are classified at parse time: a table whose key set is exactly
/// the contiguous integers `1..=N` becomes a [`LuaValue::Seq`]; every other
/// table becomes a [`LuaValue::Map`] with string-coerced keys. Maps keep
/// source order so a document can be rewritten without reshuffling.
#[derive(Debug, Clone, PartialEq)]
pub enum LuaValue {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<LuaValue>),
    Map(Vec<(String, LuaValue)>),
}

impl LuaValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "boolean",
            Self::Int(_) | Self::Float(_) => "number",
            Self::Str(_) => "string",
            Self::Seq(_) => "sequence",
            Self::Map(_) => "map",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[LuaValue]> {
        match self {
            Self::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(String, LuaValue)]> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a key in a map value. Returns `None` for non-maps.
    pub fn get(&self, key: &str) -> Option<&LuaValue> {
        match self {
            Self::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Set a key on a map value, replacing an existing entry in place or
    /// appending a new one. No-op on non-maps.
    pub fn set(&mut self, key: &str, value: LuaValue) {
        if let Self::Map(entries) = self {
            match entries.iter_mut().find(|(k, _)| k == key) {
                Some((_, v)) => *v = value,
                None => entries.push((key.to_string(), value)),
            }
        }
    }

    /// Remove a key from a map value, returning the removed value.
    pub fn remove(&mut self, key: &str) -> Option<LuaValue> {
        if let Self::Map(entries) = self {
            let idx = entries.iter().position(|(k, _)| k == key)?;
            return Some(entries.remove(idx).1);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_and_set_on_map() {
        let mut v = LuaValue::Map(vec![("a".to_string(), LuaValue::Int(1))]);
        assert_eq!(v.get("a"), Some(&LuaValue::Int(1)));
        assert_eq!(v.get("b"), None);

        v.set("a", LuaValue::Int(2));
        v.set("b", LuaValue::Str("x".to_string()));
        assert_eq!(v.get("a"), Some(&LuaValue::Int(2)));
        assert_eq!(v.get("b").and_then(|b| b.as_str()), Some("x"));
    }

    #[test]
    fn set_on_non_map_is_noop() {
        let mut v = LuaValue::Int(7);
        v.set("a", LuaValue::Nil);
        assert_eq!(v, LuaValue::Int(7));
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(LuaValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(LuaValue::Float(3.0).as_i64(), Some(3));
        assert_eq!(LuaValue::Float(3.5).as_i64(), None);
        assert_eq!(LuaValue::Str("3".to_string()).as_i64(), None);
    }
}
