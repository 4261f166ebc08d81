//! Re-encoding of value trees back into SavedVariables text.
//!
//! Output follows the game serializer's shape: tab indentation,
//! `["key"] = value` map entries, positional sequence entries with a
//! trailing `-- [i]` index comment.

use crate::LuaValue;

/// Encode a single value. Nested tables are indented one level deep.
pub fn encode_value(value: &LuaValue) -> String {
    let mut out = String::new();
    write_value(&mut out, value, 1);
    out
}

pub(crate) fn write_value(out: &mut String, value: &LuaValue, indent: usize) {
    match value {
        LuaValue::Nil => out.push_str("nil"),
        LuaValue::Bool(true) => out.push_str("true"),
        LuaValue::Bool(false) => out.push_str("false"),
        LuaValue::Int(i) => out.push_str(&i.to_string()),
        // {:?} keeps the decimal point so floats survive a round trip.
        LuaValue::Float(f) => out.push_str(&format!("{f:?}")),
        LuaValue::Str(s) => write_quoted(out, s),
        LuaValue::Seq(items) => {
            if items.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{\n");
            for (i, item) in items.iter().enumerate() {
                push_indent(out, indent);
                write_value(out, item, indent + 1);
                out.push_str(&format!(", -- [{}]\n", i + 1));
            }
            push_indent(out, indent - 1);
            out.push('}');
        }
        LuaValue::Map(entries) => {
            if entries.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{\n");
            for (key, val) in entries {
                push_indent(out, indent);
                out.push('[');
                write_quoted(out, key);
                out.push_str("] = ");
                write_value(out, val, indent + 1);
                out.push_str(",\n");
            }
            push_indent(out, indent - 1);
            out.push('}');
        }
    }
}

fn push_indent(out: &mut String, indent: usize) {
    for _ in 0..indent {
        out.push('\t');
    }
}

fn write_quoted(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\{}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}
