//! Party extraction for both legacy source shapes.

use tracker_model::{PartyMember, Role};
use tracker_savedvars::LuaValue;
use tracing::debug;

/// Result of party extraction: the canonical member list plus the name of
/// the member carrying the `*` self-marker, if any.
pub(crate) struct ExtractedParty {
    pub(crate) members: Vec<PartyMember>,
    pub(crate) marked_self: Option<String>,
}

/// Extract party members from either source shape:
/// - flat ordered sequence, every element carrying an explicit `role`;
/// - structured map with `tank` / `healer` members and a `dps` list.
///
/// Member names are cleaned of the trailing `*` marker the addon used to
/// tag the recording player.
pub(crate) fn extract_party(value: Option<&LuaValue>) -> ExtractedParty {
    let mut out = ExtractedParty {
        members: Vec::new(),
        marked_self: None,
    };
    let Some(value) = value else {
        return out;
    };

    match value {
        LuaValue::Seq(items) => {
            for item in items {
                let role = item
                    .get("role")
                    .and_then(|r| r.as_str())
                    .map(Role::from_str)
                    .unwrap_or(Role::Damager);
                push_member(&mut out, item, role);
            }
        }
        LuaValue::Map(_) => {
            if let Some(tank) = value.get("tank") {
                push_member(&mut out, tank, Role::Tank);
            }
            if let Some(healer) = value.get("healer") {
                push_member(&mut out, healer, Role::Healer);
            }
            let dps = value.get("dps").or_else(|| value.get("damagers"));
            if let Some(LuaValue::Seq(items)) = dps {
                for item in items {
                    push_member(&mut out, item, Role::Damager);
                }
            }
        }
        other => {
            debug!(kind = other.type_name(), "party field has unexpected shape, ignoring");
        }
    }
    out
}

fn push_member(out: &mut ExtractedParty, value: &LuaValue, role: Role) {
    if value.is_nil() {
        return;
    }
    let Some(raw_name) = value.get("name").and_then(|n| n.as_str()) else {
        debug!(role = role.as_str(), "party member without a name, skipping");
        return;
    };
    let (name, is_self) = clean_name(raw_name);
    if name.is_empty() {
        return;
    }
    if is_self && out.marked_self.is_none() {
        out.marked_self = Some(name.clone());
    }
    let class = value
        .get("class")
        .and_then(|c| c.as_str())
        .unwrap_or("UNKNOWN")
        .to_string();
    let spec = value
        .get("spec")
        .and_then(|s| s.as_str())
        .map(str::to_string);
    out.members.push(PartyMember {
        role,
        name,
        class,
        spec,
    });
}

/// Strip the trailing `*` self-marker and surrounding whitespace.
pub(crate) fn clean_name(raw: &str) -> (String, bool) {
    let trimmed = raw.trim();
    match trimmed.strip_suffix('*') {
        Some(bare) => (bare.trim().to_string(), true),
        None => (trimmed.to_string(), false),
    }
}
