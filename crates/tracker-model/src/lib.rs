//! Canonical model types for the MPlusTracker sync pipeline.
//!
//! Whatever shape the addon wrote (field names and party layout changed
//! several times across addon versions), the normalizer produces exactly
//! these types, and storage/export only ever see these types.

mod party;
mod run;
mod time;

pub use party::{CharacterClass, PartyMember, Role};
pub use run::{Run, RunRecord};
pub use time::{format_timestamp, timestamp_from_epoch, timestamp_from_str, STORAGE_TIME_FORMAT};
