//! The five per-user file slots and the text encoding of their columns.
//!
//! Single-file slots (`profileImage`, `doc1`, `doc2`) store one path plus,
//! for the two document slots, the uploader's original file name. Multi-file
//! slots (`doc3`, `doc4`) store parallel JSON arrays of paths and original
//! names inside plain text columns. Decoding is deliberately forgiving:
//! a malformed column is logged and treated as empty rather than failing the
//! whole record, so one bad row cannot take down the list endpoint.

use tracing::warn;

use crate::storage::blobs::Area;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    ProfileImage,
    Doc1,
    Doc2,
    Doc3,
    Doc4,
}

impl Slot {
    /// Deterministic processing order for uploads and cleanup.
    pub const ALL: [Slot; 5] = [Slot::ProfileImage, Slot::Doc1, Slot::Doc2, Slot::Doc3, Slot::Doc4];

    /// Multipart field name; also used as the filename prefix for stored blobs.
    pub fn field_name(&self) -> &'static str {
        match self {
            Slot::ProfileImage => "profileImage",
            Slot::Doc1 => "doc1",
            Slot::Doc2 => "doc2",
            Slot::Doc3 => "doc3",
            Slot::Doc4 => "doc4",
        }
    }

    pub fn from_field_name(name: &str) -> Option<Self> {
        match name {
            "profileImage" => Some(Slot::ProfileImage),
            "doc1" => Some(Slot::Doc1),
            "doc2" => Some(Slot::Doc2),
            "doc3" => Some(Slot::Doc3),
            "doc4" => Some(Slot::Doc4),
            _ => None,
        }
    }

    /// Multi-file slots hold a collection that is replaced as a whole.
    pub fn is_multi(&self) -> bool {
        matches!(self, Slot::Doc3 | Slot::Doc4)
    }

    pub fn area(&self) -> Area {
        match self {
            Slot::ProfileImage => Area::Profiles,
            _ => Area::Documents,
        }
    }
}

/// Download selector as written in the URL path: a bare slot name for the
/// single-file slots, or `doc3-<index>` / `doc4-<index>` for one file out of
/// a multi-file slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotToken {
    Single(Slot),
    Indexed(Slot, usize),
}

impl SlotToken {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "profileImage" => Some(SlotToken::Single(Slot::ProfileImage)),
            "doc1" => Some(SlotToken::Single(Slot::Doc1)),
            "doc2" => Some(SlotToken::Single(Slot::Doc2)),
            _ => {
                let (slot_part, index_part) = token.split_once('-')?;
                let slot = match slot_part {
                    "doc3" => Slot::Doc3,
                    "doc4" => Slot::Doc4,
                    _ => return None,
                };
                let index = index_part.parse::<usize>().ok()?;
                Some(SlotToken::Indexed(slot, index))
            }
        }
    }
}

/// Encodes a multi-file slot for storage: parallel JSON arrays of paths and
/// original names, or NULL columns when the collection is empty.
pub fn encode_multi(files: &[(String, String)]) -> (Option<String>, Option<String>) {
    if files.is_empty() {
        return (None, None);
    }
    let paths: Vec<&str> = files.iter().map(|(path, _)| path.as_str()).collect();
    let names: Vec<&str> = files.iter().map(|(_, name)| name.as_str()).collect();
    (
        Some(serde_json::Value::from(paths).to_string()),
        Some(serde_json::Value::from(names).to_string()),
    )
}

/// Decodes the two columns of a multi-file slot back into lists. NULL means
/// empty; a column that fails to parse is logged and treated as empty.
pub fn decode_multi(
    paths_json: Option<&str>,
    names_json: Option<&str>,
    user_id: i64,
    slot: Slot,
) -> (Vec<String>, Vec<String>) {
    (
        decode_list(paths_json, user_id, slot, "paths"),
        decode_list(names_json, user_id, slot, "names"),
    )
}

fn decode_list(raw: Option<&str>, user_id: i64, slot: Slot, column: &str) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(list) => list,
        Err(e) => {
            warn!(
                user_id,
                slot = slot.field_name(),
                column,
                error = %e,
                "malformed slot column, treating as empty"
            );
            Vec::new()
        }
    }
}
