//! Transport codec for roll groups
//!
//! Groups are shrunk to records with short keys, serialized to JSON,
//! gzipped and base64 encoded. The result is a single printable string
//! that can be pasted into chat or embedded in a share link.
//!
//! Item record keys: `i` id, `d` dc, `sl` slug, `t` kind (`a`/`c`/`x`),
//! `l` label, `s` statistic, `v` variant, `a` adjustment delta, `b` basic,
//! `tr` traits, `df` defense, `sr`/`tg` counteract ranks. Defaults are
//! omitted.

use std::collections::BTreeSet;
use std::io::{Read, Write};

use base64::{engine::general_purpose, Engine as _};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rollreq_domain::{DcAdjustment, GroupId, RollGroup, RollItem, RollItemId, RollKind};

const ACTION_TAG: &str = "a";
const CHECK_TAG: &str = "c";
const COUNTERACT_TAG: &str = "x";

/// Largest decompressed payload accepted by `decode`.
pub const MAX_DECODED_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Failed to serialize groups: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to compress groups: {0}")]
    Compress(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Invalid gzip stream: {0}")]
    Decompress(#[from] std::io::Error),
    #[error("Decoded payload exceeds {limit} bytes")]
    TooLarge { limit: u64 },
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unknown item kind '{0}'")]
    UnknownItemKind(String),
    #[error("Invalid item record {id}: {reason}")]
    InvalidRecord { id: RollItemId, reason: String },
}

/// How to treat item records that cannot be turned back into items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodePolicy {
    /// Skip the record and keep decoding.
    #[default]
    Lenient,
    /// Fail the whole decode.
    Strict,
}

#[derive(Debug, Serialize, Deserialize)]
struct GroupRecord {
    i: GroupId,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    t: String,
    #[serde(default)]
    r: Vec<ItemRecord>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ItemRecord {
    i: RollItemId,
    d: i32,
    sl: String,
    t: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    l: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    s: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    v: Option<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    a: i32,
    #[serde(default, skip_serializing_if = "is_false")]
    b: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tr: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    df: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sr: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tg: Option<u8>,
}

fn is_zero(value: &i32) -> bool {
    *value == 0
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

impl From<&RollItem> for ItemRecord {
    fn from(item: &RollItem) -> Self {
        let base = ItemRecord {
            i: item.id,
            d: item.dc,
            sl: item.slug.clone(),
            l: non_empty(&item.label),
            ..ItemRecord::default()
        };
        match &item.kind {
            RollKind::Action { statistic, variant } => ItemRecord {
                t: ACTION_TAG.to_string(),
                s: non_empty(statistic),
                v: non_empty(variant),
                ..base
            },
            RollKind::Check {
                traits,
                adjustment,
                basic,
                defense,
            } => ItemRecord {
                t: CHECK_TAG.to_string(),
                a: adjustment.map(DcAdjustment::delta).unwrap_or(0),
                b: *basic,
                tr: traits.iter().cloned().collect(),
                df: non_empty(defense),
                ..base
            },
            RollKind::Counteract {
                source_rank,
                target_rank,
            } => ItemRecord {
                t: COUNTERACT_TAG.to_string(),
                sr: Some(*source_rank),
                tg: Some(*target_rank),
                ..base
            },
        }
    }
}

impl TryFrom<ItemRecord> for RollItem {
    type Error = DecodeError;

    fn try_from(record: ItemRecord) -> Result<Self, Self::Error> {
        let invalid = |reason: &str| DecodeError::InvalidRecord {
            id: record.i,
            reason: reason.to_string(),
        };
        let kind = match record.t.as_str() {
            ACTION_TAG => RollKind::Action {
                statistic: record.s.clone(),
                variant: record.v.clone(),
            },
            CHECK_TAG => {
                let adjustment = match record.a {
                    0 => None,
                    delta => Some(
                        DcAdjustment::from_delta(delta)
                            .ok_or_else(|| invalid("unknown adjustment"))?,
                    ),
                };
                RollKind::Check {
                    traits: record.tr.iter().cloned().collect::<BTreeSet<_>>(),
                    adjustment,
                    basic: record.b,
                    defense: record.df.clone(),
                }
            }
            COUNTERACT_TAG => RollKind::Counteract {
                source_rank: record.sr.ok_or_else(|| invalid("missing source rank"))?,
                target_rank: record.tg.ok_or_else(|| invalid("missing target rank"))?,
            },
            other => return Err(DecodeError::UnknownItemKind(other.to_string())),
        };
        Ok(RollItem {
            id: record.i,
            dc: record.d,
            label: record.l,
            slug: record.sl,
            kind,
        }
        .normalized())
    }
}

/// Encode groups into a transport string.
pub fn encode(groups: &[RollGroup]) -> Result<String, EncodeError> {
    let records: Vec<GroupRecord> = groups
        .iter()
        .map(|group| GroupRecord {
            i: group.id,
            t: group.title.clone(),
            r: group.items.iter().map(ItemRecord::from).collect(),
        })
        .collect();
    let json = serde_json::to_vec(&records)?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    let compressed = encoder.finish()?;

    Ok(general_purpose::STANDARD.encode(compressed))
}

/// Decode a transport string with the default (lenient) policy.
pub fn decode(encoded: &str) -> Result<Vec<RollGroup>, DecodeError> {
    decode_with(encoded, DecodePolicy::default())
}

pub fn decode_with(encoded: &str, policy: DecodePolicy) -> Result<Vec<RollGroup>, DecodeError> {
    let compressed = general_purpose::STANDARD.decode(encoded.trim())?;

    let mut json = Vec::new();
    GzDecoder::new(compressed.as_slice())
        .take(MAX_DECODED_BYTES + 1)
        .read_to_end(&mut json)?;
    if json.len() as u64 > MAX_DECODED_BYTES {
        return Err(DecodeError::TooLarge {
            limit: MAX_DECODED_BYTES,
        });
    }

    let records: Vec<GroupRecord> = serde_json::from_slice(&json)?;
    records
        .into_iter()
        .map(|record| {
            let mut items = Vec::with_capacity(record.r.len());
            for item in record.r {
                match RollItem::try_from(item) {
                    Ok(item) => items.push(item),
                    Err(e) if policy == DecodePolicy::Lenient => {
                        tracing::warn!(group_id = %record.i, error = %e, "Skipping undecodable roll");
                    }
                    Err(e) => return Err(e),
                }
            }
            Ok(RollGroup {
                id: record.i,
                title: record.t,
                items,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_groups() -> Vec<RollGroup> {
        vec![
            RollGroup::titled("Trap")
                .with_item(
                    RollItem::check("reflex", 22)
                        .with_adjustment(DcAdjustment::Hard)
                        .with_traits(["fire"])
                        .as_basic()
                        .with_label("Dodge ($s)"),
                )
                .with_item(RollItem::action("escape", 19).with_variant("squeeze")),
            RollGroup::new().with_item(RollItem::counteract("arcana", 25, 3, 4)),
        ]
    }

    fn compress(json: &str) -> String {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(json.as_bytes()).expect("write");
        general_purpose::STANDARD.encode(encoder.finish().expect("finish"))
    }

    #[test]
    fn round_trip_preserves_groups() {
        let groups = sample_groups();
        let encoded = encode(&groups).expect("encode");
        assert_eq!(decode(&encoded).expect("decode"), groups);
    }

    #[test]
    fn round_trip_normalizes_defaults() {
        let item = RollItem::check("will", 15).with_adjustment(DcAdjustment::Normal);
        let groups = vec![RollGroup::new().with_item(item)];
        let decoded = decode(&encode(&groups).expect("encode")).expect("decode");
        let expected: Vec<RollGroup> = groups.into_iter().map(RollGroup::normalized).collect();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn minified_records_omit_defaults() {
        let group = RollGroup::new().with_item(RollItem::check("will", 15));
        let record = GroupRecord {
            i: group.id,
            t: group.title.clone(),
            r: group.items.iter().map(ItemRecord::from).collect(),
        };
        let json = serde_json::to_value(&record).expect("serialize");
        assert!(json.get("t").is_none());
        let item = &json["r"][0];
        assert_eq!(item["t"], "c");
        assert_eq!(item["sl"], "will");
        assert!(item.get("a").is_none());
        assert!(item.get("b").is_none());
        assert!(item.get("tr").is_none());
    }

    #[test]
    fn malformed_input_fails() {
        assert!(matches!(decode("!!not base64!!"), Err(DecodeError::Base64(_))));
        let not_gzip = general_purpose::STANDARD.encode(b"plain text");
        assert!(matches!(decode(&not_gzip), Err(DecodeError::Decompress(_))));
        assert!(matches!(decode(&compress("{oops")), Err(DecodeError::Json(_))));
    }

    #[test]
    fn oversized_payload_is_refused() {
        let padding = " ".repeat(MAX_DECODED_BYTES as usize + 1);
        let encoded = compress(&format!("[{padding}]"));
        assert!(encoded.len() < 64 * 1024);
        assert!(matches!(
            decode(&encoded),
            Err(DecodeError::TooLarge { limit }) if limit == MAX_DECODED_BYTES
        ));
    }

    #[test]
    fn unknown_kind_follows_policy() {
        let group_id = GroupId::new();
        let json = format!(
            r#"[{{"i":"{}","r":[{{"i":"{}","d":10,"sl":"x","t":"z"}},{{"i":"{}","d":12,"sl":"will","t":"c"}}]}}]"#,
            group_id,
            RollItemId::new(),
            RollItemId::new()
        );
        let encoded = compress(&json);

        let lenient = decode(&encoded).expect("lenient decode");
        assert_eq!(lenient[0].items.len(), 1);
        assert_eq!(lenient[0].items[0].slug, "will");

        assert!(matches!(
            decode_with(&encoded, DecodePolicy::Strict),
            Err(DecodeError::UnknownItemKind(kind)) if kind == "z"
        ));
    }

    #[test]
    fn counteract_without_ranks_is_invalid() {
        let json = format!(
            r#"[{{"i":"{}","r":[{{"i":"{}","d":10,"sl":"arcana","t":"x"}}]}}]"#,
            GroupId::new(),
            RollItemId::new()
        );
        assert!(matches!(
            decode_with(&compress(&json), DecodePolicy::Strict),
            Err(DecodeError::InvalidRecord { .. })
        ));
    }
}
