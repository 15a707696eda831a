//! Share links and the transport codec as engine operations.

use rollreq_domain::RollGroup;
use rollreq_shared::{
    decode_with, encode, find_share_links, share_link, DecodeError, DecodePolicy, EncodeError,
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("Encode failed: {0}")]
    Encode(#[from] EncodeError),
    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedGroups {
    pub encoded: String,
    pub link: String,
}

/// Groups recovered from one share link found in free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedLink {
    pub label: Option<String>,
    pub groups: Vec<RollGroup>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ShareOps {
    policy: DecodePolicy,
}

impl ShareOps {
    pub fn new(policy: DecodePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> DecodePolicy {
        self.policy
    }

    pub fn encode(&self, groups: &[RollGroup], label: Option<&str>) -> Result<SharedGroups, ShareError> {
        let encoded = encode(groups)?;
        let link = share_link(&encoded, label);
        Ok(SharedGroups { encoded, link })
    }

    pub fn decode(&self, encoded: &str) -> Result<Vec<RollGroup>, ShareError> {
        Ok(decode_with(encoded, self.policy)?)
    }

    /// Decode every link in `text`. Links that fail to decode are skipped.
    pub fn decode_links(&self, text: &str) -> Vec<DecodedLink> {
        find_share_links(text)
            .into_iter()
            .filter_map(|link| match decode_with(&link.encoded, self.policy) {
                Ok(groups) => Some(DecodedLink {
                    label: link.label,
                    groups,
                }),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping undecodable share link");
                    None
                }
            })
            .collect()
    }
}
