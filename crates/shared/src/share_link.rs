//! Share links: `@RequestRolls[<encoded>]{<label>}`
//!
//! A link carries a codec string inside free text so a GM can paste it
//! into chat and reopen the request later.

use std::sync::LazyLock;

use regex_lite::Regex;

static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@RequestRolls\[(\S+?)\](?:\{([^}]+)\})?").expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    pub encoded: String,
    pub label: Option<String>,
}

/// Build a link for `encoded`. An empty label is left out.
pub fn share_link(encoded: &str, label: Option<&str>) -> String {
    match label.filter(|l| !l.is_empty()) {
        Some(label) => format!("@RequestRolls[{}]{{{}}}", encoded, label),
        None => format!("@RequestRolls[{}]", encoded),
    }
}

/// Every link in `text`, in order of appearance.
pub fn find_share_links(text: &str) -> Vec<ShareLink> {
    LINK_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let encoded = caps.get(1)?.as_str().to_string();
            let label = caps.get(2).map(|m| m.as_str().to_string());
            Some(ShareLink { encoded, label })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, encode};
    use rollreq_domain::{RollGroup, RollItem};

    #[test]
    fn builds_links_with_and_without_label() {
        assert_eq!(share_link("abc=", Some("Trap")), "@RequestRolls[abc=]{Trap}");
        assert_eq!(share_link("abc=", Some("")), "@RequestRolls[abc=]");
        assert_eq!(share_link("abc=", None), "@RequestRolls[abc=]");
    }

    #[test]
    fn finds_every_link_in_text() {
        let text = "Roll these: @RequestRolls[H4sIAAA=]{Ambush} and later @RequestRolls[Zm9v]";
        assert_eq!(
            find_share_links(text),
            vec![
                ShareLink {
                    encoded: "H4sIAAA=".into(),
                    label: Some("Ambush".into())
                },
                ShareLink {
                    encoded: "Zm9v".into(),
                    label: None
                },
            ]
        );
        assert!(find_share_links("no links here").is_empty());
    }

    #[test]
    fn link_carries_decodable_groups() {
        let groups = vec![RollGroup::titled("Door").with_item(RollItem::check("thievery", 20))];
        let encoded = encode(&groups).expect("encode");
        let text = format!("GM notes {}", share_link(&encoded, Some("Door")));

        let links = find_share_links(&text);
        assert_eq!(links.len(), 1);
        assert_eq!(decode(&links[0].encoded).expect("decode"), groups);
    }
}
