//! Inline roll directives
//!
//! Each item renders to a directive the checker understands. Two roll
//! options carry the correlation key and are echoed back verbatim with the
//! result: `request-rolls-roll-id:<item>` always, and
//! `request-rolls-id:<request>` when the roll belongs to a tracked request.

use crate::entities::{RollGroup, RollItem, RollKind};
use crate::ids::{RequestId, RollItemId};
use crate::value_objects::label::{render_label, LabelLookups};

pub const ROLL_ID_OPTION: &str = "request-rolls-roll-id:";
pub const REQUEST_ID_OPTION: &str = "request-rolls-id:";

/// Roll option marking a reroll paid for with a hero point.
pub const HERO_POINT_OPTION: &str = "check:hero-point";

fn correlation_options(item: &RollItem, request_id: Option<RequestId>) -> String {
    let mut options = vec![format!("{}{}", ROLL_ID_OPTION, item.id)];
    if let Some(request_id) = request_id {
        options.push(format!("{}{}", REQUEST_ID_OPTION, request_id));
    }
    options.join(",")
}

/// Render one item as an inline directive.
pub fn roll_to_inline(
    item: &RollItem,
    request_id: Option<RequestId>,
    lookups: &LabelLookups,
) -> String {
    let options = correlation_options(item, request_id);
    let label = render_label(item, lookups)
        .filter(|l| !l.is_empty())
        .map(|l| format!("{{{}}}", l))
        .unwrap_or_default();

    match &item.kind {
        RollKind::Action { statistic, variant } => {
            let mut parts = vec![
                "[[/act".to_string(),
                item.slug.clone(),
                format!("dc={}", item.dc),
            ];
            if let Some(variant) = variant {
                parts.push(format!("variant={}", variant));
            }
            if let Some(statistic) = statistic {
                parts.push(format!("statistic={}", statistic));
            }
            format!("{} options={}]]{}", parts.join(" "), options, label)
        }
        RollKind::Check {
            traits,
            adjustment,
            basic,
            defense,
        } => {
            let mut out = format!("@Check[{}|dc:{}", item.slug, item.dc);
            if let Some(adjustment) = (*adjustment).filter(|a| a.delta() != 0) {
                out.push_str(&format!("|adjustment:{}", adjustment.delta()));
            }
            if !traits.is_empty() {
                let traits: Vec<&str> = traits.iter().map(String::as_str).collect();
                out.push_str(&format!("|traits:{}", traits.join(",")));
            }
            if *basic {
                out.push_str("|basic:true");
            }
            if let Some(defense) = defense {
                out.push_str(&format!("|defense:{}", defense));
            }
            out.push_str(&format!("|options:{}]{}", options, label));
            out
        }
        RollKind::Counteract {
            source_rank,
            target_rank,
        } => format!(
            "@Check[counteract|statistic:{}|dc:{}|source-rank:{}|target-rank:{}|options:{}]{}",
            item.slug, item.dc, source_rank, target_rank, options, label
        ),
    }
}

/// Render the body of an announcement: a header per titled group followed by
/// that group's directives.
pub fn render_announcement(groups: &[RollGroup], lookups: &LabelLookups) -> String {
    let mut html = String::from(r#"<div class="rollreq--container">"#);
    for group in groups {
        if group.has_title() {
            html.push_str(&format!(
                r#"<div class="rollreq--header"><strong>{}</strong></div>"#,
                escape_html(&group.title)
            ));
        }
        html.push_str(r#"<div class="rollreq--roll-container">"#);
        for item in &group.items {
            html.push_str(&roll_to_inline(item, None, lookups));
        }
        html.push_str("</div>");
    }
    html.push_str("</div>");
    html
}

/// Correlation key recovered from a result's roll options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationTags {
    pub request_id: RequestId,
    pub item_id: RollItemId,
}

impl CorrelationTags {
    /// Both tags must be present and well formed; anything else is untracked.
    pub fn from_options<S: AsRef<str>>(options: &[S]) -> Option<Self> {
        let find = |prefix: &str| {
            options
                .iter()
                .find_map(|o| o.as_ref().strip_prefix(prefix).map(str::to_string))
        };
        let request_id: RequestId = find(REQUEST_ID_OPTION)?.parse().ok()?;
        let item_id: RollItemId = find(ROLL_ID_OPTION)?.parse().ok()?;
        Some(Self {
            request_id,
            item_id,
        })
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::DcAdjustment;

    #[test]
    fn action_directive_with_tracking() {
        let item = RollItem::action("climb", 20)
            .with_variant("quick")
            .with_statistic("athletics");
        let request_id = RequestId::new();
        let rendered = roll_to_inline(&item, Some(request_id), &LabelLookups::new());
        assert_eq!(
            rendered,
            format!(
                "[[/act climb dc=20 variant=quick statistic=athletics options=request-rolls-roll-id:{},request-rolls-id:{}]]",
                item.id, request_id
            )
        );
    }

    #[test]
    fn check_directive_with_every_parameter() {
        let item = RollItem::check("reflex", 22)
            .with_adjustment(DcAdjustment::Hard)
            .with_traits(["fire", "arcane"])
            .as_basic()
            .with_defense("fortitude")
            .with_label("Dodge ($s)");
        let lookups = LabelLookups::new().with_statistic("reflex", "Reflex");
        let rendered = roll_to_inline(&item, None, &lookups);
        assert_eq!(
            rendered,
            format!(
                "@Check[reflex|dc:22|adjustment:2|traits:arcane,fire|basic:true|defense:fortitude|options:request-rolls-roll-id:{}]{{Dodge (Reflex)}}",
                item.id
            )
        );
    }

    #[test]
    fn announce_mode_omits_request_tag() {
        let item = RollItem::counteract("occultism", 24, 3, 5);
        let rendered = roll_to_inline(&item, None, &LabelLookups::new());
        assert!(rendered.starts_with("@Check[counteract|statistic:occultism|dc:24|source-rank:3|target-rank:5"));
        assert!(!rendered.contains(REQUEST_ID_OPTION));
    }

    #[test]
    fn announcement_has_headers_only_for_titled_groups() {
        let groups = vec![
            RollGroup::titled("<Trap>").with_item(RollItem::check("reflex", 20)),
            RollGroup::new().with_item(RollItem::check("will", 18)),
        ];
        let html = render_announcement(&groups, &LabelLookups::new());
        assert_eq!(html.matches("rollreq--header").count(), 1);
        assert!(html.contains("<strong>&lt;Trap&gt;</strong>"));
        assert_eq!(html.matches("rollreq--roll-container").count(), 2);
    }

    #[test]
    fn tags_round_trip_through_options() {
        let item = RollItem::new_check();
        let request_id = RequestId::new();
        let options: Vec<String> = correlation_options(&item, Some(request_id))
            .split(',')
            .map(str::to_string)
            .collect();
        assert_eq!(
            CorrelationTags::from_options(&options),
            Some(CorrelationTags {
                request_id,
                item_id: item.id
            })
        );
    }

    #[test]
    fn untracked_or_malformed_tags_are_rejected() {
        let item_only = [format!("{}{}", ROLL_ID_OPTION, RollItemId::new())];
        assert_eq!(CorrelationTags::from_options(&item_only), None);

        let garbage = [
            format!("{}not-an-id", ROLL_ID_OPTION),
            format!("{}{}", REQUEST_ID_OPTION, RequestId::new()),
        ];
        assert_eq!(CorrelationTags::from_options(&garbage), None);
    }
}
