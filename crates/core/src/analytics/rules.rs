//! Static rule tables for recommendation text. Immutable; passed by reference.

use crate::domain::deal::ContactRole;

/// Win-rate floor for a bucket to count as a win pattern.
pub const WIN_PATTERN_FLOOR: f64 = 0.6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitTier {
    pub min_win_rate: f64,
    pub label: &'static str,
    pub action: &'static str,
}

/// Ordered from the highest floor down; the first tier a win rate reaches applies.
pub static FIT_TIERS: &[FitTier] = &[
    FitTier { min_win_rate: 0.8, label: "Strong fit", action: "target more" },
    FitTier {
        min_win_rate: WIN_PATTERN_FLOOR,
        label: "Moderate fit",
        action: "continue targeting",
    },
];

pub fn fit_tier(win_rate: f64) -> Option<&'static FitTier> {
    FIT_TIERS.iter().find(|tier| win_rate >= tier.min_win_rate)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LossRemediation {
    pub aliases: &'static [&'static str],
    pub recommendation: &'static str,
}

pub static LOSS_REMEDIATIONS: &[LossRemediation] = &[
    LossRemediation {
        aliases: &["price", "pricing", "cost", "too expensive"],
        recommendation: "Lead with value-based pricing and quantify ROI before the proposal stage",
    },
    LossRemediation {
        aliases: &["competitor", "competition", "lost to competitor"],
        recommendation: "Sharpen competitive differentiation and arm reps with battlecards",
    },
    LossRemediation {
        aliases: &["timing", "bad timing", "not now"],
        recommendation: "Qualify purchase timelines earlier and move stalled deals into nurture",
    },
    LossRemediation {
        aliases: &["budget", "no budget", "budget cut"],
        recommendation: "Confirm budget ownership and allocation during discovery",
    },
    LossRemediation {
        aliases: &["no_decision", "no decision", "status quo"],
        recommendation: "Build urgency with a documented cost of inaction and a committed champion",
    },
    LossRemediation {
        aliases: &["features", "product_fit", "product fit", "missing features"],
        recommendation: "Validate requirements against the roadmap before investing in pursuit",
    },
    LossRemediation {
        aliases: &["champion_left", "champion left", "lost champion"],
        recommendation: "Multi-thread accounts so deals survive the loss of a single champion",
    },
    LossRemediation {
        aliases: &["security", "compliance", "legal"],
        recommendation: "Engage security and legal reviewers early with prepared documentation",
    },
];

pub const GENERIC_LOSS_RECOMMENDATION: &str =
    "Investigate further: review call notes for these deals to find the underlying cause";

pub fn loss_remediation(reason: &str) -> &'static str {
    let normalized = reason.trim().to_lowercase();
    LOSS_REMEDIATIONS
        .iter()
        .find(|entry| entry.aliases.iter().any(|alias| *alias == normalized))
        .map_or(GENERIC_LOSS_RECOMMENDATION, |entry| entry.recommendation)
}

/// Persona recommendation templates in role priority order, most influential first.
/// `{title}` is replaced with the persona's display title.
pub static PERSONA_PLAYBOOK: &[(ContactRole, &str)] = &[
    (
        ContactRole::DecisionMaker,
        "Secure executive alignment with the {title} early; this title signs off on won deals",
    ),
    (ContactRole::Champion, "Cultivate the {title} as an internal champion from first contact"),
    (ContactRole::Influencer, "Bring the {title} into the evaluation to shape requirements"),
    (ContactRole::Blocker, "Address {title} objections proactively before they stall the deal"),
    (
        ContactRole::Unknown,
        "Engage the {title} on new opportunities; this title recurs on won deals",
    ),
];

pub fn persona_recommendation(roles: &[ContactRole], title: &str) -> String {
    let template = PERSONA_PLAYBOOK
        .iter()
        .find(|(role, _)| roles.contains(role))
        .or_else(|| PERSONA_PLAYBOOK.last())
        .map_or("Engage the {title}", |(_, template)| *template);
    template.replace("{title}", title)
}
