use std::collections::{BTreeMap, BTreeSet};

use crate::analytics::rules::persona_recommendation;
use crate::analytics::validator::WorkingSet;
use crate::domain::analysis::{DecisionMakerPatterns, Persona};
use crate::domain::deal::ContactRole;

const NO_DECISION_MAKER_RECOMMENDATION: &str =
    "No decision makers are tagged on won deals yet; record contact roles to surface this pattern";

#[derive(Clone, Debug, PartialEq)]
pub struct PersonaExtraction {
    pub personas: Vec<Persona>,
    pub decision_maker_patterns: DecisionMakerPatterns,
    pub won_deals: usize,
    pub contacts_seen: usize,
}

/// Occurrence counter keyed by a case-folded value that remembers the first-seen spelling.
#[derive(Debug, Default)]
struct Tally {
    entries: BTreeMap<String, TallyEntry>,
}

#[derive(Debug)]
struct TallyEntry {
    display: String,
    count: usize,
    roles: BTreeSet<ContactRole>,
}

impl Tally {
    fn record(&mut self, key: &str, display: &str, role: ContactRole) {
        let entry = self.entries.entry(key.to_string()).or_insert_with(|| TallyEntry {
            display: display.to_string(),
            count: 0,
            roles: BTreeSet::new(),
        });
        entry.count += 1;
        entry.roles.insert(role);
    }

    /// Highest count wins; ties go to the lexicographically smallest key.
    fn most_common(&self) -> Option<&TallyEntry> {
        self.entries.values().fold(None::<&TallyEntry>, |best, entry| match best {
            Some(current) if current.count >= entry.count => Some(current),
            _ => Some(entry),
        })
    }
}

pub fn extract_personas(set: &WorkingSet, min_occurrences: usize) -> PersonaExtraction {
    let mut titles = Tally::default();
    let mut decision_titles = Tally::default();
    let mut decision_seniorities = Tally::default();
    let mut contacts_seen = 0;

    for contact in set.won().flat_map(|deal| deal.contacts.iter()) {
        contacts_seen += 1;
        titles.record(&contact.title_key, &contact.title, contact.role);

        if contact.role == ContactRole::DecisionMaker {
            decision_titles.record(&contact.title_key, &contact.title, contact.role);
            if let Some(seniority) = &contact.seniority {
                decision_seniorities.record(&seniority.to_lowercase(), seniority, contact.role);
            }
        }
    }

    let mut ranked: Vec<(&String, &TallyEntry)> = titles
        .entries
        .iter()
        .filter(|(_, entry)| entry.count >= min_occurrences.max(1))
        .collect();
    ranked.sort_by(|(left_key, left), (right_key, right)| {
        right.count.cmp(&left.count).then_with(|| left_key.cmp(right_key))
    });

    let personas = ranked
        .into_iter()
        .map(|(_, entry)| {
            let typical_roles = typical_roles(&entry.roles);
            Persona {
                title_pattern: entry.display.clone(),
                occurrence_count: entry.count,
                recommendation: persona_recommendation(&typical_roles, &entry.display),
                typical_roles,
            }
        })
        .collect();

    PersonaExtraction {
        personas,
        decision_maker_patterns: decision_maker_patterns(&decision_titles, &decision_seniorities),
        won_deals: set.won().count(),
        contacts_seen,
    }
}

/// Distinct observed roles; `unknown` only survives when nothing else was seen.
fn typical_roles(roles: &BTreeSet<ContactRole>) -> Vec<ContactRole> {
    let known: Vec<ContactRole> =
        roles.iter().copied().filter(|role| *role != ContactRole::Unknown).collect();
    if known.is_empty() {
        roles.iter().copied().collect()
    } else {
        known
    }
}

fn decision_maker_patterns(titles: &Tally, seniorities: &Tally) -> DecisionMakerPatterns {
    let most_common_title = titles.most_common().map(|entry| entry.display.clone());
    let most_common_seniority = seniorities.most_common().map(|entry| entry.display.clone());

    let recommendation = match (&most_common_title, &most_common_seniority) {
        (Some(title), Some(seniority)) => format!(
            "Prioritize the {title} ({seniority}) as the economic decision maker on new deals"
        ),
        (Some(title), None) => {
            format!("Prioritize the {title} as the economic decision maker on new deals")
        }
        (None, _) => NO_DECISION_MAKER_RECOMMENDATION.to_string(),
    };

    DecisionMakerPatterns { most_common_title, most_common_seniority, recommendation }
}
