//! Bracket seeding: rank by rating, pad to a power of two with byes.

use crate::models::{BracketParticipant, Participant, TournamentError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Positional slot list: slot 2i and slot 2i+1 meet in round 1.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SeededBracket {
    pub slots: Vec<BracketParticipant>,
}

impl SeededBracket {
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn bye_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_bye).count()
    }

    /// Real participants, in seed order.
    pub fn seeded(&self) -> Vec<&BracketParticipant> {
        let mut seeded: Vec<_> = self.slots.iter().filter(|s| !s.is_bye).collect();
        seeded.sort_by_key(|s| s.seed);
        seeded
    }

    /// Round-1 pairings, in slot order.
    pub fn round_one_pairs(&self) -> impl Iterator<Item = (&BracketParticipant, &BracketParticipant)> {
        self.slots.chunks_exact(2).map(|pair| (&pair[0], &pair[1]))
    }
}

/// Seed participants into a bracket.
///
/// 1. Sort by rating, highest first (ties keep input order).
/// 2. Seeds 1..N follow that order.
/// 3. Pad to the next power of two with byes. Each bye sits next to one of the
///    top seeds, so the top seeds advance automatically.
/// 4. Everyone else is paired with the adjacent seed (2 vs 3, 4 vs 5, ...), not
///    the usual 1-vs-N layout.
pub fn seed(participants: &[Participant]) -> Result<SeededBracket, TournamentError> {
    if participants.len() < 2 {
        return Err(TournamentError::NotEnoughParticipants {
            found: participants.len(),
        });
    }
    let mut seen = HashSet::new();
    for p in participants {
        if !seen.insert(p.id) {
            return Err(TournamentError::DuplicateParticipant(p.id));
        }
    }

    let mut ranked: Vec<&Participant> = participants.iter().collect();
    ranked.sort_by(|a, b| b.current_rating.cmp(&a.current_rating));

    let slot_count = ranked.len().next_power_of_two();
    let byes = slot_count - ranked.len();

    let mut slots = Vec::with_capacity(slot_count);
    for (i, p) in ranked.iter().enumerate() {
        slots.push(BracketParticipant::seeded(p, i as u32 + 1));
        if i < byes {
            slots.push(BracketParticipant::bye());
        }
    }

    Ok(SeededBracket { slots })
}
