//! Tournaments by id. Each tournament has its own lock, so different
//! tournaments advance in parallel while results for one are applied in order.

use crate::logic::{create_tournament, seed};
use crate::models::{Participant, Tournament, TournamentError, TournamentId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

#[derive(Debug, Default)]
pub struct TournamentRegistry {
    tournaments: RwLock<HashMap<TournamentId, Arc<Mutex<Tournament>>>>,
}

impl TournamentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `participants` into a new bracket and register it.
    pub fn create(&self, participants: &[Participant]) -> Result<Tournament, TournamentError> {
        let tournament = create_tournament(&seed(participants)?)?;
        self.insert(tournament.clone());
        Ok(tournament)
    }

    pub fn insert(&self, tournament: Tournament) {
        let id = tournament.id;
        self.tournaments
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(Mutex::new(tournament)));
    }

    fn entry(&self, id: TournamentId) -> Result<Arc<Mutex<Tournament>>, TournamentError> {
        self.tournaments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or(TournamentError::TournamentNotFound(id))
    }

    /// Snapshot of a tournament.
    pub fn get(&self, id: TournamentId) -> Result<Tournament, TournamentError> {
        self.with_tournament(id, |t| Ok(t.clone()))
    }

    /// Run `f` with exclusive access to one tournament. The registry map is
    /// only locked long enough to find the entry.
    pub fn with_tournament<T>(
        &self,
        id: TournamentId,
        f: impl FnOnce(&mut Tournament) -> Result<T, TournamentError>,
    ) -> Result<T, TournamentError> {
        let entry = self.entry(id)?;
        let mut tournament = entry.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut tournament)
    }

    pub fn ids(&self) -> Vec<TournamentId> {
        self.tournaments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }
}
