/// Per-user ranking state with serialized insertion workflows.
///
/// Each user gets one `RankingState` and one async lane per category. A lane is
/// held for the whole comparison sequence so two insertions into the same
/// (user, category) never interleave. The state lock itself is only taken to
/// snapshot the category and to commit, so other categories and other users
/// keep moving while an oracle is thinking.
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{InsertError, RankError};
use crate::insertion::{ComparisonOracle, compute_insertion_rank};
use crate::policy::ScorePolicy;
use crate::state::RankingState;
use crate::types::{Candidate, Category, RankedItem};

pub type UserId = String;

struct UserSlot {
    state: Mutex<RankingState>,
    lanes: [tokio::sync::Mutex<()>; 3],
}

impl UserSlot {
    fn new(state: RankingState) -> Self {
        UserSlot {
            state: Mutex::new(state),
            lanes: [
                tokio::sync::Mutex::new(()),
                tokio::sync::Mutex::new(()),
                tokio::sync::Mutex::new(()),
            ],
        }
    }
}

pub struct RankingRegistry {
    users: DashMap<UserId, Arc<UserSlot>>,
    policy: ScorePolicy,
}

impl Default for RankingRegistry {
    fn default() -> Self {
        RankingRegistry::new(ScorePolicy::default())
    }
}

impl RankingRegistry {
    /// `policy` applies to users created on first insertion.
    pub fn new(policy: ScorePolicy) -> Self {
        RankingRegistry {
            users: DashMap::new(),
            policy,
        }
    }

    fn slot(&self, user: &str) -> Arc<UserSlot> {
        if let Some(slot) = self.users.get(user) {
            return Arc::clone(&slot);
        }
        let slot = self
            .users
            .entry(user.to_string())
            .or_insert_with(|| Arc::new(UserSlot::new(RankingState::with_policy(self.policy.clone()))));
        Arc::clone(&slot)
    }

    /// Install previously persisted state for `user`, replacing anything held.
    ///
    /// The state is validated first. Refused with `InsertionInProgress` while any
    /// of the user's insertions is running, since that insertion would otherwise
    /// commit into the replaced state.
    pub fn load(&self, user: &str, state: RankingState) -> Result<(), RankError> {
        state.validate()?;
        let previous = self.users.get(user).map(|slot| Arc::clone(&slot));
        let mut held = Vec::with_capacity(Category::ALL.len());
        if let Some(ref slot) = previous {
            for category in Category::ALL {
                match slot.lanes[category.index()].try_lock() {
                    Ok(lane) => held.push(lane),
                    Err(_) => return Err(RankError::InsertionInProgress { category }),
                }
            }
        }
        self.users
            .insert(user.to_string(), Arc::new(UserSlot::new(state)));
        drop(held);
        debug!(user, "state loaded");
        Ok(())
    }

    fn is_current(&self, user: &str, slot: &Arc<UserSlot>) -> bool {
        self.users
            .get(user)
            .is_some_and(|current| Arc::ptr_eq(&current, slot))
    }

    /// Copy of the user's current state, for persistence or rendering.
    pub fn snapshot(&self, user: &str) -> Option<RankingState> {
        self.users.get(user).map(|slot| slot.state.lock().clone())
    }

    pub fn users(&self) -> Vec<UserId> {
        self.users.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Find where `candidate` belongs in `category` by asking `oracle`, then insert it.
    ///
    /// Waits for any other insertion into the same (user, category) to finish first.
    /// If the oracle fails or the future is dropped, nothing is inserted.
    pub async fn rank_and_insert<O>(
        &self,
        user: &str,
        category: Category,
        candidate: Candidate,
        oracle: &mut O,
        added_at: DateTime<Utc>,
    ) -> Result<RankedItem, InsertError<O::Error>>
    where
        O: ComparisonOracle,
    {
        loop {
            let slot = self.slot(user);
            let _lane = slot.lanes[category.index()].lock().await;
            // `load` swapped the slot out while we waited for the lane.
            if !self.is_current(user, &slot) {
                continue;
            }

            let existing = {
                let state = slot.state.lock();
                if state.contains(candidate.id) {
                    return Err(RankError::DuplicateItem(candidate.id).into());
                }
                state.candidates(category)
            };

            let rank = compute_insertion_rank(&existing, &candidate, oracle)
                .await
                .map_err(InsertError::Oracle)?;

            let mut state = slot.state.lock();
            let item = state
                .insert_at(category, rank - 1, candidate, added_at)?
                .clone();
            debug!(user, id = item.id, %category, rank, "registry insertion committed");
            return Ok(item);
        }
    }
}
