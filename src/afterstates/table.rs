//! Afterstate table builder
//!
//! Scans the whole codespace of a variant once and records, for every
//! decision state, the afterstate reached by each legal action.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::fingerprint::Fnv1a;
use crate::{
    Error, Result,
    tictactoe::{Action, BoardState, StateCode, Variant},
};

/// Dense index of an afterstate, used to address the value table
pub type AfterstateId = usize;

/// Immutable map `state code -> [(action, afterstate id)]`.
///
/// Ids are handed out in first-seen order while scanning codes ascending and
/// actions ascending, so two builds of the same variant are identical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AfterstateTable {
    variant: Variant,
    /// Indexed by state code; empty for codes that are not decision states
    transitions: Vec<Vec<(Action, AfterstateId)>>,
    /// Indexed by afterstate id
    afterstate_codes: Vec<StateCode>,
}

impl AfterstateTable {
    /// Enumerate every decision state of `variant` and its afterstates.
    ///
    /// # Errors
    ///
    /// Only fails if a legal action cannot be applied, which would indicate
    /// an inconsistent rule set.
    pub fn build(variant: Variant) -> Result<Self> {
        let codespace = variant.codespace();
        let mut transitions = Vec::with_capacity(codespace as usize);
        let mut afterstate_codes = Vec::new();
        let mut ids: HashMap<StateCode, AfterstateId> = HashMap::new();

        for code in 0..codespace {
            let state = BoardState::decode(variant, code)?;
            if !variant.is_decision_state(&state) {
                transitions.push(Vec::new());
                continue;
            }

            let mut entry = Vec::new();
            for action in state.legal_actions() {
                let afterstate = state.apply(action)?.code();
                let id = *ids.entry(afterstate).or_insert_with(|| {
                    afterstate_codes.push(afterstate);
                    afterstate_codes.len() - 1
                });
                entry.push((action, id));
            }
            transitions.push(entry);
        }

        let table = Self {
            variant,
            transitions,
            afterstate_codes,
        };
        log::info!(
            "Built {variant} afterstate table: {} decision states, {} transitions, {} afterstates",
            table.decision_states().count(),
            table.transition_count(),
            table.afterstate_count()
        );
        Ok(table)
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Recorded `(action, afterstate id)` pairs of a state, actions ascending
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownState`] if the state has no entry.
    pub fn transitions(&self, state: StateCode) -> Result<&[(Action, AfterstateId)]> {
        match self.transitions.get(state as usize) {
            Some(entry) if !entry.is_empty() => Ok(entry),
            _ => Err(Error::UnknownState { code: state }),
        }
    }

    /// Afterstate id reached by `action` in `state`
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownState`] or [`Error::UnknownAction`] when the
    /// pair was not recorded.
    pub fn afterstate(&self, state: StateCode, action: Action) -> Result<AfterstateId> {
        self.transitions(state)?
            .iter()
            .find(|&&(recorded, _)| recorded == action)
            .map(|&(_, id)| id)
            .ok_or(Error::UnknownAction {
                code: state,
                action,
            })
    }

    /// Number of distinct afterstates, which is the value table length
    pub fn afterstate_count(&self) -> usize {
        self.afterstate_codes.len()
    }

    /// Board code of an afterstate id
    pub fn afterstate_code(&self, id: AfterstateId) -> Option<StateCode> {
        self.afterstate_codes.get(id).copied()
    }

    /// Codes of all states with recorded transitions, ascending
    pub fn decision_states(&self) -> impl Iterator<Item = StateCode> + '_ {
        self.transitions
            .iter()
            .enumerate()
            .filter(|(_, entry)| !entry.is_empty())
            .map(|(code, _)| code as StateCode)
    }

    /// Total number of recorded (state, action) pairs
    pub fn transition_count(&self) -> usize {
        self.transitions.iter().map(Vec::len).sum()
    }

    /// Hash of the variant, every recorded transition and the id numbering.
    ///
    /// Stored alongside persisted values so they are never loaded against a
    /// table that numbers afterstates differently.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = Fnv1a::new();
        hasher.write(self.variant.to_string().as_bytes());
        for (code, entry) in self.transitions.iter().enumerate() {
            if entry.is_empty() {
                continue;
            }
            hasher.write_u32(code as StateCode);
            for &(action, id) in entry {
                hasher.write_u64(action as u64);
                hasher.write_u64(id as u64);
            }
        }
        for &code in &self.afterstate_codes {
            hasher.write_u32(code);
        }
        hasher.finish()
    }

    /// Check the shape of a table that did not come from [`build`](Self::build)
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTable`] when the table does not cover the
    /// variant's codespace or refers to an afterstate id it does not hold.
    pub fn validate(&self) -> Result<()> {
        let codespace = self.variant.codespace() as usize;
        if self.transitions.len() != codespace {
            return Err(Error::InvalidTable {
                message: format!(
                    "{} entries for a codespace of {codespace}",
                    self.transitions.len()
                ),
            });
        }

        let count = self.afterstate_count();
        for (code, entry) in self.transitions.iter().enumerate() {
            if let Some(&(action, id)) = entry.iter().find(|&&(_, id)| id >= count) {
                return Err(Error::InvalidTable {
                    message: format!(
                        "state {code} action {action} points at afterstate {id} of {count}"
                    ),
                });
            }
        }
        Ok(())
    }

    /// Check that this table still hashes to `expected`
    ///
    /// # Errors
    ///
    /// Returns [`Error::TableFingerprintMismatch`] otherwise.
    pub fn verify_fingerprint(&self, expected: u64) -> Result<()> {
        let found = self.fingerprint();
        if found == expected {
            Ok(())
        } else {
            Err(Error::TableFingerprintMismatch { expected, found })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tictactoe::PASS;

    #[test]
    fn test_empty_board_entry() {
        let table = AfterstateTable::build(Variant::Standard).unwrap();
        let entry = table.transitions(0).unwrap();

        assert_eq!(entry.len(), 9);
        for &(action, id) in entry {
            assert_eq!(table.afterstate_code(id), Some(3u32.pow(action as u32)));
        }
    }

    #[test]
    fn test_terminal_states_have_no_entry() {
        let table = AfterstateTable::build(Variant::Standard).unwrap();
        let won = BoardState::from_string(Variant::Standard, "XXXOO....").unwrap();

        let result = table.transitions(won.code());
        assert!(matches!(result, Err(Error::UnknownState { .. })));
        assert!(table.transitions(Variant::Standard.codespace()).is_err());
    }

    #[test]
    fn test_unknown_action() {
        let table = AfterstateTable::build(Variant::Standard).unwrap();
        let state = BoardState::from_string(Variant::Standard, "XO.......").unwrap();

        assert!(table.afterstate(state.code(), 2).is_ok());
        assert!(matches!(
            table.afterstate(state.code(), 0),
            Err(Error::UnknownAction { action: 0, .. })
        ));
    }

    #[test]
    fn test_capture_pass_recorded_last() {
        let table = AfterstateTable::build(Variant::Capture).unwrap();
        let state = BoardState::from_string(Variant::Capture, "XO.......").unwrap();
        let entry = table.transitions(state.code()).unwrap();

        assert_eq!(entry.last().map(|&(action, _)| action), Some(PASS));
        let id = table.afterstate(state.code(), PASS).unwrap();
        assert_eq!(table.afterstate_code(id), Some(state.code() + 19_683));
    }

    #[test]
    fn test_fingerprint_distinguishes_variants() {
        let standard = AfterstateTable::build(Variant::Standard).unwrap();
        let capture = AfterstateTable::build(Variant::Capture).unwrap();

        assert_eq!(
            standard.fingerprint(),
            AfterstateTable::build(Variant::Standard).unwrap().fingerprint()
        );
        assert_ne!(standard.fingerprint(), capture.fingerprint());
    }

    /// Same transitions with afterstates 0 and 1 numbered the other way round
    fn swap_first_two_ids(table: &AfterstateTable) -> AfterstateTable {
        let mut swapped = table.clone();
        swapped.afterstate_codes.swap(0, 1);
        for entry in &mut swapped.transitions {
            for (_, id) in entry.iter_mut() {
                *id = match *id {
                    0 => 1,
                    1 => 0,
                    other => other,
                };
            }
        }
        swapped
    }

    #[test]
    fn test_fingerprint_depends_on_id_numbering() {
        let table = AfterstateTable::build(Variant::Standard).unwrap();
        let swapped = swap_first_two_ids(&table);

        for &(action, id) in table.transitions(0).unwrap() {
            let other = swapped.afterstate(0, action).unwrap();
            assert_eq!(table.afterstate_code(id), swapped.afterstate_code(other));
        }
        assert_ne!(table.fingerprint(), swapped.fingerprint());
    }

    #[test]
    fn test_validate() {
        let table = AfterstateTable::build(Variant::Capture).unwrap();
        assert!(table.validate().is_ok());

        let mut short = table.clone();
        short.transitions.truncate(19_683);
        assert!(matches!(short.validate(), Err(Error::InvalidTable { .. })));

        let mut dangling = table.clone();
        dangling.transitions[0][0].1 = table.afterstate_count();
        assert!(matches!(
            dangling.validate(),
            Err(Error::InvalidTable { .. })
        ));
    }
}
