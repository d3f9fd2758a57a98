//! Loop bounds that keep a dialogue finite.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// Hard upper bound accepted for `max_loops`.
pub const MAX_LOOPS_CEILING: u32 = 20;

/// Bounds on challenge and principle cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueRules {
    /// Loop count at which case challenges stop and principle reasoning begins.
    pub max_loops: u32,
    /// Loops required before a principle may be accepted and closure begins.
    pub min_loops_for_closure: u32,
}

impl DialogueRules {
    /// Creates validated rules.
    pub fn new(max_loops: u32, min_loops_for_closure: u32) -> Result<Self, ValidationError> {
        let rules = Self {
            max_loops,
            min_loops_for_closure,
        };
        rules.validate()?;
        Ok(rules)
    }

    /// Checks `1 <= min_loops_for_closure <= max_loops <= MAX_LOOPS_CEILING`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_loops == 0 || self.max_loops > MAX_LOOPS_CEILING {
            return Err(ValidationError::out_of_range(
                "max_loops",
                1,
                MAX_LOOPS_CEILING,
                self.max_loops,
            ));
        }
        if self.min_loops_for_closure == 0 || self.min_loops_for_closure > self.max_loops {
            return Err(ValidationError::out_of_range(
                "min_loops_for_closure",
                1,
                self.max_loops,
                self.min_loops_for_closure,
            ));
        }
        Ok(())
    }

    /// True once enough loops have run for the principle to be accepted.
    pub fn closure_allowed(&self, loop_count: u32) -> bool {
        loop_count >= self.min_loops_for_closure
    }

    /// True once the challenge budget is spent.
    pub fn loops_exhausted(&self, loop_count: u32) -> bool {
        loop_count >= self.max_loops
    }

    /// Increments a loop count without exceeding `max_loops`.
    pub fn next_loop(&self, loop_count: u32) -> u32 {
        (loop_count + 1).min(self.max_loops)
    }
}

impl Default for DialogueRules {
    fn default() -> Self {
        Self {
            max_loops: 3,
            min_loops_for_closure: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(DialogueRules::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_max_loops() {
        assert!(DialogueRules::new(0, 0).is_err());
    }

    #[test]
    fn rejects_min_above_max() {
        let err = DialogueRules::new(2, 3).unwrap_err();
        assert!(err.to_string().contains("min_loops_for_closure"));
    }

    #[test]
    fn rejects_ceiling_overflow() {
        assert!(DialogueRules::new(MAX_LOOPS_CEILING + 1, 1).is_err());
    }

    #[test]
    fn next_loop_saturates() {
        let rules = DialogueRules::new(2, 1).unwrap();
        assert_eq!(rules.next_loop(0), 1);
        assert_eq!(rules.next_loop(1), 2);
        assert_eq!(rules.next_loop(2), 2);
    }

    #[test]
    fn closure_and_exhaustion_thresholds() {
        let rules = DialogueRules::new(3, 2).unwrap();
        assert!(!rules.closure_allowed(1));
        assert!(rules.closure_allowed(2));
        assert!(!rules.loops_exhausted(2));
        assert!(rules.loops_exhausted(3));
    }
}
