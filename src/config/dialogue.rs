//! Dialogue loop configuration

use serde::Deserialize;

use crate::domain::dialogue::DialogueRules;

use super::error::ValidationError;

/// Bounds on challenge and principle cycles
#[derive(Debug, Clone, Deserialize)]
pub struct DialogueConfig {
    /// Challenge loops before principle reasoning is forced
    #[serde(default = "default_max_loops")]
    pub max_loops: u32,

    /// Loops required before a principle may close the dialogue
    #[serde(default = "default_min_loops_for_closure")]
    pub min_loops_for_closure: u32,
}

impl DialogueConfig {
    /// Domain rules for these bounds
    pub fn rules(&self) -> Result<DialogueRules, ValidationError> {
        DialogueRules::new(self.max_loops, self.min_loops_for_closure)
            .map_err(|e| ValidationError::InvalidLoopBounds(e.to_string()))
    }

    /// Validate dialogue configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.rules().map(|_| ())
    }
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            max_loops: default_max_loops(),
            min_loops_for_closure: default_min_loops_for_closure(),
        }
    }
}

fn default_max_loops() -> u32 {
    3
}

fn default_min_loops_for_closure() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = DialogueConfig::default();
        assert_eq!(config.max_loops, 3);
        assert_eq!(config.min_loops_for_closure, 1);
        assert_eq!(config.rules().unwrap(), DialogueRules::default());
    }

    #[test]
    fn test_min_above_max_rejected() {
        let config = DialogueConfig {
            max_loops: 2,
            min_loops_for_closure: 3,
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidLoopBounds(_))
        ));
    }
}
