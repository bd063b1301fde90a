use crate::config::{validate_rules, InteractionRule};
use crate::error::ConfigError;

/// Directional coefficient table between particle types.
///
/// `coefficient(a, b)` is how strongly a particle of type `a` reacts to one of
/// type `b`. Positive attracts, negative repels, zero ignores. The table is
/// never mirrored: `(a, b)` and `(b, a)` are independent entries.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionTable {
    /// Row-major: `[a * type_count + b]`.
    coefficients: Vec<f32>,
    type_count: usize,
}

impl InteractionTable {
    /// Table with every pair at zero.
    pub fn new(type_count: usize) -> Self {
        Self {
            coefficients: vec![0.0; type_count * type_count],
            type_count,
        }
    }

    /// Build from rules. Later rules for the same pair overwrite earlier ones.
    pub fn from_rules(type_count: usize, rules: &[InteractionRule]) -> Result<Self, ConfigError> {
        validate_rules(rules, type_count)?;
        let mut table = Self::new(type_count);
        for rule in rules {
            table.coefficients[rule.source * type_count + rule.target] = rule.coefficient;
        }
        Ok(table)
    }

    #[inline]
    pub fn type_count(&self) -> usize {
        self.type_count
    }

    /// Coefficient for `source` reacting to `target`; zero for unknown types.
    #[inline]
    pub fn coefficient(&self, source: usize, target: usize) -> f32 {
        if source < self.type_count && target < self.type_count {
            self.coefficients[source * self.type_count + target]
        } else {
            0.0
        }
    }

    /// Overwrite one entry. Out-of-range types are ignored.
    pub fn set(&mut self, source: usize, target: usize, coefficient: f32) {
        if source < self.type_count && target < self.type_count {
            self.coefficients[source * self.type_count + target] = coefficient;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_are_directional() {
        let table = InteractionTable::from_rules(2, &[InteractionRule::new(0, 1, 1.0)]).unwrap();
        assert_eq!(table.coefficient(0, 1), 1.0);
        assert_eq!(table.coefficient(1, 0), 0.0);
        assert_eq!(table.coefficient(0, 0), 0.0);
    }

    #[test]
    fn later_duplicates_win() {
        let rules = [
            InteractionRule::new(1, 2, 0.5),
            InteractionRule::new(1, 2, -0.75),
        ];
        let table = InteractionTable::from_rules(3, &rules).unwrap();
        assert_eq!(table.coefficient(1, 2), -0.75);
    }

    #[test]
    fn rejects_out_of_range_rules() {
        let err = InteractionTable::from_rules(2, &[InteractionRule::new(0, 2, 1.0)]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::RuleTypeOutOfRange { rule: 0, target_type: 2, type_count: 2, .. }
        ));
    }

    #[test]
    fn set_and_lookup_ignore_unknown_types() {
        let mut table = InteractionTable::new(2);
        table.set(1, 1, 3.0);
        table.set(5, 0, 9.0);
        assert_eq!(table.coefficient(1, 1), 3.0);
        assert_eq!(table.coefficient(5, 0), 0.0);
        assert_eq!(table.type_count(), 2);
    }
}
