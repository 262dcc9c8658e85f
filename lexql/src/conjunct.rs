use crate::ast::Predicate;

/// Splits a predicate tree into the pieces a scan can handle one at a time.
///
/// Conjuncts are the operands of a chain of ANDs: `a = 1 AND (b = 2 AND c = 3)`
/// yields three of them. An OR stops the descent and is kept whole, so
/// `a = 1 AND (b = 2 OR c = 3)` yields `a = 1` and `b = 2 OR c = 3`.
/// Disjuncts are the same idea for chains of ORs.
pub struct ConjunctFinder;

impl ConjunctFinder {
    /// Extract all top-level conjuncts from a predicate tree, in order of appearance.
    pub fn find(predicate: &Predicate) -> Vec<Predicate> {
        let mut conjuncts = Vec::new();
        Self::extract_conjuncts(predicate, &mut conjuncts);
        conjuncts
    }

    /// Extract all top-level disjuncts from a predicate tree, in order of appearance.
    pub fn disjuncts(predicate: &Predicate) -> Vec<Predicate> {
        let mut disjuncts = Vec::new();
        Self::extract_disjuncts(predicate, &mut disjuncts);
        disjuncts
    }

    fn extract_conjuncts(predicate: &Predicate, conjuncts: &mut Vec<Predicate>) {
        match predicate {
            Predicate::And(left, right) => {
                Self::extract_conjuncts(left, conjuncts);
                Self::extract_conjuncts(right, conjuncts);
            }
            // comparison, IsNull, Not, True, False and whole ORs
            _ => conjuncts.push(predicate.clone()),
        }
    }

    fn extract_disjuncts(predicate: &Predicate, disjuncts: &mut Vec<Predicate>) {
        match predicate {
            Predicate::Or(left, right) => {
                Self::extract_disjuncts(left, disjuncts);
                Self::extract_disjuncts(right, disjuncts);
            }
            _ => disjuncts.push(predicate.clone()),
        }
    }
}
