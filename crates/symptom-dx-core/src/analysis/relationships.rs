//! Pairwise symptom relationship detection.
//!
//! Known limitation: every pair of positions holding non-empty symptoms is
//! reported as co-occurring with a fixed strength. There is no medical
//! inference behind it yet.

use crate::models::{RelationshipKind, SymptomRelationship};

/// Strength assigned to every co-occurrence.
pub const CO_OCCURRENCE_STRENGTH: f64 = 0.7;

/// Finds relationships within a symptom sequence.
#[derive(Debug, Default, Clone, Copy)]
pub struct RelationshipFinder;

impl RelationshipFinder {
    pub fn new() -> Self {
        Self
    }

    /// Relationships among `symptoms` (primary followed by secondary).
    ///
    /// One relationship per position pair `i < j`, in sequence order. A
    /// symptom listed in both tiers therefore pairs with itself. O(n²).
    pub fn find(&self, symptoms: &[String]) -> Vec<SymptomRelationship> {
        let mut relationships = Vec::new();

        for (i, first) in symptoms.iter().enumerate() {
            for second in &symptoms[i + 1..] {
                if self.are_related(first, second) {
                    relationships.push(SymptomRelationship {
                        symptoms: (first.clone(), second.clone()),
                        kind: RelationshipKind::CoOccurring,
                        strength: CO_OCCURRENCE_STRENGTH,
                    });
                }
            }
        }

        relationships
    }

    fn are_related(&self, first: &str, second: &str) -> bool {
        !first.is_empty() && !second.is_empty()
    }
}
