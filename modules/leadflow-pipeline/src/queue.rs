//! Lead queue: populated once per run, drained one lead at a time.

use leadflow_common::LeadRecord;

/// Pending leads plus the remaining-count that drives loop termination.
///
/// `pop_next` hands ownership of one record to the traversal; the
/// remaining count only drops when that lead's CRM update completes
/// (`mark_completed`), so a lead in flight still counts as remaining.
/// Pop order is LIFO; order across leads carries no business meaning.
#[derive(Debug, Clone, Default)]
pub struct LeadQueue {
    records: Vec<LeadRecord>,
    remaining: usize,
}

impl LeadQueue {
    pub fn from_records(records: Vec<LeadRecord>) -> Self {
        let remaining = records.len();
        Self { records, remaining }
    }

    pub fn has_next(&self) -> bool {
        self.remaining > 0
    }

    pub fn pop_next(&mut self) -> Option<LeadRecord> {
        self.records.pop()
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// One lead finished its traversal (CRM update done, or the lead was
    /// abandoned by a lead-scoped failure).
    pub fn mark_completed(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(id: &str) -> LeadRecord {
        LeadRecord {
            id: id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn remaining_counts_in_flight_leads() {
        let mut queue = LeadQueue::from_records(vec![lead("1"), lead("2")]);
        assert_eq!(queue.remaining(), 2);

        let popped = queue.pop_next().unwrap();
        assert_eq!(popped.id, "2"); // LIFO
        assert_eq!(queue.remaining(), 2);

        queue.mark_completed();
        assert_eq!(queue.remaining(), 1);
        assert!(queue.has_next());

        queue.pop_next().unwrap();
        queue.mark_completed();
        assert_eq!(queue.remaining(), 0);
        assert!(!queue.has_next());
        assert!(queue.pop_next().is_none());
    }
}
