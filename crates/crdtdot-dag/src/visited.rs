//! Shared record of which identifiers a traversal has claimed.

use crdtdot_store::Cid;
use parking_lot::Mutex;
use std::collections::HashSet;

/// Set of claimed identifiers, shared between fetch workers.
///
/// [`claim`](VisitedSet::claim) is the only way in: exactly one caller
/// wins for a given identifier, and only the winner fetches it.
#[derive(Debug, Default)]
pub struct VisitedSet {
    claimed: Mutex<HashSet<Cid>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `cid` if absent. Returns true for the caller that inserted it.
    pub fn claim(&self, cid: Cid) -> bool {
        self.claimed.lock().insert(cid)
    }

    /// Number of identifiers claimed so far.
    pub(crate) fn len(&self) -> usize {
        self.claimed.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crdtdot_store::Codec;
    use std::sync::Arc;

    #[test]
    fn test_claim_once() {
        let visited = VisitedSet::new();
        let cid = Cid::of(Codec::DagJson, b"a");
        assert!(visited.claim(cid));
        assert!(!visited.claim(cid));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_concurrent_claims_have_one_winner() {
        let visited = Arc::new(VisitedSet::new());
        let cids: Vec<Cid> = (0..64u8).map(|i| Cid::of(Codec::DagJson, &[i])).collect();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let visited = Arc::clone(&visited);
                let cids = cids.clone();
                std::thread::spawn(move || cids.iter().filter(|c| visited.claim(**c)).count())
            })
            .collect();

        let wins: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(wins, cids.len());
        assert_eq!(visited.len(), cids.len());
    }
}
