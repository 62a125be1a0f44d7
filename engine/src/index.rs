use std::collections::BTreeMap;
use std::sync::Arc;

use crate::sync::{ThreadSafeMap, ThreadSafeQueue};

pub type DocId = u64;

/// Bucket count for the word table, matching the on-disk loader's sizing.
const INDEX_BUCKETS: usize = 100;

/// One (document, occurrence count) record in a word's posting list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub doc_id: DocId,
    pub count: u64,
}

/// A normalized word and its postings in first-seen document order. Each
/// document appears at most once in the list.
pub struct WordEntry {
    pub word: String,
    pub postings: ThreadSafeQueue<Posting>,
}

impl WordEntry {
    fn new(word: &str) -> Self {
        Self {
            word: word.to_string(),
            postings: ThreadSafeQueue::new(),
        }
    }
}

/// Word → posting-list map. Mutated concurrently by the indexing workers
/// during the build phase, read-only afterwards.
pub struct InvertedIndex {
    words: ThreadSafeMap<WordEntry>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self {
            words: ThreadSafeMap::new(INDEX_BUCKETS),
        }
    }

    /// Handle for `word`'s entry, creating an empty one if needed.
    pub fn entry(&self, word: &str) -> Arc<WordEntry> {
        self.words
            .find_or_create(word, |e| e.word == word, || WordEntry::new(word))
    }

    /// Records one occurrence of `word` on `doc_id`. Both compound lookups
    /// run under their container's lock, so the final count of a (word,
    /// document) pair equals the number of occurrences no matter how the
    /// workers interleave.
    pub fn add_occurrence(&self, word: &str, doc_id: DocId) {
        self.entry(word).postings.upsert(
            |p| p.doc_id == doc_id,
            |p| p.count += 1,
            || Posting { doc_id, count: 0 },
        );
    }

    /// Occurrence count for (word, document), or 0 when either is absent.
    pub fn occurrences(&self, word: &str, doc_id: DocId) -> u64 {
        self.words
            .find(word, |e| e.word == word)
            .and_then(|e| {
                e.postings
                    .find_map(|p| (p.doc_id == doc_id).then_some(p.count))
            })
            .unwrap_or(0)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.find(word, |e| e.word == word).is_some()
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Visits every word entry; traversal order is unspecified.
    pub fn for_each_entry<F>(&self, visit: F)
    where
        F: FnMut(&WordEntry),
    {
        self.words.for_each(visit);
    }

    /// Order-independent structural view, word → (document → count). Two
    /// indexes are equivalent exactly when their snapshots are equal.
    pub fn snapshot(&self) -> BTreeMap<String, BTreeMap<DocId, u64>> {
        let mut out: BTreeMap<String, BTreeMap<DocId, u64>> = BTreeMap::new();
        self.words.for_each(|entry| {
            let docs = out.entry(entry.word.clone()).or_default();
            entry.postings.for_each(|p| {
                docs.insert(p.doc_id, p.count);
            });
        });
        out
    }
}

impl Default for InvertedIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn counts_repeated_occurrences() {
        let index = InvertedIndex::new();
        index.add_occurrence("cat", 1);
        index.add_occurrence("cat", 1);
        index.add_occurrence("cat", 2);
        index.add_occurrence("dog", 1);
        assert_eq!(index.occurrences("cat", 1), 2);
        assert_eq!(index.occurrences("cat", 2), 1);
        assert_eq!(index.occurrences("dog", 1), 1);
        assert_eq!(index.occurrences("dog", 2), 0);
        assert_eq!(index.occurrences("fish", 1), 0);
        assert_eq!(index.word_count(), 2);
    }

    #[test]
    fn postings_keep_first_seen_document_order() {
        let index = InvertedIndex::new();
        for doc in [5u64, 2, 9, 2] {
            index.add_occurrence("cat", doc);
        }
        let mut order = Vec::new();
        index.entry("cat").postings.for_each(|p| order.push(p.doc_id));
        assert_eq!(order, vec![5, 2, 9]);
    }

    #[test]
    fn concurrent_occurrences_are_not_lost() {
        let index = InvertedIndex::new();
        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for doc in 1..=10u64 {
                        for word in ["alpha", "beta", "gamma"] {
                            index.add_occurrence(word, doc);
                        }
                    }
                });
            }
        });
        assert_eq!(index.word_count(), 3);
        for word in ["alpha", "beta", "gamma"] {
            for doc in 1..=10u64 {
                assert_eq!(index.occurrences(word, doc), 8);
            }
            assert_eq!(index.entry(word).postings.len(), 10);
        }
    }
}
