//! Boolean AND/OR keyword queries: parsing, evaluation, ranking, and the
//! line-oriented query session.

use std::fmt;
use std::io::{BufRead, Write};

use tracing::debug;

use crate::error::{EngineError, Result};
use crate::index::{DocId, InvertedIndex};
use crate::page::DocumentUrlMap;
use crate::tokenizer::normalize;

/// Minimum length for a query search word, same convention as indexing.
const MIN_QUERY_WORD_LEN: usize = 3;

/// A conjunctive group of normalized words. Its score for a document is the
/// minimum occurrence count among the words, so every word must appear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AndSequence(pub Vec<String>);

/// A disjunction of AND-sequences. Its score for a document is the maximum
/// sequence score. Sequences are never empty in a parsed query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub sequences: Vec<AndSequence>,
}

impl fmt::Display for AndSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.join(" and "))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seq) in self.sequences.iter().enumerate() {
            if i > 0 {
                f.write_str(" or ")?;
            }
            write!(f, "{seq}")?;
        }
        Ok(())
    }
}

/// Parses one query line. Tokens split on whitespace; `and`/`or` are
/// reserved, case-insensitive, and must have a search word on both sides.
/// Adjacent search words conjoin implicitly, as `cat and dog` does.
///
/// Any violation invalidates the entire query: a word that fails
/// normalization, an operator at either end, or two adjacent operators.
pub fn parse_query(line: &str) -> Result<Query> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(EngineError::Query("empty query".into()));
    }

    let mut sequences: Vec<AndSequence> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut expecting_word = true; // operators may not open the query

    for token in &tokens {
        let lowered = token.to_ascii_lowercase();
        match lowered.as_str() {
            "and" | "or" => {
                if expecting_word {
                    return Err(EngineError::Query(format!(
                        "operator '{lowered}' needs a search word on both sides"
                    )));
                }
                if lowered == "or" {
                    sequences.push(AndSequence(std::mem::take(&mut current)));
                }
                expecting_word = true;
            }
            _ => {
                let word = normalize(token, MIN_QUERY_WORD_LEN).ok_or_else(|| {
                    EngineError::Query(format!("'{token}' is not a valid search word"))
                })?;
                current.push(word);
                expecting_word = false;
            }
        }
    }
    if expecting_word {
        return Err(EngineError::Query(
            "query may not end with an operator".into(),
        ));
    }
    sequences.push(AndSequence(current));
    Ok(Query { sequences })
}

/// One scored document in ranked output. A score of 0 means no match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedResult {
    pub doc_id: DocId,
    pub url: String,
    pub score: u64,
}

/// Evaluates parsed queries against a loaded index and the document → URL
/// map. Both are read-only after construction, so evaluation needs no
/// locking and the session stays single-threaded.
pub struct QueryEngine {
    index: InvertedIndex,
    urls: DocumentUrlMap,
    include_unmatched: bool,
}

impl QueryEngine {
    pub fn new(index: InvertedIndex, urls: DocumentUrlMap) -> Self {
        Self {
            index,
            urls,
            include_unmatched: false,
        }
    }

    /// Zero-score documents are dropped from ranked output unless enabled
    /// here; the policy is explicit rather than baked in.
    pub fn include_unmatched(mut self, include: bool) -> Self {
        self.include_unmatched = include;
        self
    }

    fn sequence_score(&self, seq: &AndSequence, doc_id: DocId) -> u64 {
        seq.0
            .iter()
            .map(|word| self.index.occurrences(word, doc_id))
            .min()
            .unwrap_or(0)
    }

    /// Maximum over the query's AND-sequences of the minimum occurrence
    /// count among each sequence's words.
    pub fn document_score(&self, query: &Query, doc_id: DocId) -> u64 {
        query
            .sequences
            .iter()
            .map(|seq| self.sequence_score(seq, doc_id))
            .max()
            .unwrap_or(0)
    }

    /// Scores every known document, sorted by score descending with ties
    /// broken by ascending document id.
    pub fn evaluate(&self, query: &Query) -> Vec<RankedResult> {
        let mut results: Vec<RankedResult> = self
            .urls
            .iter()
            .map(|(&doc_id, url)| RankedResult {
                doc_id,
                url: url.clone(),
                score: self.document_score(query, doc_id),
            })
            .filter(|r| self.include_unmatched || r.score > 0)
            .collect();
        results.sort_by(|a, b| b.score.cmp(&a.score).then(a.doc_id.cmp(&b.doc_id)));
        results
    }

    /// Runs the line-oriented query session: echo the parsed query in
    /// parenthesized form, print one ranked line per document, mark invalid
    /// queries, and continue until end of input. The same protocol serves the
    /// terminal and batch files; the prompt is written only when interactive.
    pub fn run_session<R, W>(&self, input: R, output: &mut W, interactive: bool) -> Result<()>
    where
        R: BufRead,
        W: Write,
    {
        if interactive {
            prompt(output)?;
        }
        for line in input.lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                if interactive {
                    prompt(output)?;
                }
                continue;
            }
            match parse_query(trimmed) {
                Ok(query) => {
                    writeln!(output, "{query}")?;
                    for result in self.evaluate(&query) {
                        writeln!(
                            output,
                            "score {:>5}  doc {:>4}: {}",
                            result.score, result.doc_id, result.url
                        )?;
                    }
                }
                Err(err) => {
                    debug!(%err, "rejected query");
                    writeln!(output, "[invalid query]")?;
                }
            }
            if interactive {
                prompt(output)?;
            }
        }
        Ok(())
    }
}

fn prompt(output: &mut impl Write) -> Result<()> {
    write!(output, "> ")?;
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn words(seq: &AndSequence) -> Vec<&str> {
        seq.0.iter().map(String::as_str).collect()
    }

    #[test]
    fn single_and_sequence() {
        let q = parse_query("cat and dog").unwrap();
        assert_eq!(q.sequences.len(), 1);
        assert_eq!(words(&q.sequences[0]), ["cat", "dog"]);
    }

    #[test]
    fn or_splits_sequences() {
        let q = parse_query("cat or dog").unwrap();
        assert_eq!(q.sequences.len(), 2);
        assert_eq!(words(&q.sequences[0]), ["cat"]);
        assert_eq!(words(&q.sequences[1]), ["dog"]);
    }

    #[test]
    fn adjacent_words_conjoin_implicitly() {
        let q = parse_query("cat dog or fish").unwrap();
        assert_eq!(q.sequences.len(), 2);
        assert_eq!(words(&q.sequences[0]), ["cat", "dog"]);
        assert_eq!(words(&q.sequences[1]), ["fish"]);
    }

    #[test]
    fn operators_are_case_insensitive_and_words_lowercase() {
        let q = parse_query("Cat AND Dog OR Fish").unwrap();
        assert_eq!(q.to_string(), "(cat and dog) or (fish)");
    }

    #[test]
    fn rejects_malformed_operator_placement() {
        for bad in ["and cat", "or cat", "cat and", "cat or", "cat and and dog", "cat and or dog"] {
            assert!(
                matches!(parse_query(bad), Err(EngineError::Query(_))),
                "{bad:?} should be invalid"
            );
        }
    }

    #[test]
    fn rejects_invalid_words() {
        for bad in ["", "   ", "he11o", "cat and d-g", "hi or cat"] {
            assert!(
                matches!(parse_query(bad), Err(EngineError::Query(_))),
                "{bad:?} should be invalid"
            );
        }
    }

    fn engine() -> QueryEngine {
        // doc1: cat=3 dog=2; doc2: cat=5
        let index = InvertedIndex::new();
        for _ in 0..3 {
            index.add_occurrence("cat", 1);
        }
        for _ in 0..2 {
            index.add_occurrence("dog", 1);
        }
        for _ in 0..5 {
            index.add_occurrence("cat", 2);
        }
        let mut urls = DocumentUrlMap::new();
        urls.insert(1, "https://example.com/1".to_string());
        urls.insert(2, "https://example.com/2".to_string());
        QueryEngine::new(index, urls)
    }

    #[test]
    fn and_scores_by_minimum() {
        let eng = engine();
        let q = parse_query("cat and dog").unwrap();
        assert_eq!(eng.document_score(&q, 1), 2);
        assert_eq!(eng.document_score(&q, 2), 0);
        let results = eng.evaluate(&q);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].doc_id, 1);
        assert_eq!(results[0].score, 2);
    }

    #[test]
    fn or_scores_by_maximum() {
        let eng = engine();
        let q = parse_query("cat or dog").unwrap();
        assert_eq!(eng.document_score(&q, 1), 3);
        assert_eq!(eng.document_score(&q, 2), 5);
        let results = eng.evaluate(&q);
        assert_eq!(
            results.iter().map(|r| r.doc_id).collect::<Vec<_>>(),
            vec![2, 1]
        );
    }

    #[test]
    fn zero_score_documents_are_omitted_by_default() {
        let eng = engine();
        let q = parse_query("dog").unwrap();
        let results = eng.evaluate(&q);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].doc_id, 1);

        let eng = engine().include_unmatched(true);
        let results = eng.evaluate(&q);
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].doc_id, 2);
        assert_eq!(results[1].score, 0);
    }

    #[test]
    fn ranking_sorts_by_score_then_doc_id() {
        let index = InvertedIndex::new();
        for (doc, count) in [(5u64, 3), (2, 7), (9, 7)] {
            for _ in 0..count {
                index.add_occurrence("cat", doc);
            }
        }
        let mut urls = DocumentUrlMap::new();
        for doc in [2u64, 5, 9] {
            urls.insert(doc, format!("https://example.com/{doc}"));
        }
        let eng = QueryEngine::new(index, urls);
        let q = parse_query("cat").unwrap();
        let order: Vec<DocId> = eng.evaluate(&q).iter().map(|r| r.doc_id).collect();
        assert_eq!(order, vec![2, 9, 5]);
    }

    #[test]
    fn session_echoes_ranks_and_flags_invalid_lines() {
        let eng = engine();
        let input = Cursor::new("cat and dog\n\ncat and\n");
        let mut output = Vec::new();
        eng.run_session(input, &mut output, false).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert_eq!(
            text,
            "(cat and dog)\n\
             score     2  doc    1: https://example.com/1\n\
             [invalid query]\n"
        );
    }

    #[test]
    fn interactive_session_prompts() {
        let eng = engine();
        let input = Cursor::new("fish\n");
        let mut output = Vec::new();
        eng.run_session(input, &mut output, true).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert_eq!(text, "> (fish)\n> ");
    }
}
