use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::warn;

use crate::error::{EngineError, Result};
use crate::index::{InvertedIndex, Posting};

/// Writes one line per word: the word, then its postings as space-separated
/// `docID count` pairs in posting order. Word line order is unspecified.
pub fn save_index(index: &InvertedIndex, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| {
        EngineError::Resource(format!("cannot create index file {}: {e}", path.display()))
    })?;
    let mut out = BufWriter::new(file);

    let mut write_err: Option<std::io::Error> = None;
    index.for_each_entry(|entry| {
        if write_err.is_some() {
            return;
        }
        let mut line = entry.word.clone();
        entry.postings.for_each(|p| {
            let _ = write!(line, " {} {}", p.doc_id, p.count);
        });
        line.push('\n');
        if let Err(e) = out.write_all(line.as_bytes()) {
            write_err = Some(e);
        }
    });
    if let Some(e) = write_err {
        return Err(EngineError::Resource(format!(
            "cannot write index file {}: {e}",
            path.display()
        )));
    }
    out.flush()?;
    Ok(())
}

/// Reads an index file back into memory. The first whitespace-delimited token
/// of each line is the word; the rest parse in (docID, count) pairs appended
/// in file order. A dangling unpaired token is discarded, and an unparsable
/// number truncates that line at the last complete pair. Load never fails on
/// a malformed line, only on an unopenable or unreadable file.
pub fn load_index(path: &Path) -> Result<InvertedIndex> {
    let file = File::open(path).map_err(|e| {
        EngineError::Resource(format!("cannot open index file {}: {e}", path.display()))
    })?;
    let reader = BufReader::new(file);
    let index = InvertedIndex::new();

    for (lineno, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| {
            EngineError::Resource(format!("cannot read index file {}: {e}", path.display()))
        })?;
        let mut tokens = line.split_whitespace();
        let Some(word) = tokens.next() else { continue };
        let entry = index.entry(word);

        let rest: Vec<&str> = tokens.collect();
        let pairs = rest.chunks_exact(2);
        if !pairs.remainder().is_empty() {
            let err = EngineError::Format(format!(
                "line {}: dangling token after last pair",
                lineno + 1
            ));
            warn!(%err, word, "recovering");
        }
        for pair in pairs {
            match (pair[0].parse::<u64>(), pair[1].parse::<u64>()) {
                (Ok(doc_id), Ok(count)) => entry.postings.push(Posting { doc_id, count }),
                _ => {
                    let err = EngineError::Format(format!(
                        "line {}: unparsable posting pair '{} {}'",
                        lineno + 1,
                        pair[0],
                        pair[1]
                    ));
                    warn!(%err, word, "truncating line");
                    break;
                }
            }
        }
    }
    Ok(index)
}
