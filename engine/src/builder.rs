use std::path::Path;
use std::thread;

use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::index::{DocId, InvertedIndex};
use crate::page;
use crate::sync::ThreadSafeQueue;
use crate::tokenizer::{normalize, tokenize, MIN_INDEXED_LEN};

/// Worker-pool bounds for one indexing run.
pub const MIN_THREADS: usize = 1;
pub const MAX_THREADS: usize = 32;

/// Builds the inverted index for every page in `page_dir` using `threads`
/// workers. The result is structurally the same for any thread count.
///
/// All work is enumerated up front: the id queue is filled before any worker
/// starts and never refilled, so an empty queue is the termination signal. A
/// page that fails to load is logged and skipped; a worker panic aborts the
/// whole run, since a partially built index must not be persisted.
pub fn build_index(page_dir: &Path, threads: usize) -> Result<InvertedIndex> {
    if !(MIN_THREADS..=MAX_THREADS).contains(&threads) {
        return Err(EngineError::Resource(format!(
            "thread count {threads} outside {MIN_THREADS}..={MAX_THREADS}"
        )));
    }

    let ids = page::scan_page_ids(page_dir)?;
    info!(pages = ids.len(), threads, "starting index build");

    let work = ThreadSafeQueue::new();
    for id in &ids {
        work.push(*id);
    }

    let index = InvertedIndex::new();
    thread::scope(|scope| {
        for _ in 0..threads {
            scope.spawn(|| index_worker(page_dir, &work, &index));
        }
    });

    info!(words = index.word_count(), "index build complete");
    Ok(index)
}

fn index_worker(page_dir: &Path, work: &ThreadSafeQueue<DocId>, index: &InvertedIndex) {
    while let Some(id) = work.try_pop() {
        let page = match page::load_page(page_dir, id) {
            Ok(page) => page,
            Err(err) => {
                warn!(%err, id, "skipping unreadable page");
                continue;
            }
        };
        let text = page.content_text();
        let mut indexed = 0usize;
        for token in tokenize(&text) {
            if let Some(word) = normalize(token, MIN_INDEXED_LEN) {
                index.add_occurrence(&word, id);
                indexed += 1;
            }
        }
        debug!(id, words = indexed, url = %page.url, "indexed page");
    }
}
