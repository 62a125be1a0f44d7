use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::warn;
use walkdir::WalkDir;

use crate::error::{EngineError, Result};
use crate::index::DocId;

/// Document id → URL, built once per querier run by scanning the page store.
pub type DocumentUrlMap = BTreeMap<DocId, String>;

/// One crawled page as stored on disk.
///
/// The on-disk layout has four fields: URL line, depth line, content length
/// line, then the raw content (exactly `length` bytes, which may themselves
/// contain newlines).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub url: String,
    pub depth: u32,
    pub content: Vec<u8>,
}

impl Page {
    pub fn new(url: impl Into<String>, depth: u32, content: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            depth,
            content: content.into(),
        }
    }

    /// Text view for tokenization; page content is not guaranteed UTF-8.
    pub fn content_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }
}

/// Writes `dir/<id>` in the four-field page layout, creating `dir` if it does
/// not exist yet. The trailing newline after the content is ignored on load.
pub fn save_page(dir: &Path, id: DocId, page: &Page) -> Result<()> {
    fs::create_dir_all(dir)?;
    let mut out = BufWriter::new(File::create(dir.join(id.to_string()))?);
    writeln!(out, "{}", page.url)?;
    writeln!(out, "{}", page.depth)?;
    writeln!(out, "{}", page.content.len())?;
    out.write_all(&page.content)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// Loads `dir/<id>`. Any missing, truncated, or unparsable field is a
/// [`EngineError::Page`], which callers handle by skipping that page.
pub fn load_page(dir: &Path, id: DocId) -> Result<Page> {
    let path = dir.join(id.to_string());
    let file = File::open(&path).map_err(|e| page_err(id, e.to_string()))?;
    let mut reader = BufReader::new(file);

    let url = read_field_line(&mut reader, id, "url")?;
    if url.is_empty() {
        return Err(page_err(id, "empty url line"));
    }
    let depth: u32 = read_field_line(&mut reader, id, "depth")?
        .parse()
        .map_err(|_| page_err(id, "unparsable depth"))?;
    let length: usize = read_field_line(&mut reader, id, "length")?
        .parse()
        .map_err(|_| page_err(id, "unparsable content length"))?;

    let mut content = vec![0u8; length];
    reader
        .read_exact(&mut content)
        .map_err(|_| page_err(id, "content shorter than declared length"))?;

    Ok(Page {
        url,
        depth,
        content,
    })
}

fn read_field_line(reader: &mut impl BufRead, id: DocId, field: &str) -> Result<String> {
    let mut line = String::new();
    let n = reader
        .read_line(&mut line)
        .map_err(|e| page_err(id, format!("reading {field}: {e}")))?;
    if n == 0 {
        return Err(page_err(id, format!("missing {field} line")));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn page_err(id: DocId, reason: impl Into<String>) -> EngineError {
    EngineError::Page {
        id,
        reason: reason.into(),
    }
}

/// Page ids present in the store, ascending. Only entries whose file name is
/// a positive decimal integer are pages; everything else is skipped.
pub fn scan_page_ids(dir: &Path) -> Result<Vec<DocId>> {
    if !dir.is_dir() {
        return Err(EngineError::Resource(format!(
            "page directory {} does not exist",
            dir.display()
        )));
    }
    let mut ids = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| EngineError::Resource(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        // round-trip check rejects "+7", "007" and other non-canonical names
        if let Ok(id) = name.parse::<DocId>() {
            if id > 0 && id.to_string() == name {
                ids.push(id);
            }
        }
    }
    ids.sort_unstable();
    Ok(ids)
}

/// URL of every readable page in the store. A page file that fails to parse
/// is logged and skipped, same as during indexing.
pub fn load_url_map(dir: &Path) -> Result<DocumentUrlMap> {
    let mut urls = DocumentUrlMap::new();
    for id in scan_page_ids(dir)? {
        match load_page_url(dir, id) {
            Ok(url) => {
                urls.insert(id, url);
            }
            Err(err) => warn!(%err, id, "skipping unreadable page"),
        }
    }
    Ok(urls)
}

fn load_page_url(dir: &Path, id: DocId) -> Result<String> {
    let file = File::open(dir.join(id.to_string())).map_err(|e| page_err(id, e.to_string()))?;
    let url = read_field_line(&mut BufReader::new(file), id, "url")?;
    if url.is_empty() {
        return Err(page_err(id, "empty url line"));
    }
    Ok(url)
}
