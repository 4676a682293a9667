//! Patch and changeset input for a review.
//!
//! Two sources feed a [`Review`]: patch files named on the command line, and
//! whatever is piped into stdin. Stdin serves two purposes at once. If its
//! first non-empty line looks like a diff, the whole capture becomes one
//! patch. Independently, any line starting with `Committed` (as printed by
//! `svn commit`) contributes the revision number it mentions as a changeset.

use std::io::BufRead;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{CritterError, Result};
use crate::review::Review;

const PATCH_PREFIXES: &[&[u8]] = &[b"diff", b"Index:"];
const COMMITTED_PREFIX: &[u8] = b"Committed";

static REVISION_RE: OnceLock<Regex> = OnceLock::new();

fn revision_re() -> &'static Regex {
    REVISION_RE.get_or_init(|| Regex::new(r"\d+").unwrap())
}

/// What was scraped from stdin, before it is applied to a review.
#[derive(Debug, Default, PartialEq)]
pub struct Scraped {
    pub patch: Option<Vec<u8>>,
    pub changesets: Vec<String>,
}

impl Scraped {
    pub fn is_empty(&self) -> bool {
        self.patch.is_none() && self.changesets.is_empty()
    }

    pub fn apply(self, review: &mut Review) {
        if let Some(patch) = self.patch {
            review.add_patch(patch);
        }
        for changeset in self.changesets {
            review.add_changeset(changeset);
        }
    }
}

/// Read `reader` to the end and extract a patch and commit revisions.
///
/// Every captured line ends in `\n`; an unterminated last line gets one.
pub fn scrape<R: BufRead>(mut reader: R) -> Result<Scraped> {
    let mut captured = Vec::new();
    let mut first_content_line: Option<bool> = None;
    let mut changesets: Vec<String> = Vec::new();
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        if line.last() != Some(&b'\n') {
            line.push(b'\n');
        }

        if first_content_line.is_none() && !is_blank(&line) {
            first_content_line = Some(PATCH_PREFIXES.iter().any(|p| line.starts_with(p)));
        }

        if line.starts_with(COMMITTED_PREFIX) {
            let text = String::from_utf8_lossy(&line);
            if let Some(rev) = revision_re().find(&text) {
                let rev = rev.as_str().to_string();
                if !changesets.contains(&rev) {
                    changesets.push(rev);
                }
            }
        }

        captured.extend_from_slice(&line);
    }

    let is_patch = first_content_line.unwrap_or(false);
    Ok(Scraped {
        patch: is_patch.then_some(captured),
        changesets,
    })
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

/// Scrape `reader` straight into `review`.
pub fn read_into<R: BufRead>(reader: R, review: &mut Review) -> Result<()> {
    let scraped = scrape(reader)?;
    if scraped.is_empty() {
        tracing::debug!("stdin held no patch or commit revision");
    }
    scraped.apply(review);
    Ok(())
}

/// Read a patch file relative to the current directory.
pub fn read_patch(path: &Path) -> Result<Vec<u8>> {
    tracing::debug!(path = %path.display(), "loading patch data");
    std::fs::read(path).map_err(|source| CritterError::FileAccess {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a patch file, logging and returning empty content when it cannot be
/// read.
pub fn load_patch(path: &Path) -> Vec<u8> {
    match read_patch(path) {
        Ok(data) => data,
        Err(e) => {
            tracing::error!(error = %e, "check file permissions");
            Vec::new()
        }
    }
}

/// Add each readable, non-empty patch file to `review`. Returns how many
/// files were skipped.
pub fn add_patch_files<P: AsRef<Path>>(paths: &[P], review: &mut Review) -> usize {
    let mut skipped = 0;
    for path in paths {
        let data = load_patch(path.as_ref());
        if data.is_empty() {
            skipped += 1;
        } else {
            review.add_patch(data);
        }
    }
    skipped
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
