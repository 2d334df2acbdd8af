#![forbid(unsafe_code)]

//! Snapshot merging: combines the locally accumulated playlist with a newly
//! fetched snapshot.
//!
//! The store only ever returns the latest known snapshot of the playlist, not
//! a diff, so reconstruction works by locating the last already-known segment
//! inside the new snapshot and appending everything after it. Only the few
//! markers needed for that are interpreted; the playlist grammar is otherwise
//! passed through untouched.

/// Marks a playlist as finalized: no further segments will ever be published.
pub const END_OF_STREAM_MARKER: &str = "#EXT-X-ENDLIST";

/// Prefix of a segment metadata line. Each segment is the metadata line plus
/// the URI line that follows it.
pub const SEGMENT_INFO_MARKER: &str = "#EXTINF";

/// Prefix of the playlist-type header line.
pub const PLAYLIST_TYPE_MARKER: &str = "#EXT-X-PLAYLIST-TYPE";

/// Playlist-type header announcing an append-only (event) playlist.
pub const PLAYLIST_TYPE_EVENT: &str = "#EXT-X-PLAYLIST-TYPE:EVENT";

/// One segment entry-pair: a metadata line and the URI line following it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentEntry {
    pub info: String,
    pub uri: String,
}

/// Outcome of merging an accumulated playlist with a fetched snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeOutcome {
    /// The up-to-date playlist text.
    pub text: String,
    /// Whether `text` differs from the previously accumulated playlist.
    pub changed: bool,
    /// Whether the caller may treat this as an accepted snapshot and advance
    /// the feed index. False once either side carries the end-of-stream
    /// marker.
    pub accept: bool,
}

/// Whether a playlist is finalized.
#[must_use]
pub fn is_final(manifest: &str) -> bool {
    manifest.contains(END_OF_STREAM_MARKER)
}

/// Header region: trimmed lines preceding the first segment metadata line.
#[must_use]
pub fn header_lines(manifest: &str) -> Vec<String> {
    let mut header = Vec::new();
    for line in manifest.trim().split('\n') {
        let trimmed = line.trim();
        if trimmed.starts_with(SEGMENT_INFO_MARKER) {
            break;
        }
        header.push(trimmed.to_string());
    }
    header
}

/// Segment region: ordered entry-pairs. A metadata line whose following line
/// is missing, empty, or itself a tag is malformed and silently dropped.
#[must_use]
pub fn segment_entries(manifest: &str) -> Vec<SegmentEntry> {
    let lines: Vec<&str> = manifest.trim().split('\n').collect();
    let mut entries = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if !line.starts_with(SEGMENT_INFO_MARKER) {
            continue;
        }
        if let Some(uri) = lines.get(i + 1) {
            if !uri.is_empty() && !uri.starts_with('#') {
                entries.push(SegmentEntry {
                    info: (*line).to_string(),
                    uri: (*uri).to_string(),
                });
            }
        }
    }

    entries
}

/// Merge a newly fetched snapshot into the accumulated playlist.
///
/// Policy, evaluated in order: a finalized accumulated playlist is terminal;
/// a finalized snapshot wins verbatim; the first snapshot is taken whole;
/// otherwise the genuinely new suffix of the snapshot's segment sequence is
/// appended to the accumulated playlist. Accepted segments are never removed
/// or reordered.
#[must_use]
pub fn merge(old: &str, new: &str) -> MergeOutcome {
    if is_final(old) {
        return MergeOutcome {
            text: old.to_string(),
            changed: false,
            accept: false,
        };
    }

    if is_final(new) {
        // The definitive final version, even if shorter than what has been
        // accumulated so far.
        return MergeOutcome {
            text: new.to_string(),
            changed: old != new,
            accept: false,
        };
    }

    if old.is_empty() {
        return MergeOutcome {
            text: new.to_string(),
            changed: true,
            accept: true,
        };
    }

    let old_entries = segment_entries(old);
    let new_entries = segment_entries(new);

    if old_entries == new_entries {
        // Nothing new this poll; the next index is still polled.
        return MergeOutcome {
            text: old.to_string(),
            changed: false,
            accept: true,
        };
    }

    // New segments are whatever follows the last known entry in the snapshot.
    // If the last known entry is absent the whole snapshot sequence counts as
    // unseen; accepting it all beats failing the poll.
    let fresh: &[SegmentEntry] = match old_entries.last() {
        Some(last) => match new_entries.iter().position(|entry| entry == last) {
            Some(at) => &new_entries[at + 1..],
            None => &new_entries[..],
        },
        None => &new_entries[..],
    };

    if fresh.is_empty() {
        return MergeOutcome {
            text: old.to_string(),
            changed: false,
            accept: true,
        };
    }

    let mut lines = header_lines(old);
    if !lines
        .iter()
        .any(|line| line.starts_with(PLAYLIST_TYPE_MARKER))
    {
        lines.push(PLAYLIST_TYPE_EVENT.to_string());
    }
    for entry in old_entries.iter().chain(fresh) {
        lines.push(entry.info.clone());
        lines.push(entry.uri.clone());
    }

    MergeOutcome {
        text: lines.join("\n"),
        changed: true,
        accept: true,
    }
}
