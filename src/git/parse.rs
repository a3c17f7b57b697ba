//! Parsers for git's machine-readable output.

use super::types::{ChangeEntry, CommitRecord};

/// Field separator used in the `git log` pretty format
pub const LOG_DELIMITER: char = '|';

/// `%H|%an|%ae|%ad|%s`: hash, author, email, date, subject
pub const LOG_FORMAT: &str = "--pretty=format:%H|%an|%ae|%ad|%s";

const LOG_FIELDS: usize = 5;
const SHORT_HASH_LEN: usize = 8;

/// Parse `git status --porcelain` output.
///
/// The first two characters of each line are the status code and are kept
/// verbatim, including a leading space. The filename is whatever follows the
/// run of spaces after the code; quoting/escaping is left as git printed it.
pub fn parse_porcelain(output: &str) -> Vec<ChangeEntry> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let split = line
                .char_indices()
                .nth(2)
                .map(|(idx, _)| idx)
                .unwrap_or(line.len());
            let (status, rest) = line.split_at(split);

            ChangeEntry {
                status: status.to_string(),
                filename: rest.trim_start_matches(' ').to_string(),
            }
        })
        .collect()
}

/// Parse `git log` output produced with [`LOG_FORMAT`].
///
/// Lines are split into at most five fields so a subject containing the
/// delimiter stays intact; lines with fewer fields are dropped.
pub fn parse_log(output: &str) -> Vec<CommitRecord> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let parts: Vec<&str> = line.splitn(LOG_FIELDS, LOG_DELIMITER).collect();
            if parts.len() != LOG_FIELDS {
                return None;
            }

            let full_hash = parts[0].to_string();
            let short_hash = full_hash.chars().take(SHORT_HASH_LEN).collect();

            Some(CommitRecord {
                short_hash,
                full_hash,
                author: parts[1].to_string(),
                email: parts[2].to_string(),
                date: parts[3].to_string(),
                message: parts[4].to_string(),
            })
        })
        .collect()
}

/// Parse the output of `git rev-list --count`; anything unparsable is 0
pub fn parse_count(output: &str) -> u32 {
    output.trim().parse().unwrap_or(0)
}
