/// High-score persistence: one flat text file per board, top 10 entries,
/// highest first.
///
/// Line format: `INI,score,YYYY-MM-DD`. Older files are still accepted:
/// a file holding a single bare integer, 2-field `INI,score` lines, and
/// whitespace-separated `INI score` lines all parse. Anything else is
/// skipped silently. Writes rewrite the whole file after
/// append-sort-truncate; there is no partial update.

use std::fs;
use std::io;
use std::path::PathBuf;

use crate::config::{candidate_dirs, CabinetConfig};

pub const MAX_SCORES: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreEntry {
    pub initials: String,
    pub score: u64,
    pub date: String,
}

pub struct ScoreStore {
    dir: PathBuf,
}

impl ScoreStore {
    /// Pick the score directory: the configured one if set, otherwise the
    /// first candidate dir (exe dir, then CWD) we can actually write to.
    pub fn locate(config: &CabinetConfig) -> Self {
        if let Some(dir) = &config.scores_dir {
            return ScoreStore { dir: dir.clone() };
        }
        for dir in candidate_dirs() {
            if dir_is_writable(&dir) {
                return ScoreStore { dir };
            }
        }
        ScoreStore { dir: PathBuf::from(".") }
    }

    #[cfg(test)]
    pub fn with_dir(dir: PathBuf) -> Self {
        ScoreStore { dir }
    }

    fn path_for(&self, board: &str) -> PathBuf {
        self.dir.join(format!("{board}.txt"))
    }

    /// Read a board, best first. A missing or unreadable file is an empty
    /// board, not an error.
    pub fn read(&self, board: &str) -> Vec<ScoreEntry> {
        let text = match fs::read_to_string(self.path_for(board)) {
            Ok(t) => t,
            Err(_) => return Vec::new(),
        };
        let mut entries = parse_scores(&text);
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(MAX_SCORES);
        entries
    }

    /// Append an entry, re-sort, truncate to the top 10, rewrite the file.
    pub fn add(&self, board: &str, initials: &str, score: u64) -> io::Result<()> {
        let mut entries = self.read(board);
        entries.push(ScoreEntry {
            initials: pad_initials(initials),
            score,
            date: chrono::Local::now().format("%Y-%m-%d").to_string(),
        });
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(MAX_SCORES);

        let mut out = String::new();
        for e in &entries {
            out.push_str(&format!("{},{},{}\n", e.initials, e.score, e.date));
        }
        fs::write(self.path_for(board), out)
    }

    /// Best entry on a board, if any.
    pub fn leader(&self, board: &str) -> Option<ScoreEntry> {
        self.read(board).into_iter().next()
    }
}

/// Uppercase and pad/truncate to exactly three letters.
fn pad_initials(s: &str) -> String {
    let mut ini = s.to_uppercase();
    ini.push_str("AAA");
    ini.chars().take(3).collect()
}

fn parse_scores(text: &str) -> Vec<ScoreEntry> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    // Oldest format: the whole file is one bare integer.
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(score) = trimmed.parse() {
            return vec![ScoreEntry {
                initials: "AAA".into(),
                score,
                date: String::new(),
            }];
        }
    }

    let mut out = Vec::new();
    for line in trimmed.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split(',').map(str::trim).collect();
        if parts.len() >= 2 {
            let score = match parts[1].parse() {
                Ok(s) => s,
                Err(_) => continue,
            };
            let date = parts.get(2).map(|d| d.to_string()).unwrap_or_default();
            out.push(ScoreEntry {
                initials: pad_initials(parts[0]),
                score,
                date,
            });
        } else {
            let sp: Vec<&str> = line.split_whitespace().collect();
            if sp.len() >= 2 {
                let score = match sp[1].parse() {
                    Ok(s) => s,
                    Err(_) => continue,
                };
                out.push(ScoreEntry {
                    initials: pad_initials(sp[0]),
                    score,
                    date: String::new(),
                });
            }
        }
    }
    out
}

fn dir_is_writable(dir: &PathBuf) -> bool {
    let probe = dir.join(".cabinet_write_probe");
    match fs::write(&probe, b"probe") {
        Ok(_) => {
            let _ = fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_current_format() {
        let entries = parse_scores("ABC,120,2026-08-01\nXYZ,90,2026-08-02\n");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].initials, "ABC");
        assert_eq!(entries[0].score, 120);
        assert_eq!(entries[0].date, "2026-08-01");
    }

    #[test]
    fn parses_bare_integer_file() {
        let entries = parse_scores("  1234 \n");
        assert_eq!(
            entries,
            vec![ScoreEntry { initials: "AAA".into(), score: 1234, date: String::new() }]
        );
    }

    #[test]
    fn parses_two_field_and_whitespace_lines() {
        let entries = parse_scores("abc,55\nDEF 44\n");
        assert_eq!(entries[0].initials, "ABC");
        assert_eq!(entries[0].score, 55);
        assert_eq!(entries[1].initials, "DEF");
        assert_eq!(entries[1].score, 44);
    }

    #[test]
    fn skips_malformed_lines() {
        let entries = parse_scores("ABC,notanumber\njunk\nGHI,10\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].initials, "GHI");
    }

    #[test]
    fn initials_padded_and_truncated() {
        assert_eq!(pad_initials("a"), "AAA");
        assert_eq!(pad_initials("qw"), "QWA");
        assert_eq!(pad_initials("longer"), "LON");
    }

    #[test]
    fn add_sorts_and_truncates() {
        let dir = std::env::temp_dir().join(format!("cabinet_scores_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let store = ScoreStore::with_dir(dir.clone());

        for i in 0..12u64 {
            store.add("TestBoard", "ZZZ", i * 10).unwrap();
        }
        let entries = store.read("TestBoard");
        assert_eq!(entries.len(), MAX_SCORES);
        assert_eq!(entries[0].score, 110);
        assert!(entries.windows(2).all(|w| w[0].score >= w[1].score));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_reads_empty() {
        let store = ScoreStore::with_dir(std::env::temp_dir());
        assert!(store.read("NoSuchBoardEver").is_empty());
    }
}
