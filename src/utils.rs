//! Utility functions.

use std::cmp::min;
use std::path::PathBuf;

/// Walks a UTF‑8 string forward, turning byte offsets into char offsets.
///
/// Regex and substring matches report **byte** offsets; spans are stored as **char** offsets.
/// Matches arrive in increasing order, so counting only the chars between the previous and
/// the next requested offset keeps a whole-document scan linear.
pub struct CharCursor<'a> {
    text: &'a str,
    byte: usize,
    chars: usize,
}

impl<'a> CharCursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, byte: 0, chars: 0 }
    }

    /// Char offset of `byte_idx`. Offsets must not go backwards; a smaller offset restarts
    /// the count from the beginning of the string.
    pub fn char_offset(&mut self, byte_idx: usize) -> usize {
        let byte_idx = min(byte_idx, self.text.len());
        if byte_idx < self.byte {
            self.byte = 0;
            self.chars = 0;
        }
        self.chars += self.text[self.byte..byte_idx].chars().count();
        self.byte = byte_idx;
        self.chars
    }
}

/// Number of decimal digits in `n` (used to size the line-number gutter).
pub fn digits(n: usize) -> usize {
    n.to_string().len()
}

/// Clamp an `isize` (which may be negative) into a `[lo, hi]` range and return `usize`.
pub fn clamp_usize(v: isize, lo: usize, hi: usize) -> usize {
    if v < 0 || (v as usize) < lo {
        lo
    } else if v as usize > hi {
        hi
    } else {
        v as usize
    }
}

/// Directories searched for `runpad.toml`.
///
/// Returns:
/// - the current working directory
/// - the directory holding the executable (useful for distributing a folder)
pub fn default_config_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            dirs.push(dir.to_path_buf());
        }
    }

    dirs
}

/// Calculate the Levenshtein distance between two strings.
/// This is used for "did you mean?" suggestions for unknown commands.
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    if a.is_empty() { return b.len(); }
    if b.is_empty() { return a.len(); }

    // Single rolling row instead of the full matrix.
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            cur[j + 1] = min(prev[j + 1] + 1, min(cur[j] + 1, prev[j] + cost));
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== CharCursor tests ====================

    #[test]
    fn char_cursor_ascii() {
        let mut c = CharCursor::new("hello");
        assert_eq!(c.char_offset(0), 0);
        assert_eq!(c.char_offset(3), 3);
        assert_eq!(c.char_offset(5), 5);
    }

    #[test]
    fn char_cursor_multibyte() {
        // 'é' is 2 bytes, '日' is 3, '😀' is 4
        let s = "é日😀x";
        let mut c = CharCursor::new(s);
        assert_eq!(c.char_offset(2), 1);
        assert_eq!(c.char_offset(5), 2);
        assert_eq!(c.char_offset(9), 3);
        assert_eq!(c.char_offset(10), 4);
    }

    #[test]
    fn char_cursor_restarts_when_going_backwards() {
        let mut c = CharCursor::new("héllo");
        assert_eq!(c.char_offset(4), 3);
        assert_eq!(c.char_offset(1), 1);
    }

    #[test]
    fn char_cursor_clamps_beyond_end() {
        let mut c = CharCursor::new("abc");
        assert_eq!(c.char_offset(100), 3);
    }

    // ==================== other utils tests ====================

    #[test]
    fn test_digits() {
        assert_eq!(digits(0), 1);
        assert_eq!(digits(9), 1);
        assert_eq!(digits(10), 2);
        assert_eq!(digits(1000), 4);
    }

    #[test]
    fn test_clamp_usize() {
        assert_eq!(clamp_usize(-5, 0, 10), 0);
        assert_eq!(clamp_usize(5, 0, 10), 5);
        assert_eq!(clamp_usize(15, 0, 10), 10);
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("abc", "abc"), 0);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("save", "dave"), 1);
    }
}
