//! Small helpers for building `sh`/`bash` command strings.

/// Quote a string as a single shell word
pub fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}

/// Whether any whitespace-separated word of `command` is exactly `program`
pub fn invokes(command: &str, program: &str) -> bool {
    command
        .split(|c: char| c.is_whitespace() || matches!(c, ';' | '&' | '|' | '(' | ')'))
        .any(|word| word == program)
}

/// Keep at most `limit` characters, respecting char boundaries
pub fn truncate_chars(text: &str, limit: usize) -> (String, bool) {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => (text[..idx].to_string(), true),
        None => (text.to_string(), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_plain_and_embedded() {
        assert_eq!(quote("Arch Linux"), "'Arch Linux'");
        assert_eq!(quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn test_invokes_matches_whole_words() {
        assert!(invokes("sudo pacman -Syu", "sudo"));
        assert!(invokes("echo x | sudo tee /etc/foo", "sudo"));
        assert!(invokes("apt update&&sudo apt upgrade", "sudo"));
        assert!(!invokes("pseudo-tool --run", "sudo"));
        assert!(!invokes("pacman -Q", "sudo"));
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        let (text, cut) = truncate_chars("héllo wörld", 4);
        assert_eq!(text, "héll");
        assert!(cut);

        let (text, cut) = truncate_chars("ok", 500);
        assert_eq!(text, "ok");
        assert!(!cut);
    }
}
