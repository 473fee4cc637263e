//! Desktop descriptor files (`.desktop`, `.directory`): a line-oriented key file.
//!
//! ```text
//! # comment
//! [Desktop Entry]
//! Name=Editor
//! Name[de]=Bearbeiter
//! Categories=Utility;TextEditor;
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::error::{DomainError, DomainResult};

/// Main section of a descriptor.
pub const DESKTOP_ENTRY: &str = "Desktop Entry";
/// Deprecated spelling of the main section.
pub const KDE_DESKTOP_ENTRY: &str = "KDE Desktop Entry";

/// One `Key[locale]=value` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEntry {
    pub key: String,
    pub locale: Option<String>,
    /// Raw (still escaped) value
    pub value: String,
    /// False when the raw bytes of the value were not valid UTF-8
    pub valid_utf8: bool,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub line: usize,
    pub entries: Vec<KeyEntry>,
}

/// A comment line, kept for validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub line: usize,
    pub valid_utf8: bool,
}

/// Parsed descriptor file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyFile {
    sections: Vec<Section>,
    comments: Vec<Comment>,
}

struct LineGrammar {
    section: Regex,
    key: Regex,
}

static GRAMMAR: LazyLock<LineGrammar> = LazyLock::new(|| LineGrammar {
    section: Regex::new(r"^\[([^\[\]]+)\]$").unwrap(),
    key: Regex::new(r"^([A-Za-z0-9-]+)(?:\[([^\]]+)\])?$").unwrap(),
});

impl KeyFile {
    /// Parse raw file bytes. Invalid UTF-8 is tolerated (and recorded) so the validator can
    /// report it; structural problems are errors.
    pub fn parse(bytes: &[u8]) -> DomainResult<Self> {
        let grammar = &*GRAMMAR;
        let mut file = KeyFile::default();

        for (i, raw) in bytes.split(|&b| b == b'\n').enumerate() {
            let line_no = i + 1;
            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            let valid_utf8 = std::str::from_utf8(raw).is_ok();
            let text = String::from_utf8_lossy(raw);
            let trimmed = text.trim();

            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('#') {
                file.comments.push(Comment {
                    line: line_no,
                    valid_utf8,
                });
                continue;
            }
            if let Some(caps) = grammar.section.captures(trimmed) {
                file.sections.push(Section {
                    name: caps[1].to_string(),
                    line: line_no,
                    entries: Vec::new(),
                });
                continue;
            }

            let (raw_key, value) = trimmed.split_once('=').ok_or_else(|| DomainError::KeyFileSyntax {
                line: line_no,
                message: format!("expected 'Key=Value', found '{}'", trimmed),
            })?;
            let raw_key = raw_key.trim();
            let caps = grammar
                .key
                .captures(raw_key)
                .ok_or_else(|| DomainError::KeyFileSyntax {
                    line: line_no,
                    message: format!("invalid key '{}'", raw_key),
                })?;
            let section = file
                .sections
                .last_mut()
                .ok_or_else(|| DomainError::KeyFileSyntax {
                    line: line_no,
                    message: "key outside of any section".to_string(),
                })?;
            section.entries.push(KeyEntry {
                key: caps[1].to_string(),
                locale: caps.get(2).map(|m| m.as_str().to_string()),
                value: value.trim_start().to_string(),
                valid_utf8,
                line: line_no,
            });
        }

        Ok(file)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// `[Desktop Entry]`, or the deprecated `[KDE Desktop Entry]`.
    pub fn main_section(&self) -> Option<&Section> {
        self.section(DESKTOP_ENTRY)
            .or_else(|| self.section(KDE_DESKTOP_ENTRY))
    }

    /// Raw untranslated value of `key` in the main section.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.main_section()?
            .entries
            .iter()
            .find(|e| e.key == key && e.locale.is_none())
            .map(|e| e.value.as_str())
    }

    /// Unescaped untranslated string value.
    pub fn string(&self, key: &str) -> Option<String> {
        self.raw(key).map(unescape)
    }

    /// Localized value, falling back from `lang_COUNTRY@MODIFIER` to `lang` and finally to the
    /// untranslated value.
    pub fn locale_string(&self, key: &str, locale: Option<&str>) -> Option<String> {
        let section = self.main_section()?;
        let lookup = |wanted: &str| {
            section
                .entries
                .iter()
                .find(|e| e.key == key && e.locale.as_deref() == Some(wanted))
                .map(|e| unescape(&e.value))
        };
        if let Some(locale) = locale {
            for candidate in locale_candidates(locale) {
                if let Some(v) = lookup(&candidate) {
                    return Some(v);
                }
            }
        }
        self.string(key)
    }

    pub fn boolean(&self, key: &str) -> bool {
        matches!(self.raw(key), Some("true") | Some("1"))
    }

    /// `;`-separated list value; trailing separator and empty items are ignored.
    pub fn list(&self, key: &str) -> Option<Vec<String>> {
        self.raw(key).map(|v| {
            v.split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(unescape)
                .collect()
        })
    }
}

/// Resolve `\s`, `\n`, `\t`, `\r` and `\\` escapes.
pub fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('s') => out.push(' '),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn locale_candidates(locale: &str) -> Vec<String> {
    let without_encoding = match locale.split_once('.') {
        Some((head, rest)) => match rest.split_once('@') {
            Some((_, modifier)) => format!("{}@{}", head, modifier),
            None => head.to_string(),
        },
        None => locale.to_string(),
    };
    let mut candidates = vec![without_encoding.clone()];
    let (base, modifier) = match without_encoding.split_once('@') {
        Some((b, m)) => (b.to_string(), Some(m.to_string())),
        None => (without_encoding.clone(), None),
    };
    if modifier.is_some() {
        candidates.push(base.clone());
    }
    if let Some((lang, _country)) = base.split_once('_') {
        if let Some(m) = &modifier {
            candidates.push(format!("{}@{}", lang, m));
        }
        candidates.push(lang.to_string());
    }
    candidates.dedup();
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    const EDITOR: &str = "# an editor\n[Desktop Entry]\nEncoding=UTF-8\nName=Editor\nName[de]=Bearbeiter\nComment=Edit\\stext\nCategories=Utility;TextEditor;\nTerminal=false\n\n[X-Extra]\nFoo=bar\n";

    #[test]
    fn given_descriptor_when_parsing_then_sections_and_keys_are_read() {
        let file = KeyFile::parse(EDITOR.as_bytes()).unwrap();

        assert_eq!(file.sections().len(), 2);
        assert_eq!(file.comments().len(), 1);
        assert_eq!(file.raw("Name"), Some("Editor"));
        assert_eq!(file.string("Comment").as_deref(), Some("Edit text"));
        assert_eq!(
            file.list("Categories"),
            Some(vec!["Utility".to_string(), "TextEditor".to_string()])
        );
        assert!(!file.boolean("Terminal"));
    }

    #[test]
    fn given_locale_when_looking_up_then_falls_back_to_language() {
        let file = KeyFile::parse(EDITOR.as_bytes()).unwrap();

        assert_eq!(
            file.locale_string("Name", Some("de_AT.UTF-8")).as_deref(),
            Some("Bearbeiter")
        );
        assert_eq!(
            file.locale_string("Name", Some("fr_FR")).as_deref(),
            Some("Editor")
        );
    }

    #[test]
    fn given_key_before_section_when_parsing_then_errors() {
        let err = KeyFile::parse(b"Name=x\n[Desktop Entry]\n").unwrap_err();

        assert!(matches!(err, DomainError::KeyFileSyntax { line: 1, .. }));
    }

    #[test]
    fn given_line_without_equals_when_parsing_then_errors() {
        let err = KeyFile::parse(b"[Desktop Entry]\nbogus\n").unwrap_err();

        assert!(matches!(err, DomainError::KeyFileSyntax { line: 2, .. }));
    }

    #[test]
    fn given_invalid_utf8_value_when_parsing_then_flagged() {
        let file = KeyFile::parse(b"[Desktop Entry]\nName=\xff\xfe\n").unwrap();

        let entry = &file.main_section().unwrap().entries[0];
        assert!(!entry.valid_utf8);
    }

    #[test]
    fn given_consecutive_descriptors_when_parsing_then_shared_grammar_reads_each() {
        let first = KeyFile::parse(b"[Desktop Entry]\nName=First\n").unwrap();
        let second = KeyFile::parse(b"[Desktop Entry]\nName[de]=Zweite\nName=Second\n").unwrap();

        assert!(std::ptr::eq(&*GRAMMAR, &*GRAMMAR));
        assert_eq!(first.locale_string("Name", None).as_deref(), Some("First"));
        assert_eq!(second.locale_string("Name", Some("de")).as_deref(), Some("Zweite"));
        assert_eq!(second.locale_string("Name", None).as_deref(), Some("Second"));
    }

    #[test]
    fn test_locale_candidates() {
        assert_eq!(
            locale_candidates("sr_YU.UTF-8@Latn"),
            vec!["sr_YU@Latn", "sr_YU", "sr@Latn", "sr"]
        );
        assert_eq!(locale_candidates("de"), vec!["de"]);
    }
}
