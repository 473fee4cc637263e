//! Field-level linter for a single descriptor file.
//!
//! Checks are driven by [`KEY_TABLE`]: every known key maps to a value type and a deprecation
//! flag. Validation never stops at the first problem; everything found is collected in a
//! [`ValidationReport`].

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::desktop_file::{KeyEntry, KeyFile, DESKTOP_ENTRY, KDE_DESKTOP_ENTRY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Line of the offending key or section, when there is one
    pub line: Option<usize>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} (line {}): {}", self.severity, line, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// True when at least one error was found.
    pub fn is_fatal(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    fn error(&mut self, line: Option<usize>, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Error,
            line,
            message: message.into(),
        });
    }

    fn warn(&mut self, line: Option<usize>, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            line,
            message: message.into(),
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueType {
    String,
    Strings,
    LocaleString,
    Regexps,
    Boolean,
    BooleanOr01,
    Numeric,
}

struct KeySpec {
    name: &'static str,
    value_type: ValueType,
    deprecated: bool,
}

const fn key(name: &'static str, value_type: ValueType) -> KeySpec {
    KeySpec {
        name,
        value_type,
        deprecated: false,
    }
}

const KEY_TABLE: &[KeySpec] = &[
    key("Encoding", ValueType::String),
    key("Version", ValueType::Numeric),
    key("Name", ValueType::LocaleString),
    key("Type", ValueType::String),
    key("FilePattern", ValueType::Regexps),
    key("TryExec", ValueType::String),
    key("NoDisplay", ValueType::Boolean),
    key("Comment", ValueType::LocaleString),
    key("Exec", ValueType::String),
    key("Actions", ValueType::Strings),
    key("Icon", ValueType::String),
    KeySpec {
        name: "MiniIcon",
        value_type: ValueType::String,
        deprecated: true,
    },
    key("Hidden", ValueType::Boolean),
    key("Path", ValueType::String),
    key("Terminal", ValueType::BooleanOr01),
    key("TerminalOptions", ValueType::String),
    key("SwallowTitle", ValueType::LocaleString),
    key("SwallowExec", ValueType::String),
    key("MimeType", ValueType::Regexps),
    key("Patterns", ValueType::Regexps),
    key("DefaultApp", ValueType::String),
    key("Dev", ValueType::String),
    key("FSType", ValueType::String),
    key("MountPoint", ValueType::String),
    key("ReadOnly", ValueType::BooleanOr01),
    key("UnmountIcon", ValueType::String),
    key("SortOrder", ValueType::Strings),
    key("URL", ValueType::String),
    // keys read by the menu engine
    key("Categories", ValueType::Strings),
    key("OnlyShowIn", ValueType::Strings),
    key("NotShowIn", ValueType::Strings),
    key("GenericName", ValueType::LocaleString),
];

const VALID_TYPES: &[&str] = &[
    "Application",
    "Link",
    "FSDevice",
    "MimeType",
    "Directory",
    "Service",
    "ServiceType",
];

/// Legacy 8-bit encodings and the languages that imply them.
const KNOWN_ENCODINGS: &[(&str, &[&str])] = &[
    ("ARMSCII-8", &["by"]),
    ("BIG5", &["zh_TW"]),
    ("CP1251", &["be", "bg"]),
    ("EUC-CN", &["zh_TW"]),
    ("EUC-JP", &["ja"]),
    ("EUC-KR", &["ko"]),
    ("GEORGIAN-ACADEMY", &[]),
    ("GEORGIAN-PS", &["ka"]),
    (
        "ISO-8859-1",
        &[
            "br", "ca", "da", "de", "en", "es", "eu", "fi", "fr", "gl", "it", "nl", "wa", "no",
            "pt", "sv",
        ],
    ),
    (
        "ISO-8859-2",
        &["cs", "hr", "hu", "pl", "ro", "sk", "sl", "sq", "sr"],
    ),
    ("ISO-8859-3", &["eo"]),
    ("ISO-8859-5", &["mk", "sp"]),
    ("ISO-8859-7", &["el"]),
    ("ISO-8859-9", &["tr"]),
    ("ISO-8859-13", &["lv", "lt", "mi"]),
    ("ISO-8859-14", &["ga", "cy"]),
    ("ISO-8859-15", &["et"]),
    ("KOI8-R", &["ru"]),
    ("KOI8-U", &["uk"]),
    ("TCVN-5712", &["vi"]),
    ("TIS-620", &["th"]),
    ("VISCII", &[]),
];

const ENCODING_ALIASES: &[(&str, &str)] = &[("GB2312", "EUC-CN"), ("TCVN", "TCVN-5712")];

/// Field codes allowed after `%` in `Exec`.
const EXEC_FIELD_CODES: &[char] = &[
    'f', 'F', 'u', 'U', 'd', 'D', 'n', 'N', 'i', 'm', 'c', 'k', 'v', '%',
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileEncoding {
    Utf8,
    LegacyMixed,
    Unknown,
}

/// Validate raw descriptor bytes. A file that cannot be parsed yields a single error.
pub fn validate_bytes(bytes: &[u8]) -> ValidationReport {
    match KeyFile::parse(bytes) {
        Ok(file) => validate(&file),
        Err(e) => {
            let mut report = ValidationReport::default();
            report.error(None, e.to_string());
            report
        }
    }
}

/// Validate a parsed descriptor.
pub fn validate(file: &KeyFile) -> ValidationReport {
    let mut report = ValidationReport::default();

    if !check_sections(file, &mut report) {
        return report;
    }
    let encoding = check_required_keys(file, &mut report);
    check_keys(file, encoding, &mut report);

    if let (Some(name), Some(comment)) = (file.raw("Name"), file.raw("Comment")) {
        if name == comment {
            report.warn(None, "Name and Comment have the same value");
        }
    }
    for comment in file.comments().iter().filter(|c| !c.valid_utf8) {
        report.warn(Some(comment.line), "comment is not valid UTF-8");
    }

    report
}

/// False when there is no main section, in which case nothing else is checked.
fn check_sections(file: &KeyFile, report: &mut ValidationReport) -> bool {
    let mut seen = HashSet::new();
    let mut has_main = false;
    let mut has_kde = false;

    for section in file.sections() {
        match section.name.as_str() {
            DESKTOP_ENTRY => has_main = true,
            KDE_DESKTOP_ENTRY => has_kde = true,
            other if !other.starts_with("X-") => report.error(
                Some(section.line),
                format!(
                    "section '{}' is not standard, extension sections must start with 'X-'",
                    other
                ),
            ),
            _ => {}
        }
        if !seen.insert(section.name.as_str()) {
            report.error(
                Some(section.line),
                format!("multiple sections named '{}'", section.name),
            );
        }
    }

    if !has_main && !has_kde {
        report.error(None, format!("no '{}' section", DESKTOP_ENTRY));
        return false;
    }
    if has_kde {
        report.warn(
            None,
            format!(
                "'{}' section is deprecated in favour of '{}'",
                KDE_DESKTOP_ENTRY, DESKTOP_ENTRY
            ),
        );
    }
    true
}

fn check_required_keys(file: &KeyFile, report: &mut ValidationReport) -> FileEncoding {
    let encoding = match file.raw("Encoding") {
        Some("UTF-8") => FileEncoding::Utf8,
        Some("Legacy-Mixed") => FileEncoding::LegacyMixed,
        Some(other) => {
            report.error(None, format!("unknown encoding type '{}'", other));
            FileEncoding::Unknown
        }
        None => {
            report.error(None, "required key 'Encoding' is missing");
            FileEncoding::Unknown
        }
    };

    if file.raw("Name").is_none() {
        report.error(None, "required key 'Name' is missing");
    }

    match file.raw("Type") {
        Some(t) if VALID_TYPES.contains(&t) => {}
        Some(t) => report.error(None, format!("invalid type '{}'", t)),
        None => report.error(None, "required key 'Type' is missing"),
    }

    encoding
}

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[+-]?(\d+\.?\d*|\.\d+)").unwrap());

#[derive(Default)]
struct Assignments {
    untranslated: bool,
    translated: bool,
}

fn check_keys(file: &KeyFile, encoding: FileEncoding, report: &mut ValidationReport) {
    let Some(section) = file.main_section() else {
        return;
    };
    let mut assignments: BTreeMap<&str, Assignments> = BTreeMap::new();

    for entry in &section.entries {
        let seen = assignments.entry(entry.key.as_str()).or_default();
        match entry.locale {
            None if seen.untranslated => report.error(
                Some(entry.line),
                format!("multiple assignments of key '{}'", entry.key),
            ),
            None => seen.untranslated = true,
            Some(_) => seen.translated = true,
        }

        match KEY_TABLE.iter().find(|spec| spec.name == entry.key) {
            Some(spec) => {
                check_value(spec.value_type, entry, encoding, report);
                if spec.deprecated {
                    report.warn(
                        Some(entry.line),
                        format!("key '{}' is deprecated", entry.key),
                    );
                }
            }
            None if !entry.key.starts_with("X-") => report.error(
                Some(entry.line),
                format!(
                    "unknown key '{}', extension keys must start with 'X-'",
                    entry.key
                ),
            ),
            None => {}
        }

        match entry.key.as_str() {
            "Icon" if !entry.value.contains('.') => report.warn(
                Some(entry.line),
                format!("icon '{}' has no filename extension", entry.value),
            ),
            "Exec" => check_exec(entry, report),
            _ => {}
        }
    }

    for (key, seen) in assignments {
        if seen.translated && !seen.untranslated {
            report.error(
                None,
                format!("key '{}' is translated but has no untranslated value", key),
            );
        }
    }
}

fn display_key(entry: &KeyEntry) -> String {
    match &entry.locale {
        Some(locale) => format!("{}[{}]", entry.key, locale),
        None => entry.key.clone(),
    }
}

fn is_ascii_text(value: &str) -> bool {
    value
        .chars()
        .all(|c| c == '\n' || c == '\t' || (' '..='~').contains(&c))
}

fn check_value(
    value_type: ValueType,
    entry: &KeyEntry,
    encoding: FileEncoding,
    report: &mut ValidationReport,
) {
    let line = Some(entry.line);
    let value = entry.value.as_str();
    match value_type {
        ValueType::String | ValueType::Strings | ValueType::Regexps => {
            if !entry.valid_utf8 || !is_ascii_text(value) {
                report.error(
                    line,
                    format!(
                        "invalid characters in value of '{}', only printable ASCII is allowed",
                        display_key(entry)
                    ),
                );
            }
        }
        ValueType::LocaleString => check_locale_string(entry, encoding, report),
        ValueType::Boolean => {
            if value != "true" && value != "false" {
                report.error(
                    line,
                    format!(
                        "boolean key '{}' must be 'true' or 'false', found '{}'",
                        entry.key, value
                    ),
                );
            }
        }
        ValueType::BooleanOr01 => match value {
            "true" | "false" => {}
            "0" | "1" => report.warn(
                line,
                format!(
                    "boolean key '{}' uses '{}', prefer 'true' or 'false'",
                    entry.key, value
                ),
            ),
            _ => report.error(
                line,
                format!(
                    "boolean key '{}' must be 'true' or 'false', found '{}'",
                    entry.key, value
                ),
            ),
        },
        ValueType::Numeric => {
            if !NUMBER.is_match(value) {
                report.error(
                    line,
                    format!("numeric key '{}' has non-numeric value '{}'", entry.key, value),
                );
            }
        }
    }
}

fn check_locale_string(entry: &KeyEntry, encoding: FileEncoding, report: &mut ValidationReport) {
    let line = Some(entry.line);
    match (encoding, &entry.locale) {
        (FileEncoding::Utf8, _) if !entry.valid_utf8 => report.error(
            line,
            format!(
                "value of '{}' is not valid UTF-8 although the encoding is UTF-8",
                display_key(entry)
            ),
        ),
        (FileEncoding::LegacyMixed, Some(locale)) if encoding_for_locale(locale).is_none() => {
            report.error(line, format!("no encoding known for locale '{}'", locale))
        }
        (FileEncoding::LegacyMixed, None) if !entry.valid_utf8 || !entry.value.is_ascii() => report
            .error(
                line,
                format!(
                    "untranslated value of '{}' must be ASCII in a Legacy-Mixed file",
                    entry.key
                ),
            ),
        _ => {}
    }
}

/// Compare encoding names ignoring case and the separators `-`, `.` and `_`.
fn encoding_names_equal(a: &str, b: &str) -> bool {
    let normalize = |s: &str| -> String {
        s.chars()
            .filter(|c| !matches!(c, '-' | '.' | '_'))
            .map(|c| c.to_ascii_lowercase())
            .collect()
    };
    normalize(a) == normalize(b)
}

/// Canonical encoding name for a `lang_COUNTRY.ENCODING@MODIFIER` locale: taken from the
/// explicit encoding part, else derived from the language.
fn encoding_for_locale(locale: &str) -> Option<String> {
    let locale = locale.split('@').next().unwrap_or(locale);
    if let Some((_, encoding)) = locale.split_once('.') {
        let canonical = ENCODING_ALIASES
            .iter()
            .find(|(alias, _)| encoding_names_equal(alias, encoding))
            .map(|(_, value)| *value)
            .or_else(|| {
                KNOWN_ENCODINGS
                    .iter()
                    .find(|(name, _)| encoding_names_equal(name, encoding))
                    .map(|(name, _)| *name)
            })
            .unwrap_or(encoding);
        return Some(canonical.to_string());
    }

    KNOWN_ENCODINGS
        .iter()
        .find(|(_, langs)| langs.iter().any(|l| lang_matches(locale, l)))
        .map(|(name, _)| name.to_string())
}

fn lang_matches(locale: &str, lang: &str) -> bool {
    if locale == lang {
        return true;
    }
    match locale.split_once('_') {
        Some((base, _)) => !lang.contains('_') && base == lang,
        None => false,
    }
}

fn check_exec(entry: &KeyEntry, report: &mut ValidationReport) {
    let line = Some(entry.line);
    if entry.value.contains("NO_XALF") {
        report.error(line, "Exec uses the non-standard NO_XALF prefix");
    }
    let mut chars = entry.value.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            continue;
        }
        match chars.next() {
            Some(code) if EXEC_FIELD_CODES.contains(&code) => {}
            Some(code) => report.error(line, format!("Exec uses unknown field code '%{}'", code)),
            None => break,
        }
    }
}
