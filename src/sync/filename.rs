use std::sync::LazyLock;

use regex::Regex;

use crate::catalog::MediaKind;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| compile(r"\s+"));
static NON_WORD: LazyLock<Regex> = LazyLock::new(|| compile(r"[^A-Za-z0-9_\-]+"));
static DASHES: LazyLock<Regex> = LazyLock::new(|| compile(r"-{2,}"));
static DURATION_HINT: LazyLock<Regex> = LazyLock::new(|| compile(r"\((\d+)_(\d+)\)"));
static ID_PREFIX: LazyLock<Regex> = LazyLock::new(|| compile(r"^(\d+)\."));
static TITLE_PREFIX: LazyLock<Regex> = LazyLock::new(|| compile(r"^\d+\.\s*"));
static TRAILING_HINT: LazyLock<Regex> = LazyLock::new(|| compile(r"\(.*\)\s*$"));

/// Stable id from a folder name: `"Rust for Beginners!"` → `"rust-for-beginners"`.
pub fn slugify(name: &str) -> String {
    let s = name.to_lowercase();
    let s = WHITESPACE.replace_all(&s, "-");
    let s = NON_WORD.replace_all(&s, "");
    let s = DASHES.replace_all(&s, "-");
    s.trim_matches('-').to_string()
}

/// `(M_S)` token → `M:SS`; empty when the name has no hint.
pub fn parse_duration(file_name: &str) -> String {
    match DURATION_HINT.captures(file_name) {
        Some(caps) => format!("{}:{:0>2}", &caps[1], &caps[2]),
        None => String::new(),
    }
}

/// Leading numeric prefix before a dot, empty when absent.
pub fn parse_id(file_name: &str) -> String {
    ID_PREFIX
        .captures(file_name)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default()
}

/// File name without numeric prefix, extension and parenthetical duration hint.
pub fn parse_title(file_name: &str) -> String {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, ext)) if media_kind(ext).is_some() => stem,
        _ => file_name,
    };
    let stem = TITLE_PREFIX.replace(stem, "");
    TRAILING_HINT.replace(&stem, "").trim().to_string()
}

/// Media kind from a file extension, `None` for files the catalog ignores.
pub fn media_kind(extension: &str) -> Option<MediaKind> {
    match extension.to_ascii_lowercase().as_str() {
        "mp4" => Some(MediaKind::Video),
        "pdf" => Some(MediaKind::Document),
        _ => None,
    }
}
