use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::model::Row;

/// Canonical bank-statement column names, keyed by a lowercased space-free fragment.
/// Checked in order; the first fragment contained in a header wins.
const HEADER_ALIASES: &[(&str, &str)] = &[
    ("fecha", "Fecha"),
    ("numerodetransaccion", "Numero de Transaccion"),
    ("numerodetransaccionoficina", "Numero de Transaccion"),
    ("oficina", "Oficina"),
    ("descripcion", "Descripcion"),
    ("egresos", "Egresos"),
    ("ingresos", "Ingresos"),
    ("saldo", "Saldo"),
];

static NON_LETTERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z]+").expect("hardcoded non-letter regex is valid"));

fn looks_like_label(cell: &str) -> bool {
    let letters = cell.chars().filter(|ch| ch.is_alphabetic()).count();
    let digits = cell.chars().filter(char::is_ascii_digit).count();
    letters >= digits && letters >= 3
}

/// Whether a first row reads as column labels rather than data.
pub(crate) fn looks_like_header(row: &Row) -> bool {
    let label_cells = row.iter().filter(|cell| looks_like_label(cell)).count();
    label_cells >= (row.len() / 2).max(2)
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canonical name for a header cell; empty when nothing letter-like survives cleaning.
pub(crate) fn clean_header(cell: &str) -> String {
    let ascii = cell.nfkd().filter(char::is_ascii).collect::<String>();
    let normalized = NON_LETTERS.replace_all(&ascii, " ");
    let normalized = normalized.trim();
    if normalized.is_empty() {
        return String::new();
    }

    let compact = normalized.replace(' ', "").to_lowercase();
    if let Some((_, canonical)) = HEADER_ALIASES
        .iter()
        .find(|(alias, _)| compact.contains(alias))
    {
        return (*canonical).to_string();
    }

    let lowered = normalized.to_lowercase();
    let tokens = lowered.split(' ').collect::<Vec<_>>();
    if tokens.contains(&"fecha") {
        return "Fecha".to_string();
    }
    if compact.contains("transacci") || tokens.contains(&"transaccion") {
        return "Numero de Transaccion".to_string();
    }
    if tokens.contains(&"descripcion") || tokens.contains(&"descripcien") {
        return "Descripcion".to_string();
    }

    title_case(normalized)
}
