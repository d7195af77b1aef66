//! Label normalization for fuzzy comparison.
//!
//! Statement labels vary in spacing, character width and annotation from one
//! factory to the next (`基本給`, `基 本 給`, `基本給（円）`). Normalizing both
//! the sheet label and the dictionary key makes plain string comparison enough.

use crate::grid::CellValue;

const OPENING_BRACKETS: [char; 6] = ['(', '[', '【', '「', '〔', '『'];
const CLOSING_BRACKETS: [char; 6] = [')', ']', '】', '」', '〕', '』'];
const INTERPUNCTS: [char; 3] = ['・', '･', '·'];

/// Folds full-width ASCII (`Ａ`, `１`, `（`) to half-width and the ideographic
/// space to an ASCII space. Everything else is left untouched.
///
/// # Example
///
/// ```
/// use payroll_extract::detection::fold_width;
///
/// assert_eq!(fold_width("ＩＤ１２３　（円）"), "ID123 (円)");
/// ```
pub fn fold_width(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            '\u{3000}' => ' ',
            _ => c,
        })
        .collect()
}

/// Normalizes a raw label.
///
/// Width variants are folded, ASCII letters upper-cased, all whitespace
/// removed, bracketed annotations dropped together with their contents, and
/// interpuncts removed. The function is total and idempotent.
///
/// # Example
///
/// ```
/// use payroll_extract::detection::normalize_label;
///
/// assert_eq!(normalize_label(" 基 本 給（円）"), "基本給");
/// assert_eq!(normalize_label("60h超・残業手当"), "60H超残業手当");
/// assert_eq!(normalize_label(&normalize_label("【注】通勤 手当")), "通勤手当");
/// ```
pub fn normalize_label(raw: &str) -> String {
    let folded = fold_width(raw);
    let mut out = String::with_capacity(folded.len());
    let mut depth = 0usize;

    for c in folded.chars() {
        if OPENING_BRACKETS.contains(&c) {
            depth += 1;
            continue;
        }
        if CLOSING_BRACKETS.contains(&c) {
            depth = depth.saturating_sub(1);
            continue;
        }
        if depth > 0 || c.is_whitespace() || INTERPUNCTS.contains(&c) {
            continue;
        }
        out.push(c.to_ascii_uppercase());
    }

    out
}

/// Normalizes any cell value by stringifying it first.
pub fn normalize_cell(value: &CellValue) -> String {
    normalize_label(&value.display_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_strips_ascii_and_full_width_spaces() {
        assert_eq!(normalize_label("労 働　時 間"), "労働時間");
        assert_eq!(normalize_label("\t残業時間\n"), "残業時間");
    }

    #[test]
    fn test_strips_bracketed_annotations() {
        assert_eq!(normalize_label("通勤手当(非課税)"), "通勤手当");
        assert_eq!(normalize_label("通勤手当（非課税）"), "通勤手当");
        assert_eq!(normalize_label("【控除】寮費"), "寮費");
        assert_eq!(normalize_label("基本給[月給(固定)]"), "基本給");
    }

    #[test]
    fn test_unbalanced_brackets_never_leak() {
        assert_eq!(normalize_label("残業(時間"), "残業");
        assert_eq!(normalize_label("残業)時間"), "残業時間");
    }

    #[test]
    fn test_removes_interpuncts() {
        assert_eq!(normalize_label("水道・光熱費"), "水道光熱費");
        assert_eq!(normalize_label("ﾃﾞｰﾀ･ID"), "ﾃﾞｰﾀID");
    }

    #[test]
    fn test_folds_width_and_case() {
        assert_eq!(normalize_label("社員ｎｏ"), "社員NO");
        assert_eq!(normalize_label("６０Ｈ超"), "60H超");
    }

    #[test]
    fn test_numeric_cell_is_stringified() {
        let cell = CellValue::Number(Decimal::new(1000010, 1));
        assert_eq!(normalize_cell(&cell), "100001");
        assert_eq!(normalize_cell(&CellValue::Empty), "");
    }

    proptest! {
        #[test]
        fn prop_normalization_is_idempotent(raw in "\\PC{0,24}") {
            let once = normalize_label(&raw);
            prop_assert_eq!(normalize_label(&once), once);
        }

        #[test]
        fn prop_label_alphabet_is_idempotent(
            raw in "[ 　()（）【】「」・･a-zＡ-Ｚ０-９0-9基本給残業手当]{0,20}"
        ) {
            let once = normalize_label(&raw);
            prop_assert_eq!(normalize_label(&once), once);
        }
    }
}
