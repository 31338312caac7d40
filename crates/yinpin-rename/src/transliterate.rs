//! Per-character transliteration of file and directory names

use crate::dictionary::CharacterMap;
use std::collections::BTreeSet;

/// First code point of the CJK Unified Ideographs block
pub const CJK_START: char = '\u{4E00}';
/// Last code point of the CJK Unified Ideographs block
pub const CJK_END: char = '\u{9FFF}';

const ELLIPSIS: char = '…';
const ASCII_ELLIPSIS: &str = "...";

/// Punctuation and spacing dropped when the dictionary has no entry for it.
const DELETED_SYMBOLS: &[char] = &[
    '，', '。', '？', '！', '：', '；', '、', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}', '【',
    '】', '（', '）', '〔', '〕', '《', '》', '〈', '〉', '「', '」', '『', '』', '—', '～', '·', '＋',
    '－', '＝', '＜', '＞', '／', '＼', '｜', '＃', '＄', '％', '＆', '＊', '￥', '＠', '＾', '｀', '｛',
    '｝', '［', '］', '\u{3000}', ' ',
];

// Each pass after the first can only delete characters, so this is never reached
// unless the dictionary maps ASCII onto itself.
const MAX_PASSES: usize = 16;

/// Result of normalizing one name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    pub name: String,
    /// CJK characters with no dictionary entry, left in `name` as-is
    pub unknown: BTreeSet<char>,
}

pub fn is_cjk(ch: char) -> bool {
    (CJK_START..=CJK_END).contains(&ch)
}

pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(is_cjk)
}

/// Split at the last dot. Leading dots never start an extension, so
/// `.hidden` has no extension while `a.b.flac` splits into `a.b` and `.flac`.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if !name[..idx].chars().all(|c| c == '.') => name.split_at(idx),
        _ => (name, ""),
    }
}

/// Normalize a single path component.
///
/// The name is split once; the stem is transliterated and cleaned until it
/// is stable and the extension is appended verbatim. The result is a fixed
/// point: normalizing it again returns it unchanged.
pub fn normalize(name: &str, map: &CharacterMap) -> Normalized {
    let (stem, ext) = split_extension(name);
    let mut unknown = BTreeSet::new();
    let mut stem = stem.to_string();

    for _ in 0..MAX_PASSES {
        let next = normalize_stem(&stem, map, &mut unknown);
        if next == stem {
            break;
        }
        stem = next;
    }

    // A stem of nothing but dots would swallow the extension on the next split.
    if !ext.is_empty() && stem.chars().all(|c| c == '.') {
        stem.clear();
    }

    stem.push_str(ext);
    Normalized {
        name: stem,
        unknown,
    }
}

fn normalize_stem(stem: &str, map: &CharacterMap, unknown: &mut BTreeSet<char>) -> String {
    let mut out = String::with_capacity(stem.len());
    let mut rest = stem;

    while let Some(ch) = rest.chars().next() {
        if rest.starts_with(ASCII_ELLIPSIS) {
            rest = &rest[ASCII_ELLIPSIS.len()..];
            continue;
        }
        rest = &rest[ch.len_utf8()..];

        if ch == ELLIPSIS {
            continue;
        }
        if let Some(mapped) = map.get(ch) {
            out.push_str(mapped);
        } else if is_cjk(ch) {
            unknown.insert(ch);
            out.push(ch);
        } else if !DELETED_SYMBOLS.contains(&ch) {
            out.push(ch);
        }
    }

    strip_unsafe(&out)
}

fn strip_unsafe(stem: &str) -> String {
    let mut kept: String = stem.chars().filter(|c| is_safe(*c)).collect();
    while let Some(pos) = kept.find(ASCII_ELLIPSIS) {
        kept.replace_range(pos..pos + ASCII_ELLIPSIS.len(), "");
    }
    kept
}

// Letters and digits in the Unicode sense, so unknown ideographs survive.
fn is_safe(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dictionary() -> CharacterMap {
        [
            ('店', "dian"),
            ('长', "zhang"),
            ('夏', "xia"),
            ('夜', "ye"),
            ('，', ""),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_mapped_name_keeps_extension() {
        let result = normalize("店长.flac", &dictionary());
        assert_eq!(result.name, "dianzhang.flac");
        assert!(result.unknown.is_empty());
    }

    #[test]
    fn test_unknown_characters_pass_through() {
        let result = normalize("店长说.mp3", &dictionary());
        assert_eq!(result.name, "dianzhang说.mp3");
        assert_eq!(result.unknown.into_iter().collect::<Vec<_>>(), vec!['说']);
    }

    #[test]
    fn test_symbols_and_spaces_removed() {
        let result = normalize("夏夜 （一）【BGM】！.ogg", &dictionary());
        assert_eq!(result.name, "xiaye一BGM.ogg");
        assert_eq!(result.unknown.into_iter().collect::<Vec<_>>(), vec!['一']);
    }

    #[test]
    fn test_ellipsis_removed_as_unit() {
        assert_eq!(normalize("夏夜...店长.wav", &dictionary()).name, "xiayedianzhang.wav");
        assert_eq!(normalize("夏夜…店长.wav", &dictionary()).name, "xiayedianzhang.wav");
        assert_eq!(normalize("夏夜....wav", &dictionary()).name, "xiaye.wav");
    }

    #[test]
    fn test_dictionary_deletion_entry() {
        assert_eq!(normalize("店，长", &dictionary()).name, "dianzhang");
    }

    #[test]
    fn test_ascii_punctuation_cleanup() {
        assert_eq!(
            normalize("店长 (v2)#final_mix-A.mp3", &dictionary()).name,
            "dianzhangv2final_mix-A.mp3"
        );
    }

    #[test]
    fn test_extension_is_verbatim() {
        assert_eq!(normalize("夏夜.FLAC", &dictionary()).name, "xiaye.FLAC");
        assert_eq!(normalize("夏.夜.mp3", &dictionary()).name, "xia.ye.mp3");
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("a.b.flac"), ("a.b", ".flac"));
        assert_eq!(split_extension("noext"), ("noext", ""));
        assert_eq!(split_extension(".hidden"), (".hidden", ""));
        assert_eq!(split_extension("..a"), ("..a", ""));
        assert_eq!(split_extension("店长.flac"), ("店长", ".flac"));
    }

    #[test]
    fn test_extension_kept_when_stem_collapses() {
        let map = dictionary();
        // ".." + deleted comma would otherwise merge into "...mp3"
        let once = normalize("..，.mp3", &map).name;
        assert_eq!(once, ".mp3");
        assert_eq!(normalize(&once, &map).name, once);

        let once = normalize("a..，.mp3", &map).name;
        assert_eq!(once, "a...mp3");
        assert_eq!(normalize(&once, &map).name, once);

        assert_eq!(normalize("，.flac", &map).name, ".flac");
    }

    #[test]
    fn test_is_cjk_bounds() {
        assert!(is_cjk('\u{4E00}'));
        assert!(is_cjk('\u{9FFF}'));
        assert!(!is_cjk('\u{3400}'));
        assert!(!is_cjk('，'));
        assert!(contains_cjk("bgm_店长"));
        assert!(!contains_cjk("bgm_01"));
    }
}
