//! Property tests for name normalization.
//!
//! With every CJK character in the input mapped, normalization must be
//! deterministic, leave no CJK behind, and be a fixed point.

use proptest::prelude::*;
use yinpin_rename::transliterate::contains_cjk;
use yinpin_rename::{normalize, CharacterMap};

fn dictionary() -> CharacterMap {
    [
        ('店', "dian"),
        ('长', "zhang"),
        ('夏', "xia"),
        ('夜', "ye"),
        ('开', "kai"),
        ('始', "shi"),
        ('，', ""),
    ]
    .into_iter()
    .collect()
}

/// Stems drawn from mapped ideographs, ASCII and the punctuation that gets dropped.
fn arb_stem() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[店长夏夜开始a-zA-Z0-9 ，。！…()\.\-_]{0,10}").unwrap()
}

fn arb_extension() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just(".mp3".to_string()),
        Just(".flac".to_string()),
        Just(".OGG".to_string()),
    ]
}

proptest! {
    #[test]
    fn normalize_is_idempotent(stem in arb_stem(), ext in arb_extension()) {
        let dictionary = dictionary();
        let once = normalize(&format!("{}{}", stem, ext), &dictionary);
        let twice = normalize(&once.name, &dictionary);
        prop_assert_eq!(&twice.name, &once.name);
    }

    #[test]
    fn normalize_is_deterministic(stem in arb_stem(), ext in arb_extension()) {
        let dictionary = dictionary();
        let name = format!("{}{}", stem, ext);
        prop_assert_eq!(normalize(&name, &dictionary), normalize(&name, &dictionary));
    }

    #[test]
    fn mapped_names_lose_all_cjk(stem in arb_stem(), ext in arb_extension()) {
        let result = normalize(&format!("{}{}", stem, ext), &dictionary());
        prop_assert!(!contains_cjk(&result.name), "left CJK in {:?}", result.name);
        prop_assert!(result.unknown.is_empty());
    }

    #[test]
    fn extension_survives(stem in "[店长夏夜a-z]{1,6}", ext in arb_extension()) {
        let result = normalize(&format!("{}{}", stem, ext), &dictionary());
        prop_assert!(result.name.ends_with(&ext));
    }
}
