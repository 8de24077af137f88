//! Kokoro voice catalog.
//!
//! Kokoro voice names encode their language in the first letter
//! (`af_heart` → American English, `jf_alpha` → Japanese). The built-in list
//! seeds the synthesizer before the server's own list has been fetched.

use dialtone_core::voice::Voice;

/// Voices shipped with Kokoro v1.0.
const KOKORO_VOICES: &[&str] = &[
    "af_alloy", "af_aoede", "af_bella", "af_heart", "af_jessica", "af_kore", "af_nicole",
    "af_nova", "af_river", "af_sarah", "af_sky", "am_adam", "am_echo", "am_eric", "am_fenrir",
    "am_liam", "am_michael", "am_onyx", "am_puck", "am_santa", "bf_alice", "bf_emma",
    "bf_isabella", "bf_lily", "bm_daniel", "bm_fable", "bm_george", "bm_lewis", "ef_dora",
    "em_alex", "ff_siwis", "hf_alpha", "hf_beta", "hm_omega", "hm_psi", "if_sara", "im_nicola",
    "jf_alpha", "jf_gongitsune", "jf_nezumi", "jf_tebukuro", "jm_kumo", "pf_dora", "pm_alex",
    "pm_santa", "zf_xiaobei", "zf_xiaoni", "zf_xiaoxiao", "zf_xiaoyi", "zm_yunjian", "zm_yunxi",
    "zm_yunxia", "zm_yunyang",
];

/// Language tag for a Kokoro voice name, from its first letter.
pub fn language_for_voice(name: &str) -> Option<&'static str> {
    let tag = match name.chars().next()? {
        'a' => "en-US",
        'b' => "en-GB",
        'e' => "es-ES",
        'f' => "fr-FR",
        'h' => "hi-IN",
        'i' => "it-IT",
        'j' => "ja-JP",
        'p' => "pt-BR",
        'z' => "zh-CN",
        _ => return None,
    };
    Some(tag)
}

/// Turn raw voice names into a catalog, skipping names with no known language.
pub fn catalog_from_names<I, S>(names: I) -> Vec<Voice>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .filter_map(|name| {
            let name = name.as_ref();
            language_for_voice(name).map(|lang| Voice::new(name, lang))
        })
        .collect()
}

/// The built-in catalog.
pub fn builtin_catalog() -> Vec<Voice> {
    catalog_from_names(KOKORO_VOICES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_prefixes() {
        assert_eq!(language_for_voice("af_heart"), Some("en-US"));
        assert_eq!(language_for_voice("bm_george"), Some("en-GB"));
        assert_eq!(language_for_voice("jf_alpha"), Some("ja-JP"));
        assert_eq!(language_for_voice("zm_yunxi"), Some("zh-CN"));
        assert_eq!(language_for_voice("xx_unknown"), None);
        assert_eq!(language_for_voice(""), None);
    }

    #[test]
    fn builtin_covers_every_voice() {
        let catalog = builtin_catalog();
        assert_eq!(catalog.len(), KOKORO_VOICES.len());
        assert!(catalog.iter().all(|v| !v.language.is_empty()));
    }

    #[test]
    fn builtin_has_no_german_voice() {
        assert!(!builtin_catalog().iter().any(|v| v.language.starts_with("de")));
    }

    #[test]
    fn skips_unknown_names() {
        let catalog = catalog_from_names(["af_sky", "custom_blend", "bf_emma"]);
        assert_eq!(
            catalog,
            vec![Voice::new("af_sky", "en-US"), Voice::new("bf_emma", "en-GB")]
        );
    }
}
