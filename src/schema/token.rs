/// Token vocabulary — sentinels, key-encoding symbols, and part-of-speech tags.

/// Sentinel marking the start of a lyric.
pub const BEGIN: &str = "BEGIN";
/// Sentinel marking the end of a line.
pub const END: &str = "END";

/// Joins the tokens of a gram key. Never present in an encoded token.
pub const KEY_DELIMITER: char = ':';
/// Wildcard marker used in partial gram queries.
pub const WILDCARD: &str = "*";

/// Stand-in for a half-width space, which the morphological analyzer drops.
pub const SPACE: &str = "___";

/// Separates a word from its part-of-speech code: `word#tag`.
pub const TAG_SEPARATOR: char = '#';

/// Returns true for `BEGIN` and `END`.
pub fn is_sentinel(token: &str) -> bool {
    token == BEGIN || token == END
}

/// Closed set of grammatical categories a tokenizer may attach to a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PosTag {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Particle,
    AuxiliaryVerb,
    Conjunction,
    Prefix,
    Interjection,
    Filler,
    Symbol,
    Adnominal,
    Other,
    Alphabet,
}

impl PosTag {
    pub const ALL: [PosTag; 14] = [
        PosTag::Noun,
        PosTag::Verb,
        PosTag::Adjective,
        PosTag::Adverb,
        PosTag::Particle,
        PosTag::AuxiliaryVerb,
        PosTag::Conjunction,
        PosTag::Prefix,
        PosTag::Interjection,
        PosTag::Filler,
        PosTag::Symbol,
        PosTag::Adnominal,
        PosTag::Other,
        PosTag::Alphabet,
    ];

    /// Short code written after the tag separator.
    pub fn code(self) -> &'static str {
        match self {
            PosTag::Noun => "n",
            PosTag::Verb => "v",
            PosTag::Adjective => "aj",
            PosTag::Adverb => "ad",
            PosTag::Particle => "pt",
            PosTag::AuxiliaryVerb => "ax",
            PosTag::Conjunction => "c",
            PosTag::Prefix => "pr",
            PosTag::Interjection => "i",
            PosTag::Filler => "f",
            PosTag::Symbol => "s",
            PosTag::Adnominal => "pa",
            PosTag::Other => "o",
            PosTag::Alphabet => "al",
        }
    }

    pub fn from_code(code: &str) -> Option<PosTag> {
        PosTag::ALL.into_iter().find(|tag| tag.code() == code)
    }

    /// Maps a MeCab/IPADIC part-of-speech name to a tag.
    pub fn from_ipadic(name: &str) -> PosTag {
        match name {
            "名詞" => PosTag::Noun,
            "動詞" => PosTag::Verb,
            "形容詞" => PosTag::Adjective,
            "副詞" => PosTag::Adverb,
            "助詞" => PosTag::Particle,
            "助動詞" => PosTag::AuxiliaryVerb,
            "接続詞" => PosTag::Conjunction,
            "接頭詞" => PosTag::Prefix,
            "感動詞" => PosTag::Interjection,
            "フィラー" => PosTag::Filler,
            "記号" => PosTag::Symbol,
            "連体詞" => PosTag::Adnominal,
            _ => PosTag::Other,
        }
    }
}

/// Formats `word#code`.
pub fn tag_token(word: &str, tag: PosTag) -> String {
    format!("{}{}{}", word, TAG_SEPARATOR, tag.code())
}

/// Removes a trailing `#code` if `code` is a known tag. Other `#` are kept.
pub fn strip_tag(token: &str) -> &str {
    match token.rsplit_once(TAG_SEPARATOR) {
        Some((word, code)) if PosTag::from_code(code).is_some() => word,
        _ => token,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for tag in PosTag::ALL {
            assert_eq!(PosTag::from_code(tag.code()), Some(tag));
        }
        assert_eq!(PosTag::from_code("zz"), None);
    }

    #[test]
    fn strip_known_tag() {
        assert_eq!(strip_tag("犬#n"), "犬");
        assert_eq!(strip_tag(&tag_token("走る", PosTag::Verb)), "走る");
    }

    #[test]
    fn strip_keeps_unknown_suffix() {
        assert_eq!(strip_tag("C#"), "C#");
        assert_eq!(strip_tag("issue#42"), "issue#42");
        assert_eq!(strip_tag("C##al"), "C#");
    }

    #[test]
    fn ipadic_names_map_to_tags() {
        assert_eq!(PosTag::from_ipadic("名詞"), PosTag::Noun);
        assert_eq!(PosTag::from_ipadic("助詞"), PosTag::Particle);
        assert_eq!(PosTag::from_ipadic("未知語"), PosTag::Other);
    }

    #[test]
    fn sentinels() {
        assert!(is_sentinel(BEGIN));
        assert!(is_sentinel(END));
        assert!(!is_sentinel("begin"));
    }
}
