//! Literal reference parsing ("Thi Thiên 23", "Giăng 3:16") and fuzzy
//! book-name → book-code resolution.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// `<book name> <chapter>[:<verse>]`. The name is Vietnamese letters, spaces
/// and hyphens, optionally prefixed by an ordinal digit ("1 Giăng").
static RE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^((?:[1-3]\s*)?[a-záàảãạăắằẳẵặâấầẩẫậéèẻẽẹêếềểễệíìỉĩịóòỏõọôốồổỗộơớờởỡợúùủũụưứừửữựýỳỷỹỵđ\s\-]+)\s*(\d+)(?::(\d+))?$",
    )
    .unwrap()
});

/// Spellings, abbreviations and English names for every book. Order
/// matters: the containment fallback returns the first hit.
const BOOK_ALIASES: &[(&str, &str)] = &[
    // Old Testament
    ("sáng thế ký", "GEN"),
    ("sáng-thế ký", "GEN"),
    ("sáng thế", "GEN"),
    ("sáng", "GEN"),
    ("genesis", "GEN"),
    ("xuất", "EXO"),
    ("xuất ê-díp-tô ký", "EXO"),
    ("exodus", "EXO"),
    ("lê-vi ký", "LEV"),
    ("lê vi ký", "LEV"),
    ("leviticus", "LEV"),
    ("dân số ký", "NUM"),
    ("dân-số ký", "NUM"),
    ("numbers", "NUM"),
    ("phục truyền", "DEU"),
    ("phục-truyền luật-lệ ký", "DEU"),
    ("deuteronomy", "DEU"),
    ("giô-suê", "JOS"),
    ("giô suê", "JOS"),
    ("joshua", "JOS"),
    ("các quan xét", "JDG"),
    ("judges", "JDG"),
    ("ru-tơ", "RUT"),
    ("ru tơ", "RUT"),
    ("ruth", "RUT"),
    ("i sa-mu-ên", "1SA"),
    ("1 sa-mu-ên", "1SA"),
    ("1 samuel", "1SA"),
    ("ii sa-mu-ên", "2SA"),
    ("2 sa-mu-ên", "2SA"),
    ("2 samuel", "2SA"),
    ("i các vua", "1KI"),
    ("1 các vua", "1KI"),
    ("1 kings", "1KI"),
    ("ii các vua", "2KI"),
    ("2 các vua", "2KI"),
    ("2 kings", "2KI"),
    ("i sử ký", "1CH"),
    ("i sử-ký", "1CH"),
    ("1 chronicles", "1CH"),
    ("ii sử ký", "2CH"),
    ("ii sử-ký", "2CH"),
    ("2 chronicles", "2CH"),
    ("ê-xơ-ra", "EZR"),
    ("ê xơ ra", "EZR"),
    ("ezra", "EZR"),
    ("nê-hê-mi", "NEH"),
    ("nê hê mi", "NEH"),
    ("nehemiah", "NEH"),
    ("ê-xơ-tê", "EST"),
    ("ê xơ tê", "EST"),
    ("esther", "EST"),
    ("gióp", "JOB"),
    ("job", "JOB"),
    ("thi thiên", "PSA"),
    ("thi-thiên", "PSA"),
    ("thi", "PSA"),
    ("psalm", "PSA"),
    ("psalms", "PSA"),
    ("châm ngôn", "PRO"),
    ("châm-ngôn", "PRO"),
    ("proverbs", "PRO"),
    ("truyền đạo", "ECC"),
    ("truyền-đạo", "ECC"),
    ("ecclesiastes", "ECC"),
    ("nhã ca", "SNG"),
    ("nhã-ca", "SNG"),
    ("song of solomon", "SNG"),
    ("ê-sai", "ISA"),
    ("ê sai", "ISA"),
    ("isaiah", "ISA"),
    ("giê-rê-mi", "JER"),
    ("giê rê mi", "JER"),
    ("jeremiah", "JER"),
    ("ca thương", "LAM"),
    ("ca-thương", "LAM"),
    ("lamentations", "LAM"),
    ("ê-xê-chi-ên", "EZK"),
    ("ê xê chi ên", "EZK"),
    ("ezekiel", "EZK"),
    ("đa-ni-ên", "DAN"),
    ("đa ni ên", "DAN"),
    ("daniel", "DAN"),
    ("ô-sê", "HOS"),
    ("ô sê", "HOS"),
    ("hosea", "HOS"),
    ("giô-ên", "JOL"),
    ("giô ên", "JOL"),
    ("joel", "JOL"),
    ("a-mốt", "AMO"),
    ("a mốt", "AMO"),
    ("amos", "AMO"),
    ("áp-đia", "OBA"),
    ("áp đia", "OBA"),
    ("obadiah", "OBA"),
    ("giô-na", "JON"),
    ("giô na", "JON"),
    ("jonah", "JON"),
    ("mi-chê", "MIC"),
    ("mi chê", "MIC"),
    ("micah", "MIC"),
    ("na-hum", "NAM"),
    ("na hum", "NAM"),
    ("nahum", "NAM"),
    ("ha-ba-cúc", "HAB"),
    ("ha ba cúc", "HAB"),
    ("habakkuk", "HAB"),
    ("sô-phô-ni", "ZEP"),
    ("sô phô ni", "ZEP"),
    ("zephaniah", "ZEP"),
    ("a-ghê", "HAG"),
    ("a ghê", "HAG"),
    ("haggai", "HAG"),
    ("xa-cha-ri", "ZEC"),
    ("xa cha ri", "ZEC"),
    ("zechariah", "ZEC"),
    ("ma-la-chi", "MAL"),
    ("ma la chi", "MAL"),
    ("malachi", "MAL"),
    // New Testament
    ("ma-thi-ơ", "MAT"),
    ("ma thi ơ", "MAT"),
    ("matthew", "MAT"),
    ("mác", "MRK"),
    ("mark", "MRK"),
    ("lu-ca", "LUK"),
    ("lu ca", "LUK"),
    ("luke", "LUK"),
    ("giăng", "JHN"),
    ("john", "JHN"),
    ("công vụ", "ACT"),
    ("công-vụ các sứ-đồ", "ACT"),
    ("acts", "ACT"),
    ("rô-ma", "ROM"),
    ("rô ma", "ROM"),
    ("romans", "ROM"),
    ("i cô-rinh-tô", "1CO"),
    ("1 corinthians", "1CO"),
    ("ii cô-rinh-tô", "2CO"),
    ("2 corinthians", "2CO"),
    ("ga-la-ti", "GAL"),
    ("ga la ti", "GAL"),
    ("galatians", "GAL"),
    ("ê-phê-sô", "EPH"),
    ("ê phê sô", "EPH"),
    ("ephesians", "EPH"),
    ("phi-líp", "PHP"),
    ("phi líp", "PHP"),
    ("philippians", "PHP"),
    ("cô-lô-se", "COL"),
    ("cô lô se", "COL"),
    ("colossians", "COL"),
    ("i tê-sa-lô-ni-ca", "1TH"),
    ("1 thessalonians", "1TH"),
    ("ii tê-sa-lô-ni-ca", "2TH"),
    ("2 thessalonians", "2TH"),
    ("i ti-mô-thê", "1TI"),
    ("1 timothy", "1TI"),
    ("ii ti-mô-thê", "2TI"),
    ("2 timothy", "2TI"),
    ("tít", "TIT"),
    ("titus", "TIT"),
    ("phi-lê-môn", "PHM"),
    ("phi lê môn", "PHM"),
    ("philemon", "PHM"),
    ("hê-bơ-rơ", "HEB"),
    ("hê bơ rơ", "HEB"),
    ("hebrews", "HEB"),
    ("gia-cơ", "JAS"),
    ("gia cơ", "JAS"),
    ("james", "JAS"),
    ("i phi-e-rơ", "1PE"),
    ("1 peter", "1PE"),
    ("ii phi-e-rơ", "2PE"),
    ("2 peter", "2PE"),
    ("i giăng", "1JN"),
    ("1 john", "1JN"),
    ("ii giăng", "2JN"),
    ("2 john", "2JN"),
    ("iii giăng", "3JN"),
    ("3 john", "3JN"),
    ("giu-đe", "JUD"),
    ("giu đe", "JUD"),
    ("jude", "JUD"),
    ("khải huyền", "REV"),
    ("khải-huyền", "REV"),
    ("revelation", "REV"),
    // Arabic-numeral ordinals, so "1 Giăng" never falls through to "giăng"
    ("1 sử ký", "1CH"),
    ("2 sử ký", "2CH"),
    ("1 cô-rinh-tô", "1CO"),
    ("2 cô-rinh-tô", "2CO"),
    ("1 tê-sa-lô-ni-ca", "1TH"),
    ("2 tê-sa-lô-ni-ca", "2TH"),
    ("1 ti-mô-thê", "1TI"),
    ("2 ti-mô-thê", "2TI"),
    ("1 phi-e-rơ", "1PE"),
    ("2 phi-e-rơ", "2PE"),
    ("1 giăng", "1JN"),
    ("2 giăng", "2JN"),
    ("3 giăng", "3JN"),
];

/// Result of [`parse_exact_reference`]. All fields are `None` when the text
/// is not shaped like a reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactReference {
    pub book_code: Option<&'static str>,
    pub book_name: Option<String>,
    pub chapter: Option<u32>,
    pub verse: Option<u32>,
}

/// Parse a literal reference such as `"Giăng 3:16"`.
///
/// The book name is kept even if it does not resolve, so callers can tell
/// "looks like a reference to an unknown book" apart from "not a reference".
///
/// Library API only: no HTTP route calls it, routing is the classifier's job.
pub fn parse_exact_reference(text: &str) -> ExactReference {
    let text: String = text.trim().nfc().collect();
    let Some(caps) = RE_REFERENCE.captures(&text) else {
        tracing::debug!("No reference pattern match for {text:?}");
        return ExactReference::default();
    };

    let book_name = caps[1].trim().to_string();
    let chapter = caps[2].parse().ok();
    let verse = caps.get(3).and_then(|m| m.as_str().parse().ok());
    let book_code = resolve_book_name(&book_name);

    tracing::debug!("Parsed reference {text:?} → {book_code:?} {chapter:?}:{verse:?}");

    ExactReference {
        book_code,
        book_name: Some(book_name),
        chapter,
        verse,
    }
}

/// Lowercase, NFC, hyphens/underscores → spaces, whitespace collapsed.
pub fn normalize_book_name(name: &str) -> String {
    let lowered: String = name.nfc().collect::<String>().to_lowercase();
    lowered
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve a free-form book name to its 3-letter code.
///
/// Exact alias match first; otherwise the first alias (in table order) that
/// contains the name or is contained by it.
///
/// Library API only, like [`parse_exact_reference`].
pub fn resolve_book_name(name: &str) -> Option<&'static str> {
    let normalized = normalize_book_name(name);
    if normalized.is_empty() {
        return None;
    }

    let aliases = BOOK_ALIASES
        .iter()
        .map(|(alias, code)| (normalize_book_name(alias), *code));

    let mut fallback = None;
    for (alias, code) in aliases {
        if alias == normalized {
            return Some(code);
        }
        if fallback.is_none() && (alias.contains(&normalized) || normalized.contains(&alias)) {
            fallback = Some(code);
        }
    }
    fallback
}
