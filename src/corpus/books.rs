//! Canonical book table: 3-letter code and Vietnamese display name, in
//! canonical order. The first [`OLD_TESTAMENT_LEN`] entries are the Old
//! Testament.

use crate::models::Testament;

pub const OLD_TESTAMENT_LEN: usize = 39;

pub const CANONICAL_BOOKS: [(&str, &str); 66] = [
    ("GEN", "Sáng-thế Ký"),
    ("EXO", "Xuất Ê-díp-tô Ký"),
    ("LEV", "Lê-vi Ký"),
    ("NUM", "Dân-số Ký"),
    ("DEU", "Phục-truyền Luật-lệ Ký"),
    ("JOS", "Giô-suê"),
    ("JDG", "Các Quan Xét"),
    ("RUT", "Ru-tơ"),
    ("1SA", "I Sa-mu-ên"),
    ("2SA", "II Sa-mu-ên"),
    ("1KI", "I Các Vua"),
    ("2KI", "II Các Vua"),
    ("1CH", "I Sử-ký"),
    ("2CH", "II Sử-ký"),
    ("EZR", "Ê-xơ-ra"),
    ("NEH", "Nê-hê-mi"),
    ("EST", "Ê-xơ-tê"),
    ("JOB", "Gióp"),
    ("PSA", "Thi-thiên"),
    ("PRO", "Châm-ngôn"),
    ("ECC", "Truyền-đạo"),
    ("SNG", "Nhã-ca"),
    ("ISA", "Ê-sai"),
    ("JER", "Giê-rê-mi"),
    ("LAM", "Ca-thương"),
    ("EZK", "Ê-xê-chi-ên"),
    ("DAN", "Đa-ni-ên"),
    ("HOS", "Ô-sê"),
    ("JOL", "Giô-ên"),
    ("AMO", "A-mốt"),
    ("OBA", "Áp-đia"),
    ("JON", "Giô-na"),
    ("MIC", "Mi-chê"),
    ("NAM", "Na-hum"),
    ("HAB", "Ha-ba-cúc"),
    ("ZEP", "Sô-phô-ni"),
    ("HAG", "A-ghê"),
    ("ZEC", "Xa-cha-ri"),
    ("MAL", "Ma-la-chi"),
    ("MAT", "Ma-thi-ơ"),
    ("MRK", "Mác"),
    ("LUK", "Lu-ca"),
    ("JHN", "Giăng"),
    ("ACT", "Công-vụ các Sứ-đồ"),
    ("ROM", "Rô-ma"),
    ("1CO", "I Cô-rinh-tô"),
    ("2CO", "II Cô-rinh-tô"),
    ("GAL", "Ga-la-ti"),
    ("EPH", "Ê-phê-sô"),
    ("PHP", "Phi-líp"),
    ("COL", "Cô-lô-se"),
    ("1TH", "I Tê-sa-lô-ni-ca"),
    ("2TH", "II Tê-sa-lô-ni-ca"),
    ("1TI", "I Ti-mô-thê"),
    ("2TI", "II Ti-mô-thê"),
    ("TIT", "Tít"),
    ("PHM", "Phi-lê-môn"),
    ("HEB", "Hê-bơ-rơ"),
    ("JAS", "Gia-cơ"),
    ("1PE", "I Phi-e-rơ"),
    ("2PE", "II Phi-e-rơ"),
    ("1JN", "I Giăng"),
    ("2JN", "II Giăng"),
    ("3JN", "III Giăng"),
    ("JUD", "Giu-đe"),
    ("REV", "Khải-huyền"),
];

pub fn canonical_index(code: &str) -> Option<usize> {
    CANONICAL_BOOKS.iter().position(|(c, _)| *c == code)
}

pub fn canonical_name(code: &str) -> Option<&'static str> {
    CANONICAL_BOOKS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

pub fn testament_of(code: &str) -> Option<Testament> {
    canonical_index(code).map(|i| {
        if i < OLD_TESTAMENT_LEN {
            Testament::Old
        } else {
            Testament::New
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_codes_are_unique_three_char_uppercase() {
        let codes: HashSet<&str> = CANONICAL_BOOKS.iter().map(|(c, _)| *c).collect();
        assert_eq!(codes.len(), 66);
        for code in codes {
            assert_eq!(code.len(), 3);
            assert_eq!(code, code.to_ascii_uppercase());
        }
    }

    #[test]
    fn test_testament_boundary() {
        assert_eq!(testament_of("MAL"), Some(Testament::Old));
        assert_eq!(testament_of("MAT"), Some(Testament::New));
        assert_eq!(testament_of("REV"), Some(Testament::New));
        assert_eq!(testament_of("XYZ"), None);
    }
}
