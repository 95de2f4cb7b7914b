/// Normalize free-text terms to `FA<YY>` / `SP<YY>`.
///
/// "Fall 2024", "F24" and "fa2024" all become "FA24". Input that names a
/// season but carries fewer than two digits, or names no recognised season,
/// comes back trimmed and upper-cased.
pub fn normalize_term(term: &str) -> String {
    let term = term.trim().to_uppercase();

    let season = if term.contains("FALL") || term.starts_with('F') {
        "FA"
    } else if term.contains("SPRING") || term.starts_with('S') {
        "SP"
    } else {
        return term;
    };

    let digits: Vec<char> = term.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 2 {
        return term;
    }

    let year: String = digits[digits.len() - 2..].iter().collect();
    format!("{}{}", season, year)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fall_variants() {
        assert_eq!(normalize_term("Fall 2024"), "FA24");
        assert_eq!(normalize_term("F24"), "FA24");
        assert_eq!(normalize_term("  fa2024 "), "FA24");
        assert_eq!(normalize_term("FA24"), "FA24");
    }

    #[test]
    fn test_spring_variants() {
        assert_eq!(normalize_term("SPRING 23"), "SP23");
        assert_eq!(normalize_term("spring 2023"), "SP23");
        assert_eq!(normalize_term("SP23"), "SP23");
    }

    #[test]
    fn test_too_few_digits_falls_back() {
        assert_eq!(normalize_term("S9"), "S9");
        assert_eq!(normalize_term("fall"), "FALL");
    }

    #[test]
    fn test_unrecognised_season_passes_through() {
        assert_eq!(normalize_term("winter 23"), "WINTER 23");
        assert_eq!(normalize_term("2024"), "2024");
        assert_eq!(normalize_term(""), "");
    }

    #[test]
    fn test_summer_reads_as_spring() {
        // Any leading S is taken as spring
        assert_eq!(normalize_term("Summer 2024"), "SP24");
    }

    #[test]
    fn test_fall_check_wins_over_spring() {
        // "FALL" appears, so the spring branch is never consulted
        assert_eq!(normalize_term("Spring/Fall 2022"), "FA22");
    }

    #[test]
    fn test_idempotent() {
        for input in ["Fall 2024", "F24", "SPRING 23", "sp 2019", "F 1999"] {
            let once = normalize_term(input);
            assert_eq!(normalize_term(&once), once, "input {:?}", input);
        }
    }
}
