use serde::Serialize;

/// One of the 50 US states, with the numeric code NOAA's climate divisional
/// dataset uses for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsState {
    pub code: &'static str,
    pub name: &'static str,
    pub ncei_code: u16,
}

const fn state(code: &'static str, name: &'static str, ncei_code: u16) -> UsState {
    UsState {
        code,
        name,
        ncei_code,
    }
}

/// Canonical state set, ordered by postal code. The summary table is a left
/// join anchored on this list.
pub const US_STATES: [UsState; 50] = [
    state("AK", "Alaska", 50),
    state("AL", "Alabama", 1),
    state("AR", "Arkansas", 3),
    state("AZ", "Arizona", 2),
    state("CA", "California", 4),
    state("CO", "Colorado", 5),
    state("CT", "Connecticut", 6),
    state("DE", "Delaware", 7),
    state("FL", "Florida", 8),
    state("GA", "Georgia", 9),
    state("HI", "Hawaii", 51),
    state("IA", "Iowa", 13),
    state("ID", "Idaho", 10),
    state("IL", "Illinois", 11),
    state("IN", "Indiana", 12),
    state("KS", "Kansas", 14),
    state("KY", "Kentucky", 15),
    state("LA", "Louisiana", 16),
    state("MA", "Massachusetts", 19),
    state("MD", "Maryland", 18),
    state("ME", "Maine", 17),
    state("MI", "Michigan", 20),
    state("MN", "Minnesota", 21),
    state("MO", "Missouri", 23),
    state("MS", "Mississippi", 22),
    state("MT", "Montana", 24),
    state("NC", "North Carolina", 31),
    state("ND", "North Dakota", 32),
    state("NE", "Nebraska", 25),
    state("NH", "New Hampshire", 27),
    state("NJ", "New Jersey", 28),
    state("NM", "New Mexico", 29),
    state("NV", "Nevada", 26),
    state("NY", "New York", 30),
    state("OH", "Ohio", 33),
    state("OK", "Oklahoma", 34),
    state("OR", "Oregon", 35),
    state("PA", "Pennsylvania", 36),
    state("RI", "Rhode Island", 37),
    state("SC", "South Carolina", 38),
    state("SD", "South Dakota", 39),
    state("TN", "Tennessee", 40),
    state("TX", "Texas", 41),
    state("UT", "Utah", 42),
    state("VA", "Virginia", 44),
    state("VT", "Vermont", 43),
    state("WA", "Washington", 45),
    state("WI", "Wisconsin", 47),
    state("WV", "West Virginia", 46),
    state("WY", "Wyoming", 48),
];

pub fn state_by_code(code: &str) -> Option<&'static UsState> {
    US_STATES
        .iter()
        .find(|s| s.code.eq_ignore_ascii_case(code.trim()))
}

pub fn state_by_ncei_code(ncei_code: u16) -> Option<&'static UsState> {
    US_STATES.iter().find(|s| s.ncei_code == ncei_code)
}

/// Two ASCII letters, upper-cased. Territories and DC pass; membership in
/// the 50-state set is a separate question.
pub fn normalize_state_code(raw: &str) -> Option<String> {
    let code = raw.trim();
    if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(code.to_ascii_uppercase())
    } else {
        None
    }
}
