//! Symbol definitions and per-symbol number/score configuration

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{SlotError, SlotResult};

/// A game icon a numeric draw resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Symbol {
    /// Unresolved cell
    #[default]
    None,
    Seven,
    TwoSevens,
    ThreeSevens,
    Cherry,
    TwoCherries,
    ThreeCherries,
    Bell,
    TwoBells,
    ThreeBells,
    Bar,
    TwoBars,
    ThreeBars,
    /// A blank stop on the reel (still a drawn symbol, unlike an empty cell)
    Empty,
    Image1,
    Image2,
    Image3,
    Image4,
    Char1,
    Char2,
    Char3,
    Char4,
    Char5,
    Char6,
}

impl Symbol {
    pub const ALL: [Symbol; 24] = [
        Symbol::None,
        Symbol::Seven,
        Symbol::TwoSevens,
        Symbol::ThreeSevens,
        Symbol::Cherry,
        Symbol::TwoCherries,
        Symbol::ThreeCherries,
        Symbol::Bell,
        Symbol::TwoBells,
        Symbol::ThreeBells,
        Symbol::Bar,
        Symbol::TwoBars,
        Symbol::ThreeBars,
        Symbol::Empty,
        Symbol::Image1,
        Symbol::Image2,
        Symbol::Image3,
        Symbol::Image4,
        Symbol::Char1,
        Symbol::Char2,
        Symbol::Char3,
        Symbol::Char4,
        Symbol::Char5,
        Symbol::Char6,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Seven => "SEVEN",
            Self::TwoSevens => "TWO_SEVENS",
            Self::ThreeSevens => "THREE_SEVENS",
            Self::Cherry => "CHERRY",
            Self::TwoCherries => "TWO_CHERRIES",
            Self::ThreeCherries => "THREE_CHERRIES",
            Self::Bell => "BELL",
            Self::TwoBells => "TWO_BELLS",
            Self::ThreeBells => "THREE_BELLS",
            Self::Bar => "BAR",
            Self::TwoBars => "TWO_BARS",
            Self::ThreeBars => "THREE_BARS",
            Self::Empty => "EMPTY",
            Self::Image1 => "IMAGE1",
            Self::Image2 => "IMAGE2",
            Self::Image3 => "IMAGE3",
            Self::Image4 => "IMAGE4",
            Self::Char1 => "CHAR1",
            Self::Char2 => "CHAR2",
            Self::Char3 => "CHAR3",
            Self::Char4 => "CHAR4",
            Self::Char5 => "CHAR5",
            Self::Char6 => "CHAR6",
        }
    }

    /// Has a draw been resolved to this cell yet?
    pub fn is_resolved(&self) -> bool {
        *self != Self::None
    }
}

impl FromStr for Symbol {
    type Err = SlotError;

    /// Case-insensitive. Unknown names are rejected rather than mapped to `NONE`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|sym| sym.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| SlotError::InvalidArgument(format!("Unknown symbol '{}'", s)))
    }
}

impl TryFrom<String> for Symbol {
    type Error = SlotError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Symbol> for String {
    fn from(s: Symbol) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many equal symbols in a row a score applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchLength {
    Three,
    Four,
    Five,
}

impl MatchLength {
    /// Map a streak length to a key. Below three pays nothing; above five counts as five.
    pub fn from_streak(len: usize) -> Option<Self> {
        match len {
            0..=2 => None,
            3 => Some(Self::Three),
            4 => Some(Self::Four),
            _ => Some(Self::Five),
        }
    }

    pub fn count(&self) -> usize {
        match self {
            Self::Three => 3,
            Self::Four => 4,
            Self::Five => 5,
        }
    }
}

/// Score table: match length → score per unit bet
pub type ScoreTable = BTreeMap<MatchLength, i64>;

/// Build a score table from pay values for 3, 4, 5 of a kind (index 0 = 3oak)
pub fn pays(values: &[i64]) -> ScoreTable {
    [MatchLength::Three, MatchLength::Four, MatchLength::Five]
        .into_iter()
        .zip(values.iter().copied())
        .collect()
}

/// Maps a set of drawn numbers to a symbol and its score table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SymbolConfigRepr")]
pub struct SymbolConfig {
    symbol: Symbol,
    numbers: Vec<i32>,
    scores: ScoreTable,
}

#[derive(Deserialize)]
struct SymbolConfigRepr {
    symbol: Symbol,
    numbers: Vec<i32>,
    #[serde(default)]
    scores: ScoreTable,
}

impl TryFrom<SymbolConfigRepr> for SymbolConfig {
    type Error = SlotError;

    fn try_from(repr: SymbolConfigRepr) -> Result<Self, Self::Error> {
        Self::create(repr.symbol, repr.scores, repr.numbers)
    }
}

impl SymbolConfig {
    /// Assign an explicit set of numbers. Fails if empty or not unique.
    pub fn create(
        symbol: Symbol,
        scores: ScoreTable,
        numbers: impl IntoIterator<Item = i32>,
    ) -> SlotResult<Self> {
        if !symbol.is_resolved() {
            return Err(SlotError::invalid_argument(
                "NONE cannot be assigned to numbers",
            ));
        }

        let numbers: Vec<i32> = numbers.into_iter().collect();
        if numbers.is_empty() {
            return Err(SlotError::invalid_argument(format!(
                "{} needs at least one number",
                symbol
            )));
        }

        let mut seen = HashSet::with_capacity(numbers.len());
        if let Some(dup) = numbers.iter().find(|n| !seen.insert(**n)) {
            return Err(SlotError::InvalidArgument(format!(
                "Number {} is assigned twice to {}",
                dup, symbol
            )));
        }

        Ok(Self {
            symbol,
            numbers,
            scores,
        })
    }

    /// Assign the contiguous numbers `[from, to)`
    pub fn create_range(
        symbol: Symbol,
        from: i32,
        to: i32,
        scores: ScoreTable,
    ) -> SlotResult<Self> {
        if from >= to {
            return Err(SlotError::InvalidArgument(format!(
                "Range start {} must be smaller than end {}",
                from, to
            )));
        }
        Self::create(symbol, scores, from..to)
    }

    /// Assign a single number
    pub fn single(symbol: Symbol, scores: ScoreTable, number: i32) -> SlotResult<Self> {
        Self::create(symbol, scores, [number])
    }

    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    pub fn numbers(&self) -> &[i32] {
        &self.numbers
    }

    pub fn scores(&self) -> &ScoreTable {
        &self.scores
    }

    pub fn covers(&self, number: i32) -> bool {
        self.numbers.contains(&number)
    }

    /// Score for a configured match length; an unconfigured key is an error
    pub fn score_for(&self, len: MatchLength) -> SlotResult<i64> {
        self.scores.get(&len).copied().ok_or_else(|| {
            SlotError::InvalidArgument(format!("{} has no score for {:?}", self.symbol, len))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_parse_is_case_insensitive() {
        assert_eq!("seven".parse::<Symbol>().unwrap(), Symbol::Seven);
        assert_eq!("Two_Bells".parse::<Symbol>().unwrap(), Symbol::TwoBells);
        assert_eq!("CHAR6".parse::<Symbol>().unwrap(), Symbol::Char6);
    }

    #[test]
    fn test_unknown_symbol_rejected() {
        let err = "LEMON".parse::<Symbol>().unwrap_err();
        assert!(matches!(err, SlotError::InvalidArgument(_)));

        let json = r#"{"symbol":"LEMON","numbers":[1],"scores":{}}"#;
        assert!(serde_json::from_str::<SymbolConfig>(json).is_err());
    }

    #[test]
    fn test_symbol_names_round_trip() {
        for sym in Symbol::ALL {
            assert_eq!(sym.as_str().parse::<Symbol>().unwrap(), sym);
        }
    }

    #[test]
    fn test_match_length_from_streak() {
        assert_eq!(MatchLength::from_streak(2), None);
        assert_eq!(MatchLength::from_streak(3), Some(MatchLength::Three));
        assert_eq!(MatchLength::from_streak(4), Some(MatchLength::Four));
        assert_eq!(MatchLength::from_streak(7), Some(MatchLength::Five));
    }

    #[test]
    fn test_create_requires_numbers() {
        let err = SymbolConfig::create(Symbol::Bar, pays(&[1]), Vec::new()).unwrap_err();
        assert!(matches!(err, SlotError::InvalidArgument(_)));
    }

    #[test]
    fn test_create_rejects_duplicates() {
        let err = SymbolConfig::create(Symbol::Bar, pays(&[1]), [1, 2, 2]).unwrap_err();
        assert!(matches!(err, SlotError::InvalidArgument(_)));
    }

    #[test]
    fn test_create_rejects_none() {
        assert!(SymbolConfig::single(Symbol::None, pays(&[1]), 1).is_err());
    }

    #[test]
    fn test_create_range_is_half_open() {
        let cfg = SymbolConfig::create_range(Symbol::Bell, 3, 11, pays(&[5])).unwrap();
        assert_eq!(cfg.numbers(), &[3, 4, 5, 6, 7, 8, 9, 10]);
        assert!(cfg.covers(10));
        assert!(!cfg.covers(11));
    }

    #[test]
    fn test_create_range_rejects_bad_bounds() {
        assert!(SymbolConfig::create_range(Symbol::Bell, 5, 5, pays(&[1])).is_err());
        assert!(SymbolConfig::create_range(Symbol::Bell, 10, 1, pays(&[1])).is_err());
    }

    #[test]
    fn test_score_lookup() {
        let cfg = SymbolConfig::single(Symbol::Seven, pays(&[100, 200]), 1).unwrap();
        assert_eq!(cfg.score_for(MatchLength::Three).unwrap(), 100);
        assert_eq!(cfg.score_for(MatchLength::Four).unwrap(), 200);
        assert!(matches!(
            cfg.score_for(MatchLength::Five),
            Err(SlotError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_config_json_shape() {
        let json = r#"{"symbol":"cherry","numbers":[26,27],"scores":{"THREE":80}}"#;
        let cfg: SymbolConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.symbol(), Symbol::Cherry);
        assert_eq!(cfg.score_for(MatchLength::Three).unwrap(), 80);

        let back = serde_json::to_value(&cfg).unwrap();
        assert_eq!(back["symbol"], "CHERRY");
        assert_eq!(back["scores"]["THREE"], 80);
    }

    #[test]
    fn test_config_json_rejects_duplicates() {
        let json = r#"{"symbol":"BAR","numbers":[1,1]}"#;
        assert!(serde_json::from_str::<SymbolConfig>(json).is_err());
    }
}
