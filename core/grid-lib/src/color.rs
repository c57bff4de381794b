use rand::Rng;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// 珠子顏色；實際使用的調色盤由設定決定
#[derive(
    Debug,
    Deserialize,
    Serialize,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
}

impl Color {
    /// ASCII 棋盤用的單字元符號
    pub fn symbol(&self) -> char {
        match self {
            Self::Red => 'R',
            Self::Blue => 'B',
            Self::Green => 'G',
            Self::Yellow => 'Y',
            Self::Purple => 'P',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol.to_ascii_uppercase() {
            'R' => Some(Self::Red),
            'B' => Some(Self::Blue),
            'G' => Some(Self::Green),
            'Y' => Some(Self::Yellow),
            'P' => Some(Self::Purple),
            _ => None,
        }
    }
}

/// 從調色盤均勻抽一個顏色，呼叫端需保證調色盤非空
pub fn random_color<R: Rng + ?Sized>(palette: &[Color], rng: &mut R) -> Color {
    palette[rng.random_range(0..palette.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_symbol_round_trip() {
        for color in Color::iter() {
            assert_eq!(Color::from_symbol(color.symbol()), Some(color));
        }
        assert_eq!(Color::from_symbol('r'), Some(Color::Red));
        assert_eq!(Color::from_symbol('x'), None);
    }

    #[test]
    fn test_names() {
        assert_eq!(Color::Purple.to_string(), "purple");
        assert_eq!(Color::from_str("yellow").unwrap(), Color::Yellow);
        let json = serde_json::to_string(&Color::Green).unwrap();
        assert_eq!(json, "\"green\"");
    }

    #[test]
    fn test_random_color_stays_in_palette() {
        let mut rng = StdRng::seed_from_u64(7);
        let palette = [Color::Red, Color::Blue];
        for _ in 0..100 {
            assert!(palette.contains(&random_color(&palette, &mut rng)));
        }
    }
}
