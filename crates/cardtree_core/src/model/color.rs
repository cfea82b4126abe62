//! Color cascade for cards.
//!
//! # Responsibility
//! - Give each root card a hue from its position among roots.
//! - Derive every descendant color by darkening its parent's color.
//!
//! # Invariants
//! - A card color is a pure function of its root index and depth.
//! - Each level is darker than its parent until `min_lightness` is reached.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static HSL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^hsl\(\s*(-?\d+(?:\.\d+)?)\s*,\s*(\d+(?:\.\d+)?)%\s*,\s*(\d+(?:\.\d+)?)%\s*\)$")
        .expect("static hsl pattern is valid")
});

/// Fixed parameters of the cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub base_hue: f64,
    pub hue_step: f64,
    pub saturation: f64,
    pub base_lightness: f64,
    pub lightness_step: f64,
    pub min_lightness: f64,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            base_hue: 210.0,
            hue_step: 47.0,
            saturation: 65.0,
            base_lightness: 88.0,
            lightness_step: 8.0,
            min_lightness: 20.0,
        }
    }
}

/// One HSL color. Renders as a CSS `hsl(h, s%, l%)` string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardColor {
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
}

impl Display for CardColor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "hsl({}, {}%, {}%)",
            self.hue, self.saturation, self.lightness
        )
    }
}

/// Error returned when a string is not an `hsl(...)` color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseColorError(pub String);

impl Display for ParseColorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "not an hsl color: `{}`", self.0)
    }
}

impl std::error::Error for ParseColorError {}

impl FromStr for CardColor {
    type Err = ParseColorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let captures = HSL_PATTERN
            .captures(value.trim())
            .ok_or_else(|| ParseColorError(value.to_string()))?;
        let number = |index: usize| -> Result<f64, ParseColorError> {
            captures[index]
                .parse::<f64>()
                .map_err(|_| ParseColorError(value.to_string()))
        };
        Ok(Self {
            hue: number(1)?,
            saturation: number(2)?,
            lightness: number(3)?,
        })
    }
}

/// Color of the root at `root_index` in root order.
pub fn root_color(palette: &Palette, root_index: usize) -> CardColor {
    CardColor {
        hue: (palette.base_hue + root_index as f64 * palette.hue_step).rem_euclid(360.0),
        saturation: palette.saturation,
        lightness: palette.base_lightness,
    }
}

/// Color of a direct child of a card colored `parent`.
pub fn child_color(palette: &Palette, parent: CardColor) -> CardColor {
    CardColor {
        lightness: (parent.lightness - palette.lightness_step).max(palette.min_lightness),
        ..parent
    }
}

/// Color of a card `depth` levels below the root at `root_index`.
pub fn cascade_color(palette: &Palette, root_index: usize, depth: usize) -> CardColor {
    match depth {
        0 => root_color(palette, root_index),
        _ => child_color(palette, cascade_color(palette, root_index, depth - 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::{cascade_color, child_color, root_color, CardColor, Palette};

    #[test]
    fn roots_step_through_hues() {
        let palette = Palette::default();
        assert_eq!(root_color(&palette, 0).hue, palette.base_hue);
        assert_eq!(
            root_color(&palette, 1).hue,
            palette.base_hue + palette.hue_step
        );
    }

    #[test]
    fn hue_wraps_at_full_circle() {
        let palette = Palette::default();
        let hue = root_color(&palette, 10).hue;
        assert!((0.0..360.0).contains(&hue));
    }

    #[test]
    fn children_darken_until_floor() {
        let palette = Palette::default();
        let root = root_color(&palette, 0);
        let child = child_color(&palette, root);
        assert!(child.lightness < root.lightness);
        assert_eq!(child.hue, root.hue);

        let deep = cascade_color(&palette, 0, 50);
        assert_eq!(deep.lightness, palette.min_lightness);
    }

    #[test]
    fn display_round_trips_through_parse() {
        let color = cascade_color(&Palette::default(), 2, 1);
        let parsed: CardColor = color.to_string().parse().unwrap();
        assert_eq!(parsed, color);
    }

    #[test]
    fn parse_rejects_other_formats() {
        assert!("#ff0000".parse::<CardColor>().is_err());
        assert!("hsl(10, 20, 30)".parse::<CardColor>().is_err());
    }
}
