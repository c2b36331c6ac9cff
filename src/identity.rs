use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// The fixed avatar palette. Two clients may pick different colors for the
/// same remote user; that disagreement is cosmetic and accepted.
pub const PALETTE: [&str; 6] = [
    "#4F46E5", "#059669", "#B45309", "#7C3AED", "#BE185D", "#1D4ED8",
];

/// Derive the 1–2 character avatar initials for a display name. Total over
/// all strings: blank input yields `"?"`.
pub fn initials(name: &str) -> String {
    let joined: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .collect();
    let upper: String = joined.to_uppercase().chars().take(2).collect();
    if upper.is_empty() {
        "?".into()
    } else {
        upper
    }
}

/// Uniform color picker over [`PALETTE`]. Seedable so tests can pin the
/// assignment sequence.
pub struct Palette {
    rng: StdRng,
}

impl Palette {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn pick(&mut self) -> String {
        PALETTE[self.rng.gen_range(0..PALETTE.len())].to_string()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}
