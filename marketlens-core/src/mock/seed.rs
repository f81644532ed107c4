//! Deterministic seeding from ZIP codes.
//!
//! Two independent generators live here and are intentionally not unified:
//! - [`Lcg`] drives the provider-shaped mock records, one stream per ZIP.
//! - [`seeded_random`] is a stateless sine hash used for single-field fillers,
//!   offset per field (`seed + 220`, `seed + 221`, ...) so fields do not move
//!   together.
//!
//! Both are pure functions of their inputs, so the same ZIP yields the same
//! values across runs, threads, and processes.

/// Polynomial string hash (`h = h * 31 + unit`) over UTF-16 code units with
/// 32-bit signed wraparound, then absolute value.
pub fn zip_to_seed(zip: &str) -> u32 {
    let hash = zip
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as i32));
    hash.unsigned_abs()
}

/// Stateless filler: `frac(sin(seed) * 10000)` scaled into `[min, max)`.
pub fn seeded_random(seed: f64, min: f64, max: f64) -> f64 {
    let x = seed.sin() * 10_000.0;
    min + (x - x.floor()) * (max - min)
}

/// Filler keyed by ZIP seed plus a per-field offset.
pub fn filler(seed: u32, offset: u32, min: f64, max: f64) -> f64 {
    seeded_random(seed as f64 + offset as f64, min, max)
}

const LCG_MULTIPLIER: u64 = 9301;
const LCG_INCREMENT: u64 = 49297;
const LCG_MODULUS: u64 = 233_280;

/// Linear congruential stream yielding values in `[0, 1)`.
///
/// The state space is the modulus, so distinct ZIPs can share a stream (the
/// 100,000 five-digit ZIPs land on about 55,500 streams). Provider-shaped
/// records for such ZIPs are identical; the fillers keep standard records apart.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Self { state: seed as u64 }
    }

    pub fn for_zip(zip: &str) -> Self {
        Self::new(zip_to_seed(zip))
    }

    pub fn next_f64(&mut self) -> f64 {
        self.state = (self.state * LCG_MULTIPLIER + LCG_INCREMENT) % LCG_MODULUS;
        self.state as f64 / LCG_MODULUS as f64
    }

    /// `base + next * span`.
    pub fn range(&mut self, base: f64, span: f64) -> f64 {
        base + self.next_f64() * span
    }

    /// `round(base + next * span)`.
    pub fn rounded(&mut self, base: f64, span: f64) -> f64 {
        self.range(base, span).round()
    }

    /// Picks one of `choices` using `floor(next * len)`.
    pub fn pick<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        let idx = (self.next_f64() * choices.len() as f64).floor() as usize;
        choices[idx.min(choices.len() - 1)]
    }
}
