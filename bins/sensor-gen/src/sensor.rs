use serde::Serialize;

// ═══════════════════════════════════════════════════════════════
//  Reading
// ═══════════════════════════════════════════════════════════════

/// Одно синтетическое показание сенсора.
#[derive(Debug, Serialize)]
pub struct Reading {
    pub sensor_id: &'static str,
    pub temperature: f64,
    pub humidity: f64,
    pub unit: &'static str,
    pub timestamp: f64,
}

impl Reading {
    /// Равномерные значения в реалистичных пределах: 18–28 °C,
    /// 40–70 %, одна десятичная.
    pub fn next(rng: &mut Rng) -> Self {
        Self {
            sensor_id: "temp_001",
            temperature: round1(18.0 + rng.next_f64() * 10.0),
            humidity: round1(40.0 + rng.next_f64() * 30.0),
            unit: "celsius",
            timestamp: unix_seconds(),
        }
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn unix_seconds() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

// ═══════════════════════════════════════════════════════════════
//  RNG (xorshift64)
// ═══════════════════════════════════════════════════════════════

pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: i64) -> Self {
        let state = if seed == 0 {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos() as u64
                | 1 // ensure non-zero
        } else {
            seed as u64
        };
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// Returns f64 in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / ((1u64 << 53) as f64)
    }
}
