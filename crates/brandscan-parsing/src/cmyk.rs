use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    #[error("malformed color descriptor {descriptor:?}: {reason}")]
    MalformedColorDescriptor { descriptor: String, reason: String },
}

impl ColorError {
    fn malformed(descriptor: &str, reason: impl Into<String>) -> Self {
        ColorError::MalformedColorDescriptor {
            descriptor: descriptor.to_string(),
            reason: reason.into(),
        }
    }
}

/// CMYK percentages, each in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cmyk {
    pub c: u8,
    pub m: u8,
    pub y: u8,
    pub k: u8,
}

impl Cmyk {
    /// Parse the four integers in a descriptor, in C, M, Y, K order.
    ///
    /// Anything between the numbers is ignored, so `CMYK(10,20,30,40)`,
    /// `C:10 M:20 Y:30 K:40` and `10 / 20 / 30 / 40` all parse the same.
    pub fn parse(descriptor: &str) -> Result<Self, ColorError> {
        static INT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

        let raw: Vec<&str> = INT_RE.find_iter(descriptor).map(|m| m.as_str()).collect();
        if raw.len() != 4 {
            return Err(ColorError::malformed(
                descriptor,
                format!("expected 4 values, found {}", raw.len()),
            ));
        }

        let mut values = [0u8; 4];
        for (slot, digits) in values.iter_mut().zip(&raw) {
            let value: u32 = digits
                .parse()
                .map_err(|_| ColorError::malformed(descriptor, format!("{digits} is too large")))?;
            if value > 100 {
                return Err(ColorError::malformed(
                    descriptor,
                    format!("{value} is outside 0..=100"),
                ));
            }
            *slot = value as u8;
        }

        let [c, m, y, k] = values;
        Ok(Self { c, m, y, k })
    }

    /// Naive conversion: `R = 255 × (1 − C) × (1 − K)`, likewise for G and B.
    /// Channels are truncated toward zero.
    pub fn to_rgb(self) -> [u8; 3] {
        let k = 100 - u32::from(self.k);
        let channel = |ink: u8| (255 * (100 - u32::from(ink)) * k / 10_000) as u8;
        [channel(self.c), channel(self.m), channel(self.y)]
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(self) -> String {
        let [r, g, b] = self.to_rgb();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

/// Convert a CMYK descriptor to lowercase `#rrggbb`.
pub fn cmyk_to_hex(descriptor: &str) -> Result<String, ColorError> {
    Cmyk::parse(descriptor).map(Cmyk::to_hex)
}
