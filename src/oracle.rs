//! Plaintext blood-type compatibility, used to check the secure computation.
//!
//! Encoding of a 3-bit blood type code:
//!
//! ```text
//!  bit2   bit1   bit0
//!  Rh     B      A
//! ```

use std::{fmt, str::FromStr};

use swanky_field_binary::F2;

use crate::{
    error::MpcError,
    sharing::{bit_decompose, f2_from_bool},
};

/// Bit width of a blood type code.
pub const INPUT_BITS: u32 = 3;

const NAMES: [&str; 8] = ["O-", "A-", "B-", "AB-", "O+", "A+", "B+", "AB+"];

// row = recipient, col = donor
const TRUTH_TABLE: [[u8; 8]; 8] = [
    // O- A- B- AB- O+ A+ B+ AB+
    [1, 0, 0, 0, 0, 0, 0, 0], // O-
    [1, 1, 0, 0, 0, 0, 0, 0], // A-
    [1, 0, 1, 0, 0, 0, 0, 0], // B-
    [1, 1, 1, 1, 0, 0, 0, 0], // AB-
    [1, 0, 0, 0, 1, 0, 0, 0], // O+
    [1, 1, 0, 0, 1, 1, 0, 0], // A+
    [1, 0, 1, 0, 1, 0, 1, 0], // B+
    [1, 1, 1, 1, 1, 1, 1, 1], // AB+
];

/// A validated 3-bit blood type code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BloodType(u8);

impl BloodType {
    pub const ALL: [BloodType; 8] = [
        BloodType(0),
        BloodType(1),
        BloodType(2),
        BloodType(3),
        BloodType(4),
        BloodType(5),
        BloodType(6),
        BloodType(7),
    ];

    pub fn new(code: u8) -> Result<Self, MpcError> {
        if u32::from(code) >= 1 << INPUT_BITS {
            return Err(MpcError::InputParse(format!(
                "blood type code {code} is outside of [0, 7]"
            )));
        }
        Ok(Self(code))
    }

    pub fn code(self) -> u8 {
        self.0
    }

    pub fn name(self) -> &'static str {
        NAMES[self.0 as usize]
    }

    /// The code as bits `[A, B, Rh]`.
    pub fn bits(self) -> [F2; INPUT_BITS as usize] {
        bit_decompose(u64::from(self.0))
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BloodType {
    type Err = MpcError;

    /// Accepts either the numeric code or the name, e.g. `5` or `A+`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u8>() {
            return BloodType::new(code);
        }
        NAMES
            .iter()
            .position(|name| name.eq_ignore_ascii_case(s))
            .map(|code| BloodType(code as u8))
            .ok_or_else(|| {
                MpcError::InputParse(format!(
                    "'{s}' is neither a code in [0, 7] nor one of {}",
                    NAMES.join(", ")
                ))
            })
    }
}

/// Table lookup: can `recipient` receive blood from `donor`.
pub fn lookup(recipient: BloodType, donor: BloodType) -> bool {
    TRUTH_TABLE[recipient.0 as usize][donor.0 as usize] == 1
}

/// The same predicate as a boolean formula: the donor may only carry an
/// antigen if the recipient carries it as well.
pub fn formula(recipient: BloodType, donor: BloodType) -> bool {
    let (x, y) = (recipient.0, donor.0);
    (0..INPUT_BITS).all(|i| {
        let xi = (x >> i) & 1;
        let yi = (y >> i) & 1;
        (1 ^ (yi & (1 ^ xi))) == 1
    })
}

/// Index form of [lookup] for the table dealer. Only defined on `[0, 8)`.
pub fn compatibility_bit(recipient: u64, donor: u64) -> F2 {
    f2_from_bool(TRUTH_TABLE[recipient as usize][donor as usize] == 1)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_formula_matches_table() {
        for x in BloodType::ALL {
            for y in BloodType::ALL {
                assert_eq!(formula(x, y), lookup(x, y), "mismatch at ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_scenarios() {
        let bt = |s: &str| s.parse::<BloodType>().unwrap();
        assert!(lookup(bt("O-"), bt("O-")));
        assert!(lookup(bt("AB+"), bt("AB+")));
        assert!(!lookup(bt("O-"), bt("AB+")));
        assert!(lookup(bt("O+"), bt("O-")));
        assert!(!lookup(bt("A-"), bt("O+")));
    }

    #[test]
    fn test_parse() {
        assert_eq!("7".parse::<BloodType>().unwrap().code(), 7);
        assert_eq!("ab+".parse::<BloodType>().unwrap().code(), 7);
        assert_eq!(" B- ".parse::<BloodType>().unwrap().code(), 2);
        assert!(matches!(
            "8".parse::<BloodType>(),
            Err(MpcError::InputParse(_))
        ));
        assert!(matches!(
            "abc".parse::<BloodType>(),
            Err(MpcError::InputParse(_))
        ));
        assert!("-1".parse::<BloodType>().is_err());
    }

    #[test]
    fn test_display() {
        let names = BloodType::ALL.iter().map(|b| b.to_string()).collect::<Vec<_>>();
        assert_eq!(names, NAMES);
    }
}
