// Tue Jan 13 2026 - Alex

use crate::layout::LayoutError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct Alignment {
    value: usize,
}

impl Alignment {
    pub fn new(value: usize) -> Result<Self, LayoutError> {
        if value > 0 && value.is_power_of_two() {
            Ok(Self { value })
        } else {
            Err(LayoutError::InvalidAnnotation {
                text: format!("align={}", value),
                reason: "align must be a power of 2".to_string(),
            })
        }
    }

    pub fn as_usize(&self) -> usize {
        self.value
    }

    /// Extra bytes an allocation needs so an aligned window always fits.
    pub fn slack(&self) -> usize {
        self.value - 1
    }

    pub fn align(&self, offset: usize) -> usize {
        (offset + self.value - 1) & !(self.value - 1)
    }
}

impl TryFrom<usize> for Alignment {
    type Error = LayoutError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Alignment> for usize {
    fn from(alignment: Alignment) -> Self {
        alignment.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_of_two_only() {
        assert!(Alignment::new(512).is_ok());
        assert!(Alignment::new(1).is_ok());
        assert!(Alignment::new(0).is_err());
        assert!(Alignment::new(100).is_err());
    }

    #[test]
    fn test_align_rounds_up() {
        let alignment = Alignment::new(512).unwrap();
        assert_eq!(alignment.align(0), 0);
        assert_eq!(alignment.align(1), 512);
        assert_eq!(alignment.align(512), 512);
        assert_eq!(alignment.slack(), 511);
    }
}
