//! One-time PIN generation.
//!
//! The PIN binds the scanning wallet to the requester: it is embedded in the
//! issuance request and shown to the user out of band.

use crate::constants::MAX_PIN_LENGTH;
use crate::error::{IssuerError, Result};
use rand::Rng;

/// Generate a numeric PIN of exactly `length` digits.
///
/// The value is drawn uniformly from `[10^(length-1), 10^length - 1]`, so
/// the PIN never starts with `0`.
///
/// # Errors
///
/// Returns [`IssuerError::InvalidPinLength`] if `length` is `0` or larger
/// than 19.
///
/// # Examples
///
/// ```
/// use rand::rngs::mock::StepRng;
/// # use vc_issuer::pin::generate_pin;
/// let pin = generate_pin(4, &mut StepRng::new(0, 0)).unwrap();
/// assert_eq!(pin, "1000");
/// ```
pub fn generate_pin<R: Rng + ?Sized>(length: u8, rng: &mut R) -> Result<String> {
    if length == 0 || length > MAX_PIN_LENGTH {
        return Err(IssuerError::InvalidPinLength(length));
    }

    // 10^19 - 1 still fits in a u64.
    let low = 10_u64.pow(u32::from(length) - 1);
    let high = 10_u64.pow(u32::from(length)) - 1;

    Ok(rng.gen_range(low..=high).to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand::rngs::mock::StepRng;

    #[test]
    fn test_zero_source_yields_lowest_pin() {
        let mut rng = StepRng::new(0, 0);

        assert_eq!(generate_pin(1, &mut rng).unwrap(), "1");
        assert_eq!(generate_pin(4, &mut rng).unwrap(), "1000");
        assert_eq!(generate_pin(6, &mut rng).unwrap(), "100000");
    }

    #[test]
    fn test_pin_has_exact_length_and_no_leading_zero() {
        let mut rng = StdRng::seed_from_u64(7);

        for length in 1..=MAX_PIN_LENGTH {
            for _ in 0..200 {
                let pin = generate_pin(length, &mut rng).unwrap();
                assert_eq!(pin.len(), usize::from(length), "pin {pin}");
                assert!(!pin.starts_with('0'), "pin {pin}");
                assert!(pin.chars().all(|c| c.is_ascii_digit()));
            }
        }
    }

    #[test]
    fn test_four_digit_pins_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..1_000 {
            let value: u32 = generate_pin(4, &mut rng).unwrap().parse().unwrap();
            assert!((1000..=9999).contains(&value));
        }
    }

    #[test]
    fn test_same_seed_reproduces_pin() {
        let first = generate_pin(6, &mut StdRng::seed_from_u64(99)).unwrap();
        let second = generate_pin(6, &mut StdRng::seed_from_u64(99)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_lengths_rejected() {
        let mut rng = StepRng::new(0, 0);

        assert_eq!(
            generate_pin(0, &mut rng),
            Err(IssuerError::InvalidPinLength(0))
        );
        assert_eq!(
            generate_pin(20, &mut rng),
            Err(IssuerError::InvalidPinLength(20))
        );
    }
}
