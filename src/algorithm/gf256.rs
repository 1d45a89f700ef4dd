//! Arithmetic over GF(2^8).
//!
//! Elements are bytes reduced modulo the primitive polynomial
//! `x^8 + x^4 + x^3 + x^2 + 1` (`0x11d`), whose generator is `2`. Every
//! shard ever written depends on this choice, so it must never change.

use once_cell::sync::Lazy;

use crate::error::{ErasureError, Result};

/// The reduction polynomial, including the x^8 term.
pub const POLYNOMIAL: u16 = 0x11d;

/// Number of non-zero field elements.
pub const ORDER: usize = 255;

static TABLES: Lazy<Gf256> = Lazy::new(Gf256::new);

#[derive(Debug, Clone)]
pub struct Gf256 {
    /// `exp[i] = 2^i`, doubled in length so `log a + log b` never needs a modulo.
    exp: [u8; 2 * ORDER],
    /// `log[x]` for `x != 0`. `log[0]` is unused.
    log: [u8; 256],
}

impl Gf256 {
    fn new() -> Self {
        let mut exp = [0u8; 2 * ORDER];
        let mut log = [0u8; 256];
        let mut x: u16 = 1;

        for i in 0..ORDER {
            exp[i] = x as u8;
            log[x as usize] = i as u8;
            x <<= 1;
            if x & 0x100 != 0 {
                x ^= POLYNOMIAL;
            }
        }
        for i in ORDER..2 * ORDER {
            exp[i] = exp[i - ORDER];
        }
        Gf256 { exp, log }
    }

    /// Process-wide tables, built on first use.
    #[inline]
    pub fn global() -> &'static Gf256 {
        &TABLES
    }

    #[inline]
    pub fn add(a: u8, b: u8) -> u8 {
        a ^ b
    }

    #[inline]
    pub fn mul(&self, a: u8, b: u8) -> u8 {
        if a == 0 || b == 0 {
            0
        } else {
            let la = self.log[a as usize] as usize;
            let lb = self.log[b as usize] as usize;
            self.exp[la + lb]
        }
    }

    #[inline]
    pub fn inv(&self, a: u8) -> Result<u8> {
        if a == 0 {
            return Err(ErasureError::InverseOfZero);
        }
        Ok(self.exp[ORDER - self.log[a as usize] as usize])
    }

    #[inline]
    pub fn div(&self, a: u8, b: u8) -> Result<u8> {
        Ok(self.mul(a, self.inv(b)?))
    }

    /// `2^power`, wrapping the exponent modulo the multiplicative order.
    #[inline]
    pub fn exp(&self, power: usize) -> u8 {
        self.exp[power % ORDER]
    }

    /// `a^power` by repeated multiplication in the log domain.
    pub fn pow(&self, a: u8, power: usize) -> u8 {
        if power == 0 {
            return 1;
        }
        if a == 0 {
            return 0;
        }
        let l = self.log[a as usize] as usize;
        self.exp[(l * power) % ORDER]
    }

    /// Products of `factor` with every byte value.
    pub fn mul_table(&self, factor: u8) -> [u8; 256] {
        let mut table = [0u8; 256];
        if factor == 0 {
            return table;
        }
        let log_factor = self.log[factor as usize] as usize;
        for i in 1..256 {
            table[i] = self.exp[self.log[i] as usize + log_factor];
        }
        table
    }

    /// `output[i] ^= coef * input[i]` over the common prefix of both slices.
    pub fn mul_slice_xor(&self, coef: u8, input: &[u8], output: &mut [u8]) {
        match coef {
            0 => {}
            1 => {
                for (out_byte, &in_byte) in output.iter_mut().zip(input) {
                    *out_byte ^= in_byte;
                }
            }
            _ => {
                let table = self.mul_table(coef);
                for (out_byte, &in_byte) in output.iter_mut().zip(input) {
                    *out_byte ^= table[in_byte as usize];
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Shift-and-add multiplication, independent of the tables.
    fn slow_mul(mut a: u8, mut b: u8) -> u8 {
        let mut acc = 0u8;
        while b != 0 {
            if b & 1 != 0 {
                acc ^= a;
            }
            let carry = a & 0x80 != 0;
            a <<= 1;
            if carry {
                a ^= (POLYNOMIAL & 0xff) as u8;
            }
            b >>= 1;
        }
        acc
    }

    #[test]
    fn test_mul_matches_shift_and_add() {
        let gf = Gf256::global();
        for a in 0..=255u8 {
            for b in 0..=255u8 {
                assert_eq!(gf.mul(a, b), slow_mul(a, b), "{a} * {b}");
            }
        }
    }

    #[test]
    fn test_every_nonzero_element_has_inverse() {
        let gf = Gf256::global();
        for a in 1..=255u8 {
            let inv = gf.inv(a).unwrap();
            assert_eq!(gf.mul(a, inv), 1, "a = {a}");
        }
    }

    #[test]
    fn test_inverse_of_zero_is_error() {
        assert!(matches!(
            Gf256::global().inv(0),
            Err(ErasureError::InverseOfZero)
        ));
        assert!(Gf256::global().div(7, 0).is_err());
    }

    #[test]
    fn test_generator_cycles_through_all_nonzero_elements() {
        let gf = Gf256::global();
        let mut seen = [false; 256];
        for i in 0..ORDER {
            let x = gf.exp(i);
            assert_ne!(x, 0);
            assert!(!seen[x as usize], "2^{i} repeats");
            seen[x as usize] = true;
        }
        assert_eq!(gf.exp(ORDER), 1);
    }

    #[test]
    fn test_add_is_xor_and_self_inverse() {
        assert_eq!(Gf256::add(0x53, 0xca), 0x99);
        assert_eq!(Gf256::add(0x53, 0x53), 0);
    }

    #[test]
    fn test_pow() {
        let gf = Gf256::global();
        assert_eq!(gf.pow(0, 0), 1);
        assert_eq!(gf.pow(0, 3), 0);
        assert_eq!(gf.pow(3, 1), 3);
        assert_eq!(gf.pow(3, 2), gf.mul(3, 3));
        assert_eq!(gf.pow(2, 8), gf.exp(8));
    }

    #[test]
    fn test_mul_slice_xor_short_cuts() {
        let gf = Gf256::global();
        let input = [1u8, 2, 3, 250];

        let mut out = [9u8; 4];
        gf.mul_slice_xor(0, &input, &mut out);
        assert_eq!(out, [9u8; 4]);

        let mut out = [0u8; 4];
        gf.mul_slice_xor(1, &input, &mut out);
        assert_eq!(out, input);

        let mut out = [0u8; 4];
        gf.mul_slice_xor(0x1d, &input, &mut out);
        for (o, i) in out.iter().zip(input.iter()) {
            assert_eq!(*o, gf.mul(0x1d, *i));
        }
    }
}
