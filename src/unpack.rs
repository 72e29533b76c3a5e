//! Sample unpacking and polarization demultiplexing.
use ndarray::{Array1, Array2, Array3};

use crate::{Error, Result};

/// Unpack 4-bit samples, low nibble first. Each nibble is recentered from
/// `0..=15` to `-8..=7`.
#[must_use]
pub fn unpack_4bit(raw: &[u8]) -> Vec<f32> {
    let mut out = Vec::with_capacity(raw.len() * 2);
    for b in raw {
        out.push(f32::from(b & 0x0f) - 8.0);
        out.push(f32::from((b & 0xf0) >> 4) - 8.0);
    }
    out
}

/// Unpack 8-bit samples; each byte is a signed sample.
#[must_use]
pub fn unpack_8bit(raw: &[u8]) -> Vec<f32> {
    raw.iter().map(|b| f32::from(*b as i8)).collect()
}

/// Number of samples per thread in a block of `block_size` bytes.
///
/// # Errors
/// [Error::UnsupportedBitDepth] if `bits_per_sample` is not 4 or 8.
pub fn samples_per_thread(block_size: usize, bits_per_sample: u32, npol: usize) -> Result<usize> {
    let samples = match bits_per_sample {
        4 => block_size * 2,
        8 => block_size,
        n => return Err(Error::UnsupportedBitDepth(i64::from(n))),
    };
    Ok(samples / npol)
}

/// Unpack a data block into an array of shape `(npol, samples)`, one row per thread.
///
/// For 4-bit data byte `k` of the block belongs to thread `k % npol`. For 8-bit data
/// thread `p` is the `p`th contiguous chunk of the block.
///
/// # Errors
/// [Error::UnsupportedBitDepth] if `bits_per_sample` is not 4 or 8, or [Error::Shape]
/// if the block cannot be evenly split into `npol` threads.
pub fn unpack(raw: &[u8], bits_per_sample: u32, npol: usize) -> Result<Array2<f32>> {
    let flat = match bits_per_sample {
        4 => {
            let samples = Array3::from_shape_vec((raw.len() / npol, npol, 2), unpack_4bit(raw))?;
            // thread becomes the leading axis
            samples
                .permuted_axes([1, 0, 2])
                .as_standard_layout()
                .iter()
                .copied()
                .collect::<Array1<f32>>()
        }
        8 => Array1::from_vec(unpack_8bit(raw)),
        n => return Err(Error::UnsupportedBitDepth(i64::from(n))),
    };
    let per_thread = flat.len() / npol;
    Ok(flat.into_shape_with_order((npol, per_thread))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use test_case::test_case;

    #[test]
    fn nibbles_low_first() {
        assert_eq!(unpack_4bit(&[0xab]), vec![3.0, 2.0]);
        assert_eq!(unpack_4bit(&[0x00, 0xff]), vec![-8.0, -8.0, 7.0, 7.0]);
        assert_eq!(unpack_4bit(&[0x88]), vec![0.0, 0.0]);
    }

    #[test_case(0x7f, 127.0)]
    #[test_case(0x80, -128.0)]
    #[test_case(0xff, -1.0)]
    #[test_case(0x00, 0.0)]
    fn signed_bytes(b: u8, expected: f32) {
        assert_eq!(unpack_8bit(&[b]), vec![expected]);
    }

    #[test]
    fn four_bit_single_thread() {
        let dat = unpack(&[0xab, 0x9f], 4, 1).unwrap();

        assert_eq!(dat, array![[3.0, 2.0, 7.0, 1.0]]);
    }

    #[test]
    fn four_bit_dual_thread_alternates_bytes() {
        let dat = unpack(&[0xab, 0x9f, 0x08, 0x80], 4, 2).unwrap();

        assert_eq!(dat.shape(), &[2, 4]);
        assert_eq!(dat.row(0), array![3.0, 2.0, 0.0, -8.0]);
        assert_eq!(dat.row(1), array![7.0, 1.0, -8.0, 0.0]);
    }

    #[test]
    fn eight_bit_dual_thread_splits_halves() {
        let dat = unpack(&[0x01, 0x02, 0xff, 0xfe], 8, 2).unwrap();

        assert_eq!(dat, array![[1.0, 2.0], [-1.0, -2.0]]);
    }

    #[test_case(0)]
    #[test_case(2)]
    #[test_case(16)]
    fn unsupported_depth(bits: u32) {
        assert!(matches!(
            unpack(&[0u8; 4], bits, 1),
            Err(Error::UnsupportedBitDepth(n)) if n == i64::from(bits)
        ));
        assert!(samples_per_thread(4, bits, 1).is_err());
    }

    #[test]
    fn uneven_block() {
        assert!(matches!(unpack(&[0u8; 3], 4, 2), Err(Error::Shape(_))));
        assert!(matches!(unpack(&[0u8; 3], 8, 2), Err(Error::Shape(_))));
    }

    #[test_case(1024, 4, 2, 1024)]
    #[test_case(1024, 4, 1, 2048)]
    #[test_case(1024, 8, 1, 1024)]
    #[test_case(1024, 8, 2, 512)]
    fn samples(block_size: usize, bits: u32, npol: usize, expected: usize) {
        assert_eq!(samples_per_thread(block_size, bits, npol).unwrap(), expected);
    }
}
