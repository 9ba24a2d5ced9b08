pub trait NumExt {
    /// Returns the base 2 logarithm of the number, rounding up to the next integer.
    fn ilog2_ceil(self) -> Self;
}

impl NumExt for usize {
    #[inline]
    fn ilog2_ceil(self) -> Self {
        match self {
            0 | 1 => 0,
            n => (Self::BITS - (n - 1).leading_zeros()) as Self,
        }
    }
}

/// Returns the name of the group at `index`: `A`, `B`, ..., `Z`, `AA`, `AB`, ...
pub fn group_name(index: usize) -> String {
    let mut name = Vec::new();
    let mut n = index + 1;

    while n > 0 {
        let rem = (n - 1) % 26;
        name.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }

    name.reverse();
    // Only ASCII uppercase letters are ever pushed.
    String::from_utf8(name).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{group_name, NumExt};

    #[test]
    fn test_ilog2_ceil() {
        assert_eq!(0_usize.ilog2_ceil(), 0);
        assert_eq!(1_usize.ilog2_ceil(), 0);

        for exp in 1..12 {
            let power = 1_usize << exp;
            assert_eq!(power.ilog2_ceil(), exp);
            assert_eq!((power - 1).ilog2_ceil(), if exp == 1 { 0 } else { exp });
            assert_eq!((power + 1).ilog2_ceil(), exp + 1);
        }
    }

    #[test]
    fn test_group_name() {
        assert_eq!(group_name(0), "A");
        assert_eq!(group_name(1), "B");
        assert_eq!(group_name(25), "Z");
        assert_eq!(group_name(26), "AA");
        assert_eq!(group_name(27), "AB");
    }
}
