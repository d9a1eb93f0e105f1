use crate::error::{MemError, MemResult};
use std::fmt;

//===========================================================================//

/// The number of address lines on a memory device.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct AddrWidth(u32);

impl AddrWidth {
    /// The narrowest supported address bus.
    pub const MIN_BITS: u32 = 2;

    /// The widest supported address bus.
    pub const MAX_BITS: u32 = 24;

    /// Returns the address width with the given number of bits, or a
    /// configuration error if it is outside `MIN_BITS..=MAX_BITS`.
    pub fn new(bits: u32) -> MemResult<AddrWidth> {
        if (AddrWidth::MIN_BITS..=AddrWidth::MAX_BITS).contains(&bits) {
            Ok(AddrWidth(bits))
        } else {
            Err(MemError::config(
                "addrWidth",
                format!(
                    "{bits} bits is not between {} and {}",
                    AddrWidth::MIN_BITS,
                    AddrWidth::MAX_BITS
                ),
            ))
        }
    }

    /// Returns the number of address bits.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Returns the number of addressable cells, `2^bits`.
    pub fn cells(self) -> u64 {
        1u64 << self.0
    }

    /// Returns the highest valid address.
    pub fn max_addr(self) -> u32 {
        ((1u64 << self.0) - 1) as u32
    }

    /// Returns the number of hex digits needed to print any address.
    pub fn hex_digits(self) -> usize {
        self.0.div_ceil(4) as usize
    }
}

impl Default for AddrWidth {
    fn default() -> AddrWidth {
        AddrWidth(8)
    }
}

impl fmt::Display for AddrWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit address", self.0)
    }
}

//===========================================================================//

/// The number of data lines on a memory device.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DataWidth(u32);

impl DataWidth {
    /// The narrowest supported data bus.
    pub const MIN_BITS: u32 = 1;

    /// The widest supported data bus.
    pub const MAX_BITS: u32 = 32;

    /// Returns the data width with the given number of bits, or a
    /// configuration error if it is outside `MIN_BITS..=MAX_BITS`.
    pub fn new(bits: u32) -> MemResult<DataWidth> {
        if (DataWidth::MIN_BITS..=DataWidth::MAX_BITS).contains(&bits) {
            Ok(DataWidth(bits))
        } else {
            Err(MemError::config(
                "dataWidth",
                format!(
                    "{bits} bits is not between {} and {}",
                    DataWidth::MIN_BITS,
                    DataWidth::MAX_BITS
                ),
            ))
        }
    }

    /// Returns the number of data bits.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Returns a mask with the low `bits` bits set.
    pub fn mask(self) -> u32 {
        u32::MAX >> (32 - self.0)
    }

    /// Returns the number of bytes needed to store one cell.
    pub fn bytes(self) -> usize {
        self.0.div_ceil(8) as usize
    }

    /// Returns the number of hex digits needed to print any cell value.
    pub fn hex_digits(self) -> usize {
        self.0.div_ceil(4) as usize
    }
}

impl Default for DataWidth {
    fn default() -> DataWidth {
        DataWidth(8)
    }
}

impl fmt::Display for DataWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit data", self.0)
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{AddrWidth, DataWidth};
    use crate::error::MemError;

    #[test]
    fn addr_width_bounds() {
        assert!(AddrWidth::new(1).is_err());
        assert!(AddrWidth::new(25).is_err());
        assert_eq!(AddrWidth::new(2).unwrap().cells(), 4);
        assert_eq!(AddrWidth::new(24).unwrap().cells(), 0x100_0000);
        assert_eq!(AddrWidth::new(24).unwrap().max_addr(), 0xff_ffff);
        match AddrWidth::new(0) {
            Err(MemError::Configuration { attr, .. }) => {
                assert_eq!(attr, "addrWidth")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn data_width_mask() {
        assert!(DataWidth::new(0).is_err());
        assert!(DataWidth::new(33).is_err());
        assert_eq!(DataWidth::new(1).unwrap().mask(), 0x1);
        assert_eq!(DataWidth::new(8).unwrap().mask(), 0xff);
        assert_eq!(DataWidth::new(12).unwrap().mask(), 0xfff);
        assert_eq!(DataWidth::new(32).unwrap().mask(), 0xffff_ffff);
    }

    #[test]
    fn digits_and_bytes() {
        assert_eq!(AddrWidth::new(10).unwrap().hex_digits(), 3);
        assert_eq!(DataWidth::new(8).unwrap().hex_digits(), 2);
        assert_eq!(DataWidth::new(9).unwrap().hex_digits(), 3);
        assert_eq!(DataWidth::new(9).unwrap().bytes(), 2);
        assert_eq!(DataWidth::new(32).unwrap().bytes(), 4);
    }
}

//===========================================================================//
