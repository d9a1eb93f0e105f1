use super::{ImageRecord, ImageSnapshot};
use crate::error::{ImageLoc, ParseError};
use crate::mem::{AddrWidth, DataWidth, PAGE_BITS};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io;

//===========================================================================//

/// Parses a raw binary image: consecutive cells starting at address zero,
/// each stored big-endian in as many bytes as the data width requires.
/// Runs of zero cells are not turned into records.
pub(crate) fn parse_binary(
    bytes: &[u8],
    addr_width: AddrWidth,
    data_width: DataWidth,
) -> Result<Vec<ImageRecord>, ParseError> {
    let word_len = data_width.bytes();
    let words = (bytes.len() / word_len) as u64;
    if words > addr_width.cells() {
        let offset = addr_width.cells() * word_len as u64;
        let message = format!(
            "image holds {words} cells, but memory only has {}",
            addr_width.cells()
        );
        return Err(ParseError { location: ImageLoc::Offset(offset), message });
    }
    let remainder = bytes.len() % word_len;
    if remainder != 0 {
        let offset = (bytes.len() - remainder) as u64;
        let message =
            format!("truncated {word_len}-byte cell at end of image");
        return Err(ParseError { location: ImageLoc::Offset(offset), message });
    }
    let mut records = Vec::new();
    let chunk_bytes = word_len << PAGE_BITS;
    for (index, chunk) in bytes.chunks(chunk_bytes).enumerate() {
        let mut reader = io::Cursor::new(chunk);
        let mut values = Vec::with_capacity(chunk.len() / word_len);
        while let Ok(value) = reader.read_uint::<BigEndian>(word_len) {
            values.push(value as u32);
        }
        if values.iter().any(|&value| value != 0) {
            let start = (index << PAGE_BITS) as u32;
            records.push(ImageRecord::Data { start, values });
        }
    }
    Ok(records)
}

//===========================================================================//

/// Writes a raw binary image of the snapshot, stopping after the last
/// non-zero cell.
pub(crate) fn write_binary<W: io::Write>(
    writer: &mut W,
    snapshot: &ImageSnapshot,
) -> io::Result<()> {
    let word_len = snapshot.data_width.bytes();
    let mut next_addr: u64 = 0;
    for (base, cells) in &snapshot.pages {
        let len = match cells.iter().rposition(|&cell| cell != 0) {
            Some(last) => last + 1,
            None => continue,
        };
        while next_addr < u64::from(*base) {
            writer.write_uint::<BigEndian>(0, word_len)?;
            next_addr += 1;
        }
        for &value in &cells[..len] {
            writer.write_uint::<BigEndian>(u64::from(value), word_len)?;
        }
        next_addr += len as u64;
    }
    Ok(())
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{parse_binary, write_binary};
    use crate::error::ImageLoc;
    use crate::image::{ImageRecord, ImageSnapshot};
    use crate::mem::{AddrWidth, DataWidth, PagedStore};

    fn widths(addr_bits: u32, data_bits: u32) -> (AddrWidth, DataWidth) {
        let addr_width = AddrWidth::new(addr_bits).unwrap();
        (addr_width, DataWidth::new(data_bits).unwrap())
    }

    #[test]
    fn parse_multi_byte_cells() {
        let (addr_width, data_width) = widths(4, 12);
        let bytes = [0x01, 0x23, 0x00, 0x00, 0x0a, 0xbc];
        let records = parse_binary(&bytes, addr_width, data_width).unwrap();
        assert_eq!(
            records,
            vec![ImageRecord::Data { start: 0, values: vec![0x123, 0, 0xabc] }]
        );
    }

    #[test]
    fn all_zero_image_has_no_records() {
        let (addr_width, data_width) = widths(8, 8);
        let records = parse_binary(&[0; 256], addr_width, data_width);
        assert_eq!(records.unwrap(), vec![]);
    }

    #[test]
    fn truncated_cell() {
        let (addr_width, data_width) = widths(8, 16);
        let bytes = [0x12, 0x34, 0x56];
        let error = parse_binary(&bytes, addr_width, data_width).unwrap_err();
        assert_eq!(error.location, ImageLoc::Offset(2));
    }

    #[test]
    fn image_larger_than_memory() {
        let (addr_width, data_width) = widths(2, 8);
        let bytes = [1, 2, 3, 4, 5];
        let error = parse_binary(&bytes, addr_width, data_width).unwrap_err();
        assert_eq!(error.location, ImageLoc::Offset(4));
        assert_eq!(
            error.message,
            "image holds 5 cells, but memory only has 4"
        );
    }

    #[test]
    fn write_fills_gaps_and_trims_tail() {
        let (addr_width, data_width) = widths(16, 9);
        let mut store = PagedStore::new(addr_width, data_width);
        store.set(0x0001, 0x1ff).unwrap();
        store.set(0x1002, 0x001).unwrap();
        let mut output = Vec::<u8>::new();
        write_binary(&mut output, &ImageSnapshot::of(&store)).unwrap();
        assert_eq!(output.len(), 0x1003 * 2);
        assert_eq!(&output[..4], &[0x00, 0x00, 0x01, 0xff]);
        assert!(output[4..0x2004].iter().all(|&byte| byte == 0));
        assert_eq!(&output[0x2004..], &[0x00, 0x01]);
    }
}

//===========================================================================//
