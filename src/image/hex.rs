use super::lex::{Token, TokenLexer, TokenValue};
use super::{ImageRecord, ImageSnapshot};
use crate::error::ParseError;
use crate::mem::AddrWidth;
use std::io;

//===========================================================================//

/// The header line that opens every saved hex-text image.
pub(crate) const HEADER: &str = "v2.0 raw";

/// The number of cells written on each line of a saved image.
const CELLS_PER_LINE: usize = 16;

//===========================================================================//

/// Parses a hex-text image into the records it describes.  Every address is
/// checked against `addr_width`; values are left unmasked.
pub(crate) fn parse_hex(
    source: &str,
    addr_width: AddrWidth,
) -> Result<Vec<ImageRecord>, ParseError> {
    let mut parser = HexParser::new(addr_width);
    let mut line: Vec<Token> = Vec::new();
    for token in TokenLexer::new(source) {
        let token = token?;
        if token.value == TokenValue::Linebreak {
            parser.parse_line(&line)?;
            line.clear();
        } else {
            line.push(token);
        }
    }
    parser.parse_line(&line)?;
    Ok(parser.records)
}

struct HexParser {
    cells: u64,
    cursor: u64,
    records: Vec<ImageRecord>,
}

impl HexParser {
    fn new(addr_width: AddrWidth) -> HexParser {
        HexParser { cells: addr_width.cells(), cursor: 0, records: Vec::new() }
    }

    fn parse_line(&mut self, tokens: &[Token]) -> Result<(), ParseError> {
        let mut tokens = tokens;
        match tokens {
            [] => return Ok(()),
            [Token { value: TokenValue::Header, .. }] => return Ok(()),
            [Token { value: TokenValue::Org, line }, rest @ ..] => {
                match rest {
                    [addr] => {
                        self.cursor = self.parse_addr(addr)?;
                        return Ok(());
                    }
                    _ => {
                        let message =
                            ".org expects exactly one address".to_string();
                        return Err(ParseError::at_line(*line, message));
                    }
                }
            }
            [addr, Token { value: TokenValue::Colon, .. }, rest @ ..] => {
                self.cursor = self.parse_addr(addr)?;
                tokens = rest;
            }
            _ => {}
        }
        while let Some((first, rest)) = tokens.split_first() {
            match rest {
                [star, value, rest @ ..]
                    if matches!(star.value, TokenValue::Star) =>
                {
                    let count = parse_count(first)?;
                    let value = parse_value(value)?;
                    self.push_fill(star.line, count, value)?;
                    tokens = rest;
                }
                _ => {
                    let value = parse_value(first)?;
                    self.push_value(first.line, value)?;
                    tokens = rest;
                }
            }
        }
        Ok(())
    }

    fn parse_addr(&self, token: &Token) -> Result<u64, ParseError> {
        let addr = parse_literal(token, 16, "address")?;
        if addr >= self.cells {
            let message = format!(
                "address {addr:x} is past the end of a {}-cell memory",
                self.cells
            );
            return Err(ParseError::at_line(token.line, message));
        }
        Ok(addr)
    }

    fn check_room(&self, line: u32, count: u64) -> Result<(), ParseError> {
        if self.cursor.checked_add(count).is_none_or(|end| end > self.cells) {
            let message = format!(
                "data runs past the end of a {}-cell memory",
                self.cells
            );
            return Err(ParseError::at_line(line, message));
        }
        Ok(())
    }

    fn push_value(&mut self, line: u32, value: u32) -> Result<(), ParseError> {
        self.check_room(line, 1)?;
        let cursor = self.cursor;
        match self.records.last_mut() {
            Some(ImageRecord::Data { start, values })
                if u64::from(*start) + values.len() as u64 == cursor =>
            {
                values.push(value);
            }
            _ => self.records.push(ImageRecord::Data {
                start: cursor as u32,
                values: vec![value],
            }),
        }
        self.cursor += 1;
        Ok(())
    }

    fn push_fill(
        &mut self,
        line: u32,
        len: u64,
        value: u32,
    ) -> Result<(), ParseError> {
        self.check_room(line, len)?;
        if len > 0 {
            let start = self.cursor as u32;
            self.records.push(ImageRecord::Fill { start, len, value });
            self.cursor += len;
        }
        Ok(())
    }
}

fn parse_literal(
    token: &Token,
    radix: u32,
    what: &str,
) -> Result<u64, ParseError> {
    match &token.value {
        TokenValue::Literal(text) => u64::from_str_radix(text, radix)
            .map_err(|_| {
                let message = format!("invalid {what}: {text}");
                ParseError::at_line(token.line, message)
            }),
        other => {
            let message = format!("expected {what}, found {}", other.name());
            Err(ParseError::at_line(token.line, message))
        }
    }
}

fn parse_value(token: &Token) -> Result<u32, ParseError> {
    let value = parse_literal(token, 16, "value")?;
    u32::try_from(value).map_err(|_| {
        let message = format!("value {value:x} is wider than 32 bits");
        ParseError::at_line(token.line, message)
    })
}

// Repeat counts are written in decimal.
fn parse_count(token: &Token) -> Result<u64, ParseError> {
    parse_literal(token, 10, "repeat count")
}

//===========================================================================//

/// Writes a hex-text image of the snapshot.  Lines that would contain only
/// zeros are omitted, and trailing zeros are trimmed from each line.
pub(crate) fn write_hex<W: io::Write>(
    writer: &mut W,
    snapshot: &ImageSnapshot,
) -> io::Result<()> {
    let addr_digits = snapshot.addr_width.hex_digits();
    let data_digits = snapshot.data_width.hex_digits();
    writeln!(writer, "{HEADER}")?;
    writeln!(
        writer,
        "# {}, {}",
        snapshot.addr_width, snapshot.data_width
    )?;
    for (base, cells) in &snapshot.pages {
        for (index, chunk) in cells.chunks(CELLS_PER_LINE).enumerate() {
            let len = match chunk.iter().rposition(|&cell| cell != 0) {
                Some(last) => last + 1,
                None => continue,
            };
            let addr = *base as usize + index * CELLS_PER_LINE;
            write!(writer, "{addr:0addr_digits$x}:")?;
            for value in &chunk[..len] {
                write!(writer, " {value:0data_digits$x}")?;
            }
            writeln!(writer)?;
        }
    }
    Ok(())
}

//===========================================================================//


//===========================================================================//
