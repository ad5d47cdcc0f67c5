//! ASCII grayscale (`P2`) image format.
//!
//! Header is `P2 <width> <height> 255` on one line, followed by one line per
//! row of space-separated values in [0, 255].

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use super::grid::Grid;

/// Magic token identifying an ASCII graymap.
pub const PGM_MAGIC: &str = "P2";

/// Maximum gray value written in every header.
pub const PGM_MAX_VALUE: u32 = 255;

/// Write a grayscale image to any writer.
pub fn write_pgm_to<W: Write>(image: &Grid<u8>, w: &mut W) -> io::Result<()> {
    writeln!(
        w,
        "{} {} {} {}",
        PGM_MAGIC, image.width, image.height, PGM_MAX_VALUE
    )?;
    for row in image.rows() {
        let mut first = true;
        for value in row {
            if !first {
                w.write_all(b" ")?;
            }
            write!(w, "{}", value)?;
            first = false;
        }
        w.write_all(b"\n")?;
    }
    Ok(())
}

/// Write a grayscale image to a file.
pub fn write_pgm<P: AsRef<Path>>(image: &Grid<u8>, path: P) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_pgm_to(image, &mut writer)?;
    writer.flush()
}

/// Read an ASCII graymap from any buffered reader.
///
/// Values are rescaled to [0, 255] when the header's maximum differs.
pub fn read_pgm_from<R: BufRead>(r: R) -> io::Result<Grid<u8>> {
    let mut tokens = Vec::new();
    for line in r.lines() {
        let line = line?;
        // '#' starts a comment that runs to end of line
        let content = line.split('#').next().unwrap_or("");
        tokens.extend(content.split_whitespace().map(str::to_owned));
    }

    let mut iter = tokens.into_iter();
    match iter.next() {
        Some(magic) if magic == PGM_MAGIC => {}
        other => {
            return Err(invalid(format!(
                "Invalid graymap magic: {}",
                other.unwrap_or_default()
            )));
        }
    }

    let mut header = [0u32; 3];
    for (slot, name) in header.iter_mut().zip(["width", "height", "max value"]) {
        let token = iter
            .next()
            .ok_or_else(|| invalid(format!("Missing {} in graymap header", name)))?;
        *slot = token
            .parse()
            .map_err(|_| invalid(format!("Invalid {} in graymap header: {}", name, token)))?;
    }
    let [width, height, max_value] = header;
    if max_value == 0 {
        return Err(invalid("Graymap max value must be positive".to_string()));
    }

    // Header sizes are checked against the tokens actually present before
    // anything is reserved.
    let expected = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| invalid(format!("Graymap dimensions {}x{} overflow", width, height)))?;
    if iter.len() < expected {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("Graymap has {} of {} values", iter.len(), expected),
        ));
    }

    let mut data = Vec::with_capacity(expected);
    for token in iter.take(expected) {
        let value: u32 = token
            .parse()
            .map_err(|_| invalid(format!("Invalid graymap value: {}", token)))?;
        if value > max_value {
            return Err(invalid(format!(
                "Graymap value {} exceeds max {}",
                value, max_value
            )));
        }
        let scaled = if max_value == PGM_MAX_VALUE {
            value
        } else {
            (u64::from(value) * u64::from(PGM_MAX_VALUE) / u64::from(max_value)) as u32
        };
        data.push(scaled as u8);
    }

    Grid::from_vec(width as usize, height as usize, data)
        .ok_or_else(|| invalid("Graymap dimensions do not match data".to_string()))
}

/// Read an ASCII graymap from a file.
pub fn read_pgm<P: AsRef<Path>>(path: P) -> io::Result<Grid<u8>> {
    let file = File::open(path)?;
    read_pgm_from(BufReader::new(file))
}

fn invalid(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}
