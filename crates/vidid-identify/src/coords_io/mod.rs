//! Coords+ids file formats: CSV (one row per rectangle) and a minimal,
//! self-contained XRA-shaped XML format.

pub mod csv;
pub mod xra;

pub use csv::{read_csv, CsvWriter, FrameRecord};
pub use xra::{read_xra, XraWriter};

/// The coords file format to read/write, selected by the CLI's
/// `--csv`/`--xra` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordsFormat {
    Csv,
    Xra,
}

impl Default for CoordsFormat {
    fn default() -> Self {
        CoordsFormat::Csv
    }
}

/// Reads a coords file, dispatching on `format`.
pub fn read(
    path: impl AsRef<std::path::Path>,
    format: CoordsFormat,
) -> crate::error::Result<Vec<FrameRecord>> {
    match format {
        CoordsFormat::Csv => read_csv(path),
        CoordsFormat::Xra => read_xra(path),
    }
}

/// A coords writer, dispatching on `format`. Both variants are opened once
/// for the whole run and closed at the end.
pub enum CoordsWriter {
    Csv(CsvWriter),
    Xra(XraWriter),
}

impl CoordsWriter {
    pub fn create(
        path: impl AsRef<std::path::Path>,
        format: CoordsFormat,
        fps: f64,
    ) -> crate::error::Result<Self> {
        Ok(match format {
            CoordsFormat::Csv => CoordsWriter::Csv(CsvWriter::create(path, fps)?),
            CoordsFormat::Xra => CoordsWriter::Xra(XraWriter::create(path, fps)?),
        })
    }

    pub fn write_frame(
        &mut self,
        frame_index: usize,
        buffer: usize,
        coords: &[vidid_core::Coord],
        ids: &[String],
    ) -> crate::error::Result<()> {
        match self {
            CoordsWriter::Csv(w) => w.write_frame(frame_index, buffer, coords, ids),
            CoordsWriter::Xra(w) => w.write_frame(frame_index, buffer, coords, ids),
        }
    }

    pub fn close(self) -> crate::error::Result<()> {
        match self {
            CoordsWriter::Csv(mut w) => w.flush(),
            CoordsWriter::Xra(w) => w.close(),
        }
    }
}
