//! CSV coords+ids file format: one row per detected rectangle, `;`-separated.
//!
//! Columns: frame index, identity, midpoint time (s), confidence, success
//! flag, buffer number, in-buffer index, x, y, w, h. A frame with zero
//! detections still gets exactly one row (`success=0`, trailing fields
//! empty); a frame with K detections gets K rows.

use std::fs::File;
use std::path::Path;

use vidid_core::Coord;

use crate::error::Result;

/// One in-window frame's detections, as read from or written to a coords
/// file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameRecord {
    pub frame_index: usize,
    pub buffer: usize,
    pub coords: Vec<Coord>,
    pub ids: Vec<String>,
}

#[derive(Debug, serde::Serialize)]
struct RawRow {
    frame: usize,
    id: String,
    time: String,
    confidence: String,
    success: u8,
    buffer: usize,
    in_buffer_index: usize,
    x: String,
    y: String,
    w: String,
    h: String,
}

#[derive(Debug, serde::Deserialize)]
struct RawRowIn {
    frame: usize,
    id: String,
    #[allow(dead_code)]
    time: String,
    confidence: String,
    success: u8,
    buffer: usize,
    #[allow(dead_code)]
    in_buffer_index: usize,
    x: String,
    y: String,
    w: String,
    h: String,
}

/// Append-only CSV coords writer, opened once for the full duration of the
/// pipeline run.
pub struct CsvWriter {
    writer: csv::Writer<File>,
    fps: f64,
}

impl CsvWriter {
    pub fn create(path: impl AsRef<Path>, fps: f64) -> Result<Self> {
        let writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .from_path(path)?;
        Ok(CsvWriter { writer, fps })
    }

    /// Writes all rows for one frame: one row per `(coord, id)` pair, or a
    /// single `success=0` row if `coords` is empty.
    pub fn write_frame(
        &mut self,
        frame_index: usize,
        buffer: usize,
        coords: &[Coord],
        ids: &[String],
    ) -> Result<()> {
        let time = frame_index as f64 / self.fps;

        if coords.is_empty() {
            self.writer.serialize(RawRow {
                frame: frame_index,
                id: String::new(),
                time: format!("{time:.3}"),
                confidence: String::new(),
                success: 0,
                buffer,
                in_buffer_index: 0,
                x: String::new(),
                y: String::new(),
                w: String::new(),
                h: String::new(),
            })?;
            return Ok(());
        }

        for (idx, (coord, id)) in coords.iter().zip(ids.iter()).enumerate() {
            self.writer.serialize(RawRow {
                frame: frame_index,
                id: id.clone(),
                time: format!("{time:.3}"),
                confidence: format!("{:.3}", coord.confidence()),
                success: 1,
                buffer,
                in_buffer_index: idx,
                x: coord.x().to_string(),
                y: coord.y().to_string(),
                w: coord.w().to_string(),
                h: coord.h().to_string(),
            })?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Reads an entire coords CSV file back into per-frame records, grouped by
/// frame index and ordered by `in_buffer_index`.
pub fn read_csv(path: impl AsRef<Path>) -> Result<Vec<FrameRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .from_path(path)?;

    let mut frames: Vec<FrameRecord> = Vec::new();

    for result in reader.deserialize() {
        let row: RawRowIn = result?;

        let record = match frames.last_mut() {
            Some(last) if last.frame_index == row.frame => last,
            _ => {
                frames.push(FrameRecord {
                    frame_index: row.frame,
                    buffer: row.buffer,
                    coords: Vec::new(),
                    ids: Vec::new(),
                });
                frames.last_mut().unwrap()
            }
        };

        if row.success == 0 {
            continue;
        }

        let coord = Coord::with_score(
            row.x.parse().unwrap_or(0),
            row.y.parse().unwrap_or(0),
            row.w.parse().unwrap_or(0),
            row.h.parse().unwrap_or(0),
            row.confidence.parse().unwrap_or(0.0),
        )?;
        record.coords.push(coord);
        record.ids.push(row.id);
    }

    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_zero_one_two_detection_frames() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let mut writer = CsvWriter::create(tmp.path(), 25.0).unwrap();

        writer.write_frame(0, 0, &[], &[]).unwrap();
        let c1 = Coord::with_score(10, 20, 30, 40, 0.9).unwrap();
        writer.write_frame(1, 0, &[c1], &["1".to_string()]).unwrap();
        let c2a = Coord::with_score(1, 2, 3, 4, 0.5).unwrap();
        let c2b = Coord::with_score(5, 6, 7, 8, 0.6).unwrap();
        writer
            .write_frame(2, 0, &[c2a, c2b], &["1".to_string(), "2".to_string()])
            .unwrap();
        writer.flush().unwrap();

        let frames = read_csv(tmp.path()).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].coords.len(), 0);
        assert_eq!(frames[1].coords.len(), 1);
        assert_eq!(frames[2].coords.len(), 2);
        assert_eq!(frames[1].coords[0], c1);
        assert_eq!(frames[1].ids[0], "1");
        assert_eq!(frames[2].coords[0], c2a);
        assert_eq!(frames[2].coords[1], c2b);
    }
}
