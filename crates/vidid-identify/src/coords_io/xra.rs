//! Minimal, self-contained XRA-shaped XML coords+ids format.
//!
//! Covers exactly the shape this pipeline needs: one tier whose annotations
//! are points in time (one per frame), each annotation carrying as many
//! labels as detections in that frame, each label a fuzzy-rectangle tag
//! `(x, y, w, h)` with a score, keyed by identity string. This is not a
//! general SPPAS-XRA reader/writer — only enough to round-trip what this
//! pipeline itself writes.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer as XmlWriter;

use vidid_core::Coord;

use crate::coords_io::csv::FrameRecord;
use crate::error::{IdentifyError, Result};

/// Append-only XRA writer. Buffers annotations in memory and serializes the
/// whole document on `close()`, since XRA is a single well-formed XML tree
/// rather than an append-friendly line format.
pub struct XraWriter {
    path: std::path::PathBuf,
    fps: f64,
    frames: Vec<FrameRecord>,
}

impl XraWriter {
    pub fn create(path: impl AsRef<Path>, fps: f64) -> Result<Self> {
        Ok(XraWriter {
            path: path.as_ref().to_path_buf(),
            fps,
            frames: Vec::new(),
        })
    }

    pub fn write_frame(
        &mut self,
        frame_index: usize,
        buffer: usize,
        coords: &[Coord],
        ids: &[String],
    ) -> Result<()> {
        self.frames.push(FrameRecord {
            frame_index,
            buffer,
            coords: coords.to_vec(),
            ids: ids.to_vec(),
        });
        Ok(())
    }

    pub fn close(self) -> Result<()> {
        let file = File::create(&self.path)?;
        let mut writer = XmlWriter::new_with_indent(BufWriter::new(file), b' ', 2);

        writer.write_event(Event::Start(BytesStart::new("Annotation")))?;

        writer.write_event(Event::Start(BytesStart::new("Tier")))?;

        let mut media = BytesStart::new("Media");
        media.push_attribute(("fps", self.fps.to_string().as_str()));
        writer.write_event(Event::Empty(media))?;

        for frame in &self.frames {
            let time = frame.frame_index as f64 / self.fps;
            let mut annotation = BytesStart::new("Annotation");
            annotation.push_attribute(("frame", frame.frame_index.to_string().as_str()));
            annotation.push_attribute(("time", format!("{time:.3}").as_str()));
            writer.write_event(Event::Start(annotation))?;

            for (coord, id) in frame.coords.iter().zip(frame.ids.iter()) {
                let mut label = BytesStart::new("Label");
                label.push_attribute(("key", id.as_str()));
                label.push_attribute(("x", coord.x().to_string().as_str()));
                label.push_attribute(("y", coord.y().to_string().as_str()));
                label.push_attribute(("w", coord.w().to_string().as_str()));
                label.push_attribute(("h", coord.h().to_string().as_str()));
                label.push_attribute(("score", format!("{:.3}", coord.confidence()).as_str()));
                writer.write_event(Event::Empty(label))?;
            }

            writer.write_event(Event::End(BytesEnd::new("Annotation")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("Tier")))?;
        writer.write_event(Event::End(BytesEnd::new("Annotation")))?;
        writer.into_inner().flush()?;
        Ok(())
    }
}

/// Reads an XRA file produced by [`XraWriter`] back into per-frame records.
pub fn read_xra(path: impl AsRef<Path>) -> Result<Vec<FrameRecord>> {
    let mut reader = Reader::from_file(path)?;
    reader.config_mut().trim_text(true);

    let mut frames = Vec::new();
    let mut current: Option<FrameRecord> = None;
    let mut buf = Vec::new();
    let mut depth = 0u32;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"Annotation" => {
                depth += 1;
                if depth == 2 {
                    let mut frame_index = 0usize;
                    for attr in e.attributes().filter_map(Result::ok) {
                        if attr.key.as_ref() == b"frame" {
                            frame_index = std::str::from_utf8(&attr.value)
                                .unwrap_or("0")
                                .parse()
                                .unwrap_or(0);
                        }
                    }
                    current = Some(FrameRecord {
                        frame_index,
                        buffer: 0,
                        coords: Vec::new(),
                        ids: Vec::new(),
                    });
                }
            }
            Event::Empty(e) if e.name().as_ref() == b"Label" => {
                let record = current.as_mut().ok_or_else(|| {
                    IdentifyError::Config("XRA Label outside of an Annotation".into())
                })?;
                let mut key = String::new();
                let (mut x, mut y, mut w, mut h) = (0i64, 0i64, 0i64, 0i64);
                let mut score = 0.0f32;
                for attr in e.attributes().filter_map(Result::ok) {
                    let value = std::str::from_utf8(&attr.value).unwrap_or("").to_string();
                    match attr.key.as_ref() {
                        b"key" => key = value,
                        b"x" => x = value.parse().unwrap_or(0),
                        b"y" => y = value.parse().unwrap_or(0),
                        b"w" => w = value.parse().unwrap_or(0),
                        b"h" => h = value.parse().unwrap_or(0),
                        b"score" => score = value.parse().unwrap_or(0.0),
                        _ => {}
                    }
                }
                record.coords.push(Coord::with_score(x, y, w, h, score)?);
                record.ids.push(key);
            }
            Event::End(e) if e.name().as_ref() == b"Annotation" => {
                if depth == 2 {
                    if let Some(record) = current.take() {
                        frames.push(record);
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_zero_one_two_detection_frames() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let writer_path = tmp.path().to_path_buf();
        let mut writer = XraWriter::create(&writer_path, 25.0).unwrap();

        writer.write_frame(0, 0, &[], &[]).unwrap();
        let c1 = Coord::with_score(10, 20, 30, 40, 0.9).unwrap();
        writer.write_frame(1, 0, &[c1], &["1".to_string()]).unwrap();
        let c2a = Coord::with_score(1, 2, 3, 4, 0.5).unwrap();
        let c2b = Coord::with_score(5, 6, 7, 8, 0.6).unwrap();
        writer
            .write_frame(2, 0, &[c2a, c2b], &["1".to_string(), "2".to_string()])
            .unwrap();
        writer.close().unwrap();

        let frames = read_xra(&writer_path).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].coords.len(), 0);
        assert_eq!(frames[1].coords.len(), 1);
        assert_eq!(frames[2].coords.len(), 2);
        assert_eq!(frames[1].coords[0], c1);
        assert_eq!(frames[2].coords[0], c2a);
        assert_eq!(frames[2].coords[1], c2b);
    }
}
