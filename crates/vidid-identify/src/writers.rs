//! Output sinks for pass 3 emission: the aggregate annotated stream and one
//! video/coords pair per identity, the latter opened lazily as each identity
//! first appears in the smoothed stream.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use vidid_core::Coord;
use vidid_media::VideoWriter;

use crate::coords_io::{CoordsFormat, CoordsWriter};
use crate::error::Result;

pub struct OutputSinks {
    output_dir: PathBuf,
    format: CoordsFormat,
    fps: f64,
    per_identity_size: (u32, u32),
    aggregate: Option<(VideoWriter, CoordsWriter)>,
    per_identity: HashMap<String, (VideoWriter, CoordsWriter)>,
}

impl OutputSinks {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        format: CoordsFormat,
        fps: f64,
        aggregate_size: (u32, u32),
        per_identity_size: (u32, u32),
        enable_aggregate: bool,
    ) -> Result<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;
        let aggregate = if enable_aggregate {
            Some(Self::open_pair(
                &output_dir,
                "aggregate",
                format,
                fps,
                aggregate_size.0,
                aggregate_size.1,
            )?)
        } else {
            None
        };
        Ok(OutputSinks {
            output_dir,
            format,
            fps,
            per_identity_size,
            aggregate,
            per_identity: HashMap::new(),
        })
    }

    fn open_pair(
        dir: &Path,
        name: &str,
        format: CoordsFormat,
        fps: f64,
        width: u32,
        height: u32,
    ) -> Result<(VideoWriter, CoordsWriter)> {
        let ext = match format {
            CoordsFormat::Csv => "csv",
            CoordsFormat::Xra => "xra",
        };
        let video_path = dir.join(format!("{name}.mp4"));
        let coords_path = dir.join(format!("{name}.{ext}"));
        let writer = VideoWriter::open(&video_path, width, height, fps)?;
        let coords = CoordsWriter::create(&coords_path, format, fps)?;
        Ok((writer, coords))
    }

    pub fn write_aggregate(
        &mut self,
        frame_index: usize,
        buffer: usize,
        rgb: &[u8],
        coords: &[Coord],
        ids: &[String],
    ) -> Result<()> {
        if let Some((writer, coords_writer)) = self.aggregate.as_mut() {
            writer.append_frame(rgb)?;
            coords_writer.write_frame(frame_index, buffer, coords, ids)?;
        }
        Ok(())
    }

    pub fn write_identity(
        &mut self,
        id: &str,
        frame_index: usize,
        buffer: usize,
        rgb: &[u8],
        coord: &Coord,
    ) -> Result<()> {
        if !self.per_identity.contains_key(id) {
            let pair = Self::open_pair(
                &self.output_dir,
                &format!("person_{id}"),
                self.format,
                self.fps,
                self.per_identity_size.0,
                self.per_identity_size.1,
            )?;
            self.per_identity.insert(id.to_string(), pair);
        }
        let (writer, coords_writer) = self.per_identity.get_mut(id).expect("just inserted");
        writer.append_frame(rgb)?;
        coords_writer.write_frame(frame_index, buffer, std::slice::from_ref(coord), std::slice::from_ref(&id.to_string()))?;
        Ok(())
    }

    pub fn close(mut self) -> Result<()> {
        if let Some((mut writer, coords_writer)) = self.aggregate.take() {
            writer.close()?;
            coords_writer.close()?;
        }
        for (_, (mut writer, coords_writer)) in self.per_identity.drain() {
            writer.close()?;
            coords_writer.close()?;
        }
        Ok(())
    }
}
