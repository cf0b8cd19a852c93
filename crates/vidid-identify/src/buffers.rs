//! In-window coordinate/identity buffers the orchestrator mutates as it
//! walks a [`vidid_media::FrameWindow`].

use vidid_core::Coord;

use crate::error::{IdentifyError, Result};

/// Per-window list of detected rectangles, one list per in-window frame.
/// No identity information — this is the raw shape detections arrive in
/// from the coords file before pass 1 assigns identities.
#[derive(Debug, Clone, Default)]
pub struct CoordsBuffer {
    frames: Vec<Vec<Coord>>,
}

impl CoordsBuffer {
    pub fn new(window_size: usize) -> Self {
        CoordsBuffer {
            frames: vec![Vec::new(); window_size],
        }
    }

    /// Clears and resizes for a new window, as happens on every `next()`.
    pub fn reset(&mut self, window_size: usize) {
        self.frames = vec![Vec::new(); window_size];
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    fn check_frame(&self, i: usize) -> Result<()> {
        if i >= self.frames.len() {
            return Err(IdentifyError::OutOfRange(format!(
                "frame index {i} out of range (window holds {} frames)",
                self.frames.len()
            )));
        }
        Ok(())
    }

    pub fn coords(&self, i: usize) -> Result<&[Coord]> {
        self.check_frame(i)?;
        Ok(&self.frames[i])
    }

    pub fn set_coordinates(&mut self, i: usize, coords: Vec<Coord>) -> Result<()> {
        self.check_frame(i)?;
        self.frames[i] = coords;
        Ok(())
    }

    pub fn append_coordinate(&mut self, i: usize, coord: Coord) -> Result<usize> {
        self.check_frame(i)?;
        self.frames[i].push(coord);
        Ok(self.frames[i].len() - 1)
    }

    pub fn pop_coordinate(&mut self, i: usize, face_idx: usize) -> Result<Coord> {
        self.check_frame(i)?;
        if face_idx >= self.frames[i].len() {
            return Err(IdentifyError::OutOfRange(format!(
                "face index {face_idx} out of range for frame {i}"
            )));
        }
        Ok(self.frames[i].remove(face_idx))
    }

    pub fn remove_coordinate(&mut self, i: usize, coord: &Coord) -> Result<bool> {
        self.check_frame(i)?;
        if let Some(pos) = self.frames[i].iter().position(|c| c == coord) {
            self.frames[i].remove(pos);
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

/// [`CoordsBuffer`] plus a parallel identity-string list per frame. New
/// coordinates default to the face number `"1"`, `"2"`, … the first time
/// they're assigned, matching the core spec's lifecycle note.
#[derive(Debug, Clone, Default)]
pub struct IdCoordsBuffer {
    coords: CoordsBuffer,
    ids: Vec<Vec<String>>,
}

impl IdCoordsBuffer {
    pub fn new(window_size: usize) -> Self {
        IdCoordsBuffer {
            coords: CoordsBuffer::new(window_size),
            ids: vec![Vec::new(); window_size],
        }
    }

    /// Clears and resizes for a new window; both lists are dropped, as
    /// mandated by the "lists are cleared on every `next()`" lifecycle rule.
    pub fn reset(&mut self, window_size: usize) {
        self.coords.reset(window_size);
        self.ids = vec![Vec::new(); window_size];
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    fn check_frame(&self, i: usize) -> Result<()> {
        if i >= self.ids.len() {
            return Err(IdentifyError::OutOfRange(format!(
                "frame index {i} out of range (window holds {} frames)",
                self.ids.len()
            )));
        }
        Ok(())
    }

    pub fn coords(&self, i: usize) -> Result<&[Coord]> {
        self.coords.coords(i)
    }

    pub fn ids(&self, i: usize) -> Result<&[String]> {
        self.check_frame(i)?;
        Ok(&self.ids[i])
    }

    fn default_ids(n: usize) -> Vec<String> {
        (1..=n).map(|k| k.to_string()).collect()
    }

    /// Replaces both lists at frame `i`; identities reset to `"1","2",…`.
    pub fn set_coordinates(&mut self, i: usize, coords: Vec<Coord>) -> Result<()> {
        self.check_frame(i)?;
        self.ids[i] = Self::default_ids(coords.len());
        self.coords.set_coordinates(i, coords)
    }

    /// Appends to both lists; the default identity is the next integer.
    pub fn append_coordinate(&mut self, i: usize, coord: Coord) -> Result<usize> {
        self.check_frame(i)?;
        let face_idx = self.coords.append_coordinate(i, coord)?;
        self.ids[i].push((face_idx + 1).to_string());
        Ok(face_idx)
    }

    pub fn pop_coordinate(&mut self, i: usize, face_idx: usize) -> Result<(Coord, String)> {
        self.check_frame(i)?;
        if face_idx >= self.ids[i].len() {
            return Err(IdentifyError::OutOfRange(format!(
                "face index {face_idx} out of range for frame {i}"
            )));
        }
        let id = self.ids[i].remove(face_idx);
        let coord = self.coords.pop_coordinate(i, face_idx)?;
        Ok((coord, id))
    }

    pub fn remove_coordinate(&mut self, i: usize, coord: &Coord) -> Result<bool> {
        self.check_frame(i)?;
        if let Some(pos) = self.coords.coords(i)?.iter().position(|c| c == coord) {
            self.ids[i].remove(pos);
            self.coords.frames[i].remove(pos);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn set_id(&mut self, i: usize, face_idx: usize, id: impl Into<String>) -> Result<()> {
        self.check_frame(i)?;
        if face_idx >= self.ids[i].len() {
            return Err(IdentifyError::OutOfRange(format!(
                "face index {face_idx} out of range for frame {i}"
            )));
        }
        self.ids[i][face_idx] = id.into();
        Ok(())
    }

    pub fn get_id(&self, i: usize, face_idx: usize) -> Result<&str> {
        self.check_frame(i)?;
        self.ids[i]
            .get(face_idx)
            .map(String::as_str)
            .ok_or_else(|| {
                IdentifyError::OutOfRange(format!(
                    "face index {face_idx} out of range for frame {i}"
                ))
            })
    }

    pub fn set_coordinate(&mut self, i: usize, face_idx: usize, coord: Coord) -> Result<()> {
        self.check_frame(i)?;
        let slot = self
            .coords
            .frames
            .get_mut(i)
            .and_then(|frame| frame.get_mut(face_idx))
            .ok_or_else(|| {
                IdentifyError::OutOfRange(format!(
                    "face index {face_idx} out of range for frame {i}"
                ))
            })?;
        *slot = coord;
        Ok(())
    }

    /// `id`'s coordinate at frame `i`, if present.
    pub fn get_id_coordinate(&self, i: usize, id: &str) -> Result<Option<Coord>> {
        self.check_frame(i)?;
        Ok(self.ids[i]
            .iter()
            .position(|existing| existing == id)
            .map(|pos| self.coords.frames[i][pos]))
    }

    /// Whether identity `id` is present at frame `i`.
    pub fn has_id(&self, i: usize, id: &str) -> Result<bool> {
        self.check_frame(i)?;
        Ok(self.ids[i].iter().any(|existing| existing == id))
    }

    /// Copies frame `i`'s coord+id lists (for the previous-window buffer).
    pub fn copy_frame(&self, i: usize) -> Result<(Vec<Coord>, Vec<String>)> {
        self.check_frame(i)?;
        Ok((self.coords.frames[i].clone(), self.ids[i].clone()))
    }

    /// All distinct identity strings present anywhere in the window.
    pub fn distinct_ids(&self) -> Vec<String> {
        let mut out = Vec::new();
        for frame_ids in &self.ids {
            for id in frame_ids {
                if !out.contains(id) {
                    out.push(id.clone());
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: i64, y: i64) -> Coord {
        Coord::new(x, y, 10, 10).unwrap()
    }

    #[test]
    fn set_coordinates_assigns_default_ids() {
        let mut buf = IdCoordsBuffer::new(2);
        buf.set_coordinates(0, vec![c(0, 0), c(10, 10)]).unwrap();
        assert_eq!(buf.ids(0).unwrap(), &["1".to_string(), "2".to_string()]);
    }

    #[test]
    fn append_and_pop_keep_lists_aligned() {
        let mut buf = IdCoordsBuffer::new(1);
        let idx = buf.append_coordinate(0, c(0, 0)).unwrap();
        assert_eq!(buf.coords(0).unwrap().len(), buf.ids(0).unwrap().len());
        let (coord, id) = buf.pop_coordinate(0, idx).unwrap();
        assert_eq!(coord, c(0, 0));
        assert_eq!(id, "1");
        assert!(buf.coords(0).unwrap().is_empty());
        assert!(buf.ids(0).unwrap().is_empty());
    }

    #[test]
    fn set_id_then_lookup_by_id() {
        let mut buf = IdCoordsBuffer::new(1);
        buf.append_coordinate(0, c(5, 5)).unwrap();
        buf.set_id(0, 0, "alice").unwrap();
        assert_eq!(buf.get_id_coordinate(0, "alice").unwrap(), Some(c(5, 5)));
        assert_eq!(buf.get_id_coordinate(0, "bob").unwrap(), None);
    }

    #[test]
    fn reset_clears_both_lists() {
        let mut buf = IdCoordsBuffer::new(1);
        buf.append_coordinate(0, c(0, 0)).unwrap();
        buf.reset(3);
        assert_eq!(buf.len(), 3);
        assert!(buf.coords(0).unwrap().is_empty());
        assert!(buf.ids(0).unwrap().is_empty());
    }

    #[test]
    fn out_of_range_frame_index_errors() {
        let buf = IdCoordsBuffer::new(1);
        assert!(buf.coords(5).is_err());
    }
}
