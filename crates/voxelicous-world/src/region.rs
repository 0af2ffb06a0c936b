//! Region file persistence: one file per 32x32 chunk square, matching the
//! layout `Chunk::save_to`/`load_from` already use for a single chunk's payload.

use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use voxelicous_core::coords::REGION_SIZE;
use voxelicous_core::{Error, Result};

use crate::chunk::Chunk;

const MAGIC: [u8; 4] = *b"RGN1";
const VERSION: u32 = 1;
const SLOT_COUNT: usize = (REGION_SIZE * REGION_SIZE) as usize;

/// Reads and writes `r.{regionX}.{regionZ}.rgn` files under a root directory.
pub struct RegionStore {
    dir: PathBuf,
}

impl RegionStore {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, rx: i32, rz: i32) -> PathBuf {
        self.dir.join(format!("r.{rx}.{rz}.rgn"))
    }

    fn slot_index(local_x: u32, local_z: u32) -> usize {
        (local_x + REGION_SIZE as u32 * local_z) as usize
    }

    /// Writes every chunk in `chunks` whose region is `(rx, rz)`, overwriting
    /// whatever was previously on disk for that region. Creates the store's
    /// directory if it doesn't exist yet.
    ///
    /// # Errors
    /// Propagates I/O failures and `Chunk::save_to` errors.
    pub fn save_region<'a>(
        &self,
        rx: i32,
        rz: i32,
        chunks: impl Iterator<Item = &'a Chunk>,
    ) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let mut directory = vec![(0u32, 0u32); SLOT_COUNT];
        let mut payloads = Vec::new();

        for chunk in chunks {
            if chunk.pos.region() != (rx, rz) {
                continue;
            }
            let (lx, lz) = chunk.pos.local_in_region();
            let mut bytes = Vec::new();
            chunk.save_to(&mut bytes)?;
            let offset = payloads.len() as u32;
            let size = bytes.len() as u32;
            directory[Self::slot_index(lx, lz)] = (offset, size);
            payloads.extend(bytes);
        }

        let mut file = File::create(self.path_for(rx, rz))?;
        file.write_all(&MAGIC)?;
        file.write_all(&VERSION.to_le_bytes())?;
        file.write_all(&(REGION_SIZE as u32).to_le_bytes())?;
        for (offset, size) in &directory {
            file.write_all(&offset.to_le_bytes())?;
            file.write_all(&size.to_le_bytes())?;
        }
        file.write_all(&payloads)?;
        Ok(())
    }

    /// Reads every present chunk out of `(rx, rz)`'s file. A region that has
    /// never been saved simply has no file yet, so a missing file reads as an
    /// empty region rather than an error.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if the file exists but its header doesn't
    /// match, or propagates an underlying I/O error.
    pub fn load_region(&self, rx: i32, rz: i32) -> Result<Vec<Chunk>> {
        let path = self.path_for(rx, rz);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut file = File::open(&path)?;
        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(Error::InvalidArgument(format!(
                "{} is not a region file",
                path.display()
            )));
        }

        let mut u32_buf = [0u8; 4];
        file.read_exact(&mut u32_buf)?;
        let version = u32::from_le_bytes(u32_buf);
        if version != VERSION {
            return Err(Error::InvalidArgument(format!(
                "unsupported region version {version}"
            )));
        }
        file.read_exact(&mut u32_buf)?;
        let region_size = u32::from_le_bytes(u32_buf);
        if region_size != REGION_SIZE as u32 {
            return Err(Error::InvalidArgument(format!(
                "unexpected region size {region_size}"
            )));
        }

        let mut directory = Vec::with_capacity(SLOT_COUNT);
        for _ in 0..SLOT_COUNT {
            file.read_exact(&mut u32_buf)?;
            let offset = u32::from_le_bytes(u32_buf);
            file.read_exact(&mut u32_buf)?;
            let size = u32::from_le_bytes(u32_buf);
            directory.push((offset, size));
        }

        let payload_start = file.stream_position()?;
        let mut chunks = Vec::new();
        for (offset, size) in directory {
            if size == 0 {
                continue;
            }
            file.seek(SeekFrom::Start(payload_start + u64::from(offset)))?;
            let mut bytes = vec![0u8; size as usize];
            file.read_exact(&mut bytes)?;
            chunks.push(Chunk::load_from(&mut bytes.as_slice())?);
        }
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::TerrainGenerationParams;
    use voxelicous_core::ChunkPos;

    fn scratch_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "voxelicous-region-test-{label}-{}",
            std::process::id()
        ))
    }

    #[test]
    fn region_round_trips_through_save_and_load() {
        let dir = scratch_dir("roundtrip");
        let store = RegionStore::new(dir.clone());
        let params = TerrainGenerationParams::default();

        let a = Chunk::generate(ChunkPos::new(0, 0), &params).unwrap();
        let b = Chunk::generate(ChunkPos::new(1, 0), &params).unwrap();
        store.save_region(0, 0, [&a, &b].into_iter()).unwrap();

        let loaded = store.load_region(0, 0).unwrap();
        assert_eq!(loaded.len(), 2);
        let positions: Vec<ChunkPos> = loaded.iter().map(|c| c.pos).collect();
        assert!(positions.contains(&a.pos));
        assert!(positions.contains(&b.pos));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn chunks_outside_the_requested_region_are_skipped() {
        let dir = scratch_dir("skip");
        let store = RegionStore::new(dir.clone());
        let params = TerrainGenerationParams::default();

        let in_region = Chunk::generate(ChunkPos::new(0, 0), &params).unwrap();
        let out_of_region = Chunk::generate(ChunkPos::new(40, 0), &params).unwrap();
        store
            .save_region(0, 0, [&in_region, &out_of_region].into_iter())
            .unwrap();

        let loaded = store.load_region(0, 0).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].pos, in_region.pos);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn loading_a_missing_region_returns_empty() {
        let store = RegionStore::new(scratch_dir("missing"));
        assert!(store.load_region(5, 5).unwrap().is_empty());
    }

    #[test]
    fn loading_a_non_region_file_is_an_error() {
        let dir = scratch_dir("bad-header");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("r.0.0.rgn"), b"not a region file").unwrap();
        let store = RegionStore::new(dir.clone());
        assert!(store.load_region(0, 0).is_err());
        fs::remove_dir_all(&dir).ok();
    }
}
