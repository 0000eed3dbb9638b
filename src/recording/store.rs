//! Local recording store for immediate replay.
//!
//! The assembled payload is written to the user's data directory before the
//! upload is attempted, so the clip can be replayed locally regardless of
//! network success. Each WAV file has a JSON metadata sidecar; only the 10
//! most recent recordings are kept.

use anyhow::Result;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::upload::UploadPayload;

/// Maximum number of recordings retained locally.
const MAX_RECORDINGS: usize = 10;

/// Metadata about a stored recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecording {
    /// Unique identifier for this recording
    pub id: String,
    /// Path to the WAV file
    pub audio_path: PathBuf,
    /// Whether the upload to the server succeeded
    pub uploaded: bool,
    /// Timestamp when the recording was stored
    pub created_at: DateTime<Local>,
}

/// Filesystem-backed store of recent recordings.
pub struct RecordingStore {
    store_dir: PathBuf,
}

impl RecordingStore {
    /// Opens (creating if needed) the store under the given data directory.
    pub fn new(data_dir: &Path) -> Result<Self> {
        let store_dir = data_dir.join("recordings");
        fs::create_dir_all(&store_dir)?;
        Ok(Self { store_dir })
    }

    /// Default data directory: `~/.local/share/vmemo`.
    pub fn default_data_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        Ok(home.join(".local").join("share").join("vmemo"))
    }

    /// Writes the payload to disk and records its metadata.
    ///
    /// Keeps only the [`MAX_RECORDINGS`] most recent recordings; the oldest
    /// one (WAV and sidecar) is deleted first to make room.
    pub fn save(&self, payload: &UploadPayload) -> Result<StoredRecording> {
        self.evict_oldest()?;

        let now = Local::now();
        let id = self.allocate_id(now.timestamp_millis());
        let audio_path = self.store_dir.join(format!("vmemo-{id}.wav"));
        fs::write(&audio_path, payload.bytes())?;

        let recording = StoredRecording {
            id: id.clone(),
            audio_path,
            uploaded: false,
            created_at: now,
        };
        self.write_sidecar(&recording)?;

        tracing::info!(
            "Recording saved locally: {} ({} bytes)",
            recording.audio_path.display(),
            payload.len()
        );
        Ok(recording)
    }

    /// Picks an id that does not collide with an existing recording.
    ///
    /// Ids are millisecond timestamps; saves landing in the same
    /// millisecond get a `-1`, `-2`, ... suffix instead of overwriting.
    fn allocate_id(&self, base: i64) -> String {
        let mut id = base.to_string();
        let mut suffix = 0u32;
        while self.store_dir.join(format!("vmemo-{id}.wav")).exists() {
            suffix += 1;
            id = format!("{base}-{suffix}");
        }
        id
    }

    /// Marks a stored recording as uploaded.
    pub fn mark_uploaded(&self, recording: &mut StoredRecording) -> Result<()> {
        recording.uploaded = true;
        self.write_sidecar(recording)
    }

    /// Returns all stored recordings, most recent first.
    pub fn all(&self) -> Result<Vec<StoredRecording>> {
        let mut recordings: Vec<StoredRecording> = fs::read_dir(&self.store_dir)?
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                if path.extension().map(|ext| ext == "json").unwrap_or(false) {
                    let content = fs::read_to_string(&path).ok()?;
                    serde_json::from_str(&content).ok()
                } else {
                    None
                }
            })
            .collect();
        recordings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(recordings)
    }

    fn write_sidecar(&self, recording: &StoredRecording) -> Result<()> {
        let sidecar_path = self.store_dir.join(format!("{}.json", recording.id));
        let json = serde_json::to_string_pretty(recording)?;
        fs::write(sidecar_path, json)?;
        Ok(())
    }

    /// Removes the oldest recording when the store is at capacity.
    fn evict_oldest(&self) -> Result<()> {
        let recordings = self.all()?;
        if recordings.len() < MAX_RECORDINGS {
            return Ok(());
        }

        for oldest in recordings.iter().skip(MAX_RECORDINGS - 1) {
            if oldest.audio_path.exists() {
                if let Err(e) = fs::remove_file(&oldest.audio_path) {
                    tracing::warn!("Failed to delete old recording audio: {}", e);
                }
            }
            let sidecar = self.store_dir.join(format!("{}.json", oldest.id));
            if let Err(e) = fs::remove_file(&sidecar) {
                tracing::warn!("Failed to delete old recording metadata: {}", e);
            } else {
                tracing::info!("Evicted old recording {}", oldest.id);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn payload(bytes: &[u8]) -> UploadPayload {
        UploadPayload::assemble(&[bytes.to_vec()])
    }

    #[test]
    fn save_writes_wav_and_sidecar() {
        let dir = TempDir::new().unwrap();
        let store = RecordingStore::new(dir.path()).unwrap();

        let recording = store.save(&payload(b"RIFFdata")).unwrap();
        assert!(recording.audio_path.exists());
        assert!(!recording.uploaded);
        assert_eq!(fs::read(&recording.audio_path).unwrap(), b"RIFFdata");

        let all = store.all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, recording.id);
    }

    #[test]
    fn mark_uploaded_persists() {
        let dir = TempDir::new().unwrap();
        let store = RecordingStore::new(dir.path()).unwrap();

        let mut recording = store.save(&payload(b"abc")).unwrap();
        store.mark_uploaded(&mut recording).unwrap();

        let all = store.all().unwrap();
        assert!(all[0].uploaded);
    }

    #[test]
    fn store_keeps_at_most_ten_recordings() {
        let dir = TempDir::new().unwrap();
        let store = RecordingStore::new(dir.path()).unwrap();

        for i in 0..12u8 {
            store.save(&payload(&[i])).unwrap();
            // Eviction order follows created_at, so keep timestamps apart.
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        let all = store.all().unwrap();
        assert_eq!(all.len(), MAX_RECORDINGS);
        // Most recent first; the earliest two were evicted.
        assert_eq!(fs::read(&all[0].audio_path).unwrap(), vec![11]);
        assert_eq!(fs::read(&all[9].audio_path).unwrap(), vec![2]);
    }

    #[test]
    fn allocate_id_skips_taken_timestamps() {
        let dir = TempDir::new().unwrap();
        let store = RecordingStore::new(dir.path()).unwrap();

        fs::write(dir.path().join("recordings/vmemo-1000.wav"), b"x").unwrap();
        assert_eq!(store.allocate_id(1000), "1000-1");

        fs::write(dir.path().join("recordings/vmemo-1000-1.wav"), b"x").unwrap();
        assert_eq!(store.allocate_id(1000), "1000-2");

        assert_eq!(store.allocate_id(2000), "2000");
    }

    #[test]
    fn same_millisecond_saves_do_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let store = RecordingStore::new(dir.path()).unwrap();

        // Back to back, likely landing in the same millisecond.
        let first = store.save(&payload(b"first")).unwrap();
        let second = store.save(&payload(b"second")).unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(fs::read(&first.audio_path).unwrap(), b"first");
        assert_eq!(fs::read(&second.audio_path).unwrap(), b"second");
        assert_eq!(store.all().unwrap().len(), 2);
    }
}
