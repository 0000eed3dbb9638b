//! Replay a stored recording using the system audio player.

use crate::recording::RecordingStore;
use std::process::Command;

/// Plays back a stored recording.
///
/// On macOS uses the `open` command; on Linux tries xdg-open first, then
/// falls back to common audio players.
///
/// # Arguments
/// * `index` - 1 = most recent, 2 = second most recent, etc. (default 1)
pub async fn handle_replay(index: Option<usize>) -> Result<(), anyhow::Error> {
    tracing::info!("=== vmemo replay ===");

    let store = RecordingStore::new(&RecordingStore::default_data_dir()?)?;
    let recordings = store.all()?;

    if recordings.is_empty() {
        return Err(anyhow::anyhow!("No recordings found"));
    }

    let index = index.unwrap_or(1);
    if index < 1 || index > recordings.len() {
        return Err(anyhow::anyhow!(
            "Recording index out of range. Available recordings: 1-{}",
            recordings.len()
        ));
    }

    let recording = &recordings[index - 1];
    let audio_path = &recording.audio_path;

    if !audio_path.exists() {
        return Err(anyhow::anyhow!(
            "Audio file not found: {}",
            audio_path.display()
        ));
    }

    tracing::info!(
        "Playing recording #{} from {} (uploaded: {})",
        index,
        recording.created_at.format("%Y-%m-%d %H:%M:%S"),
        recording.uploaded
    );

    #[cfg(target_os = "macos")]
    {
        Command::new("open")
            .arg(audio_path)
            .spawn()
            .map_err(|e| anyhow::anyhow!("Failed to open audio player: {e}"))?
            .wait()
            .map_err(|e| anyhow::anyhow!("Audio player error: {e}"))?;
    }

    #[cfg(target_os = "linux")]
    {
        let result = Command::new("xdg-open").arg(audio_path).spawn();

        match result {
            Ok(mut child) => {
                child
                    .wait()
                    .map_err(|e| anyhow::anyhow!("Audio player error: {e}"))?;
            }
            Err(_) => {
                let players = ["mpv", "vlc", "ffplay", "paplay", "aplay"];
                let mut played = false;

                for player in players {
                    if let Ok(mut child) = Command::new(player).arg(audio_path).spawn() {
                        let _ = child.wait();
                        played = true;
                        break;
                    }
                }

                if !played {
                    return Err(anyhow::anyhow!(
                        "No audio player found. Install mpv, vlc, ffplay, or paplay"
                    ));
                }
            }
        }
    }

    tracing::info!("Playback finished for recording #{}", index);
    Ok(())
}
