//! Highscore JSON persistence.
//!
//! The file layout is [`HighscoreFile`]: `{"maxItems": K, "items": [...]}` with
//! camelCase entry fields. Files are written to a sibling temporary path and
//! renamed into place, so a reader never sees a half-written checkpoint.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::{HighscoreFile, ProgressSnapshot};
use crate::error::AppError;
use crate::search::{Checkpoint, Highscore};

pub fn write_highscore_json(path: &Path, highscore: &Highscore) -> Result<(), AppError> {
    let tmp = tmp_path(path);
    let file = File::create(&tmp)
        .map_err(|e| AppError::internal(format!("Failed to create '{}': {e}", tmp.display())))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &highscore.to_file())
        .map_err(|e| AppError::internal(format!("Failed to write highscore JSON: {e}")))?;
    writer
        .flush()
        .map_err(|e| AppError::internal(format!("Failed to write '{}': {e}", tmp.display())))?;
    drop(writer);
    fs::rename(&tmp, path)
        .map_err(|e| AppError::internal(format!("Failed to move results to '{}': {e}", path.display())))?;
    Ok(())
}

pub fn read_highscore_json(path: &Path) -> Result<HighscoreFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::config(format!("Failed to open '{}': {e}", path.display())))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::config(format!("Invalid highscore JSON '{}': {e}", path.display())))
}

/// Load a file and rebuild the list it describes.
pub fn load_highscore(path: &Path) -> Result<Highscore, AppError> {
    Highscore::from_file(&read_highscore_json(path)?)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Checkpoint sink that rewrites one JSON file.
#[derive(Debug, Clone)]
pub struct JsonCheckpoint {
    path: PathBuf,
    writes: usize,
}

impl JsonCheckpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writes: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl Checkpoint for JsonCheckpoint {
    fn save(&mut self, highscore: &Highscore, progress: &ProgressSnapshot) -> Result<(), AppError> {
        write_highscore_json(&self.path, highscore)?;
        self.writes += 1;
        debug!(
            path = %self.path.display(),
            entries = highscore.len(),
            num_explored = progress.num_explored,
            "highscore saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Model, Node};

    fn sample() -> Highscore {
        let mut highscore = Highscore::new(4);
        for (bits, score) in [([true, false, true], -2.0), ([false, true, false], -1.0)] {
            let mut node = Node::root(Model::from_bools(&bits));
            node.score = score;
            node.coeff = vec![0.25; node.num_features()];
            highscore.insert(node);
        }
        highscore
    }

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("featselect-{}-{name}", std::process::id()))
    }

    #[test]
    fn write_then_load_gives_same_list() {
        let path = temp_file("roundtrip.json");
        let highscore = sample();
        write_highscore_json(&path, &highscore).unwrap();
        let back = load_highscore(&path).unwrap();
        assert_eq!(back.to_file(), highscore.to_file());
        assert_eq!(back.scores(), vec![-1.0, -2.0]);
        assert!(!tmp_path(&path).exists());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn checkpoint_counts_writes() {
        let path = temp_file("checkpoint.json");
        let mut sink = JsonCheckpoint::new(&path);
        let highscore = sample();
        sink.save(&highscore, &ProgressSnapshot::default()).unwrap();
        sink.save(&highscore, &ProgressSnapshot::default()).unwrap();
        assert_eq!(sink.writes(), 2);
        assert_eq!(read_highscore_json(&path).unwrap().max_items, 4);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = read_highscore_json(&temp_file("does-not-exist.json")).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_CONFIG);
    }
}
