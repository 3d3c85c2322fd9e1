use std::path::{Path, PathBuf};

/// File name of the JSON record file inside the data directory.
pub const RECORDS_FILE_NAME: &str = "records.json";

/// On-disk layout of a results data directory.
///
/// ```text
/// <data_dir>/
///   records.json        persisted session summaries
///   logs/tests/*.log    one log file per finalized session
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn records_file(&self) -> PathBuf {
        self.data_dir.join(RECORDS_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs").join("tests")
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new("data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_data_dir_is_relative_data() {
        let cfg = StoreConfig::default();
        assert_eq!(cfg.data_dir(), Path::new("data"));
    }

    #[test]
    fn derived_paths_live_under_data_dir() {
        let cfg = StoreConfig::new("/var/lib/llmeter");
        assert_eq!(
            cfg.records_file(),
            PathBuf::from("/var/lib/llmeter/records.json")
        );
        assert_eq!(cfg.log_dir(), PathBuf::from("/var/lib/llmeter/logs/tests"));
    }
}
