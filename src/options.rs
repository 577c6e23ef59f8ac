use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ROUTINES: usize = 10;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone)]
pub struct Options {
    /// requested number of concurrent range downloads
    pub routines: usize,
    /// bounds connect, handshake and the whole transfer of one range
    pub timeout: Duration,
    /// where segments and the combined file live until relocation
    pub temp_dir: PathBuf,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            routines: DEFAULT_ROUTINES,
            timeout: DEFAULT_TIMEOUT,
            temp_dir: std::env::temp_dir().join("concurrent_download"),
        }
    }
}
