use std::env;
use std::fs;
use std::path::PathBuf;

const ROOT_ENV: &str = "PARTS_ASSISTANT_ROOT";
const DATA_DIR_ENV: &str = "PARTS_ASSISTANT_DATA_DIR";

/// Filesystem layout of a running server.
///
/// `project_root` holds the shipped `config.yml`. `user_data_dir` holds the
/// operator overrides (`config.yml`, `secrets.yaml`) and the `logs/` directory.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub project_root: PathBuf,
    pub user_data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub secrets_path: PathBuf,
}

impl AppPaths {
    /// Root from `PARTS_ASSISTANT_ROOT` or the working directory; data dir from
    /// `PARTS_ASSISTANT_DATA_DIR`, else the root itself.
    pub fn new() -> Self {
        let project_root = env_dir(ROOT_ENV)
            .or_else(|| env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        let user_data_dir = env_dir(DATA_DIR_ENV).unwrap_or_else(|| project_root.clone());
        Self::from_dirs(project_root, user_data_dir)
    }

    pub fn from_dirs(project_root: PathBuf, user_data_dir: PathBuf) -> Self {
        let log_dir = user_data_dir.join("logs");
        let secrets_path = user_data_dir.join("secrets.yaml");

        if let Err(err) = fs::create_dir_all(&log_dir) {
            eprintln!("Could not create log directory {}: {}", log_dir.display(), err);
        }

        AppPaths {
            project_root,
            user_data_dir,
            log_dir,
            secrets_path,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn env_dir(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
