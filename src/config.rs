use std::collections::HashMap;
use thiserror::Error;

/// Ambient configuration for a reconstruction run.
///
/// Delays exist to respect an upstream rate limit the system does not
/// control; the defaults are deliberately conservative.
#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    /// Records requested per pagination page.
    pub page_size: usize,
    /// Hard cap on records fetched for one position identifier.
    pub max_records_per_position: usize,
    /// Delay between pagination pages, milliseconds.
    pub page_delay_ms: u64,
    /// Delay between record-body fetches within a page, milliseconds.
    pub record_delay_ms: u64,
    /// Delay between position identifiers, milliseconds.
    pub position_delay_ms: u64,
    /// Total time budget for retrying one upstream call, milliseconds.
    pub retry_budget_ms: u64,
    /// Position identifiers to reconstruct, from env or file.
    pub tracked_positions: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let rpc_url = env_map
            .get("RPC_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("RPC_URL".to_string()))?;

        let page_size = parse_numeric(&env_map, "PAGE_SIZE", 100usize)?;
        let max_records_per_position =
            parse_numeric(&env_map, "MAX_RECORDS_PER_POSITION", 1000usize)?;
        let page_delay_ms = parse_numeric(&env_map, "PAGE_DELAY_MS", 500u64)?;
        let record_delay_ms = parse_numeric(&env_map, "RECORD_DELAY_MS", 200u64)?;
        let position_delay_ms = parse_numeric(&env_map, "POSITION_DELAY_MS", 1000u64)?;
        let retry_budget_ms = parse_numeric(&env_map, "RETRY_BUDGET_MS", 30_000u64)?;

        let tracked_positions = parse_tracked_positions_from_map(&env_map)?;

        Ok(Config {
            rpc_url,
            page_size,
            max_records_per_position,
            page_delay_ms,
            record_delay_ms,
            position_delay_ms,
            retry_budget_ms,
            tracked_positions,
        })
    }
}

fn parse_numeric<T: std::str::FromStr>(
    env_map: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match env_map.get(key) {
        Some(raw) => raw.parse::<T>().map_err(|_| {
            ConfigError::InvalidValue(key.to_string(), format!("cannot parse {:?}", raw))
        }),
        None => Ok(default),
    }
}

fn parse_tracked_positions_from_map(
    env_map: &HashMap<String, String>,
) -> Result<Vec<String>, ConfigError> {
    if let Some(positions_str) = env_map.get("TRACKED_POSITIONS") {
        Ok(positions_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    } else if let Some(file_path) = env_map.get("TRACKED_POSITIONS_FILE") {
        let content = std::fs::read_to_string(file_path).map_err(|_| {
            ConfigError::InvalidValue(
                "TRACKED_POSITIONS_FILE".to_string(),
                "file not found or unreadable".to_string(),
            )
        })?;
        Ok(content
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    } else {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert(
            "RPC_URL".to_string(),
            "https://rpc.example.invalid".to_string(),
        );
        map
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.page_size, 100);
        assert_eq!(config.max_records_per_position, 1000);
        assert_eq!(config.page_delay_ms, 500);
        assert_eq!(config.record_delay_ms, 200);
        assert_eq!(config.position_delay_ms, 1000);
        assert!(config.tracked_positions.is_empty());
    }

    #[test]
    fn test_missing_rpc_url() {
        let result = Config::from_env_map(HashMap::new());
        match result {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "RPC_URL"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_invalid_page_size() {
        let mut env_map = setup_required_env();
        env_map.insert("PAGE_SIZE".to_string(), "not_a_number".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PAGE_SIZE"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_tracked_positions_from_env() {
        let mut env_map = setup_required_env();
        env_map.insert(
            "TRACKED_POSITIONS".to_string(),
            "pos1, pos2 ,,pos3".to_string(),
        );
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(config.tracked_positions, vec!["pos1", "pos2", "pos3"]);
    }

    #[test]
    fn test_tracked_positions_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "pos1").unwrap();
        writeln!(file, "  pos2  ").unwrap();
        writeln!(file).unwrap();

        let mut env_map = setup_required_env();
        env_map.insert(
            "TRACKED_POSITIONS_FILE".to_string(),
            file.path().to_string_lossy().to_string(),
        );
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(config.tracked_positions, vec!["pos1", "pos2"]);
    }

    #[test]
    fn test_tracked_positions_file_missing() {
        let mut env_map = setup_required_env();
        env_map.insert(
            "TRACKED_POSITIONS_FILE".to_string(),
            "/nonexistent/path".to_string(),
        );
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "TRACKED_POSITIONS_FILE"),
            _ => panic!("Expected InvalidValue error"),
        }
    }
}
