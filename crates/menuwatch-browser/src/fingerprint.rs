use rand::Rng;

/// Launch fingerprint applied to every browser this process starts.
///
/// Chosen once per process: the monitored site sees the same client across
/// hard restarts, which keeps the persisted session valid.
#[derive(Debug, Clone)]
pub struct FingerprintConfig {
    pub user_agent: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl FingerprintConfig {
    /// Pick a desktop user agent at random for the given window size
    pub fn randomized(viewport_width: u32, viewport_height: u32) -> Self {
        let mut rng = rand::thread_rng();

        let user_agents = [
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
        ];

        let ua_idx = rng.gen_range(0..user_agents.len());

        Self {
            user_agent: user_agents[ua_idx].to_string(),
            viewport_width,
            viewport_height,
        }
    }

    /// Chrome command-line switch carrying the user agent
    pub fn user_agent_arg(&self) -> String {
        format!("--user-agent={}", self.user_agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_randomized_fingerprint() {
        let config = FingerprintConfig::randomized(1440, 900);
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
        assert_eq!(config.viewport_width, 1440);
        assert_eq!(config.viewport_height, 900);
    }

    #[test]
    fn test_user_agent_arg() {
        let config = FingerprintConfig::randomized(800, 600);
        let arg = config.user_agent_arg();
        assert!(arg.starts_with("--user-agent=Mozilla"));
    }
}
