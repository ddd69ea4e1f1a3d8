use rand::seq::SliceRandom;

const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const USER_AGENTS: [&str; 3] = [
    DESKTOP_USER_AGENT,
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
];

const VIEWPORTS: [(u32, u32); 4] = [(1920, 1080), (1366, 768), (1536, 864), (1440, 900)];

/// Browser identity presented to the maps site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintConfig {
    pub user_agent: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub accept_language: String,
}

impl FingerprintConfig {
    /// Fixed desktop Chrome profile with the given window size
    pub fn desktop(width: u32, height: u32) -> Self {
        Self {
            user_agent: DESKTOP_USER_AGENT.to_string(),
            viewport_width: width,
            viewport_height: height,
            accept_language: "ru-RU,ru;q=0.9,en;q=0.8".to_string(),
        }
    }

    /// Desktop profile with a randomly chosen user agent and viewport
    pub fn randomized() -> Self {
        let mut rng = rand::thread_rng();
        let user_agent = USER_AGENTS
            .choose(&mut rng)
            .copied()
            .unwrap_or(DESKTOP_USER_AGENT);
        let (width, height) = VIEWPORTS.choose(&mut rng).copied().unwrap_or((1920, 1080));

        Self {
            user_agent: user_agent.to_string(),
            ..Self::desktop(width, height)
        }
    }
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self::desktop(1920, 1080)
    }
}
