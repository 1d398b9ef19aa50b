use rand::Rng;

/// One browser/OS identity: the header bundle a real browser of that
/// fingerprint sends with a top-level navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderProfile {
    /// Short label for logging.
    pub name: &'static str,
    pub headers: &'static [(&'static str, &'static str)],
}

impl HeaderProfile {
    pub fn user_agent(&self) -> &'static str {
        self.headers
            .iter()
            .find(|(name, _)| *name == "User-Agent")
            .map(|(_, value)| *value)
            .unwrap_or("")
    }
}

/// Process-wide pool of client identities. Read-only; one is drawn
/// uniformly at random for every direct-fetch attempt.
pub const PROFILES: &[HeaderProfile] = &[
    HeaderProfile {
        name: "chrome-windows",
        headers: &[
            ("User-Agent", "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"),
            ("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
            ("Accept-Language", "en-US,en;q=0.9"),
            ("Accept-Encoding", "gzip, deflate, br"),
            ("Connection", "keep-alive"),
            ("Upgrade-Insecure-Requests", "1"),
            ("Sec-Fetch-Dest", "document"),
            ("Sec-Fetch-Mode", "navigate"),
            ("Sec-Fetch-Site", "none"),
            ("Cache-Control", "max-age=0"),
            ("DNT", "1"),
            ("Sec-GPC", "1"),
        ],
    },
    HeaderProfile {
        name: "chrome-macos",
        headers: &[
            ("User-Agent", "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"),
            ("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8"),
            ("Accept-Language", "en-US,en;q=0.9"),
            ("Accept-Encoding", "gzip, deflate, br"),
            ("Connection", "keep-alive"),
            ("Upgrade-Insecure-Requests", "1"),
            ("Sec-Fetch-Dest", "document"),
            ("Sec-Fetch-Mode", "navigate"),
            ("Sec-Fetch-Site", "cross-site"),
            ("Sec-Fetch-User", "?1"),
        ],
    },
    HeaderProfile {
        name: "chrome-linux",
        headers: &[
            ("User-Agent", "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"),
            ("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
            ("Accept-Language", "en-US,en;q=0.9"),
            ("Accept-Encoding", "gzip, deflate, br"),
            ("Connection", "keep-alive"),
            ("Upgrade-Insecure-Requests", "1"),
        ],
    },
];

/// Pick a profile uniformly at random. The rng is a parameter so tests
/// can drive selection with a seeded generator.
pub fn pick_profile<'a, R: Rng + ?Sized>(
    pool: &'a [HeaderProfile],
    rng: &mut R,
) -> &'a HeaderProfile {
    &pool[rng.random_range(0..pool.len())]
}
