//! Client classification and rendering policy.
//!
//! Classification is a user-agent heuristic. It is trivially spoofable and
//! only decides whether a client gets the optimized response or the
//! fallback, never anything privileged.

use snapgate_config::RenderStrategy;

/// Case-insensitive user-agent substrings identifying automated clients.
const CRAWLER_TOKENS: &[&str] = &[
    "bot",
    "crawler",
    "spider",
    "robot",
    "crawling",
    "slurp",
    "facebookexternalhit",
    "embedly",
    "preview",
    "lighthouse",
];

/// Who is making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientClass {
    /// Crawler, link previewer or other automation.
    Automated,
    /// Anything else.
    Human,
}

/// Route category a strategy applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteCategory {
    /// Prerendered snapshot routes.
    Static,
    /// Template plus loader routes.
    Dynamic,
}

/// Rendering strategy per route category.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenderingPolicy {
    /// Strategy for static routes.
    pub static_strategy: RenderStrategy,
    /// Strategy for dynamic routes.
    pub dynamic_strategy: RenderStrategy,
}

impl RenderingPolicy {
    /// Whether a client of `class` gets the optimized response for `category`.
    pub fn allows(&self, category: RouteCategory, class: ClientClass) -> bool {
        let strategy = match category {
            RouteCategory::Static => self.static_strategy,
            RouteCategory::Dynamic => self.dynamic_strategy,
        };
        match strategy {
            RenderStrategy::AllRequests => true,
            RenderStrategy::BotOnly => class == ClientClass::Automated,
        }
    }
}

/// Classify a client by its `User-Agent` header.
///
/// A missing header is treated as human.
pub fn classify_client(user_agent: Option<&str>) -> ClientClass {
    let Some(agent) = user_agent else {
        return ClientClass::Human;
    };
    let agent = agent.to_ascii_lowercase();
    if CRAWLER_TOKENS.iter().any(|token| agent.contains(token)) {
        ClientClass::Automated
    } else {
        ClientClass::Human
    }
}
