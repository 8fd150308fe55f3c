use std::time::Duration;

/// Client-side request budget for one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPolicy {
    pub provider: String,
    pub quota_window: Duration,
    pub quota_limit: u32,
}

impl ProviderPolicy {
    pub fn new(provider: &str, quota_window: Duration, quota_limit: u32) -> Self {
        Self {
            provider: provider.to_owned(),
            quota_window,
            quota_limit,
        }
    }

    /// Starter-plan budget.
    pub fn fmp_default() -> Self {
        Self::new("fmp", Duration::from_secs(60), 300)
    }

    pub fn nasdaq_default() -> Self {
        Self::new("nasdaq", Duration::from_secs(60), 60)
    }

    /// The public SDMX endpoint allows 20 queries per minute.
    pub fn oecd_default() -> Self {
        Self::new("oecd", Duration::from_secs(60), 20)
    }
}
