//! Where saved onboarding answers come from.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, warn};

use blueprint_db::queries::onboarding as onboarding_db;

use super::{ClientProfile, OnboardingData, PlanRequest, build_request};

/// A place that may hold saved onboarding answers and a client profile.
#[async_trait]
pub trait OnboardingSource: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// The saved onboarding answers, if any.
    async fn onboarding(&self) -> Result<Option<OnboardingData>>;

    /// The saved client profile, if any.
    async fn client_profile(&self) -> Result<Option<ClientProfile>> {
        Ok(None)
    }
}

/// Reads the newest row of `onboarding_responses`.
#[derive(Debug, Clone)]
pub struct PgOnboardingSource {
    pool: PgPool,
}

impl PgOnboardingSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OnboardingSource for PgOnboardingSource {
    fn name(&self) -> &str {
        "database"
    }

    async fn onboarding(&self) -> Result<Option<OnboardingData>> {
        let row = onboarding_db::latest_onboarding(&self.pool).await?;
        Ok(row.as_ref().map(OnboardingData::from))
    }
}

/// Build a request from the first source that has onboarding answers.
///
/// The profile is taken from the first source that has one. Read errors are
/// logged and treated as "no record", so this never fails.
pub async fn assemble_request(sources: &[&dyn OnboardingSource]) -> Option<PlanRequest> {
    let mut onboarding = None;
    let mut profile = None;

    for source in sources {
        if onboarding.is_none() {
            match source.onboarding().await {
                Ok(Some(data)) => {
                    debug!(source = source.name(), "onboarding answers found");
                    onboarding = Some(data);
                }
                Ok(None) => {}
                Err(e) => warn!(source = source.name(), error = %format!("{e:#}"), "failed to read onboarding answers"),
            }
        }
        if profile.is_none() {
            match source.client_profile().await {
                Ok(found) => profile = found,
                Err(e) => warn!(source = source.name(), error = %format!("{e:#}"), "failed to read client profile"),
            }
        }
        if onboarding.is_some() && profile.is_some() {
            break;
        }
    }

    build_request(onboarding.as_ref(), profile.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        label: &'static str,
        onboarding: Option<OnboardingData>,
        profile: Option<ClientProfile>,
        fail: bool,
    }

    #[async_trait]
    impl OnboardingSource for Fixed {
        fn name(&self) -> &str {
            self.label
        }

        async fn onboarding(&self) -> Result<Option<OnboardingData>> {
            if self.fail {
                anyhow::bail!("connection refused");
            }
            Ok(self.onboarding.clone())
        }

        async fn client_profile(&self) -> Result<Option<ClientProfile>> {
            Ok(self.profile.clone())
        }
    }

    fn answers(name: &str) -> OnboardingData {
        OnboardingData {
            business_name: Some(name.to_string()),
            industry: Some("Retail".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn first_source_with_answers_wins() {
        let empty = Fixed {
            label: "db",
            onboarding: None,
            profile: None,
            fail: false,
        };
        let cache = Fixed {
            label: "cache",
            onboarding: Some(answers("Cached Co")),
            profile: None,
            fail: false,
        };
        let req = assemble_request(&[&empty, &cache]).await.unwrap();
        assert_eq!(req.business_name, "Cached Co");
    }

    #[tokio::test]
    async fn failing_source_is_skipped() {
        let broken = Fixed {
            label: "db",
            onboarding: Some(answers("Never")),
            profile: None,
            fail: true,
        };
        let cache = Fixed {
            label: "cache",
            onboarding: Some(answers("Fallback Co")),
            profile: None,
            fail: false,
        };
        let req = assemble_request(&[&broken, &cache]).await.unwrap();
        assert_eq!(req.business_name, "Fallback Co");
    }

    #[tokio::test]
    async fn profile_from_later_source_fills_gaps() {
        let db = Fixed {
            label: "db",
            onboarding: Some(OnboardingData::default()),
            profile: None,
            fail: false,
        };
        let cache = Fixed {
            label: "cache",
            onboarding: None,
            profile: Some(ClientProfile {
                company_name: Some("Profile Co".to_string()),
                ..Default::default()
            }),
            fail: false,
        };
        let req = assemble_request(&[&db, &cache]).await.unwrap();
        assert_eq!(req.business_name, "Profile Co");
    }

    #[tokio::test]
    async fn no_answers_anywhere() {
        let empty = Fixed {
            label: "db",
            onboarding: None,
            profile: None,
            fail: false,
        };
        assert!(assemble_request(&[&empty]).await.is_none());
        assert!(assemble_request(&[]).await.is_none());
    }
}
