pub mod onboarding;
pub mod plans;
pub mod token_usage;
