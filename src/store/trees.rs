pub const LEARNER_PROFILES: &str = "learner_profiles";
pub const META: &str = "meta";
