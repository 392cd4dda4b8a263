use thiserror::Error;

pub type FvResult<T> = Result<T, FvError>;

#[derive(Debug, Error)]
pub enum FvError {
    #[error("failed to load plugin `{key}`: {detail}")]
    PluginLoad { key: String, detail: String },

    #[error("no test with id `{0}` (use --list-tests for the catalogue)")]
    UnknownTest(String),

    #[error("no plugins found in the library")]
    NoPlugins,

    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("json failure: {0}")]
    Json(#[from] serde_json::Error),
}

impl FvError {
    #[must_use]
    pub fn load_failure(key: &str, detail: impl Into<String>) -> Self {
        Self::PluginLoad {
            key: key.to_owned(),
            detail: detail.into(),
        }
    }

    /// Stable, unique, machine-readable code for every variant.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::PluginLoad { .. } => "FV-PLUGIN-LOAD",
            Self::UnknownTest(_) => "FV-UNKNOWN-TEST",
            Self::NoPlugins => "FV-NO-PLUGINS",
            Self::Io(_) => "FV-IO",
            Self::Json(_) => "FV-JSON",
        }
    }

    /// Usage-level errors exit 2, everything else exits 1.
    #[must_use]
    pub const fn is_usage_error(&self) -> bool {
        matches!(self, Self::UnknownTest(_) | Self::NoPlugins)
    }
}

#[cfg(test)]
mod tests {
    use super::FvError;

    fn all_variants() -> Vec<FvError> {
        vec![
            FvError::load_failure("vendor:plug", "not found"),
            FvError::UnknownTest("Z9".to_owned()),
            FvError::NoPlugins,
            FvError::Io(std::io::Error::other("disk fail")),
            FvError::Json(serde_json::from_str::<serde_json::Value>("{").unwrap_err()),
        ]
    }

    #[test]
    fn every_variant_has_fv_prefixed_code() {
        for error in all_variants() {
            let code = error.error_code();
            assert!(
                code.starts_with("FV-"),
                "code must start with FV- but got `{code}` for {error:?}"
            );
        }
    }

    #[test]
    fn error_codes_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for error in all_variants() {
            assert!(
                seen.insert(error.error_code()),
                "duplicate code {}",
                error.error_code()
            );
        }
    }

    #[test]
    fn load_failure_message_names_the_key() {
        let error = FvError::load_failure("vendor:amp", "dlopen refused");
        let text = error.to_string();
        assert!(text.contains("vendor:amp"), "got: {text}");
        assert!(text.contains("dlopen refused"), "got: {text}");
    }

    #[test]
    fn usage_errors_are_classified() {
        assert!(FvError::UnknownTest("A9".to_owned()).is_usage_error());
        assert!(FvError::NoPlugins.is_usage_error());
        assert!(!FvError::load_failure("k", "d").is_usage_error());
        assert!(!FvError::Io(std::io::Error::other("x")).is_usage_error());
    }

    #[test]
    fn fv_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<FvError>();
        assert_sync::<FvError>();
    }
}
