use thiserror::Error;

/// Errors related to reading the process environment.
#[derive(Debug, Error)]
pub enum EnvError {
    /// An environment variable required by the application is not set.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// The variable is set but holds only whitespace.
    #[error("Environment variable {0} is empty")]
    Empty(String),
}

/// Reads an environment variable, returning a structured error if it's missing.
///
/// This is a thin wrapper around `std::env::var` that provides a more
/// ergonomic and specific error type for missing or blank variables.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, EnvError> {
    let value = std::env::var(name).map_err(|_| EnvError::MissingEnvVar(name.to_string()))?;
    if value.trim().is_empty() {
        return Err(EnvError::Empty(name.to_string()));
    }
    Ok(value)
}

/// Like [`get_env_var`], but treats missing and blank values alike as `None`.
pub fn optional_env_var(name: &str) -> Option<String> {
    get_env_var(name).ok()
}

/// Returns the first of `names` that is set to a non-blank value, with its name.
pub fn first_env_var<'a>(names: &[&'a str]) -> Option<(&'a str, String)> {
    names
        .iter()
        .find_map(|name| optional_env_var(name).map(|v| (*name, v)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNSET: &str = "SHARED_UTILS_TEST_SURELY_UNSET_9F3A";

    #[test]
    fn missing_var_is_reported_by_name() {
        match get_env_var(UNSET) {
            Err(EnvError::MissingEnvVar(name)) => assert_eq!(name, UNSET),
            other => panic!("expected MissingEnvVar, got {other:?}"),
        }
        assert!(optional_env_var(UNSET).is_none());
    }

    #[test]
    fn first_env_var_skips_unset_names() {
        assert!(first_env_var(&[UNSET, "SHARED_UTILS_TEST_ALSO_UNSET_1C2D"]).is_none());
    }
}
