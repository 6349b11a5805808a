use std::fmt;

/// Environment variable holding a Google API key (public or link-shared sheets)
pub const ENV_API_KEY_VAR: &str = "CMWMC_SHEETS_API_KEY";

/// Environment variable holding an OAuth access token (private sheets)
pub const ENV_TOKEN_VAR: &str = "CMWMC_SHEETS_TOKEN";

/// How requests to the Sheets API are authenticated.
#[derive(Clone, PartialEq, Eq)]
pub enum SheetsAuth {
    ApiKey(String),
    Bearer(String),
}

// Keep secrets out of logs
impl fmt::Debug for SheetsAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetsAuth::ApiKey(_) => write!(f, "ApiKey(***)"),
            SheetsAuth::Bearer(_) => write!(f, "Bearer(***)"),
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(val) => {
            let trimmed = val.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        }
        Err(_) => None,
    }
}

/// Read credentials from the environment. A bearer token wins over an API key.
pub fn get_auth_from_env() -> Option<SheetsAuth> {
    non_empty_env(ENV_TOKEN_VAR)
        .map(SheetsAuth::Bearer)
        .or_else(|| non_empty_env(ENV_API_KEY_VAR).map(SheetsAuth::ApiKey))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_secret() {
        let auth = SheetsAuth::ApiKey("AIza-secret".to_string());
        let shown = format!("{:?}", auth);
        assert!(!shown.contains("secret"));
        assert_eq!(shown, "ApiKey(***)");
    }

    #[test]
    fn test_missing_env_is_none() {
        assert_eq!(non_empty_env("CMWMC_TEST_SURELY_UNSET_VAR"), None);
    }
}
