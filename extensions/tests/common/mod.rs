use std::env;

// Helper function to read a setting or skip the test
pub fn get_env_or_skip(var_name: &str, test_name: &str) -> Option<String> {
    dotenv::dotenv().ok(); // Load .env file if present

    match env::var(var_name) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => {
            println!("Skipping integration test {} - {} environment variable not set.", test_name, var_name);
            None // Signal to skip
        }
    }
}

// Optional settings fall back to a default instead of skipping
pub fn get_env_or(var_name: &str, default: &str) -> String {
    dotenv::dotenv().ok();
    env::var(var_name).ok().filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_string())
}
