//! Active Profile Reader

use std::sync::Arc;

use devtools_types::Environment;

#[derive(Clone)]
pub struct ProfileReader {
    environment: Arc<dyn Environment>,
}

impl ProfileReader {
    pub fn new(environment: Arc<dyn Environment>) -> Self {
        Self { environment }
    }

    /// Active profiles exactly as the host declares them
    pub fn list_active_profiles(&self) -> Vec<String> {
        self.environment.active_profiles()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devtools_host::HostEnvironment;

    fn reader(profiles: serde_json::Value) -> ProfileReader {
        ProfileReader::new(Arc::new(HostEnvironment::from_value(serde_json::json!({
            "profiles": { "active": profiles }
        }))))
    }

    #[test]
    fn test_order_preserved() {
        assert_eq!(
            reader(serde_json::json!(["dev", "local"])).list_active_profiles(),
            vec!["dev", "local"]
        );
    }

    #[test]
    fn test_duplicates_preserved() {
        assert_eq!(
            reader(serde_json::json!(["local", "dev", "local"])).list_active_profiles(),
            vec!["local", "dev", "local"]
        );
    }
}
