//! Endpoint sets probed per action type

/// The endpoints that must answer before a claim of the given kind can be
/// confirmed. Unknown action types get the general set.
pub fn endpoints_for(action_type: &str) -> Vec<String> {
    let paths: &[&str] = match action_type {
        "live_claim" => &["/health", "/system-health", "/memory"],
        "deployment" => &["/health", "/system-health", "/"],
        "feature_activation" => &["/health", "/system-health", "/stats"],
        "system_change" => &["/health", "/memory", "/stats"],
        "file_check" => &["/health", "/"],
        "api_check" => &["/health", "/memory", "/stats", "/system-health"],
        "session_operation" => &["/health", "/memory"],
        _ => &["/health", "/"],
    };

    paths.iter().map(|p| p.to_string()).collect()
}
