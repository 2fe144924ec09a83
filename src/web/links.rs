//! Shareable URLs for a session and the broadcaster setup text.

use serde::Serialize;

pub const VIEW_WIDTH: u32 = 800;
pub const VIEW_HEIGHT: u32 = 200;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionLinks {
    pub control_url: String,
    pub view_url: String,
    pub obs_instructions: String,
}

impl SessionLinks {
    pub fn new(base_url: &str, session_id: &str) -> Self {
        let view = view_url(base_url, session_id);
        Self {
            control_url: control_url(base_url, session_id),
            obs_instructions: obs_instructions(&view),
            view_url: view,
        }
    }
}

pub fn view_url(base_url: &str, session_id: &str) -> String {
    format!("{}/view/{}", base_url.trim_end_matches('/'), session_id)
}

pub fn control_url(base_url: &str, session_id: &str) -> String {
    format!("{}/control/{}", base_url.trim_end_matches('/'), session_id)
}

pub fn obs_instructions(view_url: &str) -> String {
    [
        "OBS Setup Instructions:".to_string(),
        "1. In OBS, click on the + icon in the Sources panel".to_string(),
        "2. Select \"Browser\" from the list".to_string(),
        "3. Name your source (e.g., \"Timer\") and click OK".to_string(),
        format!("4. In the URL field, paste this URL: {view_url}"),
        format!(
            "5. Set the width to {VIEW_WIDTH} and height to {VIEW_HEIGHT} (adjust as needed)"
        ),
        "6. Check \"Shutdown source when not visible\" for better performance".to_string(),
        "7. Click OK to add the timer to your scene".to_string(),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_share_the_session_id() {
        let links = SessionLinks::new("https://timer.example/", "abc123XYZ0");
        assert_eq!(links.view_url, "https://timer.example/view/abc123XYZ0");
        assert_eq!(links.control_url, "https://timer.example/control/abc123XYZ0");
        assert!(links
            .obs_instructions
            .contains("paste this URL: https://timer.example/view/abc123XYZ0"));
    }

    #[test]
    fn instructions_are_numbered_steps() {
        let text = obs_instructions("http://localhost:3001/view/x");
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 8);
        assert!(lines[7].starts_with("7. "));
    }
}
