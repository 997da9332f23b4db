//! Cross-origin notifier
//!
//! Best-effort, fire-and-forget delivery of an "authenticate now" signal
//! to the sibling origin, via a hidden iframe load plus a localStorage
//! flag for same-tab delivery. There is no acknowledgment and no retry:
//! a blocked or failed iframe simply means the user logs in again on the
//! other site.

use flixsync_core::{SiteId, SYNC_FLAG_KEY, SYNC_MESSAGE_TYPE};

/// The initiating page detaches the sync iframe after this many seconds,
/// whether or not its script ran
pub const IFRAME_DETACH_SECS: u64 = 3;

/// Build the sync-page URL the client loads in a hidden iframe
pub fn sync_page_url(target_base: &str, user_id: &str, email: &str, from: SiteId) -> String {
    format!(
        "{}/auth/cross-domain-sync?userId={}&email={}&from={}",
        target_base.trim_end_matches('/'),
        urlencoding::encode(user_id),
        urlencoding::encode(email),
        from
    )
}

/// Embed a value in an inline script as a JS string literal
fn js_string(value: &str) -> String {
    // serde_json escapes quotes and control characters; '<' is escaped on
    // top of that so "</script>" inside a value cannot close the tag
    serde_json::to_string(value)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace('<', "\\u003c")
}

/// Render the minimal HTML document served at /auth/cross-domain-sync.
/// The script posts the sync event to the parent window and writes the
/// same-tab flag; it asserts nothing trusted.
pub fn render_sync_page(user_id: &str, email: &str, from: SiteId, target: SiteId) -> String {
    let user_id = js_string(user_id);
    let email = js_string(email);
    let from = js_string(from.as_str());
    let target = js_string(target.as_str());

    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Syncing...</title>
  </head>
  <body>
    <script>
      if (window.parent && window.parent !== window) {{
        window.parent.postMessage({{
          type: '{SYNC_MESSAGE_TYPE}',
          userId: {user_id},
          email: {email},
          from: {from},
          target: {target},
          timestamp: Date.now()
        }}, '*');
      }}
      try {{
        localStorage.setItem('{SYNC_FLAG_KEY}', JSON.stringify({{
          userId: {user_id},
          email: {email},
          timestamp: Date.now()
        }}));
      }} catch (e) {{}}
    </script>
  </body>
</html>
"#
    )
}

/// Fire-and-forget push of a sync claim to the peer's sync-from endpoint
pub async fn push_claim(
    client: &reqwest::Client,
    peer_base: &str,
    from: SiteId,
    user_id: &str,
    email: &str,
) {
    let url = format!(
        "{}/auth/sync-from-{}",
        peer_base.trim_end_matches('/'),
        from
    );
    let body = serde_json::json!({ "userId": user_id, "email": email });

    match client.post(&url).json(&body).send().await {
        Ok(resp) if resp.status().is_success() => {
            tracing::debug!(%url, "Pushed sync claim to peer");
        }
        Ok(resp) => {
            tracing::warn!(%url, status = %resp.status(), "Peer rejected sync claim");
        }
        Err(err) => {
            // Expected failure mode: the peer may be unreachable. The
            // user just logs in again on the other site.
            tracing::debug!(%url, error = %err, "Failed to push sync claim to peer");
        }
    }
}
