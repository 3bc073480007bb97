//! Long static prompt constants.
//!
//! These are first-class `&'static str` resources, never assembled from
//! scattered fragments at call time.

/// The `<SERVER_APIS>` block: a verbatim-per-deployment catalog of server
/// endpoints and `helpers.*` client methods available to generated pages.
pub const SERVER_APIS: &str = r#"<SERVER_APIS>
Available server endpoints and client helpers for generated pages:

- GET /api/page/{name} — fetch the stored HTML for a page by name.
  Response: { html: string }
- POST /api/page/{name} — overwrite the stored HTML for a page.
  Request: { html: string } Response: { ok: boolean }
- POST /api/transform — submit a natural-language change request against
  the current page. Request: { message: string } Response:
  { html: string, changeCount: number }

Client helpers available as `helpers.*` inside generated pages:

- helpers.fetchJSON(url, options) — fetch wrapper returning parsed JSON,
  throws on non-2xx responses.
- helpers.postScript(id, variables) — invoke a configured server script
  by id with the given variables, returns its declared response type.
- helpers.toast(message) — show a transient notification in the chat
  panel without appending a chat message.
</SERVER_APIS>"#;

/// Fixed instruction block appended to every user message.
///
/// Specifies locked-element editing rules, the chain-of-thought
/// requirement, chat etiquette, the clearing-chat rule, and the
/// full-viewer class rule for animations/games.
pub const TRANSFORM_INSTR: &str = r#"Rules for this transformation:

1. Locked elements (carrying `data-locked`) must never be removed, but
   their inner text and unlocked children may still be edited.
2. Begin every response by updating the hidden `#thoughts` element with a
   brief note on what you are about to do.
3. Chat etiquette: append a `User:` message followed by a `SynthOS:`
   message to `#chatMessages`, each using the page's existing message
   HTML shape.
4. If asked to clear the chat, keep only the first SynthOS greeting
   message and delete the rest.
5. For pages that are primarily an animation, game, or other full-bleed
   experience, apply the page's full-viewer class to the root container
   instead of leaving the default chat/viewer split in place.

Respond with a JSON array of change operations and nothing else. Each
operation is one of:

  {"op":"update","nodeId":"<id>","html":"<inner html>"}
  {"op":"replace","nodeId":"<id>","html":"<outer html>"}
  {"op":"delete","nodeId":"<id>"}
  {"op":"insert","parentId":"<id>","position":"prepend|append|before|after","html":"<fragment>"}
  {"op":"style-element","nodeId":"<id>","style":"<css>"}

Example:
[{"op":"update","nodeId":"4","html":"Hello, world!"}]

Return ONLY the JSON array. No prose, no code fences, no explanation."#;

/// Render the `<THEME>` block body for a given mode and custom-property
/// list. `colors` are rendered in iteration order as `--name: value`.
pub fn theme_block(mode: &str, colors: &[(String, String)]) -> String {
    let mut out = String::from("<THEME>\n");
    out.push_str(&format!("Mode: {}\n\n", mode));
    out.push_str("CSS custom properties:\n");
    for (name, value) in colors {
        out.push_str(&format!("- --{}: {}\n", name, value));
    }
    out.push_str(
        "\nPre-styled shell classes are available: `.chat-panel`, \
         `.viewer-panel`, `.message-user`, `.message-assistant`.\n",
    );
    out.push_str(
        "Header alignment: align headings with the shell's existing \
         typography scale rather than introducing new font sizes.\n",
    );
    out.push_str(
        "Full-viewer mode: apply the shell's full-viewer class to replace \
         the chat/viewer split for immersive content.\n",
    );
    out.push_str(
        "Protected infrastructure: never restyle `#chatMessages`, \
         `#thoughts`, or any element carrying `data-locked`.\n",
    );
    out.push_str(&format!(
        "\nReminder: this page is currently in {} mode — apply {} \
         overrides for any custom colors you introduce.\n",
        mode, mode
    ));
    out.push_str("</THEME>");
    out
}
