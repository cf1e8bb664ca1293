/// Centralized key display adapter for sentinel-char to display-name conversions.
///
/// **Sentinel boundary policy:**
/// Sentinel chars (`'\x08'`, `'\t'`, `'\n'`) are allowed only at two boundaries:
/// 1. **Input boundary** — callers translate their key events into chars before
///    handing them to `TextInput::step`; Backspace becomes [`BACKSPACE`].
/// 2. **Storage boundary** — histograms and key stats store whitespace as `char` keys.
///
/// Reports and tables must consume these adapter functions rather than
/// printing sentinels directly.

/// Human-readable display name for a key character (including sentinels).
/// Returns `""` for printable chars — caller uses `ch.to_string()` for those.
pub fn key_display_name(ch: char) -> &'static str {
    match ch {
        BACKSPACE => "Backspace",
        TAB => "Tab",
        ENTER => "Enter",
        SPACE => "Space",
        _ => "",
    }
}

/// Label for a key in a text report: the display name for sentinels and
/// whitespace, the character itself otherwise.
pub fn key_label(ch: char) -> String {
    match key_display_name(ch) {
        "" => ch.to_string(),
        name => name.to_string(),
    }
}

/// Sentinel char for Backspace.
pub const BACKSPACE: char = '\x08';
/// Sentinel char for Tab.
pub const TAB: char = '\t';
/// Sentinel char for Enter.
pub const ENTER: char = '\n';
/// Space character, the canonical form of every whitespace variant.
pub const SPACE: char = ' ';
