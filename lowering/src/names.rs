//! Naming conventions that tell controls, modules and template strings
//! apart from plain markup.

const TEMPLATE_PLUGINS: &[&str] = &["wml!", "tmpl!", "html!"];

fn starts_upper(segment: &str) -> bool {
    segment.chars().next().map_or(false, char::is_uppercase)
}

fn is_path_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '-' || ch == '$')
}

/// `Controls.Button`, `Controls.buttons.Button` or `js!SBIS3.Button`: a
/// dotted name whose last segment is capitalized.
pub fn is_control_string(name: &str) -> bool {
    if let Some(rest) = name.strip_prefix("js!") {
        return !rest.is_empty();
    }
    let segments: Vec<&str> = name.split('.').collect();
    segments.len() > 1
        && segments.iter().all(|segment| is_path_segment(segment))
        && segments.last().map_or(false, |last| starts_upper(last))
}

/// `Controls/Button`: a slashed module path whose last segment is
/// capitalized.
pub fn is_slashed_control(name: &str) -> bool {
    let segments: Vec<&str> = name.split('/').collect();
    segments.len() > 1
        && segments.iter().all(|segment| is_path_segment(segment))
        && segments.last().map_or(false, |last| starts_upper(last))
}

/// `wml!Controls/list` and friends.
pub fn is_template_string(name: &str) -> bool {
    TEMPLATE_PLUGINS
        .iter()
        .any(|plugin| name.strip_prefix(plugin).map_or(false, |rest| !rest.is_empty()))
}

/// Splits `Controls.buttons:Button` into its library path `Controls/buttons`
/// and the exported name `Button`. Libraries are capitalized, which keeps
/// namespaced markup like `svg:rect` out.
pub fn split_module_name(name: &str) -> Option<(String, String)> {
    if name.starts_with("ws:") {
        return None;
    }
    let (library, module) = name.split_once(':')?;
    let library_segments: Vec<&str> = library.split('.').collect();
    let valid = library_segments.first().map_or(false, |first| starts_upper(first))
        && library_segments.iter().all(|segment| is_path_segment(segment))
        && module.split('.').all(is_path_segment);
    if valid {
        Some((library_segments.join("/"), module.to_string()))
    } else {
        None
    }
}

/// Module path a control tag loads: dots become slashes, `js!` names are
/// kept as they are.
pub fn control_path(name: &str) -> String {
    if name.starts_with("js!") {
        name.to_string()
    } else {
        name.replace('.', "/")
    }
}
