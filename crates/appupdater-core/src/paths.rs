use std::path::{Component, Path};

/// Compares two paths component by component, ignoring case and `.` segments.
pub fn paths_equal_ignore_case(left: &Path, right: &Path) -> bool {
    let left = folded_components(left);
    let right = folded_components(right);
    left == right
}

fn folded_components(path: &Path) -> Vec<String> {
    path.components()
        .filter(|component| !matches!(component, Component::CurDir))
        .map(|component| component.as_os_str().to_string_lossy().to_lowercase())
        .collect()
}
