// src/core/env.rs
//
// Environment composition: merges named layers (SDK, workspace, project,
// build configuration, ad-hoc overrides) into one flat map with a fixed
// precedence order. Pure and deterministic; no I/O happens here.

use std::collections::HashMap;

/// A single environment variable value inside a layer: either a scalar
/// string or an ordered list joined with a per-key separator at composition
/// time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerValue {
    Scalar(String),
    List(Vec<String>),
}

/// One named source of environment variables. Layers are merged left to
/// right; a key present in a later layer always wins, even when its value is
/// empty. Layer builders are expected to omit keys that are unset.
#[derive(Debug, Clone)]
pub struct EnvironmentLayer {
    pub name: &'static str,
    vars: Vec<(String, LayerValue)>,
    deletions: Vec<String>,
}

impl EnvironmentLayer {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            vars: Vec::new(),
            deletions: Vec::new(),
        }
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.vars
            .push((key.to_string(), LayerValue::Scalar(value.into())));
    }

    pub fn set_list(&mut self, key: &str, values: Vec<String>) {
        self.vars.push((key.to_string(), LayerValue::List(values)));
    }

    /// Adds a list key only when it has entries; unset lists stay out of the
    /// merge so they cannot shadow a lower layer.
    pub fn set_list_if_any(&mut self, key: &str, values: &[String]) {
        if !values.is_empty() {
            self.set_list(key, values.to_vec());
        }
    }

    pub fn set_if_nonempty(&mut self, key: &str, value: &str) {
        if !value.is_empty() {
            self.set(key, value);
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.iter().any(|(k, _)| k == key)
    }

    pub fn remove(&mut self, key: &str) {
        self.vars.retain(|(k, _)| k != key);
    }

    /// Marks a key for deletion from the composed map. Unlike [`remove`],
    /// which only drops this layer's own entry, a deletion also erases the
    /// key contributed by any lower-precedence layer.
    ///
    /// [`remove`]: EnvironmentLayer::remove
    pub fn delete(&mut self, key: &str) {
        self.remove(key);
        self.deletions.push(key.to_string());
    }

    pub fn deletions(&self) -> &[String] {
        &self.deletions
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty() && self.deletions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LayerValue)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// How a list-valued variable is flattened into a single string.
///
/// The default is the platform path-list separator. `EXTRA_ZEPHYR_MODULES`
/// is declared to always join with `;` because the build tool parses it as a
/// CMake-style list on every platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinStyle {
    PathList,
    CmakeList,
}

pub fn join_style(key: &str) -> JoinStyle {
    match key {
        "EXTRA_ZEPHYR_MODULES" => JoinStyle::CmakeList,
        _ => JoinStyle::PathList,
    }
}

/// The platform path-list separator: `;` on Windows, `:` elsewhere.
pub fn path_list_separator() -> char {
    if cfg!(target_os = "windows") { ';' } else { ':' }
}

fn join_list(key: &str, values: &[String], platform_sep: char) -> String {
    let sep = match join_style(key) {
        JoinStyle::PathList => platform_sep,
        JoinStyle::CmakeList => ';',
    };
    values.join(&sep.to_string())
}

/// Flattens ordered layers into one key/value map.
///
/// Layers are applied in ascending precedence: later layers overwrite
/// earlier ones on key collision, regardless of value. List values are
/// joined per [`join_style`].
pub fn compose(layers: &[EnvironmentLayer]) -> HashMap<String, String> {
    compose_with_separator(layers, path_list_separator())
}

fn compose_with_separator(
    layers: &[EnvironmentLayer],
    platform_sep: char,
) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for layer in layers {
        for (key, value) in layer.iter() {
            let rendered = match value {
                LayerValue::Scalar(s) => s.clone(),
                LayerValue::List(xs) => join_list(key, xs, platform_sep),
            };
            log::trace!("env[{}] {} = {}", layer.name, key, rendered);
            out.insert(key.to_string(), rendered);
        }
        for key in layer.deletions() {
            log::trace!("env[{}] deletes {}", layer.name, key);
            out.remove(key);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(name: &'static str, pairs: &[(&str, &str)]) -> EnvironmentLayer {
        let mut l = EnvironmentLayer::new(name);
        for (k, v) in pairs {
            l.set(k, *v);
        }
        l
    }

    #[test]
    fn later_layer_wins_on_collision() {
        let a = layer("a", &[("X", "1"), ("Y", "1")]);
        let b = layer("b", &[("X", "2")]);
        let composed = compose(&[a, b]);
        assert_eq!(composed.get("X").map(String::as_str), Some("2"));
        assert_eq!(composed.get("Y").map(String::as_str), Some("1"));
    }

    #[test]
    fn empty_value_in_higher_layer_still_wins() {
        let a = layer("a", &[("CONF_FILE", "prj.conf")]);
        let b = layer("b", &[("CONF_FILE", "")]);
        let composed = compose(&[a, b]);
        assert_eq!(composed.get("CONF_FILE").map(String::as_str), Some(""));
    }

    #[test]
    fn list_joined_with_windows_separator() {
        let mut l = EnvironmentLayer::new("cfg");
        l.set_list("SHIELD", vec!["a".into(), "b".into()]);
        let composed = compose_with_separator(&[l], ';');
        assert_eq!(composed.get("SHIELD").map(String::as_str), Some("a;b"));
    }

    #[test]
    fn list_joined_with_posix_separator() {
        let mut l = EnvironmentLayer::new("cfg");
        l.set_list("SHIELD", vec!["a".into(), "b".into()]);
        let composed = compose_with_separator(&[l], ':');
        assert_eq!(composed.get("SHIELD").map(String::as_str), Some("a:b"));
    }

    #[test]
    fn module_list_always_joins_with_semicolon() {
        let mut l = EnvironmentLayer::new("project");
        l.set_list(
            "EXTRA_ZEPHYR_MODULES",
            vec!["/mods/a".into(), "/mods/b".into()],
        );
        let composed = compose_with_separator(&[l], ':');
        assert_eq!(
            composed.get("EXTRA_ZEPHYR_MODULES").map(String::as_str),
            Some("/mods/a;/mods/b")
        );
    }

    #[test]
    fn composition_is_deterministic() {
        let layers = vec![
            layer("a", &[("X", "1"), ("Y", "2")]),
            layer("b", &[("Z", "3")]),
        ];
        assert_eq!(compose(&layers), compose(&layers));
    }

    #[test]
    fn ad_hoc_override_layer_beats_every_other_layer() {
        let sdk = layer("sdk", &[("ZEPHYR_SDK_INSTALL_DIR", "/opt/sdk")]);
        let cfg = layer("build-config", &[("BOARD", "nucleo_f401re")]);
        let overrides = layer("task-override", &[("BOARD", "qemu_x86")]);
        let composed = compose(&[sdk, cfg, overrides]);
        assert_eq!(composed.get("BOARD").map(String::as_str), Some("qemu_x86"));
        assert_eq!(
            composed.get("ZEPHYR_SDK_INSTALL_DIR").map(String::as_str),
            Some("/opt/sdk")
        );
    }

    #[test]
    fn deletion_erases_keys_from_lower_layers() {
        let project = layer("project", &[("EXTRA_CONF_FILE", "from-project.conf")]);
        let mut cfg = layer("build-config", &[("BOARD", "nucleo_f401re")]);
        cfg.delete("CONF_FILE");
        cfg.delete("EXTRA_CONF_FILE");
        let composed = compose(&[project, cfg]);
        assert!(!composed.contains_key("CONF_FILE"));
        assert!(!composed.contains_key("EXTRA_CONF_FILE"));
        assert_eq!(
            composed.get("BOARD").map(String::as_str),
            Some("nucleo_f401re")
        );
    }

    #[test]
    fn unset_lists_are_omitted() {
        let mut l = EnvironmentLayer::new("project");
        l.set_list_if_any("SHIELD", &[]);
        assert!(l.is_empty());
    }
}
