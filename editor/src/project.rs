use std::path::{Path, PathBuf};

use canvas_core::abstract_editor::DEFAULT_MAX_UNDO;
use serde::Deserialize;

/// Top-level project configuration loaded from `project.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    pub project: ProjectInfo,
    #[serde(default)]
    pub editor: EditorSettings,
    #[serde(default)]
    pub assets: AssetSettings,
    #[serde(default)]
    pub prefabs: PrefabSettings,
    /// Directory holding the project file. Relative paths resolve against it.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// General project information.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditorSettings {
    #[serde(default = "default_max_undo")]
    pub max_undo: usize,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            max_undo: default_max_undo(),
            log_filter: default_log_filter(),
        }
    }
}

/// Asset manifest location. Without one every asset reference is accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetSettings {
    pub manifest: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrefabSettings {
    #[serde(default = "default_prefab_root")]
    pub root: String,
}

impl Default for PrefabSettings {
    fn default() -> Self {
        Self {
            root: default_prefab_root(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_max_undo() -> usize {
    DEFAULT_MAX_UNDO
}

fn default_log_filter() -> String {
    "info".into()
}

fn default_prefab_root() -> String {
    "prefabs".into()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            project: ProjectInfo {
                name: "Untitled".into(),
                root: default_root(),
            },
            editor: EditorSettings::default(),
            assets: AssetSettings::default(),
            prefabs: PrefabSettings::default(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl ProjectConfig {
    /// Absolute-or-cwd-relative project root.
    pub fn project_root(&self) -> PathBuf {
        self.base_dir.join(&self.project.root)
    }

    /// Manifest path resolved against the project root.
    pub fn manifest_path(&self) -> Option<PathBuf> {
        self.assets
            .manifest
            .as_ref()
            .map(|manifest| self.project_root().join(manifest))
    }
}

/// Load a project config from a TOML file.
///
/// Returns `Err` with a human-readable message if the file cannot be read
/// or parsed.
pub fn load_project(path: &Path) -> Result<ProjectConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let mut config: ProjectConfig =
        toml::from_str(&content).map_err(|e| format!("failed to parse {}: {e}", path.display()))?;
    config.base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok(config)
}

/// Accepts a loaded config, falling back to defaults when loading failed.
///
/// Split from [`load_project`] so the logger can be configured from the
/// file before the outcome is reported.
pub fn or_default(loaded: Result<ProjectConfig, String>) -> ProjectConfig {
    match loaded {
        Ok(config) => {
            log::info!(
                "Loaded project: {} (root {}, prefabs in '{}')",
                config.project.name,
                config.project_root().display(),
                config.prefabs.root
            );
            config
        }
        Err(e) => {
            log::warn!("No project file ({e}), using defaults");
            ProjectConfig::default()
        }
    }
}
