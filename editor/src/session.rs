//! One headless editing session: a scene document opened against the
//! project's assets and prefab library.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use canvas_core::abstract_editor::DocumentState;
use canvas_scene::{
    AssetResolver, AssetTable, OperationRecord, PrefabLibrary, SceneDocument, SceneEditor,
    SceneModel, SceneResult, SelectionMirror, UncheckedAssets,
};

use crate::project::ProjectConfig;

pub struct Session {
    editor: SceneEditor,
    scene_path: PathBuf,
}

/// Counters reported when a session ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub nodes: usize,
    pub view_nodes: usize,
    pub undo_steps: usize,
    pub prefabs: usize,
    pub state: DocumentState,
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            DocumentState::Clean => "clean",
            DocumentState::Dirty => "modified",
        };
        write!(
            f,
            "{} nodes ({} in view), {} undo steps, {} prefabs, {state}",
            self.nodes, self.view_nodes, self.undo_steps, self.prefabs
        )
    }
}

fn open_assets(config: &ProjectConfig) -> SceneResult<Arc<dyn AssetResolver>> {
    match config.manifest_path() {
        Some(path) => Ok(Arc::new(AssetTable::load(&path)?)),
        None => {
            log::info!("no asset manifest configured, accepting every asset reference");
            Ok(Arc::new(UncheckedAssets))
        }
    }
}

impl Session {
    /// Loads the asset manifest, scans the prefab directory and opens
    /// `scene_path`.
    pub fn open(config: &ProjectConfig, scene_path: &Path) -> SceneResult<Self> {
        let assets = open_assets(config)?;

        let mut library = PrefabLibrary::new(config.project_root(), config.prefabs.root.clone());
        library.refresh(assets.as_ref())?;

        let text = std::fs::read_to_string(scene_path)?;
        let document = SceneDocument::from_json_str(&text, assets.as_ref())?;
        log::info!(
            "opened {} ({} nodes)",
            scene_path.display(),
            document.len()
        );

        let model = SceneModel::new(document, library.shared(), assets);
        let editor = SceneEditor::new(
            model,
            Box::new(SelectionMirror::default()),
            config.editor.max_undo,
        );
        Ok(Self {
            editor,
            scene_path: scene_path.to_path_buf(),
        })
    }

    pub fn editor(&self) -> &SceneEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut SceneEditor {
        &mut self.editor
    }

    pub fn scene_path(&self) -> &Path {
        &self.scene_path
    }

    /// Executes every record of a transcript file. Returns how many ran.
    pub fn replay_file(&mut self, path: &Path) -> SceneResult<usize> {
        let text = std::fs::read_to_string(path)?;
        let records: Vec<OperationRecord> = serde_json::from_str(&text)?;
        log::info!("replaying {} records from {}", records.len(), path.display());
        let applied = self.editor.replay(records)?;
        self.editor.pump_notifications();
        Ok(applied)
    }

    /// Writes the undo stack as a transcript file.
    pub fn write_transcript(&self, path: &Path) -> SceneResult {
        let text = serde_json::to_string_pretty(&self.editor.transcript())?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Saves to `output`, or back to the opened file.
    pub fn save(&mut self, output: Option<&Path>) -> SceneResult<PathBuf> {
        let target = output.unwrap_or(&self.scene_path).to_path_buf();
        self.editor.save(&target)?;
        Ok(target)
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            nodes: self.editor.document().len(),
            view_nodes: self.editor.view().len(),
            undo_steps: self.editor.history().undo_count(),
            prefabs: self.editor.model().library().read().len(),
            state: self.editor.document_state(),
        }
    }
}
