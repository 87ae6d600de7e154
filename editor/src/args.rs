//! Command line arguments.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "canvas-editor",
    about = "Headless Canvas scene editor",
    long_about = "Opens a Canvas scene against a project's assets and prefabs.\n\n\
        An operation transcript can be replayed onto the scene and the result\n\
        saved back, which is how recorded edits are applied in batch.\n\
        \n\
        EXAMPLES:\n\
          # Check that a scene loads\n\
          canvas-editor levels/intro.json\n\
        \n\
          # Apply a transcript and write the result elsewhere\n\
          canvas-editor --replay edits.json --output out.json levels/intro.json",
    version
)]
pub struct EditorArgs {
    /// Project configuration file.
    #[arg(long, default_value = "project.toml")]
    pub project: PathBuf,

    /// Scene document to open.
    pub scene: PathBuf,

    /// Operation transcript (JSON array of records) to replay.
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Where to save the scene. Defaults to the opened file when it changed.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Write the session's undo stack as a transcript.
    #[arg(long)]
    pub record: Option<PathBuf>,

    /// Log at debug level regardless of the project filter.
    #[arg(long, short)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_valid() {
        EditorArgs::command().debug_assert();
    }

    #[test]
    fn parses_all_flags() {
        let args = EditorArgs::parse_from([
            "canvas-editor",
            "--project",
            "game/project.toml",
            "--replay",
            "t.json",
            "--output",
            "out.json",
            "-v",
            "scene.json",
        ]);
        assert_eq!(args.project, PathBuf::from("game/project.toml"));
        assert_eq!(args.scene, PathBuf::from("scene.json"));
        assert_eq!(args.replay, Some(PathBuf::from("t.json")));
        assert_eq!(args.output, Some(PathBuf::from("out.json")));
        assert!(args.record.is_none());
        assert!(args.verbose);
    }

    #[test]
    fn defaults() {
        let args = EditorArgs::parse_from(["canvas-editor", "scene.json"]);
        assert_eq!(args.project, PathBuf::from("project.toml"));
        assert!(args.replay.is_none());
        assert!(!args.verbose);
    }
}
