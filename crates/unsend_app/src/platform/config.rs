use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use engine_logging::engine_info;
use unsend_engine::{EngineConfig, Timings};

/// Engine tunables from a RON file, or the defaults when no file is given.
///
/// Fields missing from the file keep their default values.
pub(crate) fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading engine config {}", path.display()))?;
    let config: EngineConfig = ron::from_str(&content)
        .with_context(|| format!("parsing engine config {}", path.display()))?;
    engine_info!("Loaded engine config from {:?}", path);
    Ok(config)
}

/// All settle pauses at zero; the operator delay is unaffected.
pub(crate) fn instant_timings() -> Timings {
    Timings {
        initial_ms: 0,
        scan_settle_ms: 0,
        reveal_ms: 0,
        post_hover_ms: 0,
        post_menu_open_ms: 0,
        post_menu_item_ms: 0,
        confirm_poll_ms: 0,
        dismiss_ms: 0,
        after_scroll_ms: 0,
        post_removal_ms: 0,
    }
}

pub(crate) fn load_fixture(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading fixture {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_path_gives_defaults() {
        assert_eq!(load_engine_config(None).unwrap(), EngineConfig::default());
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("engine.ron");
        fs::write(
            &path,
            "(own_side_threshold: 0.6, confirm_labels: [\"Unsend\"], timings: (initial_ms: 10))",
        )
        .unwrap();

        let config = load_engine_config(Some(&path)).unwrap();

        assert_eq!(config.own_side_threshold, 0.6);
        assert_eq!(config.confirm_labels, vec!["Unsend".to_string()]);
        assert_eq!(config.timings.initial_ms, 10);
        assert_eq!(config.timings.scan_settle_ms, Timings::default().scan_settle_ms);
        assert_eq!(config.menu_proximity_px, EngineConfig::default().menu_proximity_px);
    }

    #[test]
    fn malformed_file_is_an_error_naming_the_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.ron");
        fs::write(&path, "(own_side_threshold: ").unwrap();

        let err = load_engine_config(Some(&path)).unwrap_err();

        assert!(format!("{err:#}").contains("broken.ron"));
    }
}
