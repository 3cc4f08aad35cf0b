use crate::AbstractionParams;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Composited grayscale PNG.
    pub image: Option<PathBuf>,
    /// JSON report (entities and pipeline trace).
    pub report_json: Option<PathBuf>,
    /// Directory for the debug images selected in `params.result_images`.
    pub debug_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RenderToolConfig {
    /// Wavefront OBJ model.
    pub input: PathBuf,
    /// 16 whitespace-separated floats, column-major model-view-projection matrix.
    pub camera: PathBuf,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub params: AbstractionParams,
}

impl RenderToolConfig {
    /// Resolve relative paths against `base` (the config file's directory).
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.input);
        resolve(&mut self.camera);
        for p in [
            &mut self.output.image,
            &mut self.output.report_json,
            &mut self.output.debug_dir,
        ]
        .into_iter()
        .flatten()
        {
            resolve(p);
        }
    }
}

pub fn load_config(path: &Path) -> Result<RenderToolConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let mut config: RenderToolConfig = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    config
        .params
        .validate()
        .map_err(|e| format!("Invalid params in {}: {e}", path.display()))?;
    if let Some(base) = path.parent() {
        config.resolve_paths(base);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_default_params() {
        let config: RenderToolConfig =
            serde_json::from_str(r#"{ "input": "cube.obj", "camera": "cam.txt" }"#)
                .expect("parse");
        assert_eq!(config.params, AbstractionParams::default());
        assert!(config.output.image.is_none());
    }

    #[test]
    fn relative_paths_follow_the_config_file() {
        let mut config: RenderToolConfig = serde_json::from_str(
            r#"{
                "input": "models/cube.obj",
                "camera": "/abs/cam.txt",
                "output": { "image": "out/cube.png" },
                "params": { "scale": 0.5, "render_width": 64, "render_height": 48 }
            }"#,
        )
        .expect("parse");
        config.resolve_paths(Path::new("/data"));
        assert_eq!(config.input, PathBuf::from("/data/models/cube.obj"));
        assert_eq!(config.camera, PathBuf::from("/abs/cam.txt"));
        assert_eq!(config.output.image, Some(PathBuf::from("/data/out/cube.png")));
        assert_eq!(config.params.render_width, 64);
    }
}
