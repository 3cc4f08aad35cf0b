//! Render orchestrator.
//!
//! The [`Abstractor`] owns the loaded model, a rasterizer and the reusable
//! frame workspace. Loading a model runs the per-model precomputation once;
//! every render then rasterizes the cached mesh under a camera matrix and
//! runs the abstraction core.
//!
//! Typical usage:
//! ```no_run
//! use bw_abstraction::{AbstractionParams, Abstractor};
//! use nalgebra::Matrix4;
//! use std::path::Path;
//!
//! # fn example() -> bw_abstraction::Result<()> {
//! let params = AbstractionParams::default();
//! let mut abstractor = Abstractor::new();
//! abstractor.load_model_from_obj(Path::new("model.obj"), &params)?;
//! let report = abstractor.render(&Matrix4::identity(), &params)?;
//! println!("patches={}", report.result.patches.len());
//! # Ok(())
//! # }
//! ```
use crate::abstraction::{abstract_frame, AbstractionParams, FrameBuffers, FrameWorkspace};
use crate::diagnostics::AbstractionReport;
use crate::error::{AbstractionError, Result};
use crate::mesh::obj::load_obj;
use crate::mesh::{ModelData, TriMesh};
use crate::raster::{Rasterizer, SoftwareRasterizer};
use log::debug;
use nalgebra::Matrix4;
use std::path::Path;

pub struct Abstractor<R: Rasterizer = SoftwareRasterizer> {
    rasterizer: R,
    model: Option<ModelData>,
    workspace: FrameWorkspace,
    render_count: u64,
}

impl Abstractor<SoftwareRasterizer> {
    /// Orchestrator backed by the bundled software rasterizer.
    pub fn new() -> Self {
        Self::with_rasterizer(SoftwareRasterizer::new())
    }
}

impl Default for Abstractor<SoftwareRasterizer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rasterizer> Abstractor<R> {
    pub fn with_rasterizer(rasterizer: R) -> Self {
        Self {
            rasterizer,
            model: None,
            workspace: FrameWorkspace::new(),
            render_count: 0,
        }
    }

    /// Normalize `mesh` and precompute its model data, replacing any previous model.
    pub fn load_model(&mut self, mut mesh: TriMesh, params: &AbstractionParams) -> Result<()> {
        params.validate()?;
        mesh.normalize();
        self.model = Some(ModelData::build(mesh, params));
        self.render_count = 0;
        Ok(())
    }

    pub fn load_model_from_obj(&mut self, path: &Path, params: &AbstractionParams) -> Result<()> {
        let mesh = load_obj(path)?;
        debug!(
            "Abstractor::load_model_from_obj path={} faces={} vertices={}",
            path.display(),
            mesh.n_faces(),
            mesh.n_vertices()
        );
        self.load_model(mesh, params)
    }

    pub fn model(&self) -> Option<&ModelData> {
        self.model.as_ref()
    }

    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    /// Rasterize the loaded model under `mvp` and abstract the frame.
    pub fn render(
        &mut self,
        mvp: &Matrix4<f32>,
        params: &AbstractionParams,
    ) -> Result<AbstractionReport> {
        params.validate()?;
        let model = self.model.as_ref().ok_or(AbstractionError::ModelNotLoaded)?;
        let (w, h) = (params.render_width, params.render_height);
        debug!("Abstractor::render start w={} h={}", w, h);
        let surface = self.rasterizer.render_surface(&model.mesh, mvp, w, h);
        let sharp = self
            .rasterizer
            .render_lines(&model.sharp_edges, mvp, &surface.depth);
        let frame = FrameBuffers::from_surface(surface, sharp);
        self.render_frame(&frame, params)
    }

    /// Abstract caller-supplied buffers against the loaded model.
    pub fn render_frame(
        &mut self,
        frame: &FrameBuffers,
        params: &AbstractionParams,
    ) -> Result<AbstractionReport> {
        let model = self.model.as_ref().ok_or(AbstractionError::ModelNotLoaded)?;
        let report = abstract_frame(
            &mut self.workspace,
            frame,
            model,
            params,
            self.render_count + 1,
        )?;
        self.render_count += 1;
        Ok(report)
    }
}
