// Copyright @yucwang 2026

use crate::core::config::SamplerConfig;
use crate::core::error::SampleError;
use crate::core::rng::LcgRng;
use crate::io::ply_writer::{AttributeMask, PlyChunkWriter, PointSample};
use crate::shapes::triangle_mesh::TriangleMesh;
use crate::textures::store::TextureStore;

use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Instant;

/// Lifecycle of a `MeshSampler`. `Done` and `Failed` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SamplerState {
    Idle,
    Configuring,
    Streaming,
    Finalizing,
    Done,
    Failed,
}

/// Summary of a finished run.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleReport {
    pub requested: usize,
    pub emitted: usize,
    pub chunk_capacity: usize,
    pub chunks_flushed: usize,
    pub peak_buffered: usize,
}

/// Streams a dense point cloud sampled from a mesh surface into a PLY file.
///
/// Triangles are visited in mesh order and each receives its deterministic
/// share of the requested count, so consecutive output records stay close
/// on the surface. Everything after mesh metric computation runs on the
/// calling thread.
pub struct MeshSampler<'a> {
    mesh: &'a TriangleMesh,
    textures: &'a TextureStore,
    config: SamplerConfig,
    state: SamplerState,
    rng: LcgRng,
}

impl<'a> MeshSampler<'a> {
    pub fn new(mesh: &'a TriangleMesh, textures: &'a TextureStore, config: SamplerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => LcgRng::new(seed),
            None => LcgRng::from_time(),
        };

        Self {
            mesh,
            textures,
            config,
            state: SamplerState::Idle,
            rng,
        }
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Samples the mesh into `output`. A sampler runs once; later calls
    /// return `SampleError::Finished`.
    pub fn run<P: AsRef<Path>>(&mut self, output: P) -> Result<SampleReport, SampleError> {
        self.run_with(output.as_ref(), |path, mask, budget| PlyChunkWriter::create(path, mask, budget))
    }

    fn run_with<F>(&mut self, output: &Path, open: F) -> Result<SampleReport, SampleError>
    where
        F: FnOnce(&Path, AttributeMask, usize) -> Result<PlyChunkWriter, SampleError>,
    {
        if self.state != SamplerState::Idle {
            return Err(SampleError::Finished);
        }

        let result = self.execute(output, open);
        self.state = match result {
            Ok(_) => SamplerState::Done,
            Err(_) => SamplerState::Failed,
        };
        result
    }

    fn execute<F>(&mut self, output: &Path, open: F) -> Result<SampleReport, SampleError>
    where
        F: FnOnce(&Path, AttributeMask, usize) -> Result<PlyChunkWriter, SampleError>,
    {
        self.state = SamplerState::Configuring;
        let mut writer = self.configure(output, open)?;

        self.state = SamplerState::Streaming;
        let start = Instant::now();
        let progress = self.progress_bar();
        self.stream(&mut writer, &progress)?;

        self.state = SamplerState::Finalizing;
        let chunk_capacity = writer.capacity();
        let peak_buffered = writer.peak_buffered();
        // Remaining samples go out in the final flush.
        let chunks_flushed = writer.chunks_flushed() + if writer.buffered() > 0 { 1 } else { 0 };
        let emitted = writer.finalize()?;
        progress.finish_and_clear();

        log::info!(
            "Wrote {} samples ({} requested) to {} in {:.2}s.",
            emitted,
            self.config.samples,
            output.display(),
            start.elapsed().as_secs_f32()
        );

        Ok(SampleReport {
            requested: self.config.samples,
            emitted,
            chunk_capacity,
            chunks_flushed,
            peak_buffered,
        })
    }

    fn configure<F>(&self, output: &Path, open: F) -> Result<PlyChunkWriter, SampleError>
    where
        F: FnOnce(&Path, AttributeMask, usize) -> Result<PlyChunkWriter, SampleError>,
    {
        if self.mesh.is_empty() {
            return Err(SampleError::EmptyMesh);
        }
        if self.mesh.distribution().is_degenerate() {
            return Err(SampleError::ZeroArea);
        }

        let writer = open(output, self.config.attributes, self.config.memory_bytes())?;
        log::info!(
            "Sampling {} triangles (area {:.4}) into chunks of {} samples, filter {}.",
            self.mesh.triangles().len(),
            self.mesh.surface_area(),
            writer.capacity(),
            self.config.filter
        );
        Ok(writer)
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }

        let progress = ProgressBar::new(self.config.samples as u64);
        progress.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {percent:>3}% {pos}/{len} samples")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        progress
    }

    fn stream(&mut self, writer: &mut PlyChunkWriter, progress: &ProgressBar) -> Result<(), SampleError> {
        let mesh = self.mesh;
        let distribution = mesh.distribution();
        let requested = self.config.samples;
        let mask = self.config.attributes;

        for (idx, triangle) in mesh.triangles().iter().enumerate() {
            let count = distribution.sample_count(requested, idx, triangle, &mut self.rng);
            for _ in 0..count {
                let bary = distribution.sample_barycentric(&mut self.rng);
                let mut sample = PointSample::default();
                if mask.contains(AttributeMask::VERTICES) {
                    sample.position = mesh.interpolate_position(idx, &bary);
                }
                if mask.contains(AttributeMask::NORMALS) {
                    sample.normal = mesh.interpolate_normal(idx, &bary);
                }
                if mask.contains(AttributeMask::COLORS) {
                    sample.color = mesh.interpolate_color(idx, &bary, self.textures, self.config.filter, &mut self.rng);
                }

                writer.append(&sample);
                if writer.flush_if_full()? {
                    progress.set_position(writer.total().min(requested) as u64);
                }
            }
        }

        progress.set_position(requested as u64);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ply_writer::header;
    use crate::materials::material::Material;
    use crate::math::constants::{Float, Vector2f, Vector3f};
    use crate::shapes::triangle::Triangle;
    use crate::shapes::triangle_mesh::TriangleGroup;
    use std::collections::HashMap;
    use std::fs;

    fn grid_mesh(cells: usize) -> TriangleMesh {
        let mut vertices = Vec::new();
        let mut triangles = Vec::new();
        for i in 0..cells {
            let x = i as Float;
            let base = vertices.len();
            vertices.push(Vector3f::new(x, 0.0, 0.0));
            vertices.push(Vector3f::new(x + 1.0, 0.0, 0.0));
            vertices.push(Vector3f::new(x + 1.0, 1.0, 0.0));
            vertices.push(Vector3f::new(x, 1.0, 0.0));
            triangles.push(Triangle::new([base, base + 1, base + 2], [0; 3], [0; 3], 0));
            triangles.push(Triangle::new([base, base + 2, base + 3], [0; 3], [0; 3], 0));
        }
        let n = triangles.len();
        let mut materials = HashMap::new();
        materials.insert("blue".to_string(), Material::named("blue").with_base_color(Vector3f::new(0.0, 0.0, 1.0)));
        TriangleMesh::new("grid", vertices, vec![Vector3f::z()], vec![Vector2f::zeros()],
                          triangles, vec![TriangleGroup::new(0, n, "blue")], materials).unwrap()
    }

    fn config(samples: usize, attributes: AttributeMask) -> SamplerConfig {
        SamplerConfig {
            samples,
            attributes,
            seed: Some(1234),
            show_progress: false,
            ..SamplerConfig::default()
        }
    }

    #[test]
    fn test_run_reaches_done() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.ply");
        let mesh = grid_mesh(4);
        let textures = TextureStore::new();
        let mut sampler = MeshSampler::new(&mesh, &textures, config(1000, AttributeMask::VERTICES));
        assert_eq!(sampler.state(), SamplerState::Idle);

        let report = sampler.run(&path).unwrap();
        assert_eq!(sampler.state(), SamplerState::Done);
        // Every triangle has an exact share of 125.
        assert_eq!(report.emitted, 1000);
        assert_eq!(report.chunks_flushed, 1);

        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes.len(), header(AttributeMask::VERTICES, 1000).len() + 1000 * 12);

        assert!(matches!(sampler.run(&path), Err(SampleError::Finished)));
    }

    #[test]
    fn test_small_budget_bounds_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.ply");
        let mesh = grid_mesh(3);
        let textures = TextureStore::new();
        let mut cfg = config(50_000, AttributeMask::VERTICES | AttributeMask::NORMALS | AttributeMask::COLORS);
        cfg.memory_mb = 1;
        let mut sampler = MeshSampler::new(&mesh, &textures, cfg);
        let report = sampler.run(&path).unwrap();

        // 1 MiB / 36 bytes per sample.
        assert_eq!(report.chunk_capacity, 29_127);
        assert!(report.peak_buffered <= report.chunk_capacity);
        assert!(report.chunks_flushed >= 2);
        assert!((report.emitted as i64 - 50_000).abs() <= mesh.triangles().len() as i64);
    }

    #[test]
    fn test_zero_area_fails_before_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flat.ply");
        let vertices = vec![Vector3f::zeros(), Vector3f::new(1.0, 0.0, 0.0), Vector3f::new(2.0, 0.0, 0.0)];
        let triangles = vec![Triangle::new([0, 1, 2], [0; 3], [0; 3], 0)];
        let mesh = TriangleMesh::new("flat", vertices, vec![Vector3f::z()], vec![Vector2f::zeros()],
                                     triangles, vec![TriangleGroup::new(0, 1, "default")], HashMap::new()).unwrap();
        let textures = TextureStore::new();
        let mut sampler = MeshSampler::new(&mesh, &textures, config(10, AttributeMask::VERTICES));

        assert!(matches!(sampler.run(&path), Err(SampleError::ZeroArea)));
        assert_eq!(sampler.state(), SamplerState::Failed);
        assert!(!path.exists());
    }

    #[test]
    fn test_empty_mesh_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mesh = TriangleMesh::new("empty", Vec::new(), Vec::new(), Vec::new(),
                                     Vec::new(), Vec::new(), HashMap::new()).unwrap();
        let textures = TextureStore::new();
        let mut sampler = MeshSampler::new(&mesh, &textures, config(10, AttributeMask::VERTICES));
        assert!(matches!(sampler.run(dir.path().join("e.ply")), Err(SampleError::EmptyMesh)));
    }

    #[test]
    fn test_unwritable_output_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("grid.ply");
        let mesh = grid_mesh(1);
        let textures = TextureStore::new();
        let mut sampler = MeshSampler::new(&mesh, &textures, config(10, AttributeMask::VERTICES));
        assert!(matches!(sampler.run(&path), Err(SampleError::Output { .. })));
        assert_eq!(sampler.state(), SamplerState::Failed);
    }

    // Scratch body that rejects every write.
    struct FullDisk;

    impl std::io::Read for FullDisk {
        fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
            Ok(0)
        }
    }

    impl std::io::Write for FullDisk {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "no space left on device"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl std::io::Seek for FullDisk {
        fn seek(&mut self, _: std::io::SeekFrom) -> std::io::Result<u64> {
            Ok(0)
        }
    }

    #[test]
    fn test_write_error_while_streaming_fails_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.ply");
        let mesh = grid_mesh(2);
        let textures = TextureStore::new();
        let mut cfg = config(400_000, AttributeMask::VERTICES);
        cfg.memory_mb = 1;
        let mut sampler = MeshSampler::new(&mesh, &textures, cfg);

        let mut opened = false;
        let result = sampler.run_with(&path, |p, mask, budget| {
            opened = true;
            PlyChunkWriter::with_body(p, mask, budget, Box::new(FullDisk))
        });

        assert!(opened);
        assert!(matches!(result, Err(SampleError::Io(_))));
        assert_eq!(sampler.state(), SamplerState::Failed);
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let dir = tempfile::tempdir().unwrap();
        let mesh = grid_mesh(2);
        let textures = TextureStore::new();
        let mask = AttributeMask::VERTICES | AttributeMask::NORMALS;

        let a = dir.path().join("a.ply");
        let b = dir.path().join("b.ply");
        MeshSampler::new(&mesh, &textures, config(333, mask)).run(&a).unwrap();
        MeshSampler::new(&mesh, &textures, config(333, mask)).run(&b).unwrap();
        assert_eq!(fs::read(&a).unwrap(), fs::read(&b).unwrap());
    }
}
