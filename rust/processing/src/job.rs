// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Export jobs on a dedicated worker thread

use crate::assembly::{ExportOutput, MeshAssembler};
use crate::cancel::CancellationToken;
use crate::config::validate_config;
use crate::error::{Error, Result};
use crate::progress::{NoProgress, ProgressSink};
use schem_mesh_core::{BlockCatalog, ExportConfig, VoxelSource};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::debug;

const WORKER_NAME: &str = "schem-mesh-export";

/// One export, ready to run
pub struct ExportJob<S, C> {
    source: Arc<S>,
    catalog: Arc<C>,
    config: ExportConfig,
    progress: Arc<dyn ProgressSink>,
}

impl<S, C> ExportJob<S, C>
where
    S: VoxelSource + Send + Sync + 'static,
    C: BlockCatalog + Send + Sync + 'static,
{
    pub fn new(source: Arc<S>, catalog: Arc<C>, config: ExportConfig) -> Self {
        Self {
            source,
            catalog,
            config,
            progress: Arc::new(NoProgress),
        }
    }

    pub fn with_progress(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.progress = Arc::new(sink);
        self
    }

    /// Start the export on its own thread
    pub fn spawn(self) -> Result<ExportHandle> {
        validate_config(&self.config)?;
        let token = CancellationToken::new();
        let worker_token = token.clone();

        let handle = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || {
                MeshAssembler::new(&*self.source, &*self.catalog, &self.config)
                    .with_progress(&*self.progress)
                    .with_cancellation(worker_token)
                    .assemble()
            })?;
        debug!(thread = WORKER_NAME, "Spawned export worker");

        Ok(ExportHandle { handle, token })
    }
}

/// Handle to a running export
#[derive(Debug)]
pub struct ExportHandle {
    handle: JoinHandle<Result<ExportOutput>>,
    token: CancellationToken,
}

impl ExportHandle {
    /// Ask the worker to stop at its next checkpoint
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the worker; a panic in the worker becomes [`Error::WorkerPanicked`]
    pub fn join(self) -> Result<ExportOutput> {
        self.handle.join().map_err(|_| Error::WorkerPanicked)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ChannelProgress;
    use schem_mesh_core::{Block, BlockTable, ModelBox, Neighborhood, Side, VoxelGrid};
    use smallvec::SmallVec;
    use std::borrow::Cow;

    const STONE: Block = Block::new(1, 0);

    fn cube_grid() -> Arc<VoxelGrid> {
        let mut grid = VoxelGrid::new(2, 2, 2).unwrap();
        grid.fill([0, 0, 0], [1, 1, 1], STONE);
        Arc::new(grid)
    }

    #[test]
    fn test_job_with_channel_progress() {
        let (sink, rx) = ChannelProgress::channel();
        let handle = ExportJob::new(cube_grid(), Arc::new(BlockTable::new()), ExportConfig::default())
            .with_progress(sink)
            .spawn()
            .unwrap();
        let output = handle.join().unwrap();

        assert_eq!(output.summary.quads, 6);
        assert_eq!(output.summary.triangles, 12);
        let updates: Vec<_> = rx.try_iter().collect();
        assert!(!updates.is_empty());
        assert_eq!(updates.last().unwrap().overall, 100);
    }

    #[test]
    fn test_invalid_config_is_rejected_before_spawn() {
        let config = ExportConfig {
            export_textures: true,
            texture_folder: String::new(),
            ..ExportConfig::default()
        };
        let result = ExportJob::new(cube_grid(), Arc::new(BlockTable::new()), config).spawn();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_cancelled_job() {
        let (tx, rx) = crossbeam_channel::bounded::<()>(0);
        // Blocks the worker on its first report until the test has cancelled
        let sink = move |_: u8, _: u8, _: &str| {
            let _ = rx.recv();
        };
        let handle = ExportJob::new(cube_grid(), Arc::new(BlockTable::new()), ExportConfig::default())
            .with_progress(sink)
            .spawn()
            .unwrap();
        handle.cancel();
        drop(tx);
        assert!(matches!(handle.join(), Err(Error::Cancelled)));
    }

    struct PanickingCatalog;

    impl BlockCatalog for PanickingCatalog {
        fn is_full_cube(&self, block: Block, _side: Side) -> bool {
            !block.is_air()
        }

        fn is_transparent(&self, block: Block) -> bool {
            block.is_air()
        }

        fn uses_single_texture(&self, _block: Block) -> bool {
            true
        }

        fn texture_for(&self, _block: Block, _side: Side) -> Cow<'_, str> {
            panic!("texture lookup failed")
        }

        fn is_custom_model(&self, _block: Block) -> bool {
            false
        }

        fn model_boxes(&self, _neighborhood: &Neighborhood) -> SmallVec<[ModelBox; 4]> {
            SmallVec::new()
        }
    }

    #[test]
    fn test_worker_panic_is_reported() {
        let handle = ExportJob::new(cube_grid(), Arc::new(PanickingCatalog), ExportConfig::default())
            .spawn()
            .unwrap();
        assert!(matches!(handle.join(), Err(Error::WorkerPanicked)));
    }
}
