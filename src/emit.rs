/// Emission pipeline
///
/// Drives one run from a resolved configuration to an artifact on disk:
/// read input, build the module, attach debug info, then either print the
/// module as text or hand it to a target machine. Every failure ends the
/// run; nothing is retried.
use crate::codegen::{
    create_target_machine, lookup_target, target_os, CodeGenFileKind, CodeGenOptLevel, TargetOptions,
};
use crate::config::{OutputKind, ResolvedConfig};
use crate::error::Result;
use crate::files;
use crate::module::{attach_debug_info, build_module, print_module, AssetModule};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Configured,
    ModuleBuilt,
    DebugAttached,
    Emitted,
    Failed,
}

pub struct EmissionPipeline {
    config: ResolvedConfig,
    state: PipelineState,
}

impl EmissionPipeline {
    pub fn new(config: ResolvedConfig) -> Self {
        Self {
            config,
            state: PipelineState::Configured,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Run every stage. Returns the path the artifact was written to.
    pub fn run(&mut self) -> Result<String> {
        match self.run_stages() {
            Ok(path) => {
                self.state = PipelineState::Emitted;
                info!("wrote {}", path);
                Ok(path)
            }
            Err(err) => {
                self.state = PipelineState::Failed;
                Err(err)
            }
        }
    }

    fn run_stages(&mut self) -> Result<String> {
        let payload = files::read_input(&self.config.input_path)?;
        let symbol = self.config.symbol_name().to_string();

        let (mut module, buffer_size) = build_module(
            &self.config.input_path,
            &self.config.triple,
            &symbol,
            &payload,
            self.config.null_terminate,
        );
        drop(payload);
        debug!("built module with symbol '{}' of {} bytes", symbol, buffer_size);
        self.state = PipelineState::ModuleBuilt;

        // Applied before the output kind is considered, so `-g` reaches the
        // textual form too.
        if self.config.emit_debug_info {
            attach_debug_info(&mut module, buffer_size);
            self.state = PipelineState::DebugAttached;
        }

        match self.config.output_kind {
            OutputKind::Ir => self.print(&module),
            OutputKind::Assembly | OutputKind::Object | OutputKind::Null => self.codegen(&module),
        }
    }

    /// Textual branch: no target is consulted.
    fn print(&mut self, module: &AssetModule) -> Result<String> {
        let os = target_os(&module.target_triple);
        let path = self.config.output_path("", &os).to_string();
        files::write_output(&path, print_module(module).as_bytes())?;
        Ok(path)
    }

    fn codegen(&mut self, module: &AssetModule) -> Result<String> {
        let (target, triple) = lookup_target(&self.config.march, &self.config.triple)?;
        debug!("selected target '{}' for {}", target.name(), triple);
        debug!(
            "cpu '{}', features '{}' ({} -mattr tokens)",
            self.config.cpu,
            self.config.features,
            self.config.attribute_overrides.len()
        );

        let options = TargetOptions {
            data_sections: self.config.data_sections,
        };
        let machine = create_target_machine(
            target,
            triple,
            &self.config.cpu,
            &self.config.features,
            options,
            self.config.reloc_model,
            self.config.code_model,
            CodeGenOptLevel::None,
        )?;

        let os = machine.triple().operating_system.clone();
        let path = self.config.output_path(target.name(), &os).to_string();
        machine.write_to_file(module, &path, CodeGenFileKind::from_output_kind(self.config.output_kind))?;
        Ok(path)
    }
}

/// Run the whole pipeline for `config`.
pub fn run(config: ResolvedConfig) -> Result<String> {
    let mut pipeline = EmissionPipeline::new(config);
    let result = pipeline.run();
    debug!("pipeline finished in state {:?}", pipeline.state());
    result
}
