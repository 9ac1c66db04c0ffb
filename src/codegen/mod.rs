/// Code generation module - target resolution and artifact emission
///
/// This module turns a resolved configuration and an asset module into
/// bytes on disk. Targets are registered statically and looked up by name
/// (`-march`) or by triple; each one is bound into a `TargetMachine` before
/// it renders anything.
///
/// ## Module Structure
/// - `triple`: triple normalization and target configuration defaults
/// - `features`: CPU name and subtarget feature string resolution
/// - `backend`: the `TargetBackend` trait and codegen option types
/// - `targets`: the target registry and lookup
/// - `machine`: target machine construction and the write-to-file step
/// - `object_file`: ELF / COFF / Mach-O object output
/// - `assembly`: GNU assembler output
/// - `source`: C / C++ source output
mod assembly;
mod backend;
pub mod features;
mod machine;
mod object_file;
mod source;
mod targets;
pub mod triple;

pub use backend::{CodeGenFileKind, CodeGenOptLevel, TargetOptions};
pub use features::resolve_cpu_and_features;
pub use machine::create_target_machine;
pub use targets::{lookup_target, version_text};
pub use triple::{target_os, TargetConfig};
