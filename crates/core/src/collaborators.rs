//! Built-in collaborators and the toolchain the front-end tasks call into

pub mod command;
pub mod console;
pub mod sprite;

use std::sync::Arc;

use sluice_plugin_protocol::{
    Bundler, FailureNotifier, ImageOptimizer, ReloadTransport, SpriteGenerator, StyleCompiler,
};

use crate::configs::frontend::ToolsConfig;
use crate::execution::command::CommandExecutor;

pub use command::{
    CommandBundler, CommandImageOptimizer, CommandStyleCompiler, PassthroughImageOptimizer,
};
pub use console::{ConsoleNotifier, ConsoleReloadTransport};
pub use sprite::SymbolSpriteGenerator;

/// One implementation of every collaborator
#[derive(Clone)]
pub struct Toolchain {
    pub style_compiler: Arc<dyn StyleCompiler>,
    pub bundler: Arc<dyn Bundler>,
    pub image_optimizer: Arc<dyn ImageOptimizer>,
    pub sprite_generator: Arc<dyn SpriteGenerator>,
    pub reload: Arc<dyn ReloadTransport>,
    pub notifier: Arc<dyn FailureNotifier>,
}

impl Toolchain {
    /// External programs from the `tools` section, console reload and notifications
    pub fn from_config(tools: &ToolsConfig, commands: &CommandExecutor) -> Self {
        let image_optimizer: Arc<dyn ImageOptimizer> = match &tools.image_optimizer {
            Some(command) => Arc::new(CommandImageOptimizer::new(commands.clone(), command.clone())),
            None => Arc::new(PassthroughImageOptimizer),
        };
        Self {
            style_compiler: Arc::new(CommandStyleCompiler::new(
                commands.clone(),
                tools.style_compiler.clone(),
            )),
            bundler: Arc::new(CommandBundler::new(commands.clone(), tools.bundler.clone())),
            image_optimizer,
            sprite_generator: Arc::new(SymbolSpriteGenerator),
            reload: Arc::new(ConsoleReloadTransport::new()),
            notifier: Arc::new(ConsoleNotifier),
        }
    }
}
