// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// Every subcommand maps to one ModelManager operation and
// prints its result as pretty JSON on stdout.
//
// Outcomes other than Ready become errors here, so the process
// exits non-zero with a readable message.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use burn::backend::{wgpu::WgpuDevice, Wgpu};
use clap::Parser;
use serde::Serialize;

use crate::application::model_manager::{ModelManager, Sequences};
use crate::domain::generation::GenerateParams;
use crate::infra::config::ManagerConfig;
use crate::ml::builder::BurnModelBuilder;
use commands::{Commands, PathArgs};

#[derive(Parser, Debug)]
#[command(
    name = "rnnvis-server",
    version = "0.1.0",
    about = "Load trained RNN language models, generate branching continuations and record hidden states."
)]
pub struct Cli {
    #[command(flatten)]
    pub paths: PathArgs,

    #[command(subcommand)]
    pub command: Commands,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let paths: ManagerConfig = self.paths.into();
        let builder = BurnModelBuilder::<Wgpu>::new(paths.clone(), WgpuDevice::default());
        let mut manager = ModelManager::new(paths, Box::new(builder));

        match self.command {
            Commands::Models => print_json(&manager.available_models()),

            Commands::ConfigPath(args) => match manager.config_filename(&args.model) {
                Some(path) => {
                    println!("{}", path.display());
                    Ok(())
                }
                None => anyhow::bail!("Cannot find model with name {}", args.model),
            },

            Commands::Load(args) => {
                let config = manager.load(&args.model, args.train)?.into_result()?;
                print_json(&config)
            }

            Commands::Generate(args) => {
                let seeds  = args.seed_tokens()?;
                let params = GenerateParams::from(&args);
                let tree   = manager.generate(&args.model, &seeds, &params)?.into_result()?;
                let paths  = tree.paths();
                print_json(&serde_json::json!({ "tree": tree, "paths": paths }))
            }

            Commands::RecordSequence(args) => {
                let sequences = Sequences::Tokens(args.tokens());
                let evals = manager.record_sequence(&args.model, sequences)?.into_result()?;
                print_json(&evals)
            }

            Commands::RecordDefault(args) => {
                let ok = manager.record_default(&args.model, &args.split)?.into_result()?;
                anyhow::ensure!(ok, "Recording the {} split of {} failed, see the log", args.split, args.model);
                println!("Recorded {} split of {}", args.split, args.model);
                Ok(())
            }

            Commands::ToIds(args) => {
                let ids = manager.sentences_to_ids(&args.model, &args.sentences)?.into_result()?;
                print_json(&ids)
            }

            Commands::Signature(args) => {
                let signature = manager
                    .state_signature(&args.model, &args.state, &args.layers, args.sample_size)?
                    .into_result()?;
                print_json(&signature)
            }

            Commands::Strength(args) => {
                let strength = manager
                    .strength(&args.model, &args.state, &args.layers, args.top_k)?
                    .into_result()?;
                print_json(&strength)
            }

            Commands::Projection(args) => {
                let projection = manager
                    .state_projection(&args.model, &args.state, args.layer, &args.method)?
                    .into_result()?;
                print_json(&projection)
            }
        }
    }
}
