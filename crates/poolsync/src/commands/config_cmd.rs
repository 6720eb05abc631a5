//! Config subcommand handlers.

use poolsync_config::{Config, PoolEntry};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::{config, output};

/// Copy of `cfg` safe to display.
fn redacted(cfg: &Config) -> Config {
    let mut shown = cfg.clone();
    if shown.access_token.is_some() {
        shown.access_token = Some("****".into());
    }
    shown
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init {
            token_env,
            pools,
            force,
        } => {
            let path = config::config_path(global);
            if path.exists() && !force {
                return Err(CliError::Validation {
                    field: "config".into(),
                    reason: format!("{} already exists (use --force to overwrite)", path.display()),
                });
            }

            let cfg = Config {
                access_token_env: Some(token_env),
                pools: pools
                    .into_iter()
                    .map(|id| PoolEntry {
                        id,
                        name: None,
                        capabilities: None,
                    })
                    .collect(),
                ..Config::default()
            };
            cfg.validate()?;
            poolsync_config::save_config_to(&cfg, &path)?;

            if !global.quiet {
                eprintln!("Config written to {}", path.display());
            }
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = redacted(&config::load(global)?);
            let out = match global.output {
                OutputFormat::Table | OutputFormat::Plain => {
                    toml::to_string_pretty(&cfg).map_err(|e| CliError::Engine {
                        message: format!("failed to render config: {e}"),
                    })?
                }
                _ => output::render_single(&global.output, &cfg, |_| String::new(), |_| String::new()),
            };
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path(global).display().to_string(), global.quiet);
            Ok(())
        }
    }
}
