use clap::Parser;
use rotor::cli::{
    handle_completions, handle_config_init, jobs, pools, Cli, Commands, ConfigCommands,
    JobsCommands, PoolsCommands,
};
use rotor::config::RotorConfig;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve(args) => rotor::cli::serve::run_serve(args).await,
        Commands::Pools(cmd) => match cmd {
            PoolsCommands::List(args) => {
                let config =
                    RotorConfig::load(Some(&args.config)).unwrap_or_else(|_| RotorConfig::default());
                match pools::handle_pools_list(&args, &config) {
                    Ok(output) => {
                        println!("{}", output);
                        Ok(())
                    }
                    Err(e) => Err(e),
                }
            }
        },
        Commands::Jobs(cmd) => match cmd {
            JobsCommands::List(args) => {
                let config =
                    RotorConfig::load(Some(&args.config)).unwrap_or_else(|_| RotorConfig::default());
                match jobs::handle_jobs_list(&args, &config) {
                    Ok(output) => {
                        println!("{}", output);
                        Ok(())
                    }
                    Err(e) => Err(e),
                }
            }
        },
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args),
        },
        Commands::Completions(args) => {
            handle_completions(&args);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
