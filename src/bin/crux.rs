use anyhow::Result;
use clap::Parser;
use crux::agent::{AgentRuntime, EchoRuntime, ScriptedRuntime};
use crux::config::{Cli, Config};
use crux::console::{Console, ConsoleOptions};
use crux::terminal::{self, CrosstermTerminal, PipedTerminal};
use std::io::{self, IsTerminal};

fn build_runtime(config: &Config) -> Result<Box<dyn AgentRuntime>> {
    let runtime: Box<dyn AgentRuntime> = match &config.replay {
        Some(path) => {
            Box::new(ScriptedRuntime::from_jsonl_file(path)?.with_delay(config.chunk_delay()))
        }
        None => Box::new(EchoRuntime::new(config.chunk_delay())),
    };
    Ok(runtime)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli)?;
    config.validate()?;
    crux::logging::init(&config)?;

    let runtime = build_runtime(&config)?;
    let interactive = io::stdin().is_terminal() && io::stdout().is_terminal();
    tracing::info!(model = %config.model, interactive, replay = ?config.replay, "starting console");

    let options = ConsoleOptions {
        raw_mode: interactive,
        model_label: config.model.clone(),
    };

    if interactive {
        terminal::install_panic_hook_once();
        let mut console = Console::new(CrosstermTerminal, runtime, io::stdout(), options);
        console.run().await
    } else {
        let input = PipedTerminal::new(io::stdin().lock());
        let mut console = Console::new(input, runtime, io::stdout(), options);
        console.run().await
    }
}
